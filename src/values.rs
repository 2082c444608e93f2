//! Values executor - an in-memory leaf source

use async_trait::async_trait;

use crate::error::ExecutorResult;
use crate::row::Row;
use crate::Executor;

/// Executor that yields a fixed sequence of rows
///
/// The leaf of every operator tree in this crate. A table scan or any other
/// external tuple source plugs in at the same place by implementing
/// [`Executor`]; `Values` covers literal row sets and tests.
pub struct Values {
    rows: Vec<Row>,
    position: usize,
}

impl Values {
    /// Create a values executor over the given rows
    pub fn new(rows: Vec<Row>) -> Self {
        Values { rows, position: 0 }
    }

    /// Executor that yields exactly one empty row
    ///
    /// Useful as the input of operators that compute constant results.
    pub fn single_row() -> Self {
        Values::new(vec![Row::empty()])
    }
}

#[async_trait]
impl Executor for Values {
    async fn open(&mut self) -> ExecutorResult<()> {
        self.position = 0;
        Ok(())
    }

    async fn next(&mut self) -> ExecutorResult<Option<Row>> {
        if self.position >= self.rows.len() {
            return Ok(None);
        }
        let row = self.rows[self.position].clone();
        self.position += 1;
        Ok(Some(row))
    }

    async fn close(&mut self) -> ExecutorResult<()> {
        Ok(())
    }
}
