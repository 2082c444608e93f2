//! Project executor
//!
//! Reorders and selects columns by position.

use async_trait::async_trait;

use crate::error::ExecutorResult;
use crate::row::Row;
use crate::Executor;

/// Project executor
///
/// Emits one output row per input row; the i-th output column is a copy of
/// the input column at the i-th listed index. Indices may repeat.
pub struct Project {
    /// Input executor
    input: Box<dyn Executor>,
    /// Source attribute indices, in output order
    indices: Vec<usize>,
}

impl Project {
    /// Create a new project executor
    pub fn new(input: Box<dyn Executor>, indices: Vec<usize>) -> Self {
        Project { input, indices }
    }
}

#[async_trait]
impl Executor for Project {
    async fn open(&mut self) -> ExecutorResult<()> {
        self.input.open().await
    }

    async fn next(&mut self) -> ExecutorResult<Option<Row>> {
        match self.input.next().await? {
            Some(row) => Ok(Some(row.project(&self.indices)?)),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> ExecutorResult<()> {
        self.input.close().await
    }
}
