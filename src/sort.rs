//! Sort executor
//!
//! Fully materializing multi-key sort.

use async_trait::async_trait;

use crate::error::ExecutorResult;
use crate::register::Register;
use crate::row::Row;
use crate::{Executor, Phase};

/// A single sort criterion: attribute index plus direction
#[derive(Debug, Clone, Copy)]
pub struct SortKey {
    /// Attribute index to sort by
    pub attr_index: usize,
    /// Sort ascending if true, descending otherwise
    pub ascending: bool,
}

impl SortKey {
    /// Ascending criterion on the given attribute
    pub fn asc(attr_index: usize) -> Self {
        SortKey {
            attr_index,
            ascending: true,
        }
    }

    /// Descending criterion on the given attribute
    pub fn desc(attr_index: usize) -> Self {
        SortKey {
            attr_index,
            ascending: false,
        }
    }
}

/// Sort executor
///
/// On the first `next` call, drains the input into a buffer and performs a
/// stable sort with the criteria as a compound key: ties on the first
/// criterion fall through to the second, and so on; remaining ties keep
/// input order. Subsequent calls emit the buffer in order.
pub struct Sort {
    /// Input executor
    input: Box<dyn Executor>,
    /// Sort criteria, most significant first; must be non-empty
    keys: Vec<SortKey>,
    /// Materialized rows
    rows: Vec<Row>,
    /// Drain / emit lifecycle
    phase: Phase,
}

impl Sort {
    /// Create a new sort executor
    pub fn new(input: Box<dyn Executor>, keys: Vec<SortKey>) -> Self {
        Sort {
            input,
            keys,
            rows: Vec::new(),
            phase: Phase::Drain,
        }
    }

    async fn drain(&mut self) -> ExecutorResult<()> {
        while let Some(row) = self.input.next().await? {
            self.rows.push(row);
        }

        // Keys are precomputed so the comparator stays infallible; a bad
        // attribute index surfaces here rather than mid-sort.
        let mut keyed: Vec<(Vec<Register>, Row)> = Vec::with_capacity(self.rows.len());
        for row in self.rows.drain(..) {
            let mut key = Vec::with_capacity(self.keys.len());
            for k in &self.keys {
                key.push(row.get(k.attr_index)?.clone());
            }
            keyed.push((key, row));
        }

        let keys = &self.keys;
        keyed.sort_by(|(a, _), (b, _)| {
            for (i, (key_a, key_b)) in a.iter().zip(b.iter()).enumerate() {
                let cmp = key_a.cmp(key_b);
                let cmp = if keys[i].ascending { cmp } else { cmp.reverse() };
                if cmp != std::cmp::Ordering::Equal {
                    return cmp;
                }
            }
            std::cmp::Ordering::Equal
        });

        self.rows = keyed.into_iter().map(|(_, row)| row).collect();
        tracing::debug!(rows = self.rows.len(), "sort input materialized");
        Ok(())
    }
}

#[async_trait]
impl Executor for Sort {
    async fn open(&mut self) -> ExecutorResult<()> {
        self.rows.clear();
        self.phase = Phase::Drain;
        self.input.open().await
    }

    async fn next(&mut self) -> ExecutorResult<Option<Row>> {
        if self.phase == Phase::Drain {
            self.drain().await?;
            self.phase = Phase::Emit(0);
        }
        match self.phase {
            Phase::Emit(pos) if pos < self.rows.len() => {
                self.phase = Phase::Emit(pos + 1);
                Ok(Some(self.rows[pos].clone()))
            }
            _ => {
                self.phase = Phase::Done;
                Ok(None)
            }
        }
    }

    async fn close(&mut self) -> ExecutorResult<()> {
        self.rows.clear();
        self.phase = Phase::Done;
        self.input.close().await
    }
}
