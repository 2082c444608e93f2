//! Set operation executors
//!
//! UNION, INTERSECT and EXCEPT over whole tuples, each in distinct and ALL
//! form. All six materialize both inputs, compute per-tuple multiplicities
//! and emit the result in ascending tuple order.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::ExecutorResult;
use crate::row::Row;
use crate::{Executor, Phase};

/// Which set operation to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOpKind {
    /// Distinct union: every tuple of either input, once
    Union,
    /// Multiset union: multiplicities add
    UnionAll,
    /// Distinct intersection: tuples present in both inputs, once
    Intersect,
    /// Multiset intersection: the smaller of the two multiplicities
    IntersectAll,
    /// Distinct difference: left tuples absent from the right, once
    Except,
    /// Multiset difference: left multiplicity minus right, floored at zero
    ExceptAll,
}

/// Set operation executor
///
/// Tuples are compared as whole rows; multiplicities are tracked in hash
/// maps keyed by row value. Output is sorted ascending by full tuple
/// comparison before emission.
pub struct SetOp {
    /// Left input executor
    left: Box<dyn Executor>,
    /// Right input executor
    right: Box<dyn Executor>,
    kind: SetOpKind,
    /// Result rows with multiplicities expanded, in emission order
    rows: Vec<Row>,
    /// Drain / emit lifecycle
    phase: Phase,
}

impl SetOp {
    /// Create a set operation executor of the given kind
    pub fn new(kind: SetOpKind, left: Box<dyn Executor>, right: Box<dyn Executor>) -> Self {
        SetOp {
            left,
            right,
            kind,
            rows: Vec::new(),
            phase: Phase::Drain,
        }
    }

    pub fn union(left: Box<dyn Executor>, right: Box<dyn Executor>) -> Self {
        SetOp::new(SetOpKind::Union, left, right)
    }

    pub fn union_all(left: Box<dyn Executor>, right: Box<dyn Executor>) -> Self {
        SetOp::new(SetOpKind::UnionAll, left, right)
    }

    pub fn intersect(left: Box<dyn Executor>, right: Box<dyn Executor>) -> Self {
        SetOp::new(SetOpKind::Intersect, left, right)
    }

    pub fn intersect_all(left: Box<dyn Executor>, right: Box<dyn Executor>) -> Self {
        SetOp::new(SetOpKind::IntersectAll, left, right)
    }

    pub fn except(left: Box<dyn Executor>, right: Box<dyn Executor>) -> Self {
        SetOp::new(SetOpKind::Except, left, right)
    }

    pub fn except_all(left: Box<dyn Executor>, right: Box<dyn Executor>) -> Self {
        SetOp::new(SetOpKind::ExceptAll, left, right)
    }

    async fn drain(&mut self) -> ExecutorResult<()> {
        let mut left_counts: HashMap<Row, u64> = HashMap::new();
        while let Some(row) = self.left.next().await? {
            *left_counts.entry(row).or_insert(0) += 1;
        }

        let mut right_counts: HashMap<Row, u64> = HashMap::new();
        while let Some(row) = self.right.next().await? {
            *right_counts.entry(row).or_insert(0) += 1;
        }

        tracing::debug!(
            left = left_counts.len(),
            right = right_counts.len(),
            kind = ?self.kind,
            "set operation inputs materialized"
        );

        let mut emit = |row: &Row, count: u64| {
            for _ in 0..count {
                self.rows.push(row.clone());
            }
        };

        match self.kind {
            SetOpKind::Union => {
                for row in left_counts.keys() {
                    emit(row, 1);
                }
                for row in right_counts.keys() {
                    if !left_counts.contains_key(row) {
                        emit(row, 1);
                    }
                }
            }
            SetOpKind::UnionAll => {
                for (row, &count) in &left_counts {
                    emit(row, count);
                }
                for (row, &count) in &right_counts {
                    emit(row, count);
                }
            }
            SetOpKind::Intersect => {
                for row in left_counts.keys() {
                    if right_counts.contains_key(row) {
                        emit(row, 1);
                    }
                }
            }
            SetOpKind::IntersectAll => {
                for (row, &count) in &left_counts {
                    if let Some(&right_count) = right_counts.get(row) {
                        emit(row, count.min(right_count));
                    }
                }
            }
            SetOpKind::Except => {
                for row in left_counts.keys() {
                    if !right_counts.contains_key(row) {
                        emit(row, 1);
                    }
                }
            }
            SetOpKind::ExceptAll => {
                for (row, &count) in &left_counts {
                    let right_count = right_counts.get(row).copied().unwrap_or(0);
                    emit(row, count.saturating_sub(right_count));
                }
            }
        }

        self.rows.sort();
        Ok(())
    }
}

#[async_trait]
impl Executor for SetOp {
    async fn open(&mut self) -> ExecutorResult<()> {
        self.rows.clear();
        self.phase = Phase::Drain;
        self.left.open().await?;
        self.right.open().await
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
        self.left.close().await?;
        self.right.close().await
    }
}
