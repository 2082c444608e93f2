//! Hash join executor
//!
//! Inner equi-join on one attribute per side.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{ExecutorError, ExecutorResult};
use crate::register::{Register, RegisterTag};
use crate::row::Row;
use crate::Executor;

/// Build / probe lifecycle of the join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinPhase {
    Build,
    Probe,
    Done,
}

/// Hash join executor
///
/// The right input is the build side: it is drained into a multimap keyed by
/// the join register, duplicate build rows kept in insertion order. The left
/// input is probed row by row; each probe emits the concatenation
/// (left columns, then right columns) once per matching build row, matches
/// in build insertion order. A left row without matches emits nothing.
pub struct HashJoin {
    /// Probe (left) input executor
    left: Box<dyn Executor>,
    /// Build (right) input executor
    right: Box<dyn Executor>,
    /// Join attribute index on the left side
    left_index: usize,
    /// Join attribute index on the right side
    right_index: usize,
    /// Build-side multimap: join key -> rows in insertion order
    table: HashMap<Register, Vec<Row>>,
    /// Variant of the build-side join key, once seen
    key_tag: Option<RegisterTag>,
    /// Current probe row with its pending matches
    current: Option<(Row, Vec<Row>)>,
    /// Cursor into the pending matches
    match_pos: usize,
    phase: JoinPhase,
}

impl HashJoin {
    /// Create a new hash join executor
    pub fn new(
        left: Box<dyn Executor>,
        right: Box<dyn Executor>,
        left_index: usize,
        right_index: usize,
    ) -> Self {
        HashJoin {
            left,
            right,
            left_index,
            right_index,
            table: HashMap::new(),
            key_tag: None,
            current: None,
            match_pos: 0,
            phase: JoinPhase::Build,
        }
    }

    async fn build(&mut self) -> ExecutorResult<()> {
        let mut rows = 0usize;
        while let Some(row) = self.right.next().await? {
            let key = row.get(self.right_index)?.clone();
            self.key_tag.get_or_insert(key.tag());
            self.table.entry(key).or_default().push(row);
            rows += 1;
        }
        tracing::debug!(keys = self.table.len(), rows, "join build side materialized");
        Ok(())
    }
}

#[async_trait]
impl Executor for HashJoin {
    async fn open(&mut self) -> ExecutorResult<()> {
        self.table.clear();
        self.key_tag = None;
        self.current = None;
        self.match_pos = 0;
        self.phase = JoinPhase::Build;
        self.left.open().await?;
        self.right.open().await
    }

    async fn next(&mut self) -> ExecutorResult<Option<Row>> {
        if self.phase == JoinPhase::Build {
            self.build().await?;
            self.phase = JoinPhase::Probe;
        }
        if self.phase == JoinPhase::Done {
            return Ok(None);
        }

        loop {
            if let Some((left_row, matches)) = &self.current {
                if self.match_pos < matches.len() {
                    let combined = Row::concat_ref(left_row, &matches[self.match_pos]);
                    self.match_pos += 1;
                    return Ok(Some(combined));
                }
            }

            match self.left.next().await? {
                Some(row) => {
                    let key = row.get(self.left_index)?;
                    if let Some(tag) = self.key_tag {
                        if key.tag() != tag {
                            return Err(ExecutorError::mismatch(tag, key.tag()));
                        }
                    }
                    let matches = self.table.get(key).cloned().unwrap_or_default();
                    self.current = Some((row, matches));
                    self.match_pos = 0;
                }
                None => {
                    self.phase = JoinPhase::Done;
                    self.current = None;
                    return Ok(None);
                }
            }
        }
    }

    async fn close(&mut self) -> ExecutorResult<()> {
        self.table.clear();
        self.current = None;
        self.left.close().await?;
        self.right.close().await
    }
}
