//! Hash aggregation executor
//!
//! Implements grouping with MIN, MAX, SUM and COUNT.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{ExecutorError, ExecutorResult};
use crate::register::{Register, RegisterTag};
use crate::row::Row;
use crate::{Executor, Phase};

/// Aggregate function opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Count,
}

/// An aggregate function applied to one attribute
#[derive(Debug, Clone, Copy)]
pub struct AggregateSpec {
    /// Function opcode
    pub op: AggregateOp,
    /// Target attribute index (ignored by Count, which counts rows)
    pub attr_index: usize,
}

impl AggregateSpec {
    pub fn min(attr_index: usize) -> Self {
        AggregateSpec {
            op: AggregateOp::Min,
            attr_index,
        }
    }

    pub fn max(attr_index: usize) -> Self {
        AggregateSpec {
            op: AggregateOp::Max,
            attr_index,
        }
    }

    pub fn sum(attr_index: usize) -> Self {
        AggregateSpec {
            op: AggregateOp::Sum,
            attr_index,
        }
    }

    pub fn count(attr_index: usize) -> Self {
        AggregateSpec {
            op: AggregateOp::Count,
            attr_index,
        }
    }
}

/// Accumulator for a single aggregate function
#[derive(Debug, Clone)]
enum Accumulator {
    Min(Option<Register>),
    Max(Option<Register>),
    Sum(i64),
    Count(i64),
}

impl Accumulator {
    fn new(op: AggregateOp) -> Self {
        match op {
            AggregateOp::Min => Accumulator::Min(None),
            AggregateOp::Max => Accumulator::Max(None),
            AggregateOp::Sum => Accumulator::Sum(0),
            AggregateOp::Count => Accumulator::Count(0),
        }
    }

    fn accumulate(&mut self, value: &Register) -> ExecutorResult<()> {
        match self {
            Accumulator::Min(min) => match min {
                None => *min = Some(value.clone()),
                Some(m) => {
                    if value.try_cmp(m)? == std::cmp::Ordering::Less {
                        *min = Some(value.clone());
                    }
                }
            },
            Accumulator::Max(max) => match max {
                None => *max = Some(value.clone()),
                Some(m) => {
                    if value.try_cmp(m)? == std::cmp::Ordering::Greater {
                        *max = Some(value.clone());
                    }
                }
            },
            Accumulator::Sum(sum) => {
                let v = value
                    .as_int()
                    .ok_or(ExecutorError::mismatch(RegisterTag::Int64, value.tag()))?;
                // Two's complement wrap-around on overflow
                *sum = sum.wrapping_add(v);
            }
            Accumulator::Count(n) => *n += 1,
        }
        Ok(())
    }

    /// The finalized value, or None for MIN/MAX that saw no rows
    fn finalize(&self) -> Option<Register> {
        match self {
            Accumulator::Min(min) => min.clone(),
            Accumulator::Max(max) => max.clone(),
            Accumulator::Sum(sum) => Some(Register::from_int(*sum)),
            Accumulator::Count(n) => Some(Register::from_int(*n)),
        }
    }
}

/// Hash aggregation executor
///
/// Partitions input rows by the group-by attributes (register equality over
/// the whole key tuple) and folds each aggregate over the group. Output rows
/// carry the group key followed by the aggregate values in descriptor order;
/// groups are emitted in ascending key order. With an empty group-by list a
/// single global group collects every row.
pub struct HashAggregate {
    /// Input executor
    input: Box<dyn Executor>,
    /// Group-by attribute indices, possibly empty
    group_by: Vec<usize>,
    /// Aggregate descriptors
    aggregates: Vec<AggregateSpec>,
    /// Finished output rows in emission order
    output: Vec<Row>,
    /// Drain / emit lifecycle
    phase: Phase,
}

impl HashAggregate {
    /// Create a new hash aggregation executor
    pub fn new(
        input: Box<dyn Executor>,
        group_by: Vec<usize>,
        aggregates: Vec<AggregateSpec>,
    ) -> Self {
        HashAggregate {
            input,
            group_by,
            aggregates,
            output: Vec::new(),
            phase: Phase::Drain,
        }
    }

    fn fresh_accumulators(&self) -> Vec<Accumulator> {
        self.aggregates
            .iter()
            .map(|spec| Accumulator::new(spec.op))
            .collect()
    }

    async fn drain(&mut self) -> ExecutorResult<()> {
        // Keyed by the group-key row itself: equality is decided on register
        // values, never on hashes alone.
        let mut groups: HashMap<Row, Vec<Accumulator>> = HashMap::new();

        if self.group_by.is_empty() {
            // The global group exists up front so SUM/COUNT over an empty
            // input still produce their identities.
            groups.insert(Row::empty(), self.fresh_accumulators());
        }

        while let Some(row) = self.input.next().await? {
            let key = row.project(&self.group_by)?;
            let accumulators = groups
                .entry(key)
                .or_insert_with(|| self.fresh_accumulators());
            for (i, spec) in self.aggregates.iter().enumerate() {
                accumulators[i].accumulate(row.get(spec.attr_index)?)?;
            }
        }

        // Ascending group-key order is part of the contract
        let mut entries: Vec<(Row, Vec<Accumulator>)> = groups.into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));

        for (key, accumulators) in entries {
            let mut row = key;
            let mut complete = true;
            for acc in &accumulators {
                match acc.finalize() {
                    Some(value) => row.push(value),
                    // MIN/MAX over the empty global group has no value; the
                    // group is treated as non-present.
                    None => complete = false,
                }
            }
            if complete {
                self.output.push(row);
            }
        }

        tracing::debug!(groups = self.output.len(), "aggregation groups computed");
        Ok(())
    }
}

#[async_trait]
impl Executor for HashAggregate {
    async fn open(&mut self) -> ExecutorResult<()> {
        self.output.clear();
        self.phase = Phase::Drain;
        self.input.open().await
    }

    async fn next(&mut self) -> ExecutorResult<Option<Row>> {
        if self.phase == Phase::Drain {
            self.drain().await?;
            self.phase = Phase::Emit(0);
        }
        match self.phase {
            Phase::Emit(pos) if pos < self.output.len() => {
                self.phase = Phase::Emit(pos + 1);
                Ok(Some(self.output[pos].clone()))
            }
            _ => {
                self.phase = Phase::Done;
                Ok(None)
            }
        }
    }

    async fn close(&mut self) -> ExecutorResult<()> {
        self.output.clear();
        self.phase = Phase::Done;
        self.input.close().await
    }
}
