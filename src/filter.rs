//! Filter executor
//!
//! Row selection against a single comparison predicate.

use std::cmp::Ordering;

use async_trait::async_trait;

use crate::error::ExecutorResult;
use crate::register::Register;
use crate::row::Row;
use crate::Executor;

/// Comparison opcode for predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Whether an ordering between left and right satisfies this opcode
    fn matches(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

/// Filter predicate
///
/// Three shapes: attribute against an integer constant, attribute against a
/// string constant, attribute against attribute. The compared registers must
/// share a variant; a cross-variant comparison fails with `TypeMismatch`
/// for every opcode, equality included.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Attribute compared to an integer constant
    IntConst {
        attr_index: usize,
        op: CompareOp,
        value: i64,
    },
    /// Attribute compared to a string constant
    StrConst {
        attr_index: usize,
        op: CompareOp,
        value: String,
    },
    /// Attribute compared to another attribute of the same row
    AttrAttr {
        left_index: usize,
        right_index: usize,
        op: CompareOp,
    },
}

impl Predicate {
    /// Evaluate the predicate against a row
    pub fn eval(&self, row: &Row) -> ExecutorResult<bool> {
        match self {
            Predicate::IntConst {
                attr_index,
                op,
                value,
            } => {
                let constant = Register::from_int(*value);
                let ordering = row.get(*attr_index)?.try_cmp(&constant)?;
                Ok(op.matches(ordering))
            }
            Predicate::StrConst {
                attr_index,
                op,
                value,
            } => {
                let constant = Register::from_string(value.clone());
                let ordering = row.get(*attr_index)?.try_cmp(&constant)?;
                Ok(op.matches(ordering))
            }
            Predicate::AttrAttr {
                left_index,
                right_index,
                op,
            } => {
                let ordering = row.get(*left_index)?.try_cmp(row.get(*right_index)?)?;
                Ok(op.matches(ordering))
            }
        }
    }
}

/// Filter executor
///
/// Pipelined: each `next` pulls input rows until one satisfies the
/// predicate or the input is exhausted. Non-matching rows never surface.
pub struct Filter {
    /// Input executor
    input: Box<dyn Executor>,
    /// Filter predicate
    predicate: Predicate,
}

impl Filter {
    /// Create a new filter executor
    pub fn new(input: Box<dyn Executor>, predicate: Predicate) -> Self {
        Filter { input, predicate }
    }
}

#[async_trait]
impl Executor for Filter {
    async fn open(&mut self) -> ExecutorResult<()> {
        self.input.open().await
    }

    async fn next(&mut self) -> ExecutorResult<Option<Row>> {
        loop {
            match self.input.next().await? {
                Some(row) => {
                    if self.predicate.eval(&row)? {
                        return Ok(Some(row));
                    }
                    // Row didn't match, continue to next
                }
                None => return Ok(None),
            }
        }
    }

    async fn close(&mut self) -> ExecutorResult<()> {
        self.input.close().await
    }
}
