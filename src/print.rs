//! Print executor
//!
//! Sink that renders each input row as a line of text.

use std::io::Write;

use async_trait::async_trait;

use crate::error::ExecutorResult;
use crate::register::Register;
use crate::row::Row;
use crate::Executor;

/// Print executor
///
/// Drives its input and writes every produced row to the sink: cells joined
/// by a single comma, terminated by a newline; integers in decimal, strings
/// verbatim, no quoting or escaping. A zero-column row writes nothing.
///
/// Print produces no tuples of its own: `next` reports the input's
/// row-available / end-of-stream result, carrying an empty row.
pub struct Print<W: Write + Send> {
    /// Input executor
    input: Box<dyn Executor>,
    /// Output sink
    writer: W,
}

impl<W: Write + Send> Print<W> {
    /// Create a new print executor over the given sink
    pub fn new(input: Box<dyn Executor>, writer: W) -> Self {
        Print { input, writer }
    }

    /// Get a reference to the underlying sink
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Consume the executor and return the sink
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Drive the input to end of stream, printing every row
    pub async fn run(&mut self) -> ExecutorResult<()> {
        while self.next().await?.is_some() {}
        Ok(())
    }

    fn write_row(&mut self, row: &Row) -> ExecutorResult<()> {
        if row.is_empty() {
            return Ok(());
        }
        let mut line = String::new();
        for (i, reg) in row.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            match reg {
                Register::Int(v) => line.push_str(&v.to_string()),
                Register::Str(s) => line.push_str(s),
            }
        }
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> Executor for Print<W> {
    async fn open(&mut self) -> ExecutorResult<()> {
        self.input.open().await
    }

    async fn next(&mut self) -> ExecutorResult<Option<Row>> {
        match self.input.next().await? {
            Some(row) => {
                self.write_row(&row)?;
                Ok(Some(Row::empty()))
            }
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> ExecutorResult<()> {
        self.writer.flush()?;
        self.input.close().await
    }
}
