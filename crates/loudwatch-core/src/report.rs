//! Renders detection events onto the one-way output channel

use core::fmt::Write as _;

use embedded_io::{Error as _, ErrorKind};
use embedded_io_async::Write;
use thiserror_no_std::Error;

use crate::event::DetectionEvent;

/// Longest possible line: three `u32` values plus the fixed text.
pub const LINE_CAPACITY: usize = 64;

/// Error types for event reporting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("Detection line exceeded the 64 byte line buffer")]
    LineOverflow,

    #[error("Output channel write failed: {0:?}")]
    Write(ErrorKind),
}

/// Render `event` as a newline-terminated output line.
pub fn format_line(event: &DetectionEvent) -> Result<heapless::String<LINE_CAPACITY>, ReportError> {
    let mut line = heapless::String::new();
    writeln!(line, "{event}").map_err(|_| ReportError::LineOverflow)?;
    Ok(line)
}

/// Hands detection lines to an output channel.
///
/// The channel is fire-and-forget: a failed write is returned to the caller
/// and never retried.
pub struct Reporter<W> {
    writer: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub async fn report(&mut self, event: &DetectionEvent) -> Result<(), ReportError> {
        let line = format_line(event)?;

        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ReportError::Write(e.kind()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| ReportError::Write(e.kind()))
    }
}
