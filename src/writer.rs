//! Line oriented sinks for human readable output.
//!
//! Writers never report failures to the caller. A writer that cannot
//! deliver a line deals with that itself.

use std::io;

pub trait Writer {
    fn write_line(&mut self, line: &str);

    fn write_blank(&mut self) {
        self.write_line("");
    }
}

impl<W: Writer + ?Sized> Writer for &mut W {
    fn write_line(&mut self, line: &str) {
        (**self).write_line(line)
    }
}

impl Writer for Vec<String> {
    fn write_line(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullWriter;

impl Writer for NullWriter {
    fn write_line(&mut self, _line: &str) {}
}

/// Writes each line to an `io::Write`, optionally prefixed
/// (for example with `"# "` to produce comment lines in a csv file).
#[derive(Debug)]
pub struct StreamWriter<W: io::Write> {
    stream: W,
    prefix: String,
}

impl<W: io::Write> StreamWriter<W> {
    pub fn new(stream: W) -> Self {
        Self::with_prefix(stream, "")
    }

    pub fn with_prefix(stream: W, prefix: impl Into<String>) -> Self {
        StreamWriter {
            stream,
            prefix: prefix.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.stream
    }
}

impl<W: io::Write> Writer for StreamWriter<W> {
    fn write_line(&mut self, line: &str) {
        if let Err(err) = writeln!(self.stream, "{}{}", self.prefix, line) {
            log::warn!("Dropping output line, stream write failed: {err}");
        }
    }
}
