//! Where script output goes.
//!
//! `println` writes to the standard channel and debug instrumentation to the
//! side channel. Embedders and tests swap the process streams for a
//! [`CapturedOutput`].

use std::fmt;
use std::io::Write;

use parking_lot::Mutex;

pub trait OutputSink: Send + Sync {
    /// Write one line to the standard channel.
    fn print_line(&self, line: &str);

    /// Write one line to the side channel.
    fn debug_line(&self, line: &str);
}

/// The process's stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdStreams;

impl OutputSink for StdStreams {
    fn print_line(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        // a closed stdout is not a script error
        let _ = writeln!(out, "{line}");
    }

    fn debug_line(&self, line: &str) {
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }
}

/// Output collected in memory.
#[derive(Default)]
pub struct CapturedOutput {
    stdout: Mutex<String>,
    stderr: Mutex<String>,
}

impl CapturedOutput {
    pub fn stdout(&self) -> String {
        self.stdout.lock().clone()
    }

    pub fn stderr(&self) -> String {
        self.stderr.lock().clone()
    }

    /// Take everything printed so far, leaving the buffers empty.
    pub fn take(&self) -> (String, String) {
        (
            std::mem::take(&mut *self.stdout.lock()),
            std::mem::take(&mut *self.stderr.lock()),
        )
    }
}

impl OutputSink for CapturedOutput {
    fn print_line(&self, line: &str) {
        let mut out = self.stdout.lock();
        out.push_str(line);
        out.push('\n');
    }

    fn debug_line(&self, line: &str) {
        let mut err = self.stderr.lock();
        err.push_str(line);
        err.push('\n');
    }
}

impl fmt::Debug for CapturedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedOutput")
            .field("stdout", &self.stdout.lock().len())
            .field("stderr", &self.stderr.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_separates_channels() {
        let output = CapturedOutput::default();
        output.print_line("a");
        output.debug_line("b");
        output.print_line("");
        assert_eq!(output.stdout(), "a\n\n");
        assert_eq!(output.take(), ("a\n\n".to_string(), "b\n".to_string()));
        assert!(output.stdout().is_empty());
    }
}
