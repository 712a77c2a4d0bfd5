//! Line-oriented console output.
//!
//! Results (completed downloads, artefacts already present, the run summary)
//! go to stdout; progress notes, skips, and warnings go to stderr. Both sinks
//! are injected so callers and tests choose where lines land.

use std::fmt::Display;
use std::io::Write;

/// Paired output sinks for one run.
///
/// # Examples
///
/// ```
/// use godl::output::Console;
///
/// let mut stdout = Vec::new();
/// let mut stderr = Vec::new();
/// let mut console = Console::new(&mut stdout, &mut stderr);
/// console.result("go1.21.0/go.tgz already downloaded");
/// console.progress("getting https://example.test/go.tgz");
/// drop(console);
///
/// assert_eq!(String::from_utf8(stdout).unwrap(), "go1.21.0/go.tgz already downloaded\n");
/// assert!(!stderr.is_empty());
/// ```
pub struct Console<'a> {
    stdout: &'a mut dyn Write,
    stderr: &'a mut dyn Write,
    quiet: bool,
}

impl<'a> Console<'a> {
    /// Wrap the given stdout and stderr sinks.
    pub fn new(stdout: &'a mut dyn Write, stderr: &'a mut dyn Write) -> Self {
        Self {
            stdout,
            stderr,
            quiet: false,
        }
    }

    /// Suppress progress lines; results and warnings are still written.
    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Write a result line to stdout.
    pub fn result(&mut self, message: impl Display) {
        write_line(self.stdout, message);
    }

    /// Write a progress line to stderr unless quiet.
    pub fn progress(&mut self, message: impl Display) {
        if !self.quiet {
            write_line(self.stderr, message);
        }
    }

    /// Write a warning line to stderr.
    pub fn warn(&mut self, message: impl Display) {
        write_line(self.stderr, message);
    }
}

/// Write one line to `sink`, ignoring write failures.
pub fn write_line(sink: &mut dyn Write, message: impl Display) {
    if writeln!(sink, "{message}").is_err() {
        // Best-effort output; a closed pipe must not abort the mirror.
    }
}
