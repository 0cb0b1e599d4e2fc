//! Clipboard capability

use std::io::Write;

use crate::errors::ConsoleError;

/// Somewhere to put text for the operator to paste
pub trait Clipboard: Send + Sync {
    fn copy(&self, text: &str) -> Result<(), ConsoleError>;
}

/// Prints the text on its own line, for `eval "$(fleetconsole --export=<id>)"`
pub struct StdoutClipboard;

impl Clipboard for StdoutClipboard {
    fn copy(&self, text: &str) -> Result<(), ConsoleError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", text)?;
        stdout.flush()?;
        Ok(())
    }
}
