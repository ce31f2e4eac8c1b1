//! Colored status lines for the terminal

use std::io::Write;

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

/// Kind of status line; decides the marker, its color and the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Info,
    Warning,
    Error,
}

impl Status {
    fn marker(self) -> (Color, &'static str) {
        match self {
            Status::Success => (Color::Green, "✓"),
            Status::Info => (Color::Cyan, "ℹ"),
            Status::Warning => (Color::Yellow, "⚠"),
            Status::Error => (Color::Red, "✗"),
        }
    }

    /// Warnings and errors go to stderr so piped output stays clean
    fn is_diagnostic(self) -> bool {
        matches!(self, Status::Warning | Status::Error)
    }
}

/// Write one status line to `out`
pub fn write_status<W: Write>(out: &mut W, status: Status, msg: &str) -> std::io::Result<()> {
    let (color, marker) = status.marker();
    crossterm::queue!(
        out,
        SetForegroundColor(color),
        Print(marker),
        ResetColor,
        Print(format!(" {}\n", msg))
    )?;
    out.flush()
}

/// Print one status line to stdout or stderr, depending on its kind
pub fn print_status(status: Status, msg: &str) {
    // Nothing useful to do if the terminal itself is gone
    let _ = if status.is_diagnostic() {
        write_status(&mut std::io::stderr(), status, msg)
    } else {
        write_status(&mut std::io::stdout(), status, msg)
    };
}

pub fn print_success(msg: &str) {
    print_status(Status::Success, msg);
}

pub fn print_info(msg: &str) {
    print_status(Status::Info, msg);
}

pub fn print_warning(msg: &str) {
    print_status(Status::Warning, msg);
}

pub fn print_error(msg: &str) {
    print_status(Status::Error, msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_has_marker_and_message() {
        let mut out = Vec::new();
        write_status(&mut out, Status::Error, "coordinator port in use").unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("✗"));
        assert!(text.ends_with(" coordinator port in use\n"));
    }

    #[test]
    fn test_diagnostics_go_to_stderr() {
        assert!(Status::Error.is_diagnostic());
        assert!(Status::Warning.is_diagnostic());
        assert!(!Status::Success.is_diagnostic());
        assert!(!Status::Info.is_diagnostic());
    }
}
