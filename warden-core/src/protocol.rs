//! Sentinel line protocol spoken over a daemon's stdout.
//!
//! A daemon reports the end of each command by printing one of two reserved
//! lines. Every other line is opaque payload for the caller.
//!
//! ```text
//! <payload>*
//! ~~~~COMMAND SUCCESFULL~~~~   | ~~~~COMMAND FAILED~~~~
//! ```
//!
//! The success sentinel is misspelled on the wire and must stay that way;
//! existing daemon scripts print it verbatim.

/// Version of the sentinel protocol below. Bump when a sentinel changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Terminates a command that completed successfully.
pub const SUCCESS_SENTINEL: &str = "~~~~COMMAND SUCCESFULL~~~~";

/// Terminates a command that failed.
pub const FAILURE_SENTINEL: &str = "~~~~COMMAND FAILED~~~~";

/// One classified line of daemon output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    Success,
    Failure,
    Data(&'a str),
}

impl<'a> Frame<'a> {
    /// Classify a single output line (terminator already stripped).
    ///
    /// Sentinels match anywhere in the line, so a daemon prompt glued in
    /// front of the marker still terminates the command. Success wins when
    /// both appear.
    pub fn classify(line: &'a str) -> Self {
        if line.contains(SUCCESS_SENTINEL) {
            Frame::Success
        } else if line.contains(FAILURE_SENTINEL) {
            Frame::Failure
        } else {
            Frame::Data(line)
        }
    }

    /// `true` for either sentinel.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Frame::Data(_))
    }
}
