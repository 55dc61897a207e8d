//! Error taxonomy for the command engine.
//!
//! Every failure the interpreter can produce maps to one of these kinds.
//! The REPL collapses any of them to the terse `?` marker unless explain
//! mode is on, in which case the `Display` text is shown (and `h` recalls
//! the message for the most recent failure).

use std::fmt;
use std::io;

/// Result type used throughout the engine.
pub type Result<T> = std::result::Result<T, EdError>;

/// All error kinds the interpreter can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdError {
    /// Address resolved outside the buffer, or a command rejected the range.
    InvalidAddress,
    /// Mark name is not a lowercase letter, or the mark is unset.
    InvalidMark,
    /// Pattern started with a character that cannot delimit one.
    InvalidPatternDelimiter,
    /// Move destination falls inside the source range.
    InvalidDestination,
    /// `m`/`t` without a destination address.
    DestinationExpected,
    /// A file operation needed a filename and none is set.
    NoCurrentFilename,
    /// Empty pattern with no previously compiled pattern to reuse.
    NoPreviousPattern,
    /// Empty replacement with no previously stored template to reuse.
    NoPreviousSubstitution,
    /// `&` in an interactive global, or `!!`, with nothing to repeat.
    NoPreviousCommand,
    /// Search or substitution matched nothing.
    NoMatch,
    /// A global command was issued while another global is running.
    CannotNestGlobal,
    /// Quit or edit refused once because the buffer has unsaved changes.
    FileModified,
    /// Command letter has no handler.
    UnknownCommand,
    /// Trailing input the command's grammar does not accept.
    InvalidCommandSuffix,
    /// The command takes no address but one was supplied.
    UnexpectedAddress,
    /// A print suffix was supplied to a command that accepts none.
    UnexpectedSuffix,
    /// An input-collection loop was abandoned by the user interrupt.
    Interrupted,
    /// Pass-through regex compilation or replacement-template failure.
    Regex(String),
    /// Pass-through host I/O failure.
    Io(String),
}

impl fmt::Display for EdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdError::InvalidAddress => write!(f, "invalid address"),
            EdError::InvalidMark => write!(f, "invalid mark character"),
            EdError::InvalidPatternDelimiter => write!(f, "invalid pattern delimiter"),
            EdError::InvalidDestination => write!(f, "invalid destination"),
            EdError::DestinationExpected => write!(f, "destination expected"),
            EdError::NoCurrentFilename => write!(f, "no current filename"),
            EdError::NoPreviousPattern => write!(f, "no previous pattern"),
            EdError::NoPreviousSubstitution => write!(f, "no previous substitution"),
            EdError::NoPreviousCommand => write!(f, "no previous command"),
            EdError::NoMatch => write!(f, "no match"),
            EdError::CannotNestGlobal => write!(f, "cannot nest global commands"),
            EdError::FileModified => write!(f, "warning: buffer modified"),
            EdError::UnknownCommand => write!(f, "unknown command"),
            EdError::InvalidCommandSuffix => write!(f, "invalid command suffix"),
            EdError::UnexpectedAddress => write!(f, "unexpected address"),
            EdError::UnexpectedSuffix => write!(f, "unexpected command suffix"),
            EdError::Interrupted => write!(f, "interrupted"),
            EdError::Regex(msg) => write!(f, "{msg}"),
            EdError::Io(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for EdError {}

impl From<io::Error> for EdError {
    fn from(err: io::Error) -> Self {
        EdError::Io(err.to_string())
    }
}

impl From<regex::Error> for EdError {
    fn from(err: regex::Error) -> Self {
        EdError::Regex(err.to_string())
    }
}
