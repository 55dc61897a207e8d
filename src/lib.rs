//! EdX: the classic ed line editor, rebuilt in Rust
//!
//! This library exposes the command-language engine — scanner, address
//! resolver, command dispatcher, global engine, substitution engine, and
//! undo log — for embedding and testing. The interactive binary is at
//! src/main.rs.

pub mod address;
pub mod buffer;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod format;
pub mod global;
pub mod host;
pub mod logger;
pub mod scanner;
pub mod session;
pub mod substitute;
pub mod undo;

// Re-export commonly used types for convenience
pub use buffer::LineBuffer;
pub use command::{Editor, Outcome, Suffix};
pub use error::{EdError, Result};
pub use host::{Host, ScriptedHost, SystemHost, WriteMode};
pub use scanner::Scanner;
pub use session::{Cursor, Session};
pub use undo::{UndoAction, UndoBatch, UndoKind, UndoLog};
