//! Session state.
//!
//! One explicit value owning everything a command can read or mutate:
//! the buffer, the cursor, the persisted regex memory, the global-engine
//! state, and the undo log. Threading this through every component call
//! (rather than ambient globals) is what lets tests run several
//! independent sessions side by side.

use crate::buffer::LineBuffer;
use crate::error::EdError;
use crate::undo::UndoLog;
use regex::Regex;

/// Default `z` window when neither config nor a command set one.
pub const DEFAULT_SCROLL: usize = 22;

/// The resolved address selection plus the persistent current line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Left end of the selection, 1-indexed, inclusive.
    pub first: usize,
    /// Right end of the selection, 1-indexed, inclusive.
    pub second: usize,
    /// The current line, persisted across commands.
    pub dot: usize,
    /// How many address atoms the last expression supplied (0, 1, or 2).
    pub addr_count: usize,
}

/// Last compiled pattern and last replacement template, persisted so an
/// empty pattern or replacement means "reuse previous".
#[derive(Debug, Default, Clone)]
pub struct RegexState {
    pub pattern: Option<Regex>,
    pub replacement: Option<String>,
}

/// State of the global-command engine.
#[derive(Debug, Default, Clone)]
pub struct GlobalState {
    /// True while a global is iterating; prevents nesting.
    pub active: bool,
    /// Candidate line numbers captured before any mutation began.
    pub match_list: Vec<usize>,
    /// Most recent nested command, for `&` in interactive mode.
    pub last_command: Option<String>,
}

/// Everything one editing session owns.
#[derive(Debug)]
pub struct Session {
    pub buffer: LineBuffer,
    pub cursor: Cursor,
    pub regex: RegexState,
    pub global: GlobalState,
    pub undo: UndoLog,
    /// Remembered `z` window size.
    pub scroll: usize,
    /// Prompt text shown by the REPL when enabled.
    pub prompt: String,
    /// Whether the prompt is shown; toggled by `P`.
    pub prompt_enabled: bool,
    /// Suppress byte-count diagnostics (`-s`).
    pub silent: bool,
    /// Verbose error explanations; toggled by `H`.
    pub verbose: bool,
    /// Set after a dirty-buffer warning; the same command issued again
    /// immediately afterwards bypasses the guard.
    pub quit_armed: bool,
    /// Scratch flag: true while dispatching the command that follows a
    /// warning, letting `q`/`e` honor the bypass.
    pub guard_bypassed: bool,
    /// Most recent error, recalled by `h`.
    pub last_error: Option<EdError>,
    /// Most recent shell escape, repeated by `!!`.
    pub last_shell: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            buffer: LineBuffer::new(),
            cursor: Cursor::default(),
            regex: RegexState::default(),
            global: GlobalState::default(),
            undo: UndoLog::new(),
            scroll: DEFAULT_SCROLL,
            prompt: "*".to_string(),
            prompt_enabled: false,
            silent: false,
            verbose: false,
            quit_armed: false,
            guard_bypassed: false,
            last_error: None,
            last_shell: None,
        }
    }
}
