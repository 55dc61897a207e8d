//! Command dispatcher and per-command handlers.
//!
//! A single input line is: optional address expression, one command
//! letter, optional display suffixes (`p`, `l`, `n` in any combination),
//! and optional command-specific arguments. Dispatch is a direct
//! letter-to-handler mapping resolved in one place; each handler consumes
//! its own arguments from the scanner, validates the resolved range
//! against its own requirements, performs the mutation, updates `dot`,
//! and hands any trailing display request to the shared display routine.
//!
//! Address and argument errors abort before any mutation. Once a handler
//! begins mutating, it runs to completion.

use crate::address;
use crate::error::{EdError, Result};
use crate::format;
use crate::host::{Host, WriteMode};
use crate::scanner::Scanner;
use crate::session::{Cursor, Session};
use crate::undo;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What the REPL should do after a command completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

/// Display request trailing a command: any combination of `p`, `l`, `n`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Suffix {
    pub print: bool,
    pub list: bool,
    pub number: bool,
}

impl Suffix {
    /// Consume any run of display-suffix characters.
    pub fn parse(sc: &mut Scanner) -> Self {
        let mut suffix = Suffix::default();
        loop {
            match sc.token() {
                Some('p') => suffix.print = true,
                Some('l') => suffix.list = true,
                Some('n') => suffix.number = true,
                _ => break,
            }
            sc.consume();
        }
        suffix
    }

    pub fn any(&self) -> bool {
        self.print || self.list || self.number
    }

    fn or(self, other: Suffix) -> Suffix {
        Suffix {
            print: self.print || other.print,
            list: self.list || other.list,
            number: self.number || other.number,
        }
    }
}

/// How the three input-collecting commands place their text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Append,
    Insert,
    Change,
}

/// The interpreter: one session plus the host it talks through.
pub struct Editor<H: Host> {
    pub session: Session,
    pub host: H,
}

impl<H: Host> Editor<H> {
    pub fn new(host: H) -> Self {
        Self {
            session: Session::new(),
            host,
        }
    }

    /// Parse and run one top-level command line. Opens and commits one
    /// undo batch around the whole dispatch, so a global invocation is a
    /// single undo unit.
    pub fn execute(&mut self, line: &str) -> Result<Outcome> {
        self.session.undo.begin(self.session.cursor.dot);
        let result = self.run_command(line);
        self.session.undo.commit();
        result
    }

    /// One full parse + dispatch cycle. Re-entered by the global engine
    /// for each synthesized sub-command, without an undo boundary.
    pub(crate) fn run_command(&mut self, line: &str) -> Result<Outcome> {
        self.session.guard_bypassed = std::mem::take(&mut self.session.quit_armed);
        let mut sc = Scanner::new(line);
        address::resolve(&mut self.session, &mut sc)?;
        self.dispatch(&mut sc)
    }

    /// Record and report an error on the output stream: the terse `?`
    /// marker, or the full message in verbose mode.
    pub fn report_error(&mut self, err: EdError) {
        debug!(error = %err, "command failed");
        self.session.last_error = Some(err.clone());
        let msg = if self.session.verbose {
            err.to_string()
        } else {
            "?".to_string()
        };
        let _ = self.host.write_line(&msg);
    }

    fn dispatch(&mut self, sc: &mut Scanner) -> Result<Outcome> {
        sc.skip_blanks();
        let Some(letter) = sc.token() else {
            return self.cmd_step();
        };
        sc.consume();
        debug!(command = %letter, "dispatch");
        match letter {
            'a' => self.cmd_input(sc, InputMode::Append),
            'i' => self.cmd_input(sc, InputMode::Insert),
            'c' => self.cmd_input(sc, InputMode::Change),
            'd' => self.cmd_delete(sc),
            'e' => self.cmd_edit(sc, false),
            'E' => self.cmd_edit(sc, true),
            'f' => self.cmd_filename(sc),
            'g' => self.cmd_global(sc, false, false),
            'G' => self.cmd_global(sc, true, false),
            'v' => self.cmd_global(sc, false, true),
            'V' => self.cmd_global(sc, true, true),
            'h' => self.cmd_explain(sc),
            'H' => self.cmd_explain_toggle(sc),
            'j' => self.cmd_join(sc),
            'k' => self.cmd_mark(sc),
            'l' | 'n' | 'p' => self.cmd_print(sc, letter),
            'm' => self.cmd_move(sc),
            'P' => self.cmd_prompt(sc),
            'q' => self.cmd_quit(sc, false),
            'Q' => self.cmd_quit(sc, true),
            'r' => self.cmd_read(sc),
            's' => self.cmd_substitute(sc),
            't' => self.cmd_transfer(sc),
            'u' => self.cmd_undo(sc),
            'w' => self.cmd_write(sc, false),
            'W' => self.cmd_write(sc, true),
            'z' => self.cmd_scroll(sc),
            '=' => self.cmd_line_count(sc),
            '!' => self.cmd_shell(sc),
            _ => Err(EdError::UnknownCommand),
        }
    }

    // ----- shared helpers -------------------------------------------------

    pub(crate) fn emit(&mut self, text: &str) -> Result<()> {
        self.host.write_line(text).map_err(EdError::from)
    }

    /// The resolved range, re-validated as a non-empty, non-inverted
    /// window inside the buffer.
    pub(crate) fn check_range(&self) -> Result<(usize, usize)> {
        let Cursor { first, second, .. } = self.session.cursor;
        if first < 1 || first > second || second > self.session.buffer.len() {
            return Err(EdError::InvalidAddress);
        }
        Ok((first, second))
    }

    /// The resolved single address, re-validated as an existing line.
    fn check_line(&self) -> Result<usize> {
        let line = self.session.cursor.second;
        if line < 1 || line > self.session.buffer.len() {
            return Err(EdError::InvalidAddress);
        }
        Ok(line)
    }

    fn no_address(&self) -> Result<()> {
        if self.session.cursor.addr_count != 0 {
            return Err(EdError::UnexpectedAddress);
        }
        Ok(())
    }

    /// The command's own grammar is exhausted; anything left is junk.
    fn end_of_command(&self, sc: &mut Scanner) -> Result<()> {
        sc.skip_blanks();
        match sc.token() {
            None => Ok(()),
            Some('p') | Some('l') | Some('n') => Err(EdError::UnexpectedSuffix),
            Some(_) => Err(EdError::InvalidCommandSuffix),
        }
    }

    /// Parse the trailing destination address for `m` and `t`.
    fn destination(&mut self, sc: &mut Scanner) -> Result<usize> {
        let saved = self.session.cursor;
        address::resolve(&mut self.session, sc)?;
        let resolved = self.session.cursor;
        self.session.cursor.first = saved.first;
        self.session.cursor.second = saved.second;
        self.session.cursor.addr_count = saved.addr_count;
        if resolved.addr_count == 0 {
            return Err(EdError::DestinationExpected);
        }
        Ok(resolved.second)
    }

    fn filename_arg(&self, sc: &mut Scanner) -> Option<PathBuf> {
        sc.skip_blanks();
        let rest = sc.rest();
        if rest.is_empty() {
            None
        } else {
            Some(PathBuf::from(rest))
        }
    }

    fn default_path(&self) -> Result<PathBuf> {
        self.session
            .buffer
            .path
            .clone()
            .ok_or(EdError::NoCurrentFilename)
    }

    /// Print the window `[first, second]` under the given suffix.
    pub(crate) fn display_range(
        &mut self,
        first: usize,
        second: usize,
        suffix: Suffix,
    ) -> Result<()> {
        if first < 1 || first > second || second > self.session.buffer.len() {
            return Err(EdError::InvalidAddress);
        }
        for n in first..=second {
            let text = self.session.buffer.line(n).unwrap_or("").to_string();
            let rendered = format::render(n, &text, suffix);
            self.emit(&rendered)?;
        }
        Ok(())
    }

    /// Honor a trailing display suffix by showing the resulting `dot`.
    pub(crate) fn display_suffix(&mut self, suffix: Suffix) -> Result<()> {
        if !suffix.any() {
            return Ok(());
        }
        let dot = self.session.cursor.dot;
        self.display_range(dot, dot, suffix)
    }

    /// Read input lines until a lone `.` or end of input. The interrupt
    /// flag is consulted at each read boundary; it abandons the loop
    /// without inserting anything.
    fn collect_input(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            let line = match self.host.read_line(None) {
                Ok(l) => l,
                Err(e) => {
                    if self.host.take_interrupt() {
                        return Err(EdError::Interrupted);
                    }
                    return Err(e.into());
                }
            };
            if self.host.take_interrupt() {
                return Err(EdError::Interrupted);
            }
            match line {
                None => break,
                Some(l) if l == "." => break,
                Some(l) => lines.push(l),
            }
        }
        Ok(lines)
    }

    // ----- handlers -------------------------------------------------------

    /// Bare address: print it. Bare newline: advance one line and print.
    fn cmd_step(&mut self) -> Result<Outcome> {
        let target = if self.session.cursor.addr_count == 0 {
            self.session.cursor.dot + 1
        } else {
            self.session.cursor.second
        };
        if target < 1 || target > self.session.buffer.len() {
            return Err(EdError::InvalidAddress);
        }
        self.session.cursor.dot = target;
        let text = self.session.buffer.line(target).unwrap_or("").to_string();
        self.emit(&text)?;
        Ok(Outcome::Continue)
    }

    fn cmd_input(&mut self, sc: &mut Scanner, mode: InputMode) -> Result<Outcome> {
        let suffix = Suffix::parse(sc);
        self.end_of_command(sc)?;
        let at = match mode {
            InputMode::Append => self.session.cursor.second,
            InputMode::Insert => self.session.cursor.second.saturating_sub(1),
            InputMode::Change => {
                let (first, second) = self.check_range()?;
                let removed = self.session.buffer.remove(first, second);
                self.session.undo.record_delete(first, second, removed);
                first - 1
            }
        };
        let lines = self.collect_input()?;
        let count = lines.len();
        if count > 0 {
            self.session.buffer.insert(at, lines);
            self.session.undo.record_add(at + 1, at + count);
            self.session.cursor.dot = at + count;
        } else if mode == InputMode::Change {
            // Change with no replacement text degenerates to a delete.
            self.session.cursor.dot = (at + 1).min(self.session.buffer.len());
        }
        self.display_suffix(suffix)?;
        Ok(Outcome::Continue)
    }

    fn cmd_delete(&mut self, sc: &mut Scanner) -> Result<Outcome> {
        let suffix = Suffix::parse(sc);
        self.end_of_command(sc)?;
        let (first, second) = self.check_range()?;
        let removed = self.session.buffer.remove(first, second);
        self.session.undo.record_delete(first, second, removed);
        self.session.cursor.dot = first.min(self.session.buffer.len());
        self.display_suffix(suffix)?;
        Ok(Outcome::Continue)
    }

    fn cmd_move(&mut self, sc: &mut Scanner) -> Result<Outcome> {
        let dest = self.destination(sc)?;
        let suffix = Suffix::parse(sc);
        self.end_of_command(sc)?;
        let (first, second) = self.check_range()?;
        if dest >= first && dest <= second {
            return Err(EdError::InvalidDestination);
        }
        let snapshot = self.session.buffer.lines_in(first, second).to_vec();
        let last = self.session.buffer.move_range(first, second, dest);
        let count = second - first + 1;
        self.session.undo.record_delete(first, second, snapshot);
        self.session.undo.record_add(last - count + 1, last);
        self.session.cursor.dot = last;
        self.display_suffix(suffix)?;
        Ok(Outcome::Continue)
    }

    fn cmd_transfer(&mut self, sc: &mut Scanner) -> Result<Outcome> {
        let dest = self.destination(sc)?;
        let suffix = Suffix::parse(sc);
        self.end_of_command(sc)?;
        let (first, second) = self.check_range()?;
        let last = self.session.buffer.copy_range(first, second, dest);
        let count = second - first + 1;
        self.session.undo.record_add(dest + 1, dest + count);
        self.session.cursor.dot = last;
        self.display_suffix(suffix)?;
        Ok(Outcome::Continue)
    }

    fn cmd_join(&mut self, sc: &mut Scanner) -> Result<Outcome> {
        let suffix = Suffix::parse(sc);
        self.end_of_command(sc)?;
        let (mut first, mut second) = (self.session.cursor.first, self.session.cursor.second);
        if self.session.cursor.addr_count == 0 {
            first = self.session.cursor.dot;
            second = self.session.cursor.dot + 1;
        }
        if first < 1 || first > second || second > self.session.buffer.len() {
            return Err(EdError::InvalidAddress);
        }
        if first < second {
            let snapshot = self.session.buffer.lines_in(first, second).to_vec();
            self.session.buffer.join(first, second);
            self.session.undo.record_delete(first, second, snapshot);
            self.session.undo.record_add(first, first);
            self.session.cursor.dot = first;
        }
        self.display_suffix(suffix)?;
        Ok(Outcome::Continue)
    }

    fn cmd_mark(&mut self, sc: &mut Scanner) -> Result<Outcome> {
        let name = sc.consume().ok_or(EdError::InvalidMark)?;
        if !name.is_ascii_lowercase() {
            return Err(EdError::InvalidMark);
        }
        let suffix = Suffix::parse(sc);
        self.end_of_command(sc)?;
        let line = self.check_line()?;
        self.session.buffer.set_mark(name, line)?;
        self.display_suffix(suffix)?;
        Ok(Outcome::Continue)
    }

    fn cmd_print(&mut self, sc: &mut Scanner, letter: char) -> Result<Outcome> {
        let mut suffix = Suffix::default();
        match letter {
            'l' => suffix.list = true,
            'n' => suffix.number = true,
            _ => suffix.print = true,
        }
        suffix = suffix.or(Suffix::parse(sc));
        self.end_of_command(sc)?;
        let (first, second) = self.check_range()?;
        self.display_range(first, second, suffix)?;
        self.session.cursor.dot = second;
        Ok(Outcome::Continue)
    }

    fn cmd_line_count(&mut self, sc: &mut Scanner) -> Result<Outcome> {
        let suffix = Suffix::parse(sc);
        self.end_of_command(sc)?;
        let len = self.session.buffer.len();
        self.emit(&len.to_string())?;
        self.display_suffix(suffix)?;
        Ok(Outcome::Continue)
    }

    fn cmd_scroll(&mut self, sc: &mut Scanner) -> Result<Outcome> {
        if let Some(n) = sc.number() {
            if n == 0 {
                return Err(EdError::InvalidCommandSuffix);
            }
            self.session.scroll = n;
        }
        let mut suffix = Suffix::parse(sc);
        if !suffix.any() {
            suffix.print = true;
        }
        self.end_of_command(sc)?;
        let len = self.session.buffer.len();
        let start = self.session.cursor.second;
        if start >= len {
            return Err(EdError::InvalidAddress);
        }
        let end = (start + self.session.scroll).min(len);
        self.display_range(start + 1, end, suffix)?;
        self.session.cursor.dot = end;
        Ok(Outcome::Continue)
    }

    fn cmd_undo(&mut self, sc: &mut Scanner) -> Result<Outcome> {
        self.no_address()?;
        let suffix = Suffix::parse(sc);
        self.end_of_command(sc)?;
        let batch = self.session.undo.pop().ok_or(EdError::NoPreviousCommand)?;
        let dot = undo::reverse(&batch, &mut self.session.buffer);
        self.session.cursor.dot = dot;
        self.display_suffix(suffix)?;
        Ok(Outcome::Continue)
    }

    fn cmd_edit(&mut self, sc: &mut Scanner, force: bool) -> Result<Outcome> {
        self.no_address()?;
        let arg = self.filename_arg(sc);
        if !force && self.session.buffer.dirty && !self.session.guard_bypassed {
            self.session.quit_armed = true;
            return Err(EdError::FileModified);
        }
        let path = match arg {
            Some(p) => p,
            None => self.default_path()?,
        };
        self.open(&path)?;
        Ok(Outcome::Continue)
    }

    /// Replace the buffer with the contents of `path`, which also becomes
    /// the default filename. A missing file leaves an empty buffer so the
    /// file can be created by a later `w`.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        self.session.buffer.path = Some(path.to_path_buf());
        self.session.undo.clear();
        match self.host.read_file(path) {
            Ok((lines, bytes)) => {
                let len = lines.len();
                self.session.buffer.set_lines(lines);
                self.session.cursor = Cursor {
                    first: len,
                    second: len,
                    dot: len,
                    addr_count: 0,
                };
                debug!(path = %path.display(), lines = len, "opened file");
                if !self.session.silent {
                    self.emit(&bytes.to_string())?;
                }
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.session.buffer.set_lines(Vec::new());
                self.session.cursor = Cursor::default();
                Err(EdError::Io(format!("{}: no such file", path.display())))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn cmd_filename(&mut self, sc: &mut Scanner) -> Result<Outcome> {
        self.no_address()?;
        if let Some(p) = self.filename_arg(sc) {
            self.session.buffer.path = Some(p);
        }
        let path = self.default_path()?;
        let display = path.display().to_string();
        self.emit(&display)?;
        Ok(Outcome::Continue)
    }

    fn cmd_read(&mut self, sc: &mut Scanner) -> Result<Outcome> {
        let path = match self.filename_arg(sc) {
            Some(p) => p,
            None => self.default_path()?,
        };
        let at = if self.session.cursor.addr_count == 0 {
            self.session.buffer.len()
        } else {
            self.session.cursor.second
        };
        let (lines, bytes) = self.host.read_file(&path).map_err(EdError::from)?;
        let count = lines.len();
        if count > 0 {
            self.session.buffer.insert(at, lines);
            self.session.undo.record_add(at + 1, at + count);
            self.session.cursor.dot = at + count;
        }
        if self.session.buffer.path.is_none() {
            self.session.buffer.path = Some(path);
        }
        if !self.session.silent {
            self.emit(&bytes.to_string())?;
        }
        Ok(Outcome::Continue)
    }

    fn cmd_write(&mut self, sc: &mut Scanner, append: bool) -> Result<Outcome> {
        let quit = !append && sc.accept('q');
        let arg = self.filename_arg(sc);
        let len = self.session.buffer.len();
        let (first, second) = if self.session.cursor.addr_count == 0 {
            (1.min(len), len)
        } else {
            self.check_range()?
        };
        let path = match arg {
            Some(p) => p,
            None => self.default_path()?,
        };
        let lines = self.session.buffer.lines_in(first, second).to_vec();
        let mode = if append {
            WriteMode::Append
        } else {
            WriteMode::Truncate
        };
        let bytes = self
            .host
            .write_file(&path, &lines, mode)
            .map_err(EdError::from)?;
        if self.session.buffer.path.is_none() {
            self.session.buffer.path = Some(path);
        }
        if first <= 1 && second == len {
            self.session.buffer.dirty = false;
        }
        if !self.session.silent {
            self.emit(&bytes.to_string())?;
        }
        if quit {
            return Ok(Outcome::Quit);
        }
        Ok(Outcome::Continue)
    }

    fn cmd_quit(&mut self, sc: &mut Scanner, force: bool) -> Result<Outcome> {
        self.no_address()?;
        self.end_of_command(sc)?;
        if !force && self.session.buffer.dirty && !self.session.guard_bypassed {
            self.session.quit_armed = true;
            return Err(EdError::FileModified);
        }
        Ok(Outcome::Quit)
    }

    fn cmd_shell(&mut self, sc: &mut Scanner) -> Result<Outcome> {
        self.no_address()?;
        let raw = sc.rest();
        if raw.is_empty() {
            return Err(EdError::InvalidCommandSuffix);
        }
        let command = if raw == "!" {
            self.session
                .last_shell
                .clone()
                .ok_or(EdError::NoPreviousCommand)?
        } else {
            self.expand_percent(&raw)?
        };
        self.session.last_shell = Some(command.clone());
        debug!(command = %command, "shell escape");
        let lines = self.host.run_shell(&command).map_err(EdError::from)?;
        for line in lines {
            self.emit(&line)?;
        }
        self.emit("!")?;
        Ok(Outcome::Continue)
    }

    /// Expand unescaped `%` into the default filename; `\%` is literal.
    fn expand_percent(&self, raw: &str) -> Result<String> {
        let mut out = String::new();
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('%') => out.push('%'),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => out.push('\\'),
                },
                '%' => {
                    let path = self
                        .session
                        .buffer
                        .path
                        .as_ref()
                        .ok_or(EdError::NoCurrentFilename)?;
                    out.push_str(&path.display().to_string());
                }
                c => out.push(c),
            }
        }
        Ok(out)
    }

    fn cmd_explain(&mut self, sc: &mut Scanner) -> Result<Outcome> {
        self.no_address()?;
        self.end_of_command(sc)?;
        if let Some(err) = self.session.last_error.clone() {
            self.emit(&err.to_string())?;
        }
        Ok(Outcome::Continue)
    }

    fn cmd_explain_toggle(&mut self, sc: &mut Scanner) -> Result<Outcome> {
        self.no_address()?;
        self.end_of_command(sc)?;
        self.session.verbose = !self.session.verbose;
        if self.session.verbose {
            if let Some(err) = self.session.last_error.clone() {
                self.emit(&err.to_string())?;
            }
        }
        Ok(Outcome::Continue)
    }

    fn cmd_prompt(&mut self, sc: &mut Scanner) -> Result<Outcome> {
        self.no_address()?;
        self.end_of_command(sc)?;
        self.session.prompt_enabled = !self.session.prompt_enabled;
        Ok(Outcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ScriptedHost;

    fn editor_with(lines: &[&str]) -> Editor<ScriptedHost> {
        let mut ed = Editor::new(ScriptedHost::new());
        ed.session
            .buffer
            .set_lines(lines.iter().map(|s| s.to_string()).collect());
        ed.session.cursor.dot = ed.session.buffer.len();
        ed
    }

    fn lines(ed: &Editor<ScriptedHost>) -> Vec<String> {
        ed.session.buffer.all_lines().to_vec()
    }

    #[test]
    fn test_delete_range_updates_dot() {
        let mut ed = editor_with(&["A", "B", "C"]);
        ed.execute("2,3d").unwrap();
        assert_eq!(lines(&ed), vec!["A"]);
        assert_eq!(ed.session.cursor.dot, 1);
    }

    #[test]
    fn test_delete_first_line_dot_is_following_line() {
        let mut ed = editor_with(&["A", "B", "C"]);
        ed.execute("1d").unwrap();
        assert_eq!(lines(&ed), vec!["B", "C"]);
        assert_eq!(ed.session.cursor.dot, 1);
    }

    #[test]
    fn test_delete_on_empty_buffer_is_invalid() {
        let mut ed = editor_with(&[]);
        assert_eq!(ed.execute("d"), Err(EdError::InvalidAddress));
    }

    #[test]
    fn test_append_reads_until_dot_sentinel() {
        let mut ed = editor_with(&["A"]);
        ed.host.input = ScriptedHost::with_input(&["X", "Y", "."]).input;
        ed.execute("1a").unwrap();
        assert_eq!(lines(&ed), vec!["A", "X", "Y"]);
        assert_eq!(ed.session.cursor.dot, 3);
        assert!(ed.session.buffer.dirty);
    }

    #[test]
    fn test_append_at_zero_prepends() {
        let mut ed = editor_with(&["B"]);
        ed.host.input = ScriptedHost::with_input(&["A", "."]).input;
        ed.execute("0a").unwrap();
        assert_eq!(lines(&ed), vec!["A", "B"]);
    }

    #[test]
    fn test_insert_before_line() {
        let mut ed = editor_with(&["A", "C"]);
        ed.host.input = ScriptedHost::with_input(&["B", "."]).input;
        ed.execute("2i").unwrap();
        assert_eq!(lines(&ed), vec!["A", "B", "C"]);
        assert_eq!(ed.session.cursor.dot, 2);
    }

    #[test]
    fn test_insert_on_empty_buffer_behaves_as_append() {
        let mut ed = editor_with(&[]);
        ed.host.input = ScriptedHost::with_input(&["X", "."]).input;
        ed.execute("i").unwrap();
        assert_eq!(lines(&ed), vec!["X"]);
    }

    #[test]
    fn test_change_replaces_range() {
        let mut ed = editor_with(&["A", "B", "C"]);
        ed.host.input = ScriptedHost::with_input(&["X", "."]).input;
        ed.execute("1,2c").unwrap();
        assert_eq!(lines(&ed), vec!["X", "C"]);
        assert_eq!(ed.session.cursor.dot, 1);
    }

    #[test]
    fn test_change_with_no_text_is_a_delete() {
        let mut ed = editor_with(&["A", "B", "C"]);
        ed.host.input = ScriptedHost::with_input(&["."]).input;
        ed.execute("2c").unwrap();
        assert_eq!(lines(&ed), vec!["A", "C"]);
        assert_eq!(ed.session.cursor.dot, 2);
    }

    #[test]
    fn test_interrupt_abandons_input_collection() {
        let mut ed = editor_with(&["A"]);
        ed.host.input = ScriptedHost::with_input(&["X"]).input;
        ed.host.interrupt = true;
        assert_eq!(ed.execute("a"), Err(EdError::Interrupted));
        assert_eq!(lines(&ed), vec!["A"]);
    }

    #[test]
    fn test_move_to_head() {
        let mut ed = editor_with(&["A", "B", "C", "D"]);
        ed.execute("3,4m0").unwrap();
        assert_eq!(lines(&ed), vec!["C", "D", "A", "B"]);
        assert_eq!(ed.session.cursor.dot, 2);
    }

    #[test]
    fn test_move_into_source_range_is_invalid_destination() {
        let mut ed = editor_with(&["A", "B", "C"]);
        assert_eq!(ed.execute("1,2m2"), Err(EdError::InvalidDestination));
        assert_eq!(lines(&ed), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_move_without_destination() {
        let mut ed = editor_with(&["A", "B"]);
        assert_eq!(ed.execute("1m"), Err(EdError::DestinationExpected));
    }

    #[test]
    fn test_transfer_copies_range() {
        let mut ed = editor_with(&["A", "B", "C", "D"]);
        ed.execute("1,2t3").unwrap();
        assert_eq!(lines(&ed), vec!["A", "B", "C", "A", "B", "D"]);
        assert_eq!(ed.session.cursor.dot, 5);
    }

    #[test]
    fn test_transfer_to_zero() {
        let mut ed = editor_with(&["A", "B"]);
        ed.execute("2t0").unwrap();
        assert_eq!(lines(&ed), vec!["B", "A", "B"]);
        assert_eq!(ed.session.cursor.dot, 1);
    }

    #[test]
    fn test_join_defaults_to_dot_and_next() {
        let mut ed = editor_with(&["foo", "bar", "baz"]);
        ed.session.cursor.dot = 1;
        ed.execute("j").unwrap();
        assert_eq!(lines(&ed), vec!["foobar", "baz"]);
        assert_eq!(ed.session.cursor.dot, 1);
    }

    #[test]
    fn test_join_single_line_is_noop() {
        let mut ed = editor_with(&["A", "B"]);
        ed.execute("2,2j").unwrap();
        assert_eq!(lines(&ed), vec!["A", "B"]);
    }

    #[test]
    fn test_join_at_end_of_buffer_is_invalid() {
        let mut ed = editor_with(&["A"]);
        ed.session.cursor.dot = 1;
        assert_eq!(ed.execute("j"), Err(EdError::InvalidAddress));
    }

    #[test]
    fn test_mark_and_address_back() {
        let mut ed = editor_with(&["A", "B", "C"]);
        ed.execute("3ka").unwrap();
        ed.execute("'ap").unwrap();
        assert_eq!(ed.host.output, vec!["C"]);
        assert_eq!(ed.session.cursor.dot, 3);
    }

    #[test]
    fn test_stale_mark_fails_after_deletions() {
        let mut ed = editor_with(&["A", "B", "C"]);
        ed.execute("3ka").unwrap();
        ed.execute("1,2d").unwrap();
        assert_eq!(ed.execute("'ap"), Err(EdError::InvalidAddress));
    }

    #[test]
    fn test_print_range() {
        let mut ed = editor_with(&["A", "B", "C"]);
        ed.execute("1,2p").unwrap();
        assert_eq!(ed.host.output, vec!["A", "B"]);
        assert_eq!(ed.session.cursor.dot, 2);
    }

    #[test]
    fn test_numbered_print() {
        let mut ed = editor_with(&["A", "B"]);
        ed.execute(",n").unwrap();
        assert_eq!(ed.host.output, vec!["1\tA", "2\tB"]);
    }

    #[test]
    fn test_list_print() {
        let mut ed = editor_with(&["a\\b"]);
        ed.execute("1l").unwrap();
        assert_eq!(ed.host.output, vec!["a\\\\b$"]);
    }

    #[test]
    fn test_line_count_reports_total_length() {
        let mut ed = editor_with(&["A", "B", "C"]);
        ed.execute("2=").unwrap();
        ed.execute("=").unwrap();
        assert_eq!(ed.host.output, vec!["3", "3"]);
    }

    #[test]
    fn test_line_count_is_idempotent() {
        let mut ed = editor_with(&["A", "B"]);
        ed.execute("=").unwrap();
        ed.execute("=").unwrap();
        assert_eq!(ed.host.output, vec!["2", "2"]);
    }

    #[test]
    fn test_scroll_window_and_memory() {
        let mut ed = editor_with(&["1", "2", "3", "4", "5"]);
        ed.session.cursor.dot = 1;
        ed.execute("z2").unwrap();
        assert_eq!(ed.host.output, vec!["2", "3"]);
        assert_eq!(ed.session.cursor.dot, 3);
        // The count is remembered by the next bare z.
        ed.execute("z").unwrap();
        assert_eq!(ed.host.output, vec!["2", "3", "4", "5"]);
        assert_eq!(ed.session.cursor.dot, 5);
    }

    #[test]
    fn test_scroll_past_end_is_invalid() {
        let mut ed = editor_with(&["A"]);
        ed.session.cursor.dot = 1;
        assert_eq!(ed.execute("z"), Err(EdError::InvalidAddress));
    }

    #[test]
    fn test_bare_address_prints_and_moves_dot() {
        let mut ed = editor_with(&["A", "B"]);
        ed.execute("1").unwrap();
        assert_eq!(ed.host.output, vec!["A"]);
        assert_eq!(ed.session.cursor.dot, 1);
    }

    #[test]
    fn test_bare_newline_steps_forward() {
        let mut ed = editor_with(&["A", "B"]);
        ed.session.cursor.dot = 1;
        ed.execute("").unwrap();
        assert_eq!(ed.host.output, vec!["B"]);
        assert_eq!(ed.session.cursor.dot, 2);
        assert_eq!(ed.execute(""), Err(EdError::InvalidAddress));
    }

    #[test]
    fn test_unknown_command() {
        let mut ed = editor_with(&["A"]);
        assert_eq!(ed.execute("1y"), Err(EdError::UnknownCommand));
    }

    #[test]
    fn test_trailing_junk_is_invalid_suffix() {
        let mut ed = editor_with(&["A"]);
        assert_eq!(ed.execute("1dx"), Err(EdError::InvalidCommandSuffix));
        assert_eq!(lines(&ed), vec!["A"], "no mutation on suffix errors");
    }

    #[test]
    fn test_suffix_on_command_that_takes_none() {
        let mut ed = editor_with(&["A"]);
        assert_eq!(ed.execute("qp"), Err(EdError::UnexpectedSuffix));
    }

    #[test]
    fn test_address_on_command_that_takes_none() {
        let mut ed = editor_with(&["A"]);
        assert_eq!(ed.execute("1q"), Err(EdError::UnexpectedAddress));
    }

    #[test]
    fn test_delete_with_print_suffix_shows_new_dot() {
        let mut ed = editor_with(&["A", "B"]);
        ed.execute("1dp").unwrap();
        assert_eq!(ed.host.output, vec!["B"]);
    }

    #[test]
    fn test_quit_guard_arms_and_disarms() {
        let mut ed = editor_with(&["A"]);
        ed.session.buffer.dirty = true;
        assert_eq!(ed.execute("q"), Err(EdError::FileModified));
        assert_eq!(ed.execute("q"), Ok(Outcome::Quit));
    }

    #[test]
    fn test_quit_guard_rearms_after_intervening_command() {
        let mut ed = editor_with(&["A"]);
        ed.session.buffer.dirty = true;
        assert_eq!(ed.execute("q"), Err(EdError::FileModified));
        ed.execute("p").unwrap();
        assert_eq!(ed.execute("q"), Err(EdError::FileModified));
    }

    #[test]
    fn test_unconditional_quit_ignores_dirty() {
        let mut ed = editor_with(&["A"]);
        ed.session.buffer.dirty = true;
        assert_eq!(ed.execute("Q"), Ok(Outcome::Quit));
    }

    #[test]
    fn test_clean_quit() {
        let mut ed = editor_with(&["A"]);
        assert_eq!(ed.execute("q"), Ok(Outcome::Quit));
    }

    #[test]
    fn test_write_clears_dirty_and_reports_bytes() {
        let mut ed = editor_with(&["aa", "b"]);
        ed.session.buffer.dirty = true;
        ed.execute("w out.txt").unwrap();
        assert_eq!(ed.host.output, vec!["5"]);
        assert!(!ed.session.buffer.dirty);
        assert_eq!(
            ed.host.files[Path::new("out.txt")],
            vec!["aa".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_partial_write_keeps_dirty() {
        let mut ed = editor_with(&["A", "B"]);
        ed.session.buffer.dirty = true;
        ed.execute("1w out.txt").unwrap();
        assert!(ed.session.buffer.dirty);
    }

    #[test]
    fn test_write_append_mode() {
        let mut ed = editor_with(&["B"]);
        ed.host
            .files
            .insert(PathBuf::from("out.txt"), vec!["A".to_string()]);
        ed.execute("W out.txt").unwrap();
        assert_eq!(
            ed.host.files[Path::new("out.txt")],
            vec!["A".to_string(), "B".to_string()]
        );
    }

    #[test]
    fn test_write_quit() {
        let mut ed = editor_with(&["A"]);
        ed.session.buffer.dirty = true;
        assert_eq!(ed.execute("wq out.txt"), Ok(Outcome::Quit));
        assert!(!ed.session.buffer.dirty);
    }

    #[test]
    fn test_write_without_filename_errors() {
        let mut ed = editor_with(&["A"]);
        assert_eq!(ed.execute("w"), Err(EdError::NoCurrentFilename));
    }

    #[test]
    fn test_edit_loads_file_and_sets_state() {
        let mut ed = editor_with(&[]);
        ed.host.files.insert(
            PathBuf::from("f.txt"),
            vec!["X".to_string(), "Y".to_string()],
        );
        ed.execute("e f.txt").unwrap();
        assert_eq!(lines(&ed), vec!["X", "Y"]);
        assert_eq!(ed.session.cursor.dot, 2);
        assert!(!ed.session.buffer.dirty);
        assert_eq!(ed.host.output, vec!["4"]);
    }

    #[test]
    fn test_edit_honors_dirty_guard() {
        let mut ed = editor_with(&["A"]);
        ed.session.buffer.dirty = true;
        ed.host
            .files
            .insert(PathBuf::from("f.txt"), vec!["X".to_string()]);
        assert_eq!(ed.execute("e f.txt"), Err(EdError::FileModified));
        assert_eq!(ed.execute("e f.txt"), Ok(Outcome::Continue));
        assert_eq!(lines(&ed), vec!["X"]);
    }

    #[test]
    fn test_forced_edit_skips_guard() {
        let mut ed = editor_with(&["A"]);
        ed.session.buffer.dirty = true;
        ed.host
            .files
            .insert(PathBuf::from("f.txt"), vec!["X".to_string()]);
        assert_eq!(ed.execute("E f.txt"), Ok(Outcome::Continue));
    }

    #[test]
    fn test_filename_set_and_show() {
        let mut ed = editor_with(&["A"]);
        assert_eq!(ed.execute("f"), Err(EdError::NoCurrentFilename));
        ed.execute("f notes.txt").unwrap();
        assert_eq!(ed.host.output, vec!["notes.txt"]);
    }

    #[test]
    fn test_read_inserts_after_address() {
        let mut ed = editor_with(&["A", "B"]);
        ed.host
            .files
            .insert(PathBuf::from("f.txt"), vec!["X".to_string()]);
        ed.execute("1r f.txt").unwrap();
        assert_eq!(lines(&ed), vec!["A", "X", "B"]);
        assert_eq!(ed.session.cursor.dot, 2);
        assert!(ed.session.buffer.dirty);
    }

    #[test]
    fn test_read_defaults_to_end() {
        let mut ed = editor_with(&["A"]);
        ed.host
            .files
            .insert(PathBuf::from("f.txt"), vec!["X".to_string()]);
        ed.execute("r f.txt").unwrap();
        assert_eq!(lines(&ed), vec!["A", "X"]);
    }

    #[test]
    fn test_shell_escape_expands_percent() {
        let mut ed = editor_with(&["A"]);
        ed.session.buffer.path = Some(PathBuf::from("cur.txt"));
        ed.host.shell_output = vec!["out".to_string()];
        ed.execute("!wc -l %").unwrap();
        assert_eq!(ed.host.shell_commands, vec!["wc -l cur.txt"]);
        assert_eq!(ed.host.output, vec!["out", "!"]);
    }

    #[test]
    fn test_shell_escape_literal_percent() {
        let mut ed = editor_with(&["A"]);
        ed.execute(r"!date +\%s").unwrap();
        assert_eq!(ed.host.shell_commands, vec!["date +%s"]);
    }

    #[test]
    fn test_shell_escape_without_filename_errors() {
        let mut ed = editor_with(&["A"]);
        assert_eq!(ed.execute("!cat %"), Err(EdError::NoCurrentFilename));
    }

    #[test]
    fn test_double_bang_repeats_last_command() {
        let mut ed = editor_with(&["A"]);
        assert_eq!(ed.execute("!!"), Err(EdError::NoPreviousCommand));
        ed.execute("!ls").unwrap();
        ed.execute("!!").unwrap();
        assert_eq!(ed.host.shell_commands, vec!["ls", "ls"]);
    }

    #[test]
    fn test_undo_restores_append() {
        let mut ed = editor_with(&["A"]);
        ed.session.cursor.dot = 1;
        ed.host.input = ScriptedHost::with_input(&["X", "."]).input;
        ed.execute("a").unwrap();
        ed.execute("u").unwrap();
        assert_eq!(lines(&ed), vec!["A"]);
        assert_eq!(ed.session.cursor.dot, 1);
    }

    #[test]
    fn test_undo_restores_delete() {
        let mut ed = editor_with(&["A", "B", "C"]);
        ed.execute("2d").unwrap();
        ed.execute("u").unwrap();
        assert_eq!(lines(&ed), vec!["A", "B", "C"]);
        assert_eq!(ed.session.cursor.dot, 3);
    }

    #[test]
    fn test_undo_restores_move() {
        let mut ed = editor_with(&["A", "B", "C", "D"]);
        ed.execute("1,2m4").unwrap();
        ed.execute("u").unwrap();
        assert_eq!(lines(&ed), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_undo_with_no_history() {
        let mut ed = editor_with(&["A"]);
        assert_eq!(ed.execute("u"), Err(EdError::NoPreviousCommand));
    }

    #[test]
    fn test_explain_mode_toggle_and_recall() {
        let mut ed = editor_with(&["A"]);
        let err = ed.execute("9p").unwrap_err();
        ed.report_error(err);
        assert_eq!(ed.host.output, vec!["?"]);
        ed.execute("h").unwrap();
        assert_eq!(ed.host.output, vec!["?", "invalid address"]);
        ed.execute("H").unwrap();
        assert!(ed.session.verbose);
        let err = ed.execute("9p").unwrap_err();
        ed.report_error(err);
        assert_eq!(ed.host.output.last().unwrap(), "invalid address");
    }

    #[test]
    fn test_prompt_toggle() {
        let mut ed = editor_with(&[]);
        assert!(!ed.session.prompt_enabled);
        ed.execute("P").unwrap();
        assert!(ed.session.prompt_enabled);
        ed.execute("P").unwrap();
        assert!(!ed.session.prompt_enabled);
    }

    #[test]
    fn test_append_then_delete_roundtrip() {
        let mut ed = editor_with(&["A", "B"]);
        ed.host.input = ScriptedHost::with_input(&["X", "Y", "."]).input;
        ed.execute("2a").unwrap();
        ed.execute("3,4d").unwrap();
        assert_eq!(lines(&ed), vec!["A", "B"]);
    }
}
