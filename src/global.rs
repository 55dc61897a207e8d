//! Global-command engine (`g`, `G`, `v`, `V`).
//!
//! Builds a candidate list from a regex test over the address range
//! before any mutation, then drives one full parse + dispatch cycle per
//! candidate. Candidates are drift-adjusted by the net buffer-length
//! change since capture, so deletions earlier in the loop neither skip
//! nor double-visit lines. Batch mode (`g`/`v`) replays one stored
//! command string; interactive mode (`G`/`V`) displays each line and
//! reads one command, with an empty read skipping the line and `&`
//! repeating the previous nested command. Globals cannot nest.

use crate::address;
use crate::command::{Editor, Outcome};
use crate::error::{EdError, Result};
use crate::host::Host;
use crate::scanner::Scanner;
use tracing::debug;

impl<H: Host> Editor<H> {
    pub(crate) fn cmd_global(
        &mut self,
        sc: &mut Scanner,
        interactive: bool,
        invert: bool,
    ) -> Result<Outcome> {
        if self.session.global.active {
            return Err(EdError::CannotNestGlobal);
        }

        let len = self.session.buffer.len();
        let (first, second) = if self.session.cursor.addr_count == 0 {
            (1, len)
        } else {
            (self.session.cursor.first, self.session.cursor.second)
        };
        if first < 1 || first > second || second > len {
            return Err(EdError::InvalidAddress);
        }

        let delim = sc.token().ok_or(EdError::InvalidPatternDelimiter)?;
        if delim == ' ' || delim == '\\' || delim.is_ascii_alphanumeric() {
            return Err(EdError::InvalidPatternDelimiter);
        }
        sc.consume();
        let raw = address::scan_pattern(sc, delim);
        let re = address::compile_pattern(&mut self.session, &raw)?;

        // Capture the candidate list before anything mutates.
        let mut candidates = Vec::new();
        for n in first..=second {
            let hit = re.is_match(self.session.buffer.line(n).unwrap_or(""));
            if hit != invert {
                candidates.push(n);
            }
        }
        debug!(candidates = candidates.len(), interactive, invert, "global pass");
        self.session.global.match_list = candidates;
        let captured_len = len;

        let command = if interactive {
            self.end_of_command_interactive(sc)?;
            None
        } else {
            let rest = sc.rest();
            Some(if rest.is_empty() { "p".to_string() } else { rest })
        };
        if let Some(cmd) = &command {
            self.session.global.last_command = Some(cmd.clone());
        }

        self.session.global.active = true;
        let result = self.drive(captured_len, command, interactive);
        self.session.global.active = false;
        result
    }

    /// Interactive globals take no trailing text after the pattern.
    fn end_of_command_interactive(&self, sc: &mut Scanner) -> Result<()> {
        sc.skip_blanks();
        if sc.at_end() {
            Ok(())
        } else {
            Err(EdError::InvalidCommandSuffix)
        }
    }

    fn drive(
        &mut self,
        captured_len: usize,
        command: Option<String>,
        interactive: bool,
    ) -> Result<Outcome> {
        for i in 0..self.session.global.match_list.len() {
            let recorded = self.session.global.match_list[i];
            let len_now = self.session.buffer.len() as i64;
            let adjusted = recorded as i64 + (len_now - captured_len as i64);
            if adjusted < 1 || adjusted > len_now {
                // The line vanished under an earlier iteration.
                continue;
            }
            let lineno = adjusted as usize;
            self.session.cursor.dot = lineno;

            if let Some(cmd) = &command {
                let cmd = cmd.clone();
                match self.run_command(&cmd)? {
                    Outcome::Quit => return Ok(Outcome::Quit),
                    Outcome::Continue => {}
                }
                continue;
            }

            // Interactive: show the line, read one command.
            let text = self.session.buffer.line(lineno).unwrap_or("").to_string();
            self.emit(&text)?;
            let input = match self.host.read_line(None) {
                Ok(Some(l)) => l,
                Ok(None) => return Err(EdError::Io("unexpected end of input".to_string())),
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
            if input.is_empty() {
                continue;
            }
            let cmd = if input == "&" {
                self.session
                    .global
                    .last_command
                    .clone()
                    .ok_or(EdError::NoPreviousCommand)?
            } else {
                self.session.global.last_command = Some(input.clone());
                input
            };
            match self.run_command(&cmd) {
                Ok(Outcome::Quit) => return Ok(Outcome::Quit),
                Ok(Outcome::Continue) => {}
                // Interactive errors are reported per line; the loop
                // moves on to the next candidate.
                Err(e) => self.report_error(e),
            }
        }
        Ok(Outcome::Continue)
    }
}
