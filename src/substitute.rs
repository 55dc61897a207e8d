//! Regex substitution engine.
//!
//! `s/pattern/replacement/flags` compiles the pattern (or reuses the
//! previous one when empty), walks the non-overlapping matches of each
//! line in the range per the occurrence policy, and expands the
//! replacement template with its own escape grammar: `&` for the whole
//! match, `\1`..`\9` for capture groups, `\&` for a literal ampersand.
//! The template is parsed and validated before the first line is
//! touched, so a bad backreference never leaves a half-substituted range.

use crate::address;
use crate::command::{Editor, Outcome, Suffix};
use crate::error::{EdError, Result};
use crate::host::Host;
use crate::scanner::Scanner;
use regex::{Captures, Regex};
use tracing::debug;

/// One parsed element of a replacement template.
#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Text(String),
    Whole,
    Group(usize),
}

/// A replacement template, validated against a compiled pattern.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Template {
    pieces: Vec<Piece>,
}

impl Template {
    /// Parse `raw` and validate every `\N` against the pattern's group
    /// count (`captures_len` includes the implicit whole-match group).
    pub(crate) fn parse(raw: &str, captures_len: usize) -> Result<Self> {
        let mut pieces = Vec::new();
        let mut text = String::new();
        let mut chars = raw.chars();

        let flush = |text: &mut String, pieces: &mut Vec<Piece>| {
            if !text.is_empty() {
                pieces.push(Piece::Text(std::mem::take(text)));
            }
        };

        while let Some(c) = chars.next() {
            match c {
                '&' => {
                    flush(&mut text, &mut pieces);
                    pieces.push(Piece::Whole);
                }
                '\\' => match chars.next() {
                    Some(d @ '1'..='9') => {
                        let n = d.to_digit(10).unwrap_or(0) as usize;
                        if n >= captures_len {
                            return Err(EdError::Regex(format!(
                                "invalid reference \\{n} in replacement"
                            )));
                        }
                        flush(&mut text, &mut pieces);
                        pieces.push(Piece::Group(n));
                    }
                    Some('&') => text.push('&'),
                    Some(other) => text.push(other),
                    None => text.push('\\'),
                },
                other => text.push(other),
            }
        }
        flush(&mut text, &mut pieces);
        Ok(Self { pieces })
    }

    /// Expand the template against one match.
    fn expand(&self, caps: &Captures<'_>, out: &mut String) {
        for piece in &self.pieces {
            match piece {
                Piece::Text(t) => out.push_str(t),
                Piece::Whole => out.push_str(caps.get(0).map(|m| m.as_str()).unwrap_or("")),
                Piece::Group(n) => {
                    // A group that exists but did not participate in this
                    // match expands to the empty string.
                    out.push_str(caps.get(*n).map(|m| m.as_str()).unwrap_or(""));
                }
            }
        }
    }
}

/// Which occurrences on a line get replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Occurrence {
    nth: usize,
    all: bool,
}

/// Rewrite one line, or `None` when no selected occurrence matched.
fn substitute_line(
    re: &Regex,
    template: &Template,
    line: &str,
    occ: Occurrence,
) -> Option<String> {
    let mut out = String::with_capacity(line.len());
    let mut last_end = 0;
    let mut index = 0;
    let mut changed = false;

    for caps in re.captures_iter(line) {
        let m = caps.get(0)?;
        index += 1;
        let selected = if occ.all {
            index >= occ.nth
        } else {
            index == occ.nth
        };
        out.push_str(&line[last_end..m.start()]);
        if selected {
            template.expand(&caps, &mut out);
            changed = true;
        } else {
            out.push_str(m.as_str());
        }
        last_end = m.end();
    }

    if !changed {
        return None;
    }
    out.push_str(&line[last_end..]);
    Some(out)
}

impl<H: Host> Editor<H> {
    pub(crate) fn cmd_substitute(&mut self, sc: &mut Scanner) -> Result<Outcome> {
        let delim = sc.token().ok_or(EdError::InvalidPatternDelimiter)?;
        if delim == ' ' || delim == '\\' || delim.is_ascii_alphanumeric() {
            return Err(EdError::InvalidPatternDelimiter);
        }
        sc.consume();

        let raw_pattern = address::scan_pattern(sc, delim);
        let re = address::compile_pattern(&mut self.session, &raw_pattern)?;

        let raw_replacement = scan_replacement(sc, delim);
        let template_text = if raw_replacement.is_empty() {
            self.session
                .regex
                .replacement
                .clone()
                .ok_or(EdError::NoPreviousSubstitution)?
        } else {
            raw_replacement
        };
        self.session.regex.replacement = Some(template_text.clone());
        let template = Template::parse(&template_text, re.captures_len())?;

        // Flags: a count, `g`, and display suffixes, in any order.
        let mut occ = Occurrence { nth: 0, all: false };
        let mut suffix = Suffix::default();
        loop {
            match sc.token() {
                Some(c) if c.is_ascii_digit() => {
                    let n = sc.number().ok_or(EdError::InvalidCommandSuffix)?;
                    if n == 0 {
                        return Err(EdError::InvalidCommandSuffix);
                    }
                    occ.nth = n;
                }
                Some('g') => {
                    occ.all = true;
                    sc.consume();
                }
                Some('p') => {
                    suffix.print = true;
                    sc.consume();
                }
                Some('l') => {
                    suffix.list = true;
                    sc.consume();
                }
                Some('n') => {
                    suffix.number = true;
                    sc.consume();
                }
                _ => break,
            }
        }
        if occ.nth == 0 {
            occ.nth = 1;
        }
        sc.skip_blanks();
        if !sc.at_end() {
            return Err(EdError::InvalidCommandSuffix);
        }

        let (first, second) = self.check_range()?;
        let mut last_changed = None;
        let mut replaced = 0usize;
        for lineno in first..=second {
            let old = self.session.buffer.line(lineno).unwrap_or("").to_string();
            if let Some(new) = substitute_line(&re, &template, &old, occ) {
                self.session
                    .undo
                    .record_delete(lineno, lineno, vec![old]);
                self.session.undo.record_add(lineno, lineno);
                self.session.buffer.replace_line(lineno, new);
                last_changed = Some(lineno);
                replaced += 1;
            }
        }
        debug!(lines = replaced, "substitution pass");

        match last_changed {
            Some(lineno) => {
                self.session.cursor.dot = lineno;
                self.display_suffix(suffix)?;
                Ok(Outcome::Continue)
            }
            // Inside a global batch, a line with no occurrence is simply
            // skipped; the loop carries on.
            None if self.session.global.active => Ok(Outcome::Continue),
            None => Err(EdError::NoMatch),
        }
    }
}

/// Scan a replacement up to the closing delimiter. `\<delim>` becomes the
/// literal delimiter; every other escape is preserved for the template
/// parser's own grammar.
fn scan_replacement(sc: &mut Scanner, delim: char) -> String {
    let mut out = String::new();
    while let Some(c) = sc.token() {
        if c == delim {
            sc.consume();
            break;
        }
        sc.consume();
        if c == '\\' {
            match sc.token() {
                Some(d) if d == delim => {
                    sc.consume();
                    out.push(d);
                }
                Some(other) => {
                    sc.consume();
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
