//! Address-expression resolver.
//!
//! Consumes scanner tokens to compute the zero/one/two-address selection
//! `(first, second)` plus the count of address atoms supplied. Atoms are
//! absolute line numbers, `.` and `$`, relative offsets from `dot`,
//! marks, and circular regex searches; atoms are joined by `,` or `;`
//! (with `%` standing for the whole buffer). The resolver validates each
//! concrete value against the buffer bounds as it is produced, but an
//! inverted range (`first > second`) is deliberately allowed through so
//! command handlers can report context-specific errors.

use crate::error::{EdError, Result};
use crate::scanner::Scanner;
use crate::session::Session;
use regex::Regex;

/// Resolve the leading address expression of a command line into
/// `session.cursor`. Leaves the scanner positioned at the command letter.
pub fn resolve(session: &mut Session, sc: &mut Scanner) -> Result<()> {
    let len = session.buffer.len();
    let mut first = session.cursor.dot;
    let mut second = session.cursor.dot;
    let mut count = 0usize;

    loop {
        sc.skip_blanks();
        let Some(c) = sc.token() else { break };
        if is_atom_start(c) {
            second = next_atom(session, sc)?;
            if count < 2 {
                count += 1;
            }
        } else if c == ',' || c == ';' || c == '%' {
            sc.consume();
            let semicolon = c == ';';
            if count == 0 {
                // Leading separator: the left side is implied, the right
                // side defaults to the last line, and the pair is done.
                first = if semicolon {
                    session.cursor.dot
                } else {
                    1.min(len)
                };
                sc.skip_blanks();
                second = match sc.token() {
                    Some(t) if is_atom_start(t) => next_atom(session, sc)?,
                    _ => len,
                };
                session.cursor.first = first;
                session.cursor.second = second;
                session.cursor.addr_count = 2;
                return Ok(());
            }
            first = second;
            if semicolon {
                session.cursor.dot = second;
            }
        } else {
            break;
        }
    }

    if count == 1 {
        first = second;
    }
    session.cursor.first = first;
    session.cursor.second = second;
    session.cursor.addr_count = count;
    Ok(())
}

fn is_atom_start(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '$' | '+' | '-' | '^' | '\'' | '/' | '?')
}

/// Resolve one address atom. The scanner is positioned at its first code
/// point; bounds are checked the moment a concrete value exists.
fn next_atom(session: &mut Session, sc: &mut Scanner) -> Result<usize> {
    let len = session.buffer.len() as i64;
    let dot = session.cursor.dot as i64;

    let value: i64 = match sc.token() {
        Some(c) if c.is_ascii_digit() => {
            sc.number().ok_or(EdError::InvalidAddress)? as i64
        }
        Some(c @ ('.' | '$')) => {
            sc.consume();
            // Only valid as the first code point of an atom: `.5` is an
            // address error, not "line dot-point-five".
            if matches!(sc.token(), Some(d) if d.is_ascii_digit()) {
                return Err(EdError::InvalidAddress);
            }
            if c == '.' { dot } else { len }
        }
        Some(c @ ('+' | '-' | '^')) => {
            sc.consume();
            let offset = sc.number().unwrap_or(1) as i64;
            if c == '+' { dot + offset } else { dot - offset }
        }
        Some('\'') => {
            sc.consume();
            let name = sc.consume().ok_or(EdError::InvalidMark)?;
            if !name.is_ascii_lowercase() {
                return Err(EdError::InvalidMark);
            }
            session.buffer.mark(name).ok_or(EdError::InvalidMark)? as i64
        }
        Some('/') | Some('?') => search(session, sc)? as i64,
        _ => return Err(EdError::InvalidAddress),
    };

    if value < 0 || value > len {
        return Err(EdError::InvalidAddress);
    }
    Ok(value as usize)
}

/// Circular regex search. Forward (`/`) starts at the line after `dot`,
/// backward (`?`) at the line before; both wrap around the buffer exactly
/// once and examine the starting line last.
fn search(session: &mut Session, sc: &mut Scanner) -> Result<usize> {
    let delim = sc.consume().ok_or(EdError::InvalidPatternDelimiter)?;
    let forward = delim == '/';
    let raw = scan_pattern(sc, delim);
    let re = compile_pattern(session, &raw)?;

    let len = session.buffer.len();
    if len == 0 {
        return Err(EdError::NoMatch);
    }
    let mut line = session.cursor.dot;
    for _ in 0..len {
        line = if forward {
            if line >= len { 1 } else { line + 1 }
        } else if line <= 1 {
            len
        } else {
            line - 1
        };
        if re.is_match(session.buffer.line(line).unwrap_or("")) {
            return Ok(line);
        }
    }
    Err(EdError::NoMatch)
}

/// Scan a pattern up to (and through) the closing delimiter. A
/// backslash-escaped delimiter becomes a literal; all other escapes pass
/// through to the regex engine. An unterminated pattern keeps whatever
/// was scanned.
pub fn scan_pattern(sc: &mut Scanner, delim: char) -> String {
    let mut pat = String::new();
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
                    pat.push_str(&regex::escape(&d.to_string()));
                }
                Some(other) => {
                    sc.consume();
                    pat.push('\\');
                    pat.push(other);
                }
                None => pat.push('\\'),
            }
        } else {
            pat.push(c);
        }
    }
    pat
}

/// Compile `raw`, or reuse the previously compiled pattern when `raw` is
/// empty. A fresh compile replaces the stored pattern.
pub fn compile_pattern(session: &mut Session, raw: &str) -> Result<Regex> {
    if raw.is_empty() {
        return session
            .regex
            .pattern
            .clone()
            .ok_or(EdError::NoPreviousPattern);
    }
    let re = Regex::new(raw)?;
    session.regex.pattern = Some(re.clone());
    Ok(re)
}
