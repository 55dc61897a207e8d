//! Output formatting for the display commands.
//!
//! `p` prints verbatim, `n` prefixes the line number, and `l` renders the
//! list form: backslash escapes for nonprintables, `\\` for a backslash,
//! `\$` for a dollar sign inside the line, and a bare `$` marking the end
//! of the line.

use crate::command::Suffix;

/// Render one line under the given display suffix. `l` wins over `p`
/// when both are requested; `n` composes with either.
pub fn render(n: usize, text: &str, suffix: Suffix) -> String {
    let body = if suffix.list {
        list_escape(text)
    } else {
        text.to_string()
    };
    if suffix.number {
        format!("{n}\t{body}")
    } else {
        body
    }
}

/// Escape a line for the `l` command and append the terminating `$`.
pub fn list_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 1);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '$' => out.push_str("\\$"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\x0d' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            c if (c as u32) < 0x20 || c == '\x7f' => {
                out.push_str(&format!("\\{:03o}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('$');
    out
}
