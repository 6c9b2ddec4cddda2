//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of Mimedump.
//
// Mimedump is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Mimedump is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Mimedump. If not, see <http://www.gnu.org/licenses/>.

//! HTML escaping and conversion of HTML to plain text.

use std::borrow::Cow;

use log::warn;

/// Line width handed to the converter. Wrapping is done separately by
/// callers which want it, so this only needs to be wide enough not to
/// matter.
const TEXT_WIDTH: usize = 1000;

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape_html(s: &str) -> Cow<str> {
    if !s.contains(&['&', '<', '>', '"', '\''][..]) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            ch => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Convert an HTML document or fragment to plain text.
///
/// Block elements become line breaks, `<blockquote>` becomes `> ` prefixes,
/// and entities are decoded. The result uses `\n` line endings, has no
/// trailing whitespace on any line, no runs of blank lines, and ends with a
/// single newline unless it is empty.
pub fn html_to_text(html: &str) -> String {
    match html2text::from_read(html.as_bytes(), TEXT_WIDTH) {
        Ok(text) => tidy(&text),
        Err(e) => {
            warn!("Failed to convert HTML to text: {}", e);
            String::new()
        },
    }
}

fn tidy(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_blank = false;
    for line in text.lines() {
        let line = line.replace('\u{a0}', " ");
        let line = line.trim_end();
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }

        if pending_blank {
            out.push('\n');
            pending_blank = false;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}
