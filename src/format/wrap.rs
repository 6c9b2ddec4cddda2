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

//! Line wrapping which keeps quote prefixes and never breaks links.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PREFIX: Regex = Regex::new(r"^(?:(?:>|&gt;) ?)*").unwrap();
    static ref UNIT: Regex =
        Regex::new(r"(?is)<a\b[^>]*>.*?</a>|\S+").unwrap();
    static ref TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref ENTITY: Regex = Regex::new(r"&#?[A-Za-z0-9]+;").unwrap();
}

/// Width of some text as it would be displayed, with tags removed and each
/// character reference counted as one character.
fn visible_width(s: &str) -> usize {
    if !s.contains(&['<', '&'][..]) {
        return s.chars().count();
    }

    let s = TAG.replace_all(s, "");
    ENTITY.replace_all(&s, "_").chars().count()
}

/// Wrap every line of `text` which is longer than `width` characters.
///
/// Breaks happen only at whitespace. Continuation lines repeat the quote
/// prefix (`>` or `&gt;` runs) of the line they came from. Anchors and
/// words longer than `width` are kept whole on a line of their own. A width
/// of 0 disables wrapping.
pub fn wrap_text(text: &str, width: usize) -> String {
    if 0 == width {
        return text.to_owned();
    }

    let mut out = String::with_capacity(text.len() + text.len() / 16);
    for (ix, line) in text.split('\n').enumerate() {
        if ix > 0 {
            out.push('\n');
        }
        wrap_line(&mut out, line, width);
    }
    out
}

fn wrap_line(out: &mut String, line: &str, width: usize) {
    if visible_width(line) <= width {
        out.push_str(line);
        return;
    }

    let prefix = PREFIX.find(line).map_or("", |m| m.as_str());
    let prefix_width = visible_width(prefix);
    let body = &line[prefix.len()..];

    out.push_str(prefix);
    let mut current = prefix_width;
    let mut empty = true;
    for unit in UNIT.find_iter(body) {
        let unit = unit.as_str();
        let unit_width = visible_width(unit);
        if !empty && current + 1 + unit_width > width {
            out.push('\n');
            out.push_str(prefix);
            current = prefix_width;
            empty = true;
        }

        if !empty {
            out.push(' ');
            current += 1;
        }
        out.push_str(unit);
        current += unit_width;
        empty = false;
    }
}
