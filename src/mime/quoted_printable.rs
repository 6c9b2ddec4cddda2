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

use std::borrow::Cow;

/// Decodes quoted-printable encoding, as described by RFC 2045.
///
/// Encoded bytes and soft line breaks are both handled, the latter by
/// discarding. UNIX line endings are accepted as well as DOS line endings,
/// and so is trailing whitespace between the `=` of a soft line break and the
/// line ending, which some agents produce.
///
/// This never fails. Invalid or incomplete escape sequences are passed
/// through untransformed, as are 8-bit characters.
///
/// The input is borrowed if it contains no `=` at all.
pub fn qp_decode(s: &[u8]) -> Cow<[u8]> {
    if memchr::memchr(b'=', s).is_none() {
        return Cow::Borrowed(s);
    }

    let mut out = Vec::with_capacity(s.len());
    let mut ix = 0;
    while ix < s.len() {
        let b = s[ix];
        if b'=' != b {
            out.push(b);
            ix += 1;
            continue;
        }

        let tail = &s[ix + 1..];
        if let Some(skip) = soft_line_break(tail) {
            ix += 1 + skip;
            continue;
        }

        match tail {
            [hi, lo, ..] => match (hex_value(*hi), hex_value(*lo)) {
                (Some(hi), Some(lo)) => {
                    out.push(hi << 4 | lo);
                    ix += 3;
                },
                _ => {
                    out.push(b'=');
                    ix += 1;
                },
            },
            _ => {
                // Dangling escape at the very end
                out.extend_from_slice(&s[ix..]);
                ix = s.len();
            },
        }
    }

    Cow::Owned(out)
}

/// If `tail` (the bytes after a `=`) starts with a soft line break, return
/// the number of bytes it occupies.
fn soft_line_break(tail: &[u8]) -> Option<usize> {
    let ws = tail
        .iter()
        .take_while(|&&b| b' ' == b || b'\t' == b)
        .count();
    let rest = &tail[ws..];
    if rest.starts_with(b"\r\n") {
        Some(ws + 2)
    } else if rest.starts_with(b"\n") {
        Some(ws + 1)
    } else if rest.is_empty() && ws > 0 {
        Some(ws)
    } else {
        None
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}
