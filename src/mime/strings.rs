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

use super::encoded_word::{ew_decode, ew_decode_unstructured};

/// Convert raw header bytes to a string, replacing invalid UTF-8.
pub fn to_utf8(cow: Cow<[u8]>) -> Cow<str> {
    match cow {
        Cow::Owned(owned) => Cow::Owned(match String::from_utf8(owned) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }),
        Cow::Borrowed(borrowed) => String::from_utf8_lossy(borrowed),
    }
}

/// Remove header folding from `s`.
///
/// Each line break and the whitespace around it is collapsed into a single
/// space.
pub fn unfold(s: &str) -> Cow<str> {
    if !s.contains('\n') && !s.contains('\r') {
        return Cow::Borrowed(s);
    }

    let mut unfolded = String::with_capacity(s.len());
    let mut is_unfolding = false;
    for ch in s.chars() {
        if is_unfolding {
            if ' ' == ch || '\t' == ch || '\r' == ch || '\n' == ch {
                continue;
            }
            is_unfolding = false;
            unfolded.push(ch);
        } else if '\r' == ch || '\n' == ch {
            unfolded.push(' ');
            is_unfolding = true;
        } else {
            unfolded.push(ch);
        }
    }

    Cow::Owned(unfolded)
}

/// Decode an unstructured header value such as `Subject`: unfold it, trim it,
/// and decode RFC 2047 encoded words.
pub fn decode_unstructured(s: Cow<[u8]>) -> String {
    let s = to_utf8(s);
    let unfolded = unfold(&s);
    ew_decode_unstructured(unfolded.trim()).into_owned()
}

/// Join the words of an RFC 5322 phrase (e.g. a display name), decoding any
/// encoded words.
///
/// Like in unstructured text, the space between two adjacent encoded words is
/// dropped.
pub fn decode_phrase(words: &[String]) -> String {
    let mut out = String::new();
    let mut last_was_encoded = false;
    for (ix, word) in words.iter().enumerate() {
        match ew_decode(word) {
            Some(decoded) => {
                if ix > 0 && !last_was_encoded {
                    out.push(' ');
                }
                out.push_str(&decoded);
                last_was_encoded = true;
            },
            None => {
                if ix > 0 {
                    out.push(' ');
                }
                out.push_str(word);
                last_was_encoded = false;
            },
        }
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decode_unstructured() {
        assert_eq!(
            "Request for meeting -- short speech to US Olympic Commit tee",
            decode_unstructured(Cow::Borrowed(
                b"  Request for meeting -- short speech to US Olympic Commit\r\n\
                  \ttee\r\n"
            ))
        );
        assert_eq!(
            "caf\u{e9} au lait",
            decode_unstructured(Cow::Borrowed(
                b"=?utf-8?q?caf=C3=A9?= au lait"
            ))
        );
        assert_eq!(
            "bad \u{fffd} byte",
            decode_unstructured(Cow::Borrowed(b"bad \xff byte"))
        );
    }

    #[test]
    fn test_decode_phrase() {
        assert_eq!(
            "John Q. Public",
            decode_phrase(&[
                "John".to_owned(),
                "Q.".to_owned(),
                "Public".to_owned()
            ])
        );
        assert_eq!(
            "Jørn Simonsen",
            decode_phrase(&[
                "=?ISO-8859-1?Q?J=F8?=".to_owned(),
                "=?ISO-8859-1?Q?rn?=".to_owned(),
                "Simonsen".to_owned(),
            ])
        );
    }
}
