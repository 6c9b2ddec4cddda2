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
use std::str;

use encoding_rs::Encoding;
use lazy_static::lazy_static;
use regex::Regex;

use super::quoted_printable::qp_decode;

lazy_static! {
    static ref ENCODED_WORD: Regex =
        Regex::new(r"^=\?([!->@-~]*)\?([!->@-~]*)\?([!->@-~]*)\?=$").unwrap();
}

/// Test if `word` (in its entirety) is an RFC 2047 "encoded word".
///
/// If it is, decode it and return its decoded value.
///
/// Returns `None` if it is not an encoded word or if it could not be decoded.
/// The distinction matters to callers since whitespace between adjacent
/// encoded words is deleted, but kept everywhere else.
///
/// Encoded words longer than the 75 characters RFC 2047 permits are accepted,
/// since some agents produce them and other readers decode them.
pub fn ew_decode(word: &str) -> Option<Cow<str>> {
    let captures = ENCODED_WORD.captures(word)?;

    // RFC 2231 allows a language suffix on the charset: `utf-8*en`
    let charset = captures.get(1)?.as_str();
    let charset = charset.split('*').next().unwrap_or(charset);
    let transfer_encoding = captures.get(2)?.as_str();
    let content = captures.get(3)?.as_str().as_bytes();

    let content: Cow<[u8]> = match transfer_encoding {
        "q" | "Q" => {
            // _ in the content (before transfer decoding) stands for ASCII
            // space regardless of charset
            let unscored: Vec<u8> = content
                .iter()
                .map(|&b| if b'_' == b { b' ' } else { b })
                .collect();
            Cow::Owned(qp_decode(&unscored).into_owned())
        },
        "b" | "B" => Cow::Owned(base64::decode(content).ok()?),
        _ => return None,
    };

    let encoding = Encoding::for_label_no_replacement(charset.as_bytes())?;
    Some(Cow::Owned(
        encoding.decode_with_bom_removal(&content).0.into_owned(),
    ))
}

/// Decode all encoded words in an unstructured header value (e.g. `Subject`).
///
/// Whitespace between two adjacent encoded words is removed; everything else
/// is passed through unchanged. Words that look like encoded words but cannot
/// be decoded are left as-is.
pub fn ew_decode_unstructured(s: &str) -> Cow<str> {
    if !s.contains("=?") {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut pending_ws = "";
    let mut last_was_encoded = false;
    let mut rest = s;

    while !rest.is_empty() {
        let ws_len = rest
            .find(|c: char| !c.is_ascii_whitespace())
            .unwrap_or_else(|| rest.len());
        let (ws, after_ws) = rest.split_at(ws_len);
        pending_ws = if ws.is_empty() { pending_ws } else { ws };
        if after_ws.is_empty() {
            out.push_str(ws);
            break;
        }

        let word_len = after_ws
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or_else(|| after_ws.len());
        let (word, after_word) = after_ws.split_at(word_len);
        rest = after_word;

        match ew_decode(word) {
            Some(decoded) => {
                if !last_was_encoded {
                    out.push_str(pending_ws);
                }
                out.push_str(&decoded);
                last_was_encoded = true;
            },
            None => {
                out.push_str(pending_ws);
                out.push_str(word);
                last_was_encoded = false;
            },
        }
        pending_ws = "";
    }

    Cow::Owned(out)
}
