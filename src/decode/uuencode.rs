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

//! Detection and decoding of UUEncoded files embedded in plain text.

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

use crate::support::error::Error;

lazy_static! {
    static ref BEGIN: Regex =
        Regex::new(r"^begin(?:-base64)? +([0-7]{3,4}) +(\S.*?)\s*$").unwrap();
}

/// A file found inside text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UuFile {
    pub filename: String,
    /// The permission bits from the `begin` line.
    pub mode: u32,
    pub data: Vec<u8>,
}

/// The result of splitting text into clean text and embedded files.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Uudecoded {
    /// Everything outside the encoded blocks.
    pub text: String,
    pub files: Vec<UuFile>,
}

/// Scan `text` for UUEncoded blocks.
///
/// Returns `None` if there is not a single well-formed block. A malformed
/// block is logged and left in place in the clean text, and scanning resumes
/// on the line after its `begin`.
pub fn split(text: &str) -> Option<Uudecoded> {
    if !text.contains("begin ") {
        return None;
    }

    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let mut result = Uudecoded::default();
    let mut ix = 0;

    while ix < lines.len() {
        let line = lines[ix];
        let begin = BEGIN.captures(line.trim_end_matches(&['\r', '\n'][..]));
        let (mode, filename) = match begin {
            Some(ref c) => (
                u32::from_str_radix(&c[1], 8).unwrap_or(0o644),
                c[2].to_owned(),
            ),
            None => {
                result.text.push_str(line);
                ix += 1;
                continue;
            },
        };

        match decode_block(&lines[ix + 1..]) {
            Ok((data, consumed)) => {
                result.files.push(UuFile {
                    filename,
                    mode,
                    data,
                });
                ix += 1 + consumed;
            },
            Err(e) => {
                warn!("Skipping UUEncoded block {:?}: {}", filename, e);
                result.text.push_str(line);
                ix += 1;
            },
        }
    }

    if result.files.is_empty() {
        None
    } else {
        Some(result)
    }
}

/// Decode the body lines of one block, up to and including `end`.
///
/// Returns the data and the number of lines consumed.
fn decode_block(lines: &[&str]) -> Result<(Vec<u8>, usize), Error> {
    let mut data = Vec::new();
    for (ix, line) in lines.iter().enumerate() {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        if "end" == line.trim_end() {
            return Ok((data, ix + 1));
        }
        decode_line(line, &mut data)?;
    }

    Err(Error::BadUuencode("missing end line".to_owned()))
}

fn decode_char(c: u8) -> Result<u8, Error> {
    if (b' '..=b'`').contains(&c) {
        Ok((c - b' ') & 0x3F)
    } else {
        Err(Error::BadUuencode(format!("invalid character {:?}", c as char)))
    }
}

fn decode_line(line: &str, out: &mut Vec<u8>) -> Result<(), Error> {
    let bytes = line.as_bytes();
    let len = match bytes.first() {
        None => return Ok(()),
        Some(&c) => decode_char(c)? as usize,
    };
    if 0 == len {
        return Ok(());
    }

    // Some encoders strip trailing spaces, which stand for zero bits
    let mut encoded = bytes[1..].to_vec();
    let needed = (len + 2) / 3 * 4;
    if encoded.len() < needed {
        encoded.resize(needed, b' ');
    }

    let start = out.len();
    for group in encoded[..needed].chunks(4) {
        let a = decode_char(group[0])?;
        let b = decode_char(group[1])?;
        let c = decode_char(group[2])?;
        let d = decode_char(group[3])?;
        out.push(a << 2 | b >> 4);
        out.push(b << 4 | c >> 2);
        out.push(c << 6 | d);
    }
    out.truncate(start + len);
    Ok(())
}

fn encode_char(v: u8) -> char {
    if 0 == v {
        '`'
    } else {
        (b' ' + v) as char
    }
}

/// Encode `data` as a complete UUEncoded block, `begin` to `end`.
pub fn encode(filename: &str, mode: u32, data: &[u8]) -> String {
    let mut out = format!("begin {:o} {}\n", mode, filename);
    for line in data.chunks(45) {
        out.push(encode_char(line.len() as u8));
        for group in line.chunks(3) {
            let a = group[0];
            let b = group.get(1).copied().unwrap_or(0);
            let c = group.get(2).copied().unwrap_or(0);
            out.push(encode_char(a >> 2));
            out.push(encode_char((a << 4 | b >> 4) & 0x3F));
            out.push(encode_char((b << 2 | c >> 6) & 0x3F));
            out.push(encode_char(c & 0x3F));
        }
        out.push('\n');
    }
    out.push_str("`\nend\n");
    out
}
