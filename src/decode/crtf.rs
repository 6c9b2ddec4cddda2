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

//! Decompression of the "compressed RTF" format (MS-OXRTFCP) used for
//! `PR_RTF_COMPRESSED` in TNEF bodies.

use std::io::Cursor;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use lazy_static::lazy_static;
use log::warn;

use crate::support::error::Error;

const COMPRESSED: u32 = 0x7546_5a4c; // "LZFu"
const UNCOMPRESSED: u32 = 0x414c_454d; // "MELA"

const DICT_SIZE: usize = 4096;
static DICT_INIT: &[u8] =
    b"{\\rtf1\\ansi\\mac\\deff0\\deftab720{\\fonttbl;}{\\f0\\fnil \\froman \
      \\fswiss \\fmodern \\fscript \\fdecor MS Sans SerifSymbolArialTimes New \
      RomanCourier{\\colortbl\\red0\\green0\\blue0\r\n\\par \
      \\pard\\plain\\f0\\fs20\\b\\i\\u\\tab\\tx";

lazy_static! {
    static ref CRC_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        for (ix, entry) in table.iter_mut().enumerate() {
            let mut crc = ix as u32;
            for _ in 0..8 {
                crc = if 0 != crc & 1 {
                    0xEDB8_8320 ^ (crc >> 1)
                } else {
                    crc >> 1
                };
            }
            *entry = crc;
        }
        table
    };
}

/// The CRC variant used by MS-OXRTFCP: CRC-32 without the pre- and
/// post-inversion.
fn crc(data: &[u8]) -> u32 {
    data.iter().fold(0u32, |crc, &b| {
        CRC_TABLE[(crc as u8 ^ b) as usize] ^ (crc >> 8)
    })
}

fn truncated() -> Error {
    Error::BadTnef("truncated compressed RTF".to_owned())
}

/// Decompress a compressed RTF blob.
///
/// A checksum mismatch is only logged. Output is capped at the raw size
/// declared in the header.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut header = Cursor::new(data);
    let compressed_size = header.read_u32::<LittleEndian>()?;
    let raw_size = header.read_u32::<LittleEndian>()? as usize;
    let comp_type = header.read_u32::<LittleEndian>()?;
    let expected_crc = header.read_u32::<LittleEndian>()?;
    let body = &data[16..];

    match comp_type {
        UNCOMPRESSED => {
            Ok(body[..raw_size.min(body.len())].to_vec())
        },
        COMPRESSED => {
            // The compressed size counts the 12 header bytes after itself
            let body_len =
                (compressed_size as usize).saturating_sub(12).min(body.len());
            let body = &body[..body_len];
            if crc(body) != expected_crc {
                warn!("Compressed RTF checksum mismatch");
            }
            inflate(body, raw_size)
        },
        other => Err(Error::BadTnef(format!(
            "unknown compressed RTF type {:08x}",
            other
        ))),
    }
}

fn inflate(body: &[u8], raw_size: usize) -> Result<Vec<u8>, Error> {
    let mut dict = [0u8; DICT_SIZE];
    dict[..DICT_INIT.len()].copy_from_slice(DICT_INIT);
    let mut write_pos = DICT_INIT.len();

    // Cap the preallocation; the header is not to be trusted
    let mut out = Vec::with_capacity(raw_size.min(1 << 20));
    let mut r = Cursor::new(body);

    'outer: loop {
        let control = match r.read_u8() {
            Ok(control) => control,
            // Well-formed streams end with a self-reference, but tolerate
            // running out at a control byte
            Err(_) => break,
        };

        for bit in 0..8 {
            if 0 == control & (1 << bit) {
                let literal = r.read_u8().map_err(|_| truncated())?;
                out.push(literal);
                dict[write_pos] = literal;
                write_pos = (write_pos + 1) % DICT_SIZE;
                continue;
            }

            let reference =
                r.read_u16::<BigEndian>().map_err(|_| truncated())?;
            let offset = (reference >> 4) as usize;
            let len = (reference & 0xF) as usize + 2;
            if offset == write_pos {
                break 'outer;
            }

            for i in 0..len {
                let b = dict[(offset + i) % DICT_SIZE];
                out.push(b);
                dict[write_pos] = b;
                write_pos = (write_pos + 1) % DICT_SIZE;
            }
        }

        if out.len() > raw_size {
            break;
        }
    }

    out.truncate(raw_size);
    Ok(out)
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn dictionary_preamble_length() {
        assert_eq!(207, DICT_INIT.len());
    }

    #[test]
    fn test_crc() {
        assert_eq!(
            0xA7C7_C5F1,
            crc(b"\x03\x00\x0a\x00\x72\x63\x70\x67\x31\x32\x35\x42\x32\x0a\
                  \xf3\x20\x68\x65\x6c\x09\x00\x20\x62\x77\x05\xb0\x6c\x64\
                  \x7d\x0a\x80\x0f\xa0")
        );
    }

    #[test]
    fn decompress_simple() {
        assert_eq!(
            b"{\\rtf1\\ansi\\ansicpg1252\\pard hello world}\r\n".to_vec(),
            decompress(
                b"\x2d\x00\x00\x00\x2b\x00\x00\x00\x4c\x5a\x46\x75\xf1\xc5\
                  \xc7\xa7\x03\x00\x0a\x00\x72\x63\x70\x67\x31\x32\x35\x42\
                  \x32\x0a\xf3\x20\x68\x65\x6c\x09\x00\x20\x62\x77\x05\xb0\
                  \x6c\x64\x7d\x0a\x80\x0f\xa0"
            )
            .unwrap()
        );
    }

    #[test]
    fn decompress_with_overlapping_reference() {
        assert_eq!(
            b"{\\rtf1 WXYZWXYZWXYZWXYZWXYZ}".to_vec(),
            decompress(
                b"\x1a\x00\x00\x00\x1c\x00\x00\x00\x4c\x5a\x46\x75\xe2\xd4\
                  \x4b\x51\x41\x00\x04\x20\x57\x58\x59\x5a\x0d\x6e\x7d\x01\
                  \x0e\xb0"
            )
            .unwrap()
        );
    }

    #[test]
    fn uncompressed_passthrough() {
        let mut data = vec![];
        data.extend_from_slice(&[9, 0, 0, 0, 5, 0, 0, 0]);
        data.extend_from_slice(b"MELA");
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(b"{\\rtf}");
        assert_eq!(b"{\\rtf".to_vec(), decompress(&data).unwrap());
    }

    #[test]
    fn bad_input() {
        assert_matches!(Err(Error::Io(_)), decompress(b"\x01\x00"));
        assert_matches!(
            Err(Error::BadTnef(_)),
            decompress(b"\x10\x00\x00\x00\x10\x00\x00\x00XXXX\x00\x00\x00\x00")
        );
        assert_matches!(
            Err(Error::BadTnef(_)),
            decompress(
                b"\x20\x00\x00\x00\x10\x00\x00\x00LZFu\x00\x00\x00\x00\x00a"
            )
        );
    }

    proptest! {
        #[test]
        fn decompress_never_panics(
            body in prop::collection::vec(prop::num::u8::ANY, 0..200)
        ) {
            let mut data = vec![];
            data.extend_from_slice(&(body.len() as u32 + 12).to_le_bytes());
            data.extend_from_slice(&4096u32.to_le_bytes());
            data.extend_from_slice(b"LZFu");
            data.extend_from_slice(&0u32.to_le_bytes());
            data.extend_from_slice(&body);
            let _ = decompress(&data);
        }
    }
}
