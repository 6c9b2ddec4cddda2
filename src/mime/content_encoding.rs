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

use encoding_rs::Encoding;
use log::info;

use super::model::ContentTransferEncoding;
use super::quoted_printable::qp_decode;

/// Undo the content transfer encoding of a part body.
///
/// This never fails. Base64 decoding skips any character outside the base64
/// alphabet and discards a trailing incomplete group; quoted-printable
/// passes invalid escapes through.
pub fn decode_transfer(
    cte: ContentTransferEncoding,
    raw: &[u8],
) -> Cow<[u8]> {
    use ContentTransferEncoding as CTE;

    match cte {
        CTE::SevenBit | CTE::EightBit | CTE::Binary => Cow::Borrowed(raw),
        CTE::QuotedPrintable => qp_decode(raw),
        CTE::Base64 => Cow::Owned(decode_base64_lenient(raw)),
    }
}

fn decode_base64_lenient(raw: &[u8]) -> Vec<u8> {
    let end = memchr::memchr(b'=', raw).unwrap_or_else(|| raw.len());
    let mut clean: Vec<u8> = raw[..end]
        .iter()
        .copied()
        .filter(|&b| b.is_ascii_alphanumeric() || b'+' == b || b'/' == b)
        .collect();

    // Padding is restored here since some agents omit it
    match clean.len() % 4 {
        0 => (),
        1 => {
            clean.pop();
        },
        n => clean.extend(std::iter::repeat(b'=').take(4 - n)),
    }

    let mut out = Vec::with_capacity(clean.len() / 4 * 3);
    if base64::decode_config_buf(&clean, base64::STANDARD, &mut out).is_err()
    {
        // Only the final group can fail (non-zero trailing bits), so drop it
        out.clear();
        let usable = clean.len().saturating_sub(4);
        let _ = base64::decode_config_buf(
            &clean[..usable],
            base64::STANDARD,
            &mut out,
        );
    }
    out
}

/// Estimate the decoded size of a body without decoding it.
pub fn decoded_size_hint(cte: ContentTransferEncoding, raw: &[u8]) -> i64 {
    match cte {
        ContentTransferEncoding::Base64 => {
            let significant = raw
                .iter()
                .filter(|&&b| {
                    b.is_ascii_alphanumeric() || b'+' == b || b'/' == b
                })
                .count();
            (significant * 3 / 4) as i64
        },
        _ => raw.len() as i64,
    }
}

/// Whether `charset` names a character set we can decode.
pub fn is_known_charset(charset: &str) -> bool {
    Encoding::for_label_no_replacement(charset.trim().as_bytes()).is_some()
}

/// Convert `bytes` in the given charset to a string.
///
/// With no charset, the data is assumed to be UTF-8, which covers both
/// US-ASCII and the common case of undeclared 8-bit text. Charsets we do not
/// know (UTF-7 among them) are logged and decoded the same way.
pub fn decode_charset(charset: Option<&str>, bytes: &[u8]) -> String {
    let charset = charset.map(str::trim).filter(|cs| !cs.is_empty());
    let encoding = charset.and_then(|cs| {
        let encoding = Encoding::for_label_no_replacement(cs.as_bytes());
        if encoding.is_none() {
            info!("Unsupported charset {:?}, decoding as UTF-8", cs);
        }
        encoding
    });

    match encoding {
        Some(encoding) => {
            encoding.decode_with_bom_removal(bytes).0.into_owned()
        },
        None => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_decode_transfer() {
        assert_eq!(
            b"hello world",
            &decode_transfer(ContentTransferEncoding::SevenBit, b"hello world")
                [..]
        );
        assert_eq!(
            b"caf\xe9",
            &decode_transfer(
                ContentTransferEncoding::QuotedPrintable,
                b"caf=E9"
            )[..]
        );
        assert_eq!(
            b"Hello, world!",
            &decode_transfer(
                ContentTransferEncoding::Base64,
                b"SGVsbG8s\r\nIHdvcmxk\r\nIQ==\r\n"
            )[..]
        );
    }

    #[test]
    fn base64_tolerates_garbage() {
        assert_eq!(
            b"Hello, world!",
            &decode_transfer(
                ContentTransferEncoding::Base64,
                b"SGVsbG8s IHdvcmxk*IQ\r\n"
            )[..]
        );
        assert_eq!(
            b"Hello",
            &decode_transfer(ContentTransferEncoding::Base64, b"SGVsbG8=x\r\n")
                [..]
        );
    }

    #[test]
    fn test_decoded_size_hint() {
        assert_eq!(
            12,
            decoded_size_hint(
                ContentTransferEncoding::Base64,
                b"SGVsbG8s\r\nIHdvcmxk\r\n"
            )
        );
        assert_eq!(
            5,
            decoded_size_hint(ContentTransferEncoding::EightBit, b"hello")
        );
    }

    #[test]
    fn test_decode_charset() {
        assert_eq!("café", decode_charset(Some("ISO-8859-1"), b"caf\xe9"));
        assert_eq!("café", decode_charset(None, "café".as_bytes()));
        assert_eq!(
            "\u{30c6}\u{30b9}\u{30c8}",
            decode_charset(Some("Shift_JIS"), b"\x83\x65\x83\x58\x83\x67")
        );
        assert_eq!(
            "a+ZeVnLIqe-",
            decode_charset(Some("utf-7"), b"a+ZeVnLIqe-")
        );
        assert_eq!("x\u{fffd}", decode_charset(Some("x-bogus"), b"x\xff"));
        assert!(is_known_charset("windows-1252"));
        assert!(!is_known_charset("x-bogus"));
    }

    proptest! {
        #[test]
        fn base64_never_panics(
            s in prop::collection::vec(prop::num::u8::ANY, 0..100)
        ) {
            decode_transfer(ContentTransferEncoding::Base64, &s);
        }
    }
}
