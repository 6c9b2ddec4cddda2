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

//! Parsers for the handful of structured headers the engine needs.
//!
//! All of these are lenient: they accept the common ways real agents violate
//! RFC 2045, RFC 2231 and RFC 5322, and they return `None` (or an empty list)
//! instead of failing when nothing sensible can be extracted.

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::prelude::*;
use encoding_rs::Encoding;
use lazy_static::lazy_static;
use nom::branch::alt;
use nom::bytes::complete::{is_not, take, take_while, take_while1};
use nom::character::complete::char;
use nom::combinator::{map, opt, recognize};
use nom::error::ErrorKind;
use nom::multi::{fold_many0, many1, separated_nonempty_list};
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::IResult;
use regex::Regex;

use super::model::*;
use super::strings::decode_phrase;

lazy_static! {
    static ref DATE_COMMENT: Regex = Regex::new(r"\([^)]*\)").unwrap();
    static ref DATE_TRAILER: Regex =
        Regex::new(r"^(.*[+-][0-9]{4})\s.*$").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

fn is_ws(c: char) -> bool {
    ' ' == c || '\t' == c || '\r' == c || '\n' == c
}

// RFC 2045 "token"
fn is_token_char(c: char) -> bool {
    c > ' ' && '\x7F' != c && !"()<>@,;:\\\"/[]?=".contains(c)
}

// RFC 5322 "atext", amended by RFC 6532 to include all non-ASCII characters
fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c) || c > '\x7F'
}

fn ows(i: &str) -> IResult<&str, &str> {
    take_while(is_ws)(i)
}

fn token(i: &str) -> IResult<&str, &str> {
    take_while1(is_token_char)(i)
}

// RFC 5322 comment, which may nest
fn comment(i: &str) -> IResult<&str, ()> {
    let (mut rest, _) = char('(')(i)?;
    let mut depth = 1;
    loop {
        let mut chars = rest.char_indices();
        match chars.next() {
            None => return Err(nom::Err::Error((i, ErrorKind::Char))),
            Some((_, '\\')) => {
                let skip = chars.next().map(|(ix, c)| ix + c.len_utf8());
                rest = &rest[skip.unwrap_or_else(|| rest.len())..];
            },
            Some((_, '(')) => {
                depth += 1;
                rest = &rest[1..];
            },
            Some((_, ')')) => {
                depth -= 1;
                rest = &rest[1..];
                if 0 == depth {
                    return Ok((rest, ()));
                }
            },
            Some((_, c)) => rest = &rest[c.len_utf8()..],
        }
    }
}

// RFC 5322 comment or folding white space, any amount (including none)
fn cfws(i: &str) -> IResult<&str, ()> {
    let mut i = i;
    loop {
        let (rest, _) = ows(i)?;
        i = rest;
        match comment(i) {
            Ok((rest, ())) => i = rest,
            Err(_) => return Ok((i, ())),
        }
    }
}

fn quoted_pair(i: &str) -> IResult<&str, &str> {
    preceded(char('\\'), take(1usize))(i)
}

// RFC 5322 quoted-string. A missing closing quote is tolerated.
fn quoted_string(i: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        fold_many0(
            alt((is_not("\\\""), quoted_pair)),
            String::new(),
            |mut acc: String, item: &str| {
                acc.push_str(item);
                acc
            },
        ),
        opt(char('"')),
    )(i)
}

#[derive(Debug)]
struct RawParm {
    name: String,
    value: String,
}

fn parm_value(i: &str) -> IResult<&str, String> {
    alt((
        quoted_string,
        // Many agents put unquoted spaces and other specials in values, so
        // take everything up to the next delimiter
        map(take_while(|c| ';' != c), |s: &str| s.trim().to_owned()),
    ))(i)
}

fn parameter(i: &str) -> IResult<&str, RawParm> {
    let (i, _) = ows(i)?;
    let (i, name) = token(i)?;
    let (i, _) = tuple((ows, char('='), ows))(i)?;
    let (i, value) = parm_value(i)?;
    Ok((
        i,
        RawParm {
            name: name.to_ascii_lowercase(),
            value,
        },
    ))
}

fn semicolon(i: &str) -> IResult<&str, char> {
    preceded(ows, char(';'))(i)
}

fn parameters(mut i: &str) -> Vec<RawParm> {
    let mut parms = Vec::new();
    loop {
        match semicolon(i) {
            Ok((rest, _)) => i = rest,
            Err(_) => break,
        }

        match parameter(i) {
            Ok((rest, parm)) => {
                parms.push(parm);
                i = rest;
            },
            // Skip garbage up to the next parameter
            Err(_) => match i.find(';') {
                Some(ix) => i = &i[ix..],
                None => break,
            },
        }
    }

    parms
}

/// Reassemble RFC 2231 parameter continuations and decode extended values.
///
/// `title*0*=us-ascii'en'This%20is; title*1*=%20fun` becomes
/// `title=This is fun`. Parameters not using RFC 2231 syntax pass through
/// unchanged. Where both a plain and an extended form of the same parameter
/// are present, the extended one wins.
fn combine_parms(raw: Vec<RawParm>) -> Vec<(String, String)> {
    // name -> (section -> (is_extended, value))
    let mut sectioned: BTreeMap<String, BTreeMap<u32, (bool, String)>> =
        BTreeMap::new();
    let mut order = Vec::new();
    let mut plain: Vec<(String, String)> = Vec::new();

    for parm in raw {
        let (name, extended) = match parm.name.strip_suffix('*') {
            Some(stripped) => (stripped, true),
            None => (parm.name.as_str(), false),
        };

        let (base, section) = match name.rfind('*') {
            Some(star) => match name[star + 1..].parse::<u32>() {
                Ok(section) => (&name[..star], Some(section)),
                Err(_) => (name, None),
            },
            None => (name, None),
        };

        if !extended && section.is_none() {
            plain.push((base.to_owned(), parm.value));
            continue;
        }

        if !sectioned.contains_key(base) {
            order.push(base.to_owned());
        }
        sectioned
            .entry(base.to_owned())
            .or_default()
            .insert(section.unwrap_or(0), (extended, parm.value));
    }

    for name in order {
        let sections = match sectioned.remove(&name) {
            Some(s) => s,
            None => continue,
        };

        let mut charset: Option<&'static Encoding> = None;
        let mut bytes = Vec::new();
        for (ix, (_, (extended, value))) in sections.into_iter().enumerate() {
            if !extended {
                bytes.extend_from_slice(value.as_bytes());
                continue;
            }

            let encoded = if 0 == ix {
                let mut split = value.splitn(3, '\'');
                match (split.next(), split.next(), split.next()) {
                    (Some(cs), Some(_lang), Some(encoded)) => {
                        charset =
                            Encoding::for_label_no_replacement(cs.as_bytes());
                        encoded.to_owned()
                    },
                    _ => value,
                }
            } else {
                value
            };
            bytes.extend(percent_decode(&encoded));
        }

        let decoded = match charset {
            Some(enc) => enc.decode_with_bom_removal(&bytes).0.into_owned(),
            None => String::from_utf8_lossy(&bytes).into_owned(),
        };

        plain.retain(|&(ref n, _)| *n != name);
        plain.push((name, decoded));
    }

    plain
}

fn percent_decode(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut ix = 0;
    while ix < bytes.len() {
        if b'%' == bytes[ix] && ix + 2 < bytes.len() {
            let hi = (bytes[ix + 1] as char).to_digit(16);
            let lo = (bytes[ix + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi << 4 | lo) as u8);
                ix += 3;
                continue;
            }
        }
        out.push(bytes[ix]);
        ix += 1;
    }
    out
}

fn type_and_subtype(i: &str) -> IResult<&str, (&str, &str)> {
    let (i, _) = ows(i)?;
    let (i, typ) = token(i)?;
    let (i, _) = tuple((ows, char('/'), ows))(i)?;
    let (i, subtype) = token(i)?;
    Ok((i, (typ, subtype)))
}

/// Parse the value of a `Content-Type` header.
///
/// Returns `None` if the value does not even have a `type/subtype`.
pub fn parse_content_type(value: &str) -> Option<ContentType> {
    let (rest, (typ, subtype)) = type_and_subtype(value).ok()?;
    Some(ContentType {
        typ: typ.to_ascii_lowercase(),
        subtype: subtype.to_ascii_lowercase(),
        parms: combine_parms(parameters(rest)),
    })
}

/// Parse the value of a `Content-Disposition` header.
pub fn parse_content_disposition(value: &str) -> Option<ContentDisposition> {
    let (rest, disposition) = preceded(ows, token)(value).ok()?;
    Some(ContentDisposition {
        disposition: disposition.to_ascii_lowercase(),
        parms: combine_parms(parameters(rest)),
    })
}

/// Parse the value of a `Content-Transfer-Encoding` header.
///
/// Returns `None` for unknown encodings.
pub fn parse_content_transfer_encoding(
    value: &str,
) -> Option<ContentTransferEncoding> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("7bit") {
        Some(ContentTransferEncoding::SevenBit)
    } else if value.eq_ignore_ascii_case("8bit") {
        Some(ContentTransferEncoding::EightBit)
    } else if value.eq_ignore_ascii_case("binary") {
        Some(ContentTransferEncoding::Binary)
    } else if value.eq_ignore_ascii_case("quoted-printable") {
        Some(ContentTransferEncoding::QuotedPrintable)
    } else if value.eq_ignore_ascii_case("base64") {
        Some(ContentTransferEncoding::Base64)
    } else {
        None
    }
}

/// Parse a `Message-ID` or `Content-ID` value, returning the identifier
/// without the angle brackets.
///
/// Values lacking brackets are accepted as-is, since many agents generate
/// bare content IDs.
pub fn parse_message_id(value: &str) -> Option<String> {
    let (rest, _) = cfws(value).ok()?;
    let id = rest.trim();
    let id = id.strip_prefix('<').unwrap_or(id);
    let id = match id.find('>') {
        Some(end) => &id[..end],
        None => id,
    };
    let id = id.trim();

    if id.is_empty() {
        None
    } else {
        Some(id.to_owned())
    }
}

fn atom(i: &str) -> IResult<&str, &str> {
    delimited(cfws, take_while1(is_atext), cfws)(i)
}

fn word(i: &str) -> IResult<&str, String> {
    delimited(
        cfws,
        alt((quoted_string, map(take_while1(is_atext), str::to_owned))),
        cfws,
    )(i)
}

// The obsolete phrase syntax accounts for the unquoted '.' many agents put
// into display names, so we allow it inside the phrase atoms.
fn phrase(i: &str) -> IResult<&str, Vec<String>> {
    many1(delimited(
        cfws,
        alt((
            quoted_string,
            map(take_while1(|c| is_atext(c) || '.' == c), str::to_owned),
        )),
        cfws,
    ))(i)
}

fn domain_literal(i: &str) -> IResult<&str, String> {
    map(
        delimited(
            cfws,
            recognize(tuple((char('['), is_not("]"), char(']')))),
            cfws,
        ),
        str::to_owned,
    )(i)
}

fn domain(i: &str) -> IResult<&str, String> {
    alt((
        domain_literal,
        map(separated_nonempty_list(char('.'), atom), |parts| {
            parts.join(".")
        }),
    ))(i)
}

fn addr_spec(i: &str) -> IResult<&str, String> {
    let (i, local) = separated_nonempty_list(char('.'), word)(i)?;
    let (i, _) = char('@')(i)?;
    let (i, domain) = domain(i)?;
    Ok((i, format!("{}@{}", local.join("."), domain)))
}

// RFC 5322 4.4 obsolete routing information, which is discarded
fn obs_route(i: &str) -> IResult<&str, &str> {
    recognize(tuple((char('@'), is_not(":>"), char(':'))))(i)
}

fn angle_addr(i: &str) -> IResult<&str, String> {
    delimited(
        pair(cfws, char('<')),
        map(
            pair(opt(obs_route), opt(addr_spec)),
            |(_, addr)| addr.unwrap_or_default(),
        ),
        pair(char('>'), cfws),
    )(i)
}

fn mailbox(i: &str) -> IResult<&str, Address> {
    alt((
        map(pair(opt(phrase), angle_addr), |(name, address)| Address {
            name: name
                .map(|words| decode_phrase(&words))
                .filter(|n| !n.is_empty()),
            address,
        }),
        map(addr_spec, |address| Address {
            name: None,
            address,
        }),
    ))(i)
}

fn list_delim(i: &str) -> IResult<&str, ()> {
    map(many1(tuple((cfws, char(','), cfws))), |_| ())(i)
}

fn mailbox_list(i: &str) -> IResult<&str, Vec<Address>> {
    let (i, _) = opt(list_delim)(i)?;
    let (i, list) = separated_nonempty_list(list_delim, mailbox)(i)?;
    let (i, _) = opt(list_delim)(i)?;
    Ok((i, list))
}

// Group members are flattened into the surrounding list; the group name is
// not needed anywhere.
fn group(i: &str) -> IResult<&str, Vec<Address>> {
    let (i, _) = terminated(phrase, char(':'))(i)?;
    let (i, members) = opt(mailbox_list)(i)?;
    let (i, _) = tuple((cfws, opt(char(';')), cfws))(i)?;
    Ok((i, members.unwrap_or_default()))
}

fn address(i: &str) -> IResult<&str, Vec<Address>> {
    alt((group, map(mailbox, |m| vec![m])))(i)
}

fn address_list(i: &str) -> IResult<&str, Vec<Address>> {
    let (i, _) = opt(list_delim)(i)?;
    let (i, lists) = separated_nonempty_list(list_delim, address)(i)?;
    let (i, _) = opt(list_delim)(i)?;
    Ok((i, lists.into_iter().flatten().collect()))
}

/// Parse an address list header (`From`, `To`, `Cc`, `Bcc`, ...).
///
/// If the value as a whole cannot be parsed, each comma-separated element is
/// tried on its own, and elements that still cannot be parsed are returned
/// verbatim (trimmed) as the address with no display name.
pub fn parse_address_list(value: &str) -> Vec<Address> {
    if value.trim().is_empty() {
        return vec![];
    }

    if let Ok((rest, list)) = address_list(value) {
        if rest.trim().is_empty() {
            return list;
        }
    }

    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match mailbox(s) {
            Ok((rest, mbox)) if rest.trim().is_empty() => mbox,
            _ => Address {
                name: None,
                address: s.to_owned(),
            },
        })
        .collect()
}

/// Parse an RFC 5322 date, including the obsolete forms seen in the wild
/// (comments, trailing zone names, missing day of week).
pub fn parse_datetime(value: &str) -> Option<DateTime<FixedOffset>> {
    let cleaned = DATE_COMMENT.replace_all(value, " ");
    let cleaned = WHITESPACE.replace_all(cleaned.trim(), " ");

    DateTime::parse_from_rfc2822(&cleaned)
        .ok()
        .or_else(|| {
            let trimmed: Cow<str> = DATE_TRAILER.replace(&cleaned, "$1");
            DateTime::parse_from_rfc2822(&trimmed).ok()
        })
        .or_else(|| DateTime::parse_from_rfc3339(&cleaned).ok())
}

/// Extract the date from a `Received` header, which follows the last `;`.
pub fn parse_received_date(value: &str) -> Option<DateTime<FixedOffset>> {
    value
        .rfind(';')
        .and_then(|semi| parse_datetime(&value[semi + 1..]))
}
