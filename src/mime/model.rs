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

use std::fmt;

use serde::Serialize;

/// A single mailbox from an address header, already decoded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Address {
    /// The display name, if there is a non-empty one.
    pub name: Option<String>,
    /// The `local@domain` address.
    ///
    /// For addresses that could not be parsed at all, this is whatever text
    /// was found in the header, trimmed.
    pub address: String,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name {
            Some(ref name) => write!(f, "{} <{}>", name, self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

/// A parsed `Content-Type` header.
///
/// `typ` and `subtype` are always lower case. Parameter names are lower case
/// and RFC 2231 continuations have been reassembled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentType {
    pub typ: String,
    pub subtype: String,
    pub parms: Vec<(String, String)>,
}

impl ContentType {
    pub fn new(typ: &str, subtype: &str) -> Self {
        ContentType {
            typ: typ.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            parms: vec![],
        }
    }

    /// Parse a `type/subtype` string, without parameters.
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        let mut split = mime_type.trim().splitn(2, '/');
        match (split.next(), split.next()) {
            (Some(typ), Some(subtype))
                if !typ.is_empty() && !subtype.is_empty() =>
            {
                Some(ContentType::new(typ, subtype))
            },
            _ => None,
        }
    }

    pub fn with_parm(mut self, name: &str, value: &str) -> Self {
        self.parms
            .push((name.to_ascii_lowercase(), value.to_owned()));
        self
    }

    pub fn is_type(&self, typ: &str) -> bool {
        self.typ.eq_ignore_ascii_case(typ)
    }

    pub fn is_subtype(&self, subtype: &str) -> bool {
        self.subtype.eq_ignore_ascii_case(subtype)
    }

    pub fn is(&self, typ: &str, subtype: &str) -> bool {
        self.is_type(typ) && self.is_subtype(subtype)
    }

    pub fn parm(&self, name: &str) -> Option<&str> {
        self.parms
            .iter()
            .find(|&&(ref n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, ref v)| v.as_str())
    }

    /// The `type/subtype` string.
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.typ, self.subtype)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.typ, self.subtype)
    }
}

/// A parsed `Content-Disposition` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentDisposition {
    /// The disposition type, lower case.
    pub disposition: String,
    pub parms: Vec<(String, String)>,
}

impl ContentDisposition {
    pub fn parm(&self, name: &str) -> Option<&str> {
        self.parms
            .iter()
            .find(|&&(ref n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, ref v)| v.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentTransferEncoding {
    SevenBit,
    EightBit,
    Binary,
    QuotedPrintable,
    Base64,
}

impl Default for ContentTransferEncoding {
    fn default() -> Self {
        ContentTransferEncoding::SevenBit
    }
}
