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

//! Attachment identifiers, `message.multipart.part`.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::support::error::Error;

/// The address of a multipart container (or of the root of a message which
/// is not multipart): `message.multipart`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdPrefix {
    pub message: u32,
    pub multipart: u32,
}

impl IdPrefix {
    pub fn new(message: u32, multipart: u32) -> Self {
        IdPrefix { message, multipart }
    }

    /// The identifier of the 1-based `part` under this prefix.
    pub fn child(self, part: u32) -> AttachmentId {
        AttachmentId {
            message: self.message,
            multipart: self.multipart,
            part,
        }
    }
}

impl fmt::Display for IdPrefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.message, self.multipart)
    }
}

/// The stable handle of one part within one message.
///
/// Rendered as `m.k.i`. All three components are 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttachmentId {
    pub message: u32,
    pub multipart: u32,
    pub part: u32,
}

impl AttachmentId {
    pub fn new(message: u32, multipart: u32, part: u32) -> Self {
        AttachmentId {
            message,
            multipart,
            part,
        }
    }

    pub fn prefix(self) -> IdPrefix {
        IdPrefix::new(self.message, self.multipart)
    }

    /// The file name used for parts which have no usable one of their own.
    pub fn placeholder_filename(self) -> String {
        format!("Part {}", self)
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.message, self.multipart, self.part)
    }
}

impl FromStr for AttachmentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let bad = || Error::BadAttachmentId(s.to_owned());

        let mut components = [0u32; 3];
        let mut split = s.trim().split('.');
        for component in &mut components {
            let text = split.next().ok_or_else(bad)?;
            if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                return Err(bad());
            }
            *component = text.parse().map_err(|_| bad())?;
            if 0 == *component {
                return Err(bad());
            }
        }

        if split.next().is_some() {
            return Err(bad());
        }

        Ok(AttachmentId::new(components[0], components[1], components[2]))
    }
}

impl Serialize for AttachmentId {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for IdPrefix {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
