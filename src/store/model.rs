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
use std::sync::Arc;

use bitflags::bitflags;
use chrono::prelude::*;

use crate::mime::content_encoding::{decode_charset, decode_transfer};
use crate::mime::encoded_word::ew_decode_unstructured;
use crate::mime::model::*;
use crate::support::error::Error;

/// User flag recording that a message is known to have attachments.
pub const HAS_ATTACHMENT: &str = "$HasAttachment";
/// User flag recording that a message is known to have no attachments.
pub const HAS_NO_ATTACHMENT: &str = "$HasNoAttachment";
/// Prefix of the colour label user flags, `$cl_1` to `$cl_10`.
pub const COLOR_LABEL_PREFIX: &str = "$cl_";
pub const MAX_COLOR_LABEL: u32 = 10;

bitflags! {
    #[derive(Default)]
    pub struct SystemFlags: u8 {
        const SEEN = 1 << 0;
        const ANSWERED = 1 << 1;
        const DELETED = 1 << 2;
        const DRAFT = 1 << 3;
        const FLAGGED = 1 << 4;
        const RECENT = 1 << 5;
    }
}

impl SystemFlags {
    /// The names of the set flags, lower case, in declaration order.
    pub fn names(self) -> Vec<&'static str> {
        [
            (SystemFlags::SEEN, "seen"),
            (SystemFlags::ANSWERED, "answered"),
            (SystemFlags::DELETED, "deleted"),
            (SystemFlags::DRAFT, "draft"),
            (SystemFlags::FLAGGED, "flagged"),
            (SystemFlags::RECENT, "recent"),
        ]
        .iter()
        .filter(|&&(flag, _)| self.contains(flag))
        .map(|&(_, name)| name)
        .collect()
    }
}

/// The header block of a message or part.
///
/// Values are unfolded and trimmed, but encoded words are left alone; use
/// `decoded()` for display. Lookup is case-insensitive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// The first value of the named header.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|&&(ref n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, ref v)| v.as_str())
    }

    pub fn get_all<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |&&(ref n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, ref v)| v.as_str())
    }

    /// The first value of the named header with encoded words decoded.
    pub fn decoded(&self, name: &str) -> Option<String> {
        self.get(name).map(|v| ew_decode_unstructured(v).into_owned())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|&(ref n, ref v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Lazy access to the content of a leaf part.
pub trait ContentSource: fmt::Debug {
    /// Read the content with transfer encoding removed.
    fn read(&self) -> Result<Vec<u8>, Error>;
}

/// Content as it appeared in the message, decoded on each read.
#[derive(Debug)]
pub struct EncodedContent {
    pub encoding: ContentTransferEncoding,
    pub raw: Vec<u8>,
}

impl ContentSource for EncodedContent {
    fn read(&self) -> Result<Vec<u8>, Error> {
        Ok(decode_transfer(self.encoding, &self.raw).into_owned())
    }
}

/// Content which is already decoded, e.g. produced by a sub-decoder.
#[derive(Debug)]
pub struct DecodedContent(pub Vec<u8>);

impl ContentSource for DecodedContent {
    fn read(&self) -> Result<Vec<u8>, Error> {
        Ok(self.0.clone())
    }
}

/// The declared disposition of a part.
///
/// Dispositions other than `inline` are treated as `attachment`, as RFC 2183
/// requires for unrecognised values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    pub fn from_header(cd: &ContentDisposition) -> Self {
        if "inline" == cd.disposition {
            Disposition::Inline
        } else {
            Disposition::Attachment
        }
    }
}

#[derive(Clone, Debug)]
pub enum PartBody {
    Leaf(Arc<dyn ContentSource>),
    Multipart(Vec<Part>),
    Message(Box<Message>),
}

/// A node in the MIME tree.
#[derive(Clone, Debug)]
pub struct Part {
    /// The declared content type. `None` if the part had no usable
    /// `Content-Type` header.
    pub content_type: Option<ContentType>,
    pub disposition: Option<Disposition>,
    /// The decoded file name, from `Content-Disposition` or the `name`
    /// parameter of `Content-Type`.
    pub filename: Option<String>,
    /// The `Content-ID`, without angle brackets.
    pub content_id: Option<String>,
    /// Decoded size in bytes, or -1 for multipart containers.
    pub size: i64,
    pub headers: Headers,
    pub body: PartBody,
}

impl Part {
    /// Create a leaf part from decoded content, as the sub-decoders do.
    pub fn synthetic(
        content_type: ContentType,
        filename: Option<String>,
        data: Vec<u8>,
    ) -> Self {
        Part {
            content_type: Some(content_type),
            disposition: None,
            filename,
            content_id: None,
            size: data.len() as i64,
            headers: Headers::default(),
            body: PartBody::Leaf(Arc::new(DecodedContent(data))),
        }
    }

    /// Create a part wrapping a nested message.
    pub fn nested(message: Message) -> Self {
        Part {
            content_type: Some(ContentType::new("message", "rfc822")),
            disposition: None,
            filename: None,
            content_id: None,
            size: message.raw.len() as i64,
            headers: Headers::default(),
            body: PartBody::Message(Box::new(message)),
        }
    }

    /// The `charset` parameter of the content type, if any.
    pub fn charset(&self) -> Option<&str> {
        self.content_type.as_ref().and_then(|ct| ct.parm("charset"))
    }

    pub fn children(&self) -> &[Part] {
        match self.body {
            PartBody::Multipart(ref children) => children,
            _ => &[],
        }
    }

    pub fn nested_message(&self) -> Option<&Message> {
        match self.body {
            PartBody::Message(ref message) => Some(message),
            _ => None,
        }
    }

    /// Read the transfer-decoded bytes of this part.
    ///
    /// For a nested message, this is the raw message. Multipart containers
    /// have no content of their own.
    pub fn read_bytes(&self) -> Result<Vec<u8>, Error> {
        match self.body {
            PartBody::Leaf(ref source) => source.read(),
            PartBody::Message(ref message) => Ok(message.raw.to_vec()),
            PartBody::Multipart(_) => Ok(vec![]),
        }
    }

    /// Read the content as text, decoding it from its declared charset.
    pub fn text(&self) -> Result<String, Error> {
        let bytes = self.read_bytes()?;
        Ok(decode_charset(self.charset(), &bytes))
    }
}

/// The decoded envelope fields of a message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Envelope {
    pub from: Vec<Address>,
    pub to: Vec<Address>,
    pub cc: Vec<Address>,
    pub bcc: Vec<Address>,
    pub subject: Option<String>,
    pub sent_date: Option<DateTime<FixedOffset>>,
    /// From the topmost `Received` header.
    pub received_date: Option<DateTime<FixedOffset>>,
    pub message_id: Option<String>,
}

/// A message: the root part plus envelope and flags.
#[derive(Clone, Debug)]
pub struct Message {
    pub envelope: Envelope,
    pub headers: Headers,
    pub flags: SystemFlags,
    pub user_flags: Vec<String>,
    pub root: Part,
    /// The message exactly as stored.
    pub raw: Arc<Vec<u8>>,
}

impl Message {
    pub fn has_user_flag(&self, flag: &str) -> bool {
        self.user_flags.iter().any(|f| f.eq_ignore_ascii_case(flag))
    }

    /// The colour label (1 to 10) carried as a user flag, if any.
    pub fn color_label(&self) -> Option<u32> {
        self.user_flags.iter().find_map(|flag| {
            let label = flag.get(..COLOR_LABEL_PREFIX.len())?;
            if !label.eq_ignore_ascii_case(COLOR_LABEL_PREFIX) {
                return None;
            }

            flag[COLOR_LABEL_PREFIX.len()..]
                .parse::<u32>()
                .ok()
                .filter(|&n| n >= 1 && n <= MAX_COLOR_LABEL)
        })
    }
}

/// Source of messages for the dumper.
pub trait MessageAccessor {
    /// The name of the folder holding the message, for diagnostics.
    fn folder(&self) -> &str;
    /// The position of the message within its folder.
    fn uid(&self) -> u32;
    /// Load the message.
    fn open(&self) -> Result<Message, Error>;
}

/// The write side of the mail store, used only to record has-attachment
/// verdicts.
pub trait MailFolder {
    fn name(&self) -> &str;
    /// Acquire exclusive write access.
    fn open_read_write(&mut self) -> Result<(), Error>;
    /// Set or clear a user flag. Requires `open_read_write`.
    fn set_user_flag(
        &mut self,
        uid: u32,
        flag: &str,
        on: bool,
    ) -> Result<(), Error>;
    /// Release write access.
    fn close(&mut self) -> Result<(), Error>;
}
