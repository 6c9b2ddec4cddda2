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

//! The protocol between the dumper and the visitors.

use chrono::prelude::*;
use log::{error, warn};

use super::classify::SpecialKind;
use super::id::{AttachmentId, IdPrefix};
use crate::mime::model::Address;
use crate::store::model::*;
use crate::support::error::Error;

/// What the dumper should do after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Do not descend into the multipart or nested message just reported,
    /// but carry on with its siblings. Equivalent to `Continue` for other
    /// events.
    Skip,
    /// End the whole traversal.
    Stop,
}

/// One structural element of a message.
///
/// The envelope events come first, always in declaration order, followed by
/// the part events in depth-first order, and finally `MessageEnd` if the
/// traversal was not stopped.
#[derive(Clone, Copy, Debug)]
pub enum PartEvent<'a> {
    From(&'a [Address]),
    To(&'a [Address]),
    Cc(&'a [Address]),
    Bcc(&'a [Address]),
    Subject(Option<&'a str>),
    SentDate(Option<DateTime<FixedOffset>>),
    ReceivedDate(Option<DateTime<FixedOffset>>),
    Headers(&'a Headers),
    SystemFlags(SystemFlags),
    UserFlags(&'a [String]),

    /// Inline plain or enriched text, with any UUEncoded files removed.
    InlineText {
        id: AttachmentId,
        part: &'a Part,
        text: &'a str,
    },
    /// A file which was UUEncoded inside inline text. `part` is synthetic.
    InlineUuencoded { id: AttachmentId, part: &'a Part },
    InlineHtml {
        id: AttachmentId,
        part: &'a Part,
        text: &'a str,
    },
    /// Anything that is neither body text nor one of the other categories.
    Attachment { id: AttachmentId, part: &'a Part },
    Image {
        id: AttachmentId,
        part: &'a Part,
        content_id: Option<&'a str>,
    },
    Special {
        id: AttachmentId,
        part: &'a Part,
        kind: SpecialKind,
    },
    /// A multipart container. `prefix` is the prefix of its children; `id`
    /// is its own position within its parent, absent for a message root.
    Multipart {
        prefix: IdPrefix,
        id: Option<AttachmentId>,
        part: &'a Part,
        child_count: usize,
    },
    NestedMessage {
        id: AttachmentId,
        part: &'a Part,
        message: &'a Message,
    },

    MessageEnd(&'a Message),
}

impl PartEvent<'_> {
    /// The identifier of the part this event is about, if it is about a
    /// single part.
    pub fn id(&self) -> Option<AttachmentId> {
        match *self {
            PartEvent::InlineText { id, .. }
            | PartEvent::InlineUuencoded { id, .. }
            | PartEvent::InlineHtml { id, .. }
            | PartEvent::Attachment { id, .. }
            | PartEvent::Image { id, .. }
            | PartEvent::Special { id, .. }
            | PartEvent::NestedMessage { id, .. } => Some(id),
            PartEvent::Multipart { id, .. } => id,
            _ => None,
        }
    }

    /// The part this event is about, if any.
    pub fn part(&self) -> Option<&Part> {
        match *self {
            PartEvent::InlineText { part, .. }
            | PartEvent::InlineUuencoded { part, .. }
            | PartEvent::InlineHtml { part, .. }
            | PartEvent::Attachment { part, .. }
            | PartEvent::Image { part, .. }
            | PartEvent::Special { part, .. }
            | PartEvent::Multipart { part, .. }
            | PartEvent::NestedMessage { part, .. } => Some(part),
            _ => None,
        }
    }
}

/// A consumer of `PartEvent`s.
///
/// Each nested message is dumped into a fresh visitor obtained from
/// `nested_visitor()`, whose output is handed back through
/// `nested_result()`. Visitors never share state across messages.
pub trait PartVisitor {
    type Output;

    fn handle(&mut self, event: &PartEvent<'_>) -> Flow;

    /// Create the visitor for the nested message just reported.
    ///
    /// Returning `None` skips the message.
    fn nested_visitor(
        &mut self,
        id: AttachmentId,
        message: &Message,
    ) -> Option<Box<dyn PartVisitor<Output = Self::Output>>>;

    /// Receive the output of the visitor created by `nested_visitor()`.
    fn nested_result(&mut self, id: AttachmentId, output: Self::Output)
        -> Flow;

    /// Produce the result. Called exactly once, whether or not the
    /// traversal was stopped.
    fn finish(&mut self) -> Self::Output;
}

/// Read the bytes of a part, substituting nothing if that fails.
pub fn read_bytes_or_empty(id: AttachmentId, part: &Part) -> Vec<u8> {
    part.read_bytes().unwrap_or_else(|e| {
        report_content_error(id, e);
        vec![]
    })
}

/// Read the text of a part, substituting nothing if that fails.
pub fn read_text_or_empty(id: AttachmentId, part: &Part) -> String {
    part.text().unwrap_or_else(|e| {
        report_content_error(id, e);
        String::new()
    })
}

fn report_content_error(id: AttachmentId, e: Error) {
    let e = match e {
        e @ Error::PartContent(..) => e,
        e => Error::PartContent(id.to_string(), e.to_string()),
    };

    if e.is_recoverable() {
        warn!("{}", e);
    } else {
        error!("{}", e);
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::mime::model::ContentType;

    #[derive(Debug)]
    struct Unreadable;

    impl ContentSource for Unreadable {
        fn read(&self) -> Result<Vec<u8>, Error> {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stream closed",
            )))
        }
    }

    #[test]
    fn unreadable_content_is_empty() {
        crate::init_test_log();

        let mut part =
            Part::synthetic(ContentType::new("text", "plain"), None, vec![]);
        part.body = PartBody::Leaf(Arc::new(Unreadable));
        let id = AttachmentId::new(1, 1, 1);
        assert!(read_bytes_or_empty(id, &part).is_empty());
        assert_eq!("", read_text_or_empty(id, &part));
    }

    #[test]
    fn event_accessors() {
        let part =
            Part::synthetic(ContentType::new("image", "png"), None, vec![1]);
        let id = AttachmentId::new(1, 1, 2);
        let event = PartEvent::Image {
            id,
            part: &part,
            content_id: None,
        };
        assert_eq!(Some(id), event.id());
        assert_eq!(Some(1), event.part().map(|p| p.size));

        let root = PartEvent::Multipart {
            prefix: IdPrefix::new(1, 1),
            id: None,
            part: &part,
            child_count: 0,
        };
        assert_eq!(None, root.id());
        assert_eq!(None, PartEvent::Subject(None).id());
    }
}
