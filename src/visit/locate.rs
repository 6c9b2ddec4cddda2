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

//! Finding one part by its identifier.

use log::debug;

use crate::dump::classify::{display_filename, effective_type};
use crate::dump::event::read_bytes_or_empty;
use crate::dump::{dump, AttachmentId, Flow, PartEvent, PartVisitor};
use crate::store::model::{Disposition, Message, MessageAccessor};
use crate::support::error::Error;

/// A part found by `Locator`, with its decoded content.
#[derive(Clone, Debug)]
pub struct Located {
    pub id: AttachmentId,
    pub content_type: String,
    pub filename: String,
    pub disposition: Option<Disposition>,
    pub content_id: Option<String>,
    pub data: Vec<u8>,
}

/// Stops at the first part whose identifier is the target.
///
/// The match is on the identifier alone; text, HTML, images, special parts,
/// attachments, and nested messages can all be located. Multipart
/// containers have no content of their own and are never matched.
#[derive(Debug)]
pub struct Locator {
    target: AttachmentId,
    found: Option<Located>,
}

impl Locator {
    pub fn new(target: AttachmentId) -> Self {
        Locator {
            target,
            found: None,
        }
    }
}

impl PartVisitor for Locator {
    type Output = Option<Located>;

    fn handle(&mut self, event: &PartEvent<'_>) -> Flow {
        if let PartEvent::Multipart { .. } = *event {
            return Flow::Continue;
        }

        let (id, part) = match (event.id(), event.part()) {
            (Some(id), Some(part)) if id == self.target => (id, part),
            _ => return Flow::Continue,
        };

        debug!("Located {}", id);
        self.found = Some(Located {
            id,
            content_type: effective_type(part).to_string(),
            filename: display_filename(id, part),
            disposition: part.disposition,
            content_id: part.content_id.clone(),
            data: read_bytes_or_empty(id, part),
        });
        Flow::Stop
    }

    fn nested_visitor(
        &mut self,
        _: AttachmentId,
        _: &Message,
    ) -> Option<Box<dyn PartVisitor<Output = Option<Located>>>> {
        Some(Box::new(Locator::new(self.target)))
    }

    fn nested_result(
        &mut self,
        _: AttachmentId,
        output: Option<Located>,
    ) -> Flow {
        if output.is_some() {
            self.found = output;
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    fn finish(&mut self) -> Option<Located> {
        self.found.take()
    }
}

/// Find the part with identifier `id` in the message behind `accessor`.
pub fn locate(
    accessor: &dyn MessageAccessor,
    id: AttachmentId,
) -> Result<Located, Error> {
    dump(accessor, Locator::new(id))?
        .ok_or_else(|| Error::NxAttachment(id.to_string()))
}
