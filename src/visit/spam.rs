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

//! Recovering the original message from a spam filter's wrapper.

use log::debug;

use crate::dump::{AttachmentId, Flow, PartEvent, PartVisitor};
use crate::store::model::Message;

/// Returns the first nested message of a message flagged as spam.
///
/// Spam filters such as SpamAssassin can be configured to wrap suspicious
/// mail in a report, attaching the original as `message/rfc822`. If the
/// wrapper has `X-Spam-Flag: YES`, the first nested message is taken to be
/// the original. Messages without the flag yield nothing.
#[derive(Debug, Default)]
pub struct SpamUnwrapper {
    original: Option<Message>,
}

/// Whether the `X-Spam-Flag` header value means the message is spam.
fn is_set(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("yes") || value.eq_ignore_ascii_case("true")
}

impl PartVisitor for SpamUnwrapper {
    type Output = Option<Message>;

    fn handle(&mut self, event: &PartEvent<'_>) -> Flow {
        match *event {
            PartEvent::Headers(headers) => {
                if headers.get("X-Spam-Flag").map_or(false, is_set) {
                    Flow::Continue
                } else {
                    debug!("Not flagged as spam");
                    Flow::Stop
                }
            },
            PartEvent::NestedMessage { id, message, .. } => {
                debug!("{}: original message", id);
                self.original = Some(message.clone());
                Flow::Stop
            },
            _ => Flow::Continue,
        }
    }

    fn nested_visitor(
        &mut self,
        _: AttachmentId,
        _: &Message,
    ) -> Option<Box<dyn PartVisitor<Output = Option<Message>>>> {
        None
    }

    fn nested_result(&mut self, _: AttachmentId, _: Option<Message>) -> Flow {
        Flow::Continue
    }

    fn finish(&mut self) -> Option<Message> {
        self.original.take()
    }
}
