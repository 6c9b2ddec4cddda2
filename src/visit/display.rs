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

//! Building the display object of a message.
//!
//! The display object is what a mail client front end needs to show a
//! message: the envelope, flags, and an ordered list of entries, one per
//! part. Body text is inlined into its entry together with an HTML rendering
//! of it; everything else is described so that the client can fetch it
//! later by identifier.
//!
//! Inside a `multipart/alternative`, only the variants of the preferred kind
//! are kept if there are any. The choice is made per innermost alternative
//! group, so an alternative nested inside another is decided on its own.

use std::collections::HashMap;
use std::rc::Rc;

use chrono::prelude::*;
use log::debug;
use serde::Serialize;

use super::Ancestry;
use crate::dump::classify::{
    display_filename, effective_type, is_inline_like, SpecialKind,
};
use crate::dump::event::read_text_or_empty;
use crate::dump::{
    dump, AttachmentId, Flow, IdPrefix, PartEvent, PartVisitor,
};
use crate::format::Formatter;
use crate::mime::model::Address;
use crate::store::model::{Disposition, Message, MessageAccessor, Part};
use crate::support::config::{Config, DisplayConfig};
use crate::support::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDisposition {
    Inline,
    Attachment,
}

/// One part of a message as shown to the user.
#[derive(Clone, Debug, Serialize)]
pub struct DisplayEntry {
    pub id: AttachmentId,
    pub disposition: EntryDisposition,
    pub content_type: String,
    pub filename: String,
    /// Declared size in bytes, -1 if unknown.
    pub size: i64,
    /// The text content. Absent for anything that must be fetched
    /// separately.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// HTML fragment to render in place of `content`. Absent for entries
    /// which are not rendered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special: Option<SpecialKind>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NestedDisplay {
    pub id: AttachmentId,
    pub message: DisplayMessage,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct DisplayMessage {
    pub from: Vec<Address>,
    pub to: Vec<Address>,
    pub cc: Vec<Address>,
    pub bcc: Vec<Address>,
    pub subject: Option<String>,
    pub sent_date: Option<DateTime<FixedOffset>>,
    pub received_date: Option<DateTime<FixedOffset>>,
    pub headers: Vec<(String, String)>,
    pub flags: Vec<&'static str>,
    pub user_flags: Vec<String>,
    pub color_label: Option<u32>,
    pub attachments: Vec<DisplayEntry>,
    pub nested_msgs: Vec<NestedDisplay>,
}

/// Marks an entry as one variant of an alternative group.
#[derive(Clone, Copy, Debug)]
struct Variant {
    group: IdPrefix,
    html: bool,
}

#[derive(Debug)]
pub struct DisplayBuilder {
    config: DisplayConfig,
    formatter: Rc<Formatter>,
    session: Rc<str>,
    uid: u32,
    ancestry: Ancestry,
    message: DisplayMessage,
    entries: Vec<(DisplayEntry, Option<Variant>)>,
}

impl DisplayBuilder {
    /// `session` and `uid` are substituted into the URLs of inline images.
    pub fn new(config: &Config, session: &str, uid: u32) -> Self {
        DisplayBuilder {
            config: config.display.clone(),
            formatter: Rc::new(Formatter::new(config)),
            session: session.into(),
            uid,
            ancestry: Ancestry::default(),
            message: DisplayMessage::default(),
            entries: vec![],
        }
    }

    fn child(&self) -> Self {
        DisplayBuilder {
            config: self.config.clone(),
            formatter: Rc::clone(&self.formatter),
            session: Rc::clone(&self.session),
            uid: self.uid,
            ancestry: Ancestry::default(),
            message: DisplayMessage::default(),
            entries: vec![],
        }
    }

    fn entry(
        &self,
        id: AttachmentId,
        part: &Part,
        disposition: EntryDisposition,
    ) -> DisplayEntry {
        DisplayEntry {
            id,
            disposition,
            content_type: effective_type(part).to_string(),
            filename: display_filename(id, part),
            size: part.size,
            content: None,
            rendered: None,
            content_id: part.content_id.clone(),
            special: None,
        }
    }

    fn push(&mut self, entry: DisplayEntry, variant: Option<Variant>) {
        self.entries.push((entry, variant));
    }

    fn too_large(&self, text: &str) -> bool {
        text.len() > self.config.inline_text_limit
    }

    fn variant(&self, id: AttachmentId, html: bool) -> Option<Variant> {
        self.ancestry
            .alternative_group(id)
            .map(|group| Variant { group, html })
    }

    fn text(&mut self, id: AttachmentId, part: &Part, text: &str) {
        if self.too_large(text) {
            debug!("{}: text too large to inline", id);
            let entry = self.entry(id, part, EntryDisposition::Attachment);
            self.push(entry, None);
            return;
        }

        let mut entry = self.entry(id, part, EntryDisposition::Inline);
        entry.rendered = Some(self.formatter.text_to_html(text));
        entry.content = Some(text.to_owned());
        let variant = self.variant(id, false);
        self.push(entry, variant);
    }

    fn html(&mut self, id: AttachmentId, part: &Part, html: &str) {
        if self.too_large(html) {
            debug!("{}: HTML too large to inline", id);
            let entry = self.entry(id, part, EntryDisposition::Attachment);
            self.push(entry, None);
            return;
        }

        let variant = self.variant(id, true);
        let mut entry = self.entry(id, part, EntryDisposition::Inline);
        if self.config.prefer_html {
            entry.rendered = Some(self.formatter.html_for_display(
                html,
                &self.session,
                self.uid,
            ));
            entry.content = Some(html.to_owned());
            self.push(entry, variant);
        } else {
            let text = self.formatter.html_to_text(html);
            entry.content_type = "text/plain".to_owned();
            entry.rendered = Some(self.formatter.text_to_html(&text));
            entry.content = Some(text);
            self.push(entry, variant);

            if self.config.retain_html {
                let original =
                    self.entry(id, part, EntryDisposition::Attachment);
                self.push(original, None);
            }
        }
    }

    fn special(&mut self, id: AttachmentId, part: &Part, kind: SpecialKind) {
        let disposition = if is_inline_like(part) {
            EntryDisposition::Inline
        } else {
            EntryDisposition::Attachment
        };
        let mut entry = self.entry(id, part, disposition);
        entry.special = Some(kind);

        let limit = self.config.inline_text_limit;
        if part.size >= 0 && (part.size as u64) <= limit as u64 {
            let text = read_text_or_empty(id, part);
            if !self.too_large(&text) {
                entry.content = Some(text);
            }
        }
        self.push(entry, None);
    }

    /// Drop the variants of each alternative group which are not of the
    /// preferred kind, if the group has one of the preferred kind.
    fn resolve_alternatives(&mut self) -> Vec<DisplayEntry> {
        let prefer_html = self.config.prefer_html;
        let mut has_preferred = HashMap::<IdPrefix, bool>::new();
        for &(_, variant) in &self.entries {
            if let Some(v) = variant {
                *has_preferred.entry(v.group).or_insert(false) |=
                    v.html == prefer_html;
            }
        }

        std::mem::replace(&mut self.entries, vec![])
            .into_iter()
            .filter(|&(ref entry, variant)| match variant {
                Some(v)
                    if v.html != prefer_html && has_preferred[&v.group] =>
                {
                    debug!("{}: suppressed alternative", entry.id);
                    false
                },
                _ => true,
            })
            .map(|(entry, _)| entry)
            .collect()
    }
}

impl PartVisitor for DisplayBuilder {
    type Output = DisplayMessage;

    fn handle(&mut self, event: &PartEvent<'_>) -> Flow {
        self.ancestry.record(event);

        match *event {
            PartEvent::From(a) => self.message.from = a.to_vec(),
            PartEvent::To(a) => self.message.to = a.to_vec(),
            PartEvent::Cc(a) => self.message.cc = a.to_vec(),
            PartEvent::Bcc(a) => self.message.bcc = a.to_vec(),
            PartEvent::Subject(s) => {
                self.message.subject = s.map(str::to_owned)
            },
            PartEvent::SentDate(d) => self.message.sent_date = d,
            PartEvent::ReceivedDate(d) => self.message.received_date = d,
            PartEvent::Headers(headers) => {
                self.message.headers = headers
                    .iter()
                    .map(|(n, v)| (n.to_owned(), v.to_owned()))
                    .collect();
            },
            PartEvent::SystemFlags(flags) => {
                self.message.flags = flags.names()
            },
            PartEvent::UserFlags(flags) => {
                self.message.user_flags = flags.to_vec()
            },

            PartEvent::InlineText { id, part, text } => {
                self.text(id, part, text)
            },
            PartEvent::InlineHtml { id, part, text } => {
                self.html(id, part, text)
            },
            PartEvent::InlineUuencoded { id, part }
            | PartEvent::Attachment { id, part } => {
                let entry = self.entry(id, part, EntryDisposition::Attachment);
                self.push(entry, None);
            },
            PartEvent::Image { id, part, .. } => {
                // Images referenced by content ID are shown in the body
                let disposition = if Some(Disposition::Inline)
                    == part.disposition
                    || (part.content_id.is_some()
                        && Some(Disposition::Attachment) != part.disposition)
                {
                    EntryDisposition::Inline
                } else {
                    EntryDisposition::Attachment
                };
                let entry = self.entry(id, part, disposition);
                self.push(entry, None);
            },
            PartEvent::Special { id, part, kind } => {
                self.special(id, part, kind)
            },

            PartEvent::Multipart { .. } | PartEvent::NestedMessage { .. } => {
            },
            PartEvent::MessageEnd(message) => {
                self.message.color_label = message.color_label();
            },
        }

        Flow::Continue
    }

    fn nested_visitor(
        &mut self,
        _: AttachmentId,
        _: &Message,
    ) -> Option<Box<dyn PartVisitor<Output = DisplayMessage>>> {
        Some(Box::new(self.child()))
    }

    fn nested_result(
        &mut self,
        id: AttachmentId,
        message: DisplayMessage,
    ) -> Flow {
        self.message.nested_msgs.push(NestedDisplay { id, message });
        Flow::Continue
    }

    fn finish(&mut self) -> DisplayMessage {
        let attachments = self.resolve_alternatives();
        let mut message = std::mem::take(&mut self.message);
        message.attachments = attachments;
        message
    }
}

/// Build the display object of the message behind `accessor`.
pub fn display(
    accessor: &dyn MessageAccessor,
    config: &Config,
    session: &str,
) -> Result<DisplayMessage, Error> {
    dump(accessor, DisplayBuilder::new(config, session, accessor.uid()))
}
