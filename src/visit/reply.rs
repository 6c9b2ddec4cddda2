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

//! Building the quoted text of a reply or forward.

use std::fmt::Write as _;

use chrono::prelude::*;
use log::{debug, warn};

use super::Ancestry;
use crate::dump::{
    dump_message, AttachmentId, Flow, IdPrefix, PartEvent, PartVisitor,
};
use crate::format::quote::quote_text;
use crate::format::{escape_html, Formatter};
use crate::mime::model::Address;
use crate::store::model::Message;
use crate::support::config::ReplyConfig;

/// The text of a message to quote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyBody {
    pub text: String,
    pub html: bool,
}

/// What a reply or forward needs from the original message.
#[derive(Clone, Debug, Default)]
pub struct ReplySource {
    pub from: Vec<Address>,
    pub to: Vec<Address>,
    pub subject: Option<String>,
    pub date: Option<DateTime<FixedOffset>>,
    pub body: Option<ReplyBody>,
}

/// Collects the envelope and the first renderable text of a message.
///
/// Within a `multipart/alternative`, the variant matching `prefer_html` wins
/// if there is one. If the message has no text of its own, the first text of
/// a nested message is used instead. Text of the message itself wins over
/// nested text even when the nested message comes first.
#[derive(Debug)]
pub struct ReplyCollector {
    prefer_html: bool,
    ancestry: Ancestry,
    source: ReplySource,
    /// The alternative group the current body came from, if it is not yet
    /// the preferred variant.
    provisional: Option<IdPrefix>,
    /// The first body found in a nested message.
    fallback: Option<ReplyBody>,
}

impl ReplyCollector {
    pub fn new(prefer_html: bool) -> Self {
        ReplyCollector {
            prefer_html,
            ancestry: Ancestry::default(),
            source: ReplySource::default(),
            provisional: None,
            fallback: None,
        }
    }

    fn body(&mut self, id: AttachmentId, text: &str, html: bool) -> Flow {
        let replace = match (&self.source.body, self.provisional) {
            (None, _) => true,
            (Some(_), Some(group)) => {
                html == self.prefer_html && self.ancestry.is_within(id, group)
            },
            (Some(_), None) => false,
        };
        if !replace {
            return self.settled(id);
        }

        debug!("{}: reply body ({})", id, if html { "html" } else { "text" });
        self.source.body = Some(ReplyBody {
            text: text.to_owned(),
            html,
        });
        self.provisional = if html == self.prefer_html {
            None
        } else {
            self.ancestry.alternative_group(id)
        };

        if self.provisional.is_some() {
            Flow::Continue
        } else {
            Flow::Stop
        }
    }

    /// Decide whether a part outside the body means the body is final.
    fn settled(&mut self, id: AttachmentId) -> Flow {
        match self.provisional {
            Some(group) if !self.ancestry.is_within(id, group) => Flow::Stop,
            _ if self.source.body.is_some() && self.provisional.is_none() => {
                Flow::Stop
            },
            _ => Flow::Continue,
        }
    }
}

impl PartVisitor for ReplyCollector {
    type Output = ReplySource;

    fn handle(&mut self, event: &PartEvent<'_>) -> Flow {
        self.ancestry.record(event);

        match *event {
            PartEvent::From(from) => self.source.from = from.to_vec(),
            PartEvent::To(to) => self.source.to = to.to_vec(),
            PartEvent::Subject(subject) => {
                self.source.subject = subject.map(str::to_owned)
            },
            PartEvent::SentDate(date) => self.source.date = date,
            PartEvent::InlineText { id, text, .. } => {
                return self.body(id, text, false)
            },
            PartEvent::InlineHtml { id, text, .. } => {
                return self.body(id, text, true)
            },
            PartEvent::MessageEnd(_) => (),
            ref other => {
                if let Some(id) = other.id() {
                    return self.settled(id);
                }
            },
        }

        Flow::Continue
    }

    fn nested_visitor(
        &mut self,
        _: AttachmentId,
        _: &Message,
    ) -> Option<Box<dyn PartVisitor<Output = ReplySource>>> {
        if self.source.body.is_none() && self.fallback.is_none() {
            Some(Box::new(ReplyCollector::new(self.prefer_html)))
        } else {
            None
        }
    }

    fn nested_result(&mut self, id: AttachmentId, output: ReplySource) -> Flow {
        if self.fallback.is_none() && output.body.is_some() {
            debug!("{}: keeping body of nested message in reserve", id);
            self.fallback = output.body;
        }
        Flow::Continue
    }

    fn finish(&mut self) -> ReplySource {
        let mut source = std::mem::take(&mut self.source);
        if source.body.is_none() {
            source.body = self.fallback.take();
        }
        source
    }
}

fn address_list(addresses: &[Address]) -> String {
    addresses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_date(date: DateTime<FixedOffset>, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(pattern)).is_err() {
        warn!("Invalid date format {:?}", pattern);
        out.clear();
    }
    out
}

/// Substitute the `#TOKEN#` placeholders of `template`.
fn fill_template(
    template: &str,
    source: &ReplySource,
    config: &ReplyConfig,
) -> String {
    let (date, time) = source.date.map_or_else(
        || (String::new(), String::new()),
        |date| {
            (
                format_date(date, &config.date_format),
                format_date(date, &config.time_format),
            )
        },
    );

    template
        .replace("#FROM#", &address_list(&source.from))
        .replace("#TO#", &address_list(&source.to))
        .replace("#DATE#", &date)
        .replace("#TIME#", &time)
        .replace("#SUBJECT#", source.subject.as_deref().unwrap_or(""))
}

/// Build the text of a reply to, or forward of, `message`.
///
/// With `reply.prefer_html` the result is an HTML fragment, otherwise plain
/// text with `\n` line endings.
pub fn build_reply(
    message: &Message,
    config: &ReplyConfig,
    formatter: &Formatter,
    forward: bool,
) -> String {
    let source = dump_message(message, ReplyCollector::new(config.prefer_html));
    render(&source, config, formatter, forward)
}

fn render(
    source: &ReplySource,
    config: &ReplyConfig,
    formatter: &Formatter,
    forward: bool,
) -> String {
    let template = if forward {
        &config.forward_template
    } else {
        &config.reply_template
    };
    let header = fill_template(template, source, config);
    let empty = ReplyBody {
        text: String::new(),
        html: false,
    };
    let body = source.body.as_ref().unwrap_or(&empty);

    if config.prefer_html {
        let html = if body.html {
            body.text.clone()
        } else {
            formatter.text_to_html(&body.text)
        };
        let header = escape_html(&header).replace('\n', "<br>\n");
        if forward {
            format!("<p>{}</p>\n{}\n", header, html)
        } else {
            format!(
                "<p>{}</p>\n<blockquote type=\"cite\">{}</blockquote>\n",
                header, html
            )
        }
    } else {
        let text = if body.html {
            formatter.html_to_text(&body.text)
        } else {
            body.text.replace("\r\n", "\n")
        };

        if forward {
            format!("{}\n\n{}\n", header, text.trim_end_matches('\n'))
        } else {
            let width = config
                .wrap_width
                .saturating_sub(config.quote_prefix.chars().count());
            let wrapped = if 0 == config.wrap_width {
                text
            } else {
                formatter.wrap(&text, width.max(1))
            };
            let quoted = quote_text(&wrapped, &config.quote_prefix);
            format!("{}\n{}", header, quoted)
        }
    }
}
