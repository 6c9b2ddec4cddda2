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

//! The traversal engine.
//!
//! `dump()` walks a message depth-first, classifies every part, splices in
//! the output of the UUEncode and TNEF decoders, assigns identifiers, and
//! feeds the resulting events to a `PartVisitor`.
//!
//! Identifiers are allocated as follows. Each message gets a new message
//! level from a counter shared by the whole traversal, starting at 1. Within
//! a message, the first multipart container reuses the multipart level in
//! force where the message was nested (1 for the top-level message); each
//! further container takes the next level. Children of a container are
//! numbered from 1, and the root of a message which is not multipart is
//! number 1 under the message's initial prefix. Parts produced by the
//! legacy decoders are numbered after the last index already used under the
//! prefix of the part they came from.
//!
//! Subtrees which the visitor chooses to skip are still walked silently so
//! that identifiers never depend on which visitor is used.

use std::collections::HashMap;

use log::{debug, warn};

use super::classify::{classify, is_inline_like, Category};
use super::event::*;
use super::id::{AttachmentId, IdPrefix};
use crate::decode::{tnef, uuencode};
use crate::mime::types::type_for_filename_or_octets;
use crate::store::model::*;
use crate::support::error::Error;

/// Dump the message behind `accessor` into `visitor`.
///
/// The only error is failure to open the message at all; problems with
/// individual parts are logged and worked around.
pub fn dump<V: PartVisitor>(
    accessor: &dyn MessageAccessor,
    visitor: V,
) -> Result<V::Output, Error> {
    let message = open_message(accessor)?;
    Ok(dump_message(&message, visitor))
}

/// Load the message behind `accessor`, reporting failure as
/// `UnreadableMessage`.
pub fn open_message(accessor: &dyn MessageAccessor) -> Result<Message, Error> {
    accessor.open().map_err(|e| Error::UnreadableMessage {
        folder: accessor.folder().to_owned(),
        uid: accessor.uid(),
        reason: e.to_string(),
    })
}

/// Dump an already loaded message into `visitor`.
pub fn dump_message<V: PartVisitor>(
    message: &Message,
    mut visitor: V,
) -> V::Output {
    let mut dumper = Dumper::default();
    let level = dumper.next_message_level();
    if dumper.message(message, level, 1, &mut visitor).is_err() {
        debug!("Traversal stopped early");
    }
    visitor.finish()
}

/// Marker for a traversal ended by `Flow::Stop`.
#[derive(Debug)]
struct Stopped;

type Walk = Result<(), Stopped>;

fn check(flow: Flow) -> Walk {
    match flow {
        Flow::Stop => Err(Stopped),
        Flow::Continue | Flow::Skip => Ok(()),
    }
}

/// Multipart numbering state of one message.
#[derive(Debug)]
struct MessageCursor {
    level: u32,
    multipart: u32,
    seen_multipart: bool,
}

impl MessageCursor {
    fn new(level: u32, multipart: u32) -> Self {
        MessageCursor {
            level,
            multipart,
            seen_multipart: false,
        }
    }

    fn next_prefix(&mut self) -> IdPrefix {
        if self.seen_multipart {
            self.multipart += 1;
        }
        self.seen_multipart = true;
        IdPrefix::new(self.level, self.multipart)
    }
}

#[derive(Debug, Default)]
struct Dumper {
    last_message_level: u32,
    /// The highest part index allocated under each prefix.
    last_index: HashMap<IdPrefix, u32>,
}

impl Dumper {
    fn next_message_level(&mut self) -> u32 {
        self.last_message_level += 1;
        self.last_message_level
    }

    fn claim_indices(&mut self, prefix: IdPrefix, count: u32) {
        let last = self.last_index.entry(prefix).or_insert(0);
        *last = (*last).max(count);
    }

    /// Allocate an identifier for a synthetic part under `prefix`.
    fn synthetic_id(&mut self, prefix: IdPrefix) -> AttachmentId {
        let last = self.last_index.entry(prefix).or_insert(0);
        *last += 1;
        prefix.child(*last)
    }

    fn message<O>(
        &mut self,
        message: &Message,
        level: u32,
        multipart: u32,
        visitor: &mut dyn PartVisitor<Output = O>,
    ) -> Walk {
        self.envelope(message, visitor)?;

        let mut cursor = MessageCursor::new(level, multipart);
        let root_id = IdPrefix::new(level, multipart).child(1);
        if Category::Multipart == classify(&message.root) {
            self.multipart(&message.root, None, &mut cursor, visitor)?;
        } else {
            self.claim_indices(root_id.prefix(), 1);
            self.part(&message.root, root_id, &mut cursor, visitor)?;
        }

        check(visitor.handle(&PartEvent::MessageEnd(message)))
    }

    fn envelope<O>(
        &mut self,
        message: &Message,
        visitor: &mut dyn PartVisitor<Output = O>,
    ) -> Walk {
        let envelope = &message.envelope;
        for event in &[
            PartEvent::From(&envelope.from),
            PartEvent::To(&envelope.to),
            PartEvent::Cc(&envelope.cc),
            PartEvent::Bcc(&envelope.bcc),
            PartEvent::Subject(envelope.subject.as_deref()),
            PartEvent::SentDate(envelope.sent_date),
            PartEvent::ReceivedDate(envelope.received_date),
            PartEvent::Headers(&message.headers),
            PartEvent::SystemFlags(message.flags),
            PartEvent::UserFlags(&message.user_flags),
        ] {
            check(visitor.handle(event))?;
        }
        Ok(())
    }

    /// Walk a multipart container. `id` is its position within its parent.
    fn multipart<O>(
        &mut self,
        part: &Part,
        id: Option<AttachmentId>,
        cursor: &mut MessageCursor,
        visitor: &mut dyn PartVisitor<Output = O>,
    ) -> Walk {
        let prefix = cursor.next_prefix();
        let children = part.children();
        self.claim_indices(prefix, children.len() as u32);

        let flow = visitor.handle(&PartEvent::Multipart {
            prefix,
            id,
            part,
            child_count: children.len(),
        });
        match flow {
            Flow::Stop => return Err(Stopped),
            Flow::Skip => {
                debug!("Skipping multipart {}", prefix);
                for child in children {
                    self.skip(child, cursor);
                }
                return Ok(());
            },
            Flow::Continue => (),
        }

        for (ix, child) in children.iter().enumerate() {
            self.part(child, prefix.child(ix as u32 + 1), cursor, visitor)?;
        }

        Ok(())
    }

    /// Walk a part which is not the root of a message.
    fn part<O>(
        &mut self,
        part: &Part,
        id: AttachmentId,
        cursor: &mut MessageCursor,
        visitor: &mut dyn PartVisitor<Output = O>,
    ) -> Walk {
        let inline = is_inline_like(part);
        match classify(part) {
            Category::Multipart => {
                self.multipart(part, Some(id), cursor, visitor)
            },
            Category::Message => {
                self.nested_message(part, id, cursor, visitor)
            },
            Category::Tnef => self.tnef(part, id, cursor, visitor),
            Category::Text if inline => self.text(part, id, visitor),
            Category::Html if inline => {
                let text = read_text_or_empty(id, part);
                check(visitor.handle(&PartEvent::InlineHtml {
                    id,
                    part,
                    text: &text,
                }))
            },
            Category::Image => check(visitor.handle(&PartEvent::Image {
                id,
                part,
                content_id: part.content_id.as_deref(),
            })),
            Category::Special(kind) => {
                check(visitor.handle(&PartEvent::Special { id, part, kind }))
            },
            Category::Text | Category::Html | Category::Other => {
                check(visitor.handle(&PartEvent::Attachment { id, part }))
            },
        }
    }

    fn text<O>(
        &mut self,
        part: &Part,
        id: AttachmentId,
        visitor: &mut dyn PartVisitor<Output = O>,
    ) -> Walk {
        let text = read_text_or_empty(id, part);
        let split = match uuencode::split(&text) {
            None => {
                return check(visitor.handle(&PartEvent::InlineText {
                    id,
                    part,
                    text: &text,
                }))
            },
            Some(split) => split,
        };

        debug!("{}: {} UUEncoded file(s)", id, split.files.len());
        check(visitor.handle(&PartEvent::InlineText {
            id,
            part,
            text: &split.text,
        }))?;

        for file in split.files {
            let file_id = self.synthetic_id(id.prefix());
            let content_type = type_for_filename_or_octets(&file.filename);
            let mut file_part =
                Part::synthetic(content_type, Some(file.filename), file.data);
            file_part.disposition = Some(Disposition::Attachment);
            check(visitor.handle(&PartEvent::InlineUuencoded {
                id: file_id,
                part: &file_part,
            }))?;
        }

        Ok(())
    }

    fn tnef<O>(
        &mut self,
        part: &Part,
        id: AttachmentId,
        cursor: &mut MessageCursor,
        visitor: &mut dyn PartVisitor<Output = O>,
    ) -> Walk {
        let parts = match tnef::decode(&read_bytes_or_empty(id, part)) {
            Ok(ref parts) if parts.is_empty() => {
                warn!("{}: empty TNEF stream, treating as opaque", id);
                return check(visitor.handle(&PartEvent::Attachment {
                    id,
                    part,
                }));
            },
            Ok(parts) => parts,
            Err(e) => {
                warn!("{}: undecodable TNEF, treating as opaque: {}", id, e);
                return check(visitor.handle(&PartEvent::Attachment {
                    id,
                    part,
                }));
            },
        };

        debug!("{}: {} part(s) from TNEF", id, parts.len());
        for synthetic in &parts {
            let synthetic_id = self.synthetic_id(id.prefix());
            self.part(synthetic, synthetic_id, cursor, visitor)?;
        }

        Ok(())
    }

    fn nested_message<O>(
        &mut self,
        part: &Part,
        id: AttachmentId,
        cursor: &mut MessageCursor,
        visitor: &mut dyn PartVisitor<Output = O>,
    ) -> Walk {
        let message = match part.nested_message() {
            Some(message) => message,
            None => {
                return check(visitor.handle(&PartEvent::Attachment {
                    id,
                    part,
                }))
            },
        };

        let flow = visitor.handle(&PartEvent::NestedMessage {
            id,
            part,
            message,
        });
        let child = match flow {
            Flow::Stop => return Err(Stopped),
            Flow::Skip => None,
            Flow::Continue => visitor.nested_visitor(id, message),
        };

        let mut child = match child {
            Some(child) => child,
            None => {
                self.skip_message(message, cursor.multipart);
                return Ok(());
            },
        };

        let level = self.next_message_level();
        let result =
            self.message(message, level, cursor.multipart, child.as_mut());
        let flow = visitor.nested_result(id, child.finish());
        result?;
        check(flow)
    }

    /// Advance the identifier counters past a part without reporting it.
    fn skip(&mut self, part: &Part, cursor: &mut MessageCursor) {
        match classify(part) {
            Category::Multipart => {
                let prefix = cursor.next_prefix();
                let children = part.children();
                self.claim_indices(prefix, children.len() as u32);
                for child in children {
                    self.skip(child, cursor);
                }
            },
            Category::Message => {
                if let Some(message) = part.nested_message() {
                    self.skip_message(message, cursor.multipart);
                }
            },
            Category::Tnef => {
                // Embedded messages in TNEF take message levels too
                if let Ok(data) = part.read_bytes() {
                    if let Ok(parts) = tnef::decode(&data) {
                        for synthetic in &parts {
                            self.skip(synthetic, cursor);
                        }
                    }
                }
            },
            _ => (),
        }
    }

    fn skip_message(&mut self, message: &Message, multipart: u32) {
        let level = self.next_message_level();
        let mut cursor = MessageCursor::new(level, multipart);
        self.skip(&message.root, &mut cursor);
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;
    use crate::decode::tnef::test::TnefWriter;
    use crate::store::loader::load_message;
    use crate::store::memory::MemoryFolder;

    /// Records every event as a line of text.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        stop_on: Option<&'static str>,
        skip_on: Option<&'static str>,
        nested: bool,
    }

    impl Recorder {
        fn nesting() -> Self {
            Recorder {
                nested: true,
                ..Recorder::default()
            }
        }
    }

    impl PartVisitor for Recorder {
        type Output = Vec<String>;

        fn handle(&mut self, event: &PartEvent<'_>) -> Flow {
            let line = match *event {
                PartEvent::Subject(s) => format!("subject {:?}", s),
                PartEvent::InlineText { id, text, .. } => {
                    format!("text {} {:?}", id, text)
                },
                PartEvent::InlineUuencoded { id, part } => format!(
                    "uu {} {}",
                    id,
                    part.filename.as_deref().unwrap_or("")
                ),
                PartEvent::InlineHtml { id, .. } => format!("html {}", id),
                PartEvent::Attachment { id, part } => format!(
                    "attachment {} {}",
                    id,
                    part.filename.as_deref().unwrap_or("-")
                ),
                PartEvent::Image { id, content_id, .. } => {
                    format!("image {} {:?}", id, content_id)
                },
                PartEvent::Special { id, kind, .. } => {
                    format!("special {} {:?}", id, kind)
                },
                PartEvent::Multipart {
                    prefix,
                    id,
                    child_count,
                    ..
                } => format!(
                    "multipart {} {} {}",
                    prefix,
                    id.map(|id| id.to_string()).unwrap_or_default(),
                    child_count
                ),
                PartEvent::NestedMessage { id, .. } => {
                    format!("message {}", id)
                },
                PartEvent::MessageEnd(_) => "end".to_owned(),
                _ => return Flow::Continue,
            };

            let flow = if self.stop_on.map_or(false, |s| line.starts_with(s))
            {
                Flow::Stop
            } else if self.skip_on.map_or(false, |s| line.starts_with(s)) {
                Flow::Skip
            } else {
                Flow::Continue
            };
            self.events.push(line);
            flow
        }

        fn nested_visitor(
            &mut self,
            _: AttachmentId,
            _: &Message,
        ) -> Option<Box<dyn PartVisitor<Output = Vec<String>>>> {
            if self.nested {
                Some(Box::new(Recorder {
                    nested: true,
                    stop_on: self.stop_on,
                    skip_on: self.skip_on,
                    ..Recorder::default()
                }))
            } else {
                None
            }
        }

        fn nested_result(
            &mut self,
            _: AttachmentId,
            output: Vec<String>,
        ) -> Flow {
            self.events
                .extend(output.into_iter().map(|line| format!("  {}", line)));
            Flow::Continue
        }

        fn finish(&mut self) -> Vec<String> {
            std::mem::replace(&mut self.events, vec![])
        }
    }

    fn load(message: &str) -> Message {
        load_message(message.replace('\n', "\r\n").as_bytes()).unwrap()
    }

    fn record(message: &str, recorder: Recorder) -> Vec<String> {
        dump_message(&load(message), recorder)
    }

    static NESTED: &str = "\
Subject: outer
Content-Type: multipart/mixed; boundary=outer

--outer
Content-Type: multipart/alternative; boundary=alt

--alt
Content-Type: text/plain

plain
--alt
Content-Type: text/html

<p>html</p>
--alt--
--outer
Content-Type: message/rfc822

Subject: inner
Content-Type: multipart/mixed; boundary=inner

--inner
Content-Type: text/plain

inner text
--inner
Content-Type: image/png; name=pic.png
Content-ID: <pic@x>

PNG
--inner--
--outer
Content-Type: application/pdf; name=doc.pdf

PDF
--outer--
";

    #[test]
    fn addressing_of_nested_structure() {
        crate::init_test_log();

        assert_eq!(
            vec![
                "subject Some(\"outer\")",
                "multipart 1.1  3",
                "multipart 1.2 1.1.1 2",
                "text 1.2.1 \"plain\"",
                "html 1.2.2",
                "message 1.1.2",
                "  subject Some(\"inner\")",
                "  multipart 2.2  2",
                "  text 2.2.1 \"inner text\"",
                "  image 2.2.2 Some(\"pic@x\")",
                "  end",
                "attachment 1.1.3 doc.pdf",
                "end",
            ],
            record(NESTED, Recorder::nesting())
        );
    }

    #[test]
    fn skipping_keeps_identifiers() {
        let recorder = Recorder {
            skip_on: Some("multipart 1.2"),
            nested: true,
            ..Recorder::default()
        };
        let events = record(NESTED, recorder);
        assert!(!events.iter().any(|e| e.starts_with("text 1.2.1")));
        assert!(events.contains(&"  multipart 2.2  2".to_owned()));

        // Not descending into the nested message still consumes its level
        let events = record(
            &NESTED.replace(
                "--outer--",
                "--outer\n\
                 Content-Type: message/rfc822\n\
                 \n\
                 Subject: third\n\
                 \n\
                 body\n\
                 --outer--",
            ),
            Recorder {
                nested: true,
                skip_on: Some("message 1.1.2"),
                ..Recorder::default()
            },
        );
        assert!(events.contains(&"message 1.1.4".to_owned()));
        assert!(events.contains(&"  text 3.2.1 \"body\"".to_owned()));
    }

    #[test]
    fn stop_halts_everything() {
        let recorder = Recorder {
            stop_on: Some("text 1.2.1"),
            nested: true,
            ..Recorder::default()
        };
        assert_eq!(
            vec![
                "subject Some(\"outer\")",
                "multipart 1.1  3",
                "multipart 1.2 1.1.1 2",
                "text 1.2.1 \"plain\"",
            ],
            record(NESTED, recorder)
        );

        // A stop inside a nested message ends the outer traversal too
        let recorder = Recorder {
            stop_on: Some("image"),
            nested: true,
            ..Recorder::default()
        };
        let events = record(NESTED, recorder);
        assert_eq!("  image 2.2.2 Some(\"pic@x\")", events.last().unwrap());
    }

    #[test]
    fn stop_on_envelope() {
        let recorder = Recorder {
            stop_on: Some("subject"),
            ..Recorder::default()
        };
        assert_eq!(
            vec!["subject Some(\"outer\")"],
            record(NESTED, recorder)
        );
    }

    #[test]
    fn single_part_message() {
        assert_eq!(
            vec!["subject None", "text 1.1.1 \"just text\"", "end"],
            record("\njust text", Recorder::default())
        );
    }

    #[test]
    fn text_with_filename_is_attachment() {
        assert_eq!(
            vec![
                "subject None",
                "attachment 1.1.1 notes.txt",
                "end"
            ],
            record(
                "Content-Type: text/plain\n\
                 Content-Disposition: inline; filename=notes.txt\n\
                 \n\
                 hello",
                Recorder::default()
            )
        );
    }

    #[test]
    fn uuencoded_files_follow_text() {
        let message = format!(
            "Content-Type: multipart/mixed; boundary=b\n\
             \n\
             --b\n\
             \n\
             See attached\n\
             {}\
             --b\n\
             Content-Type: application/zip; name=z.zip\n\
             \n\
             zip\n\
             --b--\n",
            uuencode::encode("cat.gif", 0o644, b"GIF89a")
        );
        assert_eq!(
            vec![
                "subject None",
                "multipart 1.1  2",
                "text 1.1.1 \"See attached\\r\\n\"",
                "uu 1.1.3 cat.gif",
                "attachment 1.1.2 z.zip",
                "end",
            ],
            record(&message, Recorder::default())
        );
    }

    #[test]
    fn tnef_parts_are_spliced() {
        let tnef = TnefWriter::default()
            .body("from outlook")
            .attachment("DATA.BIN", b"data")
            .build();
        let message = format!(
            "Content-Type: multipart/mixed; boundary=b\n\
             \n\
             --b\n\
             Content-Type: application/ms-tnef; name=winmail.dat\n\
             Content-Transfer-Encoding: base64\n\
             \n\
             {}\n\
             --b\n\
             Content-Type: application/ms-tnef\n\
             \n\
             truncated\n\
             --b--\n",
            base64::encode(&tnef)
        );
        assert_eq!(
            vec![
                "subject None",
                "multipart 1.1  2",
                "text 1.1.3 \"from outlook\"",
                "attachment 1.1.4 DATA.BIN",
                "attachment 1.1.2 -",
                "end",
            ],
            record(&message, Recorder::default())
        );
    }

    #[test]
    fn empty_or_corrupt_tnef_is_one_attachment() {
        let header_only = TnefWriter::default().build();
        let mut corrupt = TnefWriter::default().body("lost").build();
        let len = corrupt.len();
        corrupt[len - 2] ^= 0x01;

        let message = format!(
            "Content-Type: multipart/mixed; boundary=b\n\
             \n\
             --b\n\
             \n\
             see attached\n\
             --b\n\
             Content-Type: application/ms-tnef\n\
             Content-Transfer-Encoding: base64\n\
             \n\
             {}\n\
             --b\n\
             Content-Type: application/vnd.ms-tnef\n\
             Content-Transfer-Encoding: base64\n\
             \n\
             {}\n\
             --b--\n",
            base64::encode(&header_only),
            base64::encode(&corrupt)
        );
        assert_eq!(
            vec![
                "subject None",
                "multipart 1.1  3",
                "text 1.1.1 \"see attached\"",
                "attachment 1.1.2 -",
                "attachment 1.1.3 -",
                "end",
            ],
            record(&message, Recorder::default())
        );
    }

    #[test]
    fn unreadable_message() {
        struct Broken;
        impl MessageAccessor for Broken {
            fn folder(&self) -> &str {
                "Archive"
            }

            fn uid(&self) -> u32 {
                42
            }

            fn open(&self) -> Result<Message, Error> {
                Err(Error::NxMessage(42))
            }
        }

        match dump(&Broken, Recorder::default()) {
            Err(Error::UnreadableMessage { folder, uid, .. }) => {
                assert_eq!("Archive", folder);
                assert_eq!(42, uid);
            },
            Err(e) => panic!("Unexpected error: {}", e),
            Ok(_) => panic!("Unexpected success"),
        }
    }

    #[test]
    fn dump_through_accessor() {
        let mut folder = MemoryFolder::new("INBOX");
        let uid = folder.append(
            b"Subject: x\r\n\r\nbody".to_vec(),
            SystemFlags::empty(),
            &[],
        );
        let events = dump(&folder.accessor(uid), Recorder::default()).unwrap();
        assert_eq!(
            vec!["subject Some(\"x\")", "text 1.1.1 \"body\"", "end"],
            events
        );
    }

    /// Collects all identifiers.
    struct Ids(Vec<AttachmentId>);

    impl PartVisitor for Ids {
        type Output = Vec<AttachmentId>;

        fn handle(&mut self, event: &PartEvent<'_>) -> Flow {
            if let Some(id) = event.id() {
                self.0.push(id);
            }
            Flow::Continue
        }

        fn nested_visitor(
            &mut self,
            _: AttachmentId,
            _: &Message,
        ) -> Option<Box<dyn PartVisitor<Output = Vec<AttachmentId>>>> {
            Some(Box::new(Ids(vec![])))
        }

        fn nested_result(
            &mut self,
            _: AttachmentId,
            output: Vec<AttachmentId>,
        ) -> Flow {
            self.0.extend(output);
            Flow::Continue
        }

        fn finish(&mut self) -> Vec<AttachmentId> {
            std::mem::replace(&mut self.0, vec![])
        }
    }

    #[test]
    fn identifiers_are_unique() {
        // Two nested messages with multiparts at the same depth, plus
        // spliced UUEncode content
        let inner = "Content-Type: multipart/mixed; boundary=i\n\
                     \n\
                     --i\n\
                     \n\
                     a\n\
                     --i\n\
                     Content-Type: multipart/alternative; boundary=j\n\
                     \n\
                     --j\n\
                     \n\
                     b\n\
                     --j--\n\
                     --i--\n";
        let message = format!(
            "Content-Type: multipart/mixed; boundary=o\n\
             \n\
             --o\n\
             Content-Type: message/rfc822\n\
             \n\
             {inner}\n\
             --o\n\
             Content-Type: message/rfc822\n\
             \n\
             {inner}\n\
             --o\n\
             \n\
             {uu}\
             --o--\n",
            inner = inner,
            uu = uuencode::encode("f", 0o644, b"x")
        );
        let ids = dump_message(&load(&message), Ids(vec![]));
        let unique = ids.iter().collect::<HashSet<_>>();
        assert_eq!(ids.len(), unique.len(), "{:?}", ids);
        assert!(ids.len() >= 10);
    }
}
