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

//! Deciding whether a message has real attachments, and remembering the
//! verdict as a user flag.

use log::{debug, info};

use crate::dump::classify::effective_type;
use crate::dump::{dump_message, AttachmentId, Flow, PartEvent, PartVisitor};
use crate::store::model::*;
use crate::support::error::Error;

/// Looks for the first part that makes the message one "with attachments".
///
/// A message can only have attachments if some multipart container in it has
/// more than one child. Given that, the first part which is explicitly an
/// attachment, is not text, or is a nested message confirms it. Files
/// decoded from UUEncoded text count regardless of structure.
#[derive(Debug, Default)]
pub struct AttachmentDetector {
    possible: bool,
    found: bool,
}

impl AttachmentDetector {
    fn confirm(&mut self, id: AttachmentId) -> Flow {
        debug!("{}: confirms attachment", id);
        self.found = true;
        Flow::Stop
    }
}

/// Untyped parts are judged by the type their file name implies.
fn is_attachment(part: &Part) -> bool {
    Some(Disposition::Attachment) == part.disposition
        || !effective_type(part).is_type("text")
}

impl PartVisitor for AttachmentDetector {
    type Output = bool;

    fn handle(&mut self, event: &PartEvent<'_>) -> Flow {
        match *event {
            PartEvent::Multipart { child_count, .. } if child_count > 1 => {
                self.possible = true;
                Flow::Continue
            },
            PartEvent::InlineUuencoded { id, .. } => self.confirm(id),
            PartEvent::NestedMessage { id, .. } if self.possible => {
                self.confirm(id)
            },
            PartEvent::Attachment { id, part }
            | PartEvent::Image { id, part, .. }
            | PartEvent::Special { id, part, .. }
                if self.possible && is_attachment(part) =>
            {
                self.confirm(id)
            },
            _ => Flow::Continue,
        }
    }

    fn nested_visitor(
        &mut self,
        _: AttachmentId,
        _: &Message,
    ) -> Option<Box<dyn PartVisitor<Output = bool>>> {
        // Only reached when no container could hold attachments, which
        // nothing inside the nested message changes.
        None
    }

    fn nested_result(&mut self, _: AttachmentId, _: bool) -> Flow {
        Flow::Continue
    }

    fn finish(&mut self) -> bool {
        self.found
    }
}

/// The verdict recorded in the message's user flags, if any.
pub fn cached_verdict(message: &Message) -> Option<bool> {
    if message.has_user_flag(HAS_ATTACHMENT) {
        Some(true)
    } else if message.has_user_flag(HAS_NO_ATTACHMENT) {
        Some(false)
    } else {
        None
    }
}

/// Determine whether `message` has attachments, without side effects.
pub fn has_attachment(message: &Message) -> bool {
    cached_verdict(message)
        .unwrap_or_else(|| dump_message(message, AttachmentDetector::default()))
}

/// Record `verdict` on message `uid` in `folder`.
///
/// The folder is opened for writing only for the duration of this call, and
/// is closed again even if setting the flags fails.
pub fn remember_verdict(
    folder: &mut dyn MailFolder,
    uid: u32,
    verdict: bool,
) -> Result<(), Error> {
    folder.open_read_write()?;
    let result = folder
        .set_user_flag(uid, HAS_ATTACHMENT, verdict)
        .and_then(|()| folder.set_user_flag(uid, HAS_NO_ATTACHMENT, !verdict));
    let closed = folder.close();
    result?;
    closed
}

/// Like `has_attachment()`, but if the message carried no cached verdict,
/// write the one found back to `folder`.
///
/// `message` must already be fully loaded: the write-back happens after the
/// traversal and never interleaves with reading.
pub fn check_and_remember(
    folder: &mut dyn MailFolder,
    uid: u32,
    message: &Message,
) -> Result<bool, Error> {
    if let Some(verdict) = cached_verdict(message) {
        return Ok(verdict);
    }

    let verdict = dump_message(message, AttachmentDetector::default());
    info!(
        "{}/{}: recording {}",
        folder.name(),
        uid,
        if verdict {
            HAS_ATTACHMENT
        } else {
            HAS_NO_ATTACHMENT
        }
    );
    remember_verdict(folder, uid, verdict)?;
    Ok(verdict)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decode::uuencode;
    use crate::store::loader::load_message;
    use crate::store::memory::MemoryFolder;

    fn detect(message: &str) -> bool {
        let message =
            load_message(message.replace('\n', "\r\n").as_bytes()).unwrap();
        dump_message(&message, AttachmentDetector::default())
    }

    #[test]
    fn mixed_with_file_has_attachment() {
        assert!(detect(
            "Content-Type: multipart/mixed; boundary=b\n\
             \n\
             --b\n\
             \n\
             text\n\
             --b\n\
             Content-Type: text/plain\n\
             Content-Disposition: attachment; filename=notes.txt\n\
             \n\
             notes\n\
             --b--\n"
        ));
    }

    #[test]
    fn alternative_has_no_attachment() {
        assert!(!detect(
            "Content-Type: multipart/alternative; boundary=b\n\
             \n\
             --b\n\
             \n\
             text\n\
             --b\n\
             Content-Type: text/html\n\
             \n\
             <p>text</p>\n\
             --b--\n"
        ));
    }

    #[test]
    fn single_part_needs_uuencode() {
        assert!(!detect(
            "Content-Type: application/pdf\n\
             Content-Disposition: attachment; filename=x.pdf\n\
             \n\
             PDF"
        ));
        assert!(!detect(
            "Content-Type: multipart/mixed; boundary=b\n\
             \n\
             --b\n\
             Content-Type: image/png\n\
             \n\
             PNG\n\
             --b--\n"
        ));
        assert!(detect(&format!(
            "\nHere it is\n{}",
            uuencode::encode("x.bin", 0o600, b"bytes")
        )));
    }

    #[test]
    fn untyped_part_judged_by_file_name() {
        assert!(detect(
            "Content-Type: multipart/mixed; boundary=b\n\
             \n\
             --b\n\
             \n\
             text\n\
             --b\n\
             Content-Disposition: inline; filename=report.pdf\n\
             \n\
             PDF\n\
             --b--\n"
        ));
        assert!(!detect(
            "Content-Type: multipart/mixed; boundary=b\n\
             \n\
             --b\n\
             \n\
             text\n\
             --b\n\
             Content-Disposition: inline; filename=notes.txt\n\
             \n\
             notes\n\
             --b--\n"
        ));
    }

    #[test]
    fn nested_message_counts() {
        assert!(detect(
            "Content-Type: multipart/mixed; boundary=b\n\
             \n\
             --b\n\
             \n\
             fwd\n\
             --b\n\
             Content-Type: message/rfc822\n\
             \n\
             Subject: inner\n\
             \n\
             inner\n\
             --b--\n"
        ));
    }

    #[test]
    fn verdict_is_written_back_and_invalidated() {
        crate::init_test_log();

        let mut folder = MemoryFolder::new("INBOX");
        let raw = "Content-Type: multipart/mixed; boundary=b\r\n\
                   \r\n\
                   --b\r\n\
                   \r\n\
                   text\r\n\
                   --b\r\n\
                   Content-Type: application/zip\r\n\
                   \r\n\
                   zip\r\n\
                   --b--\r\n";
        let uid =
            folder.append(raw.as_bytes().to_vec(), SystemFlags::empty(), &[]);

        let message = folder.accessor(uid).open().unwrap();
        assert_eq!(None, cached_verdict(&message));
        assert!(check_and_remember(&mut folder, uid, &message).unwrap());
        assert_eq!(
            Some(&[HAS_ATTACHMENT.to_owned()][..]),
            folder.user_flags(uid)
        );

        let message = folder.accessor(uid).open().unwrap();
        assert_eq!(Some(true), cached_verdict(&message));
        assert!(has_attachment(&message));

        folder
            .replace_content(uid, b"Subject: plain\r\n\r\nhi".to_vec())
            .unwrap();
        let message = folder.accessor(uid).open().unwrap();
        assert_eq!(None, cached_verdict(&message));
        assert!(!check_and_remember(&mut folder, uid, &message).unwrap());
        assert_eq!(
            Some(&[HAS_NO_ATTACHMENT.to_owned()][..]),
            folder.user_flags(uid)
        );

        // The folder is closed again afterwards
        assert_matches!(
            Err(Error::FolderReadOnly(_)),
            folder.set_user_flag(uid, "x", true)
        );
    }
}
