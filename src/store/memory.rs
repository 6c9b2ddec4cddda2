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

use std::collections::BTreeMap;

use log::debug;

use super::loader::load_message;
use super::model::*;
use crate::support::error::Error;

#[derive(Clone, Debug)]
struct StoredMessage {
    raw: Vec<u8>,
    flags: SystemFlags,
    user_flags: Vec<String>,
}

/// A folder of raw messages held in memory.
///
/// This serves both as the message source for the dumper (through
/// `accessor()`) and as the flag store for the has-attachment write-back.
#[derive(Clone, Debug)]
pub struct MemoryFolder {
    name: String,
    messages: BTreeMap<u32, StoredMessage>,
    next_uid: u32,
    writable: bool,
}

impl MemoryFolder {
    pub fn new(name: impl Into<String>) -> Self {
        MemoryFolder {
            name: name.into(),
            messages: BTreeMap::new(),
            next_uid: 1,
            writable: false,
        }
    }

    /// Add a message, returning its UID.
    pub fn append(
        &mut self,
        raw: Vec<u8>,
        flags: SystemFlags,
        user_flags: &[&str],
    ) -> u32 {
        let uid = self.next_uid;
        self.next_uid += 1;
        self.messages.insert(
            uid,
            StoredMessage {
                raw,
                flags,
                user_flags: user_flags.iter().map(|&s| s.to_owned()).collect(),
            },
        );
        uid
    }

    /// Replace the content of a message.
    ///
    /// Any cached has-attachment verdict is dropped since it no longer
    /// describes the content.
    pub fn replace_content(
        &mut self,
        uid: u32,
        raw: Vec<u8>,
    ) -> Result<(), Error> {
        let message =
            self.messages.get_mut(&uid).ok_or(Error::NxMessage(uid))?;
        message.raw = raw;
        message.user_flags.retain(|flag| {
            !flag.eq_ignore_ascii_case(HAS_ATTACHMENT)
                && !flag.eq_ignore_ascii_case(HAS_NO_ATTACHMENT)
        });
        Ok(())
    }

    pub fn user_flags(&self, uid: u32) -> Option<&[String]> {
        self.messages.get(&uid).map(|m| &m.user_flags[..])
    }

    pub fn accessor(&self, uid: u32) -> MemoryAccessor<'_> {
        MemoryAccessor { folder: self, uid }
    }
}

impl MailFolder for MemoryFolder {
    fn name(&self) -> &str {
        &self.name
    }

    fn open_read_write(&mut self) -> Result<(), Error> {
        self.writable = true;
        Ok(())
    }

    fn set_user_flag(
        &mut self,
        uid: u32,
        flag: &str,
        on: bool,
    ) -> Result<(), Error> {
        if !self.writable {
            return Err(Error::FolderReadOnly(self.name.clone()));
        }

        let message =
            self.messages.get_mut(&uid).ok_or(Error::NxMessage(uid))?;
        let present = message
            .user_flags
            .iter()
            .any(|f| f.eq_ignore_ascii_case(flag));
        if on && !present {
            message.user_flags.push(flag.to_owned());
        } else if !on && present {
            message.user_flags.retain(|f| !f.eq_ignore_ascii_case(flag));
        }

        debug!(
            "{}/{}: {} {}",
            self.name,
            uid,
            if on { "+" } else { "-" },
            flag
        );
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        self.writable = false;
        Ok(())
    }
}

/// `MessageAccessor` for one message in a `MemoryFolder`.
#[derive(Clone, Copy, Debug)]
pub struct MemoryAccessor<'a> {
    folder: &'a MemoryFolder,
    uid: u32,
}

impl MessageAccessor for MemoryAccessor<'_> {
    fn folder(&self) -> &str {
        &self.folder.name
    }

    fn uid(&self) -> u32 {
        self.uid
    }

    fn open(&self) -> Result<Message, Error> {
        let stored = self
            .folder
            .messages
            .get(&self.uid)
            .ok_or(Error::NxMessage(self.uid))?;
        let mut message = load_message(&stored.raw)?;
        message.flags = stored.flags;
        message.user_flags = stored.user_flags.clone();
        Ok(message)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn open_attaches_flags() {
        let mut folder = MemoryFolder::new("INBOX");
        let uid = folder.append(
            b"Subject: hi\r\n\r\nbody\r\n".to_vec(),
            SystemFlags::SEEN,
            &["$cl_2"],
        );
        assert_eq!(1, uid);

        let message = folder.accessor(uid).open().unwrap();
        assert_eq!(Some("hi".to_owned()), message.envelope.subject);
        assert_eq!(SystemFlags::SEEN, message.flags);
        assert_eq!(Some(2), message.color_label());

        assert_matches!(Err(Error::NxMessage(2)), folder.accessor(2).open());
    }

    #[test]
    fn flag_writes_need_write_access() {
        let mut folder = MemoryFolder::new("INBOX");
        let uid = folder.append(vec![], SystemFlags::empty(), &[]);

        assert_matches!(
            Err(Error::FolderReadOnly(_)),
            folder.set_user_flag(uid, HAS_ATTACHMENT, true)
        );

        folder.open_read_write().unwrap();
        folder.set_user_flag(uid, HAS_ATTACHMENT, true).unwrap();
        folder.set_user_flag(uid, "$hasattachment", true).unwrap();
        folder.close().unwrap();
        assert_eq!(
            Some(&[HAS_ATTACHMENT.to_owned()][..]),
            folder.user_flags(uid)
        );
    }

    #[test]
    fn replacing_content_drops_verdict() {
        let mut folder = MemoryFolder::new("INBOX");
        let uid = folder.append(
            vec![],
            SystemFlags::empty(),
            &[HAS_NO_ATTACHMENT, "$cl_1"],
        );
        folder.replace_content(uid, b"\r\nnew".to_vec()).unwrap();
        assert_eq!(Some(&["$cl_1".to_owned()][..]), folder.user_flags(uid));
        assert_matches!(
            Err(Error::NxMessage(9)),
            folder.replace_content(9, vec![])
        );
    }
}
