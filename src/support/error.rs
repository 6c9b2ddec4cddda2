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

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The envelope or flags of a message could not be loaded at all.
    #[error("Message {uid} in folder '{folder}' is unreadable: {reason}")]
    UnreadableMessage {
        folder: String,
        uid: u32,
        reason: String,
    },
    /// The content of a single part could not be read or decoded.
    #[error("Content of part {0} could not be read: {1}")]
    PartContent(String, String),
    #[error("Malformed UUEncode block: {0}")]
    BadUuencode(String),
    #[error("Malformed TNEF stream: {0}")]
    BadTnef(String),
    #[error("No attachment with identifier {0}")]
    NxAttachment(String),
    #[error("Invalid attachment identifier: {0:?}")]
    BadAttachmentId(String),
    #[error("No message with UID {0}")]
    NxMessage(u32),
    #[error("Folder '{0}' is not open for writing")]
    FolderReadOnly(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error may be recovered from by substituting empty content
    /// for the part in question.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            *self,
            Error::PartContent(..)
                | Error::BadUuencode(..)
                | Error::BadTnef(..)
                | Error::Io(..)
        )
    }
}
