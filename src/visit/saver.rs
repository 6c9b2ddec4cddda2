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

//! Writing every attachment of a message into a directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use tempfile::NamedTempFile;

use crate::dump::classify::display_filename;
use crate::dump::event::read_bytes_or_empty;
use crate::dump::{AttachmentId, Flow, PartEvent, PartVisitor};
use crate::store::model::{Message, Part};
use crate::support::error::Error;
use crate::support::safe_name::safe_file_name;

const MAX_NAME_CHARS: usize = 120;

/// Saves attachments, images, and UUEncoded files into a directory.
///
/// File names come from the parts, sanitised. If a name is already taken in
/// the directory, `_1`, `_2`, etc are appended to the stem. Nested messages
/// are descended into and their attachments saved alongside.
#[derive(Debug)]
pub struct AttachmentSaver {
    dir: PathBuf,
    written: Vec<PathBuf>,
    error: Option<Error>,
}

impl AttachmentSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        AttachmentSaver {
            dir: dir.into(),
            written: vec![],
            error: None,
        }
    }

    fn save(&mut self, id: AttachmentId, part: &Part) -> Flow {
        let name = safe_file_name(
            &display_filename(id, part),
            MAX_NAME_CHARS,
            &id.placeholder_filename(),
        );
        let data = read_bytes_or_empty(id, part);
        match write_unique(&self.dir, &name, &data) {
            Ok(path) => {
                info!("{}: saved to {}", id, path.display());
                self.written.push(path);
                Flow::Continue
            },
            Err(e) => {
                warn!("{}: failed to save {}: {}", id, name, e);
                self.error = Some(e);
                Flow::Stop
            },
        }
    }
}

/// Write `data` to a new file in `dir` named `name`, or the first free `_N`
/// variant of it.
///
/// The data is written to a temporary file first, so a file under the final
/// name is never seen half written.
fn write_unique(
    dir: &Path,
    name: &str,
    data: &[u8],
) -> Result<PathBuf, Error> {
    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
        _ => (name, ""),
    };

    let mut buffer_file = NamedTempFile::new_in(dir)?;
    buffer_file.write_all(data)?;
    buffer_file.as_file().sync_all()?;

    for n in 0u32.. {
        let path = if 0 == n {
            dir.join(name)
        } else {
            dir.join(format!("{}_{}{}", stem, n, ext))
        };

        match buffer_file.persist_noclobber(&path) {
            Ok(_) => return Ok(path),
            Err(e) if io::ErrorKind::AlreadyExists == e.error.kind() => {
                buffer_file = e.file;
            },
            Err(e) => return Err(e.error.into()),
        }
    }

    Err(Error::Io(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "no free file name",
    )))
}

impl PartVisitor for AttachmentSaver {
    type Output = Result<Vec<PathBuf>, Error>;

    fn handle(&mut self, event: &PartEvent<'_>) -> Flow {
        match *event {
            PartEvent::Attachment { id, part }
            | PartEvent::InlineUuencoded { id, part }
            | PartEvent::Image { id, part, .. } => self.save(id, part),
            _ => Flow::Continue,
        }
    }

    fn nested_visitor(
        &mut self,
        _: AttachmentId,
        _: &Message,
    ) -> Option<Box<dyn PartVisitor<Output = Self::Output>>> {
        Some(Box::new(AttachmentSaver::new(self.dir.clone())))
    }

    fn nested_result(
        &mut self,
        _: AttachmentId,
        output: Self::Output,
    ) -> Flow {
        match output {
            Ok(written) => {
                self.written.extend(written);
                Flow::Continue
            },
            Err(e) => {
                self.error = Some(e);
                Flow::Stop
            },
        }
    }

    fn finish(&mut self) -> Self::Output {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(std::mem::replace(&mut self.written, vec![])),
        }
    }
}

/// Delete `dir` and everything in it.
///
/// A directory which does not exist is not an error.
pub fn cleanup(dir: &Path) -> Result<(), Error> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if io::ErrorKind::NotFound == e.kind() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dump::dump_message;
    use crate::store::loader::load_message;

    static MESSAGE: &str = "\
Content-Type: multipart/mixed; boundary=b

--b
Content-Type: text/plain

Body text is not saved
--b
Content-Type: application/octet-stream; name=\"../../etc/passwd\"

root
--b
Content-Type: text/csv
Content-Disposition: attachment; filename=data.csv

a,b
--b
Content-Type: text/csv
Content-Disposition: attachment; filename=data.csv

c,d
--b
Content-Type: image/gif

GIF
--b
Content-Type: message/rfc822

Subject: inner
Content-Type: multipart/mixed; boundary=i

--i

inner body
--i
Content-Type: text/csv; name=data.csv

e,f
--i--
--b--
";

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn save_and_cleanup() {
        crate::init_test_log();

        let root = tempfile::TempDir::new().unwrap();
        let dir = root.path().join("attachments");
        fs::create_dir(&dir).unwrap();

        let message =
            load_message(MESSAGE.replace('\n', "\r\n").as_bytes()).unwrap();
        let written =
            dump_message(&message, AttachmentSaver::new(&dir)).unwrap();

        assert_eq!(
            vec![
                "passwd",
                "data.csv",
                "data_1.csv",
                "Part 1.1.5",
                "data_2.csv",
            ],
            names(&written)
        );
        for path in &written {
            assert_eq!(Some(dir.as_path()), path.parent());
        }
        assert_eq!(b"c,d".to_vec(), fs::read(&written[2]).unwrap());
        assert_eq!(b"e,f".to_vec(), fs::read(&written[4]).unwrap());

        cleanup(&dir).unwrap();
        assert!(!dir.exists());
        cleanup(&dir).unwrap();
    }

    #[test]
    fn write_failure_is_reported() {
        let root = tempfile::TempDir::new().unwrap();
        let message =
            load_message(MESSAGE.replace('\n', "\r\n").as_bytes()).unwrap();
        assert_matches!(
            Err(Error::Io(_)),
            dump_message(
                &message,
                AttachmentSaver::new(root.path().join("missing"))
            )
        );
    }
}
