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

//! Guessing MIME types from file names.

use super::model::ContentType;

static EXTENSIONS: &[(&str, &str)] = &[
    ("7z", "application/x-7z-compressed"),
    ("avi", "video/x-msvideo"),
    ("bmp", "image/bmp"),
    ("csv", "text/csv"),
    ("doc", "application/msword"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("eml", "message/rfc822"),
    ("gif", "image/gif"),
    ("gz", "application/gzip"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("ics", "text/calendar"),
    ("jpe", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("mpeg", "video/mpeg"),
    ("msg", "application/vnd.ms-outlook"),
    ("odp", "application/vnd.oasis.opendocument.presentation"),
    ("ods", "application/vnd.oasis.opendocument.spreadsheet"),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("ppt", "application/vnd.ms-powerpoint"),
    ("pptx", "application/vnd.openxmlformats-officedocument.presentationml.presentation"),
    ("rar", "application/vnd.rar"),
    ("rtf", "text/rtf"),
    ("svg", "image/svg+xml"),
    ("tar", "application/x-tar"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("txt", "text/plain"),
    ("vcf", "text/vcard"),
    ("vcs", "text/x-vcalendar"),
    ("wav", "audio/wav"),
    ("webp", "image/webp"),
    ("xls", "application/vnd.ms-excel"),
    ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    ("xml", "text/xml"),
    ("zip", "application/zip"),
];

/// Look up the MIME type for the extension of `filename`.
///
/// Returns `None` if the name has no extension or the extension is not
/// known.
pub fn type_for_filename(filename: &str) -> Option<ContentType> {
    let (_, ext) = filename.trim().rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    EXTENSIONS
        .binary_search_by(|&(e, _)| e.cmp(&ext.as_str()))
        .ok()
        .and_then(|ix| ContentType::from_mime_type(EXTENSIONS[ix].1))
}

/// Like `type_for_filename`, but falls back to `application/octet-stream`.
pub fn type_for_filename_or_octets(filename: &str) -> ContentType {
    type_for_filename(filename)
        .unwrap_or_else(|| ContentType::new("application", "octet-stream"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn table_is_sorted() {
        for pair in EXTENSIONS.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} >= {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn test_type_for_filename() {
        assert_eq!(
            Some(ContentType::new("image", "jpeg")),
            type_for_filename("Holiday.JPG")
        );
        assert_eq!(
            Some(ContentType::new("application", "pdf")),
            type_for_filename("a.b.pdf")
        );
        assert_eq!(None, type_for_filename("README"));
        assert_eq!(None, type_for_filename("x.unknownext"));
        assert_eq!(
            ContentType::new("application", "octet-stream"),
            type_for_filename_or_octets("winmail.dat")
        );
    }
}
