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

//! Decoding of TNEF (`winmail.dat`) streams into synthetic parts.
//!
//! A TNEF stream is a signature followed by a flat sequence of attributes,
//! each tagged as belonging to the message or to the most recently started
//! attachment. Most of the interesting data is in MAPI property lists
//! carried by a few of those attributes.

use std::fmt::Write as _;
use std::io::{Cursor, Read};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, warn};

use super::crtf;
use super::mapi::{self, PropList};
use crate::mime::grovel::MAX_RECURSION;
use crate::mime::header::parse_content_type;
use crate::mime::model::ContentType;
use crate::mime::types::type_for_filename_or_octets;
use crate::store::model::*;
use crate::support::error::Error;

pub const SIGNATURE: u32 = 0x223E_9F78;

const LVL_MESSAGE: u8 = 1;
const LVL_ATTACHMENT: u8 = 2;

const ATT_SUBJECT: u32 = 0x0001_8004;
const ATT_BODY: u32 = 0x0002_800C;
const ATT_MESSAGE_CLASS: u32 = 0x0007_8008;
const ATT_MSG_PROPS: u32 = 0x0006_9003;
const ATT_ATTACH_REND_DATA: u32 = 0x0006_9002;
const ATT_ATTACH_TITLE: u32 = 0x0001_8010;
const ATT_ATTACH_DATA: u32 = 0x0006_800F;
const ATT_ATTACHMENT: u32 = 0x0006_9005;

/// Level, id and length.
const ATTR_HEADER_LEN: u64 = 9;

/// The decoded content of a TNEF stream.
#[derive(Clone, Debug, Default)]
pub struct Tnef {
    pub message_class: Option<String>,
    pub subject: Option<String>,
    /// The plain text body from `attBody` or `PR_BODY`.
    pub body: Option<String>,
    pub html_body: Option<Vec<u8>>,
    /// The decompressed `PR_RTF_COMPRESSED` body.
    pub rtf_body: Option<Vec<u8>>,
    /// All message-level MAPI properties.
    pub props: PropList,
    pub attachments: Vec<TnefAttachment>,
}

/// One attachment record of a TNEF stream.
#[derive(Clone, Debug, Default)]
pub struct TnefAttachment {
    /// The short (8.3) title from `attAttachTitle`.
    pub title: Option<String>,
    /// The content from `attAttachData`.
    pub data: Vec<u8>,
    pub props: PropList,
}

impl TnefAttachment {
    pub fn filename(&self) -> Option<&str> {
        self.props
            .get_str(mapi::PR_ATTACH_LONG_FILENAME)
            .or_else(|| self.props.get_str(mapi::PR_ATTACH_FILENAME))
            .or_else(|| self.title.as_deref())
            .filter(|s| !s.is_empty())
    }

    pub fn mime_tag(&self) -> Option<&str> {
        self.props.get_str(mapi::PR_ATTACH_MIME_TAG)
    }

    pub fn content_id(&self) -> Option<&str> {
        self.props
            .get_str(mapi::PR_ATTACH_CONTENT_ID)
            .map(|cid| cid.trim_start_matches('<').trim_end_matches('>'))
            .filter(|cid| !cid.is_empty())
    }

    pub fn is_embedded_message(&self) -> bool {
        Some(mapi::ATTACH_EMBEDDED_MSG)
            == self.props.get_int(mapi::PR_ATTACH_METHOD)
    }

    /// The attachment content, from `attAttachData` or else from
    /// `PR_ATTACH_DATA_OBJ`.
    pub fn content(&self) -> &[u8] {
        if self.data.is_empty() {
            self.props
                .get_bytes(mapi::PR_ATTACH_DATA_OBJ)
                .unwrap_or(&[])
        } else {
            &self.data
        }
    }
}

fn truncated() -> Error {
    Error::BadTnef("truncated attribute".to_owned())
}

/// Parse the attribute stream.
///
/// Attributes with a bad checksum and property lists which cannot be parsed
/// are logged and skipped. A stream which ends in the middle of an
/// attribute, or which has no usable attribute at all, is an error.
pub fn parse(data: &[u8]) -> Result<Tnef, Error> {
    let mut r = Cursor::new(data);
    if SIGNATURE != r.read_u32::<LittleEndian>()? {
        return Err(Error::BadTnef("bad signature".to_owned()));
    }
    let _key = r.read_u16::<LittleEndian>()?;

    let mut tnef = Tnef::default();
    let mut accepted = 0usize;
    let len = data.len() as u64;

    while r.position() < len {
        if len - r.position() < ATTR_HEADER_LEN {
            return Err(truncated());
        }

        let level = r.read_u8()?;
        let id = r.read_u32::<LittleEndian>()?;
        let attr_len = u64::from(r.read_u32::<LittleEndian>()?);
        // Data plus the two checksum bytes
        if attr_len + 2 > len - r.position() {
            return Err(truncated());
        }

        let mut attr = vec![0u8; attr_len as usize];
        r.read_exact(&mut attr)?;
        let checksum = r.read_u16::<LittleEndian>()?;
        let actual = attr
            .iter()
            .fold(0u16, |sum, &b| sum.wrapping_add(u16::from(b)));
        if checksum != actual {
            warn!(
                "Skipping TNEF attribute {:08x}: checksum {:04x}, \
                 expected {:04x}",
                id, actual, checksum
            );
            continue;
        }

        apply_attribute(&mut tnef, level, id, attr);
        accepted += 1;
    }

    if 0 == accepted {
        return Err(Error::BadTnef("no usable attributes".to_owned()));
    }

    Ok(tnef)
}

fn apply_attribute(tnef: &mut Tnef, level: u8, id: u32, attr: Vec<u8>) {
    match (level, id) {
        (LVL_MESSAGE, ATT_MESSAGE_CLASS) => {
            tnef.message_class = Some(mapi::decode_string8(&attr));
        },
        (LVL_MESSAGE, ATT_SUBJECT) => {
            tnef.subject = Some(mapi::decode_string8(&attr));
        },
        (LVL_MESSAGE, ATT_BODY) => {
            tnef.body = Some(mapi::decode_string8(&attr));
        },
        (LVL_MESSAGE, ATT_MSG_PROPS) => match mapi::parse_props(&attr) {
            Ok(props) => apply_message_props(tnef, props),
            Err(e) => warn!("Skipping TNEF message properties: {}", e),
        },
        (LVL_ATTACHMENT, ATT_ATTACH_REND_DATA) => {
            tnef.attachments.push(TnefAttachment::default());
        },
        (LVL_ATTACHMENT, ATT_ATTACH_TITLE) => {
            current_attachment(tnef).title =
                Some(mapi::decode_string8(&attr));
        },
        (LVL_ATTACHMENT, ATT_ATTACH_DATA) => {
            current_attachment(tnef).data = attr;
        },
        (LVL_ATTACHMENT, ATT_ATTACHMENT) => match mapi::parse_props(&attr) {
            Ok(props) => current_attachment(tnef).props.merge(props),
            Err(e) => warn!("Skipping TNEF attachment properties: {}", e),
        },
        _ => debug!("Ignoring TNEF attribute {}/{:08x}", level, id),
    }
}

fn current_attachment(tnef: &mut Tnef) -> &mut TnefAttachment {
    if tnef.attachments.is_empty() {
        tnef.attachments.push(TnefAttachment::default());
    }
    let last = tnef.attachments.len() - 1;
    &mut tnef.attachments[last]
}

fn apply_message_props(tnef: &mut Tnef, props: PropList) {
    if tnef.message_class.is_none() {
        tnef.message_class =
            props.get_str(mapi::PR_MESSAGE_CLASS).map(str::to_owned);
    }
    if tnef.subject.is_none() {
        tnef.subject = props.get_str(mapi::PR_SUBJECT).map(str::to_owned);
    }
    if tnef.body.is_none() {
        tnef.body = props.get_str(mapi::PR_BODY).map(str::to_owned);
    }
    if let Some(html) = props.get_bytes(mapi::PR_BODY_HTML) {
        tnef.html_body = Some(html.to_vec());
    }
    if let Some(rtf) = props.get_bytes(mapi::PR_RTF_COMPRESSED) {
        match crtf::decompress(rtf) {
            Ok(rtf) => tnef.rtf_body = Some(rtf),
            Err(e) => warn!("Skipping TNEF RTF body: {}", e),
        }
    }

    tnef.props.merge(props);
}

/// Decode a TNEF stream into the parts it stands for.
pub fn decode(data: &[u8]) -> Result<Vec<Part>, Error> {
    Ok(parse(data)?.into_parts(0))
}

impl Tnef {
    fn class_is(&self, prefix: &str) -> bool {
        self.message_class.as_deref().map_or(false, |class| {
            class
                .get(..prefix.len())
                .map_or(false, |p| p.eq_ignore_ascii_case(prefix))
        })
    }

    fn is_contact(&self) -> bool {
        self.class_is("IPM.Contact")
    }

    fn is_read_receipt(&self) -> bool {
        self.class_is("IPM.Microsoft Mail.Read Receipt")
            || (self.class_is("REPORT.")
                && self.message_class.as_deref().map_or(false, |class| {
                    let class = class.to_ascii_uppercase();
                    class.ends_with(".IPNRN") || class.ends_with(".IPNNRN")
                }))
    }

    /// Convert to synthetic parts.
    ///
    /// Contacts and read receipts become exactly one part. Otherwise, the
    /// body comes first (HTML if present, else plain text, else RTF),
    /// followed by one part per attachment. `depth` counts the enclosing
    /// embedded messages.
    pub fn into_parts(self, depth: u32) -> Vec<Part> {
        if self.is_contact() {
            return vec![Part::synthetic(
                ContentType::new("text", "vcard").with_parm("charset", "utf-8"),
                None,
                self.vcard().into_bytes(),
            )];
        }

        if self.is_read_receipt() {
            return vec![Part::synthetic(
                ContentType::new("message", "disposition-notification"),
                None,
                self.disposition_notification().into_bytes(),
            )];
        }

        let mut parts = Vec::new();
        if let Some(html) = self.html_body {
            parts.push(Part::synthetic(
                ContentType::new("text", "html"),
                None,
                html,
            ));
        } else if let Some(body) = self.body {
            parts.push(Part::synthetic(
                ContentType::new("text", "plain").with_parm("charset", "utf-8"),
                None,
                body.into_bytes(),
            ));
        } else if let Some(rtf) = self.rtf_body {
            parts.push(Part::synthetic(
                ContentType::new("text", "rtf"),
                None,
                rtf,
            ));
        }

        for attachment in self.attachments {
            parts.push(attachment_part(attachment, depth));
        }

        parts
    }

    fn vcard(&self) -> String {
        let props = &self.props;
        let name = props
            .get_str(mapi::PR_DISPLAY_NAME)
            .or_else(|| self.subject.as_deref())
            .unwrap_or("");

        let mut card = String::new();
        card.push_str("BEGIN:VCARD\r\nVERSION:3.0\r\n");
        let _ = write!(card, "FN:{}\r\n", vcard_escape(name));
        let mut line = |key: &str, value: Option<&str>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                let _ = write!(card, "{}:{}\r\n", key, vcard_escape(value));
            }
        };
        line("ORG", props.get_str(mapi::PR_COMPANY_NAME));
        line("TITLE", props.get_str(mapi::PR_TITLE));
        line(
            "EMAIL;TYPE=INTERNET",
            props
                .get_named(mapi::LID_EMAIL1_ADDRESS)
                .and_then(mapi::PropValue::as_str)
                .or_else(|| props.get_str(mapi::PR_EMAIL_ADDRESS)),
        );
        line(
            "TEL;TYPE=WORK",
            props.get_str(mapi::PR_BUSINESS_TELEPHONE_NUMBER),
        );
        line(
            "TEL;TYPE=CELL",
            props.get_str(mapi::PR_MOBILE_TELEPHONE_NUMBER),
        );
        line("NOTE", self.body.as_deref());
        card.push_str("END:VCARD\r\n");
        card
    }

    fn disposition_notification(&self) -> String {
        let recipient = self
            .props
            .get_str(mapi::PR_SENDER_EMAIL_ADDRESS)
            .unwrap_or("unknown");
        let disposition = if self
            .message_class
            .as_deref()
            .map_or(false, |c| c.to_ascii_uppercase().ends_with(".IPNNRN"))
        {
            "deleted"
        } else {
            "displayed"
        };

        format!(
            "Reporting-UA: {}\r\n\
             Final-Recipient: rfc822; {}\r\n\
             Disposition: manual-action/MDN-sent-manually; {}\r\n",
            env!("CARGO_PKG_NAME"),
            recipient,
            disposition
        )
    }
}

fn vcard_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' | ',' | ';' => {
                out.push('\\');
                out.push(ch);
            },
            '\n' => out.push_str("\\n"),
            '\r' => (),
            ch => out.push(ch),
        }
    }
    out
}

fn attachment_part(attachment: TnefAttachment, depth: u32) -> Part {
    let filename = attachment.filename().map(str::to_owned);

    if attachment.is_embedded_message() {
        if let Some(message) = embedded_message(&attachment, depth) {
            let mut part = Part::nested(message);
            part.filename = filename;
            return part;
        }
    }

    let content_type = attachment
        .mime_tag()
        .and_then(parse_content_type)
        .unwrap_or_else(|| {
            type_for_filename_or_octets(filename.as_deref().unwrap_or(""))
        });
    let content_id = attachment.content_id().map(str::to_owned);
    let data = if attachment.data.is_empty() {
        attachment.content().to_vec()
    } else {
        attachment.data
    };

    let mut part = Part::synthetic(content_type, filename, data);
    part.disposition = Some(Disposition::Attachment);
    part.content_id = content_id;
    part
}

fn embedded_message(
    attachment: &TnefAttachment,
    depth: u32,
) -> Option<Message> {
    if depth >= MAX_RECURSION {
        warn!("TNEF embedded messages nested too deeply");
        return None;
    }

    let raw = attachment.content();
    let inner = match parse(raw) {
        Ok(inner) => inner,
        Err(e) => {
            warn!("Treating embedded TNEF message as opaque: {}", e);
            return None;
        },
    };

    let mut headers = Headers::default();
    let envelope = Envelope {
        subject: inner.subject.clone(),
        ..Envelope::default()
    };
    if let Some(ref subject) = inner.subject {
        headers.push("Subject", subject.as_str());
    }

    let mut parts = inner.into_parts(depth + 1);
    let root = if 1 == parts.len() {
        parts.remove(0)
    } else {
        Part {
            content_type: Some(ContentType::new("multipart", "mixed")),
            disposition: None,
            filename: None,
            content_id: None,
            size: -1,
            headers: Headers::default(),
            body: PartBody::Multipart(parts),
        }
    };

    Some(Message {
        envelope,
        headers,
        flags: SystemFlags::empty(),
        user_flags: vec![],
        root,
        raw: Arc::new(raw.to_vec()),
    })
}

#[cfg(test)]
pub(crate) mod test {
    use proptest::prelude::*;

    use super::*;
    use crate::decode::mapi::test::PropWriter;

    /// Builds TNEF streams for tests.
    pub struct TnefWriter(Vec<u8>);

    impl Default for TnefWriter {
        fn default() -> Self {
            let mut data = SIGNATURE.to_le_bytes().to_vec();
            data.extend_from_slice(&0x1234u16.to_le_bytes());
            TnefWriter(data)
        }
    }

    impl TnefWriter {
        pub fn attr(mut self, level: u8, id: u32, data: &[u8]) -> Self {
            let checksum = data
                .iter()
                .fold(0u16, |sum, &b| sum.wrapping_add(u16::from(b)));
            self.0.push(level);
            self.0.extend_from_slice(&id.to_le_bytes());
            self.0.extend_from_slice(&(data.len() as u32).to_le_bytes());
            self.0.extend_from_slice(data);
            self.0.extend_from_slice(&checksum.to_le_bytes());
            self
        }

        pub fn string(self, level: u8, id: u32, s: &str) -> Self {
            let mut data = s.as_bytes().to_vec();
            data.push(0);
            self.attr(level, id, &data)
        }

        pub fn message_class(self, class: &str) -> Self {
            self.string(LVL_MESSAGE, ATT_MESSAGE_CLASS, class)
        }

        pub fn subject(self, subject: &str) -> Self {
            self.string(LVL_MESSAGE, ATT_SUBJECT, subject)
        }

        pub fn body(self, body: &str) -> Self {
            self.string(LVL_MESSAGE, ATT_BODY, body)
        }

        pub fn message_props(self, props: Vec<u8>) -> Self {
            self.attr(LVL_MESSAGE, ATT_MSG_PROPS, &props)
        }

        pub fn attachment(self, title: &str, data: &[u8]) -> Self {
            self.attr(LVL_ATTACHMENT, ATT_ATTACH_REND_DATA, &[0u8; 14])
                .string(LVL_ATTACHMENT, ATT_ATTACH_TITLE, title)
                .attr(LVL_ATTACHMENT, ATT_ATTACH_DATA, data)
        }

        pub fn attachment_props(self, props: Vec<u8>) -> Self {
            self.attr(LVL_ATTACHMENT, ATT_ATTACHMENT, &props)
        }

        pub fn build(self) -> Vec<u8> {
            self.0
        }
    }

    fn mime_type(part: &Part) -> String {
        part.content_type.as_ref().unwrap().mime_type()
    }

    #[test]
    fn body_and_attachments() {
        let data = TnefWriter::default()
            .message_class("IPM.Note")
            .subject("Quarterly numbers")
            .body("See attached.")
            .attachment("REPORT~1.XLS", b"spreadsheet")
            .attachment_props(
                PropWriter::default()
                    .unicode(mapi::PR_ATTACH_LONG_FILENAME, "Report Q3.xlsx")
                    .build(),
            )
            .attachment("LOGO.PNG", b"\x89PNG")
            .attachment_props(
                PropWriter::default()
                    .string8(mapi::PR_ATTACH_MIME_TAG, "image/png")
                    .string8(mapi::PR_ATTACH_CONTENT_ID, "<logo@x>")
                    .build(),
            )
            .attachment("NOTES", b"misc")
            .build();

        let tnef = parse(&data).unwrap();
        assert_eq!(Some("IPM.Note".to_owned()), tnef.message_class);
        assert_eq!(Some("Quarterly numbers".to_owned()), tnef.subject);
        assert_eq!(3, tnef.attachments.len());

        let parts = tnef.into_parts(0);
        assert_eq!(4, parts.len());
        assert_eq!("text/plain", mime_type(&parts[0]));
        assert_eq!("See attached.", parts[0].text().unwrap());

        assert_eq!(Some("Report Q3.xlsx".to_owned()), parts[1].filename);
        assert_eq!(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            mime_type(&parts[1])
        );
        assert_eq!(Some(Disposition::Attachment), parts[1].disposition);
        assert_eq!(b"spreadsheet".to_vec(), parts[1].read_bytes().unwrap());

        assert_eq!("image/png", mime_type(&parts[2]));
        assert_eq!(Some("logo@x".to_owned()), parts[2].content_id);

        assert_eq!("application/octet-stream", mime_type(&parts[3]));
        assert_eq!(4, parts[3].size);
    }

    #[test]
    fn html_preferred_over_plain_and_rtf() {
        let mut rtf = vec![];
        rtf.extend_from_slice(&[9, 0, 0, 0, 5, 0, 0, 0]);
        rtf.extend_from_slice(b"MELA");
        rtf.extend_from_slice(&[0, 0, 0, 0]);
        rtf.extend_from_slice(b"{\\rtf}");

        let with_html = TnefWriter::default()
            .body("plain")
            .message_props(
                PropWriter::default()
                    .binary(mapi::PR_BODY_HTML, b"<p>html</p>")
                    .binary(mapi::PR_RTF_COMPRESSED, &rtf)
                    .build(),
            )
            .build();
        let parts = decode(&with_html).unwrap();
        assert_eq!(1, parts.len());
        assert_eq!("text/html", mime_type(&parts[0]));

        let rtf_only = TnefWriter::default()
            .message_props(
                PropWriter::default()
                    .binary(mapi::PR_RTF_COMPRESSED, &rtf)
                    .build(),
            )
            .build();
        let parts = decode(&rtf_only).unwrap();
        assert_eq!("text/rtf", mime_type(&parts[0]));
        assert_eq!(b"{\\rtf".to_vec(), parts[0].read_bytes().unwrap());
    }

    #[test]
    fn contact_becomes_vcard() {
        let data = TnefWriter::default()
            .message_class("IPM.Contact")
            .subject("Jane Doe")
            .body("Met at the conference")
            .message_props(
                PropWriter::default()
                    .unicode(mapi::PR_DISPLAY_NAME, "Doe, Jane")
                    .unicode(mapi::PR_COMPANY_NAME, "Example; Inc")
                    .string8(mapi::PR_EMAIL_ADDRESS, "jane@example.com")
                    .build(),
            )
            .attachment("IGNORED", b"x")
            .build();

        let parts = decode(&data).unwrap();
        assert_eq!(1, parts.len());
        assert_eq!("text/vcard", mime_type(&parts[0]));
        assert_eq!(
            "BEGIN:VCARD\r\n\
             VERSION:3.0\r\n\
             FN:Doe\\, Jane\r\n\
             ORG:Example\\; Inc\r\n\
             EMAIL;TYPE=INTERNET:jane@example.com\r\n\
             NOTE:Met at the conference\r\n\
             END:VCARD\r\n",
            parts[0].text().unwrap()
        );
    }

    #[test]
    fn read_receipt_becomes_notification() {
        let data = TnefWriter::default()
            .message_class("REPORT.IPM.Note.IPNRN")
            .subject("Read: hello")
            .build();
        let parts = decode(&data).unwrap();
        assert_eq!(1, parts.len());
        assert_eq!("message/disposition-notification", mime_type(&parts[0]));
        assert!(parts[0]
            .text()
            .unwrap()
            .contains("manual-action/MDN-sent-manually; displayed"));
    }

    #[test]
    fn embedded_message() {
        let inner = TnefWriter::default()
            .subject("Inner")
            .body("inner body")
            .attachment("A.TXT", b"a")
            .build();
        let data = TnefWriter::default()
            .body("outer")
            .attr(LVL_ATTACHMENT, ATT_ATTACH_REND_DATA, &[0u8; 14])
            .attachment_props(
                PropWriter::default()
                    .long(mapi::PR_ATTACH_METHOD, 5)
                    .unicode(mapi::PR_ATTACH_LONG_FILENAME, "Inner.msg")
                    .object(mapi::PR_ATTACH_DATA_OBJ, &inner)
                    .build(),
            )
            .build();

        let parts = decode(&data).unwrap();
        assert_eq!(2, parts.len());
        assert_eq!(Some("Inner.msg".to_owned()), parts[1].filename);
        let nested = parts[1].nested_message().unwrap();
        assert_eq!(Some("Inner".to_owned()), nested.envelope.subject);
        assert_eq!(-1, nested.root.size);
        let children = nested.root.children();
        assert_eq!(2, children.len());
        assert_eq!("inner body", children[0].text().unwrap());
        assert_eq!(Some("A.TXT".to_owned()), children[1].filename);
    }

    #[test]
    fn bad_checksum_skips_attribute() {
        let mut data = TnefWriter::default()
            .subject("kept")
            .body("corrupted")
            .build();
        // Flip a byte of the body text
        let len = data.len();
        data[len - 4] ^= 0x20;

        let tnef = parse(&data).unwrap();
        assert_eq!(Some("kept".to_owned()), tnef.subject);
        assert_eq!(None, tnef.body);
    }

    #[test]
    fn truncated_stream() {
        let data = TnefWriter::default()
            .subject("subject")
            .attachment("A.BIN", &[1u8; 100])
            .build();
        assert_matches!(
            Err(Error::BadTnef(_)),
            decode(&data[..data.len() - 10])
        );
        assert_matches!(Err(Error::BadTnef(_)), decode(b"not tnef at all"));
        assert_matches!(Err(Error::Io(_)), decode(b"\x78"));

        assert_matches!(
            Err(Error::BadTnef(_)),
            decode(&TnefWriter::default().build())
        );

        let mut all_corrupt = TnefWriter::default().subject("x").build();
        let len = all_corrupt.len();
        all_corrupt[len - 1] ^= 0x01;
        assert_matches!(Err(Error::BadTnef(_)), decode(&all_corrupt));
    }

    proptest! {
        #[test]
        fn decode_never_panics(
            body in prop::collection::vec(prop::num::u8::ANY, 0..300)
        ) {
            let mut data = SIGNATURE.to_le_bytes().to_vec();
            data.extend_from_slice(&[0, 0]);
            data.extend_from_slice(&body);
            let _ = decode(&data);
        }
    }
}
