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

//! Building `Message` views from raw RFC 822 data.

use std::mem;
use std::sync::Arc;

use log::{debug, info};

use super::model::*;
use crate::mime::content_encoding::{decode_transfer, decoded_size_hint};
use crate::mime::encoded_word::ew_decode_unstructured;
use crate::mime::grovel::{self, Visitor, MAX_RECURSION};
use crate::mime::header;
use crate::mime::model::*;
use crate::mime::strings::{to_utf8, unfold};
use crate::support::error::Error;

/// Parse `raw` into a `Message`.
///
/// This only fails on I/O errors, which cannot happen with an in-memory
/// source; malformed structure is accepted as well as possible. Flags are
/// left empty for the caller to fill in.
pub fn load_message(raw: &[u8]) -> Result<Message, Error> {
    load_at_depth(Arc::new(raw.to_vec()), 0)
}

fn load_at_depth(raw: Arc<Vec<u8>>, depth: u32) -> Result<Message, Error> {
    let root = grovel::grovel(&raw[..], Box::new(PartBuilder::new(depth)))?;
    Ok(message_from_root(root, raw))
}

fn message_from_root(root: Part, raw: Arc<Vec<u8>>) -> Message {
    let headers = root.headers.clone();
    let addresses = |name: &str| {
        headers
            .get_all(name)
            .flat_map(header::parse_address_list)
            .collect::<Vec<_>>()
    };

    let envelope = Envelope {
        from: addresses("From"),
        to: addresses("To"),
        cc: addresses("Cc"),
        bcc: addresses("Bcc"),
        subject: headers.decoded("Subject"),
        sent_date: headers.get("Date").and_then(header::parse_datetime),
        received_date: headers
            .get("Received")
            .and_then(header::parse_received_date),
        message_id: headers
            .get("Message-ID")
            .and_then(header::parse_message_id),
    };

    Message {
        envelope,
        headers,
        flags: SystemFlags::empty(),
        user_flags: vec![],
        root,
        raw,
    }
}

/// Collects one segment of the message into a `Part`.
#[derive(Debug)]
struct PartBuilder {
    /// Number of enclosing messages which had to be re-parsed after transfer
    /// decoding.
    depth: u32,
    headers: Headers,
    declared_type: Option<ContentType>,
    effective_type: ContentType,
    disposition: Option<ContentDisposition>,
    encoding: ContentTransferEncoding,
    content_id: Option<String>,
    keep_content: bool,
    content: Vec<u8>,
    children: Vec<Part>,
}

impl PartBuilder {
    fn new(depth: u32) -> Self {
        PartBuilder {
            depth,
            headers: Headers::default(),
            declared_type: None,
            effective_type: ContentType::new("text", "plain"),
            disposition: None,
            encoding: ContentTransferEncoding::default(),
            content_id: None,
            keep_content: true,
            content: vec![],
            children: vec![],
        }
    }

    fn filename(&self) -> Option<String> {
        self.disposition
            .as_ref()
            .and_then(|cd| cd.parm("filename"))
            .or_else(|| {
                self.declared_type.as_ref().and_then(|ct| ct.parm("name"))
            })
            .map(|name| ew_decode_unstructured(name.trim()).into_owned())
            .filter(|name| !name.is_empty())
    }

    fn build_message_body(&mut self) -> Option<Message> {
        match self.encoding {
            ContentTransferEncoding::Base64
            | ContentTransferEncoding::QuotedPrintable => {
                // The streaming parser saw only the encoded form, so whatever
                // child it built is garbage
                if self.depth >= MAX_RECURSION {
                    return None;
                }

                let decoded =
                    decode_transfer(self.encoding, &self.content).into_owned();
                debug!("Re-parsing transfer-encoded message/rfc822");
                load_at_depth(Arc::new(decoded), self.depth + 1).ok()
            },
            _ => {
                let root = self.children.pop()?;
                let raw = mem::replace(&mut self.content, vec![]);
                Some(message_from_root(root, Arc::new(raw)))
            },
        }
    }
}

impl Visitor for PartBuilder {
    type Output = Part;

    fn header(&mut self, name: &str, value: &[u8]) -> Result<(), Part> {
        let value = to_utf8(value.into());
        let value = unfold(&value);
        let value = value.trim();

        if "Content-Disposition".eq_ignore_ascii_case(name) {
            if self.disposition.is_none() {
                self.disposition = header::parse_content_disposition(value);
            }
        } else if "Content-Transfer-Encoding".eq_ignore_ascii_case(name) {
            match header::parse_content_transfer_encoding(value) {
                Some(cte) => self.encoding = cte,
                None => info!("Unknown Content-Transfer-Encoding {:?}", value),
            }
        } else if "Content-ID".eq_ignore_ascii_case(name) {
            if self.content_id.is_none() {
                self.content_id = header::parse_message_id(value);
            }
        }

        self.headers.push(name, value);
        Ok(())
    }

    fn content_type(
        &mut self,
        ct: &ContentType,
        defaulted: bool,
    ) -> Result<(), Part> {
        self.effective_type = ct.clone();
        // A defaulted text/plain is left undeclared so that classification
        // can still guess from the file name.
        if !defaulted || !ct.is("text", "plain") {
            self.declared_type = Some(ct.clone());
        }
        Ok(())
    }

    fn start_content(&mut self) -> Result<(), Part> {
        self.keep_content = !self.effective_type.is_type("multipart");
        Ok(())
    }

    fn content(&mut self, data: &[u8]) -> Result<(), Part> {
        if self.keep_content {
            self.content.extend_from_slice(data);
        }
        Ok(())
    }

    fn start_part(&mut self) -> Option<Box<dyn Visitor<Output = Part>>> {
        Some(Box::new(PartBuilder::new(self.depth)))
    }

    fn child_result(&mut self, child: Part) -> Result<(), Part> {
        self.children.push(child);
        Ok(())
    }

    fn end(&mut self) -> Part {
        let filename = self.filename();
        let disposition =
            self.disposition.as_ref().map(Disposition::from_header);

        let (size, body) = if self.effective_type.is_type("multipart") {
            (-1, PartBody::Multipart(mem::replace(&mut self.children, vec![])))
        } else if let Some(message) = self
            .effective_type
            .is("message", "rfc822")
            .then(|| self.build_message_body())
            .flatten()
        {
            (message.raw.len() as i64, PartBody::Message(Box::new(message)))
        } else {
            let raw = mem::replace(&mut self.content, vec![]);
            (
                decoded_size_hint(self.encoding, &raw),
                PartBody::Leaf(Arc::new(EncodedContent {
                    encoding: self.encoding,
                    raw,
                })),
            )
        };

        Part {
            content_type: self.declared_type.take(),
            disposition,
            filename,
            content_id: self.content_id.take(),
            size,
            headers: mem::replace(&mut self.headers, Headers::default()),
            body,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn load(message: &str) -> Message {
        load_message(message.replace('\n', "\r\n").as_bytes()).unwrap()
    }

    #[test]
    fn simple_message() {
        let message = load(
            "From: \"Alice Example\" <alice@example.com>\n\
             To: bob@example.com, Carol <carol@example.com>\n\
             Subject: =?utf-8?q?Gr=C3=BC=C3=9Fe?=\n\
             Date: Tue, 1 Jul 2003 10:52:37 +0200\n\
             Received: from x by y; Tue, 1 Jul 2003 10:53:00 +0200\n\
             Message-ID: <abc@example.com>\n\
             \n\
             Hello\n",
        );

        assert_eq!(
            vec![Address {
                name: Some("Alice Example".to_owned()),
                address: "alice@example.com".to_owned(),
            }],
            message.envelope.from
        );
        assert_eq!(2, message.envelope.to.len());
        assert_eq!(Some("Grüße".to_owned()), message.envelope.subject);
        assert_eq!(
            "2003-07-01T10:52:37+02:00",
            message.envelope.sent_date.unwrap().to_rfc3339()
        );
        assert_eq!(
            "2003-07-01T10:53:00+02:00",
            message.envelope.received_date.unwrap().to_rfc3339()
        );
        assert_eq!(
            Some("abc@example.com".to_owned()),
            message.envelope.message_id
        );

        assert_eq!(None, message.root.content_type);
        assert_eq!("Hello\r\n", message.root.text().unwrap());
        assert_eq!(7, message.root.size);
    }

    #[test]
    fn multipart_with_attachment() {
        let message = load(
            "Content-Type: multipart/mixed; boundary=b\n\
             \n\
             --b\n\
             Content-Type: text/plain; charset=iso-8859-1\n\
             Content-Transfer-Encoding: quoted-printable\n\
             \n\
             caf=E9\n\
             --b\n\
             Content-Type: application/octet-stream; name=ignored.bin\n\
             Content-Disposition: attachment;\n\
             \tfilename*=utf-8''r%C3%A9sum%C3%A9.pdf\n\
             Content-Transfer-Encoding: base64\n\
             Content-ID: <img1@example>\n\
             \n\
             AAECAw==\n\
             --b--\n",
        );

        assert_eq!(-1, message.root.size);
        let children = message.root.children();
        assert_eq!(2, children.len());

        assert_eq!("café", children[0].text().unwrap());
        assert_eq!(None, children[0].disposition);
        assert_eq!(None, children[0].filename);

        let attachment = &children[1];
        assert_eq!(Some(Disposition::Attachment), attachment.disposition);
        assert_eq!(Some("résumé.pdf".to_owned()), attachment.filename);
        assert_eq!(Some("img1@example".to_owned()), attachment.content_id);
        assert_eq!(vec![0u8, 1, 2, 3], attachment.read_bytes().unwrap());
        assert_eq!(4, attachment.size);
    }

    #[test]
    fn nested_message() {
        let message = load(
            "Subject: outer\n\
             Content-Type: multipart/mixed; boundary=b\n\
             \n\
             --b\n\
             Content-Type: message/rfc822\n\
             \n\
             Subject: inner\n\
             From: x@example.com\n\
             \n\
             inner body\n\
             --b--\n",
        );

        let nested = message.root.children()[0].nested_message().unwrap();
        assert_eq!(Some("inner".to_owned()), nested.envelope.subject);
        assert_eq!("inner body", nested.root.text().unwrap());
        assert_eq!(
            b"Subject: inner\r\nFrom: x@example.com\r\n\r\ninner body".to_vec(),
            *nested.raw
        );
    }

    #[test]
    fn base64_nested_message_is_reparsed() {
        let inner = base64::encode("Subject: hidden\r\n\r\nsecret\r\n");
        let message = load(&format!(
            "Content-Type: message/rfc822\n\
             Content-Transfer-Encoding: base64\n\
             \n\
             {}\n",
            inner
        ));

        let nested = message.root.nested_message().unwrap();
        assert_eq!(Some("hidden".to_owned()), nested.envelope.subject);
        assert_eq!("secret\r\n", nested.root.text().unwrap());
    }

    #[test]
    fn filename_from_encoded_word_name() {
        let message = load(
            "Content-Type: image/png; name=\"=?utf-8?b?w6kucG5n?=\"\n\
             \n\
             data\n",
        );
        assert_eq!(Some("é.png".to_owned()), message.root.filename);
        assert!(message.root.content_type.unwrap().is("image", "png"));
    }

    #[test]
    fn unknown_transfer_encoding_is_identity() {
        let message = load(
            "Content-Transfer-Encoding: x-gzip64\n\
             \n\
             abc\n",
        );
        assert_eq!(b"abc\r\n".to_vec(), message.root.read_bytes().unwrap());
    }
}
