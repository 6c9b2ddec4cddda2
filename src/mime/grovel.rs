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

use std::cell::Cell;
use std::fmt;
use std::io::{BufRead, Read};
use std::mem;
use std::rc::Rc;
use std::str;

use super::header::parse_content_type;
use super::model::ContentType;
use super::strings::{to_utf8, unfold};
use crate::support::error::Error;

/// A visitor which receives events from the push parser.
///
/// Any method returning `Result` may end parsing early by returning `Err`
/// with the final output; after that no more methods are called on the
/// visitor.
///
/// Methods are declared in the order they are usually called.
#[allow(unused_variables)]
pub trait Visitor: fmt::Debug {
    type Output;

    /// Called for each header found, with the raw value (still folded, not
    /// decoded).
    ///
    /// Headers whose names are not valid UTF-8 or which have no `:` are
    /// silently dropped.
    fn header(&mut self, name: &str, value: &[u8]) -> Result<(), Self::Output> {
        Ok(())
    }

    /// Called once at the end of the headers with the effective content
    /// type.
    ///
    /// `defaulted` is true if no usable `Content-Type` header was present and
    /// `ct` is the default for the context (`text/plain`, or
    /// `message/rfc822` inside a `multipart/digest`).
    fn content_type(
        &mut self,
        ct: &ContentType,
        defaulted: bool,
    ) -> Result<(), Self::Output> {
        Ok(())
    }

    /// Indicates the end of the headers.
    fn start_content(&mut self) -> Result<(), Self::Output> {
        Ok(())
    }

    /// Receives raw content belonging to this segment.
    ///
    /// For multipart and `message/rfc822` segments this is the raw
    /// representation of everything inside. The line ending before a
    /// multipart boundary is not included.
    fn content(&mut self, data: &[u8]) -> Result<(), Self::Output> {
        Ok(())
    }

    /// Indicates the start of a child part (a multipart member or the body of
    /// a `message/rfc822`).
    ///
    /// Return a new visitor to receive the details of the child.
    fn start_part(
        &mut self,
    ) -> Option<Box<dyn Visitor<Output = Self::Output>>> {
        None
    }

    /// Receives the output of a child visitor returned from `start_part`.
    fn child_result(
        &mut self,
        child_result: Self::Output,
    ) -> Result<(), Self::Output> {
        Ok(())
    }

    /// Indicates the end of the segment. Always the last call.
    fn end(&mut self) -> Self::Output;
}

/// Run `visitor` over the RFC 822 message read from `reader`.
///
/// Only I/O errors from `reader` cause this to fail; malformed content is
/// always accepted one way or another.
pub fn grovel<V>(
    reader: impl BufRead,
    visitor: Box<dyn Visitor<Output = V>>,
) -> Result<V, Error> {
    Groveller::new(visitor, Rc::new(Cell::new(0))).read_through(reader)
}

/// The push parser proper.
///
/// It aims to be robust rather than strictly correct: wildly malformed input
/// is accepted, and only a bounded amount of any line is held in memory. It
/// understands no header except `Content-Type` and does no transfer or
/// charset decoding.
#[derive(Debug)]
struct Groveller<V> {
    visitor: Box<dyn Visitor<Output = V>>,
    in_headers: bool,
    /// Set once the blank line after the headers has passed.
    in_content: bool,
    /// Allows a boundary on the very first content line to be recognised.
    first_line_of_content: bool,
    seen_content_type: bool,
    seen_boundary: bool,

    /// Whether the final line ending of the segment counts as content. This
    /// holds until we are nested inside a real multipart.
    trailing_line_ending_is_content: bool,

    /// A header waiting to see whether the next line continues it.
    pending_header: Vec<u8>,
    /// The line ending of the previous content line. It only becomes content
    /// once we know the next line is not a boundary.
    pending_line_ending: &'static [u8],

    default_content_type: ContentType,
    child_default_content_type: ContentType,

    child: Option<Box<Self>>,
    /// The multipart delimiter, including the leading `--`.
    boundary: Option<Vec<u8>>,
    /// Whether the body is a `message/rfc822`, which is handled as a
    /// multipart with exactly one unbounded member.
    is_message_rfc822: bool,

    depth: u32,
    part_count: Rc<Cell<u32>>,
}

#[cfg(not(test))]
const MAX_BUFFER: usize = 65536;
// Much shorter in tests so the over-long line paths get exercised.
#[cfg(test)]
const MAX_BUFFER: usize = 256;

/// Nesting limit; anything deeper is treated as opaque content.
pub const MAX_RECURSION: u32 = 20;
/// Limit on the number of parts in one message.
pub const MAX_PARTS: u32 = 1000;

impl<V> Groveller<V> {
    fn new(
        visitor: Box<dyn Visitor<Output = V>>,
        part_count: Rc<Cell<u32>>,
    ) -> Self {
        Groveller {
            visitor,
            in_headers: true,
            in_content: false,
            first_line_of_content: true,
            seen_content_type: false,
            seen_boundary: false,
            trailing_line_ending_is_content: true,
            pending_header: vec![],
            pending_line_ending: b"",
            default_content_type: ContentType::new("text", "plain"),
            child_default_content_type: ContentType::new("text", "plain"),
            child: None,
            boundary: None,
            is_message_rfc822: false,
            depth: 0,
            part_count,
        }
    }

    fn read_through(mut self, mut r: impl BufRead) -> Result<V, Error> {
        let mut buf = Vec::new();
        let mut carried_cr = false;

        loop {
            if !carried_cr {
                // Fast path: a whole line is already in the reader's buffer
                let r_buf = r.fill_buf()?;
                if r_buf.is_empty() {
                    break;
                }

                if let Some(lf) = memchr::memchr(b'\n', r_buf) {
                    let maybe_continued =
                        could_be_continuation(&r_buf[lf + 1..]);
                    if let Err(output) =
                        self.push_line(&r_buf[..=lf], maybe_continued)
                    {
                        return Ok(output);
                    }
                    r.consume(lf + 1);
                    continue;
                }
            }

            buf.clear();
            if carried_cr {
                buf.push(b'\r');
                carried_cr = false;
            }
            r.by_ref()
                .take(MAX_BUFFER as u64)
                .read_until(b'\n', &mut buf)?;
            if buf.is_empty() {
                break;
            }

            // A CR at the end of a full buffer may be the first half of the
            // CRLF before a boundary, so it must travel with the next line.
            if MAX_BUFFER == buf.len() && Some(&b'\r') == buf.last() {
                carried_cr = true;
                buf.pop();
            }

            let next = r.fill_buf()?;
            let maybe_continued =
                !next.is_empty() && could_be_continuation(next);
            if let Err(output) = self.push_line(&buf, maybe_continued) {
                return Ok(output);
            }
        }

        Ok(self.end())
    }

    fn push_line(
        &mut self,
        line: &[u8],
        maybe_continued: bool,
    ) -> Result<(), V> {
        self.push(line, maybe_continued)?;
        self.push_content(line)
    }

    fn push(&mut self, line: &[u8], maybe_continued: bool) -> Result<(), V> {
        if self.in_headers {
            return self.push_header_line(line, maybe_continued);
        }

        let is_first = self.first_line_of_content;
        self.first_line_of_content = false;

        // A boundary may follow any line ending, not only CRLF.
        if is_first || !self.pending_line_ending.is_empty() {
            let boundary_state = self.boundary.as_ref().and_then(|boundary| {
                if line.starts_with(boundary) {
                    Some(line[boundary.len()..].starts_with(b"--"))
                } else {
                    None
                }
            });

            if let Some(is_final) = boundary_state {
                self.pending_line_ending = b"";
                if self.seen_boundary {
                    self.end_child()?;
                }
                self.seen_boundary = true;

                if !is_final {
                    self.start_child()?;
                }
                return Ok(());
            }

            let ending = self.pending_line_ending;
            self.on_child(|child| child.push_content(ending))?;
        }

        let (content, ending): (&[u8], &'static [u8]) =
            if line.ends_with(b"\r\n") {
                (&line[..line.len() - 2], &b"\r\n"[..])
            } else if line.ends_with(b"\n") {
                (&line[..line.len() - 1], &b"\n"[..])
            } else {
                (line, &b""[..])
            };
        self.pending_line_ending = ending;

        self.on_child(|child| child.push(line, maybe_continued))?;
        self.on_child(|child| child.push_content(content))
    }

    fn push_header_line(
        &mut self,
        line: &[u8],
        maybe_continued: bool,
    ) -> Result<(), V> {
        let is_continuation = line.starts_with(b" ") || line.starts_with(b"\t");

        if !is_continuation && !self.pending_header.is_empty() {
            self.flush_pending_header()?;
        }

        if b"\n" == line || b"\r\n" == line {
            self.end_headers()
        } else if is_continuation {
            // A continuation with nothing to continue is dropped
            if !self.pending_header.is_empty() {
                self.pending_header.extend_from_slice(line);
                if self.pending_header.len() > MAX_BUFFER {
                    self.flush_pending_header()?;
                }
            }
            Ok(())
        } else if maybe_continued {
            self.pending_header.extend_from_slice(line);
            Ok(())
        } else {
            self.process_header(line)
        }
    }

    fn push_content(&mut self, content: &[u8]) -> Result<(), V> {
        if self.in_headers {
            Ok(())
        } else if self.in_content {
            self.visitor.content(content)
        } else {
            // The blank line ending the headers is not content
            self.in_content |= b"\n" == content || b"\r\n" == content;
            Ok(())
        }
    }

    fn flush_pending_header(&mut self) -> Result<(), V> {
        if self.pending_header.is_empty() {
            return Ok(());
        }

        let header = mem::replace(&mut self.pending_header, Vec::new());
        self.process_header(&header)
    }

    fn process_header(&mut self, header: &[u8]) -> Result<(), V> {
        let colon = match memchr::memchr(b':', header) {
            Some(colon) => colon,
            None => return Ok(()),
        };

        let name = match str::from_utf8(&header[..colon]) {
            Ok(name) => name.trim(),
            Err(_) => return Ok(()),
        };
        let value = &header[colon + 1..];

        self.visitor.header(name, value)?;

        if "Content-Type".eq_ignore_ascii_case(name) && !self.seen_content_type
        {
            let value = to_utf8(value.into());
            if let Some(ct) = parse_content_type(&unfold(&value)) {
                self.content_type(&ct, false)?;
            }
        }

        Ok(())
    }

    fn content_type(
        &mut self,
        ct: &ContentType,
        defaulted: bool,
    ) -> Result<(), V> {
        self.seen_content_type = true;
        self.visitor.content_type(ct, defaulted)?;

        if ct.is_type("multipart") {
            if let Some(boundary) = ct.parm("boundary") {
                let mut delim = Vec::with_capacity(boundary.len() + 2);
                delim.extend_from_slice(b"--");
                delim.extend_from_slice(boundary.as_bytes());
                self.boundary = Some(delim);
            }

            if ct.is_subtype("digest") {
                self.child_default_content_type =
                    ContentType::new("message", "rfc822");
            }
        } else if ct.is("message", "rfc822") {
            self.is_message_rfc822 = true;
        }

        Ok(())
    }

    fn end_headers(&mut self) -> Result<(), V> {
        if !self.seen_content_type {
            let default = self.default_content_type.clone();
            self.content_type(&default, true)?;
        }

        self.in_headers = false;
        self.visitor.start_content()?;

        if self.is_message_rfc822 {
            self.start_child()?;
        }

        Ok(())
    }

    fn has_children(&self) -> bool {
        self.depth < MAX_RECURSION
            && (self.boundary.is_some() || self.is_message_rfc822)
            && self.part_count.get() < MAX_PARTS
    }

    fn start_child(&mut self) -> Result<(), V> {
        if !self.has_children() {
            return Ok(());
        }

        if let Some(child_visitor) = self.visitor.start_part() {
            let mut child =
                Self::new(child_visitor, Rc::clone(&self.part_count));
            child.default_content_type =
                self.child_default_content_type.clone();
            child.depth = self.depth + 1;
            child.trailing_line_ending_is_content =
                self.trailing_line_ending_is_content && self.is_message_rfc822;
            self.child = Some(Box::new(child));
            self.part_count.set(self.part_count.get() + 1);
        }

        Ok(())
    }

    fn on_child(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<(), V>,
    ) -> Result<(), V> {
        let early_result = self.child.as_mut().and_then(|c| f(c).err());
        match early_result {
            Some(result) => {
                self.child = None;
                self.visitor.child_result(result)
            },
            None => Ok(()),
        }
    }

    fn end_child(&mut self) -> Result<(), V> {
        if self.child.is_none() {
            return Ok(());
        }

        // Without a boundary (message/rfc822) the final line ending belongs
        // to the child too.
        if self.boundary.is_none()
            && !self.pending_line_ending.is_empty()
            && self.trailing_line_ending_is_content
        {
            let ending = self.pending_line_ending;
            self.on_child(|child| child.push_content(ending))?;
        }

        if let Some(child) = self.child.take() {
            self.visitor.child_result(child.end())?;
        }

        Ok(())
    }

    fn end(mut self) -> V {
        // A message which ends inside its headers still has content type
        if self.in_headers {
            if let Err(output) = self.flush_pending_header() {
                return output;
            }
            if let Err(output) = self.end_headers() {
                return output;
            }
        }

        if let Err(output) = self.end_child() {
            return output;
        }

        self.visitor.end()
    }
}

fn could_be_continuation(tail: &[u8]) -> bool {
    tail.is_empty() || tail.starts_with(b" ") || tail.starts_with(b"\t")
}
