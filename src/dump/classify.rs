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

//! Deciding which kind of event a part produces.

use serde::Serialize;

use super::id::AttachmentId;
use crate::mime::model::ContentType;
use crate::mime::types::type_for_filename;
use crate::store::model::{Disposition, Part, PartBody};

/// Parts which get their own event instead of being generic attachments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialKind {
    Calendar,
    VCard,
    DeliveryStatus,
    DispositionNotification,
    Rfc822Headers,
}

static SPECIAL_TYPES: &[(&str, &str, SpecialKind)] = &[
    ("text", "calendar", SpecialKind::Calendar),
    ("text", "x-vcalendar", SpecialKind::Calendar),
    ("application", "ics", SpecialKind::Calendar),
    ("text", "vcard", SpecialKind::VCard),
    ("text", "x-vcard", SpecialKind::VCard),
    ("text", "directory", SpecialKind::VCard),
    ("message", "delivery-status", SpecialKind::DeliveryStatus),
    (
        "message",
        "disposition-notification",
        SpecialKind::DispositionNotification,
    ),
    ("text", "rfc822-headers", SpecialKind::Rfc822Headers),
    ("message", "rfc822-headers", SpecialKind::Rfc822Headers),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Multipart,
    Message,
    Tnef,
    /// `text/plain` or `text/enriched`.
    Text,
    Html,
    Image,
    Special(SpecialKind),
    Other,
}

/// The content type a part is treated as having.
///
/// This is the declared type if there is one, else the type implied by the
/// file name extension, else `text/plain`.
pub fn effective_type(part: &Part) -> ContentType {
    part.content_type
        .clone()
        .or_else(|| part.filename.as_deref().and_then(type_for_filename))
        .unwrap_or_else(|| ContentType::new("text", "plain"))
}

pub fn is_tnef(part: &Part) -> bool {
    match part.content_type {
        Some(ref ct)
            if ct.is("application", "ms-tnef")
                || ct.is("application", "vnd.ms-tnef") =>
        {
            true
        },
        ref ct => {
            let opaque = ct
                .as_ref()
                .map_or(true, |ct| ct.is("application", "octet-stream"));
            opaque
                && part
                    .filename
                    .as_deref()
                    .map_or(false, |f| f.eq_ignore_ascii_case("winmail.dat"))
        },
    }
}

pub fn classify(part: &Part) -> Category {
    match part.body {
        PartBody::Multipart(_) => return Category::Multipart,
        PartBody::Message(_) => return Category::Message,
        PartBody::Leaf(_) => (),
    }

    if is_tnef(part) {
        return Category::Tnef;
    }

    let ct = effective_type(part);
    if ct.is("text", "plain") || ct.is("text", "enriched") {
        Category::Text
    } else if ct.is("text", "html") {
        Category::Html
    } else if ct.is_type("image") {
        Category::Image
    } else if let Some(&(_, _, kind)) = SPECIAL_TYPES
        .iter()
        .find(|&&(typ, subtype, _)| ct.is(typ, subtype))
    {
        Category::Special(kind)
    } else {
        Category::Other
    }
}

/// Whether the part is body text rather than something attached.
///
/// A file name makes a part attachment-like even if it is declared
/// `inline`.
pub fn is_inline_like(part: &Part) -> bool {
    part.disposition.map_or(true, |d| Disposition::Inline == d)
        && part.filename.is_none()
}

/// The file name to present for a part.
///
/// Parts without a file name, or whose name did not survive decoding
/// intact, are named after their identifier.
pub fn display_filename(id: AttachmentId, part: &Part) -> String {
    match part.filename {
        Some(ref name) if !name.contains('\u{FFFD}') => name.clone(),
        _ => id.placeholder_filename(),
    }
}
