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

//! MAPI property lists as embedded in TNEF streams (MS-OXTNEF 2.1.3.4).

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::support::error::Error;

pub const PR_SUBJECT: u16 = 0x0037;
pub const PR_MESSAGE_CLASS: u16 = 0x001A;
pub const PR_BODY: u16 = 0x1000;
pub const PR_RTF_COMPRESSED: u16 = 0x1009;
pub const PR_BODY_HTML: u16 = 0x1013;
pub const PR_DISPLAY_NAME: u16 = 0x3001;
pub const PR_EMAIL_ADDRESS: u16 = 0x3003;
pub const PR_ATTACH_DATA_OBJ: u16 = 0x3701;
pub const PR_ATTACH_FILENAME: u16 = 0x3704;
pub const PR_ATTACH_METHOD: u16 = 0x3705;
pub const PR_ATTACH_LONG_FILENAME: u16 = 0x3707;
pub const PR_ATTACH_MIME_TAG: u16 = 0x370E;
pub const PR_ATTACH_CONTENT_ID: u16 = 0x3712;
pub const PR_BUSINESS_TELEPHONE_NUMBER: u16 = 0x3A08;
pub const PR_COMPANY_NAME: u16 = 0x3A16;
pub const PR_TITLE: u16 = 0x3A17;
pub const PR_MOBILE_TELEPHONE_NUMBER: u16 = 0x3A1C;
pub const PR_SENDER_EMAIL_ADDRESS: u16 = 0x0C1F;

/// `PidLidEmail1EmailAddress`, a named property of contacts.
pub const LID_EMAIL1_ADDRESS: u32 = 0x8083;

/// `PR_ATTACH_METHOD` value for an attached message.
pub const ATTACH_EMBEDDED_MSG: i64 = 5;

const MV_FLAG: u16 = 0x1000;

// Property types
const PT_I2: u16 = 0x0002;
const PT_LONG: u16 = 0x0003;
const PT_R4: u16 = 0x0004;
const PT_DOUBLE: u16 = 0x0005;
const PT_CURRENCY: u16 = 0x0006;
const PT_APPTIME: u16 = 0x0007;
const PT_ERROR: u16 = 0x000A;
const PT_BOOLEAN: u16 = 0x000B;
const PT_OBJECT: u16 = 0x000D;
const PT_I8: u16 = 0x0014;
const PT_STRING8: u16 = 0x001E;
const PT_UNICODE: u16 = 0x001F;
const PT_SYSTIME: u16 = 0x0040;
const PT_CLSID: u16 = 0x0048;
const PT_BINARY: u16 = 0x0102;

/// Size of the interface identifier which prefixes object values.
const IID_LEN: usize = 16;

#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Int(i64),
    Bool(bool),
    Float(f64),
    /// A `FILETIME` (100ns ticks since 1601) or OLE date, uninterpreted.
    Time(u64),
    Error(u32),
    String(String),
    Binary(Vec<u8>),
    /// An object, without its interface identifier.
    Object(Vec<u8>),
    Guid([u8; 16]),
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match *self {
            PropValue::String(ref s) => Some(s),
            _ => None,
        }
    }

    /// The raw bytes of a binary, object or string value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match *self {
            PropValue::Binary(ref b) | PropValue::Object(ref b) => Some(b),
            PropValue::String(ref s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self {
            PropValue::Int(i) => Some(i),
            _ => None,
        }
    }
}

/// The name of a named property (id 0x8000 and above).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropName {
    Id([u8; 16], u32),
    String([u8; 16], String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub id: u16,
    pub ptype: u16,
    pub name: Option<PropName>,
    /// One value unless the property is multi-valued.
    pub values: Vec<PropValue>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropList(pub Vec<Property>);

impl PropList {
    /// The first value of the property with the given (unnamed) id.
    pub fn get(&self, id: u16) -> Option<&PropValue> {
        self.0
            .iter()
            .find(|p| p.id == id && p.name.is_none())
            .and_then(|p| p.values.first())
    }

    pub fn get_str(&self, id: u16) -> Option<&str> {
        self.get(id).and_then(PropValue::as_str)
    }

    pub fn get_bytes(&self, id: u16) -> Option<&[u8]> {
        self.get(id).and_then(PropValue::as_bytes)
    }

    pub fn get_int(&self, id: u16) -> Option<i64> {
        self.get(id).and_then(PropValue::as_int)
    }

    /// The first value of a named property with the given numeric name,
    /// regardless of its property set.
    pub fn get_named(&self, lid: u32) -> Option<&PropValue> {
        self.0
            .iter()
            .find(|p| match p.name {
                Some(PropName::Id(_, id)) => id == lid,
                _ => false,
            })
            .and_then(|p| p.values.first())
    }

    /// Add the properties of `other`, which take precedence over existing
    /// ones with the same id.
    pub fn merge(&mut self, other: PropList) {
        let mut other = other.0;
        other.append(&mut self.0);
        self.0 = other;
    }
}

fn bad(what: &str) -> Error {
    Error::BadTnef(format!("MAPI properties: {}", what))
}

/// Parse an `attMsgProps` or `attAttachment` attribute payload.
pub fn parse_props(data: &[u8]) -> Result<PropList, Error> {
    let mut r = Cursor::new(data);
    let count = r.read_u32::<LittleEndian>()?;
    let mut props = Vec::new();

    for _ in 0..count {
        props.push(read_property(&mut r)?);
    }

    Ok(PropList(props))
}

fn read_property(r: &mut Cursor<&[u8]>) -> Result<Property, Error> {
    let ptype = r.read_u16::<LittleEndian>()?;
    let id = r.read_u16::<LittleEndian>()?;

    let name = if id >= 0x8000 {
        let mut guid = [0u8; 16];
        r.read_exact(&mut guid)?;
        match r.read_u32::<LittleEndian>()? {
            0 => Some(PropName::Id(guid, r.read_u32::<LittleEndian>()?)),
            1 => {
                let len = r.read_u32::<LittleEndian>()? as usize;
                let raw = read_padded(r, len)?;
                Some(PropName::String(guid, decode_utf16(&raw)))
            },
            _ => return Err(bad("unknown property name kind")),
        }
    } else {
        None
    };

    let base_type = ptype & !MV_FLAG;
    let is_variable = match base_type {
        PT_STRING8 | PT_UNICODE | PT_BINARY | PT_OBJECT => true,
        _ => false,
    };
    let count = if 0 != ptype & MV_FLAG || is_variable {
        r.read_u32::<LittleEndian>()?
    } else {
        1
    };

    // Each value takes at least four bytes, so a larger count is garbage
    let remaining = r.get_ref().len() as u64 - r.position();
    if u64::from(count) * 4 > remaining {
        return Err(bad("value count exceeds data"));
    }

    let mut values = Vec::with_capacity(count as usize);
    for _ in 0..count {
        values.push(read_value(r, base_type)?);
    }

    Ok(Property {
        id,
        ptype,
        name,
        values,
    })
}

fn read_value(r: &mut Cursor<&[u8]>, ptype: u16) -> Result<PropValue, Error> {
    Ok(match ptype {
        PT_I2 => {
            let v = r.read_i16::<LittleEndian>()?;
            r.read_u16::<LittleEndian>()?;
            PropValue::Int(v.into())
        },
        PT_BOOLEAN => {
            let v = r.read_u16::<LittleEndian>()?;
            r.read_u16::<LittleEndian>()?;
            PropValue::Bool(0 != v)
        },
        PT_LONG => PropValue::Int(r.read_i32::<LittleEndian>()?.into()),
        PT_ERROR => PropValue::Error(r.read_u32::<LittleEndian>()?),
        PT_R4 => PropValue::Float(r.read_f32::<LittleEndian>()?.into()),
        PT_DOUBLE | PT_APPTIME => {
            PropValue::Float(r.read_f64::<LittleEndian>()?)
        },
        PT_CURRENCY | PT_I8 => PropValue::Int(r.read_i64::<LittleEndian>()?),
        PT_SYSTIME => PropValue::Time(r.read_u64::<LittleEndian>()?),
        PT_CLSID => {
            let mut guid = [0u8; 16];
            r.read_exact(&mut guid)?;
            PropValue::Guid(guid)
        },
        PT_STRING8 | PT_UNICODE | PT_BINARY | PT_OBJECT => {
            let len = r.read_u32::<LittleEndian>()? as usize;
            let data = read_padded(r, len)?;
            match ptype {
                PT_STRING8 => PropValue::String(decode_string8(&data)),
                PT_UNICODE => PropValue::String(decode_utf16(&data)),
                PT_OBJECT => PropValue::Object(
                    data.get(IID_LEN..).unwrap_or(&[]).to_vec(),
                ),
                _ => PropValue::Binary(data),
            }
        },
        other => {
            return Err(bad(&format!("unsupported property type {:04x}", other)))
        },
    })
}

/// Read `len` bytes followed by padding to a multiple of four.
fn read_padded(r: &mut Cursor<&[u8]>, len: usize) -> Result<Vec<u8>, Error> {
    let remaining = r.get_ref().len() as u64 - r.position();
    if len as u64 > remaining {
        return Err(bad("value length exceeds data"));
    }

    let mut data = vec![0u8; len];
    r.read_exact(&mut data)?;
    let padding = (4 - len % 4) % 4;
    let skip = (padding as u64).min(r.get_ref().len() as u64 - r.position());
    r.set_position(r.position() + skip);
    Ok(data)
}

/// Decode NUL-terminated UTF-16LE.
pub fn decode_utf16(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&u| 0 != u)
        .collect();
    String::from_utf16_lossy(&units)
}

/// Decode a NUL-terminated 8-bit string, whose code page TNEF does not
/// record; Windows-1252 is by far the most common.
pub fn decode_string8(data: &[u8]) -> String {
    let end = memchr::memchr(0, data).unwrap_or_else(|| data.len());
    encoding_rs::WINDOWS_1252.decode(&data[..end]).0.into_owned()
}

#[cfg(test)]
pub(crate) mod test {
    use proptest::prelude::*;

    use super::*;

    /// Builds property lists for tests.
    #[derive(Default)]
    pub struct PropWriter {
        count: u32,
        data: Vec<u8>,
    }

    impl PropWriter {
        fn pad(&mut self) {
            while 0 != self.data.len() % 4 {
                self.data.push(0);
            }
        }

        pub fn long(mut self, id: u16, value: i32) -> Self {
            self.count += 1;
            self.data.extend_from_slice(&PT_LONG.to_le_bytes());
            self.data.extend_from_slice(&id.to_le_bytes());
            self.data.extend_from_slice(&value.to_le_bytes());
            self
        }

        pub fn variable(mut self, id: u16, ptype: u16, value: &[u8]) -> Self {
            self.count += 1;
            self.data.extend_from_slice(&ptype.to_le_bytes());
            self.data.extend_from_slice(&id.to_le_bytes());
            self.data.extend_from_slice(&1u32.to_le_bytes());
            self.data
                .extend_from_slice(&(value.len() as u32).to_le_bytes());
            self.data.extend_from_slice(value);
            self.pad();
            self
        }

        pub fn string8(self, id: u16, value: &str) -> Self {
            let mut bytes = value.as_bytes().to_vec();
            bytes.push(0);
            self.variable(id, PT_STRING8, &bytes)
        }

        pub fn unicode(self, id: u16, value: &str) -> Self {
            let bytes: Vec<u8> = value
                .encode_utf16()
                .chain(std::iter::once(0))
                .flat_map(|u| u.to_le_bytes().to_vec())
                .collect();
            self.variable(id, PT_UNICODE, &bytes)
        }

        pub fn binary(self, id: u16, value: &[u8]) -> Self {
            self.variable(id, PT_BINARY, value)
        }

        pub fn object(self, id: u16, value: &[u8]) -> Self {
            let mut bytes = vec![0xAAu8; IID_LEN];
            bytes.extend_from_slice(value);
            self.variable(id, PT_OBJECT, &bytes)
        }

        pub fn build(self) -> Vec<u8> {
            let mut out = self.count.to_le_bytes().to_vec();
            out.extend(self.data);
            out
        }
    }

    #[test]
    fn parse_simple_props() {
        let data = PropWriter::default()
            .long(PR_ATTACH_METHOD, 5)
            .unicode(PR_ATTACH_LONG_FILENAME, "Résumé.docx")
            .string8(PR_ATTACH_MIME_TAG, "application/msword")
            .binary(PR_RTF_COMPRESSED, b"abcde")
            .object(PR_ATTACH_DATA_OBJ, b"inner")
            .build();

        let props = parse_props(&data).unwrap();
        assert_eq!(Some(5), props.get_int(PR_ATTACH_METHOD));
        assert_eq!(
            Some("Résumé.docx"),
            props.get_str(PR_ATTACH_LONG_FILENAME)
        );
        assert_eq!(
            Some("application/msword"),
            props.get_str(PR_ATTACH_MIME_TAG)
        );
        assert_eq!(Some(&b"abcde"[..]), props.get_bytes(PR_RTF_COMPRESSED));
        assert_eq!(Some(&b"inner"[..]), props.get_bytes(PR_ATTACH_DATA_OBJ));
        assert_eq!(None, props.get(PR_SUBJECT));
    }

    #[test]
    fn parse_named_and_multivalued() {
        let mut data = 2u32.to_le_bytes().to_vec();
        // Named property, string name "Key", PT_LONG
        data.extend_from_slice(&PT_LONG.to_le_bytes());
        data.extend_from_slice(&0x8001u16.to_le_bytes());
        data.extend_from_slice(&[7u8; 16]);
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(b"K\0e\0y\0\0\0");
        data.extend_from_slice(&42i32.to_le_bytes());
        // Multi-valued PT_LONG with two values
        data.extend_from_slice(&(PT_LONG | MV_FLAG).to_le_bytes());
        data.extend_from_slice(&0x6000u16.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&2i32.to_le_bytes());

        let props = parse_props(&data).unwrap();
        assert_eq!(
            Some(PropName::String([7u8; 16], "Key".to_owned())),
            props.0[0].name
        );
        assert_eq!(vec![PropValue::Int(42)], props.0[0].values);
        // Named properties are not found by plain id
        assert_eq!(None, props.get(0x8001));
        assert_eq!(
            vec![PropValue::Int(1), PropValue::Int(2)],
            props.0[1].values
        );
    }

    #[test]
    fn merge_prefers_new() {
        let mut a = parse_props(
            &PropWriter::default().long(PR_ATTACH_METHOD, 1).build(),
        )
        .unwrap();
        a.merge(
            parse_props(
                &PropWriter::default().long(PR_ATTACH_METHOD, 5).build(),
            )
            .unwrap(),
        );
        assert_eq!(Some(5), a.get_int(PR_ATTACH_METHOD));
    }

    #[test]
    fn truncated_props() {
        let data = PropWriter::default()
            .binary(PR_RTF_COMPRESSED, b"abcdefgh")
            .build();
        assert!(parse_props(&data[..data.len() - 6]).is_err());
        assert!(parse_props(&[1, 0, 0, 0, 0x99, 0x99, 0, 0]).is_err());
    }

    proptest! {
        #[test]
        fn parse_props_never_panics(
            data in prop::collection::vec(prop::num::u8::ANY, 0..200)
        ) {
            let _ = parse_props(&data);
        }
    }
}
