//! The reference plain-text codec.
//!
//! ASCII-printable, space-delimited tokens:
//!
//! - integers and floats are textual base-10 with a space terminator, except
//!   single-byte integers (`u8`/`i8`), which are written in lowercase hex.
//!   Peers depend on the hex form; it must not be widened to decimal
//! - booleans are `1` / `0`
//! - strings are quoted, with backslash escapes for `"` and `\`
//! - enumerations are their variant index as an integer
//! - tuples and records encode their elements in declaration order with no
//!   count; sequences and maps are prefixed with their length
//! - the unit value encodes as nothing at all, which is what makes zero-arg
//!   calls and header-only responses fall out of the general rules
//!
//! Decoding is strictly non-self-describing: the reader is driven by the
//! target type and fails with [`CodecError::Malformed`] when the input does
//! not match the expected shape.

use std::fmt;
use std::io::Write as _;
use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;

use serde::de::value::U32Deserializer;
use serde::de::{self, DeserializeOwned, Visitor};
use serde::ser::{self, Serialize};

use crate::error::CodecError;
use crate::frame::Buffer;

/// The reference plain-text codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl crate::codec::Codec for PlainText {
    type Serializer = PlainTextSerializer;
    type Deserializer = PlainTextDeserializer;

    fn serializer(&self) -> PlainTextSerializer {
        PlainTextSerializer { out: Vec::new() }
    }

    fn deserializer(&self, buffer: Buffer) -> PlainTextDeserializer {
        PlainTextDeserializer { buf: buffer, pos: 0 }
    }
}

/// Accumulates space-delimited tokens into a buffer.
pub struct PlainTextSerializer {
    out: Vec<u8>,
}

impl crate::codec::Serializer for PlainTextSerializer {
    fn pack<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, CodecError> {
        value.serialize(&mut Encoder {
            out: &mut self.out,
        })?;
        Ok(self)
    }

    fn into_buffer(self) -> Buffer {
        self.out
    }
}

struct Encoder<'a> {
    out: &'a mut Vec<u8>,
}

impl Encoder<'_> {
    fn put_display(&mut self, value: impl fmt::Display) {
        // Writing into a Vec cannot fail.
        let _ = write!(self.out, "{value} ");
    }

    fn put_hex(&mut self, value: u8) {
        let _ = write!(self.out, "{value:x} ");
    }

    fn put_quoted(&mut self, value: &str) {
        self.out.push(b'"');
        for byte in value.bytes() {
            if byte == b'"' || byte == b'\\' {
                self.out.push(b'\\');
            }
            self.out.push(byte);
        }
        self.out.extend_from_slice(b"\" ");
    }
}

impl<'a, 'b> ser::Serializer for &'a mut Encoder<'b> {
    type Ok = ();
    type Error = CodecError;

    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, v: bool) -> Result<(), CodecError> {
        self.put_display(u8::from(v));
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Result<(), CodecError> {
        // Single-byte integers travel as hex; see the module docs.
        self.put_hex(v as u8);
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<(), CodecError> {
        self.put_hex(v);
        Ok(())
    }

    fn serialize_i16(self, v: i16) -> Result<(), CodecError> {
        self.put_display(v);
        Ok(())
    }

    fn serialize_i32(self, v: i32) -> Result<(), CodecError> {
        self.put_display(v);
        Ok(())
    }

    fn serialize_i64(self, v: i64) -> Result<(), CodecError> {
        self.put_display(v);
        Ok(())
    }

    fn serialize_i128(self, v: i128) -> Result<(), CodecError> {
        self.put_display(v);
        Ok(())
    }

    fn serialize_u16(self, v: u16) -> Result<(), CodecError> {
        self.put_display(v);
        Ok(())
    }

    fn serialize_u32(self, v: u32) -> Result<(), CodecError> {
        self.put_display(v);
        Ok(())
    }

    fn serialize_u64(self, v: u64) -> Result<(), CodecError> {
        self.put_display(v);
        Ok(())
    }

    fn serialize_u128(self, v: u128) -> Result<(), CodecError> {
        self.put_display(v);
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<(), CodecError> {
        self.put_display(v);
        Ok(())
    }

    fn serialize_f64(self, v: f64) -> Result<(), CodecError> {
        self.put_display(v);
        Ok(())
    }

    fn serialize_char(self, v: char) -> Result<(), CodecError> {
        let mut utf8 = [0u8; 4];
        self.put_quoted(v.encode_utf8(&mut utf8));
        Ok(())
    }

    fn serialize_str(self, v: &str) -> Result<(), CodecError> {
        self.put_quoted(v);
        Ok(())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<(), CodecError> {
        self.put_display(v.len());
        for byte in v {
            self.put_hex(*byte);
        }
        Ok(())
    }

    fn serialize_none(self) -> Result<(), CodecError> {
        self.put_display(0u8);
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), CodecError> {
        self.put_display(1u8);
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), CodecError> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), CodecError> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
    ) -> Result<(), CodecError> {
        self.put_display(variant_index);
        Ok(())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), CodecError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<(), CodecError> {
        self.put_display(variant_index);
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self, CodecError> {
        let len = len.ok_or_else(|| {
            CodecError::Malformed("sequences must know their length up front".into())
        })?;
        self.put_display(len);
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self, CodecError> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self, CodecError> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, CodecError> {
        self.put_display(variant_index);
        Ok(self)
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self, CodecError> {
        let len = len.ok_or_else(|| {
            CodecError::Malformed("maps must know their length up front".into())
        })?;
        self.put_display(len);
        Ok(self)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self, CodecError> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, CodecError> {
        self.put_display(variant_index);
        Ok(self)
    }
}

impl<'a, 'b> ser::SerializeSeq for &'a mut Encoder<'b> {
    type Ok = ();
    type Error = CodecError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CodecError> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), CodecError> {
        Ok(())
    }
}

impl<'a, 'b> ser::SerializeTuple for &'a mut Encoder<'b> {
    type Ok = ();
    type Error = CodecError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CodecError> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), CodecError> {
        Ok(())
    }
}

impl<'a, 'b> ser::SerializeTupleStruct for &'a mut Encoder<'b> {
    type Ok = ();
    type Error = CodecError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CodecError> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), CodecError> {
        Ok(())
    }
}

impl<'a, 'b> ser::SerializeTupleVariant for &'a mut Encoder<'b> {
    type Ok = ();
    type Error = CodecError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CodecError> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), CodecError> {
        Ok(())
    }
}

impl<'a, 'b> ser::SerializeMap for &'a mut Encoder<'b> {
    type Ok = ();
    type Error = CodecError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), CodecError> {
        key.serialize(&mut **self)
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CodecError> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), CodecError> {
        Ok(())
    }
}

impl<'a, 'b> ser::SerializeStruct for &'a mut Encoder<'b> {
    type Ok = ();
    type Error = CodecError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), CodecError> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), CodecError> {
        Ok(())
    }
}

impl<'a, 'b> ser::SerializeStructVariant for &'a mut Encoder<'b> {
    type Ok = ();
    type Error = CodecError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), CodecError> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), CodecError> {
        Ok(())
    }
}

/// Stateful reader over a plain-text buffer.
pub struct PlainTextDeserializer {
    buf: Vec<u8>,
    pos: usize,
}

impl crate::codec::Deserializer for PlainTextDeserializer {
    fn unpack<T: DeserializeOwned>(&mut self) -> Result<T, CodecError> {
        T::deserialize(&mut *self)
    }
}

impl PlainTextDeserializer {
    fn skip_whitespace(&mut self) {
        while self
            .buf
            .get(self.pos)
            .is_some_and(|byte| byte.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    fn token(&mut self) -> Result<&str, CodecError> {
        self.skip_whitespace();
        if self.pos >= self.buf.len() {
            return Err(CodecError::Truncated);
        }
        let start = self.pos;
        while self
            .buf
            .get(self.pos)
            .is_some_and(|byte| !byte.is_ascii_whitespace())
        {
            self.pos += 1;
        }
        std::str::from_utf8(&self.buf[start..self.pos])
            .map_err(|_| CodecError::Malformed("token is not valid UTF-8".into()))
    }

    fn parse_int<T>(&mut self) -> Result<T, CodecError>
    where
        T: FromStr<Err = ParseIntError>,
    {
        let token = self.token()?;
        token.parse::<T>().map_err(|error| int_error(token, &error))
    }

    /// Single-byte integers travel as hex. The reference peer writes them
    /// through a 16-bit cast, so anything up to four hex digits is accepted
    /// and truncated to the low byte.
    fn parse_hex_byte(&mut self) -> Result<u8, CodecError> {
        let token = self.token()?;
        match u16::from_str_radix(token, 16) {
            Ok(value) => Ok(value as u8),
            Err(error) => Err(int_error(token, &error)),
        }
    }

    fn parse_f64(&mut self) -> Result<f64, CodecError> {
        let token = self.token()?;
        token
            .parse::<f64>()
            .map_err(|_| CodecError::Malformed(format!("expected a number, found {token:?}")))
    }

    fn parse_bool(&mut self) -> Result<bool, CodecError> {
        match self.token()? {
            "1" => Ok(true),
            "0" => Ok(false),
            other => Err(CodecError::Malformed(format!(
                "expected 0 or 1, found {other:?}"
            ))),
        }
    }

    fn parse_quoted(&mut self) -> Result<String, CodecError> {
        self.skip_whitespace();
        match self.buf.get(self.pos) {
            None => return Err(CodecError::Truncated),
            Some(b'"') => self.pos += 1,
            Some(&other) => {
                return Err(CodecError::Malformed(format!(
                    "expected an opening quote, found {:?}",
                    other as char
                )))
            }
        }
        let mut raw = Vec::new();
        loop {
            let Some(&byte) = self.buf.get(self.pos) else {
                return Err(CodecError::Truncated);
            };
            self.pos += 1;
            match byte {
                b'"' => break,
                b'\\' => {
                    let Some(&escaped) = self.buf.get(self.pos) else {
                        return Err(CodecError::Truncated);
                    };
                    self.pos += 1;
                    raw.push(escaped);
                }
                _ => raw.push(byte),
            }
        }
        String::from_utf8(raw)
            .map_err(|_| CodecError::Malformed("string is not valid UTF-8".into()))
    }
}

fn int_error(token: &str, error: &ParseIntError) -> CodecError {
    match error.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            CodecError::OutOfRange(format!("integer {token} does not fit the target type"))
        }
        _ => CodecError::Malformed(format!("expected an integer, found {token:?}")),
    }
}

impl<'de, 'a> de::Deserializer<'de> for &'a mut PlainTextDeserializer {
    type Error = CodecError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, CodecError> {
        Err(CodecError::Malformed(
            "plain text is not self-describing".into(),
        ))
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_bool(self.parse_bool()?)
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_i8(self.parse_hex_byte()? as i8)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_u8(self.parse_hex_byte()?)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_i16(self.parse_int()?)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_i32(self.parse_int()?)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_i64(self.parse_int()?)
    }

    fn deserialize_i128<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_i128(self.parse_int()?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_u16(self.parse_int()?)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_u32(self.parse_int()?)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_u64(self.parse_int()?)
    }

    fn deserialize_u128<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_u128(self.parse_int()?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_f32(self.parse_f64()? as f32)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_f64(self.parse_f64()?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        let text = self.parse_quoted()?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(value), None) => visitor.visit_char(value),
            _ => Err(CodecError::Malformed(format!(
                "expected a single character, found {text:?}"
            ))),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_string(self.parse_quoted()?)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_string(self.parse_quoted()?)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        let len: u64 = self.parse_int()?;
        let mut bytes = Vec::new();
        for _ in 0..len {
            bytes.push(self.parse_hex_byte()?);
        }
        visitor.visit_byte_buf(bytes)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        if self.parse_bool()? {
            visitor.visit_some(self)
        } else {
            visitor.visit_none()
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        let len: u64 = self.parse_int()?;
        visitor.visit_seq(CountedAccess {
            de: self,
            remaining: len as usize,
        })
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        visitor.visit_seq(CountedAccess {
            de: self,
            remaining: len,
        })
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        visitor.visit_seq(CountedAccess {
            de: self,
            remaining: len,
        })
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        let len: u64 = self.parse_int()?;
        visitor.visit_map(CountedAccess {
            de: self,
            remaining: len as usize,
        })
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        // Records are reflected to their field tuple.
        visitor.visit_seq(CountedAccess {
            de: self,
            remaining: fields.len(),
        })
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        visitor.visit_enum(EnumDecoder { de: self })
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, CodecError> {
        Err(CodecError::Malformed(
            "plain text does not carry identifiers".into(),
        ))
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, CodecError> {
        Err(CodecError::Malformed(
            "plain text is not self-describing".into(),
        ))
    }
}

struct CountedAccess<'a> {
    de: &'a mut PlainTextDeserializer,
    remaining: usize,
}

impl<'de, 'a> de::SeqAccess<'de> for CountedAccess<'a> {
    type Error = CodecError;

    fn next_element_seed<T: de::DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, CodecError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

impl<'de, 'a> de::MapAccess<'de> for CountedAccess<'a> {
    type Error = CodecError;

    fn next_key_seed<K: de::DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, CodecError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn next_value_seed<V: de::DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, CodecError> {
        seed.deserialize(&mut *self.de)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

struct EnumDecoder<'a> {
    de: &'a mut PlainTextDeserializer,
}

impl<'de, 'a> de::EnumAccess<'de> for EnumDecoder<'a> {
    type Error = CodecError;
    type Variant = Self;

    fn variant_seed<V: de::DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, Self), CodecError> {
        let index: u32 = self.de.parse_int()?;
        let value = seed.deserialize(U32Deserializer::<CodecError>::new(index))?;
        Ok((value, self))
    }
}

impl<'de, 'a> de::VariantAccess<'de> for EnumDecoder<'a> {
    type Error = CodecError;

    fn unit_variant(self) -> Result<(), CodecError> {
        Ok(())
    }

    fn newtype_variant_seed<T: de::DeserializeSeed<'de>>(
        self,
        seed: T,
    ) -> Result<T::Value, CodecError> {
        seed.deserialize(self.de)
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_seq(CountedAccess {
            de: self.de,
            remaining: len,
        })
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        visitor.visit_seq(CountedAccess {
            de: self.de,
            remaining: fields.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Serialize};

    use super::PlainText;
    use crate::codec::{Codec, Deserializer as _, Serializer as _};
    use crate::error::CodecError;

    fn encode<T: Serialize>(value: &T) -> Vec<u8> {
        PlainText
            .serializer()
            .pack(value)
            .unwrap()
            .into_buffer()
    }

    fn decode<T: serde::de::DeserializeOwned>(buffer: &[u8]) -> Result<T, CodecError> {
        PlainText.deserializer(buffer.to_vec()).unpack()
    }

    fn round_trip<T>(value: T)
    where
        T: Serialize + serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let buffer = encode(&value);
        let decoded: T = decode(&buffer).unwrap();
        assert_eq!(decoded, value, "buffer was {:?}", String::from_utf8_lossy(&buffer));
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Employee {
        name: String,
        age: u32,
        email: String,
        skills: Vec<String>,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    enum Color {
        Red,
        Green,
        Blue,
    }

    fn sample_employee() -> Employee {
        Employee {
            name: "Kirk".into(),
            age: 33,
            email: "kirk@enterprise.example".into(),
            skills: vec!["command".into(), "diplomacy".into()],
        }
    }

    #[test]
    fn integers_are_decimal_with_space_terminator() {
        assert_eq!(encode(&42u32), b"42 ");
        assert_eq!(encode(&-7i64), b"-7 ");
    }

    #[test]
    fn single_byte_integers_are_hex() {
        assert_eq!(encode(&255u8), b"ff ");
        assert_eq!(encode(&0u8), b"0 ");
        assert_eq!(encode(&-1i8), b"ff ");
    }

    #[test]
    fn booleans_are_numeric() {
        assert_eq!(encode(&true), b"1 ");
        assert_eq!(encode(&false), b"0 ");
        round_trip(true);
        round_trip(false);
    }

    #[test]
    fn strings_are_quoted_and_escaped() {
        assert_eq!(encode(&"plain"), b"\"plain\" ");
        assert_eq!(encode(&r#"say "hi" \now"#), br#""say \"hi\" \\now" "#);
        round_trip(String::from(r#"say "hi" \now"#));
    }

    #[test]
    fn empty_string_round_trips() {
        assert_eq!(encode(&""), b"\"\" ");
        round_trip(String::new());
    }

    #[test]
    fn chars_round_trip() {
        round_trip('x');
        round_trip('"');
        round_trip('λ');
    }

    #[test]
    fn numeric_round_trips() {
        round_trip(u64::MAX);
        round_trip(i64::MIN);
        round_trip(u8::MAX);
        round_trip(i8::MIN);
        round_trip(0.1f64);
        round_trip(-3.25e300f64);
        round_trip(1.5f32);
    }

    #[test]
    fn enums_encode_their_variant_index() {
        assert_eq!(encode(&Color::Green), b"1 ");
        round_trip(Color::Blue);
    }

    #[test]
    fn options_carry_a_presence_flag() {
        assert_eq!(encode(&Option::<u32>::None), b"0 ");
        assert_eq!(encode(&Some(5u32)), b"1 5 ");
        round_trip(Some("x".to_string()));
        round_trip(Option::<u32>::None);
    }

    #[test]
    fn sequences_are_length_prefixed() {
        assert_eq!(encode(&vec![1u32, 2, 3]), b"3 1 2 3 ");
        round_trip(Vec::<u32>::new());
        round_trip(vec!["a".to_string(), "".to_string(), "c".to_string()]);
    }

    #[test]
    fn maps_encode_as_pair_sequences() {
        let mut map = BTreeMap::new();
        map.insert("one".to_string(), 1u32);
        map.insert("two".to_string(), 2u32);
        assert_eq!(encode(&map), b"2 \"one\" 1 \"two\" 2 ");
        round_trip(map);
    }

    #[test]
    fn tuples_have_no_count() {
        assert_eq!(encode(&(7u32, "x")), b"7 \"x\" ");
        round_trip((1u16, "two".to_string(), 3.5f64));
    }

    #[test]
    fn records_decompose_to_field_tuples() {
        let employee = sample_employee();
        let buffer = encode(&employee);
        assert_eq!(
            buffer,
            b"\"Kirk\" 33 \"kirk@enterprise.example\" 2 \"command\" \"diplomacy\" ".to_vec()
        );
        round_trip(employee);
    }

    #[test]
    fn nested_records_round_trip() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Team {
            lead: Employee,
            members: Vec<Employee>,
            tags: BTreeMap<String, Color>,
        }

        let mut tags = BTreeMap::new();
        tags.insert("shirt".to_string(), Color::Red);
        round_trip(Team {
            lead: sample_employee(),
            members: vec![sample_employee(), sample_employee()],
            tags,
        });
    }

    #[test]
    fn wide_records_round_trip() {
        // Matches the reference implementation's maximum reflected arity.
        #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
        struct Wide {
            f00: u8, f01: u8, f02: u8, f03: u8, f04: u8, f05: u8, f06: u8, f07: u8,
            f08: u8, f09: u8, f10: u8, f11: u8, f12: u8, f13: u8, f14: u8, f15: u8,
            f16: u8, f17: u8, f18: u8, f19: u8, f20: u8, f21: u8, f22: u8, f23: u8,
            f24: u8, f25: u8, f26: u8, f27: u8, f28: u8, f29: u8, f30: u8, f31: u8,
            f32: u8, f33: u8, f34: u8, f35: u8, f36: u8, f37: u8, f38: u8, f39: u8,
            f40: u8, f41: u8, f42: u8, f43: u8, f44: u8, f45: u8, f46: u8, f47: u8,
            f48: u8, f49: u8, f50: u8, f51: u8, f52: u8, f53: u8, f54: u8, f55: u8,
            f56: u8, f57: u8, f58: u8, f59: u8, f60: u8, f61: u8, f62: u8, f63: u8,
        }

        round_trip(Wide {
            f00: 1,
            f31: 0xab,
            f63: 0xff,
            ..Wide::default()
        });
    }

    #[test]
    fn unit_encodes_as_nothing() {
        assert_eq!(encode(&()), b"");
        decode::<()>(b"").unwrap();
    }

    #[test]
    fn concatenated_values_decode_in_order() {
        // Packing a tuple then a value equals packing the value preceded by
        // the tuple: one stateful reader consumes both.
        let buffer = PlainText
            .serializer()
            .pack(&(1u32, 99u64))
            .unwrap()
            .pack(&"payload")
            .unwrap()
            .into_buffer();

        let mut reader = PlainText.deserializer(buffer);
        let head: (u32, u64) = reader.unpack().unwrap();
        let tail: String = reader.unpack().unwrap();
        assert_eq!(head, (1, 99));
        assert_eq!(tail, "payload");
    }

    #[test]
    fn empty_stream_mid_decode_is_truncated() {
        assert!(matches!(decode::<u32>(b""), Err(CodecError::Truncated)));
        assert!(matches!(
            decode::<(u32, u32)>(b"1 "),
            Err(CodecError::Truncated)
        ));
        assert!(matches!(
            decode::<String>(b"\"unterminated"),
            Err(CodecError::Truncated)
        ));
        assert!(matches!(
            decode::<Vec<u32>>(b"3 1 2 "),
            Err(CodecError::Truncated)
        ));
    }

    #[test]
    fn mismatched_leading_bytes_are_malformed() {
        assert!(matches!(
            decode::<u32>(b"abc "),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(
            decode::<String>(b"unquoted "),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(
            decode::<bool>(b"2 "),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn numeric_overflow_is_out_of_range() {
        assert!(matches!(
            decode::<u16>(b"70000 "),
            Err(CodecError::OutOfRange(_))
        ));
        assert!(matches!(
            decode::<i16>(b"-40000 "),
            Err(CodecError::OutOfRange(_))
        ));
    }
}
