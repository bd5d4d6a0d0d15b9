//! # Byte Buffers
//!
//! Typed append / cursor-read primitives every message is built from.
//!
//! ## Wire Shapes
//!
//! ```text
//! string   │ len u32 BE │ utf-8 bytes │
//! number   │ f64 BE (8)                │
//! boolean  │ 0xFF = true, else false   │
//! array    │ count u16 BE │ (tag u8 │ len u32 BE │ body) × count │
//! table    │ count u32 BE │ (id u32 BE │ len u32 BE │ key) × count │
//! object   │ count u16 BE │ (key string │ tag u8 │ value) × count │
//! ```
//!
//! Array bodies are the bare primitive (a string body has no inner length,
//! the frame length is its byte count). Object values carry their own
//! length where needed.

use sandlink_shared::{BOOL_TRUE, MAX_ARRAY_LEN};

use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};

/// Element tag: boolean.
pub const TAG_BOOL: u8 = 0;
/// Element tag: number.
pub const TAG_NUMBER: u8 = 1;
/// Element tag: string.
pub const TAG_STRING: u8 = 2;
/// Element tag: raw sub-buffer.
pub const TAG_BUFFER: u8 = 3;

/// A self-describing value as carried by arrays and objects.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Number.
    Number(f64),
    /// UTF-8 string.
    String(String),
    /// Raw sub-buffer.
    Buffer(Vec<u8>),
}

impl Value {
    /// Wire tag.
    #[must_use]
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Bool(_) => TAG_BOOL,
            Self::Number(_) => TAG_NUMBER,
            Self::String(_) => TAG_STRING,
            Self::Buffer(_) => TAG_BUFFER,
        }
    }

    /// Byte length of the bare body.
    #[must_use]
    pub fn body_len(&self) -> usize {
        match self {
            Self::Bool(_) => 1,
            Self::Number(_) => 8,
            Self::String(s) => s.len(),
            Self::Buffer(b) => b.len(),
        }
    }

    /// Returns the number, if this is one.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean, if this is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Human name of a tag, for error messages.
#[must_use]
pub const fn tag_name(tag: u8) -> &'static str {
    match tag {
        TAG_BOOL => "boolean",
        TAG_NUMBER => "number",
        TAG_STRING => "string",
        TAG_BUFFER => "buffer",
        _ => "unknown",
    }
}

fn check_count(len: usize) -> EncodeResult<()> {
    if len > MAX_ARRAY_LEN {
        return Err(EncodeError::ArrayTooLong { len, max: MAX_ARRAY_LEN });
    }
    Ok(())
}

fn check_string(s: &str) -> EncodeResult<()> {
    if u32::try_from(s.len()).is_err() {
        return Err(EncodeError::StringTooLong(s.len()));
    }
    Ok(())
}

fn check_buffer(b: &[u8]) -> EncodeResult<()> {
    if u32::try_from(b.len()).is_err() {
        return Err(EncodeError::BufferTooLong(b.len()));
    }
    Ok(())
}

/// Append-only builder. Every fallible write validates before touching the
/// buffer, so a failed write leaves it unchanged.
#[derive(Clone, Debug, Default)]
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    /// Creates an empty writer.
    #[must_use]
    pub const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Creates a writer with preallocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buffer: Vec::with_capacity(capacity) }
    }

    /// Clears the buffer, keeping its allocation.
    #[inline]
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Bytes written so far.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing was written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Written bytes.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Writes a u16 in big-endian format.
    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a u32 in big-endian format.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes bytes verbatim.
    #[inline]
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes an 8-byte big-endian double.
    #[inline]
    pub fn write_number(&mut self, value: f64) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a 1-byte boolean.
    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(if value { BOOL_TRUE } else { 0x00 });
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> EncodeResult<()> {
        check_string(value)?;
        self.write_u32(value.len() as u32);
        self.write_raw(value.as_bytes());
        Ok(())
    }

    /// Writes a u32-length-prefixed raw buffer.
    pub fn write_buffer(&mut self, value: &[u8]) -> EncodeResult<()> {
        check_buffer(value)?;
        self.write_u32(value.len() as u32);
        self.write_raw(value);
        Ok(())
    }

    fn write_frame(&mut self, tag: u8, body: &[u8]) {
        self.write_u8(tag);
        self.write_u32(body.len() as u32);
        self.write_raw(body);
    }

    fn write_value_frame(&mut self, value: &Value) {
        match value {
            Value::Bool(b) => self.write_frame(TAG_BOOL, &[if *b { BOOL_TRUE } else { 0x00 }]),
            Value::Number(n) => self.write_frame(TAG_NUMBER, &n.to_be_bytes()),
            Value::String(s) => self.write_frame(TAG_STRING, s.as_bytes()),
            Value::Buffer(b) => self.write_frame(TAG_BUFFER, b),
        }
    }

    /// Writes a heterogeneous tagged array.
    ///
    /// Fails with [`EncodeError::ArrayTooLong`] past 65535 elements.
    pub fn write_array(&mut self, values: &[Value]) -> EncodeResult<()> {
        check_count(values.len())?;
        for value in values {
            if u32::try_from(value.body_len()).is_err() {
                return Err(EncodeError::BufferTooLong(value.body_len()));
            }
        }
        self.write_u16(values.len() as u16);
        for value in values {
            self.write_value_frame(value);
        }
        Ok(())
    }

    /// Writes an array whose elements are all strings.
    pub fn write_string_array<S: AsRef<str>>(&mut self, values: &[S]) -> EncodeResult<()> {
        check_count(values.len())?;
        for value in values {
            check_string(value.as_ref())?;
        }
        self.write_u16(values.len() as u16);
        for value in values {
            self.write_frame(TAG_STRING, value.as_ref().as_bytes());
        }
        Ok(())
    }

    /// Writes an array of raw sub-buffers (every tag is 3).
    pub fn write_buffer_array<B: AsRef<[u8]>>(&mut self, buffers: &[B]) -> EncodeResult<()> {
        check_count(buffers.len())?;
        for buffer in buffers {
            check_buffer(buffer.as_ref())?;
        }
        self.write_u16(buffers.len() as u16);
        for buffer in buffers {
            self.write_frame(TAG_BUFFER, buffer.as_ref());
        }
        Ok(())
    }

    /// Writes a static lookup table of `(id, key)` pairs.
    pub fn write_enum_table(&mut self, entries: &[(u32, &str)]) -> EncodeResult<()> {
        if u32::try_from(entries.len()).is_err() {
            return Err(EncodeError::ArrayTooLong { len: entries.len(), max: u32::MAX as usize });
        }
        for (_, key) in entries {
            check_string(key)?;
        }
        self.write_u32(entries.len() as u32);
        for (id, key) in entries {
            self.write_u32(*id);
            self.write_u32(key.len() as u32);
            self.write_raw(key.as_bytes());
        }
        Ok(())
    }

    /// Writes a keyed object: count, then `(key, tag, value)` per entry.
    pub fn write_object(&mut self, entries: &[(String, Value)]) -> EncodeResult<()> {
        check_count(entries.len())?;
        for (key, value) in entries {
            check_string(key)?;
            match value {
                Value::String(s) => check_string(s)?,
                Value::Buffer(b) => check_buffer(b)?,
                Value::Bool(_) | Value::Number(_) => {}
            }
        }
        self.write_u16(entries.len() as u16);
        for (key, value) in entries {
            self.write_string(key)?;
            self.write_u8(value.tag());
            match value {
                Value::Bool(b) => self.write_bool(*b),
                Value::Number(n) => self.write_number(*n),
                Value::String(s) => self.write_string(s)?,
                Value::Buffer(b) => self.write_buffer(b)?,
            }
        }
        Ok(())
    }
}

/// Cursor over a received buffer. Moves forward only, except for
/// [`ByteReader::back_up`].
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader at offset 0.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Current offset.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Returns the number of bytes remaining.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Returns true once the cursor reached the end.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Moves the cursor back by `n` bytes (clamped at 0).
    #[inline]
    pub fn back_up(&mut self, n: usize) {
        self.position = self.position.saturating_sub(n);
    }

    fn take(&mut self, n: usize) -> DecodeResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(DecodeError::UnexpectedEof {
                offset: self.position,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buffer[self.position..self.position + n];
        self.position += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// Reads a big-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> DecodeResult<u16> {
        self.take_array().map(u16::from_be_bytes)
    }

    /// Reads a big-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        self.take_array().map(u32::from_be_bytes)
    }

    /// Reads `n` bytes verbatim.
    #[inline]
    pub fn read_raw(&mut self, n: usize) -> DecodeResult<&'a [u8]> {
        self.take(n)
    }

    /// Reads an 8-byte big-endian double.
    #[inline]
    pub fn read_number(&mut self) -> DecodeResult<f64> {
        self.take_array().map(f64::from_be_bytes)
    }

    /// Reads a 1-byte boolean (`0xFF` is true).
    #[inline]
    pub fn read_bool(&mut self) -> DecodeResult<bool> {
        Ok(self.read_u8()? == BOOL_TRUE)
    }

    fn utf8(bytes: &[u8], offset: usize) -> DecodeResult<String> {
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8(offset))
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> DecodeResult<String> {
        let len = self.read_u32()? as usize;
        let offset = self.position;
        let bytes = self.take(len)?;
        Self::utf8(bytes, offset)
    }

    /// Reads a u32-length-prefixed raw buffer.
    pub fn read_buffer(&mut self) -> DecodeResult<&'a [u8]> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }

    fn read_frame(&mut self) -> DecodeResult<(u8, usize, &'a [u8])> {
        let tag = self.read_u8()?;
        let len = self.read_u32()? as usize;
        let offset = self.position;
        let body = self.take(len)?;
        Ok((tag, offset, body))
    }

    fn frame_value(tag: u8, offset: usize, body: &[u8]) -> DecodeResult<Value> {
        let expect = |expected: usize| {
            if body.len() == expected {
                Ok(())
            } else {
                Err(DecodeError::LengthMismatch { declared: body.len(), expected })
            }
        };
        match tag {
            TAG_BOOL => {
                expect(1)?;
                Ok(Value::Bool(body[0] == BOOL_TRUE))
            }
            TAG_NUMBER => {
                expect(8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(body);
                Ok(Value::Number(f64::from_be_bytes(raw)))
            }
            TAG_STRING => Self::utf8(body, offset).map(Value::String),
            TAG_BUFFER => Ok(Value::Buffer(body.to_vec())),
            other => Err(DecodeError::UnknownValueTag(other)),
        }
    }

    /// Reads a heterogeneous tagged array.
    pub fn read_array(&mut self) -> DecodeResult<Vec<Value>> {
        let count = self.read_u16()? as usize;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            let (tag, offset, body) = self.read_frame()?;
            values.push(Self::frame_value(tag, offset, body)?);
        }
        Ok(values)
    }

    /// Reads an array whose elements must all be strings.
    pub fn read_string_array(&mut self) -> DecodeResult<Vec<String>> {
        let count = self.read_u16()? as usize;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            let (tag, offset, body) = self.read_frame()?;
            if tag != TAG_STRING {
                return Err(DecodeError::UnexpectedValueKind {
                    expected: "string",
                    found: tag_name(tag),
                });
            }
            values.push(Self::utf8(body, offset)?);
        }
        Ok(values)
    }

    /// Reads an array of raw sub-buffers, borrowing from the input.
    pub fn read_buffer_array(&mut self) -> DecodeResult<Vec<&'a [u8]>> {
        let count = self.read_u16()? as usize;
        let mut buffers = Vec::with_capacity(count);
        for _ in 0..count {
            let (tag, _, body) = self.read_frame()?;
            if tag != TAG_BUFFER {
                return Err(DecodeError::UnexpectedValueKind {
                    expected: "buffer",
                    found: tag_name(tag),
                });
            }
            buffers.push(body);
        }
        Ok(buffers)
    }

    /// Reads a static lookup table of `(id, key)` pairs.
    pub fn read_enum_table(&mut self) -> DecodeResult<Vec<(u32, String)>> {
        let count = self.read_u32()? as usize;
        // Each entry is at least 8 bytes; don't trust the count for capacity.
        let mut entries = Vec::with_capacity(count.min(self.remaining() / 8));
        for _ in 0..count {
            let id = self.read_u32()?;
            let key = self.read_string()?;
            entries.push((id, key));
        }
        Ok(entries)
    }

    /// Reads a keyed object.
    pub fn read_object(&mut self) -> DecodeResult<Vec<(String, Value)>> {
        let count = self.read_u16()? as usize;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let key = self.read_string()?;
            let value = match self.read_u8()? {
                TAG_BOOL => Value::Bool(self.read_bool()?),
                TAG_NUMBER => Value::Number(self.read_number()?),
                TAG_STRING => Value::String(self.read_string()?),
                TAG_BUFFER => Value::Buffer(self.read_buffer()?.to_vec()),
                other => return Err(DecodeError::UnknownValueTag(other)),
            };
            entries.push((key, value));
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_wire_shape() {
        let mut writer = ByteWriter::new();
        writer.write_string("hé").unwrap();
        assert_eq!(writer.as_slice(), &[0, 0, 0, 3, b'h', 0xC3, 0xA9]);

        let mut reader = ByteReader::new(writer.as_slice());
        assert_eq!(reader.read_string().unwrap(), "hé");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_number_is_big_endian_double() {
        let mut writer = ByteWriter::new();
        writer.write_number(1.0);
        assert_eq!(writer.as_slice(), &[0x3F, 0xF0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(ByteReader::new(writer.as_slice()).read_number().unwrap(), 1.0);
    }

    #[test]
    fn test_bool_encoding() {
        let mut writer = ByteWriter::new();
        writer.write_bool(true);
        writer.write_bool(false);
        assert_eq!(writer.as_slice(), &[0xFF, 0x00]);

        let mut reader = ByteReader::new(&[0xFF, 0x00, 0x01]);
        assert!(reader.read_bool().unwrap());
        assert!(!reader.read_bool().unwrap());
        // Only 0xFF is true.
        assert!(!reader.read_bool().unwrap());
    }

    #[test]
    fn test_array_round_trip() {
        let values = vec![
            Value::Bool(true),
            Value::Number(-2.5),
            Value::String("sand".into()),
            Value::Buffer(vec![1, 2, 3]),
        ];
        let mut writer = ByteWriter::new();
        writer.write_array(&values).unwrap();

        // count, then first frame: tag 0, len 1, 0xFF
        assert_eq!(&writer.as_slice()[..8], &[0, 4, 0, 0, 0, 0, 1, 0xFF]);

        let mut reader = ByteReader::new(writer.as_slice());
        assert_eq!(reader.read_array().unwrap(), values);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_array_overflow_writes_nothing() {
        let mut writer = ByteWriter::new();
        writer.write_u8(7);
        let values = vec![Value::Bool(false); MAX_ARRAY_LEN + 1];
        let err = writer.write_array(&values).unwrap_err();
        assert_eq!(err, EncodeError::ArrayTooLong { len: MAX_ARRAY_LEN + 1, max: MAX_ARRAY_LEN });
        assert_eq!(writer.as_slice(), &[7]);

        let buffers = vec![[0u8; 0]; MAX_ARRAY_LEN + 1];
        assert!(writer.write_buffer_array(&buffers).is_err());
        assert_eq!(writer.len(), 1);
    }

    #[test]
    fn test_array_at_limit_is_accepted() {
        let mut writer = ByteWriter::new();
        let strings = vec![""; MAX_ARRAY_LEN];
        writer.write_string_array(&strings).unwrap();
        let mut reader = ByteReader::new(writer.as_slice());
        assert_eq!(reader.read_string_array().unwrap().len(), MAX_ARRAY_LEN);
    }

    #[test]
    fn test_buffer_array_rejects_other_tags() {
        let mut writer = ByteWriter::new();
        writer.write_string_array(&["nope"]).unwrap();
        let err = ByteReader::new(writer.as_slice()).read_buffer_array().unwrap_err();
        assert_eq!(err, DecodeError::UnexpectedValueKind { expected: "buffer", found: "string" });
    }

    #[test]
    fn test_enum_table() {
        let mut writer = ByteWriter::new();
        writer.write_enum_table(&[(3004, "ServerFull"), (3001, "Kicked")]).unwrap();
        assert_eq!(&writer.as_slice()[..4], &[0, 0, 0, 2]);
        let table = ByteReader::new(writer.as_slice()).read_enum_table().unwrap();
        assert_eq!(table, vec![(3004, "ServerFull".to_string()), (3001, "Kicked".to_string())]);
    }

    #[test]
    fn test_object_round_trip() {
        let entries = vec![
            ("temp".to_string(), Value::Number(20.0)),
            ("element".to_string(), Value::String("water".into())),
            ("burning".to_string(), Value::Bool(false)),
            ("raw".to_string(), Value::Buffer(vec![9])),
        ];
        let mut writer = ByteWriter::new();
        writer.write_object(&entries).unwrap();
        let mut reader = ByteReader::new(writer.as_slice());
        assert_eq!(reader.read_object().unwrap(), entries);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_past_end() {
        let mut reader = ByteReader::new(&[0, 0, 0, 5, b'a']);
        let err = reader.read_string().unwrap_err();
        assert_eq!(err, DecodeError::UnexpectedEof { offset: 4, needed: 5, remaining: 1 });
        assert!(ByteReader::new(&[1, 2, 3]).read_number().is_err());
    }

    #[test]
    fn test_bad_frame_length() {
        // number frame declaring 4 bytes
        let bytes = [0, 1, TAG_NUMBER, 0, 0, 0, 4, 1, 2, 3, 4];
        let err = ByteReader::new(&bytes).read_array().unwrap_err();
        assert_eq!(err, DecodeError::LengthMismatch { declared: 4, expected: 8 });
    }

    #[test]
    fn test_back_up() {
        let mut reader = ByteReader::new(&[1, 2]);
        assert_eq!(reader.read_u8().unwrap(), 1);
        reader.back_up(1);
        assert_eq!(reader.position(), 0);
        reader.back_up(5);
        assert_eq!(reader.read_u8().unwrap(), 1);
    }
}
