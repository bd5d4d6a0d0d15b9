//! Placement / tool / delete command bodies.
//!
//! The codec does not filter coordinates. Callers drop occupied cells before
//! building a placement; whatever set arrives here is encoded as-is.

use super::buffer::{ByteReader, ByteWriter};
use crate::error::{DecodeResult, EncodeError, EncodeResult};
use sandlink_shared::MAX_ARRAY_LEN;

/// Grid coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Coord {
    /// Column.
    pub x: f64,
    /// Row.
    pub y: f64,
}

impl Coord {
    /// Creates a coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Place an element over a set of cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaceCommand {
    /// Element name.
    pub element: String,
    /// Overwrite occupied cells.
    pub replace: bool,
    /// Target cells.
    pub coords: Vec<Coord>,
}

/// Invoke a tool on a set of cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolCommand {
    /// Tool name.
    pub tool: String,
    /// Target cells.
    pub coords: Vec<Coord>,
}

/// Writes coordinates as a buffer array of `(x, y)` sub-buffers.
pub fn write_coords(writer: &mut ByteWriter, coords: &[Coord]) -> EncodeResult<()> {
    if coords.len() > MAX_ARRAY_LEN {
        return Err(EncodeError::ArrayTooLong { len: coords.len(), max: MAX_ARRAY_LEN });
    }
    let pairs: Vec<[u8; 16]> = coords
        .iter()
        .map(|c| {
            let mut pair = [0u8; 16];
            pair[..8].copy_from_slice(&c.x.to_be_bytes());
            pair[8..].copy_from_slice(&c.y.to_be_bytes());
            pair
        })
        .collect();
    writer.write_buffer_array(&pairs)
}

/// Reads coordinates written by [`write_coords`].
pub fn read_coords(reader: &mut ByteReader<'_>) -> DecodeResult<Vec<Coord>> {
    reader
        .read_buffer_array()?
        .into_iter()
        .map(|pair| {
            let mut sub = ByteReader::new(pair);
            Ok(Coord::new(sub.read_number()?, sub.read_number()?))
        })
        .collect()
}

impl PlaceCommand {
    /// Creates a non-replacing placement.
    #[must_use]
    pub fn new(element: impl Into<String>, coords: Vec<Coord>) -> Self {
        Self { element: element.into(), replace: false, coords }
    }

    pub(crate) fn write_to(&self, writer: &mut ByteWriter) -> EncodeResult<()> {
        writer.write_string(&self.element)?;
        writer.write_bool(self.replace);
        write_coords(writer, &self.coords)
    }

    pub(crate) fn read_from(reader: &mut ByteReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            element: reader.read_string()?,
            replace: reader.read_bool()?,
            coords: read_coords(reader)?,
        })
    }
}

impl ToolCommand {
    /// Creates a tool invocation.
    #[must_use]
    pub fn new(tool: impl Into<String>, coords: Vec<Coord>) -> Self {
        Self { tool: tool.into(), coords }
    }

    pub(crate) fn write_to(&self, writer: &mut ByteWriter) -> EncodeResult<()> {
        writer.write_string(&self.tool)?;
        write_coords(writer, &self.coords)
    }

    pub(crate) fn read_from(reader: &mut ByteReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            tool: reader.read_string()?,
            coords: read_coords(reader)?,
        })
    }
}
