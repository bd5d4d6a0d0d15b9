//! # Cell Stream Codec
//!
//! Sparse per-cell property records, packed back-to-back with no outer count
//! and no per-record length.
//!
//! ## Record Layout
//!
//! ```text
//! │ id u8 │ value │ id u8 │ value │ ... │ 0xFF │
//! ```
//!
//! | Kind    | Value bytes                                   |
//! |---------|-----------------------------------------------|
//! | number  | f64 BE (8)                                    |
//! | color   | r, g, b, a (4)                                |
//! | string  | one byte per char: `char << 1 | more`         |
//! | boolean | 0xFF = true                                   |
//!
//! ## Record End
//!
//! A record ends at the first of:
//! - tag `0xFF`
//! - tag `0x00` read as the very last byte of the stream
//! - end of stream
//! - a tag whose property is already set in the record. The cursor backs up
//!   one byte so that tag starts the next record.
//!
//! The last rule is load-bearing for streams without explicit terminators and
//! is kept for wire compatibility. It also means no record can ever carry the
//! same property twice.

use std::fmt;

use sandlink_shared::CELL_END_OF_RECORD;

use super::buffer::{ByteReader, ByteWriter};
use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};

/// Value kind of a cell property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyKind {
    /// 8-byte double.
    Number,
    /// Four bytes, r g b a.
    Color,
    /// 7-bit packed string.
    String,
    /// 1-byte boolean.
    Boolean,
}

/// Fixed property table. The discriminant is the wire id.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellProperty {
    /// Column.
    X = 0,
    /// Row.
    Y = 1,
    /// Fill color.
    Color = 2,
    /// Element name.
    Element = 3,
    /// Temperature.
    Temp = 4,
    /// Electric charge.
    Charge = 5,
    /// On fire.
    Burning = 6,
    /// Element a cloner copies.
    Clone = 7,
    /// Render opacity multiplier.
    Alpha = 8,
}

impl CellProperty {
    /// Every property, in wire id order.
    pub const ALL: [Self; 9] = [
        Self::X,
        Self::Y,
        Self::Color,
        Self::Element,
        Self::Temp,
        Self::Charge,
        Self::Burning,
        Self::Clone,
        Self::Alpha,
    ];

    /// Looks up a wire id.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        if (id as usize) < Self::ALL.len() {
            Some(Self::ALL[id as usize])
        } else {
            None
        }
    }

    /// Wire id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Declared kind.
    #[must_use]
    pub const fn kind(self) -> PropertyKind {
        match self {
            Self::X | Self::Y | Self::Temp | Self::Charge | Self::Alpha => PropertyKind::Number,
            Self::Color => PropertyKind::Color,
            Self::Element | Self::Clone => PropertyKind::String,
            Self::Burning => PropertyKind::Boolean,
        }
    }

    /// Property name as the simulation spells it.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Color => "color",
            Self::Element => "element",
            Self::Temp => "temp",
            Self::Charge => "charge",
            Self::Burning => "burning",
            Self::Clone => "clone",
            Self::Alpha => "alpha",
        }
    }
}

/// Cell fill color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha, 255 = opaque.
    pub a: u8,
}

impl Rgba {
    /// Creates a color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }
}

impl fmt::Display for Rgba {
    /// CSS form, alpha scaled to 0..=1 with three decimals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alpha = (f64::from(self.a) / 255.0 * 1000.0).round() / 1000.0;
        write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, alpha)
    }
}

/// One sparse cell record. Unset properties are absent from the wire.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    /// Column.
    pub x: Option<f64>,
    /// Row.
    pub y: Option<f64>,
    /// Fill color.
    pub color: Option<Rgba>,
    /// Element name.
    pub element: Option<String>,
    /// Temperature.
    pub temp: Option<f64>,
    /// Electric charge.
    pub charge: Option<f64>,
    /// On fire.
    pub burning: Option<bool>,
    /// Element a cloner copies.
    pub clone: Option<String>,
    /// Render opacity multiplier.
    pub alpha: Option<f64>,
}

impl Cell {
    /// Cell with a position and element, the minimum the renderer needs.
    #[must_use]
    pub fn at(x: f64, y: f64, element: &str) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            element: Some(element.to_owned()),
            ..Self::default()
        }
    }

    /// Returns true if `property` is set.
    #[must_use]
    pub const fn has(&self, property: CellProperty) -> bool {
        match property {
            CellProperty::X => self.x.is_some(),
            CellProperty::Y => self.y.is_some(),
            CellProperty::Color => self.color.is_some(),
            CellProperty::Element => self.element.is_some(),
            CellProperty::Temp => self.temp.is_some(),
            CellProperty::Charge => self.charge.is_some(),
            CellProperty::Burning => self.burning.is_some(),
            CellProperty::Clone => self.clone.is_some(),
            CellProperty::Alpha => self.alpha.is_some(),
        }
    }

    /// Returns true if no property is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        CellProperty::ALL.iter().all(|p| !self.has(*p))
    }

    /// Grid position, if both coordinates are present.
    #[must_use]
    pub fn position(&self) -> Option<(f64, f64)> {
        self.x.zip(self.y)
    }

    fn write_to(&self, writer: &mut ByteWriter) -> EncodeResult<()> {
        let numbers = [
            (CellProperty::X, self.x),
            (CellProperty::Y, self.y),
        ];
        for (property, value) in numbers {
            if let Some(value) = value {
                writer.write_u8(property.id());
                writer.write_number(value);
            }
        }
        if let Some(color) = self.color {
            writer.write_u8(CellProperty::Color.id());
            writer.write_raw(&[color.r, color.g, color.b, color.a]);
        }
        if let Some(element) = &self.element {
            writer.write_u8(CellProperty::Element.id());
            writer.write_raw(&pack_string(element)?);
        }
        for (property, value) in [(CellProperty::Temp, self.temp), (CellProperty::Charge, self.charge)] {
            if let Some(value) = value {
                writer.write_u8(property.id());
                writer.write_number(value);
            }
        }
        if let Some(burning) = self.burning {
            writer.write_u8(CellProperty::Burning.id());
            writer.write_bool(burning);
        }
        if let Some(clone) = &self.clone {
            writer.write_u8(CellProperty::Clone.id());
            writer.write_raw(&pack_string(clone)?);
        }
        if let Some(alpha) = self.alpha {
            writer.write_u8(CellProperty::Alpha.id());
            writer.write_number(alpha);
        }
        writer.write_u8(CELL_END_OF_RECORD);
        Ok(())
    }

    fn read_property(&mut self, property: CellProperty, reader: &mut ByteReader<'_>) -> DecodeResult<()> {
        match property {
            CellProperty::X => self.x = Some(reader.read_number()?),
            CellProperty::Y => self.y = Some(reader.read_number()?),
            CellProperty::Color => {
                let raw = reader.read_raw(4)?;
                self.color = Some(Rgba::new(raw[0], raw[1], raw[2], raw[3]));
            }
            CellProperty::Element => self.element = Some(unpack_string(reader)?),
            CellProperty::Temp => self.temp = Some(reader.read_number()?),
            CellProperty::Charge => self.charge = Some(reader.read_number()?),
            CellProperty::Burning => self.burning = Some(reader.read_bool()?),
            CellProperty::Clone => self.clone = Some(unpack_string(reader)?),
            CellProperty::Alpha => self.alpha = Some(reader.read_number()?),
        }
        Ok(())
    }
}

/// Packs a string into self-terminating 7-bit bytes.
///
/// Accepts `0x01..=0x7F` only. The empty string packs to a single `0x00`.
pub fn pack_string(value: &str) -> EncodeResult<Vec<u8>> {
    if value.is_empty() {
        return Ok(vec![0x00]);
    }
    let mut out = Vec::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        let code = c as u32;
        if code == 0 || code > 0x7F {
            return Err(EncodeError::UnpackableChar(c));
        }
        let more = u8::from(chars.peek().is_some());
        out.push(((code as u8) << 1) | more);
    }
    Ok(out)
}

/// Reads a packed string up to the first byte with a clear continuation bit.
pub fn unpack_string(reader: &mut ByteReader<'_>) -> DecodeResult<String> {
    let mut out = String::new();
    loop {
        let byte = reader.read_u8()?;
        out.push(char::from(byte >> 1));
        if byte & 1 == 0 {
            break;
        }
    }
    if out == "\0" {
        out.clear();
    }
    Ok(out)
}

/// Encodes records back-to-back, each closed by `0xFF`.
pub fn encode_cells(cells: &[Cell]) -> EncodeResult<Vec<u8>> {
    let mut writer = ByteWriter::with_capacity(cells.len() * 32);
    for cell in cells {
        cell.write_to(&mut writer)?;
    }
    Ok(writer.into_inner())
}

/// Decodes the next record.
pub fn decode_cell(reader: &mut ByteReader<'_>) -> DecodeResult<Cell> {
    let mut cell = Cell::default();
    while !reader.is_empty() {
        let tag = reader.read_u8()?;
        if tag == CELL_END_OF_RECORD || (tag == 0x00 && reader.is_empty()) {
            return Ok(cell);
        }
        let property = CellProperty::from_id(tag).ok_or(DecodeError::UnknownCellProperty(tag))?;
        if cell.has(property) {
            reader.back_up(1);
            return Ok(cell);
        }
        cell.read_property(property, reader)?;
    }
    Ok(cell)
}

/// Decodes records until the stream is exhausted.
pub fn decode_cells(bytes: &[u8]) -> DecodeResult<Vec<Cell>> {
    let mut reader = ByteReader::new(bytes);
    let mut cells = Vec::new();
    while !reader.is_empty() {
        cells.push(decode_cell(&mut reader)?);
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number_field(writer: &mut ByteWriter, property: CellProperty, value: f64) {
        writer.write_u8(property.id());
        writer.write_number(value);
    }

    #[test]
    fn test_pack_string_bits() {
        assert_eq!(pack_string("ab").unwrap(), vec![(b'a' << 1) | 1, b'b' << 1]);
        assert_eq!(pack_string("").unwrap(), vec![0x00]);
    }

    #[test]
    fn test_pack_string_rejects_high_chars() {
        assert_eq!(pack_string("café").unwrap_err(), EncodeError::UnpackableChar('é'));
        assert_eq!(pack_string("a\0b").unwrap_err(), EncodeError::UnpackableChar('\0'));
    }

    #[test]
    fn test_unpack_string_round_trip() {
        for s in ["", "s", "sand", "salt_water", "~!{}"] {
            let packed = pack_string(s).unwrap();
            let mut reader = ByteReader::new(&packed);
            assert_eq!(unpack_string(&mut reader).unwrap(), s);
            assert!(reader.is_empty());
        }
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let cells = vec![
            Cell::at(1.0, 2.0, "sand"),
            Cell {
                x: Some(3.0),
                color: Some(Rgba::opaque(10, 20, 30)),
                burning: Some(true),
                ..Cell::default()
            },
            Cell {
                temp: Some(-40.5),
                charge: Some(1.0),
                clone: Some("water".into()),
                alpha: Some(0.5),
                ..Cell::default()
            },
        ];
        let bytes = encode_cells(&cells).unwrap();
        assert_eq!(decode_cells(&bytes).unwrap(), cells);
    }

    #[test]
    fn test_empty_record() {
        let bytes = encode_cells(&[Cell::default()]).unwrap();
        assert_eq!(bytes, vec![CELL_END_OF_RECORD]);
        let cells = decode_cells(&bytes).unwrap();
        assert_eq!(cells.len(), 1);
        assert!(cells[0].is_empty());
    }

    #[test]
    fn test_duplicate_key_starts_next_record() {
        // {x, y, x, y} with no terminators
        let mut writer = ByteWriter::new();
        number_field(&mut writer, CellProperty::X, 1.0);
        number_field(&mut writer, CellProperty::Y, 2.0);
        number_field(&mut writer, CellProperty::X, 3.0);
        number_field(&mut writer, CellProperty::Y, 4.0);

        let cells = decode_cells(writer.as_slice()).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].position(), Some((1.0, 2.0)));
        assert_eq!(cells[1].position(), Some((3.0, 4.0)));
    }

    #[test]
    fn test_trailing_zero_ends_stream() {
        let mut writer = ByteWriter::new();
        number_field(&mut writer, CellProperty::Temp, 25.0);
        writer.write_u8(0x00);
        let cells = decode_cells(writer.as_slice()).unwrap();
        assert_eq!(cells, vec![Cell { temp: Some(25.0), ..Cell::default() }]);
    }

    #[test]
    fn test_zero_tag_mid_stream_is_x() {
        let mut writer = ByteWriter::new();
        number_field(&mut writer, CellProperty::X, 8.0);
        let cells = decode_cells(writer.as_slice()).unwrap();
        assert_eq!(cells[0].x, Some(8.0));
    }

    #[test]
    fn test_unknown_property() {
        assert_eq!(decode_cells(&[0x42]).unwrap_err(), DecodeError::UnknownCellProperty(0x42));
    }

    #[test]
    fn test_truncated_value() {
        let err = decode_cells(&[CellProperty::Temp.id(), 0, 0]).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_color_display() {
        assert_eq!(Rgba::opaque(255, 0, 0).to_string(), "rgba(255,0,0,1)");
        assert_eq!(Rgba::new(1, 2, 3, 128).to_string(), "rgba(1,2,3,0.502)");
        assert_eq!(Rgba::new(1, 2, 3, 0).to_string(), "rgba(1,2,3,0)");
    }

    #[test]
    fn test_property_table() {
        for property in CellProperty::ALL {
            assert_eq!(CellProperty::from_id(property.id()), Some(property));
        }
        assert_eq!(CellProperty::from_id(CELL_END_OF_RECORD), None);
        assert_eq!(CellProperty::Burning.kind(), PropertyKind::Boolean);
        assert_eq!(CellProperty::Clone.name(), "clone");
    }
}
