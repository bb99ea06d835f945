/// Binary STL decoder, including the `COLOR=` header color extension
///
/// Layout: an 80-byte header, a little-endian `u32` facet count, then one
/// 50-byte record per facet (normal, three vertices, packed `u16` color).
use nom::{
    number::complete::{le_f32, le_u16, le_u32},
    sequence::tuple,
    IResult,
};
use thiserror::Error;

use crate::geometry::{DecodedModel, FLOATS_PER_FACET};

pub const HEADER_LEN: usize = 80;
/// Header plus facet count
pub const PREAMBLE_LEN: usize = HEADER_LEN + 4;
pub const FACET_RECORD_LEN: usize = 50;

const COLOR_MARKER: &[u8; 6] = b"COLOR=";
/// The marker may start anywhere in the first 70 header bytes
const COLOR_SCAN_END: usize = 70;
/// Bit 15 of the packed color selects the header default
const USE_DEFAULT_COLOR: u16 = 0x8000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StlError {
    #[error("malformed STL buffer: {facets} facets need {expected} bytes, got {actual}")]
    MalformedBuffer {
        facets: u32,
        expected: u64,
        actual: usize,
    },

    #[error("ASCII STL is not supported, expected a binary STL file")]
    UnsupportedFormat,
}

/// Default color declared by a `COLOR=` header marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderColor {
    pub rgb: [f32; 3],
    pub alpha: f32,
}

/// Byte length a binary STL with `facets` records must have
pub fn required_len(facets: u32) -> u64 {
    PREAMBLE_LEN as u64 + u64::from(facets) * FACET_RECORD_LEN as u64
}

/// Find the default color marker in an STL header.
///
/// The first full `COLOR=` match starting before byte 70 wins.
pub fn header_color(header: &[u8]) -> Option<HeaderColor> {
    header
        .windows(COLOR_MARKER.len() + 4)
        .take(COLOR_SCAN_END)
        .find(|window| window.starts_with(COLOR_MARKER))
        .map(|window| HeaderColor {
            rgb: [
                normalize_byte(window[6]),
                normalize_byte(window[7]),
                normalize_byte(window[8]),
            ],
            alpha: normalize_byte(window[9]),
        })
}

/// Unpack a facet's own 5-5-5 RGB color.
///
/// Returns `None` when bit 15 is set, meaning the header default applies.
pub fn unpack_facet_color(packed: u16) -> Option<[f32; 3]> {
    if packed & USE_DEFAULT_COLOR != 0 {
        return None;
    }
    let channel = |shift: u16| f32::from((packed >> shift) & 0x1f) / 31.0;
    Some([channel(0), channel(5), channel(10)])
}

fn normalize_byte(value: u8) -> f32 {
    f32::from(value) / 255.0
}

/// One raw 50-byte facet record
#[derive(Debug, Clone, Copy, PartialEq)]
struct FacetRecord {
    normal: [f32; 3],
    vertices: [[f32; 3]; 3],
    attribute: u16,
}

fn parse_vector3(input: &[u8]) -> IResult<&[u8], [f32; 3]> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, [x, y, z]))
}

fn parse_facet_count(input: &[u8]) -> IResult<&[u8], u32> {
    le_u32(input)
}

fn parse_facet(input: &[u8]) -> IResult<&[u8], FacetRecord> {
    let (input, normal) = parse_vector3(input)?;
    let (input, v0) = parse_vector3(input)?;
    let (input, v1) = parse_vector3(input)?;
    let (input, v2) = parse_vector3(input)?;
    let (input, attribute) = le_u16(input)?;
    Ok((
        input,
        FacetRecord {
            normal,
            vertices: [v0, v1, v2],
            attribute,
        },
    ))
}

/// Decode a binary STL buffer into flat position/normal/color arrays.
///
/// The buffer is always treated as binary STL. The declared facet count is
/// checked against the buffer length before any facet is read; bytes past
/// the last facet record are ignored.
pub fn decode(buffer: &[u8]) -> Result<DecodedModel, StlError> {
    if buffer.len() < PREAMBLE_LEN {
        return Err(StlError::MalformedBuffer {
            facets: 0,
            expected: PREAMBLE_LEN as u64,
            actual: buffer.len(),
        });
    }

    let default_color = header_color(&buffer[..HEADER_LEN]);

    let malformed = |facets: u32| StlError::MalformedBuffer {
        facets,
        expected: required_len(facets),
        actual: buffer.len(),
    };

    let (mut input, facets) =
        parse_facet_count(&buffer[HEADER_LEN..]).map_err(|_| malformed(0))?;
    if (buffer.len() as u64) < required_len(facets) {
        return Err(malformed(facets));
    }

    let floats = facets as usize * FLOATS_PER_FACET;
    let mut position = Vec::with_capacity(floats);
    let mut normals = Vec::with_capacity(floats);
    let mut palette = default_color.map(|color| (color, Vec::with_capacity(floats)));

    for _ in 0..facets {
        let (rest, record) = parse_facet(input).map_err(|_| malformed(facets))?;
        input = rest;

        let rgb = palette
            .as_ref()
            .map(|(default, _)| unpack_facet_color(record.attribute).unwrap_or(default.rgb));

        for vertex in &record.vertices {
            position.extend_from_slice(vertex);
            normals.extend_from_slice(&record.normal);
            if let (Some((_, colors)), Some(rgb)) = (palette.as_mut(), rgb) {
                colors.extend_from_slice(&rgb);
            }
        }
    }

    tracing::debug!(facets, colored = palette.is_some(), "decoded binary STL");

    Ok(match palette {
        Some((default, colors)) => DecodedModel::Colored {
            position,
            normals,
            colors,
            alpha: default.alpha,
        },
        None => DecodedModel::Uncolored { position, normals },
    })
}

/// Parse an STL file, rejecting ASCII STL.
///
/// Binary files whose header happens to start with `solid` are still
/// accepted as long as their length matches the declared facet count.
pub fn parse_stl(data: &[u8]) -> Result<DecodedModel, StlError> {
    if looks_like_ascii(data) {
        tracing::warn!(len = data.len(), "rejecting ASCII STL input");
        return Err(StlError::UnsupportedFormat);
    }
    decode(data)
}

fn looks_like_ascii(data: &[u8]) -> bool {
    if !data.starts_with(b"solid") {
        return false;
    }
    if data.len() >= PREAMBLE_LEN {
        if let Ok((_, facets)) = parse_facet_count(&data[HEADER_LEN..]) {
            if required_len(facets) == data.len() as u64 {
                return false;
            }
        }
    }
    std::str::from_utf8(data).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        data[80..84].copy_from_slice(&0u32.to_le_bytes());

        let model = decode(&data).unwrap();
        assert_eq!(model.facet_count(), 0);
        assert!(model.position().is_empty());
        assert!(!model.has_colors());
    }

    #[test]
    fn test_too_short_for_preamble() {
        let err = decode(&[0u8; 83]).unwrap_err();
        assert_eq!(
            err,
            StlError::MalformedBuffer {
                facets: 0,
                expected: 84,
                actual: 83
            }
        );
    }

    #[test]
    fn test_header_color_at_start() {
        let mut header = [0u8; 80];
        header[..10].copy_from_slice(b"COLOR=\x80\x80\x80\xff");
        let color = header_color(&header).unwrap();
        assert_eq!(color.rgb, [128.0 / 255.0; 3]);
        assert_eq!(color.alpha, 1.0);
    }

    #[test]
    fn test_header_color_last_scan_position() {
        let mut header = [0u8; 80];
        header[69..79].copy_from_slice(b"COLOR=\x00\xff\x00\x00");
        let color = header_color(&header).unwrap();
        assert_eq!(color.rgb, [0.0, 1.0, 0.0]);
        assert_eq!(color.alpha, 0.0);

        let mut header = [0u8; 80];
        header[70..80].copy_from_slice(b"COLOR=\x00\xff\x00\x00");
        assert!(header_color(&header).is_none());
    }

    #[test]
    fn test_header_color_partial_marker() {
        let mut header = [0u8; 80];
        header[..10].copy_from_slice(b"COLOR:\x10\x10\x10\x10");
        assert!(header_color(&header).is_none());
    }

    #[test]
    fn test_unpack_facet_color() {
        assert_eq!(unpack_facet_color(0x001f), Some([1.0, 0.0, 0.0]));
        assert_eq!(unpack_facet_color(0x03e0), Some([0.0, 1.0, 0.0]));
        assert_eq!(unpack_facet_color(0x7c00), Some([0.0, 0.0, 1.0]));
        assert_eq!(unpack_facet_color(0x8000), None);
        assert_eq!(unpack_facet_color(0xffff), None);
    }

    #[test]
    fn test_required_len_does_not_overflow() {
        assert_eq!(required_len(0), 84);
        assert_eq!(required_len(u32::MAX), 84 + u64::from(u32::MAX) * 50);
    }

    #[test]
    fn test_ascii_detection() {
        let ascii = b"solid cube\nfacet normal 0 0 1\nendsolid cube\n";
        assert_eq!(parse_stl(ascii), Err(StlError::UnsupportedFormat));

        let mut binary = vec![0u8; 84];
        binary[..5].copy_from_slice(b"solid");
        assert!(parse_stl(&binary).is_ok());
    }
}
