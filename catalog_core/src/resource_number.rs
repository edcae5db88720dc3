//! Bit-packed resource numbers.
//!
//! A resource number is a 32-bit value laid out as
//! `package:11 | instance:13 | type:8`, most significant bits first.
//! Encoding masks out-of-range components instead of rejecting them, and
//! decoding accepts any 32-bit value.

use std::fmt;

use thiserror::Error;

pub const TYPE_BITS: u32 = 8;
pub const INSTANCE_BITS: u32 = 13;
pub const PACKAGE_BITS: u32 = 11;

pub const TYPE_MASK: u32 = (1 << TYPE_BITS) - 1;
pub const INSTANCE_MASK: u32 = (1 << INSTANCE_BITS) - 1;
pub const PACKAGE_MASK: u32 = (1 << PACKAGE_BITS) - 1;

const INSTANCE_SHIFT: u32 = TYPE_BITS;
const PACKAGE_SHIFT: u32 = TYPE_BITS + INSTANCE_BITS;

/// Type name recorded when a resolved constant has no master-map entry.
pub const UNKNOWN_RES: &str = "UNKNOWNRES";
/// Type name given to master-map lines without a `TYPE:` segment.
pub const UNKNOWN_TYPE: &str = "UNKNOWN";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LiteralError {
    #[error("malformed resource literal '{0}'")]
    MalformedLiteral(String),
}

pub fn encode(package: u32, instance: u32, res_type: u32) -> u32 {
    ((package & PACKAGE_MASK) << PACKAGE_SHIFT)
        | ((instance & INSTANCE_MASK) << INSTANCE_SHIFT)
        | (res_type & TYPE_MASK)
}

pub fn decode(number: u32) -> (u32, u32, u32) {
    (
        (number >> PACKAGE_SHIFT) & PACKAGE_MASK,
        (number >> INSTANCE_SHIFT) & INSTANCE_MASK,
        number & TYPE_MASK,
    )
}

/// Parses the catalog's textual literal, e.g. `0x00600c02L`.
///
/// A `0x` prefix and a single `L`/`U` suffix marker are optional.
pub fn parse_hex_literal(text: &str) -> Result<u32, LiteralError> {
    let malformed = || LiteralError::MalformedLiteral(text.to_string());
    let trimmed = text.trim();
    let body = trimmed
        .strip_suffix(|ch: char| matches!(ch, 'L' | 'l' | 'U' | 'u'))
        .unwrap_or(trimmed);
    let digits = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
        .unwrap_or(body);
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(malformed());
    }
    u32::from_str_radix(digits, 16).map_err(|_| malformed())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceNumber(u32);

impl ResourceNumber {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn encode(package: u32, instance: u32, res_type: u32) -> Self {
        Self(encode(package, instance, res_type))
    }

    pub fn parse(text: &str) -> Result<Self, LiteralError> {
        parse_hex_literal(text).map(Self)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub fn decode(self) -> (u32, u32, u32) {
        decode(self.0)
    }

    pub fn package(self) -> u32 {
        self.decode().0
    }

    pub fn instance(self) -> u32 {
        self.decode().1
    }

    pub fn res_type(self) -> u32 {
        self.decode().2
    }

    /// The literal as written in generated headers.
    pub fn literal(self) -> String {
        format!("0x{:08x}L", self.0)
    }

    pub fn describe(self) -> String {
        let (package, instance, res_type) = self.decode();
        format!(
            "RESID=0x{:08x}  PACKAGE={} (0x{:04x})  INSTANCE={} (0x{:04x})  TYPE={} (0x{:02x})",
            self.0, package, package, instance, instance, res_type, res_type
        )
    }
}

impl fmt::Display for ResourceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}L", self.0)
    }
}

/// Numeric type codes used in package indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceType {
    Unknown,
    KeyConfig,
    GfxRes,
    FontRes,
    StrTab,
    SndRes,
    MusicRes,
    ResIndex,
    Code,
}

impl ResourceType {
    pub const ALL: [ResourceType; 9] = [
        ResourceType::Unknown,
        ResourceType::KeyConfig,
        ResourceType::GfxRes,
        ResourceType::FontRes,
        ResourceType::StrTab,
        ResourceType::SndRes,
        ResourceType::MusicRes,
        ResourceType::ResIndex,
        ResourceType::Code,
    ];

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Unknown => UNKNOWN_TYPE,
            ResourceType::KeyConfig => "KEY_CONFIG",
            ResourceType::GfxRes => "GFXRES",
            ResourceType::FontRes => "FONTRES",
            ResourceType::StrTab => "STRTAB",
            ResourceType::SndRes => "SNDRES",
            ResourceType::MusicRes => "MUSICRES",
            ResourceType::ResIndex => "RES_INDEX",
            ResourceType::Code => "CODE",
        }
    }

    /// Type name for an index type code, `UNKNOWNRES` outside the table.
    pub fn name_for_code(code: u32) -> &'static str {
        Self::from_code(code).map_or(UNKNOWN_RES, Self::as_str)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn decode_inverts_encode_in_range(p in 0u32..2048, i in 0u32..8192, t in 0u32..256) {
            prop_assert_eq!(decode(encode(p, i, t)), (p, i, t));
        }

        #[test]
        fn encode_masks_out_of_range(p: u32, i: u32, t: u32) {
            prop_assert_eq!(
                decode(encode(p, i, t)),
                (p & PACKAGE_MASK, i & INSTANCE_MASK, t & TYPE_MASK)
            );
        }

        #[test]
        fn decode_is_total(raw: u32) {
            let (p, i, t) = decode(raw);
            prop_assert_eq!(encode(p, i, t), raw);
        }
    }

    #[test]
    fn overflowing_package_wraps() {
        assert_eq!(encode(2048, 0, 0), encode(0, 0, 0));
        assert_eq!(encode(0, 8192, 256), 0);
    }

    #[test]
    fn parses_catalog_literal() {
        assert_eq!(parse_hex_literal("0x00600c02L").unwrap(), 0x0060_0c02);
        assert_eq!(decode(0x0060_0c02), (3, 12, 2));
        assert_eq!(parse_hex_literal("0X7fL").unwrap(), 0x7f);
        assert_eq!(parse_hex_literal("00600c02").unwrap(), 0x0060_0c02);
    }

    #[test]
    fn rejects_malformed_literals() {
        for text in ["", "L", "0x", "0xL", "0xZZL", "0x+1L", "0x123456789L", "0x12LL"] {
            assert!(
                matches!(parse_hex_literal(text), Err(LiteralError::MalformedLiteral(_))),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn literal_and_describe() {
        let number = ResourceNumber::encode(3, 12, 2);
        assert_eq!(number.literal(), "0x00600c02L");
        assert_eq!(number.to_string(), "0x00600c02L");
        assert_eq!(
            number.describe(),
            "RESID=0x00600c02  PACKAGE=3 (0x0003)  INSTANCE=12 (0x000c)  TYPE=2 (0x02)"
        );
        assert_eq!(ResourceNumber::parse(&number.literal()).unwrap(), number);
    }

    #[test]
    fn type_codes_follow_index_table() {
        assert_eq!(ResourceType::name_for_code(2), "GFXRES");
        assert_eq!(ResourceType::name_for_code(8), "CODE");
        assert_eq!(ResourceType::name_for_code(9), UNKNOWN_RES);
        assert_eq!(ResourceType::from_code(0), Some(ResourceType::Unknown));
    }
}
