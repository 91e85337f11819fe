//! Layout of the state region.
//!
//! A [`Layout`] is the parsed form of the mapping block the control process
//! prints at startup: which byte range of the region holds which named,
//! typed field. It is produced once and never mutated.

use evo::consts::{KEY_PATH_SEPARATOR, MAPPING_FIELD_SEPARATOR};
use std::fmt;

/// Number of elements in the fixed-length array types.
pub const ARRAY_LEN: usize = 16;

/// Field type tag as printed by the control process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// `uint8_t`
    Uint8,
    /// `uint16_t`
    Uint16,
    /// `uint32_t`
    Uint32,
    /// `float` (IEEE-754 single)
    Float,
    /// `double` (IEEE-754 double)
    Double,
    /// `bool`, one byte, nonzero is true
    Bool,
    /// `uint16_t[16]`
    Uint16Array16,
    /// `double[16]`
    DoubleArray16,
    /// Any other tag (struct types, signed integers, ...). Kept verbatim and
    /// skipped by the decoder.
    Unrecognized(String),
}

impl TypeTag {
    /// Parse a tag; never fails, unknown tags become [`TypeTag::Unrecognized`].
    pub fn parse(tag: &str) -> Self {
        match tag {
            "uint8_t" => TypeTag::Uint8,
            "uint16_t" => TypeTag::Uint16,
            "uint32_t" => TypeTag::Uint32,
            "float" => TypeTag::Float,
            "double" => TypeTag::Double,
            "bool" => TypeTag::Bool,
            "uint16_t[16]" => TypeTag::Uint16Array16,
            "double[16]" => TypeTag::DoubleArray16,
            other => TypeTag::Unrecognized(other.to_string()),
        }
    }

    /// Tag text as it appears in the mapping block.
    pub fn as_str(&self) -> &str {
        match self {
            TypeTag::Uint8 => "uint8_t",
            TypeTag::Uint16 => "uint16_t",
            TypeTag::Uint32 => "uint32_t",
            TypeTag::Float => "float",
            TypeTag::Double => "double",
            TypeTag::Bool => "bool",
            TypeTag::Uint16Array16 => "uint16_t[16]",
            TypeTag::DoubleArray16 => "double[16]",
            TypeTag::Unrecognized(tag) => tag,
        }
    }

    /// Encoded width in bytes, `None` for unrecognized tags.
    pub const fn width(&self) -> Option<usize> {
        match self {
            TypeTag::Uint8 | TypeTag::Bool => Some(1),
            TypeTag::Uint16 => Some(2),
            TypeTag::Uint32 | TypeTag::Float => Some(4),
            TypeTag::Double => Some(8),
            TypeTag::Uint16Array16 => Some(2 * ARRAY_LEN),
            TypeTag::DoubleArray16 => Some(8 * ARRAY_LEN),
            TypeTag::Unrecognized(_) => None,
        }
    }

    /// `true` if the decoder knows how to read this tag.
    #[inline]
    pub const fn is_recognized(&self) -> bool {
        self.width().is_some()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the mapping block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Key path segments, never empty.
    pub key_path: Vec<String>,
    /// Byte offset from the start of the region.
    pub offset: usize,
    /// Field type.
    pub type_tag: TypeTag,
}

impl FieldDescriptor {
    /// One past the last byte this field occupies, `None` for unrecognized tags.
    pub fn end(&self) -> Option<usize> {
        self.type_tag
            .width()
            .and_then(|width| self.offset.checked_add(width))
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = KEY_PATH_SEPARATOR.to_string();
        write!(
            f,
            "{}{MAPPING_FIELD_SEPARATOR}{}{MAPPING_FIELD_SEPARATOR}{}",
            self.key_path.join(&sep),
            self.offset,
            self.type_tag
        )
    }
}

/// Ordered field list, in order of appearance in the mapping block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    fields: Vec<FieldDescriptor>,
}

impl Layout {
    /// Build a layout from descriptors.
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    /// All descriptors, recognized or not.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` if the mapping block listed no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of descriptors the decoder will read.
    pub fn recognized_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|field| field.type_tag.is_recognized())
            .count()
    }

    /// First recognized descriptor that does not fit in `capacity` bytes.
    pub fn first_out_of_bounds(&self, capacity: usize) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|field| field.type_tag.is_recognized() && field.end().is_none_or(|end| end > capacity))
    }
}

/// Re-serializes to the mapping text format, one descriptor per line,
/// without the delimiter.
impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            writeln!(f, "{field}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(path: &str, offset: usize, tag: &str) -> FieldDescriptor {
        FieldDescriptor {
            key_path: path.split('.').map(str::to_string).collect(),
            offset,
            type_tag: TypeTag::parse(tag),
        }
    }

    #[test]
    fn width_table() {
        assert_eq!(TypeTag::Uint8.width(), Some(1));
        assert_eq!(TypeTag::Uint16.width(), Some(2));
        assert_eq!(TypeTag::Uint32.width(), Some(4));
        assert_eq!(TypeTag::Float.width(), Some(4));
        assert_eq!(TypeTag::Double.width(), Some(8));
        assert_eq!(TypeTag::Bool.width(), Some(1));
        assert_eq!(TypeTag::Uint16Array16.width(), Some(32));
        assert_eq!(TypeTag::DoubleArray16.width(), Some(128));
        assert_eq!(TypeTag::parse("int32_t").width(), None);
    }

    #[test]
    fn tag_text_is_preserved() {
        for tag in [
            "uint8_t",
            "uint16_t",
            "uint32_t",
            "float",
            "double",
            "bool",
            "uint16_t[16]",
            "double[16]",
            "sensor_state_t",
        ] {
            assert_eq!(TypeTag::parse(tag).as_str(), tag);
        }
    }

    #[test]
    fn tags_are_case_sensitive() {
        assert!(!TypeTag::parse("Float").is_recognized());
        assert!(!TypeTag::parse("uint16_t[8]").is_recognized());
    }

    #[test]
    fn bounds_check_ignores_unrecognized() {
        let layout = Layout::new(vec![
            field("state", 0, "uint8_t"),
            field("blob", 10_000, "calibration_t"),
            field("data", 4000, "double[16]"),
        ]);
        assert_eq!(layout.recognized_count(), 2);
        let bad = layout.first_out_of_bounds(4096).unwrap();
        assert_eq!(bad.key_path, vec!["data"]);
        assert!(layout.first_out_of_bounds(4128).is_none());
    }

    #[test]
    fn overflowing_offset_is_out_of_bounds() {
        let layout = Layout::new(vec![field("x", usize::MAX, "double")]);
        assert!(layout.first_out_of_bounds(4096).is_some());
    }

    #[test]
    fn display_reproduces_mapping_lines() {
        let layout = Layout::new(vec![
            field("state.drive_state.position", 328, "double"),
            field("state.sensor_state", 8, "sensor_state_t"),
        ]);
        assert_eq!(
            layout.to_string(),
            "state.drive_state.position:328:double\nstate.sensor_state:8:sensor_state_t\n"
        );
    }
}
