//! Mapping protocol parser.
//!
//! At startup the control process prints one line per field of its state
//! struct on stdout, followed by a delimiter line:
//!
//! ```text
//! state.state:0:uint8_t
//! state.sensor_state.raw_data:2:uint16_t[16]
//! state.drive_state.position:328:double
//! --------
//! ```
//!
//! Everything after the delimiter is regular process output. Input arrives
//! in arbitrary chunks, so [`MappingParser`] accumulates text until the
//! delimiter line is complete (a delimiter split across two chunks is
//! fine) and hands the unconsumed tail back to the caller.
//!
//! A mapping line that does not have exactly three `:`-separated columns,
//! has an empty key segment, or has a non-numeric offset fails the whole
//! mapping.

use crate::layout::{FieldDescriptor, Layout, TypeTag};
use evo::consts::{KEY_PATH_SEPARATOR, MAPPING_DELIMITER, MAPPING_FIELD_SEPARATOR};
use thiserror::Error;

/// Mapping block errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// Line is not `key.path:offset:type`.
    #[error("Malformed mapping line {line}: '{content}'")]
    MalformedLine {
        /// 1-based line number within the mapping block.
        line: usize,
        /// Offending line (trimmed).
        content: String,
    },

    /// Offset column is not a non-negative decimal integer.
    #[error("Invalid offset '{value}' on mapping line {line}")]
    InvalidOffset {
        /// 1-based line number within the mapping block.
        line: usize,
        /// Offset column text.
        value: String,
    },

    /// A recognized field extends past the end of the region.
    #[error("Field '{field}' ends at byte {end}, region holds {capacity}")]
    OutOfBounds {
        /// Offending descriptor, as a mapping line.
        field: String,
        /// One past the last byte the field needs.
        end: usize,
        /// Region capacity.
        capacity: usize,
    },

    /// The parser already produced its layout.
    #[error("Mapping already complete")]
    AlreadyComplete,
}

/// Result of a completed mapping block.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingOutcome {
    /// Parsed layout.
    pub layout: Layout,
    /// Text that followed the delimiter line in the same input.
    pub remainder: String,
}

/// Incremental parser for the mapping block. Single use.
#[derive(Debug, Default)]
pub struct MappingParser {
    buffer: String,
    /// Byte index of the first line not yet checked for the delimiter.
    scanned: usize,
    complete: bool,
}

impl MappingParser {
    /// Create an empty parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once a layout (or an error) has been produced.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Append a chunk of input.
    ///
    /// Returns `Ok(None)` while the delimiter line has not been seen,
    /// `Ok(Some(outcome))` exactly once when it has. After that the parser
    /// is spent: further calls return [`MappingError::AlreadyComplete`],
    /// as do calls after a parse error.
    pub fn feed(&mut self, chunk: &str) -> Result<Option<MappingOutcome>, MappingError> {
        if self.complete {
            return Err(MappingError::AlreadyComplete);
        }
        self.buffer.push_str(chunk);

        while let Some(rel) = self.buffer[self.scanned..].find('\n') {
            let line_end = self.scanned + rel;
            if self.buffer[self.scanned..line_end].trim() == MAPPING_DELIMITER {
                self.complete = true;
                let result = parse_mapping(&self.buffer[..self.scanned]);
                let remainder = self.buffer.split_off(line_end + 1);
                self.buffer = String::new();
                return result.map(|layout| Some(MappingOutcome { layout, remainder }));
            }
            self.scanned = line_end + 1;
        }
        Ok(None)
    }
}

/// Parse a complete mapping block (without the delimiter line).
///
/// Blank lines are ignored; surrounding whitespace is trimmed.
pub fn parse_mapping(text: &str) -> Result<Layout, MappingError> {
    let mut fields = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        fields.push(parse_line(index + 1, line)?);
    }
    Ok(Layout::new(fields))
}

/// Parse one non-empty, trimmed mapping line.
pub fn parse_line(line_no: usize, line: &str) -> Result<FieldDescriptor, MappingError> {
    let malformed = || MappingError::MalformedLine {
        line: line_no,
        content: line.to_string(),
    };

    let columns: Vec<&str> = line.split(MAPPING_FIELD_SEPARATOR).map(str::trim).collect();
    let [key, offset, tag] = columns.as_slice() else {
        return Err(malformed());
    };

    let key_path: Vec<String> = key.split(KEY_PATH_SEPARATOR).map(str::to_string).collect();
    if key_path.iter().any(String::is_empty) {
        return Err(malformed());
    }

    let offset = offset
        .parse::<usize>()
        .map_err(|_| MappingError::InvalidOffset {
            line: line_no,
            value: offset.to_string(),
        })?;

    Ok(FieldDescriptor {
        key_path,
        offset,
        type_tag: TypeTag::parse(tag),
    })
}

/// Check every recognized field of `layout` fits in `capacity` bytes.
pub fn validate_layout(layout: &Layout, capacity: usize) -> Result<(), MappingError> {
    match layout.first_out_of_bounds(capacity) {
        Some(field) => Err(MappingError::OutOfBounds {
            field: field.to_string(),
            end: field.end().unwrap_or(usize::MAX),
            capacity,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lines_in_order() {
        let layout = parse_mapping(
            "state.state:0:uint8_t\n\n  state.drive_state.speed:12:float  \nstate.drive_state.position:16:double\n",
        )
        .unwrap();

        assert_eq!(layout.len(), 3);
        let fields = layout.fields();
        assert_eq!(fields[0].key_path, vec!["state", "state"]);
        assert_eq!(fields[0].type_tag, TypeTag::Uint8);
        assert_eq!(fields[1].key_path, vec!["state", "drive_state", "speed"]);
        assert_eq!(fields[1].offset, 12);
        assert_eq!(fields[2].type_tag, TypeTag::Double);
    }

    #[test]
    fn unknown_tag_is_kept_verbatim() {
        let layout = parse_mapping("state.drive_state.pid_left:40:pid_t").unwrap();
        assert_eq!(
            layout.fields()[0].type_tag,
            TypeTag::Unrecognized("pid_t".to_string())
        );
    }

    #[test]
    fn wrong_column_count_is_malformed() {
        assert_eq!(
            parse_mapping("a:0:bool\nb:1\n"),
            Err(MappingError::MalformedLine {
                line: 2,
                content: "b:1".to_string()
            })
        );
        assert!(matches!(
            parse_mapping("a:0:bool:extra"),
            Err(MappingError::MalformedLine { line: 1, .. })
        ));
    }

    #[test]
    fn empty_key_segment_is_malformed() {
        assert!(matches!(
            parse_mapping("a..b:0:bool"),
            Err(MappingError::MalformedLine { .. })
        ));
        assert!(matches!(
            parse_mapping(":0:bool"),
            Err(MappingError::MalformedLine { .. })
        ));
    }

    #[test]
    fn bad_offset_is_rejected() {
        assert_eq!(
            parse_mapping("a:-4:bool"),
            Err(MappingError::InvalidOffset {
                line: 1,
                value: "-4".to_string()
            })
        );
        assert!(matches!(
            parse_mapping("a:0x10:bool"),
            Err(MappingError::InvalidOffset { .. })
        ));
    }

    #[test]
    fn parser_waits_for_delimiter() {
        let mut parser = MappingParser::new();
        assert_eq!(parser.feed("a:0:uint8_t\n").unwrap(), None);
        assert_eq!(parser.feed("b:1:bool\n").unwrap(), None);
        let outcome = parser.feed("--------\n").unwrap().unwrap();
        assert_eq!(outcome.layout.len(), 2);
        assert_eq!(outcome.remainder, "");
        assert!(parser.is_complete());
    }

    #[test]
    fn delimiter_split_across_chunks() {
        let mut parser = MappingParser::new();
        assert_eq!(parser.feed("a:0:uint8_t\n----").unwrap(), None);
        assert_eq!(parser.feed("----").unwrap(), None);
        let outcome = parser.feed("\nProgram started\n").unwrap().unwrap();
        assert_eq!(outcome.layout.len(), 1);
        assert_eq!(outcome.remainder, "Program started\n");
    }

    #[test]
    fn remainder_in_same_chunk_is_returned() {
        let mut parser = MappingParser::new();
        let outcome = parser
            .feed("a:0:uint8_t\r\n--------\r\nhello\npartial")
            .unwrap()
            .unwrap();
        assert_eq!(outcome.remainder, "hello\npartial");
    }

    #[test]
    fn longer_dash_line_is_not_delimiter() {
        let mut parser = MappingParser::new();
        assert_eq!(parser.feed("---------\n").unwrap(), None);
        assert!(!parser.is_complete());
    }

    #[test]
    fn empty_mapping_is_valid() {
        let mut parser = MappingParser::new();
        let outcome = parser.feed("--------\n").unwrap().unwrap();
        assert!(outcome.layout.is_empty());
    }

    #[test]
    fn parser_is_single_use() {
        let mut parser = MappingParser::new();
        parser.feed("--------\n").unwrap();
        assert_eq!(parser.feed("a:0:bool\n"), Err(MappingError::AlreadyComplete));
    }

    #[test]
    fn parse_error_surfaces_at_delimiter() {
        let mut parser = MappingParser::new();
        assert_eq!(parser.feed("garbage\n").unwrap(), None);
        assert!(matches!(
            parser.feed("--------\n"),
            Err(MappingError::MalformedLine { line: 1, .. })
        ));
        assert!(parser.is_complete());
    }

    #[test]
    fn validate_layout_reports_offender() {
        let layout = parse_mapping("ok:0:double\nbad:4090:double").unwrap();
        assert_eq!(
            validate_layout(&layout, 4096),
            Err(MappingError::OutOfBounds {
                field: "bad:4090:double".to_string(),
                end: 4098,
                capacity: 4096,
            })
        );
        assert!(validate_layout(&layout, 4098).is_ok());
    }
}
