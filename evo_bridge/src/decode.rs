//! Layout decoder.
//!
//! Pure function from a raw snapshot and a [`Layout`] to a [`StateTree`].
//! The tree is rebuilt from scratch on every decode; fields with an
//! unrecognized type tag are simply absent from it.
//!
//! All multi-byte values are little-endian.

use crate::layout::{ARRAY_LEN, FieldDescriptor, Layout, TypeTag};
use serde::Serialize;
use std::collections::BTreeMap;

/// Decoded value of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// `uint8_t`, `uint16_t`, `uint32_t`
    Unsigned(u32),
    /// `float` (widened) and `double`
    Float(f64),
    /// `bool`
    Bool(bool),
    /// `uint16_t[16]`
    UnsignedArray([u16; ARRAY_LEN]),
    /// `double[16]`
    FloatArray([f64; ARRAY_LEN]),
}

/// Node of the state tree: a nested object or a leaf value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StateNode {
    /// Nested object.
    Branch(StateTree),
    /// Leaf value.
    Value(FieldValue),
}

/// Structured state. Serializes as a plain nested JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StateTree {
    nodes: BTreeMap<String, StateNode>,
}

impl StateTree {
    /// Empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if no field was decoded.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Top-level node by key.
    pub fn get(&self, key: &str) -> Option<&StateNode> {
        self.nodes.get(key)
    }

    /// Leaf value at `path`, `None` if absent or if `path` ends at a branch.
    pub fn value_at(&self, path: &[&str]) -> Option<&FieldValue> {
        let (head, rest) = path.split_first()?;
        match (self.nodes.get(*head)?, rest.is_empty()) {
            (StateNode::Value(value), true) => Some(value),
            (StateNode::Branch(child), false) => child.value_at(rest),
            _ => None,
        }
    }

    /// Insert `value` at `path`, creating intermediate objects.
    ///
    /// Conflicting paths resolve to the last insert: a value replaces a
    /// branch with the same key and vice versa.
    pub fn insert(&mut self, path: &[String], value: FieldValue) {
        let Some((head, rest)) = path.split_first() else {
            return;
        };
        if rest.is_empty() {
            self.nodes.insert(head.clone(), StateNode::Value(value));
            return;
        }

        let node = self
            .nodes
            .entry(head.clone())
            .or_insert_with(|| StateNode::Branch(StateTree::new()));
        if matches!(node, StateNode::Value(_)) {
            *node = StateNode::Branch(StateTree::new());
        }
        if let StateNode::Branch(child) = node {
            child.insert(rest, value);
        }
    }
}

/// Decode `snapshot` against `layout`.
///
/// # Panics
///
/// If a recognized field extends past the end of `snapshot`. Layouts are
/// validated against the region capacity before use, so this means the
/// layout was produced for a differently sized region.
pub fn decode(snapshot: &[u8], layout: &Layout) -> StateTree {
    let mut tree = StateTree::new();
    for field in layout.fields() {
        if let Some(value) = read_field(snapshot, field) {
            tree.insert(&field.key_path, value);
        }
    }
    tree
}

/// Read one field; `None` for unrecognized tags.
///
/// # Panics
///
/// Same condition as [`decode`].
pub fn read_field(snapshot: &[u8], field: &FieldDescriptor) -> Option<FieldValue> {
    let width = field.type_tag.width()?;
    let end = field.offset.saturating_add(width);
    assert!(
        end <= snapshot.len(),
        "layout field '{field}' ends at byte {end} but the snapshot holds {} bytes",
        snapshot.len()
    );
    let bytes = &snapshot[field.offset..end];

    let value = match field.type_tag {
        TypeTag::Uint8 => FieldValue::Unsigned(u32::from(bytes[0])),
        TypeTag::Uint16 => FieldValue::Unsigned(u32::from(u16::from_le_bytes(le(bytes)))),
        TypeTag::Uint32 => FieldValue::Unsigned(u32::from_le_bytes(le(bytes))),
        TypeTag::Float => FieldValue::Float(f64::from(f32::from_le_bytes(le(bytes)))),
        TypeTag::Double => FieldValue::Float(f64::from_le_bytes(le(bytes))),
        TypeTag::Bool => FieldValue::Bool(bytes[0] != 0),
        TypeTag::Uint16Array16 => FieldValue::UnsignedArray(std::array::from_fn(|i| {
            u16::from_le_bytes(le(&bytes[2 * i..]))
        })),
        TypeTag::DoubleArray16 => FieldValue::FloatArray(std::array::from_fn(|i| {
            f64::from_le_bytes(le(&bytes[8 * i..]))
        })),
        TypeTag::Unrecognized(_) => return None,
    };
    Some(value)
}

/// First `N` bytes of `bytes` as an array.
#[inline]
fn le<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}
