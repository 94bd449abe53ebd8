//! Storage Layout Resolver
//!
//! Turns an ordered list of storage declarations into the slot, byte offset and
//! width each one occupies in a contract's 32-byte-word storage.
//!
//! Packing rule:
//!   - scalars are packed left to right into the current slot while they fit;
//!     a scalar that would straddle the slot boundary starts a fresh slot
//!   - fixed-size arrays (and fields flagged `force_new_slot`) always start a
//!     fresh slot and take one whole slot per element
//!
//! Offsets are counted from the most-significant byte of the slot (offset 0).
//! Visibility is carried along for display and getter lookup only: it has no
//! influence on where a value lives, and none on who can read it.

pub mod errors;
pub mod solidity;

pub use errors::LayoutError;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::constants::WORD_BYTES;

/// Source-level visibility of a state variable.
///
/// This is a compiler convention, not an access control. Every slot of every
/// contract can be read with a raw storage read no matter what is declared here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Has a generated getter
    Public,
    /// Solidity's default; no getter
    #[default]
    Internal,
    /// No getter
    Private,
}

impl Visibility {
    /// Whether the contract exposes a getter for the variable.
    pub fn has_getter(self) -> bool {
        matches!(self, Self::Public)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => f.write_str("public"),
            Self::Internal => f.write_str("internal"),
            Self::Private => f.write_str("private"),
        }
    }
}

/// Which end of the slot packed scalars are laid out from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackingOrder {
    /// First declared field at offset 0 (the most-significant byte)
    #[default]
    MsbFirst,
    /// First declared field in the least-significant bytes, as solc emits it
    LsbFirst,
}

impl PackingOrder {
    /// Offset (from the MSB) of a packed scalar once `used` bytes are taken.
    fn packed_offset(self, used: usize, width: usize) -> usize {
        match self {
            Self::MsbFirst => used,
            Self::LsbFirst => WORD_BYTES - used - width,
        }
    }

    /// Offset (from the MSB) of an element that has a slot to itself.
    fn whole_slot_offset(self, width: usize) -> usize {
        self.packed_offset(0, width)
    }
}

impl FromStr for PackingOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "msb" | "msb-first" | "msbfirst" => Ok(Self::MsbFirst),
            "lsb" | "lsb-first" | "lsbfirst" => Ok(Self::LsbFirst),
            other => Err(format!("unknown packing order `{other}` (expected msb or lsb)")),
        }
    }
}

/// Fixed-size array shape: `count` elements of `element_width` bytes each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArraySpec {
    /// Width of one element in bytes
    pub element_width: usize,
    /// Number of elements
    pub count: usize,
}

/// One storage declaration, in declaration order.
///
/// For arrays `byte_width` is the width of a single element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: String,
    pub byte_width: usize,
    pub array: Option<ArraySpec>,
    /// Start a fresh slot and keep the slot to this field alone
    pub force_new_slot: bool,
    pub visibility: Visibility,
}

impl FieldSpec {
    /// A packable value-type field.
    pub fn scalar(name: impl Into<String>, byte_width: usize) -> Self {
        Self {
            name: name.into(),
            byte_width,
            array: None,
            force_new_slot: false,
            visibility: Visibility::default(),
        }
    }

    /// A fixed-size array `T[count]` with `element_width`-byte elements.
    pub fn array(name: impl Into<String>, element_width: usize, count: usize) -> Self {
        Self {
            name: name.into(),
            byte_width: element_width,
            array: Some(ArraySpec { element_width, count }),
            force_new_slot: true,
            visibility: Visibility::default(),
        }
    }

    /// Keep this field in a slot of its own.
    pub fn whole_slot(mut self) -> Self {
        self.force_new_slot = true;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn public(self) -> Self {
        self.with_visibility(Visibility::Public)
    }

    pub fn private(self) -> Self {
        self.with_visibility(Visibility::Private)
    }

    fn occupies_whole_slots(&self) -> bool {
        self.force_new_slot || self.array.is_some()
    }

    fn slot_count(&self) -> usize {
        self.array.map_or(1, |a| a.count)
    }

    fn validate(&self) -> Result<(), LayoutError> {
        if self.name.trim().is_empty() {
            return Err(LayoutError::invalid(&self.name, "field name is empty"));
        }
        if self.byte_width == 0 {
            return Err(LayoutError::invalid(&self.name, "zero-width field"));
        }
        if self.byte_width > WORD_BYTES {
            return Err(LayoutError::invalid(
                &self.name,
                format!("width {} exceeds the {WORD_BYTES}-byte slot", self.byte_width),
            ));
        }
        if let Some(array) = self.array {
            if array.count == 0 {
                return Err(LayoutError::invalid(&self.name, "array has no elements"));
            }
            if array.element_width != self.byte_width {
                return Err(LayoutError::invalid(
                    &self.name,
                    "array element width disagrees with field width",
                ));
            }
        }
        Ok(())
    }
}

/// Where one value lives: slot index plus a byte window inside the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotPlacement {
    pub slot: U256,
    /// Offset of the first byte, counted from the most-significant byte
    pub offset: usize,
    pub width: usize,
}

impl SlotPlacement {
    /// Byte window inside the slot's 32-byte word.
    pub fn byte_range(&self) -> Range<usize> {
        self.offset..self.offset + self.width
    }
}

/// Resolved placements of one declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldLayout {
    pub name: String,
    pub visibility: Visibility,
    pub is_array: bool,
    /// One entry for a scalar, one per element for an array
    pub placements: Vec<SlotPlacement>,
}

impl FieldLayout {
    /// Selector of every value in this field (`name` or `name[i]`).
    pub fn selectors(&self) -> Vec<String> {
        if self.is_array {
            (0..self.placements.len()).map(|i| format!("{}[{i}]", self.name)).collect()
        } else {
            vec![self.name.clone()]
        }
    }
}

/// Resolved storage layout of one contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotLayout {
    pub order: PackingOrder,
    fields: Vec<FieldLayout>,
}

impl SlotLayout {
    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldLayout] {
        &self.fields
    }

    /// Look up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a single value by selector: `locked` for a scalar, `data[2]` for
    /// an array element. A bare array name does not select a single value.
    pub fn placement(&self, selector: &str) -> Option<SlotPlacement> {
        match parse_element_selector(selector) {
            Some((name, index)) => {
                let field = self.field(name)?;
                if !field.is_array {
                    return None;
                }
                field.placements.get(index).copied()
            }
            None => {
                let field = self.field(selector)?;
                if field.is_array {
                    return None;
                }
                field.placements.first().copied()
            }
        }
    }

    /// Every `(selector, placement)` pair, in storage order.
    pub fn entries(&self) -> Vec<(String, SlotPlacement)> {
        self.fields
            .iter()
            .flat_map(|f| f.selectors().into_iter().zip(f.placements.iter().copied()))
            .collect()
    }

    /// Number of slots the layout spans.
    pub fn slot_count(&self) -> U256 {
        self.fields
            .iter()
            .flat_map(|f| f.placements.iter())
            .map(|p| p.slot + U256::from(1))
            .max()
            .unwrap_or(U256::ZERO)
    }

    /// The storage section of the `Privacy` target contract:
    ///
    /// ```text
    /// bool public locked = true;                         // slot 0
    /// uint256 public ID = block.timestamp;               // slot 1
    /// uint8 private flattening = 10;                     // slot 2
    /// uint8 private denomination = 255;                  // slot 2
    /// uint16 private awkwardness = uint16(block.timestamp); // slot 2
    /// bytes32[3] private data;                           // slots 3, 4, 5
    /// ```
    pub fn privacy_fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::scalar("locked", 1).public(),
            FieldSpec::scalar("ID", 32).public(),
            FieldSpec::scalar("flattening", 1).private(),
            FieldSpec::scalar("denomination", 1).private(),
            FieldSpec::scalar("awkwardness", 2).private(),
            FieldSpec::array("data", 32, 3).private(),
        ]
    }

    /// Resolved layout of the `Privacy` target.
    pub fn privacy() -> Self {
        resolve(&Self::privacy_fields()).expect("privacy layout is well-formed")
    }
}

/// Split `name[index]` into its parts.
fn parse_element_selector(selector: &str) -> Option<(&str, usize)> {
    let (name, rest) = selector.split_once('[')?;
    let index = rest.strip_suffix(']')?.trim().parse().ok()?;
    Some((name.trim(), index))
}

/// Resolve a storage layout with the most-significant-first convention.
pub fn resolve(fields: &[FieldSpec]) -> Result<SlotLayout, LayoutError> {
    resolve_with(fields, PackingOrder::MsbFirst)
}

/// Resolve a storage layout, measuring packed offsets per `order`.
///
/// Slot assignment is identical for both orders; only the byte offset of
/// values narrower than a slot differs.
pub fn resolve_with(fields: &[FieldSpec], order: PackingOrder) -> Result<SlotLayout, LayoutError> {
    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        field.validate()?;
        if !seen.insert(field.name.as_str()) {
            return Err(LayoutError::invalid(&field.name, "declared more than once"));
        }
    }

    let one = U256::from(1);
    let mut current_slot = U256::ZERO;
    let mut used_bytes = 0usize;
    let mut resolved = Vec::with_capacity(fields.len());

    for field in fields {
        let placements = if field.occupies_whole_slots() {
            if used_bytes > 0 {
                current_slot += one;
                used_bytes = 0;
            }
            let count = field.slot_count();
            let offset = order.whole_slot_offset(field.byte_width);
            let placements = (0..count)
                .map(|i| SlotPlacement {
                    slot: current_slot + U256::from(i),
                    offset,
                    width: field.byte_width,
                })
                .collect();
            current_slot += U256::from(count);
            placements
        } else {
            if used_bytes + field.byte_width > WORD_BYTES {
                current_slot += one;
                used_bytes = 0;
            }
            let placement = SlotPlacement {
                slot: current_slot,
                offset: order.packed_offset(used_bytes, field.byte_width),
                width: field.byte_width,
            };
            used_bytes += field.byte_width;
            vec![placement]
        };

        resolved.push(FieldLayout {
            name: field.name.clone(),
            visibility: field.visibility,
            is_array: field.array.is_some(),
            placements,
        });
    }

    Ok(SlotLayout { order, fields: resolved })
}
