use crate::data::listing::{ListingPoint, PropertyKind, TransactionKind};
use crate::prelude::HashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

/// Outline of a price chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeClass {
    Rounded,
    Pill,
    Square,
    Diamond,
    Circle,
    /// Used when the property kind is not recognized
    Tag,
}

/// Visual style of a listing marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleToken {
    pub color: Rgba,
    pub shape: ShapeClass,
}

pub const SALE_COLOR: Rgba = Rgba::from_rgb(0x1e, 0x88, 0xe5);
pub const RENT_COLOR: Rgba = Rgba::from_rgb(0x43, 0xa0, 0x47);
pub const DEFAULT_COLOR: Rgba = Rgba::from_rgb(0x75, 0x75, 0x75);

fn transaction_color(kind: TransactionKind) -> Option<Rgba> {
    match kind {
        TransactionKind::Sale => Some(SALE_COLOR),
        TransactionKind::Rent => Some(RENT_COLOR),
        TransactionKind::Other => None,
    }
}

fn property_color(kind: PropertyKind) -> Option<Rgba> {
    match kind {
        PropertyKind::Apartment => Some(Rgba::from_rgb(0x3f, 0x51, 0xb5)),
        PropertyKind::House => Some(Rgba::from_rgb(0xef, 0x6c, 0x00)),
        PropertyKind::Land => Some(Rgba::from_rgb(0x6d, 0x4c, 0x41)),
        PropertyKind::Commercial => Some(Rgba::from_rgb(0x8e, 0x24, 0xaa)),
        PropertyKind::Parking => Some(Rgba::from_rgb(0x54, 0x6e, 0x7a)),
        PropertyKind::Other => None,
    }
}

fn shape_for(kind: PropertyKind) -> ShapeClass {
    match kind {
        PropertyKind::Apartment => ShapeClass::Rounded,
        PropertyKind::House => ShapeClass::Pill,
        PropertyKind::Land => ShapeClass::Square,
        PropertyKind::Commercial => ShapeClass::Diamond,
        PropertyKind::Parking => ShapeClass::Circle,
        PropertyKind::Other => ShapeClass::Tag,
    }
}

/// Style for a category pair.
///
/// Color comes from the transaction kind when it is known, otherwise from the
/// property kind, otherwise the default. Shape always follows the property kind.
pub fn style_for(transaction: TransactionKind, property: PropertyKind) -> StyleToken {
    let color = transaction_color(transaction)
        .or_else(|| property_color(property))
        .unwrap_or(DEFAULT_COLOR);
    StyleToken {
        color,
        shape: shape_for(property),
    }
}

/// Memoizing front for [`style_for`]
#[derive(Debug, Default)]
pub struct StyleResolver {
    cache: HashMap<(TransactionKind, PropertyKind), StyleToken>,
}

impl StyleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, listing: &ListingPoint) -> StyleToken {
        self.resolve_kinds(listing.transaction_kind, listing.property_kind)
    }

    pub fn resolve_kinds(
        &mut self,
        transaction: TransactionKind,
        property: PropertyKind,
    ) -> StyleToken {
        *self
            .cache
            .entry((transaction, property))
            .or_insert_with(|| style_for(transaction, property))
    }

    /// Number of distinct category pairs resolved so far
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
