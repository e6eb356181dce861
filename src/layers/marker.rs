use crate::core::{config::MarkerConfig, geo::LatLng};
use crate::data::listing::ListingPoint;
use crate::rendering::surface::ElementId;
use crate::spatial::clustering::{abbreviate_count, ClusterFeature, ClusterId};
use crate::ui::style::{StyleResolver, StyleToken};
use std::fmt;

/// Stable identity of a rendered marker across reconciliation passes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerKey {
    Point(String),
    Cluster(ClusterId),
}

impl MarkerKey {
    pub fn kind(&self) -> MarkerKind {
        match self {
            MarkerKey::Point(_) => MarkerKind::Point,
            MarkerKey::Cluster(_) => MarkerKind::Cluster,
        }
    }
}

impl fmt::Display for MarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerKey::Point(id) => write!(f, "point:{}", id),
            MarkerKey::Cluster(id) => write!(f, "cluster:{}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Cluster,
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeSize {
    Small,
    Medium,
    Large,
}

impl BadgeSize {
    pub fn for_count(count: usize, config: &MarkerConfig) -> Self {
        if count < config.medium_threshold {
            BadgeSize::Small
        } else if count < config.large_threshold {
            BadgeSize::Medium
        } else {
            BadgeSize::Large
        }
    }

    /// Badge diameter in pixels
    pub fn diameter(&self) -> f64 {
        match self {
            BadgeSize::Small => 30.0,
            BadgeSize::Medium => 40.0,
            BadgeSize::Large => 50.0,
        }
    }
}

/// What the surface draws for a marker
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicElement {
    ClusterBadge {
        count: usize,
        size: BadgeSize,
        label: String,
    },
    PriceChip {
        label: String,
        style: StyleToken,
    },
}

impl GraphicElement {
    pub fn cluster_badge(count: usize, config: &MarkerConfig) -> Self {
        GraphicElement::ClusterBadge {
            count,
            size: BadgeSize::for_count(count, config),
            label: abbreviate_count(count),
        }
    }

    pub fn price_chip(
        listing: &ListingPoint,
        styles: &mut StyleResolver,
        formatter: &dyn PriceFormatter,
    ) -> Self {
        GraphicElement::PriceChip {
            label: formatter.format(listing.price),
            style: styles.resolve(listing),
        }
    }

    /// Graphic for a query feature
    pub fn for_feature(
        feature: &ClusterFeature,
        config: &MarkerConfig,
        styles: &mut StyleResolver,
        formatter: &dyn PriceFormatter,
    ) -> Self {
        match feature {
            ClusterFeature::Cluster { point_count, .. } => Self::cluster_badge(*point_count, config),
            ClusterFeature::Leaf { point } => Self::price_chip(point, styles, formatter),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            GraphicElement::ClusterBadge { label, .. } | GraphicElement::PriceChip { label, .. } => {
                label
            }
        }
    }
}

/// A marker currently attached to the map surface
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerHandle {
    pub key: MarkerKey,
    pub kind: MarkerKind,
    pub position: LatLng,
    pub element: ElementId,
    pub graphic: GraphicElement,
}

impl MarkerHandle {
    pub fn is_cluster(&self) -> bool {
        self.kind == MarkerKind::Cluster
    }
}

/// Turns a listing price into chip text
pub trait PriceFormatter {
    fn format(&self, price: f64) -> String;
}

/// `850K`, `1.2M` style labels with an optional currency prefix
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompactPriceFormatter {
    pub currency_symbol: String,
}

impl CompactPriceFormatter {
    pub fn with_symbol(symbol: impl Into<String>) -> Self {
        Self {
            currency_symbol: symbol.into(),
        }
    }
}

impl PriceFormatter for CompactPriceFormatter {
    fn format(&self, price: f64) -> String {
        if !price.is_finite() {
            return "?".to_string();
        }

        let magnitude = price.abs();
        let body = if magnitude >= 999_950.0 {
            format!("{}M", one_decimal(price / 1_000_000.0))
        } else if magnitude >= 1000.0 {
            format!("{}K", one_decimal(price / 1000.0))
        } else {
            format!("{}", price.round())
        };
        format!("{}{}", self.currency_symbol, body)
    }
}

fn one_decimal(value: f64) -> String {
    let text = format!("{:.1}", value);
    match text.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => text,
    }
}
