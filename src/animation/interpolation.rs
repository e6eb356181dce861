use crate::core::geo::LatLng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Easing curves available to camera moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingFunction {
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInOutSine,
}

impl EasingFunction {
    /// Apply the easing function to a normalized time value (0.0 to 1.0)
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingFunction::Linear => t,
            EasingFunction::EaseInQuad => t * t,
            EasingFunction::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            EasingFunction::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            EasingFunction::EaseInCubic => t * t * t,
            EasingFunction::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            EasingFunction::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            EasingFunction::EaseInOutSine => -(((PI * t).cos() - 1.0) / 2.0),
        }
    }
}

impl Default for EasingFunction {
    fn default() -> Self {
        EasingFunction::EaseInOutCubic
    }
}

/// Camera interpolation helpers
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two f64 values
    pub fn linear(start: f64, end: f64, t: f64) -> f64 {
        start + (end - start) * t
    }

    /// Interpolate between two LatLng coordinates along the shorter way
    /// around the antimeridian. The result longitude is wrapped.
    pub fn lat_lng(start: &LatLng, end: &LatLng, t: f64) -> LatLng {
        let mut end_lng = end.lng;
        let delta = end_lng - start.lng;
        if delta > 180.0 {
            end_lng -= 360.0;
        } else if delta < -180.0 {
            end_lng += 360.0;
        }
        let lng = Self::linear(start.lng, end_lng, t);
        let lng = if (-180.0..=180.0).contains(&lng) {
            lng
        } else {
            LatLng::wrap_lng(lng)
        };
        LatLng::new(Self::linear(start.lat, end.lat, t), lng)
    }
}
