//! Map coordinates and floorplan pins.

use super::IssueDomainError;
use serde::{Deserialize, Serialize};

/// Approximate kilometres per degree used by [`GeoPoint::approx_distance_km`].
pub const KM_PER_DEGREE: f64 = 111.0;

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Creates a validated coordinate pair.
    ///
    /// # Errors
    ///
    /// Returns [`IssueDomainError::InvalidCoordinates`] when either component
    /// is not finite or lies outside `[-90, 90]` / `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, IssueDomainError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(IssueDomainError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Returns the latitude in degrees.
    #[must_use]
    pub const fn latitude(self) -> f64 {
        self.latitude
    }

    /// Returns the longitude in degrees.
    #[must_use]
    pub const fn longitude(self) -> f64 {
        self.longitude
    }

    /// Planar distance to `other` scaled by [`KM_PER_DEGREE`].
    ///
    /// This treats degrees of latitude and longitude as equal-length axes and
    /// ignores the Earth's curvature.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "distance is an explicit floating-point approximation"
    )]
    pub fn approx_distance_km(self, other: Self) -> f64 {
        let d_lat = self.latitude - other.latitude;
        let d_lng = self.longitude - other.longitude;
        d_lat.hypot(d_lng) * KM_PER_DEGREE
    }
}

/// Search area for nearby-issue lookups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRadius {
    centre: GeoPoint,
    radius_km: f64,
}

impl SearchRadius {
    /// Default radius applied when a caller does not supply one.
    pub const DEFAULT_KM: f64 = 5.0;

    /// Creates a validated search area.
    ///
    /// # Errors
    ///
    /// Returns [`IssueDomainError::InvalidRadius`] for negative or non-finite
    /// radii.
    pub fn new(centre: GeoPoint, radius_km: f64) -> Result<Self, IssueDomainError> {
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(IssueDomainError::InvalidRadius(radius_km));
        }
        Ok(Self { centre, radius_km })
    }

    /// Returns the centre point.
    #[must_use]
    pub const fn centre(self) -> GeoPoint {
        self.centre
    }

    /// Returns the radius in kilometres.
    #[must_use]
    pub const fn radius_km(self) -> f64 {
        self.radius_km
    }

    /// Returns whether `point` lies within the radius (inclusive).
    #[must_use]
    pub fn contains(self, point: GeoPoint) -> bool {
        self.centre.approx_distance_km(point) <= self.radius_km
    }
}

/// Pin placed on a site map or interior floorplan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorplanPin {
    /// Horizontal position on the plan.
    pub x: f64,
    /// Vertical position on the plan.
    pub y: f64,
    /// Whether the pin refers to the interior floorplan rather than the site map.
    pub is_interior: bool,
}
