//! Radius-to-bounding-box math on a spherical Earth.
//!
//! A [`BoundingBox`] is the axis-aligned latitude/longitude rectangle around a
//! [`Coordinate`] that covers a search radius. The latitude half-height is the
//! angular radius itself; the longitude half-width is widened by
//! `1 / cos(latitude)` to account for meridians converging away from the
//! equator. Results are not clamped to ±90° and do not wrap across ±180°.

use serde::{Deserialize, Serialize};

use crate::error::ProximityError;

/// Mean Earth radius used for every box computation.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Radius used when a caller does not ask for one.
pub const DEFAULT_RADIUS_MILES: f64 = 0.5;

/// Latitudes closer than this to ±90° make the longitude correction diverge.
pub const POLE_EPSILON_DEGREES: f64 = 1e-6;

/// A (latitude, longitude) pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude:  f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Rejects non-finite values and anything outside [-90, 90] × [-180, 180].
    pub fn validate(&self) -> Result<(), ProximityError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lon_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(ProximityError::InvalidCoordinate {
                latitude:  self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Degree bounds of a search area. Field names are part of the tool wire format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east:  f64,
    pub west:  f64,
}

impl BoundingBox {
    /// Midpoint of the box in both axes.
    pub fn center(&self) -> Coordinate {
        Coordinate::new((self.north + self.south) / 2.0, (self.east + self.west) / 2.0)
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        (self.south..=self.north).contains(&point.latitude)
            && (self.west..=self.east).contains(&point.longitude)
    }

    pub fn latitude_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn longitude_span(&self) -> f64 {
        self.east - self.west
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{{north: {}, south: {}, east: {}, west: {}}}",
            self.north, self.south, self.east, self.west
        )
    }
}

/// A center point and the radius to search around it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusQuery {
    pub center:       Coordinate,
    pub radius_miles: f64,
}

impl RadiusQuery {
    pub fn new(center: Coordinate, radius_miles: f64) -> Self {
        Self { center, radius_miles }
    }

    pub fn bounding_box(&self) -> Result<BoundingBox, ProximityError> {
        compute_bounding_box(self.center, self.radius_miles)
    }
}

/// Computes the box that encloses `radius_miles` around `coordinate`.
///
/// # Errors
/// - [`ProximityError::InvalidCoordinate`] for out-of-range or non-finite degrees
/// - [`ProximityError::InvalidRadius`] for zero, negative or non-finite radii
/// - [`ProximityError::DegeneratePole`] within [`POLE_EPSILON_DEGREES`] of a pole
pub fn compute_bounding_box(
    coordinate:   Coordinate,
    radius_miles: f64,
) -> Result<BoundingBox, ProximityError> {
    coordinate.validate()?;
    if !radius_miles.is_finite() || radius_miles <= 0.0 {
        return Err(ProximityError::InvalidRadius(radius_miles));
    }
    if 90.0 - coordinate.latitude.abs() < POLE_EPSILON_DEGREES {
        return Err(ProximityError::DegeneratePole(coordinate.latitude));
    }

    let latitude_radians  = coordinate.latitude.to_radians();
    let longitude_radians = coordinate.longitude.to_radians();

    let angular_radius  = radius_miles / EARTH_RADIUS_MILES;
    let longitude_delta = angular_radius / latitude_radians.cos();

    Ok(BoundingBox {
        north: (latitude_radians + angular_radius).to_degrees(),
        south: (latitude_radians - angular_radius).to_degrees(),
        east:  (longitude_radians + longitude_delta).to_degrees(),
        west:  (longitude_radians - longitude_delta).to_degrees(),
    })
}
