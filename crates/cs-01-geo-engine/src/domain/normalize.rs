//! Coordinate normalization for vendor records of mixed provenance.

use crate::domain::distance::is_valid_coordinate;
use serde::{Deserialize, Serialize};
use shared_types::Coordinates;

/// Which input shape a coordinate was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionShape {
    /// Top-level `lat` / `lng`.
    LatLng,
    /// `location.coordinates` as GeoJSON `[lng, lat]`.
    GeoJson,
    /// `location.lat` / `location.lng`.
    NestedLatLng,
    /// Top-level `latitude` / `longitude`.
    LatitudeLongitude,
}

/// The nested `location` member of a vendor record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLocation {
    GeoJson {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        coordinates: Vec<f64>,
    },
    LatLng {
        lat: f64,
        lng: f64,
    },
}

/// Every position field a vendor record may carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPosition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<RawLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl RawPosition {
    pub fn from_lat_lng(lat: f64, lng: f64) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
            ..Self::default()
        }
    }

    /// Resolve to the first present and valid shape, in precedence order.
    ///
    /// `(0, 0)` is treated as an unset placeholder, not a real position.
    pub fn resolve(&self) -> Option<(Coordinates, PositionShape)> {
        self.candidates()
            .into_iter()
            .flatten()
            .find(|(c, _)| usable(*c))
    }

    /// Resolve and discard the shape.
    pub fn normalize(&self) -> Option<Coordinates> {
        self.resolve().map(|(coordinates, _)| coordinates)
    }

    fn candidates(&self) -> [Option<(Coordinates, PositionShape)>; 4] {
        let top = pair(self.lat, self.lng).map(|c| (c, PositionShape::LatLng));

        let (geo, nested) = match &self.location {
            Some(RawLocation::GeoJson { coordinates, .. }) => {
                let geo = match coordinates.as_slice() {
                    [lng, lat, ..] => Some((Coordinates::new(*lat, *lng), PositionShape::GeoJson)),
                    _ => None,
                };
                (geo, None)
            }
            Some(RawLocation::LatLng { lat, lng }) => (
                None,
                Some((Coordinates::new(*lat, *lng), PositionShape::NestedLatLng)),
            ),
            None => (None, None),
        };

        let flat = pair(self.latitude, self.longitude)
            .map(|c| (c, PositionShape::LatitudeLongitude));

        [top, geo, nested, flat]
    }
}

fn pair(lat: Option<f64>, lng: Option<f64>) -> Option<Coordinates> {
    Some(Coordinates::new(lat?, lng?))
}

fn usable(c: Coordinates) -> bool {
    is_valid_coordinate(c.lat, c.lng) && !(c.lat == 0.0 && c.lng == 0.0)
}
