//! Radius-bounded vendor discovery.

use crate::domain::distance::{distance_between, validate};
use crate::domain::errors::GeoError;
use crate::domain::normalize::RawPosition;
use serde::{Deserialize, Serialize};
use shared_types::{Coordinates, VendorId, VendorLocation};
use std::cmp::Ordering;
use tracing::warn;

/// Anything that can be placed on the map.
pub trait Locatable {
    fn vendor_id(&self) -> &VendorId;

    /// Normalized position, or `None` if the record has no usable one.
    fn position(&self) -> Option<Coordinates>;
}

impl Locatable for VendorLocation {
    fn vendor_id(&self) -> &VendorId {
        &self.vendor_id
    }

    fn position(&self) -> Option<Coordinates> {
        RawPosition::from_lat_lng(self.lat, self.lng).normalize()
    }
}

impl<T: Locatable> Locatable for &T {
    fn vendor_id(&self) -> &VendorId {
        (**self).vendor_id()
    }

    fn position(&self) -> Option<Coordinates> {
        (**self).position()
    }
}

/// A vendor record as received from upstream, position in any shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorRecord {
    pub vendor_id: VendorId,
    #[serde(flatten)]
    pub position: RawPosition,
}

impl Locatable for VendorRecord {
    fn vendor_id(&self) -> &VendorId {
        &self.vendor_id
    }

    fn position(&self) -> Option<Coordinates> {
        self.position.normalize()
    }
}

/// A vendor paired with its distance from the query origin.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceResult<V> {
    pub vendor: V,
    pub distance_km: f64,
}

/// Vendors within `radius_km` of `origin`, nearest first.
///
/// Ties are broken by vendor id. Vendors with no resolvable position are
/// skipped. Fails only for an invalid origin or a negative/non-finite radius.
pub fn within_radius<V, I>(
    vendors: I,
    origin: Coordinates,
    radius_km: f64,
) -> Result<Vec<DistanceResult<V>>, GeoError>
where
    V: Locatable,
    I: IntoIterator<Item = V>,
{
    let origin = validate(origin.lat, origin.lng)?;
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(GeoError::InvalidRadius(radius_km));
    }

    let mut results: Vec<DistanceResult<V>> = vendors
        .into_iter()
        .filter_map(|vendor| {
            let Some(position) = vendor.position() else {
                warn!(vendor_id = %vendor.vendor_id(), "Skipping vendor without usable position");
                return None;
            };
            let distance_km = distance_between(origin, position);
            (distance_km <= radius_km).then_some(DistanceResult {
                vendor,
                distance_km,
            })
        })
        .collect();

    results.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.vendor.vendor_id().cmp(b.vendor.vendor_id()))
    });

    Ok(results)
}
