use cs_01_geo_engine::Locatable;
use shared_types::{Coordinates, VendorId, VendorLocation};

/// A vendor's request to move its pin.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationUpdate {
    pub vendor_id: VendorId,
    pub lat: f64,
    pub lng: f64,
    pub current_stop: Option<String>,
}

impl LocationUpdate {
    pub fn new(vendor_id: VendorId, lat: f64, lng: f64) -> Self {
        Self {
            vendor_id,
            lat,
            lng,
            current_stop: None,
        }
    }

    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.current_stop = Some(stop.into());
        self
    }
}

/// Last-known location together with the vendor's online flag.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedVendor {
    pub location: VendorLocation,
    pub is_online: bool,
}

impl Locatable for TrackedVendor {
    fn vendor_id(&self) -> &VendorId {
        &self.location.vendor_id
    }

    fn position(&self) -> Option<Coordinates> {
        self.location.position()
    }
}
