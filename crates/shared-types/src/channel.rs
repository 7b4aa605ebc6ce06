//! # Broadcast Channels
//!
//! Names of the rooms the router fans events out to.
//!
//! | Channel | Wire name | Subscribers |
//! |---------|-----------|-------------|
//! | `Vendor(id)` | `vendor:<id>` | the vendor, and customers tracking it |
//! | `Customer(id)` | `customer:<id>` | the customer's own connections |
//! | `VendorFeed` | `vendor-feed:global` | every connected customer |
//! | `VendorOrders(id)` | `vendor-orders:<id>` | the vendor's own connections only |

use crate::entities::{CustomerId, VendorId};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const VENDOR_PREFIX: &str = "vendor:";
const CUSTOMER_PREFIX: &str = "customer:";
const VENDOR_FEED: &str = "vendor-feed:global";
const VENDOR_ORDERS_PREFIX: &str = "vendor-orders:";

/// A named broadcast group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Vendor(VendorId),
    Customer(CustomerId),
    VendorFeed,
    /// Incoming orders for one vendor.
    VendorOrders(VendorId),
}

impl Channel {
    pub fn vendor(id: &VendorId) -> Self {
        Channel::Vendor(id.clone())
    }

    pub fn customer(id: &CustomerId) -> Self {
        Channel::Customer(id.clone())
    }

    pub fn vendor_orders(id: &VendorId) -> Self {
        Channel::VendorOrders(id.clone())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Vendor(id) => write!(f, "{VENDOR_PREFIX}{id}"),
            Channel::Customer(id) => write!(f, "{CUSTOMER_PREFIX}{id}"),
            Channel::VendorFeed => f.write_str(VENDOR_FEED),
            Channel::VendorOrders(id) => write!(f, "{VENDOR_ORDERS_PREFIX}{id}"),
        }
    }
}

/// A channel name that does not match any known room shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown channel name: {0}")]
pub struct ChannelParseError(pub String);

impl FromStr for Channel {
    type Err = ChannelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == VENDOR_FEED {
            return Ok(Channel::VendorFeed);
        }
        if let Some(id) = s.strip_prefix(VENDOR_ORDERS_PREFIX).filter(|id| !id.is_empty()) {
            return Ok(Channel::VendorOrders(VendorId::new(id)));
        }
        if let Some(id) = s.strip_prefix(VENDOR_PREFIX).filter(|id| !id.is_empty()) {
            return Ok(Channel::Vendor(VendorId::new(id)));
        }
        if let Some(id) = s.strip_prefix(CUSTOMER_PREFIX).filter(|id| !id.is_empty()) {
            return Ok(Channel::Customer(CustomerId::new(id)));
        }
        Err(ChannelParseError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names() {
        assert_eq!(Channel::vendor(&VendorId::new("42")).to_string(), "vendor:42");
        assert_eq!(
            Channel::customer(&CustomerId::new("7")).to_string(),
            "customer:7"
        );
        assert_eq!(Channel::VendorFeed.to_string(), "vendor-feed:global");
        assert_eq!(
            Channel::vendor_orders(&VendorId::new("42")).to_string(),
            "vendor-orders:42"
        );
    }

    #[test]
    fn test_parse_channel() {
        assert_eq!(
            "vendor:42".parse::<Channel>().unwrap(),
            Channel::Vendor(VendorId::new("42"))
        );
        assert_eq!(
            "vendor-feed:global".parse::<Channel>().unwrap(),
            Channel::VendorFeed
        );
        assert_eq!(
            "vendor-orders:42".parse::<Channel>().unwrap(),
            Channel::VendorOrders(VendorId::new("42"))
        );
        assert!("vendor:".parse::<Channel>().is_err());
        assert!("vendor-orders:".parse::<Channel>().is_err());
        assert!("room:1".parse::<Channel>().is_err());
    }
}
