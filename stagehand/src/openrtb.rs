//! Minimal OpenRTB 2.x request model.
//!
//! Only the parts of the bid request that hooks may observe or mutate are
//! modeled here; the full request tree lives with the exchange. Fields
//! follow OpenRTB naming so the structs serialize to wire-compatible JSON.

use serde::{Deserialize, Serialize};

/// Top-level bid request object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BidRequest {
    /// Unique ID of the bid request.
    #[serde(default)]
    pub id: String,

    /// Details about the human user of the device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    /// Maximum time in milliseconds the exchange allows for bids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmax: Option<i64>,
}

/// The human user of the device; the advertising audience.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Exchange-specific ID for the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Year of birth as a 4-digit integer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yob: Option<i64>,

    /// GDPR consent string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent: Option<String>,
}
