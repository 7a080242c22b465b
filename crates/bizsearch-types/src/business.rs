//! Business record types

use crate::WorkingHours;
use serde::{Deserialize, Serialize};

/// A business as returned by the search endpoint
///
/// Built fresh from the provider on every cache miss and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub name: String,
    pub address: String,
    pub website: String,
    pub phone: String,
    pub working_hours: WorkingHours,
}
