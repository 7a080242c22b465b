//! Provider record format
//!
//! Only the fields the service consumes are modelled; everything else the
//! provider sends is ignored.

use crate::RawOpeningHours;
use serde::Deserialize;

/// One business as returned by the provider API
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderRecord {
    pub displayed_what: String,
    pub displayed_where: String,
    #[serde(default)]
    pub addresses: Vec<ProviderAddress>,
    #[serde(default)]
    pub opening_hours: ProviderOpeningHours,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderAddress {
    #[serde(default)]
    pub contacts: Vec<ProviderContact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderContact {
    pub contact_type: String,
    #[serde(default)]
    pub call_link: Option<String>,
    #[serde(default)]
    pub service_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderOpeningHours {
    #[serde(default)]
    pub days: RawOpeningHours,
}

impl ProviderRecord {
    /// Contacts of the primary (first) address
    pub fn contacts(&self) -> &[ProviderContact] {
        self.addresses
            .first()
            .map(|address| address.contacts.as_slice())
            .unwrap_or_default()
    }

    /// First contact of the given type on the primary address
    pub fn contact(&self, contact_type: &str) -> Option<&ProviderContact> {
        self.contacts()
            .iter()
            .find(|contact| contact.contact_type == contact_type)
    }

    /// `call_link` of the first `phone` contact
    pub fn phone(&self) -> Option<&str> {
        self.contact("phone")?.call_link.as_deref()
    }

    /// `service_code` of the first `url` contact
    pub fn website(&self) -> Option<&str> {
        self.contact("url")?.service_code.as_deref()
    }
}
