//! Bizsearch Core Library
//!
//! Domain logic and ports for the business search service: opening hours
//! compression, the provider record format, and the cache and provider
//! traits the server plugs its backends into.

// Re-export pure types from bizsearch-types
pub use bizsearch_types::*;

pub mod error;
pub mod opening_hours;
pub mod ports;
pub mod record;

pub use error::{Result, SearchError};
pub use opening_hours::compress_opening_hours;
pub use ports::{BusinessProvider, CacheStore};
pub use record::{ProviderContact, ProviderRecord};
