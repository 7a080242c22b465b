//! Ports the server implements: where businesses come from and where they
//! are cached.

pub mod cache;
pub mod provider;

pub use cache::CacheStore;
pub use provider::BusinessProvider;
