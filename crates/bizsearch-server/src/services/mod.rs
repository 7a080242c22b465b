//! Business logic services

pub mod business_data;

pub use business_data::BusinessDataService;
