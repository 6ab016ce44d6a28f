pub mod client;
pub mod degrade;
pub mod dto;

pub use client::{ApiClient, Subject};
pub use degrade::{fetch_or_degrade, settle, Degraded, Fetched};
