//! Bagspace desktop client: listing wizards, pricing and the marketplace API client.

pub mod domain;
pub mod infra;
pub mod util;
