//! yaizu-catalog - Yaizu smart-city API catalog scraper.
//!
//! Authenticates against the city's API catalog portal, probes its endpoints
//! for service listings, harvests PDF documentation, generates per-entity
//! FIWARE specifications and answers queries over the resulting local store.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod extract;
pub mod ngsi;
pub mod scrapers;
pub mod services;
pub mod session;
pub mod specs;
pub mod storage;
pub mod tools;
