//! Ingestion of ARGO oceanographic float profiles.
//!
//! NetCDF profile files are decoded into per-level measurements and per-cast
//! profile summaries, upserted into SQLite, and indexed by a text vectorizer so
//! profiles can be found by free-text similarity.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite connection setup and schema
//! - [`dataset`]: NetCDF reading, ARGO decoding, and profile aggregation
//! - [`ocean`]: Pressure-to-depth conversion and ocean region classification
//! - [`embedding`]: Text vectorizers and the persisted profile embedding index
//! - [`store`]: Idempotent upsert, filtered queries, and statistics
//! - [`pipeline`]: Directory ingestion orchestrating all of the above

pub mod config;
pub mod dataset;
pub mod db;
pub mod embedding;
pub mod ocean;
pub mod pipeline;
pub mod store;
