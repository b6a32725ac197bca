// src/ingest/providers/mod.rs
pub mod fixture;

pub use fixture::FixtureAdapter;
