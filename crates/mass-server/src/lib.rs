//! Route risk service: sources, cache, MCSSE bridge and REST API around `mass-core`.

pub mod api;
pub mod backoff;
pub mod bridge;
pub mod cache;
pub mod config;
pub mod loops;
pub mod sources;
pub mod state;
