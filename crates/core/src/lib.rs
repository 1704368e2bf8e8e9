//! # TransTrack Core
//!
//! Core business logic for the TransTrack organ-transplant waitlist coordinator:
//!
//! - Domain model for patients, donor organs, matches, notifications, staff and audit
//!   entries ([`model`]).
//! - Sharded JSON-document storage with typed repositories ([`repositories`]).
//! - The priority scoring engine, including the first-generation formula ([`scoring`]).
//! - The donor matching engine ([`matching`]).
//!
//! **No API concerns**: authentication, HTTP servers and wire DTOs belong in `api-rest`
//! and `api-shared`.

pub mod config;
pub mod error;
pub mod matching;
pub mod model;
pub mod repositories;
pub mod scoring;

pub use config::{resolve_data_dir, CoreConfig, DEFAULT_DATA_DIR};
pub use error::{TrackError, TrackResult};
