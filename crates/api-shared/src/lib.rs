//! # API Shared
//!
//! Shared utilities and definitions for the TransTrack REST surface.
//!
//! Contains:
//! - Request/response DTOs (`dto` module)
//! - Shared services like `HealthService`
//! - Authentication utilities
//!
//! Used by `api-rest` and the combined runner for common functionality.

pub mod auth;
pub mod dto;
pub mod health;

pub use health::HealthService;
