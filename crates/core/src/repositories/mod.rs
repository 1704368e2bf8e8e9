//! Typed repositories over the shared JSON-document store.
//!
//! One module per collection. Each knows its collection name and exposes the domain queries
//! the engines and handlers need; raw document plumbing lives in [`shared`].

pub mod audit;
pub mod donors;
pub mod matches;
pub mod notifications;
pub mod patients;
pub mod shared;
pub mod users;
pub mod weights;
