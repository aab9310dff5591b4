//! Core types and trait definitions for the EduMap dashboard backend.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the region data model, the aggregated payload shape, the [`RegionStore`]
//! abstraction and the identity reconciler that maps loosely-labelled
//! geometry features onto canonical region codes.
//!
//! [`RegionStore`]: store::RegionStore

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aliases;
pub mod error;
pub mod payload;
pub mod reconcile;
pub mod region;
pub mod store;

pub use error::{Error, Result};
