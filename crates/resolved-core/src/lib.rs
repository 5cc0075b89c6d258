//! Core types and the resolution state machine for forum discussions.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage and authorization are collaborators passed in through the
//! [`store::DiscussionStore`] and [`authz::Authorizer`] traits; hosts call the
//! engine's methods directly from their own comment-save and moderation paths.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod authz;
pub mod discussion;
pub mod engine;
pub mod error;
pub mod listing;
pub mod store;
pub mod view;

pub use error::{Error, Result};

#[cfg(test)]
mod testing;
