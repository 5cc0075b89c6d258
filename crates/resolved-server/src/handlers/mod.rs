//! axum handlers, one module per resource.

pub mod comments;
pub mod discussions;
pub mod unresolved;
