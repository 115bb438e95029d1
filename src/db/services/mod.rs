//! The `services` module provides a high-level API for interacting with the
//! database. It encapsulates the query and mutation logic so the HTTP handlers
//! can work with domain models without knowing about the underlying schema.
//!
//! Every function takes the authenticated caller's `user_id` and scopes its
//! queries to it; a row belonging to another user is indistinguishable from a
//! row that does not exist.

pub mod recipe_service;
pub mod tag_service;

pub use recipe_service::*;
pub use tag_service::*;
