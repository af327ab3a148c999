//! Framework-agnostic business logic.
//!
//! Every operation takes a `sea_orm` connection and returns the crate's
//! `Result`, so the HTTP layer in `web` stays a thin translation of requests.

/// Per-edition single-document blocks (jersey, history, contact)
pub mod blocks;
/// Ordered, year-scoped list editing shared by all list-shaped content
pub mod collection;
/// Explicit confirmation for irreversible actions
pub mod confirmation;
/// Recurring event countdown
pub mod countdown;
/// Edition registry and rollover
pub mod edition;
/// Kind-specific fields of content items
pub mod payload;
/// Participant sign-up
pub mod registration;
/// Event settings singleton
pub mod settings;
