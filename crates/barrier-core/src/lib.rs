//! Core types and trait definitions for the barrier determination case
//! service.
//!
//! This crate is free of HTTP and database dependencies. It holds the entity
//! model, the pure status, validation, lifecycle, query and report logic, and
//! the store, file storage and mailer traits the other crates implement.

// Native `async fn` in traits; the returned futures carry explicit `Send`
// bounds where it matters.
#![allow(async_fn_in_trait)]

pub mod audit;
pub mod case;
pub mod case_file;
pub mod error;
pub mod files;
pub mod lifecycle;
pub mod lookup;
pub mod notify;
pub mod party;
pub mod query;
pub mod reference;
pub mod report;
pub mod status;
pub mod store;
pub mod tag;
pub mod upload;
pub mod validate;

pub use error::{Error, Result};
