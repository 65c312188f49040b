//! Core domain model for discoteca.
//!
//! This crate defines the song model (catalog records and the transient
//! metadata candidates produced by the resolver), per-field provenance,
//! the genre/decade taxonomy that drives the library layout, and the
//! SQLite catalog schema.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod provenance;
pub mod schema;
pub mod taxonomy;

pub use error::{Error, Result};
