//! Core types and trait definitions for the Enchanted Tome catalog.
//!
//! This crate has no HTTP or database dependencies.
//! All other crates depend on it.

// Native `async fn` in trait impls; the traits spell out `Send` futures.
#![allow(async_fn_in_trait)]

pub mod book;
pub mod catalog;
pub mod error;
pub mod identity;
pub mod store;
pub mod user;

pub use error::{Error, Result};
