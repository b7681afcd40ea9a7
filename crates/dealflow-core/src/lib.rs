//! Core types and trait definitions for the dealflow investment CRM.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod actor;
pub mod application;
pub mod company;
pub mod deliberation;
pub mod dispatch;
pub mod error;
pub mod pipeline;
pub mod rejection;
pub mod stage;
pub mod store;
pub mod ticket;

pub use error::{Error, Result};
