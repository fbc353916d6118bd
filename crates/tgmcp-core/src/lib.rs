//! Core logic for the tgmcp Telegram tool server.
//!
//! This crate is intentionally client-agnostic. The Telegram client library
//! lives behind the [`port::TelegramPort`] trait implemented in the adapter
//! crate; everything here (tool functions, registry, error normalization,
//! formatting) works against that port and is testable with a mock.

pub mod config;
pub mod entity;
pub mod errors;
pub mod logging;
pub mod normalize;
pub mod port;
pub mod registry;
pub mod tools;

pub use errors::{Error, Result};
