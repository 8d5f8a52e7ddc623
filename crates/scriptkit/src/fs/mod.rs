//! File-read capability for Scriptkit
//!
//! Provides an async filesystem trait and implementations:
//! - `InMemoryFs`: Simple in-memory filesystem for embedders and tests

mod memory;
mod traits;

pub use memory::InMemoryFs;
pub use traits::FileSystem;
