//! Domain models
//!
//! This module contains all domain models used throughout the service.

pub mod competition;
pub mod submission;
pub mod verdict;

pub use competition::*;
pub use submission::*;
pub use verdict::*;
