//! Type definitions module.
//!
//! Contains shared types used across the application.

pub mod forms;
pub mod token;
pub mod tx;

pub use forms::*;
pub use token::*;
pub use tx::*;
