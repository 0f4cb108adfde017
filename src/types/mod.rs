//! Core types for Confab.

pub mod frame;
pub mod message;

pub use frame::*;
pub use message::*;
