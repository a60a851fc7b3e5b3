//! Format-level building blocks
//!
//! Everything needed to turn registered disks, memories and dispatch cases
//! into host word lists and host source text. [`crate::Session`] ties these
//! together behind a name registry.

pub mod allocator;
pub mod codec;
pub mod config;
pub mod disk;
pub mod dispatch;
pub mod error;
pub mod header;
pub mod layout;
pub mod memory;
pub mod render;
pub mod text;
pub mod validation;
