//! Infrastructure adapters. Implement outbound ports.
//!
//! Customer stores, CSV transfer, terminal UI. Map errors to DomainError.

pub mod persistence;
pub mod transfer;
pub mod ui;
