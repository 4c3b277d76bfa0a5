//! # poolkeep-types
//!
//! Shared types, errors, and configuration for the **poolkeep** custody ledger.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`AssetId`], [`EventId`]
//! - **Balance model**: [`Amount`] (256-bit), [`AssetBalance`], and the
//!   [`amount_serde`] adapter for amount fields
//! - **Access model**: [`Role`]
//! - **Audit model**: [`PoolEvent`], [`AuditRecord`]
//! - **Configuration**: [`PoolConfig`], [`AssetConfig`]
//! - **Errors**: [`PoolError`] with `PK_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod amount_serde;
pub mod balance;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod role;

// Re-export all primary types at crate root for ergonomic imports:
//   use poolkeep_types::{Address, AssetId, PoolError, PoolEvent, ...};

pub use balance::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use role::*;

// Constants are accessed via `poolkeep_types::constants::FOO`
// (not re-exported to avoid name collisions).
