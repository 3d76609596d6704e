//! IMAP authentication with per-host system role mapping.
//!
//! This crate is meant to be embedded in an identity system that owns users,
//! sessions and role storage. It provides:
//!
//! - `auth`: authenticate-only IMAP probes and the ordered host chain
//! - `registry`: configured hosts and the roles mapped to them
//! - `config`: reconciling sparse stored settings, defaults and persistence
//! - `roles`: assigning the role of the host that accepted a login
//! - `form`: data for the settings page
//! - `storage`: the key/value settings store interface
//! - `plugin`: the [`ImapPlusAuth`] facade tying it all together

pub mod auth;
pub mod config;
pub mod error;
pub mod form;
pub mod plugin;
pub mod registry;
pub mod roles;
pub mod storage;

pub use error::{AuthError, Result};
pub use plugin::ImapPlusAuth;
