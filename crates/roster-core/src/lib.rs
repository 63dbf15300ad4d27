//! Core types, store traits and services for Roster append lists.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::MembershipStore`] and
//! [`notification::NotificationStore`]; transports drive the [`Roster`] and
//! [`Bulletin`] services.

pub mod access;
pub mod error;
pub mod export;
pub mod identity;
pub mod list;
pub mod list_type;
pub mod membership;
pub mod notification;
pub mod person;
pub mod roster;
pub mod store;

pub use access::{AccessConfig, EmailAllowlist, Permissions};
pub use error::{Error, Result};
pub use identity::Principal;
pub use notification::Bulletin;
pub use roster::Roster;
