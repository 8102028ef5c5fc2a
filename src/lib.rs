//! Client library for the Qanouni legal-document assistant backend.
//!
//! The load-bearing piece is [`session::SessionGuard`]: a single outbound
//! request path that attaches the stored bearer credential to every API call
//! and tears the session down on any 401. Everything else — the typed
//! endpoint wrappers in [`api`], the role-based [`permissions`] gate, the
//! terminal [`ui`] — sits on top of that contract:
//!
//! > Every API call is either authenticated-and-monitored, or the session
//! > is torn down.

pub mod api;
pub mod config;
pub mod error;
pub mod permissions;
pub mod session;
pub mod ui;
