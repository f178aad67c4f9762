//! calref-provider-google - Google Calendar access for calref
//!
//! Holds everything that talks to Google: the OAuth client configuration,
//! the cached credential, the loopback authorization flow, and the
//! `GoogleGateway` implementation of `CalendarGateway`.

pub mod app_config;
pub mod auth;
pub mod credential;
pub mod gateway;
pub mod loopback;

pub use auth::{CredentialStore, SCOPES};
pub use gateway::GoogleGateway;
