//! Core types and reconciliation engine for calref.
//!
//! - `event`: the calendar event record as returned by the hosted API
//! - `algebra`: id-keyed event sets, intersection and union
//! - `reference`: which calendars to trust and the merged reference map
//! - `completion`: replacing redacted events with reference copies
//! - `reconcile`: the end-to-end pipeline over a `CalendarGateway`

pub mod algebra;
pub mod cancel;
pub mod completion;
pub mod constants;
pub mod directory;
pub mod error;
pub mod event;
pub mod gateway;
pub mod reconcile;
pub mod reference;
pub mod window;

pub use error::{CalRefError, CalRefResult};
pub use event::*;
