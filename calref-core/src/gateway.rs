//! The seam between the engine and the hosted calendar service.

use async_trait::async_trait;

use crate::directory::{CalendarEntry, CalendarResource};
use crate::error::CalRefResult;
use crate::event::Event;
use crate::window::QueryWindow;

/// Read-only access to calendars through an authenticated session.
///
/// Implementations return complete result sets: any paging the service
/// requires happens inside the call.
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// Every non-deleted event of `calendar_id` within `window`, expanded
    /// into single instances and ordered by start time.
    async fn fetch_events(&self, calendar_id: &str, window: &QueryWindow)
    -> CalRefResult<Vec<Event>>;

    /// The caller's calendar list.
    async fn fetch_calendar_list(&self) -> CalRefResult<Vec<CalendarEntry>>;

    /// All calendar resources of the directory `customer_id`.
    async fn fetch_resources(&self, customer_id: &str) -> CalRefResult<Vec<CalendarResource>>;

    /// Email of the account the session is authorized as.
    async fn authenticated_email(&self) -> CalRefResult<String>;
}
