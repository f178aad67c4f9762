//! The end-to-end pipeline: fetch, combine, resolve references, complete.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::algebra::{self, EventSet};
use crate::cancel::cancellable;
use crate::completion::complete;
use crate::constants::{DEFAULT_REFERENCE_CONCURRENCY, PRIMARY_CALENDAR_ID};
use crate::error::{CalRefError, CalRefResult};
use crate::event::Event;
use crate::gateway::CalendarGateway;
use crate::reference::{ReferenceSources, build_reference_map, resolve_reference_ids};
use crate::window::QueryWindow;

/// How the requested calendars are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineMode {
    /// One calendar, listed as fetched (declined events included).
    Single,
    /// Events present in every calendar.
    Intersection,
    /// Events present in any calendar, optionally sorted by start.
    Union { sort: bool },
}

/// Everything one invocation asks for. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    pub calendar_ids: Vec<String>,
    pub window: QueryWindow,
    pub references: ReferenceSources,
    pub reference_concurrency: usize,
}

impl ReconcileRequest {
    pub fn new(calendar_ids: Vec<String>, window: QueryWindow, references: ReferenceSources) -> Self {
        ReconcileRequest {
            calendar_ids,
            window,
            references,
            reference_concurrency: DEFAULT_REFERENCE_CONCURRENCY,
        }
    }
}

/// Run one request against `gateway`.
///
/// Failing to fetch a requested calendar is fatal. Reference lookups are
/// best-effort: whatever cannot be fetched leaves events redacted.
pub async fn reconcile<G>(
    gateway: &G,
    request: &ReconcileRequest,
    mode: CombineMode,
    cancel: &CancellationToken,
) -> CalRefResult<Vec<Event>>
where
    G: CalendarGateway + ?Sized,
{
    let mut events = match mode {
        CombineMode::Single => {
            let calendar_id = request
                .calendar_ids
                .first()
                .map(String::as_str)
                .unwrap_or(PRIMARY_CALENDAR_ID);
            cancellable(cancel, gateway.fetch_events(calendar_id, &request.window)).await?
        }
        CombineMode::Intersection => {
            let sets = fetch_sets(gateway, request, cancel).await?;
            algebra::intersection(&sets)
        }
        CombineMode::Union { sort } => {
            let sets = fetch_sets(gateway, request, cancel).await?;
            let mut events = algebra::union(&sets);
            if sort {
                algebra::sort_by_start(&mut events);
            }
            events
        }
    };

    if !events.iter().any(Event::is_redacted) {
        debug!("No private events to complete");
        return Ok(events);
    }

    let reference_ids = resolve_reference_ids(gateway, &request.references, cancel).await?;
    let references = build_reference_map(
        gateway,
        &reference_ids,
        &request.window,
        request.reference_concurrency,
        cancel,
    )
    .await?;

    let self_email = match cancellable(cancel, gateway.authenticated_email()).await {
        Ok(email) => Some(email),
        Err(CalRefError::Cancelled) => return Err(CalRefError::Cancelled),
        Err(e) => {
            warn!(error = %e, "Could not determine account email; clearing self markers");
            None
        }
    };

    let replaced = complete(&mut events, &references, self_email.as_deref());
    info!(
        replaced,
        references = reference_ids.len(),
        "Completed private events"
    );

    Ok(events)
}

async fn fetch_sets<G>(
    gateway: &G,
    request: &ReconcileRequest,
    cancel: &CancellationToken,
) -> CalRefResult<Vec<EventSet>>
where
    G: CalendarGateway + ?Sized,
{
    let mut sets = Vec::with_capacity(request.calendar_ids.len());

    for calendar_id in &request.calendar_ids {
        let events = cancellable(cancel, gateway.fetch_events(calendar_id, &request.window)).await?;
        debug!(calendar = %calendar_id, events = events.len(), "Fetched calendar");
        sets.push(EventSet::from_events(calendar_id.clone(), events));
    }

    Ok(sets)
}
