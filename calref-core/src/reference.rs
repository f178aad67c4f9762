//! Reference calendars: which calendars to trust, and the merged view of
//! their events used to fill in redacted entries.
//!
//! Reference data is best-effort. A calendar that cannot be listed or
//! fetched contributes nothing and the run continues; only cancellation
//! aborts.

use std::collections::{BTreeSet, HashMap};

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cancel::cancellable;
use crate::constants::PRIMARY_CALENDAR_ID;
use crate::directory::filter_by_building;
use crate::error::{CalRefError, CalRefResult};
use crate::event::Event;
use crate::gateway::CalendarGateway;
use crate::window::QueryWindow;

/// Where reference calendars come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSources {
    /// Calendars named explicitly by the caller.
    pub explicit_ids: Vec<String>,
    /// Add every calendar in the caller's calendar list.
    pub include_my_calendars: bool,
    /// Add every directory resource located in this building.
    pub building_id: Option<String>,
    /// Directory customer used for the building lookup.
    pub customer_id: String,
}

/// Reference events keyed by event id.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    events: HashMap<String, Event>,
}

impl ReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `event` unless an entry already reveals a summary.
    ///
    /// An existing entry is replaced only when it has an empty summary and
    /// `event` has a non-empty one.
    pub fn merge(&mut self, event: Event) {
        match self.events.get_mut(&event.id) {
            None => {
                self.events.insert(event.id.clone(), event);
            }
            Some(existing) => {
                if existing.summary.is_empty() && !event.summary.is_empty() {
                    *existing = event;
                }
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.get(id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromIterator<Event> for ReferenceMap {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        let mut map = ReferenceMap::new();
        for event in iter {
            map.merge(event);
        }
        map
    }
}

/// The set of calendar ids to use as references.
///
/// Always contains `primary`. Failing to read the calendar list or the
/// resource directory only drops that source.
pub async fn resolve_reference_ids<G>(
    gateway: &G,
    sources: &ReferenceSources,
    cancel: &CancellationToken,
) -> CalRefResult<BTreeSet<String>>
where
    G: CalendarGateway + ?Sized,
{
    let mut ids: BTreeSet<String> = sources
        .explicit_ids
        .iter()
        .filter(|id| !id.is_empty())
        .cloned()
        .collect();
    ids.insert(PRIMARY_CALENDAR_ID.to_string());

    if sources.include_my_calendars {
        match cancellable(cancel, gateway.fetch_calendar_list()).await {
            Ok(calendars) => {
                ids.extend(
                    calendars
                        .into_iter()
                        .map(|c| c.id)
                        .filter(|id| !id.is_empty()),
                );
            }
            Err(CalRefError::Cancelled) => return Err(CalRefError::Cancelled),
            Err(e) => warn!(error = %e, "Skipping calendar list as a reference source"),
        }
    }

    if let Some(building_id) = sources.building_id.as_deref().filter(|b| !b.is_empty()) {
        match cancellable(cancel, gateway.fetch_resources(&sources.customer_id)).await {
            Ok(resources) => {
                ids.extend(
                    filter_by_building(&resources, building_id)
                        .into_iter()
                        .filter(|r| !r.resource_email.is_empty())
                        .map(|r| r.resource_email.clone()),
                );
            }
            Err(CalRefError::Cancelled) => return Err(CalRefError::Cancelled),
            Err(e) => {
                warn!(building = building_id, error = %e, "Skipping building resources as a reference source")
            }
        }
    }

    debug!(count = ids.len(), "Resolved reference calendars");
    Ok(ids)
}

/// Fetch every reference calendar and merge their events.
///
/// Up to `concurrency` fetches run at once. Results are merged in the
/// iteration order of `reference_ids`, so the first calendar to reveal a
/// summary wins regardless of which request finished first.
pub async fn build_reference_map<G>(
    gateway: &G,
    reference_ids: &BTreeSet<String>,
    window: &QueryWindow,
    concurrency: usize,
    cancel: &CancellationToken,
) -> CalRefResult<ReferenceMap>
where
    G: CalendarGateway + ?Sized,
{
    let mut fetches = stream::iter(reference_ids.iter())
        .map(|id| async move {
            let result = cancellable(cancel, gateway.fetch_events(id, window)).await;
            (id, result)
        })
        .buffered(concurrency.max(1));

    let mut map = ReferenceMap::new();

    while let Some((id, result)) = fetches.next().await {
        match result {
            Ok(events) => {
                debug!(calendar = %id, events = events.len(), "Fetched reference calendar");
                for event in events {
                    map.merge(event);
                }
            }
            Err(CalRefError::Cancelled) => return Err(CalRefError::Cancelled),
            Err(e) => warn!(calendar = %id, error = %e, "Skipping reference calendar"),
        }
    }

    Ok(map)
}
