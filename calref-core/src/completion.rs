//! Filling in redacted events from reference calendars.

use tracing::debug;

use crate::event::Event;
use crate::reference::ReferenceMap;

/// Replace each redacted event in `events` with its reference copy.
///
/// Only events that are private *and* have an empty summary are touched,
/// and only when the reference copy has a summary. Returns how many events
/// were replaced.
///
/// The `self` markers on a reference copy describe whoever fetched the
/// reference calendar. They are recomputed against `self_email`, the
/// account that fetched `events`; with no email known, no attendee is
/// marked as self.
pub fn complete(events: &mut [Event], references: &ReferenceMap, self_email: Option<&str>) -> usize {
    let mut replaced = 0;

    for event in events.iter_mut().filter(|e| e.is_redacted()) {
        let Some(reference) = references.get(&event.id) else {
            continue;
        };
        if reference.summary.is_empty() {
            continue;
        }

        let mut completed = reference.clone();
        reassign_self(&mut completed, self_email);

        debug!(id = %event.id, summary = %completed.summary, "Completed private event");
        *event = completed;
        replaced += 1;
    }

    replaced
}

fn reassign_self(event: &mut Event, self_email: Option<&str>) {
    for attendee in &mut event.attendees {
        attendee.is_self = self_email.is_some_and(|email| attendee.email.eq_ignore_ascii_case(email));
    }
}
