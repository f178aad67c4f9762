mod common;

use chrono::NaiveDate;
use common::*;
use calref_core::directory::{CalendarEntry, CalendarResource};
use calref_core::reconcile::{CombineMode, ReconcileRequest, reconcile};
use calref_core::reference::{ReferenceSources, build_reference_map, resolve_reference_ids};
use calref_core::window::QueryWindow;
use calref_core::CalRefError;
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn window() -> QueryWindow {
    QueryWindow::parse(
        "2024-03-01",
        "",
        chrono_tz::Asia::Tokyo,
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
    )
    .unwrap()
}

fn request(ids: &[&str], references: ReferenceSources) -> ReconcileRequest {
    ReconcileRequest::new(ids.iter().map(|s| s.to_string()).collect(), window(), references)
}

fn summaries(events: &[calref_core::Event]) -> Vec<&str> {
    events.iter().map(|e| e.summary.as_str()).collect()
}

#[tokio::test]
async fn test_private_event_completed_from_primary() {
    let gateway = FakeGateway::default()
        .with_calendar("team@example.com", vec![private("e1", "2024-03-01T10:00:00+09:00")])
        .with_calendar(
            "primary",
            vec![timed("e1", "Design Review", "2024-03-01T10:00:00+09:00")],
        );

    let events = reconcile(
        &gateway,
        &request(&["team@example.com"], ReferenceSources::default()),
        CombineMode::Single,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(summaries(&events), vec!["Design Review"]);
}

#[tokio::test]
async fn test_failing_reference_does_not_block_result() {
    let gateway = FakeGateway::default()
        .with_calendar("team@example.com", vec![private("e1", "2024-03-01T10:00:00+09:00")])
        .failing("primary");

    let events = reconcile(
        &gateway,
        &request(&["team@example.com"], ReferenceSources::default()),
        CombineMode::Single,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(events.len(), 1);
    assert!(events[0].is_redacted());
}

#[tokio::test]
async fn test_failing_main_calendar_is_fatal() {
    let gateway = FakeGateway::default().failing("team@example.com");

    let err = reconcile(
        &gateway,
        &request(&["team@example.com"], ReferenceSources::default()),
        CombineMode::Single,
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CalRefError::Fetch { ref calendar_id, .. } if calendar_id == "team@example.com"));
}

#[tokio::test]
async fn test_no_reference_fetch_without_private_events() {
    let gateway = FakeGateway::default()
        .with_calendar("a", vec![timed("e1", "Standup", "2024-03-01T09:00:00+09:00")]);

    reconcile(
        &gateway,
        &request(&["a"], ReferenceSources::default()),
        CombineMode::Single,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(gateway.fetched(), vec!["a"]);
}

#[tokio::test]
async fn test_union_sorted_and_completed() {
    let gateway = FakeGateway::default()
        .with_calendar(
            "a",
            vec![
                timed("late", "Retro", "2024-03-01T17:00:00+09:00"),
                private("shared", "2024-03-01T10:00:00+09:00"),
            ],
        )
        .with_calendar(
            "b",
            vec![
                timed("early", "Standup", "2024-03-01T09:00:00+09:00"),
                timed("shared", "Visible in b", "2024-03-01T10:00:00+09:00"),
            ],
        )
        .with_calendar(
            "primary",
            vec![timed("shared", "Design Review", "2024-03-01T10:00:00+09:00")],
        );

    let events = reconcile(
        &gateway,
        &request(&["a", "b"], ReferenceSources::default()),
        CombineMode::Union { sort: true },
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(summaries(&events), vec!["Standup", "Design Review", "Retro"]);
}

#[tokio::test]
async fn test_intersection_excludes_declined() {
    let gateway = FakeGateway::default()
        .with_calendar(
            "a",
            vec![
                timed("both", "Planning", "2024-03-01T09:00:00+09:00"),
                declined("skip", "Declined sync", "2024-03-01T11:00:00+09:00"),
            ],
        )
        .with_calendar(
            "b",
            vec![
                timed("skip", "Declined sync", "2024-03-01T11:00:00+09:00"),
                timed("both", "Planning", "2024-03-01T09:00:00+09:00"),
            ],
        );

    let events = reconcile(
        &gateway,
        &request(&["a", "b"], ReferenceSources::default()),
        CombineMode::Intersection,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["both"]);
}

#[tokio::test]
async fn test_single_listing_keeps_declined() {
    let gateway = FakeGateway::default().with_calendar(
        "primary",
        vec![declined("d", "Declined sync", "2024-03-01T11:00:00+09:00")],
    );

    let events = reconcile(
        &gateway,
        &request(&[], ReferenceSources::default()),
        CombineMode::Single,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(events.len(), 1);
    assert!(events[0].declined_by_self());
}

#[tokio::test]
async fn test_cancelled_request() {
    let gateway = FakeGateway::default();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = reconcile(
        &gateway,
        &request(&["a", "b"], ReferenceSources::default()),
        CombineMode::Intersection,
        &cancel,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CalRefError::Cancelled));
}

#[tokio::test]
async fn test_reference_ids_always_include_primary() {
    let gateway = FakeGateway::default();
    let sources = ReferenceSources {
        explicit_ids: vec!["x@example.com".into(), "x@example.com".into(), "primary".into()],
        ..Default::default()
    };

    let ids = resolve_reference_ids(&gateway, &sources, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["primary", "x@example.com"]);
}

#[tokio::test]
async fn test_reference_ids_from_calendar_list_and_building() {
    let mut gateway = FakeGateway::default();
    gateway.calendar_list = Some(
        serde_json::from_value::<Vec<CalendarEntry>>(json!([
            { "id": "me@example.com", "primary": true },
            { "id": "team@group.calendar.example" }
        ]))
        .unwrap(),
    );
    gateway.resources = Some(
        serde_json::from_value::<Vec<CalendarResource>>(json!([
            { "resourceName": "Room A", "resourceEmail": "room-a@resource.example", "buildingId": "hq" },
            { "resourceName": "Room B", "resourceEmail": "room-b@resource.example", "buildingId": "annex" },
            { "resourceName": "Cart", "buildingId": "hq" }
        ]))
        .unwrap(),
    );

    let sources = ReferenceSources {
        include_my_calendars: true,
        building_id: Some("hq".into()),
        customer_id: "my_customer".into(),
        ..Default::default()
    };

    let ids = resolve_reference_ids(&gateway, &sources, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        ids.into_iter().collect::<Vec<_>>(),
        vec![
            "me@example.com",
            "primary",
            "room-a@resource.example",
            "team@group.calendar.example"
        ]
    );
}

#[tokio::test]
async fn test_reference_id_sources_degrade_on_failure() {
    let gateway = FakeGateway::default();
    let sources = ReferenceSources {
        explicit_ids: vec!["x@example.com".into()],
        include_my_calendars: true,
        building_id: Some("hq".into()),
        customer_id: "my_customer".into(),
    };

    let ids = resolve_reference_ids(&gateway, &sources, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(ids.len(), 2);
}

#[tokio::test]
async fn test_reference_map_merge_order_is_deterministic() {
    let gateway = FakeGateway::default()
        .with_calendar("a@example.com", vec![private("id1", "2024-03-01T10:00:00+09:00")])
        .with_calendar("b@example.com", vec![timed("id1", "Team Sync", "2024-03-01T10:00:00+09:00")])
        .with_calendar("c@example.com", vec![timed("id1", "Later copy", "2024-03-01T10:00:00+09:00")])
        .failing("primary");

    let ids = ["c@example.com", "a@example.com", "primary", "b@example.com"]
        .into_iter()
        .map(String::from)
        .collect();

    let map = build_reference_map(&gateway, &ids, &window(), 3, &CancellationToken::new())
        .await
        .unwrap();

    // Sorted order is a, b, c, primary: b is the first to reveal a summary.
    assert_eq!(map.get("id1").unwrap().summary, "Team Sync");
}
