//! Terminal and JSON rendering of events, calendars and resources.

use anyhow::Result;
use calref_core::directory::{CalendarEntry, CalendarResource};
use calref_core::event::{Event, EventTime};
use clap::ValueEnum;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Json,
}

/// A column of the events table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventField {
    Start,
    End,
    #[value(alias = "time")]
    Period,
    Date,
    #[value(name = "date_time")]
    DateTime,
    Summary,
    Description,
    Location,
    Id,
    Status,
}

pub const DEFAULT_EVENT_FIELDS: &[EventField] = &[EventField::DateTime, EventField::Summary];

impl EventField {
    pub fn header(self) -> &'static str {
        match self {
            EventField::Start => "Start",
            EventField::End => "End",
            EventField::Period => "Period",
            EventField::Date => "Date",
            EventField::DateTime => "Date Time",
            EventField::Summary => "Summary",
            EventField::Description => "Description",
            EventField::Location => "Location",
            EventField::Id => "Id",
            EventField::Status => "Status",
        }
    }

    pub fn resolve(self, event: &Event) -> String {
        match self {
            EventField::Start => event.start.time.to_string(),
            EventField::End => event.end.time.to_string(),
            EventField::Period => period(event),
            EventField::Date => event.start.time.date().format("%Y-%m-%d").to_string(),
            EventField::DateTime => {
                let date = EventField::Date.resolve(event);
                match period(event) {
                    p if p.is_empty() => date,
                    p => format!("{date} {p}"),
                }
            }
            EventField::Summary if event.summary.is_empty() => "Private Event".to_string(),
            EventField::Summary => event.summary.clone(),
            EventField::Description => event.description.clone().unwrap_or_default(),
            EventField::Location => event.location.clone().unwrap_or_default(),
            EventField::Id => event.id.clone(),
            EventField::Status => event.status.to_string(),
        }
    }
}

/// `HH:MM-HH:MM` in the event's own offset; empty for all-day events.
fn period(event: &Event) -> String {
    match (&event.start.time, &event.end.time) {
        (EventTime::DateTime(start), EventTime::DateTime(end)) => {
            format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
        }
        (EventTime::DateTime(start), EventTime::Date(_)) => format!("{}-", start.format("%H:%M")),
        _ => String::new(),
    }
}

pub fn events(events: &[Event], fields: &[EventField], format: Format) -> Result<String> {
    if format == Format::Json {
        return json(events);
    }

    if events.is_empty() {
        return Ok("No events found".dimmed().to_string());
    }

    let headers: Vec<&str> = fields.iter().map(|f| f.header()).collect();
    let rows: Vec<Vec<String>> = events
        .iter()
        .map(|e| fields.iter().map(|f| f.resolve(e)).collect())
        .collect();

    let lines = table(&headers, &rows);
    let mut out = vec![lines[0].clone()];

    // Declined events stay listed, struck through.
    for (line, event) in lines[1..].iter().zip(events) {
        if event.declined_by_self() {
            out.push(line.strikethrough().to_string());
        } else {
            out.push(line.clone());
        }
    }

    Ok(out.join("\n"))
}

pub fn calendars(entries: &[CalendarEntry], format: Format) -> Result<String> {
    if format == Format::Json {
        return json(entries);
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|c| vec![c.id.clone(), c.summary.clone()])
        .collect();

    Ok(table(&["Id", "Summary"], &rows).join("\n"))
}

pub fn resources(resources: &[&CalendarResource], format: Format) -> Result<String> {
    if format == Format::Json {
        return json(resources);
    }

    let rows: Vec<Vec<String>> = resources
        .iter()
        .map(|r| {
            vec![
                r.resource_name.clone(),
                r.resource_email.clone(),
                r.building_id.clone(),
                r.user_visible_description.clone(),
            ]
        })
        .collect();

    Ok(table(&["Name", "Email", "Building ID", "Description"], &rows).join("\n"))
}

fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Left-aligned columns padded to the widest cell; first line is the bold header.
fn table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let mut lines = vec![format_row(headers.to_vec()).bold().to_string()];
    lines.extend(
        rows.iter()
            .map(|row| format_row(row.iter().map(String::as_str).collect())),
    );
    lines
}
