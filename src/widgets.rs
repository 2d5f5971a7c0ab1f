//! Widget catalog and board edits.
//!
//! `default_payload` is the single source of "empty" widget state. Account
//! creation seeds a board from it and archiving resets a board with it, so
//! both always agree on what a fresh day looks like.

use crate::models::{
    DailyRecord, DietData, ExerciseData, SleepData, TimeSlot, TimetableData, TodoData, WaterData,
    Widget, WidgetKind, WidgetPayload, WidgetTypeInfo,
};
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Kinds placed on a brand new board.
pub const STARTER_KINDS: [WidgetKind; 3] = [WidgetKind::Water, WidgetKind::Todo, WidgetKind::Sleep];

const TIMETABLE_SLOTS: [&str; 4] = ["08:00", "12:00", "18:00", "21:00"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("widget {0} not found")]
    NotFound(String),
    #[error("widget {id} is a {expected} widget, got {actual} data")]
    KindMismatch {
        id: String,
        expected: WidgetKind,
        actual: WidgetKind,
    },
    #[error("widget id {0} appears more than once")]
    DuplicateId(String),
}

pub fn default_title(kind: WidgetKind) -> &'static str {
    match kind {
        WidgetKind::Water => "Water Intake",
        WidgetKind::Todo => "To-Do List",
        WidgetKind::Sleep => "Sleep Log",
        WidgetKind::Diet => "Diet Planner",
        WidgetKind::Timetable => "Timetable",
        WidgetKind::Exercise => "Exercise",
    }
}

pub fn default_payload(kind: WidgetKind) -> WidgetPayload {
    match kind {
        WidgetKind::Water => WidgetPayload::Water(WaterData::default()),
        WidgetKind::Todo => WidgetPayload::Todo(TodoData::default()),
        WidgetKind::Sleep => WidgetPayload::Sleep(SleepData::default()),
        WidgetKind::Diet => WidgetPayload::Diet(DietData::default()),
        WidgetKind::Exercise => WidgetPayload::Exercise(ExerciseData::default()),
        WidgetKind::Timetable => WidgetPayload::Timetable(TimetableData {
            slots: TIMETABLE_SLOTS
                .iter()
                .map(|time| TimeSlot {
                    time: (*time).to_string(),
                    task: String::new(),
                })
                .collect(),
        }),
    }
}

pub fn catalog() -> Vec<WidgetTypeInfo> {
    WidgetKind::ALL
        .iter()
        .map(|&kind| WidgetTypeInfo {
            kind,
            title: default_title(kind),
            default_data: default_payload(kind).data_json(),
        })
        .collect()
}

pub fn new_widget(kind: WidgetKind) -> Widget {
    Widget {
        id: Uuid::new_v4().to_string(),
        title: default_title(kind).to_string(),
        payload: default_payload(kind),
    }
}

pub fn starter_day(date: NaiveDate) -> DailyRecord {
    DailyRecord {
        date,
        widgets: STARTER_KINDS.iter().map(|&kind| new_widget(kind)).collect(),
        report: None,
    }
}

/// Same widgets, same order, each back at its kind's default payload.
pub fn reset_day(previous: &DailyRecord, date: NaiveDate) -> DailyRecord {
    DailyRecord {
        date,
        widgets: previous
            .widgets
            .iter()
            .map(|widget| Widget {
                id: widget.id.clone(),
                title: widget.title.clone(),
                payload: default_payload(widget.kind()),
            })
            .collect(),
        report: None,
    }
}

pub fn add_widget(day: &mut DailyRecord, kind: WidgetKind) -> Widget {
    let widget = new_widget(kind);
    day.widgets.push(widget.clone());
    widget
}

pub fn remove_widget(day: &mut DailyRecord, widget_id: &str) -> Result<Widget, BoardError> {
    let index = day
        .widgets
        .iter()
        .position(|widget| widget.id == widget_id)
        .ok_or_else(|| BoardError::NotFound(widget_id.to_string()))?;
    Ok(day.widgets.remove(index))
}

pub fn update_widget(
    day: &mut DailyRecord,
    widget_id: &str,
    payload: WidgetPayload,
) -> Result<Widget, BoardError> {
    let widget = day
        .widgets
        .iter_mut()
        .find(|widget| widget.id == widget_id)
        .ok_or_else(|| BoardError::NotFound(widget_id.to_string()))?;

    if widget.kind() != payload.kind() {
        return Err(BoardError::KindMismatch {
            id: widget_id.to_string(),
            expected: widget.kind(),
            actual: payload.kind(),
        });
    }

    widget.payload = payload;
    Ok(widget.clone())
}

/// Checks an incoming board against the stored one: ids unique, and no widget
/// that already exists changes its kind.
pub fn validate_board(stored: &DailyRecord, incoming: &DailyRecord) -> Result<(), BoardError> {
    for (index, widget) in incoming.widgets.iter().enumerate() {
        if incoming.widgets[..index].iter().any(|other| other.id == widget.id) {
            return Err(BoardError::DuplicateId(widget.id.clone()));
        }

        if let Some(existing) = stored.widgets.iter().find(|other| other.id == widget.id) {
            if existing.kind() != widget.kind() {
                return Err(BoardError::KindMismatch {
                    id: widget.id.clone(),
                    expected: existing.kind(),
                    actual: widget.kind(),
                });
            }
        }
    }
    Ok(())
}
