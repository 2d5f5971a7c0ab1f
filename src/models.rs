use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Item ids written by older clients may be numbers.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

/// Scores are JSON numbers and may carry a fraction. Rounded and clamped to
/// 0..=100 so one odd record never makes the whole document unreadable.
fn score_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Ok(0);
    }
    Ok(raw.round().clamp(0.0, f64::from(DailyReport::MAX_SCORE)) as u8)
}

/// The closed set of trackers a board can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Water,
    Todo,
    Sleep,
    Diet,
    Timetable,
    Exercise,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 6] = [
        WidgetKind::Water,
        WidgetKind::Todo,
        WidgetKind::Sleep,
        WidgetKind::Exercise,
        WidgetKind::Diet,
        WidgetKind::Timetable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WidgetKind::Water => "water",
            WidgetKind::Todo => "todo",
            WidgetKind::Sleep => "sleep",
            WidgetKind::Diet => "diet",
            WidgetKind::Timetable => "timetable",
            WidgetKind::Exercise => "exercise",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterData {
    pub glasses: u32,
    pub goal: u32,
}

impl Default for WaterData {
    fn default() -> Self {
        Self { glasses: 0, goal: 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TodoItem {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TodoData {
    pub items: Vec<TodoItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SleepData {
    pub hours: f64,
    pub quality: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Meal {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    pub calories: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DietData {
    pub meals: Vec<Meal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TimeSlot {
    pub time: String,
    pub task: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TimetableData {
    pub slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Workout {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExerciseData {
    pub workouts: Vec<Workout>,
}

/// Per-kind widget state. Serialized as `{"type": ..., "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum WidgetPayload {
    Water(WaterData),
    Todo(TodoData),
    Sleep(SleepData),
    Diet(DietData),
    Timetable(TimetableData),
    Exercise(ExerciseData),
}

impl WidgetPayload {
    pub fn kind(&self) -> WidgetKind {
        match self {
            WidgetPayload::Water(_) => WidgetKind::Water,
            WidgetPayload::Todo(_) => WidgetKind::Todo,
            WidgetPayload::Sleep(_) => WidgetKind::Sleep,
            WidgetPayload::Diet(_) => WidgetKind::Diet,
            WidgetPayload::Timetable(_) => WidgetKind::Timetable,
            WidgetPayload::Exercise(_) => WidgetKind::Exercise,
        }
    }

    /// The payload's `data` part as JSON, without the type tag.
    pub fn data_json(&self) -> serde_json::Value {
        let value = match self {
            WidgetPayload::Water(data) => serde_json::to_value(data),
            WidgetPayload::Todo(data) => serde_json::to_value(data),
            WidgetPayload::Sleep(data) => serde_json::to_value(data),
            WidgetPayload::Diet(data) => serde_json::to_value(data),
            WidgetPayload::Timetable(data) => serde_json::to_value(data),
            WidgetPayload::Exercise(data) => serde_json::to_value(data),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub payload: WidgetPayload,
}

impl Widget {
    pub fn kind(&self) -> WidgetKind {
        self.payload.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReport {
    pub summary: String,
    #[serde(deserialize_with = "score_number")]
    pub score: u8,
    pub tips: Vec<String>,
}

impl DailyReport {
    pub const MAX_SCORE: u8 = 100;
    pub const TIP_COUNT: usize = 3;

    pub fn is_valid(&self) -> bool {
        self.score <= Self::MAX_SCORE && self.tips.len() == Self::TIP_COUNT
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<DailyReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub current_day: DailyRecord,
    #[serde(default)]
    pub history: Vec<DailyRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(alias = "password", default)]
    pub credential: String,
    #[serde(default)]
    pub is_logged_in: bool,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            is_logged_in: self.is_logged_in,
        }
    }
}

/// A user as shown to clients, without the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_logged_in: bool,
}

/// The whole persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Database {
    pub users: Vec<User>,
    pub user_progress: BTreeMap<String, UserProgress>,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    #[serde(alias = "password")]
    pub credential: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(alias = "password")]
    pub credential: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AddWidgetRequest {
    #[serde(rename = "type")]
    pub kind: WidgetKind,
}

#[derive(Debug, Serialize)]
pub struct WidgetTypeInfo {
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    pub title: &'static str,
    #[serde(rename = "defaultData")]
    pub default_data: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub date: NaiveDate,
    pub weekday: String,
    pub score: Option<u8>,
    pub summary: Option<String>,
    pub tips: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub days_logged: usize,
    pub average_score: u32,
    pub timeline: Vec<TimelineEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn widget_serializes_as_flat_document() {
        let widget = Widget {
            id: "w1".to_string(),
            title: "Water Intake".to_string(),
            payload: WidgetPayload::Water(WaterData { glasses: 3, goal: 8 }),
        };

        let value = serde_json::to_value(&widget).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "w1",
                "title": "Water Intake",
                "type": "water",
                "data": { "glasses": 3, "goal": 8 }
            })
        );

        let back: Widget = serde_json::from_value(value).unwrap();
        assert_eq!(back, widget);
    }

    #[test]
    fn missing_payload_fields_fall_back_to_defaults() {
        let widget: Widget = serde_json::from_value(json!({
            "id": "w3",
            "type": "water",
            "title": "Water Intake",
            "data": {}
        }))
        .unwrap();
        assert_eq!(widget.payload, WidgetPayload::Water(WaterData::default()));
    }

    #[test]
    fn unknown_widget_type_is_rejected() {
        let result = serde_json::from_value::<Widget>(json!({
            "id": "w9",
            "type": "mood",
            "title": "Mood",
            "data": {}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn legacy_password_field_is_read_as_credential() {
        let user: User = serde_json::from_value(json!({
            "id": "1700000000000",
            "name": "Ada",
            "email": "ada@example.com",
            "password": "pw",
            "isLoggedIn": true
        }))
        .unwrap();
        assert_eq!(user.credential, "pw");
        assert!(user.is_logged_in);
    }

    #[test]
    fn numeric_item_ids_are_accepted() {
        let data: DietData = serde_json::from_value(json!({
            "meals": [{ "id": 1738000000000u64, "name": "Oats", "calories": 300 }]
        }))
        .unwrap();
        assert_eq!(data.meals[0].id, "1738000000000");
    }

    #[test]
    fn absent_report_is_not_written() {
        let record = DailyRecord {
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            widgets: Vec::new(),
            report: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({ "date": "2026-01-05", "widgets": [] }));
    }

    #[test]
    fn report_contract() {
        let mut report = DailyReport {
            summary: "ok".to_string(),
            score: 70,
            tips: vec!["a".into(), "b".into(), "c".into()],
        };
        assert!(report.is_valid());
        report.tips.pop();
        assert!(!report.is_valid());
        report.tips.push("c".into());
        report.score = 101;
        assert!(!report.is_valid());
    }

    #[test]
    fn stored_scores_are_rounded_into_range() {
        for (raw, expected) in [(json!(85.5), 86), (json!(72), 72), (json!(140), 100), (json!(-3.2), 0)] {
            let report: DailyReport = serde_json::from_value(json!({
                "summary": "ok",
                "score": raw,
                "tips": ["a", "b", "c"]
            }))
            .unwrap();
            assert_eq!(report.score, expected);
        }

        let text = serde_json::from_value::<DailyReport>(json!({
            "summary": "ok",
            "score": "85",
            "tips": []
        }));
        assert!(text.is_err());
    }
}
