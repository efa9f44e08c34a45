use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Timestamp as exchanged with the TickTick API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTickTime(pub DateTime<FixedOffset>);

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.3f%z", "%Y-%m-%dT%H:%M:%S%z"];

impl TickTickTime {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw == "null" {
            return None;
        }

        for format in OFFSET_FORMATS {
            if let Ok(t) = DateTime::parse_from_str(raw, format) {
                return Some(Self(t));
            }
        }
        DateTime::parse_from_rfc3339(raw).ok().map(Self)
    }

    /// Midnight UTC of a `YYYY-MM-DD` date.
    pub fn from_date(raw: &str) -> Option<Self> {
        let date = chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()?;
        let naive: NaiveDateTime = date.and_hms_opt(0, 0, 0)?;
        Some(Self(naive.and_utc().fixed_offset()))
    }

    pub fn to_wire(&self) -> String {
        self.0
            .with_timezone(&Utc)
            .format("%Y-%m-%dT%H:%M:%S%.3f+0000")
            .to_string()
    }
}

impl std::fmt::Display for TickTickTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M"))
    }
}

impl Serialize for TickTickTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

/// `null` decodes to the type's zero value, like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Absent, `null`, and `""` all map to `None`.
fn de_opt_time<'de, D>(deserializer: D) -> Result<Option<TickTickTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => TickTickTime::parse(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid TickTick time: {s}"))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(Priority::None),
            1 => Some(Priority::Low),
            3 => Some(Priority::Medium),
            5 => Some(Priority::High),
            _ => None,
        }
    }

    pub fn level(self) -> i64 {
        match self {
            Priority::None => 0,
            Priority::Low => 1,
            Priority::Medium => 3,
            Priority::High => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::None => "None",
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    fn is_none(&self) -> bool {
        *self == Priority::None
    }
}

impl From<i64> for Priority {
    fn from(level: i64) -> Self {
        Priority::from_level(level).unwrap_or_default()
    }
}

impl From<Priority> for i64 {
    fn from(p: Priority) -> Self {
        p.level()
    }
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

fn is_zero_i32(v: &i32) -> bool {
    *v == 0
}

fn is_false(v: &bool) -> bool {
    !*v
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_zero_i32")]
    pub status: i32,
    #[serde(
        default,
        deserialize_with = "de_opt_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_time: Option<TickTickTime>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_false")]
    pub is_all_day: bool,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_zero_i64")]
    pub sort_order: i64,
    #[serde(
        default,
        deserialize_with = "de_opt_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<TickTickTime>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub time_zone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub desc: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_false")]
    pub is_all_day: bool,
    #[serde(
        default,
        deserialize_with = "de_opt_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<TickTickTime>,
    #[serde(
        default,
        deserialize_with = "de_opt_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<TickTickTime>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub time_zone: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub reminders: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub repeat_flag: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Priority::is_none")]
    pub priority: Priority,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_zero_i32")]
    pub status: i32,
    #[serde(
        default,
        deserialize_with = "de_opt_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_time: Option<TickTickTime>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_zero_i64")]
    pub sort_order: i64,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_zero_i64")]
    pub sort_order: i64,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_false")]
    pub closed: bool,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub group_id: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub view_mode: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub permission: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_zero_i64")]
    pub sort_order: i64,
}

/// A project together with its tasks and columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub project: Project,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<Task>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    #[serde(default, deserialize_with = "null_as_default")]
    pub access_token: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub token_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub expires_in: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub refresh_token: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scope: String,
}

/// Stable sort by group id, then sort order.
pub fn sort_projects(projects: &mut [Project]) {
    projects.sort_by(|a, b| {
        a.group_id
            .cmp(&b.group_id)
            .then(a.sort_order.cmp(&b.sort_order))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(name: &str, group: &str, order: i64) -> Project {
        Project {
            name: name.to_string(),
            group_id: group.to_string(),
            sort_order: order,
            ..Project::default()
        }
    }

    #[test]
    fn sort_projects_by_group_then_order() {
        let mut projects = vec![project("b2", "B", 2), project("a5", "A", 5), project("a1", "A", 1)];
        sort_projects(&mut projects);
        let names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a1", "a5", "b2"]);
    }

    #[test]
    fn sort_projects_keeps_original_order_on_ties() {
        let mut projects = vec![
            project("first", "", 3),
            project("second", "", 3),
            project("third", "", 1),
        ];
        sort_projects(&mut projects);
        let names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["third", "first", "second"]);
    }

    #[test]
    fn parses_ticktick_time_variants() {
        let a = TickTickTime::parse("2024-03-01T09:30:00.000+0000").unwrap();
        let b = TickTickTime::parse("2024-03-01T17:30:00+0800").unwrap();
        let c = TickTickTime::parse("2024-03-01T09:30:00Z").unwrap();
        assert_eq!(a.0, b.0);
        assert_eq!(a.0, c.0);
        assert_eq!(a.to_string(), "2024-03-01 09:30");
        assert_eq!(b.to_wire(), "2024-03-01T09:30:00.000+0000");
        assert!(TickTickTime::parse("").is_none());
        assert!(TickTickTime::parse("yesterday").is_none());
    }

    #[test]
    fn task_deserializes_with_empty_dates_and_priority() {
        let raw = r#"{
            "id": "t1",
            "projectId": "p1",
            "title": "Write report",
            "priority": 3,
            "dueDate": "2024-05-02T00:00:00.000+0000",
            "startDate": "",
            "sortOrder": -1099511627776
        }"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.start_date.is_none());
        assert_eq!(task.due_date.unwrap().to_string(), "2024-05-02 00:00");
        assert_eq!(task.sort_order, -1_099_511_627_776);
    }

    #[test]
    fn unknown_priority_level_maps_to_none() {
        let task: Task = serde_json::from_str(r#"{"title":"x","priority":2}"#).unwrap();
        assert_eq!(task.priority, Priority::None);
        assert_eq!(Priority::from_level(5), Some(Priority::High));
        assert_eq!(Priority::from_level(4), None);
    }

    #[test]
    fn new_task_serializes_without_empty_fields() {
        let task = Task {
            project_id: "p1".into(),
            title: "Call".into(),
            priority: Priority::High,
            due_date: TickTickTime::from_date("2024-01-31"),
            ..Task::default()
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["projectId"], "p1");
        assert_eq!(value["priority"], 5);
        assert_eq!(value["dueDate"], "2024-01-31T00:00:00.000+0000");
        assert!(value.get("id").is_none());
        assert!(value.get("content").is_none());
    }

    #[test]
    fn project_data_decodes_bundle() {
        let raw = r#"{
            "project": {"id": "p1", "name": "Inbox", "closed": true, "groupId": "g1"},
            "tasks": [{"id": "t1", "projectId": "p1", "title": "A"}],
            "columns": [{"id": "c1", "projectId": "p1", "name": "Todo"}]
        }"#;
        let data: ProjectData = serde_json::from_str(raw).unwrap();
        assert!(data.project.closed);
        assert_eq!(data.tasks.len(), 1);
        assert_eq!(data.columns[0].name, "Todo");
    }

    #[test]
    fn null_fields_decode_as_zero_values() {
        let raw = r#"{
            "project": {"id": "p1", "name": "Inbox", "groupId": null, "closed": null, "sortOrder": null},
            "tasks": null,
            "columns": null
        }"#;
        let data: ProjectData = serde_json::from_str(raw).unwrap();
        assert_eq!(data.project.group_id, "");
        assert!(!data.project.closed);
        assert_eq!(data.project.sort_order, 0);
        assert!(data.tasks.is_empty());
        assert!(data.columns.is_empty());

        let task: Task =
            serde_json::from_str(r#"{"id":"t1","title":"A","content":null,"priority":null,"items":null}"#)
                .unwrap();
        assert_eq!(task.content, "");
        assert_eq!(task.priority, Priority::None);
        assert!(task.items.is_empty());
    }
}
