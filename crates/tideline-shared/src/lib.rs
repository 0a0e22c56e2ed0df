//! Wire types shared between the Tideline client core and anything that
//! renders its data. Field names follow the backend's camelCase JSON.

use serde::{
  Deserialize,
  Serialize
};

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Default,
)]
#[serde(
  try_from = "u8",
  into = "u8"
)]
pub enum TaskPriority {
  Low,
  #[default]
  Medium,
  High
}

impl TaskPriority {
  pub fn label(self) -> &'static str {
    match self {
      | TaskPriority::Low => "Low",
      | TaskPriority::Medium => {
        "Medium"
      }
      | TaskPriority::High => "High"
    }
  }
}

impl From<TaskPriority> for u8 {
  fn from(priority: TaskPriority) -> u8 {
    match priority {
      | TaskPriority::Low => 1,
      | TaskPriority::Medium => 2,
      | TaskPriority::High => 3
    }
  }
}

impl TryFrom<u8> for TaskPriority {
  type Error = String;

  fn try_from(
    value: u8
  ) -> Result<Self, Self::Error> {
    match value {
      | 1 => Ok(TaskPriority::Low),
      | 2 => Ok(TaskPriority::Medium),
      | 3 => Ok(TaskPriority::High),
      | other => Err(format!(
        "unknown task priority {other}"
      ))
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct TaskTag {
  pub id:    i64,
  pub name:  String,
  #[serde(default)]
  pub color: Option<String>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  pub id:           i64,
  #[serde(default)]
  pub user_id:      Option<i64>,
  pub title:        String,
  #[serde(default)]
  pub description:  Option<String>,
  #[serde(default)]
  pub is_complete:  bool,
  #[serde(default)]
  pub is_archived:  bool,
  #[serde(default)]
  pub priority:     TaskPriority,
  #[serde(default)]
  pub due_date:     Option<String>,
  #[serde(default)]
  pub completed_at: Option<String>,
  #[serde(default)]
  pub archived_at:  Option<String>,
  #[serde(default)]
  pub tags:         Vec<TaskTag>,
  #[serde(default)]
  pub created_at:   Option<String>,
  #[serde(default)]
  pub updated_at:   Option<String>
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreate {
  pub title:       String,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub description: Option<String>,
  pub priority:    TaskPriority,
  pub due_date:    Option<String>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  Default,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub title:       Option<String>,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub description: Option<String>,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub priority:    Option<TaskPriority>,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub due_date:    Option<String>
}

/// Filters accepted by `GET /tasks`.
#[derive(
  Debug, Clone, Default, PartialEq, Eq,
)]
pub struct TaskQuery {
  pub complete: Option<bool>,
  pub archived: Option<bool>,
  pub priority: Option<TaskPriority>,
  /// Blank searches are not sent.
  pub search:   Option<String>
}

impl TaskQuery {
  pub fn to_query_string(
    &self
  ) -> String {
    let mut parts = Vec::new();
    if let Some(complete) =
      self.complete
    {
      parts.push(format!(
        "complete={complete}"
      ));
    }
    if let Some(archived) =
      self.archived
    {
      parts.push(format!(
        "archived={archived}"
      ));
    }
    if let Some(priority) =
      self.priority
    {
      parts.push(format!(
        "priority={}",
        u8::from(priority)
      ));
    }
    if let Some(search) = self
      .search
      .as_deref()
      .filter(|s| !s.trim().is_empty())
    {
      parts.push(format!(
        "search={}",
        urlencoding::encode(search)
      ));
    }

    if parts.is_empty() {
      String::new()
    } else {
      format!("?{}", parts.join("&"))
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct HabitCheck {
  pub date: String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
  pub id:             i64,
  pub name:           String,
  #[serde(default)]
  pub description:    Option<String>,
  #[serde(default)]
  pub intent:         Option<String>,
  #[serde(default)]
  pub affirmation:    Option<String>,
  #[serde(default)]
  pub color:          Option<String>,
  #[serde(default)]
  pub icon:           Option<String>,
  #[serde(default)]
  pub frequency:      Option<String>,
  #[serde(default)]
  pub is_active:      Option<bool>,
  #[serde(default)]
  pub checks:         Vec<HabitCheck>,
  #[serde(default)]
  pub checked_today:  bool,
  #[serde(default)]
  pub current_streak: u32,
  #[serde(default)]
  pub longest_streak: u32,
  #[serde(default)]
  pub created_at:     Option<String>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct HabitUpsert {
  pub name:        String,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub description: Option<String>,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub intent:      Option<String>,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub affirmation: Option<String>,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub color:       Option<String>,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub icon:        Option<String>,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub frequency:   Option<String>
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct CheckResult {
  pub checked: bool
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct Tag {
  pub id:    i64,
  pub name:  String,
  #[serde(default)]
  pub color: Option<String>
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct TagUpsert {
  pub name:  String,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub color: Option<String>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct Note {
  pub id:         i64,
  #[serde(default)]
  pub title:      String,
  #[serde(default)]
  pub content:    Option<String>,
  #[serde(default)]
  pub created_at: Option<String>,
  #[serde(default)]
  pub updated_at: Option<String>
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct NoteUpsert {
  pub title:   String,
  pub content: String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
  pub id:         i64,
  #[serde(default)]
  pub mood_type:  Option<String>,
  #[serde(default)]
  pub note:       Option<String>,
  #[serde(default)]
  pub emoji:      Option<String>,
  #[serde(default)]
  pub date:       Option<String>,
  #[serde(default)]
  pub created_at: Option<String>
}

impl MoodEntry {
  /// `createdAt` wins over `date`; the backend fills one or the other.
  pub fn timestamp(
    &self
  ) -> Option<&str> {
    self
      .created_at
      .as_deref()
      .or(self.date.as_deref())
  }
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct MoodCreate {
  pub mood_type: String,
  pub emoji:     String,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub note:      Option<String>
}

pub const MOOD_EMOJI: [(
  &str,
  &str
); 10] = [
  ("joyful", "\u{2600}\u{fe0f}"),
  ("calm", "\u{1f30a}"),
  ("focused", "\u{1f3af}"),
  ("tired", "\u{1f319}"),
  ("anxious", "\u{1f32a}\u{fe0f}"),
  ("inspired", "\u{1f52e}"),
  ("grateful", "\u{1f54a}\u{fe0f}"),
  ("lonely", "\u{1f32b}\u{fe0f}"),
  ("angry", "\u{1f525}"),
  ("hopeful", "\u{1f308}")
];

pub fn mood_emoji(
  mood: &str
) -> Option<&'static str> {
  let mood = mood.trim();
  MOOD_EMOJI
    .iter()
    .find(|(name, _)| {
      name.eq_ignore_ascii_case(mood)
    })
    .map(|(_, emoji)| *emoji)
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct LoginRequest {
  pub identifier: String,
  pub password:   String
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct SignupRequest {
  pub username: String,
  pub email:    String,
  pub password: String
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct AuthResponse {
  pub access_token: String
}
