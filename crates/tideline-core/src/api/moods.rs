use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, Utc};
use tideline_shared::{MoodCreate, MoodEntry, mood_emoji};

use crate::error::ApiError;
use crate::http::{ApiClient, Request, Transport};

/// Mood history, newest first.
pub async fn list<T: Transport>(client: &ApiClient<T>) -> Result<Vec<MoodEntry>, ApiError> {
    let entries: Vec<MoodEntry> = client.fetch(Request::get("/moods")).await?.unwrap_or_default();
    Ok(newest_first(entries))
}

/// Records a mood by name; the emoji is looked up locally.
pub async fn create<T: Transport>(
    client: &ApiClient<T>,
    mood: &str,
    note: Option<String>,
) -> anyhow::Result<()> {
    let emoji = mood_emoji(mood).ok_or_else(|| anyhow!("unknown mood: {mood}"))?;
    let payload = MoodCreate {
        mood_type: mood.trim().to_ascii_lowercase(),
        emoji: emoji.to_string(),
        note: note.filter(|text| !text.trim().is_empty()),
    };
    client.execute(Request::post("/moods").json(&payload)?).await?;
    Ok(())
}

pub fn newest_first(mut entries: Vec<MoodEntry>) -> Vec<MoodEntry> {
    entries.sort_by_key(|entry| std::cmp::Reverse(entry.timestamp().and_then(parse_timestamp)));
    entries
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
