use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Local, NaiveDate, Utc};
use tideline_shared::{Habit, MoodEntry, Note, Tag, Task, TaskPriority, mood_emoji};
use unicode_width::UnicodeWidthStr;

use crate::api::moods::parse_timestamp;
use crate::token::Claims;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    /// Colour only when asked for and stdout is a terminal.
    pub fn new(color: bool) -> Self {
        Self {
            color: color && io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip_all, fields(count = tasks.len()))]
    pub fn write_tasks<W: Write>(&self, out: W, tasks: &[Task], today: NaiveDate) -> anyhow::Result<()> {
        let headers = ["ID", "Pri", "Title", "Due", "Tags", "State"];
        let rows = tasks
            .iter()
            .map(|task| {
                let due = task.due_date.as_deref().map(short_date).unwrap_or_default();
                let overdue = !task.is_complete
                    && task
                        .due_date
                        .as_deref()
                        .and_then(parse_timestamp)
                        .is_some_and(|due| due.date_naive() < today);
                let due = if overdue { self.paint(&due, "31") } else { due };

                let state = if task.is_archived {
                    "archived"
                } else if task.is_complete {
                    "done"
                } else {
                    ""
                };

                vec![
                    self.paint(&task.id.to_string(), "33"),
                    self.paint_priority(task.priority),
                    task.title.clone(),
                    due,
                    task.tags
                        .iter()
                        .map(|tag| format!("#{}", tag.name))
                        .collect::<Vec<_>>()
                        .join(" "),
                    state.to_string(),
                ]
            })
            .collect();

        write_table(out, &headers, rows)
    }

    #[tracing::instrument(skip_all)]
    pub fn write_task<W: Write>(&self, mut out: W, task: &Task) -> anyhow::Result<()> {
        writeln!(out, "id        {}", task.id)?;
        writeln!(out, "title     {}", task.title)?;
        if let Some(description) = &task.description {
            writeln!(out, "desc      {description}")?;
        }
        writeln!(out, "priority  {}", task.priority.label())?;
        writeln!(out, "complete  {}", yes_no(task.is_complete))?;
        writeln!(out, "archived  {}", yes_no(task.is_archived))?;
        if let Some(due) = &task.due_date {
            writeln!(out, "due       {}", short_date(due))?;
        }
        if let Some(completed) = &task.completed_at {
            writeln!(out, "completed {}", local_time(completed))?;
        }
        if !task.tags.is_empty() {
            let names: Vec<&str> = task.tags.iter().map(|tag| tag.name.as_str()).collect();
            writeln!(out, "tags      {}", names.join(", "))?;
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(count = habits.len()))]
    pub fn write_habits<W: Write>(&self, out: W, habits: &[Habit]) -> anyhow::Result<()> {
        let rows = habits
            .iter()
            .map(|habit| {
                vec![
                    self.paint(&habit.id.to_string(), "33"),
                    format!("{} {}", habit.icon.as_deref().unwrap_or(""), habit.name)
                        .trim()
                        .to_string(),
                    if habit.checked_today {
                        self.paint("\u{2713}", "32")
                    } else {
                        String::new()
                    },
                    habit.current_streak.to_string(),
                    habit.longest_streak.to_string(),
                ]
            })
            .collect();

        write_table(out, &["ID", "Habit", "Today", "Streak", "Best"], rows)
    }

    pub fn write_tags<W: Write>(&self, out: W, tags: &[Tag]) -> anyhow::Result<()> {
        let rows = tags
            .iter()
            .map(|tag| {
                vec![
                    self.paint(&tag.id.to_string(), "33"),
                    tag.name.clone(),
                    tag.color.clone().unwrap_or_default(),
                ]
            })
            .collect();
        write_table(out, &["ID", "Name", "Color"], rows)
    }

    pub fn write_moods<W: Write>(&self, out: W, entries: &[MoodEntry]) -> anyhow::Result<()> {
        let rows = entries
            .iter()
            .map(|entry| {
                let mood = entry.mood_type.clone().unwrap_or_default();
                let emoji = entry
                    .emoji
                    .clone()
                    .or_else(|| mood_emoji(&mood).map(str::to_string))
                    .unwrap_or_default();
                vec![
                    entry.timestamp().map(local_time).unwrap_or_default(),
                    format!("{emoji} {mood}").trim().to_string(),
                    entry.note.clone().unwrap_or_default(),
                ]
            })
            .collect();
        write_table(out, &["When", "Mood", "Note"], rows)
    }

    pub fn write_notes<W: Write>(&self, out: W, notes: &[Note]) -> anyhow::Result<()> {
        let rows = notes
            .iter()
            .map(|note| {
                vec![
                    self.paint(&note.id.to_string(), "33"),
                    note.title.clone(),
                    note.updated_at
                        .as_deref()
                        .or(note.created_at.as_deref())
                        .map(local_time)
                        .unwrap_or_default(),
                ]
            })
            .collect();
        write_table(out, &["ID", "Title", "Updated"], rows)
    }

    pub fn write_note<W: Write>(&self, mut out: W, note: &Note) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&note.title, "1"))?;
        if let Some(content) = note.content.as_deref().filter(|c| !c.is_empty()) {
            writeln!(out)?;
            writeln!(out, "{content}")?;
        }
        Ok(())
    }

    pub fn write_whoami<W: Write>(
        &self,
        mut out: W,
        claims: &Claims,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        writeln!(
            out,
            "user      {}",
            claims.display_name().unwrap_or_else(|| "-".to_string())
        )?;
        if let Some(email) = &claims.email {
            writeln!(out, "email     {email}")?;
        }
        if let Some(issued) = claims.iat.and_then(|secs| DateTime::from_timestamp(secs, 0)) {
            writeln!(out, "issued    {}", issued.with_timezone(&Local).format("%Y-%m-%d %H:%M"))?;
        }
        match claims.exp {
            Some(exp) => {
                let status = if claims.is_expired_at(now.timestamp()) {
                    self.paint("expired", "31")
                } else {
                    format!("in {}", humanize_secs(exp - now.timestamp()))
                };
                let at = DateTime::from_timestamp(exp, 0)
                    .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| exp.to_string());
                writeln!(out, "expires   {at} ({status})")?;
            }
            None => writeln!(out, "expires   never")?,
        }
        Ok(())
    }

    fn paint_priority(&self, priority: TaskPriority) -> String {
        match priority {
            TaskPriority::High => self.paint(priority.label(), "31"),
            TaskPriority::Medium => priority.label().to_string(),
            TaskPriority::Low => self.paint(priority.label(), "2"),
        }
    }

    pub fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn short_date(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn local_time(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn humanize_secs(secs: i64) -> String {
    match secs {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h {}m", s / 3600, (s % 3600) / 60),
        s => format!("{}d", s / 86_400),
    }
}

fn write_table<W: Write>(mut writer: W, headers: &[&str], rows: Vec<Vec<String>>) -> anyhow::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| UnicodeWidthStr::width(*h)).collect();

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let line = |cells: Vec<String>| {
        cells
            .into_iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let visible = UnicodeWidthStr::width(strip_ansi(&cell).as_str());
                format!("{cell}{}", " ".repeat(width.saturating_sub(visible)))
            })
            .collect::<Vec<_>>()
            .join(" ")
            .trim_end()
            .to_string()
    };

    writeln!(writer, "{}", line(headers.iter().map(|h| h.to_string()).collect()))?;
    writeln!(writer, "{}", line(widths.iter().map(|w| "-".repeat(*w)).collect()))?;
    for row in rows {
        writeln!(writer, "{}", line(row))?;
    }
    Ok(())
}

pub fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }
        if ch == '\x1b' {
            escaped = true;
            continue;
        }
        out.push(ch);
    }

    out
}
