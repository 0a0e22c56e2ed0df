use chrono::Utc;
use tideline_shared::{Habit, HabitCheck, HabitUpsert};
use tracing::{debug, instrument};

use crate::api;
use crate::error::ApiError;
use crate::http::{ApiClient, Transport};
use crate::optimistic::{Outcome, ViewState};

pub struct HabitBoard<T> {
    client: ApiClient<T>,
    view: ViewState<Habit>,
}

impl<T: Transport> HabitBoard<T> {
    pub fn new(client: ApiClient<T>) -> Self {
        Self {
            client,
            view: ViewState::new(),
        }
    }

    pub fn view(&self) -> &ViewState<Habit> {
        &self.view
    }

    pub fn habits(&self) -> Vec<Habit> {
        self.view.items()
    }

    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<(), ApiError> {
        match api::habits::list(&self.client).await {
            Ok(habits) => {
                debug!(count = habits.len(), "habits loaded");
                self.view.replace_all(habits);
                self.view.clear_error();
                Ok(())
            }
            Err(err) => {
                self.view.report(&err, "Failed to load habits");
                Err(err)
            }
        }
    }

    /// Check in (or undo today's check-in). The streak shown meanwhile is a
    /// guess; the habit is re-read afterwards and the backend's numbers win.
    #[instrument(skip(self))]
    pub async fn toggle_check(&self, id: i64) -> Result<Outcome, ApiError> {
        let client = &self.client;
        let today = today();
        self.view
            .mutate(
                id,
                |habit| predict_check(habit, &today),
                |_| async move { api::habits::check(client, id).await.map(|_| ()) },
                || api::habits::get(client, id),
                "Failed to toggle check-in",
            )
            .await
    }

    #[instrument(skip(self, description))]
    pub async fn create(&self, name: &str, description: Option<String>) -> Result<Outcome, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Outcome::Unchanged);
        }

        let payload = HabitUpsert {
            name: name.to_string(),
            description: description.filter(|text| !text.trim().is_empty()),
            ..HabitUpsert::default()
        };
        match api::habits::create(&self.client, &payload).await {
            Ok(created) => {
                self.view.upsert(created);
                Ok(Outcome::Applied)
            }
            Err(err) => {
                self.view.report(&err, "Failed to create habit");
                Err(err)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<Outcome, ApiError> {
        let Some(_guard) = self.view.busy().try_acquire(id) else {
            return Ok(Outcome::Busy);
        };
        match api::habits::delete(&self.client, id).await {
            Ok(()) => {
                self.view.remove(id);
                Ok(Outcome::Applied)
            }
            Err(err) => {
                self.view.report(&err, "Failed to delete habit");
                Err(err)
            }
        }
    }
}

fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

fn predict_check(habit: &Habit, today: &str) -> Habit {
    let checked_today = !habit.checked_today;
    let current_streak = if checked_today {
        habit.current_streak + 1
    } else {
        habit.current_streak.saturating_sub(1)
    };

    let mut checks: Vec<HabitCheck> = habit
        .checks
        .iter()
        .filter(|check| check.date != today)
        .cloned()
        .collect();
    if checked_today {
        checks.push(HabitCheck {
            date: today.to_string(),
        });
    }

    Habit {
        checked_today,
        current_streak,
        longest_streak: habit.longest_streak.max(current_streak),
        checks,
        ..habit.clone()
    }
}
