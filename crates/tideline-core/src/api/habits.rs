use tideline_shared::{CheckResult, Habit, HabitUpsert};

use crate::error::ApiError;
use crate::http::{ApiClient, Request, Transport};

pub async fn list<T: Transport>(client: &ApiClient<T>) -> Result<Vec<Habit>, ApiError> {
    Ok(client.fetch(Request::get("/habits")).await?.unwrap_or_default())
}

pub async fn get<T: Transport>(client: &ApiClient<T>, id: i64) -> Result<Habit, ApiError> {
    client.expect(Request::get(format!("/habits/{id}"))).await
}

pub async fn create<T: Transport>(client: &ApiClient<T>, habit: &HabitUpsert) -> Result<Habit, ApiError> {
    client.expect(Request::post("/habits").json(habit)?).await
}

pub async fn update<T: Transport>(
    client: &ApiClient<T>,
    id: i64,
    habit: &HabitUpsert,
) -> Result<Habit, ApiError> {
    client
        .expect(Request::put(format!("/habits/{id}")).json(habit)?)
        .await
}

pub async fn delete<T: Transport>(client: &ApiClient<T>, id: i64) -> Result<(), ApiError> {
    client.execute(Request::delete(format!("/habits/{id}"))).await
}

/// Toggles today's check-in; the backend answers with the new state.
pub async fn check<T: Transport>(client: &ApiClient<T>, id: i64) -> Result<Option<CheckResult>, ApiError> {
    client.fetch(Request::post(format!("/habits/{id}/check"))).await
}
