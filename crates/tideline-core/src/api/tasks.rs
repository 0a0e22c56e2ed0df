use tideline_shared::{Task, TaskCreate, TaskPatch, TaskQuery};

use crate::error::ApiError;
use crate::http::{ApiClient, Request, Transport};

pub async fn list<T: Transport>(client: &ApiClient<T>, query: TaskQuery) -> Result<Vec<Task>, ApiError> {
    let path = format!("/tasks{}", query.to_query_string());
    Ok(client.fetch(Request::get(path)).await?.unwrap_or_default())
}

pub async fn get<T: Transport>(client: &ApiClient<T>, id: i64) -> Result<Task, ApiError> {
    client.expect(Request::get(format!("/tasks/{id}"))).await
}

pub async fn create<T: Transport>(client: &ApiClient<T>, task: &TaskCreate) -> Result<Option<Task>, ApiError> {
    client.fetch(Request::post("/tasks").json(task)?).await
}

pub async fn update<T: Transport>(
    client: &ApiClient<T>,
    id: i64,
    patch: &TaskPatch,
) -> Result<Option<Task>, ApiError> {
    client
        .fetch(Request::patch(format!("/tasks/{id}")).json(patch)?)
        .await
}

pub async fn delete<T: Transport>(client: &ApiClient<T>, id: i64) -> Result<(), ApiError> {
    client.execute(Request::delete(format!("/tasks/{id}"))).await
}

pub async fn complete<T: Transport>(client: &ApiClient<T>, id: i64) -> Result<(), ApiError> {
    client.execute(Request::post(format!("/tasks/{id}/complete"))).await
}

pub async fn uncomplete<T: Transport>(client: &ApiClient<T>, id: i64) -> Result<(), ApiError> {
    client.execute(Request::post(format!("/tasks/{id}/uncomplete"))).await
}

pub async fn archive<T: Transport>(client: &ApiClient<T>, id: i64) -> Result<(), ApiError> {
    client.execute(Request::post(format!("/tasks/{id}/archive"))).await
}
