use tideline_shared::{Note, NoteUpsert};

use crate::error::ApiError;
use crate::http::{ApiClient, Request, Transport};

pub async fn list<T: Transport>(client: &ApiClient<T>) -> Result<Vec<Note>, ApiError> {
    Ok(client.fetch(Request::get("/notes")).await?.unwrap_or_default())
}

pub async fn get<T: Transport>(client: &ApiClient<T>, id: i64) -> Result<Note, ApiError> {
    client.expect(Request::get(format!("/notes/{id}"))).await
}

pub async fn create<T: Transport>(client: &ApiClient<T>, note: &NoteUpsert) -> Result<Note, ApiError> {
    client.expect(Request::post("/notes").json(note)?).await
}

pub async fn update<T: Transport>(client: &ApiClient<T>, id: i64, note: &NoteUpsert) -> Result<Note, ApiError> {
    client
        .expect(Request::put(format!("/notes/{id}")).json(note)?)
        .await
}

pub async fn delete<T: Transport>(client: &ApiClient<T>, id: i64) -> Result<(), ApiError> {
    client.execute(Request::delete(format!("/notes/{id}"))).await
}
