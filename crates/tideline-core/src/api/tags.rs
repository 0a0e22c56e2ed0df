use tideline_shared::{Tag, TagUpsert};
use tracing::warn;

use crate::error::ApiError;
use crate::http::{ApiClient, Request, Transport};

pub async fn list<T: Transport>(client: &ApiClient<T>) -> Result<Vec<Tag>, ApiError> {
    Ok(client.fetch(Request::get("/tags")).await?.unwrap_or_default())
}

/// Tag lists are decoration; a failed fetch leaves them empty.
pub async fn list_or_empty<T: Transport>(client: &ApiClient<T>) -> Vec<Tag> {
    match list(client).await {
        Ok(tags) => tags,
        Err(err) => {
            warn!(error = %err, "tag fetch failed; continuing without tags");
            Vec::new()
        }
    }
}

pub async fn create<T: Transport>(client: &ApiClient<T>, tag: &TagUpsert) -> Result<Tag, ApiError> {
    client.expect(Request::post("/tags").json(tag)?).await
}

pub async fn update<T: Transport>(client: &ApiClient<T>, id: i64, tag: &TagUpsert) -> Result<Tag, ApiError> {
    client
        .expect(Request::put(format!("/tags/{id}")).json(tag)?)
        .await
}

pub async fn delete<T: Transport>(client: &ApiClient<T>, id: i64) -> Result<(), ApiError> {
    client.execute(Request::delete(format!("/tags/{id}"))).await
}
