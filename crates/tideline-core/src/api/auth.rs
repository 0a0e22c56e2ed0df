use tideline_shared::{AuthResponse, LoginRequest, SignupRequest};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::http::{ApiClient, Request, Transport};

/// Logs in with a username or email and stores the returned token.
#[instrument(skip(client, password))]
pub async fn login<T: Transport>(
    client: &ApiClient<T>,
    identifier: &str,
    password: &str,
) -> anyhow::Result<()> {
    let request = Request::post("/auth/login").json(&LoginRequest {
        identifier: identifier.to_string(),
        password: password.to_string(),
    })?;
    let response: AuthResponse = client.expect(request).await?;
    client.session().set_token(&response.access_token)?;
    info!(user = ?client.session().current_user(), "logged in");
    Ok(())
}

#[instrument(skip(client, password))]
pub async fn signup<T: Transport>(
    client: &ApiClient<T>,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let request = Request::post("/auth/signup").json(&SignupRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    })?;
    let response: AuthResponse = client.expect(request).await?;
    client.session().set_token(&response.access_token)?;
    info!(user = ?client.session().current_user(), "signed up");
    Ok(())
}

/// Local only: the backend keeps no session to end.
pub fn logout<T: Transport>(client: &ApiClient<T>) -> anyhow::Result<()> {
    client.session().clear_token()?;
    info!("logged out");
    Ok(())
}

pub(crate) fn is_unauthorized(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ApiError>()
        .is_some_and(ApiError::is_session_expired)
}
