//! Account operations built on the request pipeline.
//!
//! Every call here goes through [`SessionManager::send`], so responses
//! are normalized and failures classified like any other request. What
//! each endpoint returns beyond a user record or a message is the
//! application's business.

use serde::Serialize;
use serde_json::{Value, json};
use warden_protocol::{AuthPayload, Credentials, FormPart, HttpRequest, HttpResponse, User, user_from_body};
use warden_session::SessionError;
use warden_transport::Transport;

use crate::{ApiError, SessionManager, WardenError};

impl<T: Transport> SessionManager<T> {
    /// Signs in and starts a 24 h session.
    ///
    /// Accepts a `{token, user}` body or the same wrapped in `data`.
    ///
    /// # Errors
    /// [`WardenError::Api`] if the server refused (use
    /// [`user_message`](WardenError::user_message) for the sign-in
    /// screen), or a protocol error if the body has no token/user.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, WardenError> {
        let request = HttpRequest::post(&self.endpoints().login).json(credentials)?;
        let response = self.send(request).await?;
        let body = require_body(response, "login")?;
        let payload = AuthPayload::from_body(&body)?;
        Ok(self.inner.establish(&payload.user, &payload.token)?)
    }

    /// Creates an account. If the server signs the new user in right
    /// away (the body carries a token), the session starts too.
    pub async fn register<B: Serialize>(&self, form: &B) -> Result<Option<User>, WardenError> {
        let request = HttpRequest::post(&self.endpoints().register).json(form)?;
        let response = self.send(request).await?;
        let Some(body) = response.body else {
            return Ok(None);
        };
        match AuthPayload::from_body(&body) {
            Ok(payload) => Ok(Some(self.inner.establish(&payload.user, &payload.token)?)),
            Err(_) => Ok(None),
        }
    }

    /// Requests a password-reset token by email. Returns the server's
    /// message, if any.
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, WardenError> {
        let request = HttpRequest::post(&self.endpoints().forgot_password).json(&json!({ "email": email }))?;
        let response = self.send(request).await?;
        Ok(response.message().map(str::to_string))
    }

    /// Sets a new password with a reset token.
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<Option<String>, WardenError> {
        let body = json!({
            "token": token,
            "password": password,
            "password_confirmation": confirmation,
        });
        let request = HttpRequest::post(&self.endpoints().reset_password).json(&body)?;
        let response = self.send(request).await?;
        Ok(response.message().map(str::to_string))
    }

    /// Changes the signed-in user's password.
    pub async fn update_password(
        &self,
        current: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<Option<String>, WardenError> {
        let body = json!({
            "current_password": current,
            "password": password,
            "password_confirmation": confirmation,
        });
        let request = HttpRequest::post(&self.endpoints().update_password).json(&body)?;
        let response = self.send(request).await?;
        Ok(response.message().map(str::to_string))
    }

    /// Updates profile fields.
    ///
    /// If the response carries the updated user, it is saved with a
    /// fresh expiry; otherwise `fields` is merged into the stored user.
    pub async fn update_profile(&self, fields: &Value) -> Result<User, WardenError> {
        let request = HttpRequest::post(&self.endpoints().update_profile).json(fields)?;
        let response = self.send(request).await?;
        match response.body.as_ref().and_then(user_from_body) {
            Some(user) => self.resave(&user),
            None => Ok(self.store().merge_user(fields)?),
        }
    }

    /// Updates the profile with a multipart form (for example an avatar
    /// upload). If the response has no user record, the profile is
    /// fetched again.
    pub async fn update_profile_form(&self, parts: Vec<FormPart>) -> Result<User, WardenError> {
        let request = HttpRequest::post(&self.endpoints().update_profile).multipart(parts);
        let response = self.send(request).await?;
        match response.body.as_ref().and_then(user_from_body) {
            Some(user) => self.resave(&user),
            None => self.refresh_profile().await,
        }
    }

    /// Fetches the current user and saves it with a fresh expiry.
    pub async fn refresh_profile(&self) -> Result<User, WardenError> {
        let response = self.send(HttpRequest::get(&self.endpoints().profile)).await?;
        let body = require_body(response, "profile")?;
        let user = user_from_body(&body)
            .ok_or_else(|| WardenError::InvalidResponse("profile response has no user".into()))?;
        self.resave(&user)
    }

    /// Calls the health endpoint. No credentials are sent.
    pub async fn check_status(&self) -> Result<HttpResponse, ApiError> {
        self.send(HttpRequest::get(&self.endpoints().status)).await
    }

    fn resave(&self, user: &User) -> Result<User, WardenError> {
        let token = self.store().token()?.ok_or(SessionError::NoSession)?;
        Ok(self.store().save(user, &token)?.user)
    }
}

fn require_body(response: HttpResponse, call: &str) -> Result<Value, WardenError> {
    response
        .body
        .ok_or_else(|| WardenError::InvalidResponse(format!("{call} response has no body")))
}
