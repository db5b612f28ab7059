//! # Auth API
//!
//! Login, signup and password reset against the auth service. A successful
//! login moves the session store to `LoggedIn`.

use crate::http::{ApiClient, Auth};
use reqwest::Method;
use rent_core::{RentError, RentResult};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct SignupRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct ForgotRequest<'a> {
    username: &'a str,
}

#[derive(Debug, Deserialize)]
struct ForgotResponse {
    reset_token: String,
}

#[derive(Debug, Serialize)]
struct ResetRequest<'a> {
    token: &'a str,
    new_password: &'a str,
}

pub struct AuthApi {
    api: ApiClient,
}

impl AuthApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Exchange credentials for a bearer token (`POST /auth/token`, form-encoded)
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> RentResult<()> {
        require("username", username)?;
        require("password", password)?;

        let builder = self
            .api
            .request(Method::POST, "/auth/token", Auth::IfPresent)?
            .form(&[("username", username), ("password", password)]);
        let token: TokenResponse = self.api.fetch(builder).await?;

        self.api.session().set_token(token.access_token)?;
        info!("Logged in");
        Ok(())
    }

    /// Create an account (`POST /auth/signup`); does not log in
    #[instrument(skip(self, password))]
    pub async fn signup(&self, username: &str, email: &str, password: &str) -> RentResult<()> {
        require("username", username)?;
        require("email", email)?;
        require("password", password)?;

        let builder = self
            .api
            .request(Method::POST, "/auth/signup", Auth::IfPresent)?
            .json(&SignupRequest {
                username,
                email,
                password,
            });
        self.api.execute(builder).await?;
        info!("Account created");
        Ok(())
    }

    /// Signup followed by login
    pub async fn register_and_login(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> RentResult<()> {
        self.signup(username, email, password).await?;
        self.login(username, password).await
    }

    /// Request a password reset token (`POST /auth/password/forgot`)
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, username: &str) -> RentResult<String> {
        require("username", username)?;

        let response: ForgotResponse = self
            .api
            .post_json(
                "/auth/password/forgot",
                &ForgotRequest { username },
                Auth::IfPresent,
            )
            .await?;
        Ok(response.reset_token)
    }

    /// Set a new password using a reset token (`POST /auth/password/reset`)
    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> RentResult<()> {
        require("token", token)?;
        require("new_password", new_password)?;

        let builder = self
            .api
            .request(Method::POST, "/auth/password/reset", Auth::IfPresent)?
            .json(&ResetRequest {
                token,
                new_password,
            });
        self.api.execute(builder).await?;
        info!("Password reset");
        Ok(())
    }

    /// End the session locally
    pub fn logout(&self) -> RentResult<()> {
        self.api.session().clear_token()
    }
}

fn require(field: &str, value: &str) -> RentResult<()> {
    if value.trim().is_empty() {
        return Err(RentError::InvalidRequest(format!("{} is required", field)));
    }
    Ok(())
}
