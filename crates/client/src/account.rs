//! Credential-issuing and profile flows.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use blogdesk_auth::{Credentials, Principal, PrincipalPatch};
use blogdesk_core::Envelope;

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use crate::transport::ApiRequest;

pub const LOGIN_PATH: &str = "login";
pub const LOGOUT_PATH: &str = "authrequired/user/logout";
pub const REFRESH_PATH: &str = "refresh";
pub const REGISTER_PATH: &str = "register";
pub const EMAIL_LOGIN_PATH: &str = "loginWithEmail";
pub const RESET_PASSWORD_PATH: &str = "resetPassword";
pub const USER_INFO_PATH: &str = "authrequired/user/getUserInfo";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    #[serde(rename = "verificationCode")]
    pub verification_code: String,
    pub password: String,
    pub confirm_password: String,
    pub nick_name: String,
    pub sex: String,
    pub role: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailLoginForm {
    pub email: String,
    #[serde(rename = "verificationCode")]
    pub verification_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPasswordForm {
    pub email: String,
    #[serde(rename = "verificationCode")]
    pub verification_code: String,
    pub new_password: String,
    pub confirm_password: String,
}

fn check_email(email: &str) -> ClientResult<()> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ClientError::invalid_input("a valid email address is required"));
    }
    Ok(())
}

fn check_code(code: &str) -> ClientResult<()> {
    if code.trim().is_empty() {
        return Err(ClientError::invalid_input("verification code is required"));
    }
    Ok(())
}

fn check_passwords(password: &str, confirmation: &str) -> ClientResult<()> {
    if password.is_empty() {
        return Err(ClientError::invalid_input("password is required"));
    }
    if password != confirmation {
        return Err(ClientError::invalid_input("passwords do not match"));
    }
    Ok(())
}

impl RegisterForm {
    pub fn validate(&self) -> ClientResult<()> {
        if self.name.trim().is_empty() {
            return Err(ClientError::invalid_input("user name is required"));
        }
        check_email(&self.email)?;
        check_code(&self.verification_code)?;
        check_passwords(&self.password, &self.confirm_password)
    }
}

impl EmailLoginForm {
    pub fn validate(&self) -> ClientResult<()> {
        check_email(&self.email)?;
        check_code(&self.verification_code)
    }
}

impl ResetPasswordForm {
    pub fn validate(&self) -> ClientResult<()> {
        check_email(&self.email)?;
        check_code(&self.verification_code)?;
        check_passwords(&self.new_password, &self.confirm_password)
    }
}

fn to_body<T: Serialize>(form: &T) -> ClientResult<Value> {
    serde_json::to_value(form).map_err(|e| ClientError::invalid_input(e.to_string()))
}

/// Sign-in, sign-out, refresh and the two-step email flows.
///
/// Every call goes through the classified pipeline, so failures have been
/// surfaced to the user before the error is returned.
#[derive(Clone)]
pub struct AccountService {
    api: ApiClient,
    session: Session,
}

impl AccountService {
    pub fn new(api: ApiClient, session: Session) -> Self {
        Self { api, session }
    }

    pub async fn login(&self, name: &str, password: &str, remember: bool) -> ClientResult<()> {
        if name.trim().is_empty() || password.is_empty() {
            return Err(ClientError::invalid_input("user name and password are required"));
        }

        let envelope = self
            .api
            .post(LOGIN_PATH, json!({ "name": name, "password": password }))
            .await?;
        let credentials: Credentials = envelope.data_as()?;

        self.session.set(credentials).await;
        self.session.set_remember(remember).await;
        tracing::info!(name, "signed in");
        Ok(())
    }

    /// Tell the server and drop the local session whatever it answers.
    pub async fn logout(&self) -> ClientResult<()> {
        let result = self.api.post(LOGOUT_PATH, Value::Null).await;
        self.session.clear().await;
        result.map(|_| ())
    }

    /// Exchange the refresh token for a new credential set.
    pub async fn refresh(&self) -> ClientResult<()> {
        let Some(refresh_token) = self.session.refresh_token() else {
            return Err(ClientError::NotAuthenticated);
        };

        let request = ApiRequest::post(REFRESH_PATH, json!({})).with_bearer(&refresh_token);
        let envelope = self.api.send(request).await?;
        let credentials: Credentials = envelope.data_as()?;

        self.session.set(credentials).await;
        tracing::info!("access token refreshed");
        Ok(())
    }

    pub async fn request_register_code(&self, email: &str) -> ClientResult<()> {
        self.request_code(REGISTER_PATH, email).await
    }

    pub async fn register(&self, form: &RegisterForm) -> ClientResult<()> {
        form.validate()?;
        let envelope = self.api.post(REGISTER_PATH, to_body(form)?).await?;
        self.adopt_issued(&envelope).await;
        Ok(())
    }

    pub async fn request_email_login_code(&self, email: &str) -> ClientResult<()> {
        self.request_code(EMAIL_LOGIN_PATH, email).await
    }

    pub async fn login_with_email(&self, form: &EmailLoginForm) -> ClientResult<()> {
        form.validate()?;
        let envelope = self.api.post(EMAIL_LOGIN_PATH, to_body(form)?).await?;
        let credentials: Credentials = envelope.data_as()?;
        self.session.set(credentials).await;
        tracing::info!("signed in with email code");
        Ok(())
    }

    pub async fn request_reset_code(&self, email: &str) -> ClientResult<()> {
        self.request_code(RESET_PASSWORD_PATH, email).await
    }

    pub async fn reset_password(&self, form: &ResetPasswordForm) -> ClientResult<()> {
        form.validate()?;
        let envelope = self.api.post(RESET_PASSWORD_PATH, to_body(form)?).await?;
        self.adopt_issued(&envelope).await;
        Ok(())
    }

    /// Fetch the profile and merge it into the session.
    pub async fn user_info(&self) -> ClientResult<Principal> {
        let envelope = self.api.get(USER_INFO_PATH).await?;
        let patch: PrincipalPatch = envelope.data_as()?;
        self.session.merge_principal(patch);
        Ok(self.session.principal())
    }

    async fn request_code(&self, path: &str, email: &str) -> ClientResult<()> {
        check_email(email)?;
        self.api.post(path, json!({ "email": email.trim() })).await?;
        tracing::debug!(path, "verification code requested");
        Ok(())
    }

    /// Some completions hand out credentials, some only confirm.
    async fn adopt_issued(&self, envelope: &Envelope) {
        match envelope.optional_data_as::<Credentials>() {
            Ok(Some(credentials)) if !credentials.token.is_empty() => {
                self.session.set(credentials).await;
            }
            _ => tracing::debug!("completion returned no credentials"),
        }
    }
}
