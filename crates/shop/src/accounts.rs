//! Registration, sign-in and password management.

use std::sync::Arc;

use common::UserId;
use domain::{User, UserSummary};
use serde::{Deserialize, Serialize};
use store::UserStore;

use crate::auth::{TokenIssuer, hash_password, verify_password};
use crate::error::{Result, ShopError};
use crate::validation::ValidationErrors;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub email: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub number: Option<String>,
    pub password: Option<String>,
    pub age: Option<i64>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignInInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordInput {
    pub email: Option<String>,
    pub new_password: Option<String>,
}

/// A freshly issued token and the user it identifies.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserSummary,
}

/// Result of a sign-in attempt with well-formed input.
#[derive(Debug, Clone)]
pub enum SignInOutcome {
    Authenticated(AuthSession),
    /// No account uses the email; the client offers registration instead.
    NotRegistered,
}

/// Service for user accounts.
#[derive(Clone)]
pub struct AccountService<S> {
    store: S,
    tokens: Arc<TokenIssuer>,
}

impl<S: UserStore> AccountService<S> {
    pub fn new(store: S, tokens: Arc<TokenIssuer>) -> Self {
        Self { store, tokens }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    #[tracing::instrument(skip(self, input), fields(email = ?input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession> {
        let mut errors = ValidationErrors::new();
        let email = required_email(&mut errors, input.email);
        let name = match errors.required("name", input.name) {
            Some(name) => {
                errors.non_empty("name", &name);
                name
            }
            None => String::new(),
        };
        let password =
            required_password(&mut errors, "password", input.password, MIN_PASSWORD_LEN);
        let age = input.age.and_then(|age| match i32::try_from(age) {
            Ok(age) if age >= 0 => Some(age),
            _ => {
                errors.add("age", "must be a non-negative integer");
                None
            }
        });
        errors.finish(())?;

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(ShopError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(password).await?;
        let mut user = User::new(email, name, password_hash);
        user.location = input.location;
        user.phone_number = input.number;
        user.age = age;
        user.is_admin = input.is_admin.unwrap_or(false);
        self.store.insert_user(&user).await.map_err(|e| match e {
            store::StoreError::Conflict(_) => {
                ShopError::Conflict("Email already registered".to_string())
            }
            other => other.into(),
        })?;

        metrics::counter!("users_registered_total").increment(1);
        tracing::info!(user_id = %user.id, is_admin = user.is_admin, "user registered");
        self.session(&user)
    }

    #[tracing::instrument(skip(self, input), fields(email = ?input.email))]
    pub async fn sign_in(&self, input: SignInInput) -> Result<SignInOutcome> {
        let mut errors = ValidationErrors::new();
        let email = required_email(&mut errors, input.email);
        let password = required_password(&mut errors, "password", input.password, 1);
        errors.finish(())?;

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            tracing::debug!("sign-in for unregistered email");
            return Ok(SignInOutcome::NotRegistered);
        };
        if !verify_password(password, user.password_hash.clone()).await? {
            tracing::info!(user_id = %user.id, "sign-in rejected");
            return Err(ShopError::Unauthorized("Invalid credentials".to_string()));
        }

        tracing::info!(user_id = %user.id, "user signed in");
        Ok(SignInOutcome::Authenticated(self.session(&user)?))
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn change_password(&self, user_id: UserId, input: ChangePasswordInput) -> Result<()> {
        let mut errors = ValidationErrors::new();
        let current = required_password(&mut errors, "currentPassword", input.current_password, 1);
        let new_password =
            required_password(&mut errors, "newPassword", input.new_password, MIN_PASSWORD_LEN);
        errors.finish(())?;

        let mut user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| ShopError::not_found("User"))?;
        if !verify_password(current, user.password_hash.clone()).await? {
            let errors = ValidationErrors::single("currentPassword", "Current password incorrect");
            return Err(errors.into());
        }

        self.store_password(&mut user, new_password).await?;
        tracing::info!(%user_id, "password changed");
        Ok(())
    }

    /// Replaces the password of the account registered under `email`.
    #[tracing::instrument(skip(self, input), fields(email = ?input.email))]
    pub async fn reset_password(&self, input: ResetPasswordInput) -> Result<()> {
        let mut errors = ValidationErrors::new();
        let email = required_email(&mut errors, input.email);
        let new_password =
            required_password(&mut errors, "newPassword", input.new_password, MIN_PASSWORD_LEN);
        errors.finish(())?;

        let mut user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| ShopError::not_found("User"))?;

        self.store_password(&mut user, new_password).await?;
        tracing::info!(user_id = %user.id, "password reset");
        Ok(())
    }

    async fn store_password(&self, user: &mut User, password: String) -> Result<()> {
        user.set_password_hash(hash_password(password).await?);
        if !self.store.update_password(user).await? {
            return Err(ShopError::not_found("User"));
        }
        Ok(())
    }

    fn session(&self, user: &User) -> Result<AuthSession> {
        Ok(AuthSession {
            token: self.tokens.issue(user.id, user.is_admin)?,
            user: user.summary(),
        })
    }
}

fn required_email(errors: &mut ValidationErrors, raw: Option<String>) -> String {
    match errors.required("email", raw) {
        Some(email) => {
            errors.email("email", &email);
            email
        }
        None => String::new(),
    }
}

fn required_password(
    errors: &mut ValidationErrors,
    field: &str,
    raw: Option<String>,
    min: usize,
) -> String {
    match errors.required(field, raw) {
        Some(password) => {
            errors.min_len(field, &password, min);
            password
        }
        None => String::new(),
    }
}
