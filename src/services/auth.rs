// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Account registration, credential checks and profile management.

use crate::error::{CatalogError, Result};
use crate::models::auth::{
    ChangePasswordRequest, DeleteAccountRequest, LoginRequest, NewUser, RegisterRequest,
    UpdateProfileRequest, User, UserCredentials, UserStats, MIN_NAME_CHARS, MIN_PASSWORD_CHARS,
};
use crate::services::logging::anonymize_email;
use crate::services::store::UserStore;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, Salt, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;
use tracing::{info, warn};

/// Give up deriving a free handle after this many suffixes.
const MAX_HANDLE_ATTEMPTS: u32 = 1000;

/// Hash a password into an Argon2 PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; Salt::RECOMMENDED_LENGTH];
    OsRng.fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| CatalogError::Storage(format!("Failed to encode salt: {}", e)))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CatalogError::Storage(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored PHC string. Unparseable hashes never
/// verify.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Base handle for a display name: lower-cased with whitespace removed.
pub fn base_handle(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let well_formed = |part: &str| !part.is_empty() && !part.contains(char::is_whitespace);
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    well_formed(local) && !domain.contains('@') && well_formed(host) && well_formed(tld)
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().chars().count() < MIN_NAME_CHARS {
        return Err(CatalogError::Validation(format!(
            "name must have at least {} characters",
            MIN_NAME_CHARS
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    if !is_valid_email(email.trim()) {
        return Err(CatalogError::Validation(
            "e-mail address is invalid".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(CatalogError::Validation(format!(
            "password must have at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }
    Ok(())
}

fn validate_registration(request: &RegisterRequest) -> Result<()> {
    validate_name(&request.name)?;
    validate_email(&request.email)?;
    validate_password(&request.password)
}

fn require_password(password: &str, field: &str) -> Result<()> {
    if password.is_empty() {
        return Err(CatalogError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn user_not_found(handle: &str) -> CatalogError {
    CatalogError::NotFound(format!("user {}", handle))
}

/// Account service.
pub struct AccountService {
    users: Arc<dyn UserStore>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Register a new account and derive its public handle.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        validate_registration(request)?;
        let email = request.email.trim();

        if self.users.email_exists(email).await? {
            return Err(CatalogError::Conflict(
                "e-mail is already registered".to_string(),
            ));
        }

        let handle = self.free_handle(&base_handle(&request.name)).await?;
        let user = self
            .users
            .create_user(&NewUser {
                handle,
                name: request.name.trim().to_string(),
                email: email.to_string(),
                password_hash: hash_password(&request.password)?,
            })
            .await?;

        info!(handle = %user.handle, email = %anonymize_email(&user.email), "Account registered");
        Ok(user)
    }

    /// Check credentials. Unknown e-mail and wrong password are
    /// indistinguishable to the caller.
    pub async fn login(&self, request: &LoginRequest) -> Result<User> {
        let credentials = self
            .users
            .get_credentials_by_email(request.email.trim())
            .await?;

        match credentials {
            Some(credentials) if verify_password(&request.password, &credentials.password_hash) => {
                info!(handle = %credentials.user.handle, "Login succeeded");
                Ok(credentials.user)
            }
            _ => {
                warn!(email = %anonymize_email(&request.email), "Login failed");
                Err(CatalogError::InvalidCredentials)
            }
        }
    }

    pub async fn profile(&self, handle: &str) -> Result<User> {
        self.users
            .get_user(handle)
            .await?
            .ok_or_else(|| user_not_found(handle))
    }

    /// Change name and/or e-mail. At least one must be given.
    pub async fn update_profile(
        &self,
        handle: &str,
        request: &UpdateProfileRequest,
    ) -> Result<User> {
        let name = request.name.as_deref().map(str::trim);
        let email = request.email.as_deref().map(str::trim);
        if name.is_none() && email.is_none() {
            return Err(CatalogError::Validation(
                "nothing to update: provide name or email".to_string(),
            ));
        }
        if let Some(name) = name {
            validate_name(name)?;
        }
        if let Some(email) = email {
            validate_email(email)?;
        }

        let user = self
            .users
            .update_user(handle, name, email)
            .await?
            .ok_or_else(|| user_not_found(handle))?;
        info!(handle, "Profile updated");
        Ok(user)
    }

    /// Replace the password after checking the current one.
    pub async fn change_password(
        &self,
        handle: &str,
        request: &ChangePasswordRequest,
    ) -> Result<()> {
        require_password(&request.current_password, "current_password")?;
        validate_password(&request.new_password)?;
        self.verified_credentials(handle, &request.current_password)
            .await?;

        let password_hash = hash_password(&request.new_password)?;
        if !self.users.set_password_hash(handle, &password_hash).await? {
            return Err(user_not_found(handle));
        }
        info!(handle, "Password changed");
        Ok(())
    }

    /// Delete an account and its reviews after checking the password.
    pub async fn delete_account(
        &self,
        handle: &str,
        request: &DeleteAccountRequest,
    ) -> Result<()> {
        require_password(&request.password, "password")?;
        self.verified_credentials(handle, &request.password).await?;

        if !self.users.delete_user(handle).await? {
            return Err(user_not_found(handle));
        }
        info!(handle, "Account deleted");
        Ok(())
    }

    pub async fn stats(&self) -> Result<UserStats> {
        Ok(UserStats::from(self.users.user_activity().await?))
    }

    /// Unknown handle and wrong password are indistinguishable to the caller.
    async fn verified_credentials(&self, handle: &str, password: &str) -> Result<UserCredentials> {
        match self.users.get_credentials(handle).await? {
            Some(credentials) if verify_password(password, &credentials.password_hash) => {
                Ok(credentials)
            }
            _ => {
                warn!(handle, "Password check failed");
                Err(CatalogError::InvalidCredentials)
            }
        }
    }

    /// First of `base`, `base1`, `base2`, ... not taken yet.
    async fn free_handle(&self, base: &str) -> Result<String> {
        if !self.users.handle_exists(base).await? {
            return Ok(base.to_string());
        }
        for counter in 1..=MAX_HANDLE_ATTEMPTS {
            let candidate = format!("{}{}", base, counter);
            if !self.users.handle_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(CatalogError::Conflict(format!(
            "no free handle derived from {}",
            base
        )))
    }
}
