use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::database::models::user::{User, ROLE_CUSTOMER};
use crate::database::{Gateway, GatewayError};
use crate::entities::EntityError;
use crate::validator::Validator;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// User entity: CRUD plus credential handling, delegating every statement to
/// the gateway's bound-parameter primitives.
pub struct Users {
    gateway: Gateway,
}

impl Users {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, GatewayError> {
        self.gateway
            .fetch_optional(
                "SELECT * FROM \"users\" WHERE \"id\" = $1",
                &[json!(id)],
            )
            .await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, GatewayError> {
        self.gateway
            .fetch_optional(
                "SELECT * FROM \"users\" WHERE \"username\" = $1",
                &[json!(username)],
            )
            .await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, GatewayError> {
        self.gateway
            .fetch_optional(
                "SELECT * FROM \"users\" WHERE \"email\" = $1",
                &[json!(email)],
            )
            .await
    }

    /// Validate, check uniqueness, hash, insert. Returns the new user id.
    pub async fn create(&self, new_user: NewUser) -> Result<i64, EntityError> {
        let mut validator = Validator::new();
        validator.validate_username(&new_user.username);
        validator.validate_email(&new_user.email);
        validator.validate_password(&new_user.password);
        if validator.has_errors() {
            return Err(EntityError::Validation(validator.into_errors()));
        }

        if self.get_by_username(&new_user.username).await?.is_some() {
            return Err(EntityError::Validation(vec![
                "Username is already taken".to_string(),
            ]));
        }
        if self.get_by_email(&new_user.email).await?.is_some() {
            return Err(EntityError::Validation(vec![
                "Email address is already registered".to_string(),
            ]));
        }

        let id = self
            .gateway
            .insert(
                "users",
                &[
                    ("username", json!(new_user.username)),
                    ("email", json!(new_user.email)),
                    ("password_hash", json!(hash_password(&new_user.password))),
                    ("role", json!(ROLE_CUSTOMER)),
                ],
            )
            .await?;
        Ok(id)
    }

    /// Look up by username (or email when the identifier contains `@`) and
    /// verify the password. `Ok(None)` means bad credentials; the caller
    /// decides how to phrase that.
    pub async fn verify_credentials(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<Option<User>, GatewayError> {
        let user = if identifier.contains('@') {
            self.get_by_email(identifier).await?
        } else {
            self.get_by_username(identifier).await?
        };
        Ok(user.filter(|u| verify_password(password, &u.password_hash)))
    }

    pub async fn update_email(&self, id: i64, email: &str) -> Result<(), EntityError> {
        let mut validator = Validator::new();
        validator.validate_email(email);
        if validator.has_errors() {
            return Err(EntityError::Validation(validator.into_errors()));
        }
        if let Some(existing) = self.get_by_email(email).await? {
            if existing.id != id {
                return Err(EntityError::Validation(vec![
                    "Email address is already registered".to_string(),
                ]));
            }
        }
        let rows = self
            .gateway
            .execute(
                "UPDATE \"users\" SET \"email\" = $1, \"updated_at\" = now() WHERE \"id\" = $2",
                &[json!(email), json!(id)],
            )
            .await?;
        if rows == 0 {
            return Err(GatewayError::NotFound("User not found".to_string()).into());
        }
        Ok(())
    }
}

/// Salted SHA-256 digest stored as `salt$hex`.
fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}${}", salt, digest(&salt, password))
}

fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) => digest(salt, password) == expected,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trips() {
        let stored = hash_password("Abc12345!");
        assert!(verify_password("Abc12345!", &stored));
        assert!(!verify_password("Abc12345?", &stored));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("Abc12345!"), hash_password("Abc12345!"));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("anything", "no-separator"));
        assert!(!verify_password("anything", ""));
    }
}
