//! Identity operations: accounts, sessions, settings
//!
//! Passwords are hashed with Argon2id (random per-user salt). Sessions are
//! opaque UUIDv4 bearer tokens with a fixed TTL; expired rows are swept
//! opportunistically on sign-in.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::warn;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Session, Theme, User};

/// How long a session stays valid
const SESSION_TTL_DAYS: i64 = 30;

/// Minimum password length, matching the client-side rule
const MIN_PASSWORD_LEN: usize = 6;

/// Phrase the owner must type to confirm account deletion
pub const DELETE_CONFIRMATION: &str = "DELETAR";

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Encryption(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::InvalidData(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let theme: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        theme: theme.parse().unwrap_or_default(),
        created_at: parse_datetime(&created_at),
    })
}

const USER_COLUMNS: &str = "id, name, email, theme, created_at";

impl Database {
    /// Register a new owner and open a session.
    ///
    /// Provisions the default category set for the new owner as a
    /// fire-and-forget step: a provisioning failure is logged but never
    /// fails the sign-up itself.
    pub fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<(User, Session)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Name is required".to_string()));
        }
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(Error::InvalidData("A valid email is required".to_string()));
        }
        validate_password(password)?;

        let password_hash = hash_password(password)?;
        let conn = self.conn()?;

        let result = conn.execute(
            "INSERT INTO users (name, email, password_hash) VALUES (?1, ?2, ?3)",
            params![name, email, password_hash],
        );
        let user_id = match result {
            Ok(_) => conn.last_insert_rowid(),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(Error::Conflict(
                    "An account with this email already exists".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        drop(conn);

        if let Err(e) = self.seed_default_categories(user_id) {
            warn!(user_id, error = %e, "Failed to provision default categories");
        }

        let user = self.get_user(user_id)?;
        let session = self.create_session(user_id)?;
        Ok((user, session))
    }

    /// Verify credentials and open a session.
    ///
    /// Wrong email and wrong password are indistinguishable to the caller.
    /// Re-provisions the default categories if the owner has none (the
    /// provisioning is idempotent).
    pub fn sign_in(&self, email: &str, password: &str) -> Result<(User, Session)> {
        let email = email.trim().to_lowercase();
        let conn = self.conn()?;

        let row: Option<(i64, String)> = conn
            .query_row(
                "SELECT id, password_hash FROM users WHERE email = ?1",
                params![email],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        drop(conn);

        let (user_id, stored_hash) = match row {
            Some(found) => found,
            None => return Err(Error::Auth("Invalid email or password".to_string())),
        };
        if !verify_password(password, &stored_hash) {
            return Err(Error::Auth("Invalid email or password".to_string()));
        }

        self.sweep_expired_sessions()?;

        if self.list_categories(user_id)?.is_empty() {
            if let Err(e) = self.seed_default_categories(user_id) {
                warn!(user_id, error = %e, "Failed to provision default categories");
            }
        }

        let user = self.get_user(user_id)?;
        let session = self.create_session(user_id)?;
        Ok((user, session))
    }

    /// End a session. Unknown tokens are a no-op.
    pub fn sign_out(&self, token: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(())
    }

    /// Resolve a bearer token to its owner, if the session is still valid
    pub fn current_session(&self, token: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT u.id, u.name, u.email, u.theme, u.created_at
                 FROM users u
                 JOIN sessions s ON s.user_id = u.id
                 WHERE s.token = ?1 AND s.expires_at > ?2",
                params![token, Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Issue a new session for an owner
    pub fn create_session(&self, user_id: i64) -> Result<Session> {
        let token = uuid::Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
            params![
                token,
                user_id,
                expires_at.format("%Y-%m-%d %H:%M:%S").to_string()
            ],
        )?;
        Ok(Session {
            token,
            user_id,
            expires_at,
        })
    }

    /// Delete expired sessions, returning how many were removed
    pub fn sweep_expired_sessions(&self) -> Result<usize> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()],
        )?;
        Ok(removed)
    }

    /// Fetch an owner by id
    pub fn get_user(&self, user_id: i64) -> Result<User> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        conn.query_row(&sql, params![user_id], map_user)
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("User not found: {}", user_id)))
    }

    /// Update profile name and/or theme preference
    pub fn update_settings(
        &self,
        user_id: i64,
        name: Option<&str>,
        theme: Option<Theme>,
    ) -> Result<User> {
        if let Some(name) = name {
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::InvalidData("Name is required".to_string()));
            }
            let conn = self.conn()?;
            conn.execute(
                "UPDATE users SET name = ?2 WHERE id = ?1",
                params![user_id, name],
            )?;
        }
        if let Some(theme) = theme {
            let conn = self.conn()?;
            conn.execute(
                "UPDATE users SET theme = ?2 WHERE id = ?1",
                params![user_id, theme.as_str()],
            )?;
        }
        self.get_user(user_id)
    }

    /// Change the password after verifying the current one
    pub fn update_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        validate_password(new_password)?;

        let conn = self.conn()?;
        let stored_hash: String = conn
            .query_row(
                "SELECT password_hash FROM users WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("User not found: {}", user_id)))?;
        drop(conn);

        if !verify_password(current_password, &stored_hash) {
            return Err(Error::Auth("Current password is incorrect".to_string()));
        }

        let new_hash = hash_password(new_password)?;
        let conn = self.conn()?;
        conn.execute(
            "UPDATE users SET password_hash = ?2 WHERE id = ?1",
            params![user_id, new_hash],
        )?;
        Ok(())
    }

    /// Permanently delete an owner and everything they own.
    ///
    /// `confirmation` must equal [`DELETE_CONFIRMATION`]; the deletes are
    /// explicit and ordered rather than relying on per-connection cascade
    /// pragmas.
    pub fn delete_account(&self, user_id: i64, confirmation: &str) -> Result<()> {
        if confirmation != DELETE_CONFIRMATION {
            return Err(Error::InvalidData(format!(
                "Type '{}' to confirm account deletion",
                DELETE_CONFIRMATION
            )));
        }

        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM transactions WHERE user_id = ?1",
            params![user_id],
        )?;
        conn.execute(
            "DELETE FROM monthly_balances WHERE user_id = ?1",
            params![user_id],
        )?;
        conn.execute(
            "DELETE FROM categories WHERE user_id = ?1",
            params![user_id],
        )?;
        conn.execute("DELETE FROM sessions WHERE user_id = ?1", params![user_id])?;
        let removed = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        if removed == 0 {
            return Err(Error::NotFound(format!("User not found: {}", user_id)));
        }
        Ok(())
    }
}
