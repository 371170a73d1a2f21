use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use super::types::{LoginRequest, Profile, SignupRequest, User};
use crate::error::{ApiError, StoreError};
use crate::persist::{load_json, write_json_atomic};
use crate::task::UserId;

/// Older sessions of the same user are dropped past this many.
pub const MAX_SESSIONS_PER_USER: usize = 10;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct SessionEntry {
    user: UserId,
    issued_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct UserTable {
    users: Vec<User>,
    /// Bearer token -> session.
    sessions: HashMap<String, SessionEntry>,
}

/// Accounts and issued bearer tokens. A token lives until it is logged out
/// or pushed out by newer logins of the same user.
pub struct UserStore {
    path: Option<PathBuf>,
    table: RwLock<UserTable>,
}

impl UserStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            table: RwLock::new(UserTable::default()),
        }
    }

    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let table: UserTable = load_json(&path)?.unwrap_or_default();
        tracing::info!(
            path = %path.display(),
            users = table.users.len(),
            sessions = table.sessions.len(),
            "loaded user store"
        );
        Ok(Self {
            path: Some(path),
            table: RwLock::new(table),
        })
    }

    fn save(&self, table: &UserTable) -> Result<(), StoreError> {
        match &self.path {
            Some(path) => write_json_atomic(path, table),
            None => Ok(()),
        }
    }

    pub fn signup(&self, req: SignupRequest) -> Result<Profile, ApiError> {
        let email = normalize_email(&req.email);
        let name = req.name.trim().to_string();
        if name.is_empty() || email.is_empty() {
            return Err(ApiError::BadRequest("Name and email are required".to_string()));
        }
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::BadRequest(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        // Hash before taking the lock; Argon2 is slow on purpose.
        let password_hash = hash_password(&req.password).map_err(ApiError::Hashing)?;

        let mut table = self.table.write().map_err(|_| StoreError::Poisoned)?;
        if table.users.iter().any(|user| user.email == email) {
            return Err(ApiError::BadRequest("User already exists".to_string()));
        }
        let user = User {
            id: UserId::new(format!("user_{}", Uuid::new_v4().simple())),
            name,
            email,
            password_hash,
            created_at: Utc::now(),
        };
        let profile = user.profile();
        tracing::info!(user = %user.id, "user registered");
        table.users.push(user);
        if let Err(err) = self.save(&table) {
            table.users.pop();
            return Err(err.into());
        }
        Ok(profile)
    }

    /// Checks credentials and issues a fresh bearer token.
    pub fn login(&self, req: LoginRequest) -> Result<String, ApiError> {
        let email = normalize_email(&req.email);
        let account = {
            let table = self.table.read().map_err(|_| StoreError::Poisoned)?;
            table
                .users
                .iter()
                .find(|user| user.email == email)
                .map(|user| (user.id.clone(), user.password_hash.clone()))
        };
        let user_id = account
            .filter(|(_, hash)| verify_password(&req.password, hash))
            .map(|(id, _)| id)
            .ok_or_else(|| ApiError::BadRequest("Invalid credentials".to_string()))?;

        let token = Uuid::new_v4().simple().to_string();
        let mut table = self.table.write().map_err(|_| StoreError::Poisoned)?;
        let previous = table.sessions.clone();
        table.sessions.insert(
            token.clone(),
            SessionEntry {
                user: user_id.clone(),
                issued_at: Utc::now(),
            },
        );
        let evicted = evict_stale_sessions(&mut table.sessions, &user_id, &token);
        if let Err(err) = self.save(&table) {
            table.sessions = previous;
            return Err(err.into());
        }
        tracing::info!(user = %user_id, evicted, "session issued");
        Ok(token)
    }

    /// Revokes one token. Unknown tokens are ignored.
    pub fn logout(&self, token: &str) -> Result<(), ApiError> {
        let mut table = self.table.write().map_err(|_| StoreError::Poisoned)?;
        let Some(entry) = table.sessions.remove(token) else {
            return Ok(());
        };
        if let Err(err) = self.save(&table) {
            table.sessions.insert(token.to_string(), entry);
            return Err(err.into());
        }
        tracing::info!(user = %entry.user, "session revoked");
        Ok(())
    }

    pub fn verify(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        let table = self.table.read().map_err(|_| StoreError::Poisoned)?;
        Ok(table.sessions.get(token).map(|entry| entry.user.clone()))
    }

    pub fn profile(&self, id: &UserId) -> Result<Option<Profile>, StoreError> {
        let table = self.table.read().map_err(|_| StoreError::Poisoned)?;
        Ok(table
            .users
            .iter()
            .find(|user| &user.id == id)
            .map(User::profile))
    }

    #[cfg(test)]
    fn session_count(&self) -> usize {
        self.table.read().map(|table| table.sessions.len()).unwrap_or(0)
    }
}

/// Keeps `keep` plus the newest sessions of `user`, up to the per-user cap.
/// Returns how many were dropped.
fn evict_stale_sessions(
    sessions: &mut HashMap<String, SessionEntry>,
    user: &UserId,
    keep: &str,
) -> usize {
    let mut others: Vec<(String, DateTime<Utc>)> = sessions
        .iter()
        .filter(|(token, entry)| &entry.user == user && token.as_str() != keep)
        .map(|(token, entry)| (token.clone(), entry.issued_at))
        .collect();
    let allowed = MAX_SESSIONS_PER_USER.saturating_sub(1);
    if others.len() <= allowed {
        return 0;
    }
    others.sort_by_key(|(_, issued_at)| *issued_at);
    let excess = others.len() - allowed;
    for (token, _) in others.into_iter().take(excess) {
        sessions.remove(&token);
    }
    excess
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
