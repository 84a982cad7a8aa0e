//! User profiles and usernames
//!
//! Usernames are lowercase `[a-z0-9]`, at least three characters, unique
//! across users. Profiles are created on first sign-in with a username taken
//! from the local part of the email address.

use crate::backend::SqliteBackend;
use crate::database;
use crate::error::{CollectionError, Result};
use crate::session::Identity;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

const MIN_USERNAME_LEN: usize = 3;

/// Public profile data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: String,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub created_at: String,
}

/// Keep only lowercase ASCII letters and digits
fn clean(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Username derived from an email address ("Jane.Doe+tcg@x.org" → "janedoetcg")
pub fn default_username(email: &str) -> String {
    clean(email.split('@').next().unwrap_or_default())
}

/// Clean a requested username and check its length
pub fn normalize_username(raw: &str) -> Result<String> {
    let cleaned = clean(raw);
    if cleaned.len() < MIN_USERNAME_LEN {
        return Err(CollectionError::InvalidUsername(raw.to_string()));
    }
    Ok(cleaned)
}

/// Pick a free username, appending a number if the base is taken or too short
fn available_username(backend: &SqliteBackend, base: &str) -> Result<String> {
    let base = if base.len() < MIN_USERNAME_LEN {
        format!("user{}", base)
    } else {
        base.to_string()
    };

    let conn = backend.connection()?;
    if database::find_profile_by_username(&conn, &base)?.is_none() {
        return Ok(base);
    }
    let mut suffix = 2u32;
    loop {
        let candidate = format!("{}{}", base, suffix);
        if database::find_profile_by_username(&conn, &candidate)?.is_none() {
            return Ok(candidate);
        }
        suffix += 1;
    }
}

/// Return the user's profile, creating it on first sign-in
pub fn ensure_profile(backend: &SqliteBackend, identity: &Identity) -> Result<UserProfile> {
    {
        let conn = backend.connection()?;
        if let Some(profile) = database::get_profile(&conn, &identity.user_id)? {
            return Ok(profile);
        }
    }

    let base = identity
        .email
        .as_deref()
        .map(default_username)
        .unwrap_or_else(|| clean(&identity.user_id));
    let profile = UserProfile {
        username: available_username(backend, &base)?,
        display_name: identity.display_name.clone(),
        photo_url: identity.photo_url.clone(),
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };

    let conn = backend.connection()?;
    database::insert_profile(&conn, &identity.user_id, &profile)?;
    log::info!(
        "Created profile {} for user {}",
        profile.username,
        identity.user_id
    );
    Ok(profile)
}

/// Change a user's username. Returns the cleaned name that was stored.
pub fn update_username(backend: &SqliteBackend, user_id: &str, requested: &str) -> Result<String> {
    let username = normalize_username(requested)?;
    let conn = backend.connection()?;

    if let Some((holder, _)) = database::find_profile_by_username(&conn, &username)? {
        if holder != user_id {
            return Err(CollectionError::UsernameTaken(username));
        }
        return Ok(username);
    }

    if database::update_profile_username(&conn, user_id, &username)? == 0 {
        return Err(CollectionError::UserNotFound(user_id.to_string()));
    }
    log::info!("User {} is now {}", user_id, username);
    Ok(username)
}

/// Look up `(user_id, profile)` by username, case-insensitively
pub fn find_by_username(backend: &SqliteBackend, username: &str) -> Result<(String, UserProfile)> {
    let conn = backend.connection()?;
    database::find_profile_by_username(&conn, &username.to_lowercase())?
        .ok_or_else(|| CollectionError::UserNotFound(username.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> SqliteBackend {
        SqliteBackend::open_in_memory().unwrap()
    }

    #[test]
    fn default_username_strips_symbols() {
        assert_eq!(default_username("Jane.Doe+tcg@example.org"), "janedoetcg");
        assert_eq!(default_username("no-at-sign"), "noatsign");
    }

    #[test]
    fn normalize_rejects_short_names() {
        assert_eq!(normalize_username("  Vibe_Lord ").unwrap(), "vibelord");
        assert!(matches!(
            normalize_username("a!"),
            Err(CollectionError::InvalidUsername(_))
        ));
    }

    #[test]
    fn ensure_profile_creates_once() {
        let backend = backend();
        let identity = Identity::new("u1").with_email("Otter.Fan@example.com");

        let created = ensure_profile(&backend, &identity).unwrap();
        assert_eq!(created.username, "otterfan");

        let again = ensure_profile(&backend, &identity).unwrap();
        assert_eq!(again, created);
    }

    #[test]
    fn ensure_profile_avoids_taken_usernames() {
        let backend = backend();
        ensure_profile(&backend, &Identity::new("u1").with_email("sam@a.com")).unwrap();
        let second = ensure_profile(&backend, &Identity::new("u2").with_email("sam@b.com")).unwrap();
        assert_eq!(second.username, "sam2");
    }

    #[test]
    fn update_username_checks_uniqueness() {
        let backend = backend();
        ensure_profile(&backend, &Identity::new("u1").with_email("alice@x.com")).unwrap();
        ensure_profile(&backend, &Identity::new("u2").with_email("bob@x.com")).unwrap();

        assert!(matches!(
            update_username(&backend, "u2", "Alice"),
            Err(CollectionError::UsernameTaken(_))
        ));
        assert_eq!(update_username(&backend, "u1", "ALICE").unwrap(), "alice");
        assert_eq!(update_username(&backend, "u2", "Bobby!").unwrap(), "bobby");
        assert_eq!(find_by_username(&backend, "bobby").unwrap().0, "u2");
    }

    #[test]
    fn update_username_without_profile_is_not_found() {
        let backend = backend();
        assert!(matches!(
            update_username(&backend, "ghost", "ghostly"),
            Err(CollectionError::UserNotFound(_))
        ));
    }

    #[test]
    fn find_by_username_reports_not_found() {
        let backend = backend();
        ensure_profile(&backend, &Identity::new("u1").with_email("carol@x.com")).unwrap();

        assert_eq!(find_by_username(&backend, "CAROL").unwrap().0, "u1");
        assert!(matches!(
            find_by_username(&backend, "nobody"),
            Err(CollectionError::UserNotFound(_))
        ));
    }
}
