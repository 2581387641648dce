//! Session context: who is signed in, what they may open, and the small
//! session-scoped values kept next to the collections.
//!
//! A `Session` is built once, from storage or from a sign-in, and handed to
//! every store. Nothing re-reads the signed-in profile behind its back.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{DeskError, Result};
use crate::record::Stamp;
use crate::storage::{load_value, save_value, KvStore};

pub const CURRENT_USER_KEY: &str = "hostelCurrentUser";
pub const REMEMBERED_USER_KEY: &str = "hostelRememberedUser";
pub const USERS_KEY: &str = "hostelUsers";
pub const API_KEY_KEY: &str = "openAiKey";

const DEFAULT_NAME: &str = "Admin User";
const DEFAULT_EMAIL: &str = "admin@hostel.com";

/// Unrecognized stored roles read as `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    #[default]
    Admin,
    Warden,
    Guard,
    User,
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "warden" => Self::Warden,
            "guard" => Self::Guard,
            _ => Self::User,
        }
    }
}

impl Role {
    /// Staff replies are flagged official.
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Warden)
    }

    pub fn tabs(self) -> &'static [Tab] {
        match self {
            Self::Admin => &[Tab::Overview, Tab::Rooms, Tab::Analytics, Tab::Settings],
            Self::Warden => &[Tab::Overview, Tab::Rooms, Tab::Analytics],
            Self::Guard | Self::User => &[Tab::Overview],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Warden => "warden",
            Self::Guard => "guard",
            Self::User => "user",
        }
    }
}

/// Dashboard sections gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Overview,
    Rooms,
    Analytics,
    Settings,
}

/// The signed-in user as stored under `hostelCurrentUser`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, alias = "profileImage", skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            email: DEFAULT_EMAIL.to_string(),
            role: Role::Admin,
            picture: None,
        }
    }
}

/// A registered account from `hostelUsers`. Credentials are not kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Decoded claims from the identity provider, trusted as given.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityClaims {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub picture: Option<String>,
}

/// The remembered-login blob: which account to pre-select next time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RememberedLogin {
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

// ─── Session ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    profile: Profile,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Profile::default())
    }
}

impl Session {
    /// Blank name or email fall back to the default admin profile's.
    pub fn new(mut profile: Profile) -> Self {
        if profile.name.trim().is_empty() {
            profile.name = DEFAULT_NAME.to_string();
        }
        if profile.email.trim().is_empty() {
            profile.email = DEFAULT_EMAIL.to_string();
        }
        Self { profile }
    }

    /// The session stored under `hostelCurrentUser`, or the default admin.
    pub fn load(kv: &impl KvStore) -> Self {
        let profile: Profile = load_value(kv, CURRENT_USER_KEY).unwrap_or_default();
        Self::new(profile)
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn role(&self) -> Role {
        self.profile.role
    }

    /// Author label written on records and comments.
    pub fn label(&self) -> &str {
        &self.profile.name
    }

    pub fn tabs(&self) -> &'static [Tab] {
        self.role().tabs()
    }

    pub fn can_open(&self, tab: Tab) -> bool {
        self.tabs().contains(&tab)
    }

    /// Attribution for a mutation made at `now`.
    pub fn stamp(&self, now: NaiveDateTime) -> Stamp {
        Stamp {
            now,
            author: self.profile.name.clone(),
            official: self.role().is_staff(),
        }
    }

    pub fn save(&self, kv: &mut impl KvStore) -> Result<()> {
        save_value(kv, CURRENT_USER_KEY, &self.profile)
    }

    pub fn sign_out(kv: &mut impl KvStore) -> Result<()> {
        kv.remove(CURRENT_USER_KEY)
    }
}

/// Registered accounts, or none when the list is absent or unreadable.
pub fn load_users(kv: &impl KvStore) -> Vec<UserAccount> {
    load_value(kv, USERS_KEY).unwrap_or_default()
}

/// Match `claims` against the account list (email, any case, plus role),
/// then persist and return the new session.
pub fn sign_in(kv: &mut impl KvStore, users: &[UserAccount], claims: &IdentityClaims, role: Role) -> Result<Session> {
    let account = users
        .iter()
        .find(|u| u.role == role && u.email.eq_ignore_ascii_case(claims.email.trim()))
        .ok_or(DeskError::missing("email"))?;

    let session = Session::new(Profile {
        name: claims.name.clone(),
        email: account.email.clone(),
        role,
        picture: claims.picture.clone().or_else(|| account.picture.clone()),
    });
    session.save(kv)?;
    info!(email = %account.email, role = role.name(), "signed in");
    Ok(session)
}

pub fn remember_login(kv: &mut impl KvStore, login: &RememberedLogin) -> Result<()> {
    save_value(kv, REMEMBERED_USER_KEY, login)
}

pub fn recall_login(kv: &impl KvStore) -> Option<RememberedLogin> {
    load_value(kv, REMEMBERED_USER_KEY)
}

pub fn forget_login(kv: &mut impl KvStore) -> Result<()> {
    kv.remove(REMEMBERED_USER_KEY)
}

/// The cached completion-service key. Stored as plain text.
pub fn load_api_key(kv: &impl KvStore) -> Option<String> {
    let raw = match kv.get(API_KEY_KEY) {
        Ok(raw) => raw?,
        Err(e) => {
            warn!(key = API_KEY_KEY, error = %e, "storage read failed");
            return None;
        }
    };
    let key = raw.trim();
    (!key.is_empty()).then(|| key.to_string())
}

pub fn save_api_key(kv: &mut impl KvStore, key: &str) -> Result<()> {
    let key = key.trim();
    if key.is_empty() {
        return Err(DeskError::missing("apiKey"));
    }
    kv.put(API_KEY_KEY, key)
}
