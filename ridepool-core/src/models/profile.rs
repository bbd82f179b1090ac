use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    /// Same as the owning user's id.
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> CoreResult<()> {
        let name = self.full_name.trim();
        if name.is_empty() {
            return Err(CoreError::invalid("full_name is required"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(CoreError::invalid(format!(
                "full_name is limited to {} characters",
                MAX_NAME_LEN
            )));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(CoreError::invalid("email address is not valid"));
        }
        if let Some(phone) = self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            if !is_valid_phone(phone) {
                return Err(CoreError::invalid("phone number is not valid"));
            }
        }
        Ok(())
    }

    pub fn into_profile(self, user_id: Uuid) -> Profile {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Profile {
            id: user_id,
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: clean(self.phone),
            avatar_url: clean(self.avatar_url),
            updated_at: Utc::now(),
        }
    }
}

/// One `@`, non-empty local part, dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

fn is_valid_phone(phone: &str) -> bool {
    (7..=20).contains(&phone.len())
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'))
}
