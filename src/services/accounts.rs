// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Accounts: class registration, login and user management.

use ring::rand::SystemRandom;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::user::normalize_email;
use crate::models::{AccountStatus, Class, Credentials, Profile, Role};
use crate::services::class_code;
use crate::services::notification::Notifier;
use crate::services::password::{hash_password, verify_password};
use crate::services::sessions::{SessionAccess, SessionCache};
use crate::services::throttle::LoginThrottle;
use crate::time_utils::now;

/// Attempts at drawing an unused class code before giving up.
const CLASS_CODE_ATTEMPTS: usize = 5;

/// Validated input for registering a class and its representative.
#[derive(Debug, Clone)]
pub struct ClassRegistration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub class_name: String,
    pub class_id_code: String,
    pub department: String,
    pub year: u32,
    pub student_count: u32,
}

/// Filters for the admin user listing.
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    /// Case-insensitive match on name, e-mail or class name
    pub search: Option<String>,
    pub role: Option<Role>,
    pub status: Option<AccountStatus>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserSummary {
    #[serde(flatten)]
    pub profile: Profile,
    pub class_name: Option<String>,
    pub booking_count: u32,
}

/// Apply `query` to profiles; `class_names` maps class document IDs to names.
pub fn filter_users<'a>(
    profiles: &'a [Profile],
    class_names: &HashMap<String, String>,
    query: &UserQuery,
) -> Vec<&'a Profile> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    profiles
        .iter()
        .filter(|p| query.role.is_none_or(|r| p.role == r))
        .filter(|p| query.status.is_none_or(|s| p.status == s))
        .filter(|p| {
            let Some(needle) = needle.as_deref() else {
                return true;
            };
            let class_name = p
                .class_id
                .as_ref()
                .and_then(|id| class_names.get(id))
                .map(|n| n.to_lowercase())
                .unwrap_or_default();
            p.full_name.to_lowercase().contains(needle)
                || p.email.to_lowercase().contains(needle)
                || class_name.contains(needle)
        })
        .collect()
}

#[derive(Clone)]
pub struct AccountService {
    db: FirestoreDb,
    notifier: Notifier,
    throttle: Arc<LoginThrottle>,
    sessions: Arc<SessionCache>,
    rng: SystemRandom,
}

impl AccountService {
    pub fn new(
        db: FirestoreDb,
        notifier: Notifier,
        throttle: Arc<LoginThrottle>,
        sessions: Arc<SessionCache>,
    ) -> Self {
        Self {
            db,
            notifier,
            throttle,
            sessions,
            rng: SystemRandom::new(),
        }
    }

    /// Stored role of a signed-in user; inactive accounts are refused.
    pub async fn session_role(&self, user_id: &str) -> Result<Role> {
        let at = now();
        let access = match self.sessions.get(user_id, at) {
            Some(access) => access,
            None => {
                let profile = self
                    .db
                    .get_profile(user_id)
                    .await?
                    .ok_or(AppError::InvalidToken)?;
                self.sessions.remember(&profile, at);
                SessionAccess {
                    role: profile.role,
                    status: profile.status,
                }
            }
        };

        if access.status != AccountStatus::Active {
            return Err(AppError::Forbidden(format!(
                "account is {}",
                access.status.as_str()
            )));
        }
        Ok(access.role)
    }

    async fn unused_class_code(&self) -> Result<String> {
        for _ in 0..CLASS_CODE_ATTEMPTS {
            let code = class_code::generate(&self.rng)?;
            if self.db.get_class_by_code(&code).await?.is_none() {
                return Ok(code);
            }
            tracing::debug!("Class code collision, retrying");
        }
        Err(AppError::Internal(anyhow::anyhow!(
            "could not generate a unique class code"
        )))
    }

    /// Create the representative account and its class, then e-mail the code.
    pub async fn register_class(&self, reg: ClassRegistration) -> Result<(Profile, Class)> {
        let email = normalize_email(&reg.email);
        if self.db.get_credentials(&email).await?.is_some() {
            return Err(AppError::Conflict("email is already registered".to_string()));
        }

        let code = self.unused_class_code().await?;
        let password_hash = hash_password(&reg.password)?;
        let at = now();
        let user_id = uuid::Uuid::new_v4().to_string();

        let class = Class {
            id: uuid::Uuid::new_v4().to_string(),
            class_id: reg.class_id_code.trim().to_uppercase(),
            name: reg.class_name.trim().to_string(),
            department: reg.department.trim().to_string(),
            year: reg.year,
            student_count: reg.student_count,
            class_code: code,
            representative_user_id: user_id.clone(),
            is_active: true,
            created_at: at,
            updated_at: at,
        };
        let profile = Profile {
            user_id: user_id.clone(),
            email: email.clone(),
            full_name: reg.full_name.trim().to_string(),
            phone: reg.phone,
            student_id: None,
            class_id: Some(class.id.clone()),
            is_representative: true,
            role: Role::Student,
            status: AccountStatus::Active,
            created_at: at,
            updated_at: at,
        };
        let credentials = Credentials {
            user_id,
            email,
            password_hash,
        };

        self.db
            .register_class_atomic(&profile, &credentials, &class)
            .await?;
        tracing::info!(class_id = %class.id, name = %class.name, "Class registered");

        self.notifier
            .send_class_code(&profile, &class.name, &class.class_code)
            .await;
        Ok((profile, class))
    }

    /// Verify e-mail and password, honoring the lockout.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Profile> {
        let email = normalize_email(email);
        let at = now();
        if let Some(remaining) = self.throttle.locked_for(&email, at) {
            return Err(AppError::TooManyRequests(format!(
                "too many failed logins, try again in {} minutes",
                remaining.num_minutes().max(1)
            )));
        }

        let credentials = match self.db.get_credentials(&email).await? {
            Some(c) if verify_password(password, &c.password_hash)? => c,
            _ => {
                self.throttle.record_failure(&email, at);
                return Err(AppError::Unauthorized);
            }
        };

        let profile = self
            .db
            .get_profile(&credentials.user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;
        if !profile.is_active() {
            return Err(AppError::Forbidden(format!(
                "account is {}",
                profile.status.as_str()
            )));
        }

        self.throttle.record_success(&email);
        self.sessions.remember(&profile, at);
        Ok(profile)
    }

    /// Log in a class representative with their class code.
    pub async fn class_login(
        &self,
        email: &str,
        password: &str,
        code: &str,
    ) -> Result<(Profile, Class)> {
        let profile = self.authenticate(email, password).await?;

        let class = self
            .db
            .get_class_by_code(&class_code::normalize(code))
            .await?
            .ok_or_else(|| AppError::Forbidden("invalid class code".to_string()))?;
        if !class.is_active {
            return Err(AppError::Forbidden(
                "this class is no longer active".to_string(),
            ));
        }
        if class.representative_user_id != profile.user_id {
            return Err(AppError::Forbidden(
                "this email is not authorized for this class code".to_string(),
            ));
        }

        tracing::info!(user_id = %profile.user_id, class_id = %class.id, "Class login");
        Ok((profile, class))
    }

    /// Log in faculty or admin staff.
    pub async fn staff_login(&self, email: &str, password: &str) -> Result<Profile> {
        let profile = self.authenticate(email, password).await?;
        if !profile.role.is_staff() {
            return Err(AppError::Forbidden("staff access required".to_string()));
        }
        tracing::info!(user_id = %profile.user_id, role = profile.role.as_str(), "Staff login");
        Ok(profile)
    }

    /// Ensure an admin account exists for `email`. Idempotent.
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<String> {
        let email = normalize_email(email);
        let at = now();

        if let Some(credentials) = self.db.get_credentials(&email).await? {
            let mut profile = self
                .db
                .get_profile(&credentials.user_id)
                .await?
                .ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!("admin credentials without profile"))
                })?;
            if profile.role != Role::Admin || !profile.is_active() {
                profile.role = Role::Admin;
                profile.status = AccountStatus::Active;
                profile.updated_at = at;
                self.db.upsert_profile(&profile).await?;
                self.sessions.remember(&profile, at);
                tracing::info!(user_id = %profile.user_id, "Promoted existing account to admin");
            } else {
                tracing::info!(user_id = %profile.user_id, "Admin already exists");
            }
            return Ok(profile.user_id);
        }

        let user_id = uuid::Uuid::new_v4().to_string();
        let profile = Profile {
            user_id: user_id.clone(),
            email: email.clone(),
            full_name: "Administrator".to_string(),
            phone: None,
            student_id: None,
            class_id: None,
            is_representative: false,
            role: Role::Admin,
            status: AccountStatus::Active,
            created_at: at,
            updated_at: at,
        };
        self.db.upsert_profile(&profile).await?;
        self.db
            .set_credentials(&Credentials {
                user_id: user_id.clone(),
                email,
                password_hash: hash_password(password)?,
            })
            .await?;

        tracing::info!(user_id = %user_id, "Admin account created");
        Ok(user_id)
    }

    // ─── Profiles ────────────────────────────────────────────────

    pub async fn profile(&self, user_id: &str) -> Result<(Profile, Option<Class>)> {
        let profile = self
            .db
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("profile".to_string()))?;
        let class = match profile.class_id.as_deref() {
            Some(id) => self.db.get_class(id).await?,
            None => None,
        };
        Ok((profile, class))
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        full_name: Option<String>,
        phone: Option<String>,
    ) -> Result<Profile> {
        let mut profile = self
            .db
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("profile".to_string()))?;
        if let Some(name) = full_name {
            profile.full_name = name.trim().to_string();
        }
        if let Some(phone) = phone {
            let phone = phone.trim().to_string();
            profile.phone = (!phone.is_empty()).then_some(phone);
        }
        profile.updated_at = now();
        self.db.upsert_profile(&profile).await?;
        Ok(profile)
    }

    // ─── Admin User Management ───────────────────────────────────

    pub async fn list_users(&self, query: &UserQuery) -> Result<Vec<UserSummary>> {
        let profiles = self.db.list_profiles().await?;
        let class_names: HashMap<String, String> = self
            .db
            .list_classes()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let mut booking_counts: HashMap<String, u32> = HashMap::new();
        for booking in self.db.list_all_bookings().await? {
            *booking_counts.entry(booking.user_id).or_insert(0) += 1;
        }

        Ok(filter_users(&profiles, &class_names, query)
            .into_iter()
            .map(|p| UserSummary {
                class_name: p.class_id.as_ref().and_then(|id| class_names.get(id)).cloned(),
                booking_count: booking_counts.get(&p.user_id).copied().unwrap_or(0),
                profile: p.clone(),
            })
            .collect())
    }

    async fn update_user<F>(&self, actor_id: &str, user_id: &str, apply: F) -> Result<Profile>
    where
        F: FnOnce(&mut Profile),
    {
        if actor_id == user_id {
            return Err(AppError::BadRequest(
                "cannot change your own account".to_string(),
            ));
        }
        let mut profile = self
            .db
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user".to_string()))?;
        apply(&mut profile);
        profile.updated_at = now();
        self.db.upsert_profile(&profile).await?;
        self.sessions.remember(&profile, profile.updated_at);
        Ok(profile)
    }

    pub async fn set_role(&self, actor_id: &str, user_id: &str, role: Role) -> Result<Profile> {
        let profile = self
            .update_user(actor_id, user_id, |p| p.role = role)
            .await?;
        tracing::info!(actor_id, user_id, role = role.as_str(), "User role changed");
        Ok(profile)
    }

    pub async fn set_status(
        &self,
        actor_id: &str,
        user_id: &str,
        status: AccountStatus,
    ) -> Result<Profile> {
        let profile = self
            .update_user(actor_id, user_id, |p| p.status = status)
            .await?;
        tracing::info!(actor_id, user_id, status = status.as_str(), "User status changed");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile(id: &str, name: &str, email: &str, role: Role, class_id: Option<&str>) -> Profile {
        Profile {
            user_id: id.to_string(),
            email: email.to_string(),
            full_name: name.to_string(),
            phone: None,
            student_id: None,
            class_id: class_id.map(str::to_string),
            is_representative: class_id.is_some(),
            role,
            status: AccountStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_users() {
        let mut suspended = profile("u3", "Ravi Kumar", "ravi@college.edu", Role::Student, None);
        suspended.status = AccountStatus::Suspended;
        let profiles = vec![
            profile("u1", "Asha Rao", "asha@college.edu", Role::Student, Some("c1")),
            profile("u2", "Dr. Mehta", "mehta@college.edu", Role::Faculty, None),
            suspended,
        ];
        let mut class_names = HashMap::new();
        class_names.insert("c1".to_string(), "CSE 3A".to_string());

        let all = filter_users(&profiles, &class_names, &UserQuery::default());
        assert_eq!(all.len(), 3);

        let by_class = filter_users(
            &profiles,
            &class_names,
            &UserQuery {
                search: Some("cse".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(by_class.len(), 1);
        assert_eq!(by_class[0].user_id, "u1");

        let by_email = filter_users(
            &profiles,
            &class_names,
            &UserQuery {
                search: Some("MEHTA@".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(by_email[0].user_id, "u2");

        let students = filter_users(
            &profiles,
            &class_names,
            &UserQuery {
                role: Some(Role::Student),
                status: Some(AccountStatus::Active),
                ..Default::default()
            },
        );
        assert_eq!(students.len(), 1);

        let blank = filter_users(
            &profiles,
            &class_names,
            &UserQuery {
                search: Some("   ".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(blank.len(), 3);
    }
}
