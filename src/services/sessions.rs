// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Short-lived cache of each signed-in user's stored role and status.
//!
//! Session tokens outlive role and status changes, so every request is
//! authorized against the profile. Entries expire after [`SESSION_CACHE_SECS`]
//! and are replaced immediately when an admin changes the account here.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::models::{AccountStatus, Profile, Role};

/// How long a profile lookup is trusted.
pub const SESSION_CACHE_SECS: i64 = 60;

/// Size above which expired entries are swept on insert.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionAccess {
    pub role: Role,
    pub status: AccountStatus,
}

#[derive(Debug, Clone, Copy)]
struct CachedAccess {
    access: SessionAccess,
    cached_at: DateTime<Utc>,
}

impl CachedAccess {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.cached_at < Duration::seconds(SESSION_CACHE_SECS)
    }
}

#[derive(Default)]
pub struct SessionCache {
    entries: DashMap<String, CachedAccess>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &str, now: DateTime<Utc>) -> Option<SessionAccess> {
        let entry = self.entries.get(user_id)?;
        entry.is_fresh(now).then_some(entry.access)
    }

    pub fn remember(&self, profile: &Profile, now: DateTime<Utc>) {
        if self.entries.len() > PRUNE_THRESHOLD {
            self.entries.retain(|_, cached| cached.is_fresh(now));
        }
        self.entries.insert(
            profile.user_id.clone(),
            CachedAccess {
                access: SessionAccess {
                    role: profile.role,
                    status: profile.status,
                },
                cached_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
