//! Fixed-window rate limiting for the auth surface.
//!
//! Four policies share one limiter: a general per-IP quota, a per-identity
//! quota keyed on IP plus bearer token, a login policy that only counts
//! failed attempts, and a tight per-IP quota on password reset requests.
//! Counters live in process memory; a restart clears them.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitPolicy {
    General,
    PerIdentity,
    Login,
    PasswordReset,
}

impl RateLimitPolicy {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::General | Self::PerIdentity => "Too many requests, please try again later.",
            Self::Login => "Too many login attempts, please try again later.",
            Self::PasswordReset => "Too many password reset attempts, please try again later.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited,
}

impl RateLimitDecision {
    #[must_use]
    pub const fn is_limited(self) -> bool {
        matches!(self, Self::Limited)
    }
}

/// Quota tracking keyed by policy and caller identity.
///
/// `hit` is count-then-decide for policies that meter every request. The
/// login policy splits that into `check` before the attempt and `record`
/// after a failure, so successful logins never consume quota.
pub trait RateLimiter: Send + Sync {
    fn hit(&self, policy: RateLimitPolicy, key: &str) -> RateLimitDecision;
    fn check(&self, policy: RateLimitPolicy, key: &str) -> RateLimitDecision;
    fn record(&self, policy: RateLimitPolicy, key: &str);
}

/// Per-policy ceilings and window lengths.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitSettings {
    pub window: Duration,
    pub general_max: u32,
    pub per_identity_max: u32,
    pub login_max: u32,
    pub password_reset_max: u32,
    pub password_reset_window: Duration,
}

struct Window {
    started: Instant,
    count: u32,
}

/// In-memory fixed-window limiter. Windows reset in full once their span
/// elapses rather than sliding.
pub struct WindowRateLimiter {
    settings: RateLimitSettings,
    windows: Mutex<HashMap<(RateLimitPolicy, String), Window>>,
}

impl WindowRateLimiter {
    #[must_use]
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            settings,
            windows: Mutex::new(HashMap::new()),
        }
    }

    const fn max_for(&self, policy: RateLimitPolicy) -> u32 {
        match policy {
            RateLimitPolicy::General => self.settings.general_max,
            RateLimitPolicy::PerIdentity => self.settings.per_identity_max,
            RateLimitPolicy::Login => self.settings.login_max,
            RateLimitPolicy::PasswordReset => self.settings.password_reset_max,
        }
    }

    const fn window_for(&self, policy: RateLimitPolicy) -> Duration {
        window_span(self.settings, policy)
    }

    fn with_window<R>(
        &self,
        policy: RateLimitPolicy,
        key: &str,
        f: impl FnOnce(&mut Window) -> R,
    ) -> R {
        let span = self.window_for(policy);
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Keys carry caller-supplied strings, so expired windows must be
        // dropped or the map grows without bound. Sweeping only when a new
        // key arrives keeps steady-state traffic off the O(n) path.
        let map_key = (policy, key.to_string());
        if !windows.contains_key(&map_key) {
            let settings = self.settings;
            windows.retain(|(policy, _), window| {
                window.started.elapsed() < window_span(settings, *policy)
            });
        }
        let window = windows.entry(map_key).or_insert_with(|| Window {
            started: Instant::now(),
            count: 0,
        });
        if window.started.elapsed() >= span {
            window.started = Instant::now();
            window.count = 0;
        }
        f(window)
    }

    #[cfg(test)]
    fn tracked_windows(&self) -> usize {
        match self.windows.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

const fn window_span(settings: RateLimitSettings, policy: RateLimitPolicy) -> Duration {
    match policy {
        RateLimitPolicy::PasswordReset => settings.password_reset_window,
        _ => settings.window,
    }
}

impl RateLimiter for WindowRateLimiter {
    fn hit(&self, policy: RateLimitPolicy, key: &str) -> RateLimitDecision {
        let max = self.max_for(policy);
        self.with_window(policy, key, |window| {
            window.count = window.count.saturating_add(1);
            if window.count > max {
                RateLimitDecision::Limited
            } else {
                RateLimitDecision::Allowed
            }
        })
    }

    fn check(&self, policy: RateLimitPolicy, key: &str) -> RateLimitDecision {
        let max = self.max_for(policy);
        self.with_window(policy, key, |window| {
            if window.count >= max {
                RateLimitDecision::Limited
            } else {
                RateLimitDecision::Allowed
            }
        })
    }

    fn record(&self, policy: RateLimitPolicy, key: &str) {
        self.with_window(policy, key, |window| {
            window.count = window.count.saturating_add(1);
        });
    }
}

/// Limiter that admits everything. Used by tests that are not about quotas.
#[cfg(test)]
pub struct NoopRateLimiter;

#[cfg(test)]
impl RateLimiter for NoopRateLimiter {
    fn hit(&self, _policy: RateLimitPolicy, _key: &str) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }

    fn check(&self, _policy: RateLimitPolicy, _key: &str) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }

    fn record(&self, _policy: RateLimitPolicy, _key: &str) {}
}
