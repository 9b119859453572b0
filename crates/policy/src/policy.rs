use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::env_file::{EnvFile, clean_id};
use crate::error::PolicyError;
use crate::state::{
    ADMIN_CHANNEL_IDS, ADMIN_USER_IDS, FeatureFlag, PolicyState, RESULT_LIMIT,
};

/// Why a raw query was allowed or refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Granted,
    FeatureDisabled,
    NotAdmin,
    ChannelNotAllowed,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Granted)
    }

    /// User-facing reason text.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Granted => "✅ Admin access granted",
            Self::FeatureDisabled => "SPL query execution is currently disabled",
            Self::NotAdmin => "❌ SPL queries are restricted to admins only",
            Self::ChannelNotAllowed => "❌ SPL queries are not allowed in this channel",
        }
    }
}

/// Gatekeeper for privileged operations.
///
/// Readers take a cheap snapshot. Writers hold a single mutex across the
/// read-modify-write, the file write and the swap, so concurrent roster edits
/// serialize and memory only changes once the file has been written.
pub struct AuthorizationPolicy {
    store: EnvFile,
    state: RwLock<Arc<PolicyState>>,
    write_lock: Mutex<()>,
    enforce_channel_allowlist: bool,
}

impl AuthorizationPolicy {
    /// Load the policy from its backing file.
    pub fn load(store: EnvFile) -> Result<Self, PolicyError> {
        let state = PolicyState::from_values(&store.load()?);
        info!(
            path = %store.path().display(),
            admins = state.admins.len(),
            channels = state.channels.len(),
            spl_enabled = state.spl_enabled,
            "authorization policy loaded"
        );
        if state.admins.is_empty() {
            warn!("no admin users configured; the first !admin-add will bootstrap the roster");
        }
        Ok(Self::with_state(store, state))
    }

    /// Build a policy from an explicit state without reading the file.
    pub fn with_state(store: EnvFile, state: PolicyState) -> Self {
        Self {
            store,
            state: RwLock::new(Arc::new(state)),
            write_lock: Mutex::new(()),
            enforce_channel_allowlist: false,
        }
    }

    /// Require a non-empty allowlist to contain the channel for raw queries.
    #[must_use]
    pub fn with_channel_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_channel_allowlist = enforce;
        self
    }

    pub fn enforces_channel_allowlist(&self) -> bool {
        self.enforce_channel_allowlist
    }

    pub fn store(&self) -> &EnvFile {
        &self.store
    }

    /// The current state.
    pub fn snapshot(&self) -> Arc<PolicyState> {
        Arc::clone(&self.state.read())
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.snapshot().is_admin(user_id)
    }

    pub fn is_admin_channel(&self, channel_id: &str) -> bool {
        self.snapshot().is_admin_channel(channel_id)
    }

    pub fn has_admins(&self) -> bool {
        !self.snapshot().admins.is_empty()
    }

    /// Decide whether `user_id` may run a raw query in `channel_id`.
    ///
    /// The feature flag is checked first, then admin membership, then (when
    /// enforcement is on) the channel allowlist.
    pub fn can_execute_raw_query(&self, user_id: &str, channel_id: &str) -> Decision {
        let state = self.snapshot();
        if !state.spl_enabled {
            return Decision::FeatureDisabled;
        }
        if !state.is_admin(user_id) {
            return Decision::NotAdmin;
        }
        if self.enforce_channel_allowlist
            && !state.channels.is_empty()
            && !state.is_admin_channel(channel_id)
        {
            return Decision::ChannelNotAllowed;
        }
        Decision::Granted
    }

    /// Add an admin. Returns `false` if they already were one.
    pub fn add_admin(&self, user_id: &str) -> Result<bool, PolicyError> {
        let id = clean_id(user_id).to_owned();
        self.mutate(
            |state| {
                if id.is_empty() || state.admins.contains(&id) {
                    return Ok(None);
                }
                let mut next = state.clone();
                next.admins.push(id.clone());
                Ok(Some(next))
            },
            |next| vec![(ADMIN_USER_IDS, next.admins_value())],
        )
    }

    /// Remove an admin. Returns `false` if they were not one.
    ///
    /// Removing the only remaining admin is refused.
    pub fn remove_admin(&self, user_id: &str) -> Result<bool, PolicyError> {
        let id = clean_id(user_id).to_owned();
        self.mutate(
            |state| {
                if !state.admins.contains(&id) {
                    return Ok(None);
                }
                if state.admins.len() == 1 {
                    return Err(PolicyError::LastAdmin(id.clone()));
                }
                let mut next = state.clone();
                next.admins.retain(|a| *a != id);
                Ok(Some(next))
            },
            |next| vec![(ADMIN_USER_IDS, next.admins_value())],
        )
    }

    /// Add a channel to the allowlist. Returns `false` if already present.
    pub fn allow_channel(&self, channel_id: &str) -> Result<bool, PolicyError> {
        let id = clean_id(channel_id).to_owned();
        self.mutate(
            |state| {
                if id.is_empty() || state.channels.contains(&id) {
                    return Ok(None);
                }
                let mut next = state.clone();
                next.channels.push(id.clone());
                Ok(Some(next))
            },
            |next| vec![(ADMIN_CHANNEL_IDS, next.channels_value())],
        )
    }

    /// Remove a channel from the allowlist. Returns `false` if absent.
    pub fn deny_channel(&self, channel_id: &str) -> Result<bool, PolicyError> {
        let id = clean_id(channel_id).to_owned();
        self.mutate(
            |state| {
                if !state.channels.contains(&id) {
                    return Ok(None);
                }
                let mut next = state.clone();
                next.channels.retain(|c| *c != id);
                Ok(Some(next))
            },
            |next| vec![(ADMIN_CHANNEL_IDS, next.channels_value())],
        )
    }

    /// Toggle a flag by name and return its new value.
    pub fn toggle_feature(&self, name: &str) -> Result<(FeatureFlag, bool), PolicyError> {
        let flag = FeatureFlag::from_name(name)
            .ok_or_else(|| PolicyError::UnknownFeature(name.trim().to_owned()))?;
        let _guard = self.write_lock.lock();
        let current = self.snapshot();
        let mut next = (*current).clone();
        let value = !current.flag(flag);
        next.set_flag(flag, value);
        self.store.set(flag.env_key(), &value.to_string())?;
        self.swap(next);
        info!(flag = %flag, enabled = value, "feature toggled");
        Ok((flag, value))
    }

    /// Persist and apply a new result limit.
    pub fn set_result_limit(&self, limit: usize) -> Result<(), PolicyError> {
        if limit == 0 {
            return Err(PolicyError::InvalidSetting {
                key: "result_limit".into(),
                reason: "must be at least 1".into(),
            });
        }
        self.mutate(
            |state| {
                let mut next = state.clone();
                next.result_limit = Some(limit);
                Ok(Some(next))
            },
            |_| vec![(RESULT_LIMIT, limit.to_string())],
        )
        .map(|_| ())
    }

    /// Re-read the backing file and atomically replace the in-memory state.
    pub fn reload(&self) -> Result<(), PolicyError> {
        let _guard = self.write_lock.lock();
        let next = PolicyState::from_values(&self.store.load()?);
        let admins = next.admins.len();
        let channels = next.channels.len();
        self.swap(next);
        info!(admins, channels, "authorization policy reloaded");
        Ok(())
    }

    /// Apply `change` under the write lock. `None` means nothing to do.
    /// The file is written before the new snapshot becomes visible.
    fn mutate<F, P>(&self, change: F, persist: P) -> Result<bool, PolicyError>
    where
        F: FnOnce(&PolicyState) -> Result<Option<PolicyState>, PolicyError>,
        P: FnOnce(&PolicyState) -> Vec<(&'static str, String)>,
    {
        let _guard = self.write_lock.lock();
        let current = self.snapshot();
        let Some(next) = change(current.as_ref())? else {
            return Ok(false);
        };
        self.store.set_many(&persist(&next))?;
        self.swap(next);
        Ok(true)
    }

    fn swap(&self, next: PolicyState) {
        *self.state.write() = Arc::new(next);
    }
}

impl std::fmt::Debug for AuthorizationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationPolicy")
            .field("store", &self.store)
            .field("state", &self.snapshot())
            .field("enforce_channel_allowlist", &self.enforce_channel_allowlist)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::state::{ENABLE_SPL_QUERY, REQUIRE_SPL_APPROVAL};

    fn policy_in(dir: &Path, contents: &str) -> AuthorizationPolicy {
        let path = dir.join(".env");
        std::fs::write(&path, contents).unwrap();
        AuthorizationPolicy::load(EnvFile::new(path)).unwrap()
    }

    #[test]
    fn loads_roster_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let policy = policy_in(dir.path(), "ADMIN_USER_IDS=\"U1, U2\"\nADMIN_CHANNEL_IDS=C1\n");
        assert!(policy.is_admin("U1"));
        assert!(policy.is_admin("'U2'"));
        assert!(!policy.is_admin("U3"));
        assert!(policy.is_admin_channel("C1"));
        assert!(!policy.is_admin_channel("C2"));
    }

    #[test]
    fn add_then_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let policy = policy_in(dir.path(), "ADMIN_USER_IDS=U1\n");

        assert!(policy.add_admin("U2").unwrap());
        assert!(!policy.add_admin("U2").unwrap());
        assert!(policy.is_admin("U2"));

        assert!(policy.remove_admin("U2").unwrap());
        assert!(!policy.remove_admin("U2").unwrap());
        assert!(!policy.is_admin("U2"));
        assert_eq!(policy.snapshot().admins, ["U1"]);
    }

    #[test]
    fn mutations_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let policy = policy_in(dir.path(), "# roster\nADMIN_USER_IDS=U1\n");
        policy.add_admin("U2").unwrap();
        policy.allow_channel("C7").unwrap();
        policy.toggle_feature("spl").unwrap();
        policy.set_result_limit(9).unwrap();

        let reopened = AuthorizationPolicy::load(policy.store().clone()).unwrap();
        assert_eq!(*reopened.snapshot(), *policy.snapshot());

        let text = std::fs::read_to_string(dir.path().join(".env")).unwrap();
        assert!(text.starts_with("# roster\nADMIN_USER_IDS=U1,U2\n"));
    }

    #[test]
    fn reload_swaps_in_external_edits() {
        let dir = tempfile::tempdir().unwrap();
        let policy = policy_in(dir.path(), "ADMIN_USER_IDS=U1\n");
        let before = policy.snapshot();

        std::fs::write(dir.path().join(".env"), "ADMIN_USER_IDS=U5\nENABLE_SPL_QUERY=false\n")
            .unwrap();
        policy.reload().unwrap();

        assert!(before.is_admin("U1"));
        assert!(!policy.is_admin("U1"));
        assert!(policy.is_admin("U5"));
        assert!(!policy.snapshot().spl_enabled);
    }

    #[test]
    fn last_admin_cannot_be_removed() {
        let dir = tempfile::tempdir().unwrap();
        let policy = policy_in(dir.path(), "ADMIN_USER_IDS=U1\n");
        let err = policy.remove_admin("U1").unwrap_err();
        assert!(matches!(err, PolicyError::LastAdmin(ref id) if id == "U1"));
        assert!(policy.is_admin("U1"));
    }

    #[test]
    fn raw_query_decisions() {
        let dir = tempfile::tempdir().unwrap();
        let policy = policy_in(dir.path(), "ADMIN_USER_IDS=U1\n");

        assert_eq!(policy.can_execute_raw_query("U1", "C1"), Decision::Granted);
        assert_eq!(policy.can_execute_raw_query("U2", "C1"), Decision::NotAdmin);

        policy.toggle_feature("spl_query").unwrap();
        assert_eq!(policy.can_execute_raw_query("U1", "C1"), Decision::FeatureDisabled);
        assert_eq!(policy.can_execute_raw_query("U2", "C1"), Decision::FeatureDisabled);
        assert_eq!(
            Decision::FeatureDisabled.reason(),
            "SPL query execution is currently disabled"
        );
    }

    #[test]
    fn channel_allowlist_only_enforced_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "ADMIN_USER_IDS=U1\nADMIN_CHANNEL_IDS=C1\n").unwrap();

        let lax = AuthorizationPolicy::load(EnvFile::new(&path)).unwrap();
        assert_eq!(lax.can_execute_raw_query("U1", "C2"), Decision::Granted);

        let strict = AuthorizationPolicy::load(EnvFile::new(&path))
            .unwrap()
            .with_channel_enforcement(true);
        assert_eq!(strict.can_execute_raw_query("U1", "C1"), Decision::Granted);
        assert_eq!(
            strict.can_execute_raw_query("U1", "C2"),
            Decision::ChannelNotAllowed
        );

        strict.deny_channel("C1").unwrap();
        assert_eq!(strict.can_execute_raw_query("U1", "C2"), Decision::Granted);
    }

    #[test]
    fn toggle_persists_flag() {
        let dir = tempfile::tempdir().unwrap();
        let policy = policy_in(dir.path(), "");
        let (flag, value) = policy.toggle_feature("approval").unwrap();
        assert_eq!(flag, FeatureFlag::ApprovalRequired);
        assert!(value);

        let values = policy.store().load().unwrap();
        assert_eq!(values[REQUIRE_SPL_APPROVAL], "true");
        assert!(!values.contains_key(ENABLE_SPL_QUERY));
    }

    #[test]
    fn unknown_feature_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let policy = policy_in(dir.path(), "");
        let err = policy.toggle_feature("warp_drive").unwrap_err();
        assert!(matches!(err, PolicyError::UnknownFeature(ref n) if n == "warp_drive"));
    }

    #[test]
    fn failed_write_leaves_memory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = EnvFile::new(dir.path().join("gone").join(".env"));
        let policy = AuthorizationPolicy::with_state(store, PolicyState::default());

        let err = policy.add_admin("U1").unwrap_err();
        assert!(matches!(err, PolicyError::Persistence { .. }));
        assert!(!policy.is_admin("U1"));
    }

    #[test]
    fn zero_result_limit_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let policy = policy_in(dir.path(), "");
        assert!(matches!(
            policy.set_result_limit(0),
            Err(PolicyError::InvalidSetting { .. })
        ));
        assert_eq!(policy.snapshot().result_limit, None);
    }

    #[test]
    fn concurrent_adds_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let policy = Arc::new(policy_in(dir.path(), "ADMIN_USER_IDS=U0\n"));

        let handles: Vec<_> = (1..=8)
            .map(|i| {
                let policy = Arc::clone(&policy);
                std::thread::spawn(move || policy.add_admin(&format!("U{i}")).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(policy.snapshot().admins.len(), 9);
        policy.reload().unwrap();
        assert_eq!(policy.snapshot().admins.len(), 9);
    }
}
