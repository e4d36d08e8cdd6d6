//! Role and capability gate.
//!
//! The feature flags and the "view as user" override are admin overlays kept
//! in browser storage. [`CapabilityGate`] is the only reader and writer of
//! those keys: a non-admin always sees every flag off and the override off,
//! whatever is stored.

use ai_portal_core::{Capabilities, CapabilityFlag, FeatureFlags, Role, SessionStatus};

use crate::storage::{BrowserStorage, StorageError, keys};

/// Result of an overlay mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Applied,
    /// The caller is not an admin. Nothing was written.
    Refused,
}

/// Overlay state for one browser and one session status.
#[derive(Debug, Clone)]
pub struct CapabilityGate<S> {
    storage: S,
    role: Role,
    is_admin: bool,
    flags: FeatureFlags,
    viewing_as_user: bool,
}

impl<S: BrowserStorage> CapabilityGate<S> {
    /// Build the gate for `status`.
    ///
    /// A loading status is treated as non-admin. Storage read failures are
    /// logged and fall back to defaults.
    pub async fn load(storage: S, status: &SessionStatus) -> Self {
        let role = status.identity().map_or(Role::User, |i| i.role);
        let is_admin = !status.is_loading() && role.is_admin();

        let mut gate = Self {
            storage,
            role,
            is_admin,
            flags: FeatureFlags::all_off(),
            viewing_as_user: false,
        };
        if is_admin {
            gate.flags = gate.load_flags().await;
            gate.viewing_as_user = gate.load_view_override().await;
        }

        tracing::debug!(
            role = %gate.role,
            is_admin = gate.is_admin,
            viewing_as_user = gate.viewing_as_user,
            "Capability gate loaded"
        );
        gate
    }

    async fn load_flags(&self) -> FeatureFlags {
        let stored = match self.storage.get(keys::FEATURE_FLAGS).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read feature flags");
                return FeatureFlags::all_off();
            }
        };
        let Some(blob) = stored else {
            return FeatureFlags::all_off();
        };
        serde_json::from_str(&blob).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Ignoring malformed feature flags");
            FeatureFlags::all_off()
        })
    }

    async fn load_view_override(&self) -> bool {
        match self.storage.get(keys::VIEW_AS_USER).await {
            Ok(stored) => stored.as_deref() == Some("true"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read view override");
                false
            }
        }
    }

    #[must_use]
    pub const fn flags(&self) -> FeatureFlags {
        self.flags
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.is_admin
    }

    #[must_use]
    pub const fn is_viewing_as_user(&self) -> bool {
        self.viewing_as_user
    }

    /// What the browser may see.
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        if self.is_admin {
            Capabilities::derive(self.role, &self.flags, self.viewing_as_user)
        } else {
            Capabilities::derive(self.role, &FeatureFlags::all_off(), false)
        }
    }

    /// Set one flag and persist the whole flag set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the flags cannot be written; the in-memory
    /// value is left unchanged.
    pub async fn update_flag(
        &mut self,
        flag: CapabilityFlag,
        value: bool,
    ) -> Result<GateOutcome, StorageError> {
        if !self.is_admin {
            tracing::warn!(%flag, value, role = %self.role, "Refused flag update from non-admin");
            return Ok(GateOutcome::Refused);
        }

        let updated = self.flags.with(flag, value);
        let blob = serde_json::to_string(&updated).map_err(StorageError::Encode)?;
        self.storage.set(keys::FEATURE_FLAGS, &blob).await?;
        self.flags = updated;

        tracing::info!(%flag, value, "Feature flag updated");
        Ok(GateOutcome::Applied)
    }

    /// Flip the "view as user" override. Flags are left alone.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the override cannot be written.
    pub async fn toggle_admin_view(&mut self) -> Result<GateOutcome, StorageError> {
        if !self.is_admin {
            tracing::warn!(role = %self.role, "Refused view toggle from non-admin");
            return Ok(GateOutcome::Refused);
        }

        let viewing = !self.viewing_as_user;
        let stored = if viewing { "true" } else { "false" };
        self.storage.set(keys::VIEW_AS_USER, stored).await?;
        self.viewing_as_user = viewing;

        tracing::info!(viewing_as_user = viewing, "Admin view toggled");
        Ok(GateOutcome::Applied)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use ai_portal_core::{Email, Identity, UserId};

    use super::*;
    use crate::storage::MemoryStorage;

    fn status(role: Role, groups: &[&str]) -> SessionStatus {
        SessionStatus::Authenticated(Identity {
            id: UserId::parse("u1").unwrap(),
            username: "u1".to_string(),
            display_name: "U One".to_string(),
            email: Some(Email::parse("u1@example.com").unwrap()),
            role,
            groups: groups.iter().map(ToString::to_string).collect::<BTreeSet<_>>(),
            access_token: None,
        })
    }

    async fn seeded_storage() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage
            .set(
                keys::FEATURE_FLAGS,
                r#"{"showUserActivityPanel":true,"showAdminDashboard":true,"showAdminViewToggle":true}"#,
            )
            .await
            .unwrap();
        storage.set(keys::VIEW_AS_USER, "true").await.unwrap();
        storage
    }

    #[tokio::test]
    async fn test_non_admin_sees_defaults_whatever_is_stored() {
        for role in [Role::User, Role::Contributor] {
            let storage = seeded_storage().await;
            let mut gate = CapabilityGate::load(storage.clone(), &status(role, &["admin"])).await;

            assert!(!gate.is_admin());
            assert_eq!(gate.flags(), FeatureFlags::all_off());
            assert!(!gate.is_viewing_as_user());
            assert_eq!(gate.capabilities(), Capabilities::derive(role, &FeatureFlags::all_off(), false));

            assert_eq!(
                gate.update_flag(CapabilityFlag::ShowAdminDashboard, false).await.unwrap(),
                GateOutcome::Refused
            );
            assert_eq!(gate.toggle_admin_view().await.unwrap(), GateOutcome::Refused);
            assert_eq!(
                storage.get(keys::VIEW_AS_USER).await.unwrap().as_deref(),
                Some("true")
            );
        }
    }

    #[tokio::test]
    async fn test_loading_and_anonymous_are_not_admin() {
        let storage = seeded_storage().await;
        let loading = CapabilityGate::load(storage.clone(), &SessionStatus::Loading).await;
        assert!(!loading.is_admin());
        assert_eq!(loading.flags(), FeatureFlags::all_off());

        let anonymous = CapabilityGate::load(storage, &SessionStatus::anonymous()).await;
        assert!(!anonymous.is_admin());
        assert!(!anonymous.capabilities().admin_view_toggle);
    }

    #[tokio::test]
    async fn test_flag_update_persists_across_reload() {
        let storage = MemoryStorage::new();
        let admin = status(Role::Admin, &[]);

        let mut gate = CapabilityGate::load(storage.clone(), &admin).await;
        assert_eq!(
            gate.update_flag(CapabilityFlag::ShowActivityPanel, true).await.unwrap(),
            GateOutcome::Applied
        );

        let reloaded = CapabilityGate::load(storage.clone(), &admin).await;
        assert!(reloaded.flags().show_activity_panel);
        assert!(!reloaded.flags().show_admin_dashboard);

        let blob = storage.get(keys::FEATURE_FLAGS).await.unwrap().unwrap();
        let stored: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(stored["showUserActivityPanel"], true);
        assert_eq!(stored["showAdminDashboard"], false);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_override() {
        let storage = MemoryStorage::new();
        let mut gate = CapabilityGate::load(storage.clone(), &status(Role::SuperAdmin, &[])).await;
        let before = gate.is_viewing_as_user();

        gate.toggle_admin_view().await.unwrap();
        assert_ne!(gate.is_viewing_as_user(), before);
        gate.toggle_admin_view().await.unwrap();
        assert_eq!(gate.is_viewing_as_user(), before);
        assert_eq!(
            storage.get(keys::VIEW_AS_USER).await.unwrap().as_deref(),
            Some("false")
        );
    }

    #[tokio::test]
    async fn test_view_override_hides_admin_features_but_not_toggle() {
        let storage = seeded_storage().await;
        let gate = CapabilityGate::load(storage, &status(Role::Admin, &[])).await;

        assert!(gate.is_viewing_as_user());
        assert!(gate.flags().show_admin_dashboard);

        let caps = gate.capabilities();
        assert_eq!(caps.effective_role, Role::User);
        assert!(!caps.admin_dashboard);
        assert!(!caps.activity_panel);
        assert!(caps.admin_view_toggle);
    }

    #[tokio::test]
    async fn test_toggle_leaves_flags_alone() {
        let storage = seeded_storage().await;
        let mut gate = CapabilityGate::load(storage, &status(Role::Admin, &[])).await;
        let flags = gate.flags();
        gate.toggle_admin_view().await.unwrap();
        assert_eq!(gate.flags(), flags);
        assert!(gate.capabilities().admin_dashboard);
    }

    #[tokio::test]
    async fn test_partial_and_malformed_blobs() {
        let storage = MemoryStorage::new();
        storage
            .set(keys::FEATURE_FLAGS, r#"{"showAdminDashboard":true,"legacy":1}"#)
            .await
            .unwrap();
        let gate = CapabilityGate::load(storage.clone(), &status(Role::Admin, &[])).await;
        assert_eq!(
            gate.flags(),
            FeatureFlags::all_off().with(CapabilityFlag::ShowAdminDashboard, true)
        );

        storage.set(keys::FEATURE_FLAGS, "{not json").await.unwrap();
        let gate = CapabilityGate::load(storage, &status(Role::Admin, &[])).await;
        assert_eq!(gate.flags(), FeatureFlags::all_off());
    }
}
