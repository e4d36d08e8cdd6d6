//! Administrator feature flags.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown flag name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown feature flag: {0}")]
pub struct UnknownFlag(pub String);

/// A recognized optional UI capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityFlag {
    /// User activity metrics panel on the home page.
    ShowActivityPanel,
    /// Link to the usage dashboard in the main navigation.
    ShowAdminDashboard,
    /// The "view as regular user" switch itself.
    ShowAdminViewToggle,
}

impl CapabilityFlag {
    /// Every recognized flag, in display order.
    pub const ALL: [Self; 3] = [
        Self::ShowActivityPanel,
        Self::ShowAdminDashboard,
        Self::ShowAdminViewToggle,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ShowActivityPanel => "show-activity-panel",
            Self::ShowAdminDashboard => "show-admin-dashboard",
            Self::ShowAdminViewToggle => "show-admin-view-toggle",
        }
    }
}

impl std::fmt::Display for CapabilityFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CapabilityFlag {
    type Err = UnknownFlag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|flag| flag.as_str() == s)
            .ok_or_else(|| UnknownFlag(s.to_owned()))
    }
}

/// The full flag set.
///
/// The serde representation is the persisted blob: a camelCase object where
/// missing keys fall back to `false` and unknown keys are ignored, so loading
/// a stored blob always merges over the all-false default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureFlags {
    #[serde(rename = "showUserActivityPanel")]
    pub show_activity_panel: bool,
    pub show_admin_dashboard: bool,
    pub show_admin_view_toggle: bool,
}

impl FeatureFlags {
    /// The all-false flag set, usable in `const` contexts.
    #[must_use]
    pub const fn all_off() -> Self {
        Self {
            show_activity_panel: false,
            show_admin_dashboard: false,
            show_admin_view_toggle: false,
        }
    }

    #[must_use]
    pub const fn get(&self, flag: CapabilityFlag) -> bool {
        match flag {
            CapabilityFlag::ShowActivityPanel => self.show_activity_panel,
            CapabilityFlag::ShowAdminDashboard => self.show_admin_dashboard,
            CapabilityFlag::ShowAdminViewToggle => self.show_admin_view_toggle,
        }
    }

    pub const fn set(&mut self, flag: CapabilityFlag, value: bool) {
        match flag {
            CapabilityFlag::ShowActivityPanel => self.show_activity_panel = value,
            CapabilityFlag::ShowAdminDashboard => self.show_admin_dashboard = value,
            CapabilityFlag::ShowAdminViewToggle => self.show_admin_view_toggle = value,
        }
    }

    /// Copy of `self` with one flag replaced.
    #[must_use]
    pub const fn with(mut self, flag: CapabilityFlag, value: bool) -> Self {
        self.set(flag, value);
        self
    }
}
