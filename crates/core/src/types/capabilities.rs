//! Effective role and visible capabilities.

use serde::Serialize;

use super::{FeatureFlags, Role};

/// What the presentation layer may show, derived from the real role, the
/// feature flags and the "view as regular user" override.
///
/// Rules:
/// - a non-admin sees no optional capability, whatever was persisted;
/// - an admin viewing as a regular user behaves as `Role::User` for every
///   admin-only affordance;
/// - the view toggle follows its flag regardless of the override, so an admin
///   can always switch back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// Role used for visibility decisions.
    pub effective_role: Role,
    /// Whether an admin is currently viewing the portal as a regular user.
    pub viewing_as_user: bool,
    /// User activity panel on the home page.
    pub activity_panel: bool,
    /// Usage dashboard link in the navigation.
    pub admin_dashboard: bool,
    /// "View as user" switch.
    pub admin_view_toggle: bool,
    /// Feature flag management panel.
    pub flag_management: bool,
}

impl Capabilities {
    /// Derive capabilities for an identity's real `role`.
    ///
    /// `flags` and `viewing_as_user` are ignored for non-admin roles.
    #[must_use]
    pub const fn derive(role: Role, flags: &FeatureFlags, viewing_as_user: bool) -> Self {
        if !role.is_admin() {
            return Self {
                effective_role: role,
                viewing_as_user: false,
                activity_panel: false,
                admin_dashboard: false,
                admin_view_toggle: false,
                flag_management: false,
            };
        }

        let acting_as_admin = !viewing_as_user;
        Self {
            effective_role: if viewing_as_user { Role::User } else { role },
            viewing_as_user,
            activity_panel: acting_as_admin && flags.show_activity_panel,
            admin_dashboard: acting_as_admin && flags.show_admin_dashboard,
            admin_view_toggle: flags.show_admin_view_toggle,
            flag_management: acting_as_admin,
        }
    }

    /// Capabilities of an unauthenticated caller.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self::derive(Role::User, &FeatureFlags::all_off(), false)
    }
}
