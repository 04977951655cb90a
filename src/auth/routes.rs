//! Application routes and the gate in front of each.

use super::role::{Capabilities, Gate, RouteGroup};

/// A route pattern; `:name` segments match any single path segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Route {
    pub pattern: &'static str,
    pub gate: Gate,
}

pub const ROUTES: &[Route] = &[
    Route { pattern: "/login", gate: Gate::Public },
    Route { pattern: "/register", gate: Gate::Public },
    Route { pattern: "/unauthorized", gate: Gate::Public },
    Route { pattern: "/", gate: Gate::Authenticated },
    Route { pattern: "/moulds/:number", gate: Gate::Authenticated },
    Route { pattern: "/changeovers", gate: Gate::Authenticated },
    Route { pattern: "/tpm", gate: Gate::Authenticated },
    Route { pattern: "/kalendarz", gate: Gate::Authenticated },
    Route { pattern: "/current-sv", gate: Gate::Authenticated },
    Route { pattern: "/admin-panel", gate: Gate::Roles(RouteGroup::MouldAdmin) },
    Route { pattern: "/moulds-admin", gate: Gate::Roles(RouteGroup::DepartmentAdmin) },
    Route { pattern: "/production-admin", gate: Gate::Roles(RouteGroup::DepartmentAdmin) },
    Route { pattern: "/superadmin", gate: Gate::Roles(RouteGroup::SuperAdmin) },
    Route { pattern: "/dashboard", gate: Gate::Roles(RouteGroup::SuperAdmin) },
    Route { pattern: "/mes", gate: Gate::Roles(RouteGroup::Department) },
    Route { pattern: "/mes/production", gate: Gate::Roles(RouteGroup::Department) },
    Route { pattern: "/mes/production/machine/:machine_id", gate: Gate::Roles(RouteGroup::Department) },
    Route {
        pattern: "/mes/production/machine/:machine_id/operation/:operation_id",
        gate: Gate::Roles(RouteGroup::Department),
    },
];

impl Route {
    pub fn matches(&self, path: &str) -> bool {
        let wanted = segments(self.pattern);
        let actual = segments(path);
        wanted.len() == actual.len()
            && wanted
                .iter()
                .zip(&actual)
                .all(|(pattern, segment)| pattern.starts_with(':') || pattern == segment)
    }
}

/// Find the route serving `path`. Query strings and fragments are ignored.
pub fn resolve(path: &str) -> Option<&'static Route> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    ROUTES.iter().find(|route| route.matches(path))
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

/// Entry of the side navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavItem {
    pub path: &'static str,
    pub label: &'static str,
    superadmin_only: bool,
    admin_only: bool,
}

const NAV_ITEMS: &[NavItem] = &[
    NavItem { path: "/dashboard", label: "Dashboard", superadmin_only: true, admin_only: false },
    NavItem { path: "/", label: "Moulds", superadmin_only: false, admin_only: false },
    NavItem { path: "/changeovers", label: "Changeovers", superadmin_only: false, admin_only: false },
    NavItem { path: "/kalendarz", label: "Calendar", superadmin_only: false, admin_only: false },
    NavItem { path: "/tpm", label: "TPM", superadmin_only: false, admin_only: false },
    NavItem { path: "/mes", label: "MES", superadmin_only: false, admin_only: false },
    NavItem { path: "/moulds-admin", label: "Add mould", superadmin_only: false, admin_only: true },
];

/// Navigation entries offered for the given capabilities.
pub fn navigation(capabilities: Capabilities) -> Vec<NavItem> {
    NAV_ITEMS
        .iter()
        .filter(|item| !item.superadmin_only || capabilities.is_superadmin)
        .filter(|item| !item.admin_only || capabilities.can_manage_schedules)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::role::Role;

    #[test]
    fn resolves_parameterized_paths() {
        let route = resolve("/mes/production/machine/4/operation/17").unwrap();
        assert_eq!(route.gate, Gate::Roles(RouteGroup::Department));
        assert_eq!(resolve("/moulds/F-102?tab=tpm").unwrap().pattern, "/moulds/:number");
        assert_eq!(resolve("/").unwrap().gate, Gate::Authenticated);
        assert!(resolve("/moulds").is_none());
    }

    #[test]
    fn navigation_hides_privileged_items() {
        let plain = navigation(Capabilities::from_role(Some(&Role::User)));
        assert!(plain.iter().all(|item| item.path != "/dashboard" && item.path != "/moulds-admin"));
        let admindn = navigation(Capabilities::from_role(Some(&Role::AdminDn)));
        assert!(admindn.iter().any(|item| item.path == "/moulds-admin"));
        assert!(admindn.iter().all(|item| item.path != "/dashboard"));
        let superadmin = navigation(Capabilities::from_role(Some(&Role::SuperAdmin)));
        assert_eq!(superadmin.len(), NAV_ITEMS.len());
    }
}
