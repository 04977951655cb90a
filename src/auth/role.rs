//! Roles, allow-lists and the client-side route gate.
//!
//! Everything here is a UI convenience derived from an unverified token. It
//! decides what the client offers, never what the backend permits.

use std::fmt;

use super::claims;

/// Path the gate redirects to when no usable token is present.
pub const LOGIN_PATH: &str = "/login";
/// Path the gate redirects to when the role is not on the allow-list.
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// A role claim value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    UserDn,
    Admin,
    AdminDn,
    SuperAdmin,
    Production,
    /// Any role string outside the known set. Never matches an allow-list.
    Other(String),
}

impl Role {
    /// Map a claim string to a role. Matching is exact, as the backend issues it.
    pub fn parse(value: &str) -> Self {
        match value {
            "user" => Self::User,
            "userdn" => Self::UserDn,
            "admin" => Self::Admin,
            "admindn" => Self::AdminDn,
            "superadmin" => Self::SuperAdmin,
            "production" => Self::Production,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::UserDn => "userdn",
            Self::Admin => "admin",
            Self::AdminDn => "admindn",
            Self::SuperAdmin => "superadmin",
            Self::Production => "production",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named allow-lists guarding groups of routes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteGroup {
    /// Mould administration: `admin`, `superadmin`.
    MouldAdmin,
    /// Department administration (changeovers, calendar, mould intake):
    /// `admindn`, `superadmin`.
    DepartmentAdmin,
    /// `superadmin` only.
    SuperAdmin,
    /// Department floor (MES): `userdn`, `admindn`, `superadmin`.
    Department,
}

impl RouteGroup {
    pub fn allowed_roles(self) -> &'static [Role] {
        const MOULD_ADMIN: &[Role] = &[Role::Admin, Role::SuperAdmin];
        const DEPARTMENT_ADMIN: &[Role] = &[Role::AdminDn, Role::SuperAdmin];
        const SUPER_ADMIN: &[Role] = &[Role::SuperAdmin];
        const DEPARTMENT: &[Role] = &[Role::UserDn, Role::AdminDn, Role::SuperAdmin];
        match self {
            Self::MouldAdmin => MOULD_ADMIN,
            Self::DepartmentAdmin => DEPARTMENT_ADMIN,
            Self::SuperAdmin => SUPER_ADMIN,
            Self::Department => DEPARTMENT,
        }
    }

    pub fn permits(self, role: &Role) -> bool {
        self.allowed_roles().contains(role)
    }
}

/// What a route requires before it renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    /// Open to everyone.
    Public,
    /// Any stored token, decodable or not.
    Authenticated,
    /// A decodable token whose role is on the group's allow-list.
    Roles(RouteGroup),
}

/// Outcome of checking a gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(&'static str),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decide whether the holder of `token` may see a route guarded by `gate`.
///
/// Pure: reads nothing but its arguments and never fails.
pub fn check(token: Option<&str>, gate: Gate) -> GateDecision {
    let token = token.map(str::trim).filter(|token| !token.is_empty());
    match gate {
        Gate::Public => GateDecision::Allow,
        Gate::Authenticated => match token {
            Some(_) => GateDecision::Allow,
            None => GateDecision::Redirect(LOGIN_PATH),
        },
        Gate::Roles(group) => {
            let Some(claims) = token.and_then(claims::parse) else {
                return GateDecision::Redirect(LOGIN_PATH);
            };
            match claims.role {
                Some(role) if group.permits(&role) => GateDecision::Allow,
                _ => GateDecision::Redirect(UNAUTHORIZED_PATH),
            }
        }
    }
}

/// Actions offered in list views, derived from the role claim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Add, edit and delete moulds.
    pub can_edit_moulds: bool,
    /// Add, edit and delete changeovers and calendar entries.
    pub can_manage_schedules: bool,
    pub is_superadmin: bool,
}

impl Capabilities {
    pub fn from_role(role: Option<&Role>) -> Self {
        let Some(role) = role else {
            return Self::default();
        };
        Self {
            can_edit_moulds: RouteGroup::MouldAdmin.permits(role),
            can_manage_schedules: RouteGroup::DepartmentAdmin.permits(role),
            is_superadmin: RouteGroup::SuperAdmin.permits(role),
        }
    }

    pub fn from_token(token: Option<&str>) -> Self {
        let claims = token.and_then(claims::parse);
        Self::from_role(claims.as_ref().and_then(|claims| claims.role.as_ref()))
    }
}
