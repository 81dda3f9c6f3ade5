use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission granted to a role.
///
/// Permissions are opaque strings (e.g. "billing.manage"). Three shapes occur:
/// the wildcard `"*"`, a coarse permission matching an ability verbatim, and a
/// scoped `..._assigned` permission that only grants after an ownership check.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: &'static str = "*";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn wildcard() -> Self {
        Self::new(Self::WILDCARD)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == Self::WILDCARD
    }

    pub fn is_assigned_scope(&self) -> bool {
        self.as_str().ends_with("_assigned")
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::borrow::Borrow<str> for Permission {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

/// Action-on-resource-class being checked, conventionally `<resource>.<verb>`.
///
/// No structural validation happens on construction: abilities are matched
/// verbatim against permissions, and only the ten forms recognised by
/// [`Ability::granular`] get an ownership fallback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ability(Cow<'static, str>);

impl Ability {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resource family and action for the abilities that have granular rules.
    pub fn granular(&self) -> Option<(Resource, Action)> {
        let (resource, action) = self.as_str().split_once('.')?;
        let resource = Resource::parse(resource)?;
        let action = match action {
            "read" => Action::Read,
            "write" => Action::Write,
            _ => return None,
        };
        Some((resource, action))
    }

    /// True for `<resource>.<verb>` with both segments non-empty.
    pub fn is_well_formed(&self) -> bool {
        match self.as_str().split_once('.') {
            Some((resource, verb)) => !resource.is_empty() && !verb.is_empty(),
            None => false,
        }
    }
}

impl core::fmt::Display for Ability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Ability {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Ability {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Resource families with ownership-aware read/write rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Patients,
    Appointments,
    Medical,
    Lab,
    Prescriptions,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Patients,
        Resource::Appointments,
        Resource::Medical,
        Resource::Lab,
        Resource::Prescriptions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Patients => "patients",
            Resource::Appointments => "appointments",
            Resource::Medical => "medical",
            Resource::Lab => "lab",
            Resource::Prescriptions => "prescriptions",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }

    /// `<resource>.read_all` / `<resource>.write_all`.
    pub fn all_permission(self, action: Action) -> Permission {
        Permission::new(format!("{}.{}_all", self.as_str(), action.as_str()))
    }

    /// `<resource>.read_assigned` / `<resource>.write_assigned`.
    pub fn assigned_permission(self, action: Action) -> Permission {
        Permission::new(format!("{}.{}_assigned", self.as_str(), action.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    Write,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn granular_recognises_only_read_and_write_on_known_families() {
        assert_eq!(
            Ability::new("patients.read").granular(),
            Some((Resource::Patients, Action::Read))
        );
        assert_eq!(
            Ability::new("prescriptions.write").granular(),
            Some((Resource::Prescriptions, Action::Write))
        );
        assert_eq!(Ability::new("patients.read_all").granular(), None);
        assert_eq!(Ability::new("kpi.manage").granular(), None);
        assert_eq!(Ability::new("inventory.read").granular(), None);
        assert_eq!(Ability::new("patients").granular(), None);
    }

    #[test]
    fn scoped_permission_names() {
        assert_eq!(
            Resource::Lab.all_permission(Action::Write).as_str(),
            "lab.write_all"
        );
        let assigned = Resource::Medical.assigned_permission(Action::Read);
        assert_eq!(assigned.as_str(), "medical.read_assigned");
        assert!(assigned.is_assigned_scope());
    }

    #[test]
    fn well_formed_requires_two_segments() {
        assert!(Ability::new("notifications.read").is_well_formed());
        assert!(!Ability::new("notifications").is_well_formed());
        assert!(!Ability::new(".read").is_well_formed());
        assert!(!Ability::new("").is_well_formed());
    }
}
