//! Role identifiers assigned to clients by the remote authority.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque role token such as `"presenter"`.
///
/// Roles are compared by exact string equality only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Creates a role from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Meeting organizer.
    pub fn organizer() -> Self {
        Self::new("Organizer")
    }

    /// Meeting presenter.
    pub fn presenter() -> Self {
        Self::new("Presenter")
    }

    /// Meeting attendee.
    pub fn attendee() -> Self {
        Self::new("Attendee")
    }

    /// Guest from outside the tenant.
    pub fn guest() -> Self {
        Self::new("Guest")
    }

    /// Returns the role token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Ordered set of roles held by one client.
///
/// Duplicates are dropped on construction; the first occurrence keeps its
/// position.
///
/// # Examples
///
/// ```
/// use huddle_core::{Role, RoleSet};
///
/// let roles = RoleSet::from_iter(["Presenter", "Attendee", "Presenter"]);
/// assert_eq!(roles.len(), 2);
/// assert!(roles.contains(&Role::presenter()));
/// assert!(!roles.intersects(&[Role::organizer()]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    /// Creates an empty role set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns true if the client holds `role`.
    pub fn contains(&self, role: &Role) -> bool {
        self.0.contains(role)
    }

    /// Returns true if at least one of `allowed` is held.
    pub fn intersects(&self, allowed: &[Role]) -> bool {
        allowed.iter().any(|role| self.contains(role))
    }

    /// Returns the roles in their original order.
    pub fn as_slice(&self) -> &[Role] {
        &self.0
    }

    /// Iterates over the roles.
    pub fn iter(&self) -> std::slice::Iter<'_, Role> {
        self.0.iter()
    }

    /// Returns the number of roles.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no roles are held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push_unique(&mut self, role: Role) {
        if !self.contains(&role) {
            self.0.push(role);
        }
    }
}

impl<R: Into<Role>> FromIterator<R> for RoleSet {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let mut set = Self::new();
        for role in iter {
            set.push_unique(role.into());
        }
        set
    }
}

impl<'a> IntoIterator for &'a RoleSet {
    type Item = &'a Role;
    type IntoIter = std::slice::Iter<'a, Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// Deserialization goes through FromIterator so wire data is deduplicated too.
impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let roles = Vec::<Role>::deserialize(deserializer)?;
        Ok(roles.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_position() {
        let roles = RoleSet::from_iter(["Guest", "Presenter", "Guest", "Organizer"]);
        let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
        assert_eq!(names, vec!["Guest", "Presenter", "Organizer"]);
    }

    #[test]
    fn test_intersects_membership_only() {
        let roles = RoleSet::from_iter(["Attendee"]);
        assert!(roles.intersects(&[Role::presenter(), Role::attendee()]));
        assert!(!roles.intersects(&[Role::presenter()]));
        assert!(!roles.intersects(&[]));
    }

    #[test]
    fn test_roles_are_case_sensitive() {
        let roles = RoleSet::from_iter(["presenter"]);
        assert!(!roles.contains(&Role::presenter()));
        assert!(roles.contains(&Role::new("presenter")));
    }

    #[test]
    fn test_empty_set() {
        let roles = RoleSet::new();
        assert!(roles.is_empty());
        assert_eq!(roles.len(), 0);
    }
}
