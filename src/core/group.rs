//! Validation groups and the catalog describing how they relate.
//!
//! A group is an opaque name. The catalog records which groups extend which
//! other groups and which groups are really sequences of other groups.
//! Groups that were never declared are plain groups with no parents.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier of a validation group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Group(Arc<str>);

impl Group {
    /// Name of the distinguished default group.
    pub const DEFAULT_NAME: &'static str = "Default";

    /// Create a group from its identifier.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The `Default` group.
    pub fn default_group() -> Self {
        Self::new(Self::DEFAULT_NAME)
    }

    /// Identifier of this group.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Whether this is the `Default` group.
    pub fn is_default(&self) -> bool {
        &*self.0 == Self::DEFAULT_NAME
    }

    /// A blank identifier stands for a missing group token.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Group {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// How a declared group is defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupDefinition {
    /// A plain group that inherits from zero or more parent groups.
    Plain { extends: Vec<Group> },
    /// A group that stands for an ordered sequence of other groups.
    Sequence { members: Vec<Group> },
}

/// Catalog of group declarations shared by all validations.
#[derive(Debug, Clone, Default)]
pub struct GroupCatalog {
    definitions: IndexMap<Group, GroupDefinition>,
}

impl GroupCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a plain group extending the given parents.
    pub fn with_group<I, G>(mut self, group: impl Into<Group>, extends: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<Group>,
    {
        self.define_group(group, extends);
        self
    }

    /// Declare a group sequence.
    pub fn with_sequence<I, G>(mut self, group: impl Into<Group>, members: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<Group>,
    {
        self.define_sequence(group, members);
        self
    }

    /// Declare a plain group extending the given parents.
    pub fn define_group<I, G>(&mut self, group: impl Into<Group>, extends: I)
    where
        I: IntoIterator<Item = G>,
        G: Into<Group>,
    {
        let extends = extends.into_iter().map(Into::into).collect();
        self.definitions
            .insert(group.into(), GroupDefinition::Plain { extends });
    }

    /// Declare a group sequence.
    pub fn define_sequence<I, G>(&mut self, group: impl Into<Group>, members: I)
    where
        I: IntoIterator<Item = G>,
        G: Into<Group>,
    {
        let members = members.into_iter().map(Into::into).collect();
        self.definitions
            .insert(group.into(), GroupDefinition::Sequence { members });
    }

    /// Whether the group is declared as a sequence.
    pub fn is_sequence(&self, group: &Group) -> bool {
        matches!(
            self.definitions.get(group),
            Some(GroupDefinition::Sequence { .. })
        )
    }

    /// Members of a sequence, if the group is one.
    pub fn sequence_members(&self, group: &Group) -> Option<&[Group]> {
        match self.definitions.get(group) {
            Some(GroupDefinition::Sequence { members }) => Some(members),
            _ => None,
        }
    }

    /// Direct parents of a plain group. Undeclared groups have none.
    pub fn parents(&self, group: &Group) -> &[Group] {
        match self.definitions.get(group) {
            Some(GroupDefinition::Plain { extends }) => extends,
            _ => &[],
        }
    }

    /// Look up the definition of a group.
    pub fn definition(&self, group: &Group) -> Option<&GroupDefinition> {
        self.definitions.get(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_group() {
        let group = Group::default_group();
        assert!(group.is_default());
        assert_eq!(group, Group::new("Default"));
        assert!(!Group::new("Strict").is_default());
        assert!(Group::new("  ").is_blank());
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = GroupCatalog::new()
            .with_group("Extended", ["Basic"])
            .with_sequence("Ordered", ["Basic", "Extended"]);

        assert_eq!(catalog.parents(&Group::new("Extended")), &[Group::new("Basic")]);
        assert!(catalog.parents(&Group::new("Unknown")).is_empty());
        assert!(catalog.is_sequence(&Group::new("Ordered")));
        assert!(!catalog.is_sequence(&Group::new("Extended")));
        assert_eq!(
            catalog.sequence_members(&Group::new("Ordered")).map(|m| m.len()),
            Some(2)
        );
    }
}
