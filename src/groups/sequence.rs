//! Group sequences.

use crate::core::error::{GroupError, GroupResult};
use crate::core::group::{Group, GroupCatalog};
use indexmap::IndexSet;

/// A sequence member together with the groups it inherits from.
///
/// All groups of one member are validated in the same sequence step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupWithInheritance {
    groups: Vec<Group>,
}

impl GroupWithInheritance {
    /// The member first, then its ancestors depth-first.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }
}

/// An ordered list of groups validated one after another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    id: Group,
    groups: Vec<Group>,
    expanded: Vec<GroupWithInheritance>,
}

impl Sequence {
    /// Create a sequence from already flattened members.
    pub fn new(id: Group, groups: Vec<Group>) -> Self {
        let expanded = groups
            .iter()
            .map(|g| GroupWithInheritance {
                groups: vec![g.clone()],
            })
            .collect();
        Self {
            id,
            groups,
            expanded,
        }
    }

    /// The implicit sequence containing only `Default`.
    pub fn default_sequence() -> Self {
        Self::new(Group::default_group(), vec![Group::default_group()])
    }

    /// Group that defines this sequence.
    pub fn id(&self) -> &Group {
        &self.id
    }

    /// All groups of the sequence, inherited ones included once expanded.
    pub fn composing_groups(&self) -> &[Group] {
        &self.groups
    }

    /// Position of `group` among the composing groups.
    pub fn index_of(&self, group: &Group) -> Option<usize> {
        self.groups.iter().position(|g| g == group)
    }

    /// Sequence steps in order.
    pub fn iter(&self) -> std::slice::Iter<'_, GroupWithInheritance> {
        self.expanded.iter()
    }

    /// Attach the inherited groups of every member.
    ///
    /// Fails with [`GroupError::NestedSequence`] when a member inherits from
    /// a sequence.
    pub fn expand_inherited_groups(&mut self, catalog: &GroupCatalog) -> GroupResult<()> {
        let mut expanded = Vec::with_capacity(self.expanded.len());
        let mut flattened = IndexSet::new();

        for step in &self.expanded {
            let mut with_parents = IndexSet::new();
            for group in &step.groups {
                with_parents.insert(group.clone());
                self.add_inherited_groups(catalog, group, group, &mut with_parents)?;
            }
            flattened.extend(with_parents.iter().cloned());
            expanded.push(GroupWithInheritance {
                groups: with_parents.into_iter().collect(),
            });
        }

        self.expanded = expanded;
        self.groups = flattened.into_iter().collect();
        Ok(())
    }

    fn add_inherited_groups(
        &self,
        catalog: &GroupCatalog,
        member: &Group,
        group: &Group,
        into: &mut IndexSet<Group>,
    ) -> GroupResult<()> {
        for parent in catalog.parents(group) {
            if catalog.is_sequence(parent) {
                return Err(GroupError::NestedSequence {
                    sequence: self.id.clone(),
                    group: member.clone(),
                    parent: parent.clone(),
                });
            }
            if into.insert(parent.clone()) {
                self.add_inherited_groups(catalog, member, parent, into)?;
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a GroupWithInheritance;
    type IntoIter = std::slice::Iter<'a, GroupWithInheritance>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(names: &[&str]) -> Vec<Group> {
        names.iter().map(|n| Group::new(n)).collect()
    }

    #[test]
    fn test_expand_inherited_groups() {
        let catalog = GroupCatalog::new()
            .with_group("Full", ["Basic"])
            .with_group("Basic", ["Minimal"]);
        let mut sequence = Sequence::new(Group::new("Ordered"), groups(&["Quick", "Full"]));
        sequence.expand_inherited_groups(&catalog).unwrap();

        let steps: Vec<_> = sequence.iter().map(|s| s.groups().to_vec()).collect();
        assert_eq!(steps, vec![groups(&["Quick"]), groups(&["Full", "Basic", "Minimal"])]);
        assert_eq!(
            sequence.composing_groups(),
            groups(&["Quick", "Full", "Basic", "Minimal"]).as_slice()
        );
    }

    #[test]
    fn test_inherited_sequence_is_rejected() {
        let catalog = GroupCatalog::new()
            .with_sequence("Inner", ["A"])
            .with_group("Child", ["Inner"]);
        let mut sequence = Sequence::new(Group::new("Outer"), groups(&["Child"]));

        let err = sequence.expand_inherited_groups(&catalog).unwrap_err();
        assert!(matches!(err, GroupError::NestedSequence { .. }));
    }
}
