//! The order in which groups and sequences are validated.

use crate::core::error::{GroupError, GroupResult};
use crate::core::group::Group;
use crate::groups::sequence::Sequence;
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;

/// Standalone groups and sequences requested for one validation call.
///
/// Both lists keep insertion order and ignore duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOrder {
    groups: IndexSet<Group>,
    sequences: IndexMap<Group, Arc<Sequence>>,
}

impl ValidationOrder {
    /// Create an empty order.
    pub fn new() -> Self {
        Self::default()
    }

    /// The order containing only the `Default` group.
    pub fn default_group() -> Self {
        let mut order = Self::new();
        order.insert_group(Group::default_group());
        order
    }

    /// The order containing only the implicit `Default` sequence.
    pub fn default_sequence() -> Self {
        let mut order = Self::new();
        order.insert_sequence(Arc::new(Sequence::default_sequence()));
        order
    }

    /// Add a standalone group; returns `false` if it was already present.
    pub fn insert_group(&mut self, group: Group) -> bool {
        self.groups.insert(group)
    }

    /// Add a sequence unless one with the same id is present.
    pub fn insert_sequence(&mut self, sequence: Arc<Sequence>) {
        self.sequences
            .entry(sequence.id().clone())
            .or_insert(sequence);
    }

    /// Standalone groups in order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    /// Sequences in order.
    pub fn sequences(&self) -> impl Iterator<Item = &Arc<Sequence>> {
        self.sequences.values()
    }

    /// Check that a redefined default sequence can stand in for `Default`
    /// inside every requested sequence.
    ///
    /// Where a sequence contains `Default` at position `d`, a group of the
    /// redefinition that also occurs in the sequence must sit right next to
    /// `Default`: the first group of the redefinition at `d - 1`, the last
    /// at `d + 1`. Anything else would validate a group twice or out of
    /// order.
    pub fn assert_default_group_sequence_is_expandable(
        &self,
        default_sequence: &[Group],
    ) -> GroupResult<()> {
        let last = default_sequence.len().saturating_sub(1);

        for sequence in self.sequences.values() {
            let Some(default_index) = sequence.index_of(&Group::default_group()) else {
                continue;
            };

            for (i, group) in default_sequence.iter().enumerate() {
                if group.is_default() {
                    continue;
                }
                let Some(index) = sequence.index_of(group) else {
                    continue;
                };
                let before_default = i == 0 && default_index.checked_sub(1) == Some(index);
                let after_default = i == last && index == default_index + 1;
                if before_default || after_default {
                    continue;
                }
                return Err(GroupError::UnexpandableDefaultSequence {
                    default_sequence: default_sequence.to_vec(),
                    sequence: sequence.composing_groups().to_vec(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(names: &[&str]) -> Vec<Group> {
        names.iter().map(|n| Group::new(n)).collect()
    }

    fn order_with(sequence: &[&str]) -> ValidationOrder {
        let mut order = ValidationOrder::new();
        order.insert_sequence(Arc::new(Sequence::new(Group::new("Seq"), groups(sequence))));
        order
    }

    #[test]
    fn test_duplicates_ignored() {
        let mut order = ValidationOrder::new();
        assert!(order.insert_group(Group::new("A")));
        assert!(!order.insert_group(Group::new("A")));
        order.insert_group(Group::new("B"));
        assert_eq!(order.groups().cloned().collect::<Vec<_>>(), groups(&["A", "B"]));

        order.insert_sequence(Arc::new(Sequence::new(Group::new("S"), groups(&["A"]))));
        order.insert_sequence(Arc::new(Sequence::new(Group::new("S"), groups(&["B"]))));
        assert_eq!(order.sequences().count(), 1);
    }

    #[test]
    fn test_expandable_default_sequence() {
        let order = order_with(&["A", "Default", "B"]);
        assert!(order
            .assert_default_group_sequence_is_expandable(&groups(&["A", "Default", "B"]))
            .is_ok());
        assert!(order
            .assert_default_group_sequence_is_expandable(&groups(&["Default", "Other"]))
            .is_ok());
    }

    #[test]
    fn test_unexpandable_default_sequence() {
        let order = order_with(&["A", "Default", "B"]);
        let err = order
            .assert_default_group_sequence_is_expandable(&groups(&["B", "Default"]))
            .unwrap_err();
        assert!(matches!(err, GroupError::UnexpandableDefaultSequence { .. }));
    }

    #[test]
    fn test_sequence_without_default_is_ignored() {
        let order = order_with(&["A", "B"]);
        assert!(order
            .assert_default_group_sequence_is_expandable(&groups(&["B", "Default", "A"]))
            .is_ok());
    }
}
