//! Builds [`ValidationOrder`]s from requested groups.
//!
//! Resolved sequences are cached for the lifetime of the generator, which
//! is shared by every validation call of a validator.

use crate::core::error::{GroupError, GroupResult};
use crate::core::group::{Group, GroupCatalog};
use crate::groups::order::ValidationOrder;
use crate::groups::sequence::Sequence;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Turns requested groups into a validation order.
#[derive(Debug)]
pub struct ValidationOrderGenerator {
    catalog: Arc<GroupCatalog>,
    resolved: RwLock<HashMap<Group, Arc<Sequence>>>,
}

impl ValidationOrderGenerator {
    /// Create a generator over a group catalog.
    pub fn new(catalog: Arc<GroupCatalog>) -> Self {
        Self {
            catalog,
            resolved: RwLock::new(HashMap::new()),
        }
    }

    /// The catalog the generator resolves against.
    pub fn catalog(&self) -> &GroupCatalog {
        &self.catalog
    }

    /// Build the order for the groups requested by a caller.
    ///
    /// No groups means `Default`. Plain groups are followed by the groups
    /// they inherit from; sequences are resolved and expanded.
    pub fn validation_order(&self, groups: &[Group]) -> GroupResult<ValidationOrder> {
        if groups.iter().any(Group::is_blank) {
            return Err(GroupError::NullGroup);
        }
        if groups.is_empty() || (groups.len() == 1 && groups[0].is_default()) {
            return Ok(ValidationOrder::default_group());
        }

        let mut order = ValidationOrder::new();
        for group in groups {
            if group.is_default() {
                order.insert_group(group.clone());
            } else if self.catalog.is_sequence(group) {
                order.insert_sequence(self.sequence(group)?);
            } else {
                order.insert_group(group.clone());
                self.insert_inherited_groups(group, &mut order);
            }
        }

        log::trace!("Validation order for {:?}: {:?}", groups, order);
        Ok(order)
    }

    /// Build the order for a single group reached through a cascade.
    ///
    /// With `expand` (the group came from a group conversion) the group is
    /// treated like a caller request; otherwise it is used as is.
    pub fn validation_order_for_group(
        &self,
        group: &Group,
        expand: bool,
    ) -> GroupResult<ValidationOrder> {
        if group.is_default() {
            return Ok(ValidationOrder::default_group());
        }
        if expand {
            return self.validation_order(std::slice::from_ref(group));
        }
        let mut order = ValidationOrder::new();
        order.insert_group(group.clone());
        Ok(order)
    }

    /// Build the order for a type's redefined default sequence.
    pub fn default_validation_order(
        &self,
        type_name: &str,
        default_sequence: &[Group],
    ) -> GroupResult<ValidationOrder> {
        let mut sequence = Sequence::new(Group::new(type_name), default_sequence.to_vec());
        sequence.expand_inherited_groups(&self.catalog)?;
        let mut order = ValidationOrder::new();
        order.insert_sequence(Arc::new(sequence));
        Ok(order)
    }

    fn insert_inherited_groups(&self, group: &Group, order: &mut ValidationOrder) {
        for parent in self.catalog.parents(group) {
            if order.insert_group(parent.clone()) {
                self.insert_inherited_groups(parent, order);
            }
        }
    }

    fn sequence(&self, id: &Group) -> GroupResult<Arc<Sequence>> {
        if let Some(sequence) = self.resolved.read().get(id) {
            return Ok(Arc::clone(sequence));
        }

        let mut stack = Vec::new();
        let groups = self.resolve_sequence(id, &mut stack)?;
        let mut sequence = Sequence::new(id.clone(), groups);
        sequence.expand_inherited_groups(&self.catalog)?;

        let sequence = Arc::new(sequence);
        let mut resolved = self.resolved.write();
        Ok(Arc::clone(
            resolved.entry(id.clone()).or_insert(sequence),
        ))
    }

    fn resolve_sequence(&self, id: &Group, stack: &mut Vec<Group>) -> GroupResult<Vec<Group>> {
        if stack.contains(id) {
            return Err(GroupError::CyclicDefinition { group: id.clone() });
        }
        stack.push(id.clone());

        let mut resolved = Vec::new();
        for member in self.catalog.sequence_members(id).unwrap_or_default() {
            if self.catalog.is_sequence(member) {
                let nested = self.resolve_sequence(member, stack)?;
                add_groups(id, &mut resolved, &nested)?;
            } else {
                add_groups(id, &mut resolved, std::slice::from_ref(member))?;
            }
        }

        stack.pop();
        Ok(resolved)
    }
}

/// Append `groups`, rejecting any group already present before the end.
fn add_groups(sequence: &Group, resolved: &mut Vec<Group>, groups: &[Group]) -> GroupResult<()> {
    for group in groups {
        match resolved.iter().position(|g| g == group) {
            Some(index) if index + 1 < resolved.len() => {
                return Err(GroupError::UnexpandableSequence {
                    sequence: sequence.clone(),
                    group: group.clone(),
                });
            }
            Some(_) => {}
            None => resolved.push(group.clone()),
        }
    }
    Ok(())
}
