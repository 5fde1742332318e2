//! Registry of type declarations.

use crate::metadata::bean::{BeanMetadata, PropertyMetadata};
use crate::metadata::declaration::TypeDeclaration;
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Source of resolved metadata for the validation engine.
pub trait MetadataProvider: Send + Sync {
    /// Resolved metadata of `type_name`, or `None` for unknown types.
    fn bean_metadata(&self, type_name: &str) -> Option<Arc<BeanMetadata>>;
}

/// Registry for all declared types.
///
/// Declarations can be registered in any order; inheritance is merged the
/// first time a type is looked up and the result is cached until the next
/// registration.
pub struct MetadataRegistry {
    /// Declarations indexed by type name.
    declarations: IndexMap<String, Arc<TypeDeclaration>>,
    /// Resolved metadata.
    resolved: RwLock<HashMap<String, Arc<BeanMetadata>>>,
}

impl MetadataRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            declarations: IndexMap::new(),
            resolved: RwLock::new(HashMap::new()),
        }
    }

    /// Register a declaration, replacing any previous one for the same type.
    pub fn register(&mut self, declaration: TypeDeclaration) {
        log::debug!("Registering constraints for type {}", declaration.type_name());
        self.declarations
            .insert(declaration.type_name().to_string(), Arc::new(declaration));
        self.resolved.write().clear();
    }

    /// Builder-style [`Self::register`].
    pub fn with_type(mut self, declaration: TypeDeclaration) -> Self {
        self.register(declaration);
        self
    }

    /// Check if a type is declared.
    pub fn contains(&self, type_name: &str) -> bool {
        self.declarations.contains_key(type_name)
    }

    /// Get all declared type names.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.declarations.keys().map(String::as_str)
    }

    /// Get the number of declared types.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    fn collect_hierarchy(&self, type_name: &str, into: &mut IndexSet<String>) {
        let Some(declaration) = self.declarations.get(type_name) else {
            return;
        };
        if !into.insert(type_name.to_string()) {
            return;
        }
        for supertype in declaration.supertypes() {
            self.collect_hierarchy(supertype, into);
        }
    }

    fn resolve(&self, type_name: &str) -> Option<BeanMetadata> {
        let own = self.declarations.get(type_name)?;

        let mut hierarchy = IndexSet::new();
        self.collect_hierarchy(type_name, &mut hierarchy);
        let declarations: Vec<&Arc<TypeDeclaration>> = hierarchy
            .iter()
            .filter_map(|t| self.declarations.get(t))
            .collect();

        let direct_constraints = own.constraints().cloned().collect();
        let mut seen = IndexSet::new();
        let constraints = declarations
            .iter()
            .flat_map(|d| d.constraints())
            .filter(|c| seen.insert(c.id()))
            .cloned()
            .collect();

        let mut properties: IndexMap<String, PropertyMetadata> = IndexMap::new();
        let mut executables = IndexMap::new();
        for declaration in &declarations {
            for (name, declared) in &declaration.properties {
                let merged = properties
                    .entry(name.clone())
                    .or_insert_with(|| PropertyMetadata {
                        name: name.clone(),
                        constraints: Vec::new(),
                        cascadable: None,
                    });
                merged.constraints.extend(declared.constraints.iter().cloned());
                if merged.cascadable.is_none() {
                    merged.cascadable = declared.cascadable.clone();
                }
            }
            for (name, executable) in &declaration.executables {
                executables
                    .entry(name.clone())
                    .or_insert_with(|| Arc::clone(executable));
            }
        }

        let cascadables = properties
            .values()
            .filter_map(|p| p.cascadable.clone())
            .collect();

        Some(BeanMetadata {
            type_name: type_name.to_string(),
            is_interface: own.is_interface,
            class_hierarchy: hierarchy.into_iter().collect(),
            direct_constraints,
            constraints,
            properties,
            cascadables,
            default_sequence: own.default_sequence.clone(),
            executables,
        })
    }
}

impl Default for MetadataRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataProvider for MetadataRegistry {
    fn bean_metadata(&self, type_name: &str) -> Option<Arc<BeanMetadata>> {
        if let Some(metadata) = self.resolved.read().get(type_name) {
            return Some(Arc::clone(metadata));
        }

        let metadata = Arc::new(self.resolve(type_name)?);
        log::trace!(
            "Resolved metadata for {} ({} constraints, {} cascadables)",
            type_name,
            metadata.meta_constraints().len(),
            metadata.cascadables().len()
        );
        let mut resolved = self.resolved.write();
        Some(Arc::clone(
            resolved.entry(type_name.to_string()).or_insert(metadata),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::constraint::ConstraintDescriptor;

    fn not_null() -> crate::metadata::constraint::ConstraintDescriptorBuilder {
        ConstraintDescriptor::builder("NotNull")
    }

    fn registry() -> MetadataRegistry {
        MetadataRegistry::new()
            .with_type(
                TypeDeclaration::builder("Employee")
                    .extends("Person")
                    .extends("Named")
                    .property("salary", |p| p.constraint(not_null()))
                    .build(),
            )
            .with_type(
                TypeDeclaration::builder("Person")
                    .property("address", |p| p.valid())
                    .property("salary", |p| p.constraint(not_null()))
                    .method("rename", |m| m.parameter(|p| p.constraint(not_null())))
                    .build(),
            )
            .with_type(
                TypeDeclaration::builder("Named")
                    .interface()
                    .property("name", |p| p.constraint(not_null()))
                    .build(),
            )
    }

    #[test]
    fn test_hierarchy_is_merged() {
        let registry = registry();
        let employee = registry.bean_metadata("Employee").unwrap();

        assert_eq!(employee.class_hierarchy(), &["Employee", "Person", "Named"]);
        assert_eq!(employee.direct_meta_constraints().len(), 1);
        assert_eq!(employee.meta_constraints().len(), 3);
        assert_eq!(employee.property("salary").unwrap().constraints().len(), 2);
        assert_eq!(employee.cascadables().len(), 1);
        assert!(employee.executable("rename").is_some());
        assert!(!employee.is_interface());
        assert!(registry.bean_metadata("Named").unwrap().is_interface());
    }

    #[test]
    fn test_inherited_constraints_are_shared() {
        let registry = registry();
        let employee = registry.bean_metadata("Employee").unwrap();
        let person = registry.bean_metadata("Person").unwrap();

        let inherited = &person.direct_meta_constraints()[0];
        assert!(employee
            .meta_constraints()
            .iter()
            .any(|c| Arc::ptr_eq(c, inherited)));
    }

    #[test]
    fn test_resolution_is_cached_and_invalidated() {
        let mut registry = registry();
        let first = registry.bean_metadata("Person").unwrap();
        let second = registry.bean_metadata("Person").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        registry.register(TypeDeclaration::builder("Other").build());
        let third = registry.bean_metadata("Person").unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_unknown_type() {
        assert!(registry().bean_metadata("Unknown").is_none());
        assert!(!registry().contains("Unknown"));
    }
}
