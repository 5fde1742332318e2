//! Builders that declare constraints on types.
//!
//! Every element kind (property, parameter, return value) is described with
//! the same [`ElementBuilder`]; the enclosing type or executable builder
//! decides where the accumulated constraints are placed.
//!
//! ```rust,ignore
//! let person = TypeDeclaration::builder("Person")
//!     .property("name", |p| p.constraint(builtin::not_blank()))
//!     .property("address", |p| p.valid().of_type("Address"))
//!     .build();
//! ```

use crate::core::group::Group;
use crate::metadata::bean::{Cascadable, CascadeTarget, DefaultGroupSequence, DefaultGroupSequenceProvider};
use crate::metadata::constraint::{
    ConstraintDescriptor, ConstraintDescriptorBuilder, ConstraintKind, ConstraintLocation,
    MetaConstraint,
};
use crate::metadata::executable::{ExecutableKind, ExecutableMetadata, ParameterMetadata};
use indexmap::IndexMap;
use std::sync::Arc;

/// Accumulates what is declared on one element.
#[derive(Default)]
pub struct ElementBuilder {
    name: Option<String>,
    constraints: Vec<Arc<ConstraintDescriptor>>,
    element_constraints: Vec<Arc<ConstraintDescriptor>>,
    cascading: bool,
    group_conversions: IndexMap<Group, Group>,
    declared_type: Option<String>,
    getter: bool,
}

impl ElementBuilder {
    /// Add a constraint.
    pub fn constraint(mut self, constraint: ConstraintDescriptorBuilder) -> Self {
        self.constraints.push(Arc::new(constraint.build()));
        self
    }

    /// Add a constraint checked against each element of a list, set, array
    /// or map value (map values, not keys).
    pub fn element_constraint(mut self, constraint: ConstraintDescriptorBuilder) -> Self {
        self.element_constraints.push(Arc::new(constraint.build()));
        self
    }

    /// Cascade validation into the element's value.
    pub fn valid(mut self) -> Self {
        self.cascading = true;
        self
    }

    /// When cascading in group `from`, validate the nested object in `to`.
    pub fn convert_group(mut self, from: impl Into<Group>, to: impl Into<Group>) -> Self {
        self.group_conversions.insert(from.into(), to.into());
        self
    }

    /// Declared type of the element's value.
    ///
    /// Needed to resolve paths through the element when no instance exists.
    pub fn of_type(mut self, type_name: impl Into<String>) -> Self {
        self.declared_type = Some(type_name.into());
        self
    }

    /// Constraints are declared on an accessor rather than a field.
    pub fn getter(mut self) -> Self {
        self.getter = true;
        self
    }

    /// Name used in paths (parameters only; defaults to `argN`).
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn place(&self, location: ConstraintLocation) -> Vec<Arc<MetaConstraint>> {
        place_all(&self.constraints, &location)
    }

    fn cascadable(
        &self,
        target: CascadeTarget,
        location: &ConstraintLocation,
    ) -> Option<Cascadable> {
        if !self.cascading && self.element_constraints.is_empty() {
            return None;
        }
        let element_location = ConstraintLocation {
            kind: ConstraintKind::ContainerElement,
            ..location.clone()
        };
        let cascadable = Cascadable::new(
            target,
            self.group_conversions.clone(),
            self.declared_type.clone(),
        )
        .with_cascading(self.cascading)
        .with_element_constraints(place_all(&self.element_constraints, &element_location));
        Some(cascadable)
    }
}

fn place_all(
    descriptors: &[Arc<ConstraintDescriptor>],
    location: &ConstraintLocation,
) -> Vec<Arc<MetaConstraint>> {
    descriptors
        .iter()
        .map(|descriptor| Arc::new(MetaConstraint::new(location.clone(), Arc::clone(descriptor))))
        .collect()
}

/// Constraints declared on one property of one type.
#[derive(Debug, Clone, Default)]
pub(crate) struct PropertyDeclaration {
    pub(crate) constraints: Vec<Arc<MetaConstraint>>,
    pub(crate) cascadable: Option<Cascadable>,
}

/// Everything one type declares, before inheritance is merged in.
#[derive(Debug)]
pub struct TypeDeclaration {
    pub(crate) type_name: String,
    pub(crate) is_interface: bool,
    pub(crate) supertypes: Vec<String>,
    pub(crate) type_constraints: Vec<Arc<MetaConstraint>>,
    pub(crate) properties: IndexMap<String, PropertyDeclaration>,
    pub(crate) default_sequence: Option<DefaultGroupSequence>,
    pub(crate) executables: IndexMap<String, Arc<ExecutableMetadata>>,
}

impl TypeDeclaration {
    /// Start declaring a type.
    pub fn builder(type_name: impl Into<String>) -> TypeDeclarationBuilder {
        TypeDeclarationBuilder::new(type_name)
    }

    /// Type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Declared supertypes.
    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    /// Constraints declared by this type: class-level first, then properties.
    pub fn constraints(&self) -> impl Iterator<Item = &Arc<MetaConstraint>> {
        self.type_constraints
            .iter()
            .chain(self.properties.values().flat_map(|p| p.constraints.iter()))
    }
}

/// Builder for [`TypeDeclaration`].
pub struct TypeDeclarationBuilder {
    declaration: TypeDeclaration,
}

impl TypeDeclarationBuilder {
    /// Create a builder for `type_name`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            declaration: TypeDeclaration {
                type_name: type_name.into(),
                is_interface: false,
                supertypes: Vec::new(),
                type_constraints: Vec::new(),
                properties: IndexMap::new(),
                default_sequence: None,
                executables: IndexMap::new(),
            },
        }
    }

    /// Mark the type as an interface.
    pub fn interface(mut self) -> Self {
        self.declaration.is_interface = true;
        self
    }

    /// Add a supertype (superclass or implemented interface).
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.declaration.supertypes.push(supertype.into());
        self
    }

    /// Add a class-level constraint.
    pub fn constraint(mut self, constraint: ConstraintDescriptorBuilder) -> Self {
        let location = ConstraintLocation::for_type(self.declaration.type_name.clone());
        self.declaration
            .type_constraints
            .push(Arc::new(MetaConstraint::new(location, Arc::new(constraint.build()))));
        self
    }

    /// Declare constraints on a property.
    pub fn property<F>(mut self, name: impl Into<String>, declare: F) -> Self
    where
        F: FnOnce(ElementBuilder) -> ElementBuilder,
    {
        let name = name.into();
        let element = declare(ElementBuilder::default());
        let kind = if element.getter {
            ConstraintKind::Property
        } else {
            ConstraintKind::Field
        };
        let location =
            ConstraintLocation::for_property(self.declaration.type_name.clone(), name.clone(), kind);

        let property = self.declaration.properties.entry(name.clone()).or_default();
        property.constraints.extend(element.place(location.clone()));
        if property.cascadable.is_none() {
            property.cascadable = element.cascadable(CascadeTarget::Property(name), &location);
        }
        self
    }

    /// Redefine the `Default` group of this type.
    ///
    /// The type's own name stands for its `Default` constraints and must be
    /// part of the sequence.
    pub fn default_group_sequence<I, G>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<Group>,
    {
        let groups = groups.into_iter().map(Into::into).collect();
        self.declaration.default_sequence = Some(DefaultGroupSequence::Static(groups));
        self
    }

    /// Compute the `Default` group of this type per instance.
    pub fn default_group_sequence_provider<P>(mut self, provider: P) -> Self
    where
        P: DefaultGroupSequenceProvider + 'static,
    {
        self.declaration.default_sequence = Some(DefaultGroupSequence::Dynamic(Arc::new(provider)));
        self
    }

    /// Declare constraints on a method.
    pub fn method<F>(self, name: impl Into<String>, declare: F) -> Self
    where
        F: FnOnce(ExecutableBuilder) -> ExecutableBuilder,
    {
        self.executable(name.into(), ExecutableKind::Method, declare)
    }

    /// Declare constraints on a constructor.
    pub fn constructor<F>(self, name: impl Into<String>, declare: F) -> Self
    where
        F: FnOnce(ExecutableBuilder) -> ExecutableBuilder,
    {
        self.executable(name.into(), ExecutableKind::Constructor, declare)
    }

    fn executable<F>(mut self, name: String, kind: ExecutableKind, declare: F) -> Self
    where
        F: FnOnce(ExecutableBuilder) -> ExecutableBuilder,
    {
        let builder = declare(ExecutableBuilder::default());
        let metadata = builder.finish(&self.declaration.type_name, name.clone(), kind);
        self.declaration.executables.insert(name, Arc::new(metadata));
        self
    }

    /// Finish the declaration.
    pub fn build(self) -> TypeDeclaration {
        self.declaration
    }
}

/// Accumulates what is declared on a method or constructor.
#[derive(Default)]
pub struct ExecutableBuilder {
    parameters: Vec<ElementBuilder>,
    cross_parameter: Vec<Arc<ConstraintDescriptor>>,
    return_value: ElementBuilder,
}

impl ExecutableBuilder {
    /// Declare the next parameter.
    pub fn parameter<F>(mut self, declare: F) -> Self
    where
        F: FnOnce(ElementBuilder) -> ElementBuilder,
    {
        self.parameters.push(declare(ElementBuilder::default()));
        self
    }

    /// Add a constraint on the parameter list as a whole.
    pub fn cross_parameter_constraint(mut self, constraint: ConstraintDescriptorBuilder) -> Self {
        self.cross_parameter.push(Arc::new(constraint.build()));
        self
    }

    /// Declare constraints on the return value.
    pub fn returns<F>(mut self, declare: F) -> Self
    where
        F: FnOnce(ElementBuilder) -> ElementBuilder,
    {
        self.return_value = declare(self.return_value);
        self
    }

    fn finish(self, type_name: &str, name: String, kind: ExecutableKind) -> ExecutableMetadata {
        let location = |kind: ConstraintKind, index: Option<usize>| {
            ConstraintLocation::for_executable(type_name, name.clone(), kind, index)
        };

        let parameters: Vec<ParameterMetadata> = self
            .parameters
            .iter()
            .enumerate()
            .map(|(index, element)| {
                let param_name = element
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("arg{}", index));
                let parameter_location = location(ConstraintKind::Parameter, Some(index));
                let target = CascadeTarget::Parameter {
                    index,
                    name: param_name.clone(),
                };
                ParameterMetadata {
                    index,
                    constraints: element.place(parameter_location.clone()),
                    cascadable: element.cascadable(target, &parameter_location),
                    name: param_name,
                }
            })
            .collect();

        let cross_location = location(ConstraintKind::CrossParameter, None);
        let cross_parameter_constraints = self
            .cross_parameter
            .iter()
            .map(|descriptor| {
                Arc::new(MetaConstraint::new(cross_location.clone(), Arc::clone(descriptor)))
            })
            .collect();

        let return_location = location(ConstraintKind::ReturnValue, None);
        let return_value_constraints = self.return_value.place(return_location.clone());
        let return_value_cascadables = self
            .return_value
            .cascadable(CascadeTarget::ReturnValue, &return_location)
            .into_iter()
            .collect();
        let parameter_cascadables = parameters
            .iter()
            .filter_map(|p| p.cascadable.clone())
            .collect();

        ExecutableMetadata {
            name: name.clone(),
            kind,
            declaring_type: type_name.to_string(),
            parameters,
            cross_parameter_constraints,
            return_value_constraints,
            parameter_cascadables,
            return_value_cascadables,
        }
    }
}
