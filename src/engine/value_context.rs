//! The traversal cursor.

use crate::core::group::Group;
use crate::core::path::{ElementKind, Path, PathNode};
use crate::core::types::Value;
use crate::metadata::bean::{BeanMetadata, Cascadable};
use crate::metadata::executable::ExecutableMetadata;
use std::sync::Arc;

/// The metadata whose cascading relations the cursor follows.
#[derive(Debug, Clone)]
pub enum Validatable {
    /// Properties of a bean
    Bean(Arc<BeanMetadata>),
    /// Arguments of an executable call
    Parameters(Arc<ExecutableMetadata>),
    /// Return value of an executable call
    ReturnValue(Arc<ExecutableMetadata>),
    /// Nothing to cascade into
    Unconstrained,
}

impl Validatable {
    /// Relations to cascade into.
    pub fn cascadables(&self) -> &[Cascadable] {
        match self {
            Validatable::Bean(metadata) => metadata.cascadables(),
            Validatable::Parameters(executable) => executable.parameter_cascadables(),
            Validatable::ReturnValue(executable) => executable.return_value_cascadables(),
            Validatable::Unconstrained => &[],
        }
    }
}

/// Where the traversal currently is.
///
/// Holds the object hosting the element under test (absent when a bare value
/// is validated against a type), its metadata, the current path and group,
/// and the value the next constraint is evaluated against.
#[derive(Debug, Clone)]
pub struct ValueContext {
    current_bean: Option<Value>,
    current_type: String,
    validatable: Validatable,
    path: Path,
    group: Group,
    validated_value: Value,
    element_kind: ElementKind,
    depth: usize,
}

impl ValueContext {
    /// A cursor positioned on a bean.
    pub fn for_bean(bean: Value, metadata: Arc<BeanMetadata>, path: Path) -> Self {
        Self {
            current_type: metadata.type_name().to_string(),
            validated_value: bean.clone(),
            current_bean: Some(bean),
            validatable: Validatable::Bean(metadata),
            path,
            group: Group::default_group(),
            element_kind: ElementKind::Bean,
            depth: 0,
        }
    }

    /// A cursor for a value checked against a type, without an instance.
    pub fn for_value(metadata: Arc<BeanMetadata>, path: Path, value: Value) -> Self {
        Self {
            current_type: metadata.type_name().to_string(),
            current_bean: None,
            validatable: Validatable::Bean(metadata),
            path,
            group: Group::default_group(),
            validated_value: value,
            element_kind: ElementKind::Property,
            depth: 0,
        }
    }

    /// A cursor for executable arguments or return values.
    pub fn for_executable(
        host: Option<Value>,
        type_name: &str,
        validatable: Validatable,
        path: Path,
    ) -> Self {
        Self {
            current_type: type_name.to_string(),
            validated_value: host.clone().unwrap_or(Value::Null),
            current_bean: host,
            validatable,
            path,
            group: Group::default_group(),
            element_kind: ElementKind::Bean,
            depth: 0,
        }
    }

    /// Set the cascade depth.
    pub fn at_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Object hosting the element under test.
    pub fn current_bean(&self) -> Option<&Value> {
        self.current_bean.as_ref()
    }

    /// Type of the hosting object.
    pub fn current_type(&self) -> &str {
        &self.current_type
    }

    /// Metadata driving cascades.
    pub fn validatable(&self) -> &Validatable {
        &self.validatable
    }

    /// Bean metadata, when the cursor is on a bean.
    pub fn bean_metadata(&self) -> Option<&Arc<BeanMetadata>> {
        match &self.validatable {
            Validatable::Bean(metadata) => Some(metadata),
            _ => None,
        }
    }

    /// Current path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current group.
    pub fn group(&self) -> &Group {
        &self.group
    }

    /// Value the next constraint is checked against.
    pub fn validated_value(&self) -> &Value {
        &self.validated_value
    }

    /// Kind of element under test.
    pub fn element_kind(&self) -> ElementKind {
        self.element_kind
    }

    /// Cascade depth from the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether the cursor validates the `Default` group.
    pub fn validating_default(&self) -> bool {
        self.group.is_default()
    }

    /// Move the cursor to `path`.
    pub fn set_path(&mut self, path: Path) {
        self.path = path;
    }

    /// Descend by one node.
    pub fn append_node(&mut self, node: PathNode) {
        self.path = self.path.append(node);
    }

    /// Switch the group being validated.
    pub fn set_group(&mut self, group: Group) {
        self.group = group;
    }

    /// Set the value the next constraint is checked against.
    pub fn set_validated_value(&mut self, value: Value) {
        self.validated_value = value;
    }

    /// Set the kind of element under test.
    pub fn set_element_kind(&mut self, kind: ElementKind) {
        self.element_kind = kind;
    }
}
