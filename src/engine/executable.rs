//! Validation of executable calls.
//!
//! Parameters are validated before the call: cross-parameter constraints
//! against the whole argument list, then each argument, then cascaded
//! arguments. Return values are validated after the call, cascading only
//! into non-null results.

use crate::core::error::{EngineError, EngineResult};
use crate::core::group::Group;
use crate::core::path::PathNode;
use crate::core::types::Value;
use crate::core::violation::ViolationSet;
use crate::engine::context::ValidationContext;
use crate::engine::traversal::Validator;
use crate::engine::value_context::{Validatable, ValueContext};
use crate::metadata::bean::BeanMetadata;
use crate::metadata::constraint::MetaConstraint;
use crate::metadata::executable::{ExecutableKind, ExecutableMetadata};
use std::sync::Arc;

impl Validator {
    /// Validate the arguments of a method call on `object`.
    pub fn validate_parameters(
        &self,
        object: &Value,
        method: &str,
        parameters: &[Value],
        groups: &[Group],
    ) -> EngineResult<ViolationSet> {
        let Some(bean) = object.as_bean() else {
            return Ok(ViolationSet::new());
        };
        self.validate_executable_parameters(Some(object), bean.type_name(), method, parameters, groups)
    }

    /// Validate the arguments of a constructor call.
    pub fn validate_constructor_parameters(
        &self,
        type_name: &str,
        constructor: &str,
        parameters: &[Value],
        groups: &[Group],
    ) -> EngineResult<ViolationSet> {
        self.validate_executable_parameters(None, type_name, constructor, parameters, groups)
    }

    /// Validate the value returned by a method call on `object`.
    ///
    /// Executables the type does not declare have no return value
    /// constraints and yield no violations.
    pub fn validate_return_value(
        &self,
        object: &Value,
        method: &str,
        return_value: &Value,
        groups: &[Group],
    ) -> EngineResult<ViolationSet> {
        let Some(bean) = object.as_bean() else {
            return Ok(ViolationSet::new());
        };
        self.validate_executable_return_value(
            Some(object),
            bean.type_name(),
            method,
            return_value,
            groups,
        )
    }

    /// Validate the object created by a constructor call.
    pub fn validate_constructor_return_value(
        &self,
        type_name: &str,
        constructor: &str,
        created: &Value,
        groups: &[Group],
    ) -> EngineResult<ViolationSet> {
        self.validate_executable_return_value(None, type_name, constructor, created, groups)
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    fn validate_executable_parameters(
        &self,
        object: Option<&Value>,
        type_name: &str,
        name: &str,
        parameters: &[Value],
        groups: &[Group],
    ) -> EngineResult<ViolationSet> {
        let order = self.generator.validation_order(groups)?;
        let Some(metadata) = self.metadata.bean_metadata(type_name) else {
            return Ok(ViolationSet::new());
        };
        let executable = metadata.executable(name).cloned().ok_or_else(|| {
            EngineError::ExecutableNotFound {
                type_name: type_name.to_string(),
                executable: name.to_string(),
            }
        })?;
        if parameters.len() != executable.parameters().len() {
            return Err(EngineError::ParameterCount {
                executable: name.to_string(),
                expected: executable.parameters().len(),
                actual: parameters.len(),
            });
        }

        log::debug!(
            "Validating {} parameters of {}.{} in groups {:?}",
            parameters.len(),
            type_name,
            name,
            groups
        );
        let mut ctx = self.context_builder().for_validate_parameters(
            object.cloned(),
            type_name,
            parameters.to_vec(),
        );
        self.assert_default_sequence_expandable(&metadata, object, &order)?;

        let call = ExecutableCall {
            object,
            metadata: &metadata,
            executable: &executable,
        };
        let mut cascade = ValueContext::for_executable(
            Some(Value::Array(parameters.to_vec())),
            type_name,
            Validatable::Parameters(Arc::clone(&executable)),
            executable.path(),
        );

        for group in order.groups() {
            self.validate_parameters_for_group(&mut ctx, &call, parameters, group)?;
            if ctx.should_fail_fast() {
                return Ok(ctx.into_violations());
            }
        }
        for group in order.groups() {
            cascade.set_group(group.clone());
            self.validate_cascaded_constraints(&mut ctx, &mut cascade)?;
            if ctx.should_fail_fast() {
                return Ok(ctx.into_violations());
            }
        }

        for sequence in order.sequences() {
            for step in sequence.iter() {
                let before = ctx.violation_count();
                for group in step.groups() {
                    self.validate_parameters_for_group(&mut ctx, &call, parameters, group)?;
                    if ctx.should_fail_fast() {
                        return Ok(ctx.into_violations());
                    }
                    cascade.set_group(group.clone());
                    self.validate_cascaded_constraints(&mut ctx, &mut cascade)?;
                    if ctx.should_fail_fast() {
                        return Ok(ctx.into_violations());
                    }
                }
                if ctx.violation_count() > before {
                    break;
                }
            }
        }

        Ok(ctx.into_violations())
    }

    fn validate_parameters_for_group(
        &self,
        ctx: &mut ValidationContext<'_>,
        call: &ExecutableCall<'_>,
        parameters: &[Value],
        group: &Group,
    ) -> EngineResult<()> {
        let executable = call.executable;
        let mut vc = ValueContext::for_executable(
            call.object.cloned(),
            call.metadata.type_name(),
            Validatable::Unconstrained,
            executable.path(),
        );

        for current in call.expand(group)? {
            let before = ctx.violation_count();
            vc.set_group(current);

            vc.set_path(executable.path().append(PathNode::cross_parameter()));
            vc.set_validated_value(Value::Array(parameters.to_vec()));
            self.validate_each(ctx, &mut vc, executable.cross_parameter_constraints())?;
            if ctx.should_fail_fast() {
                return Ok(());
            }

            for (parameter, argument) in executable.parameters().iter().zip(parameters) {
                let node = PathNode::parameter(parameter.name(), parameter.index());
                vc.set_path(executable.path().append(node));
                vc.set_validated_value(argument.clone());
                self.validate_each(ctx, &mut vc, parameter.constraints())?;
                if ctx.should_fail_fast() {
                    return Ok(());
                }
            }

            if ctx.violation_count() > before {
                break;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Return Values
    // ========================================================================

    fn validate_executable_return_value(
        &self,
        object: Option<&Value>,
        type_name: &str,
        name: &str,
        return_value: &Value,
        groups: &[Group],
    ) -> EngineResult<ViolationSet> {
        let order = self.generator.validation_order(groups)?;
        let Some(metadata) = self.metadata.bean_metadata(type_name) else {
            return Ok(ViolationSet::new());
        };
        let Some(executable) = metadata.executable(name).cloned() else {
            return Ok(ViolationSet::new());
        };

        log::debug!(
            "Validating return value of {}.{} in groups {:?}",
            type_name,
            name,
            groups
        );
        // A constructor's result is both the root and the host of its checks.
        let host = match executable.kind() {
            ExecutableKind::Constructor => Some(return_value),
            ExecutableKind::Method => object,
        };
        let mut ctx = self.context_builder().for_validate_return_value(
            host.cloned(),
            type_name,
            return_value.clone(),
        );
        self.assert_default_sequence_expandable(&metadata, host, &order)?;

        let call = ExecutableCall {
            object: host,
            metadata: &metadata,
            executable: &executable,
        };
        let mut cascade = ValueContext::for_executable(
            Some(return_value.clone()),
            type_name,
            Validatable::ReturnValue(Arc::clone(&executable)),
            executable.path(),
        );
        let cascading = !return_value.is_null();

        for group in order.groups() {
            self.validate_return_value_for_group(&mut ctx, &call, return_value, group)?;
            if ctx.should_fail_fast() {
                return Ok(ctx.into_violations());
            }
        }
        if cascading {
            for group in order.groups() {
                cascade.set_group(group.clone());
                self.validate_cascaded_constraints(&mut ctx, &mut cascade)?;
                if ctx.should_fail_fast() {
                    return Ok(ctx.into_violations());
                }
            }
        }

        for sequence in order.sequences() {
            for step in sequence.iter() {
                let before = ctx.violation_count();
                for group in step.groups() {
                    self.validate_return_value_for_group(&mut ctx, &call, return_value, group)?;
                    if ctx.should_fail_fast() {
                        return Ok(ctx.into_violations());
                    }
                    if cascading {
                        cascade.set_group(group.clone());
                        self.validate_cascaded_constraints(&mut ctx, &mut cascade)?;
                        if ctx.should_fail_fast() {
                            return Ok(ctx.into_violations());
                        }
                    }
                }
                if ctx.violation_count() > before {
                    break;
                }
            }
        }

        Ok(ctx.into_violations())
    }

    fn validate_return_value_for_group(
        &self,
        ctx: &mut ValidationContext<'_>,
        call: &ExecutableCall<'_>,
        return_value: &Value,
        group: &Group,
    ) -> EngineResult<()> {
        let executable = call.executable;
        let mut vc = ValueContext::for_executable(
            call.object.cloned(),
            call.metadata.type_name(),
            Validatable::Unconstrained,
            executable.path().append(PathNode::return_value()),
        );

        for current in call.expand(group)? {
            let before = ctx.violation_count();
            vc.set_group(current);
            vc.set_validated_value(return_value.clone());
            self.validate_each(ctx, &mut vc, executable.return_value_constraints())?;
            if ctx.should_fail_fast() {
                return Ok(());
            }
            if ctx.violation_count() > before {
                break;
            }
        }
        Ok(())
    }

    fn validate_each(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &mut ValueContext,
        constraints: &[Arc<MetaConstraint>],
    ) -> EngineResult<()> {
        let value = vc.validated_value().clone();
        for constraint in constraints {
            vc.set_validated_value(value.clone());
            self.validate_placed_constraint(ctx, vc, constraint)?;
            if ctx.should_fail_fast() {
                return Ok(());
            }
        }
        Ok(())
    }
}

/// The executable being validated and the object it is called on.
struct ExecutableCall<'a> {
    object: Option<&'a Value>,
    metadata: &'a BeanMetadata,
    executable: &'a ExecutableMetadata,
}

impl ExecutableCall<'_> {
    /// Groups to evaluate for `group`: `Default` stands for the declaring
    /// type's default sequence.
    fn expand(&self, group: &Group) -> EngineResult<Vec<Group>> {
        if group.is_default() {
            Ok(self.metadata.default_group_sequence(self.object)?)
        } else {
            Ok(vec![group.clone()])
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::constraints::builtin;
    use crate::core::error::{EngineError, GroupError};
    use crate::core::group::{Group, GroupCatalog};
    use crate::core::path::ElementKind;
    use crate::core::types::{Bean, Value};
    use crate::core::violation::ViolationSet;
    use crate::engine::traversal::Validator;
    use crate::metadata::constraint::{ConstraintDescriptor, ConstraintDescriptorBuilder, ValueType};
    use crate::metadata::declaration::TypeDeclaration;
    use crate::metadata::registry::MetadataRegistry;
    use std::sync::Arc;

    fn distinct_accounts() -> ConstraintDescriptorBuilder {
        ConstraintDescriptor::builder("DistinctAccounts")
            .message("source and target must differ")
            .validated_by("DistinctAccountsValidator", ValueType::Array, |value, _| {
                Ok(value.element_at(0) != value.element_at(1))
            })
    }

    fn validator() -> Validator {
        let registry = MetadataRegistry::new()
            .with_type(
                TypeDeclaration::builder("Person")
                    .property("name", |p| p.constraint(builtin::not_null()))
                    .constructor("Person", |c| c.returns(|r| r.valid().of_type("Person")))
                    .build(),
            )
            .with_type(
                TypeDeclaration::builder("Bank")
                    .method("transfer", |m| {
                        m.parameter(|p| p.constraint(builtin::not_null()))
                            .parameter(|p| p.constraint(builtin::not_null()))
                            .parameter(|p| p.named("amount").constraint(builtin::positive()))
                            .cross_parameter_constraint(distinct_accounts())
                    })
                    .method("save", |m| m.parameter(|p| p.valid().of_type("Person")))
                    .method("find", |m| {
                        m.parameter(|p| p)
                            .returns(|r| r.constraint(builtin::not_null()).valid().of_type("Person"))
                    })
                    .method("tag", |m| {
                        m.parameter(|p| p.element_constraint(builtin::not_blank()))
                            .returns(|r| r.element_constraint(builtin::min(0)))
                    })
                    .constructor("Bank", |c| c.parameter(|p| p.constraint(builtin::min(0))))
                    .build(),
            );
        Validator::new(Arc::new(registry), Arc::new(GroupCatalog::new()))
    }

    fn paths(violations: &ViolationSet) -> Vec<String> {
        violations
            .iter()
            .map(|v| v.property_path().to_string())
            .collect()
    }

    fn bank() -> Value {
        Value::Object(Bean::new("Bank"))
    }

    #[test]
    fn test_parameter_paths() {
        let bank = bank();
        let arguments = [Value::Null, Value::string("b"), Value::Integer(-5)];
        let violations = validator()
            .validate_parameters(&bank, "transfer", &arguments, &[])
            .unwrap();
        assert_eq!(paths(&violations), vec!["transfer.arg0", "transfer.amount"]);

        let violation = &violations[0];
        assert_eq!(violation.element_kind(), ElementKind::Parameter);
        assert_eq!(violation.executable_parameters(), Some(&arguments[..]));
        assert_eq!(violation.root_bean(), Some(&bank));
        assert_eq!(violation.leaf_bean(), Some(&bank));
    }

    #[test]
    fn test_cross_parameter_constraint() {
        let arguments = [Value::string("a"), Value::string("a"), Value::Integer(5)];
        let violations = validator()
            .validate_parameters(&bank(), "transfer", &arguments, &[])
            .unwrap();
        assert_eq!(paths(&violations), vec!["transfer.<cross-parameter>"]);

        let violation = &violations[0];
        assert_eq!(violation.element_kind(), ElementKind::CrossParameter);
        assert_eq!(violation.invalid_value(), &Value::Array(arguments.to_vec()));
        assert_eq!(violation.message(), "source and target must differ");
    }

    #[test]
    fn test_fail_fast_stops_at_cross_parameter() {
        let arguments = [Value::Null, Value::Null, Value::Integer(-5)];
        let violations = validator()
            .with_fail_fast(true)
            .validate_parameters(&bank(), "transfer", &arguments, &[])
            .unwrap();
        assert_eq!(paths(&violations), vec!["transfer.<cross-parameter>"]);
    }

    #[test]
    fn test_cascaded_parameter() {
        let person = Value::Object(Bean::new("Person"));
        let violations = validator()
            .validate_parameters(&bank(), "save", &[person], &[])
            .unwrap();
        assert_eq!(paths(&violations), vec!["save.arg0.name"]);
    }

    #[test]
    fn test_parameter_errors() {
        let validator = validator();
        let err = validator
            .validate_parameters(&bank(), "transfer", &[Value::Null], &[])
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::ParameterCount {
                expected: 3,
                actual: 1,
                ..
            }
        ));

        let err = validator
            .validate_parameters(&bank(), "close", &[], &[])
            .unwrap_err();
        assert!(matches!(err, EngineError::ExecutableNotFound { .. }));
    }

    #[test]
    fn test_return_value() {
        let validator = validator();
        let violations = validator
            .validate_return_value(&bank(), "find", &Value::Null, &[])
            .unwrap();
        assert_eq!(paths(&violations), vec!["find.<return value>"]);
        assert_eq!(violations[0].element_kind(), ElementKind::ReturnValue);
        assert_eq!(violations[0].executable_return_value(), Some(&Value::Null));

        let found = Value::Object(Bean::new("Person"));
        let violations = validator
            .validate_return_value(&bank(), "find", &found, &[])
            .unwrap();
        assert_eq!(paths(&violations), vec!["find.<return value>.name"]);
        assert_eq!(violations[0].leaf_bean(), Some(&found));
    }

    #[test]
    fn test_undeclared_return_value_is_unconstrained() {
        let violations = validator()
            .validate_return_value(&bank(), "close", &Value::Null, &[])
            .unwrap();
        assert!(violations.is_empty());
    }

    #[test]
    fn test_constructor_parameters() {
        let violations = validator()
            .validate_constructor_parameters("Bank", "Bank", &[Value::Integer(-1)], &[])
            .unwrap();
        assert_eq!(paths(&violations), vec!["Bank.arg0"]);
        assert_eq!(violations[0].root_bean(), None);
        assert_eq!(violations[0].root_type(), "Bank");
    }

    #[test]
    fn test_constructor_return_value() {
        let created = Value::Object(Bean::new("Person"));
        let violations = validator()
            .validate_constructor_return_value("Person", "Person", &created, &[])
            .unwrap();
        assert_eq!(paths(&violations), vec!["Person.<return value>.name"]);
        assert_eq!(violations[0].root_bean(), Some(&created));
    }

    #[test]
    fn test_element_constraints_on_arguments_and_results() {
        let labels = Value::List(vec![Value::string("savings"), Value::string("")]);
        let violations = validator()
            .validate_parameters(&bank(), "tag", &[labels], &[])
            .unwrap();
        assert_eq!(paths(&violations), vec!["tag.arg0[1]"]);
        assert_eq!(violations[0].element_kind(), ElementKind::ContainerElement);

        let mut balances = indexmap::IndexMap::new();
        balances.insert("eur".to_string(), Value::Integer(-3));
        let violations = validator()
            .validate_return_value(&bank(), "tag", &Value::Map(balances), &[])
            .unwrap();
        assert_eq!(paths(&violations), vec!["tag.<return value>[eur]"]);
        assert_eq!(violations[0].invalid_value(), &Value::Integer(-3));
    }

    fn ledger_validator() -> Validator {
        let registry = MetadataRegistry::new().with_type(
            TypeDeclaration::builder("Ledger")
                .property("id", |p| p.constraint(builtin::not_null()))
                .method("post", |m| {
                    m.parameter(|p| p.constraint(builtin::not_null()))
                        .returns(|r| r.constraint(builtin::not_null()))
                })
                .constructor("Ledger", |c| c.parameter(|p| p.constraint(builtin::min(0))))
                .default_group_sequence(["Ledger", "Checks"])
                .build(),
        );
        let catalog = GroupCatalog::new()
            .with_sequence("Full", ["Default", "Checks"])
            .with_sequence("Reversed", ["Checks", "Default"]);
        Validator::new(Arc::new(registry), Arc::new(catalog))
    }

    fn is_unexpandable(err: &EngineError) -> bool {
        matches!(
            err,
            EngineError::Group(GroupError::UnexpandableDefaultSequence { .. })
        )
    }

    #[test]
    fn test_executables_check_default_sequence_expansion() {
        let validator = ledger_validator();
        let ledger = Value::Object(Bean::new("Ledger"));
        let reversed = [Group::new("Reversed")];

        assert!(validator
            .validate_parameters(&ledger, "post", &[Value::Null], &[Group::new("Full")])
            .is_ok());

        let err = validator
            .validate_parameters(&ledger, "post", &[Value::Null], &reversed)
            .unwrap_err();
        assert!(is_unexpandable(&err));

        let err = validator
            .validate_return_value(&ledger, "post", &Value::Null, &reversed)
            .unwrap_err();
        assert!(is_unexpandable(&err));

        let err = validator
            .validate_constructor_parameters("Ledger", "Ledger", &[Value::Integer(1)], &reversed)
            .unwrap_err();
        assert!(is_unexpandable(&err));
    }

    #[test]
    fn test_executables_reject_nested_sequences() {
        let catalog = GroupCatalog::new()
            .with_sequence("Inner", ["Basic"])
            .with_group("Child", ["Inner"])
            .with_sequence("Outer", ["Child"]);
        let validator = Validator::new(Arc::new(MetadataRegistry::new()), Arc::new(catalog));

        let err = validator
            .validate_parameters(&bank(), "transfer", &[], &[Group::new("Outer")])
            .unwrap_err();
        assert!(matches!(err, EngineError::Group(GroupError::NestedSequence { .. })));
    }
}
