//! Evaluation of (possibly composed) constraints.
//!
//! A [`ConstraintTree`] mirrors the composition structure of a
//! [`ConstraintDescriptor`]: one node per descriptor, children for its
//! composing constraints. Evaluating a node evaluates its children, then
//! the node's own validator, and combines the outcomes according to the
//! descriptor's [`CompositionType`].

use crate::core::error::{EngineError, EngineResult};
use crate::core::types::{Value, ValueKind};
use crate::core::violation::ConstraintViolation;
use crate::engine::context::ValidationContext;
use crate::engine::validator::{
    ConstraintValidator, ConstraintValidatorContext, ConstraintValidatorFactory,
};
use crate::engine::value_context::ValueContext;
use crate::metadata::constraint::{CompositionType, ConstraintDescriptor, ValidatorClass};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Cache key for initialized validators.
///
/// Factories compare by identity. The key owns a handle on its factory, so
/// the address cannot be reused by another factory while the entry lives.
#[derive(Clone)]
struct ValidatorKey {
    factory: Arc<dyn ConstraintValidatorFactory>,
    kind: ValueKind,
}

impl ValidatorKey {
    fn factory_address(&self) -> *const () {
        Arc::as_ptr(&self.factory) as *const ()
    }
}

impl PartialEq for ValidatorKey {
    fn eq(&self, other: &Self) -> bool {
        self.factory_address() == other.factory_address() && self.kind == other.kind
    }
}

impl Eq for ValidatorKey {}

impl Hash for ValidatorKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.factory_address().hash(state);
        self.kind.hash(state);
    }
}

#[derive(Clone)]
struct CachedValidator {
    class_name: String,
    validator: Arc<dyn ConstraintValidator>,
}

/// Evaluation tree of one constraint and its composing constraints.
pub struct ConstraintTree {
    descriptor: Arc<ConstraintDescriptor>,
    children: Vec<ConstraintTree>,
    validators: RwLock<HashMap<ValidatorKey, CachedValidator>>,
}

impl ConstraintTree {
    /// Build the tree for `descriptor`.
    pub fn new(descriptor: Arc<ConstraintDescriptor>) -> Self {
        let children = descriptor
            .composing_constraints()
            .iter()
            .map(|composing| ConstraintTree::new(Arc::clone(composing)))
            .collect();
        Self {
            descriptor,
            children,
            validators: RwLock::new(HashMap::new()),
        }
    }

    /// Descriptor at the root of the tree.
    pub fn descriptor(&self) -> &Arc<ConstraintDescriptor> {
        &self.descriptor
    }

    /// Trees of the composing constraints.
    pub fn children(&self) -> &[ConstraintTree] {
        &self.children
    }

    /// Evaluate the tree against the cursor's validated value.
    ///
    /// Violations are added to `ctx`; returns whether the constraint passed.
    pub fn validate_constraints(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &ValueContext,
    ) -> EngineResult<bool> {
        let mut violations = Vec::new();
        self.evaluate(ctx, vc, &mut violations)?;
        if violations.is_empty() {
            return Ok(true);
        }
        ctx.add_violations(violations);
        Ok(false)
    }

    fn evaluate(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &ValueContext,
        violations: &mut Vec<ConstraintViolation>,
    ) -> EngineResult<()> {
        let composition = self.descriptor.composition();
        let mut all_true = true;
        let mut at_least_one_true = false;

        for child in &self.children {
            let mut child_violations = Vec::new();
            child.evaluate(ctx, vc, &mut child_violations)?;
            if child_violations.is_empty() {
                at_least_one_true = true;
                if composition == CompositionType::Or {
                    break;
                }
            } else {
                all_true = false;
                violations.extend(child_violations);
                if composition == CompositionType::And && ctx.is_fail_fast() {
                    break;
                }
            }
        }

        let mut local = Vec::new();
        if !self.descriptor.validators().is_empty()
            && (!ctx.is_fail_fast() || violations.is_empty())
        {
            local = self.run_validator(ctx, vc)?;
            if local.is_empty() {
                at_least_one_true = true;
            } else {
                all_true = false;
            }
        }

        let passed = match composition {
            CompositionType::And => all_true,
            CompositionType::Or => at_least_one_true,
            CompositionType::AllFalse => !at_least_one_true,
        };

        if passed {
            violations.clear();
            return Ok(());
        }

        if self.descriptor.report_as_single_violation() || composition == CompositionType::AllFalse {
            violations.clear();
            if local.is_empty() {
                violations.push(ctx.create_violation(
                    vc,
                    self.descriptor.message_template(),
                    vc.path().clone(),
                    &self.descriptor,
                    &IndexMap::new(),
                )?);
            }
        }
        violations.extend(local);
        Ok(())
    }

    /// Run this node's own validator; returns the violations it reported.
    fn run_validator(
        &self,
        ctx: &ValidationContext<'_>,
        vc: &ValueContext,
    ) -> EngineResult<Vec<ConstraintViolation>> {
        let value = vc.validated_value();
        let cached = self.validator_for(value, ctx.validator_factory())?;
        let mut reporting = ConstraintValidatorContext::new(vc.path().clone(), &self.descriptor);

        let valid = cached
            .validator
            .is_valid(value, &mut reporting)
            .map_err(|fault| EngineError::EvaluationFault {
                validator: cached.class_name.clone(),
                constraint: self.descriptor.name().to_string(),
                reason: fault.0,
            })?;

        if valid {
            return Ok(Vec::new());
        }
        log::trace!(
            "Constraint {} failed at '{}' for {}",
            self.descriptor.name(),
            vc.path(),
            value
        );
        ctx.create_violations(vc, &reporting, &self.descriptor)
    }

    fn validator_for(
        &self,
        value: &Value,
        factory: &Arc<dyn ConstraintValidatorFactory>,
    ) -> EngineResult<CachedValidator> {
        let key = ValidatorKey {
            factory: Arc::clone(factory),
            kind: value.kind(),
        };
        if let Some(cached) = self.validators.read().get(&key) {
            return Ok(cached.clone());
        }

        let class = self.select_class(&key.kind)?;
        let validator = factory.instance(class, &self.descriptor).map_err(|reason| {
            EngineError::ValidatorInitialization {
                validator: class.name().to_string(),
                reason,
            }
        })?;
        log::debug!(
            "Initialized validator {} for {} on {} values",
            class.name(),
            self.descriptor.name(),
            key.kind
        );

        let cached = CachedValidator {
            class_name: class.name().to_string(),
            validator,
        };
        let mut validators = self.validators.write();
        Ok(validators.entry(key).or_insert(cached).clone())
    }

    /// Pick the validator class for values of `kind`.
    ///
    /// Null is accepted by every validator and resolves to the first one
    /// declared. Otherwise the most specific accepting target wins.
    fn select_class(&self, kind: &ValueKind) -> EngineResult<&ValidatorClass> {
        let declared = self.descriptor.validators();
        if *kind == ValueKind::Null {
            return declared.first().ok_or_else(|| self.no_validator(kind));
        }

        let candidates: Vec<&ValidatorClass> = declared
            .iter()
            .filter(|class| class.target().accepts(kind))
            .collect();
        let best = candidates
            .iter()
            .map(|class| class.target().specificity())
            .max()
            .ok_or_else(|| self.no_validator(kind))?;
        let top: Vec<&ValidatorClass> = candidates
            .into_iter()
            .filter(|class| class.target().specificity() == best)
            .collect();

        match top.as_slice() {
            [single] => Ok(single),
            _ => Err(EngineError::AmbiguousValidator {
                constraint: self.descriptor.name().to_string(),
                value_kind: kind.clone(),
                candidates: top.iter().map(|class| class.name().to_string()).collect(),
            }),
        }
    }

    fn no_validator(&self, kind: &ValueKind) -> EngineError {
        EngineError::NoValidatorFound {
            constraint: self.descriptor.name().to_string(),
            value_kind: kind.clone(),
        }
    }
}

impl fmt::Debug for ConstraintTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintTree")
            .field("constraint", &self.descriptor.name())
            .field("composition", &self.descriptor.composition())
            .field("children", &self.children)
            .field("cached_validators", &self.validators.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path::Path;
    use crate::core::types::Bean;
    use crate::engine::interpolator::ParameterMessageInterpolator;
    use crate::engine::options::ValidatorOptions;
    use crate::engine::resolver::TraverseAll;
    use crate::engine::context::ValidationContextBuilder;
    use crate::engine::validator::{DefaultConstraintValidatorFactory, FnValidator};
    use crate::engine::value_context::Validatable;
    use crate::metadata::constraint::{ConstraintDescriptorBuilder, ValueType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn check(name: &str, pass: bool) -> ConstraintDescriptorBuilder {
        ConstraintDescriptor::builder(name)
            .message(format!("{} failed", name))
            .validated_by(name, ValueType::Any, move |_, _| Ok(pass))
    }

    fn run(descriptor: ConstraintDescriptor, fail_fast: bool) -> EngineResult<Vec<String>> {
        let tree = ConstraintTree::new(Arc::new(descriptor));
        let interpolator = ParameterMessageInterpolator;
        let factory: Arc<dyn ConstraintValidatorFactory> =
            Arc::new(DefaultConstraintValidatorFactory);
        let options = ValidatorOptions::default().with_fail_fast(fail_fast);
        let root = Value::Object(Bean::new("Thing"));
        let mut ctx =
            ValidationContextBuilder::new(&interpolator, &factory, &TraverseAll, &options)
                .for_validate(&root);
        let mut vc = ValueContext::for_executable(
            Some(root.clone()),
            "Thing",
            Validatable::Unconstrained,
            Path::parse("field").unwrap(),
        );
        vc.set_validated_value(Value::Integer(5));

        tree.validate_constraints(&mut ctx, &vc)?;
        Ok(ctx
            .into_violations()
            .iter()
            .map(|v| v.message().to_string())
            .collect())
    }

    #[test]
    fn test_and_collects_every_failure() {
        let descriptor = ConstraintDescriptor::builder("Both")
            .composed_of(check("A", false))
            .composed_of(check("B", false))
            .composed_of(check("C", true))
            .build();
        assert_eq!(run(descriptor, false).unwrap(), vec!["A failed", "B failed"]);
    }

    #[test]
    fn test_and_stops_at_first_failure_when_fail_fast() {
        let descriptor = ConstraintDescriptor::builder("Both")
            .composed_of(check("A", false))
            .composed_of(check("B", false))
            .build();
        assert_eq!(run(descriptor, true).unwrap(), vec!["A failed"]);
    }

    #[test]
    fn test_or_short_circuits_on_first_pass() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let descriptor = ConstraintDescriptor::builder("Either")
            .message("neither")
            .composition(CompositionType::Or)
            .composed_of(check("A", true))
            .composed_of(
                ConstraintDescriptor::builder("B").validated_by("B", ValueType::Any, move |_, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(false)
                }),
            )
            .build();
        assert!(run(descriptor, false).unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_or_failure_reports_children() {
        let descriptor = ConstraintDescriptor::builder("Either")
            .composition(CompositionType::Or)
            .composed_of(check("A", false))
            .composed_of(check("B", false))
            .build();
        assert_eq!(run(descriptor, false).unwrap(), vec!["A failed", "B failed"]);
    }

    #[test]
    fn test_all_false_synthesizes_single_violation() {
        let descriptor = ConstraintDescriptor::builder("Neither")
            .message("must match neither")
            .composition(CompositionType::AllFalse)
            .composed_of(check("A", false))
            .composed_of(check("B", true))
            .build();
        assert_eq!(run(descriptor, false).unwrap(), vec!["must match neither"]);

        let descriptor = ConstraintDescriptor::builder("Neither")
            .composition(CompositionType::AllFalse)
            .composed_of(check("A", false))
            .composed_of(check("B", false))
            .build();
        assert!(run(descriptor, false).unwrap().is_empty());
    }

    #[test]
    fn test_report_as_single_violation() {
        let descriptor = ConstraintDescriptor::builder("Range")
            .message("out of range")
            .report_as_single_violation()
            .composed_of(check("Min", false))
            .composed_of(check("Max", false))
            .build();
        assert_eq!(run(descriptor, false).unwrap(), vec!["out of range"]);
    }

    #[test]
    fn test_local_validator_runs_after_children() {
        let descriptor = check("Outer", false).composed_of(check("Inner", false)).build();
        assert_eq!(run(descriptor, false).unwrap(), vec!["Inner failed", "Outer failed"]);
        let descriptor = check("Outer", false).composed_of(check("Inner", false)).build();
        assert_eq!(run(descriptor, true).unwrap(), vec!["Inner failed"]);
    }

    #[test]
    fn test_most_specific_validator_wins() {
        let descriptor = ConstraintDescriptor::builder("Size")
            .message("{kind}")
            .validated_by("AnySize", ValueType::Any, |_, ctx: &mut ConstraintValidatorContext| {
                ctx.add_message_parameter("kind", "any");
                Ok(false)
            })
            .validated_by("NumberSize", ValueType::Number, |_, ctx: &mut ConstraintValidatorContext| {
                ctx.add_message_parameter("kind", "number");
                Ok(false)
            })
            .validated_by("IntegerSize", ValueType::Integer, |_, ctx: &mut ConstraintValidatorContext| {
                ctx.add_message_parameter("kind", "integer");
                Ok(false)
            })
            .build();
        assert_eq!(run(descriptor, false).unwrap(), vec!["integer"]);
    }

    #[test]
    fn test_selection_errors() {
        let descriptor = ConstraintDescriptor::builder("Text")
            .validated_by("StringOnly", ValueType::String, |_, _| Ok(true))
            .build();
        assert!(matches!(
            run(descriptor, false),
            Err(EngineError::NoValidatorFound { .. })
        ));

        let descriptor = ConstraintDescriptor::builder("Twice")
            .validated_by("First", ValueType::Number, |_, _| Ok(true))
            .validated_by("Second", ValueType::Number, |_, _| Ok(true))
            .build();
        match run(descriptor, false) {
            Err(EngineError::AmbiguousValidator { candidates, .. }) => {
                assert_eq!(candidates, vec!["First", "Second"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_fault_aborts() {
        let descriptor = ConstraintDescriptor::builder("Broken")
            .validated_by("Exploding", ValueType::Any, |_, _| Err("boom".into()))
            .build();
        match run(descriptor, false) {
            Err(EngineError::EvaluationFault { validator, reason, .. }) => {
                assert_eq!(validator, "Exploding");
                assert_eq!(reason, "boom");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_validator_is_initialized_once_per_kind() {
        let inits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&inits);
        let class = ValidatorClass::new("Counted", ValueType::Any, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            let validator = FnValidator::new(|_: &Value, _: &mut ConstraintValidatorContext| Ok(true));
            Ok(Arc::new(validator) as Arc<dyn ConstraintValidator>)
        });
        let tree = ConstraintTree::new(Arc::new(
            ConstraintDescriptor::builder("Counted").validator(class).build(),
        ));
        let factory: Arc<dyn ConstraintValidatorFactory> = Arc::new(DefaultConstraintValidatorFactory);

        tree.validator_for(&Value::Integer(1), &factory).unwrap();
        tree.validator_for(&Value::Integer(2), &factory).unwrap();
        tree.validator_for(&Value::string("x"), &factory).unwrap();
        assert_eq!(inits.load(Ordering::SeqCst), 2);
    }

    struct Verdict(bool);

    impl ConstraintValidatorFactory for Verdict {
        fn instance(
            &self,
            _: &ValidatorClass,
            _: &ConstraintDescriptor,
        ) -> Result<Arc<dyn ConstraintValidator>, String> {
            let pass = self.0;
            let validator =
                FnValidator::new(move |_: &Value, _: &mut ConstraintValidatorContext| Ok(pass));
            Ok(Arc::new(validator) as Arc<dyn ConstraintValidator>)
        }
    }

    #[test]
    fn test_dropped_factory_does_not_leak_into_cache() {
        let tree = ConstraintTree::new(Arc::new(check("Verdict", true).build()));
        for pass in [true, false, true, false] {
            let factory: Arc<dyn ConstraintValidatorFactory> = Arc::new(Verdict(pass));
            let cached = tree.validator_for(&Value::Integer(1), &factory).unwrap();
            let mut reporting = ConstraintValidatorContext::new(Path::root(), &tree.descriptor);
            let valid = cached.validator.is_valid(&Value::Integer(1), &mut reporting).unwrap();
            assert_eq!(valid, pass);
            drop(factory);
        }
        assert_eq!(tree.validators.read().len(), 4);
    }
}
