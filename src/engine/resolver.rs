//! Traversability decisions.
//!
//! Before a property constraint is evaluated the engine asks whether the
//! property is reachable; before a property is cascaded it also asks
//! whether it is cascadable. A call-local cache keeps a resolver from being
//! asked the same question twice.

use crate::core::error::{EngineError, EngineResult};
use crate::core::path::{ElementKind, Path, PathNode};
use crate::core::types::{BeanId, Value};
use std::collections::HashMap;

/// Decides which parts of a graph the engine may touch.
pub trait TraversableResolver: Send + Sync {
    /// Whether the engine may read the property `node` of `traversable`.
    fn is_reachable(
        &self,
        traversable: &Value,
        node: &PathNode,
        root_type: &str,
        path_to_owner: &Path,
        kind: ElementKind,
    ) -> Result<bool, String>;

    /// Whether the engine may cascade into the property `node` of `traversable`.
    fn is_cascadable(
        &self,
        traversable: &Value,
        node: &PathNode,
        root_type: &str,
        path_to_owner: &Path,
        kind: ElementKind,
    ) -> Result<bool, String>;
}

/// Resolver that allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraverseAll;

impl TraversableResolver for TraverseAll {
    fn is_reachable(
        &self,
        _traversable: &Value,
        _node: &PathNode,
        _root_type: &str,
        _path_to_owner: &Path,
        _kind: ElementKind,
    ) -> Result<bool, String> {
        Ok(true)
    }

    fn is_cascadable(
        &self,
        _traversable: &Value,
        _node: &PathNode,
        _root_type: &str,
        _path_to_owner: &Path,
        _kind: ElementKind,
    ) -> Result<bool, String> {
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ResolutionKey {
    traversable: BeanId,
    node: PathNode,
    path_to_owner: Path,
    kind: ElementKind,
}

#[derive(Debug, Clone, Copy, Default)]
struct Resolution {
    reachable: Option<bool>,
    cascadable: Option<bool>,
}

/// Per-call memoizing wrapper around a [`TraversableResolver`].
///
/// Only answers about objects are cached; other traversables have no
/// identity to key on.
pub struct CachingTraversableResolver<'a> {
    delegate: &'a dyn TraversableResolver,
    enabled: bool,
    cache: HashMap<ResolutionKey, Resolution>,
}

impl<'a> CachingTraversableResolver<'a> {
    /// Wrap `delegate`; with `enabled == false` every question is forwarded.
    pub fn new(delegate: &'a dyn TraversableResolver, enabled: bool) -> Self {
        Self {
            delegate,
            enabled,
            cache: HashMap::new(),
        }
    }

    fn key(traversable: &Value, node: &PathNode, path: &Path, kind: ElementKind) -> Option<ResolutionKey> {
        traversable.identity().map(|id| ResolutionKey {
            traversable: id,
            node: node.clone(),
            path_to_owner: path.clone(),
            kind,
        })
    }

    /// Ask (or recall) whether a property is reachable.
    pub fn is_reachable(
        &mut self,
        traversable: &Value,
        node: &PathNode,
        root_type: &str,
        path_to_owner: &Path,
        kind: ElementKind,
    ) -> EngineResult<bool> {
        let key = self
            .enabled
            .then(|| Self::key(traversable, node, path_to_owner, kind))
            .flatten();
        if let Some(cached) = key.as_ref().and_then(|k| self.cache.get(k)?.reachable) {
            return Ok(cached);
        }

        let reachable = self
            .delegate
            .is_reachable(traversable, node, root_type, path_to_owner, kind)
            .map_err(|reason| EngineError::TraversableResolver {
                operation: "is_reachable".to_string(),
                reason,
            })?;

        if let Some(key) = key {
            self.cache.entry(key).or_default().reachable = Some(reachable);
        }
        Ok(reachable)
    }

    /// Ask (or recall) whether a property is cascadable.
    pub fn is_cascadable(
        &mut self,
        traversable: &Value,
        node: &PathNode,
        root_type: &str,
        path_to_owner: &Path,
        kind: ElementKind,
    ) -> EngineResult<bool> {
        let key = self
            .enabled
            .then(|| Self::key(traversable, node, path_to_owner, kind))
            .flatten();
        if let Some(cached) = key.as_ref().and_then(|k| self.cache.get(k)?.cascadable) {
            return Ok(cached);
        }

        let cascadable = self
            .delegate
            .is_cascadable(traversable, node, root_type, path_to_owner, kind)
            .map_err(|reason| EngineError::TraversableResolver {
                operation: "is_cascadable".to_string(),
                reason,
            })?;

        if let Some(key) = key {
            self.cache.entry(key).or_default().cascadable = Some(cascadable);
        }
        Ok(cascadable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Bean;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl TraversableResolver for Counting {
        fn is_reachable(
            &self,
            _traversable: &Value,
            node: &PathNode,
            _root_type: &str,
            _path_to_owner: &Path,
            _kind: ElementKind,
        ) -> Result<bool, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(node.name.as_deref() != Some("secret"))
        }

        fn is_cascadable(
            &self,
            _traversable: &Value,
            _node: &PathNode,
            _root_type: &str,
            _path_to_owner: &Path,
            _kind: ElementKind,
        ) -> Result<bool, String> {
            Err("no cascading today".to_string())
        }
    }

    #[test]
    fn test_answers_are_cached_per_object() {
        let delegate = Counting::default();
        let mut resolver = CachingTraversableResolver::new(&delegate, true);
        let bean = Value::Object(Bean::new("Person"));
        let node = PathNode::property("secret");

        for _ in 0..3 {
            let reachable = resolver
                .is_reachable(&bean, &node, "Person", &Path::root(), ElementKind::Property)
                .unwrap();
            assert!(!reachable);
        }
        assert_eq!(delegate.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disabled_cache_forwards() {
        let delegate = Counting::default();
        let mut resolver = CachingTraversableResolver::new(&delegate, false);
        let bean = Value::Object(Bean::new("Person"));
        let node = PathNode::property("name");

        resolver
            .is_reachable(&bean, &node, "Person", &Path::root(), ElementKind::Property)
            .unwrap();
        resolver
            .is_reachable(&bean, &node, "Person", &Path::root(), ElementKind::Property)
            .unwrap();
        assert_eq!(delegate.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_resolver_failure_is_an_error() {
        let delegate = Counting::default();
        let mut resolver = CachingTraversableResolver::new(&delegate, true);
        let bean = Value::Object(Bean::new("Person"));
        let err = resolver
            .is_cascadable(
                &bean,
                &PathNode::property("address"),
                "Person",
                &Path::root(),
                ElementKind::Property,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::TraversableResolver { .. }));
    }
}
