//! Registry of element definitions.

use std::collections::BTreeMap;
use tracing::info;

use lookout_core::{ElementSpec, Error, Result};

/// Holds every registered element definition.
///
/// Populated once at setup and immutable afterwards: detectors take the
/// registry behind an `Arc`, so concurrent reads need no locking.
#[derive(Debug, Default)]
pub struct ElementRegistry {
    elements: BTreeMap<String, ElementSpec>,
}

impl ElementRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element definition.
    ///
    /// Fails with [`Error::DuplicateElement`] when the name is taken; the
    /// first registration stays intact.
    pub fn register(&mut self, spec: ElementSpec) -> Result<()> {
        if self.elements.contains_key(spec.name()) {
            return Err(Error::DuplicateElement(spec.name().to_string()));
        }
        info!(
            element = spec.name(),
            states = spec.state_labels().count(),
            templates = spec.template_count(),
            "element registered"
        );
        self.elements.insert(spec.name().to_string(), spec);
        Ok(())
    }

    /// Register several element definitions, failing on the first error.
    pub fn register_all(&mut self, specs: impl IntoIterator<Item = ElementSpec>) -> Result<()> {
        for spec in specs {
            self.register(spec)?;
        }
        info!(elements = self.elements.len(), "registry populated");
        Ok(())
    }

    /// Look up an element definition.
    pub fn get(&self, name: &str) -> Result<&ElementSpec> {
        self.elements
            .get(name)
            .ok_or_else(|| Error::ElementNotFound(format!("'{name}' is not registered")))
    }

    /// Whether an element is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.elements.contains_key(name)
    }

    /// Registered element names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    /// Number of registered elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::template;
    use lookout_core::StateLabel;

    fn spec(name: &str) -> ElementSpec {
        ElementSpec::builder(name)
            .state(StateLabel::enabled(), [template(&format!("button_{name}"))])
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ElementRegistry::new();
        registry.register(spec("next")).unwrap();

        assert!(registry.contains("next"));
        assert_eq!(registry.get("next").unwrap().name(), "next");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_fails_and_keeps_first() {
        let mut registry = ElementRegistry::new();
        let first = ElementSpec::builder("next")
            .state(StateLabel::enabled(), [template("button_next")])
            .state(StateLabel::disabled(), [template("disabled_button_next")])
            .build()
            .unwrap();
        registry.register(first).unwrap();

        let err = registry.register(spec("next")).unwrap_err();
        assert!(matches!(err, Error::DuplicateElement(name) if name == "next"));

        // first registration intact: both states still present
        let kept = registry.get("next").unwrap();
        assert_eq!(kept.state_labels().count(), 2);
    }

    #[test]
    fn test_get_unknown_element() {
        let registry = ElementRegistry::new();
        let err = registry.get("ghost").unwrap_err();
        assert!(matches!(err, Error::ElementNotFound(_)));
    }

    #[test]
    fn test_register_all() {
        let mut registry = ElementRegistry::new();
        registry
            .register_all([spec("ok"), spec("cancel")])
            .unwrap();

        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["cancel", "ok"]);
    }

    #[test]
    fn test_register_all_fails_fast_on_duplicate() {
        let mut registry = ElementRegistry::new();
        let result = registry.register_all([spec("ok"), spec("ok"), spec("cancel")]);
        assert!(result.is_err());
        assert!(registry.contains("ok"));
        assert!(!registry.contains("cancel"));
    }
}
