//! Explicit YAML manifests for element definitions.
//!
//! A manifest names each element's states and template images directly,
//! for setups where the filename convention is not enough (custom state
//! labels, shared templates, explicit clickable sets).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use lookout_core::{ElementSpec, Error, Result, StateLabel};

use crate::store::TemplateStore;

/// Element definitions loaded from a YAML manifest.
///
/// ```yaml
/// elements:
///   next:
///     states:
///       enabled: [button_next, button_next_2]
///       disabled: [disabled_button_next]
///     clickable: [enabled]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Declared elements by name
    pub elements: BTreeMap<String, ManifestElement>,
}

/// One element entry in a manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestElement {
    /// State label to template names
    pub states: BTreeMap<String, Vec<String>>,
    /// States in which the element accepts clicks; empty means all
    #[serde(default)]
    pub clickable: Vec<String>,
}

impl Manifest {
    /// Load a manifest from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a manifest from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))
    }

    /// Resolve the manifest against a template store.
    ///
    /// Fails when a template name is unknown to the store, a state has no
    /// templates, or a clickable label names no declared state.
    pub fn resolve(&self, store: &TemplateStore) -> Result<Vec<ElementSpec>> {
        let mut specs = Vec::with_capacity(self.elements.len());
        for (name, element) in &self.elements {
            let mut builder = ElementSpec::builder(name.as_str());
            for (label, template_names) in &element.states {
                let templates = template_names
                    .iter()
                    .map(|template_name| store.resolve(template_name).cloned())
                    .collect::<Result<Vec<_>>>()?;
                builder = builder.state(StateLabel::new(label.as_str()), templates);
            }
            for label in &element.clickable {
                builder = builder.clickable_when(StateLabel::new(label.as_str()));
            }
            specs.push(builder.build()?);
        }
        Ok(specs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookout_core::TemplateImage;

    fn store_with(names: &[&str]) -> TemplateStore {
        let mut store = TemplateStore::new();
        for name in names {
            store.insert(TemplateImage::new(*name, format!("/assets/{name}.png")));
        }
        store
    }

    const MANIFEST: &str = r#"
elements:
  next:
    states:
      enabled: [button_next, button_next_2]
      disabled: [disabled_button_next]
    clickable: [enabled]
  spinner:
    states:
      visible: [spinner]
"#;

    #[test]
    fn test_parse_and_resolve() {
        let store = store_with(&[
            "button_next",
            "button_next_2",
            "disabled_button_next",
            "spinner",
        ]);

        let manifest = Manifest::from_yaml(MANIFEST).unwrap();
        let specs = manifest.resolve(&store).unwrap();
        assert_eq!(specs.len(), 2);

        let next = specs.iter().find(|spec| spec.name() == "next").unwrap();
        assert_eq!(
            next.templates_for(&StateLabel::enabled()).unwrap().len(),
            2
        );
        assert!(next.is_clickable(&StateLabel::enabled()));
        assert!(!next.is_clickable(&StateLabel::disabled()));

        let spinner = specs.iter().find(|spec| spec.name() == "spinner").unwrap();
        assert!(spinner.is_clickable(&StateLabel::new("visible")));
    }

    #[test]
    fn test_unknown_template_fails() {
        let store = store_with(&["button_next"]);
        let manifest = Manifest::from_yaml(MANIFEST).unwrap();

        let err = manifest.resolve(&store).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_empty_state_fails() {
        let yaml = r#"
elements:
  next:
    states:
      enabled: []
"#;
        let store = store_with(&[]);
        let manifest = Manifest::from_yaml(yaml).unwrap();

        let err = manifest.resolve(&store).unwrap_err();
        assert!(matches!(err, Error::InvalidTemplateSet { .. }));
    }

    #[test]
    fn test_unknown_clickable_state_fails() {
        let yaml = r#"
elements:
  next:
    states:
      enabled: [button_next]
    clickable: [checked]
"#;
        let store = store_with(&["button_next"]);
        let manifest = Manifest::from_yaml(yaml).unwrap();

        let err = manifest.resolve(&store).unwrap_err();
        assert!(matches!(err, Error::InvalidTemplateSet { .. }));
    }

    #[test]
    fn test_invalid_yaml_fails() {
        let err = Manifest::from_yaml("elements: [not a map").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
