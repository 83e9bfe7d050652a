//! Template images, state labels and element definitions.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Opaque reference to a template image asset.
///
/// The core never reads the image bytes; resolution to an on-disk path is
/// the asset store's job and interpretation is the matcher's.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateImage {
    name: String,
    path: PathBuf,
}

impl TemplateImage {
    /// Create a new template reference.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Logical name of the template (usually the file stem).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved filesystem path of the image.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for TemplateImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Tag naming one possible state of an element.
///
/// The set of valid labels is open: the calling application decides which
/// states exist for each element. Constructors for the labels this library
/// itself attaches meaning to are provided.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateLabel(String);

impl StateLabel {
    /// Create a label from an arbitrary string.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The `enabled` state of a button-like element.
    pub fn enabled() -> Self {
        Self::new("enabled")
    }

    /// The `disabled` state of a button-like element.
    pub fn disabled() -> Self {
        Self::new("disabled")
    }

    /// The `checked` state of a checkbox or radio button.
    pub fn checked() -> Self {
        Self::new("checked")
    }

    /// The `unchecked` state of a checkbox or radio button.
    pub fn unchecked() -> Self {
        Self::new("unchecked")
    }

    /// The label as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StateLabel {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for StateLabel {
    fn from(label: String) -> Self {
        Self(label)
    }
}

/// Definition of a logical screen element.
///
/// Maps each possible state to one or more template images of the element
/// in that state (redundant templates cover rendering variants such as
/// different themes or font smoothing). Built once at setup and immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSpec {
    name: String,
    states: BTreeMap<StateLabel, Vec<TemplateImage>>,
    clickable: BTreeSet<StateLabel>,
}

impl ElementSpec {
    /// Start building an element definition.
    pub fn builder(name: impl Into<String>) -> ElementSpecBuilder {
        ElementSpecBuilder {
            name: name.into(),
            states: BTreeMap::new(),
            clickable: None,
        }
    }

    /// Element name, unique within a registry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterate over the declared states and their template sets.
    pub fn states(&self) -> impl Iterator<Item = (&StateLabel, &[TemplateImage])> {
        self.states
            .iter()
            .map(|(label, templates)| (label, templates.as_slice()))
    }

    /// The declared state labels, in sorted order.
    pub fn state_labels(&self) -> impl Iterator<Item = &StateLabel> {
        self.states.keys()
    }

    /// Templates declared for a given state, if the state exists.
    pub fn templates_for(&self, state: &StateLabel) -> Option<&[TemplateImage]> {
        self.states.get(state).map(Vec::as_slice)
    }

    /// Number of templates across all states.
    pub fn template_count(&self) -> usize {
        self.states.values().map(Vec::len).sum()
    }

    /// Whether the element accepts clicks while in the given state.
    pub fn is_clickable(&self, state: &StateLabel) -> bool {
        self.clickable.contains(state)
    }
}

/// Builder for [`ElementSpec`].
#[derive(Debug, Clone)]
pub struct ElementSpecBuilder {
    name: String,
    states: BTreeMap<StateLabel, Vec<TemplateImage>>,
    clickable: Option<BTreeSet<StateLabel>>,
}

impl ElementSpecBuilder {
    /// Declare a state with its template images.
    ///
    /// Declaring the same state twice appends to its template set.
    pub fn state(
        mut self,
        label: impl Into<StateLabel>,
        templates: impl IntoIterator<Item = TemplateImage>,
    ) -> Self {
        self.states
            .entry(label.into())
            .or_default()
            .extend(templates);
        self
    }

    /// Restrict clicking to the given state.
    ///
    /// May be called multiple times to allow several states. When never
    /// called, every declared state accepts clicks.
    pub fn clickable_when(mut self, label: impl Into<StateLabel>) -> Self {
        self.clickable
            .get_or_insert_with(BTreeSet::new)
            .insert(label.into());
        self
    }

    /// Validate and build the element definition.
    pub fn build(self) -> Result<ElementSpec> {
        if self.states.is_empty() {
            return Err(Error::InvalidTemplateSet {
                element: self.name,
                detail: "no states declared".to_string(),
            });
        }
        for (label, templates) in &self.states {
            if templates.is_empty() {
                return Err(Error::InvalidTemplateSet {
                    element: self.name,
                    detail: format!("state '{label}' has no templates"),
                });
            }
        }
        let clickable = match self.clickable {
            Some(clickable) => {
                if let Some(unknown) = clickable
                    .iter()
                    .find(|label| !self.states.contains_key(*label))
                {
                    return Err(Error::InvalidTemplateSet {
                        element: self.name,
                        detail: format!("clickable state '{unknown}' is not declared"),
                    });
                }
                clickable
            }
            None => self.states.keys().cloned().collect(),
        };
        Ok(ElementSpec {
            name: self.name,
            states: self.states,
            clickable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(name: &str) -> TemplateImage {
        TemplateImage::new(name, format!("/assets/{name}.png"))
    }

    #[test]
    fn test_template_image_accessors() {
        let tmpl = TemplateImage::new("next", "/assets/next.png");
        assert_eq!(tmpl.name(), "next");
        assert_eq!(tmpl.path(), Path::new("/assets/next.png"));
    }

    #[test]
    fn test_state_label_constructors() {
        assert_eq!(StateLabel::enabled().as_str(), "enabled");
        assert_eq!(StateLabel::disabled().as_str(), "disabled");
        assert_eq!(StateLabel::checked().as_str(), "checked");
        assert_eq!(StateLabel::unchecked().as_str(), "unchecked");
        assert_eq!(StateLabel::from("loading").as_str(), "loading");
    }

    #[test]
    fn test_state_label_serde_transparent() {
        let label = StateLabel::enabled();
        assert_eq!(serde_json::to_string(&label).unwrap(), "\"enabled\"");
    }

    #[test]
    fn test_build_element_spec() {
        let spec = ElementSpec::builder("next")
            .state(StateLabel::enabled(), [template("next"), template("next_2")])
            .state(StateLabel::disabled(), [template("next_disabled")])
            .clickable_when(StateLabel::enabled())
            .build()
            .unwrap();

        assert_eq!(spec.name(), "next");
        assert_eq!(spec.template_count(), 3);
        assert_eq!(spec.state_labels().count(), 2);
        assert_eq!(
            spec.templates_for(&StateLabel::enabled()).unwrap().len(),
            2
        );
        assert!(spec.templates_for(&StateLabel::checked()).is_none());
        assert!(spec.is_clickable(&StateLabel::enabled()));
        assert!(!spec.is_clickable(&StateLabel::disabled()));
    }

    #[test]
    fn test_build_all_states_clickable_by_default() {
        let spec = ElementSpec::builder("next")
            .state(StateLabel::enabled(), [template("next")])
            .state(StateLabel::disabled(), [template("next_disabled")])
            .build()
            .unwrap();

        assert!(spec.is_clickable(&StateLabel::enabled()));
        assert!(spec.is_clickable(&StateLabel::disabled()));
    }

    #[test]
    fn test_build_rejects_empty_state() {
        let err = ElementSpec::builder("next")
            .state(StateLabel::enabled(), [])
            .build()
            .unwrap_err();

        assert!(matches!(err, Error::InvalidTemplateSet { .. }));
        assert!(err.to_string().contains("enabled"));
    }

    #[test]
    fn test_build_rejects_no_states() {
        let err = ElementSpec::builder("next").build().unwrap_err();
        assert!(matches!(err, Error::InvalidTemplateSet { .. }));
    }

    #[test]
    fn test_build_rejects_unknown_clickable_state() {
        let err = ElementSpec::builder("next")
            .state(StateLabel::enabled(), [template("next")])
            .clickable_when(StateLabel::checked())
            .build()
            .unwrap_err();

        assert!(err.to_string().contains("checked"));
    }

    #[test]
    fn test_state_declared_twice_appends() {
        let spec = ElementSpec::builder("next")
            .state(StateLabel::enabled(), [template("next")])
            .state(StateLabel::enabled(), [template("next_2")])
            .build()
            .unwrap();

        assert_eq!(
            spec.templates_for(&StateLabel::enabled()).unwrap().len(),
            2
        );
    }
}
