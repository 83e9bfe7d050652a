//! Grouping templates into element definitions by filename convention.
//!
//! Template stems encode what they depict:
//!
//! - `button_<name>` and `button_<name>_<n>` are images of the `<name>`
//!   button in its enabled state (`<n>` numbers redundant variants);
//! - `disabled_button_<name>[_<n>]` are images of the same button disabled;
//! - `checked_box*` / `unchecked_box*` are checkbox images;
//! - `checked_radio*` / `unchecked_radio*` are radio button images.
//!
//! Anything else stays ungrouped and can be used directly.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{info, warn};

use lookout_core::{ElementSpec, Result, StateLabel, TemplateImage};

use crate::store::TemplateStore;

lazy_static! {
    static ref BUTTON: Regex =
        Regex::new(r"^button_([a-z0-9]+(?:_[a-z0-9]+)*?)(?:_(\d+))?$").unwrap();
    static ref DISABLED_BUTTON: Regex =
        Regex::new(r"^disabled_button_([a-z0-9]+(?:_[a-z0-9]+)*?)(?:_(\d+))?$").unwrap();
    static ref CHECKED_BOX: Regex = Regex::new(r"^checked_box(?:_\d+)?$").unwrap();
    static ref UNCHECKED_BOX: Regex = Regex::new(r"^unchecked_box(?:_\d+)?$").unwrap();
    static ref CHECKED_RADIO: Regex = Regex::new(r"^checked_radio(?:_\d+)?$").unwrap();
    static ref UNCHECKED_RADIO: Regex = Regex::new(r"^unchecked_radio(?:_\d+)?$").unwrap();
}

/// Checked and unchecked template images of one checkable element kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckablePool {
    /// Images of the element in its checked state
    pub checked: Vec<TemplateImage>,
    /// Images of the element in its unchecked state
    pub unchecked: Vec<TemplateImage>,
}

impl CheckablePool {
    /// Whether both state pools are empty.
    pub fn is_empty(&self) -> bool {
        self.checked.is_empty() && self.unchecked.is_empty()
    }
}

/// Result of grouping a template store by the filename convention.
#[derive(Debug, Default)]
pub struct GroupedAssets {
    /// Button elements, with `enabled` clickable and `disabled` not
    pub elements: Vec<ElementSpec>,
    /// Checkbox template pools
    pub checkboxes: CheckablePool,
    /// Radio button template pools
    pub radios: CheckablePool,
    /// Templates matching no convention
    pub ungrouped: Vec<TemplateImage>,
}

/// Group the store's templates into element definitions.
///
/// Disabled-button images whose button has no enabled images are ignored
/// with a warning.
pub fn group_elements(store: &TemplateStore) -> Result<GroupedAssets> {
    let mut enabled: BTreeMap<String, Vec<TemplateImage>> = BTreeMap::new();
    let mut disabled: BTreeMap<String, Vec<TemplateImage>> = BTreeMap::new();
    let mut grouped = GroupedAssets::default();

    for template in store.templates() {
        let stem = template.name();
        // disabled_button_ is checked first; it would also not match BUTTON,
        // but the order makes the intent explicit
        if let Some(captures) = DISABLED_BUTTON.captures(stem) {
            disabled
                .entry(captures[1].to_string())
                .or_default()
                .push(template.clone());
        } else if let Some(captures) = BUTTON.captures(stem) {
            enabled
                .entry(captures[1].to_string())
                .or_default()
                .push(template.clone());
        } else if CHECKED_BOX.is_match(stem) {
            grouped.checkboxes.checked.push(template.clone());
        } else if UNCHECKED_BOX.is_match(stem) {
            grouped.checkboxes.unchecked.push(template.clone());
        } else if CHECKED_RADIO.is_match(stem) {
            grouped.radios.checked.push(template.clone());
        } else if UNCHECKED_RADIO.is_match(stem) {
            grouped.radios.unchecked.push(template.clone());
        } else {
            grouped.ungrouped.push(template.clone());
        }
    }

    for name in disabled.keys() {
        if !enabled.contains_key(name) {
            warn!(
                element = name.as_str(),
                "disabled button images without enabled images, ignored"
            );
        }
    }

    for (name, templates) in enabled {
        let mut builder = ElementSpec::builder(name.as_str())
            .state(StateLabel::enabled(), templates)
            .clickable_when(StateLabel::enabled());
        if let Some(disabled_templates) = disabled.remove(&name) {
            builder = builder.state(StateLabel::disabled(), disabled_templates);
        }
        grouped.elements.push(builder.build()?);
    }

    info!(
        elements = grouped.elements.len(),
        checkboxes = grouped.checkboxes.checked.len() + grouped.checkboxes.unchecked.len(),
        radios = grouped.radios.checked.len() + grouped.radios.unchecked.len(),
        ungrouped = grouped.ungrouped.len(),
        "grouped templates by naming convention"
    );
    Ok(grouped)
}
