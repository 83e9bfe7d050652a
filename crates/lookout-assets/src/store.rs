//! Template store backed by filesystem search directories.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use lookout_core::{AssetSettings, Error, Result, TemplateImage};

/// Resolves logical template names to image files.
///
/// Directories are scanned in the order given; when the same stem appears
/// in more than one directory, the first scan wins. This lets callers list
/// a platform-specific directory after a common one and only add the
/// templates the common set is missing.
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: BTreeMap<String, TemplateImage>,
    scanned_dirs: Vec<PathBuf>,
}

impl TemplateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store by scanning the configured search directories.
    pub fn from_settings(settings: &AssetSettings) -> Result<Self> {
        let mut store = Self::new();
        for dir in &settings.search_dirs {
            store.scan_dir(dir)?;
        }
        Ok(store)
    }

    /// Scan a directory for template images (`.png` files).
    ///
    /// Returns the number of templates added. A directory that was already
    /// scanned is skipped with a warning.
    pub fn scan_dir(&mut self, dir: &Path) -> Result<usize> {
        if self.scanned_dirs.iter().any(|scanned| scanned == dir) {
            warn!(dir = %dir.display(), "templates from directory already scanned");
            return Ok(0);
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        files.sort();

        let mut added = 0;
        for path in files {
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if self.insert(TemplateImage::new(stem, &path)) {
                added += 1;
            }
        }

        info!(dir = %dir.display(), added, "scanned template directory");
        self.scanned_dirs.push(dir.to_path_buf());
        Ok(added)
    }

    /// Add a template directly.
    ///
    /// Returns false (and keeps the existing entry) when the name is
    /// already taken.
    pub fn insert(&mut self, template: TemplateImage) -> bool {
        if let Some(existing) = self.templates.get(template.name()) {
            warn!(
                name = template.name(),
                kept = %existing.path().display(),
                ignored = %template.path().display(),
                "template name already defined, keeping first"
            );
            return false;
        }
        debug!(name = template.name(), path = %template.path().display(), "template added");
        self.templates.insert(template.name().to_string(), template);
        true
    }

    /// Resolve a template by name.
    pub fn resolve(&self, name: &str) -> Result<&TemplateImage> {
        self.templates
            .get(name)
            .ok_or_else(|| Error::Config(format!("unknown template '{name}'")))
    }

    /// Look up a template by name.
    pub fn get(&self, name: &str) -> Option<&TemplateImage> {
        self.templates.get(name)
    }

    /// All template names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// All templates, in name order.
    pub fn templates(&self) -> impl Iterator<Item = &TemplateImage> {
        self.templates.values()
    }

    /// Number of templates in the store.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the store holds no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
