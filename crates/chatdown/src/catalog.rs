//! The page-structure catalog: every selector and UI string the exporter
//! knows about the Google AI Mode page, kept as data.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::selector::Selector;

const BUILTIN_TOML: &str = include_str!("../catalog/google-ai.toml");

static BUILTIN: Lazy<SelectorCatalog> = Lazy::new(|| {
    SelectorCatalog::from_toml_str(BUILTIN_TOML).expect("built-in selector catalog is valid")
});

/// Error loading a catalog file
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read selector catalog {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid selector catalog: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Selectors locating the language label and code of a rich code block
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeBlockSelectors {
    pub container: Selector,
    /// Tried in order inside the container
    pub label: Vec<Selector>,
    pub body: Selector,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionHeadingSelectors {
    pub container: Selector,
    pub title: Selector,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectorCatalog {
    /// Subtree holding the turns; the whole document when absent
    pub conversation_scope: Selector,
    pub turn: Selector,
    /// Assistant answer region inside a turn; the whole turn when absent
    pub main_content: Selector,
    /// Selector groups tried in order; each group is one selector list
    pub user_query: Vec<Vec<Selector>>,
    pub noise: Vec<Selector>,
    pub structural_wrappers: Vec<Selector>,
    pub citation_markers: Vec<Selector>,
    pub removed_tags: Vec<String>,
    pub ui_artifact_lines: Vec<String>,
    pub code_block: CodeBlockSelectors,
    pub section_heading: SectionHeadingSelectors,
}

impl SelectorCatalog {
    /// The catalog compiled into the crate
    pub fn builtin() -> &'static SelectorCatalog {
        &BUILTIN
    }

    pub fn from_toml_str(source: &str) -> Result<Self, CatalogError> {
        Ok(toml::from_str(source)?)
    }

    /// Load a replacement catalog, e.g. after the page markup changed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "loaded selector catalog");
        Ok(catalog)
    }
}

impl Default for SelectorCatalog {
    fn default() -> Self {
        Self::builtin().clone()
    }
}
