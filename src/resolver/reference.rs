//! Typed resource references.
//!
//! Configuration refers to content with strings such as `personas#pm` or
//! `create-prd.md`. They are parsed exactly once, here, into a
//! [`ResourceReference`].

use crate::error::ReferenceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// File extensions accepted for direct references.
pub const RECOGNIZED_EXTENSIONS: &[&str] = &["md", "txt", "yaml", "yml", "json", "toml"];

/// Pointer to externally stored content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResourceReference {
    /// A named section inside a bundle file (`file#section`).
    Sectioned { file: String, section: String },
    /// A whole file (`file.ext`).
    Direct { path: String },
}

impl ResourceReference {
    pub fn parse(raw: &str) -> Result<Self, ReferenceError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ReferenceError::Empty);
        }
        let reference = match raw.split_once('#') {
            Some((file, section)) => ResourceReference::Sectioned {
                file: file.trim().to_string(),
                section: section.trim().to_string(),
            },
            None => ResourceReference::Direct {
                path: raw.to_string(),
            },
        };
        reference.validate()?;
        Ok(reference)
    }

    pub fn sectioned(
        file: impl Into<String>,
        section: impl Into<String>,
    ) -> Result<Self, ReferenceError> {
        let reference = ResourceReference::Sectioned {
            file: file.into(),
            section: section.into(),
        };
        reference.validate()?;
        Ok(reference)
    }

    pub fn direct(path: impl Into<String>) -> Result<Self, ReferenceError> {
        let reference = ResourceReference::Direct { path: path.into() };
        reference.validate()?;
        Ok(reference)
    }

    /// Check the structural invariants of the reference.
    ///
    /// Variants are public, so references built by hand are re-checked before use.
    pub fn validate(&self) -> Result<(), ReferenceError> {
        match self {
            ResourceReference::Sectioned { file, section } => {
                if file.trim().is_empty() {
                    return Err(ReferenceError::EmptyFile(self.to_string()));
                }
                if section.trim().is_empty() {
                    return Err(ReferenceError::EmptySection(self.to_string()));
                }
                Ok(())
            }
            ResourceReference::Direct { path } => {
                if path.trim().is_empty() {
                    return Err(ReferenceError::Empty);
                }
                if has_recognized_extension(path) {
                    Ok(())
                } else {
                    Err(ReferenceError::UnrecognizedExtension {
                        reference: path.clone(),
                        expected: RECOGNIZED_EXTENSIONS.join(", "),
                    })
                }
            }
        }
    }

    /// The file this reference reads from.
    pub fn file(&self) -> &str {
        match self {
            ResourceReference::Sectioned { file, .. } => file,
            ResourceReference::Direct { path } => path,
        }
    }

    pub fn section(&self) -> Option<&str> {
        match self {
            ResourceReference::Sectioned { section, .. } => Some(section),
            ResourceReference::Direct { .. } => None,
        }
    }
}

fn has_recognized_extension(path: &str) -> bool {
    std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            RECOGNIZED_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

impl fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceReference::Sectioned { file, section } => write!(f, "{}#{}", file, section),
            ResourceReference::Direct { path } => write!(f, "{}", path),
        }
    }
}

impl FromStr for ResourceReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceReference::parse(s)
    }
}

impl TryFrom<String> for ResourceReference {
    type Error = ReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ResourceReference::parse(&value)
    }
}

impl From<ResourceReference> for String {
    fn from(reference: ResourceReference) -> Self {
        reference.to_string()
    }
}

/// Kinds of supporting resources an agent may reference besides its persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Task,
    Template,
    Checklist,
    Data,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Task,
        ResourceKind::Template,
        ResourceKind::Checklist,
        ResourceKind::Data,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Task => "task",
            ResourceKind::Template => "template",
            ResourceKind::Checklist => "checklist",
            ResourceKind::Data => "data",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
