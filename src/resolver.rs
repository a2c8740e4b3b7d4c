//! Resource Resolver
//!
//! Turns a [`ResourceReference`] into loaded text by reading through the
//! injected [`ContentStore`]. The resolver holds no cache; every call reads
//! the store's current snapshot.

pub mod reference;
pub mod section;

pub use reference::{ResourceKind, ResourceReference, RECOGNIZED_EXTENSIONS};
pub use section::{extract_section, section_names, SectionError, SectionMarkers};

use crate::config::ResolverConfig;
use crate::error::{ResolveError, StoreError};
use crate::store::ContentStore;
use std::sync::Arc;
use tracing::debug;

/// Resolves references against a content store.
pub struct ResourceResolver {
    store: Arc<dyn ContentStore>,
    markers: SectionMarkers,
    bundle_extension: Option<String>,
}

impl ResourceResolver {
    /// Create a resolver with default markers and the `txt` bundle extension.
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self::from_config(store, &ResolverConfig::default())
    }

    pub fn from_config(store: Arc<dyn ContentStore>, config: &ResolverConfig) -> Self {
        Self {
            store,
            markers: config.markers.clone(),
            bundle_extension: config
                .bundle_extension
                .clone()
                .filter(|ext| !ext.is_empty()),
        }
    }

    pub fn with_markers(mut self, markers: SectionMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Extension tried for sectioned files named without one (`personas#pm`
    /// falls back to `personas.txt`). `None` disables the fallback.
    pub fn with_bundle_extension(mut self, extension: Option<String>) -> Self {
        self.bundle_extension = extension;
        self
    }

    pub fn markers(&self) -> &SectionMarkers {
        &self.markers
    }

    /// Resolve a reference to its text content.
    pub async fn resolve(&self, reference: &ResourceReference) -> Result<String, ResolveError> {
        reference.validate()?;
        match reference {
            ResourceReference::Direct { path } => self.read_text(path).await,
            ResourceReference::Sectioned { file, section } => {
                let (content, file_read) = self.read_bundle(file).await?;
                debug!("Looking up section '{}' in {}", section, file_read);
                extract_section(&content, section, &self.markers).map_err(|e| match e {
                    SectionError::NotFound => ResolveError::SectionNotFound {
                        file: file_read,
                        section: section.clone(),
                    },
                    SectionError::Unterminated => ResolveError::UnterminatedSection {
                        file: file_read,
                        section: section.clone(),
                    },
                })
            }
        }
    }

    /// Read a bundle file, trying the bundle extension when the literal name is
    /// absent and has no extension of its own.
    async fn read_bundle(&self, file: &str) -> Result<(String, String), ResolveError> {
        match self.read_text(file).await {
            Ok(content) => Ok((content, file.to_string())),
            Err(ResolveError::FileNotFound { .. }) if !has_extension(file) => {
                match &self.bundle_extension {
                    Some(ext) => {
                        let fallback = format!("{}.{}", file, ext);
                        match self.read_text(&fallback).await {
                            Ok(content) => Ok((content, fallback)),
                            Err(ResolveError::FileNotFound { .. }) => {
                                Err(ResolveError::FileNotFound {
                                    file: file.to_string(),
                                })
                            }
                            Err(e) => Err(e),
                        }
                    }
                    None => Err(ResolveError::FileNotFound {
                        file: file.to_string(),
                    }),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn read_text(&self, path: &str) -> Result<String, ResolveError> {
        let bytes = self.store.read(path).await.map_err(|e| match e {
            StoreError::NotFound(_) => ResolveError::FileNotFound {
                file: path.to_string(),
            },
            other => ResolveError::Store {
                file: path.to_string(),
                message: other.to_string(),
            },
        })?;
        String::from_utf8(bytes).map_err(|_| ResolveError::InvalidEncoding {
            file: path.to_string(),
        })
    }
}

fn has_extension(file: &str) -> bool {
    std::path::Path::new(file).extension().is_some()
}
