//! Locator selection: an explicit registry from (language, category) to a
//! locator constructor, populated at startup. A miss anywhere in the chain
//! is a distinct error, and every one of them degrades to "no definition
//! found" in the servicer.

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::locator::{
    CodeContextRequest, EntityCategory, Language, LocatorError, RegexSymbolLocator, SymbolLocator,
    profiles,
};
use crate::source::SourceTree;

type LocatorCtor = Box<dyn Fn(Arc<dyn SourceTree>) -> Box<dyn SymbolLocator> + Send + Sync>;

/// Resolves a locator implementation for a code-context request.
pub struct LocatorFactory {
    tree: Arc<dyn SourceTree>,
    registry: HashMap<(Language, EntityCategory), LocatorCtor>,
}

impl LocatorFactory {
    pub fn new(tree: Arc<dyn SourceTree>) -> Self {
        let mut registry: HashMap<(Language, EntityCategory), LocatorCtor> = HashMap::new();
        for profile in profiles::all() {
            for category in EntityCategory::ALL {
                registry.insert(
                    (profile.language, category),
                    Box::new(move |tree| {
                        Box::new(RegexSymbolLocator::new(tree, profile, category))
                    }),
                );
            }
        }
        Self { tree, registry }
    }

    /// Resolve the locator for a request.
    ///
    /// Three independently-failing lookups: extension to language, category
    /// string to enum, and (language, category) to implementation.
    pub fn get(&self, request: &CodeContextRequest) -> Result<Box<dyn SymbolLocator>, LocatorError> {
        let extension = request
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or_default();
        let language = Language::from_extension(extension)
            .ok_or_else(|| LocatorError::UnsupportedExtension(extension.to_string()))?;
        let category = EntityCategory::from_wire(&request.entity_category)?;
        let ctor = self
            .registry
            .get(&(language, category))
            .ok_or(LocatorError::MissingLocator { language, category })?;
        Ok(ctor(self.tree.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FsSourceTree;
    use tempfile::tempdir;

    fn factory() -> (tempfile::TempDir, LocatorFactory) {
        let dir = tempdir().unwrap();
        let tree: Arc<dyn SourceTree> = Arc::new(FsSourceTree::new(dir.path()));
        (dir, LocatorFactory::new(tree))
    }

    fn request(filename: &str, category: &str) -> CodeContextRequest {
        CodeContextRequest {
            filename: filename.to_string(),
            entity_category: category.to_string(),
            context_required_entity: "pkg.thing".to_string(),
        }
    }

    #[test]
    fn every_supported_pair_resolves() {
        let (_dir, factory) = factory();
        for filename in ["a.py", "A.java", "A.kt", "a.js", "a.ts"] {
            for category in ["callable", "data", "type"] {
                assert!(
                    factory.get(&request(filename, category)).is_ok(),
                    "expected a locator for {filename}/{category}"
                );
            }
        }
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let (_dir, factory) = factory();
        let err = factory.get(&request("main.rs", "callable")).unwrap_err();
        assert!(matches!(err, LocatorError::UnsupportedExtension(ext) if ext == "rs"));
    }

    #[test]
    fn extensionless_filename_is_rejected() {
        let (_dir, factory) = factory();
        let err = factory.get(&request("Makefile", "callable")).unwrap_err();
        assert!(matches!(err, LocatorError::UnsupportedExtension(_)));
    }

    #[test]
    fn invalid_category_is_rejected() {
        let (_dir, factory) = factory();
        let err = factory.get(&request("a.py", "gadget")).unwrap_err();
        assert!(matches!(err, LocatorError::InvalidCategory(c) if c == "gadget"));
    }
}
