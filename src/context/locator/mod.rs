//! Symbol locators: find a named definition in the source tree.
//!
//! A locator searches the requested file first, then walks its imports
//! recursively. A per-call visited set guards against import cycles and
//! guarantees each file is inspected at most once, so diamond-shaped import
//! graphs cannot blow up the search.

mod factory;
mod profiles;

pub use factory::LocatorFactory;
pub use profiles::LanguageProfile;

use std::collections::HashSet;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::SourceTree;

/// Decoded arguments of a code-lookup tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeContextRequest {
    /// File the assistant was looking at, relative to the tree root.
    pub filename: String,
    /// Requested category as it appears on the wire; validated by the
    /// factory, not at decode time.
    #[serde(rename = "entityCategory")]
    pub entity_category: String,
    /// Dot-qualified name of the entity whose definition is wanted.
    #[serde(rename = "contextRequiredEntity")]
    pub context_required_entity: String,
}

/// What kind of definition the assistant asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityCategory {
    Callable,
    Data,
    Type,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 3] = [
        EntityCategory::Callable,
        EntityCategory::Data,
        EntityCategory::Type,
    ];

    /// Parse the wire spelling, case-insensitively.
    pub fn from_wire(value: &str) -> Result<Self, LocatorError> {
        match value.to_ascii_lowercase().as_str() {
            "callable" => Ok(EntityCategory::Callable),
            "data" => Ok(EntityCategory::Data),
            "type" => Ok(EntityCategory::Type),
            _ => Err(LocatorError::InvalidCategory(value.to_string())),
        }
    }
}

/// Languages with a registered locator profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Java,
    Kotlin,
    JavaScript,
    TypeScript,
}

impl Language {
    /// Map a file extension to its language.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "py" => Some(Language::Python),
            "java" => Some(Language::Java),
            "kt" => Some(Language::Kotlin),
            "js" | "mjs" => Some(Language::JavaScript),
            "ts" => Some(Language::TypeScript),
            _ => None,
        }
    }
}

/// Error type for locator construction.
///
/// All three variants degrade to "no definition found" in the servicer;
/// none of them aborts a review.
#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("No language registered for file extension '{0}'")]
    UnsupportedExtension(String),

    #[error("Unknown entity category '{0}'")]
    InvalidCategory(String),

    #[error("No locator registered for {language:?}/{category:?}")]
    MissingLocator {
        language: Language,
        category: EntityCategory,
    },
}

/// Finds the definition of a named entity.
pub trait SymbolLocator: Send + Sync {
    /// Search for the definition, returning the trimmed matched text.
    fn find_definition(&self, request: &CodeContextRequest) -> Option<String>;
}

impl std::fmt::Debug for dyn SymbolLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymbolLocator")
    }
}

/// Locator driven by a language profile's regex patterns.
pub struct RegexSymbolLocator {
    tree: Arc<dyn SourceTree>,
    profile: &'static LanguageProfile,
    category: EntityCategory,
}

impl RegexSymbolLocator {
    pub fn new(
        tree: Arc<dyn SourceTree>,
        profile: &'static LanguageProfile,
        category: EntityCategory,
    ) -> Self {
        Self {
            tree,
            profile,
            category,
        }
    }

    fn search_file(
        &self,
        path: &str,
        root: &str,
        pattern: &Regex,
        visited: &mut HashSet<String>,
    ) -> Option<String> {
        if !visited.insert(path.to_string()) {
            tracing::debug!(path, "import cycle, skipping already visited file");
            return None;
        }

        let content = match self.tree.read_file(path) {
            Ok(Some(content)) => content,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(path, error = %e, "failed to read source file");
                return None;
            }
        };

        if let Some(found) = pattern.find(&content) {
            return Some(found.as_str().trim().to_string());
        }

        // Not here: walk the imports. JVM-family files additionally see
        // their directory siblings first, approximating implicit
        // same-package visibility.
        let mut candidates = Vec::new();
        if self.profile.seed_siblings {
            let dir = parent_dir(path);
            if let Ok(names) = self.tree.list_dir(&dir) {
                let suffix = format!(".{}", self.profile.extension);
                for name in names {
                    if name.ends_with(&suffix) {
                        candidates.push(join(&dir, &name));
                    }
                }
            }
        }
        for module in self.profile.parse_imports(&content) {
            candidates.push(self.module_to_path(&module, root));
        }

        for candidate in candidates {
            if let Some(found) = self.search_file(&candidate, root, pattern, visited) {
                return Some(found);
            }
        }
        None
    }

    /// Convert an imported module name to a candidate file path, joined
    /// under the root directory unless it is already rooted there.
    fn module_to_path(&self, module: &str, root: &str) -> String {
        let module = module.trim();
        let rel = if module.contains('/') {
            // Path-style specifier (ES import).
            module.trim_start_matches("./").to_string()
        } else {
            module.trim_start_matches('.').replace('.', "/")
        };
        let suffix = format!(".{}", self.profile.extension);
        let with_ext = if rel.ends_with(&suffix) {
            rel
        } else {
            format!("{}{}", rel, suffix)
        };
        if root.is_empty() || with_ext.starts_with(&format!("{}/", root)) {
            with_ext
        } else {
            format!("{}/{}", root, with_ext)
        }
    }
}

impl SymbolLocator for RegexSymbolLocator {
    fn find_definition(&self, request: &CodeContextRequest) -> Option<String> {
        let simple = request
            .context_required_entity
            .rsplit('.')
            .next()
            .unwrap_or_default();
        if simple.is_empty() {
            return None;
        }

        let pattern = self.profile.definition_regex(self.category, simple)?;
        let root = parent_dir(&request.filename);
        let mut visited = HashSet::new();
        let found = self.search_file(&request.filename, &root, &pattern, &mut visited);
        tracing::debug!(
            entity = %request.context_required_entity,
            files_visited = visited.len(),
            found = found.is_some(),
            "definition lookup finished"
        );
        found
    }
}

fn parent_dir(path: &str) -> String {
    path.rsplit_once('/')
        .map(|(dir, _)| dir.to_string())
        .unwrap_or_default()
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::locator::profiles;
    use crate::source::FsSourceTree;
    use std::fs;
    use tempfile::tempdir;

    fn tree_with(files: &[(&str, &str)]) -> (tempfile::TempDir, Arc<dyn SourceTree>) {
        let dir = tempdir().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        let tree: Arc<dyn SourceTree> = Arc::new(FsSourceTree::new(dir.path()));
        (dir, tree)
    }

    fn python_locator(tree: Arc<dyn SourceTree>, category: EntityCategory) -> RegexSymbolLocator {
        RegexSymbolLocator::new(
            tree,
            profiles::for_language(Language::Python).unwrap(),
            category,
        )
    }

    fn request(filename: &str, entity: &str) -> CodeContextRequest {
        CodeContextRequest {
            filename: filename.to_string(),
            entity_category: "callable".to_string(),
            context_required_entity: entity.to_string(),
        }
    }

    #[test]
    fn finds_definition_in_requested_file() {
        let (_dir, tree) = tree_with(&[("app.py", "def main():\n    pass\n")]);
        let locator = python_locator(tree, EntityCategory::Callable);
        let found = locator.find_definition(&request("app.py", "app.main")).unwrap();
        assert_eq!(found, "def main():");
    }

    #[test]
    fn follows_imports_to_sibling_module() {
        let (_dir, tree) = tree_with(&[
            ("pkg/a.py", "import pkg.util\n\nvalue = pkg.util.helper()\n"),
            ("pkg/util.py", "def helper(): ...\n"),
        ]);
        let locator = python_locator(tree, EntityCategory::Callable);
        let found = locator
            .find_definition(&request("pkg/a.py", "pkg.util.helper"))
            .unwrap();
        assert_eq!(found, "def helper(): ...");
    }

    #[test]
    fn mutual_imports_terminate_with_each_file_visited_once() {
        // a imports b, b imports a, neither defines the symbol.
        let (_dir, tree) = tree_with(&[
            ("pkg/a.py", "import pkg.b\n"),
            ("pkg/b.py", "import pkg.a\n"),
        ]);
        let locator = python_locator(tree.clone(), EntityCategory::Callable);

        let req = request("pkg/a.py", "pkg.missing");
        let pattern = profiles::for_language(Language::Python)
            .unwrap()
            .definition_regex(EntityCategory::Callable, "missing")
            .unwrap();
        let mut visited = HashSet::new();
        let found = locator.search_file("pkg/a.py", "pkg", &pattern, &mut visited);
        assert!(found.is_none());
        assert_eq!(visited.len(), 2, "each file inspected exactly once");

        assert!(locator.find_definition(&req).is_none());
    }

    #[test]
    fn relative_import_resolves_against_requesting_directory() {
        let (_dir, tree) = tree_with(&[
            ("pkg/a.py", "from .util import helper\n"),
            ("pkg/util.py", "def helper():\n    return 1\n"),
        ]);
        let locator = python_locator(tree, EntityCategory::Callable);
        let found = locator
            .find_definition(&request("pkg/a.py", "util.helper"))
            .unwrap();
        assert_eq!(found, "def helper():");
    }

    #[test]
    fn java_siblings_are_searched_without_explicit_imports() {
        let (_dir, tree) = tree_with(&[
            ("com/app/Main.java", "public class Main {}\n"),
            (
                "com/app/Helper.java",
                "public class Helper {\n    public static int count() {\n        return 0;\n    }\n}\n",
            ),
        ]);
        let locator = RegexSymbolLocator::new(
            tree,
            profiles::for_language(Language::Java).unwrap(),
            EntityCategory::Callable,
        );
        let found = locator
            .find_definition(&CodeContextRequest {
                filename: "com/app/Main.java".to_string(),
                entity_category: "callable".to_string(),
                context_required_entity: "com.app.Helper.count".to_string(),
            })
            .unwrap();
        assert!(found.contains("static int count()"));
    }

    #[test]
    fn missing_symbol_returns_none() {
        let (_dir, tree) = tree_with(&[("app.py", "def other(): ...\n")]);
        let locator = python_locator(tree, EntityCategory::Callable);
        assert!(locator.find_definition(&request("app.py", "app.absent")).is_none());
    }

    #[test]
    fn empty_entity_name_returns_none() {
        let (_dir, tree) = tree_with(&[("app.py", "def main(): ...\n")]);
        let locator = python_locator(tree, EntityCategory::Callable);
        assert!(locator.find_definition(&request("app.py", "")).is_none());
    }

    #[test]
    fn category_parsing_is_case_insensitive() {
        assert_eq!(
            EntityCategory::from_wire("CALLABLE").unwrap(),
            EntityCategory::Callable
        );
        assert!(matches!(
            EntityCategory::from_wire("widget"),
            Err(LocatorError::InvalidCategory(_))
        ));
    }
}
