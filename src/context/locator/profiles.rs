//! Per-language definition and import patterns.
//!
//! A profile is pattern data, not behavior: the `{name}` hole in each
//! definition template is filled with the escaped simple name at lookup
//! time, while the import pattern is fixed and compiled once. The patterns
//! are line-oriented approximations, good enough to hand the assistant a
//! definition snippet; they are not parsers.

use std::sync::LazyLock;

use regex::Regex;

use crate::context::locator::{EntityCategory, Language};

/// Search patterns for one language.
pub struct LanguageProfile {
    pub language: Language,
    /// Extension appended when converting module names to file paths.
    pub extension: &'static str,
    /// Whether same-directory files are searched before explicit imports
    /// (implicit same-package visibility on the JVM).
    pub seed_siblings: bool,
    callable: &'static str,
    data: &'static str,
    type_def: &'static str,
    import: Regex,
}

impl LanguageProfile {
    /// Compile the definition pattern for a category and simple name.
    pub fn definition_regex(&self, category: EntityCategory, name: &str) -> Option<Regex> {
        let template = match category {
            EntityCategory::Callable => self.callable,
            EntityCategory::Data => self.data,
            EntityCategory::Type => self.type_def,
        };
        let pattern = template.replace("{name}", &regex::escape(name));
        match Regex::new(&pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::warn!(language = ?self.language, error = %e, "definition pattern failed to compile");
                None
            }
        }
    }

    /// Extract imported module names from file content, in parse order.
    pub fn parse_imports(&self, content: &str) -> Vec<String> {
        let mut modules = Vec::new();
        for caps in self.import.captures_iter(content) {
            let raw = (1..caps.len())
                .find_map(|i| caps.get(i))
                .map(|m| m.as_str())
                .unwrap_or_default();
            for part in raw.split(',') {
                let part = part.trim().trim_end_matches(';').trim_end_matches(".*");
                // "x as y" aliases keep only the module.
                let part = part.split_whitespace().next().unwrap_or_default();
                let part = part.trim_end_matches('.');
                if !part.is_empty() && part != "." {
                    modules.push(part.to_string());
                }
            }
        }
        modules
    }
}

static PROFILES: LazyLock<Vec<LanguageProfile>> = LazyLock::new(|| {
    vec![
        LanguageProfile {
            language: Language::Python,
            extension: "py",
            seed_siblings: false,
            callable: r"(?m)^[ \t]*(?:async[ \t]+)?def[ \t]+{name}[ \t]*\([^)]*\)[^:\n]*:.*$",
            data: r"(?m)^[ \t]*{name}[ \t]*(?::[^=\n]+)?=[ \t]*[^=\s].*$",
            type_def: r"(?m)^[ \t]*class[ \t]+{name}[ \t]*(?:\([^)]*\))?[ \t]*:.*$",
            import: Regex::new(
                r"(?m)^[ \t]*(?:from[ \t]+([.\w]+)[ \t]+import[ \t]+|import[ \t]+([\w., \t]+))",
            )
            .unwrap(),
        },
        LanguageProfile {
            language: Language::Java,
            extension: "java",
            seed_siblings: true,
            callable: r"(?m)^[ \t]*(?:(?:public|protected|private|static|final|abstract|synchronized|native|default|strictfp)[ \t]+)*(?:<[^>\n]+>[ \t]+)?(?:[\w$.<>\[\],]+[ \t]+)+{name}[ \t]*\([^)]*\)[ \t]*(?:throws[ \t][\w$., \t]+)?\{?[ \t]*$",
            data: r"(?m)^[ \t]*(?:(?:public|protected|private|static|final|transient|volatile)[ \t]+)+[\w$.<>\[\]]+[ \t]+{name}[ \t]*(?:=[^;\n]*)?;",
            type_def: r"(?m)^[ \t]*(?:(?:public|protected|private|abstract|final|static|sealed)[ \t]+)*(?:class|interface|enum|record)[ \t]+{name}\b[^{\n]*\{?[ \t]*$",
            import: Regex::new(r"(?m)^[ \t]*import[ \t]+(?:static[ \t]+)?([\w$.*]+)[ \t]*;").unwrap(),
        },
        LanguageProfile {
            language: Language::Kotlin,
            extension: "kt",
            seed_siblings: true,
            callable: r"(?m)^[ \t]*(?:(?:public|private|internal|protected|open|override|suspend|inline|operator|infix|tailrec)[ \t]+)*fun[ \t]+(?:<[^>\n]+>[ \t]+)?(?:[\w$.]+\.)?{name}[ \t]*\(.*$",
            data: r"(?m)^[ \t]*(?:(?:public|private|internal|protected|open|override|const|lateinit)[ \t]+)*(?:val|var)[ \t]+{name}\b.*$",
            type_def: r"(?m)^[ \t]*(?:(?:public|private|internal|protected|open|abstract|sealed|data|enum|annotation|inner|value)[ \t]+)*(?:class|interface|object)[ \t]+{name}\b.*$",
            import: Regex::new(
                r"(?m)^[ \t]*import[ \t]+([\w$.*]+)(?:[ \t]+as[ \t]+\w+)?[ \t]*$",
            )
            .unwrap(),
        },
        LanguageProfile {
            language: Language::JavaScript,
            extension: "js",
            seed_siblings: false,
            callable: r"(?m)^[ \t]*(?:export[ \t]+)?(?:default[ \t]+)?(?:async[ \t]+)?function[ \t]*\*?[ \t]*{name}[ \t]*\([^)]*\).*$|^[ \t]*(?:export[ \t]+)?(?:const|let|var)[ \t]+{name}[ \t]*=[ \t]*(?:async[ \t]+)?(?:function\b|\().*$",
            data: r"(?m)^[ \t]*(?:export[ \t]+)?(?:const|let|var)[ \t]+{name}[ \t]*=[ \t]*[^=\s].*$",
            type_def: r"(?m)^[ \t]*(?:export[ \t]+)?(?:default[ \t]+)?class[ \t]+{name}\b.*$",
            import: Regex::new(
                r#"(?m)^[ \t]*(?:import|export)[^'"\n]*['"]([^'"\n]+)['"]|require\([ \t]*['"]([^'"\n]+)['"]"#,
            )
            .unwrap(),
        },
        LanguageProfile {
            language: Language::TypeScript,
            extension: "ts",
            seed_siblings: false,
            callable: r"(?m)^[ \t]*(?:export[ \t]+)?(?:default[ \t]+)?(?:async[ \t]+)?function[ \t]*\*?[ \t]*{name}[ \t]*\([^)]*\).*$|^[ \t]*(?:export[ \t]+)?(?:const|let|var)[ \t]+{name}[ \t]*=[ \t]*(?:async[ \t]+)?(?:function\b|\().*$",
            data: r"(?m)^[ \t]*(?:export[ \t]+)?(?:const|let|var)[ \t]+{name}[ \t]*(?::[^=\n]+)?=[ \t]*[^=\s].*$",
            type_def: r"(?m)^[ \t]*(?:export[ \t]+)?(?:declare[ \t]+)?(?:(?:abstract[ \t]+)?class|interface|enum)[ \t]+{name}\b.*$|^[ \t]*(?:export[ \t]+)?type[ \t]+{name}[ \t]*=.*$",
            import: Regex::new(
                r#"(?m)^[ \t]*(?:import|export)[^'"\n]*['"]([^'"\n]+)['"]|require\([ \t]*['"]([^'"\n]+)['"]"#,
            )
            .unwrap(),
        },
    ]
});

/// All registered profiles.
pub fn all() -> &'static [LanguageProfile] {
    &PROFILES
}

/// The profile for a language, if one is registered.
pub fn for_language(language: Language) -> Option<&'static LanguageProfile> {
    PROFILES.iter().find(|p| p.language == language)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(language: Language, category: EntityCategory, name: &str, content: &str) -> Option<String> {
        let profile = for_language(language).unwrap();
        let regex = profile.definition_regex(category, name).unwrap();
        regex.find(content).map(|m| m.as_str().trim().to_string())
    }

    #[test]
    fn python_callable_matches_def_line() {
        let found = find(
            Language::Python,
            EntityCategory::Callable,
            "helper",
            "x = 1\ndef helper(a, b):\n    return a\n",
        );
        assert_eq!(found.unwrap(), "def helper(a, b):");
    }

    #[test]
    fn python_data_skips_comparisons() {
        let content = "limit == 3\nlimit = 3\n";
        let found = find(Language::Python, EntityCategory::Data, "limit", content);
        assert_eq!(found.unwrap(), "limit = 3");
    }

    #[test]
    fn python_imports_parse_both_forms() {
        let profile = for_language(Language::Python).unwrap();
        let modules = profile.parse_imports(
            "import os, pkg.util\nfrom pkg.helpers import thing\nimport numpy as np\n",
        );
        assert_eq!(modules, vec!["os", "pkg.util", "pkg.helpers", "numpy"]);
    }

    #[test]
    fn java_callable_matches_method_not_invocation() {
        let content = "        helper(arg);\n    public static int helper(int x) {\n";
        let found = find(Language::Java, EntityCategory::Callable, "helper", content);
        assert_eq!(found.unwrap(), "public static int helper(int x) {");
    }

    #[test]
    fn java_type_matches_record() {
        let found = find(
            Language::Java,
            EntityCategory::Type,
            "Point",
            "public record Point(int x, int y) {\n",
        );
        assert!(found.unwrap().starts_with("public record Point"));
    }

    #[test]
    fn java_imports_strip_static_and_wildcards() {
        let profile = for_language(Language::Java).unwrap();
        let modules =
            profile.parse_imports("import com.app.Helper;\nimport static org.util.Assert;\nimport com.app.sub.*;\n");
        assert_eq!(modules, vec!["com.app.Helper", "org.util.Assert", "com.app.sub"]);
    }

    #[test]
    fn kotlin_callable_matches_fun() {
        let found = find(
            Language::Kotlin,
            EntityCategory::Callable,
            "render",
            "override fun render(ctx: Context): View {\n",
        );
        assert!(found.unwrap().starts_with("override fun render"));
    }

    #[test]
    fn typescript_type_matches_interface_and_alias() {
        let content = "export interface Shape {\n  area(): number\n}\n";
        let found = find(Language::TypeScript, EntityCategory::Type, "Shape", content);
        assert_eq!(found.unwrap(), "export interface Shape {");

        let alias = "export type Point = { x: number }\n";
        let found = find(Language::TypeScript, EntityCategory::Type, "Point", alias);
        assert!(found.unwrap().starts_with("export type Point"));
    }

    #[test]
    fn javascript_imports_capture_path_specifiers() {
        let profile = for_language(Language::JavaScript).unwrap();
        let modules = profile.parse_imports(
            "import { helper } from './util'\nconst fs = require('fs')\n",
        );
        assert_eq!(modules, vec!["./util", "fs"]);
    }

    #[test]
    fn arrow_function_counts_as_callable() {
        let found = find(
            Language::JavaScript,
            EntityCategory::Callable,
            "fetchAll",
            "export const fetchAll = async (ids) => {\n",
        );
        assert!(found.unwrap().contains("fetchAll"));
    }
}
