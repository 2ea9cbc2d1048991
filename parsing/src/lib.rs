//! Language detection by extension and a tree-sitter parsing wrapper.
//!
//! Grammar selection follows `codegraph_prep::core::parse::set_language`'s
//! per-language `Parser::set_language` dispatch; the language table itself is
//! rebuilt to the full extension set named here rather than the teacher's
//! narrower Dart-centric one.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;
use tree_sitter::{Parser as TsParser, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    Tsx,
    JavaScript,
    Python,
    Rust,
    Go,
    Java,
    Css,
    Json,
    Html,
    Yaml,
    Markdown,
}

impl Language {
    /// Detect from a basename: lowercase the suffix after the last dot.
    /// A basename starting with a dot and containing no further dot (e.g.
    /// `.gitignore`) has no extension and returns `None`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let basename = path.file_name()?.to_str()?;
        if basename.starts_with('.') && !basename[1..].contains('.') {
            return None;
        }
        let ext = basename.rsplit('.').next()?.to_ascii_lowercase();
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "py" | "pyw" => Some(Self::Python),
            "rs" => Some(Self::Rust),
            "go" => Some(Self::Go),
            "java" => Some(Self::Java),
            "css" => Some(Self::Css),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            "yml" | "yaml" => Some(Self::Yaml),
            "md" => Some(Self::Markdown),
            _ => None,
        }
    }

    /// Only this subset is eligible for symbol extraction.
    pub fn is_code(&self) -> bool {
        matches!(
            self,
            Self::TypeScript
                | Self::Tsx
                | Self::JavaScript
                | Self::Python
                | Self::Rust
                | Self::Go
                | Self::Java
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Rust => "rust",
            Self::Go => "go",
            Self::Java => "java",
            Self::Css => "css",
            Self::Json => "json",
            Self::Html => "html",
            Self::Yaml => "yaml",
            Self::Markdown => "markdown",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses source text into a tree-sitter `Tree` for one of the code
/// languages. Grammar-unavailable and parse failures degrade to `None`
/// rather than propagating an error: the file stays text-searchable but
/// yields no symbols.
#[derive(Default)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, source: &str, lang: Language) -> Option<Tree> {
        let mut parser = TsParser::new();
        if let Err(err) = set_language(&mut parser, lang) {
            warn!(language = %lang, error = %err, "parsing: grammar unavailable");
            return None;
        }
        match parser.parse(source, None) {
            Some(tree) => Some(tree),
            None => {
                warn!(language = %lang, "parsing: tree-sitter returned no tree");
                None
            }
        }
    }
}

fn set_language(parser: &mut TsParser, lang: Language) -> Result<(), tree_sitter::LanguageError> {
    match lang {
        Language::Rust => parser.set_language(&tree_sitter_rust::LANGUAGE.into()),
        Language::Python => parser.set_language(&tree_sitter_python::LANGUAGE.into()),
        Language::JavaScript => parser.set_language(&tree_sitter_javascript::LANGUAGE.into()),
        Language::TypeScript => {
            parser.set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
        }
        Language::Tsx => parser.set_language(&tree_sitter_typescript::LANGUAGE_TSX.into()),
        Language::Go => parser.set_language(&tree_sitter_go::LANGUAGE.into()),
        Language::Java => parser.set_language(&tree_sitter_java::LANGUAGE.into()),
        Language::Css | Language::Json | Language::Html | Language::Yaml | Language::Markdown => {
            unreachable!("non-code languages are never parsed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_known_extensions() {
        assert_eq!(
            Language::from_path(&PathBuf::from("a.ts")),
            Some(Language::TypeScript)
        );
        assert_eq!(
            Language::from_path(&PathBuf::from("a.tsx")),
            Some(Language::Tsx)
        );
        assert_eq!(
            Language::from_path(&PathBuf::from("a.mjs")),
            Some(Language::JavaScript)
        );
        assert_eq!(
            Language::from_path(&PathBuf::from("a.PY")),
            Some(Language::Python)
        );
        assert_eq!(Language::from_path(&PathBuf::from("a.xyz")), None);
    }

    #[test]
    fn dotfile_without_further_dot_has_no_extension() {
        assert_eq!(Language::from_path(&PathBuf::from(".gitignore")), None);
    }

    #[test]
    fn only_code_languages_are_code() {
        assert!(Language::Rust.is_code());
        assert!(Language::Go.is_code());
        assert!(!Language::Json.is_code());
        assert!(!Language::Markdown.is_code());
    }

    #[test]
    fn parses_simple_rust_function() {
        let parser = Parser::new();
        let tree = parser.parse("fn foo() {}", Language::Rust).unwrap();
        assert_eq!(tree.root_node().kind(), "source_file");
    }
}
