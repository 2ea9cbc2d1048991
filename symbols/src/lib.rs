//! Per-language symbol and import extraction.
//!
//! One `SymbolExtractor` strategy per language behind a single trait, the
//! way `codegraph_prep::languages::{dart,rust,typescript}` dispatch from
//! `core::parse::parse_and_extract` — except every strategy here is a full
//! implementation rather than a single-file-node stub.

mod languages;
mod support;

use rk_parsing::Language;
use tree_sitter::Tree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    Class,
    Interface,
    Type,
    Method,
    Property,
    Variable,
    Enum,
    Module,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Type => "type",
            Self::Method => "method",
            Self::Property => "property",
            Self::Variable => "variable",
            Self::Enum => "enum",
            Self::Module => "module",
        }
    }
}

/// A named, locatable code entity.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub signature: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    pub start_col: usize,
    pub end_col: usize,
    pub parent_name: Option<String>,
    pub docstring: Option<String>,
    pub exported: bool,
    /// Full body text, used by the graph builder to attribute call/import
    /// edges to the symbol that references them.
    pub body: String,
}

/// An import/use/from-import declaration.
#[derive(Debug, Clone)]
pub struct ImportDeclaration {
    /// The raw module specifier as written (e.g. `./b.js`, `std::collections::HashMap`).
    pub source: String,
    /// Names brought into scope by this import.
    pub imported_names: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub symbols: Vec<Symbol>,
    pub imports: Vec<ImportDeclaration>,
}

pub trait SymbolExtractor {
    fn extract(&self, tree: &Tree, source: &str) -> ExtractionResult;
}

/// Resolve the extractor strategy for a code language. Returns `None` for
/// non-code languages and for languages without an implemented strategy.
pub fn extractor_for(language: Language) -> Option<Box<dyn SymbolExtractor>> {
    match language {
        Language::Rust => Some(Box::new(languages::rust::RustExtractor)),
        Language::TypeScript | Language::Tsx | Language::JavaScript => {
            Some(Box::new(languages::typescript::TypeScriptExtractor))
        }
        Language::Python => Some(Box::new(languages::python::PythonExtractor)),
        Language::Go => Some(Box::new(languages::go::GoExtractor)),
        Language::Java => Some(Box::new(languages::java::JavaExtractor)),
        Language::Css | Language::Json | Language::Html | Language::Yaml | Language::Markdown => {
            None
        }
    }
}
