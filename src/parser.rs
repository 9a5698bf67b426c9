use crate::error::{Error, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// AST (Abstract Syntax Tree) parser for JavaScript source files.
///
/// The `AstParser` uses the tree-sitter TSX grammar, which accepts plain JavaScript together
/// with JSX, TypeScript annotations, top-level `await` and `import.meta`. These extensions are
/// only tolerated as syntax; nothing is type-checked or evaluated.
///
/// Tree-sitter always produces a tree, recovering from errors with `ERROR` and missing nodes.
/// A tree that contains any of them is reported as a parse failure so that half-understood
/// files never contribute call sites.
///
/// # Example
///
/// ```no_run
/// use postman_from_source::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("tools/1_cards/index.js")).unwrap();
/// println!("Root node: {}", parsed.root().kind());
/// ```
pub struct AstParser;

/// A successfully parsed source file with its syntax tree.
///
/// Tree-sitter nodes only carry byte ranges, so the source text is kept alongside the tree.
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The source text the tree was built from
    pub source: String,
    /// The parsed syntax tree
    pub tree: Tree,
}

impl ParsedFile {
    /// Root node of the syntax tree
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text covered by `node`
    pub fn text(&self, node: Node<'_>) -> &str {
        &self.source[node.byte_range()]
    }
}

impl AstParser {
    /// Parses a single source file into an AST.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains a syntax error
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)?;

        Self::parse_source(path, content)
    }

    /// Parses already loaded source text, attributing it to `path`.
    pub fn parse_source(path: &Path, source: String) -> Result<ParsedFile> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())?;

        let tree = parser.parse(&source, None).ok_or_else(|| Error::ParseError {
            file: path.to_path_buf(),
            message: "parser returned no tree".to_string(),
        })?;

        let root = tree.root_node();
        if root.has_error() {
            let position = first_error(root)
                .map(|n| n.start_position())
                .unwrap_or_else(|| root.start_position());
            return Err(Error::ParseError {
                file: path.to_path_buf(),
                message: format!(
                    "syntax error at line {}, column {}",
                    position.row + 1,
                    position.column + 1
                ),
            });
        }

        debug!("Successfully parsed file: {}", path.display());

        Ok(ParsedFile {
            path: path.to_path_buf(),
            source,
            tree,
        })
    }

    /// Parses multiple source files, continuing even if some fail.
    ///
    /// Files that fail to parse are logged as warnings, but parsing continues for remaining files.
    /// The returned vector has one entry per input path, in input order.
    pub fn parse_files(paths: &[PathBuf]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", paths.len());

        let results: Vec<Result<ParsedFile>> = paths
            .iter()
            .map(|path| {
                Self::parse_file(path).inspect_err(|e| {
                    warn!("Failed to parse {}: {}", path.display(), e);
                })
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}

/// Finds the first `ERROR` or missing node in document order.
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}
