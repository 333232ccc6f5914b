use recast_core::TextRange;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unterminated package declaration at offset {offset}")]
    UnterminatedPackage { offset: usize },
    #[error("unterminated import declaration at offset {offset}")]
    UnterminatedImport { offset: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageDecl {
    pub name: String,
    /// Span of `package ...;` without the line terminator.
    pub range: TextRange,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportDecl {
    /// Qualified name without the `.*` suffix for on-demand imports.
    pub qualified: String,
    pub is_static: bool,
    pub on_demand: bool,
    /// Span of `import ...;` without the line terminator.
    pub range: TextRange,
}

impl ImportDecl {
    pub fn render(&self) -> String {
        let mut out = String::from("import ");
        if self.is_static {
            out.push_str("static ");
        }
        out.push_str(&self.qualified);
        if self.on_demand {
            out.push_str(".*");
        }
        out.push(';');
        out
    }
}

/// Parsed compilation unit: resolved header, opaque body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxTree {
    source: String,
    resolve_bindings: bool,
    package: Option<PackageDecl>,
    imports: Vec<ImportDecl>,
    import_region: TextRange,
}

impl SyntaxTree {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether binding resolution was requested at parse time. Fixed for the
    /// lifetime of the tree.
    pub fn resolve_bindings(&self) -> bool {
        self.resolve_bindings
    }

    pub fn package(&self) -> Option<&PackageDecl> {
        self.package.as_ref()
    }

    pub fn package_name(&self) -> Option<&str> {
        self.package.as_ref().map(|p| p.name.as_str())
    }

    pub fn imports(&self) -> &[ImportDecl] {
        &self.imports
    }

    /// Span of the import section, or the empty insertion point where a new
    /// section would go when the unit has no imports.
    pub fn import_region(&self) -> TextRange {
        self.import_region
    }

    /// True when a new import section would be inserted below the package
    /// declaration rather than at the top of the unit.
    pub fn import_section_follows_package(&self) -> bool {
        self.imports.is_empty() && self.package.is_some()
    }
}

/// Parse a compilation unit's header.
///
/// `resolve_bindings` is recorded on the tree; the shallow parse itself does
/// not change, but callers that later ask for binding-sensitive rewrites can
/// check what was requested.
pub fn parse_unit(source: &str, resolve_bindings: bool) -> Result<SyntaxTree, ParseError> {
    let mut package = None;
    let mut imports: Vec<ImportDecl> = Vec::new();
    let mut in_block_comment = false;
    let mut after_package_offset = 0usize;

    let mut offset = 0usize;
    for line in source.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let trimmed = line.trim();

        if in_block_comment {
            if let Some(close) = trimmed.find("*/") {
                let rest = trimmed[close + 2..].trim();
                if rest.is_empty() {
                    in_block_comment = false;
                    continue;
                }
                // Code after the comment close ends the header scan.
                break;
            }
            continue;
        }
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }
        if trimmed.starts_with("/*") {
            if !trimmed.contains("*/") {
                in_block_comment = true;
            }
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("package") {
            if rest.starts_with(char::is_whitespace) {
                let semi = line
                    .find(';')
                    .ok_or(ParseError::UnterminatedPackage { offset: line_start })?;
                let decl_start = line_start + (line.len() - line.trim_start().len());
                let name = line[..semi]
                    .trim_start()
                    .trim_start_matches("package")
                    .trim()
                    .to_string();
                package = Some(PackageDecl {
                    name,
                    range: TextRange::new(decl_start, line_start + semi + 1),
                });
                after_package_offset = offset;
                continue;
            }
        }

        if let Some(rest) = trimmed.strip_prefix("import") {
            if rest.starts_with(char::is_whitespace) {
                let semi = line
                    .find(';')
                    .ok_or(ParseError::UnterminatedImport { offset: line_start })?;
                let decl_start = line_start + (line.len() - line.trim_start().len());
                let mut name = line[..semi]
                    .trim_start()
                    .trim_start_matches("import")
                    .trim();
                let is_static = if let Some(stripped) = name.strip_prefix("static") {
                    if stripped.starts_with(char::is_whitespace) {
                        name = stripped.trim();
                        true
                    } else {
                        false
                    }
                } else {
                    false
                };
                let (qualified, on_demand) = match name.strip_suffix(".*") {
                    Some(prefix) => (prefix.to_string(), true),
                    None => (name.to_string(), false),
                };
                imports.push(ImportDecl {
                    qualified,
                    is_static,
                    on_demand,
                    range: TextRange::new(decl_start, line_start + semi + 1),
                });
                continue;
            }
        }

        // First type declaration (or anything else): the header ends here.
        break;
    }

    let import_region = match (imports.first(), imports.last()) {
        (Some(first), Some(last)) => TextRange::new(first.range.start, last.range.end),
        _ => TextRange::empty(if package.is_some() {
            after_package_offset
        } else {
            0
        }),
    };

    Ok(SyntaxTree {
        source: source.to_string(),
        resolve_bindings,
        package,
        imports,
        import_region,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const UNIT: &str = "package p.q;\n\nimport java.util.List;\nimport static java.util.Objects.requireNonNull;\nimport java.io.*;\n\nclass Foo {\n}\n";

    #[test]
    fn parses_package_and_imports() {
        let tree = parse_unit(UNIT, true).unwrap();
        assert_eq!(tree.package_name(), Some("p.q"));
        assert!(tree.resolve_bindings());

        let imports: Vec<_> = tree.imports().iter().map(ImportDecl::render).collect();
        assert_eq!(
            imports,
            vec![
                "import java.util.List;",
                "import static java.util.Objects.requireNonNull;",
                "import java.io.*;",
            ]
        );
        assert!(tree.imports()[1].is_static);
        assert!(tree.imports()[2].on_demand);
    }

    #[test]
    fn import_region_covers_the_whole_section() {
        let tree = parse_unit(UNIT, false).unwrap();
        let region = tree.import_region();
        assert_eq!(
            &UNIT[region.start..region.end],
            "import java.util.List;\nimport static java.util.Objects.requireNonNull;\nimport java.io.*;"
        );
    }

    #[test]
    fn no_imports_yields_insertion_point_after_package() {
        let src = "package p;\n\nclass Foo {}\n";
        let tree = parse_unit(src, false).unwrap();
        assert!(tree.import_region().is_empty());
        assert_eq!(tree.import_region().start, "package p;\n".len());
        assert!(tree.import_section_follows_package());
    }

    #[test]
    fn default_package_insertion_point_is_the_unit_start() {
        let src = "class Foo {}\n";
        let tree = parse_unit(src, false).unwrap();
        assert_eq!(tree.import_region(), TextRange::empty(0));
        assert!(tree.package().is_none());
    }

    #[test]
    fn header_comments_are_skipped() {
        let src = "/*\n * Licensed.\n */\npackage p;\n// note\nimport a.B;\nclass C {}\n";
        let tree = parse_unit(src, false).unwrap();
        assert_eq!(tree.package_name(), Some("p"));
        assert_eq!(tree.imports().len(), 1);
    }

    #[test]
    fn unterminated_import_is_an_error() {
        let src = "import java.util.List\nclass Foo {}\n";
        let err = parse_unit(src, false).unwrap_err();
        assert_eq!(err, ParseError::UnterminatedImport { offset: 0 });
    }
}
