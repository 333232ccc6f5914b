//! Clean-ups: option-gated source hygiene fixes computed per unit.

use std::collections::BTreeSet;

use recast_core::{ProgressMonitor, TextRange};
use recast_syntax::SyntaxTree;
use regex::Regex;

use crate::change::CompilationUnitChange;
use crate::refactoring::{find_word, matching_brace_end, references_name, RefactorError};
use crate::resource::CompilationUnit;
use crate::rewrite::CompilationUnitRewrite;

/// Option keys understood by the built-in clean-ups.
pub mod option_keys {
    pub const CONVERT_FOR_LOOP: &str = "cleanup.convert_for_loop_to_enhanced";
}

/// Set of enabled clean-up option keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CleanUpOptions {
    enabled: BTreeSet<String>,
}

impl CleanUpOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&mut self, key: &str) {
        self.enabled.insert(key.to_string());
    }

    pub fn disable(&mut self, key: &str) {
        self.enabled.remove(key);
    }

    pub fn is_enabled(&self, key: &str) -> bool {
        self.enabled.contains(key)
    }
}

/// One clean-up rule. Implementations are stateless between invocations
/// and hold no references to the trees they are handed.
pub trait CleanUp {
    /// Whether this rule needs a parsed tree for the unit at all.
    fn requires_ast(&self, unit: &CompilationUnit) -> bool;

    /// Human-readable step descriptions, one per thing the rule would do.
    fn descriptions(&self) -> Vec<String>;

    /// Compute the fix for one unit, or `None` when nothing applies.
    fn create_fix(
        &self,
        unit: &CompilationUnit,
        tree: &SyntaxTree,
        pm: &ProgressMonitor,
    ) -> Result<Option<CompilationUnitChange>, RefactorError>;
}

struct IndexedLoop {
    header: TextRange,
    body: TextRange,
    index: String,
    array: String,
}

/// Rewrites `for (int i = 0; i < xs.length; i++)` loops whose body only
/// reads `xs[i]` into enhanced `for` loops.
#[derive(Clone, Debug, Default)]
pub struct ConvertLoopCleanUp {
    enabled: bool,
}

impl ConvertLoopCleanUp {
    pub fn new(options: &CleanUpOptions) -> Self {
        Self {
            enabled: options.is_enabled(option_keys::CONVERT_FOR_LOOP),
        }
    }

    fn loops(source: &str) -> Vec<IndexedLoop> {
        // The recognized shape is deliberately narrow; anything fancier
        // (derived start offsets, strides, reverse iteration) is left
        // alone.
        let header = Regex::new(
            r"for\s*\(\s*int\s+(\w+)\s*=\s*0\s*;\s*(\w+)\s*<\s*(\w+)\.length\s*;\s*(?:(\w+)\+\+|\+\+(\w+))\s*\)\s*\{",
        )
        .expect("loop header pattern is valid");

        let mut found = Vec::new();
        for caps in header.captures_iter(source) {
            let whole = match caps.get(0) {
                Some(m) => m,
                None => continue,
            };
            let index = &caps[1];
            let incremented = caps.get(4).or_else(|| caps.get(5));
            if caps[2] != *index || incremented.map(|m| m.as_str()) != Some(index) {
                continue;
            }
            let open = whole.end() - 1;
            let Some(close) = matching_brace_end(source, open) else {
                continue;
            };
            found.push(IndexedLoop {
                header: TextRange::new(whole.start(), whole.end()),
                body: TextRange::new(open + 1, close - 1),
                index: index.to_string(),
                array: caps[3].to_string(),
            });
        }
        found
    }

    /// Element accesses `xs[i]` within the body, or `None` when the index
    /// or array is used any other way (including writes).
    fn read_only_accesses(source: &str, lp: &IndexedLoop) -> Option<Vec<TextRange>> {
        let body = &source[lp.body.start..lp.body.end];
        let access = Regex::new(&format!(
            r"\b{}\s*\[\s*{}\s*\]",
            regex::escape(&lp.array),
            regex::escape(&lp.index)
        ))
        .expect("access pattern is valid");

        let mut accesses = Vec::new();
        let mut masked = body.to_string();
        for m in access.find_iter(body) {
            let after = body[m.end()..].trim_start();
            if after.starts_with("++")
                || after.starts_with("--")
                || (after.starts_with('=') && !after.starts_with("=="))
                || ["+=", "-=", "*=", "/=", "%="].iter().any(|op| after.starts_with(op))
            {
                return None;
            }
            accesses.push(TextRange::new(lp.body.start + m.start(), lp.body.start + m.end()));
            masked.replace_range(m.range(), &" ".repeat(m.len()));
        }
        // Any surviving mention of the index or a second use of the array
        // means the loop shape is not a plain element read.
        if references_name(&masked, &lp.index) || references_name(&masked, &lp.array) {
            return None;
        }
        if accesses.is_empty() {
            return None;
        }
        Some(accesses)
    }

    /// Declared element type of `array`, from a `Type[] array` declaration
    /// in the same unit.
    fn element_type(source: &str, array: &str) -> Option<String> {
        let decl = Regex::new(&format!(
            r"([A-Za-z_$][\w$.<>]*)\s*\[\]\s+{}\b",
            regex::escape(array)
        ))
        .expect("declaration pattern is valid");
        decl.captures(source).map(|caps| caps[1].to_string())
    }

    fn element_name(body: &str, array: &str) -> String {
        let candidate = array
            .strip_suffix('s')
            .filter(|base| !base.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| "element".to_string());
        if find_word(body, &candidate).is_none() && candidate != *array {
            candidate
        } else {
            "element".to_string()
        }
    }
}

impl CleanUp for ConvertLoopCleanUp {
    fn requires_ast(&self, unit: &CompilationUnit) -> bool {
        self.enabled && unit.source.contains("for")
    }

    fn descriptions(&self) -> Vec<String> {
        if self.enabled {
            vec!["Convert 'for' loops to enhanced 'for' loops".to_string()]
        } else {
            Vec::new()
        }
    }

    fn create_fix(
        &self,
        unit: &CompilationUnit,
        tree: &SyntaxTree,
        pm: &ProgressMonitor,
    ) -> Result<Option<CompilationUnitChange>, RefactorError> {
        if !self.enabled {
            return Ok(None);
        }
        let source = tree.source();
        let mut rewrite = CompilationUnitRewrite::from_parsed(unit.clone(), tree.clone());
        let mut converted = false;
        for lp in Self::loops(source) {
            let Some(accesses) = Self::read_only_accesses(source, &lp) else {
                continue;
            };
            let Some(element_type) = Self::element_type(source, &lp.array) else {
                continue;
            };
            let body = &source[lp.body.start..lp.body.end];
            let element = Self::element_name(body, &lp.array);

            rewrite.create_group_description("Convert to enhanced 'for' loop");
            rewrite.ast_rewrite()?.replace(
                // Keep the open brace; only the header is rewritten.
                TextRange::new(lp.header.start, lp.header.end),
                format!("for ({element_type} {element} : {}) {{", lp.array),
            );
            for access in accesses {
                rewrite.ast_rewrite()?.replace(access, element.clone());
            }
            converted = true;
        }
        if !converted {
            return Ok(None);
        }
        let change = rewrite.create_change(pm)?;
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::resource::{ResourceHandle, ResourcePath};
    use recast_syntax::parse_unit;

    const UNIT: &str = "\
package p;

class Loops {
    void sum(int[] values) {
        int total = 0;
        for (int i = 0; i < values.length; i++) {
            total += values[i];
        }
    }

    void touch(int[] values) {
        for (int i = 0; i < values.length; i++) {
            values[i] = 0;
        }
    }

    void skip(int[] values) {
        for (int i = 1; i < values.length; i++) {
            use(values[i]);
        }
    }

    void use(int v) {}
}
";

    fn fixture() -> (CompilationUnit, SyntaxTree) {
        let handle = ResourceHandle::file(ResourcePath::parse("/P/Loops.java").unwrap());
        let unit = CompilationUnit::new(handle, UNIT);
        let tree = parse_unit(UNIT, false).unwrap();
        (unit, tree)
    }

    fn enabled() -> ConvertLoopCleanUp {
        let mut options = CleanUpOptions::new();
        options.enable(option_keys::CONVERT_FOR_LOOP);
        ConvertLoopCleanUp::new(&options)
    }

    #[test]
    fn converts_the_read_only_loop_and_leaves_the_rest() {
        let (unit, tree) = fixture();
        let pm = ProgressMonitor::default();
        let change = enabled()
            .create_fix(&unit, &tree, &pm)
            .unwrap()
            .expect("fix");
        let text = change.preview_text().unwrap();
        assert!(text.contains("for (int value : values) {"));
        assert!(text.contains("total += value;"));
        // The writing loop and the offset loop keep their indexed form.
        assert!(text.contains("values[i] = 0;"));
        assert!(text.contains("for (int i = 1; i < values.length; i++)"));
        assert_eq!(change.groups().len(), 1);
    }

    #[test]
    fn disabled_rule_produces_nothing() {
        let (unit, tree) = fixture();
        let rule = ConvertLoopCleanUp::new(&CleanUpOptions::new());
        let pm = ProgressMonitor::default();
        assert!(rule.create_fix(&unit, &tree, &pm).unwrap().is_none());
        assert!(rule.descriptions().is_empty());
    }

    #[test]
    fn unknown_element_type_leaves_the_loop_alone() {
        let src = "class A {\n    void m() {\n        for (int i = 0; i < xs.length; i++) {\n            use(xs[i]);\n        }\n    }\n}\n";
        let handle = ResourceHandle::file(ResourcePath::parse("/P/A.java").unwrap());
        let unit = CompilationUnit::new(handle, src);
        let tree = parse_unit(src, false).unwrap();
        let pm = ProgressMonitor::default();
        assert!(enabled().create_fix(&unit, &tree, &pm).unwrap().is_none());
    }
}
