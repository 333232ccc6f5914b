use std::collections::BTreeSet;

use recast_core::{ProgressMonitor, TextEdit, TextRange};

use crate::parse::{ImportDecl, SyntaxTree};
use crate::rewrite::RewriteError;

/// Recorder for import-section changes of one compilation unit.
///
/// The rewrite snapshots the existing import section at creation and records
/// additions/removals against it. Materialization recomputes the whole
/// section; when the normalized result is textually identical to what is
/// already in the unit, no edit is produced.
#[derive(Debug)]
pub struct ImportRewrite {
    existing: Vec<ImportDecl>,
    existing_text: String,
    region: TextRange,
    follows_package: bool,
    adds: Vec<(bool, String)>,
    removes: BTreeSet<(bool, String)>,
}

impl ImportRewrite {
    pub fn for_tree(tree: &SyntaxTree) -> Self {
        let region = tree.import_region();
        Self {
            existing: tree.imports().to_vec(),
            existing_text: tree.source()[region.start..region.end].to_string(),
            region,
            follows_package: tree.import_section_follows_package(),
            adds: Vec::new(),
            removes: BTreeSet::new(),
        }
    }

    /// Record an import for `qualified` and return the simple name to use in
    /// code.
    pub fn add_import(&mut self, qualified: &str) -> String {
        self.adds.push((false, qualified.to_string()));
        simple_name(qualified).to_string()
    }

    pub fn add_static_import(&mut self, qualified: &str) -> String {
        self.adds.push((true, qualified.to_string()));
        simple_name(qualified).to_string()
    }

    pub fn remove_import(&mut self, qualified: &str) {
        self.removes.insert((false, qualified.to_string()));
    }

    pub fn remove_static_import(&mut self, qualified: &str) {
        self.removes.insert((true, qualified.to_string()));
    }

    pub fn has_recorded_changes(&self) -> bool {
        !self.adds.is_empty() || !self.removes.is_empty()
    }

    /// Materialize the recorded changes into a single text edit over the
    /// import section, or `None` when the section is textually unchanged.
    ///
    /// Removals that reconcile with additions (or with imports that were
    /// never present) legitimately produce `None` even though changes were
    /// recorded.
    pub fn rewrite_imports(&self, pm: &ProgressMonitor) -> Result<Option<TextEdit>, RewriteError> {
        pm.check_cancelled()?;

        // (static, qualified, on_demand) — normal imports before static,
        // each group sorted by qualified name.
        let mut finals: BTreeSet<(bool, String, bool)> = BTreeSet::new();
        for decl in &self.existing {
            if self.removes.contains(&(decl.is_static, decl.qualified.clone())) {
                continue;
            }
            finals.insert((decl.is_static, decl.qualified.clone(), decl.on_demand));
        }
        // Removals filter the existing section; additions always land, so a
        // removal followed by a re-addition reconciles to the original text.
        for (is_static, qualified) in &self.adds {
            finals.insert((*is_static, qualified.clone(), false));
        }

        let rendered = finals
            .iter()
            .map(|(is_static, qualified, on_demand)| {
                ImportDecl {
                    qualified: qualified.clone(),
                    is_static: *is_static,
                    on_demand: *on_demand,
                    range: TextRange::empty(0),
                }
                .render()
            })
            .collect::<Vec<_>>()
            .join("\n");

        if rendered == self.existing_text {
            tracing::debug!("import rewrite normalized to no textual change");
            return Ok(None);
        }

        let new_text = if !self.region.is_empty() {
            rendered
        } else if self.follows_package {
            format!("\n{rendered}\n")
        } else {
            format!("{rendered}\n\n")
        };
        Ok(Some(TextEdit::replace(self.region, new_text)))
    }
}

fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// Tracks imports that may have become unused because the nodes referencing
/// them were removed.
///
/// A name is only removed when every known reference to it was registered as
/// removed; a single retained reference keeps the import.
#[derive(Debug, Default)]
pub struct ImportRemover {
    removed: BTreeSet<(bool, String)>,
    retained: BTreeSet<(bool, String)>,
}

impl ImportRemover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_removed_reference(&mut self, qualified: &str) {
        self.removed.insert((false, qualified.to_string()));
    }

    pub fn register_removed_static_reference(&mut self, qualified: &str) {
        self.removed.insert((true, qualified.to_string()));
    }

    pub fn register_retained_reference(&mut self, qualified: &str) {
        self.retained.insert((false, qualified.to_string()));
    }

    pub fn register_retained_static_reference(&mut self, qualified: &str) {
        self.retained.insert((true, qualified.to_string()));
    }

    pub fn has_removed_imports(&self) -> bool {
        self.removed.difference(&self.retained).next().is_some()
    }

    /// Apply the pending removals into `rewrite`. Must run before the import
    /// edit is materialized, since it changes what the rewrite will emit.
    pub fn apply_removals(&self, rewrite: &mut ImportRewrite) {
        for (is_static, qualified) in self.removed.difference(&self.retained) {
            if *is_static {
                rewrite.remove_static_import(qualified);
            } else {
                rewrite.remove_import(qualified);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use recast_core::{apply_edit, Edit};

    use super::*;
    use crate::parse::parse_unit;

    const UNIT: &str =
        "package p;\n\nimport a.Alpha;\nimport b.Beta;\n\nclass Foo {\n}\n";

    fn apply(source: &str, edit: TextEdit) -> String {
        apply_edit(source, &Edit::Replace(edit)).unwrap().text
    }

    #[test]
    fn add_import_returns_simple_name_and_rewrites_section() {
        let tree = parse_unit(UNIT, false).unwrap();
        let mut rewrite = ImportRewrite::for_tree(&tree);
        assert_eq!(rewrite.add_import("c.Gamma"), "Gamma");

        let pm = ProgressMonitor::default();
        let edit = rewrite.rewrite_imports(&pm).unwrap().expect("edit");
        let after = apply(UNIT, edit);
        assert!(after.contains("import a.Alpha;\nimport b.Beta;\nimport c.Gamma;"));
    }

    #[test]
    fn removal_produces_a_smaller_section() {
        let tree = parse_unit(UNIT, false).unwrap();
        let mut rewrite = ImportRewrite::for_tree(&tree);
        rewrite.remove_import("a.Alpha");

        let pm = ProgressMonitor::default();
        let edit = rewrite.rewrite_imports(&pm).unwrap().expect("edit");
        let after = apply(UNIT, edit);
        assert!(!after.contains("a.Alpha"));
        assert!(after.contains("import b.Beta;"));
    }

    #[test]
    fn remove_then_readd_reconciles_to_no_change() {
        let tree = parse_unit(UNIT, false).unwrap();
        let mut rewrite = ImportRewrite::for_tree(&tree);
        rewrite.remove_import("a.Alpha");
        rewrite.add_import("a.Alpha");
        assert!(rewrite.has_recorded_changes());

        let pm = ProgressMonitor::default();
        // The re-addition cancels the removal: the section is unchanged.
        let edit = rewrite.rewrite_imports(&pm).unwrap();
        assert_eq!(edit, None);
    }

    #[test]
    fn removing_an_absent_import_is_no_change() {
        let tree = parse_unit(UNIT, false).unwrap();
        let mut rewrite = ImportRewrite::for_tree(&tree);
        rewrite.remove_import("x.NotThere");

        let pm = ProgressMonitor::default();
        assert_eq!(rewrite.rewrite_imports(&pm).unwrap(), None);
    }

    #[test]
    fn first_import_in_a_unit_inserts_a_section() {
        let src = "package p;\n\nclass Foo {}\n";
        let tree = parse_unit(src, false).unwrap();
        let mut rewrite = ImportRewrite::for_tree(&tree);
        rewrite.add_import("java.util.List");

        let pm = ProgressMonitor::default();
        let edit = rewrite.rewrite_imports(&pm).unwrap().expect("edit");
        let after = apply(src, edit);
        assert_eq!(after, "package p;\n\nimport java.util.List;\n\nclass Foo {}\n");
    }

    #[test]
    fn static_imports_render_after_normal_imports() {
        let src = "class Foo {}\n";
        let tree = parse_unit(src, false).unwrap();
        let mut rewrite = ImportRewrite::for_tree(&tree);
        rewrite.add_static_import("java.util.Objects.requireNonNull");
        rewrite.add_import("java.util.List");

        let pm = ProgressMonitor::default();
        let edit = rewrite.rewrite_imports(&pm).unwrap().expect("edit");
        let after = apply(src, edit);
        assert_eq!(
            after,
            "import java.util.List;\nimport static java.util.Objects.requireNonNull;\n\nclass Foo {}\n"
        );
    }

    #[test]
    fn cancellation_surfaces_before_materialization() {
        let tree = parse_unit(UNIT, false).unwrap();
        let mut rewrite = ImportRewrite::for_tree(&tree);
        rewrite.add_import("c.Gamma");

        let token = recast_core::CancellationToken::new();
        token.cancel();
        let pm = ProgressMonitor::new(token);
        let err = rewrite.rewrite_imports(&pm).unwrap_err();
        assert!(matches!(err, RewriteError::Cancelled(_)));
    }

    #[test]
    fn remover_keeps_retained_references() {
        let mut remover = ImportRemover::new();
        remover.register_removed_reference("a.Alpha");
        remover.register_removed_reference("b.Beta");
        remover.register_retained_reference("b.Beta");
        assert!(remover.has_removed_imports());

        let tree = parse_unit(UNIT, false).unwrap();
        let mut rewrite = ImportRewrite::for_tree(&tree);
        remover.apply_removals(&mut rewrite);

        let pm = ProgressMonitor::default();
        let edit = rewrite.rewrite_imports(&pm).unwrap().expect("edit");
        let after = apply(UNIT, edit);
        assert!(!after.contains("a.Alpha"));
        assert!(after.contains("b.Beta"));
    }
}
