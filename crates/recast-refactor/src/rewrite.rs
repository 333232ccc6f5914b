//! Per-unit rewrite coordinator.
//!
//! A [`CompilationUnitRewrite`] owns the lazily parsed tree of one
//! compilation unit together with its three change recorders (AST rewrite,
//! import rewrite, import remover) and the group descriptions created while
//! recording. `create_change`/`attach_change` turn whatever was recorded
//! into at most one [`CompilationUnitChange`]; a coordinator that recorded
//! nothing, or whose recordings normalize away, yields no change at all.

use recast_core::{Edit, MultiEdit, ProgressMonitor};
use recast_syntax::{parse_unit, AstRewrite, ImportRemover, ImportRewrite, SyntaxTree};

use crate::change::{CompilationUnitChange, EditGroup};
use crate::refactoring::RefactorError;
use crate::resource::CompilationUnit;

pub struct CompilationUnitRewrite {
    unit: CompilationUnit,
    resolve_bindings: bool,
    root: Option<SyntaxTree>,
    rewrite: Option<AstRewrite>,
    import_rewrite: Option<ImportRewrite>,
    import_remover: Option<ImportRemover>,
    groups: Vec<EditGroup>,
}

impl CompilationUnitRewrite {
    pub fn new(unit: CompilationUnit) -> Self {
        Self {
            unit,
            resolve_bindings: true,
            root: None,
            rewrite: None,
            import_rewrite: None,
            import_remover: None,
            groups: Vec::new(),
        }
    }

    /// Reuse an already parsed tree instead of parsing lazily. The tree must
    /// have been parsed from the unit's current source.
    pub fn from_parsed(unit: CompilationUnit, root: SyntaxTree) -> Self {
        debug_assert_eq!(root.source(), unit.source);
        let resolve_bindings = root.resolve_bindings();
        Self {
            unit,
            resolve_bindings,
            root: Some(root),
            rewrite: None,
            import_rewrite: None,
            import_remover: None,
            groups: Vec::new(),
        }
    }

    pub fn unit(&self) -> &CompilationUnit {
        &self.unit
    }

    /// Takes effect only before the first parse; afterwards the request is
    /// logged and ignored, since the existing tree stays authoritative.
    pub fn set_resolve_bindings(&mut self, resolve: bool) {
        if self.root.is_some() {
            if self.resolve_bindings != resolve {
                tracing::debug!(
                    unit = %self.unit.path(),
                    requested = resolve,
                    "ignoring resolve_bindings change after parse"
                );
            }
            return;
        }
        self.resolve_bindings = resolve;
    }

    pub fn root(&mut self) -> Result<&SyntaxTree, RefactorError> {
        if self.root.is_none() {
            let tree = parse_unit(&self.unit.source, self.resolve_bindings).map_err(|source| {
                RefactorError::Parse {
                    path: self.unit.path().to_string(),
                    source,
                }
            })?;
            self.root = Some(tree);
        }
        Ok(self.root.as_ref().expect("parsed above"))
    }

    pub fn ast_rewrite(&mut self) -> Result<&mut AstRewrite, RefactorError> {
        self.root()?;
        Ok(self.rewrite.get_or_insert_with(AstRewrite::new))
    }

    pub fn import_rewrite(&mut self) -> Result<&mut ImportRewrite, RefactorError> {
        if self.import_rewrite.is_none() {
            let rewrite = ImportRewrite::for_tree(self.root()?);
            self.import_rewrite = Some(rewrite);
        }
        Ok(self.import_rewrite.as_mut().expect("created above"))
    }

    pub fn import_remover(&mut self) -> Result<&mut ImportRemover, RefactorError> {
        self.root()?;
        Ok(self.import_remover.get_or_insert_with(ImportRemover::new))
    }

    /// Create a labelled group description. Groups are remembered and carried
    /// onto the change produced by `create_change`/`attach_change`.
    pub fn create_group_description(&mut self, name: &str) -> EditGroup {
        let group = EditGroup::new(name);
        self.groups.push(group.clone());
        group
    }

    pub fn group_descriptions(&self) -> &[EditGroup] {
        &self.groups
    }

    /// Discard recorded AST operations together with their group
    /// descriptions; a later `create_change` sees neither.
    pub fn clear_ast_rewrite(&mut self) {
        self.rewrite = None;
        self.groups.clear();
    }

    /// Drops the import recorder only; the remover keeps its pending
    /// removals.
    pub fn clear_import_rewrites(&mut self) {
        self.import_rewrite = None;
    }

    pub fn clear_ast_and_import_rewrites(&mut self) {
        self.clear_ast_rewrite();
        self.clear_import_rewrites();
    }

    /// Materialize the recorded changes into a fresh change named after the
    /// unit, or `None` when nothing textual came out of them.
    pub fn create_change(
        &mut self,
        pm: &ProgressMonitor,
    ) -> Result<Option<CompilationUnitChange>, RefactorError> {
        let change = CompilationUnitChange::new(self.unit.element_name(), self.unit.clone());
        self.attach_change(change, pm)
    }

    /// Like `create_change`, but folds the recorded edits into an existing
    /// change for this unit. Any pre-existing edit on the change must be an
    /// absent-or-composite root; overlap with recorded edits is the
    /// caller's precondition. The monitor is marked done on every exit
    /// path.
    pub fn attach_change(
        &mut self,
        change: CompilationUnitChange,
        pm: &ProgressMonitor,
    ) -> Result<Option<CompilationUnitChange>, RefactorError> {
        let result = self.attach_inner(change, pm);
        pm.done();
        result
    }

    fn attach_inner(
        &mut self,
        mut change: CompilationUnitChange,
        pm: &ProgressMonitor,
    ) -> Result<Option<CompilationUnitChange>, RefactorError> {
        pm.begin_task("Creating change", 2);
        pm.check_cancelled().map_err(RefactorError::from)?;

        // Judge dirtiness before touching any recorder: pending import
        // removals count as import work even when no import rewrite exists
        // yet and removal application happens further down.
        let ast_dirty = self
            .rewrite
            .as_ref()
            .is_some_and(AstRewrite::has_recorded_changes);
        let removal_dirty = self
            .import_remover
            .as_ref()
            .is_some_and(ImportRemover::has_removed_imports);
        let import_dirty = removal_dirty
            || self
                .import_rewrite
                .as_ref()
                .is_some_and(ImportRewrite::has_recorded_changes);

        if !ast_dirty && !import_dirty {
            tracing::debug!(unit = %self.unit.path(), "no recorded changes");
            return Ok(None);
        }

        let mut composite = match change.take_edit() {
            None => MultiEdit::new(Vec::new()),
            Some(Edit::Multi(existing)) => existing,
            Some(Edit::Replace(_)) => {
                panic!("pre-existing edit on an attached change must be a composite")
            }
        };

        if ast_dirty {
            // The recorder can only exist after a successful parse.
            let tree = self.root.as_ref().expect("rewrite implies parsed root");
            let rewrite = self.rewrite.as_ref().expect("ast_dirty implies recorder");
            let edit = rewrite.rewrite_ast(tree)?;
            debug_assert!(matches!(edit, Edit::Multi(_)));
            if !edit.is_empty() {
                composite.add_child(edit);
                for group in &self.groups {
                    change.add_group(group.clone());
                }
            }
        }
        pm.worked(1);

        if import_dirty {
            if removal_dirty {
                // Split the borrow: the remover feeds the import rewrite.
                if self.import_rewrite.is_none() {
                    let rewrite = ImportRewrite::for_tree(self.root()?);
                    self.import_rewrite = Some(rewrite);
                }
                let rewrite = self
                    .import_rewrite
                    .as_mut()
                    .expect("created above");
                if let Some(remover) = self.import_remover.as_ref() {
                    remover.apply_removals(rewrite);
                }
            }
            let rewrite = self
                .import_rewrite
                .as_ref()
                .expect("import_dirty implies recorder");
            if let Some(import_edit) = rewrite.rewrite_imports(pm)? {
                composite.add_child(Edit::Replace(import_edit));
                change.add_group(EditGroup::new("Update imports"));
            }
        }
        pm.worked(1);

        if !composite.has_children() {
            tracing::debug!(unit = %self.unit.path(), "recorded changes normalized away");
            return Ok(None);
        }
        change.set_edit(Edit::Multi(composite));
        Ok(Some(change))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use recast_core::TextRange;

    use super::*;
    use crate::resource::{ResourceHandle, ResourcePath};

    const UNIT: &str = "package p;\n\nimport a.Alpha;\n\nclass Foo {\n    void m() {}\n}\n";

    fn coordinator() -> CompilationUnitRewrite {
        let handle =
            ResourceHandle::file(ResourcePath::parse("/P/Foo.java").unwrap());
        CompilationUnitRewrite::new(CompilationUnit::new(handle, UNIT))
    }

    fn unit_change(change: Option<CompilationUnitChange>) -> CompilationUnitChange {
        change.expect("expected a unit change")
    }

    #[test]
    fn no_recorders_means_no_change() {
        let mut rewrite = coordinator();
        let pm = ProgressMonitor::default();
        assert_eq!(rewrite.create_change(&pm).unwrap(), None);
        assert!(pm.is_done());
    }

    #[test]
    fn untouched_recorders_mean_no_change() {
        let mut rewrite = coordinator();
        rewrite.ast_rewrite().unwrap();
        rewrite.import_rewrite().unwrap();
        rewrite.import_remover().unwrap();
        let pm = ProgressMonitor::default();
        assert_eq!(rewrite.create_change(&pm).unwrap(), None);
    }

    #[test]
    fn ast_and_import_edits_compose_with_groups() {
        let mut rewrite = coordinator();
        let group = rewrite.create_group_description("Rename method");
        let offset = UNIT.find("m()").unwrap();
        rewrite
            .ast_rewrite()
            .unwrap()
            .replace(TextRange::new(offset, offset + 1), "renamed");
        rewrite.import_rewrite().unwrap().add_import("b.Beta");

        let pm = ProgressMonitor::default();
        let change = unit_change(rewrite.create_change(&pm).unwrap());
        let text = change.preview_text().unwrap();
        assert!(text.contains("void renamed()"));
        assert!(text.contains("import b.Beta;"));
        assert_eq!(
            change.groups().iter().map(EditGroup::name).collect::<Vec<_>>(),
            vec![group.name(), "Update imports"]
        );
    }

    #[test]
    fn clearing_the_ast_rewrite_drops_its_groups() {
        let mut rewrite = coordinator();
        rewrite.create_group_description("Rename method");
        let offset = UNIT.find("m()").unwrap();
        rewrite
            .ast_rewrite()
            .unwrap()
            .replace(TextRange::new(offset, offset + 1), "renamed");
        rewrite.clear_ast_rewrite();
        assert!(rewrite.group_descriptions().is_empty());

        let pm = ProgressMonitor::default();
        assert_eq!(rewrite.create_change(&pm).unwrap(), None);
    }

    #[test]
    fn pending_removals_force_an_import_rewrite() {
        let mut rewrite = coordinator();
        rewrite
            .import_remover()
            .unwrap()
            .register_removed_reference("a.Alpha");
        // No import rewrite was requested; the coordinator must create one
        // to carry the removal.
        let pm = ProgressMonitor::default();
        let change = unit_change(rewrite.create_change(&pm).unwrap());
        let text = change.preview_text().unwrap();
        assert!(!text.contains("a.Alpha"));
        assert_eq!(
            change.groups().iter().map(EditGroup::name).collect::<Vec<_>>(),
            vec!["Update imports"]
        );
    }

    #[test]
    fn removal_reconciled_by_readdition_is_no_change() {
        let mut rewrite = coordinator();
        rewrite
            .import_remover()
            .unwrap()
            .register_removed_reference("a.Alpha");
        rewrite.import_rewrite().unwrap().add_import("a.Alpha");

        let pm = ProgressMonitor::default();
        assert_eq!(rewrite.create_change(&pm).unwrap(), None);
    }

    #[test]
    fn noop_ast_replacements_normalize_to_no_change() {
        let mut rewrite = coordinator();
        let offset = UNIT.find("Foo").unwrap();
        rewrite
            .ast_rewrite()
            .unwrap()
            .replace(TextRange::new(offset, offset + 3), "Foo");

        let pm = ProgressMonitor::default();
        assert_eq!(rewrite.create_change(&pm).unwrap(), None);
        assert!(pm.is_done());
    }

    #[test]
    fn attach_folds_into_an_existing_change() {
        let mut rewrite = coordinator();
        rewrite.import_rewrite().unwrap().add_import("b.Beta");
        let existing = CompilationUnitChange::new("Move members", rewrite.unit().clone());

        let pm = ProgressMonitor::default();
        let change = unit_change(rewrite.attach_change(existing, &pm).unwrap());
        assert_eq!(change.name(), "Move members");
        assert!(change.preview_text().unwrap().contains("import b.Beta;"));
    }

    #[test]
    fn monitor_is_done_even_on_errors() {
        let mut rewrite = coordinator();
        rewrite.import_rewrite().unwrap().add_import("b.Beta");

        let token = recast_core::CancellationToken::new();
        token.cancel();
        let pm = ProgressMonitor::new(token);
        assert!(rewrite.create_change(&pm).is_err());
        assert!(pm.is_done());
    }

    #[test]
    fn resolve_bindings_is_fixed_after_parse() {
        let mut rewrite = coordinator();
        rewrite.set_resolve_bindings(false);
        assert!(!rewrite.root().unwrap().resolve_bindings());
        rewrite.set_resolve_bindings(true);
        assert!(!rewrite.root().unwrap().resolve_bindings());
    }
}
