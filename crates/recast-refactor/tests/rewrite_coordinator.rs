use pretty_assertions::assert_eq;
use recast_core::{Edit, ProgressMonitor, TextRange};
use recast_refactor::{
    perform_change, Change, CompilationUnit, CompilationUnitRewrite, EditGroup,
    InMemoryWorkspace, ResourceHandle, ResourcePath, Workspace,
};

const UNIT: &str = "\
package app;

import java.util.List;
import java.util.Map;

class Service {
    void handle(List<String> names) {
    }
}
";

fn coordinator() -> CompilationUnitRewrite {
    let handle = ResourceHandle::file(ResourcePath::parse("/P/Service.java").unwrap());
    CompilationUnitRewrite::new(CompilationUnit::new(handle, UNIT))
}

fn group_names(groups: &[EditGroup]) -> Vec<&str> {
    groups.iter().map(EditGroup::name).collect()
}

#[test]
fn untouched_coordinator_reports_no_change() {
    let mut rewrite = coordinator();
    let pm = ProgressMonitor::default();
    assert!(rewrite.create_change(&pm).unwrap().is_none());
}

#[test]
fn requested_but_unused_recorders_report_no_change() {
    let mut rewrite = coordinator();
    rewrite.ast_rewrite().unwrap();
    let pm = ProgressMonitor::default();
    assert!(rewrite.create_change(&pm).unwrap().is_none());
}

#[test]
fn ast_and_import_edits_form_a_two_child_composite() {
    let mut rewrite = coordinator();
    rewrite.create_group_description("Add field");
    rewrite.create_group_description("Rename parameter");
    let body = UNIT.find("names").unwrap();
    rewrite
        .ast_rewrite()
        .unwrap()
        .replace(TextRange::new(body, body + 5), "users");
    rewrite.import_rewrite().unwrap().add_import("java.util.Set");

    let pm = ProgressMonitor::default();
    let change = rewrite.create_change(&pm).unwrap().expect("change");

    let Some(Edit::Multi(root)) = change.edit() else {
        panic!("expected a composite root");
    };
    assert_eq!(root.children.len(), 2);
    assert!(matches!(root.children[0], Edit::Multi(_)));
    assert!(matches!(root.children[1], Edit::Replace(_)));
    assert_eq!(
        group_names(change.groups()),
        vec!["Add field", "Rename parameter", "Update imports"]
    );
}

#[test]
fn clearing_the_ast_recorder_discards_stale_labels() {
    let mut rewrite = coordinator();
    rewrite.create_group_description("Old label");
    let at = UNIT.find("handle").unwrap();
    rewrite
        .ast_rewrite()
        .unwrap()
        .replace(TextRange::new(at, at + 6), "process");

    rewrite.clear_ast_rewrite();
    rewrite.create_group_description("New label");
    rewrite
        .ast_rewrite()
        .unwrap()
        .replace(TextRange::new(at, at + 6), "dispatch");

    let pm = ProgressMonitor::default();
    let change = rewrite.create_change(&pm).unwrap().expect("change");
    assert_eq!(group_names(change.groups()), vec!["New label"]);
    assert!(change.preview_text().unwrap().contains("void dispatch("));
}

#[test]
fn pending_removal_forces_the_import_rewrite() {
    let mut rewrite = coordinator();
    let at = UNIT.find("class").unwrap();
    rewrite.ast_rewrite().unwrap().insert(at, "// audited\n");
    // The import recorder itself records nothing; the removal alone must
    // still produce the import child.
    rewrite.import_rewrite().unwrap();
    rewrite
        .import_remover()
        .unwrap()
        .register_removed_reference("java.util.Map");

    let pm = ProgressMonitor::default();
    let change = rewrite.create_change(&pm).unwrap().expect("change");
    let Some(Edit::Multi(root)) = change.edit() else {
        panic!("expected a composite root");
    };
    assert_eq!(root.children.len(), 2);

    let text = change.preview_text().unwrap();
    assert!(!text.contains("java.util.Map"));
    assert!(text.contains("java.util.List"));
    assert!(text.contains("// audited"));
}

#[test]
fn coordinator_change_round_trips_through_the_workspace() {
    let mut ws = InMemoryWorkspace::new();
    let path = ResourcePath::parse("/P/Service.java").unwrap();
    ws.insert_file(path.clone(), UNIT);

    let mut rewrite =
        CompilationUnitRewrite::new(ws.compilation_unit(&path).unwrap());
    rewrite.import_rewrite().unwrap().add_import("java.util.Set");
    let pm = ProgressMonitor::default();
    let change = rewrite.create_change(&pm).unwrap().expect("change");

    let undo = perform_change(&Change::Unit(change), &mut ws).unwrap();
    assert!(ws.file_text(&path).unwrap().contains("import java.util.Set;"));

    perform_change(&undo, &mut ws).unwrap();
    assert_eq!(ws.file_text(&path).unwrap(), UNIT);
}

#[test]
fn monitor_is_released_on_every_path() {
    let mut rewrite = coordinator();
    let pm = ProgressMonitor::default();
    rewrite.create_change(&pm).unwrap();
    assert!(pm.is_done());

    let mut rewrite = coordinator();
    rewrite.import_rewrite().unwrap().add_import("java.util.Set");
    let token = recast_core::CancellationToken::new();
    token.cancel();
    let pm = ProgressMonitor::new(token);
    assert!(rewrite.create_change(&pm).is_err());
    assert!(pm.is_done());
}
