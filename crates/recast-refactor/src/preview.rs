//! Wizard-style previews of a computed change: per-file unified diffs and
//! the resource renames/moves it will perform.

use similar::TextDiff;

use crate::change::{Change, CompilationUnitChange};
use crate::refactoring::RefactorError;
use crate::resource::{ResourcePath, Workspace};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePreview {
    pub path: ResourcePath,
    pub unified_diff: String,
    /// Names of the edit groups contributing to this file.
    pub groups: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceRename {
    pub from: ResourcePath,
    pub to: ResourcePath,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangePreview {
    pub files: Vec<FilePreview>,
    pub renames: Vec<ResourceRename>,
}

impl ChangePreview {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.renames.is_empty()
    }
}

fn preview_unit(
    unit_change: &CompilationUnitChange,
    workspace: &dyn Workspace,
    preview: &mut ChangePreview,
) -> Result<(), RefactorError> {
    let path = unit_change.unit().path();
    // Previewing against a diverged workspace would show a diff that can
    // no longer be applied.
    match workspace.file_text(path) {
        None => return Err(RefactorError::MissingResource(path.to_string())),
        Some(current) if current != unit_change.unit().source => {
            return Err(RefactorError::StaleBuffer(path.to_string()));
        }
        Some(_) => {}
    }

    let original = unit_change.unit().source.as_str();
    let modified = unit_change.preview_text()?;
    if original == modified {
        return Ok(());
    }
    let diff = TextDiff::from_lines(original, &modified);
    let unified_diff = diff
        .unified_diff()
        .context_radius(3)
        .header(&format!("a{path}"), &format!("b{path}"))
        .to_string();
    preview.files.push(FilePreview {
        path: path.clone(),
        unified_diff,
        groups: unit_change
            .groups()
            .iter()
            .map(|g| g.name().to_string())
            .collect(),
    });
    Ok(())
}

fn walk(
    change: &Change,
    workspace: &dyn Workspace,
    preview: &mut ChangePreview,
) -> Result<(), RefactorError> {
    match change {
        Change::Unit(unit_change) => preview_unit(unit_change, workspace, preview),
        Change::RenameResource { resource, new_name } => {
            let to = match resource.path.parent() {
                Some(parent) => parent.join(new_name),
                None => match ResourcePath::parse(&format!("/{new_name}")) {
                    Ok(path) => path,
                    Err(_) => return Ok(()),
                },
            };
            preview.renames.push(ResourceRename {
                from: resource.path.clone(),
                to,
            });
            Ok(())
        }
        Change::MoveResource {
            resource,
            destination,
        } => {
            preview.renames.push(ResourceRename {
                from: resource.path.clone(),
                to: destination.path.join(resource.name()),
            });
            Ok(())
        }
        Change::Composite(composite) => {
            for child in composite.children() {
                walk(child, workspace, preview)?;
            }
            Ok(())
        }
    }
}

/// Render a change as diffs and rename listings without performing it.
pub fn preview_change(
    change: &Change,
    workspace: &dyn Workspace,
) -> Result<ChangePreview, RefactorError> {
    let mut preview = ChangePreview::default();
    walk(change, workspace, &mut preview)?;
    Ok(preview)
}
