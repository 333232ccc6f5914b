//! Change objects: the executable output of a refactoring.
//!
//! A change is a tree. Leaves either rewrite one compilation unit's text or
//! rename/move one resource; composites sequence children. Performing a
//! change mutates the workspace and returns the inverse change, so every
//! applied refactoring can be undone by performing its result.

use recast_core::{apply_edit, Edit};

use crate::refactoring::RefactorError;
use crate::resource::{
    CompilationUnit, InMemoryWorkspace, ResourceHandle, ResourceKind, ResourcePath, Workspace,
};

/// Preview label for one logical group of edits inside a unit change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditGroup {
    name: String,
}

impl EditGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Textual change to a single compilation unit.
///
/// The change snapshots the unit's buffer at creation time; performing it
/// against a workspace whose file content has since diverged is refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilationUnitChange {
    name: String,
    unit: CompilationUnit,
    edit: Option<Edit>,
    groups: Vec<EditGroup>,
}

impl CompilationUnitChange {
    pub fn new(name: impl Into<String>, unit: CompilationUnit) -> Self {
        Self {
            name: name.into(),
            unit,
            edit: None,
            groups: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &CompilationUnit {
        &self.unit
    }

    pub fn edit(&self) -> Option<&Edit> {
        self.edit.as_ref()
    }

    pub fn has_edit(&self) -> bool {
        self.edit.is_some()
    }

    pub fn set_edit(&mut self, edit: Edit) {
        self.edit = Some(edit);
    }

    pub fn take_edit(&mut self) -> Option<Edit> {
        self.edit.take()
    }

    pub fn add_group(&mut self, group: EditGroup) {
        self.groups.push(group);
    }

    pub fn groups(&self) -> &[EditGroup] {
        &self.groups
    }

    /// The unit's text after this change, without touching any workspace.
    pub fn preview_text(&self) -> Result<String, RefactorError> {
        match &self.edit {
            None => Ok(self.unit.source.clone()),
            Some(edit) => Ok(apply_edit(&self.unit.source, edit)?.text),
        }
    }

    /// Apply the edit tree to the buffered source.
    pub fn perform(&self) -> Result<PerformedChange, RefactorError> {
        let Some(edit) = &self.edit else {
            return Ok(PerformedChange {
                text: self.unit.source.clone(),
                undo: self.clone(),
            });
        };
        let applied = apply_edit(&self.unit.source, edit)?;
        let mut undo = CompilationUnitChange::new(
            self.name.clone(),
            CompilationUnit::new(self.unit.handle.clone(), applied.text.clone()),
        );
        undo.set_edit(applied.undo);
        for group in &self.groups {
            undo.add_group(group.clone());
        }
        Ok(PerformedChange {
            text: applied.text,
            undo,
        })
    }
}

/// Result of performing a unit change: the modified text and the change
/// that restores the previous text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PerformedChange {
    pub text: String,
    pub undo: CompilationUnitChange,
}

/// Composite sequencing child changes. Performing runs children in order;
/// the undo runs the inverse children in reverse.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompositeChange {
    name: String,
    children: Vec<Change>,
}

impl CompositeChange {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&mut self, change: Change) {
        self.children.push(change);
    }

    pub fn children(&self) -> &[Change] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    Unit(CompilationUnitChange),
    RenameResource {
        resource: ResourceHandle,
        new_name: String,
    },
    MoveResource {
        resource: ResourceHandle,
        destination: ResourceHandle,
    },
    Composite(CompositeChange),
}

impl Change {
    pub fn name(&self) -> String {
        match self {
            Change::Unit(change) => change.name().to_string(),
            Change::RenameResource { resource, new_name } => {
                format!("Rename '{}' to '{}'", resource.path, new_name)
            }
            Change::MoveResource {
                resource,
                destination,
            } => format!("Move '{}' to '{}'", resource.path, destination.path),
            Change::Composite(composite) => composite.name().to_string(),
        }
    }
}

fn renamed_path(path: &ResourcePath, new_name: &str) -> Result<ResourcePath, RefactorError> {
    let raw = match path.parent() {
        Some(parent) => format!("{parent}/{new_name}"),
        None => format!("/{new_name}"),
    };
    ResourcePath::parse(&raw).map_err(|_| RefactorError::MissingResource(raw))
}

/// Perform `change` against the workspace and return its inverse.
pub fn perform_change(
    change: &Change,
    workspace: &mut InMemoryWorkspace,
) -> Result<Change, RefactorError> {
    match change {
        Change::Unit(unit_change) => {
            let path = unit_change.unit().path();
            let current = workspace
                .file_text(path)
                .ok_or_else(|| RefactorError::MissingResource(path.to_string()))?;
            if current != unit_change.unit().source {
                return Err(RefactorError::StaleBuffer(path.to_string()));
            }
            let performed = unit_change.perform()?;
            if unit_change.has_edit() {
                workspace.set_file_text(path, performed.text);
            }
            Ok(Change::Unit(performed.undo))
        }
        Change::RenameResource { resource, new_name } => {
            let old_name = resource.name().to_string();
            let to = renamed_path(&resource.path, new_name)?;
            if !workspace.exists(&resource.path) {
                return Err(RefactorError::MissingResource(resource.path.to_string()));
            }
            if !workspace.rename(&resource.path, &to) {
                return Err(RefactorError::ResourceExists(to.to_string()));
            }
            Ok(Change::RenameResource {
                resource: ResourceHandle {
                    kind: resource.kind,
                    path: to,
                },
                new_name: old_name,
            })
        }
        Change::MoveResource {
            resource,
            destination,
        } => {
            let to = destination.path.join(resource.name());
            if !workspace.exists(&resource.path) {
                return Err(RefactorError::MissingResource(resource.path.to_string()));
            }
            let old_parent = resource
                .path
                .parent()
                .ok_or_else(|| RefactorError::MissingResource(resource.path.to_string()))?;
            if !workspace.rename(&resource.path, &to) {
                return Err(RefactorError::ResourceExists(to.to_string()));
            }
            let old_parent_kind = workspace
                .kind(&old_parent)
                .unwrap_or(ResourceKind::Folder);
            Ok(Change::MoveResource {
                resource: ResourceHandle {
                    kind: resource.kind,
                    path: to,
                },
                destination: ResourceHandle {
                    kind: old_parent_kind,
                    path: old_parent,
                },
            })
        }
        Change::Composite(composite) => {
            let mut undo = CompositeChange::new(composite.name());
            let mut performed = Vec::with_capacity(composite.children().len());
            for child in composite.children() {
                performed.push(perform_change(child, workspace)?);
            }
            for child in performed.into_iter().rev() {
                undo.add(child);
            }
            Ok(Change::Composite(undo))
        }
    }
}
