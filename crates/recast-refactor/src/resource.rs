use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourcePathError {
    #[error("resource path must be workspace-absolute, got `{0}`")]
    NotAbsolute(String),
    #[error("resource path contains an empty segment: `{0}`")]
    EmptySegment(String),
}

/// A workspace-absolute slash path, e.g. `/Project/src/Foo.java`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourcePath(String);

impl ResourcePath {
    pub fn parse(raw: &str) -> Result<Self, ResourcePathError> {
        let Some(rest) = raw.strip_prefix('/') else {
            return Err(ResourcePathError::NotAbsolute(raw.to_string()));
        };
        if rest.is_empty() || rest.split('/').any(str::is_empty) {
            return Err(ResourcePathError::EmptySegment(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0[1..].split('/')
    }

    /// First segment: the owning project name.
    pub fn project(&self) -> &str {
        self.segments().next().unwrap_or("")
    }

    /// Last segment.
    pub fn name(&self) -> &str {
        self.segments().last().unwrap_or("")
    }

    pub fn parent(&self) -> Option<ResourcePath> {
        let idx = self.0.rfind('/')?;
        if idx == 0 {
            return None;
        }
        Some(ResourcePath(self.0[..idx].to_string()))
    }

    pub fn join(&self, name: &str) -> ResourcePath {
        ResourcePath(format!("{}/{}", self.0, name))
    }

    pub fn starts_with(&self, prefix: &ResourcePath) -> bool {
        self.0 == prefix.0
            || self
                .0
                .strip_prefix(&prefix.0)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Path relative to `project`, when the resource lives in it.
    pub fn relative_to_project(&self, project: &str) -> Option<&str> {
        if self.project() != project {
            return None;
        }
        self.0.get(1 + project.len() + 1..)
    }

    pub fn resolve_in_project(project: &str, relative: &str) -> Result<Self, ResourcePathError> {
        Self::parse(&format!("/{project}/{relative}"))
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ResourcePath {
    type Error = ResourcePathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourcePath> for String {
    fn from(path: ResourcePath) -> Self {
        path.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    Project,
    Folder,
    File,
}

/// Handle to a workspace resource. Handles identify; the [`Workspace`]
/// answers existence and contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHandle {
    pub kind: ResourceKind,
    pub path: ResourcePath,
}

impl ResourceHandle {
    pub fn project(name: &str) -> Result<Self, ResourcePathError> {
        Ok(Self {
            kind: ResourceKind::Project,
            path: ResourcePath::parse(&format!("/{name}"))?,
        })
    }

    pub fn folder(path: ResourcePath) -> Self {
        Self {
            kind: ResourceKind::Folder,
            path,
        }
    }

    pub fn file(path: ResourcePath) -> Self {
        Self {
            kind: ResourceKind::File,
            path,
        }
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }
}

/// Read access to workspace resources.
pub trait Workspace {
    fn kind(&self, path: &ResourcePath) -> Option<ResourceKind>;
    fn file_text(&self, path: &ResourcePath) -> Option<&str>;

    fn exists(&self, path: &ResourcePath) -> bool {
        self.kind(path).is_some()
    }

    fn handle(&self, path: &ResourcePath) -> Option<ResourceHandle> {
        Some(ResourceHandle {
            kind: self.kind(path)?,
            path: path.clone(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    kind: ResourceKind,
    text: Option<String>,
}

/// In-memory workspace used by change application and tests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryWorkspace {
    entries: BTreeMap<ResourcePath, Entry>,
}

impl InMemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_project(&mut self, name: &str) -> ResourcePath {
        let path = ResourcePath(format!("/{name}"));
        self.entries.insert(
            path.clone(),
            Entry {
                kind: ResourceKind::Project,
                text: None,
            },
        );
        path
    }

    pub fn insert_folder(&mut self, path: ResourcePath) {
        self.ensure_ancestors(&path);
        self.entries.insert(
            path,
            Entry {
                kind: ResourceKind::Folder,
                text: None,
            },
        );
    }

    /// Insert a file, creating missing ancestor projects/folders.
    pub fn insert_file(&mut self, path: ResourcePath, text: impl Into<String>) {
        self.ensure_ancestors(&path);
        self.entries.insert(
            path,
            Entry {
                kind: ResourceKind::File,
                text: Some(text.into()),
            },
        );
    }

    fn ensure_ancestors(&mut self, path: &ResourcePath) {
        let mut ancestors = Vec::new();
        let mut current = path.parent();
        while let Some(p) = current {
            current = p.parent();
            ancestors.push(p);
        }
        for ancestor in ancestors.into_iter().rev() {
            let kind = if ancestor.parent().is_none() {
                ResourceKind::Project
            } else {
                ResourceKind::Folder
            };
            self.entries
                .entry(ancestor)
                .or_insert(Entry { kind, text: None });
        }
    }

    pub fn set_file_text(&mut self, path: &ResourcePath, text: impl Into<String>) -> bool {
        match self.entries.get_mut(path) {
            Some(entry) if entry.kind == ResourceKind::File => {
                entry.text = Some(text.into());
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, path: &ResourcePath) {
        self.entries.retain(|p, _| !p.starts_with(path));
    }

    /// Move a resource (and everything below it) to a new path.
    pub fn rename(&mut self, from: &ResourcePath, to: &ResourcePath) -> bool {
        if !self.entries.contains_key(from) || self.entries.contains_key(to) {
            return false;
        }
        let moved: Vec<(ResourcePath, Entry)> = self
            .entries
            .iter()
            .filter(|(p, _)| p.starts_with(from))
            .map(|(p, e)| (p.clone(), e.clone()))
            .collect();
        for (path, entry) in moved {
            self.entries.remove(&path);
            let suffix = &path.0[from.0.len()..];
            self.entries
                .insert(ResourcePath(format!("{}{}", to.0, suffix)), entry);
        }
        true
    }

    pub fn compilation_unit(&self, path: &ResourcePath) -> Option<CompilationUnit> {
        let text = self.file_text(path)?;
        Some(CompilationUnit {
            handle: ResourceHandle::file(path.clone()),
            source: text.to_string(),
        })
    }
}

impl Workspace for InMemoryWorkspace {
    fn kind(&self, path: &ResourcePath) -> Option<ResourceKind> {
        self.entries.get(path).map(|e| e.kind)
    }

    fn file_text(&self, path: &ResourcePath) -> Option<&str> {
        self.entries.get(path).and_then(|e| e.text.as_deref())
    }
}

/// A source file handle plus its buffered text.
///
/// Each rewrite coordinator owns exactly one of these; units are not shared
/// between coordinators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilationUnit {
    pub handle: ResourceHandle,
    pub source: String,
}

impl CompilationUnit {
    pub fn new(handle: ResourceHandle, source: impl Into<String>) -> Self {
        Self {
            handle,
            source: source.into(),
        }
    }

    pub fn element_name(&self) -> &str {
        self.handle.name()
    }

    pub fn path(&self) -> &ResourcePath {
        &self.handle.path
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn path(raw: &str) -> ResourcePath {
        ResourcePath::parse(raw).unwrap()
    }

    #[test]
    fn path_parsing_rejects_relative_and_empty_segments() {
        assert_eq!(
            ResourcePath::parse("P/Foo.java"),
            Err(ResourcePathError::NotAbsolute("P/Foo.java".to_string()))
        );
        assert_eq!(
            ResourcePath::parse("/P//Foo.java"),
            Err(ResourcePathError::EmptySegment("/P//Foo.java".to_string()))
        );
        assert_eq!(
            ResourcePath::parse("/"),
            Err(ResourcePathError::EmptySegment("/".to_string()))
        );
    }

    #[test]
    fn path_accessors() {
        let p = path("/P/src/Foo.java");
        assert_eq!(p.project(), "P");
        assert_eq!(p.name(), "Foo.java");
        assert_eq!(p.parent(), Some(path("/P/src")));
        assert_eq!(p.relative_to_project("P"), Some("src/Foo.java"));
        assert_eq!(p.relative_to_project("Q"), None);
        assert_eq!(path("/P").parent(), None);
    }

    #[test]
    fn starts_with_requires_segment_boundaries() {
        assert!(path("/P/src/Foo.java").starts_with(&path("/P/src")));
        assert!(path("/P/src").starts_with(&path("/P/src")));
        assert!(!path("/P/srcdir").starts_with(&path("/P/src")));
    }

    #[test]
    fn insert_file_creates_ancestors() {
        let mut ws = InMemoryWorkspace::new();
        ws.insert_file(path("/P/src/Foo.java"), "class Foo {}");
        assert_eq!(ws.kind(&path("/P")), Some(ResourceKind::Project));
        assert_eq!(ws.kind(&path("/P/src")), Some(ResourceKind::Folder));
        assert_eq!(ws.kind(&path("/P/src/Foo.java")), Some(ResourceKind::File));
        assert_eq!(ws.file_text(&path("/P/src/Foo.java")), Some("class Foo {}"));
    }

    #[test]
    fn rename_moves_subtree() {
        let mut ws = InMemoryWorkspace::new();
        ws.insert_file(path("/P/src/Foo.java"), "class Foo {}");
        assert!(ws.rename(&path("/P/src"), &path("/P/main")));
        assert!(!ws.exists(&path("/P/src")));
        assert_eq!(ws.file_text(&path("/P/main/Foo.java")), Some("class Foo {}"));
    }

    #[test]
    fn rename_refuses_collisions() {
        let mut ws = InMemoryWorkspace::new();
        ws.insert_file(path("/P/Foo.java"), "");
        ws.insert_file(path("/P/Bar.java"), "");
        assert!(!ws.rename(&path("/P/Foo.java"), &path("/P/Bar.java")));
    }
}
