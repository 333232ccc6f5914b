use std::ops::BitOr;

use recast_core::RefactoringStatus;
use serde::{Deserialize, Serialize};

use crate::arguments::ArgumentMap;

/// Well-known refactoring kind ids. Kept identical to the JDT id strings so
/// persisted histories from that tooling remain replayable.
pub mod ids {
    pub const RENAME_RESOURCE: &str = "org.eclipse.jdt.ui.rename.resource";
    pub const MOVE: &str = "org.eclipse.jdt.ui.move";
    pub const MOVE_STATIC_MEMBERS: &str = "org.eclipse.jdt.ui.move.static";
    pub const CONVERT_ANONYMOUS: &str = "org.eclipse.jdt.ui.convert.anonymous";
}

/// Attribute keys shared by the descriptor kinds.
pub mod attributes {
    pub const INPUT: &str = "input";
    pub const NAME: &str = "name";
    pub const ELEMENT: &str = "element";
    pub const MEMBER: &str = "member";
    pub const DESTINATION: &str = "destination";
    pub const REFERENCES: &str = "references";
    pub const SELECTION: &str = "selection";
    pub const FINAL: &str = "final";
    pub const STATIC: &str = "static";
    pub const DELEGATE: &str = "delegate";
    pub const DEPRECATE: &str = "deprecate";
}

/// Structural/behavioral modifiers of a refactoring, persisted as a bitset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefactoringFlags(u32);

impl RefactoringFlags {
    pub const NONE: RefactoringFlags = RefactoringFlags(0);
    /// The refactoring may break source or binary compatibility.
    pub const BREAKING_CHANGE: RefactoringFlags = RefactoringFlags(1 << 0);
    /// The refactoring changes more than a single element's name.
    pub const STRUCTURAL_CHANGE: RefactoringFlags = RefactoringFlags(1 << 1);
    /// The refactoring touches multiple compilation units.
    pub const MULTI_CHANGE: RefactoringFlags = RefactoringFlags(1 << 2);
    /// The refactoring should present a preview before being applied.
    pub const NEEDS_PREVIEW: RefactoringFlags = RefactoringFlags(1 << 3);

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: RefactoringFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for RefactoringFlags {
    type Output = RefactoringFlags;

    fn bitor(self, rhs: RefactoringFlags) -> RefactoringFlags {
        RefactoringFlags(self.0 | rhs.0)
    }
}

/// Fields shared by every refactoring descriptor.
///
/// A descriptor is either being *built* (typed setters fill the fields) or
/// *reconstructed* from a persisted record — never both. Setters validate
/// single arguments eagerly; cross-field constraints belong to
/// `validate()` on the typed descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorCore {
    id: &'static str,
    project: Option<String>,
    description: String,
    comment: Option<String>,
    flags: RefactoringFlags,
}

impl DescriptorCore {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            project: None,
            description: String::new(),
            comment: None,
            flags: RefactoringFlags::NONE,
        }
    }

    pub fn reconstruct(id: &'static str, record: &DescriptorRecord) -> Self {
        Self {
            id,
            project: record.project.clone(),
            description: record.description.clone(),
            comment: record.comment.clone(),
            flags: record.flags,
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn flags(&self) -> RefactoringFlags {
        self.flags
    }

    /// `None` associates the refactoring with the whole workspace.
    pub fn set_project(&mut self, project: Option<String>) {
        if let Some(project) = &project {
            assert!(!project.is_empty(), "project name must not be empty");
        }
        self.project = project;
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = description.into();
        assert!(!description.is_empty(), "description must not be empty");
        self.description = description;
    }

    pub fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }

    pub fn set_flags(&mut self, flags: RefactoringFlags) {
        self.flags = flags;
    }

    pub fn validate(&self) -> RefactoringStatus {
        let mut status = RefactoringStatus::new();
        if self.description.is_empty() {
            status.add_fatal_error("Refactoring descriptor has no description");
        }
        // Reconstruction can smuggle in what the setter rejects.
        if self.project.as_deref() == Some("") {
            status.add_fatal_error("Refactoring descriptor has an empty project name");
        }
        status
    }
}

/// The persisted shape of a descriptor: kind id, scope, human-readable
/// strings, flags, and the flat argument map. Nothing richer crosses the
/// persistence or scripting boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub flags: RefactoringFlags,
    #[serde(default)]
    pub arguments: ArgumentMap,
}
