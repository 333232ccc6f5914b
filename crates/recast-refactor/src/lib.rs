//! Refactoring engine for Recast.
//!
//! This crate carries the descriptor model (build, persist, and replay
//! refactorings as flat argument records), the contribution registry that
//! maps kind ids to executors, the per-unit rewrite coordinator that turns
//! recorded AST and import mutations into change objects, and the change
//! model itself. Four refactoring kinds ship built in:
//! - Rename Resource
//! - Move (resources, with package declaration updates)
//! - Move Static Members
//! - Convert Anonymous Class to Nested

mod arguments;
mod change;
mod cleanup;
mod contribution;
mod descriptor;
mod descriptors;
mod history;
mod preview;
mod refactoring;
mod resource;
mod rewrite;

pub use arguments::{
    get_bool, get_required_string, get_resource, get_selection, get_string, set_bool,
    set_resource, set_selection, set_string, ArgumentError, ArgumentMap,
};
pub use change::{
    perform_change, Change, CompilationUnitChange, CompositeChange, EditGroup, PerformedChange,
};
pub use cleanup::{option_keys, CleanUp, CleanUpOptions, ConvertLoopCleanUp};
pub use contribution::{Contribution, ContributionRegistry};
pub use descriptor::{attributes, ids, DescriptorCore, DescriptorRecord, RefactoringFlags};
pub use descriptors::{
    ConvertAnonymousDescriptor, Descriptor, MoveDescriptor, MoveStaticMembersDescriptor,
    RenameResourceDescriptor,
};
pub use history::RefactoringHistory;
pub use preview::{preview_change, ChangePreview, FilePreview, ResourceRename};
pub use refactoring::{
    ConvertAnonymousRefactoring, MoveRefactoring, MoveStaticMembersRefactoring, RefactorError,
    Refactoring, RenameResourceRefactoring,
};
pub use resource::{
    CompilationUnit, InMemoryWorkspace, ResourceHandle, ResourceKind, ResourcePath,
    ResourcePathError, Workspace,
};
pub use rewrite::CompilationUnitRewrite;
