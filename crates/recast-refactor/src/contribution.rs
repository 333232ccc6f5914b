//! Contribution registry: the extension point mapping refactoring kind ids
//! to descriptor factories and executors.

use std::collections::HashMap;

use recast_core::RefactoringStatus;

use crate::arguments::ArgumentError;
use crate::descriptor::{ids, DescriptorRecord};
use crate::descriptors::{
    ConvertAnonymousDescriptor, Descriptor, MoveDescriptor, MoveStaticMembersDescriptor,
    RenameResourceDescriptor,
};
use crate::refactoring::{
    ConvertAnonymousRefactoring, MoveRefactoring, MoveStaticMembersRefactoring, RefactorError,
    Refactoring, RenameResourceRefactoring,
};
use crate::resource::Workspace;

/// One registered refactoring kind: how to create a blank descriptor, how
/// to restore one from a persisted record, and how to build its executor.
///
/// `build` merges domain problems of the descriptor into the caller's
/// status; only infrastructure problems (a descriptor of the wrong kind)
/// surface as errors.
pub struct Contribution {
    id: &'static str,
    create: fn() -> Descriptor,
    restore: fn(&DescriptorRecord, &dyn Workspace) -> Result<Descriptor, ArgumentError>,
    build: fn(Descriptor, &mut RefactoringStatus) -> Result<Box<dyn Refactoring>, RefactorError>,
}

impl Contribution {
    pub fn new(
        id: &'static str,
        create: fn() -> Descriptor,
        restore: fn(&DescriptorRecord, &dyn Workspace) -> Result<Descriptor, ArgumentError>,
        build: fn(
            Descriptor,
            &mut RefactoringStatus,
        ) -> Result<Box<dyn Refactoring>, RefactorError>,
    ) -> Self {
        Self {
            id,
            create,
            restore,
            build,
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn create_descriptor(&self) -> Descriptor {
        (self.create)()
    }

    pub fn restore_descriptor(
        &self,
        record: &DescriptorRecord,
        workspace: &dyn Workspace,
    ) -> Result<Descriptor, ArgumentError> {
        (self.restore)(record, workspace)
    }

    pub fn create_refactoring(
        &self,
        descriptor: Descriptor,
        status: &mut RefactoringStatus,
    ) -> Result<Box<dyn Refactoring>, RefactorError> {
        (self.build)(descriptor, status)
    }
}

fn mismatch(expected: &'static str, actual: &Descriptor) -> RefactorError {
    RefactorError::DescriptorMismatch {
        expected,
        actual: actual.id(),
    }
}

fn rename_resource_contribution() -> Contribution {
    Contribution::new(
        ids::RENAME_RESOURCE,
        || Descriptor::RenameResource(RenameResourceDescriptor::new()),
        |record, ws| {
            RenameResourceDescriptor::from_record(record, ws).map(Descriptor::RenameResource)
        },
        |descriptor, status| match descriptor {
            Descriptor::RenameResource(d) => {
                status.merge(d.validate());
                Ok(Box::new(RenameResourceRefactoring::new(d)))
            }
            other => Err(mismatch(ids::RENAME_RESOURCE, &other)),
        },
    )
}

fn move_contribution() -> Contribution {
    Contribution::new(
        ids::MOVE,
        || Descriptor::Move(MoveDescriptor::new()),
        |record, ws| MoveDescriptor::from_record(record, ws).map(Descriptor::Move),
        |descriptor, status| match descriptor {
            Descriptor::Move(d) => {
                status.merge(d.validate());
                Ok(Box::new(MoveRefactoring::new(d)))
            }
            other => Err(mismatch(ids::MOVE, &other)),
        },
    )
}

fn move_static_members_contribution() -> Contribution {
    Contribution::new(
        ids::MOVE_STATIC_MEMBERS,
        || Descriptor::MoveStaticMembers(MoveStaticMembersDescriptor::new()),
        |record, ws| {
            MoveStaticMembersDescriptor::from_record(record, ws)
                .map(Descriptor::MoveStaticMembers)
        },
        |descriptor, status| match descriptor {
            Descriptor::MoveStaticMembers(d) => {
                status.merge(d.validate());
                Ok(Box::new(MoveStaticMembersRefactoring::new(d)))
            }
            other => Err(mismatch(ids::MOVE_STATIC_MEMBERS, &other)),
        },
    )
}

fn convert_anonymous_contribution() -> Contribution {
    Contribution::new(
        ids::CONVERT_ANONYMOUS,
        || Descriptor::ConvertAnonymous(ConvertAnonymousDescriptor::new()),
        |record, ws| {
            ConvertAnonymousDescriptor::from_record(record, ws).map(Descriptor::ConvertAnonymous)
        },
        |descriptor, status| match descriptor {
            Descriptor::ConvertAnonymous(d) => {
                status.merge(d.validate());
                Ok(Box::new(ConvertAnonymousRefactoring::new(d)))
            }
            other => Err(mismatch(ids::CONVERT_ANONYMOUS, &other)),
        },
    )
}

/// Lookup table of contributions, keyed by refactoring kind id.
#[derive(Default)]
pub struct ContributionRegistry {
    contributions: HashMap<&'static str, Contribution>,
}

impl ContributionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in contributions registered.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(rename_resource_contribution());
        registry.register(move_contribution());
        registry.register(move_static_members_contribution());
        registry.register(convert_anonymous_contribution());
        registry
    }

    pub fn register(&mut self, contribution: Contribution) {
        if self
            .contributions
            .insert(contribution.id(), contribution)
            .is_some()
        {
            tracing::debug!("replaced an existing refactoring contribution");
        }
    }

    pub fn contribution(&self, id: &str) -> Option<&Contribution> {
        self.contributions.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.contributions.keys().copied()
    }

    pub fn create_descriptor(&self, id: &str) -> Result<Descriptor, RefactorError> {
        self.contribution(id)
            .map(Contribution::create_descriptor)
            .ok_or_else(|| RefactorError::UnknownContribution(id.to_string()))
    }

    pub fn restore_descriptor(
        &self,
        record: &DescriptorRecord,
        workspace: &dyn Workspace,
    ) -> Result<Descriptor, RefactorError> {
        let contribution = self
            .contribution(&record.id)
            .ok_or_else(|| RefactorError::UnknownContribution(record.id.clone()))?;
        Ok(contribution.restore_descriptor(record, workspace)?)
    }

    /// Build the executor for a descriptor, merging validation problems
    /// into `status`.
    pub fn create_refactoring(
        &self,
        descriptor: Descriptor,
        status: &mut RefactoringStatus,
    ) -> Result<Box<dyn Refactoring>, RefactorError> {
        let contribution = self
            .contribution(descriptor.id())
            .ok_or_else(|| RefactorError::UnknownContribution(descriptor.id().to_string()))?;
        contribution.create_refactoring(descriptor, status)
    }

    /// Replay a persisted record end to end: restore the descriptor and
    /// build its executor. A record with fatal validation problems is
    /// refused.
    pub fn replay(
        &self,
        record: &DescriptorRecord,
        workspace: &dyn Workspace,
    ) -> Result<Box<dyn Refactoring>, RefactorError> {
        let descriptor = self.restore_descriptor(record, workspace)?;
        let mut status = RefactoringStatus::new();
        let refactoring = self.create_refactoring(descriptor, &mut status)?;
        if status.has_fatal_error() {
            return Err(RefactorError::InvalidDescriptor(status.to_string()));
        }
        Ok(refactoring)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::arguments::ArgumentMap;
    use crate::descriptor::RefactoringFlags;
    use crate::resource::{InMemoryWorkspace, ResourcePath};

    fn record(id: &str, arguments: ArgumentMap) -> DescriptorRecord {
        DescriptorRecord {
            id: id.to_string(),
            project: Some("P".to_string()),
            description: "test".to_string(),
            comment: None,
            flags: RefactoringFlags::NONE,
            arguments,
        }
    }

    #[test]
    fn builtin_registry_knows_all_four_kinds() {
        let registry = ContributionRegistry::builtin();
        let mut registered: Vec<_> = registry.ids().collect();
        registered.sort_unstable();
        assert_eq!(
            registered,
            vec![
                ids::CONVERT_ANONYMOUS,
                ids::MOVE,
                ids::MOVE_STATIC_MEMBERS,
                ids::RENAME_RESOURCE,
            ]
        );
    }

    #[test]
    fn unknown_ids_are_reported() {
        let registry = ContributionRegistry::builtin();
        let err = registry.create_descriptor("no.such.kind").unwrap_err();
        assert!(matches!(err, RefactorError::UnknownContribution(id) if id == "no.such.kind"));
    }

    #[test]
    fn restore_goes_through_the_contribution() {
        let mut ws = InMemoryWorkspace::new();
        ws.insert_file(ResourcePath::parse("/P/Foo.java").unwrap(), "class Foo {}");

        let mut arguments = ArgumentMap::new();
        arguments.insert("input", "Foo.java");
        arguments.insert("name", "Bar.java");
        let registry = ContributionRegistry::builtin();
        let descriptor = registry
            .restore_descriptor(&record(ids::RENAME_RESOURCE, arguments), &ws)
            .unwrap();
        assert_eq!(descriptor.id(), ids::RENAME_RESOURCE);
        assert!(descriptor.validate().is_ok());
    }

    #[test]
    fn replay_refuses_fatal_descriptors() {
        let mut ws = InMemoryWorkspace::new();
        ws.insert_file(ResourcePath::parse("/P/Foo.java").unwrap(), "class Foo {}");

        let mut arguments = ArgumentMap::new();
        arguments.insert("input", "Foo.java");
        arguments.insert("name", "Bar.java");
        let mut rec = record(ids::RENAME_RESOURCE, arguments);
        rec.description = String::new();
        let Err(err) = ContributionRegistry::builtin().replay(&rec, &ws) else {
            panic!("fatal descriptor was replayed");
        };
        assert!(matches!(err, RefactorError::InvalidDescriptor(_)));
    }

    #[test]
    fn build_merges_validation_problems_into_the_status() {
        let registry = ContributionRegistry::builtin();
        let descriptor = registry.create_descriptor(ids::RENAME_RESOURCE).unwrap();
        let mut status = RefactoringStatus::new();
        let refactoring = registry
            .create_refactoring(descriptor, &mut status)
            .unwrap();
        assert!(status.has_fatal_error());
        assert_eq!(refactoring.name(), "Rename resource");
    }

    #[test]
    fn build_rejects_a_descriptor_of_the_wrong_kind() {
        let registry = ContributionRegistry::builtin();
        let descriptor = registry.create_descriptor(ids::MOVE).unwrap();
        let contribution = registry.contribution(ids::RENAME_RESOURCE).unwrap();
        let mut status = RefactoringStatus::new();
        let Err(err) = contribution.create_refactoring(descriptor, &mut status) else {
            panic!("mismatched descriptor built an executor");
        };
        assert!(matches!(err, RefactorError::DescriptorMismatch { .. }));
    }
}
