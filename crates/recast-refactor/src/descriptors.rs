//! Typed descriptors, one per refactoring kind.
//!
//! Each descriptor supports two lifecycles: the *build* path (default
//! construction plus typed setters, used by interactive callers) and the
//! *reconstruct* path (decoding a persisted [`DescriptorRecord`], used by
//! history replay and scripting). `populate_argument_map` re-encodes the
//! typed state; shared keys are written before kind-specific ones so the
//! wire layout stays stable across versions.

use recast_core::{RefactoringStatus, TextRange};

use crate::arguments::{
    get_bool, get_resource, get_required_string, get_selection, get_string, set_bool,
    set_resource, set_selection, set_string, ArgumentError, ArgumentMap,
};
use crate::descriptor::{attributes, ids, DescriptorCore, DescriptorRecord, RefactoringFlags};
use crate::resource::{ResourceHandle, ResourceKind, Workspace};

fn indexed(base: &str, index: usize) -> String {
    format!("{base}{index}")
}

/// Descriptor for the rename resource refactoring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenameResourceDescriptor {
    core: DescriptorCore,
    resource: Option<ResourceHandle>,
    new_name: Option<String>,
}

impl RenameResourceDescriptor {
    pub fn new() -> Self {
        Self {
            core: DescriptorCore::new(ids::RENAME_RESOURCE),
            resource: None,
            new_name: None,
        }
    }

    pub fn from_record(
        record: &DescriptorRecord,
        workspace: &dyn Workspace,
    ) -> Result<Self, ArgumentError> {
        let resource = get_resource(
            &record.arguments,
            attributes::INPUT,
            record.project.as_deref(),
            workspace,
        )?;
        let new_name = get_required_string(&record.arguments, attributes::NAME)?.to_string();
        Ok(Self {
            core: DescriptorCore::reconstruct(ids::RENAME_RESOURCE, record),
            resource: Some(resource),
            new_name: Some(new_name),
        })
    }

    pub fn core(&self) -> &DescriptorCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut DescriptorCore {
        &mut self.core
    }

    pub fn resource(&self) -> Option<&ResourceHandle> {
        self.resource.as_ref()
    }

    pub fn new_name(&self) -> Option<&str> {
        self.new_name.as_deref()
    }

    /// Note: renaming a project-kind resource requires the project scope to
    /// stay unset; `validate` enforces this cross-field constraint.
    pub fn set_resource(&mut self, resource: ResourceHandle) {
        self.resource = Some(resource);
    }

    pub fn set_new_name(&mut self, name: &str) {
        assert!(!name.is_empty(), "new name must not be empty");
        self.new_name = Some(name.to_string());
    }

    pub fn populate_argument_map(&self, map: &mut ArgumentMap) {
        if let Some(resource) = &self.resource {
            set_resource(map, attributes::INPUT, self.core.project(), resource);
        }
        if let Some(name) = &self.new_name {
            set_string(map, attributes::NAME, name);
        }
    }

    pub fn validate(&self) -> RefactoringStatus {
        let mut status = self.core.validate();
        match &self.resource {
            None => status.add_fatal_error("No resource to rename is set"),
            Some(resource) => {
                if resource.kind == ResourceKind::Project && self.core.project().is_some() {
                    status.add_fatal_error(
                        "Project scope must be unset when renaming a project resource",
                    );
                }
            }
        }
        if self.new_name.as_deref().unwrap_or("").is_empty() {
            status.add_fatal_error("No new name is set");
        }
        status
    }
}

impl Default for RenameResourceDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

/// Descriptor for the move refactoring (resources to a destination folder).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveDescriptor {
    core: DescriptorCore,
    destination: Option<ResourceHandle>,
    resources: Vec<ResourceHandle>,
    update_references: bool,
}

impl MoveDescriptor {
    pub fn new() -> Self {
        Self {
            core: DescriptorCore::new(ids::MOVE),
            destination: None,
            resources: Vec::new(),
            update_references: true,
        }
    }

    pub fn from_record(
        record: &DescriptorRecord,
        workspace: &dyn Workspace,
    ) -> Result<Self, ArgumentError> {
        let project = record.project.as_deref();
        let destination =
            get_resource(&record.arguments, attributes::DESTINATION, project, workspace)?;
        let mut resources = Vec::new();
        let mut index = 1;
        while get_string(&record.arguments, &indexed(attributes::ELEMENT, index)).is_some() {
            resources.push(get_resource(
                &record.arguments,
                &indexed(attributes::ELEMENT, index),
                project,
                workspace,
            )?);
            index += 1;
        }
        if resources.is_empty() {
            return Err(ArgumentError::Missing {
                key: indexed(attributes::ELEMENT, 1),
            });
        }
        let update_references = get_bool(&record.arguments, attributes::REFERENCES)?;
        Ok(Self {
            core: DescriptorCore::reconstruct(ids::MOVE, record),
            destination: Some(destination),
            resources,
            update_references,
        })
    }

    pub fn core(&self) -> &DescriptorCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut DescriptorCore {
        &mut self.core
    }

    pub fn destination(&self) -> Option<&ResourceHandle> {
        self.destination.as_ref()
    }

    pub fn resources(&self) -> &[ResourceHandle] {
        &self.resources
    }

    pub fn update_references(&self) -> bool {
        self.update_references
    }

    pub fn set_destination(&mut self, destination: ResourceHandle) {
        self.destination = Some(destination);
    }

    pub fn add_resource(&mut self, resource: ResourceHandle) {
        self.resources.push(resource);
    }

    pub fn set_update_references(&mut self, update: bool) {
        self.update_references = update;
    }

    pub fn populate_argument_map(&self, map: &mut ArgumentMap) {
        if let Some(destination) = &self.destination {
            set_resource(map, attributes::DESTINATION, self.core.project(), destination);
        }
        for (i, resource) in self.resources.iter().enumerate() {
            set_resource(
                map,
                &indexed(attributes::ELEMENT, i + 1),
                self.core.project(),
                resource,
            );
        }
        set_bool(map, attributes::REFERENCES, self.update_references);
    }

    pub fn validate(&self) -> RefactoringStatus {
        let mut status = self.core.validate();
        match &self.destination {
            None => status.add_fatal_error("No move destination is set"),
            Some(destination) => {
                if destination.kind == ResourceKind::File {
                    status.add_fatal_error("Move destination must be a folder or project");
                }
            }
        }
        if self.resources.is_empty() {
            status.add_fatal_error("No resources to move are set");
        }
        if self
            .resources
            .iter()
            .any(|r| r.kind == ResourceKind::Project)
        {
            status.add_fatal_error("Projects cannot be moved");
        }
        status
    }
}

impl Default for MoveDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

/// Descriptor for the move static members refactoring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveStaticMembersDescriptor {
    core: DescriptorCore,
    declaring: Option<ResourceHandle>,
    destination: Option<ResourceHandle>,
    members: Vec<String>,
    delegate: bool,
    deprecate_delegate: bool,
}

impl MoveStaticMembersDescriptor {
    pub fn new() -> Self {
        Self {
            core: DescriptorCore::new(ids::MOVE_STATIC_MEMBERS),
            declaring: None,
            destination: None,
            members: Vec::new(),
            delegate: false,
            deprecate_delegate: false,
        }
    }

    pub fn from_record(
        record: &DescriptorRecord,
        workspace: &dyn Workspace,
    ) -> Result<Self, ArgumentError> {
        let project = record.project.as_deref();
        let declaring = get_resource(&record.arguments, attributes::INPUT, project, workspace)?;
        let destination =
            get_resource(&record.arguments, attributes::DESTINATION, project, workspace)?;
        let mut members = Vec::new();
        let mut index = 1;
        while let Some(member) =
            get_string(&record.arguments, &indexed(attributes::MEMBER, index))
        {
            members.push(member.to_string());
            index += 1;
        }
        if members.is_empty() {
            return Err(ArgumentError::Missing {
                key: indexed(attributes::MEMBER, 1),
            });
        }
        Ok(Self {
            core: DescriptorCore::reconstruct(ids::MOVE_STATIC_MEMBERS, record),
            declaring: Some(declaring),
            destination: Some(destination),
            members,
            delegate: get_bool(&record.arguments, attributes::DELEGATE)?,
            deprecate_delegate: get_bool(&record.arguments, attributes::DEPRECATE)?,
        })
    }

    pub fn core(&self) -> &DescriptorCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut DescriptorCore {
        &mut self.core
    }

    pub fn declaring(&self) -> Option<&ResourceHandle> {
        self.declaring.as_ref()
    }

    pub fn destination(&self) -> Option<&ResourceHandle> {
        self.destination.as_ref()
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn delegate(&self) -> bool {
        self.delegate
    }

    pub fn deprecate_delegate(&self) -> bool {
        self.deprecate_delegate
    }

    pub fn set_declaring(&mut self, unit: ResourceHandle) {
        self.declaring = Some(unit);
    }

    pub fn set_destination(&mut self, unit: ResourceHandle) {
        self.destination = Some(unit);
    }

    pub fn add_member(&mut self, name: &str) {
        assert!(!name.is_empty(), "member name must not be empty");
        self.members.push(name.to_string());
    }

    pub fn set_delegate(&mut self, delegate: bool) {
        self.delegate = delegate;
    }

    pub fn set_deprecate_delegate(&mut self, deprecate: bool) {
        self.deprecate_delegate = deprecate;
    }

    pub fn populate_argument_map(&self, map: &mut ArgumentMap) {
        if let Some(declaring) = &self.declaring {
            set_resource(map, attributes::INPUT, self.core.project(), declaring);
        }
        if let Some(destination) = &self.destination {
            set_resource(map, attributes::DESTINATION, self.core.project(), destination);
        }
        for (i, member) in self.members.iter().enumerate() {
            set_string(map, &indexed(attributes::MEMBER, i + 1), member);
        }
        set_bool(map, attributes::DELEGATE, self.delegate);
        set_bool(map, attributes::DEPRECATE, self.deprecate_delegate);
    }

    pub fn validate(&self) -> RefactoringStatus {
        let mut status = self.core.validate();
        if self.declaring.is_none() {
            status.add_fatal_error("No declaring compilation unit is set");
        }
        if self.destination.is_none() {
            status.add_fatal_error("No destination compilation unit is set");
        }
        if self.members.is_empty() {
            status.add_fatal_error("No members to move are set");
        }
        if self.deprecate_delegate && !self.delegate {
            status.add_warning("Deprecating delegates has no effect when no delegates are kept");
        }
        status
    }
}

impl Default for MoveStaticMembersDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

/// Descriptor for the convert anonymous class to nested class refactoring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertAnonymousDescriptor {
    core: DescriptorCore,
    unit: Option<ResourceHandle>,
    selection: Option<TextRange>,
    class_name: Option<String>,
    declare_final: bool,
    declare_static: bool,
}

impl ConvertAnonymousDescriptor {
    pub fn new() -> Self {
        Self {
            core: DescriptorCore::new(ids::CONVERT_ANONYMOUS),
            unit: None,
            selection: None,
            class_name: None,
            declare_final: false,
            declare_static: false,
        }
    }

    pub fn from_record(
        record: &DescriptorRecord,
        workspace: &dyn Workspace,
    ) -> Result<Self, ArgumentError> {
        let unit = get_resource(
            &record.arguments,
            attributes::INPUT,
            record.project.as_deref(),
            workspace,
        )?;
        let selection = get_selection(&record.arguments, attributes::SELECTION)?;
        let class_name = get_required_string(&record.arguments, attributes::NAME)?.to_string();
        Ok(Self {
            core: DescriptorCore::reconstruct(ids::CONVERT_ANONYMOUS, record),
            unit: Some(unit),
            selection: Some(selection),
            class_name: Some(class_name),
            declare_final: get_bool(&record.arguments, attributes::FINAL)?,
            declare_static: get_bool(&record.arguments, attributes::STATIC)?,
        })
    }

    pub fn core(&self) -> &DescriptorCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut DescriptorCore {
        &mut self.core
    }

    pub fn unit(&self) -> Option<&ResourceHandle> {
        self.unit.as_ref()
    }

    pub fn selection(&self) -> Option<TextRange> {
        self.selection
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn declare_final(&self) -> bool {
        self.declare_final
    }

    pub fn declare_static(&self) -> bool {
        self.declare_static
    }

    pub fn set_unit(&mut self, unit: ResourceHandle) {
        self.unit = Some(unit);
    }

    pub fn set_selection(&mut self, selection: TextRange) {
        self.selection = Some(selection);
    }

    pub fn set_class_name(&mut self, name: &str) {
        assert!(!name.is_empty(), "class name must not be empty");
        self.class_name = Some(name.to_string());
    }

    pub fn set_declare_final(&mut self, declare_final: bool) {
        self.declare_final = declare_final;
    }

    pub fn set_declare_static(&mut self, declare_static: bool) {
        self.declare_static = declare_static;
    }

    pub fn populate_argument_map(&self, map: &mut ArgumentMap) {
        if let Some(unit) = &self.unit {
            set_resource(map, attributes::INPUT, self.core.project(), unit);
        }
        if let Some(selection) = self.selection {
            set_selection(map, attributes::SELECTION, selection);
        }
        if let Some(name) = &self.class_name {
            set_string(map, attributes::NAME, name);
        }
        set_bool(map, attributes::FINAL, self.declare_final);
        set_bool(map, attributes::STATIC, self.declare_static);
    }

    pub fn validate(&self) -> RefactoringStatus {
        let mut status = self.core.validate();
        if self.unit.is_none() {
            status.add_fatal_error("No compilation unit is set");
        }
        if self.selection.is_none() {
            status.add_fatal_error("No selection is set");
        }
        if self.class_name.as_deref().unwrap_or("").is_empty() {
            status.add_fatal_error("No class name is set");
        }
        status
    }
}

impl Default for ConvertAnonymousDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

/// Closed set of descriptor kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Descriptor {
    RenameResource(RenameResourceDescriptor),
    Move(MoveDescriptor),
    MoveStaticMembers(MoveStaticMembersDescriptor),
    ConvertAnonymous(ConvertAnonymousDescriptor),
}

impl Descriptor {
    pub fn core(&self) -> &DescriptorCore {
        match self {
            Descriptor::RenameResource(d) => d.core(),
            Descriptor::Move(d) => d.core(),
            Descriptor::MoveStaticMembers(d) => d.core(),
            Descriptor::ConvertAnonymous(d) => d.core(),
        }
    }

    pub fn id(&self) -> &'static str {
        self.core().id()
    }

    pub fn flags(&self) -> RefactoringFlags {
        self.core().flags()
    }

    pub fn validate(&self) -> RefactoringStatus {
        match self {
            Descriptor::RenameResource(d) => d.validate(),
            Descriptor::Move(d) => d.validate(),
            Descriptor::MoveStaticMembers(d) => d.validate(),
            Descriptor::ConvertAnonymous(d) => d.validate(),
        }
    }

    pub fn populate_argument_map(&self) -> ArgumentMap {
        let mut map = ArgumentMap::new();
        match self {
            Descriptor::RenameResource(d) => d.populate_argument_map(&mut map),
            Descriptor::Move(d) => d.populate_argument_map(&mut map),
            Descriptor::MoveStaticMembers(d) => d.populate_argument_map(&mut map),
            Descriptor::ConvertAnonymous(d) => d.populate_argument_map(&mut map),
        }
        map
    }

    /// Snapshot this descriptor into its wire representation.
    pub fn to_record(&self) -> DescriptorRecord {
        let core = self.core();
        DescriptorRecord {
            id: core.id().to_string(),
            project: core.project().map(str::to_string),
            description: core.description().to_string(),
            comment: core.comment().map(str::to_string),
            flags: core.flags(),
            arguments: self.populate_argument_map(),
        }
    }
}
