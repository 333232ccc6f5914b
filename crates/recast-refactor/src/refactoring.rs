//! The refactoring abstraction and the built-in executors.
//!
//! An executor wraps a validated descriptor and drives the two-phase
//! protocol: `check_conditions` reports problems as a
//! [`RefactoringStatus`], `create_change` builds the change tree without
//! touching the workspace. Infrastructure failures (parse errors, stale
//! buffers, cancellation) surface as [`RefactorError`], never as status
//! entries.

use recast_core::{Cancelled, EditError, ProgressMonitor, RefactoringStatus, TextRange};
use recast_syntax::{ImportDecl, ParseError, RewriteError};
use regex::Regex;
use thiserror::Error;

use crate::arguments::ArgumentError;
use crate::change::{Change, CompositeChange};
use crate::descriptors::{
    ConvertAnonymousDescriptor, MoveDescriptor, MoveStaticMembersDescriptor,
    RenameResourceDescriptor,
};
use crate::resource::{
    CompilationUnit, ResourceHandle, ResourceKind, ResourcePath, Workspace,
};
use crate::rewrite::CompilationUnitRewrite;

#[derive(Debug, Error)]
pub enum RefactorError {
    #[error("failed to parse `{path}`: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error("no refactoring contribution is registered for id `{0}`")]
    UnknownContribution(String),
    #[error("descriptor kind `{actual}` does not match contribution `{expected}`")]
    DescriptorMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("descriptor is not executable: {0}")]
    InvalidDescriptor(String),
    #[error("resource does not exist: `{0}`")]
    MissingResource(String),
    #[error("destination already exists: `{0}`")]
    ResourceExists(String),
    #[error("buffer for `{0}` does not match the workspace")]
    StaleBuffer(String),
    #[error("no static member `{member}` in `{unit}`")]
    MemberNotFound { unit: String, member: String },
    #[error("no anonymous class allocation at the selection in `{unit}`")]
    NoAnonymousClass { unit: String },
}

/// A refactoring ready to run against a workspace snapshot.
pub trait Refactoring {
    fn name(&self) -> &str;

    /// Validate every precondition. Entries with fatal severity make the
    /// refactoring unexecutable; lesser severities are advisory.
    fn check_conditions(
        &self,
        workspace: &dyn Workspace,
        pm: &ProgressMonitor,
    ) -> Result<RefactoringStatus, RefactorError>;

    /// Compute the change tree. Returns `None` when the refactoring turns
    /// out to require no modification at all.
    fn create_change(
        &self,
        workspace: &dyn Workspace,
        pm: &ProgressMonitor,
    ) -> Result<Option<Change>, RefactorError>;
}

fn unit_of(
    workspace: &dyn Workspace,
    path: &ResourcePath,
) -> Result<CompilationUnit, RefactorError> {
    let text = workspace
        .file_text(path)
        .ok_or_else(|| RefactorError::MissingResource(path.to_string()))?;
    Ok(CompilationUnit::new(
        ResourceHandle::file(path.clone()),
        text,
    ))
}

fn child_monitor(pm: &ProgressMonitor) -> ProgressMonitor {
    ProgressMonitor::new(pm.token().clone())
}

// Word-boundary scanning shared by the textual member and reference
// locators.

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

pub(crate) fn find_word(haystack: &str, word: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(word) {
        let abs = from + pos;
        let before_ok = haystack[..abs]
            .chars()
            .next_back()
            .map_or(true, |c| !is_ident_char(c));
        let after_ok = haystack[abs + word.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_ident_char(c));
        if before_ok && after_ok {
            return Some(abs);
        }
        from = abs + word.len();
    }
    None
}

pub(crate) fn references_name(text: &str, simple: &str) -> bool {
    find_word(text, simple).is_some()
}

/// Offset just past the matching `}` for the `{` at `open`. Comment and
/// string contents are not tracked; good enough for well-formed sources.
pub(crate) fn matching_brace_end(source: &str, open: usize) -> Option<usize> {
    debug_assert_eq!(source[open..].chars().next(), Some('{'));
    let mut depth = 0usize;
    for (i, c) in source[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

pub(crate) fn line_end(source: &str, pos: usize) -> usize {
    source[pos..]
        .find('\n')
        .map_or(source.len(), |i| pos + i + 1)
}

/// Locate the full-line span of the static member `name`: the declaration
/// line (plus any directly preceding annotation lines) through the
/// terminating `;` for fields or the matching `}` for methods.
fn find_static_member(source: &str, name: &str) -> Option<TextRange> {
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let trimmed = line.trim_start();
        if trimmed.starts_with("//") || trimmed.starts_with('*') || trimmed.starts_with("/*") {
            continue;
        }
        if find_word(line, "static").is_none() || find_word(line, "import").is_some() {
            continue;
        }
        let Some(name_pos) = find_word(line, name) else {
            continue;
        };

        let mut start = line_start;
        // Pull directly preceding annotation lines into the span.
        loop {
            let Some(prev_end) = source[..start].rfind('\n') else {
                break;
            };
            let prev_start = source[..prev_end].rfind('\n').map_or(0, |i| i + 1);
            if source[prev_start..prev_end].trim_start().starts_with('@') {
                start = prev_start;
            } else {
                break;
            }
        }

        let after_name = &line[name_pos + name.len()..];
        let end = if after_name.trim_start().starts_with('(') {
            // Method: span to the matching close brace, or the `;` of an
            // abstract-style declaration.
            let sig_end = line_start + name_pos;
            let brace = source[sig_end..].find('{').map(|i| sig_end + i);
            let semi = source[sig_end..].find(';').map(|i| sig_end + i);
            match (brace, semi) {
                (Some(b), s) if s.map_or(true, |s| b < s) => {
                    line_end(source, matching_brace_end(source, b)?.saturating_sub(1))
                }
                (_, Some(s)) => line_end(source, s),
                _ => return None,
            }
        } else {
            // Field: span to the terminating semicolon.
            let semi = source[line_start + name_pos..]
                .find(';')
                .map(|i| line_start + name_pos + i)?;
            line_end(source, semi)
        };
        return Some(TextRange::new(start, end));
    }
    None
}

pub(crate) fn leading_indent(source: &str, line_start: usize) -> &str {
    let line = &source[line_start..line_end(source, line_start)];
    &line[..line.len() - line.trim_start().len()]
}

/// Rename a file or folder in place.
pub struct RenameResourceRefactoring {
    descriptor: RenameResourceDescriptor,
    name: String,
}

impl RenameResourceRefactoring {
    pub fn new(descriptor: RenameResourceDescriptor) -> Self {
        let name = match (descriptor.resource(), descriptor.new_name()) {
            (Some(resource), Some(new_name)) => {
                format!("Rename '{}' to '{}'", resource.name(), new_name)
            }
            _ => "Rename resource".to_string(),
        };
        Self { descriptor, name }
    }
}

impl Refactoring for RenameResourceRefactoring {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_conditions(
        &self,
        workspace: &dyn Workspace,
        pm: &ProgressMonitor,
    ) -> Result<RefactoringStatus, RefactorError> {
        pm.check_cancelled()?;
        let mut status = self.descriptor.validate();
        let (Some(resource), Some(new_name)) =
            (self.descriptor.resource(), self.descriptor.new_name())
        else {
            return Ok(status);
        };
        if !workspace.exists(&resource.path) {
            status.add_fatal_error(format!("'{}' does not exist", resource.path));
            return Ok(status);
        }
        if resource.name() == new_name {
            status.add_fatal_error(format!("'{}' already has that name", resource.path));
        }
        let sibling = match resource.path.parent() {
            Some(parent) => parent.join(new_name),
            None => match ResourcePath::parse(&format!("/{new_name}")) {
                Ok(path) => path,
                Err(err) => {
                    status.add_fatal_error(err.to_string());
                    return Ok(status);
                }
            },
        };
        if workspace.exists(&sibling) {
            status.add_fatal_error(format!("'{sibling}' already exists"));
        }
        Ok(status)
    }

    fn create_change(
        &self,
        _workspace: &dyn Workspace,
        pm: &ProgressMonitor,
    ) -> Result<Option<Change>, RefactorError> {
        pm.check_cancelled()?;
        let (Some(resource), Some(new_name)) =
            (self.descriptor.resource(), self.descriptor.new_name())
        else {
            return Err(RefactorError::InvalidDescriptor(
                "rename descriptor is incomplete".to_string(),
            ));
        };
        pm.done();
        Ok(Some(Change::RenameResource {
            resource: resource.clone(),
            new_name: new_name.to_string(),
        }))
    }
}

/// Move resources to a destination container, rewriting the package
/// declaration of moved compilation units.
pub struct MoveRefactoring {
    descriptor: MoveDescriptor,
    name: String,
}

impl MoveRefactoring {
    pub fn new(descriptor: MoveDescriptor) -> Self {
        let name = format!("Move {} resource(s)", descriptor.resources().len());
        Self { descriptor, name }
    }

    /// Package implied by a container: path segments below the project with
    /// a leading source-folder segment stripped, or `None` for the default
    /// package.
    fn package_of(container: &ResourcePath) -> Option<String> {
        let mut segments: Vec<&str> = container.segments().skip(1).collect();
        if segments.first().is_some_and(|s| *s == "src") {
            segments.remove(0);
        }
        if segments.is_empty() {
            None
        } else {
            Some(segments.join("."))
        }
    }
}

impl Refactoring for MoveRefactoring {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_conditions(
        &self,
        workspace: &dyn Workspace,
        pm: &ProgressMonitor,
    ) -> Result<RefactoringStatus, RefactorError> {
        pm.check_cancelled()?;
        let mut status = self.descriptor.validate();
        let Some(destination) = self.descriptor.destination() else {
            return Ok(status);
        };
        if !workspace.exists(&destination.path) {
            status.add_fatal_error(format!("'{}' does not exist", destination.path));
            return Ok(status);
        }
        for resource in self.descriptor.resources() {
            if !workspace.exists(&resource.path) {
                status.add_fatal_error(format!("'{}' does not exist", resource.path));
                continue;
            }
            if destination.path.starts_with(&resource.path) {
                status.add_fatal_error(format!(
                    "cannot move '{}' into itself",
                    resource.path
                ));
            }
            let target = destination.path.join(resource.name());
            if target == resource.path {
                status.add_info(format!("'{}' is already at the destination", resource.path));
            } else if workspace.exists(&target) {
                status.add_fatal_error(format!("'{target}' already exists"));
            }
        }
        Ok(status)
    }

    fn create_change(
        &self,
        workspace: &dyn Workspace,
        pm: &ProgressMonitor,
    ) -> Result<Option<Change>, RefactorError> {
        pm.check_cancelled()?;
        let Some(destination) = self.descriptor.destination() else {
            return Err(RefactorError::InvalidDescriptor(
                "move descriptor has no destination".to_string(),
            ));
        };
        let mut composite = CompositeChange::new(&self.name);
        for resource in self.descriptor.resources() {
            let target = destination.path.join(resource.name());
            if target == resource.path {
                continue;
            }
            let is_unit = resource.kind == ResourceKind::File
                && resource.name().ends_with(".java");
            if is_unit && self.descriptor.update_references() {
                let unit = unit_of(workspace, &resource.path)?;
                let mut rewrite = CompilationUnitRewrite::new(unit);
                rewrite.create_group_description("Update package declaration");
                let new_package = Self::package_of(&destination.path);
                let package = rewrite.root()?.package().cloned();
                match (package, new_package) {
                    (Some(old), Some(new)) => {
                        rewrite
                            .ast_rewrite()?
                            .replace(old.range, format!("package {new};"));
                    }
                    (Some(old), None) => {
                        let end = line_end(rewrite.unit().source.as_str(), old.range.start);
                        rewrite
                            .ast_rewrite()?
                            .delete(TextRange::new(old.range.start, end));
                    }
                    (None, Some(new)) => {
                        rewrite
                            .ast_rewrite()?
                            .insert(0, format!("package {new};\n\n"));
                    }
                    (None, None) => {}
                }
                if let Some(change) = rewrite.create_change(&child_monitor(pm))? {
                    composite.add(Change::Unit(change));
                }
            }
            composite.add(Change::MoveResource {
                resource: resource.clone(),
                destination: destination.clone(),
            });
        }
        pm.done();
        if composite.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Change::Composite(composite)))
        }
    }
}

/// Move static members between two compilation units, optionally keeping
/// the originals as deprecated delegates.
pub struct MoveStaticMembersRefactoring {
    descriptor: MoveStaticMembersDescriptor,
    name: String,
}

impl MoveStaticMembersRefactoring {
    pub fn new(descriptor: MoveStaticMembersDescriptor) -> Self {
        let name = format!("Move {} static member(s)", descriptor.members().len());
        Self { descriptor, name }
    }

    fn endpoints(&self) -> Result<(&ResourceHandle, &ResourceHandle), RefactorError> {
        match (self.descriptor.declaring(), self.descriptor.destination()) {
            (Some(declaring), Some(destination)) => Ok((declaring, destination)),
            _ => Err(RefactorError::InvalidDescriptor(
                "move static members descriptor is incomplete".to_string(),
            )),
        }
    }
}

impl Refactoring for MoveStaticMembersRefactoring {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_conditions(
        &self,
        workspace: &dyn Workspace,
        pm: &ProgressMonitor,
    ) -> Result<RefactoringStatus, RefactorError> {
        pm.check_cancelled()?;
        let mut status = self.descriptor.validate();
        let (Some(declaring), Some(destination)) =
            (self.descriptor.declaring(), self.descriptor.destination())
        else {
            return Ok(status);
        };
        if declaring.path == destination.path {
            status.add_fatal_error("source and destination are the same compilation unit");
            return Ok(status);
        }
        let Some(source) = workspace.file_text(&declaring.path) else {
            status.add_fatal_error(format!("'{}' does not exist", declaring.path));
            return Ok(status);
        };
        if !workspace.exists(&destination.path) {
            status.add_fatal_error(format!("'{}' does not exist", destination.path));
        }
        for member in self.descriptor.members() {
            if find_static_member(source, member).is_none() {
                status.add_fatal_error(format!(
                    "no static member '{}' in '{}'",
                    member, declaring.path
                ));
            }
        }
        Ok(status)
    }

    fn create_change(
        &self,
        workspace: &dyn Workspace,
        pm: &ProgressMonitor,
    ) -> Result<Option<Change>, RefactorError> {
        pm.check_cancelled()?;
        let (declaring, destination) = self.endpoints()?;
        let src_unit = unit_of(workspace, &declaring.path)?;
        let dst_unit = unit_of(workspace, &destination.path)?;

        let mut src_rewrite = CompilationUnitRewrite::new(src_unit.clone());
        let src_imports: Vec<ImportDecl> = src_rewrite.root()?.imports().to_vec();

        let mut moved = Vec::new();
        for member in self.descriptor.members() {
            let range = find_static_member(&src_unit.source, member).ok_or_else(|| {
                RefactorError::MemberNotFound {
                    unit: declaring.path.to_string(),
                    member: member.clone(),
                }
            })?;
            moved.push((member.clone(), range));
        }

        if self.descriptor.delegate() {
            if self.descriptor.deprecate_delegate() {
                for (member, range) in &moved {
                    let text = &src_unit.source[range.start..range.end];
                    if text.contains("@Deprecated") {
                        continue;
                    }
                    src_rewrite.create_group_description(&format!(
                        "Deprecate delegate '{member}'"
                    ));
                    let indent = leading_indent(&src_unit.source, range.start).to_string();
                    src_rewrite
                        .ast_rewrite()?
                        .insert(range.start, format!("{indent}@Deprecated\n"));
                }
            }
        } else {
            for (member, range) in &moved {
                src_rewrite.create_group_description(&format!("Move member '{member}'"));
                src_rewrite.ast_rewrite()?.delete(*range);
            }
            // Imports referenced only by the removed members become
            // removal candidates; any reference from the remaining text
            // retains them.
            let mut remaining = String::with_capacity(src_unit.source.len());
            let mut cursor = 0;
            let mut ranges: Vec<TextRange> = moved.iter().map(|(_, r)| *r).collect();
            ranges.sort_by_key(|r| r.start);
            let body_start = src_rewrite.root()?.import_region().end;
            for range in &ranges {
                remaining.push_str(&src_unit.source[cursor.max(body_start)..range.start]);
                cursor = range.end;
            }
            remaining.push_str(&src_unit.source[cursor.max(body_start)..]);

            let moved_text: String = ranges
                .iter()
                .map(|r| &src_unit.source[r.start..r.end])
                .collect();
            for import in &src_imports {
                let simple = import.qualified.rsplit('.').next().unwrap_or("");
                if import.on_demand || !references_name(&moved_text, simple) {
                    continue;
                }
                let remover = src_rewrite.import_remover()?;
                if references_name(&remaining, simple) {
                    if import.is_static {
                        remover.register_retained_static_reference(&import.qualified);
                    } else {
                        remover.register_retained_reference(&import.qualified);
                    }
                } else if import.is_static {
                    remover.register_removed_static_reference(&import.qualified);
                } else {
                    remover.register_removed_reference(&import.qualified);
                }
            }
        }

        let mut dst_rewrite = CompilationUnitRewrite::new(dst_unit.clone());
        let insert_at = dst_unit.source.rfind('}').ok_or_else(|| {
            RefactorError::StaleBuffer(destination.path.to_string())
        })?;
        for (member, range) in &moved {
            dst_rewrite.create_group_description(&format!("Add member '{member}'"));
            let text = src_unit.source[range.start..range.end].to_string();
            dst_rewrite.ast_rewrite()?.insert(insert_at, format!("\n{text}"));
            for import in &src_imports {
                let simple = import.qualified.rsplit('.').next().unwrap_or("");
                if import.on_demand || !references_name(&text, simple) {
                    continue;
                }
                let imports = dst_rewrite.import_rewrite()?;
                if import.is_static {
                    imports.add_static_import(&import.qualified);
                } else {
                    imports.add_import(&import.qualified);
                }
            }
        }

        let mut composite = CompositeChange::new(&self.name);
        if let Some(change) = src_rewrite.create_change(&child_monitor(pm))? {
            composite.add(Change::Unit(change));
        }
        if let Some(change) = dst_rewrite.create_change(&child_monitor(pm))? {
            composite.add(Change::Unit(change));
        }
        pm.done();
        if composite.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Change::Composite(composite)))
        }
    }
}

/// Convert an anonymous class allocation into a named nested class.
pub struct ConvertAnonymousRefactoring {
    descriptor: ConvertAnonymousDescriptor,
    name: String,
}

struct Allocation {
    range: TextRange,
    type_name: String,
    arguments: String,
    body: TextRange,
}

impl ConvertAnonymousRefactoring {
    pub fn new(descriptor: ConvertAnonymousDescriptor) -> Self {
        let name = match descriptor.class_name() {
            Some(class_name) => format!("Convert anonymous class to '{class_name}'"),
            None => "Convert anonymous class".to_string(),
        };
        Self { descriptor, name }
    }

    fn find_allocation(source: &str, selection: TextRange) -> Option<Allocation> {
        // Allocations with nested parentheses in the argument list are not
        // matched.
        let re = Regex::new(r"new\s+([A-Za-z_$][\w$.]*(?:<[^<>]*>)?)\s*\(([^()]*)\)\s*\{")
            .ok()?;
        for caps in re.captures_iter(source) {
            let whole = caps.get(0)?;
            let open = whole.end() - 1;
            let end = matching_brace_end(source, open)?;
            let range = TextRange::new(whole.start(), end);
            let overlaps = selection.start < range.end && whole.start() < selection.end
                || selection.is_empty()
                    && selection.start >= range.start
                    && selection.start <= range.end;
            if overlaps {
                return Some(Allocation {
                    range,
                    type_name: caps.get(1)?.as_str().to_string(),
                    arguments: caps.get(2)?.as_str().trim().to_string(),
                    body: TextRange::new(open, end),
                });
            }
        }
        None
    }
}

impl Refactoring for ConvertAnonymousRefactoring {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_conditions(
        &self,
        workspace: &dyn Workspace,
        pm: &ProgressMonitor,
    ) -> Result<RefactoringStatus, RefactorError> {
        pm.check_cancelled()?;
        let mut status = self.descriptor.validate();
        let (Some(unit), Some(selection)) =
            (self.descriptor.unit(), self.descriptor.selection())
        else {
            return Ok(status);
        };
        let Some(source) = workspace.file_text(&unit.path) else {
            status.add_fatal_error(format!("'{}' does not exist", unit.path));
            return Ok(status);
        };
        if selection.end > source.len() {
            status.add_fatal_error("selection is outside the compilation unit");
            return Ok(status);
        }
        if Self::find_allocation(source, selection).is_none() {
            status.add_fatal_error(
                "the selection does not cover an anonymous class allocation",
            );
        }
        Ok(status)
    }

    fn create_change(
        &self,
        workspace: &dyn Workspace,
        pm: &ProgressMonitor,
    ) -> Result<Option<Change>, RefactorError> {
        pm.check_cancelled()?;
        let (Some(unit_handle), Some(selection), Some(class_name)) = (
            self.descriptor.unit(),
            self.descriptor.selection(),
            self.descriptor.class_name(),
        ) else {
            return Err(RefactorError::InvalidDescriptor(
                "convert anonymous descriptor is incomplete".to_string(),
            ));
        };
        let unit = unit_of(workspace, &unit_handle.path)?;
        let allocation = Self::find_allocation(&unit.source, selection).ok_or_else(|| {
            RefactorError::NoAnonymousClass {
                unit: unit_handle.path.to_string(),
            }
        })?;
        let insert_at = unit.source.rfind('}').ok_or_else(|| {
            RefactorError::StaleBuffer(unit_handle.path.to_string())
        })?;

        let mut rewrite = CompilationUnitRewrite::new(unit.clone());
        rewrite.create_group_description("Replace anonymous class allocation");
        rewrite.create_group_description("Add nested class declaration");

        rewrite.ast_rewrite()?.replace(
            allocation.range,
            format!("new {}({})", class_name, allocation.arguments),
        );

        let mut modifiers = String::from("private ");
        if self.descriptor.declare_static() {
            modifiers.push_str("static ");
        }
        if self.descriptor.declare_final() {
            modifiers.push_str("final ");
        }
        // Interfaces have no constructors, so an empty argument list is the
        // best binding-free signal for `implements`.
        let relation = if allocation.arguments.is_empty() {
            "implements"
        } else {
            "extends"
        };
        let body = &unit.source[allocation.body.start..allocation.body.end];
        rewrite.ast_rewrite()?.insert(
            insert_at,
            format!(
                "\n    {modifiers}class {class_name} {relation} {} {body}\n",
                allocation.type_name
            ),
        );

        let result = rewrite.create_change(&child_monitor(pm))?;
        pm.done();
        Ok(result.map(Change::Unit))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn word_search_respects_identifier_boundaries() {
        assert_eq!(find_word("restatic static", "static"), Some(9));
        assert_eq!(find_word("staticX", "static"), None);
        assert_eq!(find_word("a.Alpha;", "Alpha"), Some(2));
    }

    #[test]
    fn static_field_span_ends_at_the_semicolon() {
        let src = "class A {\n    static final int MAX = 10;\n    int other;\n}\n";
        let range = find_static_member(src, "MAX").unwrap();
        assert_eq!(
            &src[range.start..range.end],
            "    static final int MAX = 10;\n"
        );
    }

    #[test]
    fn static_method_span_includes_the_body() {
        let src = "class A {\n    static int clamp(int v) {\n        return v;\n    }\n\n    void other() {}\n}\n";
        let range = find_static_member(src, "clamp").unwrap();
        assert!(src[range.start..range.end].ends_with("    }\n"));
        assert!(!src[range.start..range.end].contains("other"));
    }

    #[test]
    fn annotation_lines_join_the_member_span() {
        let src = "class A {\n    @Deprecated\n    static int MAX = 10;\n}\n";
        let range = find_static_member(src, "MAX").unwrap();
        assert!(src[range.start..range.end].starts_with("    @Deprecated\n"));
    }

    #[test]
    fn allocation_matching_requires_overlap_with_the_selection() {
        let src = "class A {\n    Runnable r = new Runnable() {\n        public void run() {}\n    };\n}\n";
        let at = src.find("new Runnable").unwrap();
        let hit =
            ConvertAnonymousRefactoring::find_allocation(src, TextRange::new(at, at + 3));
        assert!(hit.is_some());
        let allocation = hit.unwrap();
        assert_eq!(allocation.type_name, "Runnable");
        assert_eq!(allocation.arguments, "");

        let miss = ConvertAnonymousRefactoring::find_allocation(src, TextRange::new(0, 4));
        assert!(miss.is_none());
    }

    #[test]
    fn destination_packages_strip_the_source_folder() {
        let container = ResourcePath::parse("/P/src/a/b").unwrap();
        assert_eq!(
            MoveRefactoring::package_of(&container),
            Some("a.b".to_string())
        );
        let root = ResourcePath::parse("/P/src").unwrap();
        assert_eq!(MoveRefactoring::package_of(&root), None);
    }
}
