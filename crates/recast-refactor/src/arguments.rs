use std::collections::BTreeMap;

use recast_core::TextRange;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resource::{ResourceHandle, ResourcePath, Workspace};

/// Flat string-keyed attribute mapping: the sole wire representation of a
/// refactoring's arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArgumentMap(BTreeMap<String, String>);

impl ArgumentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for ArgumentMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Decode-time failure for a descriptor argument. Always names the offending
/// key; a required key is never silently defaulted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("required argument `{key}` is missing")]
    Missing { key: String },
    #[error("argument `{key}` must not be empty")]
    Empty { key: String },
    #[error("argument `{key}` has malformed value `{value}`: expected {expected}")]
    Malformed {
        key: String,
        value: String,
        expected: &'static str,
    },
    #[error("argument `{key}` does not resolve to an existing resource: {path}")]
    NoSuchResource { key: String, path: String },
}

pub fn set_string(map: &mut ArgumentMap, key: &str, value: &str) {
    map.insert(key, value);
}

/// Absent key decodes to `None`; an explicitly empty value stays `Some("")`.
pub fn get_string<'a>(map: &'a ArgumentMap, key: &str) -> Option<&'a str> {
    map.get(key)
}

pub fn get_required_string<'a>(map: &'a ArgumentMap, key: &str) -> Result<&'a str, ArgumentError> {
    match map.get(key) {
        None => Err(ArgumentError::Missing {
            key: key.to_string(),
        }),
        Some("") => Err(ArgumentError::Empty {
            key: key.to_string(),
        }),
        Some(value) => Ok(value),
    }
}

pub fn set_bool(map: &mut ArgumentMap, key: &str, value: bool) {
    map.insert(key, if value { "true" } else { "false" });
}

/// Absent key decodes to `false`; a present key must be a boolean literal.
pub fn get_bool(map: &ArgumentMap, key: &str) -> Result<bool, ArgumentError> {
    match map.get(key) {
        None => Ok(false),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(ArgumentError::Malformed {
            key: key.to_string(),
            value: other.to_string(),
            expected: "`true` or `false`",
        }),
    }
}

/// Selections are encoded as `"<offset> <length>"`.
pub fn set_selection(map: &mut ArgumentMap, key: &str, selection: TextRange) {
    map.insert(key, format!("{} {}", selection.start, selection.len()));
}

pub fn get_selection(map: &ArgumentMap, key: &str) -> Result<TextRange, ArgumentError> {
    let raw = get_required_string(map, key)?;
    let malformed = || ArgumentError::Malformed {
        key: key.to_string(),
        value: raw.to_string(),
        expected: "`<offset> <length>`",
    };
    let (offset, length) = raw.split_once(' ').ok_or_else(malformed)?;
    let offset: usize = offset.parse().map_err(|_| malformed())?;
    let length: usize = length.parse().map_err(|_| malformed())?;
    let end = offset.checked_add(length).ok_or_else(malformed)?;
    Ok(TextRange::new(offset, end))
}

/// Encode a resource as a project-relative path when it lives in the
/// descriptor's project scope, else as a workspace-absolute path.
pub fn set_resource(
    map: &mut ArgumentMap,
    key: &str,
    project: Option<&str>,
    resource: &ResourceHandle,
) {
    let encoded = project
        .and_then(|p| resource.path.relative_to_project(p))
        .unwrap_or_else(|| resource.path.as_str());
    map.insert(key, encoded);
}

/// Decode a resource path back into a handle within the given scope.
///
/// Fails when the key is absent, the path is malformed, or the path does not
/// name an existing resource in the workspace.
pub fn get_resource(
    map: &ArgumentMap,
    key: &str,
    project: Option<&str>,
    workspace: &dyn Workspace,
) -> Result<ResourceHandle, ArgumentError> {
    let raw = get_required_string(map, key)?;
    let path = if raw.starts_with('/') {
        ResourcePath::parse(raw)
    } else {
        let project = project.ok_or_else(|| ArgumentError::Malformed {
            key: key.to_string(),
            value: raw.to_string(),
            expected: "a workspace-absolute path (no project scope is set)",
        })?;
        ResourcePath::resolve_in_project(project, raw)
    }
    .map_err(|_| ArgumentError::Malformed {
        key: key.to_string(),
        value: raw.to_string(),
        expected: "a resource path",
    })?;

    workspace
        .handle(&path)
        .ok_or_else(|| ArgumentError::NoSuchResource {
            key: key.to_string(),
            path: path.to_string(),
        })
}
