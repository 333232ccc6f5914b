use std::fmt;

/// Severity of a status entry; ordered so that merging can pick the most
/// severe outcome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    #[default]
    Ok,
    Info,
    Warning,
    Error,
    Fatal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusEntry {
    pub severity: Severity,
    pub message: String,
}

/// Accumulator for domain-level validation outcomes.
///
/// A status collects problems instead of failing fast: callers merge the
/// statuses of independent checks and inspect the combined severity once.
/// Infrastructure failures are *not* status entries; they travel as errors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefactoringStatus {
    entries: Vec<StatusEntry>,
}

impl RefactoringStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fatal(message: impl Into<String>) -> Self {
        let mut status = Self::new();
        status.add_fatal_error(message);
        status
    }

    pub fn from_error(message: impl Into<String>) -> Self {
        let mut status = Self::new();
        status.add_error(message);
        status
    }

    pub fn from_warning(message: impl Into<String>) -> Self {
        let mut status = Self::new();
        status.add_warning(message);
        status
    }

    pub fn from_info(message: impl Into<String>) -> Self {
        let mut status = Self::new();
        status.add_info(message);
        status
    }

    pub fn add_fatal_error(&mut self, message: impl Into<String>) {
        self.add_entry(Severity::Fatal, message);
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.add_entry(Severity::Error, message);
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.add_entry(Severity::Warning, message);
    }

    pub fn add_info(&mut self, message: impl Into<String>) {
        self.add_entry(Severity::Info, message);
    }

    fn add_entry(&mut self, severity: Severity, message: impl Into<String>) {
        self.entries.push(StatusEntry {
            severity,
            message: message.into(),
        });
    }

    /// Absorb `other`'s entries. Merging is value-based and commutative up
    /// to entry order; the combined severity is the most severe of the two.
    pub fn merge(&mut self, other: RefactoringStatus) {
        self.entries.extend(other.entries);
    }

    /// Pure combination of two statuses.
    pub fn combined(mut self, other: RefactoringStatus) -> RefactoringStatus {
        self.merge(other);
        self
    }

    pub fn severity(&self) -> Severity {
        self.entries
            .iter()
            .map(|e| e.severity)
            .max()
            .unwrap_or(Severity::Ok)
    }

    pub fn is_ok(&self) -> bool {
        self.severity() == Severity::Ok
    }

    pub fn has_fatal_error(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    /// Entries at exactly the given severity.
    pub fn entries_at(&self, severity: Severity) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter().filter(move |e| e.severity == severity)
    }
}

impl fmt::Display for RefactoringStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "<OK>");
        }
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{:?}: {}", entry.severity, entry.message)?;
        }
        Ok(())
    }
}
