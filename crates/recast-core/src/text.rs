use thiserror::Error;

/// A half-open text range `[start, end)` in UTF-8 byte offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "invalid range: {start}..{end}");
        Self { start, end }
    }

    pub fn empty(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn len(self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn contains(self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn intersects(self, other: TextRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A single replacement of a range with new text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEdit {
    pub range: TextRange,
    pub new_text: String,
}

impl TextEdit {
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self {
            range: TextRange::empty(offset),
            new_text: text.into(),
        }
    }

    pub fn replace(range: TextRange, text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: text.into(),
        }
    }

    pub fn delete(range: TextRange) -> Self {
        Self {
            range,
            new_text: String::new(),
        }
    }

    /// An edit that neither removes nor adds text.
    pub fn is_noop(&self) -> bool {
        self.range.is_empty() && self.new_text.is_empty()
    }
}

/// An edit tree over a single file's text.
///
/// Composite nodes preserve the provenance of their children (e.g. "the AST
/// rewrite edit" vs. "the import rewrite edit") without affecting how the
/// tree applies: application always operates on the flattened leaves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edit {
    Replace(TextEdit),
    Multi(MultiEdit),
}

impl Edit {
    pub fn multi() -> Self {
        Edit::Multi(MultiEdit::default())
    }

    /// An empty composite counts as empty; a leaf never does, even when it
    /// is a no-op replacement.
    pub fn is_empty(&self) -> bool {
        match self {
            Edit::Replace(_) => false,
            Edit::Multi(multi) => multi.children.is_empty(),
        }
    }

    /// Flattened leaf edits in tree order.
    pub fn leaves(&self) -> Vec<&TextEdit> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a TextEdit>) {
        match self {
            Edit::Replace(edit) => out.push(edit),
            Edit::Multi(multi) => {
                for child in &multi.children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}

impl From<TextEdit> for Edit {
    fn from(edit: TextEdit) -> Self {
        Edit::Replace(edit)
    }
}

/// An ordered list of child edits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultiEdit {
    pub children: Vec<Edit>,
}

impl MultiEdit {
    pub fn new(children: Vec<Edit>) -> Self {
        Self { children }
    }

    pub fn add_child(&mut self, child: impl Into<Edit>) {
        self.children.push(child.into());
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("edit range {range:?} is outside the text bounds (len={len})")]
    OutOfBounds { range: TextRange, len: usize },
    #[error("edit offset {offset} is not a UTF-8 character boundary")]
    InvalidUtf8Boundary { offset: usize },
    #[error("overlapping edits: {first:?} overlaps {second:?}")]
    OverlappingEdits { first: TextRange, second: TextRange },
}

/// The result of applying an edit tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applied {
    pub text: String,
    /// Inverse edit, expressed against the modified text. Applying it to
    /// `text` restores the original input.
    pub undo: Edit,
}

/// Apply an edit tree to `original`, returning the modified text and the
/// undo edit.
///
/// The flattened leaves must be non-overlapping and within bounds; same-range
/// leaves are rejected as overlapping unless both are pure insertions.
pub fn apply_edit(original: &str, edit: &Edit) -> Result<Applied, EditError> {
    let mut leaves = edit.leaves();
    leaves.sort_by_key(|e| (e.range.start, e.range.end));

    let mut prev: Option<TextRange> = None;
    for leaf in &leaves {
        let range = leaf.range;
        if range.end > original.len() {
            return Err(EditError::OutOfBounds {
                range,
                len: original.len(),
            });
        }
        for offset in [range.start, range.end] {
            if !original.is_char_boundary(offset) {
                return Err(EditError::InvalidUtf8Boundary { offset });
            }
        }
        if let Some(prev_range) = prev {
            let colliding = if prev_range.is_empty() && range.is_empty() {
                // Two inserts at the same offset are ambiguous.
                prev_range.start == range.start
            } else {
                range.start < prev_range.end || prev_range.intersects(range)
            };
            if colliding {
                return Err(EditError::OverlappingEdits {
                    first: prev_range,
                    second: range,
                });
            }
        }
        prev = Some(range);
    }

    let mut text = String::with_capacity(original.len());
    let mut undo_children = Vec::with_capacity(leaves.len());
    let mut cursor = 0usize;
    for leaf in &leaves {
        text.push_str(&original[cursor..leaf.range.start]);
        let new_start = text.len();
        text.push_str(&leaf.new_text);
        undo_children.push(Edit::Replace(TextEdit::replace(
            TextRange::new(new_start, text.len()),
            &original[leaf.range.start..leaf.range.end],
        )));
        cursor = leaf.range.end;
    }
    text.push_str(&original[cursor..]);

    Ok(Applied {
        text,
        undo: Edit::Multi(MultiEdit::new(undo_children)),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn apply_replaces_back_to_front() {
        let mut root = MultiEdit::default();
        root.add_child(TextEdit::replace(TextRange::new(0, 3), "let"));
        root.add_child(TextEdit::insert(7, "!"));
        let applied = apply_edit("int xableau", &Edit::Multi(root)).unwrap();
        assert_eq!(applied.text, "let xab!leau");
    }

    #[test]
    fn undo_restores_original() {
        let original = "class Foo { int f; }";
        let mut root = MultiEdit::default();
        root.add_child(TextEdit::replace(TextRange::new(6, 9), "Bar"));
        root.add_child(TextEdit::delete(TextRange::new(12, 18)));
        let applied = apply_edit(original, &Edit::Multi(root)).unwrap();
        assert_eq!(applied.text, "class Bar {  }");

        let undone = apply_edit(&applied.text, &applied.undo).unwrap();
        assert_eq!(undone.text, original);
    }

    #[test]
    fn empty_composite_is_empty_and_applies_as_noop() {
        let edit = Edit::multi();
        assert!(edit.is_empty());
        let applied = apply_edit("abc", &edit).unwrap();
        assert_eq!(applied.text, "abc");
    }

    #[test]
    fn overlapping_edits_are_rejected() {
        let mut root = MultiEdit::default();
        root.add_child(TextEdit::replace(TextRange::new(0, 2), "x"));
        root.add_child(TextEdit::replace(TextRange::new(1, 3), "y"));
        let err = apply_edit("abcd", &Edit::Multi(root)).unwrap_err();
        assert_eq!(
            err,
            EditError::OverlappingEdits {
                first: TextRange::new(0, 2),
                second: TextRange::new(1, 3),
            }
        );
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let edit = Edit::Replace(TextEdit::delete(TextRange::new(0, 10)));
        let err = apply_edit("abc", &edit).unwrap_err();
        assert_eq!(
            err,
            EditError::OutOfBounds {
                range: TextRange::new(0, 10),
                len: 3
            }
        );
    }

    #[test]
    fn non_boundary_offset_is_rejected() {
        // `é` is two bytes; offset 2 falls inside it.
        let edit = Edit::Replace(TextEdit::delete(TextRange::new(2, 3)));
        let err = apply_edit("aé", &edit).unwrap_err();
        assert_eq!(err, EditError::InvalidUtf8Boundary { offset: 2 });
    }
}
