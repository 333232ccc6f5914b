use recast_core::{Cancelled, Edit, EditError, MultiEdit, TextEdit, TextRange};
use thiserror::Error;

use crate::parse::SyntaxTree;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewriteError {
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Recorder for AST-level mutations against one parsed tree.
///
/// Operations are recorded as ranged text mutations and only validated and
/// consolidated when [`AstRewrite::rewrite_ast`] materializes them. The
/// recorder holds no reference to the tree it was created for; the caller
/// owns both and passes the tree back in at materialization time.
#[derive(Debug, Default)]
pub struct AstRewrite {
    ops: Vec<TextEdit>,
}

impl AstRewrite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, range: TextRange, text: impl Into<String>) {
        self.ops.push(TextEdit::replace(range, text));
    }

    pub fn insert(&mut self, offset: usize, text: impl Into<String>) {
        self.ops.push(TextEdit::insert(offset, text));
    }

    pub fn delete(&mut self, range: TextRange) {
        self.ops.push(TextEdit::delete(range));
    }

    pub fn has_recorded_changes(&self) -> bool {
        !self.ops.is_empty()
    }

    /// Consolidate the recorded operations into a composite edit.
    ///
    /// No-op replacements (replacement text equal to the existing text) are
    /// dropped, exact duplicates are deduplicated, and insertions at the
    /// same offset are merged in recorded order. The result can legitimately
    /// be an empty composite. Overlapping operations are an error.
    pub fn rewrite_ast(&self, tree: &SyntaxTree) -> Result<Edit, RewriteError> {
        let source = tree.source();

        let mut edits: Vec<(usize, TextEdit)> = Vec::with_capacity(self.ops.len());
        for (recorded_at, op) in self.ops.iter().enumerate() {
            if op.range.end > source.len() {
                return Err(EditError::OutOfBounds {
                    range: op.range,
                    len: source.len(),
                }
                .into());
            }
            for offset in [op.range.start, op.range.end] {
                if !source.is_char_boundary(offset) {
                    return Err(EditError::InvalidUtf8Boundary { offset }.into());
                }
            }
            // Deduplicate against no-op results.
            if op.is_noop() || source[op.range.start..op.range.end] == op.new_text {
                continue;
            }
            edits.push((recorded_at, op.clone()));
        }

        // Stable document order; recorded order breaks ties so that inserts
        // at the same offset merge deterministically.
        edits.sort_by(|(a_at, a), (b_at, b)| {
            a.range
                .start
                .cmp(&b.range.start)
                .then_with(|| a.range.end.cmp(&b.range.end))
                .then_with(|| a_at.cmp(b_at))
        });
        edits.dedup_by(|(_, a), (_, b)| a.range == b.range && a.new_text == b.new_text);

        let mut merged: Vec<TextEdit> = Vec::with_capacity(edits.len());
        for (_, edit) in edits {
            if let Some(last) = merged.last_mut() {
                if last.range == edit.range && last.range.is_empty() {
                    last.new_text.push_str(&edit.new_text);
                    continue;
                }
                if edit.range.start < last.range.end
                    || (last.range == edit.range && last.new_text != edit.new_text)
                {
                    return Err(EditError::OverlappingEdits {
                        first: last.range,
                        second: edit.range,
                    }
                    .into());
                }
            }
            merged.push(edit);
        }

        Ok(Edit::Multi(MultiEdit::new(
            merged.into_iter().map(Edit::Replace).collect(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use recast_core::apply_edit;

    use super::*;
    use crate::parse::parse_unit;

    fn tree(source: &str) -> SyntaxTree {
        parse_unit(source, false).unwrap()
    }

    #[test]
    fn consolidates_in_document_order() {
        let src = "class Foo { int a; int b; }";
        let mut rewrite = AstRewrite::new();
        rewrite.replace(TextRange::new(19, 24), "long b"); // recorded out of order
        rewrite.replace(TextRange::new(12, 17), "long a");

        let edit = rewrite.rewrite_ast(&tree(src)).unwrap();
        let leaves = edit.leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].range, TextRange::new(12, 17));

        let applied = apply_edit(src, &edit).unwrap();
        assert_eq!(applied.text, "class Foo { long a; long b; }");
    }

    #[test]
    fn noop_replacements_are_dropped() {
        let src = "class Foo {}";
        let mut rewrite = AstRewrite::new();
        rewrite.replace(TextRange::new(6, 9), "Foo");
        assert!(rewrite.has_recorded_changes());

        let edit = rewrite.rewrite_ast(&tree(src)).unwrap();
        assert!(edit.is_empty());
    }

    #[test]
    fn duplicate_operations_are_deduplicated() {
        let src = "class Foo {}";
        let mut rewrite = AstRewrite::new();
        rewrite.replace(TextRange::new(6, 9), "Bar");
        rewrite.replace(TextRange::new(6, 9), "Bar");

        let edit = rewrite.rewrite_ast(&tree(src)).unwrap();
        assert_eq!(edit.leaves().len(), 1);
    }

    #[test]
    fn same_offset_inserts_merge_in_recorded_order() {
        let src = "class Foo {}";
        let mut rewrite = AstRewrite::new();
        rewrite.insert(11, "int a; ");
        rewrite.insert(11, "int b; ");

        let edit = rewrite.rewrite_ast(&tree(src)).unwrap();
        let applied = apply_edit(src, &edit).unwrap();
        assert_eq!(applied.text, "class Foo {int a; int b; }");
    }

    #[test]
    fn conflicting_replacements_error() {
        let src = "class Foo {}";
        let mut rewrite = AstRewrite::new();
        rewrite.replace(TextRange::new(6, 9), "Bar");
        rewrite.replace(TextRange::new(6, 9), "Baz");

        let err = rewrite.rewrite_ast(&tree(src)).unwrap_err();
        assert!(matches!(
            err,
            RewriteError::Edit(EditError::OverlappingEdits { .. })
        ));
    }

    #[test]
    fn out_of_bounds_operation_errors() {
        let src = "class Foo {}";
        let mut rewrite = AstRewrite::new();
        rewrite.delete(TextRange::new(0, 100));
        let err = rewrite.rewrite_ast(&tree(src)).unwrap_err();
        assert!(matches!(err, RewriteError::Edit(EditError::OutOfBounds { .. })));
    }
}
