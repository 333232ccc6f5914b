//! Compilation-unit parsing and rewrite recorders.
//!
//! This crate is the AST collaborator consumed by `recast-refactor`. The
//! parse is deliberately shallow: it resolves the unit header (package and
//! import declarations with exact text ranges) and treats the type body as
//! opaque text. That is enough structure to drive the rewrite coordinator —
//! recording AST-level mutations as ranged operations, and recomputing the
//! import section — without carrying a full Java grammar.

mod imports;
mod parse;
mod rewrite;

pub use imports::{ImportRemover, ImportRewrite};
pub use parse::{parse_unit, ImportDecl, PackageDecl, ParseError, SyntaxTree};
pub use rewrite::{AstRewrite, RewriteError};
