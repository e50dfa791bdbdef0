//! The zone based rewrite engine
//!
//! A rewrite replaces one or more regions ("zones") of a file, each of which may grow or shrink,
//! without rewriting the rest of the file. Fields elsewhere in the file that depend on those
//! zones ("dependent references", such as container sizes) are corrected afterwards.
//!
//! See [`begin_rewrite`] for the low level session API, and [`FormatAdapter`] for formats that
//! register their own zones.

mod adapter;
mod generator;
mod patcher;
mod reference;
mod resolver;
mod session;
mod zone;

pub use adapter::{FormatAdapter, write_path_with, write_with};
pub use generator::ZoneGenerators;
pub use patcher::ZoneDelta;
pub use reference::{
	DependentReference, Endianness, FieldWidth, IndexBase, ReferenceKind, ReferenceSet,
};
pub use session::{CommitSummary, Session, begin_rewrite, commit_to_path, write_to_path};
pub use zone::{Zone, ZoneFlag, ZoneRegistry};
