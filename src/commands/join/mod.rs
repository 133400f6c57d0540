//! Entity join/unification and the popular-comparisons index.
//!
//! Each entity type has one canonical source for identity (slug, name);
//! every other source only enriches it by key lookup. A failed lookup is
//! recorded as `None`, never as an error.

mod comparisons;
mod entities;
mod lookups;
mod run;
mod write;

pub use run::run;
