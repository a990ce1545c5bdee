//! Table collections and tree sequences for
//! backward-time coalescent simulation.
//!
//! Some notes on the data model:
//!
//! 1. Time is measured in generations *before the present*.
//!    Sample nodes have time 0 and parents have time values
//!    *greater than* those of their children.
//! 2. Genomic locations are integers (see [``Position``]).
//! 3. The data layout is "array of structures".

mod macros;

pub mod newtypes;
pub mod prelude;
#[cfg(feature = "rand")]
mod rand_position;
mod tables;
mod trees;

pub use newtypes::{EdgeId, MutationId, NodeId, PopulationId, Position, SiteId, Time};
pub use tables::*;
pub use trees::*;

/// Get the ancestrat-core version number.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
