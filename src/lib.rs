#![warn(missing_docs)]

//! Coalescent simulation of branching demographies with
//! EIGENSTRAT export.
//!
//! # Overview
//!
//! The pipeline is strictly linear: declare a demography (splits
//! plus admixture), export its topology as a drawable tree, run
//! the full coalescent ancestry simulation with recombination,
//! overlay neutral mutations, and serialize the resulting
//! genotypes into the three-file EIGENSTRAT format consumed by
//! population-structure tools.
//!
//! # Where to start
//!
//! [`pipeline::PipelineConfig`] and [`pipeline::run_pipeline`],
//! or the `topology_to_eigenstrat` binary for the ready-made
//! 15-population scenario.

pub use ancestrat_core::newtypes::*;
pub use ancestrat_core::{
    Edge, MutationRecord, Node, NodeFlags, Site, TableCollection, TablesError, Tree, TreeSequence,
    TreesError,
};
pub use ancestrat_sim::*;

pub mod eigenstrat;
mod error;
pub mod pipeline;
pub mod schematic;
pub mod variants;

pub use error::Error;

/// Get the ancestrat version number.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
