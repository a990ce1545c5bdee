//! Demographic models and backward-time coalescent simulation.
//!
//! A [`Demography`] declares populations plus the time-ordered
//! split and admixture events relating them, looking backwards
//! from the present.  [`simulate_ancestry`] traces the ancestry
//! of sampled genomes under that model with recombination, and
//! [`overlay_mutations`] superimposes neutral nucleotide
//! mutations onto the result.
//!
//! Both simulation entry points are deterministic functions of
//! their seeds: identical inputs produce identical tables.

mod ancestry;
mod demography;
mod mutations;
mod samples;

pub use ancestry::simulate_ancestry;
pub use ancestry::AncestryResult;
pub use ancestry::SimulationError;
pub use ancestry::SimulationParams;
pub use demography::DemographicEvent;
pub use demography::Demography;
pub use demography::DemographyBuilder;
pub use demography::DemographyError;
pub use demography::Population;
pub use mutations::overlay_mutations;
pub use mutations::MutationParams;
pub use samples::individual_names;
pub use samples::population_label;
pub use samples::total_haploid_samples;
pub use samples::total_individuals;
pub use samples::SampleSet;

/// Get the ancestrat-sim version number.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
