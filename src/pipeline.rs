//! The single-pass pipeline tying demography, simulation, and
//! serialization together.

use std::path::PathBuf;

use ancestrat_core::TreeSequence;
use ancestrat_sim::{
    individual_names, overlay_mutations, simulate_ancestry, total_individuals, Demography,
    MutationParams, SampleSet, SimulationParams,
};

use crate::eigenstrat::{write_eigenstrat, EigenstratPaths};
use crate::error::Error;
use crate::schematic::export_schematic;
use crate::variants::extract_variants;

/// Immutable configuration of one pipeline run.
///
/// All knobs of the run live here so that the whole pipeline is a
/// pure function of this record plus its seeds.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// The frozen demographic model
    pub demography: Demography,
    /// Sample sets, in the order individuals are enumerated
    pub sample_sets: Vec<SampleSet>,
    /// Genome length in bases
    pub sequence_length: i64,
    /// Recombination rate per base per generation
    pub recombination_rate: f64,
    /// Mutation rate per base per generation
    pub mutation_rate: f64,
    /// Seed of the ancestry simulation
    pub ancestry_seed: u64,
    /// Seed of the mutation overlay, independent of the
    /// ancestry seed
    pub mutation_seed: u64,
    /// Seed of the schematic simulation
    pub schematic_seed: u64,
    /// Prefix of the three EIGENSTRAT files
    pub out_prefix: String,
    /// Path of the schematic SVG drawing
    pub schematic_svg: PathBuf,
    /// Path of the schematic newick text
    pub schematic_txt: PathBuf,
}

/// What one pipeline run produced.
#[derive(Clone, Debug)]
pub struct PipelineReport {
    /// The schematic tree in newick notation
    pub newick: String,
    /// Number of sites written
    pub num_sites: usize,
    /// Number of individuals written
    pub num_individuals: usize,
    /// The three EIGENSTRAT file names
    pub paths: EigenstratPaths,
}

/// Run the whole pipeline: schematic export, ancestry simulation,
/// mutation overlay, variant extraction, EIGENSTRAT serialization.
///
/// Strictly linear and single-pass; the frozen demography is read
/// by both simulation calls without mutation.  Identical
/// configurations produce byte-identical output files.
///
/// # Errors
///
/// The first failing step aborts the run; partially written
/// output files are not removed.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport, Error> {
    for set in &config.sample_sets {
        if set.ploidy() != 2 {
            return Err(Error::UnsupportedPloidy { found: set.ploidy() });
        }
    }

    let newick = export_schematic(
        &config.demography,
        &config.schematic_svg,
        &config.schematic_txt,
        config.schematic_seed,
    )?;

    log::info!(
        "simulating ancestry of {} haploid genomes over {} bases",
        ancestrat_sim::total_haploid_samples(&config.sample_sets),
        config.sequence_length
    );
    let result = simulate_ancestry(
        &config.demography,
        &config.sample_sets,
        &SimulationParams {
            sequence_length: config.sequence_length,
            recombination_rate: config.recombination_rate,
            seed: config.ancestry_seed,
        },
    )?;

    let mut tables = result.tables;
    let num_mutations = overlay_mutations(
        &mut tables,
        &MutationParams {
            rate: config.mutation_rate,
            seed: config.mutation_seed,
        },
    )?;
    log::info!("placed {} mutations", num_mutations);
    tables.build_indexes()?;

    let ts = TreeSequence::new(tables)?;
    let variants = extract_variants(&ts)?;

    let names = individual_names(&config.sample_sets);
    let num_sites = write_eigenstrat(&config.out_prefix, &variants, &names)?;

    Ok(PipelineReport {
        newick,
        num_sites,
        num_individuals: total_individuals(&config.sample_sets),
        paths: EigenstratPaths::new(&config.out_prefix),
    })
}
