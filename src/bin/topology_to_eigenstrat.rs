use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use ancestrat::pipeline::{run_pipeline, PipelineConfig};
use ancestrat::{Demography, DemographyBuilder, SampleSet};

/// Simulate a 15-population branching demography with one
/// admixture event and export the genotypes as EIGENSTRAT tables.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Diploid individuals sampled per leaf population
    #[arg(long, default_value_t = 10)]
    inds_per_pop: u32,

    /// Genome length in bases
    #[arg(long, default_value_t = 10_000_000)]
    sequence_length: i64,

    /// Recombination rate per base per generation
    #[arg(long, default_value_t = 1e-8)]
    recombination_rate: f64,

    /// Mutation rate per base per generation
    #[arg(long, default_value_t = 1.5e-8)]
    mutation_rate: f64,

    /// Random seed of the ancestry simulation
    #[arg(long, default_value_t = 42)]
    seed_ancestry: u64,

    /// Random seed of the mutation overlay
    #[arg(long, default_value_t = 43)]
    seed_mutations: u64,

    /// Random seed of the schematic tree
    #[arg(long, default_value_t = 1)]
    seed_schematic: u64,

    /// Prefix of the EIGENSTRAT output files
    #[arg(long, default_value = "Demografia15pop")]
    out_prefix: String,

    /// Path of the schematic SVG drawing
    #[arg(long, default_value = "topology_schematic.svg")]
    schematic_svg: PathBuf,

    /// Path of the schematic newick text
    #[arg(long, default_value = "topology_schematic.txt")]
    schematic_txt: PathBuf,
}

const POPULATION_SIZE: f64 = 10_000.0;
const N_POPS: usize = 15;

// Split times, generations before present.  The left clade (POP1
// through POP7) and the right clade (POP8 through POP14) branch
// off a shared root; POP15 is admixed from POP7 and POP8.
const T_ROOT: f64 = 2000.0; // ANC -> L + R
const T_L_SPLIT: f64 = 1600.0; // L -> L1 + L2
const T_L1: f64 = 1400.0; // L1 -> POP1 + POP2
const T_L2A: f64 = 1250.0; // POP3 vs rest
const T_L2B: f64 = 1200.0; // POP4 vs rest
const T_L2C: f64 = 1195.0; // POP5 vs rest
const T_L2D: f64 = 1190.0; // POP6 vs POP7
const T_R_SPLIT: f64 = 1500.0; // R -> R1 + R2
const T_R1: f64 = 1350.0; // R1 -> POP8 + POP9
const T_R2A: f64 = 1100.0; // POP10 vs rest
const T_R2B: f64 = 1080.0; // POP11 vs rest
const T_R2C: f64 = 1060.0; // POP12 vs rest
const T_R2D: f64 = 1040.0; // POP13 vs POP14
const T_ADMIX: f64 = 50.0; // POP15 from POP7 + POP8

fn build_demography() -> Result<Demography> {
    let mut builder = DemographyBuilder::default();
    builder.add_population("ANC", POPULATION_SIZE)?;

    for internal in [
        "L", "R", "L1", "L2", "R1", "R2", "L2a", "L2b", "L2c", "R2a", "R2b", "R2c",
    ] {
        builder.add_population(internal, POPULATION_SIZE)?;
    }

    for i in 1..=N_POPS {
        builder.add_population(&format!("POP{}", i), POPULATION_SIZE)?;
    }

    builder.add_population_split(T_ROOT, &["L", "R"], "ANC")?;
    builder.add_population_split(T_L_SPLIT, &["L1", "L2"], "L")?;
    builder.add_population_split(T_L1, &["POP1", "POP2"], "L1")?;
    builder.add_population_split(T_L2A, &["POP3", "L2a"], "L2")?;
    builder.add_population_split(T_L2B, &["POP4", "L2b"], "L2a")?;
    builder.add_population_split(T_L2C, &["POP5", "L2c"], "L2b")?;
    builder.add_population_split(T_L2D, &["POP6", "POP7"], "L2c")?;
    builder.add_population_split(T_R_SPLIT, &["R1", "R2"], "R")?;
    builder.add_population_split(T_R1, &["POP8", "POP9"], "R1")?;
    builder.add_population_split(T_R2A, &["POP10", "R2a"], "R2")?;
    builder.add_population_split(T_R2B, &["POP11", "R2b"], "R2a")?;
    builder.add_population_split(T_R2C, &["POP12", "R2c"], "R2b")?;
    builder.add_population_split(T_R2D, &["POP13", "POP14"], "R2c")?;

    // POP15 from POP7 (20%) + POP8 (80%)
    builder.add_admixture(T_ADMIX, "POP15", &["POP7", "POP8"], &[0.2, 0.8])?;

    Ok(Demography::new_from_builder(builder)?)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let demography = build_demography().context("Failed to build the demography")?;
    let sample_sets: Vec<SampleSet> = (1..=N_POPS)
        .map(|i| SampleSet::new(&format!("POP{}", i), args.inds_per_pop))
        .collect();

    let config = PipelineConfig {
        demography,
        sample_sets,
        sequence_length: args.sequence_length,
        recombination_rate: args.recombination_rate,
        mutation_rate: args.mutation_rate,
        ancestry_seed: args.seed_ancestry,
        mutation_seed: args.seed_mutations,
        schematic_seed: args.seed_schematic,
        out_prefix: args.out_prefix,
        schematic_svg: args.schematic_svg,
        schematic_txt: args.schematic_txt,
    };

    let report = run_pipeline(&config).context("Pipeline failed")?;

    println!("Tree (newick):\n{}", report.newick);
    println!(
        "Wrote {}  {}  {}  (SNPs={})",
        report.paths.geno.display(),
        report.paths.snp.display(),
        report.paths.ind.display(),
        report.num_sites
    );

    Ok(())
}
