use ancestrat_core::TreeSequence;
use ancestrat_sim::{
    simulate_ancestry, Demography, DemographyBuilder, SampleSet, SimulationParams,
};
use streaming_iterator::StreamingIterator;

fn admixed_demography() -> Demography {
    let mut builder = DemographyBuilder::default();
    builder.add_population("ANC", 1_000.0).unwrap();
    builder.add_population("POP1", 1_000.0).unwrap();
    builder.add_population("POP2", 1_000.0).unwrap();
    builder.add_population("MIX", 1_000.0).unwrap();
    builder
        .add_population_split(200.0, &["POP1", "POP2"], "ANC")
        .unwrap();
    builder
        .add_admixture(20.0, "MIX", &["POP1", "POP2"], &[0.2, 0.8])
        .unwrap();
    Demography::new_from_builder(builder).unwrap()
}

#[test]
fn test_admixed_population_is_sampleable() {
    let demography = admixed_demography();
    let sets = vec![
        SampleSet::new("POP1", 2),
        SampleSet::new("POP2", 2),
        SampleSet::new("MIX", 2),
    ];
    let result = simulate_ancestry(
        &demography,
        &sets,
        &SimulationParams {
            sequence_length: 10_000,
            recombination_rate: 1e-6,
            seed: 99,
        },
    )
    .unwrap();
    assert_eq!(result.samples.len(), 12);
    assert!(result.tables.validate().is_ok());
}

#[test]
fn test_every_tree_has_one_root_covering_all_samples() {
    let demography = admixed_demography();
    let sets = vec![SampleSet::new("POP1", 2), SampleSet::new("MIX", 2)];
    let result = simulate_ancestry(
        &demography,
        &sets,
        &SimulationParams {
            sequence_length: 10_000,
            recombination_rate: 1e-5,
            seed: 5,
        },
    )
    .unwrap();
    let num_samples = result.samples.len();
    let ts = TreeSequence::new(result.tables).unwrap();
    let mut tree_iterator = ts.tree_iterator();
    let mut total_span = 0_i64;
    while let Some(tree) = tree_iterator.next() {
        total_span += tree.span();
        let root = tree.root_of(ts.sample_nodes()[0]).unwrap();
        let mut below = tree.samples_below(root).unwrap();
        below.sort_unstable();
        assert_eq!(below, (0..num_samples).collect::<Vec<_>>());
    }
    assert_eq!(total_span, 10_000);
}

#[test]
fn test_zero_recombination_yields_single_tree() {
    let demography = admixed_demography();
    let sets = vec![SampleSet::new("POP1", 3)];
    let result = simulate_ancestry(
        &demography,
        &sets,
        &SimulationParams {
            sequence_length: 1,
            recombination_rate: 0.0,
            seed: 17,
        },
    )
    .unwrap();
    let ts = TreeSequence::new(result.tables).unwrap();
    let mut tree_iterator = ts.tree_iterator();
    let mut num_trees = 0;
    while let Some(tree) = tree_iterator.next() {
        num_trees += 1;
        assert_eq!(tree.span(), 1);
    }
    assert_eq!(num_trees, 1);
}
