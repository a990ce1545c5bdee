use ancestrat_core::{NodeFlags, NodeId, PopulationId, TableCollection, TablesError};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rand_distr::Exp;
use thiserror::Error;

use crate::demography::{DemographicEvent, Demography};
use crate::samples::SampleSet;

/// Error type for ancestry simulation.
#[derive(Error, Debug, PartialEq)]
pub enum SimulationError {
    /// Returned when the requested genome length is < 1.
    #[error("invalid sequence length {found}")]
    InvalidSequenceLength {
        /// The requested length
        found: i64,
    },
    /// Returned when the recombination rate is negative or not finite.
    #[error("invalid recombination rate {found}")]
    InvalidRecombinationRate {
        /// The offending rate
        found: f64,
    },
    /// Returned when the mutation rate is negative or not finite.
    #[error("invalid mutation rate {found}")]
    InvalidMutationRate {
        /// The offending rate
        found: f64,
    },
    /// Returned when a sample set requests zero individuals
    /// or zero ploidy.
    #[error("sample count for population {name:?} must be positive")]
    NonPositiveSampleCount {
        /// The population sampled from
        name: String,
    },
    /// Returned when a sample set references an undeclared population.
    #[error("unknown population {name:?} in sample set")]
    UnknownSamplePopulation {
        /// The offending name
        name: String,
    },
    /// Returned when a sample set references a population that
    /// does not exist at the present.
    #[error("population {name:?} does not exist at the present and cannot be sampled")]
    SamplePopulationInactive {
        /// The offending name
        name: String,
    },
    /// Returned when no samples were requested.
    #[error("no samples requested")]
    NoSamples,
    /// Returned when uncoalesced lineages remain but no further
    /// event can ever occur.
    #[error("demography leaves lineages that can never coalesce")]
    InfiniteWaitingTime,
    /// Returned on an internal rate bookkeeping failure.
    #[error("non-positive event rate")]
    InvalidEventRate,
    /// A redirection of [`TablesError`].
    #[error(transparent)]
    Tables(#[from] TablesError),
}

/// Parameters of one ancestry simulation.
#[derive(Copy, Clone, Debug)]
pub struct SimulationParams {
    /// Genome length in bases
    pub sequence_length: i64,
    /// Recombination rate per base per generation
    pub recombination_rate: f64,
    /// Random seed
    pub seed: u64,
}

/// The product of [`simulate_ancestry`]: tables plus the ordered
/// sample nodes and their populations.
pub struct AncestryResult {
    /// Node/edge tables of the simulated genealogy,
    /// canonically sorted and indexed.
    pub tables: TableCollection,
    /// Sample nodes in sample-set declaration order.
    pub samples: Vec<NodeId>,
    /// Population of each sample node, parallel to `samples`.
    pub sample_populations: Vec<PopulationId>,
}

// A chunk of genome [left, right) whose ancestry is currently
// carried by one lineage.  `node` is the genealogical node the
// chunk maps to; `samples` counts the sample genomes subtended
// by `node` on this chunk.
#[derive(Copy, Clone, Debug)]
struct AncestrySegment {
    left: i64,
    right: i64,
    node: NodeId,
    samples: u32,
}

// Invariant: `segments` is non-empty, sorted, and non-overlapping.
struct Lineage {
    population: usize,
    segments: Vec<AncestrySegment>,
}

impl Lineage {
    // Candidate recombination breakpoints: positions strictly
    // inside the extent of the ancestral material.
    fn links(&self) -> i64 {
        let first = self.segments[0].left;
        let last = self.segments[self.segments.len() - 1].right;
        last - first - 1
    }
}

fn push_segment(out: &mut Vec<AncestrySegment>, seg: AncestrySegment) {
    match out.last_mut() {
        Some(last)
            if last.node == seg.node
                && last.samples == seg.samples
                && last.right == seg.left =>
        {
            last.right = seg.right;
        }
        _ => out.push(seg),
    }
}

// Merge the segment lists of two coalescing lineages at `time`
// in `population`.  Overlapping chunks coalesce into a freshly
// recorded parent node; chunks carried by only one lineage pass
// through unchanged.  Chunks that now subtend every sample have
// reached their local MRCA and are dropped.
fn merge_lineages(
    a: &[AncestrySegment],
    b: &[AncestrySegment],
    time: f64,
    population: usize,
    total_samples: u32,
    tables: &mut TableCollection,
) -> Result<Vec<AncestrySegment>, SimulationError> {
    let mut boundaries = vec![];
    for s in a.iter().chain(b.iter()) {
        boundaries.push(s.left);
        boundaries.push(s.right);
    }
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut out = vec![];
    let mut parent: Option<NodeId> = None;
    let (mut ia, mut ib) = (0_usize, 0_usize);
    for w in boundaries.windows(2) {
        let (left, right) = (w[0], w[1]);
        while ia < a.len() && a[ia].right <= left {
            ia += 1;
        }
        while ib < b.len() && b[ib].right <= left {
            ib += 1;
        }
        let ca = a.get(ia).filter(|s| s.left <= left);
        let cb = b.get(ib).filter(|s| s.left <= left);
        match (ca, cb) {
            (Some(x), Some(y)) => {
                let p = match parent {
                    Some(p) => p,
                    None => {
                        let p = tables.add_node(time, PopulationId::from(population))?;
                        parent = Some(p);
                        p
                    }
                };
                tables.add_edge(left, right, p, x.node)?;
                tables.add_edge(left, right, p, y.node)?;
                let samples = x.samples + y.samples;
                if samples < total_samples {
                    push_segment(
                        &mut out,
                        AncestrySegment {
                            left,
                            right,
                            node: p,
                            samples,
                        },
                    );
                }
            }
            (Some(x), None) => push_segment(
                &mut out,
                AncestrySegment {
                    left,
                    right,
                    node: x.node,
                    samples: x.samples,
                },
            ),
            (None, Some(y)) => push_segment(
                &mut out,
                AncestrySegment {
                    left,
                    right,
                    node: y.node,
                    samples: y.samples,
                },
            ),
            (None, None) => (),
        }
    }
    Ok(out)
}

// Split a lineage's material at `breakpoint`; material to the
// left stays, material to the right becomes a new lineage.
fn split_segments(
    segments: &[AncestrySegment],
    breakpoint: i64,
) -> (Vec<AncestrySegment>, Vec<AncestrySegment>) {
    let mut left = vec![];
    let mut right = vec![];
    for s in segments {
        if s.right <= breakpoint {
            left.push(*s);
        } else if s.left >= breakpoint {
            right.push(*s);
        } else {
            left.push(AncestrySegment {
                left: s.left,
                right: breakpoint,
                node: s.node,
                samples: s.samples,
            });
            right.push(AncestrySegment {
                left: breakpoint,
                right: s.right,
                node: s.node,
                samples: s.samples,
            });
        }
    }
    (left, right)
}

fn apply_demographic_event(
    event: &DemographicEvent,
    lineages: &mut [Lineage],
    rng: &mut StdRng,
) -> Result<(), SimulationError> {
    match event {
        DemographicEvent::PopulationSplit {
            derived, ancestral, ..
        } => {
            for lineage in lineages.iter_mut() {
                if derived
                    .iter()
                    .any(|d| usize::from(*d) == lineage.population)
                {
                    lineage.population = usize::from(*ancestral);
                }
            }
        }
        DemographicEvent::Admixture {
            derived,
            ancestral,
            proportions,
            ..
        } => {
            let choose =
                WeightedIndex::new(proportions).map_err(|_| SimulationError::InvalidEventRate)?;
            for lineage in lineages.iter_mut() {
                if lineage.population == usize::from(*derived) {
                    lineage.population = usize::from(ancestral[choose.sample(rng)]);
                }
            }
        }
    }
    Ok(())
}

/// Simulate the ancestry of the requested samples under `demography`.
///
/// Runs a backward-in-time coalescent with recombination.  Lineages
/// carry their ancestral material as genome chunks; pairwise
/// coalescence within a population of size `N` occurs at rate
/// `1 / (2N)` per pair per generation, recombination at
/// `recombination_rate` per candidate breakpoint per generation.
/// Demographic events interrupt the waiting times at their fixed
/// times.
///
/// # Determinism
///
/// Identical `(demography, sample_sets, params)` produce identical
/// tables: the engine consumes randomness in a fixed order from a
/// seeded [`StdRng`].
///
/// # Errors
///
/// [`SimulationError`] if the sample specification is invalid or
/// if uncoalesced lineages remain with no event left to move them
/// (for example, a demography whose populations never share an
/// ancestor).
pub fn simulate_ancestry(
    demography: &Demography,
    sample_sets: &[SampleSet],
    params: &SimulationParams,
) -> Result<AncestryResult, SimulationError> {
    if params.sequence_length < 1 {
        return Err(SimulationError::InvalidSequenceLength {
            found: params.sequence_length,
        });
    }
    if !params.recombination_rate.is_finite() || params.recombination_rate < 0.0 {
        return Err(SimulationError::InvalidRecombinationRate {
            found: params.recombination_rate,
        });
    }

    let mut tables = TableCollection::new(params.sequence_length)?;
    let mut rng = StdRng::seed_from_u64(params.seed);

    let mut samples = vec![];
    let mut sample_populations = vec![];
    let mut lineages: Vec<Lineage> = vec![];
    let total_samples = crate::samples::total_haploid_samples(sample_sets);

    for set in sample_sets {
        if set.num_individuals() == 0 || set.ploidy() == 0 {
            return Err(SimulationError::NonPositiveSampleCount {
                name: set.population().to_string(),
            });
        }
        let population = demography.population_id(set.population()).ok_or_else(|| {
            SimulationError::UnknownSamplePopulation {
                name: set.population().to_string(),
            }
        })?;
        if !demography.leaf_populations().contains(&population) {
            return Err(SimulationError::SamplePopulationInactive {
                name: set.population().to_string(),
            });
        }
        for _ in 0..set.num_haploid() {
            let node =
                tables.add_node_with_flags(0.0, population, NodeFlags::IS_SAMPLE.bits())?;
            samples.push(node);
            sample_populations.push(population);
            if total_samples > 1 {
                lineages.push(Lineage {
                    population: usize::from(population),
                    segments: vec![AncestrySegment {
                        left: 0,
                        right: params.sequence_length,
                        node,
                        samples: 1,
                    }],
                });
            }
        }
    }
    if samples.is_empty() {
        return Err(SimulationError::NoSamples);
    }

    let events = demography.events();
    let num_populations = demography.num_populations();
    let mut next_event = 0_usize;
    let mut time = 0.0_f64;
    let mut coalescence_rates = vec![0.0_f64; num_populations];
    let mut population_members: Vec<Vec<usize>> = vec![vec![]; num_populations];

    while !lineages.is_empty() {
        for members in population_members.iter_mut() {
            members.clear();
        }
        for (i, lineage) in lineages.iter().enumerate() {
            population_members[lineage.population].push(i);
        }
        let mut coalescence_total = 0.0;
        for (p, members) in population_members.iter().enumerate() {
            let k = members.len() as f64;
            let rate = k * (k - 1.0) / 2.0 / (2.0 * demography.initial_size(PopulationId::from(p)));
            coalescence_rates[p] = rate;
            coalescence_total += rate;
        }
        let total_links: i64 = lineages.iter().map(|l| l.links()).sum();
        let recombination_total = params.recombination_rate * total_links as f64;
        let total_rate = coalescence_total + recombination_total;

        let next_event_time = match events.get(next_event) {
            Some(e) => e.time(),
            None => f64::INFINITY,
        };

        // With no event left to move lineages between populations,
        // material spread over several populations can never finish
        // coalescing, recombination or not.
        if !next_event_time.is_finite() && coalescence_total == 0.0 && lineages.len() > 1 {
            return Err(SimulationError::InfiniteWaitingTime);
        }

        if total_rate <= 0.0 {
            if !next_event_time.is_finite() {
                return Err(SimulationError::InfiniteWaitingTime);
            }
            time = time.max(next_event_time);
            apply_demographic_event(&events[next_event], &mut lineages, &mut rng)?;
            next_event += 1;
            continue;
        }

        let wait = rng.sample(Exp::new(total_rate).map_err(|_| SimulationError::InvalidEventRate)?);
        if time + wait >= next_event_time {
            time = next_event_time;
            apply_demographic_event(&events[next_event], &mut lineages, &mut rng)?;
            next_event += 1;
            continue;
        }
        time += wait;

        let pick: f64 = rng.gen::<f64>() * total_rate;
        if pick < recombination_total && total_links > 0 {
            // choosing a global link uniformly selects a lineage
            // weighted by its links and a breakpoint within it
            let mut link = rng.gen_range(0..total_links);
            let mut chosen = None;
            for (i, lineage) in lineages.iter().enumerate() {
                let links = lineage.links();
                if link < links {
                    chosen = Some((i, lineage.segments[0].left + 1 + link));
                    break;
                }
                link -= links;
            }
            if let Some((i, breakpoint)) = chosen {
                let population = lineages[i].population;
                let (left, right) = split_segments(&lineages[i].segments, breakpoint);
                lineages[i].segments = left;
                lineages.push(Lineage {
                    population,
                    segments: right,
                });
            }
        } else {
            let mut remainder = (pick - recombination_total).max(0.0);
            let mut population = usize::MAX;
            for (p, rate) in coalescence_rates.iter().enumerate() {
                if *rate > 0.0 && remainder < *rate {
                    population = p;
                    break;
                }
                remainder -= rate;
            }
            if population == usize::MAX {
                // numerical edge: fall back to the last population
                // with a positive rate
                population = match coalescence_rates.iter().rposition(|r| *r > 0.0) {
                    Some(p) => p,
                    None => continue,
                };
            }
            let members = &population_members[population];
            let i = rng.gen_range(0..members.len());
            let mut j = rng.gen_range(0..members.len() - 1);
            if j >= i {
                j += 1;
            }
            let (first, second) = (members[i].min(members[j]), members[i].max(members[j]));
            let b = lineages.swap_remove(second);
            let a = lineages.swap_remove(first);
            let merged = merge_lineages(
                &a.segments,
                &b.segments,
                time,
                population,
                total_samples,
                &mut tables,
            )?;
            if !merged.is_empty() {
                lineages.push(Lineage {
                    population,
                    segments: merged,
                });
            }
        }
    }

    tables.sort_tables();
    tables.squash_edges();
    tables.build_indexes()?;
    log::debug!(
        "coalescent history complete: {} nodes, {} edges",
        tables.num_nodes(),
        tables.num_edges()
    );

    Ok(AncestryResult {
        tables,
        samples,
        sample_populations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demography::DemographyBuilder;

    fn two_pop_demography() -> Demography {
        let mut builder = DemographyBuilder::default();
        builder.add_population("ANC", 1_000.0).unwrap();
        builder.add_population("POP1", 1_000.0).unwrap();
        builder.add_population("POP2", 1_000.0).unwrap();
        builder
            .add_population_split(100.0, &["POP1", "POP2"], "ANC")
            .unwrap();
        Demography::new_from_builder(builder).unwrap()
    }

    fn params(seed: u64) -> SimulationParams {
        SimulationParams {
            sequence_length: 1_000,
            recombination_rate: 1e-5,
            seed,
        }
    }

    #[test]
    fn test_rejects_zero_samples() {
        let demography = two_pop_demography();
        let sets = vec![SampleSet::new("POP1", 0)];
        assert_eq!(
            simulate_ancestry(&demography, &sets, &params(1)).err(),
            Some(SimulationError::NonPositiveSampleCount {
                name: "POP1".to_string()
            })
        );
    }

    #[test]
    fn test_rejects_unknown_population() {
        let demography = two_pop_demography();
        let sets = vec![SampleSet::new("NOPE", 1)];
        assert!(matches!(
            simulate_ancestry(&demography, &sets, &params(1)),
            Err(SimulationError::UnknownSamplePopulation { .. })
        ));
    }

    #[test]
    fn test_rejects_sampling_internal_population() {
        let demography = two_pop_demography();
        let sets = vec![SampleSet::new("ANC", 1)];
        assert!(matches!(
            simulate_ancestry(&demography, &sets, &params(1)),
            Err(SimulationError::SamplePopulationInactive { .. })
        ));
    }

    #[test]
    fn test_disconnected_demography_cannot_coalesce() {
        let mut builder = DemographyBuilder::default();
        builder.add_population("POP1", 1_000.0).unwrap();
        builder.add_population("POP2", 1_000.0).unwrap();
        let demography = Demography::new_from_builder(builder).unwrap();
        let sets = vec![SampleSet::new("POP1", 1), SampleSet::new("POP2", 1)];
        let rv = simulate_ancestry(
            &demography,
            &sets,
            &SimulationParams {
                sequence_length: 1_000,
                recombination_rate: 0.0,
                seed: 1,
            },
        );
        assert_eq!(rv.err(), Some(SimulationError::InfiniteWaitingTime));
    }

    #[test]
    fn test_sample_order_and_full_coalescence() {
        let demography = two_pop_demography();
        let sets = vec![SampleSet::new("POP1", 2), SampleSet::new("POP2", 1)];
        let result = simulate_ancestry(&demography, &sets, &params(42)).unwrap();
        assert_eq!(result.samples.len(), 6);
        for (i, s) in result.samples.iter().enumerate() {
            assert_eq!(usize::from(*s), i);
        }
        assert_eq!(
            result.sample_populations[0],
            demography.population_id("POP1").unwrap()
        );
        assert_eq!(
            result.sample_populations[5],
            demography.population_id("POP2").unwrap()
        );
        // every sample is covered by exactly one parent edge
        // across the whole genome
        let tables = &result.tables;
        for s in &result.samples {
            let mut covered = 0;
            for e in tables.edges() {
                if e.child == *s {
                    covered += i64::from(e.right) - i64::from(e.left);
                }
            }
            assert_eq!(covered, 1_000);
        }
        assert!(tables.validate().is_ok());
    }

    #[test]
    fn test_reproducibility() {
        let demography = two_pop_demography();
        let sets = vec![SampleSet::new("POP1", 2), SampleSet::new("POP2", 2)];
        let a = simulate_ancestry(&demography, &sets, &params(7)).unwrap();
        let b = simulate_ancestry(&demography, &sets, &params(7)).unwrap();
        assert_eq!(a.tables.num_nodes(), b.tables.num_nodes());
        assert_eq!(a.tables.num_edges(), b.tables.num_edges());
        for (x, y) in a.tables.edges().iter().zip(b.tables.edges().iter()) {
            assert_eq!(x.left, y.left);
            assert_eq!(x.right, y.right);
            assert_eq!(x.parent, y.parent);
            assert_eq!(x.child, y.child);
        }
        let c = simulate_ancestry(&demography, &sets, &params(8)).unwrap();
        assert!(
            a.tables.num_nodes() != c.tables.num_nodes()
                || a
                    .tables
                    .nodes()
                    .iter()
                    .zip(c.tables.nodes().iter())
                    .any(|(x, y)| x.time != y.time)
        );
    }
}
