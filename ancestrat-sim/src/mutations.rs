use ancestrat_core::{EdgeId, SiteId, TableCollection};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rand_distr::{Exp, Uniform};
use std::collections::HashMap;

use crate::ancestry::SimulationError;

const NUCLEOTIDES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Parameters of one mutation overlay.
#[derive(Copy, Clone, Debug)]
pub struct MutationParams {
    /// Mutation rate per base per generation
    pub rate: f64,
    /// Random seed, independent of the ancestry seed
    pub seed: u64,
}

/// Overlay neutral nucleotide mutations onto a simulated genealogy.
///
/// Walks every edge and drops mutations along it with exponential
/// inter-position spacing at rate `rate × branch_length` per base.
/// Sites are finite and discrete, so a position can be hit more
/// than once; repeat hits share one site record.  A new site draws
/// a uniform ancestral nucleotide, and each mutation draws a
/// uniform derived nucleotide different from the ancestral state
/// plus an origin time uniform on its branch.
///
/// On return the site table is sorted by position, mutation site
/// ids are remapped, and mutations at a site are ordered oldest
/// first.  Tables must be re-indexed before tree iteration.
///
/// # Returns
///
/// The number of mutations placed.
///
/// # Errors
///
/// [`SimulationError::InvalidMutationRate`] if `rate` is negative
/// or not finite.
pub fn overlay_mutations(
    tables: &mut TableCollection,
    params: &MutationParams,
) -> Result<usize, SimulationError> {
    if !params.rate.is_finite() || params.rate < 0.0 {
        return Err(SimulationError::InvalidMutationRate { found: params.rate });
    }
    if params.rate == 0.0 {
        return Ok(0);
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut position_to_site = HashMap::<i64, (SiteId, u8)>::new();

    let num_edges = tables.num_edges();
    for i in 0..num_edges {
        let edge = *tables.edge(EdgeId::from(i));
        let parent_time = f64::from(tables.node(edge.parent).time);
        let child_time = f64::from(tables.node(edge.child).time);
        let branch_length = parent_time - child_time;
        let edge_rate = params.rate * branch_length;
        if edge_rate <= 0.0 {
            continue;
        }
        let spacing =
            Exp::new(edge_rate).map_err(|_| SimulationError::InvalidMutationRate {
                found: params.rate,
            })?;
        let origin_time = Uniform::new(child_time, parent_time);
        let mut position = i64::from(edge.left) + (rng.sample(spacing) as i64) + 1;
        while position < i64::from(edge.right) {
            let (site, ancestral) = match position_to_site.get(&position) {
                Some(x) => *x,
                None => {
                    let ancestral = NUCLEOTIDES[rng.gen_range(0..NUCLEOTIDES.len())];
                    let site = tables.add_site(position, Some(vec![ancestral]))?;
                    position_to_site.insert(position, (site, ancestral));
                    (site, ancestral)
                }
            };
            let alternatives: Vec<u8> = NUCLEOTIDES
                .iter()
                .copied()
                .filter(|n| *n != ancestral)
                .collect();
            let derived = alternatives[rng.gen_range(0..alternatives.len())];
            let time = rng.sample(origin_time);
            tables.add_mutation(edge.child, site, time, Some(vec![derived]))?;
            position += (rng.sample(spacing) as i64) + 1;
        }
    }

    tables.sort_tables();
    log::debug!(
        "placed {} mutations across {} sites",
        tables.mutations().len(),
        tables.sites().len()
    );
    Ok(tables.mutations().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ancestry::{simulate_ancestry, SimulationParams};
    use crate::demography::{Demography, DemographyBuilder};
    use crate::samples::SampleSet;

    fn small_demography() -> Demography {
        let mut builder = DemographyBuilder::default();
        builder.add_population("ANC", 500.0).unwrap();
        builder.add_population("POP1", 500.0).unwrap();
        builder.add_population("POP2", 500.0).unwrap();
        builder
            .add_population_split(100.0, &["POP1", "POP2"], "ANC")
            .unwrap();
        Demography::new_from_builder(builder).unwrap()
    }

    fn simulated_tables(seed: u64) -> TableCollection {
        let demography = small_demography();
        let sets = vec![SampleSet::new("POP1", 2), SampleSet::new("POP2", 2)];
        simulate_ancestry(
            &demography,
            &sets,
            &SimulationParams {
                sequence_length: 10_000,
                recombination_rate: 0.0,
                seed,
            },
        )
        .unwrap()
        .tables
    }

    #[test]
    fn test_rejects_bad_rate() {
        let mut tables = simulated_tables(3);
        assert!(overlay_mutations(
            &mut tables,
            &MutationParams {
                rate: -1e-8,
                seed: 1
            }
        )
        .is_err());
    }

    #[test]
    fn test_zero_rate_places_nothing() {
        let mut tables = simulated_tables(3);
        let n = overlay_mutations(&mut tables, &MutationParams { rate: 0.0, seed: 1 }).unwrap();
        assert_eq!(n, 0);
        assert!(tables.mutations().is_empty());
    }

    #[test]
    fn test_overlay_produces_sorted_sites() {
        let mut tables = simulated_tables(3);
        let n = overlay_mutations(
            &mut tables,
            &MutationParams {
                rate: 1e-4,
                seed: 11,
            },
        )
        .unwrap();
        assert!(n > 0);
        assert_eq!(tables.mutations().len(), n);
        assert!(tables
            .sites()
            .windows(2)
            .all(|w| w[0].position < w[1].position));
        for m in tables.mutations() {
            let site = tables.site(m.site);
            assert!(site.ancestral_state.is_some());
            assert_ne!(site.ancestral_state, m.derived_state);
        }
        tables.build_indexes().unwrap();
        assert!(tables.validate().is_ok());
    }

    #[test]
    fn test_overlay_reproducibility() {
        let mut a = simulated_tables(5);
        let mut b = simulated_tables(5);
        let params = MutationParams {
            rate: 1e-4,
            seed: 13,
        };
        overlay_mutations(&mut a, &params).unwrap();
        overlay_mutations(&mut b, &params).unwrap();
        assert_eq!(a.mutations().len(), b.mutations().len());
        for (x, y) in a.mutations().iter().zip(b.mutations().iter()) {
            assert_eq!(x.node, y.node);
            assert_eq!(x.site, y.site);
            assert_eq!(x.derived_state, y.derived_state);
        }
    }
}
