//! Decoding per-site genotypes from a tree sequence.

use ancestrat_core::{Position, TreeSequence};
use streaming_iterator::StreamingIterator;

use crate::error::Error;

/// One polymorphic site decoded from a tree sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variant {
    /// Genomic position of the site
    pub position: Position,
    /// Allele nucleotides: ancestral first, then derived states
    /// in order of first appearance
    pub alleles: Vec<u8>,
    /// One allele index per haploid sample, in sample order.
    /// Negative values mark missing calls.
    pub genotypes: Vec<i8>,
}

impl Variant {
    /// The reference allele nucleotide.
    pub fn reference_allele(&self) -> u8 {
        match self.alleles.first() {
            Some(a) => *a,
            None => b'N',
        }
    }

    /// The alternate allele nucleotide, or `N` if the site has
    /// fewer than two alleles recorded.
    pub fn alternate_allele(&self) -> u8 {
        match self.alleles.get(1) {
            Some(a) => *a,
            None => b'N',
        }
    }
}

fn allele_index(alleles: &mut Vec<u8>, state: u8) -> i8 {
    match alleles.iter().position(|a| *a == state) {
        Some(i) => i as i8,
        None => {
            alleles.push(state);
            (alleles.len() - 1) as i8
        }
    }
}

/// Decode the genotype matrix of `ts`, one [`Variant`] per site.
///
/// Sites are visited in position order by walking trees left to
/// right; the i-th returned variant corresponds to the i-th site
/// of the table collection (ordering invariant shared with the
/// site serializer).  Every sample starts at the ancestral allele
/// and mutations are applied oldest first, so later (younger)
/// mutations overwrite deeper ones along a path.
///
/// # Errors
///
/// [`Error`] if a mutation references a node missing from the
/// current tree.
pub fn extract_variants(ts: &TreeSequence) -> Result<Vec<Variant>, Error> {
    let tables = ts.tables();
    let num_samples = ts.sample_nodes().len();
    let sites = tables.sites();
    let mutations = tables.mutations();

    let mut variants = Vec::with_capacity(sites.len());
    let mut site_cursor = 0_usize;
    let mut mutation_cursor = 0_usize;
    let mut tree_iterator = ts.tree_iterator();
    while let Some(tree) = tree_iterator.next() {
        let (_, right) = tree.range();
        while site_cursor < sites.len() && sites[site_cursor].position < right {
            let site = &sites[site_cursor];
            let ancestral = match site.ancestral_state.as_ref().and_then(|s| s.first()) {
                Some(a) => *a,
                None => b'N',
            };
            let mut alleles = vec![ancestral];
            let mut genotypes = vec![0_i8; num_samples];
            while mutation_cursor < mutations.len()
                && usize::from(mutations[mutation_cursor].site) == site_cursor
            {
                let mutation = &mutations[mutation_cursor];
                let derived = match mutation.derived_state.as_ref().and_then(|s| s.first()) {
                    Some(d) => *d,
                    None => b'N',
                };
                let index = allele_index(&mut alleles, derived);
                for sample in tree.samples_below(mutation.node)? {
                    genotypes[sample] = index;
                }
                mutation_cursor += 1;
            }
            variants.push(Variant {
                position: site.position,
                alleles,
                genotypes,
            });
            site_cursor += 1;
        }
    }

    Ok(variants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ancestrat_core::{NodeFlags, TableCollection};

    // 4 samples, one tree:
    //
    //       6
    //      / \
    //     4   5
    //    /|   |\
    //   0 1   2 3
    fn four_sample_tables() -> TableCollection {
        let mut tables = TableCollection::new(100).unwrap();
        let s = NodeFlags::IS_SAMPLE.bits();
        for _ in 0..4 {
            tables.add_node_with_flags(0.0, 0, s).unwrap();
        }
        let n4 = tables.add_node(1.0, 0).unwrap();
        let n5 = tables.add_node(1.5, 0).unwrap();
        let n6 = tables.add_node(3.0, 0).unwrap();
        tables.add_edge(0, 100, n4, 0).unwrap();
        tables.add_edge(0, 100, n4, 1).unwrap();
        tables.add_edge(0, 100, n5, 2).unwrap();
        tables.add_edge(0, 100, n5, 3).unwrap();
        tables.add_edge(0, 100, n6, n4).unwrap();
        tables.add_edge(0, 100, n6, n5).unwrap();
        tables
    }

    #[test]
    fn test_single_mutation() {
        let mut tables = four_sample_tables();
        let site = tables.add_site(10, Some(vec![b'A'])).unwrap();
        tables.add_mutation(4, site, 0.5, Some(vec![b'G'])).unwrap();
        tables.sort_tables();
        tables.build_indexes().unwrap();
        let ts = TreeSequence::new(tables).unwrap();
        let variants = extract_variants(&ts).unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].position, Position::from(10));
        assert_eq!(variants[0].alleles, vec![b'A', b'G']);
        assert_eq!(variants[0].genotypes, vec![1, 1, 0, 0]);
        assert_eq!(variants[0].reference_allele(), b'A');
        assert_eq!(variants[0].alternate_allele(), b'G');
    }

    #[test]
    fn test_stacked_mutations_apply_youngest_last() {
        let mut tables = four_sample_tables();
        let site = tables.add_site(10, Some(vec![b'A'])).unwrap();
        // older mutation over the whole left clade, younger one
        // reverting sample 0 to a third state
        tables.add_mutation(4, site, 0.9, Some(vec![b'G'])).unwrap();
        tables.add_mutation(0, site, 0.2, Some(vec![b'T'])).unwrap();
        tables.sort_tables();
        tables.build_indexes().unwrap();
        let ts = TreeSequence::new(tables).unwrap();
        let variants = extract_variants(&ts).unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].alleles, vec![b'A', b'G', b'T']);
        assert_eq!(variants[0].genotypes, vec![2, 1, 0, 0]);
    }

    #[test]
    fn test_sites_align_with_variants() {
        let mut tables = four_sample_tables();
        let s1 = tables.add_site(60, Some(vec![b'C'])).unwrap();
        let s2 = tables.add_site(10, Some(vec![b'A'])).unwrap();
        tables.add_mutation(5, s1, 0.5, Some(vec![b'T'])).unwrap();
        tables.add_mutation(2, s2, 0.5, Some(vec![b'G'])).unwrap();
        tables.sort_tables();
        tables.build_indexes().unwrap();
        let ts = TreeSequence::new(tables).unwrap();
        let variants = extract_variants(&ts).unwrap();
        assert_eq!(variants.len(), 2);
        for (site, variant) in ts.tables().sites().iter().zip(variants.iter()) {
            assert_eq!(site.position, variant.position);
        }
        assert_eq!(variants[0].position, Position::from(10));
        assert_eq!(variants[0].genotypes, vec![0, 0, 1, 0]);
        assert_eq!(variants[1].genotypes, vec![0, 0, 1, 1]);
    }
}
