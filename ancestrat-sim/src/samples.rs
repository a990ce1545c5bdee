/// A request to sample individuals from one population
/// at the present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleSet {
    population: String,
    num_individuals: u32,
    ploidy: u32,
}

impl SampleSet {
    /// Request `num_individuals` diploid individuals from `population`.
    pub fn new(population: &str, num_individuals: u32) -> Self {
        Self::new_with_ploidy(population, num_individuals, 2)
    }

    /// Request `num_individuals` individuals with an explicit ploidy.
    pub fn new_with_ploidy(population: &str, num_individuals: u32, ploidy: u32) -> Self {
        Self {
            population: population.to_string(),
            num_individuals,
            ploidy,
        }
    }

    /// The population sampled from.
    pub fn population(&self) -> &str {
        &self.population
    }

    /// Number of individuals drawn.
    pub fn num_individuals(&self) -> u32 {
        self.num_individuals
    }

    /// Genome copies per individual.
    pub fn ploidy(&self) -> u32 {
        self.ploidy
    }

    /// Haploid genomes contributed by this sample set.
    pub fn num_haploid(&self) -> u32 {
        self.num_individuals * self.ploidy
    }
}

/// Total haploid genomes across sample sets.
pub fn total_haploid_samples(sample_sets: &[SampleSet]) -> u32 {
    sample_sets.iter().map(|s| s.num_haploid()).sum()
}

/// Total individuals across sample sets.
pub fn total_individuals(sample_sets: &[SampleSet]) -> usize {
    sample_sets.iter().map(|s| s.num_individuals() as usize).sum()
}

/// Generated individual names, in sample-set declaration order.
///
/// The j-th individual (1-based) drawn from population `P` is
/// named `P_ind<j>`.
///
/// ```
/// use ancestrat_sim::{individual_names, SampleSet};
/// let names = individual_names(&[SampleSet::new("POP1", 2), SampleSet::new("POP2", 1)]);
/// assert_eq!(names, vec!["POP1_ind1", "POP1_ind2", "POP2_ind1"]);
/// ```
pub fn individual_names(sample_sets: &[SampleSet]) -> Vec<String> {
    let mut names = vec![];
    for set in sample_sets {
        for j in 1..=set.num_individuals() {
            names.push(format!("{}_ind{}", set.population(), j));
        }
    }
    names
}

/// The population label of a generated individual name: the
/// substring before the first underscore.
pub fn population_label(name: &str) -> &str {
    match name.split_once('_') {
        Some((label, _)) => label,
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haploid_counts() {
        let sets = vec![SampleSet::new("POP1", 10), SampleSet::new("POP2", 5)];
        assert_eq!(total_haploid_samples(&sets), 30);
        assert_eq!(total_individuals(&sets), 15);
        assert_eq!(
            SampleSet::new_with_ploidy("POP1", 4, 1).num_haploid(),
            4
        );
    }

    #[test]
    fn test_individual_naming() {
        let names = individual_names(&[SampleSet::new("POP7", 3)]);
        assert_eq!(names, vec!["POP7_ind1", "POP7_ind2", "POP7_ind3"]);
        assert_eq!(population_label(&names[0]), "POP7");
        assert_eq!(population_label("POP1_ind2_extra"), "POP1");
        assert_eq!(population_label("NOLABEL"), "NOLABEL");
    }
}
