use ancestrat_core::PopulationId;
use thiserror::Error;

const PROPORTION_TOLERANCE: f64 = 1e-9;

/// Error type for malformed demographic models.
#[derive(Error, Debug, PartialEq)]
pub enum DemographyError {
    /// A population name was declared twice.
    #[error("population {name:?} already declared")]
    DuplicatePopulation {
        /// The offending name
        name: String,
    },
    /// An event referenced a population that was never declared.
    #[error("unknown population {name:?}")]
    UnknownPopulation {
        /// The offending name
        name: String,
    },
    /// A population was declared with a non-positive
    /// or non-finite initial size.
    #[error("invalid initial size {size} for population {name:?}")]
    InvalidInitialSize {
        /// The offending name
        name: String,
        /// The offending size
        size: f64,
    },
    /// An event time was negative or not finite.
    #[error("invalid event time {time}")]
    InvalidEventTime {
        /// The offending time
        time: f64,
    },
    /// A split event listed no derived populations.
    #[error("split event has no derived populations")]
    EmptyDerivedList,
    /// The same population appeared twice in one derived list.
    #[error("population {name:?} appears twice in a derived list")]
    DuplicateDerived {
        /// The offending name
        name: String,
    },
    /// A population cannot be ancestral to itself.
    #[error("population {name:?} cannot be ancestral to itself")]
    SelfReferentialEvent {
        /// The offending name
        name: String,
    },
    /// An admixture event needs at least two sources.
    #[error("admixture requires at least two ancestral populations")]
    TooFewAdmixtureSources,
    /// Admixture proportions did not match the source count.
    #[error("expected {expected} admixture proportions, got {got}")]
    ProportionLengthMismatch {
        /// Number of ancestral sources
        expected: usize,
        /// Number of proportions supplied
        got: usize,
    },
    /// Admixture proportions must be non-negative and sum to 1.
    #[error("admixture proportions sum to {sum}, expected 1")]
    InvalidProportions {
        /// The observed sum
        sum: f64,
    },
    /// An event is younger than the event that created one of
    /// the populations it draws lineages from.
    #[error("event at time {time} uses population {name:?} before it exists")]
    EventTimeOrder {
        /// The offending name
        name: String,
        /// The offending time
        time: f64,
    },
    /// A population was used as derived after an older event
    /// already merged it away.
    #[error("population {name:?} was already merged by an earlier event")]
    PopulationAlreadyMerged {
        /// The offending name
        name: String,
    },
    /// A population was used as the ancestral side of more
    /// than one split.
    #[error("population {name:?} is ancestral to more than one split")]
    AncestralPopulationReused {
        /// The offending name
        name: String,
    },
    /// An admixture source must still exist at the admixture time.
    #[error("admixture source {name:?} is not active at time {time}")]
    AdmixtureSourceInactive {
        /// The offending name
        name: String,
        /// The admixture time
        time: f64,
    },
    /// The demography has no leaf population to sample from.
    #[error("demography has no leaf populations")]
    NoLeafPopulations,
}

/// A population in a demographic model.
#[derive(Clone, Debug, PartialEq)]
pub struct Population {
    name: String,
    initial_size: f64,
}

impl Population {
    /// The population name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The effective population size.
    pub fn initial_size(&self) -> f64 {
        self.initial_size
    }
}

/// A demographic event, timed in generations before the present.
#[derive(Clone, Debug, PartialEq)]
pub enum DemographicEvent {
    /// Moving backwards in time, lineages in each derived
    /// population move into the ancestral population.
    PopulationSplit {
        /// Event time
        time: f64,
        /// The derived populations
        derived: Vec<PopulationId>,
        /// The ancestral population
        ancestral: PopulationId,
    },
    /// Moving backwards in time, each lineage in the derived
    /// population moves to one of the ancestral populations,
    /// chosen according to `proportions`.
    Admixture {
        /// Event time
        time: f64,
        /// The admixed population
        derived: PopulationId,
        /// The source populations
        ancestral: Vec<PopulationId>,
        /// Mixture proportions, one per source
        proportions: Vec<f64>,
    },
}

impl DemographicEvent {
    /// The event time in generations before the present.
    pub fn time(&self) -> f64 {
        match self {
            DemographicEvent::PopulationSplit { time, .. } => *time,
            DemographicEvent::Admixture { time, .. } => *time,
        }
    }
}

/// Collects populations and events for a [`Demography`].
///
/// ```
/// use ancestrat_sim::{Demography, DemographyBuilder};
/// let mut builder = DemographyBuilder::default();
/// builder.add_population("ANC", 10_000.0).unwrap();
/// builder.add_population("A", 10_000.0).unwrap();
/// builder.add_population("B", 10_000.0).unwrap();
/// builder.add_population_split(100.0, &["A", "B"], "ANC").unwrap();
/// let demography = Demography::new_from_builder(builder).unwrap();
/// assert_eq!(demography.leaf_populations().len(), 2);
/// ```
#[derive(Default, Debug, Clone)]
pub struct DemographyBuilder {
    populations: Vec<Population>,
    events: Vec<DemographicEvent>,
}

impl DemographyBuilder {
    /// Declare a population.
    ///
    /// # Errors
    ///
    /// [`DemographyError`] if the name is a duplicate or the
    /// size is not positive and finite.
    pub fn add_population(&mut self, name: &str, initial_size: f64) -> Result<(), DemographyError> {
        if self.populations.iter().any(|p| p.name == name) {
            return Err(DemographyError::DuplicatePopulation {
                name: name.to_string(),
            });
        }
        if !initial_size.is_finite() || initial_size <= 0.0 {
            return Err(DemographyError::InvalidInitialSize {
                name: name.to_string(),
                size: initial_size,
            });
        }
        self.populations.push(Population {
            name: name.to_string(),
            initial_size,
        });
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<PopulationId, DemographyError> {
        match self.populations.iter().position(|p| p.name == name) {
            Some(i) => Ok(PopulationId::from(i)),
            None => Err(DemographyError::UnknownPopulation {
                name: name.to_string(),
            }),
        }
    }

    fn check_time(time: f64) -> Result<(), DemographyError> {
        if !time.is_finite() || time < 0.0 {
            return Err(DemographyError::InvalidEventTime { time });
        }
        Ok(())
    }

    /// Add a population split.
    ///
    /// Moving backwards in time, lineages in the `derived`
    /// populations merge into `ancestral` at `time`.
    pub fn add_population_split(
        &mut self,
        time: f64,
        derived: &[&str],
        ancestral: &str,
    ) -> Result<(), DemographyError> {
        Self::check_time(time)?;
        if derived.is_empty() {
            return Err(DemographyError::EmptyDerivedList);
        }
        for (i, d) in derived.iter().enumerate() {
            if derived[..i].contains(d) {
                return Err(DemographyError::DuplicateDerived {
                    name: d.to_string(),
                });
            }
            if *d == ancestral {
                return Err(DemographyError::SelfReferentialEvent {
                    name: ancestral.to_string(),
                });
            }
        }
        let derived = derived
            .iter()
            .map(|d| self.lookup(d))
            .collect::<Result<Vec<_>, _>>()?;
        let ancestral = self.lookup(ancestral)?;
        self.events.push(DemographicEvent::PopulationSplit {
            time,
            derived,
            ancestral,
        });
        Ok(())
    }

    /// Add an admixture event.
    ///
    /// Moving backwards in time, each lineage in `derived` moves
    /// into one of the `ancestral` populations at `time`, drawn
    /// according to `proportions`.
    ///
    /// # Errors
    ///
    /// [`DemographyError`] if fewer than two sources are given,
    /// if the proportions length does not match the source count,
    /// or if the proportions do not sum to 1.
    pub fn add_admixture(
        &mut self,
        time: f64,
        derived: &str,
        ancestral: &[&str],
        proportions: &[f64],
    ) -> Result<(), DemographyError> {
        Self::check_time(time)?;
        if ancestral.len() < 2 {
            return Err(DemographyError::TooFewAdmixtureSources);
        }
        if proportions.len() != ancestral.len() {
            return Err(DemographyError::ProportionLengthMismatch {
                expected: ancestral.len(),
                got: proportions.len(),
            });
        }
        if proportions.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(DemographyError::InvalidProportions {
                sum: proportions.iter().sum(),
            });
        }
        let sum: f64 = proportions.iter().sum();
        if (sum - 1.0).abs() > PROPORTION_TOLERANCE {
            return Err(DemographyError::InvalidProportions { sum });
        }
        if ancestral.contains(&derived) {
            return Err(DemographyError::SelfReferentialEvent {
                name: derived.to_string(),
            });
        }
        let ancestral = ancestral
            .iter()
            .map(|a| self.lookup(a))
            .collect::<Result<Vec<_>, _>>()?;
        let derived = self.lookup(derived)?;
        self.events.push(DemographicEvent::Admixture {
            time,
            derived,
            ancestral,
            proportions: proportions.to_vec(),
        });
        Ok(())
    }
}

// Book-keeping for the freeze-time walk over events.
#[derive(Copy, Clone, PartialEq)]
enum PopulationState {
    // exists at the present and has not yet been merged away
    Active { since: Option<f64> },
    // only comes into existence at the split that it is ancestral to
    Dormant,
    // merged into an ancestral population by a processed event
    Merged,
}

/// A frozen, validated demographic model.
///
/// Built once via [`Demography::new_from_builder`]; read-only
/// afterwards, so that repeated simulation calls observe the
/// same chronologically sorted event list.
#[derive(Clone, Debug, PartialEq)]
pub struct Demography {
    populations: Vec<Population>,
    events: Vec<DemographicEvent>,
    leaves: Vec<PopulationId>,
}

impl Demography {
    /// Validate and freeze a [`DemographyBuilder`].
    ///
    /// The event list is sorted chronologically (youngest first);
    /// the sort is part of the contract, simulation consumes events
    /// in this order.
    ///
    /// # Errors
    ///
    /// [`DemographyError`] if any event references an unknown
    /// population, if event times are not strictly increasing
    /// along a lineage, or if a population is reused after it
    /// was merged away.
    pub fn new_from_builder(builder: DemographyBuilder) -> Result<Self, DemographyError> {
        let DemographyBuilder {
            populations,
            mut events,
        } = builder;
        events.sort_by(|a, b| a.time().total_cmp(&b.time()));

        // Populations on the ancestral side of a split only come
        // into existence at that split, looking backwards.
        let mut split_ancestors = vec![false; populations.len()];
        for e in &events {
            if let DemographicEvent::PopulationSplit { ancestral, .. } = e {
                split_ancestors[usize::from(*ancestral)] = true;
            }
        }
        let mut states: Vec<PopulationState> = split_ancestors
            .iter()
            .map(|is_ancestor| match is_ancestor {
                true => PopulationState::Dormant,
                false => PopulationState::Active { since: None },
            })
            .collect();

        let name_of = |id: PopulationId| populations[usize::from(id)].name.clone();
        let check_derived = |states: &[PopulationState],
                             id: PopulationId,
                             time: f64|
         -> Result<(), DemographyError> {
            match states[usize::from(id)] {
                PopulationState::Active { since: None } => Ok(()),
                PopulationState::Active { since: Some(s) } if time > s => Ok(()),
                PopulationState::Active { .. } | PopulationState::Dormant => {
                    Err(DemographyError::EventTimeOrder {
                        name: name_of(id),
                        time,
                    })
                }
                PopulationState::Merged => Err(DemographyError::PopulationAlreadyMerged {
                    name: name_of(id),
                }),
            }
        };

        for e in &events {
            match e {
                DemographicEvent::PopulationSplit {
                    time,
                    derived,
                    ancestral,
                } => {
                    for d in derived {
                        check_derived(&states, *d, *time)?;
                    }
                    for d in derived {
                        states[usize::from(*d)] = PopulationState::Merged;
                    }
                    match states[usize::from(*ancestral)] {
                        PopulationState::Dormant => {
                            states[usize::from(*ancestral)] =
                                PopulationState::Active { since: Some(*time) };
                        }
                        _ => {
                            return Err(DemographyError::AncestralPopulationReused {
                                name: name_of(*ancestral),
                            });
                        }
                    }
                }
                DemographicEvent::Admixture {
                    time,
                    derived,
                    ancestral,
                    ..
                } => {
                    check_derived(&states, *derived, *time)?;
                    states[usize::from(*derived)] = PopulationState::Merged;
                    for a in ancestral {
                        match states[usize::from(*a)] {
                            PopulationState::Active { since: None } => (),
                            PopulationState::Active { since: Some(s) } if *time > s => (),
                            _ => {
                                return Err(DemographyError::AdmixtureSourceInactive {
                                    name: name_of(*a),
                                    time: *time,
                                });
                            }
                        }
                    }
                }
            }
        }

        let leaves = (0..populations.len())
            .filter(|i| !split_ancestors[*i])
            .map(PopulationId::from)
            .collect();

        Ok(Self {
            populations,
            events,
            leaves,
        })
    }

    /// Number of declared populations.
    pub fn num_populations(&self) -> usize {
        self.populations.len()
    }

    /// All declared populations, in declaration order.
    pub fn populations(&self) -> &[Population] {
        &self.populations
    }

    /// The chronologically sorted events.
    pub fn events(&self) -> &[DemographicEvent] {
        &self.events
    }

    /// Look up a population id by name.
    pub fn population_id(&self, name: &str) -> Option<PopulationId> {
        self.populations
            .iter()
            .position(|p| p.name == name)
            .map(PopulationId::from)
    }

    /// The name of population `id`.
    pub fn population_name(&self, id: PopulationId) -> &str {
        &self.populations[usize::from(id)].name
    }

    /// The effective size of population `id`.
    pub fn initial_size(&self, id: PopulationId) -> f64 {
        self.populations[usize::from(id)].initial_size
    }

    /// Populations that exist at the present: those never used
    /// as the ancestral side of a split.
    pub fn leaf_populations(&self) -> &[PopulationId] {
        &self.leaves
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_pop_builder() -> DemographyBuilder {
        let mut builder = DemographyBuilder::default();
        builder.add_population("ANC", 10_000.0).unwrap();
        builder.add_population("A", 10_000.0).unwrap();
        builder.add_population("B", 10_000.0).unwrap();
        builder
    }

    #[test]
    fn test_duplicate_population() {
        let mut builder = three_pop_builder();
        assert_eq!(
            builder.add_population("A", 1.0),
            Err(DemographyError::DuplicatePopulation {
                name: "A".to_string()
            })
        );
    }

    #[test]
    fn test_invalid_size() {
        let mut builder = DemographyBuilder::default();
        assert!(builder.add_population("A", 0.0).is_err());
        assert!(builder.add_population("A", -10.0).is_err());
        assert!(builder.add_population("A", f64::NAN).is_err());
    }

    #[test]
    fn test_unknown_population() {
        let mut builder = three_pop_builder();
        assert_eq!(
            builder.add_population_split(100.0, &["A", "C"], "ANC"),
            Err(DemographyError::UnknownPopulation {
                name: "C".to_string()
            })
        );
    }

    #[test]
    fn test_proportions_must_sum_to_one() {
        let mut builder = three_pop_builder();
        builder.add_population("MIX", 10_000.0).unwrap();
        assert_eq!(
            builder.add_admixture(50.0, "MIX", &["A", "B"], &[0.3, 0.3]),
            Err(DemographyError::InvalidProportions { sum: 0.6 })
        );
        assert_eq!(
            builder.add_admixture(50.0, "MIX", &["A", "B"], &[0.2]),
            Err(DemographyError::ProportionLengthMismatch {
                expected: 2,
                got: 1
            })
        );
        assert!(builder
            .add_admixture(50.0, "MIX", &["A", "B"], &[0.2, 0.8])
            .is_ok());
    }

    #[test]
    fn test_events_sorted_after_freeze() {
        let mut builder = three_pop_builder();
        builder.add_population("ROOT", 10_000.0).unwrap();
        builder.add_population("C", 10_000.0).unwrap();
        builder
            .add_population_split(200.0, &["ANC", "C"], "ROOT")
            .unwrap();
        builder.add_population_split(100.0, &["A", "B"], "ANC").unwrap();
        let demography = Demography::new_from_builder(builder).unwrap();
        let times: Vec<f64> = demography.events().iter().map(|e| e.time()).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(demography.leaf_populations().len(), 3);
    }

    #[test]
    fn test_child_split_cannot_be_older_than_parent() {
        // A+B merge into ANC at 100; ANC+C merge into ROOT at
        // 50, i.e. before ANC exists.  Must be rejected.
        let mut builder = three_pop_builder();
        builder.add_population("ROOT", 10_000.0).unwrap();
        builder.add_population("C", 10_000.0).unwrap();
        builder.add_population_split(100.0, &["A", "B"], "ANC").unwrap();
        builder
            .add_population_split(50.0, &["ANC", "C"], "ROOT")
            .unwrap();
        assert_eq!(
            Demography::new_from_builder(builder),
            Err(DemographyError::EventTimeOrder {
                name: "ANC".to_string(),
                time: 50.0
            })
        );
    }

    #[test]
    fn test_population_cannot_be_merged_twice() {
        let mut builder = three_pop_builder();
        builder.add_population("ANC2", 10_000.0).unwrap();
        builder.add_population_split(100.0, &["A", "B"], "ANC").unwrap();
        builder.add_population_split(150.0, &["A"], "ANC2").unwrap();
        assert_eq!(
            Demography::new_from_builder(builder),
            Err(DemographyError::PopulationAlreadyMerged {
                name: "A".to_string()
            })
        );
    }

    #[test]
    fn test_self_referential_split() {
        let mut builder = three_pop_builder();
        assert_eq!(
            builder.add_population_split(100.0, &["A", "ANC"], "ANC"),
            Err(DemographyError::SelfReferentialEvent {
                name: "ANC".to_string()
            })
        );
    }

    #[test]
    fn test_admixture_source_must_outlive_event() {
        let mut builder = three_pop_builder();
        builder.add_population("MIX", 10_000.0).unwrap();
        builder.add_population_split(30.0, &["A", "B"], "ANC").unwrap();
        builder
            .add_admixture(50.0, "MIX", &["A", "B"], &[0.5, 0.5])
            .unwrap();
        assert_eq!(
            Demography::new_from_builder(builder),
            Err(DemographyError::AdmixtureSourceInactive {
                name: "A".to_string(),
                time: 50.0
            })
        );
    }
}
