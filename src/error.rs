///! Error handling
use thiserror::Error;

/// Primary error type.
///
/// Some members of this enum implement ``From``
/// in order to redirect other error types.
#[derive(Error, Debug)]
pub enum Error {
    /// A redirection of [``ancestrat_sim::DemographyError``].
    #[error("{value}")]
    Demography {
        /// The redirected error
        #[from]
        value: ancestrat_sim::DemographyError,
    },
    /// A redirection of [``ancestrat_sim::SimulationError``].
    #[error("{value}")]
    Simulation {
        /// The redirected error
        #[from]
        value: ancestrat_sim::SimulationError,
    },
    /// A redirection of [``ancestrat_core::TablesError``].
    #[error("{value}")]
    Tables {
        /// The redirected error
        #[from]
        value: ancestrat_core::TablesError,
    },
    /// A redirection of [``ancestrat_core::TreesError``].
    #[error("{value}")]
    Trees {
        /// The redirected error
        #[from]
        value: ancestrat_core::TreesError,
    },
    /// Failure to write an output file.
    #[error("{value}")]
    Io {
        /// The redirected error
        #[from]
        value: std::io::Error,
    },
    /// A genotype row whose length disagrees with the
    /// individual list.
    #[error("genotype row has {found} calls, expected {expected}")]
    MismatchedGenotypeRow {
        /// Calls in the offending row
        found: usize,
        /// Calls implied by the individual list
        expected: usize,
    },
    /// The genotype table is diploid; other ploidies cannot
    /// be serialized.
    #[error("unsupported ploidy {found}, the genotype table is diploid")]
    UnsupportedPloidy {
        /// The offending ploidy
        found: u32,
    },
}
