//! The three-file EIGENSTRAT serializer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use ancestrat_sim::population_label;

use crate::error::Error;
use crate::variants::Variant;

const MISSING: u8 = b'9';

/// Convert one individual's pair of haploid calls into an
/// EIGENSTRAT genotype character.
///
/// The genotype table stores *reference*-allele counts, so a
/// diploid derived count `d = hap0 + hap1` in `{0, 1, 2}` maps to
/// `'0' + (2 - d)`.  A negative haploid call is an explicit
/// missing marker and any other derived count (multi-allelic or
/// corrupt calls) is folded into the same missing sentinel `9`.
///
/// ```
/// use ancestrat::eigenstrat::genotype_char;
/// assert_eq!(genotype_char(0, 0), b'2');
/// assert_eq!(genotype_char(1, 0), b'1');
/// assert_eq!(genotype_char(1, 1), b'0');
/// assert_eq!(genotype_char(-1, 0), b'9');
/// assert_eq!(genotype_char(2, 1), b'9');
/// ```
pub fn genotype_char(hap0: i8, hap1: i8) -> u8 {
    if hap0 < 0 || hap1 < 0 {
        return MISSING;
    }
    match hap0 + hap1 {
        d @ 0..=2 => b'0' + (2 - d) as u8,
        _ => MISSING,
    }
}

/// The three file names produced for an output prefix.
#[derive(Clone, Debug)]
pub struct EigenstratPaths {
    /// The genotype table, `<prefix>.geno`
    pub geno: PathBuf,
    /// The site table, `<prefix>.snp`
    pub snp: PathBuf,
    /// The individual table, `<prefix>.ind`
    pub ind: PathBuf,
}

impl EigenstratPaths {
    /// File names for `prefix`.
    pub fn new(prefix: &str) -> Self {
        Self {
            geno: PathBuf::from(format!("{}.geno", prefix)),
            snp: PathBuf::from(format!("{}.snp", prefix)),
            ind: PathBuf::from(format!("{}.ind", prefix)),
        }
    }
}

/// Write the EIGENSTRAT genotype/site/individual tables.
///
/// * `<prefix>.geno`: one line per site, one reference-count
///   character per diploid individual, columns in `names` order.
/// * `<prefix>.snp`: per site, tab-separated: `rs<i+1>`,
///   chromosome `1`, genetic distance `0`, position, reference
///   allele, alternate allele.
/// * `<prefix>.ind`: per individual, tab-separated: name, `U`,
///   and the population label parsed from the name.
///
/// Row order of the genotype and site tables is the variant
/// order; haploid calls `2i` and `2i + 1` of every variant belong
/// to individual `i`.
///
/// # Returns
///
/// The number of sites written.
///
/// # Errors
///
/// [`Error::MismatchedGenotypeRow`] if a variant does not carry
/// exactly two calls per individual; [`Error::Io`] if any file
/// cannot be written.
pub fn write_eigenstrat(
    prefix: &str,
    variants: &[Variant],
    names: &[String],
) -> Result<usize, Error> {
    let expected_calls = 2 * names.len();
    for v in variants {
        if v.genotypes.len() != expected_calls {
            return Err(Error::MismatchedGenotypeRow {
                found: v.genotypes.len(),
                expected: expected_calls,
            });
        }
    }

    let paths = EigenstratPaths::new(prefix);

    let mut geno = BufWriter::new(File::create(&paths.geno)?);
    for v in variants {
        let mut line = Vec::with_capacity(names.len() + 1);
        for pair in v.genotypes.chunks(2) {
            line.push(genotype_char(pair[0], pair[1]));
        }
        line.push(b'\n');
        geno.write_all(&line)?;
    }
    geno.flush()?;
    log::info!("wrote genotype table {}", paths.geno.display());

    let mut snp = BufWriter::new(File::create(&paths.snp)?);
    for (i, v) in variants.iter().enumerate() {
        writeln!(
            snp,
            "rs{}\t1\t0\t{}\t{}\t{}",
            i + 1,
            i64::from(v.position),
            v.reference_allele() as char,
            v.alternate_allele() as char
        )?;
    }
    snp.flush()?;
    log::info!("wrote site table {}", paths.snp.display());

    let mut ind = BufWriter::new(File::create(&paths.ind)?);
    for name in names {
        writeln!(ind, "{}\tU\t{}", name, population_label(name))?;
    }
    ind.flush()?;
    log::info!("wrote individual table {}", paths.ind.display());

    Ok(variants.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genotype_char_valid_calls() {
        assert_eq!(genotype_char(0, 0), b'2');
        assert_eq!(genotype_char(0, 1), b'1');
        assert_eq!(genotype_char(1, 0), b'1');
        assert_eq!(genotype_char(1, 1), b'0');
    }

    #[test]
    fn test_genotype_char_missing_calls() {
        assert_eq!(genotype_char(-1, 0), b'9');
        assert_eq!(genotype_char(0, -1), b'9');
        assert_eq!(genotype_char(-1, -1), b'9');
    }

    #[test]
    fn test_genotype_char_multiallelic_calls() {
        assert_eq!(genotype_char(2, 1), b'9');
        assert_eq!(genotype_char(2, 2), b'9');
        assert_eq!(genotype_char(3, 0), b'9');
    }

    #[test]
    fn test_genotype_char_matches_reference_count() {
        for h0 in 0..=1_i8 {
            for h1 in 0..=1_i8 {
                let c = genotype_char(h0, h1);
                assert_eq!(c, b'0' + (2 - (h0 + h1)) as u8);
            }
        }
    }

    #[test]
    fn test_row_shape_is_checked() {
        let v = Variant {
            position: 5.into(),
            alleles: vec![b'A', b'C'],
            genotypes: vec![0, 1, 1],
        };
        let names = vec!["POP1_ind1".to_string()];
        assert!(matches!(
            write_eigenstrat("/nonexistent-dir/x", &[v], &names),
            Err(Error::MismatchedGenotypeRow {
                found: 3,
                expected: 2
            })
        ));
    }
}
