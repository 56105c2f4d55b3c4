//! Molecular descriptor calculations.
//!
//! Descriptors are computed from a parsed [`Molecule`] and addressed by the
//! conventional toolkit names (`MolWt`, `MolLogP`, `TPSA`, `Chi1v`,
//! `fr_halogen`, ...). The pipeline asks for an ordered list of names and gets
//! back one `f64` per name, in the same order. Values that are undefined for a
//! molecule come back as NaN (or infinite) and are reported as missing so the
//! preprocessing stage can repair them.
//!
//! The families live in submodules, each with a container struct for direct
//! use:
//!
//! - [`physicochemical`] — masses, Crippen LogP/MR, TPSA, LabuteASA, Gasteiger charges
//! - [`constitutional`] — atom, donor/acceptor and ring counts
//! - [`topological`] — connectivity (chi), kappa shape, Balaban J, Bertz CT
//! - [`fragments`] — functional-group counts (`fr_*`)
//!
//! # Example
//!
//! ```
//! use stack_tox::descriptors::calculate_descriptors;
//! use stack_tox::parse_smiles;
//!
//! let mol = parse_smiles("CCO").unwrap();
//! let names = vec!["MolWt".to_string(), "NumHDonors".to_string(), "BalabanJ".to_string()];
//! let report = calculate_descriptors(&mol, &names);
//! assert_eq!(report.values.len(), 3);
//! assert!((report.values[0] - 46.069).abs() < 0.01);
//! assert!(report.missing.is_empty());
//! ```

use std::cell::OnceCell;
use std::io::{self, Write};

use thiserror::Error;
use tracing::{debug, warn};

use crate::molecule::{BondOrder, Molecule};
use crate::ring::RingInfo;
use crate::smiles::{parse_smiles, SmilesError};

pub mod constitutional;
pub mod fragments;
pub mod physicochemical;
pub mod topological;

/// Molecules with at most this many graph atoms get a reliability warning.
pub const SMALL_MOLECULE_ATOMS: usize = 3;

/// Errors returned by descriptor functions.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The SMILES could not be parsed into a molecule.
    #[error("invalid SMILES provided: {smiles}")]
    InvalidSmiles {
        /// The rejected input.
        smiles: String,
        /// Parser diagnosis.
        #[source]
        source: SmilesError,
    },

    /// Progress output could not be written.
    #[error("failed to write descriptor progress")]
    Io(#[from] io::Error),
}

/// Signature shared by every registered descriptor.
pub type DescriptorFn = fn(&MolContext<'_>) -> f64;

/// A molecule plus lazily computed shared intermediates.
///
/// Rings, the distance matrix and Gasteiger charges are each needed by
/// several descriptors, so they are computed at most once per molecule.
#[derive(Debug)]
pub struct MolContext<'a> {
    mol: &'a Molecule,
    rings: OnceCell<RingInfo>,
    distances: OnceCell<Vec<Vec<f64>>>,
    charges: OnceCell<Vec<f64>>,
}

impl<'a> MolContext<'a> {
    /// Wrap a molecule.
    pub fn new(mol: &'a Molecule) -> Self {
        MolContext {
            mol,
            rings: OnceCell::new(),
            distances: OnceCell::new(),
            charges: OnceCell::new(),
        }
    }

    /// The underlying molecule.
    pub fn mol(&self) -> &'a Molecule {
        self.mol
    }

    /// Ring perception (SSSR).
    pub fn rings(&self) -> &RingInfo {
        self.rings.get_or_init(|| RingInfo::perceive(self.mol))
    }

    /// Bond-order weighted distance matrix.
    pub fn distances(&self) -> &[Vec<f64>] {
        self.distances
            .get_or_init(|| topological::weighted_distance_matrix(self.mol))
    }

    /// Gasteiger-Marsili partial charges (NaN when any element lacks parameters).
    pub fn charges(&self) -> &[f64] {
        self.charges
            .get_or_init(|| physicochemical::gasteiger_charges(self.mol))
    }
}

/// Orbital hybridization inferred from the localised bond orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hybridization {
    /// Linear.
    Sp,
    /// Trigonal planar or aromatic.
    Sp2,
    /// Tetrahedral.
    Sp3,
}

/// Hybridization of an atom: aromatic or one double bond is sp2, a triple
/// bond or two double bonds is sp, anything else sp3.
pub fn hybridization(mol: &Molecule, atom: usize) -> Hybridization {
    if mol.atoms[atom].aromatic {
        return Hybridization::Sp2;
    }
    let mut doubles = 0;
    for &(_, bond) in mol.neighbors(atom) {
        match mol.bonds[bond].kekule {
            BondOrder::Triple => return Hybridization::Sp,
            BondOrder::Double => doubles += 1,
            _ => {}
        }
    }
    match doubles {
        0 => Hybridization::Sp3,
        1 => Hybridization::Sp2,
        _ => Hybridization::Sp,
    }
}

/// Every descriptor this crate can calculate, by conventional name.
#[rustfmt::skip]
static REGISTRY: &[(&str, DescriptorFn)] = &[
    // physicochemical
    ("MolWt", physicochemical::mol_wt),
    ("HeavyAtomMolWt", physicochemical::heavy_atom_mol_wt),
    ("ExactMolWt", physicochemical::exact_mol_wt),
    ("MolLogP", physicochemical::mol_log_p),
    ("MolMR", physicochemical::mol_mr),
    ("TPSA", physicochemical::tpsa),
    ("LabuteASA", physicochemical::labute_asa),
    ("NumValenceElectrons", physicochemical::num_valence_electrons),
    ("NumRadicalElectrons", physicochemical::num_radical_electrons),
    ("MaxPartialCharge", physicochemical::max_partial_charge),
    ("MinPartialCharge", physicochemical::min_partial_charge),
    ("MaxAbsPartialCharge", physicochemical::max_abs_partial_charge),
    ("MinAbsPartialCharge", physicochemical::min_abs_partial_charge),
    // constitutional
    ("HeavyAtomCount", constitutional::heavy_atom_count),
    ("NHOHCount", constitutional::nhoh_count),
    ("NOCount", constitutional::no_count),
    ("NumHAcceptors", constitutional::num_h_acceptors),
    ("NumHDonors", constitutional::num_h_donors),
    ("NumHeteroatoms", constitutional::num_heteroatoms),
    ("NumRotatableBonds", constitutional::num_rotatable_bonds),
    ("RingCount", constitutional::ring_count),
    ("NumAromaticRings", constitutional::num_aromatic_rings),
    ("NumAliphaticRings", constitutional::num_aliphatic_rings),
    ("NumSaturatedRings", constitutional::num_saturated_rings),
    ("NumAromaticCarbocycles", constitutional::num_aromatic_carbocycles),
    ("NumAromaticHeterocycles", constitutional::num_aromatic_heterocycles),
    ("NumAliphaticCarbocycles", constitutional::num_aliphatic_carbocycles),
    ("NumAliphaticHeterocycles", constitutional::num_aliphatic_heterocycles),
    ("NumSaturatedCarbocycles", constitutional::num_saturated_carbocycles),
    ("NumSaturatedHeterocycles", constitutional::num_saturated_heterocycles),
    ("FractionCSP3", constitutional::fraction_csp3),
    // topological
    ("BalabanJ", topological::balaban_j),
    ("BertzCT", topological::bertz_ct),
    ("Chi0", topological::chi0),
    ("Chi1", topological::chi1),
    ("Chi0n", topological::chi0n),
    ("Chi1n", topological::chi1n),
    ("Chi2n", topological::chi2n),
    ("Chi3n", topological::chi3n),
    ("Chi4n", topological::chi4n),
    ("Chi0v", topological::chi0v),
    ("Chi1v", topological::chi1v),
    ("Chi2v", topological::chi2v),
    ("Chi3v", topological::chi3v),
    ("Chi4v", topological::chi4v),
    ("HallKierAlpha", topological::hall_kier_alpha),
    ("Kappa1", topological::kappa1),
    ("Kappa2", topological::kappa2),
    ("Kappa3", topological::kappa3),
    // fragments
    ("fr_halogen", fragments::fr_halogen),
    ("fr_benzene", fragments::fr_benzene),
    ("fr_Al_OH", fragments::fr_al_oh),
    ("fr_Ar_OH", fragments::fr_ar_oh),
    ("fr_ether", fragments::fr_ether),
    ("fr_ketone", fragments::fr_ketone),
    ("fr_aldehyde", fragments::fr_aldehyde),
    ("fr_COO", fragments::fr_coo),
    ("fr_ester", fragments::fr_ester),
    ("fr_amide", fragments::fr_amide),
    ("fr_NH2", fragments::fr_nh2),
    ("fr_NH1", fragments::fr_nh1),
    ("fr_nitro", fragments::fr_nitro),
    ("fr_nitrile", fragments::fr_nitrile),
    ("fr_C_O", fragments::fr_c_o),
    ("fr_Ar_N", fragments::fr_ar_n),
    ("fr_pyridine", fragments::fr_pyridine),
    ("fr_SH", fragments::fr_sh),
    ("fr_sulfide", fragments::fr_sulfide),
    ("fr_phenol", fragments::fr_phenol),
];

/// Names of all registered descriptors, in registry order.
pub fn descriptor_names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|&(name, _)| name)
}

/// Look up a descriptor by its conventional name (case-sensitive).
pub fn lookup(name: &str) -> Option<DescriptorFn> {
    REGISTRY
        .iter()
        .find(|&&(registered, _)| registered == name)
        .map(|&(_, f)| f)
}

/// Descriptor values for one molecule plus the positions that are unusable.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorReport {
    /// One value per requested name, in request order.
    pub values: Vec<f64>,
    /// Ascending indices whose value is NaN or infinite.
    pub missing: Vec<usize>,
}

impl DescriptorReport {
    /// Build a report, flagging non-finite values as missing.
    pub fn from_values(values: Vec<f64>) -> Self {
        let missing = values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_finite())
            .map(|(i, _)| i)
            .collect();
        DescriptorReport { values, missing }
    }

    /// True when every value is finite.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Compute the named descriptors for `mol`, preserving order.
///
/// Unknown names yield NaN and therefore show up in
/// [`DescriptorReport::missing`].
pub fn calculate_descriptors(mol: &Molecule, names: &[String]) -> DescriptorReport {
    let ctx = MolContext::new(mol);
    let mut unknown = Vec::new();
    let values = names
        .iter()
        .map(|name| match lookup(name) {
            Some(f) => f(&ctx),
            None => {
                unknown.push(name.as_str());
                f64::NAN
            }
        })
        .collect();
    if !unknown.is_empty() {
        warn!(?unknown, "unrecognised descriptor names are reported as missing");
    }
    DescriptorReport::from_values(values)
}

/// Parse `smiles`, compute the named descriptors and write progress and
/// warning lines to `out`.
///
/// # Errors
///
/// [`DescriptorError::InvalidSmiles`] when the SMILES does not parse;
/// [`DescriptorError::Io`] when writing to `out` fails.
pub fn calculate_descriptors_verbose<W: Write>(
    smiles: &str,
    names: &[String],
    out: &mut W,
) -> Result<DescriptorReport, DescriptorError> {
    writeln!(out, "Parsing SMILES...")?;
    let mol = parse_smiles(smiles).map_err(|source| DescriptorError::InvalidSmiles {
        smiles: smiles.to_string(),
        source,
    })?;

    writeln!(out, "Calculating {} descriptors...", names.len())?;
    let report = calculate_descriptors(&mol, names);
    debug!(
        atoms = mol.atom_count(),
        missing = report.missing.len(),
        "descriptors calculated"
    );

    if report.is_complete() {
        writeln!(out, "All descriptors calculated successfully.")?;
    } else {
        writeln!(
            out,
            "Warning: {} descriptors could not be calculated: {:?}",
            report.missing.len(),
            report.missing
        )?;
    }

    let atoms = mol.atom_count();
    if atoms <= SMALL_MOLECULE_ATOMS {
        writeln!(
            out,
            "Warning: Molecule is very small ({atoms} atoms). Prediction may be unreliable."
        )?;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn registry_names_are_unique() {
        let all: Vec<_> = descriptor_names().collect();
        let mut sorted = all.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), all.len());
        assert!(all.len() >= 60);
    }

    #[test]
    fn values_follow_requested_order() {
        let mol = parse_smiles("c1ccccc1O").unwrap();
        let forward = calculate_descriptors(&mol, &names(&["HeavyAtomCount", "NumHDonors"]));
        let reverse = calculate_descriptors(&mol, &names(&["NumHDonors", "HeavyAtomCount"]));
        assert_eq!(forward.values, vec![7.0, 1.0]);
        assert_eq!(reverse.values, vec![1.0, 7.0]);
    }

    #[test]
    fn unknown_names_are_missing() {
        let mol = parse_smiles("CCO").unwrap();
        let report = calculate_descriptors(&mol, &names(&["MolWt", "NotADescriptor", "TPSA"]));
        assert_eq!(report.missing, vec![1]);
        assert!(report.values[1].is_nan());
        assert!(!report.is_complete());
    }

    #[test]
    fn infinite_values_count_as_missing() {
        let report = DescriptorReport::from_values(vec![1.0, f64::INFINITY, f64::NAN, 0.0]);
        assert_eq!(report.missing, vec![1, 2]);
    }

    #[test]
    fn verbose_output_for_small_molecule() {
        let mut out = Vec::new();
        let report =
            calculate_descriptors_verbose("CCO", &names(&["MolWt", "TPSA"]), &mut out).unwrap();
        assert!(report.is_complete());
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Parsing SMILES...\n\
             Calculating 2 descriptors...\n\
             All descriptors calculated successfully.\n\
             Warning: Molecule is very small (3 atoms). Prediction may be unreliable.\n"
        );
    }

    #[test]
    fn verbose_output_lists_missing_indices() {
        let mut out = Vec::new();
        calculate_descriptors_verbose("CCCCO", &names(&["Bogus", "MolWt", "Other"]), &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Warning: 2 descriptors could not be calculated: [0, 2]\n"));
        assert!(!text.contains("very small"));
    }

    #[test]
    fn verbose_rejects_invalid_smiles() {
        let mut out = Vec::new();
        let err = calculate_descriptors_verbose("C1CC", &names(&["MolWt"]), &mut out).unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidSmiles { .. }));
    }

    #[test]
    fn hybridization_from_bond_orders() {
        let mol = parse_smiles("C=CC#N").unwrap();
        assert_eq!(hybridization(&mol, 0), Hybridization::Sp2);
        assert_eq!(hybridization(&mol, 2), Hybridization::Sp);
        let mol = parse_smiles("CC").unwrap();
        assert_eq!(hybridization(&mol, 0), Hybridization::Sp3);
    }
}
