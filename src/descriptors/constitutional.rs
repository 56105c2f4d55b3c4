// src/descriptors/constitutional.rs
//! Constitutional descriptors — simple, fast, interpretable counts.
//!
//! These count atoms, bonds, rings, and hydrogen-bonding features directly
//! from the molecular graph.
//!
//! | Descriptor            | Meaning                                                     |
//! |-----------------------|-------------------------------------------------------------|
//! | HeavyAtomCount        | Number of non-hydrogen atoms                                |
//! | NHOHCount             | Hydrogens attached to N or O                                |
//! | NOCount               | Number of N and O atoms                                     |
//! | NumHAcceptors         | Hydrogen bond acceptors (O, S, N not in amides, aromatic n/o/s, F) |
//! | NumHDonors            | Hydrogen bond donors (NH, OH, SH)                           |
//! | NumHeteroatoms        | Atoms that are neither C nor H                              |
//! | NumRotatableBonds     | Acyclic single bonds between non-terminal atoms             |
//! | RingCount             | Rings in the smallest set of smallest rings                 |
//! | Num{Aromatic,Aliphatic,Saturated}{Rings,Carbocycles,Heterocycles} | Ring counts by kind |
//! | FractionCSP3          | Fraction of carbons that are sp3                            |
//!
//! # Quick Start
//!
//! ```
//! use stack_tox::constitutional_descriptors;
//!
//! let desc = constitutional_descriptors("c1ccccc1CCO").unwrap(); // 2-phenylethanol
//! assert_eq!(desc.heavy_atom_count, 9);
//! assert_eq!(desc.num_rotatable_bonds, 2);
//! assert_eq!(desc.num_aromatic_rings, 1);
//! assert_eq!(desc.num_heteroatoms, 1);
//! ```
//!
//! Kekulé and aromatic spellings give the same answer:
//!
//! ```
//! use stack_tox::constitutional_descriptors;
//!
//! let caffeine = constitutional_descriptors("CN1C=NC2=C1C(=O)N(C(=O)N2C)C").unwrap();
//! assert_eq!(caffeine.heavy_atom_count, 14);
//! assert_eq!(caffeine.num_aromatic_rings, 2);  // fused imidazole + pyrimidine
//! assert_eq!(caffeine.num_heteroatoms, 6);     // 4N + 2O
//! assert_eq!(caffeine.num_rotatable_bonds, 0); // rigid
//! ```

use super::{hybridization, DescriptorError, Hybridization, MolContext};
use crate::molecule::{BondOrder, Molecule};
use crate::ring::ring_bond_indices;
use crate::smiles::parse_smiles;

/// Container for the core constitutional descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstitutionalDescriptors {
    /// Number of non-hydrogen atoms (C, N, O, S, etc.)
    pub heavy_atom_count: usize,
    /// Number of rotatable single bonds (not in rings, not terminal)
    pub num_rotatable_bonds: usize,
    /// Number of aromatic rings
    pub num_aromatic_rings: usize,
    /// Number of heteroatoms (any atom that is not C or H)
    pub num_heteroatoms: usize,
    /// Hydrogen bond donors
    pub num_h_donors: usize,
    /// Hydrogen bond acceptors
    pub num_h_acceptors: usize,
}

/// Compute the core constitutional descriptors from a SMILES string.
///
/// # Errors
///
/// Returns [`DescriptorError::InvalidSmiles`] if the SMILES cannot be parsed.
///
/// # Examples
///
/// ```
/// use stack_tox::constitutional_descriptors;
///
/// let desc = constitutional_descriptors("CC(=O)OC1=CC=CC=C1C(=O)O").unwrap(); // aspirin
/// assert_eq!(desc.heavy_atom_count, 13);
/// assert_eq!(desc.num_rotatable_bonds, 3);
/// assert_eq!(desc.num_aromatic_rings, 1);
/// assert_eq!(desc.num_heteroatoms, 4);         // 4 × O
/// ```
pub fn constitutional_descriptors(
    smiles: &str,
) -> Result<ConstitutionalDescriptors, DescriptorError> {
    let mol = parse_smiles(smiles).map_err(|source| DescriptorError::InvalidSmiles {
        smiles: smiles.to_string(),
        source,
    })?;
    let ctx = MolContext::new(&mol);
    Ok(ConstitutionalDescriptors {
        heavy_atom_count: heavy_atom_count(&ctx) as usize,
        num_rotatable_bonds: num_rotatable_bonds(&ctx) as usize,
        num_aromatic_rings: num_aromatic_rings(&ctx) as usize,
        num_heteroatoms: num_heteroatoms(&ctx) as usize,
        num_h_donors: num_h_donors(&ctx) as usize,
        num_h_acceptors: num_h_acceptors(&ctx) as usize,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Atom counts
// ─────────────────────────────────────────────────────────────────────────────
fn count_atoms(ctx: &MolContext<'_>, pred: impl Fn(&Molecule, usize) -> bool) -> f64 {
    let mol = ctx.mol();
    (0..mol.atom_count()).filter(|&a| pred(mol, a)).count() as f64
}

/// Hydrogens bonded to an atom, explicit hydrogen nodes included.
pub(super) fn attached_hydrogens(mol: &Molecule, atom: usize) -> usize {
    usize::from(mol.atoms[atom].hydrogens) + mol.degree(atom) - mol.heavy_degree(atom)
}

/// Localised valence plus attached hydrogens.
fn total_valence(mol: &Molecule, atom: usize) -> usize {
    usize::from(mol.explicit_valence(atom)) + usize::from(mol.atoms[atom].hydrogens)
}

pub(crate) fn heavy_atom_count(ctx: &MolContext<'_>) -> f64 {
    ctx.mol().heavy_atom_count() as f64
}

pub(crate) fn nhoh_count(ctx: &MolContext<'_>) -> f64 {
    let mol = ctx.mol();
    (0..mol.atom_count())
        .filter(|&a| matches!(mol.atoms[a].atomic_number(), 7 | 8))
        .map(|a| attached_hydrogens(mol, a))
        .sum::<usize>() as f64
}

pub(crate) fn no_count(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| matches!(mol.atoms[a].atomic_number(), 7 | 8))
}

pub(crate) fn num_heteroatoms(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| !matches!(mol.atoms[a].atomic_number(), 1 | 6))
}

/// Neighbour doubly bonded, outside a ring, to O, N, P or S.
fn is_amide_like_neighbor(mol: &Molecule, neighbor: usize, rings: &[bool]) -> bool {
    mol.neighbors(neighbor).iter().any(|&(n, bond)| {
        mol.bonds[bond].kekule == BondOrder::Double
            && !rings[bond]
            && matches!(mol.atoms[n].atomic_number(), 7 | 8 | 15 | 16)
    })
}

pub(crate) fn num_h_acceptors(ctx: &MolContext<'_>) -> f64 {
    let rings = &ctx.rings().ring_bonds;
    count_atoms(ctx, |mol, a| {
        let atom = &mol.atoms[a];
        let h = attached_hydrogens(mol, a);
        let valence = total_valence(mol, a);
        match atom.atomic_number() {
            8 | 16 if atom.aromatic => atom.charge == 0,
            8 | 16 if atom.charge < 0 => true,
            8 | 16 if valence == 2 && h == 0 => true,
            8 | 16 if valence == 2 && h == 1 => mol
                .neighbors(a)
                .iter()
                .all(|&(n, _)| mol.atoms[n].is_hydrogen() || !is_amide_like_neighbor(mol, n, rings)),
            7 if atom.aromatic => h == 0 && atom.charge == 0,
            7 => {
                valence == 3
                    && atom.charge == 0
                    && mol
                        .neighbors(a)
                        .iter()
                        .all(|&(n, _)| !is_amide_like_neighbor(mol, n, rings))
            }
            9 => true,
            _ => false,
        }
    })
}

pub(crate) fn num_h_donors(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| {
        let atom = &mol.atoms[a];
        let h = attached_hydrogens(mol, a);
        let valence = total_valence(mol, a);
        match (atom.atomic_number(), atom.charge) {
            (7, 0) if atom.aromatic => h == 1,
            (7, 0) => h > 0 && valence == 3,
            (7, 1) => h > 0 && valence == 4,
            (8 | 16, 0) => h == 1,
            _ => false,
        }
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Bonds
// ─────────────────────────────────────────────────────────────────────────────
pub(crate) fn num_rotatable_bonds(ctx: &MolContext<'_>) -> f64 {
    let mol = ctx.mol();
    let rings = &ctx.rings().ring_bonds;
    let has_triple = |atom: usize| {
        mol.neighbors(atom)
            .iter()
            .any(|&(_, b)| mol.bonds[b].order == BondOrder::Triple)
    };
    mol.bonds
        .iter()
        .enumerate()
        .filter(|&(index, bond)| {
            bond.order == BondOrder::Single
                && !rings[index]
                && [bond.begin, bond.end]
                    .iter()
                    .all(|&a| mol.heavy_degree(a) > 1 && !has_triple(a) && !mol.atoms[a].is_hydrogen())
        })
        .count() as f64
}

// ─────────────────────────────────────────────────────────────────────────────
// Rings
// ─────────────────────────────────────────────────────────────────────────────
#[derive(Clone, Copy, PartialEq, Eq)]
enum RingKind {
    Aromatic,
    Aliphatic,
    Saturated,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RingAtoms {
    Any,
    Carbo,
    Hetero,
}

fn count_rings(ctx: &MolContext<'_>, kind: RingKind, atoms: RingAtoms) -> f64 {
    let mol = ctx.mol();
    ctx.rings()
        .rings
        .iter()
        .filter(|ring| {
            let bonds = ring_bond_indices(mol, ring);
            let aromatic = bonds.iter().all(|&b| mol.bonds[b].is_aromatic());
            let kind_matches = match kind {
                RingKind::Aromatic => aromatic,
                RingKind::Aliphatic => !aromatic,
                RingKind::Saturated => bonds
                    .iter()
                    .all(|&b| mol.bonds[b].order == BondOrder::Single),
            };
            let carbocycle = ring.iter().all(|&a| mol.atoms[a].is_carbon());
            let atoms_match = match atoms {
                RingAtoms::Any => true,
                RingAtoms::Carbo => carbocycle,
                RingAtoms::Hetero => !carbocycle,
            };
            kind_matches && atoms_match
        })
        .count() as f64
}

pub(crate) fn ring_count(ctx: &MolContext<'_>) -> f64 {
    ctx.rings().count() as f64
}

pub(crate) fn num_aromatic_rings(ctx: &MolContext<'_>) -> f64 {
    count_rings(ctx, RingKind::Aromatic, RingAtoms::Any)
}

pub(crate) fn num_aliphatic_rings(ctx: &MolContext<'_>) -> f64 {
    count_rings(ctx, RingKind::Aliphatic, RingAtoms::Any)
}

pub(crate) fn num_saturated_rings(ctx: &MolContext<'_>) -> f64 {
    count_rings(ctx, RingKind::Saturated, RingAtoms::Any)
}

pub(crate) fn num_aromatic_carbocycles(ctx: &MolContext<'_>) -> f64 {
    count_rings(ctx, RingKind::Aromatic, RingAtoms::Carbo)
}

pub(crate) fn num_aromatic_heterocycles(ctx: &MolContext<'_>) -> f64 {
    count_rings(ctx, RingKind::Aromatic, RingAtoms::Hetero)
}

pub(crate) fn num_aliphatic_carbocycles(ctx: &MolContext<'_>) -> f64 {
    count_rings(ctx, RingKind::Aliphatic, RingAtoms::Carbo)
}

pub(crate) fn num_aliphatic_heterocycles(ctx: &MolContext<'_>) -> f64 {
    count_rings(ctx, RingKind::Aliphatic, RingAtoms::Hetero)
}

pub(crate) fn num_saturated_carbocycles(ctx: &MolContext<'_>) -> f64 {
    count_rings(ctx, RingKind::Saturated, RingAtoms::Carbo)
}

pub(crate) fn num_saturated_heterocycles(ctx: &MolContext<'_>) -> f64 {
    count_rings(ctx, RingKind::Saturated, RingAtoms::Hetero)
}

pub(crate) fn fraction_csp3(ctx: &MolContext<'_>) -> f64 {
    let mol = ctx.mol();
    let carbons: Vec<usize> = (0..mol.atom_count())
        .filter(|&a| mol.atoms[a].is_carbon())
        .collect();
    if carbons.is_empty() {
        return 0.0;
    }
    let sp3 = carbons
        .iter()
        .filter(|&&a| hybridization(mol, a) == Hybridization::Sp3)
        .count();
    sp3 as f64 / carbons.len() as f64
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests: real molecules with known values
// ─────────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn with_ctx(smiles: &str, f: fn(&MolContext<'_>) -> f64) -> f64 {
        let mol = parse_smiles(smiles).unwrap();
        f(&MolContext::new(&mol))
    }

    #[test]
    fn benzene() {
        let d = constitutional_descriptors("c1ccccc1").unwrap();
        assert_eq!(d.heavy_atom_count, 6);
        assert_eq!(d.num_aromatic_rings, 1);
        assert_eq!(d.num_heteroatoms, 0);
        assert_eq!(d.num_rotatable_bonds, 0);
    }

    #[test]
    fn ethanol() {
        let d = constitutional_descriptors("CCO").unwrap();
        assert_eq!(d.heavy_atom_count, 3);
        assert_eq!(d.num_rotatable_bonds, 0); // both bonds touch a terminal atom
        assert_eq!(d.num_aromatic_rings, 0);
        assert_eq!(d.num_heteroatoms, 1);
        assert_eq!(d.num_h_donors, 1);
        assert_eq!(d.num_h_acceptors, 1);
    }

    #[test]
    fn aspirin() {
        let d = constitutional_descriptors("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        assert_eq!(d.heavy_atom_count, 13);
        assert_eq!(d.num_rotatable_bonds, 3);
        assert_eq!(d.num_aromatic_rings, 1);
        assert_eq!(d.num_heteroatoms, 4);
        assert_eq!(d.num_h_donors, 1);
        assert_eq!(d.num_h_acceptors, 3);
    }

    #[test]
    fn hexane() {
        let d = constitutional_descriptors("CCCCCC").unwrap();
        assert_eq!(d.heavy_atom_count, 6);
        assert_eq!(d.num_rotatable_bonds, 3);
        assert_eq!(with_ctx("CCCCCC", fraction_csp3), 1.0);
    }

    #[test]
    fn pyridine() {
        let d = constitutional_descriptors("c1ccncc1").unwrap();
        assert_eq!(d.num_aromatic_rings, 1);
        assert_eq!(d.num_heteroatoms, 1);
        assert_eq!(d.num_h_acceptors, 1);
        assert_eq!(with_ctx("c1ccncc1", num_aromatic_heterocycles), 1.0);
        assert_eq!(with_ctx("c1ccncc1", num_aromatic_carbocycles), 0.0);
    }

    #[test]
    fn amide_nitrogen_is_not_an_acceptor() {
        // acetamide: carbonyl O accepts, NH2 donates
        assert_eq!(with_ctx("CC(N)=O", num_h_acceptors), 1.0);
        assert_eq!(with_ctx("CC(N)=O", num_h_donors), 1.0);
        assert_eq!(with_ctx("CC(N)=O", nhoh_count), 2.0);
    }

    #[test]
    fn ring_kinds() {
        // tetralin: one aromatic carbocycle, one aliphatic (not saturated by bonds
        // because the fused bond is aromatic)
        let smiles = "c1ccc2c(c1)CCCC2";
        assert_eq!(with_ctx(smiles, ring_count), 2.0);
        assert_eq!(with_ctx(smiles, num_aromatic_carbocycles), 1.0);
        assert_eq!(with_ctx(smiles, num_aliphatic_carbocycles), 1.0);
        assert_eq!(with_ctx(smiles, num_saturated_rings), 0.0);

        // piperidine
        assert_eq!(with_ctx("C1CCNCC1", num_saturated_heterocycles), 1.0);
        assert_eq!(with_ctx("C1CCNCC1", num_aliphatic_heterocycles), 1.0);
        assert_eq!(with_ctx("C1CCCCC1", num_saturated_carbocycles), 1.0);
    }

    #[test]
    fn fraction_csp3_of_toluene() {
        assert!((with_ctx("Cc1ccccc1", fraction_csp3) - 1.0 / 7.0).abs() < 1e-12);
        assert_eq!(with_ctx("[Na+].[Cl-]", fraction_csp3), 0.0);
    }
}
