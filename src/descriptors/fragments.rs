// src/descriptors/fragments.rs
//! Functional-group counts (`fr_*`).
//!
//! Each function counts occurrences of one substructure directly on the
//! molecular graph. Counts are per anchor atom (or per ring for the ring
//! fragments), so two hydroxyls give `fr_Al_OH = 2`.
//!
//! | Descriptor   | Matches                                              |
//! |--------------|------------------------------------------------------|
//! | fr_halogen   | F, Cl, Br, I                                         |
//! | fr_benzene   | Six-membered aromatic carbocycles                    |
//! | fr_Al_OH     | Hydroxyl on an aliphatic carbon that is not a C=O    |
//! | fr_Ar_OH     | Hydroxyl on an aromatic carbon                       |
//! | fr_ether     | Aliphatic O bonded to two carbons                    |
//! | fr_ketone    | C=O carbon between two carbons                       |
//! | fr_aldehyde  | CH=O carbon on a carbon                              |
//! | fr_COO       | Carboxylic acid or carboxylate on a carbon           |
//! | fr_ester     | C(=O)O with a carbon on the single-bonded oxygen     |
//! | fr_amide     | C(=O)-N                                              |
//! | fr_NH2       | Nitrogen with two hydrogens                          |
//! | fr_NH1       | Nitrogen with one hydrogen                           |
//! | fr_nitro     | NO2 groups (neutral or charge-separated)             |
//! | fr_nitrile   | Terminal N triple-bonded to carbon                   |
//! | fr_C_O       | Carbonyl oxygens                                     |
//! | fr_Ar_N      | Aromatic nitrogens                                   |
//! | fr_pyridine  | Aromatic six-rings with one N and five C             |
//! | fr_SH        | Thiols                                               |
//! | fr_sulfide   | Divalent sulfur without hydrogens                    |
//! | fr_phenol    | Hydroxyl on a benzene-ring carbon                    |
//!
//! ```
//! use stack_tox::descriptors::fragments::fragment_descriptors;
//!
//! let paracetamol = fragment_descriptors("CC(=O)Nc1ccc(O)cc1").unwrap();
//! assert_eq!(paracetamol.amide, 1);
//! assert_eq!(paracetamol.phenol, 1);
//! assert_eq!(paracetamol.benzene, 1);
//! ```

use super::constitutional::attached_hydrogens;
use super::{DescriptorError, MolContext};
use crate::molecule::{BondOrder, Molecule};
use crate::smiles::parse_smiles;

/// Selected functional-group counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FragmentDescriptors {
    /// Halogen atoms
    pub halogen: usize,
    /// Benzene rings
    pub benzene: usize,
    /// Aliphatic hydroxyls
    pub aliphatic_oh: usize,
    /// Phenolic hydroxyls
    pub phenol: usize,
    /// Ether oxygens
    pub ether: usize,
    /// Carboxylic acids
    pub carboxylic_acid: usize,
    /// Esters
    pub ester: usize,
    /// Amides
    pub amide: usize,
    /// Nitro groups
    pub nitro: usize,
    /// Nitriles
    pub nitrile: usize,
}

/// Count the common functional groups of a SMILES string.
///
/// # Errors
///
/// Returns [`DescriptorError::InvalidSmiles`] if the SMILES cannot be parsed.
pub fn fragment_descriptors(smiles: &str) -> Result<FragmentDescriptors, DescriptorError> {
    let mol = parse_smiles(smiles).map_err(|source| DescriptorError::InvalidSmiles {
        smiles: smiles.to_string(),
        source,
    })?;
    let ctx = MolContext::new(&mol);
    let count = |f: fn(&MolContext<'_>) -> f64| f(&ctx) as usize;
    Ok(FragmentDescriptors {
        halogen: count(fr_halogen),
        benzene: count(fr_benzene),
        aliphatic_oh: count(fr_al_oh),
        phenol: count(fr_phenol),
        ether: count(fr_ether),
        carboxylic_acid: count(fr_coo),
        ester: count(fr_ester),
        amide: count(fr_amide),
        nitro: count(fr_nitro),
        nitrile: count(fr_nitrile),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Graph helpers
// ─────────────────────────────────────────────────────────────────────────────
fn count_atoms(ctx: &MolContext<'_>, pred: impl Fn(&Molecule, usize) -> bool) -> f64 {
    let mol = ctx.mol();
    (0..mol.atom_count()).filter(|&a| pred(mol, a)).count() as f64
}

fn element(mol: &Molecule, atom: usize) -> u8 {
    mol.atoms[atom].atomic_number()
}

/// Heavy neighbours of `atom` with the bond order between them.
fn heavy_neighbors(mol: &Molecule, atom: usize) -> impl Iterator<Item = (usize, BondOrder)> + '_ {
    mol.neighbors(atom)
        .iter()
        .filter(move |&&(n, _)| !mol.atoms[n].is_hydrogen())
        .map(move |&(n, bond)| (n, mol.bonds[bond].order))
}

/// Neutral oxygen carrying one hydrogen and a single heavy neighbour.
fn is_hydroxyl(mol: &Molecule, atom: usize) -> bool {
    element(mol, atom) == 8
        && mol.atoms[atom].charge == 0
        && attached_hydrogens(mol, atom) == 1
        && mol.heavy_degree(atom) == 1
}

/// Terminal oxygen double-bonded to `atom`.
fn has_carbonyl_oxygen(mol: &Molecule, atom: usize) -> bool {
    heavy_neighbors(mol, atom).any(|(n, order)| {
        order == BondOrder::Double && element(mol, n) == 8 && mol.heavy_degree(n) == 1
    })
}

/// Non-aromatic carbon with exactly three connections carrying a C=O.
fn is_carbonyl_carbon(mol: &Molecule, atom: usize) -> bool {
    let a = &mol.atoms[atom];
    a.is_carbon()
        && !a.aromatic
        && mol.degree(atom) + usize::from(a.hydrogens) == 3
        && has_carbonyl_oxygen(mol, atom)
}

/// Single-bonded heavy neighbours of a carbonyl carbon, carbonyl O excluded.
fn carbonyl_substituents(mol: &Molecule, atom: usize) -> Vec<usize> {
    heavy_neighbors(mol, atom)
        .filter(|&(_, order)| order != BondOrder::Double)
        .map(|(n, _)| n)
        .collect()
}

/// SSSR rings of six aromatic atoms with the given nitrogen count, rest carbon.
fn aromatic_six_rings<'c>(ctx: &'c MolContext<'_>, nitrogens: usize) -> Vec<&'c [usize]> {
    let mol = ctx.mol();
    ctx.rings()
        .rings
        .iter()
        .filter(|ring| {
            ring.len() == 6
                && ring.iter().all(|&a| mol.atoms[a].aromatic)
                && ring.iter().filter(|&&a| element(mol, a) == 7).count() == nitrogens
                && ring.iter().filter(|&&a| element(mol, a) == 6).count() == 6 - nitrogens
        })
        .map(Vec::as_slice)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Atom fragments
// ─────────────────────────────────────────────────────────────────────────────
pub(crate) fn fr_halogen(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| matches!(element(mol, a), 9 | 17 | 35 | 53))
}

pub(crate) fn fr_ar_n(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| element(mol, a) == 7 && mol.atoms[a].aromatic)
}

pub(crate) fn fr_nh2(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| element(mol, a) == 7 && attached_hydrogens(mol, a) == 2)
}

pub(crate) fn fr_nh1(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| element(mol, a) == 7 && attached_hydrogens(mol, a) == 1)
}

pub(crate) fn fr_sh(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| element(mol, a) == 16 && attached_hydrogens(mol, a) > 0)
}

pub(crate) fn fr_sulfide(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| {
        element(mol, a) == 16 && mol.degree(a) == 2 && attached_hydrogens(mol, a) == 0
    })
}

pub(crate) fn fr_c_o(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| {
        element(mol, a) == 8
            && mol.heavy_degree(a) == 1
            && heavy_neighbors(mol, a).any(|(n, order)| {
                order == BondOrder::Double
                    && mol.atoms[n].is_carbon()
                    && mol.degree(n) + usize::from(mol.atoms[n].hydrogens) == 3
            })
    })
}

pub(crate) fn fr_nitrile(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| {
        element(mol, a) == 7
            && mol.degree(a) == 1
            && heavy_neighbors(mol, a)
                .any(|(n, order)| order == BondOrder::Triple && mol.atoms[n].is_carbon())
    })
}

pub(crate) fn fr_nitro(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| {
        if element(mol, a) != 7 || mol.atoms[a].aromatic {
            return false;
        }
        let mut double_o = 0;
        let mut anionic_o = 0;
        let mut other = 0;
        for (n, order) in heavy_neighbors(mol, a) {
            let terminal_o = element(mol, n) == 8 && mol.heavy_degree(n) == 1;
            match order {
                BondOrder::Double if terminal_o => double_o += 1,
                BondOrder::Single if terminal_o && mol.atoms[n].charge == -1 => anionic_o += 1,
                _ => other += 1,
            }
        }
        other == 1 && double_o >= 1 && double_o + anionic_o == 2
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Oxygen fragments
// ─────────────────────────────────────────────────────────────────────────────
pub(crate) fn fr_al_oh(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| {
        is_hydroxyl(mol, a)
            && heavy_neighbors(mol, a).any(|(c, _)| {
                mol.atoms[c].is_carbon() && !mol.atoms[c].aromatic && !has_carbonyl_oxygen(mol, c)
            })
    })
}

pub(crate) fn fr_ar_oh(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| {
        is_hydroxyl(mol, a)
            && heavy_neighbors(mol, a).any(|(c, _)| mol.atoms[c].is_carbon() && mol.atoms[c].aromatic)
    })
}

pub(crate) fn fr_phenol(ctx: &MolContext<'_>) -> f64 {
    let mol = ctx.mol();
    let benzene_atoms: Vec<usize> = aromatic_six_rings(ctx, 0).into_iter().flatten().copied().collect();
    (0..mol.atom_count())
        .filter(|&a| {
            is_hydroxyl(mol, a)
                && heavy_neighbors(mol, a).any(|(c, _)| benzene_atoms.contains(&c))
        })
        .count() as f64
}

pub(crate) fn fr_ether(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| {
        element(mol, a) == 8
            && !mol.atoms[a].aromatic
            && mol.degree(a) == 2
            && heavy_neighbors(mol, a).filter(|(n, _)| mol.atoms[*n].is_carbon()).count() == 2
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Carbonyl fragments
// ─────────────────────────────────────────────────────────────────────────────
pub(crate) fn fr_ketone(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| {
        is_carbonyl_carbon(mol, a) && {
            let subs = carbonyl_substituents(mol, a);
            subs.len() == 2 && subs.iter().all(|&n| mol.atoms[n].is_carbon())
        }
    })
}

pub(crate) fn fr_aldehyde(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| {
        is_carbonyl_carbon(mol, a) && attached_hydrogens(mol, a) == 1 && {
            let subs = carbonyl_substituents(mol, a);
            subs.len() == 1 && mol.atoms[subs[0]].is_carbon()
        }
    })
}

pub(crate) fn fr_coo(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| {
        if !is_carbonyl_carbon(mol, a) {
            return false;
        }
        let subs = carbonyl_substituents(mol, a);
        let acid_o = |o: usize| {
            element(mol, o) == 8
                && mol.heavy_degree(o) == 1
                && ((mol.atoms[o].charge == 0 && attached_hydrogens(mol, o) == 1)
                    || mol.atoms[o].charge == -1)
        };
        subs.iter().any(|&n| mol.atoms[n].is_carbon()) && subs.iter().any(|&n| acid_o(n))
    })
}

pub(crate) fn fr_ester(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| {
        if !is_carbonyl_carbon(mol, a) {
            return false;
        }
        let subs = carbonyl_substituents(mol, a);
        let ester_o = |o: usize| {
            element(mol, o) == 8
                && mol.degree(o) == 2
                && attached_hydrogens(mol, o) == 0
                && heavy_neighbors(mol, o).any(|(c, _)| c != a && mol.atoms[c].is_carbon())
        };
        subs.iter().any(|&n| mol.atoms[n].is_carbon()) && subs.iter().any(|&n| ester_o(n))
    })
}

pub(crate) fn fr_amide(ctx: &MolContext<'_>) -> f64 {
    count_atoms(ctx, |mol, a| {
        is_carbonyl_carbon(mol, a)
            && carbonyl_substituents(mol, a)
                .iter()
                .any(|&n| element(mol, n) == 7 && !mol.atoms[n].aromatic)
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Ring fragments
// ─────────────────────────────────────────────────────────────────────────────
pub(crate) fn fr_benzene(ctx: &MolContext<'_>) -> f64 {
    aromatic_six_rings(ctx, 0).len() as f64
}

pub(crate) fn fr_pyridine(ctx: &MolContext<'_>) -> f64 {
    aromatic_six_rings(ctx, 1).len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(smiles: &str, f: fn(&MolContext<'_>) -> f64) -> f64 {
        let mol = parse_smiles(smiles).unwrap();
        f(&MolContext::new(&mol))
    }

    #[test]
    fn halogens_and_aromatic_nitrogen() {
        assert_eq!(count("FC(Cl)(Br)I", fr_halogen), 4.0);
        assert_eq!(count("c1ccncc1", fr_ar_n), 1.0);
        assert_eq!(count("c1ccncc1", fr_pyridine), 1.0);
        assert_eq!(count("c1ccncc1", fr_benzene), 0.0);
        assert_eq!(count("c1ccc2ccccc2c1", fr_benzene), 2.0);
    }

    #[test]
    fn hydroxyl_classes() {
        assert_eq!(count("CCO", fr_al_oh), 1.0);
        assert_eq!(count("CCO", fr_ar_oh), 0.0);
        assert_eq!(count("Oc1ccccc1", fr_ar_oh), 1.0);
        assert_eq!(count("Oc1ccccc1", fr_phenol), 1.0);
        assert_eq!(count("Oc1ccccc1", fr_al_oh), 0.0);
        // the acid OH is not an alcohol
        assert_eq!(count("CC(=O)O", fr_al_oh), 0.0);
    }

    #[test]
    fn carbonyl_classes() {
        assert_eq!(count("CC(=O)C", fr_ketone), 1.0);
        assert_eq!(count("CC=O", fr_aldehyde), 1.0);
        assert_eq!(count("CC=O", fr_ketone), 0.0);
        assert_eq!(count("CC(=O)O", fr_coo), 1.0);
        assert_eq!(count("CC(=O)[O-]", fr_coo), 1.0);
        assert_eq!(count("CC(=O)OC", fr_ester), 1.0);
        assert_eq!(count("CC(=O)OC", fr_coo), 0.0);
        assert_eq!(count("CC(=O)N", fr_amide), 1.0);
        assert_eq!(count("CC(=O)OC(C)=O", fr_c_o), 2.0);
    }

    #[test]
    fn ethers_include_ester_oxygen() {
        assert_eq!(count("COC", fr_ether), 1.0);
        assert_eq!(count("CC(=O)OC", fr_ether), 1.0);
        assert_eq!(count("c1ccoc1", fr_ether), 0.0);
    }

    #[test]
    fn nitrogen_groups() {
        assert_eq!(count("CN", fr_nh2), 1.0);
        assert_eq!(count("CNC", fr_nh1), 1.0);
        assert_eq!(count("c1cc[nH]c1", fr_nh1), 1.0);
        assert_eq!(count("CC#N", fr_nitrile), 1.0);
        assert_eq!(count("C[N+](=O)[O-]", fr_nitro), 1.0);
        assert_eq!(count("CN=O", fr_nitro), 0.0);
    }

    #[test]
    fn sulfur_groups() {
        assert_eq!(count("CS", fr_sh), 1.0);
        assert_eq!(count("CSC", fr_sulfide), 1.0);
        assert_eq!(count("CS", fr_sulfide), 0.0);
    }

    #[test]
    fn aspirin_summary() {
        let d = fragment_descriptors("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        assert_eq!(d.benzene, 1);
        assert_eq!(d.ester, 1);
        assert_eq!(d.carboxylic_acid, 1);
        assert_eq!(d.phenol, 0);
        assert_eq!(d.halogen, 0);
    }
}
