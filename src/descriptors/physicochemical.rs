// src/descriptors/physicochemical.rs
//! Physicochemical descriptors commonly used in QSAR.
//!
//! | Descriptor            | Meaning                                                    |
//! |-----------------------|------------------------------------------------------------|
//! | MolWt                 | Average molecular weight, hydrogens included (Da)          |
//! | HeavyAtomMolWt        | Average molecular weight ignoring hydrogens (Da)           |
//! | ExactMolWt            | Monoisotopic mass (Da)                                     |
//! | MolLogP / MolMR       | Wildman-Crippen atom-contribution LogP and molar refractivity |
//! | TPSA                  | Ertl topological polar surface area, N and O only (Å²)     |
//! | LabuteASA             | Labute approximate surface area (Å²)                       |
//! | NumValenceElectrons   | Valence electrons, hydrogens included                      |
//! | NumRadicalElectrons   | Unpaired electrons                                         |
//! | Max/Min(Abs)PartialCharge | Extremes of the Gasteiger-Marsili heavy-atom charges   |
//!
//! # Example
//!
//! ```
//! use stack_tox::descriptors::physicochemical::physchem_descriptors;
//!
//! let desc = physchem_descriptors("CCO").unwrap(); // ethanol
//! assert!((desc.mol_wt - 46.069).abs() < 0.01);
//! assert!((desc.tpsa - 20.23).abs() < 1e-6);
//! assert!(desc.max_partial_charge > 0.0);
//! ```

use std::f64::consts::PI;

use super::{hybridization, DescriptorError, Hybridization, MolContext};
use crate::molecule::{Atom, BondOrder, Molecule};
use crate::smiles::parse_smiles;

const HYDROGEN_AVERAGE_MASS: f64 = 1.008;
const HYDROGEN_EXACT_MASS: f64 = 1.00782503223;
const HYDROGEN_BOND_RADIUS: f64 = 0.33;

/// Container for the physicochemical descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysChemDescriptors {
    /// Molecular weight (Daltons)
    pub mol_wt: f64,
    /// Monoisotopic mass (Daltons)
    pub exact_mol_wt: f64,
    /// Wildman-Crippen LogP
    pub mol_log_p: f64,
    /// Wildman-Crippen molar refractivity
    pub mol_mr: f64,
    /// Topological Polar Surface Area (Å²)
    pub tpsa: f64,
    /// Labute approximate surface area (Å²)
    pub labute_asa: f64,
    /// Largest Gasteiger partial charge
    pub max_partial_charge: f64,
    /// Smallest Gasteiger partial charge
    pub min_partial_charge: f64,
}

/// Compute the physicochemical descriptors from a SMILES string.
///
/// # Errors
///
/// Returns [`DescriptorError::InvalidSmiles`] if the SMILES does not parse.
pub fn physchem_descriptors(smiles: &str) -> Result<PhysChemDescriptors, DescriptorError> {
    let mol = parse_smiles(smiles).map_err(|source| DescriptorError::InvalidSmiles {
        smiles: smiles.to_string(),
        source,
    })?;
    let ctx = MolContext::new(&mol);
    Ok(PhysChemDescriptors {
        mol_wt: mol_wt(&ctx),
        exact_mol_wt: exact_mol_wt(&ctx),
        mol_log_p: mol_log_p(&ctx),
        mol_mr: mol_mr(&ctx),
        tpsa: tpsa(&ctx),
        labute_asa: labute_asa(&ctx),
        max_partial_charge: max_partial_charge(&ctx),
        min_partial_charge: min_partial_charge(&ctx),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Masses and electron counts
// ─────────────────────────────────────────────────────────────────────────────
pub(crate) fn mol_wt(ctx: &MolContext<'_>) -> f64 {
    ctx.mol()
        .atoms
        .iter()
        .map(|a| {
            let own = a.isotope.map_or(a.element.average_mass, f64::from);
            own + f64::from(a.hydrogens) * HYDROGEN_AVERAGE_MASS
        })
        .sum()
}

pub(crate) fn heavy_atom_mol_wt(ctx: &MolContext<'_>) -> f64 {
    ctx.mol()
        .atoms
        .iter()
        .filter(|a| !a.is_hydrogen())
        .map(|a| a.isotope.map_or(a.element.average_mass, f64::from))
        .sum()
}

pub(crate) fn exact_mol_wt(ctx: &MolContext<'_>) -> f64 {
    ctx.mol()
        .atoms
        .iter()
        .map(|a| {
            let own = a.isotope.map_or(a.element.monoisotopic_mass, f64::from);
            own + f64::from(a.hydrogens) * HYDROGEN_EXACT_MASS
        })
        .sum()
}

pub(crate) fn num_valence_electrons(ctx: &MolContext<'_>) -> f64 {
    ctx.mol()
        .atoms
        .iter()
        .map(|a| i32::from(a.element.outer_electrons) - i32::from(a.charge) + i32::from(a.hydrogens))
        .sum::<i32>() as f64
}

pub(crate) fn num_radical_electrons(ctx: &MolContext<'_>) -> f64 {
    ctx.mol()
        .atoms
        .iter()
        .map(|a| f64::from(a.radical_electrons))
        .sum()
}

// ─────────────────────────────────────────────────────────────────────────────
// Wildman-Crippen LogP and MR
// ─────────────────────────────────────────────────────────────────────────────

/// Wildman-Crippen `(logP, MR)` pair.
type Crippen = (f64, f64);

const H_HYDROCARBON: Crippen = (0.1230, 1.057);
const H_ALCOHOL: Crippen = (-0.2677, 1.395);
const H_AMINE: Crippen = (0.2142, 0.9627);
const H_ACID: Crippen = (0.2980, 1.805);
const H_OTHER: Crippen = (0.1125, 1.112);

/// A heavy neighbour as the atom-type rules see it.
#[derive(Debug, Clone, Copy)]
struct Arm {
    atom: usize,
    z: u8,
    aromatic: bool,
    order: BondOrder,
}

impl Arm {
    /// Single or aromatic bond, the default bond of an atom-type pattern.
    fn plain(&self) -> bool {
        matches!(self.order, BondOrder::Single | BondOrder::Aromatic)
    }

    fn aliphatic(&self) -> bool {
        !self.aromatic && self.plain()
    }

    fn ring(&self) -> bool {
        self.aromatic && self.plain()
    }

    /// Aliphatic N, O, P, S or halogen.
    fn polar(&self) -> bool {
        !self.aromatic && matches!(self.z, 7 | 8 | 9 | 15 | 16 | 17 | 35 | 53)
    }

    fn double(&self) -> bool {
        self.order == BondOrder::Double
    }
}

fn heavy_arms(mol: &Molecule, atom: usize) -> Vec<Arm> {
    mol.neighbors(atom)
        .iter()
        .filter(|&&(n, _)| !mol.atoms[n].is_hydrogen())
        .map(|&(n, bond)| Arm {
            atom: n,
            z: mol.atoms[n].atomic_number(),
            aromatic: mol.atoms[n].aromatic,
            order: mol.bonds[bond].order,
        })
        .collect()
}

/// Two distinct arms, one satisfying `first` and the other `second`.
fn pair(arms: &[Arm], first: impl Fn(&Arm) -> bool, second: impl Fn(&Arm) -> bool) -> bool {
    arms.iter().enumerate().any(|(i, a)| {
        first(a) && arms.iter().enumerate().any(|(j, b)| i != j && second(b))
    })
}

/// Implicit plus explicit hydrogens on one atom.
fn hydrogen_count(mol: &Molecule, atom: usize) -> usize {
    usize::from(mol.atoms[atom].hydrogens) + mol.degree(atom) - mol.heavy_degree(atom)
}

/// Type of a hydrogen attached to `atom`.
fn hydrogen_type(mol: &Molecule, atom: usize) -> Crippen {
    match mol.atoms[atom].atomic_number() {
        1 | 6 => H_HYDROCARBON,
        7 => H_AMINE,
        8 => {
            // water counts as an alcohol
            let Some(r) = heavy_arms(mol, atom).first().copied() else {
                return H_ALCOHOL;
            };
            let sp3 = mol.heavy_degree(r.atom) + hydrogen_count(mol, r.atom) == 4;
            let unsaturated = heavy_arms(mol, r.atom)
                .iter()
                .any(|s| s.double() && matches!(s.z, 6 | 7 | 8 | 16));
            match r.z {
                6 if r.aromatic || sp3 => H_ALCOHOL,
                6 if unsaturated => H_ACID,
                6 => H_OTHER,
                7 => H_AMINE,
                8 | 16 => H_ACID,
                _ => H_ALCOHOL,
            }
        }
        _ => H_ALCOHOL,
    }
}

fn aliphatic_carbon_type(h: usize, arms: &[Arm]) -> Crippen {
    let x = arms.len() + h;
    let carbon = |r: &Arm| r.z == 6 && r.aliphatic();

    match (h, arms.len()) {
        (4, 0) => return (0.1441, 2.503),
        (3, 1) | (2, 2) if arms.iter().all(carbon) => return (0.1441, 2.503),
        (1, 3) | (0, 4) if arms.iter().all(carbon) => return (0.0, 2.433),
        _ => {}
    }
    if arms.iter().any(Arm::polar) && arms.iter().all(Arm::aliphatic) {
        match (h, x) {
            (3, _) | (2, 4) => return (-0.2035, 2.753),
            (1 | 0, 4) => return (-0.2051, 2.731),
            _ => {}
        }
    }
    if arms.iter().any(|r| r.double() && !r.aromatic && r.z != 6) {
        return (-0.2783, 5.007);
    }

    let vinyl = arms.iter().filter(|r| r.double() && !r.aromatic && r.z == 6).count();
    let substituents: Vec<&Arm> = arms.iter().filter(|r| !r.double()).collect();
    let aliphatic_substituents =
        !substituents.is_empty() && substituents.iter().all(|r| r.aliphatic());
    if vinyl > 0 && (h == 2 || vinyl == 2 || aliphatic_substituents) {
        return (0.1551, 3.513);
    }
    if x == 2 && arms.iter().any(|r| r.order == BondOrder::Triple && !r.aromatic) {
        return (0.0017, 3.888);
    }
    if let Some(ring) = arms.iter().find(|r| r.ring()) {
        match (h, x) {
            (3, _) if ring.z == 6 => return (0.08452, 2.464),
            (3, _) => return (-0.1444, 2.412),
            (2, 4) => return (-0.0516, 2.488),
            (1, 4) => return (0.1193, 2.582),
            (0, 4) => return (-0.0967, 2.576),
            _ => {}
        }
    }
    let styrene = vinyl > 0 && arms.iter().any(Arm::ring);
    if styrene || arms.iter().any(|r| r.double() && r.aromatic && r.z == 6) {
        return (0.264, 4.305);
    }
    if x == 4 && arms.iter().any(|r| !r.aromatic && !r.polar() && r.z != 6) {
        return (0.2148, 2.693);
    }
    (0.08129, 3.243)
}

fn aromatic_carbon_type(h: usize, arms: &[Arm]) -> Crippen {
    let exotic = |r: &Arm| {
        r.order == BondOrder::Single
            && !r.aromatic
            && !matches!(r.z, 6 | 7 | 8 | 9 | 16 | 17 | 35 | 53)
    };
    if h == 0 && arms.iter().any(exotic) {
        return (-0.5443, 4.041);
    }
    for r in arms.iter().filter(|r| r.plain()) {
        match r.z {
            9 => return (0.0, 3.257),
            17 => return (0.245, 3.564),
            35 => return (0.198, 3.18),
            53 => return (0.0, 3.104),
            _ => {}
        }
    }
    if h > 0 {
        return (0.1581, 3.35);
    }

    let in_ring = arms.iter().filter(|r| r.order == BondOrder::Aromatic).count();
    if in_ring >= 3 {
        return (0.2955, 4.346);
    }
    if in_ring == 2 {
        for r in arms.iter().filter(|r| r.order != BondOrder::Aromatic) {
            match (r.order, r.aromatic, r.z) {
                (BondOrder::Single, true, _) => return (0.2713, 3.904),
                (BondOrder::Single, false, 6) => return (0.136, 3.509),
                (BondOrder::Single, false, 7) => return (0.4619, 3.067),
                (BondOrder::Single, false, 8) => return (0.5437, 3.853),
                (BondOrder::Single, false, 16) => return (0.1893, 2.673),
                (BondOrder::Double, false, 6 | 7 | 8) => return (-0.8186, 3.135),
                _ => {}
            }
        }
    }
    (0.08129, 3.243)
}

fn nitrogen_type(atom: &Atom, h: usize, arms: &[Arm]) -> Crippen {
    const N_OTHER: Crippen = (-0.4806, 2.134);

    if atom.aromatic {
        return match atom.charge {
            0 => (-0.3239, 2.202),
            1.. => (-1.119, 0.0),
            _ => N_OTHER,
        };
    }
    let aliphatic = arms.iter().filter(|r| r.aliphatic()).count();
    let ring = arms.iter().filter(|r| r.ring()).count();
    let plain = aliphatic + ring;
    let double = arms.iter().any(Arm::double);
    let triple = arms
        .iter()
        .any(|r| r.order == BondOrder::Triple && !r.aromatic);

    match atom.charge {
        0 => match h {
            2 if aliphatic > 0 => (-1.019, 2.262),
            1 if aliphatic >= 2 => (-0.7096, 2.173),
            2 if ring > 0 => (-1.027, 2.827),
            1 if ring > 0 && plain >= 2 => (-0.5188, 3.0),
            1 if double => (0.08387, 1.757),
            _ if double && plain > 0 => (0.1836, 2.428),
            _ if aliphatic >= 3 => (-0.3187, 1.839),
            _ if ring > 0 && plain >= 3 => (-0.4458, 2.819),
            _ if triple => (0.01508, 1.725),
            _ => N_OTHER,
        },
        1.. => {
            let quaternary = aliphatic >= 4;
            let nitro =
                arms.len() >= 3 && pair(arms, |r| r.double() && !r.aromatic, Arm::aliphatic);
            let cumulated = arms.iter().any(|r| r.double() && r.z == 6)
                && arms.iter().any(|r| r.double() && r.z == 7);
            let azide = arms.iter().filter(|r| r.double() && r.z == 7).count() == 2;
            match h {
                1..=3 => (-1.950, 0.0),
                0 if quaternary || nitro || cumulated => (-0.3396, 0.2604),
                _ if triple || azide => (0.2887, 3.359),
                _ => N_OTHER,
            }
        }
        _ => (0.2887, 3.359),
    }
}

fn carbonyl_oxygen_type(mol: &Molecule, carbon: usize, oxygen: usize) -> Crippen {
    let others: Vec<Arm> = heavy_arms(mol, carbon)
        .into_iter()
        .filter(|r| r.atom != oxygen)
        .collect();
    let h = hydrogen_count(mol, carbon);
    let aliphatic_carbon = |r: &Arm| r.z == 6 && r.aliphatic();
    let any_carbon = |r: &Arm| r.z == 6 && r.plain();
    let hetero = |r: &Arm| r.z != 6 && r.plain();

    let aliphatic_carbonyl = match h {
        2 => true,
        1 => others
            .iter()
            .any(|r| aliphatic_carbon(r) || (matches!(r.z, 7 | 8) && r.aliphatic())),
        _ => pair(&others, aliphatic_carbon, Arm::aliphatic),
    };
    let carbon_dioxide = h == 0 && others.len() == 1 && others[0].double() && others[0].z == 8;
    if aliphatic_carbonyl || carbon_dioxide {
        return (-0.1526, 0.0);
    }
    let aromatic_carbonyl = match h {
        1 => others.iter().any(|r| r.z == 6 && r.ring()),
        0 => {
            pair(&others, any_carbon, Arm::ring)
                || pair(&others, |r| r.z == 6 && r.ring(), Arm::aliphatic)
        }
        _ => false,
    };
    if aromatic_carbonyl {
        return (0.1129, 0.2215);
    }
    if h == 0 && pair(&others, hetero, hetero) {
        return (0.4833, 0.389);
    }
    (-0.1188, 0.6865)
}

fn oxygen_type(mol: &Molecule, atom: usize, h: usize, arms: &[Arm]) -> Crippen {
    const O_OTHER: Crippen = (-0.1188, 0.6865);

    let a = &mol.atoms[atom];
    if a.aromatic {
        return (0.1552, 1.08);
    }
    if h > 0 {
        return (-0.2893, 0.8238);
    }
    if arms.iter().filter(|r| r.plain()).count() >= 2 {
        return if arms.iter().filter(|r| r.aliphatic()).count() >= 2 {
            (-0.0684, 1.085)
        } else {
            (-0.4195, 1.182)
        };
    }
    let double = arms.iter().find(|r| r.double()).copied();
    match double.map(|d| d.z) {
        Some(7 | 8) => return (0.0335, 3.367),
        Some(16) => return (-0.3339, 0.7774),
        _ => {}
    }
    if let [only] = arms {
        if a.charge < 0 {
            match only.z {
                7 => return (0.0335, 3.367),
                16 => return (-0.3339, 0.7774),
                6 => {}
                _ => return (-1.189, 0.0),
            }
        }
    }
    if let Some(carbonyl) = double.filter(|d| d.z == 6) {
        if carbonyl.aromatic {
            return (0.1788, 3.135);
        }
        return carbonyl_oxygen_type(mol, carbonyl.atom, atom);
    }
    if let [only] = arms {
        let carboxylate = only.z == 6
            && !only.aromatic
            && heavy_arms(mol, only.atom)
                .iter()
                .any(|r| r.double() && r.z == 8);
        if a.charge < 0 && carboxylate {
            return (-1.326, 0.0);
        }
    }
    O_OTHER
}

/// Contribution of a heavy atom, its hydrogens excluded.
fn heavy_atom_type(mol: &Molecule, atom: usize) -> Crippen {
    let a = &mol.atoms[atom];
    let h = hydrogen_count(mol, atom);
    let arms = heavy_arms(mol, atom);
    match a.atomic_number() {
        6 if a.aromatic => aromatic_carbon_type(h, &arms),
        6 => aliphatic_carbon_type(h, &arms),
        7 => nitrogen_type(a, h, &arms),
        8 => oxygen_type(mol, atom, h, &arms),
        9 | 17 | 35 | 53 if a.charge < 0 => (-2.996, 0.0),
        9 => (0.4202, 1.108),
        17 => (0.6895, 5.853),
        35 => (0.8456, 8.927),
        53 => (0.8857, 14.02),
        15 => (0.8612, 6.92),
        16 if a.aromatic => (0.6237, 6.691),
        16 if a.charge != 0 => (-0.0024, 7.365),
        16 => (0.6482, 7.591),
        // main-group metals and metalloids
        3 | 4 | 5 | 11..=14 | 19 | 20 | 31..=34 | 37 | 38 | 49..=52 | 55 | 56 | 81..=84 => {
            (-0.3808, 5.754)
        }
        // transition metals
        21..=30 | 39..=48 | 72..=80 => (-0.0025, 0.0),
        _ => (0.0, 0.0),
    }
}

fn crippen_sum(ctx: &MolContext<'_>) -> (f64, f64) {
    let mol = ctx.mol();
    (0..mol.atom_count()).fold((0.0, 0.0), |(logp, mr), atom| {
        let a = &mol.atoms[atom];
        let (a_logp, a_mr) = if a.is_hydrogen() {
            // explicit hydrogens are typed by their neighbour
            mol.neighbors(atom)
                .first()
                .map_or(H_OTHER, |&(n, _)| hydrogen_type(mol, n))
        } else {
            heavy_atom_type(mol, atom)
        };
        let (h_logp, h_mr) = hydrogen_type(mol, atom);
        let h = f64::from(a.hydrogens);
        (logp + a_logp + h * h_logp, mr + a_mr + h * h_mr)
    })
}

pub(crate) fn mol_log_p(ctx: &MolContext<'_>) -> f64 {
    crippen_sum(ctx).0
}

pub(crate) fn mol_mr(ctx: &MolContext<'_>) -> f64 {
    crippen_sum(ctx).1
}

// ─────────────────────────────────────────────────────────────────────────────
// Ertl TPSA
// ─────────────────────────────────────────────────────────────────────────────
fn tpsa_contribution(ctx: &MolContext<'_>, atom: usize) -> f64 {
    let mol = ctx.mol();
    let a = &mol.atoms[atom];
    let mut singles = 0;
    let mut doubles = 0;
    let mut triples = 0;
    let mut aromatic = 0;
    for &(n, bond) in mol.neighbors(atom) {
        if mol.atoms[n].is_hydrogen() {
            continue;
        }
        match mol.bonds[bond].order {
            BondOrder::Single => singles += 1,
            BondOrder::Double => doubles += 1,
            BondOrder::Triple => triples += 1,
            BondOrder::Aromatic => aromatic += 1,
        }
    }
    let h = a.hydrogens + mol.degree(atom) as u8 - mol.heavy_degree(atom) as u8;
    let in_three_ring = ctx
        .rings()
        .rings
        .iter()
        .any(|r| r.len() == 3 && r.contains(&atom));

    match (a.atomic_number(), a.charge) {
        (7, 0) => match (singles, doubles, triples, aromatic, h) {
            (3, 0, 0, 0, 0) if in_three_ring => 3.01,
            (3, 0, 0, 0, 0) => 3.24,
            (1, 1, 0, 0, 0) => 12.36,
            (0, 0, 1, 0, 0) => 23.79,
            (1, 2, 0, 0, 0) => 11.68,
            (0, 1, 1, 0, 0) => 13.60,
            (2, 0, 0, 0, 1) if in_three_ring => 21.94,
            (2, 0, 0, 0, 1) => 12.03,
            (0, 1, 0, 0, 1) => 23.85,
            (1, 0, 0, 0, 2) => 26.02,
            (0, 0, 0, 0, 3) => 26.02,
            (0, 0, 0, 2, 0) => 12.89,
            (0, 0, 0, 3, 0) => 4.41,
            (1, 0, 0, 2, 0) => 4.93,
            (0, 1, 0, 2, 0) => 8.39,
            (0, 0, 0, 2, 1) => 15.79,
            _ => 0.0,
        },
        (7, 1) => match (singles, doubles, triples, aromatic, h) {
            (4, 0, 0, 0, 0) => 0.0,
            (2, 1, 0, 0, 0) => 3.01,
            (1, 0, 1, 0, 0) => 4.36,
            (0, 1, 1, 0, 0) => 13.97,
            (3, 0, 0, 0, 1) => 4.44,
            (1, 1, 0, 0, 1) => 13.97,
            (2, 0, 0, 0, 2) => 16.61,
            (0, 1, 0, 0, 2) => 25.59,
            (1, 0, 0, 0, 3) => 27.64,
            (0, 0, 0, 3, 0) => 4.10,
            (1, 0, 0, 2, 0) => 3.88,
            (0, 0, 0, 2, 1) => 14.14,
            _ => 0.0,
        },
        (7, -1) if singles + doubles + triples + aromatic == 1 => 9.81,
        (8, 0) => match (singles, doubles, aromatic, h) {
            (2, 0, 0, 0) if in_three_ring => 12.53,
            (2, 0, 0, 0) => 9.23,
            (0, 1, 0, 0) => 17.07,
            (1, 0, 0, 1) => 20.23,
            (0, 0, 0, 2) => 20.23,
            (0, 0, 2, 0) => 13.14,
            _ => 0.0,
        },
        (8, -1) if singles == 1 => 23.06,
        _ => 0.0,
    }
}

pub(crate) fn tpsa(ctx: &MolContext<'_>) -> f64 {
    (0..ctx.mol().atom_count())
        .map(|atom| tpsa_contribution(ctx, atom))
        .sum()
}

// ─────────────────────────────────────────────────────────────────────────────
// Labute approximate surface area
// ─────────────────────────────────────────────────────────────────────────────
/// Overlap term of sphere `ri` with a bonded sphere `rj`.
fn labute_overlap(ri: f64, rj: f64, order: BondOrder) -> f64 {
    let shortening = match order {
        BondOrder::Single => 0.0,
        BondOrder::Aromatic => 0.1,
        BondOrder::Double => 0.2,
        BondOrder::Triple => 0.3,
    };
    let bij = ri + rj - shortening;
    let dij = bij.max((ri - rj).abs()).min(ri + rj);
    rj * rj - (ri - dij) * (ri - dij) / dij
}

pub(crate) fn labute_asa(ctx: &MolContext<'_>) -> f64 {
    let mol = ctx.mol();
    let rh = HYDROGEN_BOND_RADIUS;
    let mut overlap = vec![0.0; mol.atom_count()];
    for bond in &mol.bonds {
        let ri = mol.atoms[bond.begin].element.bond_radius;
        let rj = mol.atoms[bond.end].element.bond_radius;
        overlap[bond.begin] += labute_overlap(ri, rj, bond.order);
        overlap[bond.end] += labute_overlap(rj, ri, bond.order);
    }

    let mut total = 0.0;
    let mut hydrogen_overlap = 0.0;
    let mut hydrogens = 0u32;
    for (atom, a) in mol.atoms.iter().enumerate() {
        let ri = a.element.bond_radius;
        let h = f64::from(a.hydrogens);
        hydrogens += u32::from(a.hydrogens);
        hydrogen_overlap += h * labute_overlap(rh, ri, BondOrder::Single);
        let v = overlap[atom] + h * labute_overlap(ri, rh, BondOrder::Single);
        total += 4.0 * PI * ri * ri - PI * ri * v;
    }
    // implicit hydrogens are folded into a single sphere
    if hydrogens > 0 {
        total += 4.0 * PI * rh * rh - PI * rh * hydrogen_overlap;
    }
    total
}

// ─────────────────────────────────────────────────────────────────────────────
// Gasteiger-Marsili partial charges
// ─────────────────────────────────────────────────────────────────────────────
const GASTEIGER_ITERATIONS: i32 = 12;
/// Cation electronegativity used for hydrogen.
const HYDROGEN_CHI_PLUS: f64 = 20.02;

/// (a, b, c) in χ = a + b·q + c·q², by element and hybridization.
fn gasteiger_params(atomic_number: u8, hyb: Hybridization) -> Option<(f64, f64, f64)> {
    use Hybridization::*;
    let params = match (atomic_number, hyb) {
        (1, _) => (7.17, 6.24, -0.56),
        (6, Sp3) => (7.98, 9.18, 1.88),
        (6, Sp2) => (8.79, 9.32, 1.51),
        (6, Sp) => (10.39, 9.45, 0.73),
        (7, Sp3) => (11.54, 10.82, 1.36),
        (7, Sp2) => (12.87, 11.15, 0.85),
        (7, Sp) => (15.68, 11.70, -0.27),
        (8, Sp3) => (14.18, 12.92, 1.39),
        (8, _) => (17.07, 13.79, 0.47),
        (9, _) => (14.66, 13.85, 2.31),
        (14, _) => (7.30, 6.56, 0.657),
        (15, _) => (8.90, 8.24, 0.96),
        (16, Sp3) => (10.14, 9.13, 1.38),
        (16, _) => (10.88, 9.485, 1.325),
        (17, _) => (11.00, 9.69, 1.35),
        (34, _) => (10.00, 8.80, 1.20),
        (35, _) => (10.08, 8.47, 1.16),
        (53, _) => (9.90, 7.96, 0.96),
        _ => return None,
    };
    Some(params)
}

/// Gasteiger-Marsili charges of the graph atoms.
///
/// Attached hydrogens take part in the equalisation as separate centres but
/// only heavy-atom charges are returned. Every charge is NaN when some
/// element has no parameters.
pub fn gasteiger_charges(mol: &Molecule) -> Vec<f64> {
    let n = mol.atom_count();
    let mut params = Vec::with_capacity(n);
    let mut charges = Vec::with_capacity(n);
    let mut edges: Vec<(usize, usize)> = mol.bonds.iter().map(|b| (b.begin, b.end)).collect();

    for (index, atom) in mol.atoms.iter().enumerate() {
        let Some(p) = gasteiger_params(atom.atomic_number(), hybridization(mol, index)) else {
            return vec![f64::NAN; n];
        };
        params.push(p);
        charges.push(f64::from(atom.charge));
    }
    // implicit hydrogens become extra centres after the graph atoms
    for (index, atom) in mol.atoms.iter().enumerate() {
        for _ in 0..atom.hydrogens {
            edges.push((index, params.len()));
            params.push((7.17, 6.24, -0.56));
            charges.push(0.0);
        }
    }

    let chi_plus: Vec<f64> = params
        .iter()
        .enumerate()
        .map(|(i, &(a, b, c))| {
            let hydrogen = i >= n || mol.atoms[i].is_hydrogen();
            if hydrogen {
                HYDROGEN_CHI_PLUS
            } else {
                a + b + c
            }
        })
        .collect();

    let mut damping = 1.0;
    for _ in 0..GASTEIGER_ITERATIONS {
        damping *= 0.5;
        let chi: Vec<f64> = params
            .iter()
            .zip(&charges)
            .map(|(&(a, b, c), &q)| a + b * q + c * q * q)
            .collect();
        let mut delta = vec![0.0; charges.len()];
        for &(i, j) in &edges {
            let diff = chi[j] - chi[i];
            // charge moves away from the less electronegative centre
            let denom = if diff >= 0.0 { chi_plus[i] } else { chi_plus[j] };
            let transfer = diff / denom;
            delta[i] += transfer;
            delta[j] -= transfer;
        }
        for (q, d) in charges.iter_mut().zip(&delta) {
            *q += damping * d;
        }
    }

    charges.truncate(n);
    charges
}

fn heavy_charges(ctx: &MolContext<'_>) -> Vec<f64> {
    let mol = ctx.mol();
    ctx.charges()
        .iter()
        .enumerate()
        .filter(|&(i, _)| !mol.atoms[i].is_hydrogen())
        .map(|(_, &q)| q)
        .collect()
}

/// Fold that propagates NaN instead of skipping it.
fn nan_fold(values: impl IntoIterator<Item = f64>, pick: fn(f64, f64) -> f64) -> f64 {
    let mut result: Option<f64> = None;
    for v in values {
        if v.is_nan() {
            return f64::NAN;
        }
        result = Some(result.map_or(v, |r| pick(r, v)));
    }
    result.unwrap_or(f64::NAN)
}

pub(crate) fn max_partial_charge(ctx: &MolContext<'_>) -> f64 {
    nan_fold(heavy_charges(ctx), f64::max)
}

pub(crate) fn min_partial_charge(ctx: &MolContext<'_>) -> f64 {
    nan_fold(heavy_charges(ctx), f64::min)
}

pub(crate) fn max_abs_partial_charge(ctx: &MolContext<'_>) -> f64 {
    nan_fold(heavy_charges(ctx).into_iter().map(f64::abs), f64::max)
}

pub(crate) fn min_abs_partial_charge(ctx: &MolContext<'_>) -> f64 {
    nan_fold(heavy_charges(ctx).into_iter().map(f64::abs), f64::min)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn with_ctx<T>(smiles: &str, f: impl FnOnce(&MolContext<'_>) -> T) -> T {
        let mol = parse_smiles(smiles).unwrap();
        let ctx = MolContext::new(&mol);
        f(&ctx)
    }

    #[test]
    fn ethanol() {
        let d = physchem_descriptors("CCO").unwrap();
        assert_relative_eq!(d.mol_wt, 46.069, epsilon = 0.01);
        assert_relative_eq!(d.exact_mol_wt, 46.0419, epsilon = 0.001);
        assert_relative_eq!(d.tpsa, 20.23, epsilon = 1e-9);
        assert_relative_eq!(d.mol_log_p, -0.0014, epsilon = 1e-4);
        assert_relative_eq!(d.mol_mr, 12.7598, epsilon = 1e-3);
        assert_relative_eq!(d.labute_asa, 19.6589, epsilon = 1e-3);
    }

    #[test]
    fn benzene_and_aspirin_reference_values() {
        let benzene = physchem_descriptors("c1ccccc1").unwrap();
        assert_relative_eq!(benzene.mol_log_p, 1.6866, epsilon = 1e-4);
        assert_relative_eq!(benzene.labute_asa, 37.4314, epsilon = 1e-3);

        let aspirin = physchem_descriptors("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        assert_relative_eq!(aspirin.mol_log_p, 1.3101, epsilon = 1e-4);
        assert_relative_eq!(aspirin.labute_asa, 74.9, epsilon = 0.2);
    }

    #[test]
    fn crippen_types_heteroatoms() {
        // aromatic nitrogen, carboxylic acid
        assert_relative_eq!(with_ctx("c1ccncc1", mol_log_p), 1.0816, epsilon = 1e-4);
        assert_relative_eq!(with_ctx("CC(=O)O", mol_log_p), 0.0909, epsilon = 1e-4);
        // Kekulé input types the same as aromatic input
        assert_relative_eq!(
            with_ctx("C1=CC=CC=C1", mol_log_p),
            with_ctx("c1ccccc1", mol_log_p)
        );
    }

    #[test]
    fn aspirin_tpsa_and_mass() {
        let d = physchem_descriptors("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        assert_relative_eq!(d.mol_wt, 180.159, epsilon = 0.01);
        assert_relative_eq!(d.tpsa, 63.6, epsilon = 0.01);
    }

    #[test]
    fn nitrogen_tpsa_patterns() {
        // tertiary amine, nitrile, pyridine
        assert_relative_eq!(with_ctx("CN(C)C", tpsa), 3.24);
        assert_relative_eq!(with_ctx("CC#N", tpsa), 23.79);
        assert_relative_eq!(with_ctx("c1ccncc1", tpsa), 12.89);
        assert_relative_eq!(with_ctx("CN", tpsa), 26.02);
    }

    #[test]
    fn valence_and_radical_electrons() {
        assert_eq!(with_ctx("CCO", num_valence_electrons), 20.0);
        assert_eq!(with_ctx("[CH3]", num_radical_electrons), 1.0);
        assert_eq!(with_ctx("CCO", num_radical_electrons), 0.0);
    }

    #[test]
    fn heavy_atom_weight_ignores_hydrogens() {
        assert_relative_eq!(with_ctx("O", heavy_atom_mol_wt), 15.999);
        assert_relative_eq!(with_ctx("O", mol_wt), 18.015, epsilon = 1e-3);
    }

    #[test]
    fn gasteiger_oxygen_is_negative() {
        let mol = parse_smiles("CCO").unwrap();
        let q = gasteiger_charges(&mol);
        assert_eq!(q.len(), 3);
        assert!(q[2] < 0.0);
        assert!(q[1] > q[0]);
    }

    #[test]
    fn gasteiger_charges_respect_formal_charge() {
        let q = with_ctx("C[O-]", |ctx| ctx.charges().to_vec());
        assert!(q[1] < -0.5);
    }

    #[test]
    fn unparameterised_elements_give_nan() {
        let max = with_ctx("[Na+].[Cl-]", max_partial_charge);
        assert!(max.is_nan());
        assert!(with_ctx("CCO", max_partial_charge).is_finite());
        assert!(with_ctx("CCO", min_abs_partial_charge) >= 0.0);
    }
}
