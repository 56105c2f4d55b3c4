// src/descriptors/topological.rs
//! Topological descriptors — graph-theoretical indices for QSAR.
//!
//! These are **classic, highly interpretable** molecular descriptors derived from
//! the hydrogen-suppressed molecular graph. They capture size, branching, cyclicity,
//! and shape.
//!
//! | Index                | Symbol       | Meaning                                           |
//! |----------------------|--------------|---------------------------------------------------|
//! | Balaban J            | J            | Distance-sum connectivity (bond-order weighted)   |
//! | Bertz CT             | C            | Entropy of atom types and bond-order connections  |
//! | Connectivity χ       | χ0, χ1       | Randić-type path sums over heavy-atom degrees     |
//! | Valence χ            | χ0v … χ4v    | Path sums over Kier-Hall valence deltas           |
//! | Simple valence χ     | χ0n … χ4n    | Path sums over (valence electrons − hydrogens)    |
//! | Hall-Kier α          | α            | Size/hybridization correction for kappa           |
//! | Kappa Shape          | κ₁, κ₂, κ₃   | Molecular shape and flexibility                   |
//!
//! # Real-World Examples
//!
//! ```
//! use stack_tox::topological_descriptors;
//! use approx::assert_relative_eq;
//!
//! // n-Hexane (linear)
//! let hexane = topological_descriptors("CCCCCC").unwrap();
//! assert_relative_eq!(hexane.chi1, 2.9142, epsilon = 1e-3);
//! assert_relative_eq!(hexane.balaban_j, 2.3390, epsilon = 1e-3);
//!
//! // Benzene (cyclic + aromatic)
//! let benzene = topological_descriptors("c1ccccc1").unwrap();
//! assert_relative_eq!(benzene.chi1, 3.0, epsilon = 1e-9);
//! assert_relative_eq!(benzene.balaban_j, 3.0, epsilon = 1e-9);
//! ```

use std::collections::BTreeMap;

use super::{hybridization, DescriptorError, Hybridization, MolContext};
use crate::molecule::Molecule;
use crate::smiles::parse_smiles;

/// Container for the most important topological indices used in QSAR.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopologicalDescriptors {
    /// Balaban J index, a highly discriminating connectivity index
    pub balaban_j: f64,
    /// Bertz complexity index
    pub bertz_ct: f64,
    /// Zero-order connectivity index
    pub chi0: f64,
    /// First-order connectivity index (Randić χ)
    pub chi1: f64,
    /// Zero-order valence connectivity index
    pub chi0v: f64,
    /// First-order valence connectivity index
    pub chi1v: f64,
    /// Hall-Kier alpha
    pub hall_kier_alpha: f64,
    /// First-order Kappa shape index
    pub kappa1: f64,
    /// Second-order Kappa shape index
    pub kappa2: f64,
    /// Third-order Kappa shape index
    pub kappa3: f64,
}

/// Compute the topological descriptors from a SMILES string.
///
/// # Errors
///
/// Returns [`DescriptorError::InvalidSmiles`] if SMILES parsing fails.
///
/// # Examples
///
/// ```
/// use stack_tox::topological_descriptors;
/// use approx::assert_relative_eq;
///
/// let desc = topological_descriptors("CCO").unwrap(); // ethanol
/// assert_relative_eq!(desc.chi0, 2.7071, epsilon = 1e-3);
/// assert_relative_eq!(desc.chi1v, 1.0233, epsilon = 1e-3);
/// assert_relative_eq!(desc.kappa1, 2.96, epsilon = 1e-9);
/// ```
pub fn topological_descriptors(smiles: &str) -> Result<TopologicalDescriptors, DescriptorError> {
    let mol = parse_smiles(smiles).map_err(|source| DescriptorError::InvalidSmiles {
        smiles: smiles.to_string(),
        source,
    })?;
    let ctx = MolContext::new(&mol);
    Ok(TopologicalDescriptors {
        balaban_j: balaban_j(&ctx),
        bertz_ct: bertz_ct(&ctx),
        chi0: chi0(&ctx),
        chi1: chi1(&ctx),
        chi0v: chi0v(&ctx),
        chi1v: chi1v(&ctx),
        hall_kier_alpha: hall_kier_alpha(&ctx),
        kappa1: kappa1(&ctx),
        kappa2: kappa2(&ctx),
        kappa3: kappa3(&ctx),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Distances and paths
// ─────────────────────────────────────────────────────────────────────────────
/// Shortest-path distances where each bond counts `1 / order`
/// (aromatic bonds 1/1.5). Disconnected pairs are infinite.
pub fn weighted_distance_matrix(mol: &Molecule) -> Vec<Vec<f64>> {
    let n = mol.atom_count();
    let mut dist = vec![vec![f64::INFINITY; n]; n];

    for (i, row) in dist.iter_mut().enumerate() {
        row[i] = 0.0;
    }
    for bond in &mol.bonds {
        let w = 1.0 / bond.order.as_f64();
        dist[bond.begin][bond.end] = w;
        dist[bond.end][bond.begin] = w;
    }

    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                let through = dist[i][k] + dist[k][j];
                if through < dist[i][j] {
                    dist[i][j] = through;
                }
            }
        }
    }

    dist
}

/// Simple paths of `length` bonds, each reported once as an atom sequence.
fn paths_of_length(mol: &Molecule, length: usize) -> Vec<Vec<usize>> {
    fn extend(mol: &Molecule, path: &mut Vec<usize>, length: usize, out: &mut Vec<Vec<usize>>) {
        let last = path[path.len() - 1];
        if path.len() == length + 1 {
            if path[0] < last {
                out.push(path.clone());
            }
            return;
        }
        for &(n, _) in mol.neighbors(last) {
            if !path.contains(&n) {
                path.push(n);
                extend(mol, path, length, out);
                path.pop();
            }
        }
    }

    let mut out = Vec::new();
    for start in 0..mol.atom_count() {
        if length == 0 {
            out.push(vec![start]);
            continue;
        }
        extend(mol, &mut vec![start], length, &mut out);
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Connectivity (chi) indices
// ─────────────────────────────────────────────────────────────────────────────
fn inverse_sqrt(delta: f64) -> f64 {
    if delta > 0.0 {
        1.0 / delta.sqrt()
    } else {
        0.0
    }
}

fn degree_weights(mol: &Molecule) -> Vec<f64> {
    (0..mol.atom_count())
        .map(|a| inverse_sqrt(mol.heavy_degree(a) as f64))
        .collect()
}

/// Kier-Hall valence delta; heavier elements are scaled by core electrons.
fn valence_weights(mol: &Molecule) -> Vec<f64> {
    mol.atoms
        .iter()
        .map(|a| {
            let z = f64::from(a.atomic_number());
            let zv = f64::from(a.element.outer_electrons) - f64::from(a.charge);
            let h = f64::from(a.hydrogens);
            let delta = if a.atomic_number() <= 10 {
                zv - h
            } else {
                (zv - h) / (z - zv - 1.0)
            };
            inverse_sqrt(delta)
        })
        .collect()
}

fn simple_valence_weights(mol: &Molecule) -> Vec<f64> {
    mol.atoms
        .iter()
        .map(|a| {
            let zv = f64::from(a.element.outer_electrons) - f64::from(a.charge);
            inverse_sqrt(zv - f64::from(a.hydrogens))
        })
        .collect()
}

fn chi(mol: &Molecule, order: usize, weights: &[f64]) -> f64 {
    paths_of_length(mol, order)
        .iter()
        .map(|path| path.iter().map(|&a| weights[a]).product::<f64>())
        .sum()
}

pub(crate) fn chi0(ctx: &MolContext<'_>) -> f64 {
    chi(ctx.mol(), 0, &degree_weights(ctx.mol()))
}

pub(crate) fn chi1(ctx: &MolContext<'_>) -> f64 {
    chi(ctx.mol(), 1, &degree_weights(ctx.mol()))
}

macro_rules! chi_family {
    ($($name:ident => ($order:expr, $weights:ident)),* $(,)?) => {
        $(
            pub(crate) fn $name(ctx: &MolContext<'_>) -> f64 {
                chi(ctx.mol(), $order, &$weights(ctx.mol()))
            }
        )*
    };
}

chi_family! {
    chi0n => (0, simple_valence_weights),
    chi1n => (1, simple_valence_weights),
    chi2n => (2, simple_valence_weights),
    chi3n => (3, simple_valence_weights),
    chi4n => (4, simple_valence_weights),
    chi0v => (0, valence_weights),
    chi1v => (1, valence_weights),
    chi2v => (2, valence_weights),
    chi3v => (3, valence_weights),
    chi4v => (4, valence_weights),
}

// ─────────────────────────────────────────────────────────────────────────────
// Shape (kappa) indices
// ─────────────────────────────────────────────────────────────────────────────
const CARBON_SP3_RADIUS: f64 = 0.77;

fn atom_alpha(mol: &Molecule, atom: usize) -> f64 {
    use Hybridization::*;
    let a = &mol.atoms[atom];
    let hyb = hybridization(mol, atom);
    let tabulated = match (a.atomic_number(), hyb) {
        (6, Sp) => Some(-0.22),
        (6, Sp2) => Some(-0.13),
        (6, Sp3) => Some(0.0),
        (7, Sp) => Some(-0.29),
        (7, Sp2) => Some(-0.20),
        (7, Sp3) => Some(-0.04),
        (8, Sp2) => Some(-0.20),
        (8, Sp3) => Some(-0.04),
        (9, _) => Some(-0.07),
        (15, Sp2) => Some(0.30),
        (15, Sp3) => Some(0.43),
        (16, Sp2) => Some(0.22),
        (16, Sp3) => Some(0.35),
        (17, _) => Some(0.29),
        (35, _) => Some(0.48),
        (53, _) => Some(0.73),
        _ => None,
    };
    tabulated.unwrap_or(a.element.bond_radius / CARBON_SP3_RADIUS - 1.0)
}

pub(crate) fn hall_kier_alpha(ctx: &MolContext<'_>) -> f64 {
    let mol = ctx.mol();
    (0..mol.atom_count())
        .filter(|&a| !mol.atoms[a].is_hydrogen())
        .map(|a| atom_alpha(mol, a))
        .sum()
}

fn kappa(ctx: &MolContext<'_>, order: usize) -> f64 {
    let mol = ctx.mol();
    let a = mol.heavy_atom_count() as f64;
    let alpha = hall_kier_alpha(ctx);
    let p = paths_of_length(mol, order).len() as f64;
    let denom = (p + alpha) * (p + alpha);
    if denom == 0.0 {
        return 0.0;
    }
    let n = a + alpha;
    match order {
        1 => n * (n - 1.0) * (n - 1.0) / denom,
        2 => (n - 1.0) * (n - 2.0) * (n - 2.0) / denom,
        _ if mol.heavy_atom_count() % 2 == 1 => (n - 1.0) * (n - 3.0) * (n - 3.0) / denom,
        _ => (n - 3.0) * (n - 2.0) * (n - 2.0) / denom,
    }
}

pub(crate) fn kappa1(ctx: &MolContext<'_>) -> f64 {
    kappa(ctx, 1)
}

pub(crate) fn kappa2(ctx: &MolContext<'_>) -> f64 {
    kappa(ctx, 2)
}

pub(crate) fn kappa3(ctx: &MolContext<'_>) -> f64 {
    kappa(ctx, 3)
}

// ─────────────────────────────────────────────────────────────────────────────
// Balaban J and Bertz CT
// ─────────────────────────────────────────────────────────────────────────────
/// NaN for disconnected molecules, 0 when there are no bonds.
pub(crate) fn balaban_j(ctx: &MolContext<'_>) -> f64 {
    let mol = ctx.mol();
    if mol.fragment_count() > 1 {
        return f64::NAN;
    }
    let m = mol.bond_count() as f64;
    if m == 0.0 {
        return 0.0;
    }
    let mu = m - mol.atom_count() as f64 + 1.0;
    let sums: Vec<f64> = ctx.distances().iter().map(|row| row.iter().sum()).collect();
    let total: f64 = mol
        .bonds
        .iter()
        .map(|b| 1.0 / (sums[b.begin] * sums[b.end]).sqrt())
        .sum();
    m / (mu + 1.0) * total
}

/// Distance rows are compared on their first `BERTZ_CUTOFF` sorted entries.
const BERTZ_CUTOFF: usize = 100;

/// A Bertz connection class: two bonds meeting at a hinge atom, or the extra
/// connections inside one multiple bond. Atoms are named by symmetry class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Connection {
    Path(usize, usize, usize),
    Bond(usize, usize),
}

/// Shannon entropy in bits of a frequency table.
fn info_entropy(counts: &[f64]) -> f64 {
    let total: f64 = counts.iter().sum();
    if total == 0.0 {
        return 0.0;
    }
    -counts
        .iter()
        .filter(|&&c| c > 0.0)
        .map(|&c| {
            let p = c / total;
            p * p.log2()
        })
        .sum::<f64>()
}

/// Atoms whose sorted bond-order weighted distance rows agree to four
/// decimals share a class.
fn symmetry_classes(ctx: &MolContext<'_>) -> Vec<usize> {
    let mut seen: Vec<Vec<i64>> = Vec::new();
    ctx.distances()
        .iter()
        .map(|row| {
            let mut sorted = row.clone();
            sorted.sort_by(f64::total_cmp);
            let key: Vec<i64> = sorted
                .iter()
                .take(BERTZ_CUTOFF)
                .map(|&d| if d.is_finite() { (d * 1e4).round() as i64 } else { i64::MAX })
                .collect();
            match seen.iter().position(|k| *k == key) {
                Some(class) => class,
                None => {
                    seen.push(key);
                    seen.len() - 1
                }
            }
        })
        .collect()
}

/// Bertz complexity: `n·H(atom types) + N·(H(connections) + log2 N)`.
///
/// Bond orders are expanded (aromatic 1.5), so a double bond contributes one
/// internal connection and a pair of bonds `o₁·o₂` connections.
pub(crate) fn bertz_ct(ctx: &MolContext<'_>) -> f64 {
    let mol = ctx.mol();
    let n = mol.atom_count();
    if n < 2 {
        return 0.0;
    }
    let classes = symmetry_classes(ctx);
    let order = |bond: usize| mol.bonds[bond].order.as_f64();

    let mut connections: BTreeMap<Connection, f64> = BTreeMap::new();
    let mut atom_types: BTreeMap<u8, f64> = BTreeMap::new();
    for hinge in 0..n {
        *atom_types.entry(mol.atoms[hinge].atomic_number()).or_default() += 1.0;
        let hc = classes[hinge];
        let arms = mol.neighbors(hinge);
        for (i, &(ni, bi)) in arms.iter().enumerate() {
            let ci = classes[ni];
            let oi = order(bi);
            if oi > 1.0 && ni > hinge {
                *connections
                    .entry(Connection::Bond(ci.min(hc), ci.max(hc)))
                    .or_default() += oi * (oi - 1.0) / 2.0;
            }
            for &(nj, bj) in &arms[i + 1..] {
                let cj = classes[nj];
                *connections
                    .entry(Connection::Path(ci.min(cj), hc, ci.max(cj)))
                    .or_default() += oi * order(bj);
            }
        }
    }

    let counts: Vec<f64> = if connections.is_empty() {
        vec![1.0]
    } else {
        connections.into_values().collect()
    };
    let total: f64 = counts.iter().sum();
    let types: Vec<f64> = atom_types.into_values().collect();
    n as f64 * info_entropy(&types) + total * (info_entropy(&counts) + total.log2())
}
