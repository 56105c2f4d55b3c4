//! Ring perception: ring bonds and the smallest set of smallest rings.

use std::collections::VecDeque;

use crate::molecule::Molecule;

/// Ring membership and SSSR of a molecule.
#[derive(Debug, Clone, Default)]
pub struct RingInfo {
    /// Rings as cyclic atom sequences, smallest first.
    pub rings: Vec<Vec<usize>>,
    /// `ring_bonds[bond]` is true when the bond lies on a cycle.
    pub ring_bonds: Vec<bool>,
    /// `ring_atoms[atom]` is true when the atom lies on a cycle.
    pub ring_atoms: Vec<bool>,
}

impl RingInfo {
    /// Perceive rings of `mol`.
    pub fn perceive(mol: &Molecule) -> Self {
        let ring_bonds = ring_bonds(mol);
        let mut ring_atoms = vec![false; mol.atom_count()];
        for (bond, _) in ring_bonds.iter().enumerate().filter(|(_, &r)| r) {
            ring_atoms[mol.bonds[bond].begin] = true;
            ring_atoms[mol.bonds[bond].end] = true;
        }
        let rings = sssr(mol, &ring_bonds);
        RingInfo {
            rings,
            ring_bonds,
            ring_atoms,
        }
    }

    /// Number of SSSR rings.
    pub fn count(&self) -> usize {
        self.rings.len()
    }

    /// Number of SSSR rings an atom belongs to.
    pub fn atom_ring_count(&self, atom: usize) -> usize {
        self.rings.iter().filter(|r| r.contains(&atom)).count()
    }
}

/// Bond indices of a ring, in cycle order.
pub fn ring_bond_indices(mol: &Molecule, ring: &[usize]) -> Vec<usize> {
    let mut bonds = Vec::with_capacity(ring.len());
    for (i, &a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        if let Some(&(_, bond)) = mol.neighbors(a).iter().find(|&&(n, _)| n == b) {
            bonds.push(bond);
        }
    }
    bonds
}

/// A bond is a ring bond when its endpoints stay connected without it.
fn ring_bonds(mol: &Molecule) -> Vec<bool> {
    (0..mol.bond_count())
        .map(|bond| {
            let b = &mol.bonds[bond];
            shortest_path(mol, b.begin, b.end, bond, None).is_some()
        })
        .collect()
}

/// Smallest cycle through each ring bond; deduplicated, smallest first,
/// truncated to the cyclomatic number.
fn sssr(mol: &Molecule, ring_bonds: &[bool]) -> Vec<Vec<usize>> {
    let cyclomatic = mol.bond_count() + mol.fragment_count();
    let cyclomatic = cyclomatic.saturating_sub(mol.atom_count());
    if cyclomatic == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<Vec<usize>> = Vec::new();
    for (bond, _) in ring_bonds.iter().enumerate().filter(|(_, &r)| r) {
        let b = &mol.bonds[bond];
        if let Some(path) = shortest_path(mol, b.begin, b.end, bond, Some(ring_bonds)) {
            let mut key = path.clone();
            key.sort_unstable();
            let duplicate = candidates.iter().any(|c| {
                let mut other = c.clone();
                other.sort_unstable();
                other == key
            });
            if !duplicate {
                candidates.push(path);
            }
        }
    }
    candidates.sort_by_key(|r| r.len());
    candidates.truncate(cyclomatic);
    candidates
}

/// BFS path from `start` to `end` that does not use `excluded_bond`,
/// optionally restricted to ring bonds.
fn shortest_path(
    mol: &Molecule,
    start: usize,
    end: usize,
    excluded_bond: usize,
    allowed: Option<&[bool]>,
) -> Option<Vec<usize>> {
    let mut parent = vec![usize::MAX; mol.atom_count()];
    parent[start] = start;
    let mut queue = VecDeque::from([start]);

    while let Some(atom) = queue.pop_front() {
        if atom == end {
            let mut path = vec![end];
            let mut node = end;
            while node != start {
                node = parent[node];
                path.push(node);
            }
            path.reverse();
            return Some(path);
        }
        for &(n, bond) in mol.neighbors(atom) {
            if bond == excluded_bond || parent[n] != usize::MAX {
                continue;
            }
            if allowed.is_some_and(|a| !a[bond]) {
                continue;
            }
            parent[n] = atom;
            queue.push_back(n);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    #[test]
    fn chain_has_no_rings() {
        let mol = parse_smiles("CCCC").unwrap();
        let info = RingInfo::perceive(&mol);
        assert_eq!(info.count(), 0);
        assert!(info.ring_bonds.iter().all(|&r| !r));
    }

    #[test]
    fn naphthalene_has_two_six_rings() {
        let mol = parse_smiles("c1ccc2ccccc2c1").unwrap();
        let info = RingInfo::perceive(&mol);
        assert_eq!(info.count(), 2);
        assert!(info.rings.iter().all(|r| r.len() == 6));
        assert!(info.ring_atoms.iter().all(|&r| r));
        // fusion atoms sit in both rings
        assert_eq!((0..10).filter(|&a| info.atom_ring_count(a) == 2).count(), 2);
    }

    #[test]
    fn substituent_bond_is_not_a_ring_bond() {
        let mol = parse_smiles("Cc1ccccc1").unwrap();
        let info = RingInfo::perceive(&mol);
        assert_eq!(info.count(), 1);
        assert!(!info.ring_bonds[0]);
        assert!(!info.ring_atoms[0]);
        let bonds = ring_bond_indices(&mol, &info.rings[0]);
        assert_eq!(bonds.len(), 6);
    }
}
