//! Hydrogen-suppressed molecular graph.

use crate::element::Element;

/// Bond order as written in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    /// `-` or implicit.
    Single,
    /// `=`
    Double,
    /// `#`
    Triple,
    /// `:` or between aromatic atoms.
    Aromatic,
}

impl BondOrder {
    /// Numeric bond order; aromatic bonds count 1.5.
    pub fn as_f64(self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
        }
    }
}

/// An atom of the molecular graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Element data.
    pub element: &'static Element,
    /// Formal charge.
    pub charge: i8,
    /// Mass number, when written.
    pub isotope: Option<u16>,
    /// Part of an aromatic system.
    pub aromatic: bool,
    /// Attached hydrogens (implicit, bracket `H` count and folded `[H]` atoms).
    pub hydrogens: u8,
    /// Unpaired electrons.
    pub radical_electrons: u8,
    /// Whether the atom was written in brackets.
    pub bracketed: bool,
}

impl Atom {
    /// Atomic number shortcut.
    pub fn atomic_number(&self) -> u8 {
        self.element.atomic_number
    }

    /// Whether this is carbon.
    pub fn is_carbon(&self) -> bool {
        self.element.atomic_number == 6
    }

    /// Whether this is a hydrogen atom kept as an explicit graph node.
    pub fn is_hydrogen(&self) -> bool {
        self.element.atomic_number == 1
    }
}

/// A bond between two atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    /// First atom.
    pub begin: usize,
    /// Second atom.
    pub end: usize,
    /// Order as perceived (aromatic bonds stay aromatic).
    pub order: BondOrder,
    /// Localised order: aromatic bonds are resolved to single or double.
    pub kekule: BondOrder,
}

impl Bond {
    /// Whether the bond is aromatic.
    pub fn is_aromatic(&self) -> bool {
        self.order == BondOrder::Aromatic
    }

    /// The atom on the other side of the bond.
    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom {
            self.end
        } else {
            self.begin
        }
    }
}

/// A molecule: atoms, bonds, and an adjacency list.
#[derive(Debug, Clone)]
pub struct Molecule {
    /// Atoms in input order.
    pub atoms: Vec<Atom>,
    /// Bonds in input order.
    pub bonds: Vec<Bond>,
    /// `adjacency[atom] = [(neighbour, bond_index), ...]`
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    /// Build a molecule and its adjacency list.
    pub fn new(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (index, bond) in bonds.iter().enumerate() {
            adjacency[bond.begin].push((bond.end, index));
            adjacency[bond.end].push((bond.begin, index));
        }
        Molecule {
            atoms,
            bonds,
            adjacency,
        }
    }

    /// Number of graph atoms (hydrogens are folded into their heavy atom).
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Number of bonds.
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Number of non-hydrogen graph atoms.
    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| !a.is_hydrogen()).count()
    }

    /// `(neighbour, bond_index)` pairs of an atom.
    pub fn neighbors(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    /// Graph degree.
    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    /// Number of non-hydrogen neighbours.
    pub fn heavy_degree(&self, atom: usize) -> usize {
        self.adjacency[atom]
            .iter()
            .filter(|&&(n, _)| !self.atoms[n].is_hydrogen())
            .count()
    }

    /// Bond between two atoms, if they are bonded.
    pub fn bond_between(&self, a: usize, b: usize) -> Option<&Bond> {
        self.adjacency[a]
            .iter()
            .find(|&&(n, _)| n == b)
            .map(|&(_, bond)| &self.bonds[bond])
    }

    /// Sum of localised bond orders around an atom (attached hydrogens not
    /// included).
    pub fn explicit_valence(&self, atom: usize) -> u8 {
        self.adjacency[atom]
            .iter()
            .map(|&(_, bond)| self.bonds[bond].kekule.as_f64() as u8)
            .sum()
    }

    /// Total number of hydrogens, explicit graph nodes included.
    pub fn total_hydrogens(&self) -> usize {
        self.atoms
            .iter()
            .map(|a| a.hydrogens as usize + usize::from(a.is_hydrogen()))
            .sum()
    }

    /// Number of connected components.
    pub fn fragment_count(&self) -> usize {
        let mut seen = vec![false; self.atom_count()];
        let mut fragments = 0;
        for start in 0..self.atom_count() {
            if seen[start] {
                continue;
            }
            fragments += 1;
            seen[start] = true;
            let mut stack = vec![start];
            while let Some(atom) = stack.pop() {
                for &(n, _) in &self.adjacency[atom] {
                    if !seen[n] {
                        seen[n] = true;
                        stack.push(n);
                    }
                }
            }
        }
        fragments
    }
}
