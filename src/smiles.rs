//! SMILES parsing and structure sanitisation.
//!
//! [`parse_smiles`] turns a SMILES string into a hydrogen-suppressed
//! [`Molecule`]: implicit hydrogens are assigned from default valences,
//! aromatic systems are localised into alternating single/double bonds, and
//! explicit `[H]` atoms are folded into their heavy neighbour. Structures that
//! violate valence rules or cannot be localised are rejected, so
//! [`is_valid_smiles`] answers "does this denote a real molecule", not merely
//! "is this syntactically well formed".

use std::collections::BTreeMap;

use thiserror::Error;

use crate::element::{allowed_valences, element_by_symbol, Element};
use crate::molecule::{Atom, Bond, BondOrder, Molecule};
use crate::ring::{ring_bond_indices, RingInfo};

/// Upper bound on backtracking steps while localising aromatic bonds.
const KEKULIZE_STEP_LIMIT: usize = 200_000;

/// Reasons a SMILES string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmilesError {
    /// Nothing to parse.
    #[error("empty SMILES string")]
    Empty,

    /// A character outside the SMILES grammar (whitespace included).
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar {
        /// The offending character.
        ch: char,
        /// Byte offset of the character.
        pos: usize,
    },

    /// Input ended in the middle of a token.
    #[error("unexpected end of SMILES")]
    UnexpectedEnd,

    /// Element symbol not in the periodic table data.
    #[error("unknown element '{symbol}' at position {pos}")]
    UnknownElement {
        /// Symbol as written.
        symbol: String,
        /// Byte offset of the symbol.
        pos: usize,
    },

    /// `(`/`)` mismatch, empty branch, or branch with no parent atom.
    #[error("unbalanced or empty branch at position {pos}")]
    Branch {
        /// Byte offset of the parenthesis.
        pos: usize,
    },

    /// Ring bond labels opened but never closed.
    #[error("unclosed ring bond(s): {0:?}")]
    UnclosedRing(
        /// Labels still open at the end.
        Vec<u16>,
    ),

    /// Ring closure onto the same atom, onto an existing bond, or with
    /// conflicting bond orders.
    #[error("invalid ring closure {ring} at position {pos}")]
    RingClosure {
        /// Ring bond label.
        ring: u16,
        /// Byte offset of the label.
        pos: usize,
    },

    /// A bond symbol or `.` with no atom on one side.
    #[error("bond at position {pos} is missing an atom")]
    DanglingBond {
        /// Byte offset of the bond symbol.
        pos: usize,
    },

    /// Malformed bracket atom.
    #[error("invalid bracket atom at position {pos}: {reason}")]
    BracketAtom {
        /// Byte offset of the opening bracket.
        pos: usize,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Atom bonded beyond its permitted valence.
    #[error("explicit valence {valence} for atom {atom} ({symbol}) is greater than permitted")]
    Valence {
        /// Atom index.
        atom: usize,
        /// Element symbol of the atom.
        symbol: &'static str,
        /// Explicit valence found.
        valence: u8,
    },

    /// Aromatic flag on an atom that is not part of a ring.
    #[error("non-ring atom {atom} marked aromatic")]
    AromaticOutsideRing {
        /// Atom index.
        atom: usize,
    },

    /// No alternating single/double assignment exists for the aromatic system.
    #[error("can't kekulize aromatic system")]
    Kekulize,
}

/// Whether `smiles` parses into a valid molecule.
///
/// ```
/// use stack_tox::is_valid_smiles;
///
/// assert!(is_valid_smiles("CCO"));
/// assert!(is_valid_smiles("c1ccccc1O"));
/// assert!(!is_valid_smiles("not a smiles"));
/// assert!(!is_valid_smiles("C1CC"));
/// ```
pub fn is_valid_smiles(smiles: &str) -> bool {
    parse_smiles(smiles).is_ok()
}

/// Parse a SMILES string into a sanitised molecule.
///
/// # Errors
///
/// Returns a [`SmilesError`] describing the first syntax or chemistry
/// problem found.
pub fn parse_smiles(smiles: &str) -> Result<Molecule, SmilesError> {
    if smiles.is_empty() {
        return Err(SmilesError::Empty);
    }
    let mut parser = Parser::new(smiles);
    parser.parse()?;
    sanitize(parser.atoms, parser.bonds)
}

#[derive(Debug, Clone, Copy)]
struct RingOpening {
    atom: usize,
    order: Option<BondOrder>,
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    rings: BTreeMap<u16, RingOpening>,
    /// Branch points: (parent atom, atom count when the branch opened).
    branches: Vec<(usize, usize)>,
    prev: Option<usize>,
    /// Pending bond symbol and its position.
    pending: Option<(BondOrder, usize)>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser {
            input: input.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bonds: Vec::new(),
            rings: BTreeMap::new(),
            branches: Vec::new(),
            prev: None,
            pending: None,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn unexpected(&self, pos: usize) -> SmilesError {
        // Report the full character, not a UTF-8 continuation byte.
        let ch = std::str::from_utf8(&self.input[pos..])
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or(self.input[pos] as char);
        SmilesError::UnexpectedChar { ch, pos }
    }

    fn parse(&mut self) -> Result<(), SmilesError> {
        while let Some(ch) = self.peek() {
            let pos = self.pos;
            match ch {
                b'(' => {
                    self.bump();
                    let parent = self.prev.ok_or(SmilesError::Branch { pos })?;
                    if self.pending.is_some() {
                        return Err(SmilesError::Branch { pos });
                    }
                    self.branches.push((parent, self.atoms.len()));
                }
                b')' => {
                    self.bump();
                    let (parent, opened_at) =
                        self.branches.pop().ok_or(SmilesError::Branch { pos })?;
                    if opened_at == self.atoms.len() {
                        return Err(SmilesError::Branch { pos });
                    }
                    if let Some((_, bond_pos)) = self.pending {
                        return Err(SmilesError::DanglingBond { pos: bond_pos });
                    }
                    self.prev = Some(parent);
                }
                b'-' | b'=' | b'#' | b':' | b'/' | b'\\' | b'$' => {
                    self.bump();
                    if self.prev.is_none() || self.pending.is_some() {
                        return Err(SmilesError::DanglingBond { pos });
                    }
                    let order = match ch {
                        b'=' => BondOrder::Double,
                        b'#' => BondOrder::Triple,
                        b':' => BondOrder::Aromatic,
                        b'$' => return Err(self.unexpected(pos)),
                        _ => BondOrder::Single,
                    };
                    self.pending = Some((order, pos));
                }
                b'.' => {
                    self.bump();
                    if self.prev.is_none() || self.pending.is_some() {
                        return Err(SmilesError::DanglingBond { pos });
                    }
                    self.prev = None;
                }
                b'%' => {
                    self.bump();
                    let ring = self.two_digit_ring()?;
                    self.ring_bond(ring, pos)?;
                }
                b'0'..=b'9' => {
                    self.bump();
                    self.ring_bond(u16::from(ch - b'0'), pos)?;
                }
                b'[' => self.bracket_atom()?,
                _ => self.organic_atom()?,
            }
        }

        if let Some((_, bond_pos)) = self.pending {
            return Err(SmilesError::DanglingBond { pos: bond_pos });
        }
        if self.prev.is_none() {
            // trailing '.'
            return Err(SmilesError::DanglingBond {
                pos: self.input.len().saturating_sub(1),
            });
        }
        if !self.branches.is_empty() {
            return Err(SmilesError::Branch {
                pos: self.input.len(),
            });
        }
        if !self.rings.is_empty() {
            return Err(SmilesError::UnclosedRing(self.rings.keys().copied().collect()));
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<(), SmilesError> {
        let pos = self.pos;
        let ch = self.bump().ok_or(SmilesError::UnexpectedEnd)?;
        let (symbol, aromatic) = match ch {
            b'B' if self.peek() == Some(b'r') => {
                self.bump();
                ("Br", false)
            }
            b'C' if self.peek() == Some(b'l') => {
                self.bump();
                ("Cl", false)
            }
            b'B' => ("B", false),
            b'C' => ("C", false),
            b'N' => ("N", false),
            b'O' => ("O", false),
            b'P' => ("P", false),
            b'S' => ("S", false),
            b'F' => ("F", false),
            b'I' => ("I", false),
            b'b' => ("B", true),
            b'c' => ("C", true),
            b'n' => ("N", true),
            b'o' => ("O", true),
            b'p' => ("P", true),
            b's' => ("S", true),
            _ => return Err(self.unexpected(pos)),
        };
        let element = lookup(symbol, pos)?;
        self.push_atom(Atom {
            element,
            charge: 0,
            isotope: None,
            aromatic,
            hydrogens: 0,
            radical_electrons: 0,
            bracketed: false,
        });
        Ok(())
    }

    fn bracket_atom(&mut self) -> Result<(), SmilesError> {
        let start = self.pos;
        self.bump(); // '['

        let isotope = self.number(3).map(|n| n as u16);

        let first = self.bump().ok_or(SmilesError::UnexpectedEnd)?;
        let (symbol, aromatic) = match first {
            b'A'..=b'Z' => {
                let mut symbol = String::from(first as char);
                // nothing else inside brackets starts with a lowercase letter
                if let Some(next @ b'a'..=b'z') = self.peek() {
                    self.bump();
                    symbol.push(next as char);
                }
                (symbol, false)
            }
            b'a'..=b'z' => {
                let two = self.peek().map(|n| [first, n]);
                let symbol = match two {
                    Some([b's', b'e']) | Some([b'a', b's']) | Some([b't', b'e']) => {
                        self.bump();
                        let upper = (first as char).to_ascii_uppercase();
                        format!("{}{}", upper, self.input[self.pos - 1] as char)
                    }
                    _ if matches!(first, b'b' | b'c' | b'n' | b'o' | b'p' | b's') => {
                        String::from((first as char).to_ascii_uppercase())
                    }
                    _ => {
                        return Err(SmilesError::BracketAtom {
                            pos: start,
                            reason: "unknown aromatic symbol",
                        })
                    }
                };
                (symbol, true)
            }
            _ => {
                return Err(SmilesError::BracketAtom {
                    pos: start,
                    reason: "expected element symbol",
                })
            }
        };
        let element = lookup(&symbol, start + 1)?;

        // Chirality: @, @@, @TH1, @AL2, @SP3, @TB12, @OH30
        if self.peek() == Some(b'@') {
            self.bump();
            if self.peek() == Some(b'@') {
                self.bump();
            } else if let Some(class) = self.input.get(self.pos..self.pos + 2) {
                if matches!(class, b"TH" | b"AL" | b"SP" | b"TB" | b"OH") {
                    self.pos += 2;
                    self.number(2);
                }
            }
        }

        let mut hydrogens = 0u8;
        if self.peek() == Some(b'H') {
            self.bump();
            hydrogens = self.number(1).map_or(1, |n| n as u8);
        }

        let charge = self.charge()?;

        if self.peek() == Some(b':') {
            self.bump();
            if self.number(4).is_none() {
                return Err(SmilesError::BracketAtom {
                    pos: start,
                    reason: "atom class without digits",
                });
            }
        }

        if self.bump() != Some(b']') {
            return Err(SmilesError::BracketAtom {
                pos: start,
                reason: "expected ']'",
            });
        }

        self.push_atom(Atom {
            element,
            charge,
            isotope,
            aromatic,
            hydrogens,
            radical_electrons: 0,
            bracketed: true,
        });
        Ok(())
    }

    fn charge(&mut self) -> Result<i8, SmilesError> {
        let sign = match self.peek() {
            Some(b'+') => 1i8,
            Some(b'-') => -1i8,
            _ => return Ok(0),
        };
        let sign_char = self.input[self.pos];
        self.bump();
        if let Some(n) = self.number(2) {
            return Ok(sign * n as i8);
        }
        let mut magnitude = 1i8;
        while self.peek() == Some(sign_char) {
            self.bump();
            magnitude += 1;
            if magnitude > 15 {
                return Err(SmilesError::BracketAtom {
                    pos: self.pos,
                    reason: "charge out of range",
                });
            }
        }
        Ok(sign * magnitude)
    }

    /// Up to `max_digits` decimal digits.
    fn number(&mut self, max_digits: usize) -> Option<u32> {
        let mut value = None;
        for _ in 0..max_digits {
            match self.peek() {
                Some(d @ b'0'..=b'9') => {
                    self.bump();
                    value = Some(value.unwrap_or(0) * 10 + u32::from(d - b'0'));
                }
                _ => break,
            }
        }
        value
    }

    fn two_digit_ring(&mut self) -> Result<u16, SmilesError> {
        let pos = self.pos;
        match (self.bump(), self.bump()) {
            (Some(a @ b'0'..=b'9'), Some(b @ b'0'..=b'9')) => {
                Ok(u16::from(a - b'0') * 10 + u16::from(b - b'0'))
            }
            (None, _) | (_, None) => Err(SmilesError::UnexpectedEnd),
            _ => Err(self.unexpected(pos)),
        }
    }

    fn ring_bond(&mut self, ring: u16, pos: usize) -> Result<(), SmilesError> {
        let current = self.prev.ok_or(SmilesError::RingClosure { ring, pos })?;
        let pending = self.pending.take().map(|(order, _)| order);

        let Some(opening) = self.rings.remove(&ring) else {
            self.rings.insert(
                ring,
                RingOpening {
                    atom: current,
                    order: pending,
                },
            );
            return Ok(());
        };

        if opening.atom == current {
            return Err(SmilesError::RingClosure { ring, pos });
        }
        let duplicate = self.bonds.iter().any(|b| {
            (b.begin == opening.atom && b.end == current)
                || (b.begin == current && b.end == opening.atom)
        });
        if duplicate {
            return Err(SmilesError::RingClosure { ring, pos });
        }
        let order = match (opening.order, pending) {
            (Some(a), Some(b)) if a != b => return Err(SmilesError::RingClosure { ring, pos }),
            (Some(order), _) | (None, Some(order)) => order,
            (None, None) => self.default_order(opening.atom, current),
        };
        self.bonds.push(Bond {
            begin: opening.atom,
            end: current,
            order,
            kekule: localised(order),
        });
        Ok(())
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.atoms[a].aromatic && self.atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn push_atom(&mut self, atom: Atom) {
        let index = self.atoms.len();
        self.atoms.push(atom);
        if let Some(prev) = self.prev {
            let order = match self.pending.take() {
                Some((order, _)) => order,
                None => self.default_order(prev, index),
            };
            self.bonds.push(Bond {
                begin: prev,
                end: index,
                order,
                kekule: localised(order),
            });
        }
        self.pending = None;
        self.prev = Some(index);
    }
}

fn lookup(symbol: &str, pos: usize) -> Result<&'static Element, SmilesError> {
    element_by_symbol(symbol).ok_or_else(|| SmilesError::UnknownElement {
        symbol: symbol.to_string(),
        pos,
    })
}

/// Placeholder localised order; aromatic bonds are fixed up by kekulization.
fn localised(order: BondOrder) -> BondOrder {
    match order {
        BondOrder::Aromatic => BondOrder::Single,
        other => other,
    }
}

/// Assign hydrogens, check valences, localise aromatic bonds and fold
/// explicit hydrogens.
fn sanitize(atoms: Vec<Atom>, mut bonds: Vec<Bond>) -> Result<Molecule, SmilesError> {
    let rings = RingInfo::perceive(&Molecule::new(atoms.clone(), bonds.clone()));

    if let Some(atom) = (0..atoms.len()).find(|&a| atoms[a].aromatic && !rings.ring_atoms[a]) {
        return Err(SmilesError::AromaticOutsideRing { atom });
    }
    // Bonds joining aromatic atoms across rings (biphenyl) are single.
    for (index, bond) in bonds.iter_mut().enumerate() {
        if bond.order == BondOrder::Aromatic && !rings.ring_bonds[index] {
            bond.order = BondOrder::Single;
            bond.kekule = BondOrder::Single;
        }
    }

    let mut mol = Molecule::new(atoms, bonds);
    let mut needs_double = vec![false; mol.atom_count()];

    for index in 0..mol.atom_count() {
        let sigma: u8 = mol
            .neighbors(index)
            .iter()
            .map(|&(_, b)| match mol.bonds[b].order {
                BondOrder::Aromatic => 1,
                order => order.as_f64() as u8,
            })
            .sum();
        let atom = &mol.atoms[index];
        let symbol = atom.element.symbol;
        let too_many = |valence: u8| SmilesError::Valence {
            atom: index,
            symbol,
            valence,
        };

        if !atom.bracketed {
            let valence = atom.element.valence_at_least(sigma).ok_or(too_many(sigma))?;
            let free = valence - sigma;
            let (hydrogens, double) = if atom.aromatic && free >= 1 {
                (free - 1, true)
            } else if atom.aromatic {
                (0, false)
            } else {
                (free, false)
            };
            mol.atoms[index].hydrogens = hydrogens;
            needs_double[index] = double;
            continue;
        }

        let used = sigma + atom.hydrogens;
        let allowed = allowed_valences(atom.atomic_number(), atom.charge);
        if allowed.is_empty() {
            continue;
        }
        let valence = allowed
            .iter()
            .copied()
            .find(|&v| v >= used)
            .ok_or(too_many(used))?;
        if atom.aromatic {
            needs_double[index] = valence > used;
        } else {
            mol.atoms[index].radical_electrons = valence - used;
        }
    }

    kekulize(&mut mol, &needs_double)?;
    perceive_aromaticity(&mut mol, &rings);
    Ok(fold_hydrogens(mol))
}

/// Choose double bonds so every atom in `needs_double` gets exactly one.
fn kekulize(mol: &mut Molecule, needs_double: &[bool]) -> Result<(), SmilesError> {
    if !needs_double.iter().any(|&n| n) {
        return Ok(());
    }
    let mut matched = vec![false; mol.atom_count()];
    let mut chosen = Vec::new();
    let mut steps = 0usize;
    if !match_doubles(mol, needs_double, &mut matched, &mut chosen, &mut steps) {
        return Err(SmilesError::Kekulize);
    }
    for bond in &mut mol.bonds {
        if bond.order == BondOrder::Aromatic {
            bond.kekule = BondOrder::Single;
        }
    }
    for bond in chosen {
        mol.bonds[bond].kekule = BondOrder::Double;
    }
    Ok(())
}

fn match_doubles(
    mol: &Molecule,
    needs_double: &[bool],
    matched: &mut [bool],
    chosen: &mut Vec<usize>,
    steps: &mut usize,
) -> bool {
    *steps += 1;
    if *steps > KEKULIZE_STEP_LIMIT {
        return false;
    }
    let partners = |atom: usize, matched: &[bool]| -> Vec<(usize, usize)> {
        mol.neighbors(atom)
            .iter()
            .copied()
            .filter(|&(n, b)| {
                mol.bonds[b].order == BondOrder::Aromatic && needs_double[n] && !matched[n]
            })
            .collect()
    };

    // Most constrained atom first.
    let next = (0..mol.atom_count())
        .filter(|&a| needs_double[a] && !matched[a])
        .min_by_key(|&a| partners(a, matched).len());
    let Some(atom) = next else {
        return true;
    };

    for (partner, bond) in partners(atom, matched) {
        matched[atom] = true;
        matched[partner] = true;
        chosen.push(bond);
        if match_doubles(mol, needs_double, matched, chosen, steps) {
            return true;
        }
        chosen.pop();
        matched[atom] = false;
        matched[partner] = false;
    }
    false
}

/// Pi electrons an atom donates to a ring, `None` when it cannot be part of
/// an aromatic ring at all.
fn pi_electrons(mol: &Molecule, atom: usize, ring_bonds: &[bool]) -> Option<u32> {
    let a = &mol.atoms[atom];
    let mut double_in_ring = false;
    let mut exocyclic_hetero = false;
    for &(n, bond) in mol.neighbors(atom) {
        match mol.bonds[bond].kekule {
            BondOrder::Triple => return None,
            BondOrder::Double if ring_bonds[bond] => double_in_ring = true,
            BondOrder::Double if !mol.atoms[n].is_carbon() => exocyclic_hetero = true,
            BondOrder::Double => return None,
            _ => {}
        }
    }
    if double_in_ring {
        return Some(1);
    }
    if exocyclic_hetero {
        return Some(0);
    }
    let connections = mol.degree(atom) + usize::from(a.hydrogens);
    match (a.atomic_number(), a.charge) {
        (6, -1) => Some(2),
        (6, 1) | (5, 0) => Some(0),
        (7 | 15, 0) if connections == 3 => Some(2),
        (7 | 15, -1) if connections == 2 => Some(2),
        (8 | 16 | 34 | 52, 0) if connections == 2 => Some(2),
        _ => None,
    }
}

/// Mark rings (and fused ring pairs) with 4n+2 pi electrons aromatic, so
/// Kekulé and aromatic spellings of a structure end up identical.
fn perceive_aromaticity(mol: &mut Molecule, rings: &RingInfo) {
    let electrons: Vec<Option<u32>> = (0..mol.atom_count())
        .map(|atom| pi_electrons(mol, atom, &rings.ring_bonds))
        .collect();
    let huckel = |atoms: &[usize]| {
        atoms
            .iter()
            .map(|&a| electrons[a])
            .sum::<Option<u32>>()
            .is_some_and(|e| e >= 2 && (e - 2) % 4 == 0)
    };

    let mut aromatic: Vec<bool> = rings.rings.iter().map(|r| huckel(r)).collect();
    for i in 0..rings.count() {
        for j in i + 1..rings.count() {
            if aromatic[i] && aromatic[j] {
                continue;
            }
            let (a, b) = (&rings.rings[i], &rings.rings[j]);
            if a.iter().filter(|atom| b.contains(atom)).count() < 2 {
                continue;
            }
            let mut union: Vec<usize> = a.iter().chain(b).copied().collect();
            union.sort_unstable();
            union.dedup();
            if huckel(&union) {
                aromatic[i] = true;
                aromatic[j] = true;
            }
        }
    }

    for (ring, _) in rings.rings.iter().zip(&aromatic).filter(|(_, &ar)| ar) {
        for &atom in ring {
            mol.atoms[atom].aromatic = true;
        }
        for bond in ring_bond_indices(mol, ring) {
            mol.bonds[bond].order = BondOrder::Aromatic;
        }
    }
}

/// Fold plain `[H]` atoms into the hydrogen count of their neighbour.
fn fold_hydrogens(mol: Molecule) -> Molecule {
    let foldable: Vec<bool> = (0..mol.atom_count())
        .map(|a| {
            let atom = &mol.atoms[a];
            atom.is_hydrogen()
                && atom.isotope.is_none()
                && atom.charge == 0
                && mol.degree(a) == 1
                && mol.neighbors(a).iter().all(|&(n, b)| {
                    !mol.atoms[n].is_hydrogen() && mol.bonds[b].order == BondOrder::Single
                })
        })
        .collect();
    if !foldable.iter().any(|&f| f) {
        return mol;
    }

    let mut atoms = mol.atoms.clone();
    for (a, _) in foldable.iter().enumerate().filter(|(_, &f)| f) {
        let (heavy, _) = mol.neighbors(a)[0];
        atoms[heavy].hydrogens = atoms[heavy].hydrogens.saturating_add(1);
    }

    let mut remap = vec![usize::MAX; atoms.len()];
    let mut kept = Vec::with_capacity(atoms.len());
    for (index, atom) in atoms.into_iter().enumerate() {
        if !foldable[index] {
            remap[index] = kept.len();
            kept.push(atom);
        }
    }
    let bonds = mol
        .bonds
        .iter()
        .filter(|b| !foldable[b.begin] && !foldable[b.end])
        .map(|b| Bond {
            begin: remap[b.begin],
            end: remap[b.end],
            ..*b
        })
        .collect();
    Molecule::new(kept, bonds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hydrogens(smiles: &str) -> Vec<u8> {
        parse_smiles(smiles)
            .unwrap()
            .atoms
            .iter()
            .map(|a| a.hydrogens)
            .collect()
    }

    #[test]
    fn ethanol_implicit_hydrogens() {
        assert_eq!(hydrogens("CCO"), vec![3, 2, 1]);
    }

    #[test]
    fn benzene_is_kekulized() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        assert_eq!(mol.bond_count(), 6);
        assert!(mol.atoms.iter().all(|a| a.aromatic && a.hydrogens == 1));
        let doubles = mol
            .bonds
            .iter()
            .filter(|b| b.kekule == BondOrder::Double)
            .count();
        assert_eq!(doubles, 3);
        for atom in 0..6 {
            assert_eq!(mol.explicit_valence(atom), 3);
        }
    }

    #[test]
    fn heteroaromatics() {
        assert_eq!(hydrogens("c1ccncc1"), vec![1, 1, 1, 0, 1, 1]);
        assert_eq!(hydrogens("c1cc[nH]c1"), vec![1, 1, 1, 1, 1]);
        assert_eq!(hydrogens("c1ccsc1"), vec![1, 1, 1, 0, 1]);
        assert!(parse_smiles("Cn1cccc1").is_ok());
        // pyrrole nitrogen without its hydrogen
        assert_eq!(parse_smiles("c1ccnc1").unwrap_err(), SmilesError::Kekulize);
    }

    #[test]
    fn kekule_input_is_perceived_aromatic() {
        let kekule = parse_smiles("C1=CC=CC=C1").unwrap();
        assert!(kekule.atoms.iter().all(|a| a.aromatic));
        assert!(kekule.bonds.iter().all(|b| b.is_aromatic()));

        let caffeine = parse_smiles("CN1C=NC2=C1C(=O)N(C(=O)N2C)C").unwrap();
        assert_eq!(caffeine.atoms.iter().filter(|a| a.aromatic).count(), 9);

        for not_aromatic in ["C1=CCCCC1", "C1=CC=CC1", "O=C1C=CC(=O)C=C1"] {
            let mol = parse_smiles(not_aromatic).unwrap();
            assert!(mol.atoms.iter().all(|a| !a.aromatic), "{not_aromatic}");
        }
    }

    #[test]
    fn fused_pair_is_checked_as_a_whole() {
        // azulene: neither ring alone has 4n+2 electrons
        let mol = parse_smiles("C1=CC2=CC=CC=CC2=C1").unwrap();
        assert!(mol.atoms.iter().all(|a| a.aromatic));
    }

    #[test]
    fn biphenyl_link_is_single() {
        let mol = parse_smiles("c1ccccc1c1ccccc1").unwrap();
        assert_eq!(mol.bonds[6].order, BondOrder::Single);
        assert_eq!(mol.atoms[5].hydrogens, 0);
    }

    #[test]
    fn branches_and_ring_closures() {
        let mol = parse_smiles("CC(C)(C)C").unwrap();
        assert_eq!(mol.degree(1), 4);
        let mol = parse_smiles("C%10CCCCC%10").unwrap();
        assert_eq!(mol.bond_count(), 6);
        let mol = parse_smiles("C=1CCCCC=1").unwrap();
        assert_eq!(mol.bonds[5].order, BondOrder::Double);
    }

    #[test]
    fn bracket_atoms() {
        let mol = parse_smiles("[NH4+]").unwrap();
        assert_eq!(mol.atoms[0].charge, 1);
        assert_eq!(mol.atoms[0].hydrogens, 4);

        let mol = parse_smiles("C[N+](=O)[O-]").unwrap();
        assert_eq!(mol.atoms[3].charge, -1);

        let mol = parse_smiles("[13CH4]").unwrap();
        assert_eq!(mol.atoms[0].isotope, Some(13));

        let mol = parse_smiles("N[C@@H](C)C(=O)O").unwrap();
        assert_eq!(mol.atoms[1].hydrogens, 1);

        let mol = parse_smiles("[CH3]").unwrap();
        assert_eq!(mol.atoms[0].radical_electrons, 1);

        assert!(parse_smiles("[Na+].[Cl-]").is_ok());
        assert!(parse_smiles("c1cc[se]c1").is_ok());
    }

    #[test]
    fn bracket_atoms_accept_any_element() {
        for smiles in ["[Tl+]", "[Be+2]", "[Cs+].[Cl-]", "[Xe]", "[Gd+3]", "[V]", "[Og]"] {
            assert!(is_valid_smiles(smiles), "rejected {smiles:?}");
        }
        let mol = parse_smiles("[Be+2]").unwrap();
        assert_eq!(mol.atoms[0].atomic_number(), 4);
        assert_eq!(mol.atoms[0].charge, 2);
        assert_eq!(parse_smiles("Cl[Hg]Cl").unwrap().atoms[1].atomic_number(), 80);
    }

    #[test]
    fn unknown_two_letter_symbol_is_reported() {
        assert_eq!(
            parse_smiles("[Bx+2]").unwrap_err(),
            SmilesError::UnknownElement {
                symbol: "Bx".to_string(),
                pos: 1
            }
        );
        assert!(matches!(
            parse_smiles("C[Qq]"),
            Err(SmilesError::UnknownElement { pos: 2, .. })
        ));
    }

    #[test]
    fn explicit_hydrogens_are_folded() {
        let mol = parse_smiles("[H]OC([H])([H])[H]").unwrap();
        assert_eq!(mol.atom_count(), 2);
        assert_eq!(mol.total_hydrogens(), 4);
        // molecular hydrogen keeps its atoms
        assert_eq!(parse_smiles("[H][H]").unwrap().atom_count(), 2);
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in [
            "",
            "not a smiles",
            "CCO ",
            "C(",
            "C)",
            "()C",
            "C()C",
            "C1CC",
            "C11",
            "C12CC12",
            "C=",
            "=C",
            "C..C",
            "C.",
            "[C",
            "[Xx]",
            "[]",
            "Q",
            "C$C",
            "C%1",
        ] {
            assert!(parse_smiles(bad).is_err(), "accepted {bad:?}");
            assert!(!is_valid_smiles(bad));
        }
    }

    #[test]
    fn rejects_impossible_chemistry() {
        assert!(matches!(
            parse_smiles("C(C)(C)(C)(C)C"),
            Err(SmilesError::Valence { atom: 0, .. })
        ));
        assert!(matches!(parse_smiles("O=O=O"), Err(SmilesError::Valence { .. })));
        assert!(matches!(
            parse_smiles("cC"),
            Err(SmilesError::AromaticOutsideRing { atom: 0 })
        ));
        assert_eq!(parse_smiles("c1cccc1").unwrap_err(), SmilesError::Kekulize);
    }

    #[test]
    fn whitespace_reports_position() {
        assert_eq!(
            parse_smiles("not a smiles").unwrap_err(),
            SmilesError::UnexpectedChar { ch: 't', pos: 2 }
        );
    }
}
