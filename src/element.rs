//! Periodic table data used by the SMILES parser and the descriptor engine.
//!
//! Every element from hydrogen to oganesson is tabulated, indexed by atomic
//! number. Radioactive elements carry the mass of their longest-lived
//! isotope; f-block elements count three valence electrons.

/// A chemical element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    /// Atomic number (Z).
    pub atomic_number: u8,
    /// Element symbol with conventional capitalisation.
    pub symbol: &'static str,
    /// Standard atomic weight (Daltons).
    pub average_mass: f64,
    /// Mass of the most abundant isotope (Daltons).
    pub monoisotopic_mass: f64,
    /// Number of valence-shell electrons.
    pub outer_electrons: u8,
    /// Allowed valences, lowest first. Empty when the element has no
    /// well-defined default valence (transition metals, noble gases).
    pub valences: &'static [u8],
    /// Covalent bond radius in Å.
    pub bond_radius: f64,
}

impl Element {
    /// Lowest allowed valence that is at least `used`, if any.
    pub fn valence_at_least(&self, used: u8) -> Option<u8> {
        self.valences.iter().copied().find(|&v| v >= used)
    }
}

macro_rules! element {
    ($z:expr, $sym:expr, $avg:expr, $mono:expr, $outer:expr, $val:expr, $rb:expr) => {
        Element {
            atomic_number: $z,
            symbol: $sym,
            average_mass: $avg,
            monoisotopic_mass: $mono,
            outer_electrons: $outer,
            valences: $val,
            bond_radius: $rb,
        }
    };
}

#[rustfmt::skip]
static ELEMENTS: [Element; 118] = [
    element!(1,   "H",  1.008,     1.00782503223,  1,  &[1],       0.33),
    element!(2,   "He", 4.002602,  4.00260325413,  2,  &[],        0.70),
    element!(3,   "Li", 6.94,      7.0160034366,   1,  &[1],       1.23),
    element!(4,   "Be", 9.0121831, 9.012183065,    2,  &[2],       0.90),
    element!(5,   "B",  10.81,     11.00930536,    3,  &[3],       0.88),
    element!(6,   "C",  12.011,    12.0,           4,  &[4],       0.77),
    element!(7,   "N",  14.007,    14.00307400443, 5,  &[3],       0.70),
    element!(8,   "O",  15.999,    15.99491461956, 6,  &[2],       0.66),
    element!(9,   "F",  18.998,    18.99840316273, 7,  &[1],       0.64),
    element!(10,  "Ne", 20.1797,   19.9924401762,  8,  &[],        0.70),
    element!(11,  "Na", 22.990,    22.9897692820,  1,  &[1],       1.54),
    element!(12,  "Mg", 24.305,    23.985041697,   2,  &[2],       1.36),
    element!(13,  "Al", 26.982,    26.98153853,    3,  &[3],       1.18),
    element!(14,  "Si", 28.085,    27.97692653465, 4,  &[4],       1.17),
    element!(15,  "P",  30.974,    30.97376199842, 5,  &[3, 5, 7], 1.10),
    element!(16,  "S",  32.067,    31.9720711744,  6,  &[2, 4, 6], 1.04),
    element!(17,  "Cl", 35.453,    34.968852682,   7,  &[1],       0.99),
    element!(18,  "Ar", 39.948,    39.9623831237,  8,  &[],        0.97),
    element!(19,  "K",  39.098,    38.9637064864,  1,  &[1],       2.03),
    element!(20,  "Ca", 40.078,    39.962590863,   2,  &[2],       1.74),
    element!(21,  "Sc", 44.955908, 44.95590828,    3,  &[],        1.44),
    element!(22,  "Ti", 47.867,    47.94794198,    4,  &[],        1.32),
    element!(23,  "V",  50.9415,   50.94395704,    5,  &[],        1.22),
    element!(24,  "Cr", 51.996,    51.9405062,     6,  &[],        1.18),
    element!(25,  "Mn", 54.938,    54.93804391,    7,  &[],        1.17),
    element!(26,  "Fe", 55.845,    55.93493633,    8,  &[],        1.17),
    element!(27,  "Co", 58.933,    58.93319429,    9,  &[],        1.16),
    element!(28,  "Ni", 58.693,    57.93534241,    10, &[],        1.15),
    element!(29,  "Cu", 63.546,    62.92959772,    11, &[],        1.17),
    element!(30,  "Zn", 65.38,     63.92914201,    2,  &[],        1.25),
    element!(31,  "Ga", 69.723,    68.9255735,     3,  &[3],       1.26),
    element!(32,  "Ge", 72.630,    73.921177761,   4,  &[4],       1.22),
    element!(33,  "As", 74.922,    74.92159457,    5,  &[3, 5],    1.20),
    element!(34,  "Se", 78.971,    79.9165218,     6,  &[2, 4, 6], 1.17),
    element!(35,  "Br", 79.904,    78.9183376,     7,  &[1],       1.14),
    element!(36,  "Kr", 83.798,    83.9114977282,  8,  &[],        1.10),
    element!(37,  "Rb", 85.4678,   84.9117897379,  1,  &[1],       2.16),
    element!(38,  "Sr", 87.62,     87.9056125,     2,  &[2],       1.91),
    element!(39,  "Y",  88.90584,  88.9058403,     3,  &[],        1.62),
    element!(40,  "Zr", 91.224,    89.9046977,     4,  &[],        1.45),
    element!(41,  "Nb", 92.90637,  92.906373,      5,  &[],        1.34),
    element!(42,  "Mo", 95.95,     97.90540482,    6,  &[],        1.30),
    element!(43,  "Tc", 98.0,      97.9072124,     7,  &[],        1.27),
    element!(44,  "Ru", 101.07,    101.9043441,    8,  &[],        1.25),
    element!(45,  "Rh", 102.90550, 102.905498,     9,  &[],        1.25),
    element!(46,  "Pd", 106.42,    105.9034804,    10, &[],        1.28),
    element!(47,  "Ag", 107.868,   106.9050916,    11, &[],        1.34),
    element!(48,  "Cd", 112.414,   113.90336509,   2,  &[],        1.48),
    element!(49,  "In", 114.818,   114.903878776,  3,  &[3],       1.44),
    element!(50,  "Sn", 118.710,   119.90220163,   4,  &[2, 4],    1.40),
    element!(51,  "Sb", 121.760,   120.903812,     5,  &[3, 5],    1.40),
    element!(52,  "Te", 127.60,    129.906222748,  6,  &[2, 4, 6], 1.37),
    element!(53,  "I",  126.904,   126.9044719,    7,  &[1, 3, 5], 1.33),
    element!(54,  "Xe", 131.293,   131.9041550856, 8,  &[],        1.30),
    element!(55,  "Cs", 132.90545, 132.905451961,  1,  &[1],       2.35),
    element!(56,  "Ba", 137.327,   137.905247,     2,  &[2],       1.98),
    element!(57,  "La", 138.90547, 138.9063563,    3,  &[],        1.69),
    element!(58,  "Ce", 140.116,   139.9054431,    3,  &[],        1.65),
    element!(59,  "Pr", 140.90766, 140.9076576,    3,  &[],        1.65),
    element!(60,  "Nd", 144.242,   141.907729,     3,  &[],        1.64),
    element!(61,  "Pm", 145.0,     144.9127559,    3,  &[],        1.63),
    element!(62,  "Sm", 150.36,    151.9197397,    3,  &[],        1.62),
    element!(63,  "Eu", 151.964,   152.921238,     3,  &[],        1.85),
    element!(64,  "Gd", 157.25,    157.9241123,    3,  &[],        1.61),
    element!(65,  "Tb", 158.92535, 158.9253547,    3,  &[],        1.59),
    element!(66,  "Dy", 162.500,   163.9291819,    3,  &[],        1.59),
    element!(67,  "Ho", 164.93033, 164.9303288,    3,  &[],        1.58),
    element!(68,  "Er", 167.259,   165.9302995,    3,  &[],        1.57),
    element!(69,  "Tm", 168.93422, 168.9342179,    3,  &[],        1.56),
    element!(70,  "Yb", 173.045,   173.9388664,    3,  &[],        1.74),
    element!(71,  "Lu", 174.9668,  174.9407752,    3,  &[],        1.56),
    element!(72,  "Hf", 178.49,    179.9465570,    4,  &[],        1.44),
    element!(73,  "Ta", 180.94788, 180.9479958,    5,  &[],        1.34),
    element!(74,  "W",  183.84,    183.95093092,   6,  &[],        1.30),
    element!(75,  "Re", 186.207,   186.9557501,    7,  &[],        1.28),
    element!(76,  "Os", 190.23,    191.9614770,    8,  &[],        1.26),
    element!(77,  "Ir", 192.217,   192.9629216,    9,  &[],        1.27),
    element!(78,  "Pt", 195.084,   194.9647917,    10, &[],        1.30),
    element!(79,  "Au", 196.967,   196.96656879,   11, &[],        1.34),
    element!(80,  "Hg", 200.592,   201.9706434,    2,  &[],        1.49),
    element!(81,  "Tl", 204.38,    204.9744278,    3,  &[1, 3],    1.48),
    element!(82,  "Pb", 207.2,     207.9766525,    4,  &[2, 4],    1.46),
    element!(83,  "Bi", 208.980,   208.9803991,    5,  &[3, 5],    1.46),
    element!(84,  "Po", 209.0,     208.9824308,    6,  &[2, 4, 6], 1.46),
    element!(85,  "At", 210.0,     209.9871479,    7,  &[1],       1.45),
    element!(86,  "Rn", 222.0,     222.0175782,    8,  &[],        1.45),
    element!(87,  "Fr", 223.0,     223.0197360,    1,  &[1],       2.60),
    element!(88,  "Ra", 226.0,     226.0254103,    2,  &[2],       2.21),
    element!(89,  "Ac", 227.0,     227.0277523,    3,  &[],        2.15),
    element!(90,  "Th", 232.0377,  232.0380558,    4,  &[],        2.06),
    element!(91,  "Pa", 231.03588, 231.0358842,    5,  &[],        2.00),
    element!(92,  "U",  238.02891, 238.0507884,    6,  &[],        1.96),
    element!(93,  "Np", 237.0,     237.0481736,    3,  &[],        1.90),
    element!(94,  "Pu", 244.0,     244.0642053,    3,  &[],        1.87),
    element!(95,  "Am", 243.0,     243.0613813,    3,  &[],        1.80),
    element!(96,  "Cm", 247.0,     247.0703541,    3,  &[],        1.69),
    element!(97,  "Bk", 247.0,     247.0703073,    3,  &[],        1.60),
    element!(98,  "Cf", 251.0,     251.0795886,    3,  &[],        1.60),
    element!(99,  "Es", 252.0,     252.082980,     3,  &[],        1.60),
    element!(100, "Fm", 257.0,     257.0951061,    3,  &[],        1.60),
    element!(101, "Md", 258.0,     258.0984315,    3,  &[],        1.60),
    element!(102, "No", 259.0,     259.10103,      3,  &[],        1.60),
    element!(103, "Lr", 262.0,     262.10961,      3,  &[],        1.60),
    element!(104, "Rf", 267.0,     267.12179,      4,  &[],        1.57),
    element!(105, "Db", 268.0,     268.12567,      5,  &[],        1.49),
    element!(106, "Sg", 269.0,     269.12863,      6,  &[],        1.43),
    element!(107, "Bh", 270.0,     270.13336,      7,  &[],        1.41),
    element!(108, "Hs", 269.0,     269.13375,      8,  &[],        1.34),
    element!(109, "Mt", 278.0,     278.15631,      9,  &[],        1.29),
    element!(110, "Ds", 281.0,     281.16451,      10, &[],        1.28),
    element!(111, "Rg", 282.0,     282.16912,      11, &[],        1.21),
    element!(112, "Cn", 285.0,     285.17712,      12, &[],        1.22),
    element!(113, "Nh", 286.0,     286.18221,      3,  &[],        1.36),
    element!(114, "Fl", 289.0,     289.19042,      4,  &[],        1.43),
    element!(115, "Mc", 290.0,     290.19598,      5,  &[],        1.62),
    element!(116, "Lv", 293.0,     293.20449,      6,  &[],        1.75),
    element!(117, "Ts", 294.0,     294.21046,      7,  &[],        1.65),
    element!(118, "Og", 294.0,     294.21392,      8,  &[],        1.57),
];

/// Look up an element by symbol (case-sensitive, e.g. `"Cl"`).
pub fn element_by_symbol(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

/// Look up an element by atomic number.
pub fn element_by_number(atomic_number: u8) -> Option<&'static Element> {
    let index = usize::from(atomic_number).checked_sub(1)?;
    ELEMENTS.get(index)
}

/// Allowed valences for an atom of `atomic_number` carrying `charge`.
///
/// Charged main-group atoms take the valences of their isoelectronic neutral
/// neighbour (N+ behaves like C, O- like F, ...). Returns an empty slice when
/// no valence rule applies, in which case the atom is not valence-checked.
pub fn allowed_valences(atomic_number: u8, charge: i8) -> &'static [u8] {
    let effective = atomic_number as i16 - charge as i16;
    let Ok(effective) = u8::try_from(effective) else {
        return &[];
    };
    match (atomic_number, effective) {
        // Only the organic main-group elements follow the isoelectronic rule.
        (5..=9 | 14..=17 | 33..=35 | 52 | 53, 5..=9 | 14..=17 | 33..=35 | 52 | 53) => {
            element_by_number(effective).map_or(&[], |e| e.valences)
        }
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_symbol_and_number_agree() {
        let cl = element_by_symbol("Cl").unwrap();
        assert_eq!(cl.atomic_number, 17);
        assert_eq!(element_by_number(17).unwrap().symbol, "Cl");
        assert!(element_by_symbol("Xx").is_none());
        assert!(element_by_symbol("cl").is_none());
    }

    #[test]
    fn charged_atoms_use_isoelectronic_valences() {
        assert_eq!(allowed_valences(7, 1), &[4]);
        assert_eq!(allowed_valences(8, -1), &[1]);
        assert_eq!(allowed_valences(6, -1), &[3]);
        assert_eq!(allowed_valences(7, 0), &[3]);
        // halide anions and metals are not checked
        assert!(allowed_valences(17, -1).is_empty());
        assert!(allowed_valences(26, 2).is_empty());
    }

    #[test]
    fn lowest_fitting_valence() {
        let s = element_by_symbol("S").unwrap();
        assert_eq!(s.valence_at_least(1), Some(2));
        assert_eq!(s.valence_at_least(3), Some(4));
        assert_eq!(s.valence_at_least(7), None);
    }
}
