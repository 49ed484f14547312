use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh",
    "Fl", "Mc", "Lv", "Ts", "Og",
];

static ATOMIC_NUMBERS: Map<&'static str, u8> = phf_map! {
    "H" => 1, "He" => 2, "Li" => 3, "Be" => 4, "B" => 5, "C" => 6, "N" => 7, "O" => 8,
    "F" => 9, "Ne" => 10, "Na" => 11, "Mg" => 12, "Al" => 13, "Si" => 14, "P" => 15,
    "S" => 16, "Cl" => 17, "Ar" => 18, "K" => 19, "Ca" => 20, "Sc" => 21, "Ti" => 22,
    "V" => 23, "Cr" => 24, "Mn" => 25, "Fe" => 26, "Co" => 27, "Ni" => 28, "Cu" => 29,
    "Zn" => 30, "Ga" => 31, "Ge" => 32, "As" => 33, "Se" => 34, "Br" => 35, "Kr" => 36,
    "Rb" => 37, "Sr" => 38, "Y" => 39, "Zr" => 40, "Nb" => 41, "Mo" => 42, "Tc" => 43,
    "Ru" => 44, "Rh" => 45, "Pd" => 46, "Ag" => 47, "Cd" => 48, "In" => 49, "Sn" => 50,
    "Sb" => 51, "Te" => 52, "I" => 53, "Xe" => 54, "Cs" => 55, "Ba" => 56, "La" => 57,
    "Ce" => 58, "Pr" => 59, "Nd" => 60, "Pm" => 61, "Sm" => 62, "Eu" => 63, "Gd" => 64,
    "Tb" => 65, "Dy" => 66, "Ho" => 67, "Er" => 68, "Tm" => 69, "Yb" => 70, "Lu" => 71,
    "Hf" => 72, "Ta" => 73, "W" => 74, "Re" => 75, "Os" => 76, "Ir" => 77, "Pt" => 78,
    "Au" => 79, "Hg" => 80, "Tl" => 81, "Pb" => 82, "Bi" => 83, "Po" => 84, "At" => 85,
    "Rn" => 86, "Fr" => 87, "Ra" => 88, "Ac" => 89, "Th" => 90, "Pa" => 91, "U" => 92,
    "Np" => 93, "Pu" => 94, "Am" => 95, "Cm" => 96, "Bk" => 97, "Cf" => 98, "Es" => 99,
    "Fm" => 100, "Md" => 101, "No" => 102, "Lr" => 103, "Rf" => 104, "Db" => 105,
    "Sg" => 106, "Bh" => 107, "Hs" => 108, "Mt" => 109, "Ds" => 110, "Rg" => 111,
    "Cn" => 112, "Nh" => 113, "Fl" => 114, "Mc" => 115, "Lv" => 116, "Ts" => 117,
    "Og" => 118,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ElementError {
    #[error("Unknown element symbol: '{0}'")]
    UnknownSymbol(String),
    #[error("Atomic number {0} is outside the periodic table (1-118)")]
    InvalidAtomicNumber(u32),
}

/// A chemical element identified by its atomic number.
///
/// Symbols are matched case-sensitively (`"Na"`, not `"NA"`), which is how
/// ExtXYZ files and the Materials Project both spell them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element(u8);

impl Element {
    pub fn from_symbol(symbol: &str) -> Result<Self, ElementError> {
        ATOMIC_NUMBERS
            .get(symbol)
            .map(|&z| Element(z))
            .ok_or_else(|| ElementError::UnknownSymbol(symbol.to_string()))
    }

    pub fn from_atomic_number(z: u32) -> Result<Self, ElementError> {
        if (1..=SYMBOLS.len() as u32).contains(&z) {
            Ok(Element(z as u8))
        } else {
            Err(ElementError::InvalidAtomicNumber(z))
        }
    }

    pub fn atomic_number(self) -> u8 {
        self.0
    }

    pub fn symbol(self) -> &'static str {
        SYMBOLS[self.0 as usize - 1]
    }
}

impl FromStr for Element {
    type Err = ElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbol(s.trim())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_table_and_lookup_map_agree() {
        for (i, symbol) in SYMBOLS.iter().enumerate() {
            let element = Element::from_symbol(symbol).unwrap();
            assert_eq!(element.atomic_number() as usize, i + 1);
            assert_eq!(element.symbol(), *symbol);
        }
        assert_eq!(ATOMIC_NUMBERS.len(), SYMBOLS.len());
    }

    #[test]
    fn from_str_parses_common_symbols() {
        assert_eq!("Na".parse::<Element>().unwrap().atomic_number(), 11);
        assert_eq!(" O ".parse::<Element>().unwrap().atomic_number(), 8);
        assert_eq!("Og".parse::<Element>().unwrap().atomic_number(), 118);
    }

    #[test]
    fn from_str_is_case_sensitive() {
        assert_eq!(
            "NA".parse::<Element>(),
            Err(ElementError::UnknownSymbol("NA".to_string()))
        );
        assert!("na".parse::<Element>().is_err());
    }

    #[test]
    fn from_atomic_number_rejects_out_of_range_values() {
        assert!(Element::from_atomic_number(0).is_err());
        assert!(Element::from_atomic_number(119).is_err());
        assert_eq!(Element::from_atomic_number(26).unwrap().symbol(), "Fe");
    }

    #[test]
    fn display_writes_symbol() {
        let li = Element::from_symbol("Li").unwrap();
        assert_eq!(li.to_string(), "Li");
    }

    #[test]
    fn elements_order_by_atomic_number() {
        let h = Element::from_symbol("H").unwrap();
        let o = Element::from_symbol("O").unwrap();
        let na = Element::from_symbol("Na").unwrap();
        let mut v = vec![na, h, o];
        v.sort();
        assert_eq!(v, vec![h, o, na]);
    }
}
