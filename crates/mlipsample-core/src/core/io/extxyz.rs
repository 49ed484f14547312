use crate::core::io::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::cell::Cell;
use crate::core::models::element::{Element, ElementError};
use crate::core::models::structure::{InfoValue, Structure};
use nalgebra::{Point3, Vector3};
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

const DEFAULT_PROPERTIES: &str = "species:S:1:pos:R:3";
const RESERVED_KEYS: [&str; 3] = ["lattice", "properties", "pbc"];

#[derive(Debug, Error)]
pub enum ExtxyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: ExtxyzParseErrorKind,
    },
}

#[derive(Debug, Error)]
pub enum ExtxyzParseErrorKind {
    #[error("Invalid atom count '{0}'")]
    InvalidAtomCount(String),
    #[error("Missing comment line after atom count")]
    MissingCommentLine,
    #[error("Unexpected end of input: expected {expected} atom lines, found {found}")]
    TruncatedFrame { expected: usize, found: usize },
    #[error("Expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },
    #[error("Invalid float value '{0}'")]
    InvalidFloat(String),
    #[error("Invalid integer value '{0}'")]
    InvalidInt(String),
    #[error(transparent)]
    Element(#[from] ElementError),
    #[error("Invalid Lattice value '{0}' (expected 9 numbers)")]
    InvalidLattice(String),
    #[error("Invalid pbc value '{0}' (expected 3 of T/F)")]
    InvalidPbc(String),
    #[error("Invalid Properties specification '{0}'")]
    InvalidProperties(String),
    #[error("Required property '{0}' is missing from Properties")]
    MissingProperty(&'static str),
    #[error("Unterminated quoted value in comment line")]
    UnterminatedQuote,
}

fn parse_err(line: usize, kind: ExtxyzParseErrorKind) -> ExtxyzError {
    ExtxyzError::Parse { line, kind }
}

#[derive(Debug, Clone, PartialEq)]
struct Property {
    name: String,
    kind: char,
    cols: usize,
}

fn parse_properties(spec: &str) -> Result<Vec<Property>, ExtxyzParseErrorKind> {
    let invalid = || ExtxyzParseErrorKind::InvalidProperties(spec.to_string());
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() % 3 != 0 {
        return Err(invalid());
    }
    parts
        .chunks(3)
        .map(|chunk| {
            let name = chunk[0];
            let mut kind_chars = chunk[1].chars();
            let kind = match (kind_chars.next(), kind_chars.next()) {
                (Some(k @ ('S' | 'R' | 'I' | 'L')), None) => k,
                _ => return Err(invalid()),
            };
            let cols: usize = chunk[2].parse().map_err(|_| invalid())?;
            if name.is_empty() || cols == 0 {
                return Err(invalid());
            }
            Ok(Property {
                name: name.to_string(),
                kind,
                cols,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum SpeciesColumn {
    Symbol(usize),
    AtomicNumber(usize),
}

/// Column offsets of the per-atom properties this reader understands.
#[derive(Debug, Clone)]
struct ColumnLayout {
    total: usize,
    species: SpeciesColumn,
    pos: usize,
    forces: Option<usize>,
}

impl ColumnLayout {
    fn from_properties(props: &[Property]) -> Result<Self, ExtxyzParseErrorKind> {
        let mut offset = 0;
        let mut species = None;
        let mut pos = None;
        let mut forces = None;

        for prop in props {
            match (prop.name.as_str(), prop.kind, prop.cols) {
                ("species", 'S', 1) => species = Some(SpeciesColumn::Symbol(offset)),
                ("Z", 'I', 1) if species.is_none() => {
                    species = Some(SpeciesColumn::AtomicNumber(offset))
                }
                ("pos", 'R', 3) => pos = Some(offset),
                ("forces" | "force", 'R', 3) => forces = Some(offset),
                _ => {}
            }
            offset += prop.cols;
        }

        Ok(Self {
            total: offset,
            species: species.ok_or(ExtxyzParseErrorKind::MissingProperty("species"))?,
            pos: pos.ok_or(ExtxyzParseErrorKind::MissingProperty("pos"))?,
            forces,
        })
    }

    fn parse_atom(&self, line: &str) -> Result<Atom, ExtxyzParseErrorKind> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != self.total {
            return Err(ExtxyzParseErrorKind::ColumnCount {
                expected: self.total,
                found: fields.len(),
            });
        }

        let element = match self.species {
            SpeciesColumn::Symbol(i) => Element::from_symbol(fields[i])?,
            SpeciesColumn::AtomicNumber(i) => {
                let z: u32 = fields[i]
                    .parse()
                    .map_err(|_| ExtxyzParseErrorKind::InvalidInt(fields[i].to_string()))?;
                Element::from_atomic_number(z)?
            }
        };

        let position = parse_vec3(&fields[self.pos..self.pos + 3])?;
        let mut atom = Atom::new(element, Point3::from(position));
        if let Some(f) = self.forces {
            atom.forces = Some(parse_vec3(&fields[f..f + 3])?);
        }
        Ok(atom)
    }
}

fn parse_float(s: &str) -> Result<f64, ExtxyzParseErrorKind> {
    s.parse()
        .map_err(|_| ExtxyzParseErrorKind::InvalidFloat(s.to_string()))
}

fn parse_vec3(fields: &[&str]) -> Result<Vector3<f64>, ExtxyzParseErrorKind> {
    Ok(Vector3::new(
        parse_float(fields[0])?,
        parse_float(fields[1])?,
        parse_float(fields[2])?,
    ))
}

fn parse_lattice(value: &str) -> Result<[f64; 9], ExtxyzParseErrorKind> {
    let numbers: Vec<f64> = value
        .split_whitespace()
        .map(|s| s.parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| ExtxyzParseErrorKind::InvalidLattice(value.to_string()))?;
    numbers
        .try_into()
        .map_err(|_| ExtxyzParseErrorKind::InvalidLattice(value.to_string()))
}

fn parse_pbc(value: &str) -> Result<[bool; 3], ExtxyzParseErrorKind> {
    let flags: Vec<bool> = value
        .split_whitespace()
        .map(|s| match s {
            "T" | "True" | "true" | "1" => Ok(true),
            "F" | "False" | "false" | "0" => Ok(false),
            _ => Err(ExtxyzParseErrorKind::InvalidPbc(value.to_string())),
        })
        .collect::<Result<_, _>>()?;
    flags
        .try_into()
        .map_err(|_| ExtxyzParseErrorKind::InvalidPbc(value.to_string()))
}

fn read_value(chars: &mut Peekable<Chars>) -> Result<String, ExtxyzParseErrorKind> {
    let mut value = String::new();
    if chars.peek() == Some(&'"') {
        chars.next();
        loop {
            match chars.next() {
                Some('"') => break,
                Some(c) => value.push(c),
                None => return Err(ExtxyzParseErrorKind::UnterminatedQuote),
            }
        }
    } else {
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            value.push(c);
            chars.next();
        }
    }
    Ok(value)
}

/// Splits a comment line into `key=value` pairs. Keys without `=` map to `None`.
fn parse_key_values(
    comment: &str,
) -> Result<Vec<(String, Option<String>)>, ExtxyzParseErrorKind> {
    let mut pairs = Vec::new();
    let mut chars = comment.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() || c == '=' {
                break;
            }
            key.push(c);
            chars.next();
        }

        let value = if chars.peek() == Some(&'=') {
            chars.next();
            Some(read_value(&mut chars)?)
        } else {
            None
        };

        if !key.is_empty() {
            pairs.push((key, value));
        }
    }
    Ok(pairs)
}

struct FrameHeader {
    cell: Option<Cell>,
    info: BTreeMap<String, InfoValue>,
    layout: ColumnLayout,
}

impl FrameHeader {
    fn parse(comment: &str) -> Result<Self, ExtxyzParseErrorKind> {
        let mut lattice = None;
        let mut pbc = None;
        let mut properties = None;
        let mut info = BTreeMap::new();

        for (key, value) in parse_key_values(comment)? {
            let lower = key.to_ascii_lowercase();
            match (lower.as_str(), value) {
                ("lattice", Some(v)) => lattice = Some(parse_lattice(&v)?),
                ("pbc", Some(v)) => pbc = Some(parse_pbc(&v)?),
                ("properties", Some(v)) => properties = Some(parse_properties(&v)?),
                (_, Some(v)) => {
                    info.insert(key, InfoValue::infer(&v));
                }
                (_, None) => {
                    info.insert(key, InfoValue::Bool(true));
                }
            }
        }

        let properties = match properties {
            Some(p) => p,
            None => parse_properties(DEFAULT_PROPERTIES)?,
        };

        Ok(Self {
            cell: lattice
                .filter(|l| l.iter().any(|&v| v != 0.0))
                .map(|l| Cell::from_flat(l, pbc.unwrap_or([true; 3]))),
            info,
            layout: ColumnLayout::from_properties(&properties)?,
        })
    }
}

fn format_comment(structure: &Structure, with_forces: bool) -> String {
    let mut parts = Vec::new();

    if let Some(cell) = &structure.cell {
        let lattice: Vec<String> = cell.flat().iter().map(|v| v.to_string()).collect();
        parts.push(format!("Lattice=\"{}\"", lattice.join(" ")));
    }

    let mut properties = DEFAULT_PROPERTIES.to_string();
    if with_forces {
        properties.push_str(":forces:R:3");
    }
    parts.push(format!("Properties={}", properties));

    for (key, value) in &structure.info {
        if RESERVED_KEYS.contains(&key.to_ascii_lowercase().as_str()) {
            continue;
        }
        let text = value.to_string();
        if text.is_empty() || text.contains(char::is_whitespace) {
            parts.push(format!("{}=\"{}\"", key, text));
        } else {
            parts.push(format!("{}={}", key, text));
        }
    }

    if let Some(cell) = &structure.cell {
        let flags: Vec<&str> = cell
            .pbc
            .iter()
            .map(|&p| if p { "T" } else { "F" })
            .collect();
        parts.push(format!("pbc=\"{}\"", flags.join(" ")));
    }

    parts.join(" ")
}

/// Extended XYZ reader and writer.
///
/// Each frame is an atom-count line, a comment line of `key=value` pairs
/// (`Lattice`, `Properties`, `pbc` and free-form per-frame info such as
/// `energy`), and one line per atom laid out according to `Properties`.
/// Per-atom columns other than species, positions and forces are skipped.
pub struct ExtxyzFile;

impl StructureFile for ExtxyzFile {
    type Error = ExtxyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Structure>, Self::Error> {
        let mut lines = reader
            .lines()
            .enumerate()
            .map(|(i, line)| line.map(|l| (i + 1, l)));
        let mut structures = Vec::new();

        while let Some(item) = lines.next() {
            let (line_num, line) = item?;
            let count_str = line.trim();
            if count_str.is_empty() {
                continue;
            }

            let n_atoms: usize = count_str.parse().map_err(|_| {
                parse_err(
                    line_num,
                    ExtxyzParseErrorKind::InvalidAtomCount(count_str.to_string()),
                )
            })?;

            let (comment_num, comment) = match lines.next() {
                Some(item) => item?,
                None => {
                    return Err(parse_err(
                        line_num,
                        ExtxyzParseErrorKind::MissingCommentLine,
                    ));
                }
            };
            let header = FrameHeader::parse(&comment).map_err(|k| parse_err(comment_num, k))?;

            let mut structure = Structure {
                atoms: Vec::with_capacity(n_atoms),
                cell: header.cell,
                info: header.info,
            };
            for found in 0..n_atoms {
                let (atom_num, atom_line) = match lines.next() {
                    Some(item) => item?,
                    None => {
                        return Err(parse_err(
                            comment_num + found,
                            ExtxyzParseErrorKind::TruncatedFrame {
                                expected: n_atoms,
                                found,
                            },
                        ));
                    }
                };
                let atom = header
                    .layout
                    .parse_atom(&atom_line)
                    .map_err(|k| parse_err(atom_num, k))?;
                structure.push(atom);
            }
            structures.push(structure);
        }

        Ok(structures)
    }

    fn write_to(structures: &[Structure], writer: &mut impl Write) -> Result<(), Self::Error> {
        for structure in structures {
            let with_forces = structure.has_forces();
            writeln!(writer, "{}", structure.len())?;
            writeln!(writer, "{}", format_comment(structure, with_forces))?;

            for atom in &structure.atoms {
                let p = &atom.position;
                write!(
                    writer,
                    "{:<2} {:>15} {:>15} {:>15}",
                    atom.element.symbol(),
                    p.x,
                    p.y,
                    p.z
                )?;
                if let (true, Some(f)) = (with_forces, atom.forces) {
                    write!(writer, " {:>15} {:>15} {:>15}", f.x, f.y, f.z)?;
                }
                writeln!(writer)?;
            }
        }
        Ok(())
    }
}
