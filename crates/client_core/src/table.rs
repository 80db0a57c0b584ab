//! Sortable encounter table.

use std::{cmp::Ordering, fmt, str::FromStr};

use shared::protocol::EncounterRow;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

pub const EMPTY_TABLE_MESSAGE: &str = "No Pokémon found for this trip yet.";

type Comparator = fn(&EncounterRow, &EncounterRow) -> Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Name,
    MaxChance,
    Locations,
    Methods,
    Conditions,
}

impl SortColumn {
    pub const ALL: [SortColumn; 5] = [
        SortColumn::Name,
        SortColumn::MaxChance,
        SortColumn::Locations,
        SortColumn::Methods,
        SortColumn::Conditions,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::MaxChance => "Max Chance",
            Self::Locations => "Locations in Trip",
            Self::Methods => "Encounter Methods",
            Self::Conditions => "Encounter Conditions",
        }
    }

    /// Highest chance first, alphabetical everywhere else.
    pub fn default_direction(self) -> SortDirection {
        match self {
            Self::MaxChance => SortDirection::Descending,
            _ => SortDirection::Ascending,
        }
    }

    fn comparator(self) -> Comparator {
        match self {
            Self::Name => by_name,
            Self::MaxChance => by_max_chance,
            Self::Locations => by_locations,
            Self::Methods => by_methods,
            Self::Conditions => by_conditions,
        }
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "name" => Ok(Self::Name),
            "max_chance" | "chance" => Ok(Self::MaxChance),
            "locations" => Ok(Self::Locations),
            "methods" => Ok(Self::Methods),
            "conditions" => Ok(Self::Conditions),
            other => Err(format!(
                "unknown column '{other}' (expected name, max_chance, locations, methods or conditions)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Self::Ascending => "↑",
            Self::Descending => "↓",
        }
    }
}

/// Collator-style comparison: base letters ignoring case and accents, then
/// accents, then case with lowercase first. Raw text only breaks exact ties.
fn collate(a: &str, b: &str) -> Ordering {
    let (left, right) = (CollationKey::new(a), CollationKey::new(b));
    left.primary
        .cmp(&right.primary)
        .then_with(|| left.secondary.cmp(&right.secondary))
        .then_with(|| left.tertiary.cmp(&right.tertiary))
        .then_with(|| a.cmp(b))
}

#[derive(Default)]
struct CollationKey {
    primary: Vec<(u8, char)>,
    /// `'\0'` per base character, the mark itself per combining mark.
    secondary: Vec<char>,
    /// Uppercase flag per base character.
    tertiary: Vec<bool>,
}

impl CollationKey {
    fn new(text: &str) -> Self {
        let mut key = Self::default();
        for c in text.nfd() {
            if is_combining_mark(c) {
                key.secondary.push(c);
                continue;
            }
            key.primary
                .extend(c.to_lowercase().map(|lower| (primary_class(lower), lower)));
            key.secondary.push('\0');
            key.tertiary.push(c.is_uppercase());
        }
        key
    }
}

/// Spacing and punctuation sort before digits, digits before letters.
fn primary_class(c: char) -> u8 {
    if c.is_alphabetic() {
        2
    } else if c.is_numeric() {
        1
    } else {
        0
    }
}

fn by_name(a: &EncounterRow, b: &EncounterRow) -> Ordering {
    collate(&a.name, &b.name)
}

fn by_max_chance(a: &EncounterRow, b: &EncounterRow) -> Ordering {
    a.max_chance.total_cmp(&b.max_chance)
}

fn by_locations(a: &EncounterRow, b: &EncounterRow) -> Ordering {
    collate(&a.locations_in_trip.join(", "), &b.locations_in_trip.join(", "))
}

fn by_methods(a: &EncounterRow, b: &EncounterRow) -> Ordering {
    collate(&a.encounter_methods.join(", "), &b.encounter_methods.join(", "))
}

fn by_conditions(a: &EncounterRow, b: &EncounterRow) -> Ordering {
    collate(
        &a.encounter_conditions.join(", "),
        &b.encounter_conditions.join(", "),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: SortColumn::MaxChance,
            direction: SortColumn::MaxChance.default_direction(),
        }
    }
}

impl SortState {
    /// Header click: flips the active column, otherwise switches to `column`
    /// with its default direction.
    pub fn click(&mut self, column: SortColumn) {
        if column == self.column {
            self.direction = self.direction.flipped();
        } else {
            self.column = column;
            self.direction = column.default_direction();
        }
    }

    /// Returns the rows in display order. The input is left as it is.
    pub fn sort<'a>(&self, rows: &'a [EncounterRow]) -> Vec<&'a EncounterRow> {
        let compare = self.column.comparator();
        let mut sorted: Vec<&EncounterRow> = rows.iter().collect();
        match self.direction {
            SortDirection::Ascending => sorted.sort_by(|a, b| compare(a, b)),
            SortDirection::Descending => sorted.sort_by(|a, b| compare(b, a)),
        }
        sorted
    }

    pub fn render(&self, rows: &[EncounterRow]) -> EncounterTable {
        if rows.is_empty() {
            return EncounterTable::Empty {
                message: EMPTY_TABLE_MESSAGE,
            };
        }
        let headers = SortColumn::ALL
            .into_iter()
            .map(|column| HeaderCell {
                column,
                label: column.label(),
                arrow: (column == self.column).then(|| self.direction.arrow()),
            })
            .collect();
        let rows = self.sort(rows).into_iter().map(RowCells::from).collect();
        EncounterTable::Rows { headers, rows }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub column: SortColumn,
    pub label: &'static str,
    pub arrow: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowCells {
    pub name: String,
    pub max_chance: String,
    pub locations: String,
    pub methods: String,
    pub conditions: String,
}

impl From<&EncounterRow> for RowCells {
    fn from(row: &EncounterRow) -> Self {
        Self {
            name: row.name.clone(),
            max_chance: format_chance(row.max_chance),
            locations: row.locations_in_trip.join(", "),
            methods: row.encounter_methods.join(", "),
            conditions: row.encounter_conditions.join(", "),
        }
    }
}

fn format_chance(chance: f64) -> String {
    if chance.fract() == 0.0 {
        format!("{chance:.0}")
    } else {
        chance.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncounterTable {
    Empty {
        message: &'static str,
    },
    Rows {
        headers: Vec<HeaderCell>,
        rows: Vec<RowCells>,
    },
}

impl EncounterTable {
    /// Row names in display order; the keys a row click reports.
    pub fn row_names(&self) -> Vec<&str> {
        match self {
            Self::Empty { .. } => Vec::new(),
            Self::Rows { rows, .. } => rows.iter().map(|row| row.name.as_str()).collect(),
        }
    }
}

impl fmt::Display for EncounterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { message } => writeln!(f, "{message}"),
            Self::Rows { headers, rows } => {
                let header_line = headers
                    .iter()
                    .map(|header| match header.arrow {
                        Some(arrow) => format!("{} {arrow}", header.label),
                        None => header.label.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(" | ");
                writeln!(f, "{header_line}")?;
                for row in rows {
                    writeln!(
                        f,
                        "{} | {} | {} | {} | {}",
                        row.name, row.max_chance, row.locations, row.methods, row.conditions
                    )?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/table_tests.rs"]
mod tests;
