use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod assign;
pub mod export;
pub mod persist;
pub mod selection;
pub mod stats;
pub mod style;

mod runtime;

pub use assign::{AssignError, Assignment};
pub use export::{ExportError, ExportRequest, Rasterizer, Region};
pub use persist::{BlobStore, FileStore, MemoryStore};
pub use runtime::Runtime;
pub use selection::{SelectionController, SelectionState};
pub use stats::{LegendEntry, legend_columns};
pub use style::{Fill, PatternId, RenderStyle, StyleKey};

pub fn version() -> &'static str {
    "0.1.0"
}

/// The five supported microplate formats, each with fixed geometry.
/// Keeping this a closed enum means an out-of-range size is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum PlateFormat {
    W6,
    W12,
    W24,
    W48,
    W96,
}

impl PlateFormat {
    /// Fixed scan order: smallest plate first. Aggregation and persistence
    /// both rely on this order being stable.
    pub const ALL: [PlateFormat; 5] = [
        PlateFormat::W6,
        PlateFormat::W12,
        PlateFormat::W24,
        PlateFormat::W48,
        PlateFormat::W96,
    ];

    pub fn size(self) -> u32 {
        match self {
            PlateFormat::W6 => 6,
            PlateFormat::W12 => 12,
            PlateFormat::W24 => 24,
            PlateFormat::W48 => 48,
            PlateFormat::W96 => 96,
        }
    }

    pub fn rows(self) -> usize {
        match self {
            PlateFormat::W6 => 2,
            PlateFormat::W12 => 3,
            PlateFormat::W24 => 4,
            PlateFormat::W48 => 6,
            PlateFormat::W96 => 8,
        }
    }

    pub fn cols(self) -> usize {
        match self {
            PlateFormat::W6 => 3,
            PlateFormat::W12 => 4,
            PlateFormat::W24 => 6,
            PlateFormat::W48 => 8,
            PlateFormat::W96 => 12,
        }
    }

    pub fn well_count(self) -> usize {
        self.rows() * self.cols()
    }

    pub fn from_size(size: u32) -> Option<PlateFormat> {
        PlateFormat::ALL.iter().copied().find(|f| f.size() == size)
    }
}

impl From<PlateFormat> for u32 {
    fn from(format: PlateFormat) -> u32 {
        format.size()
    }
}

impl TryFrom<u32> for PlateFormat {
    type Error = String;

    fn try_from(size: u32) -> Result<PlateFormat, String> {
        PlateFormat::from_size(size).ok_or_else(|| format!("unsupported plate size {size}"))
    }
}

impl std::fmt::Display for PlateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Well Plate", self.size())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WellStatus {
    Empty,
    Filled,
}

/// One addressable position on a plate.
/// Invariant: `status == Filled` exactly when `label` is non-empty, and an
/// empty well always carries the blank style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Well {
    pub id: String,
    pub label: String,
    pub color: StyleKey,
    pub status: WellStatus,
}

impl Well {
    pub fn empty(id: String) -> Self {
        Self {
            id,
            label: String::new(),
            color: StyleKey::blank(),
            status: WellStatus::Empty,
        }
    }

    pub fn is_filled(&self) -> bool {
        self.status == WellStatus::Filled
    }

    /// Text shown inside the well: the label (clipped to 3 chars) once it is
    /// filled, otherwise the well id.
    pub fn display_text(&self) -> String {
        if self.is_filled() {
            self.label.chars().take(3).collect()
        } else {
            self.id.clone()
        }
    }
}

/// Builds a well id from zero-based row/column: row letter + 1-based column,
/// e.g. (0, 0) -> "A1".
pub fn well_id(row: usize, col: usize) -> String {
    let letter = (b'A' + row as u8) as char;
    format!("{}{}", letter, col + 1)
}

/// Parses a well id back into zero-based (row, col). Returns None for
/// anything that is not letter-then-number.
pub fn parse_well_id(id: &str) -> Option<(usize, usize)> {
    let mut chars = id.chars();
    let letter = chars.next()?;
    if !letter.is_ascii_uppercase() {
        return None;
    }
    let col: usize = chars.as_str().parse().ok()?;
    if col == 0 {
        return None;
    }
    Some(((letter as u8 - b'A') as usize, col - 1))
}

/// All wells of one plate format, in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WellGrid {
    pub wells: Vec<Well>,
}

impl WellGrid {
    /// Fresh, all-empty grid for a format. Pure and deterministic; this is
    /// also what `clear` swaps in.
    pub fn generate(format: PlateFormat) -> Self {
        let mut wells = Vec::with_capacity(format.well_count());
        for r in 0..format.rows() {
            for c in 0..format.cols() {
                wells.push(Well::empty(well_id(r, c)));
            }
        }
        Self { wells }
    }

    pub fn well(&self, id: &str) -> Option<&Well> {
        self.wells.iter().find(|w| w.id == id)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.well(id).is_some()
    }

    pub fn filled_count(&self) -> usize {
        self.wells.iter().filter(|w| w.is_filled()).count()
    }
}

/// The top-level document we save/load: exactly one grid per format, all
/// five present from startup regardless of which one is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlateStore {
    grids: BTreeMap<PlateFormat, WellGrid>,
}

impl Default for PlateStore {
    fn default() -> Self {
        let mut grids = BTreeMap::new();
        for format in PlateFormat::ALL {
            grids.insert(format, WellGrid::generate(format));
        }
        Self { grids }
    }
}

impl PlateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-establishes the one-grid-per-format invariant after deserializing
    /// external data: missing formats get a fresh grid, grids with the wrong
    /// well count are regenerated.
    pub fn normalize(&mut self) {
        for format in PlateFormat::ALL {
            let ok = self
                .grids
                .get(&format)
                .map(|g| g.wells.len() == format.well_count())
                .unwrap_or(false);
            if !ok {
                self.grids.insert(format, WellGrid::generate(format));
            }
        }
    }

    pub fn get(&self, format: PlateFormat) -> &WellGrid {
        self.grids
            .get(&format)
            .expect("PlateStore holds one grid per format")
    }

    /// Atomically swaps the grid for one format; other formats untouched.
    pub fn replace(&mut self, format: PlateFormat, grid: WellGrid) {
        self.grids.insert(format, grid);
    }

    /// Resets one format to a fresh empty grid. Confirmation is the
    /// caller's job; by the time this runs the user already said yes.
    pub fn clear(&mut self, format: PlateFormat) {
        self.replace(format, WellGrid::generate(format));
    }

    /// Grids in fixed format order, for aggregation.
    pub fn iter(&self) -> impl Iterator<Item = (PlateFormat, &WellGrid)> {
        PlateFormat::ALL.into_iter().map(|f| (f, self.get(f)))
    }
}
