use std::{collections::BTreeMap, fmt, ops::Range};

use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::constants::{BLOCK_COUNT, GRID, UNLINKED_ID};

/// Section key → slot key → activity identifier, as stored in a saved plan.
pub type PlanDocument = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub String);

impl ActivityId {
    pub fn new(id: impl Into<String>) -> Self {
        ActivityId(id.into())
    }

    pub fn unlinked() -> Self {
        ActivityId(UNLINKED_ID.to_string())
    }

    pub fn is_unlinked(&self) -> bool {
        self.0 == UNLINKED_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ActivityId {
    fn default() -> Self {
        Self::unlinked()
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Activity {
    pub id: ActivityId,
    pub color: Color,
    pub icon: String,
    pub productive: bool,
}

impl Activity {
    pub fn unlinked(color: Color) -> Self {
        Self {
            id: ActivityId::unlinked(),
            color,
            icon: String::new(),
            productive: false,
        }
    }

    pub fn label(&self) -> &str {
        if self.id.is_unlinked() {
            "(unlinked)"
        } else {
            self.id.as_str()
        }
    }
}

/// Immutable set of activities a block can link to. The unlinked sentinel is
/// always resolvable even though it is not part of `activities`.
#[derive(Clone, Debug)]
pub struct ActivityCatalog {
    activities: Vec<Activity>,
    unlinked: Activity,
}

impl ActivityCatalog {
    pub fn new(activities: Vec<Activity>, unlinked_color: Color) -> Self {
        let activities = activities
            .into_iter()
            .filter(|activity| !activity.id.is_unlinked())
            .collect();
        Self {
            activities,
            unlinked: Activity::unlinked(unlinked_color),
        }
    }

    pub fn get(&self, id: &ActivityId) -> Option<&Activity> {
        if id.is_unlinked() {
            return Some(&self.unlinked);
        }
        self.activities.iter().find(|activity| &activity.id == id)
    }

    pub fn resolve(&self, id: &ActivityId) -> &Activity {
        self.get(id).unwrap_or(&self.unlinked)
    }

    pub fn contains(&self, id: &ActivityId) -> bool {
        self.get(id).is_some()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Activity> {
        if name == UNLINKED_ID {
            return Some(&self.unlinked);
        }
        self.activities
            .iter()
            .find(|activity| activity.id.as_str().eq_ignore_ascii_case(name))
    }

    pub fn is_productive(&self, id: &ActivityId) -> bool {
        self.get(id).is_some_and(|activity| activity.productive)
    }

    pub fn unlinked(&self) -> &Activity {
        &self.unlinked
    }

    /// Picker order: the sentinel first, then the catalog.
    pub fn choices(&self) -> Vec<&Activity> {
        std::iter::once(&self.unlinked)
            .chain(self.activities.iter())
            .collect()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("malformed plan: missing section \"{0}\"")]
    MissingSection(String),
    #[error("malformed plan: section \"{section}\" has no slot \"{slot}\"")]
    MissingSlot { section: String, slot: String },
}

/// 1-based linear index of a block, `row * 6 + col + 1`.
pub fn block_index(row: usize, col: usize) -> usize {
    row * GRID.cols + col + 1
}

pub fn block_position(index: usize) -> (usize, usize) {
    let zero_based = index.saturating_sub(1).min(BLOCK_COUNT - 1);
    (zero_based / GRID.cols, zero_based % GRID.cols)
}

pub fn section_key(row: usize) -> String {
    format!("{:02}", row)
}

pub fn slot_key(col: usize) -> String {
    format!("{}0", col)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockGrid {
    cells: Vec<ActivityId>,
}

impl Default for BlockGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockGrid {
    pub fn new() -> Self {
        Self {
            cells: vec![ActivityId::unlinked(); BLOCK_COUNT],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> &ActivityId {
        &self.cells[row * GRID.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, id: ActivityId) {
        self.cells[row * GRID.cols + col] = id;
    }

    /// Links every block whose 1-based index falls in `indices`.
    pub fn fill(&mut self, indices: Range<usize>, id: &ActivityId) {
        for index in indices.filter(|index| (1..=BLOCK_COUNT).contains(index)) {
            self.cells[index - 1] = id.clone();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &ActivityId)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, id)| (i / GRID.cols, i % GRID.cols, id))
    }

    pub fn count_linked(&self) -> usize {
        self.cells.iter().filter(|id| !id.is_unlinked()).count()
    }

    pub fn serialize(&self) -> PlanDocument {
        let mut doc = PlanDocument::new();
        for (row, col, id) in self.iter() {
            doc.entry(section_key(row))
                .or_default()
                .insert(slot_key(col), id.0.clone());
        }
        doc
    }

    pub fn deserialize(doc: &PlanDocument, catalog: &ActivityCatalog) -> Result<Self, PlanError> {
        let mut grid = Self::new();
        for row in 0..GRID.rows {
            let section = section_key(row);
            let Some(slots) = doc.get(&section) else {
                return Err(PlanError::MissingSection(section));
            };

            for col in 0..GRID.cols {
                let slot = slot_key(col);
                let Some(raw) = slots.get(&slot) else {
                    return Err(PlanError::MissingSlot { section, slot });
                };

                let id = ActivityId::new(raw.trim());
                if catalog.contains(&id) {
                    grid.set(row, col, id);
                } else {
                    debug!(activity = %id, %section, %slot, "stale activity reference, unlinking");
                }
            }
        }
        Ok(grid)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProductiveProgress {
    pub elapsed: usize,
    pub total: usize,
}

impl fmt::Display for ProductiveProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.elapsed, self.total)
    }
}

pub fn productive_progress(
    grid: &BlockGrid,
    catalog: &ActivityCatalog,
    elapsed_blocks: usize,
) -> ProductiveProgress {
    grid.iter()
        .filter(|(_, _, id)| catalog.is_productive(id))
        .fold(ProductiveProgress::default(), |mut progress, (row, col, _)| {
            progress.total += 1;
            if block_index(row, col) <= elapsed_blocks {
                progress.elapsed += 1;
            }
            progress
        })
}
