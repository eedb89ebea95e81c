//! Drag-selection over the weekly grid.
//!
//! A press on a free cell anchors a pending range, hovering moves its far end,
//! and a release commits every cell between anchor and endpoint. A press on an
//! occupied cell wipes that whole day instead.
//!
//! One user drives one model: operations take `&mut self` and nothing here is
//! meant to be shared across threads.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::engine::{rejected, ValidationError};
use crate::grid::TimeGrid;
use crate::model::{ScheduleBlock, SelectionCell, WeekDay};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeState {
    Idle,
    Pending {
        day: WeekDay,
        anchor: usize,
        hover: Option<usize>,
    },
}

/// What a gesture did to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    RangeStarted,
    DayCleared { removed: usize },
    Hovered,
    RangeCommitted { day: WeekDay, start: usize, end: usize },
    /// Released on another day than the anchor; nothing was committed.
    RangeAborted,
    Ignored,
}

#[derive(Debug, Clone)]
pub struct SelectionModel {
    slot_count: usize,
    /// Occupied cells only, keyed by (day, slot index).
    cells: BTreeMap<(WeekDay, usize), String>,
    state: RangeState,
}

impl SelectionModel {
    pub fn new(grid: &TimeGrid) -> Self {
        Self {
            slot_count: grid.slot_count(),
            cells: BTreeMap::new(),
            state: RangeState::Idle,
        }
    }

    /// Seed from saved blocks, e.g. when reopening a subject for editing.
    pub fn from_blocks(grid: &TimeGrid, blocks: &[ScheduleBlock]) -> Result<Self, ValidationError> {
        let mut model = Self::new(grid);
        for block in blocks {
            if block.start_slot > block.end_slot {
                return Err(rejected(ValidationError::InvertedBlock {
                    start: block.start_slot,
                    end: block.end_slot,
                }));
            }
            model.check_slot(block.end_slot)?;
            for slot in block.slots() {
                model.cells.insert((block.day, slot), block.label.clone());
            }
        }
        Ok(model)
    }

    fn check_slot(&self, slot: usize) -> Result<(), ValidationError> {
        if slot >= self.slot_count {
            return Err(rejected(ValidationError::SlotOutOfRange {
                slot,
                slot_count: self.slot_count,
            }));
        }
        Ok(())
    }

    pub fn toggle_or_begin_range(&mut self, day: WeekDay, slot: usize) -> Result<Transition, ValidationError> {
        self.check_slot(slot)?;
        if self.cells.contains_key(&(day, slot)) {
            let before = self.cells.len();
            self.cells.retain(|&(d, _), _| d != day);
            self.state = RangeState::Idle;
            let removed = before - self.cells.len();
            tracing::trace!("day {} cleared ({removed} cells)", day.index());
            return Ok(Transition::DayCleared { removed });
        }
        self.state = RangeState::Pending {
            day,
            anchor: slot,
            hover: None,
        };
        tracing::trace!("range anchored at day {} slot {slot}", day.index());
        Ok(Transition::RangeStarted)
    }

    pub fn hover(&mut self, day: WeekDay, slot: usize) -> Result<Transition, ValidationError> {
        self.check_slot(slot)?;
        match &mut self.state {
            RangeState::Pending { day: anchor_day, hover, .. } if *anchor_day == day => {
                *hover = Some(slot);
                Ok(Transition::Hovered)
            }
            _ => Ok(Transition::Ignored),
        }
    }

    pub fn complete_range(&mut self, day: WeekDay, slot: usize) -> Result<Transition, ValidationError> {
        self.check_slot(slot)?;
        let RangeState::Pending { day: anchor_day, anchor, .. } = self.state else {
            return Ok(Transition::Ignored);
        };
        if anchor_day != day {
            self.state = RangeState::Idle;
            tracing::trace!(
                "range from day {} aborted on day {}",
                anchor_day.index(),
                day.index()
            );
            return Ok(Transition::RangeAborted);
        }
        Ok(self.commit(day, anchor, slot))
    }

    /// Pointer released somewhere off the grid. Commits up to the last hovered
    /// cell, or just the anchor when the pointer never moved.
    pub fn release_outside_grid(&mut self) -> Transition {
        match self.state {
            RangeState::Pending { day, anchor, hover } => self.commit(day, anchor, hover.unwrap_or(anchor)),
            RangeState::Idle => Transition::Ignored,
        }
    }

    fn commit(&mut self, day: WeekDay, anchor: usize, endpoint: usize) -> Transition {
        let start = anchor.min(endpoint);
        let end = anchor.max(endpoint);
        let label = self.cells.get(&(day, anchor)).cloned().unwrap_or_default();
        for slot in start..=end {
            self.cells.entry((day, slot)).or_insert_with(|| label.clone());
        }
        self.state = RangeState::Idle;
        tracing::trace!("range committed: day {} slots {start}..={end}", day.index());
        Transition::RangeCommitted { day, start, end }
    }

    /// Label one occupied cell. Whether neighbours merge is decided by the merger.
    pub fn set_label(&mut self, day: WeekDay, slot: usize, label: impl Into<String>) -> Result<(), ValidationError> {
        self.check_slot(slot)?;
        match self.cells.get_mut(&(day, slot)) {
            Some(existing) => {
                *existing = label.into();
                Ok(())
            }
            None => Err(rejected(ValidationError::CellNotOccupied { day, slot })),
        }
    }

    pub fn is_occupied(&self, day: WeekDay, slot: usize) -> bool {
        self.cells.contains_key(&(day, slot))
    }

    pub fn label(&self, day: WeekDay, slot: usize) -> Option<&str> {
        self.cells.get(&(day, slot)).map(String::as_str)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, RangeState::Pending { .. })
    }

    /// Cells the pending drag would commit right now, for highlighting.
    pub fn preview(&self) -> Option<(WeekDay, RangeInclusive<usize>)> {
        match self.state {
            RangeState::Pending { day, anchor, hover } => {
                let endpoint = hover.unwrap_or(anchor);
                Some((day, anchor.min(endpoint)..=anchor.max(endpoint)))
            }
            RangeState::Idle => None,
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.state = RangeState::Idle;
    }

    /// Occupied cells ordered by day, then slot.
    pub fn snapshot(&self) -> Vec<SelectionCell> {
        self.cells
            .iter()
            .map(|(&(day, slot), label)| SelectionCell::occupied(day, slot, label.clone()))
            .collect()
    }
}
