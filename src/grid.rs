use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::engine::ValidationError;
use crate::model::{TimeSlot, WeekDay};

pub const DEFAULT_DAY_START: TimeSlot = TimeSlot::from_hm(7, 45);
pub const DEFAULT_SLOT_MINUTES: u16 = 40;
pub const DEFAULT_DAY_END: TimeSlot = TimeSlot::from_hm(16, 30);

static STANDARD: Lazy<TimeGrid> = Lazy::new(|| TimeGrid::build(GridConfig::default()));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// First slot of the day. Always part of the grid.
    pub day_start: TimeSlot,
    pub slot_minutes: u16,
    /// No slot may start after this boundary.
    pub day_end: TimeSlot,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            day_start: DEFAULT_DAY_START,
            slot_minutes: DEFAULT_SLOT_MINUTES,
            day_end: DEFAULT_DAY_END,
        }
    }
}

/// The discretized school day and the Monday–Friday week it repeats over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeGrid {
    config: GridConfig,
    slots: Vec<TimeSlot>,
}

impl TimeGrid {
    pub fn new(config: GridConfig) -> Result<Self, ValidationError> {
        if config.slot_minutes == 0 {
            return Err(ValidationError::InvalidGrid("slot length must be positive"));
        }
        if config.day_start > config.day_end {
            return Err(ValidationError::InvalidGrid("day starts after it ends"));
        }
        let grid = Self::build(config);
        // every slot end must stay a valid wall-clock time for storage
        let last = grid.slots[grid.slots.len() - 1];
        if last.plus_minutes(config.slot_minutes).is_none() {
            return Err(ValidationError::InvalidGrid("last slot ends after 23:59"));
        }
        Ok(grid)
    }

    /// The default 07:45 / 40 min / 16:30 grid, built once per process.
    pub fn standard() -> &'static TimeGrid {
        &STANDARD
    }

    /// Caller guarantees a positive step.
    fn build(config: GridConfig) -> Self {
        let end = config.day_end;
        let mut slots = vec![config.day_start];
        let mut current = config.day_start;
        // stepping past midnight is past any boundary
        while let Some(next) = current.plus_minutes(config.slot_minutes) {
            current = next;
            // The `minute > end.minute()` half never fires for the default
            // 07:45 start; kept as-is so the slot count stays stable.
            if current.hour() > end.hour()
                || (current.hour() == end.hour() && current.minute() > end.minute())
            {
                break;
            }
            slots.push(current);
        }
        tracing::debug!(
            "time grid: {} slots, {} .. {}",
            slots.len(),
            slots[0],
            slots[slots.len() - 1]
        );
        Self { config, slots }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn weekdays(&self) -> &'static [WeekDay] {
        &WeekDay::ALL
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn step_minutes(&self) -> u16 {
        self.config.slot_minutes
    }

    pub fn check_slot(&self, slot: usize) -> Result<(), ValidationError> {
        if slot >= self.slots.len() {
            return Err(ValidationError::SlotOutOfRange {
                slot,
                slot_count: self.slots.len(),
            });
        }
        Ok(())
    }

    /// Start time of a slot.
    pub fn slot(&self, slot: usize) -> Result<TimeSlot, ValidationError> {
        self.check_slot(slot)?;
        Ok(self.slots[slot])
    }

    /// Exclusive end of a slot: its start plus one step.
    pub fn slot_end(&self, slot: usize) -> Result<TimeSlot, ValidationError> {
        self.slot(slot)?
            .plus_minutes(self.config.slot_minutes)
            .ok_or(ValidationError::InvalidGrid("last slot ends after 23:59"))
    }

    /// Exact match on a slot start.
    pub fn index_of(&self, time: TimeSlot) -> Option<usize> {
        self.slots.binary_search(&time).ok()
    }

    /// The slot whose `[start, start + step)` holds `time`.
    pub fn slot_containing(&self, time: TimeSlot) -> Option<usize> {
        let offset = time.minutes().checked_sub(self.config.day_start.minutes())?;
        let index = (offset / self.config.slot_minutes) as usize;
        (index < self.slots.len()).then_some(index)
    }
}
