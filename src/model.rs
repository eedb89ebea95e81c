use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::ValidationError;
use crate::grid::TimeGrid;

/// Minutes in a day. Every `TimeSlot` lies below this.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Wall-clock minute of the day. Local time only, no dates, no zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot {
    minutes: u16,
}

impl TimeSlot {
    /// Components are not range-checked; use `parse` for untrusted input.
    pub const fn from_hm(hour: u8, minute: u8) -> Self {
        Self {
            minutes: hour as u16 * 60 + minute as u16,
        }
    }

    pub const fn from_minutes(minutes: u16) -> Self {
        Self { minutes }
    }

    pub fn minutes(&self) -> u16 {
        self.minutes
    }

    pub fn hour(&self) -> u16 {
        self.minutes / 60
    }

    pub fn minute(&self) -> u16 {
        self.minutes % 60
    }

    /// `None` at or past midnight.
    pub fn plus_minutes(&self, minutes: u16) -> Option<Self> {
        self.minutes
            .checked_add(minutes)
            .filter(|&m| m < MINUTES_PER_DAY)
            .map(Self::from_minutes)
    }

    /// `None` before midnight.
    pub fn minus_minutes(&self, minutes: u16) -> Option<Self> {
        self.minutes.checked_sub(minutes).map(Self::from_minutes)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeSlot {
    type Err = ValidationError;

    /// Accepts `H:MM` and `HH:MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidTime(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        if hour > 23 || minute > 59 {
            return Err(invalid());
        }
        Ok(Self::from_hm(hour, minute))
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeSlot> for String {
    fn from(t: TimeSlot) -> Self {
        t.to_string()
    }
}

/// Monday (0) through Friday (4). Weekends are not part of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct WeekDay(u8);

impl WeekDay {
    pub const MONDAY: WeekDay = WeekDay(0);
    pub const TUESDAY: WeekDay = WeekDay(1);
    pub const WEDNESDAY: WeekDay = WeekDay(2);
    pub const THURSDAY: WeekDay = WeekDay(3);
    pub const FRIDAY: WeekDay = WeekDay(4);

    pub const ALL: [WeekDay; 5] = [
        Self::MONDAY,
        Self::TUESDAY,
        Self::WEDNESDAY,
        Self::THURSDAY,
        Self::FRIDAY,
    ];

    pub fn new(day: u8) -> Result<Self, ValidationError> {
        if day > 4 {
            return Err(ValidationError::DayOutOfRange(day));
        }
        Ok(Self(day))
    }

    pub fn index(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for WeekDay {
    type Error = ValidationError;

    fn try_from(day: u8) -> Result<Self, Self::Error> {
        Self::new(day)
    }
}

impl From<WeekDay> for u8 {
    fn from(day: WeekDay) -> Self {
        day.0
    }
}

/// One grid cell as seen by the merger. Transient UI state, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionCell {
    pub day: WeekDay,
    pub slot: usize,
    #[serde(default = "default_occupied")]
    pub occupied: bool,
    #[serde(default)]
    pub label: String,
}

fn default_occupied() -> bool {
    true
}

impl SelectionCell {
    pub fn occupied(day: WeekDay, slot: usize, label: impl Into<String>) -> Self {
        Self {
            day,
            slot,
            occupied: true,
            label: label.into(),
        }
    }
}

/// A contiguous run of slots on one weekday: the persisted and rendered unit.
///
/// `start_slot..=end_slot` indexes the day's slot sequence; `start_time` and
/// `end_time` are the wall-clock bounds, end exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleBlock {
    pub day: WeekDay,
    pub start_slot: usize,
    pub end_slot: usize,
    pub start_time: TimeSlot,
    pub end_time: TimeSlot,
    pub label: String,
}

impl ScheduleBlock {
    /// Build a block covering whole grid slots. A single slot still lasts one step.
    pub fn from_slots(
        grid: &TimeGrid,
        day: WeekDay,
        start_slot: usize,
        end_slot: usize,
        label: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if start_slot > end_slot {
            return Err(ValidationError::InvertedBlock {
                start: start_slot,
                end: end_slot,
            });
        }
        let start_time = grid.slot(start_slot)?;
        let end_time = grid.slot_end(end_slot)?;
        Ok(Self {
            day,
            start_slot,
            end_slot,
            start_time,
            end_time,
            label: label.into(),
        })
    }

    /// Resolve a stored tuple against the grid. Times are kept verbatim, so
    /// off-boundary times survive a save/load cycle unchanged.
    pub fn from_stored(grid: &TimeGrid, stored: &StoredSchedule) -> Result<Self, ValidationError> {
        let day = WeekDay::new(stored.day_of_week)?;
        let start_time: TimeSlot = stored.start_time.parse()?;
        let end_time: TimeSlot = stored.end_time.parse()?;
        if end_time <= start_time {
            return Err(ValidationError::EmptyTimeRange {
                start: start_time,
                end: end_time,
            });
        }
        let start_slot = grid
            .slot_containing(start_time)
            .ok_or(ValidationError::TimeOffGrid(start_time))?;
        // end is exclusive: the last covered minute decides the last slot
        let end_slot = end_time
            .minus_minutes(1)
            .and_then(|last| grid.slot_containing(last))
            .ok_or(ValidationError::TimeOffGrid(end_time))?;
        Ok(Self {
            day,
            start_slot,
            end_slot,
            start_time,
            end_time,
            label: stored.classroom.clone(),
        })
    }

    pub fn to_stored(&self) -> StoredSchedule {
        StoredSchedule {
            day_of_week: self.day.index(),
            start_time: self.start_time.to_string(),
            end_time: self.end_time.to_string(),
            classroom: self.label.clone(),
        }
    }

    pub fn slots(&self) -> RangeInclusive<usize> {
        self.start_slot..=self.end_slot
    }

    pub fn slot_count(&self) -> usize {
        self.end_slot - self.start_slot + 1
    }

    /// Same day and overlapping wall-clock ranges. Adjacent blocks do not
    /// intersect. For blocks on slot boundaries this is exactly slot-range
    /// intersection; off-boundary blocks sharing a slot but not a minute stay
    /// apart.
    pub fn intersects(&self, other: &ScheduleBlock) -> bool {
        self.day == other.day && self.start_time < other.end_time && other.start_time < self.end_time
    }
}

/// The shape the persistence collaborator stores: `{dayOfWeek, startTime, endTime, classroom}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSchedule {
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub classroom: String,
}

// ── Layout result types ─────────────────────────────────────────

/// Blocks on one day connected by intersection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlapCluster {
    pub day: WeekDay,
    /// Indices into the layout input, in input order.
    pub members: Vec<usize>,
    pub start_slot: usize,
    pub end_slot: usize,
    /// Earliest member start and latest member end.
    pub start_time: TimeSlot,
    pub end_time: TimeSlot,
}

impl OverlapCluster {
    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderPlacement {
    pub block: ScheduleBlock,
    pub horizontal_start_slot: usize,
    pub horizontal_slot_span: usize,
    /// Wall-clock bounds of the horizontal span, for proportional positioning.
    pub start_time: TimeSlot,
    pub end_time: TimeSlot,
    pub vertical_index: usize,
    pub vertical_count: usize,
}

impl RenderPlacement {
    /// `[i/N, (i+1)/N)` of the row height.
    pub fn vertical_fraction(&self) -> (f64, f64) {
        let n = self.vertical_count as f64;
        (
            self.vertical_index as f64 / n,
            (self.vertical_index + 1) as f64 / n,
        )
    }

    pub fn is_stacked(&self) -> bool {
        self.vertical_count > 1
    }

    pub fn horizontal_slots(&self) -> RangeInclusive<usize> {
        self.horizontal_start_slot..=self.horizontal_start_slot + self.horizontal_slot_span - 1
    }
}
