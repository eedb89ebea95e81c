use crate::model::{TimeSlot, WeekDay};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DayOutOfRange(u8),
    SlotOutOfRange {
        slot: usize,
        slot_count: usize,
    },
    InvertedBlock {
        start: usize,
        end: usize,
    },
    InvalidTime(String),
    TimeOffGrid(TimeSlot),
    EmptyTimeRange {
        start: TimeSlot,
        end: TimeSlot,
    },
    CellNotOccupied {
        day: WeekDay,
        slot: usize,
    },
    InvalidGrid(&'static str),
}

impl ValidationError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::DayOutOfRange(_) => "day_out_of_range",
            ValidationError::SlotOutOfRange { .. } => "slot_out_of_range",
            ValidationError::InvertedBlock { .. } => "inverted_block",
            ValidationError::InvalidTime(_) => "invalid_time",
            ValidationError::TimeOffGrid(_) => "time_off_grid",
            ValidationError::EmptyTimeRange { .. } => "empty_time_range",
            ValidationError::CellNotOccupied { .. } => "cell_not_occupied",
            ValidationError::InvalidGrid(_) => "invalid_grid",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::DayOutOfRange(day) => {
                write!(f, "day {day} out of range: expected 0 (Monday) to 4 (Friday)")
            }
            ValidationError::SlotOutOfRange { slot, slot_count } => {
                write!(f, "slot {slot} out of range: grid has {slot_count} slots")
            }
            ValidationError::InvertedBlock { start, end } => {
                write!(f, "block starts at slot {start} after it ends at slot {end}")
            }
            ValidationError::InvalidTime(raw) => write!(f, "invalid wall-clock time: {raw:?}"),
            ValidationError::TimeOffGrid(t) => write!(f, "time {t} falls outside the school day"),
            ValidationError::EmptyTimeRange { start, end } => {
                write!(f, "time range [{start}, {end}) is empty")
            }
            ValidationError::CellNotOccupied { day, slot } => {
                write!(f, "cell (day {}, slot {slot}) is not selected", day.index())
            }
            ValidationError::InvalidGrid(msg) => write!(f, "invalid grid config: {msg}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Count a rejection and pass the error through.
pub(crate) fn rejected(err: ValidationError) -> ValidationError {
    tracing::debug!("rejected: {err}");
    metrics::counter!(crate::observability::VALIDATION_ERRORS_TOTAL, "kind" => err.kind())
        .increment(1);
    err
}
