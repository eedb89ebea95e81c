//! Seam to whatever durably keeps "planned schedules".
//!
//! Storage speaks the plain `StoredSchedule` tuple; blocks are resolved against
//! a grid on the way out.

use std::collections::BTreeMap;
use std::convert::Infallible;

use crate::engine::{rejected, ValidationError};
use crate::grid::TimeGrid;
use crate::model::{ScheduleBlock, StoredSchedule};

pub trait ScheduleStore {
    type Error: std::error::Error + 'static;

    /// Replace everything stored for `owner` (a subject, course, ...).
    fn save(&mut self, owner: &str, schedules: &[StoredSchedule]) -> Result<(), Self::Error>;

    /// Stored tuples for `owner`, empty when nothing was saved.
    fn load(&self, owner: &str) -> Result<Vec<StoredSchedule>, Self::Error>;

    fn owners(&self) -> Result<Vec<String>, Self::Error>;
}

#[derive(Debug)]
pub enum LoadError<E> {
    Store(E),
    Invalid { owner: String, source: ValidationError },
}

impl<E: std::fmt::Display> std::fmt::Display for LoadError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Store(e) => write!(f, "store error: {e}"),
            LoadError::Invalid { owner, source } => {
                write!(f, "invalid schedule stored for {owner}: {source}")
            }
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for LoadError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Store(e) => Some(e),
            LoadError::Invalid { source, .. } => Some(source),
        }
    }
}

pub fn save_blocks<S: ScheduleStore>(store: &mut S, owner: &str, blocks: &[ScheduleBlock]) -> Result<(), S::Error> {
    let schedules: Vec<StoredSchedule> = blocks.iter().map(ScheduleBlock::to_stored).collect();
    store.save(owner, &schedules)
}

pub fn load_blocks<S: ScheduleStore>(
    store: &S,
    owner: &str,
    grid: &TimeGrid,
) -> Result<Vec<ScheduleBlock>, LoadError<S::Error>> {
    store
        .load(owner)
        .map_err(LoadError::Store)?
        .iter()
        .map(|s| {
            ScheduleBlock::from_stored(grid, s).map_err(|e| LoadError::Invalid {
                owner: owner.to_string(),
                source: rejected(e),
            })
        })
        .collect()
}

/// Every owner's blocks tagged with the owner, ready for `layout_tagged`.
pub fn load_week<S: ScheduleStore>(
    store: &S,
    grid: &TimeGrid,
) -> Result<Vec<(String, ScheduleBlock)>, LoadError<S::Error>> {
    let mut week = Vec::new();
    for owner in store.owners().map_err(LoadError::Store)? {
        for block in load_blocks(store, &owner, grid)? {
            week.push((owner.clone(), block));
        }
    }
    Ok(week)
}

/// Keeps tuples in memory; owners come back in name order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    schedules: BTreeMap<String, Vec<StoredSchedule>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScheduleStore for MemoryStore {
    type Error = Infallible;

    fn save(&mut self, owner: &str, schedules: &[StoredSchedule]) -> Result<(), Self::Error> {
        if schedules.is_empty() {
            self.schedules.remove(owner);
        } else {
            self.schedules.insert(owner.to_string(), schedules.to_vec());
        }
        Ok(())
    }

    fn load(&self, owner: &str) -> Result<Vec<StoredSchedule>, Self::Error> {
        Ok(self.schedules.get(owner).cloned().unwrap_or_default())
    }

    fn owners(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.schedules.keys().cloned().collect())
    }
}
