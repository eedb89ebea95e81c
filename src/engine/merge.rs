use std::collections::BTreeMap;

use crate::grid::TimeGrid;
use crate::model::*;

use super::error::rejected;
use super::ValidationError;

// ── Interval Merge ───────────────────────────────────────────────

struct OpenRun {
    start: usize,
    end: usize,
    label: String,
}

impl OpenRun {
    fn close(self, grid: &TimeGrid, day: WeekDay) -> Result<ScheduleBlock, ValidationError> {
        ScheduleBlock::from_slots(grid, day, self.start, self.end, self.label)
    }
}

/// Collapse selected cells into the fewest contiguous blocks per day.
///
/// Adjacent slots always join; any gap splits. Labels never split a run: the
/// first non-empty label seen fills an empty run label and later ones are
/// dropped. Output is ordered by day, then start slot.
pub fn merge(cells: &[SelectionCell], grid: &TimeGrid) -> Result<Vec<ScheduleBlock>, ValidationError> {
    let mut by_day: BTreeMap<WeekDay, Vec<&SelectionCell>> = BTreeMap::new();
    for cell in cells.iter().filter(|c| c.occupied) {
        grid.check_slot(cell.slot).map_err(rejected)?;
        by_day.entry(cell.day).or_default().push(cell);
    }

    let mut blocks = Vec::new();
    for (day, mut day_cells) in by_day {
        // stable: duplicates of one slot keep their input order
        day_cells.sort_by_key(|c| c.slot);

        let mut open: Option<OpenRun> = None;
        for cell in day_cells {
            if let Some(run) = open.as_mut()
                && cell.slot <= run.end + 1
            {
                run.end = run.end.max(cell.slot);
                if run.label.is_empty() && !cell.label.is_empty() {
                    run.label = cell.label.clone();
                }
                continue;
            }
            if let Some(run) = open.take() {
                blocks.push(run.close(grid, day)?);
            }
            open = Some(OpenRun {
                start: cell.slot,
                end: cell.slot,
                label: cell.label.clone(),
            });
        }
        if let Some(run) = open {
            blocks.push(run.close(grid, day)?);
        }
    }

    tracing::debug!("merged {} cells into {} blocks", cells.len(), blocks.len());
    metrics::counter!(crate::observability::MERGE_TOTAL).increment(1);
    metrics::counter!(crate::observability::BLOCKS_EMITTED_TOTAL).increment(blocks.len() as u64);
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(day: WeekDay, slot: usize, label: &str) -> SelectionCell {
        SelectionCell::occupied(day, slot, label)
    }

    fn spans(blocks: &[ScheduleBlock]) -> Vec<(u8, usize, usize)> {
        blocks.iter().map(|b| (b.day.index(), b.start_slot, b.end_slot)).collect()
    }

    #[test]
    fn empty_selection_yields_nothing() {
        assert!(merge(&[], TimeGrid::standard()).unwrap().is_empty());
    }

    #[test]
    fn unsorted_input_is_sorted_per_day() {
        let cells = vec![
            cell(WeekDay::TUESDAY, 4, ""),
            cell(WeekDay::MONDAY, 2, ""),
            cell(WeekDay::TUESDAY, 3, ""),
            cell(WeekDay::MONDAY, 1, ""),
        ];
        let blocks = merge(&cells, TimeGrid::standard()).unwrap();
        assert_eq!(spans(&blocks), vec![(0, 1, 2), (1, 3, 4)]);
    }

    #[test]
    fn unoccupied_cells_ignored() {
        let mut free = cell(WeekDay::MONDAY, 1, "");
        free.occupied = false;
        let cells = vec![cell(WeekDay::MONDAY, 0, ""), free, cell(WeekDay::MONDAY, 2, "")];
        let blocks = merge(&cells, TimeGrid::standard()).unwrap();
        assert_eq!(spans(&blocks), vec![(0, 0, 0), (0, 2, 2)]);
    }

    #[test]
    fn duplicate_cells_collapse() {
        let cells = vec![
            cell(WeekDay::MONDAY, 3, ""),
            cell(WeekDay::MONDAY, 3, "Gym"),
            cell(WeekDay::MONDAY, 4, ""),
        ];
        let blocks = merge(&cells, TimeGrid::standard()).unwrap();
        assert_eq!(spans(&blocks), vec![(0, 3, 4)]);
        assert_eq!(blocks[0].label, "Gym");
    }

    #[test]
    fn later_label_fills_empty_run_label() {
        let cells = vec![
            cell(WeekDay::MONDAY, 0, ""),
            cell(WeekDay::MONDAY, 1, ""),
            cell(WeekDay::MONDAY, 2, "Room 4"),
        ];
        let blocks = merge(&cells, TimeGrid::standard()).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].label, "Room 4");
    }

    #[test]
    fn first_label_wins_and_different_labels_do_not_split() {
        let cells = vec![
            cell(WeekDay::MONDAY, 0, "Room 4"),
            cell(WeekDay::MONDAY, 1, "Lab"),
            cell(WeekDay::MONDAY, 2, ""),
        ];
        let blocks = merge(&cells, TimeGrid::standard()).unwrap();
        assert_eq!(spans(&blocks), vec![(0, 0, 2)]);
        assert_eq!(blocks[0].label, "Room 4");
    }

    #[test]
    fn label_does_not_leak_across_gap() {
        let cells = vec![cell(WeekDay::MONDAY, 0, "Lab"), cell(WeekDay::MONDAY, 2, "")];
        let blocks = merge(&cells, TimeGrid::standard()).unwrap();
        assert_eq!(blocks[0].label, "Lab");
        assert_eq!(blocks[1].label, "");
    }

    #[test]
    fn whole_day_is_one_block() {
        let grid = TimeGrid::standard();
        let cells: Vec<_> = (0..grid.slot_count()).map(|s| cell(WeekDay::FRIDAY, s, "")).collect();
        let blocks = merge(&cells, grid).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_time.to_string(), "07:45");
        assert_eq!(blocks[0].end_time.to_string(), "17:05");
    }

    #[test]
    fn out_of_grid_cell_rejected() {
        let grid = TimeGrid::standard();
        let cells = vec![cell(WeekDay::MONDAY, grid.slot_count(), "")];
        assert!(matches!(merge(&cells, grid), Err(ValidationError::SlotOutOfRange { .. })));
    }
}
