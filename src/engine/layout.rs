use serde::Serialize;

use crate::grid::TimeGrid;
use crate::model::*;

use super::error::rejected;
use super::ValidationError;

// ── Overlap Layout ───────────────────────────────────────────────

fn validate(blocks: &[ScheduleBlock], grid: &TimeGrid) -> Result<(), ValidationError> {
    for b in blocks {
        if b.start_slot > b.end_slot {
            return Err(rejected(ValidationError::InvertedBlock {
                start: b.start_slot,
                end: b.end_slot,
            }));
        }
        grid.check_slot(b.end_slot).map_err(rejected)?;
    }
    Ok(())
}

/// Sweep over blocks sorted by (day, start). A block joins the open cluster
/// when it starts before the cluster's latest end, which means it intersects
/// the member reaching that end.
fn build_clusters(blocks: &[ScheduleBlock]) -> Vec<OverlapCluster> {
    let mut order: Vec<usize> = (0..blocks.len()).collect();
    order.sort_by_key(|&i| (blocks[i].day, blocks[i].start_time, i));

    let mut clusters = Vec::new();
    let mut open: Option<OverlapCluster> = None;
    for i in order {
        let b = &blocks[i];
        if let Some(c) = open.as_mut()
            && c.day == b.day
            && b.start_time < c.end_time
        {
            c.members.push(i);
            c.start_slot = c.start_slot.min(b.start_slot);
            c.end_slot = c.end_slot.max(b.end_slot);
            c.end_time = c.end_time.max(b.end_time);
            continue;
        }
        if let Some(c) = open.take() {
            clusters.push(c);
        }
        open = Some(OverlapCluster {
            day: b.day,
            members: vec![i],
            start_slot: b.start_slot,
            end_slot: b.end_slot,
            start_time: b.start_time,
            end_time: b.end_time,
        });
    }
    clusters.extend(open);

    // stacking order is supply order
    for c in &mut clusters {
        c.members.sort_unstable();
    }
    clusters
}

/// Group same-day blocks connected by intersection, ordered by day then
/// envelope start.
pub fn clusters(blocks: &[ScheduleBlock], grid: &TimeGrid) -> Result<Vec<OverlapCluster>, ValidationError> {
    validate(blocks, grid)?;
    Ok(build_clusters(blocks))
}

/// Place every block: members of a cluster share its envelope and split the
/// height evenly in the order they were supplied, so a singleton keeps its own
/// span at full height. `result[i]` belongs to `blocks[i]`.
pub fn layout(blocks: &[ScheduleBlock], grid: &TimeGrid) -> Result<Vec<RenderPlacement>, ValidationError> {
    validate(blocks, grid)?;
    let clusters = build_clusters(blocks);

    // (cluster, vertical index) per input block
    let mut position = vec![(0, 0); blocks.len()];
    for (c, cluster) in clusters.iter().enumerate() {
        metrics::histogram!(crate::observability::CLUSTER_SIZE).record(cluster.members.len() as f64);
        for (vertical_index, &i) in cluster.members.iter().enumerate() {
            position[i] = (c, vertical_index);
        }
    }

    let placed: Vec<RenderPlacement> = blocks
        .iter()
        .zip(position)
        .map(|(block, (c, vertical_index))| {
            let cluster = &clusters[c];
            RenderPlacement {
                block: block.clone(),
                horizontal_start_slot: cluster.start_slot,
                horizontal_slot_span: cluster.end_slot - cluster.start_slot + 1,
                start_time: cluster.start_time,
                end_time: cluster.end_time,
                vertical_index,
                vertical_count: cluster.members.len(),
            }
        })
        .collect();

    let stacked = clusters.iter().filter(|c| !c.is_singleton()).count();
    tracing::debug!(
        "laid out {} blocks in {} clusters ({stacked} stacked)",
        blocks.len(),
        clusters.len()
    );
    metrics::counter!(crate::observability::LAYOUT_TOTAL).increment(1);
    Ok(placed)
}

/// A placement carrying the tag of the source its block came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedPlacement<T> {
    pub source: T,
    #[serde(flatten)]
    pub placement: RenderPlacement,
}

/// Lay out blocks gathered from several sources (e.g. one per subject) as one week.
pub fn layout_tagged<T: Clone>(
    items: &[(T, ScheduleBlock)],
    grid: &TimeGrid,
) -> Result<Vec<TaggedPlacement<T>>, ValidationError> {
    let blocks: Vec<ScheduleBlock> = items.iter().map(|(_, b)| b.clone()).collect();
    let placements = layout(&blocks, grid)?;
    Ok(items
        .iter()
        .zip(placements)
        .map(|((source, _), placement)| TaggedPlacement {
            source: source.clone(),
            placement,
        })
        .collect())
}

/// Placements indexed the way a grid view walks them.
#[derive(Debug, Clone, Default)]
pub struct RenderPlan {
    placements: Vec<RenderPlacement>,
}

impl RenderPlan {
    pub fn build(blocks: &[ScheduleBlock], grid: &TimeGrid) -> Result<Self, ValidationError> {
        Ok(Self {
            placements: layout(blocks, grid)?,
        })
    }

    pub fn placements(&self) -> &[RenderPlacement] {
        &self.placements
    }

    pub fn for_day(&self, day: WeekDay) -> impl Iterator<Item = &RenderPlacement> {
        self.placements.iter().filter(move |p| p.block.day == day)
    }

    /// The stack drawn from cell (day, slot), top to bottom. Empty when no
    /// placement begins there.
    pub fn starting_at(&self, day: WeekDay, slot: usize) -> Vec<&RenderPlacement> {
        let mut stack: Vec<&RenderPlacement> = self
            .for_day(day)
            .filter(|p| p.horizontal_start_slot == slot)
            .collect();
        stack.sort_by_key(|p| p.vertical_index);
        stack
    }

    /// Whether (day, slot) lies under any placement's horizontal span.
    pub fn is_covered(&self, day: WeekDay, slot: usize) -> bool {
        self.for_day(day).any(|p| p.horizontal_slots().contains(&slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(day: WeekDay, start: usize, end: usize) -> ScheduleBlock {
        ScheduleBlock::from_slots(TimeGrid::standard(), day, start, end, "").unwrap()
    }

    #[test]
    fn no_blocks_no_placements() {
        assert!(layout(&[], TimeGrid::standard()).unwrap().is_empty());
    }

    #[test]
    fn adjacent_blocks_stay_separate() {
        let blocks = vec![block(WeekDay::MONDAY, 0, 1), block(WeekDay::MONDAY, 2, 3)];
        let placements = layout(&blocks, TimeGrid::standard()).unwrap();
        assert!(placements.iter().all(|p| p.vertical_count == 1));
    }

    #[test]
    fn same_slots_on_different_days_do_not_cluster() {
        let blocks = vec![block(WeekDay::MONDAY, 2, 4), block(WeekDay::TUESDAY, 2, 4)];
        let cs = clusters(&blocks, TimeGrid::standard()).unwrap();
        assert_eq!(cs.len(), 2);
        assert!(cs.iter().all(OverlapCluster::is_singleton));
    }

    #[test]
    fn chain_clusters_transitively() {
        // 0-1 overlaps 1-3, 1-3 overlaps 3-5; 0-1 and 3-5 do not touch directly
        let blocks = vec![
            block(WeekDay::MONDAY, 3, 5),
            block(WeekDay::MONDAY, 0, 1),
            block(WeekDay::MONDAY, 1, 3),
        ];
        let cs = clusters(&blocks, TimeGrid::standard()).unwrap();
        assert_eq!(cs.len(), 1);
        assert_eq!(cs[0].members, vec![0, 1, 2]);
        assert_eq!((cs[0].start_slot, cs[0].end_slot), (0, 5));
    }

    #[test]
    fn stacking_follows_supply_order() {
        let blocks = vec![
            block(WeekDay::MONDAY, 4, 5),
            block(WeekDay::MONDAY, 2, 4),
            block(WeekDay::MONDAY, 5, 6),
        ];
        let placements = layout(&blocks, TimeGrid::standard()).unwrap();
        let indices: Vec<usize> = placements.iter().map(|p| p.vertical_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        for p in &placements {
            assert_eq!(p.vertical_count, 3);
            assert_eq!(p.horizontal_start_slot, 2);
            assert_eq!(p.horizontal_slot_span, 5);
            assert_eq!(p.start_time.to_string(), "09:05");
            assert_eq!(p.end_time.to_string(), "12:25");
        }
    }

    #[test]
    fn back_to_back_off_boundary_blocks_stay_singletons() {
        let grid = TimeGrid::standard();
        let stored = |start: &str, end: &str| StoredSchedule {
            day_of_week: 1,
            start_time: start.into(),
            end_time: end.into(),
            classroom: String::new(),
        };
        let blocks: Vec<ScheduleBlock> = [stored("12:30", "13:00"), stored("13:00", "13:40")]
            .iter()
            .map(|s| ScheduleBlock::from_stored(grid, s).unwrap())
            .collect();

        let placements = layout(&blocks, grid).unwrap();
        for (p, b) in placements.iter().zip(&blocks) {
            assert_eq!(p.vertical_count, 1);
            assert_eq!((p.start_time, p.end_time), (b.start_time, b.end_time));
        }

        // a third class spanning the seam pulls both into one stack
        let mut joined = blocks.clone();
        joined.push(ScheduleBlock::from_stored(grid, &stored("12:50", "13:10")).unwrap());
        let cs = clusters(&joined, grid).unwrap();
        assert_eq!(cs.len(), 1);
        assert_eq!(cs[0].start_time.to_string(), "12:30");
        assert_eq!(cs[0].end_time.to_string(), "13:40");
        assert_eq!((cs[0].start_slot, cs[0].end_slot), (7, 8));
    }

    #[test]
    fn containment_clusters() {
        let blocks = vec![block(WeekDay::FRIDAY, 0, 10), block(WeekDay::FRIDAY, 4, 4)];
        let placements = layout(&blocks, TimeGrid::standard()).unwrap();
        assert_eq!(placements[1].vertical_index, 1);
        assert_eq!(placements[1].horizontal_slot_span, 11);
    }

    #[test]
    fn inverted_block_rejected() {
        let mut bad = block(WeekDay::MONDAY, 2, 3);
        bad.start_slot = 5;
        let result = layout(&[block(WeekDay::MONDAY, 0, 0), bad], TimeGrid::standard());
        assert_eq!(result, Err(ValidationError::InvertedBlock { start: 5, end: 3 }));
    }

    #[test]
    fn block_past_grid_rejected() {
        let mut bad = block(WeekDay::MONDAY, 2, 3);
        bad.end_slot = 40;
        assert!(matches!(
            layout(&[bad], TimeGrid::standard()),
            Err(ValidationError::SlotOutOfRange { slot: 40, .. })
        ));
    }

    #[test]
    fn tagged_layout_keeps_sources() {
        let items = vec![
            ("math", block(WeekDay::MONDAY, 0, 1)),
            ("physics", block(WeekDay::MONDAY, 1, 2)),
            ("art", block(WeekDay::TUESDAY, 0, 0)),
        ];
        let placed = layout_tagged(&items, TimeGrid::standard()).unwrap();
        let summary: Vec<(&str, usize, usize)> = placed
            .iter()
            .map(|t| (t.source, t.placement.vertical_index, t.placement.vertical_count))
            .collect();
        assert_eq!(summary, vec![("math", 0, 2), ("physics", 1, 2), ("art", 0, 1)]);
    }

    #[test]
    fn render_plan_lookup() {
        let blocks = vec![
            block(WeekDay::MONDAY, 3, 4),
            block(WeekDay::MONDAY, 2, 3),
            block(WeekDay::MONDAY, 8, 8),
        ];
        let plan = RenderPlan::build(&blocks, TimeGrid::standard()).unwrap();

        let stack = plan.starting_at(WeekDay::MONDAY, 2);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack[0].block.start_slot, 3);
        assert_eq!(stack[1].block.start_slot, 2);

        assert!(plan.starting_at(WeekDay::MONDAY, 3).is_empty());
        assert_eq!(plan.starting_at(WeekDay::MONDAY, 8).len(), 1);
        assert!(plan.is_covered(WeekDay::MONDAY, 4));
        assert!(!plan.is_covered(WeekDay::MONDAY, 5));
        assert_eq!(plan.for_day(WeekDay::TUESDAY).count(), 0);
    }
}
