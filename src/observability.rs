// Metric names. Nothing installs a recorder here; the `metrics` macros are
// no-ops until the host application does.

/// Counter: merge calls.
pub const MERGE_TOTAL: &str = "weekgrid_merge_total";

/// Counter: schedule blocks produced by merges.
pub const BLOCKS_EMITTED_TOTAL: &str = "weekgrid_blocks_emitted_total";

/// Counter: layout calls.
pub const LAYOUT_TOTAL: &str = "weekgrid_layout_total";

/// Histogram: members per overlap cluster (1 = not stacked).
pub const CLUSTER_SIZE: &str = "weekgrid_cluster_size";

/// Counter: rejected inputs. Labels: kind.
pub const VALIDATION_ERRORS_TOTAL: &str = "weekgrid_validation_errors_total";
