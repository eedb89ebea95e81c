use std::io::{self, Read};

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::info;

use weekgrid::engine::{self, ValidationError};
use weekgrid::grid::{GridConfig, TimeGrid, DEFAULT_DAY_END, DEFAULT_DAY_START, DEFAULT_SLOT_MINUTES};
use weekgrid::model::{ScheduleBlock, SelectionCell, StoredSchedule, TimeSlot};

#[derive(Parser, Debug)]
#[command(name = "weekgrid", version, about = "Weekly timetable grid: merge selections, lay out overlapping classes")]
struct Args {
    /// First slot of the day (HH:MM)
    #[arg(long, global = true, env = "WEEKGRID_DAY_START", default_value_t = DEFAULT_DAY_START)]
    day_start: TimeSlot,

    /// Slot length in minutes
    #[arg(long, global = true, env = "WEEKGRID_SLOT_MINUTES", default_value_t = DEFAULT_SLOT_MINUTES)]
    slot_minutes: u16,

    /// No slot starts after this time (HH:MM)
    #[arg(long, global = true, env = "WEEKGRID_DAY_END", default_value_t = DEFAULT_DAY_END)]
    day_end: TimeSlot,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the day's slot start times
    Grid,
    /// Read selection cells `[{day, slot, label?}]` on stdin, print stored tuples
    Merge,
    /// Read stored tuples `[{source?, dayOfWeek, startTime, endTime, classroom?}]`
    /// on stdin, print placements
    Layout,
}

/// A stored tuple, optionally tagged with where it came from (e.g. a subject).
#[derive(Deserialize)]
struct LayoutInput {
    #[serde(default)]
    source: Option<String>,
    #[serde(flatten)]
    schedule: StoredSchedule,
}

fn read_stdin() -> io::Result<String> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(input)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // stdout carries JSON only
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let grid = TimeGrid::new(GridConfig {
        day_start: args.day_start,
        slot_minutes: args.slot_minutes,
        day_end: args.day_end,
    })?;
    info!(
        "grid: {} + {} min up to {}, {} slots",
        args.day_start,
        args.slot_minutes,
        args.day_end,
        grid.slot_count()
    );

    match args.command {
        Command::Grid => {
            let slots: Vec<String> = grid.slots().iter().map(|s| s.to_string()).collect();
            println!("{}", serde_json::to_string_pretty(&slots)?);
        }
        Command::Merge => {
            let cells: Vec<SelectionCell> = serde_json::from_str(&read_stdin()?)?;
            let blocks = engine::merge(&cells, &grid)?;
            info!("{} cells -> {} blocks", cells.len(), blocks.len());
            let stored: Vec<StoredSchedule> = blocks.iter().map(ScheduleBlock::to_stored).collect();
            println!("{}", serde_json::to_string_pretty(&stored)?);
        }
        Command::Layout => {
            let input: Vec<LayoutInput> = serde_json::from_str(&read_stdin()?)?;
            let items = input
                .into_iter()
                .map(|i| -> Result<_, ValidationError> {
                    let block = ScheduleBlock::from_stored(&grid, &i.schedule)?;
                    Ok((i.source, block))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let placed = engine::layout_tagged(&items, &grid)?;
            let stacked = placed.iter().filter(|t| t.placement.is_stacked()).count();
            info!("{} blocks placed, {stacked} stacked", placed.len());
            println!("{}", serde_json::to_string_pretty(&placed)?);
        }
    }

    Ok(())
}
