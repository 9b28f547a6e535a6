use coda_extract::{extract::SnapshotStore, pipeline};
use std::{env, path::Path, process::exit};

fn main() {
    // Expect exactly one CLI argument: a raw snapshot, or a directory to take the newest from.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <SNAPSHOT_FILE|RAW_DIR>", args[0]);
        exit(1);
    }
    if let Err(e) = inspect_snapshot(Path::new(&args[1])) {
        eprintln!("Error: {}", e);
        exit(1);
    }
}

/// Print the column map, per-column fill and the summary of one snapshot.
fn inspect_snapshot(target: &Path) -> Result<(), Box<dyn std::error::Error>> {
    // 1) Resolve the file.
    let path = if target.is_dir() {
        SnapshotStore::new(target)
            .latest()?
            .ok_or_else(|| format!("no snapshots in {}", target.display()))?
    } else {
        target.to_path_buf()
    };

    // 2) Load and run the offline part of the pipeline.
    let raw = SnapshotStore::load(&path)?;
    println!("=== Snapshot: {} ===", path.display());
    println!("Raw rows:             {}", raw.rows.len());
    println!("Known columns:        {}", raw.column_map.len());
    println!();

    println!("=== Columns ===");
    for col in raw.column_map.iter() {
        println!("- {:<20} | {}", col.id, col.name);
    }
    println!();

    let outcome = pipeline::process(raw);

    // 3) Null share per cleaned column.
    println!("=== Nulls ===");
    for nulls in &outcome.summary.nulls {
        println!("- {:<30} | {:>6.2}%", nulls.column, nulls.null_pct);
    }
    println!();

    // 4) Summary and metrics as JSON for piping.
    println!("=== Summary ===");
    println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
    println!("=== Metrics ===");
    println!("{}", serde_json::to_string_pretty(&outcome.metrics)?);
    Ok(())
}
