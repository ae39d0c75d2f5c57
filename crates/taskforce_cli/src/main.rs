//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `taskforce_core` linkage without the Flutter runtime.
//! - Bootstrap the configured workspace DB and print its dashboard counts.

use std::process::ExitCode;
use taskforce_core::{load_dashboard, open_db, resolve_db_path, seed_workspace};

fn main() -> ExitCode {
    println!("taskforce_core ping={}", taskforce_core::ping());
    println!("taskforce_core version={}", taskforce_core::core_version());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("taskforce_cli error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db_path = resolve_db_path();
    println!("db_path={}", db_path.display());

    let conn = open_db(&db_path)?;
    let seeded = seed_workspace(&conn)?;
    println!("seeded_records={}", seeded.total());

    let stats = load_dashboard(&conn)?;
    println!(
        "people_total={} people_available={}",
        stats.people_total, stats.people_available
    );
    println!(
        "tasks_pending={} tasks_in_progress={} tasks_completed={} tasks_cancelled={}",
        stats.tasks.pending, stats.tasks.in_progress, stats.tasks.completed, stats.tasks.cancelled
    );
    for department in &stats.departments {
        println!(
            "department id={} people={} assigned_tasks={}",
            department.department_id, department.people, department.assigned_tasks
        );
    }
    Ok(())
}
