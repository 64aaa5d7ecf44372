use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::colony::ledger::format_cost;
use crate::colony::{ModuleKind, ResourceKind};
use crate::config::generation::GridParams;
use crate::config::simulation::SimulationConfig;
use crate::persistence::{self, SessionSnapshot};
use crate::simulation::statistics::{compute_statistics, print_statistics};
use crate::simulation::{Command, OxygenEvent, Outcome, Session, SessionSettings};
use crate::world::generation::print_grid_summary;

/// Half-width of the map printed by `inspect`.
const MAP_RADIUS: i32 = 8;

/// One scripted command, issued on the first frame at or after `at`
/// milliseconds into the run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptStep {
    pub at: u64,
    #[serde(flatten)]
    pub command: Command,
}

/// Parse a JSON array of script steps, ordered by `at`.
pub fn parse_script(content: &str) -> Result<Vec<ScriptStep>, String> {
    let mut steps: Vec<ScriptStep> =
        serde_json::from_str(content).map_err(|e| format!("Invalid script: {}", e))?;
    steps.sort_by_key(|s| s.at);
    Ok(steps)
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
    parse_script(&content).map_err(|e| format!("{}: {}", path.display(), e))
}

/// Totals from a headless run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub commands: usize,
    pub rejected: usize,
    pub brownout_frames: u64,
    pub oxygen_depletions: u32,
}

/// Drive `session` for `duration_ms` of game time in fixed frames, feeding
/// script steps as their time comes up. The clock starts at the session's
/// elapsed time.
pub fn run_session(
    session: &mut Session,
    duration_ms: u64,
    frame_interval_ms: u64,
    script: &[ScriptStep],
) -> RunSummary {
    let start = session.elapsed_ms();
    let end = start.saturating_add(duration_ms);
    let interval = frame_interval_ms.max(1);
    let mut summary = RunSummary::default();
    let mut pending = script.iter().peekable();
    let mut now = start;

    while now < end {
        now = (now + interval).min(end);

        let mut due = Vec::new();
        while let Some(step) = pending.next_if(|s| start + s.at <= now) {
            due.push(step.command.clone());
        }

        let report = session.frame(now, due);
        summary.frames += 1;
        summary.commands += report.outcomes.len();
        summary.rejected += report.outcomes.iter().filter(|o| o.is_rejected()).count();
        if report.tick.rates.is_brownout() {
            summary.brownout_frames += 1;
        }
        if report.oxygen == OxygenEvent::Depleted {
            summary.oxygen_depletions += 1;
        }
        for outcome in &report.outcomes {
            if let Outcome::Rejected(e) = outcome {
                eprintln!("  t={:.2}s rejected: {}", (now - start) as f64 / 1000.0, e);
            }
        }
    }

    let skipped = pending.count();
    if skipped > 0 {
        warn!(skipped, "Script steps past the end of the run were not issued");
    }
    summary
}

fn load_session(config: &SimulationConfig, file: Option<&str>) -> Result<Session, String> {
    let snapshot = match file {
        Some(path) => persistence::load_snapshot(Path::new(path)),
        None => persistence::load_latest_valid_snapshot(Path::new(&config.snapshot_directory)),
    }
    .map_err(|e| format!("Failed to load snapshot: {}", e))?;

    // Game time continues from where the snapshot left off.
    Ok(snapshot.restore(SessionSettings::from(config), snapshot.elapsed_ms))
}

fn save_session(config: &SimulationConfig, session: &Session) -> Result<(), String> {
    let snapshot_dir = Path::new(&config.snapshot_directory);
    let path = persistence::save_snapshot(session, snapshot_dir)
        .map_err(|e| format!("Cannot save snapshot: {}", e))?;
    eprintln!("Snapshot saved: {}", path.display());

    match persistence::prune_snapshots(snapshot_dir, config.max_snapshots as usize) {
        Ok(deleted) if !deleted.is_empty() => {
            debug!(count = deleted.len(), "Pruned old snapshots");
        }
        Ok(_) => {}
        Err(e) => eprintln!("Warning: snapshot pruning failed: {}", e),
    }
    Ok(())
}

/// Start a new colony and write its first snapshot.
pub fn new_colony(config: &SimulationConfig, params: &GridParams) -> Result<(), String> {
    params.validate()?;
    let session = Session::new(params, SessionSettings::from(config), 0);
    print_grid_summary(session.grid());
    println!("Session: {}", session.id());
    save_session(config, &session)
}

/// Fast-forward the latest (or a given) session and save the result.
pub fn run(
    config: &SimulationConfig,
    snapshot: Option<&str>,
    seconds: f64,
    script: Option<&str>,
) -> Result<(), String> {
    if !(seconds.is_finite() && seconds >= 0.0) {
        return Err(format!("--seconds must be a non-negative number, got {}", seconds));
    }
    let steps = match script {
        Some(path) => load_script(Path::new(path))?,
        None => Vec::new(),
    };

    let mut session = load_session(config, snapshot)?;
    eprintln!(
        "Running session {} for {:.1}s ({} scripted commands)",
        session.id(),
        seconds,
        steps.len()
    );

    let summary = run_session(
        &mut session,
        (seconds * 1000.0).round() as u64,
        config.frame_interval_ms(),
        &steps,
    );
    info!(
        frames = summary.frames,
        commands = summary.commands,
        rejected = summary.rejected,
        brownout_frames = summary.brownout_frames,
        oxygen_depletions = summary.oxygen_depletions,
        "Run finished"
    );

    print_statistics(&compute_statistics(&session));
    save_session(config, &session)
}

/// Print the state of the latest session.
pub fn inspect(config: &SimulationConfig, show_tech: bool, show_modules: bool) -> Result<(), String> {
    let session = load_session(config, None)?;

    if show_tech {
        inspect_tech(&session);
    } else if show_modules {
        inspect_modules(&session);
    } else {
        inspect_session(&session);
    }
    Ok(())
}

fn inspect_session(session: &Session) {
    println!("=== Session {} ===", session.id());
    println!(
        "Grid: {} x {} (seed {})",
        session.grid().width(),
        session.grid().height(),
        session.grid().seed()
    );
    println!(
        "Avatar: ({}, {})  Command center: ({}, {})",
        session.avatar().x,
        session.avatar().y,
        session.command_center().x,
        session.command_center().y
    );
    println!("Mode: {:?}", session.colony().mode);
    println!();
    print_statistics(&compute_statistics(session));
    println!();
    for row in session.grid().render_around(session.avatar(), MAP_RADIUS) {
        println!("  {}", row);
    }
}

fn inspect_tech(session: &Session) {
    let colony = session.colony();
    let available = colony.available_for_research();

    println!("=== Technologies ===");
    println!("{:<22} {:>4} {:>8}  {:<10} Unlocks", "Name", "Tier", "Cost", "Status");
    println!("{}", "-".repeat(72));
    for tech in colony.tech_graph().all() {
        let status = if colony.unlocked_techs().contains(&tech.id) {
            "done"
        } else if available.contains(&tech.id) {
            "available"
        } else {
            "locked"
        };
        let unlocks: Vec<&str> = tech.unlocks.iter().map(|k| k.name()).collect();
        println!(
            "{:<22} {:>4} {:>8.0}  {:<10} {}",
            tech.id.name(),
            tech.tier,
            tech.cost,
            status,
            unlocks.join(", ")
        );
    }
    println!(
        "\nScience: {:.1}",
        colony.resources.get(ResourceKind::Science)
    );
}

fn inspect_modules(session: &Session) {
    let colony = session.colony();
    println!("=== Modules ===");
    println!("{:<18} {:>5} {:>8}  Cost", "Name", "Built", "Unlocked");
    println!("{}", "-".repeat(64));
    for kind in ModuleKind::ALL {
        println!(
            "{:<18} {:>5} {:>8}  {}",
            kind.name(),
            colony.count(kind),
            if colony.is_unlocked(kind) { "yes" } else { "no" },
            format_cost(kind.cost())
        );
    }
}

/// Write the latest colony record as JSON to `output`, or stdout.
pub fn export(config: &SimulationConfig, output: Option<&str>) -> Result<(), String> {
    let snapshot =
        persistence::load_latest_valid_snapshot(Path::new(&config.snapshot_directory))
            .map_err(|e| format!("Failed to load snapshot: {}", e))?;

    match output {
        Some(path) => {
            persistence::export_colony_json(&snapshot.colony, Path::new(path))
                .map_err(|e| format!("Export failed: {}", e))?;
            eprintln!("Colony exported to {}", path);
        }
        None => {
            let json = persistence::colony_json(&snapshot.colony)
                .map_err(|e| format!("Export failed: {}", e))?;
            println!("{}", json);
        }
    }
    Ok(())
}

pub fn list_snapshots(dir: &Path) -> Result<(), String> {
    let snapshots =
        persistence::list_snapshots(dir).map_err(|e| format!("Error listing snapshots: {}", e))?;
    if snapshots.is_empty() {
        println!("No snapshots found in {}", dir.display());
        return Ok(());
    }

    println!("{:<40} {:>10} {:>9}", "File", "Elapsed", "Size");
    println!("{}", "-".repeat(62));
    for s in &snapshots {
        let name = s
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("?");
        println!(
            "{:<40} {:>9.1}s {:>6} KB",
            name,
            s.elapsed_ms as f64 / 1000.0,
            s.file_size.div_ceil(1024)
        );
    }
    println!("\n{} snapshot(s) in {}", snapshots.len(), dir.display());
    Ok(())
}

/// Load a snapshot file, show it, and save it as the newest snapshot so
/// later commands pick it up.
pub fn restore_snapshot(config: &SimulationConfig, file: &Path) -> Result<(), String> {
    let snapshot: SessionSnapshot = persistence::load_snapshot(file)
        .map_err(|e| format!("Error restoring snapshot: {}", e))?;
    let session = snapshot.restore(SessionSettings::from(config), snapshot.elapsed_ms);
    println!("Restored session {} from {}", session.id(), file.display());
    print_statistics(&compute_statistics(&session));
    save_session(config, &session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session() -> Session {
        let params = GridParams {
            seed: 11,
            width: 40,
            height: 30,
            deposit_chance: 0.0,
        };
        Session::new(&params, SessionSettings::default(), 0)
    }

    #[test]
    fn script_steps_flatten_commands() {
        let steps = parse_script(
            r#"[
                {"at": 500, "cmd": "move_avatar", "dx": 1, "dy": 0},
                {"at": 0, "cmd": "select_module", "kind": "Greenhouse"}
            ]"#,
        )
        .unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].at, 0);
        assert_eq!(
            steps[0].command,
            Command::SelectModule {
                kind: ModuleKind::Greenhouse
            }
        );
        assert_eq!(steps[1].command, Command::MoveAvatar { dx: 1, dy: 0 });
    }

    #[test]
    fn bad_script_is_reported() {
        let err = parse_script(r#"[{"at": 0, "cmd": "launch"}]"#).unwrap_err();
        assert!(err.starts_with("Invalid script"), "{}", err);
    }

    #[test]
    fn load_script_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.json");
        std::fs::write(&path, "not json").unwrap();
        let err = load_script(&path).unwrap_err();
        assert!(err.contains("plan.json"), "{}", err);
    }

    #[test]
    fn run_advances_game_time_in_frames() {
        let mut session = session();
        let summary = run_session(&mut session, 1_000, 100, &[]);
        assert_eq!(summary.frames, 10);
        assert_eq!(session.elapsed_ms(), 1_000);
        // ten 0.1 s steps of the command center's +10 power
        assert!((session.colony().resources.get(ResourceKind::Power) - 110.0).abs() < 1e-9);
    }

    #[test]
    fn run_issues_script_steps_when_due() {
        let mut session = session();
        let cc = session.command_center();
        let script = vec![
            ScriptStep {
                at: 0,
                command: Command::SelectModule {
                    kind: ModuleKind::Habitation,
                },
            },
            ScriptStep {
                at: 250,
                command: Command::PlaceSelected { x: cc.x, y: cc.y - 1 },
            },
            ScriptStep {
                at: 300,
                command: Command::PlaceSelected { x: cc.x + 9, y: cc.y },
            },
            ScriptStep {
                at: 5_000,
                command: Command::Reset,
            },
        ];
        let summary = run_session(&mut session, 500, 100, &script);
        assert_eq!(summary.commands, 3);
        assert_eq!(summary.rejected, 1);
        assert_eq!(session.colony().count(ModuleKind::Habitation), 1);
    }

    #[test]
    fn run_continues_from_restored_elapsed_time() {
        let mut session = session();
        run_session(&mut session, 2_000, 50, &[]);
        let snapshot = SessionSnapshot::capture(&session);
        let mut restored = snapshot.restore(SessionSettings::default(), snapshot.elapsed_ms);
        assert_eq!(restored.elapsed_ms(), 2_000);

        run_session(&mut restored, 1_000, 50, &[]);
        assert_eq!(restored.elapsed_ms(), 3_000);
    }

    #[test]
    fn new_then_run_then_export() {
        let dir = TempDir::new().unwrap();
        let config = SimulationConfig {
            snapshot_directory: dir.path().join("saves").display().to_string(),
            ..SimulationConfig::default()
        };
        let params = GridParams {
            seed: 3,
            width: 32,
            height: 32,
            deposit_chance: 0.1,
        };

        new_colony(&config, &params).unwrap();
        run(&config, None, 0.5, None).unwrap();

        let out = dir.path().join("colony.json");
        export(&config, Some(out.to_str().unwrap())).unwrap();
        let record = persistence::import_colony_json(&out).unwrap();
        for (kind, count) in &record.modules {
            let expected = u32::from(*kind == ModuleKind::CommandCenter);
            assert_eq!(*count, expected, "{:?}", kind);
        }

        let latest =
            persistence::load_latest_valid_snapshot(Path::new(&config.snapshot_directory))
                .unwrap();
        assert_eq!(latest.elapsed_ms, 500);
        assert_eq!(latest.grid.seed, 3);
    }

    #[test]
    fn run_without_snapshots_explains_how_to_start() {
        let dir = TempDir::new().unwrap();
        let config = SimulationConfig {
            snapshot_directory: dir.path().display().to_string(),
            ..SimulationConfig::default()
        };
        let err = run(&config, None, 1.0, None).unwrap_err();
        assert!(err.contains("outpost new"), "{}", err);
    }

    #[test]
    fn negative_duration_is_rejected() {
        let config = SimulationConfig::default();
        assert!(run(&config, None, -1.0, None).is_err());
    }
}
