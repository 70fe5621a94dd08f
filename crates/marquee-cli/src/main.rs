//! Marquee scenario runner
//!
//! Replays a JSON scenario through the engine on a headless surface and
//! prints every published event as one JSON line, followed by a summary
//! line with the final selection and drop zone contents.
//!
//! ```text
//! marquee demos/drag_to_zone.json [--timers]
//! ```

mod scenario;

use scenario::{Scenario, ScenarioResult};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let mut path = None;
    let mut timers = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--timers" => timers = true,
            _ if path.is_none() => path = Some(PathBuf::from(arg)),
            _ => {
                eprintln!("unexpected argument: {arg}");
                return usage();
            }
        }
    }
    let Some(path) = path else {
        return usage();
    };

    match run(&path, timers) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}: {e}", path.display());
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn usage() -> ExitCode {
    eprintln!("usage: marquee <scenario.json> [--timers]");
    ExitCode::from(2)
}

fn run(path: &Path, timers: bool) -> ScenarioResult<()> {
    let scenario = Scenario::load(path)?;
    log::info!(
        "replaying {} step(s) over {} item(s) and {} zone(s)",
        scenario.steps.len(),
        scenario.items.len(),
        scenario.zones.len()
    );
    let (records, summary) = scenario.run(timers);

    let mut out = io::stdout().lock();
    for record in &records {
        serde_json::to_writer(&mut out, record)?;
        writeln!(out)?;
    }
    serde_json::to_writer(&mut out, &serde_json::json!({ "summary": summary }))?;
    writeln!(out)?;
    Ok(())
}
