use std::collections::BTreeSet;
use std::{fs, process};

use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;

use ftl_player::{
    config::PlayerConfig,
    load_schedule,
    player::{Outcome, Player},
    types::Schedule,
};

fn main() {
    init_tracing();
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const PLAY_USAGE: &str = "ftl-player play <file.ftl>";
const CHECK_USAGE: &str = "ftl-player check <file.ftl>";
const DUMP_USAGE: &str = "ftl-player dump <file.ftl>";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        Some("play") => {
            let path = args.next().context(PLAY_USAGE)?;
            play(&path)
        }
        Some("check") => {
            let path = args.next().context(CHECK_USAGE)?;
            check(&path)
        }
        Some("dump") => {
            let path = args.next().context(DUMP_USAGE)?;
            dump(&path)
        }
        _ => bail!(
            "FTL player — scripted bullet-pattern playback\n\nUsage:\n  {PLAY_USAGE}\n  {CHECK_USAGE}\n  {DUMP_USAGE}"
        ),
    }
}

fn load(path: &str) -> Result<Schedule> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    load_schedule(&text).with_context(|| format!("Failed to load {path}"))
}

fn play(path: &str) -> Result<()> {
    let schedule = load(path)?;
    let mut player = Player::new(schedule, PlayerConfig::load());

    match player.play()? {
        Outcome::Finished { ticks } => eprintln!("Finished {path} after {ticks} ticks"),
        Outcome::Interrupted { ticks } => eprintln!("Stopped {path} after {ticks} ticks"),
    }
    Ok(())
}

fn check(path: &str) -> Result<()> {
    let schedule = load(path)?;
    let uids: BTreeSet<i64> = schedule
        .frames
        .values()
        .flatten()
        .map(|event| event.uid)
        .collect();

    println!(
        "{path}: {} frames, {} events, {} bullets, last frame {}",
        schedule.frame_count(),
        schedule.event_count(),
        uids.len(),
        schedule.last_frame(),
    );
    Ok(())
}

fn dump(path: &str) -> Result<()> {
    let schedule = load(path)?;
    println!("{}", serde_json::to_string_pretty(&schedule)?);
    Ok(())
}
