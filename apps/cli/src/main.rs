#![deny(warnings)]

//! Headless driver: plays a scripted idle factory session and reports KPIs.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use idle_core::{validate_config, GameConfig, UpgradeId};
use idle_econ::format_number;
use idle_runtime::Engine;
use persistence::{FileStore, MemoryStore, Store};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    save_dir: Option<PathBuf>,
    seed: u64,
    seconds: u64,
    cps: u32,
    realtime: bool,
    prestige: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: None,
            save_dir: None,
            seed: 42,
            seconds: 60,
            cps: 5,
            realtime: false,
            prestige: false,
        }
    }
}

fn parse_args_from<I: IntoIterator<Item = String>>(args: I) -> Args {
    let mut out = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => out.config = it.next().map(PathBuf::from),
            "--save-dir" => out.save_dir = it.next().map(PathBuf::from),
            "--seed" => out.seed = it.next().and_then(|s| s.parse().ok()).unwrap_or(out.seed),
            "--seconds" => {
                out.seconds = it.next().and_then(|s| s.parse().ok()).unwrap_or(out.seconds)
            }
            "--cps" => out.cps = it.next().and_then(|s| s.parse().ok()).unwrap_or(out.cps),
            "--realtime" => out.realtime = true,
            "--prestige" => out.prestige = true,
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    out
}

/// Package version with the embedded revision and build date.
fn version_line() -> String {
    format!(
        "{} ({} {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_SHA"),
        env!("BUILD_DATE")
    )
}

fn parse_args() -> Args {
    parse_args_from(std::env::args().skip(1))
}

/// Defaults, overridden by whatever the YAML file sets.
fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    let cfg = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_yaml::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Cheapest upgrade that is shown, affordable and not a running campaign.
fn cheapest_affordable<S: Store>(engine: &Engine<S>) -> Option<UpgradeId> {
    UpgradeId::all()
        .iter()
        .copied()
        .filter(|u| engine.is_revealed(*u) && engine.can_afford(*u))
        .filter(|u| {
            u.campaign()
                .map_or(true, |c| !engine.state().is_campaign_active(c))
        })
        .min_by_key(|u| engine.price_of(*u))
}

fn click_period_ms(cps: u32) -> u64 {
    if cps == 0 {
        1_000
    } else {
        (1_000 / u64::from(cps)).max(1)
    }
}

/// Once-per-second decisions: one purchase, then prestige if asked for.
fn economy_step<S: Store>(engine: &mut Engine<S>, prestige: bool) {
    if let Some(upgrade) = cheapest_affordable(engine) {
        if let Err(e) = engine.buy(upgrade) {
            warn!(error = %e, "scripted purchase failed");
        }
    }
    if prestige && engine.state().prestige_unlocked {
        if let Err(e) = engine.activate_prestige() {
            warn!(error = %e, "scripted prestige failed");
        }
    }
}

/// Claim today's reward when it is still open. Returns the amount granted.
fn claim_daily<S: Store>(engine: &mut Engine<S>, today: NaiveDate) -> Option<u64> {
    if !engine.daily_reward_available(today) {
        return None;
    }
    match engine.claim_daily_reward(today) {
        Ok(amount) => {
            info!(%today, amount, "daily reward claimed");
            Some(amount)
        }
        Err(e) => {
            warn!(error = %e, "daily reward refused");
            None
        }
    }
}

fn log_notices<S: Store>(engine: &mut Engine<S>) {
    for notice in engine.drain_notices() {
        info!(at_ms = engine.now_ms(), "{notice}");
    }
}

fn run_virtual<S: Store>(engine: &mut Engine<S>, args: &Args) {
    let period = click_period_ms(args.cps);
    for _ in 0..args.seconds {
        let mut spent = 0;
        for _ in 0..args.cps {
            engine.click();
            engine.advance(period);
            spent += period;
        }
        engine.advance(1_000u64.saturating_sub(spent));
        economy_step(engine, args.prestige);
        log_notices(engine);
    }
}

fn run_realtime<S: Store>(engine: &mut Engine<S>, args: &Args) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building tokio runtime")?;
    rt.block_on(async {
        let mut ticker = tokio::time::interval(Duration::from_millis(click_period_ms(args.cps)));
        let start = tokio::time::Instant::now();
        let end = start + Duration::from_secs(args.seconds);
        let mut last = start;
        let mut next_step = Duration::from_secs(1);
        loop {
            let now = ticker.tick().await;
            if now >= end {
                break;
            }
            engine.advance((now - last).as_millis() as u64);
            last = now;
            if args.cps > 0 {
                engine.click();
            }
            if now - start >= next_step {
                economy_step(engine, args.prestige);
                next_step += Duration::from_secs(1);
            }
            log_notices(engine);
        }
    });
    Ok(())
}

fn report<S: Store>(engine: &Engine<S>, args: &Args) {
    let s = engine.state();
    println!(
        "KPI | seconds: {} | units: {} | lifetime: {} | clicks: {} | level: {} | auto/tick: {} | prestige: x{:.2}",
        args.seconds,
        format_number(s.currency),
        format_number(s.lifetime_spent),
        s.total_clicks,
        engine.level(),
        format_number(engine.auto_rate_per_tick()),
        s.prestige_multiplier
    );
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::DEBUG)
        .init();

    let args = parse_args();
    info!(version = %version_line(), ?args, "starting idle factory session");

    let cfg = load_config(args.config.as_deref())?;
    let store: Box<dyn Store> = match &args.save_dir {
        Some(dir) => Box::new(FileStore::new(dir)),
        None => Box::new(MemoryStore::new()),
    };
    let mut engine = Engine::new(cfg, store, args.seed)?;

    claim_daily(&mut engine, chrono::Local::now().date_naive());

    if args.realtime {
        run_realtime(&mut engine, &args)?;
    } else {
        run_virtual(&mut engine, &args);
    }
    log_notices(&mut engine);
    report(&engine, &args);
    engine.flush();
    Ok(())
}
