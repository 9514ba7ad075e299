use std::io::Write;

use chrono::Duration;
use wardstone_core::encounter::{EncounterState, Transition, load_script_from_file};
use wardstone_core::lock::LockUpdateEvent;
use wardstone_core::reset::reset_period;
use wardstone_types::formatting::format_duration_secs;
use wardstone_types::{BossId, Difficulty, InstanceId, MapDifficultyKey, MapId, OwnerId};

use crate::context::{CliContext, ScriptSession};

/// Load an encounter script and start a tracker session for it.
///
/// Bare names resolve against the default script directory.
pub async fn load_script(path: &str, difficulty: &str, ctx: &CliContext) -> Result<(), String> {
    let difficulty = Difficulty::parse(difficulty).ok_or("unknown difficulty")?;

    let mut file = std::path::PathBuf::from(path);
    if !file.exists()
        && let Some(dir) = wardstone_core::config::default_script_dir()
    {
        let fallback = dir.join(path);
        if fallback.exists() {
            file = fallback;
        }
    }
    let script = load_script_from_file(&file)?;

    let session = ScriptSession::new(script, difficulty);
    println!(
        "loaded {} ({} bosses) on {}",
        session.script.script.header,
        session.script.bosses.len(),
        difficulty
    );
    *ctx.session.write().await = Some(session);
    Ok(())
}

/// Decode a save-document file with the active script's codec.
pub async fn decode(path: &str, ctx: &CliContext) -> Result<(), String> {
    let session = ctx.session.read().await;
    let session = session.as_ref().ok_or("no script loaded")?;

    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let doc = session.codec.load(&text).map_err(|e| e.to_string())?;

    println!("header: {}", doc.header);
    for (idx, state) in doc.boss_states.iter().enumerate() {
        let name = session
            .script
            .bosses
            .get(idx)
            .map(|b| b.name.as_str())
            .unwrap_or("?");
        println!("  [{idx}] {name}: {state}");
    }
    for (key, value) in &doc.additional {
        println!("  {key} = {value:?}");
    }
    Ok(())
}

/// Print the fresh skeleton document for the active script.
pub async fn skeleton(ctx: &CliContext) -> Result<(), String> {
    let session = ctx.session.read().await;
    let session = session.as_ref().ok_or("no script loaded")?;
    println!("{}", session.codec.fill_data(&session.codec.skeleton(), false));
    Ok(())
}

/// Drive one boss transition and push the result through the registry.
pub async fn set_boss_state(
    owner: u64,
    boss: u32,
    state: &str,
    players: u32,
    ctx: &CliContext,
) -> Result<(), String> {
    let state = parse_state(state)?;
    let mut session = ctx.session.write().await;
    let session = session.as_mut().ok_or("no script loaded")?;
    let now = ctx.now().await;

    match session.tracker.set_boss_state(BossId(boss), state, players) {
        Transition::Unchanged => println!("unchanged"),
        Transition::Rejected(reason) => println!("rejected: {reason:?}"),
        Transition::Applied { signals } => {
            for signal in &signals {
                println!("  {signal:?}");
            }
            let mask = session.tracker.completed_mask();
            // Incremental write: mutate one slot of the stored document,
            // falling back to a fresh skeleton if none parses.
            let old = ctx
                .registry
                .find_active_lock(OwnerId(owner), session.key, false, false, now)
                .map(|l| l.data().document)
                .unwrap_or_default();
            let document = session.codec.apply_boss_state(&old, boss as usize, state);
            let update = LockUpdateEvent::new(InstanceId(1), document, mask)
                .with_entrance(session.tracker.effective_entrance(mask));
            match ctx.registry.promote_or_update(OwnerId(owner), session.key, update, now) {
                Some(lock) => println!(
                    "lock updated: mask={:#b} expiry={}",
                    lock.completed_mask(),
                    lock.expiry
                ),
                None => println!("map has no reset schedule, nothing persisted"),
            }
        }
    }
    Ok(())
}

/// Bind an owner to an instance ahead of any encounter progress.
pub async fn enter(
    owner: u64,
    map: u32,
    difficulty: &str,
    instance: u32,
    ctx: &CliContext,
) -> Result<(), String> {
    let difficulty = Difficulty::parse(difficulty).ok_or("unknown difficulty")?;
    let key = MapDifficultyKey::new(MapId(map), difficulty);
    let now = ctx.now().await;

    match ctx
        .registry
        .create_temporary_lock(OwnerId(owner), key, InstanceId(instance), now)
    {
        Some(lock) => println!("temporary lock until {}", lock.expiry),
        None => println!("map {map}/{difficulty} has no reset schedule"),
    }
    Ok(())
}

/// Toggle lock extension.
pub async fn extend(owner: u64, map: u32, difficulty: &str, off: bool, ctx: &CliContext) -> Result<(), String> {
    let difficulty = Difficulty::parse(difficulty).ok_or("unknown difficulty")?;
    let key = MapDifficultyKey::new(MapId(map), difficulty);
    let now = ctx.now().await;

    match ctx.registry.set_extended(OwnerId(owner), key, !off, now) {
        Some((old_eff, new_eff)) => println!("effective expiry {old_eff} -> {new_eff}"),
        None => println!("no permanent lock for that key"),
    }
    Ok(())
}

/// Show every lock in the registry.
pub async fn show_locks(ctx: &CliContext) -> Result<(), String> {
    let now = ctx.now().await;
    let locks = ctx.registry.snapshot();
    if locks.is_empty() {
        println!("no locks");
        return Ok(());
    }
    for (lk, lock, temporary) in locks {
        let flavor = if temporary { "temp" } else { "perm" };
        let state = if lock.is_active(now) { "active" } else { "expired" };
        println!(
            "{flavor} owner={} {} instance={} mask={:#b} expiry={} extended={} {state}",
            lk.owner.0,
            lk.map_difficulty,
            lock.instance.0,
            lock.completed_mask(),
            lock.expiry,
            lock.extended,
        );
    }
    Ok(())
}

/// Show the next reset per scheduled (map, difficulty).
pub async fn next_resets(ctx: &CliContext) -> Result<(), String> {
    let now = ctx.now().await;
    for map in wardstone_core::game_data::all_map_ids() {
        let Some(entry) = wardstone_core::game_data::lookup_map(map) else {
            continue;
        };
        for difficulty in Difficulty::ALL {
            let key = MapDifficultyKey::new(map, difficulty);
            let Some(next) = ctx.registry.next_reset_time(key, now) else {
                continue;
            };
            let Some(cadence) = wardstone_core::game_data::map_cadence(map, difficulty) else {
                continue;
            };
            let period = reset_period(cadence, ctx.registry.config());
            println!(
                "{} {}: {} (in {}, period {})",
                entry.name,
                difficulty,
                next,
                format_duration_secs((next - now).num_seconds()),
                format_duration_secs(period.num_seconds()),
            );
        }
    }
    Ok(())
}

/// Advance the simulated clock and process due reset events.
pub async fn tick(advance_secs: i64, ctx: &CliContext) -> Result<(), String> {
    let mut clock = ctx.clock.write().await;
    *clock += Duration::seconds(advance_secs);
    let now = *clock;
    drop(clock);

    ctx.registry.tick(now);
    println!("clock now {now}, {} events queued", ctx.registry.scheduled_event_count());
    Ok(())
}

/// Show the reset configuration.
pub async fn show_config(ctx: &CliContext) -> Result<(), String> {
    let config = ctx.registry.config();
    println!("daily_hour = {}", config.daily_hour);
    println!("weekly_day = {}", config.weekly_day);
    println!("rate_multiplier = {}", config.rate_multiplier);
    println!("instance_hour_offset = {}", config.instance_hour_offset);
    Ok(())
}

pub fn exit() {
    write!(std::io::stdout(), "quitting...").expect("error exiting");
    std::io::stdout().flush().expect("error flushing stdout");
}

fn parse_state(s: &str) -> Result<EncounterState, String> {
    match s.to_ascii_lowercase().as_str() {
        "not_started" => Ok(EncounterState::NotStarted),
        "in_progress" => Ok(EncounterState::InProgress),
        "fail" => Ok(EncounterState::Fail),
        "done" => Ok(EncounterState::Done),
        "special" => Ok(EncounterState::Special),
        other => Err(format!("unknown state: {other}")),
    }
}
