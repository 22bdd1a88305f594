//! Headless self-play for the holdem engine.
//!
//! Seats a table of bots, plays hands through the engine's channel
//! interface and prints the final stacks.

use anyhow::{Context, Result, bail};
use holdem::{
    EngineConfig, EngineError, EngineEvent, EngineResponse, GameEngine,
    entities::{Action, ActionChoice, Chips, GameSnapshot},
};
use log::{info, warn};
use pico_args::Arguments;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::time::{Duration, timeout};

mod bot;

use bot::{Bot, STYLES};

const HELP: &str = "\
Run a headless Texas Hold'em self-play session

USAGE:
  holdem_sim [OPTIONS]

OPTIONS:
  --players N           Number of bots            [default: 6]
  --hands N             Hands to play             [default: 100]
  --stack CHIPS         Starting stack            [default: HOLDEM_STARTING_STACK or 1000]
  --small-blind CHIPS   Small blind               [default: HOLDEM_SMALL_BLIND or 10]
  --big-blind CHIPS     Big blind                 [default: HOLDEM_BIG_BLIND or 20]
  --seed N              Seed for deals and bots

FLAGS:
  -h, --help            Print help information

ENVIRONMENT:
  RUST_LOG              Log filter, e.g. RUST_LOG=holdem=debug
";

const SIM_SUBSCRIBER: u64 = 0;

struct Args {
    players: usize,
    hands: u64,
    stack: Option<Chips>,
    small_blind: Option<Chips>,
    big_blind: Option<Chips>,
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::builder().format_target(false).init();

    let mut pargs = Arguments::from_env();
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        players: pargs.opt_value_from_str("--players")?.unwrap_or(6),
        hands: pargs.opt_value_from_str("--hands")?.unwrap_or(100),
        stack: pargs.opt_value_from_str("--stack")?,
        small_blind: pargs.opt_value_from_str("--small-blind")?,
        big_blind: pargs.opt_value_from_str("--big-blind")?,
        seed: pargs.opt_value_from_str("--seed")?,
    };

    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let mut config = EngineConfig::from_env().context("invalid HOLDEM_* environment")?;
    config.name = "self-play".to_string();
    config.max_players = args.players;
    // Bots answer immediately; the action clock only matters for humans.
    config.action_timeout_secs = 0;
    if let Some(stack) = args.stack {
        config.starting_stack = stack;
    }
    if let Some(small_blind) = args.small_blind {
        config.small_blind = small_blind;
    }
    if let Some(big_blind) = args.big_blind {
        config.big_blind = big_blind;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let engine = GameEngine::new(config.clone()).context("invalid table configuration")?;
    let (task, handle) = engine.start_engine();

    let running = Arc::new(AtomicBool::new(true));
    let interrupted = running.clone();
    let stopper = handle.clone();
    ctrlc::set_handler(move || {
        interrupted.store(false, Ordering::SeqCst);
        stopper.stop_engine();
    })
    .context("failed to install Ctrl-C handler")?;

    let base_seed = config.seed.unwrap_or_else(rand::random);
    let mut bots = Vec::with_capacity(args.players);
    for seat in 0..args.players {
        let style = STYLES[seat % STYLES.len()];
        let name = format!("{}-{seat}", style.label);
        let response = handle
            .request(EngineEvent::PlayerJoined {
                seat,
                id: seat as u64 + 1,
                name,
                chips: None,
            })
            .await?;
        if let Some(error) = response.error_message() {
            bail!("seat {seat} rejected: {error}");
        }
        bots.push(Bot::new(seat, style, base_seed.wrapping_add(seat as u64)));
    }
    info!("seated {} bots", bots.len());

    let played = match play(&handle, &mut bots, args.hands, &running).await {
        Ok(played) => played,
        Err(EngineError::EngineStopped) => {
            warn!("engine stopped before the session finished");
            0
        }
        Err(error) => return Err(error.into()),
    };

    handle.stop_engine();
    let engine = task.await.context("engine task panicked")?;

    println!("{} hands played in room {}", played, engine.id());
    for player in engine.table().players() {
        println!(
            "  seat {:>2}  {:<14} ${:>7}",
            player.seat,
            player.name.to_string(),
            player.chips
        );
    }
    println!("  total          ${:>7}", engine.table().total_chips());
    Ok(())
}

/// Plays until `hands` have been dealt, fewer than two stacks remain or the
/// session is interrupted. Returns how many hands were started.
async fn play(
    handle: &holdem::EngineHandle,
    bots: &mut [Bot],
    hands: u64,
    running: &AtomicBool,
) -> Result<u64, EngineError> {
    let mut updates = handle.subscribe(SIM_SUBSCRIBER, 64)?;
    let mut played = 0;
    if hands == 0 {
        return Ok(played);
    }

    match handle.request(EngineEvent::Ready).await? {
        EngineResponse::Success => played += 1,
        other => {
            warn!("could not start: {}", other.error_message().unwrap_or_default());
            return Ok(played);
        }
    }

    while running.load(Ordering::SeqCst) {
        while updates.try_recv().is_ok() {}
        let snapshot = handle.snapshot().await?;

        if let Some(seat) = snapshot.to_act {
            let Some(bot) = bots.get_mut(seat) else {
                warn!("seat {seat} has no bot");
                break;
            };
            let view = handle.snapshot_for(seat).await?;
            let action = bot.decide(&view);
            let response = handle
                .request(EngineEvent::PlayerActed {
                    seat,
                    action: action.clone(),
                })
                .await?;
            if !response.is_success() {
                let fallback = fallback_action(&view);
                warn!("seat {seat}: {action} rejected, playing {fallback}");
                handle
                    .request(EngineEvent::PlayerActed {
                        seat,
                        action: fallback,
                    })
                    .await?;
            }
            continue;
        }

        if snapshot.hand_over {
            if played >= hands {
                break;
            }
            if funded_seats(&snapshot) < 2 {
                info!("one stack left after {played} hands");
                break;
            }
            match handle.request(EngineEvent::StartGame).await? {
                EngineResponse::Success => played += 1,
                other => {
                    warn!("could not deal: {}", other.error_message().unwrap_or_default());
                    break;
                }
            }
            continue;
        }

        // Nobody to act and the hand isn't over: wait for the engine to move.
        let _ = timeout(Duration::from_millis(250), updates.recv()).await;
    }

    handle.unsubscribe(SIM_SUBSCRIBER)?;
    Ok(played)
}

fn fallback_action(view: &GameSnapshot) -> Action {
    let offered_check = view
        .to_act
        .and_then(|seat| view.seat(seat))
        .is_some_and(|me| me.suggestions.contains(&ActionChoice::Check));
    if offered_check {
        Action::Check
    } else {
        Action::Fold
    }
}

fn funded_seats(snapshot: &GameSnapshot) -> usize {
    snapshot.seats.iter().filter(|seat| seat.chips > 0).count()
}
