//! Snow War entry point
//!
//! Native: runs a headless AI-vs-AI match and prints the result.
//! Web: the entry point is `platform::web::start`, this binary does nothing.

#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;

#[cfg(not(target_arch = "wasm32"))]
use snow_war::sim::PhysicsMode;

/// Headless AI-vs-AI match
#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Match seed; picked from the clock when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Stop after this many simulated seconds
    #[arg(long, default_value_t = 300.0)]
    max_seconds: f32,
    /// Snowball integrator: rigid or euler
    #[arg(long, value_parser = parse_physics)]
    physics: Option<PhysicsMode>,
}

#[cfg(not(target_arch = "wasm32"))]
fn parse_physics(s: &str) -> Result<PhysicsMode, String> {
    PhysicsMode::from_str(s).ok_or_else(|| format!("unknown physics mode '{}' (rigid|euler)", s))
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use snow_war::consts::SIM_DT;
    use snow_war::platform::seed_from_clock;
    use snow_war::sim::{GamePhase, GameState, TickInput, tick};
    use snow_war::{SceneSnapshot, Settings};

    env_logger::init();

    let cli = Cli::parse();
    let seed = cli.seed.unwrap_or_else(seed_from_clock);
    let loaded = Settings::load();
    let settings = Settings {
        human_control: false,
        physics: cli.physics.unwrap_or(loaded.physics),
        ..loaded
    };

    log::info!("Snow War (native) starting, seed {}", seed);
    let mut state = GameState::new(seed, settings);
    let input = TickInput::default();

    while state.time < cli.max_seconds {
        tick(&mut state, &input, SIM_DT);
        match state.phase {
            GamePhase::Victory => {
                log::info!("Players cleared level {} at {:.1}s", state.level, state.time);
                break;
            }
            GamePhase::GameOver => break,
            _ => {}
        }
    }

    let stats = state.stats();
    println!(
        "seed {} | {} after {:.1}s | level {} score {} | players {} enemies {}",
        seed,
        stats.phase.as_str(),
        stats.time,
        stats.level,
        stats.score,
        stats.players_alive,
        stats.enemies_alive
    );

    if std::env::var_os("SNOW_WAR_DUMP_SCENE").is_some() {
        match SceneSnapshot::from_game(&state).to_json_pretty() {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("Scene export failed: {}", e),
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from(["snow-war", "--seed", "7", "--physics", "euler"]).unwrap();
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.physics, Some(PhysicsMode::Euler));
        assert_eq!(cli.max_seconds, 300.0);
    }

    #[test]
    fn test_cli_rejects_bad_input() {
        assert!(Cli::try_parse_from(["snow-war", "--seed", "abc"]).is_err());
        assert!(Cli::try_parse_from(["snow-war", "--physics", "verlet"]).is_err());
        assert!(Cli::try_parse_from(["snow-war", "42"]).is_err());
    }
}
