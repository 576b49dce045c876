mod game;
mod term;

use std::{fs::File, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use simplelog::{Config, LevelFilter, WriteLogger};

use gridsnake::{engine, GridInt};

use game::{Flow, GameConfig, SnakeGame};

pub type TermInt = u16;
pub type Coords = (u16, u16);

/// Snake on a bounded grid, played in the terminal.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of rows on the board.
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(i32).range(engine::MIN_ROWS as i64..=500))]
    rows: GridInt,
    /// Number of columns on the board.
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(i32).range(engine::MIN_COLS as i64..=500))]
    cols: GridInt,
    /// Unpaused milliseconds between two moves.
    #[arg(long, value_name = "MILLISECONDS", default_value_t = 200, value_parser = clap::value_parser!(u64).range(20..=5_000))]
    tick_ms: u64,
    /// Base seed for food placement; each new session adds one to it.
    #[arg(long)]
    seed: Option<u64>,
    /// File that receives the log, the terminal itself is taken by the game.
    #[arg(long, value_name = "PATH", default_value = "snake.log")]
    log_file: PathBuf,
    /// One of off, error, warn, info, debug, trace.
    #[arg(long, value_name = "LEVEL", default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            rows: self.rows,
            cols: self.cols,
            tick: Duration::from_millis(self.tick_ms),
            seed: self.seed,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_file = File::create(&args.log_file)
        .with_context(|| format!("Could not create log file {}", args.log_file.display()))?;
    WriteLogger::init(args.log_level, Config::default(), log_file)
        .context("Could not initialize the logger")?;

    info!("Starting with {:?}", args);

    let mut game = SnakeGame::new(args.game_config())?;
    game.initialize()?;

    let res = run(&mut game);

    // Always leave the terminal usable, even when the game failed
    let restored = game.restore();
    if let Err(e) = &res {
        error!("Game failed: {:#}", e);
    }
    res.and(restored)
}

fn run(game: &mut SnakeGame) -> Result<()> {
    if game.show_intro()? == Flow::Quit {
        return Ok(());
    }

    loop {
        if game.play()? == Flow::Quit {
            info!("Quitting");
            return Ok(());
        }
    }
}
