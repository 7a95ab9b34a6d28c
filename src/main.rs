use std::fs::File;
use std::io::{self, Stdout};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pacman_tiles::assets::AssetLoader;
use pacman_tiles::components::Direction;
use pacman_tiles::config::Settings;
use pacman_tiles::level::{LevelData, COLS, ROWS, TILE_SIZE};
use pacman_tiles::render::Surface;
use pacman_tiles::terminal::TerminalSurface;
use pacman_tiles::{Game, GameResult};

fn main() -> GameResult<()> {
    let settings = Settings::from_env();
    init_logging(&settings);
    info!(settings = %serde_json::to_string(&settings)?, "starting");

    // Load before touching the terminal so errors print normally.
    let assets = AssetLoader::with_defaults(settings.maze.clone()).load()?;
    let level = LevelData::from_assets(&assets, COLS, ROWS, TILE_SIZE)?;
    let mut game = Game::new(level, assets, &settings)?;

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &mut game, &settings);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    if let Err(e) = &result {
        error!(error = %e, "terminal loop failed");
    }
    Ok(result?)
}

fn init_logging(settings: &Settings) {
    // The terminal is in raw mode, so logs go to a file.
    let Ok(file) = File::create(&settings.log_file) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn run(stdout: &mut Stdout, game: &mut Game, settings: &Settings) -> io::Result<()> {
    let map = game.map();
    let mut surface = TerminalSurface::new(map.cols, map.rows, map.size);
    let frame_time = Duration::from_micros(settings.frame_micros());
    let mut last_frame = Instant::now();

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(key) => match key.kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => match key.code {
                        KeyCode::Char('q') => return Ok(()),
                        KeyCode::Char('r') => game.restart(),
                        code => {
                            if let Some(direction) = direction_for(code) {
                                game.request_direction(direction);
                            }
                        }
                    },
                    _ => {}
                },
                Event::Resize(_, _) => {
                    surface.restore_frame();
                    surface.invalidate();
                }
                _ => {}
            }
        }

        let gap_ms = last_frame.elapsed().as_secs_f32() * 1000.0;
        last_frame = Instant::now();
        game.frame(&mut surface, gap_ms);
        surface.present(stdout, &game.hud(), terminal::size()?)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

fn direction_for(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('k') => Some(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('j') => Some(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('h') => Some(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('l') => Some(Direction::Right),
        _ => None,
    }
}
