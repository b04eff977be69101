use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
};
use tracing::{info, warn};

use typetick::{
    app::{App, AppAction},
    config::{ConfigStore, StoredConfig},
    logging,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    storage::{FileStorage, LocalStore, StorageBackend},
    timer::{Clock, SystemClock},
};

/// timed typing practice in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type as many words as you can before the countdown runs out. \
                  Settings given on the command line are remembered for next time."
)]
pub struct Cli {
    /// length of the countdown in seconds
    #[clap(short = 's', long, value_parser = clap::value_parser!(u64).range(1..))]
    seconds: Option<u64>,

    /// how many words to generate at a time
    #[clap(
        short = 'w',
        long,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    words: Option<usize>,

    /// write debug output to the log file
    #[clap(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let log_path = logging::init(cli.verbose);

    let store = LocalStore::new(FileStorage::default_location());
    let config_store = StoredConfig::new(store.clone());
    let config = config_store.load().with_overrides(cli.seconds, cli.words);
    if let Err(e) = config_store.save(&config) {
        warn!(error = %e, "failed to save config");
    }
    info!(?config, ?log_path, "starting");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, store, SystemClock);
    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B, C, S>(terminal: &mut Terminal<B>, app: &mut App<C, S>) -> Result<(), Box<dyn Error>>
where
    B: Backend,
    C: Clock,
    S: StorageBackend,
{
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        match runner.step() {
            AppEvent::Frame => {
                if app.timer.is_running() {
                    app.on_frame()?;
                    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                }
            }
            AppEvent::Resize => {
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            AppEvent::Key(key) => {
                if app.handle_key(key)? == AppAction::Quit {
                    break;
                }
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
        }
    }

    Ok(())
}
