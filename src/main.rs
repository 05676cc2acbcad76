mod app;
mod entry;
mod help;
mod logging;
mod table;
mod theme;
use crate::app::App;
use crate::table::DayWindow;
use anyhow::Context;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use lexopt::{Arg, Parser, ValueExt};
use ratatui::DefaultTerminal;
use std::io;
use std::path::PathBuf;
use time::{Date, OffsetDateTime};
use zeitblatt::config::{Config, DEFAULT_CONFIG_FILE};
use zeitblatt::format::{self, Formatter};
use zeitblatt::store::JsonFileStore;
use zeitblatt::worktime::SaveQueue;

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    Run {
        date: Option<Date>,
        config: Option<PathBuf>,
        verbosity: u8,
    },
    Help,
    Version,
}

impl Command {
    fn from_parser(mut parser: Parser) -> Result<Command, lexopt::Error> {
        let mut date = None;
        let mut config = None;
        let mut verbosity = 0u8;
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('c') | Arg::Long("config") => {
                    config = Some(PathBuf::from(parser.value()?));
                }
                Arg::Short('v') | Arg::Long("verbose") => {
                    verbosity = verbosity.saturating_add(1);
                }
                Arg::Value(value) if date.is_none() => {
                    let value = value.string()?;
                    match format::parse(&value, "Y4-M2-D2").to_date() {
                        Ok(d) => date = Some(d),
                        Err(e) => {
                            return Err(lexopt::Error::ParsingFailed {
                                value,
                                error: Box::new(e),
                            })
                        }
                    }
                }
                _ => return Err(arg.unexpected()),
            }
        }
        Ok(Command::Run {
            date,
            config,
            verbosity,
        })
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Run {
                date,
                config,
                verbosity,
            } => {
                let config = Config::load(config.as_deref()).context("failed to load config")?;
                logging::init(verbosity, config.log_file.as_deref())?;
                tracing::info!(store = %config.store.display(), "starting");
                let today = OffsetDateTime::now_local()
                    .context("failed to determine local date")?
                    .date();
                let store = JsonFileStore::open(&config.store)?;
                let mut days = DayWindow::new(today);
                if let Some(date) = date {
                    days = days.start_date(date);
                }
                let app = App::new(
                    days,
                    config.classifier(),
                    Formatter::default(),
                    store,
                    SaveQueue::new(config.save_delay()),
                );
                with_terminal(|mut terminal| {
                    terminal.hide_cursor().context("failed to hide cursor")?;
                    app.run(terminal)
                })
            }
            Command::Help => {
                println!("Usage: zeitblatt [OPTIONS] [YYYY-MM-DD]");
                println!();
                println!("Scrollable terminal timesheet with Austrian holidays, birthdays and work-time totals");
                println!();
                println!("Options:");
                println!("  -c, --config FILE Read settings from FILE [default: {DEFAULT_CONFIG_FILE}]");
                println!("  -v, --verbose     Log more; may be given up to three times");
                println!("  -h, --help        Display this help message and exit");
                println!("  -V, --version     Show the program version and exit");
                Ok(())
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    Command::from_parser(Parser::from_env())?.run()
}

fn with_terminal<F, T>(func: F) -> anyhow::Result<T>
where
    F: FnOnce(DefaultTerminal) -> anyhow::Result<T>,
{
    let terminal = ratatui::init();
    let r = crossterm::execute!(io::stdout(), EnableMouseCapture)
        .context("failed to enable mouse capture")
        .and_then(|()| func(terminal));
    let cleanup = crossterm::execute!(io::stdout(), DisableMouseCapture);
    ratatui::restore();
    finish(r, cleanup)
}

// A failed cleanup is only reported when the session itself succeeded
fn finish<T>(result: anyhow::Result<T>, cleanup: io::Result<()>) -> anyhow::Result<T> {
    match (result, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e).context("failed to disable mouse capture"),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup_err)) => {
            tracing::warn!(error = %cleanup_err, "failed to disable mouse capture");
            Err(e)
        }
    }
}
