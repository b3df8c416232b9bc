use std::io::{self, stdout, Stdout};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;
use clap::{Parser, Subcommand};
use crossbeam_channel::{Receiver, TryRecvError};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::{backend::CrosstermBackend, Terminal};

use gitcat::app::{Backends, LogicThread, SessionOutcome};
use gitcat::config::{Config, ConfigOverrides, Provider};
use gitcat::forge::{Forge, GitHubCli};
use gitcat::git::{default_branch_name, is_protected_branch, GitOps, VersionControl};
use gitcat::render::RenderState;
use gitcat::tea::Session;
use gitcat::{glog, glog_error, llm, settings, ui, Error, Result};

const FRAME_DURATION: Duration = Duration::from_micros(16_666); // 60fps

/// gitcat - AI-assisted conventional commits and pull requests
#[derive(Parser, Debug)]
#[command(name = "gitcat")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:
    ANTHROPIC_API_KEY   API key for the anthropic provider
    OPENAI_API_KEY      API key for the openai provider (optional)
    GITCAT_DEBUG=1      Enable debug logging (alternative to --debug)")]
pub struct Cli {
    /// Model for both commit and PR generation
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Generation provider
    #[arg(short = 'p', long, value_enum)]
    pub provider: Option<Provider>,

    /// Model for commit message generation
    #[arg(long)]
    pub commit_model: Option<String>,

    /// Model for PR title and body generation
    #[arg(long)]
    pub pr_model: Option<String>,

    /// Ollama server URL
    #[arg(long)]
    pub ollama_url: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long)]
    pub openai_url: Option<String>,

    /// OpenAI API key (overrides OPENAI_API_KEY)
    #[arg(long)]
    pub openai_api_key: Option<String>,

    /// Create a pull request for the current branch without committing
    #[arg(long)]
    pub pr: bool,

    /// Enable debug logging (writes to ~/.config/gitcat/gitcat.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Edit provider, models and endpoints interactively
    Config,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            provider: self.provider,
            model: self.model.clone(),
            commit_model: self.commit_model.clone(),
            pr_model: self.pr_model.clone(),
            ollama_url: self.ollama_url.clone(),
            openai_url: self.openai_url.clone(),
            openai_api_key: self.openai_api_key.clone(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    gitcat::log::init_with_debug(cli.debug);
    if gitcat::log::is_debug() {
        glog!("gitcat starting (debug mode enabled)");
    } else {
        glog!("gitcat starting");
    }

    let result = match cli.command {
        Some(Command::Config) => run_config(),
        None => run(&cli),
    };

    match result {
        Ok(outcome) => report(outcome),
        Err(e) => {
            glog_error!("Fatal: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn report(outcome: SessionOutcome) -> ExitCode {
    if let Some(error) = outcome.fatal {
        eprintln!("Error: {}", error);
        return ExitCode::FAILURE;
    }
    if !outcome.summary.is_empty() {
        println!("{}", outcome.summary);
    }
    ExitCode::SUCCESS
}

/// Load the config file, writing defaults on first run.
fn load_config() -> Result<Config> {
    let path = Config::config_path()?;
    let existed = path.exists();
    let config = Config::load_from(&path)?;
    if !existed {
        glog!("Writing default config to {}", path.display());
        config.save_to(&path)?;
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<SessionOutcome> {
    let config = load_config()?.with_overrides(&cli.overrides());
    let generator = llm::from_config(&config)?;
    glog!(
        "provider={} commit_model={} pr_model={}",
        config.provider,
        config.commit_model(),
        config.pr_model()
    );

    let repo_path = std::env::current_dir()?;
    let vcs = Arc::new(GitOps::new(&repo_path)?);
    let forge = Arc::new(GitHubCli::new(&repo_path));

    let session = if cli.pr {
        pull_request_session(vcs.as_ref(), forge.as_ref())?
    } else {
        if !vcs.has_changes()? {
            println!("No changes to commit.");
            return Ok(SessionOutcome {
                summary: String::new(),
                fatal: None,
            });
        }
        commit_session(vcs.as_ref())?
    };

    let backends = Backends {
        vcs,
        forge,
        generator: Arc::from(generator),
        commit_model: config.commit_model().to_string(),
        pr_model: config.pr_model().to_string(),
    };
    run_tui(session, backends)
}

fn commit_session(vcs: &dyn VersionControl) -> Result<Session> {
    let diff = vcs.staged_diff()?;
    let needs_staging = diff.is_empty();
    let branch = vcs.current_branch()?;
    let protected = is_protected_branch(&branch);
    let suggestion = default_branch_name(vcs.user_name().as_deref(), Local::now().date_naive());
    glog!(
        "Commit session: branch={} protected={} needs_staging={} diff_len={}",
        branch,
        protected,
        needs_staging,
        diff.len()
    );
    Ok(Session::new(
        diff,
        needs_staging,
        branch,
        protected,
        suggestion,
    ))
}

fn pull_request_session(vcs: &dyn VersionControl, forge: &dyn Forge) -> Result<Session> {
    let branch = vcs.current_branch()?;
    forge.check_origin(&vcs.origin_url()?)?;
    if forge.has_existing_pr(&branch) {
        return Err(Error::Forge(format!(
            "a pull request already exists for branch {}",
            branch
        )));
    }
    glog!("PR session: branch={}", branch);
    Ok(Session::for_pull_request(branch))
}

fn run_config() -> Result<SessionOutcome> {
    let config = load_config()?;
    let path = Config::config_path()?;

    let mut terminal = setup_terminal()?;
    let result = settings::run(&mut terminal, config, &path);
    restore_terminal(&mut terminal)?;

    if result? {
        println!("Configuration saved to {}", path.display());
    }
    Ok(SessionOutcome {
        summary: String::new(),
        fatal: None,
    })
}

fn run_tui(session: Session, backends: Backends) -> Result<SessionOutcome> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let (state_tx, state_rx) = crossbeam_channel::bounded::<RenderState>(1);

    let mut terminal = setup_terminal()?;

    let shutdown_clone = shutdown.clone();
    let logic_handle =
        thread::spawn(move || LogicThread::run(session, backends, state_tx, shutdown_clone));

    let render_result = render_loop(&mut terminal, state_rx, &shutdown);

    shutdown.store(true, Ordering::SeqCst);
    let outcome = logic_handle
        .join()
        .map_err(|_| Error::TaskJoin("logic thread panicked".to_string()));
    restore_terminal(&mut terminal)?;

    render_result?;
    outcome?
}

fn render_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state_rx: Receiver<RenderState>,
    shutdown: &AtomicBool,
) -> Result<()> {
    let mut state = RenderState::default();
    let mut last_version: u64 = 0;
    let mut last_frame = Instant::now();
    let mut dirty = false;
    let mut received = false;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match state_rx.try_recv() {
            Ok(s) => {
                dirty = dirty || !received || s.version != last_version;
                received = true;
                state = s;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => break,
        }

        if last_frame.elapsed() < FRAME_DURATION {
            thread::sleep(Duration::from_micros(500));
            continue;
        }
        last_frame = Instant::now();

        if dirty {
            terminal.draw(|f| ui::draw(f, &state))?;
            last_version = state.version;
            dirty = false;
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.hide_cursor()?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(disable_raw_mode()?)
}
