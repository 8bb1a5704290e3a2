//! Terminal session: raw mode + alternate screen, the input loop, and the
//! bridge between dashboard effects and background tasks.

mod effects;
mod keys;
mod render;

use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use joblog_core::config::JoblogConfig;
use joblog_core::control::DownloadControl;
use joblog_core::dashboard::{Dashboard, Effect, Outcome};
use joblog_core::registry::JobRegistry;
use joblog_core::source::{DxCli, JobSource};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use effects::{Control, EffectRunner};

/// Restores the terminal on every exit path.
struct UiGuard;

impl UiGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let guard = UiGuard;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for UiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
    }
}

/// Run the dashboard until the operator quits. A fatal condition (unknown
/// owner) comes back as an error after the terminal is restored.
pub async fn run(cfg: JoblogConfig) -> Result<()> {
    let source: Arc<dyn JobSource> = Arc::new(DxCli::new(cfg.dx_program.clone()));
    let registry = Arc::new(JobRegistry::new(
        Arc::clone(&source),
        cfg.owner.clone(),
        cfg.initial_count,
        cfg.step,
    ));
    let mut dashboard = Dashboard::new(Arc::clone(&registry), cfg.attempts);

    let (tx, mut rx) = mpsc::channel(64);
    let control = Arc::new(DownloadControl::new());
    let runner = EffectRunner {
        registry,
        source,
        control: Arc::clone(&control),
        dest_dir: cfg.download_dir(),
        max_attempts: cfg.max_attempts,
        tx,
    };
    tracing::info!(
        owner = ?cfg.owner,
        initial = cfg.initial_count,
        step = cfg.step,
        attempts = cfg.attempts,
        "dashboard starting"
    );

    let _guard = UiGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    let tick = Duration::from_millis(cfg.tick_ms.max(1));
    let mut pending = VecDeque::new();
    let mut dirty = true;
    absorb(dashboard.start(), &mut dirty, &mut pending);

    loop {
        while let Some(effect) = pending.pop_front() {
            match runner.spawn(effect) {
                Control::Continue => {}
                Control::Quit => {
                    control.abort_all();
                    tracing::info!("dashboard closed");
                    return Ok(());
                }
                Control::Exit(message) => {
                    control.abort_all();
                    bail!("{message}");
                }
            }
        }

        while let Ok(completion) = rx.try_recv() {
            absorb(dashboard.apply(completion), &mut dirty, &mut pending);
        }
        if !pending.is_empty() {
            continue;
        }

        if dirty {
            draw(&mut terminal, &dashboard)?;
            dirty = false;
        }

        if event::poll(tick)? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    absorb(keys::handle(&mut dashboard, key), &mut dirty, &mut pending);
                }
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
        }
    }
}

fn absorb(outcome: Outcome, dirty: &mut bool, pending: &mut VecDeque<Effect>) {
    *dirty |= outcome.redraw;
    if let Some(effect) = outcome.effect {
        pending.push_back(effect);
    }
}

fn draw(terminal: &mut Terminal<CrosstermBackend<Stdout>>, dashboard: &Dashboard) -> Result<()> {
    terminal.draw(|frame| render::draw(frame, dashboard))?;
    Ok(())
}
