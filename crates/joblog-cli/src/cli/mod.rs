//! Command line for the job dashboard.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use joblog_core::config::{self, JoblogConfig};
use std::io::Write;
use std::path::PathBuf;

use crate::tui;

/// Interactive dashboard for DNAnexus jobs: browse, filter, read logs and
/// download outputs.
#[derive(Debug, Parser)]
#[command(name = "joblog")]
#[command(about = "Terminal dashboard for DNAnexus jobs", long_about = None)]
pub struct Cli {
    /// Only list jobs launched by this user.
    #[arg(short = 'u', long = "user", value_name = "OWNER")]
    pub owner: Option<String>,

    /// Number of jobs fetched and shown at startup.
    #[arg(short = 'n', long = "num", value_name = "COUNT")]
    pub count: Option<usize>,

    /// How many jobs "more" and "less" add or remove.
    #[arg(short = 's', long, value_name = "STEP")]
    pub step: Option<usize>,

    /// Directory outputs are downloaded into (default: current directory).
    #[arg(long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,

    /// List each job's attempts before showing a log.
    #[arg(long)]
    pub attempts: bool,

    /// Platform command-line tool to run.
    #[arg(long = "dx", value_name = "PROGRAM")]
    pub dx_program: Option<String>,

    /// Print a shell completion script and exit.
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if let Some(shell) = cli.completions {
            write_completions(shell, &mut std::io::stdout())?;
            return Ok(());
        }

        let cfg = cli.merge(config::load_or_init().context("loading config")?);
        cfg.validate().context("invalid settings")?;
        tracing::debug!("effective config: {:?}", cfg);

        tui::run(cfg).await
    }

    /// Flags override the config file.
    pub fn merge(&self, mut cfg: JoblogConfig) -> JoblogConfig {
        if let Some(owner) = &self.owner {
            cfg.owner = Some(owner.clone());
        }
        if let Some(count) = self.count {
            cfg.initial_count = count;
        }
        if let Some(step) = self.step {
            cfg.step = step;
        }
        if let Some(dir) = &self.download_dir {
            cfg.download_dir = Some(dir.clone());
        }
        if self.attempts {
            cfg.attempts = true;
        }
        if let Some(program) = &self.dx_program {
            cfg.dx_program = program.clone();
        }
        cfg
    }
}

pub fn write_completions(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "joblog", out);
    out.flush()?;
    Ok(())
}
