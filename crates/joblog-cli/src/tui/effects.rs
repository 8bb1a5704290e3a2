//! Runs dashboard effects as tokio tasks; results come back over `tx`.

use std::path::PathBuf;
use std::sync::Arc;

use joblog_core::attempts;
use joblog_core::control::DownloadControl;
use joblog_core::dashboard::{Completion, Effect};
use joblog_core::download;
use joblog_core::registry::JobRegistry;
use joblog_core::source::{self, JobSource};
use tokio::sync::mpsc;

pub(crate) enum Control {
    Continue,
    Quit,
    Exit(String),
}

pub(crate) struct EffectRunner {
    pub registry: Arc<JobRegistry>,
    pub source: Arc<dyn JobSource>,
    pub control: Arc<DownloadControl>,
    pub dest_dir: PathBuf,
    pub max_attempts: u32,
    pub tx: mpsc::Sender<Completion>,
}

impl EffectRunner {
    /// Start `effect` in the background. Never blocks.
    pub fn spawn(&self, effect: Effect) -> Control {
        tracing::debug!(?effect, "effect");
        match effect {
            Effect::Refresh => {
                let registry = Arc::clone(&self.registry);
                self.deliver(async move { Completion::Refreshed(registry.refresh().await) });
            }
            Effect::Grow(step) => {
                let registry = Arc::clone(&self.registry);
                self.deliver(async move { Completion::Grown(registry.grow(step).await) });
            }
            Effect::LoadLog { job_id, attempt } => {
                let source = Arc::clone(&self.source);
                self.deliver(async move {
                    let result = source::fetch_log(source, job_id.clone(), attempt).await;
                    Completion::LogLoaded {
                        job_id,
                        attempt,
                        result,
                    }
                });
            }
            Effect::LoadAttempts { job_id } => {
                let source = Arc::clone(&self.source);
                let max_attempts = self.max_attempts;
                self.deliver(async move {
                    let result = attempts::discover(source, job_id.clone(), max_attempts).await;
                    Completion::AttemptsLoaded { job_id, result }
                });
            }
            Effect::Download {
                job_id,
                batch,
                outputs,
            } => self.download(job_id, batch, outputs),
            Effect::CancelDownload { job_id } => self.control.request_abort(&job_id),
            Effect::Quit => return Control::Quit,
            Effect::Exit(message) => return Control::Exit(message),
        }
        Control::Continue
    }

    fn deliver<F>(&self, work: F)
    where
        F: std::future::Future<Output = Completion> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let completion = work.await;
            // The receiver only goes away when the dashboard has closed.
            let _ = tx.send(completion).await;
        });
    }

    fn download(&self, job_id: String, batch: u64, outputs: Vec<String>) {
        let token = self.control.register(&job_id);
        let control = Arc::clone(&self.control);
        let source = Arc::clone(&self.source);
        let dest_dir = self.dest_dir.clone();
        let progress_tx = self.tx.clone();
        let progress_job = job_id.clone();
        tracing::info!(job_id = %job_id, batch, outputs = outputs.len(), dest = %dest_dir.display(), "download batch starting");
        self.deliver(async move {
            let result = download::spawn_batch(
                source,
                job_id.clone(),
                outputs,
                dest_dir,
                Arc::clone(&token),
                move |progress| {
                    // Progress is advisory; a full channel drops the update.
                    let _ = progress_tx.try_send(Completion::DownloadProgress {
                        job_id: progress_job.clone(),
                        batch,
                        progress,
                    });
                },
            )
            .await;
            control.unregister(&job_id, &token);
            Completion::DownloadFinished {
                job_id,
                batch,
                result,
            }
        });
    }
}
