#![allow(dead_code)]

pub mod scripted_source;

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use joblog_core::attempts;
use joblog_core::dashboard::{Completion, Effect};
use joblog_core::download;
use joblog_core::registry::JobRegistry;
use joblog_core::source::{self, JobSource};

/// Run one effect to completion the way the binary does, collecting any
/// download progress reports along the way.
pub async fn run_effect(
    registry: &Arc<JobRegistry>,
    source: Arc<dyn JobSource>,
    effect: Effect,
    dest_dir: PathBuf,
) -> Vec<Completion> {
    match effect {
        Effect::Refresh => vec![Completion::Refreshed(registry.refresh().await)],
        Effect::Grow(step) => vec![Completion::Grown(registry.grow(step).await)],
        Effect::LoadLog { job_id, attempt } => {
            let result = source::fetch_log(source, job_id.clone(), attempt).await;
            vec![Completion::LogLoaded {
                job_id,
                attempt,
                result,
            }]
        }
        Effect::LoadAttempts { job_id } => {
            let result = attempts::discover(source, job_id.clone(), 16).await;
            vec![Completion::AttemptsLoaded { job_id, result }]
        }
        Effect::Download {
            job_id,
            batch,
            outputs,
        } => {
            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
            let progress_job = job_id.clone();
            let result = download::spawn_batch(
                source,
                job_id.clone(),
                outputs,
                dest_dir,
                Arc::new(AtomicBool::new(false)),
                move |progress| {
                    let _ = tx.send(Completion::DownloadProgress {
                        job_id: progress_job.clone(),
                        batch,
                        progress,
                    });
                },
            )
            .await;
            let mut completions = Vec::new();
            while let Some(c) = rx.recv().await {
                completions.push(c);
            }
            completions.push(Completion::DownloadFinished {
                job_id,
                batch,
                result,
            });
            completions
        }
        Effect::CancelDownload { .. } | Effect::Quit | Effect::Exit(_) => Vec::new(),
    }
}
