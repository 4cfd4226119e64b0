use std::{future::Future, pin::pin};

use futures::{StreamExt, stream};
use tracing::{debug, info};

use crate::{error::BriefError, types::VideoTask};

#[derive(Debug, Clone)]
pub struct FailedTask {
    pub video: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<FailedTask>,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run `work` over every task, at most `jobs` at a time, and tally the outcomes.
///
/// `on_done` sees each outcome in input order. A failed task is recorded and
/// the batch moves on.
pub async fn run_batch<'a, T, F, Fut>(
    tasks: &'a [VideoTask],
    jobs: usize,
    work: F,
    mut on_done: impl FnMut(usize, &VideoTask, &Result<T, BriefError>),
) -> BatchSummary
where
    F: Fn(&'a VideoTask) -> Fut,
    Fut: Future<Output = Result<T, BriefError>> + 'a,
{
    let mut summary = BatchSummary {
        total: tasks.len(),
        ..Default::default()
    };

    let mut outcomes = pin!(
        stream::iter(tasks.iter().map(|task| {
            let fut = work(task);
            async move { (task, fut.await) }
        }))
        .buffered(jobs.max(1))
    );

    let mut index = 0;
    while let Some((task, result)) = outcomes.next().await {
        on_done(index, task, &result);
        index += 1;

        match result {
            Ok(_) => summary.succeeded += 1,
            Err(e) => {
                debug!(video = %task.file_name(), "failed: {}", e);
                summary.failures.push(FailedTask {
                    video: task.file_name(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failures.len(),
        "batch finished"
    );
    summary
}
