//! Bounded concurrent downloads.

use futures_util::{StreamExt, stream};
use tokio_util::sync::CancellationToken;

use crate::data::{BatchOptions, DownloadJob, FetchOptions, JobOutcome};
use crate::effects::fetcher::Fetcher;
use crate::effects::http::HttpClient;
use crate::error::Error;

impl<C: HttpClient> Fetcher<C> {
    /// Download every job with at most `batch.max_concurrent` in flight.
    ///
    /// `on_outcome(outcome, completed, total)` runs once per finished job,
    /// always from this future and never concurrently, so observers see a
    /// strictly ordered completion count. A failed job does not cancel its
    /// siblings. Once `cancel` fires, jobs that have not started yet finish
    /// immediately with [`Error::Cancelled`]; jobs already streaming run to
    /// completion.
    pub async fn fetch_all<F>(
        &self,
        jobs: Vec<DownloadJob>,
        batch: &BatchOptions,
        base: &FetchOptions,
        cancel: &CancellationToken,
        mut on_outcome: F,
    ) -> Vec<JobOutcome>
    where
        F: FnMut(&JobOutcome, usize, usize),
    {
        let total = jobs.len();
        let mut outcomes = Vec::with_capacity(total);

        let mut in_flight = stream::iter(jobs)
            .map(|job| self.run_job(job, base, cancel))
            .buffer_unordered(batch.max_concurrent.max(1));

        while let Some(outcome) = in_flight.next().await {
            if let Err(e) = &outcome.result {
                tracing::debug!(id = %outcome.id, error = %e, "batch job failed");
            }
            on_outcome(&outcome, outcomes.len() + 1, total);
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn run_job(&self, job: DownloadJob, base: &FetchOptions, cancel: &CancellationToken) -> JobOutcome {
        if cancel.is_cancelled() {
            return JobOutcome {
                id: job.id,
                destination: job.destination,
                result: Err(Error::Cancelled),
            };
        }

        let options = base.clone().sha1(job.sha1.clone()).expected_size(job.size);
        let result = self.fetch(&job.url, &job.destination, &options).await;

        JobOutcome {
            id: job.id,
            destination: job.destination,
            result,
        }
    }
}
