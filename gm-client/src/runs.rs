//! Workflow run endpoints

use gm_core::domain::error::FetchError;
use gm_core::domain::run::WorkflowRun;
use gm_core::domain::target::WatchTarget;
use gm_core::dto::run::WorkflowRunsPage;
use reqwest::Url;
use tracing::debug;

use crate::GitHubClient;
use crate::error::transport_error;

impl GitHubClient {
    // =============================================================================
    // Workflow Runs
    // =============================================================================

    /// Fetch the most recent workflow runs of a repository
    ///
    /// Makes exactly one request. Runs are returned newest first and limited
    /// to the target's workflow filter when it is non-empty.
    ///
    /// # Arguments
    /// * `target` - The repository to read and its workflow filter
    ///
    /// # Returns
    /// The normalized runs, or the reason the fetch failed
    pub async fn fetch_workflow_runs(
        &self,
        target: &WatchTarget,
    ) -> Result<Vec<WorkflowRun>, FetchError> {
        let url = self.runs_url(target)?;

        debug!("GET {} (per_page={})", url, self.per_page);

        let response = self
            .get(url)
            .query(&[("per_page", self.per_page)])
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let runs = self.handle_runs_response(response).await?;

        debug!("Parsed {} workflow run(s) for {}", runs.len(), target);

        Ok(runs
            .into_iter()
            .filter(|run| target.selects(&run.name))
            .collect())
    }

    /// `{base}/repos/{owner}/{repo}/actions/runs`, with owner and repository
    /// percent-encoded as single path segments
    fn runs_url(&self, target: &WatchTarget) -> Result<Url, FetchError> {
        let mut url = self.root.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::network(format!("cannot build a path on {}", self.root)))?
            .pop_if_empty()
            .extend([
                "repos",
                target.owner.as_str(),
                target.repository.as_str(),
                "actions",
                "runs",
            ]);
        Ok(url)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and parse a page of runs
    async fn handle_runs_response(
        &self,
        response: reqwest::Response,
    ) -> Result<Vec<WorkflowRun>, FetchError> {
        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            // The status decides the error kind, even if the body is cut short
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::from_status(status.as_u16(), &body));
        }

        let body = response.text().await.map_err(|e| transport_error(&e))?;

        let page = WorkflowRunsPage::from_json(&body)
            .map_err(|e| FetchError::malformed(format!("Failed to parse workflow runs: {}", e)))?;

        page.into_runs()
            .map_err(|e| FetchError::malformed(e.to_string()))
    }
}
