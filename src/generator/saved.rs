//! Saved collection listing.

use super::ImageGenerator;
use crate::error::{Error, Result};
use crate::transport::Request;
use crate::types::{DownloadReport, GenerationResult};
use crate::wire::GenerationList;
use std::path::Path;

impl ImageGenerator {
    /// Fetch one page of the saved collection
    ///
    /// `page` and `limit` are passed through as query parameters. The request is
    /// authenticated and not retried.
    pub async fn fetch_saved(&self, page: u32, limit: u32) -> Result<GenerationResult> {
        let url = self.config.api.collection_url(page, limit)?;
        tracing::info!(page, limit, "fetching saved collection");

        let response = self
            .transport
            .send(Request::get(&url))
            .await?
            .error_for_status(&url)?;
        let list: GenerationList = response.json(&url)?;
        let result = list.into_result();

        if let Some(problem) = result.id_problem() {
            return Err(Error::Transport {
                url,
                status: Some(response.status),
                body: response.text(),
                message: format!("malformed collection page: {problem}"),
            });
        }

        tracing::debug!(page, assets = result.len(), "saved collection page fetched");
        Ok(result)
    }

    /// Fetch one page of the saved collection and download it into `dir`
    pub async fn list_saved(
        &self,
        page: u32,
        limit: u32,
        dir: &Path,
        name_prefix: Option<&str>,
    ) -> Result<DownloadReport> {
        let result = self.fetch_saved(page, limit).await?;
        self.materializer.download(&result, dir, name_prefix).await
    }
}
