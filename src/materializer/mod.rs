//! Asset download and JPEG normalization.
//!
//! A call runs in two phases:
//! 1. **Transfer** - every asset is fetched to `<dir>/<stem>.<source_ext>`. Transfers
//!    run concurrently (bounded) and all of them land before phase 2 starts.
//! 2. **Convert** - every raw file is re-encoded as `<dir>/<stem>.jpg` on the blocking
//!    pool. A conversion failure is recorded and the raw file kept; the other files
//!    still convert.


use crate::config::{DownloadConfig, RetryConfig};
use crate::error::{Error, Result};
use crate::retry::with_retry;
use crate::transport::{Request, Transport};
use crate::types::{DownloadReport, DownloadedFile, Event, FailedConversion, GenerationResult};
use crate::utils::{asset_stem, is_plain_stem, resolve_destination};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Extension of converted files
pub const DEST_EXTENSION: &str = "jpg";

/// Where one asset goes on disk
#[derive(Debug, Clone)]
struct PlannedFile {
    asset_id: String,
    url: String,
    stem: String,
    raw_path: PathBuf,
    final_path: PathBuf,
}

/// Downloads generated assets and converts them to JPEG
#[derive(Clone)]
pub struct Materializer {
    transport: Arc<dyn Transport>,
    config: DownloadConfig,
    retry: RetryConfig,
    event_tx: broadcast::Sender<Event>,
}

impl Materializer {
    /// Create a materializer
    pub fn new(
        transport: Arc<dyn Transport>,
        config: DownloadConfig,
        retry: RetryConfig,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            transport,
            config,
            retry,
            event_tx,
        }
    }

    /// Download every asset of `result` into `dest_dir` and convert it to JPEG
    ///
    /// `dest_dir` may be relative or start with `~`. If it does not exist it is
    /// created, but its parent must exist. Files are named `<prefix><n>.jpg`
    /// (1-based, input order) when `name_prefix` is given, otherwise `<asset id>.jpg`.
    /// Existing files with the same names are overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Filesystem`] if the directory cannot be created or a raw file
    /// cannot be written, and a transport error if an asset transfer still fails
    /// after retries. Conversion failures do not fail the call; they are listed in
    /// [`DownloadReport::failed`].
    pub async fn download(
        &self,
        result: &GenerationResult,
        dest_dir: &Path,
        name_prefix: Option<&str>,
    ) -> Result<DownloadReport> {
        let directory = resolve_destination(dest_dir)?;
        let planned = self.plan(result, &directory, name_prefix)?;
        ensure_directory(&directory).await?;

        tracing::info!(path = %directory.display(), assets = result.len(), "downloading assets");

        let limit = self.config.max_concurrent_downloads.max(1);

        let fetches: Vec<_> = planned.iter().map(|p| self.fetch(p)).collect();
        let transfers: Vec<Result<()>> = futures::stream::iter(fetches)
            .buffered(limit)
            .collect()
            .await;
        for transfer in transfers {
            transfer?;
        }

        tracing::info!(path = %directory.display(), "converting images to jpeg");

        let converts: Vec<_> = planned
            .iter()
            .map(|p| convert(p.raw_path.clone(), p.final_path.clone()))
            .collect();
        let conversions: Vec<Result<()>> = futures::stream::iter(converts)
            .buffered(limit)
            .collect()
            .await;

        let mut report = DownloadReport {
            directory,
            ..Default::default()
        };
        for (file, outcome) in planned.into_iter().zip(conversions) {
            match outcome {
                Ok(()) => {
                    if file.raw_path != file.final_path
                        && let Err(e) = tokio::fs::remove_file(&file.raw_path).await
                    {
                        tracing::warn!(path = %file.raw_path.display(), error = %e, "could not remove raw file");
                    }
                    self.event_tx
                        .send(Event::AssetConverted {
                            asset_id: file.asset_id.clone(),
                            path: file.final_path.clone(),
                        })
                        .ok();
                    report.files.push(DownloadedFile {
                        asset_id: file.asset_id,
                        local_path: file.final_path,
                        source_format: self.config.source_extension.clone(),
                        dest_format: DEST_EXTENSION.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(stem = %file.stem, error = %e, "conversion failed, raw file kept");
                    self.event_tx
                        .send(Event::ConversionFailed {
                            asset_id: file.asset_id.clone(),
                            error: e.to_string(),
                        })
                        .ok();
                    report.failed.push(FailedConversion {
                        asset_id: file.asset_id,
                        stem: file.stem,
                        raw_path: file.raw_path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            converted = report.files.len(),
            failed = report.failed.len(),
            "download finished"
        );
        Ok(report)
    }

    /// Lay out every file inside `directory`
    ///
    /// Fails before anything touches the disk if a stem would not name a plain file
    /// directly inside `directory`.
    fn plan(
        &self,
        result: &GenerationResult,
        directory: &Path,
        name_prefix: Option<&str>,
    ) -> Result<Vec<PlannedFile>> {
        result
            .assets
            .iter()
            .enumerate()
            .map(|(index, asset)| {
                let stem = asset_stem(asset, index, name_prefix);
                if !is_plain_stem(&stem) {
                    return Err(Error::filesystem(
                        directory.join(&stem),
                        std::io::Error::new(
                            std::io::ErrorKind::InvalidInput,
                            format!("asset {:?} does not name a plain file", asset.id),
                        ),
                    ));
                }
                Ok(PlannedFile {
                    asset_id: asset.id.clone(),
                    url: asset.image_url.clone(),
                    raw_path: directory
                        .join(format!("{}.{}", stem, self.config.source_extension)),
                    final_path: directory.join(format!("{stem}.{DEST_EXTENSION}")),
                    stem,
                })
            })
            .collect()
    }

    /// Transfer one asset to its raw path
    async fn fetch(&self, file: &PlannedFile) -> Result<()> {
        let response = with_retry(&self.retry, || async move {
            self.transport
                .send(Request::get(&file.url).unauthenticated())
                .await?
                .error_for_status(&file.url)
        })
        .await?;

        tokio::fs::write(&file.raw_path, &response.body)
            .await
            .map_err(|e| Error::filesystem(&file.raw_path, e))?;

        tracing::info!(stem = %file.stem, bytes = response.body.len(), "✓ downloaded");
        self.event_tx
            .send(Event::AssetDownloaded {
                asset_id: file.asset_id.clone(),
                path: file.raw_path.clone(),
            })
            .ok();
        Ok(())
    }
}

/// Create `dir` if missing (never its parents) and check it is a directory
async fn ensure_directory(dir: &Path) -> Result<()> {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::filesystem(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tokio::fs::create_dir(dir)
                .await
                .map_err(|e| Error::filesystem(dir, e))?;
            tracing::debug!(path = %dir.display(), "created destination directory");
            Ok(())
        }
        Err(e) => Err(Error::filesystem(dir, e)),
    }
}

/// Convert one raw file on the blocking pool
async fn convert(raw: PathBuf, dest: PathBuf) -> Result<()> {
    let path = raw.clone();
    tokio::task::spawn_blocking(move || convert_to_jpeg(&raw, &dest))
        .await
        .map_err(|e| Error::Conversion {
            path,
            reason: format!("conversion task aborted: {e}"),
        })?
}

/// Decode `raw` (format sniffed from its content) and write it as an RGB JPEG
pub fn convert_to_jpeg(raw: &Path, dest: &Path) -> Result<()> {
    let conversion_error = |reason: String| Error::Conversion {
        path: raw.to_path_buf(),
        reason,
    };

    let image = image::ImageReader::open(raw)
        .map_err(|e| conversion_error(format!("cannot open: {e}")))?
        .with_guessed_format()
        .map_err(|e| conversion_error(format!("cannot read: {e}")))?
        .decode()
        .map_err(|e| conversion_error(format!("cannot decode: {e}")))?;

    image
        .to_rgb8()
        .save_with_format(dest, image::ImageFormat::Jpeg)
        .map_err(|e| conversion_error(format!("cannot encode jpeg: {e}")))
}
