//! `downloadLogs`: walks the cursor-paged log listing and fetches every file
//! through a short-lived link, one file at a time.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use lamp_api::logs::{LogArchive, LogFile, RemoteLogArchive};
use lamp_api::retry::RetryConfig;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::CommandContext;

/// Delay before each download link request.
pub const THROTTLE: Duration = Duration::from_millis(500);

/// Width of the `.json` suffix stripped from a log file name to get its date.
const EXTENSION_WIDTH: usize = 5;

#[derive(Subcommand, Debug, Clone)]
#[command(rename_all = "camelCase")]
pub enum LogsCommand {
    /// Download alert and incident log files
    DownloadLogs(DownloadLogsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DownloadLogsArgs {
    /// Marker to start listing from, e.g. 2024-03-01-00-00-00
    #[arg(long, default_value = "")]
    pub start: String,
    /// Last date to download, dash separated, e.g. 2024-03-10
    #[arg(long, value_parser = end_date)]
    pub end: Option<String>,
    /// Directory the files are written to
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
    /// Page size of the listing
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub start: String,
    pub end: Option<String>,
    pub directory: PathBuf,
    pub throttle: Duration,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadSummary {
    pub pages: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct LogDownloader<'a, A: LogArchive> {
    archive: &'a A,
    options: DownloadOptions,
}

impl<'a, A: LogArchive> LogDownloader<'a, A> {
    pub fn new(archive: &'a A, options: DownloadOptions) -> Self {
        Self { archive, options }
    }

    /// A listing failure ends the run with an error. Link and download
    /// failures are logged and counted, and the run continues.
    pub async fn run(&self) -> Result<DownloadSummary> {
        let mut summary = DownloadSummary::default();
        let mut marker = self.options.start.clone();

        loop {
            let page = self
                .archive
                .list_log_files(&marker)
                .await
                .with_context(|| format!("Failed to list log files after marker '{marker}'"))?;
            summary.pages += 1;
            debug!(marker = %marker, files = page.data.len(), next = %page.marker, "Listed log files");

            for file in &page.data {
                self.process(file, &mut summary).await;
            }

            if page.is_last() {
                break;
            }
            marker = page.marker;
        }

        Ok(summary)
    }

    async fn process(&self, file: &LogFile, summary: &mut DownloadSummary) {
        tokio::time::sleep(self.options.throttle).await;

        let link = match self.archive.download_link(&file.filename).await {
            Ok(link) => link,
            Err(err) => {
                warn!(file = %file.filename, error = %err, "Could not get download link");
                summary.failed += 1;
                return;
            }
        };

        if let Some(end) = self.options.end.as_deref() {
            let date = date_fragment(&file.filename);
            if !check_date(end, date) {
                debug!(file = %file.filename, end, "Skipping file after end date");
                summary.skipped += 1;
                return;
            }
        }

        let Some(destination) = destination(&self.options.directory, &file.filename) else {
            warn!(file = %file.filename, "Log file name has no file component");
            summary.failed += 1;
            return;
        };

        match self.archive.download(&link, &destination).await {
            Ok(bytes) => {
                info!(file = %destination.display(), bytes, "Downloaded log file");
                summary.downloaded += 1;
            }
            Err(err) => {
                warn!(file = %file.filename, error = %err, "Could not download log file");
                summary.failed += 1;
            }
        }
    }
}

fn destination(directory: &Path, filename: &str) -> Option<PathBuf> {
    Path::new(filename)
        .file_name()
        .map(|name| directory.join(name))
}

/// The file name without its last five characters.
pub fn date_fragment(filename: &str) -> &str {
    let cut = filename
        .char_indices()
        .rev()
        .nth(EXTENSION_WIDTH - 1)
        .map_or(0, |(index, _)| index);
    &filename[..cut]
}

/// Compares dash separated numeric components left to right. The first
/// component that differs decides: `true` when the boundary is larger,
/// `false` when the candidate is. Equal dates are accepted.
///
/// Only meaningful when both dates have the same components in the same
/// order. Components that are not numbers count as 0.
pub fn check_date(boundary: &str, candidate: &str) -> bool {
    for (bound, value) in boundary.split('-').zip(candidate.split('-')) {
        let (bound, value) = (component(bound), component(value));
        if bound > value {
            return true;
        }
        if value > bound {
            return false;
        }
    }
    true
}

fn component(value: &str) -> u64 {
    value.trim().parse().unwrap_or(0)
}

/// clap value parser for `--end`.
fn end_date(value: &str) -> std::result::Result<String, String> {
    let valid = !value.is_empty()
        && value
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if valid {
        Ok(value.to_string())
    } else {
        Err(format!(
            "'{value}' is not a dash separated date such as 2024-03-10"
        ))
    }
}

pub async fn execute(command: LogsCommand, ctx: &CommandContext<'_>) -> Result<()> {
    match command {
        LogsCommand::DownloadLogs(args) => download_logs(ctx, args).await,
    }
}

async fn download_logs(ctx: &CommandContext<'_>, args: DownloadLogsArgs) -> Result<()> {
    tokio::fs::create_dir_all(&args.path)
        .await
        .with_context(|| format!("Failed to create {}", args.path.display()))?;

    let client = ctx.client.clone().with_retry_config(RetryConfig::disabled());
    let archive = RemoteLogArchive::new(&client, args.limit);
    let options = DownloadOptions {
        start: args.start,
        end: args.end,
        directory: args.path,
        throttle: THROTTLE,
    };

    let summary = LogDownloader::new(&archive, options).run().await?;
    info!(
        pages = summary.pages,
        downloaded = summary.downloaded,
        failed = summary.failed,
        "Log download finished"
    );
    ctx.renderer.render(&summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lamp_api::error::{ApiError, Result as ApiResult};
    use lamp_api::logs::LogFilePage;
    use std::sync::Mutex;
    use tempfile::tempdir;
    use tokio::time::Instant;

    struct FakeArchive {
        pages: Vec<(Vec<&'static str>, &'static str)>,
        fail_listing_at: Option<usize>,
        broken_links: Vec<&'static str>,
        broken_downloads: Vec<&'static str>,
        markers: Mutex<Vec<String>>,
        link_requests: Mutex<Vec<String>>,
        link_times: Mutex<Vec<Instant>>,
    }

    impl FakeArchive {
        fn new(pages: Vec<(Vec<&'static str>, &'static str)>) -> Self {
            Self {
                pages,
                fail_listing_at: None,
                broken_links: Vec::new(),
                broken_downloads: Vec::new(),
                markers: Mutex::new(Vec::new()),
                link_requests: Mutex::new(Vec::new()),
                link_times: Mutex::new(Vec::new()),
            }
        }

        fn markers(&self) -> Vec<String> {
            self.markers.lock().unwrap().clone()
        }

        fn link_requests(&self) -> Vec<String> {
            self.link_requests.lock().unwrap().clone()
        }

        fn link_times(&self) -> Vec<Instant> {
            self.link_times.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LogArchive for FakeArchive {
        async fn list_log_files(&self, marker: &str) -> ApiResult<LogFilePage> {
            let call = {
                let mut markers = self.markers.lock().unwrap();
                markers.push(marker.to_string());
                markers.len() - 1
            };
            if self.fail_listing_at == Some(call) {
                return Err(ApiError::ServerError {
                    status: 500,
                    message: "listing unavailable".to_string(),
                });
            }
            let (files, next) = self.pages[call].clone();
            Ok(LogFilePage {
                data: files
                    .into_iter()
                    .map(|name| LogFile {
                        filename: name.to_string(),
                        date: None,
                        size: None,
                    })
                    .collect(),
                marker: next.to_string(),
                took: 0.0,
                request_id: String::new(),
            })
        }

        async fn download_link(&self, filename: &str) -> ApiResult<String> {
            self.link_requests.lock().unwrap().push(filename.to_string());
            self.link_times.lock().unwrap().push(Instant::now());
            if self.broken_links.iter().any(|name| *name == filename) {
                return Err(ApiError::NotFound {
                    resource: filename.to_string(),
                });
            }
            Ok(format!("https://logs.example.com/{filename}"))
        }

        async fn download(&self, url: &str, destination: &Path) -> ApiResult<u64> {
            if self.broken_downloads.iter().any(|name| url.ends_with(name)) {
                return Err(ApiError::InvalidResponse("connection reset".to_string()));
            }
            std::fs::write(destination, url)?;
            Ok(url.len() as u64)
        }
    }

    fn options(directory: &Path) -> DownloadOptions {
        DownloadOptions {
            start: String::new(),
            end: None,
            directory: directory.to_path_buf(),
            throttle: Duration::ZERO,
        }
    }

    #[test]
    fn check_date_accepts_earlier_and_equal_dates() {
        assert!(check_date("2024-03-10", "2024-03-09"));
        assert!(!check_date("2024-03-10", "2024-03-11"));
        assert!(check_date("2024-03-10", "2024-03-10"));
    }

    #[test]
    fn check_date_first_difference_decides() {
        // Year decides even though the day is larger.
        assert!(check_date("2024-03-10", "2023-12-31"));
        assert!(!check_date("2024-03-10", "2025-01-01"));
        // Numeric, not lexical.
        assert!(check_date("2024-10-01", "2024-9-30"));
    }

    #[test]
    fn check_date_ignores_extra_candidate_components() {
        assert!(check_date("2024-03-10", "2024-03-10-23-59-59"));
        assert!(!check_date("2024-03-10", "2024-03-11-00-00-00"));
    }

    #[test]
    fn date_fragment_strips_extension() {
        assert_eq!(date_fragment("2024-03-09-10-00-00.json"), "2024-03-09-10-00-00");
        assert_eq!(date_fragment(".json"), "");
        assert_eq!(date_fragment("abc"), "");
    }

    #[test]
    fn end_date_must_be_dash_separated_numbers() {
        assert!(end_date("2024-03-10").is_ok());
        assert!(end_date("2024").is_ok());
        assert!(end_date("2024-03-xx").is_err());
        assert!(end_date("2024--10").is_err());
        assert!(end_date("").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn waits_before_every_link_request() {
        assert_eq!(THROTTLE, Duration::from_millis(500));

        let dir = tempdir().unwrap();
        let archive = FakeArchive::new(vec![(
            vec![
                "2024-03-01-00-00-00.json",
                "2024-03-01-01-00-00.json",
                "2024-03-01-02-00-00.json",
            ],
            "",
        )]);
        let options = DownloadOptions {
            throttle: THROTTLE,
            ..options(dir.path())
        };

        let started = Instant::now();
        let summary = LogDownloader::new(&archive, options).run().await.unwrap();

        assert_eq!(summary.downloaded, 3);
        assert!(started.elapsed() >= THROTTLE * 3);
        let times = archive.link_times();
        assert_eq!(times.len(), 3);
        for (index, requested_at) in times.iter().enumerate() {
            let waited = requested_at.duration_since(started);
            assert!(
                waited >= THROTTLE * (index as u32 + 1),
                "link request {index} came after {waited:?}"
            );
        }
    }

    #[tokio::test]
    async fn stops_after_page_with_empty_marker() {
        let dir = tempdir().unwrap();
        let archive = FakeArchive::new(vec![
            (vec!["2024-03-01-00-00-00.json"], "A"),
            (vec!["2024-03-02-00-00-00.json"], "B"),
            (vec!["2024-03-03-00-00-00.json"], ""),
        ]);

        let summary = LogDownloader::new(&archive, options(dir.path()))
            .run()
            .await
            .unwrap();

        assert_eq!(archive.markers(), vec!["", "A", "B"]);
        assert_eq!(summary.pages, 3);
        assert_eq!(summary.downloaded, 3);
        assert!(dir.path().join("2024-03-03-00-00-00.json").exists());
    }

    #[tokio::test]
    async fn starts_from_given_marker() {
        let dir = tempdir().unwrap();
        let archive = FakeArchive::new(vec![(vec![], "")]);
        let mut opts = options(dir.path());
        opts.start = "2024-03-05-00-00-00".to_string();

        LogDownloader::new(&archive, opts).run().await.unwrap();

        assert_eq!(archive.markers(), vec!["2024-03-05-00-00-00"]);
    }

    #[tokio::test]
    async fn link_failure_does_not_stop_next_file() {
        let dir = tempdir().unwrap();
        let mut archive = FakeArchive::new(vec![(
            vec!["2024-03-01-00-00-00.json", "2024-03-01-01-00-00.json"],
            "",
        )]);
        archive.broken_links = vec!["2024-03-01-00-00-00.json"];

        let summary = LogDownloader::new(&archive, options(dir.path()))
            .run()
            .await
            .unwrap();

        assert_eq!(archive.link_requests().len(), 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.downloaded, 1);
        assert!(!dir.path().join("2024-03-01-00-00-00.json").exists());
        assert!(dir.path().join("2024-03-01-01-00-00.json").exists());
    }

    #[tokio::test]
    async fn download_failure_does_not_stop_next_file() {
        let dir = tempdir().unwrap();
        let mut archive = FakeArchive::new(vec![(
            vec!["2024-03-01-00-00-00.json", "2024-03-01-01-00-00.json"],
            "",
        )]);
        archive.broken_downloads = vec!["2024-03-01-00-00-00.json"];

        let summary = LogDownloader::new(&archive, options(dir.path()))
            .run()
            .await
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.downloaded, 1);
    }

    #[tokio::test]
    async fn listing_failure_halts_everything() {
        let dir = tempdir().unwrap();
        let mut archive = FakeArchive::new(vec![
            (vec!["2024-03-01-00-00-00.json"], "A"),
            (vec!["2024-03-02-00-00-00.json"], "B"),
            (vec!["2024-03-03-00-00-00.json"], ""),
        ]);
        archive.fail_listing_at = Some(1);

        let result = LogDownloader::new(&archive, options(dir.path())).run().await;

        assert!(result.is_err());
        assert_eq!(archive.markers(), vec!["", "A"]);
        assert_eq!(archive.link_requests(), vec!["2024-03-01-00-00-00.json"]);
    }

    #[tokio::test]
    async fn files_after_end_date_are_skipped() {
        let dir = tempdir().unwrap();
        let archive = FakeArchive::new(vec![(
            vec![
                "2024-03-09-23-00-00.json",
                "2024-03-10-12-00-00.json",
                "2024-03-11-00-00-00.json",
            ],
            "",
        )]);
        let mut opts = options(dir.path());
        opts.end = Some("2024-03-10".to_string());

        let summary = LogDownloader::new(&archive, opts).run().await.unwrap();

        assert_eq!(summary.downloaded, 2);
        assert_eq!(summary.skipped, 1);
        assert!(!dir.path().join("2024-03-11-00-00-00.json").exists());
    }

    #[tokio::test]
    async fn remote_names_cannot_escape_directory() {
        let dir = tempdir().unwrap();
        let archive = FakeArchive::new(vec![(vec!["../2024-03-01-00-00-00.json"], "")]);

        let summary = LogDownloader::new(&archive, options(dir.path()))
            .run()
            .await
            .unwrap();

        assert_eq!(summary.downloaded, 1);
        assert!(dir.path().join("2024-03-01-00-00-00.json").exists());
    }
}
