//! Download orchestration
//!
//! Runs one fetch task per URL with at most `concurrency` fetches in flight.
//! Tasks never touch shared collections: each sends exactly one message to
//! the collecting loop in [`Downloader::download_all`], which owns the
//! success and failure lists, writes individual files, and reports progress.

use crate::harvest::fetcher::Fetcher;
use crate::harvest::links::LinkSet;
use crate::harvest::progress::ProgressObserver;
use crate::output::write_document;
use futures::FutureExt;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// A successfully downloaded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRecord {
    pub url: String,
    pub content: Option<String>,
}

/// Result of downloading a whole link set
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// Downloaded documents, in completion order
    pub succeeded: Vec<DownloadRecord>,

    /// URLs that could not be downloaded, in completion order; URLs left
    /// unresolved by cancellation follow at the end
    pub failed: Vec<String>,

    /// Documents downloaded but not saved individually: (url, error)
    pub write_errors: Vec<(String, String)>,

    /// True if the run was interrupted before every URL finished
    pub cancelled: bool,
}

impl DownloadReport {
    /// Number of URLs with a terminal outcome
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Message sent by a fetch task to the collector
#[derive(Debug)]
struct TaskMessage {
    url: String,
    /// `Err` carries the panic message of a task that blew up
    result: Result<Option<String>, String>,
}

/// Where the downloader gets document bodies from
///
/// Each task owns its own clone of the source.
pub trait DocumentSource: Clone + Send + Sync + 'static {
    /// Returns the body at `url`, or `None` if it could not be fetched
    fn fetch_document(&self, url: &str) -> impl Future<Output = Option<String>> + Send;
}

impl DocumentSource for Fetcher {
    fn fetch_document(&self, url: &str) -> impl Future<Output = Option<String>> + Send {
        self.fetch(url)
    }
}

/// Bounded-concurrency downloader
pub struct Downloader<S = Fetcher> {
    source: S,
    concurrency: usize,
    output_dir: PathBuf,
}

impl<S: DocumentSource> Downloader<S> {
    /// Creates a downloader running at most `concurrency` fetches at once
    ///
    /// A concurrency of zero is treated as one.
    pub fn new(source: S, concurrency: usize, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
            output_dir: output_dir.into(),
        }
    }


    /// Downloads every URL in `urls`
    ///
    /// Every URL ends up in exactly one of `succeeded` or `failed`. Each
    /// successful body is also written to `<output_dir>/<file name>`; a
    /// failed write is logged and listed in `write_errors` but the document
    /// still counts as downloaded.
    ///
    /// Cancelling `cancel` stops the run: queued and in-flight fetches are
    /// aborted and their URLs are reported as failed. Files already written
    /// stay on disk.
    ///
    /// # Errors
    ///
    /// Returns an error only if the output directory cannot be created.
    pub async fn download_all(
        &self,
        urls: &LinkSet,
        progress: &mut dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> std::io::Result<DownloadReport> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let total = urls.len();
        tracing::info!(
            "Downloading {} markdown files using {} workers",
            total,
            self.concurrency
        );
        progress.start(total);

        let (tx, mut rx) = mpsc::channel::<TaskMessage>(self.concurrency);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for url in urls {
            tasks.spawn(run_task(
                url.clone(),
                self.source.clone(),
                semaphore.clone(),
                tx.clone(),
            ));
        }
        // Only the tasks hold senders now; the channel closes when all finish
        drop(tx);

        let mut report = DownloadReport::default();
        let mut unresolved: HashSet<&str> = urls.iter().map(String::as_str).collect();
        let mut written: HashMap<String, String> = HashMap::new();
        let mut completed = 0;

        loop {
            let message = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::warn!("Download interrupted, abandoning {} pending URLs", unresolved.len());
                    report.cancelled = true;
                    break;
                }
                message = rx.recv() => match message {
                    Some(message) => message,
                    None => break,
                },
            };

            unresolved.remove(message.url.as_str());
            self.collect(message, &mut report, &mut written).await;

            completed += 1;
            progress.tick(completed, total);
        }

        tasks.abort_all();

        if report.cancelled {
            report.failed.extend(
                urls.iter()
                    .filter(|url| unresolved.contains(url.as_str()))
                    .cloned(),
            );
        }

        progress.finish();

        tracing::info!(
            "Successfully downloaded {} out of {} files",
            report.succeeded.len(),
            total
        );
        if !report.failed.is_empty() {
            tracing::warn!("Failed to download {} files", report.failed.len());
        }

        Ok(report)
    }

    /// Records one task outcome and persists successful bodies
    async fn collect(
        &self,
        message: TaskMessage,
        report: &mut DownloadReport,
        written: &mut HashMap<String, String>,
    ) {
        let TaskMessage { url, result } = message;

        let content = match result {
            Ok(Some(content)) => content,
            Ok(None) => {
                tracing::error!(url = %url, "Failed to download: {}", url);
                report.failed.push(url);
                return;
            }
            Err(panic) => {
                tracing::error!(url = %url, "An error occurred with {}: {}", url, panic);
                report.failed.push(url);
                return;
            }
        };

        match write_document(&self.output_dir, &url, &content).await {
            Ok(path) => {
                let file_name = path.to_string_lossy().into_owned();
                if let Some(previous) = written.insert(file_name.clone(), url.clone()) {
                    if previous != url {
                        tracing::warn!(
                            "{} overwrote {} (downloaded from {})",
                            url,
                            file_name,
                            previous
                        );
                    }
                }
            }
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Failed to save individual file for {}", url);
                report.write_errors.push((url.clone(), e.to_string()));
            }
        }

        report.succeeded.push(DownloadRecord {
            url,
            content: Some(content),
        });
    }
}

/// Fetches one URL once a concurrency permit is available
///
/// Always sends exactly one message, even if the fetch panics.
async fn run_task<S: DocumentSource>(
    url: String,
    source: S,
    semaphore: Arc<Semaphore>,
    tx: mpsc::Sender<TaskMessage>,
) {
    let result = match semaphore.acquire_owned().await {
        Ok(_permit) => AssertUnwindSafe(source.fetch_document(&url))
            .catch_unwind()
            .await
            .map_err(|panic| panic_message(panic.as_ref())),
        Err(_) => Err("download pool closed".to_string()),
    };

    // The collector is gone only after cancellation; nothing left to report to
    let _ = tx.send(TaskMessage { url, result }).await;
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::fetcher::{build_http_client, RetryPolicy};
    use crate::harvest::progress::SilentProgress;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher() -> Fetcher {
        let policy = RetryPolicy {
            max_retries: 1,
            timeout: Duration::from_secs(5),
            backoff_base: 2.0,
            backoff_unit: Duration::from_millis(5),
            jitter: false,
        };
        Fetcher::new(build_http_client("TestHarvester/1.0").unwrap(), policy)
    }

    /// Serves `# <url>` for every URL, panicking on URLs with `panic_suffix`
    #[derive(Clone, Default)]
    struct StaticSource {
        panic_suffix: Option<&'static str>,
    }

    impl DocumentSource for StaticSource {
        fn fetch_document(&self, url: &str) -> impl Future<Output = Option<String>> + Send {
            let explode = self.panic_suffix.is_some_and(|suffix| url.ends_with(suffix));
            let body = format!("# {}", url);
            async move {
                if explode {
                    panic!("fetch blew up");
                }
                Some(body)
            }
        }
    }

    /// Records every tick so tests can check the reported counts
    #[derive(Default)]
    struct RecordingProgress {
        total: Option<usize>,
        ticks: Vec<usize>,
        finished: bool,
    }

    impl ProgressObserver for RecordingProgress {
        fn start(&mut self, total: usize) {
            self.total = Some(total);
        }

        fn tick(&mut self, completed: usize, _total: usize) {
            self.ticks.push(completed);
        }

        fn finish(&mut self) {
            self.finished = true;
        }
    }

    #[tokio::test]
    async fn test_zero_concurrency_becomes_one() {
        let urls: LinkSet = ["a", "b"]
            .iter()
            .map(|name| format!("https://docs.example.org/{}.md", name))
            .collect();
        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(StaticSource::default(), 0, dir.path());

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            downloader.download_all(&urls, &mut SilentProgress, &CancellationToken::new()),
        )
        .await
        .expect("download stalled with zero concurrency")
        .unwrap();

        assert_eq!(report.succeeded.len(), 2);
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_fetch_is_recorded_as_failure() {
        let urls: LinkSet = ["a", "b", "c"]
            .iter()
            .map(|name| format!("https://docs.example.org/{}.md", name))
            .collect();
        let dir = tempfile::tempdir().unwrap();
        let source = StaticSource {
            panic_suffix: Some("/b.md"),
        };
        let downloader = Downloader::new(source, 2, dir.path());
        let mut progress = RecordingProgress::default();

        let report = downloader
            .download_all(&urls, &mut progress, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.failed, vec!["https://docs.example.org/b.md".to_string()]);
        let mut succeeded: Vec<&str> = report.succeeded.iter().map(|r| r.url.as_str()).collect();
        succeeded.sort();
        assert_eq!(
            succeeded,
            vec!["https://docs.example.org/a.md", "https://docs.example.org/c.md"]
        );
        assert_eq!(progress.ticks, vec![1, 2, 3]);
        assert!(progress.finished);

        assert!(dir.path().join("a.md").exists());
        assert!(dir.path().join("c.md").exists());
        assert!(!dir.path().join("b.md").exists());
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(boxed.as_ref()), "task panicked");
    }

    #[tokio::test]
    async fn test_every_url_has_exactly_one_outcome() {
        let server = MockServer::start().await;
        for name in ["a", "b", "c"] {
            Mock::given(method("GET"))
                .and(path(format!("/{}.md", name)))
                .respond_with(ResponseTemplate::new(200).set_body_string(format!("# {}", name)))
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/gone.md"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken.md"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let urls: LinkSet = ["a", "b", "c", "gone", "broken"]
            .iter()
            .map(|name| format!("{}/{}.md", server.uri(), name))
            .collect();

        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(test_fetcher(), 2, dir.path().join("files"));
        let mut progress = RecordingProgress::default();

        let report = downloader
            .download_all(&urls, &mut progress, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.succeeded.len(), 3);
        assert_eq!(report.failed.len(), 2);
        assert!(!report.cancelled);
        assert!(report.write_errors.is_empty());

        let mut seen: Vec<String> = report
            .succeeded
            .iter()
            .map(|r| r.url.clone())
            .chain(report.failed.iter().cloned())
            .collect();
        seen.sort();
        let expected: Vec<String> = urls.iter().cloned().collect();
        assert_eq!(seen, expected);

        assert_eq!(progress.total, Some(5));
        assert_eq!(progress.ticks, vec![1, 2, 3, 4, 5]);
        assert!(progress.finished);
    }

    #[tokio::test]
    async fn test_successful_bodies_written_to_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/guides/setup-node.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Run the node."))
            .mount(&server)
            .await;

        let urls: LinkSet = [format!("{}/guides/setup-node.md", server.uri())]
            .into_iter()
            .collect();

        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("markdown_files");
        let downloader = Downloader::new(test_fetcher(), 5, &output_dir);

        let report = downloader
            .download_all(&urls, &mut SilentProgress, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(
            report.succeeded[0].content.as_deref(),
            Some("Run the node.")
        );

        let saved = std::fs::read_to_string(output_dir.join("setup-node.md")).unwrap();
        assert_eq!(saved, "Run the node.");
    }

    #[tokio::test]
    async fn test_concurrency_limit_is_respected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("slow")
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;

        let urls: LinkSet = (0..6)
            .map(|i| format!("{}/doc-{}.md", server.uri(), i))
            .collect();

        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(test_fetcher(), 2, dir.path());

        let start = Instant::now();
        let report = downloader
            .download_all(&urls, &mut SilentProgress, &CancellationToken::new())
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!(report.succeeded.len(), 6);
        // With two at a time, six 200ms responses take at least three rounds
        assert!(
            elapsed >= Duration::from_millis(600),
            "finished in {:?}, more than 2 fetches ran at once",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_cancellation_reports_unfinished_urls_as_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("never seen")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let urls: LinkSet = (0..4)
            .map(|i| format!("{}/doc-{}.md", server.uri(), i))
            .collect();

        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(test_fetcher(), 2, dir.path());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let report = downloader
            .download_all(&urls, &mut SilentProgress, &cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert!(report.succeeded.is_empty());
        assert_eq!(report.failed.len(), 4);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_write_failure_still_counts_as_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("content"))
            .mount(&server)
            .await;

        let urls: LinkSet = [format!("{}/notes.md", server.uri())].into_iter().collect();

        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should go makes the write fail
        std::fs::create_dir(dir.path().join("notes.md")).unwrap();
        let downloader = Downloader::new(test_fetcher(), 1, dir.path());

        let report = downloader
            .download_all(&urls, &mut SilentProgress, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.succeeded.len(), 1);
        assert!(report.failed.is_empty());
        assert_eq!(report.write_errors.len(), 1);
        assert_eq!(report.write_errors[0].0, urls.iter().next().unwrap().clone());
    }

    #[tokio::test]
    async fn test_empty_link_set() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(test_fetcher(), 3, dir.path());
        let mut progress = RecordingProgress::default();

        let report = downloader
            .download_all(&LinkSet::new(), &mut progress, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.total(), 0);
        assert_eq!(progress.total, Some(0));
        assert!(progress.finished);
    }
}
