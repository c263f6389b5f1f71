//! Snapshot acquisition from the leaderboard API or the local cache.

use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{ACCEPT, COOKIE};

use super::{parse_snapshot, Snapshot};
use crate::error::{Error, Result};
use crate::util::{compact_text, write_atomically};

/// Public leaderboard site
pub const DEFAULT_API_BASE_URL: &str = "https://adventofcode.com";

const FETCH_HTTP_TIMEOUT_SECS: u64 = 15;

/// Where a snapshot should come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Read the persisted copy, falling back to the remote API when it is absent
    Cached,
    /// Always call the remote API
    Live,
}

/// Remote endpoint, credential and cache location for snapshots
#[derive(Clone, PartialEq, Eq)]
pub struct SnapshotSource {
    pub api_base_url: String,
    pub year: Option<u16>,
    pub leaderboard_id: Option<u64>,
    pub session: Option<String>,
    pub cache_path: PathBuf,
    /// Call the remote API in cached mode when no copy exists
    pub remote_fallback: bool,
    /// Write live results to the cache
    pub persist_live: bool,
}

impl fmt::Debug for SnapshotSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SnapshotSource")
            .field("api_base_url", &self.api_base_url)
            .field("year", &self.year)
            .field("leaderboard_id", &self.leaderboard_id)
            .field("session", &self.session.as_ref().map(|_| "[REDACTED]"))
            .field("cache_path", &self.cache_path)
            .field("remote_fallback", &self.remote_fallback)
            .field("persist_live", &self.persist_live)
            .finish()
    }
}

impl SnapshotSource {
    /// JSON endpoint of the private leaderboard, when year and id are known
    pub fn leaderboard_url(&self) -> Option<String> {
        let year = self.year?;
        let leaderboard_id = self.leaderboard_id?;
        Some(format!(
            "{}/{year}/leaderboard/private/view/{leaderboard_id}.json",
            self.api_base_url.trim_end_matches('/')
        ))
    }

    /// Whether the remote API can be called at all
    pub fn is_remote_configured(&self) -> bool {
        self.session.is_some() && self.leaderboard_url().is_some()
    }
}

/// Obtains leaderboard snapshots. Never retries.
#[derive(Clone)]
pub struct SnapshotFetcher {
    source: SnapshotSource,
    client: reqwest::Client,
}

impl SnapshotFetcher {
    pub fn new(source: SnapshotSource) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_HTTP_TIMEOUT_SECS))
            .user_agent(concat!("aoc-share/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { source, client })
    }

    pub const fn source(&self) -> &SnapshotSource {
        &self.source
    }

    /// Obtain a snapshot according to `mode`
    pub async fn fetch(&self, mode: FetchMode) -> Result<Snapshot> {
        match mode {
            FetchMode::Cached => {
                if let Some(snapshot) = self.read_cache()? {
                    tracing::debug!(
                        "Loaded cached leaderboard from {}",
                        self.source.cache_path.display()
                    );
                    return Ok(snapshot);
                }
                if !self.source.remote_fallback {
                    return Err(Error::DataUnavailable(format!(
                        "no cached leaderboard at {}",
                        self.source.cache_path.display()
                    )));
                }
                let payload = self.fetch_remote().await?;
                let snapshot = parse_snapshot(&payload)?;
                self.persist(&payload);
                Ok(snapshot)
            }
            FetchMode::Live => {
                let payload = self.fetch_remote().await?;
                let snapshot = parse_snapshot(&payload)?;
                if self.source.persist_live {
                    self.persist(&payload);
                }
                Ok(snapshot)
            }
        }
    }

    fn read_cache(&self) -> Result<Option<Snapshot>> {
        let payload = match std::fs::read_to_string(&self.source.cache_path) {
            Ok(payload) => payload,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        parse_snapshot(&payload).map(Some).map_err(|error| {
            Error::DataUnavailable(format!(
                "cached leaderboard at {} is unreadable: {error}",
                self.source.cache_path.display()
            ))
        })
    }

    /// Persisting is optional; a fetched snapshot is never discarded over it.
    fn persist(&self, payload: &str) {
        if let Err(error) = self.write_cache(payload) {
            tracing::warn!(
                "Failed to save leaderboard snapshot to {}: {error}",
                self.source.cache_path.display()
            );
        }
    }

    fn write_cache(&self, payload: &str) -> Result<()> {
        if let Some(parent) = self.source.cache_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_atomically(&self.source.cache_path, payload.as_bytes())?;
        tracing::debug!(
            "Saved leaderboard snapshot to {}",
            self.source.cache_path.display()
        );
        Ok(())
    }

    async fn fetch_remote(&self) -> Result<String> {
        let (Some(url), Some(session)) = (self.source.leaderboard_url(), &self.source.session)
        else {
            return Err(Error::DataUnavailable(
                "remote leaderboard is not configured (set AOC_SESSION, AOC_YEAR and AOC_LEADERBOARD)"
                    .to_string(),
            ));
        };

        tracing::debug!("Fetching leaderboard from {url}");
        let response = self
            .client
            .get(&url)
            .header(COOKIE, format!("session={session}"))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = compact_text(&body);
            return Err(Error::Remote(if detail.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                format!("{detail} ({})", status.as_u16())
            }));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    const PAYLOAD: &str = r#"{"members": {"1": {"id": 1, "name": "alice", "local_score": 10,
        "completion_day_level": {"1": {"1": {}}}}}}"#;

    fn source(cache_path: PathBuf) -> SnapshotSource {
        SnapshotSource {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            year: None,
            leaderboard_id: None,
            session: None,
            cache_path,
            remote_fallback: true,
            persist_live: true,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cached_mode_reads_persisted_copy() {
        let tmp = tempdir().unwrap();
        let cache_path = tmp.path().join("data.json");
        std::fs::write(&cache_path, PAYLOAD).unwrap();

        let fetcher = SnapshotFetcher::new(source(cache_path)).unwrap();
        let snapshot = fetcher.fetch(FetchMode::Cached).await.unwrap();
        assert_eq!(
            snapshot.member(UserId::new(1)).unwrap().username,
            "alice"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cached_mode_without_copy_or_fallback_is_unavailable() {
        let tmp = tempdir().unwrap();
        let mut source = source(tmp.path().join("data.json"));
        source.remote_fallback = false;

        let fetcher = SnapshotFetcher::new(source).unwrap();
        let result = fetcher.fetch(FetchMode::Cached).await;
        assert!(matches!(result, Err(Error::DataUnavailable(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cached_mode_without_copy_or_credentials_is_unavailable() {
        let tmp = tempdir().unwrap();
        let fetcher = SnapshotFetcher::new(source(tmp.path().join("data.json"))).unwrap();

        let result = fetcher.fetch(FetchMode::Cached).await;
        assert!(matches!(result, Err(Error::DataUnavailable(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn corrupt_cache_is_unavailable() {
        let tmp = tempdir().unwrap();
        let cache_path = tmp.path().join("data.json");
        std::fs::write(&cache_path, "{not json").unwrap();

        let fetcher = SnapshotFetcher::new(source(cache_path)).unwrap();
        let result = fetcher.fetch(FetchMode::Cached).await;
        assert!(matches!(result, Err(Error::DataUnavailable(_))));
    }

    #[test]
    fn leaderboard_url_requires_year_and_id() {
        let mut source = source(PathBuf::from("data.json"));
        assert_eq!(source.leaderboard_url(), None);

        source.year = Some(2024);
        source.leaderboard_id = Some(123_456);
        source.api_base_url = "https://example.com/".to_string();
        assert_eq!(
            source.leaderboard_url().as_deref(),
            Some("https://example.com/2024/leaderboard/private/view/123456.json")
        );
        assert!(!source.is_remote_configured());

        source.session = Some("secret".to_string());
        assert!(source.is_remote_configured());
    }

    #[test]
    fn debug_redacts_session() {
        let mut source = source(PathBuf::from("data.json"));
        source.session = Some("secret".to_string());
        let debug = format!("{source:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    /// Serve one canned response on a local port and hand back the raw request.
    async fn spawn_one_shot_server(
        status_line: &str,
        body: &str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let address = listener.local_addr().expect("local address");
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let (request_tx, request_rx) = oneshot::channel();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buffer = [0_u8; 1024];
                while let Ok(read) = socket.read(&mut buffer).await {
                    if read == 0 {
                        break;
                    }
                    request.extend_from_slice(&buffer[..read]);
                    if request.windows(4).any(|window| window == b"\r\n\r\n") {
                        break;
                    }
                }
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = request_tx.send(String::from_utf8_lossy(&request).to_string());
            }
        });

        (format!("http://{address}"), request_rx)
    }

    fn remote_source(api_base_url: String, cache_path: PathBuf) -> SnapshotSource {
        SnapshotSource {
            api_base_url,
            year: Some(2023),
            leaderboard_id: Some(99),
            session: Some("s3cr3t".to_string()),
            ..source(cache_path)
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn live_fetch_sends_session_cookie_and_persists() {
        let tmp = tempdir().unwrap();
        let cache_path = tmp.path().join("data.json");
        let (base_url, request) = spawn_one_shot_server("200 OK", PAYLOAD).await;

        let fetcher = SnapshotFetcher::new(remote_source(base_url, cache_path.clone())).unwrap();
        let snapshot = fetcher.fetch(FetchMode::Live).await.unwrap();
        assert_eq!(
            snapshot.member(UserId::new(1)).unwrap().username,
            "alice"
        );

        let request = request.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /2023/leaderboard/private/view/99.json "));
        assert!(request.contains("cookie: session=s3cr3t"));
        assert_eq!(std::fs::read_to_string(&cache_path).unwrap(), PAYLOAD);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn live_fetch_without_persistence_leaves_cache_alone() {
        let tmp = tempdir().unwrap();
        let cache_path = tmp.path().join("data.json");
        let (base_url, _request) = spawn_one_shot_server("200 OK", PAYLOAD).await;

        let mut source = remote_source(base_url, cache_path.clone());
        source.persist_live = false;
        let fetcher = SnapshotFetcher::new(source).unwrap();
        fetcher.fetch(FetchMode::Live).await.unwrap();
        assert!(!cache_path.exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_success_status_is_remote_error() {
        let tmp = tempdir().unwrap();
        let cache_path = tmp.path().join("data.json");
        let (base_url, _request) = spawn_one_shot_server("500 Internal Server Error", "boom").await;

        let fetcher = SnapshotFetcher::new(remote_source(base_url, cache_path.clone())).unwrap();
        match fetcher.fetch(FetchMode::Live).await {
            Err(Error::Remote(message)) => assert_eq!(message, "boom (500)"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!cache_path.exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn html_body_is_remote_error() {
        let tmp = tempdir().unwrap();
        let cache_path = tmp.path().join("data.json");
        let (base_url, _request) =
            spawn_one_shot_server("200 OK", "<html><body>Log in</body></html>").await;

        let fetcher = SnapshotFetcher::new(remote_source(base_url, cache_path.clone())).unwrap();
        match fetcher.fetch(FetchMode::Live).await {
            Err(Error::Remote(message)) => assert!(message.contains("invalid leaderboard JSON")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!cache_path.exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cached_mode_falls_back_to_remote_and_saves_copy() {
        let tmp = tempdir().unwrap();
        let cache_path = tmp.path().join("data.json");
        let (base_url, _request) = spawn_one_shot_server("200 OK", PAYLOAD).await;

        let mut source = remote_source(base_url, cache_path.clone());
        source.persist_live = false;
        let fetcher = SnapshotFetcher::new(source).unwrap();

        let fetched = fetcher.fetch(FetchMode::Cached).await.unwrap();
        assert_eq!(std::fs::read_to_string(&cache_path).unwrap(), PAYLOAD);

        // The one-shot server is gone; the second read must come from disk.
        let cached = fetcher.fetch(FetchMode::Cached).await.unwrap();
        assert_eq!(cached, fetched);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_cache_write_keeps_fetched_snapshot() {
        let tmp = tempdir().unwrap();
        let cache_path = tmp.path().join("data.json");
        std::fs::create_dir_all(cache_path.join("occupied")).unwrap();
        let (base_url, _request) = spawn_one_shot_server("200 OK", PAYLOAD).await;

        let fetcher = SnapshotFetcher::new(remote_source(base_url, cache_path.clone())).unwrap();
        let snapshot = fetcher.fetch(FetchMode::Live).await.unwrap();
        assert!(snapshot.member(UserId::new(1)).is_some());
        assert!(cache_path.is_dir());
    }
}
