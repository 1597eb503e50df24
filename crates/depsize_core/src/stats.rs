use anyhow::{Context, Result};
use dashmap::DashMap;
use log::{debug, info, trace};
use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use serde::Deserialize;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    thread,
};

use crate::{
    constants::{BUNDLEPHOBIA_API, USER_AGENT},
    error::DepsizeError,
    types::PackageStats,
};

/// A service answering size lookups for one `name@version` specifier.
pub trait StatsSource: Send + Sync {
    fn fetch(&self, specifier: &str) -> Result<PackageStats>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Blocking client for the bundlephobia size API.
pub struct BundlephobiaClient {
    endpoint: String,
    agent: ureq::Agent,
}

impl BundlephobiaClient {
    pub fn new() -> Self {
        Self::with_endpoint(BUNDLEPHOBIA_API)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            // Error statuses are read here so the body's {code, message} survives
            agent: ureq::Agent::new_with_config(
                ureq::config::Config::builder().http_status_as_error(false).build(),
            ),
        }
    }
}

impl Default for BundlephobiaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSource for BundlephobiaClient {
    fn fetch(&self, specifier: &str) -> Result<PackageStats> {
        debug!("Requesting stats for {}", specifier);
        let mut response = self
            .agent
            .get(&self.endpoint)
            .query("package", specifier)
            .query("record", "true")
            .header("User-Agent", USER_AGENT)
            .header("X-Bundlephobia-User", USER_AGENT)
            .call()?;

        let status = response.status();
        if status.is_success() {
            return response
                .body_mut()
                .read_json::<PackageStats>()
                .with_context(|| format!("Invalid stats response for {}", specifier));
        }

        let body = response.body_mut().read_to_string().unwrap_or_default();
        trace!("{} answered {} for {}: {}", self.endpoint, status, specifier, body);
        let (code, message) = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody { error }) => (error.code, error.message),
            Err(_) => (status.as_u16().to_string(), body),
        };
        Err(DepsizeError::RequestStats { specifier: specifier.to_string(), code, message }.into())
    }
}

/// Resolves specifiers to stats on a fixed-size worker pool, caching each
/// result for the lifetime of the fetcher.
pub struct StatsFetcher {
    source: Box<dyn StatsSource>,
    pool: ThreadPool,
    cache: DashMap<String, Arc<PackageStats>>,
}

impl StatsFetcher {
    pub fn new(source: Box<dyn StatsSource>, concurrency: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(concurrency.max(1))
            .thread_name(|i| format!("depsize-stats-{}", i))
            .build()
            .context("Failed to build stats worker pool")?;
        debug!("Stats fetcher using {} workers", pool.current_num_threads());
        Ok(Self { source, pool, cache: DashMap::new() })
    }

    pub fn concurrency(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn request_package_stats(&self, specifier: &str) -> Result<Arc<PackageStats>> {
        if let Some(v) = self.cache.get(specifier) {
            trace!("Cache hit for stats: {}", specifier);
            return Ok(Arc::clone(v.value()));
        }
        trace!("Thread {:?} fetching {}", thread::current().id(), specifier);

        let stats = Arc::new(self.source.fetch(specifier)?);
        self.cache.insert(specifier.to_string(), Arc::clone(&stats));
        Ok(stats)
    }

    /// Stats for every specifier, in input order.
    ///
    /// Repeated specifiers are requested once. The first failure aborts the batch.
    pub fn request_stats(&self, specifiers: &[String]) -> Result<Vec<Arc<PackageStats>>> {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = specifiers
            .iter()
            .map(|s| s.trim())
            .filter(|s| seen.insert(*s))
            .collect();
        info!("Requesting stats for {} packages", unique.len());

        let fetched: Vec<Arc<PackageStats>> = self.pool.install(|| {
            unique.par_iter().map(|s| self.request_package_stats(s)).collect::<Result<_>>()
        })?;

        let by_specifier: HashMap<&str, &Arc<PackageStats>> =
            unique.iter().copied().zip(fetched.iter()).collect();
        Ok(specifiers.iter().map(|s| Arc::clone(by_specifier[s.trim()])).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::{
        io::{BufRead, BufReader, Write},
        net::TcpListener,
        sync::atomic::{AtomicUsize, Ordering},
        thread::JoinHandle,
    };

    /// Answers from a fixed table and counts every call
    struct FakeSource {
        sizes: HashMap<&'static str, (u64, u64)>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeSource {
        fn new(sizes: &[(&'static str, u64, u64)]) -> Self {
            Self {
                sizes: sizes.iter().map(|(s, size, gzip)| (*s, (*size, *gzip))).collect(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl StatsSource for FakeSource {
        fn fetch(&self, specifier: &str) -> Result<PackageStats> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let Some((size, gzip)) = self.sizes.get(specifier) else {
                bail!(DepsizeError::RequestStats {
                    specifier: specifier.to_string(),
                    code: "PackageNotFoundError".to_string(),
                    message: "not found".to_string(),
                });
            };
            let (name, version) = specifier.rsplit_once('@').unwrap();
            Ok(PackageStats {
                name: name.to_string(),
                version: version.to_string(),
                size: *size,
                gzip: *gzip,
                dependency_count: 0,
                description: None,
                repository: None,
                scoped: false,
                assets: vec![],
                dependency_sizes: vec![],
            })
        }
    }

    fn specs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_request_stats_preserves_order() {
        let source = FakeSource::new(&[
            ("qs@6.11.0", 31782, 10047),
            ("lodash@4.17.21", 71563, 25060),
            ("redux@4.2.1", 5060, 1840),
        ]);
        let fetcher = StatsFetcher::new(Box::new(source), 3).unwrap();

        let stats = fetcher
            .request_stats(&specs(&["qs@6.11.0", "lodash@4.17.21", "redux@4.2.1"]))
            .unwrap();

        let got: Vec<(&str, u64, u64)> =
            stats.iter().map(|s| (s.name.as_str(), s.size, s.gzip)).collect();
        assert_eq!(
            got,
            [("qs", 31782, 10047), ("lodash", 71563, 25060), ("redux", 5060, 1840)]
        );
    }

    #[test]
    fn test_request_stats_memoizes_across_calls() {
        let source = FakeSource::new(&[("react@18.2.0", 6588, 2723)]);
        let calls = Arc::clone(&source.calls);
        let fetcher = StatsFetcher::new(Box::new(source), 2).unwrap();

        let first = fetcher.request_stats(&specs(&["react@18.2.0"])).unwrap();
        let second = fetcher.request_stats(&specs(&["react@18.2.0"])).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first[0], &second[0]));
        assert_eq!(fetcher.cached_len(), 1);
    }

    #[test]
    fn test_request_stats_deduplicates_within_batch() {
        let source = FakeSource::new(&[("dayjs@1.11.7", 6964, 2926), ("redux@4.2.1", 5060, 1840)]);
        let calls = Arc::clone(&source.calls);
        let fetcher = StatsFetcher::new(Box::new(source), 4).unwrap();

        let stats = fetcher
            .request_stats(&specs(&["dayjs@1.11.7", "redux@4.2.1", "dayjs@1.11.7 "]))
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(stats.len(), 3);
        assert!(Arc::ptr_eq(&stats[0], &stats[2]));
    }

    #[test]
    fn test_request_stats_failure_aborts_batch() {
        let source = FakeSource::new(&[("redux@4.2.1", 5060, 1840)]);
        let fetcher = StatsFetcher::new(Box::new(source), 1).unwrap();

        let err = fetcher
            .request_stats(&specs(&["redux@4.2.1", "does-not-exist@0.0.0"]))
            .unwrap_err();
        match err.downcast_ref::<DepsizeError>() {
            Some(DepsizeError::RequestStats { specifier, code, .. }) => {
                assert_eq!(specifier, "does-not-exist@0.0.0");
                assert_eq!(code, "PackageNotFoundError");
            }
            other => panic!("expected RequestStats, got {:?}", other),
        }
    }

    #[test]
    fn test_request_stats_empty_batch() {
        let source = FakeSource::new(&[]);
        let calls = Arc::clone(&source.calls);
        let fetcher = StatsFetcher::new(Box::new(source), 2).unwrap();

        assert!(fetcher.request_stats(&[]).unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fetcher_concurrency_floor() {
        let fetcher = StatsFetcher::new(Box::new(FakeSource::new(&[])), 0).unwrap();
        assert_eq!(fetcher.concurrency(), 1);
    }

    #[test]
    fn test_error_body_shape() {
        let body = r#"{"error":{"code":"PackageNotFoundError","message":"The package you were looking for doesn't exist."}}"#;
        let parsed: ErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.code, "PackageNotFoundError");
        assert!(parsed.error.message.starts_with("The package"));
    }

    /// Answer a single HTTP request on a loopback port and hand back the
    /// request head that was received.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/api/size", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
            stream.flush().unwrap();
            head
        });
        (endpoint, handle)
    }

    #[test]
    fn test_client_reads_stats() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"name":"react","version":"18.2.0","size":6588,"gzip":2567,"dependencyCount":1}"#,
        );
        let client = BundlephobiaClient::with_endpoint(endpoint);

        let stats = client.fetch("react@18.2.0").unwrap();
        assert_eq!(stats.specifier(), "react@18.2.0");
        assert_eq!((stats.size, stats.gzip, stats.dependency_count), (6588, 2567, 1));

        let head = server.join().unwrap();
        let request_line = head.lines().next().unwrap();
        assert!(request_line.starts_with("GET /api/size?"), "{}", request_line);
        assert!(request_line.contains("package=react"), "{}", request_line);
        assert!(request_line.contains("record=true"), "{}", request_line);
        assert!(
            head.to_ascii_lowercase().contains("x-bundlephobia-user: bundle-phobia-cli"),
            "{}",
            head
        );
    }

    #[test]
    fn test_client_maps_error_body() {
        let (endpoint, server) = serve_once(
            "404 Not Found",
            r#"{"error":{"code":"PackageNotFoundError","message":"The package you were looking for doesn't exist."}}"#,
        );
        let client = BundlephobiaClient::with_endpoint(endpoint);

        let err = client.fetch("no-such-pkg@1.0.0").unwrap_err();
        server.join().unwrap();
        match err.downcast_ref::<DepsizeError>() {
            Some(DepsizeError::RequestStats { specifier, code, message }) => {
                assert_eq!(specifier, "no-such-pkg@1.0.0");
                assert_eq!(code, "PackageNotFoundError");
                assert_eq!(message, "The package you were looking for doesn't exist.");
            }
            other => panic!("expected RequestStats, got {:?}", other),
        }
    }

    #[test]
    fn test_client_non_json_error_body() {
        let (endpoint, server) = serve_once("502 Bad Gateway", "upstream down");
        let client = BundlephobiaClient::with_endpoint(endpoint);

        let err = client.fetch("react@18.2.0").unwrap_err();
        server.join().unwrap();
        match err.downcast_ref::<DepsizeError>() {
            Some(DepsizeError::RequestStats { code, message, .. }) => {
                assert_eq!(code, "502");
                assert_eq!(message, "upstream down");
            }
            other => panic!("expected RequestStats, got {:?}", other),
        }
    }
}
