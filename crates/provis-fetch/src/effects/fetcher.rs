use std::future::Future;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::StreamExt;
use provis_verify::{Hasher, Sha1Hasher, VerifyError};
use tokio::io::AsyncWriteExt;

use crate::core::{is_success, retry_delay};
use crate::data::{FetchOptions, FetchPhase, Progress};
use crate::effects::http::{HttpClient, HttpResponse};
use crate::error::{Error, Result};

/// Downloads payloads to memory or to disk with verification.
pub struct Fetcher<C: HttpClient> {
    pub(crate) client: C,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetch `url` fully into memory.
    pub async fn fetch_bytes(&self, url: &str, options: &FetchOptions) -> Result<Bytes> {
        self.with_retries(url, options, |retry_count| self.fetch_bytes_once(url, options, retry_count))
            .await
    }

    /// Fetch `url` into `destination`, returning the number of bytes written.
    ///
    /// The payload streams into a sibling `.part` file which is renamed over
    /// `destination` only once size and checksum have been verified.
    pub async fn fetch(&self, url: &str, destination: &Path, options: &FetchOptions) -> Result<u64> {
        self.with_retries(url, options, |retry_count| {
            self.fetch_file_once(url, destination, options, retry_count)
        })
        .await
    }

    async fn with_retries<T, F, Fut>(&self, url: &str, options: &FetchOptions, mut attempt: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retry_count = 0;
        loop {
            match attempt(retry_count).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && retry_count < options.max_retries => {
                    let delay = retry_delay(retry_count, options.retry_backoff);
                    tracing::debug!(url, retry_count, ?delay, error = %e, "retrying fetch");
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn open(&self, url: &str, options: &FetchOptions) -> Result<HttpResponse<C::Error>> {
        let response = self
            .client
            .get(url, &options.headers)
            .await
            .map_err(|e| Error::transport(url, e))?;

        if !is_success(response.status) {
            return Err(Error::Status {
                url: url.to_string(),
                status: response.status,
            });
        }

        Ok(response)
    }

    async fn fetch_bytes_once(&self, url: &str, options: &FetchOptions, retry_count: u32) -> Result<Bytes> {
        report(options, FetchPhase::Connecting, 0, options.expected_size, retry_count);
        let mut response = self.open(url, options).await?;
        let total_bytes = options.expected_size.or(response.content_length);

        let mut buffer = Vec::with_capacity(total_bytes.unwrap_or(0).min(16 * 1024 * 1024) as usize);
        let mut hasher = options.sha1.as_ref().map(|_| Sha1Hasher::new());

        while let Some(chunk) = response.body.next().await {
            let chunk = chunk.map_err(|e| Error::transport(url, e))?;
            if let Some(hasher) = hasher.as_mut() {
                hasher.update(&chunk);
            }
            buffer.extend_from_slice(&chunk);
            report(options, FetchPhase::Downloading, buffer.len() as u64, total_bytes, retry_count);
        }

        report(options, FetchPhase::Verifying, buffer.len() as u64, total_bytes, retry_count);
        verify(url, options, buffer.len() as u64, hasher)?;
        report(options, FetchPhase::Completed, buffer.len() as u64, total_bytes, retry_count);

        Ok(Bytes::from(buffer))
    }

    async fn fetch_file_once(
        &self,
        url: &str,
        destination: &Path,
        options: &FetchOptions,
        retry_count: u32,
    ) -> Result<u64> {
        report(options, FetchPhase::Connecting, 0, options.expected_size, retry_count);
        let response = self.open(url, options).await?;
        let total_bytes = options.expected_size.or(response.content_length);

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(Error::io(parent))?;
        }

        let staging = staging_path(destination);
        let written = match self
            .stream_to_file(url, response, &staging, total_bytes, options, retry_count)
            .await
        {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&staging).await;
                return Err(e);
            }
        };

        report(options, FetchPhase::Committing, written, total_bytes, retry_count);
        if let Err(e) = tokio::fs::rename(&staging, destination).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(Error::Io {
                path: destination.to_path_buf(),
                source: e,
            });
        }
        report(options, FetchPhase::Completed, written, total_bytes, retry_count);

        Ok(written)
    }

    async fn stream_to_file(
        &self,
        url: &str,
        mut response: HttpResponse<C::Error>,
        staging: &Path,
        total_bytes: Option<u64>,
        options: &FetchOptions,
        retry_count: u32,
    ) -> Result<u64> {
        let mut file = tokio::fs::File::create(staging).await.map_err(Error::io(staging))?;
        let mut hasher = options.sha1.as_ref().map(|_| Sha1Hasher::new());
        let mut written = 0u64;

        report(options, FetchPhase::Downloading, 0, total_bytes, retry_count);
        while let Some(chunk) = response.body.next().await {
            let chunk = chunk.map_err(|e| Error::transport(url, e))?;
            if let Some(hasher) = hasher.as_mut() {
                hasher.update(&chunk);
            }
            file.write_all(&chunk).await.map_err(Error::io(staging))?;
            written += chunk.len() as u64;
            report(options, FetchPhase::Downloading, written, total_bytes, retry_count);
        }
        file.flush().await.map_err(Error::io(staging))?;
        drop(file);

        report(options, FetchPhase::Verifying, written, total_bytes, retry_count);
        verify(url, options, written, hasher)?;

        Ok(written)
    }
}

fn verify(url: &str, options: &FetchOptions, written: u64, hasher: Option<Sha1Hasher>) -> Result<()> {
    if let Some(expected) = options.expected_size {
        if expected != written {
            return Err(Error::SizeMismatch {
                url: url.to_string(),
                expected,
                actual: written,
            });
        }
    }

    if let (Some(expected), Some(hasher)) = (options.sha1.as_ref(), hasher) {
        if let Err(VerifyError::HashMismatch { expected, actual }) = expected.check(hasher.finalize()) {
            return Err(Error::ChecksumMismatch {
                url: url.to_string(),
                expected: hex::encode(expected),
                actual: hex::encode(actual),
            });
        }
    }

    Ok(())
}

fn staging_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    destination.with_file_name(format!(".{name}.part"))
}

fn report(options: &FetchOptions, phase: FetchPhase, bytes_downloaded: u64, total_bytes: Option<u64>, retry_count: u32) {
    if let Some(callback) = &options.on_progress {
        callback(&Progress {
            phase,
            bytes_downloaded,
            total_bytes,
            retry_count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryClient;
    use provis_verify::ExpectedDigest;
    use std::sync::{Arc, Mutex};

    const URL: &str = "https://example.invalid/lib.jar";

    #[tokio::test]
    async fn fetch_writes_verified_payload() {
        let dir = tempfile::tempdir().unwrap();
        let client = MemoryClient::new();
        client.route(URL, &b"library bytes"[..]);
        let fetcher = Fetcher::new(client);

        let dest = dir.path().join("a/b/lib.jar");
        let options = FetchOptions::default()
            .expected_size(Some(13))
            .sha1(Some(ExpectedDigest::from_bytes(Sha1Hasher::digest(b"library bytes"))));

        let written = fetcher.fetch(URL, &dest, &options).await.unwrap();

        assert_eq!(written, 13);
        assert_eq!(std::fs::read(&dest).unwrap(), b"library bytes");
        assert!(!dir.path().join("a/b/.lib.jar.part").exists());
    }

    #[tokio::test]
    async fn checksum_mismatch_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let client = MemoryClient::new();
        client.route(URL, &b"tampered"[..]);
        let fetcher = Fetcher::new(client);

        let dest = dir.path().join("lib.jar");
        let options = FetchOptions::default()
            .sha1(Some(ExpectedDigest::from_bytes(Sha1Hasher::digest(b"original"))));

        let err = fetcher.fetch(URL, &dest, &options).await.unwrap_err();

        assert!(matches!(err, Error::ChecksumMismatch { .. }));
        assert!(!dest.exists());
        assert!(!dir.path().join(".lib.jar.part").exists());
    }

    #[tokio::test]
    async fn not_found_is_a_status_error_and_not_retried() {
        let client = MemoryClient::new();
        let fetcher = Fetcher::new(client.clone());

        let err = fetcher.fetch_bytes(URL, &FetchOptions::default()).await.unwrap_err();

        assert!(matches!(err, Error::Status { status: 404, .. }));
        assert!(err.is_unreachable());
        assert_eq!(client.requests_for(URL), 1);
    }

    #[tokio::test]
    async fn transport_failures_are_retried() {
        let client = MemoryClient::new();
        client.unreachable(URL);
        let fetcher = Fetcher::new(client.clone());
        let options = FetchOptions::default()
            .max_retries(2)
            .retry_backoff(std::time::Duration::from_millis(1));

        let err = fetcher.fetch_bytes(URL, &options).await.unwrap_err();

        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(client.requests_for(URL), 3);
    }

    #[tokio::test]
    async fn progress_reaches_completed() {
        let client = MemoryClient::new();
        client.route(URL, &b"abc"[..]);
        let fetcher = Fetcher::new(client);
        let phases = Arc::new(Mutex::new(Vec::new()));
        let sink = phases.clone();
        let options = FetchOptions::default().on_progress(Arc::new(move |p: &Progress| {
            sink.lock().unwrap().push(p.phase);
        }));

        let bytes = fetcher.fetch_bytes(URL, &options).await.unwrap();

        assert_eq!(&bytes[..], b"abc");
        let phases = phases.lock().unwrap();
        assert_eq!(phases.first(), Some(&FetchPhase::Connecting));
        assert_eq!(phases.last(), Some(&FetchPhase::Completed));
    }
}
