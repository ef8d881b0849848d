//! Async archive download with streaming SHA-256 verification.
//!
//! The digest is computed over the exact bytes received, while they are
//! received. A mismatch removes the partial file and fails the install:
//! nothing that failed the content-addressing check is ever handed to the
//! build stage.

use std::io::Write;
use std::path::Path;

use futures::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use keg_schema::{FormulaName, Sha256Digest, Version};

use crate::Reporter;

/// Errors surfaced by the fetch stage.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The source URL was unreachable or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The archive could not be written or read locally.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The computed digest of the fetched archive does not equal the
    /// declared digest.
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        /// Digest declared by the formula.
        expected: String,
        /// Digest computed over the fetched bytes.
        actual: String,
    },
}

/// Request for a fetch operation.
pub struct FetchRequest<'a, R: Reporter> {
    /// HTTP client to use.
    pub client: &'a Client,
    /// Formula name, for progress reporting.
    pub name: &'a FormulaName,
    /// Formula version, for progress reporting.
    pub version: &'a Version,
    /// Source archive URL.
    pub url: &'a str,
    /// Where the raw archive bytes are written.
    pub dest: &'a Path,
    /// Declared digest the fetched bytes must match.
    pub expected: &'a Sha256Digest,
    /// Progress sink.
    pub reporter: &'a R,
    /// When set, the archive is also unpacked here as it streams in.
    pub extract_dest: Option<&'a Path>,
}

impl<'a, R: Reporter> FetchRequest<'a, R> {
    /// Build a plain download request.
    pub fn new(
        client: &'a Client,
        name: &'a FormulaName,
        version: &'a Version,
        url: &'a str,
        dest: &'a Path,
        expected: &'a Sha256Digest,
        reporter: &'a R,
    ) -> Self {
        Self {
            client,
            name,
            version,
            url,
            dest,
            expected,
            reporter,
            extract_dest: None,
        }
    }

    /// Also unpack the gzip/tar stream into `extract_dest` while hashing.
    pub fn with_extract_dest(mut self, extract_dest: &'a Path) -> Self {
        self.extract_dest = Some(extract_dest);
        self
    }

    /// Execute the fetch (and extraction if requested).
    ///
    /// Returns the computed hex digest on success.
    pub async fn execute(self) -> Result<String, FetchError> {
        if self.extract_dest.is_some() {
            fetch_and_extract(self).await
        } else {
            fetch_and_verify(self).await
        }
    }
}

impl<R: Reporter> std::fmt::Debug for FetchRequest<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchRequest")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("dest", &self.dest)
            .finish_non_exhaustive()
    }
}

/// Download a file sequentially with streaming verification.
pub async fn fetch_and_verify<R: Reporter>(req: FetchRequest<'_, R>) -> Result<String, FetchError> {
    let total_size = content_length(req.client, req.url).await;
    req.reporter.downloading(req.name, req.version, 0, total_size);

    tracing::debug!(url = req.url, "fetching archive");
    let response = req
        .client
        .get(req.url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let mut file = File::create(req.dest).await?;
    let mut stream = response.bytes_stream();
    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        hasher.update(&chunk);
        downloaded += chunk.len() as u64;
        req.reporter
            .downloading(req.name, req.version, downloaded, total_size);
    }

    file.flush().await?;
    let actual = hex::encode(hasher.finalize());

    if !req.expected.matches(&actual) {
        req.reporter.failed(req.name, req.version, "hash mismatch");
        tokio::fs::remove_file(req.dest).await.ok();
        return Err(FetchError::HashMismatch {
            expected: req.expected.to_string(),
            actual,
        });
    }

    Ok(actual)
}

/// Simultaneously download, cache, and extract a `.tar.gz` archive via a
/// streaming pipeline.
///
/// Extraction runs concurrently with the download, but the digest check is
/// still authoritative: on mismatch the cached archive is removed and the
/// caller's temp dir (holding the partial extraction) must be discarded.
pub async fn fetch_and_extract<R: Reporter>(
    req: FetchRequest<'_, R>,
) -> Result<String, FetchError> {
    use async_compression::tokio::bufread::GzipDecoder;
    use tokio_tar::Archive;
    use tokio_util::io::StreamReader;

    let extract_dest = req.extract_dest.ok_or_else(|| {
        FetchError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Missing extract dest",
        ))
    })?;

    let total_size = content_length(req.client, req.url).await;
    req.reporter.downloading(req.name, req.version, 0, total_size);

    let response = req
        .client
        .get(req.url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let mut stream = response.bytes_stream();
    let mut file = File::create(req.dest).await?;
    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;

    // Channel feeding the extractor task the same bytes we hash and cache.
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<bytes::Bytes, std::io::Error>>(32);
    let stream_reader = StreamReader::new(tokio_stream::wrappers::ReceiverStream::new(rx));

    let extract_dest_owned = extract_dest.to_path_buf();
    let extractor_handle = tokio::spawn(async move {
        let decoder = GzipDecoder::new(stream_reader);
        let mut archive = Archive::new(decoder);
        archive.unpack(&extract_dest_owned).await?;
        Ok::<(), std::io::Error>(())
    });

    while let Some(chunk_res) = stream.next().await {
        let chunk = chunk_res?;
        file.write_all(&chunk).await?;
        hasher.write_all(&chunk)?;

        downloaded += chunk.len() as u64;
        req.reporter
            .downloading(req.name, req.version, downloaded, total_size);

        if tx.send(Ok(chunk)).await.is_err() {
            return Err(
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, "Extractor died").into(),
            );
        }
    }
    drop(tx);

    file.flush().await?;
    let actual = hex::encode(hasher.finalize());

    if !req.expected.matches(&actual) {
        req.reporter.failed(req.name, req.version, "hash mismatch");
        tokio::fs::remove_file(req.dest).await.ok();
        return Err(FetchError::HashMismatch {
            expected: req.expected.to_string(),
            actual,
        });
    }

    match extractor_handle.await {
        Ok(Ok(())) => Ok(actual),
        Ok(Err(e)) => Err(FetchError::Io(e)),
        Err(e) => Err(FetchError::Io(std::io::Error::other(e))),
    }
}

async fn content_length(client: &Client, url: &str) -> Option<u64> {
    let head = client
        .head(url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await
        .ok()?;
    head.content_length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullReporter;
    use mockito::Server;

    fn digest_of(bytes: &[u8]) -> Sha256Digest {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Sha256Digest::parse(&hex::encode(hasher.finalize())).unwrap()
    }

    fn targz_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        use flate2::Compression;
        use flate2::write::GzEncoder;

        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (path, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[tokio::test]
    async fn test_fetch_and_verify_ok() {
        let mut server = Server::new_async().await;
        let body = b"some archive bytes";
        let _m = server
            .mock("GET", "/src.tar.gz")
            .with_status(200)
            .with_body(body.to_vec())
            .create_async()
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("src.tar.gz");
        let client = Client::new();
        let name = FormulaName::from("pkg");
        let version = Version::from("1.0.0");
        let expected = digest_of(body);

        let url = format!("{}/src.tar.gz", server.url());
        let actual = FetchRequest::new(
            &client,
            &name,
            &version,
            &url,
            &dest,
            &expected,
            &NullReporter,
        )
        .execute()
        .await
        .unwrap();

        assert!(expected.matches(&actual));
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn test_fetch_hash_mismatch_removes_file() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/src.tar.gz")
            .with_status(200)
            .with_body("tampered bytes")
            .create_async()
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("src.tar.gz");
        let client = Client::new();
        let name = FormulaName::from("pkg");
        let version = Version::from("1.0.0");
        // Digest of different content: the download must be rejected.
        let expected = digest_of(b"original bytes");

        let url = format!("{}/src.tar.gz", server.url());
        let err = FetchRequest::new(
            &client,
            &name,
            &version,
            &url,
            &dest,
            &expected,
            &NullReporter,
        )
        .execute()
        .await
        .unwrap_err();

        assert!(matches!(err, FetchError::HashMismatch { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/missing.tar.gz")
            .with_status(404)
            .create_async()
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("missing.tar.gz");
        let client = Client::new();
        let name = FormulaName::from("pkg");
        let version = Version::from("1.0.0");
        let expected = digest_of(b"irrelevant");

        let url = format!("{}/missing.tar.gz", server.url());
        let err = FetchRequest::new(
            &client,
            &name,
            &version,
            &url,
            &dest,
            &expected,
            &NullReporter,
        )
        .execute()
        .await
        .unwrap_err();

        assert!(matches!(err, FetchError::Http(_)));
    }

    #[tokio::test]
    async fn test_fetch_and_extract_unpacks_while_hashing() {
        let archive = targz_of(&[
            ("pkg-1.0.0/Cargo.toml", b"[package]".as_slice()),
            ("pkg-1.0.0/src/main.rs", b"fn main() {}".as_slice()),
        ]);
        let expected = digest_of(&archive);

        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/src.tar.gz")
            .with_status(200)
            .with_body(archive.clone())
            .create_async()
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("src.tar.gz");
        let extract_dir = tmp.path().join("extracted");
        std::fs::create_dir_all(&extract_dir).unwrap();

        let client = Client::new();
        let name = FormulaName::from("pkg");
        let version = Version::from("1.0.0");

        let url = format!("{}/src.tar.gz", server.url());
        FetchRequest::new(
            &client,
            &name,
            &version,
            &url,
            &dest,
            &expected,
            &NullReporter,
        )
        .with_extract_dest(&extract_dir)
        .execute()
        .await
        .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), archive);
        assert!(extract_dir.join("pkg-1.0.0/Cargo.toml").exists());
        assert!(extract_dir.join("pkg-1.0.0/src/main.rs").exists());
    }
}
