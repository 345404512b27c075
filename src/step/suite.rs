//! Suite location and staging
//!
//! A suite reference is either a file reachable from the workspace or the
//! execution node, or a URL that is downloaded to a local staging file and
//! transferred into the workspace before the runner starts.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Url;
use tokio::io::AsyncWriteExt;

use crate::common::{Error, Result};
use crate::sink::LogSink;
use crate::store::{self, FileStore, Workspace};

/// URL schemes accepted as suite references
const URL_SCHEMES: [&str; 3] = ["http", "https", "file"];

/// Prefix and suffix of staged suite files
const TEMP_PREFIX: &str = "tempHtmlSuite";
const TEMP_SUFFIX: &str = ".html";

/// Classified suite reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuiteReference {
    /// Existing file, as a path usable by the runner
    LocalPath(PathBuf),
    /// Remote suite that has to be staged
    RemoteUrl(Url),
}

/// Parse `reference` as a URL with a supported scheme
pub fn parse_url(reference: &str) -> Option<Url> {
    Url::parse(reference)
        .ok()
        .filter(|url| URL_SCHEMES.contains(&url.scheme()))
}

fn is_file(store: &dyn FileStore, path: &Path) -> bool {
    store.exists(path) && !store.is_dir(path)
}

/// Classify a suite reference
///
/// An existing non-directory file wins over URL syntax. The workspace is
/// checked first, then the execution node.
pub fn locate(
    reference: &str,
    workspace: &Workspace,
    node: &dyn FileStore,
) -> Result<SuiteReference> {
    let url = parse_url(reference);

    let in_workspace = workspace.child(reference);
    if is_file(workspace.store().as_ref(), &in_workspace) {
        return Ok(SuiteReference::LocalPath(in_workspace));
    }

    let on_node = PathBuf::from(reference);
    if is_file(node, &on_node) {
        return Ok(SuiteReference::LocalPath(on_node));
    }

    url.map(SuiteReference::RemoteUrl)
        .ok_or_else(|| Error::UnsupportedSuiteReference(reference.to_string()))
}

/// Temporary suite file in the workspace
///
/// The file is deleted exactly once: by [`cleanup`](Self::cleanup), or when
/// the guard is dropped on an early return.
pub struct StagedSuite {
    store: Arc<dyn FileStore>,
    path: PathBuf,
    released: bool,
}

impl StagedSuite {
    fn new(store: Arc<dyn FileStore>, path: PathBuf) -> Self {
        Self {
            store,
            path,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the staged file now
    pub fn cleanup(mut self) -> io::Result<()> {
        self.released = true;
        self.store.delete(&self.path)
    }
}

impl Drop for StagedSuite {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.store.delete(&self.path) {
            tracing::warn!(path = %self.path.display(), "Failed to delete staged suite: {}", e);
        }
    }
}

impl std::fmt::Debug for StagedSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedSuite")
            .field("path", &self.path)
            .field("released", &self.released)
            .finish()
    }
}

/// Download `url` into the workspace through a local staging file
pub async fn stage(
    url: &Url,
    workspace: &Workspace,
    staging_dir: &Path,
    sink: &dyn LogSink,
) -> Result<StagedSuite> {
    let store = Arc::clone(workspace.store());
    let remote = store
        .create_temp_file(workspace.root(), TEMP_PREFIX, TEMP_SUFFIX)
        .map_err(|e| Error::download_failed(url.as_str(), e))?;
    let staged = StagedSuite::new(store, remote);

    tokio::fs::create_dir_all(staging_dir)
        .await
        .map_err(|e| Error::download_failed(url.as_str(), e))?;
    let local = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(staging_dir)
        .map_err(|e| Error::download_failed(url.as_str(), e))?;

    sink.info("Try downloading suite file on master");
    sink.info(&format!("    from url : {}", url));
    sink.info(&format!("    to file  : {}", local.path().display()));
    download(url, local.path()).await?;
    sink.info("    ...");
    sink.info("    Succeed");

    sink.info("Try transfer suite file on slave");
    sink.info(&format!("    from file : {}", local.path().display()));
    sink.info(&format!("    to file   : {}", staged.path().display()));
    let (source, dest) = (local.path().to_path_buf(), staged.path().to_path_buf());
    let bytes = store::blocking(&staged.store, move |store| store.upload(&source, &dest))
        .await
        .map_err(|e| Error::download_failed(url.as_str(), e))?;
    sink.info("    ...");
    sink.info("    Succeed");
    tracing::debug!(bytes, path = %staged.path().display(), "Suite staged");

    local
        .close()
        .map_err(|e| Error::download_failed(url.as_str(), e))?;

    Ok(staged)
}

/// Fetch the bytes behind `url` into `dest`
pub async fn download(url: &Url, dest: &Path) -> Result<()> {
    match url.scheme() {
        "http" | "https" => download_http(url, dest).await,
        "file" => {
            let source = url
                .to_file_path()
                .map_err(|_| Error::download_failed(url.as_str(), "not a local file url"))?;
            tokio::fs::copy(&source, dest)
                .await
                .map_err(|e| Error::download_failed(url.as_str(), e))?;
            Ok(())
        }
        scheme => Err(Error::download_failed(
            url.as_str(),
            format!("unsupported scheme '{}'", scheme),
        )),
    }
}

async fn download_http(url: &Url, dest: &Path) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(url.clone())
        .header("User-Agent", "htmlsuite-runner")
        .send()
        .await
        .map_err(|e| Error::download_failed(url.as_str(), e))?;

    if !response.status().is_success() {
        return Err(Error::download_failed(
            url.as_str(),
            format!("server returned status {}", response.status()),
        ));
    }

    let total_size = response.content_length().unwrap_or(0);
    let pb = (total_size > 0).then(|| {
        let pb = ProgressBar::new(total_size);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("  [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb
    });

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| Error::download_failed(url.as_str(), e))?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::download_failed(url.as_str(), e))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::download_failed(url.as_str(), e))?;
        downloaded += chunk.len() as u64;
        if let Some(ref pb) = pb {
            pb.set_position(downloaded);
        }
    }
    file.flush()
        .await
        .map_err(|e| Error::download_failed(url.as_str(), e))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    Ok(())
}
