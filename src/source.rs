use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use url::Url;

/// Where referenced Markdown documents are read from.
#[async_trait]
pub trait MarkdownSource: Send + Sync {
    /// Fetch the Markdown text stored at `path`.
    async fn fetch(&self, path: &str) -> anyhow::Result<String>;
}

/// Reads documents relative to a content root on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, path: &str) -> anyhow::Result<PathBuf> {
        Ok(self.root.join(content_relative_path(path)?))
    }
}

#[async_trait]
impl MarkdownSource for FsSource {
    async fn fetch(&self, path: &str) -> anyhow::Result<String> {
        let resolved = self.resolve(path)?;
        tracing::debug!(path = %resolved.display(), "read markdown");
        tokio::fs::read_to_string(&resolved)
            .await
            .with_context(|| format!("read markdown: {}", resolved.display()))
    }
}

/// Fetches documents over HTTP, resolving relative paths against a base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base: Url) -> anyhow::Result<Self> {
        if base.scheme() != "http" && base.scheme() != "https" {
            anyhow::bail!("markdown base url scheme must be http/https: {base}");
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build markdown http client")?;
        Ok(Self { client, base })
    }
}

#[async_trait]
impl MarkdownSource for HttpSource {
    async fn fetch(&self, path: &str) -> anyhow::Result<String> {
        let url = self
            .base
            .join(path.trim())
            .with_context(|| format!("resolve markdown url: {path}"))?;
        tracing::debug!(%url, "fetch markdown");

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::USER_AGENT, "biosite/0.1")
            .header(reqwest::header::ACCEPT, "text/markdown,text/plain;q=0.9,*/*;q=0.8")
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("GET {url}: HTTP {status}");
        }

        response
            .text()
            .await
            .with_context(|| format!("read body: {url}"))
    }
}

/// Turn a link target into a path relative to the content root.
///
/// Query and fragment are dropped and leading `./` or `/` removed. Targets
/// with a URL scheme or `..` segments are rejected.
pub fn content_relative_path(path: &str) -> anyhow::Result<PathBuf> {
    let path = path.split(['#', '?']).next().unwrap_or_default().trim();
    if path.contains("://") {
        anyhow::bail!("not a content path: {path}");
    }

    let mut out = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(segment) => out.push(segment),
            Component::CurDir | Component::RootDir => {}
            Component::ParentDir => anyhow::bail!("content path must not contain '..': {path}"),
            Component::Prefix(_) => anyhow::bail!("content path must be relative: {path}"),
        }
    }

    if out.as_os_str().is_empty() {
        anyhow::bail!("content path is empty");
    }
    Ok(out)
}

/// [`content_relative_path`] joined with `/`, the key under which a linked
/// document is written into the site.
pub fn content_key(path: &str) -> anyhow::Result<String> {
    let rel = content_relative_path(path)?;
    Ok(rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}
