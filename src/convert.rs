//! One-off conversion commands: `render` and `sections`.

use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;
use url::Url;

use crate::cli::{RenderArgs, SectionsArgs};
use crate::markdown;
use crate::sections;
use crate::source::{HttpSource, MarkdownSource};

pub async fn render(args: RenderArgs) -> anyhow::Result<()> {
    let text = read_input(&args.input).await?;
    let html = markdown::render(&text, args.link_mode);

    match args.out.as_deref() {
        Some(out) => {
            let out = Path::new(out);
            if let Some(parent) = out.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir: {}", parent.display()))?;
            }
            std::fs::write(out, format!("{html}\n"))
                .with_context(|| format!("write html: {}", out.display()))?;
            tracing::info!(input = %args.input, out = %out.display(), "rendered markdown");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{html}").context("write stdout")?;
        }
    }
    Ok(())
}

/// Print the outline of a document as JSON lines.
pub async fn sections(args: SectionsArgs) -> anyhow::Result<()> {
    let text = read_input(&args.input).await?;
    let outline = sections::outline(&sections::split(&text));

    let mut stdout = std::io::stdout().lock();
    for entry in &outline {
        let line = serde_json::to_string(entry).context("serialize nav entry")?;
        writeln!(stdout, "{line}").context("write stdout")?;
    }
    tracing::debug!(input = %args.input, sections = outline.len(), "listed sections");
    Ok(())
}

async fn read_input(input: &str) -> anyhow::Result<String> {
    if input.starts_with("http://") || input.starts_with("https://") {
        let url = Url::parse(input).with_context(|| format!("parse input url: {input}"))?;
        return HttpSource::new(url)?.fetch("").await;
    }
    tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("read markdown: {input}"))
}
