use clap::{Args, Parser, Subcommand};

use crate::markdown::LinkMode;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Build(BuildArgs),
    Render(RenderArgs),
    Sections(SectionsArgs),
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Content root holding the JSON data files and Markdown documents.
    #[arg(long)]
    pub data: String,

    /// Output directory for the generated site.
    #[arg(long)]
    pub out: String,

    /// Site config (YAML).
    #[arg(long)]
    pub config: Option<String>,

    /// Link rendering policy (overrides config and environment).
    #[arg(long, value_enum)]
    pub link_mode: Option<LinkMode>,

    /// Fetch Markdown documents from this base URL instead of `--data`.
    #[arg(long)]
    pub markdown_base: Option<String>,

    /// Overwrite the output directory if it already exists.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Markdown file path or http/https URL.
    #[arg(long)]
    pub input: String,

    /// Output HTML file path (stdout when omitted).
    #[arg(long)]
    pub out: Option<String>,

    /// Link rendering policy.
    #[arg(long, value_enum, default_value_t = LinkMode::ModalAware)]
    pub link_mode: LinkMode,
}

#[derive(Debug, Args)]
pub struct SectionsArgs {
    /// Markdown file path or http/https URL.
    #[arg(long)]
    pub input: String,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Site directory produced by `build`.
    #[arg(long)]
    pub site: String,

    /// Content root used to render `/fragments/...` on demand.
    #[arg(long)]
    pub data: String,

    /// Listen address.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: String,

    /// Link rendering policy for fragments.
    #[arg(long, value_enum, default_value_t = LinkMode::ModalAware)]
    pub link_mode: LinkMode,
}
