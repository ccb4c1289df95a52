use std::process::ExitCode;

use anyhow::Context as _;
use biosite::cli::{Cli, Command};
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    biosite::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        Command::Build(args) => {
            let context = format!("build site {} from {}", args.out, args.data);
            biosite::site::run(args).await.context(context)?;
        }
        Command::Render(args) => {
            let context = format!("render {}", args.input);
            biosite::convert::render(args).await.context(context)?;
        }
        Command::Sections(args) => {
            let context = format!("list sections of {}", args.input);
            biosite::convert::sections(args).await.context(context)?;
        }
        Command::Serve(args) => {
            let context = format!("serve {} on {}", args.site, args.addr);
            biosite::serve::run(args).await.context(context)?;
        }
    }

    Ok(())
}
