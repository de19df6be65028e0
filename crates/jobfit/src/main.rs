mod cli;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Match {
            resume,
            jobs,
            templates,
            method,
        } => cli::matching::run_match(config, &resume, &jobs, &templates, method.into()).await,
        Commands::Rank {
            resumes,
            job,
            template,
            method,
        } => {
            cli::matching::run_rank(
                config,
                &resumes,
                job.as_deref(),
                template.as_deref(),
                method.into(),
            )
            .await
        }
        Commands::Entities { resume } => cli::entities::run(config, &resume),
        Commands::Templates => cli::templates::run(&config),
    }
}
