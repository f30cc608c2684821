mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "bizprofile")]
#[command(about = "Inspect business profile completion and save profile sections to the CRM")]
struct Cli {
    /// Output format: table, json, csv, markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the profile configuration, field mapping and save routes
    ValidateConfig(commands::validate_config::ValidateConfigArgs),
    /// List profile sections with field and mandatory counts
    Sections(commands::sections::SectionsArgs),
    /// Show completion per section for one profile
    Completion(commands::completion::CompletionArgs),
    /// List mandatory fields still missing for one profile
    Missing(commands::missing::MissingArgs),
    /// Validate and save one group of a section
    Save(Box<commands::save::SaveArgs>),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bizprofile=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output)?;

    match &cli.command {
        Commands::ValidateConfig(args) => commands::validate_config::run(args, &format)?,
        Commands::Sections(args) => commands::sections::run(args, &format)?,
        Commands::Completion(args) => commands::completion::run(args, &format).await?,
        Commands::Missing(args) => commands::missing::run(args, &format).await?,
        Commands::Save(args) => commands::save::run(args.as_ref(), &format).await?,
    }

    Ok(())
}
