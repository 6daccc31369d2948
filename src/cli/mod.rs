//! CLI module for the mockview command-line interface.
//!
//! Without a subcommand the binary starts the server. Subcommands:
//! - `generate` - Walk the interview wizard and request questions
//! - `config check` - Validate configuration file

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, Environment};
use crate::interview::{FormEvent, HttpGenerationClient, InterviewType, Level, Wizard};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "mockview")]
#[command(author, version, about = "Mock interview practice server", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "mockview.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Override the deployment environment from the config file
    #[arg(long, env = "MOCKVIEW_ENV", value_enum)]
    pub environment: Option<Environment>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate interview questions through the wizard
    Generate(GenerateArgs),

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Job role, e.g. "Frontend Developer"
    #[arg(long)]
    pub role: String,

    /// Interview type
    #[arg(long = "type", value_enum)]
    pub interview_type: InterviewType,

    /// Experience level
    #[arg(long, value_enum)]
    pub level: Level,

    /// Number of questions (clamped to 1..=20)
    #[arg(long, default_value = "5")]
    pub amount: i64,

    /// Comma-separated technologies
    #[arg(long)]
    pub techstack: String,

    /// User the interview is generated for
    #[arg(long)]
    pub user_id: String,

    /// Base URL of the generation service (overrides the config file)
    #[arg(long)]
    pub url: Option<String>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

/// Run a CLI command
pub async fn run_command(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Some(Commands::Generate(args)) => cmd_generate(config, args).await,
        Some(Commands::Config(ConfigCommands::Check)) => cmd_config_check(cli),
        None => {
            // No subcommand means start the server - this is handled in main.rs
            Ok(())
        }
    }
}

/// Fill in all three wizard steps from the arguments
fn fill_wizard(args: &GenerateArgs) -> Result<Wizard> {
    let mut wizard = Wizard::new(args.user_id.clone());

    wizard.dispatch(FormEvent::SetRole(args.role.clone()))?;
    wizard.dispatch(FormEvent::SetType(Some(args.interview_type)))?;
    wizard.dispatch(FormEvent::Next).context("Step 1 incomplete")?;

    wizard.dispatch(FormEvent::SetLevel(Some(args.level)))?;
    wizard.dispatch(FormEvent::SetAmount(args.amount))?;
    wizard.dispatch(FormEvent::Next).context("Step 2 incomplete")?;

    wizard.dispatch(FormEvent::SetTechstack(args.techstack.clone()))?;
    Ok(wizard)
}

async fn cmd_generate(config: &Config, args: &GenerateArgs) -> Result<()> {
    let mut generation = config.generation.clone();
    if let Some(url) = &args.url {
        generation.base_url = url.clone();
    }

    let client =
        HttpGenerationClient::new(&generation).context("Failed to create HTTP client")?;
    let mut wizard = fill_wizard(args)?;

    println!(
        "Generating {} {} questions for {}...",
        wizard.data().amount,
        args.role.trim(),
        client.endpoint()
    );

    wizard.submit(&client).await?;

    if wizard.is_success() {
        println!();
        println!("[OK] Interview generated successfully!");
        println!();
        println!("Your interview questions have been created.");
        return Ok(());
    }

    let message = wizard.error().unwrap_or("Failed to generate questions");
    anyhow::bail!("{}", message)
}

fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("A default configuration will be used when starting the server.");
        return Ok(());
    }

    match Config::load(config_path) {
        Ok(config) => {
            println!("[OK] Configuration file is valid!");
            println!();
            println!("=== Configuration Summary ===");
            println!();
            println!("Server:");
            println!("  Host:         {}", config.server.host);
            println!("  Port:         {}", config.server.port);
            println!("  Data Dir:     {}", config.server.data_dir.display());
            println!(
                "  Environment:  {}",
                if config.is_production() {
                    "Production (secure cookies)"
                } else {
                    "Development"
                }
            );
            println!();
            println!("Identity:");
            println!("  Project ID:   {}", config.identity.project_id);
            println!("  Token TTL:    {}s", config.identity.id_token_ttl_secs);
            println!();
            println!("Generation:");
            println!("  Base URL:     {}", config.generation.base_url);
            println!("  Timeout:      {}s", config.generation.timeout_secs);
            println!();
            Ok(())
        }
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::Step;

    fn generate_args(role: &str, techstack: &str, amount: i64) -> GenerateArgs {
        GenerateArgs {
            role: role.to_string(),
            interview_type: InterviewType::Technical,
            level: Level::Senior,
            amount,
            techstack: techstack.to_string(),
            user_id: "uid-7".to_string(),
            url: None,
        }
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::parse_from([
            "mockview",
            "generate",
            "--role",
            "Backend Engineer",
            "--type",
            "behavioral",
            "--level",
            "entry",
            "--techstack",
            "go,postgres",
            "--user-id",
            "abc",
        ]);
        let Some(Commands::Generate(args)) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.interview_type, InterviewType::Behavioral);
        assert_eq!(args.level, Level::Entry);
        assert_eq!(args.amount, 5);
        assert!(args.url.is_none());
    }

    #[test]
    fn test_fill_wizard_reaches_step_three() {
        let wizard = fill_wizard(&generate_args("SRE", "k8s", 40)).unwrap();
        assert_eq!(wizard.step(), Some(Step::TechStack));
        assert_eq!(wizard.data().amount, 20);
        assert!(wizard.can_submit());
    }

    #[test]
    fn test_fill_wizard_rejects_blank_role() {
        assert!(fill_wizard(&generate_args("   ", "k8s", 5)).is_err());
    }
}
