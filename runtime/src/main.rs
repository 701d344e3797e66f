// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use brand_audit::cli::{self, audit_cmd::AuditArgs, output, ConfigArgs};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "brand-audit",
    about = "Brand-style compliance auditor for web pages",
    version,
    after_help = "Run 'brand-audit <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit pages against a brand guideline
    Audit(AuditArgs),
    /// List same-domain links found on a page
    Discover {
        /// Page to scan
        url: String,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Capture PNG snapshots of page elements
    Capture {
        /// Page to load
        url: String,
        /// CSS selector to capture. Can be repeated.
        #[arg(long = "selector", short = 's')]
        selectors: Vec<String>,
        /// Directory for the PNG files
        #[arg(long, default_value = "screenshots")]
        out_dir: PathBuf,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Serve the HTTP API
    Serve {
        /// Port to listen on (127.0.0.1)
        #[arg(long, default_value = "7700")]
        port: u16,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Check environment and diagnose issues
    Doctor {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

fn init_tracing(verbose: bool, quiet: bool, serving: bool, log_json: bool) {
    let default = if verbose {
        "brand_audit=debug"
    } else if quiet {
        "brand_audit=error"
    } else if serving {
        "brand_audit=info"
    } else {
        "brand_audit=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global flags via environment variables so all modules can check them
    if cli.json {
        std::env::set_var(output::JSON_VAR, "1");
    }
    if cli.quiet {
        std::env::set_var(output::QUIET_VAR, "1");
    }
    let serving = matches!(cli.command, Commands::Serve { .. });
    init_tracing(cli.verbose, cli.quiet, serving, cli.log_json);

    let result = match cli.command {
        Commands::Audit(args) => cli::audit_cmd::run(args).await,
        Commands::Discover { url, config } => cli::discover_cmd::run(&url, &config).await,
        Commands::Capture {
            url,
            selectors,
            out_dir,
            config,
        } => cli::capture_cmd::run(&url, &selectors, &out_dir, &config).await,
        Commands::Serve { port, config } => cli::serve_cmd::run(port, &config).await,
        Commands::Doctor { config } => cli::doctor::run(&config).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "brand-audit", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if !output::is_quiet() && !output::is_json() {
            eprintln!("  Error: {e:#}");
        }
        if output::is_json() {
            output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        }
        std::process::exit(1);
    }

    result
}
