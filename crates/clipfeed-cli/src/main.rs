use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clipfeed_cli::cli::{execute, CliCommand, CliConfig, Credentials};
use clipfeed_core::tracing_setup::init_tracing_with_default;

#[derive(Parser)]
#[command(name = "clipfeed")]
#[command(about = "Browse and edit a clip feed backed by a JSON fixture")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, short)]
    pretty: bool,

    /// Path to JSON config file (fixture, credentials, feed settings)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Fixture file; overrides the config file's
    #[arg(long, short = 'f')]
    fixture: Option<PathBuf>,

    /// Sign in as this email instead of the fixture's session
    #[arg(long, requires = "password")]
    email: Option<String>,

    #[arg(long, requires = "email")]
    password: Option<String>,

    /// Write mutations back to the fixture file
    #[arg(long, short = 'w')]
    write: bool,

    /// Log more (repeat for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Home feed, newest first
    Home {
        /// Number of pages to load
        #[arg(long, short = 'n', default_value_t = 1)]
        pages: usize,
    },

    /// Posts created by the signed-in user
    Profile,

    /// Posts bookmarked by the signed-in user
    Saved {
        /// Filter titles; `+` separates terms that must all match
        query: Option<String>,
    },

    /// Newest posts for the trending strip
    Latest,

    /// Search all post titles
    Search { query: String },

    /// Toggle the like on a post
    Like { post_id: String },

    /// Toggle the bookmark on a post
    Save { post_id: String },

    /// Delete a post
    Delete { post_id: String },

    /// Upload a new post
    Create {
        #[arg(long, short = 't')]
        title: String,
        /// AI prompt the video was made with
        #[arg(long, short = 'p')]
        prompt: String,
        /// Thumbnail image path or URI
        #[arg(long)]
        thumbnail: String,
        /// Video path or URI
        #[arg(long)]
        video: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing_with_default(match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    });

    let config = load_config(&cli);

    let command = match cli.command {
        Some(Commands::Home { pages }) => CliCommand::Home { pages },
        Some(Commands::Profile) => CliCommand::Profile,
        Some(Commands::Saved { query }) => CliCommand::Saved { query },
        Some(Commands::Latest) => CliCommand::Latest,
        Some(Commands::Search { query }) => CliCommand::Search { query },
        Some(Commands::Like { post_id }) => CliCommand::Like { post_id },
        Some(Commands::Save { post_id }) => CliCommand::Save { post_id },
        Some(Commands::Delete { post_id }) => CliCommand::Delete { post_id },
        Some(Commands::Create {
            title,
            prompt,
            thumbnail,
            video,
        }) => CliCommand::Create {
            title,
            prompt,
            thumbnail,
            video,
        },
        None => {
            eprintln!("No command specified. Use --help for usage.");
            std::process::exit(1);
        }
    };

    let output = match execute(command, &config, cli.write).await {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    };
    match rendered {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Config file first, then command-line overrides
fn load_config(cli: &Cli) -> CliConfig {
    let mut config = match cli.config {
        Some(ref path) => match CliConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        },
        None => CliConfig::default(),
    };

    if let Some(ref fixture) = cli.fixture {
        config.fixture = Some(fixture.clone());
    }
    if let (Some(email), Some(password)) = (&cli.email, &cli.password) {
        config.credentials = Some(Credentials {
            email: email.clone(),
            password: password.clone(),
        });
    }
    config
}
