use std::io;
use std::process;

use anyhow::Result;
use clap::Parser;

use release_tool::cli::{open_repositories, run_bump, BumpArgs};
use release_tool::config;
use release_tool::domain::BumpKind;
use release_tool::git::Git2Repository;
use release_tool::github::{resolve_token, GitHubReleases};
use release_tool::ui;

#[derive(clap::Parser)]
#[command(
    name = "release-tool",
    version,
    about = "Bump a repository's version and every repository that depends on it"
)]
struct Args {
    /// Name of the configured repository to bump
    name: String,

    /// major, minor, patch, release or candidate
    #[arg(default_value = "candidate")]
    part: BumpKind,

    #[arg(long, help = "Only bump the named repository, not its dependents")]
    no_deps: bool,

    #[arg(long, help = "Preview what would happen without making changes")]
    dry_run: bool,

    #[arg(short, long, help = "Skip confirmation prompts")]
    yes: bool,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(long, default_value = "origin", help = "Git remote to push to")]
    remote: String,

    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        help = "Set log level (error, warn, info, debug, trace)"
    )]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .format_timestamp(None)
        .init();

    let config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            process::exit(1);
        }
    };

    let handles = open_repositories(&config, |dir| Git2Repository::open(dir))?;

    let bump = BumpArgs {
        name: args.name,
        kind: args.part,
        propagate: !args.no_deps,
        dry_run: args.dry_run,
        assume_yes: args.yes,
        remote: args.remote,
    };

    let stdin = io::stdin();
    let mut input = stdin.lock();
    if let Err(e) = run_bump(
        &bump,
        &config,
        &handles,
        || resolve_token().map(GitHubReleases::new),
        &mut input,
    ) {
        ui::display_error(&format!("{:#}", e));
        process::exit(1);
    }
    Ok(())
}
