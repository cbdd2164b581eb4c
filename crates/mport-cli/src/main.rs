//! mport - a Unix binary package manager.

use clap::{CommandFactory, Parser};
use mport_cli::{Cli, CliError, ConfigCommands, Context, MirrorCommands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    // Strip a trailing '#' comment so copy-pasted commands with shell
    // comments still parse.
    let args: Vec<String> = std::env::args().take_while(|arg| !arg.starts_with('#')).collect();
    let cli = Cli::parse_from(args);

    let code = run(cli).await;
    std::process::exit(code);
}

async fn run(cli: Cli) -> i32 {
    let assume_yes = std::env::var("ASSUME_ALWAYS_YES").is_ok() || std::env::var("MAGUS").is_ok();
    let ctx = Context::new(&cli, assume_yes);
    let verbose = cli.verbose;

    let result = dispatch(&cli, &ctx).await;
    match result {
        Ok(()) => 0,
        Err(e) => {
            let code = e.exit_code();
            if verbose {
                eprintln!("mport: {e:?}");
            } else {
                eprintln!("mport: {e}");
            }
            code
        }
    }
}

async fn dispatch(cli: &Cli, ctx: &Context) -> Result<(), CliError> {
    use mport_cli::Commands;

    match &cli.command {
        Commands::Add { files, automatic } => mport_cli::cmd::add::run(ctx, files, *automatic, cli.force).await,
        Commands::Install { packages, automatic } => {
            mport_cli::cmd::install::run(ctx, packages, *automatic, cli.force).await
        }
        Commands::Delete { packages } => mport_cli::cmd::delete::run(ctx, packages, cli.force).await,
        Commands::Update { packages } => mport_cli::cmd::update::run(ctx, packages).await,
        Commands::Upgrade { packages } => mport_cli::cmd::upgrade::run(ctx, packages).await,
        Commands::Autoremove => mport_cli::cmd::autoremove::run(ctx).await,
        Commands::Audit { recursive, package } => mport_cli::cmd::audit::run(ctx, *recursive, package.clone()).await,
        Commands::Verify { recompute, packages } => mport_cli::cmd::verify::run(ctx, *recompute, packages).await,
        Commands::Lock { package } => mport_cli::cmd::lock::lock(ctx, package).await,
        Commands::Unlock { package } => mport_cli::cmd::lock::unlock(ctx, package).await,
        Commands::Locks => mport_cli::cmd::lock::locks(ctx).await,
        Commands::List { mode } => mport_cli::cmd::list::run(ctx, *mode).await,
        Commands::Info { package } => mport_cli::cmd::info::run(ctx, package).await,
        Commands::Search { query } => mport_cli::cmd::search::run(ctx, query).await,
        Commands::Index => mport_cli::cmd::index::run(ctx).await,
        Commands::Mirror { command } => match command {
            MirrorCommands::List => mport_cli::cmd::mirror::list(ctx).await,
            MirrorCommands::Select => mport_cli::cmd::mirror::select(ctx).await,
        },
        Commands::Config { command } => match command {
            ConfigCommands::List => mport_cli::cmd::config::list(ctx).await,
            ConfigCommands::Get { key } => mport_cli::cmd::config::get(ctx, key).await,
            ConfigCommands::Set { key, value } => mport_cli::cmd::config::set(ctx, key, value).await,
        },
        Commands::Cpe { package } => mport_cli::cmd::identifiers::cpe(ctx, package.clone()).await,
        Commands::Purl { package } => mport_cli::cmd::identifiers::purl(ctx, package.clone()).await,
        Commands::Version { test, v1, v2 } => {
            mport_cli::cmd::version::run(*test, v1, v2);
            Ok(())
        }
        Commands::Which { quiet, origin, path } => mport_cli::cmd::which::run(ctx, path, *quiet, *origin).await,
        Commands::Import { file } => mport_cli::cmd::importexport::import(ctx, file).await,
        Commands::Export { file } => mport_cli::cmd::importexport::export(ctx, file).await,
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "mport", &mut std::io::stdout());
            Ok(())
        }
    }
}
