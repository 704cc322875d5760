use anyhow::Result;
use clap::Parser;

use config_rocket::cli::{Cli, Command};
use config_rocket::commands;
use config_rocket::logging::{Logger, init_subscriber};

const fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Unpack(_) => "unpack",
        Command::Assemble(_) => "assemble",
        Command::Bundle(_) => "bundle",
        Command::Hash(_) => "hash",
        Command::Inspect(_) => "inspect",
        Command::Zip(_) => "zip",
        Command::Completions(_) => "completions",
        Command::Version => "version",
    }
}

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    let name = command_name(&args.command);
    init_subscriber(args.verbose, name);
    let log = Logger::new(name);

    match &args.command {
        Command::Unpack(opts) => commands::unpack::run(&args.global, opts, &log),
        Command::Assemble(opts) => commands::assemble::run(&args.global, opts, &log),
        Command::Bundle(opts) => commands::bundle::run(&args.global, opts, &log),
        Command::Hash(opts) => commands::hash::run(opts),
        Command::Inspect(opts) => commands::inspect::run(opts, &log),
        Command::Zip(opts) => commands::zip::run(&args.global, opts, &log),
        Command::Completions(opts) => {
            commands::completions::run(opts);
            Ok(())
        }
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
