use clap::Parser;

use seamflow::cli::{Cli, Command};
use seamflow::error::Result;
use seamflow::observability::init_logging;

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => {
            let options = args.to_options()?;
            let summary = seamflow::pipeline::run(&options)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary.to_json())?);
            } else {
                println!("{summary}");
            }
            Ok(())
        }
    }
}
