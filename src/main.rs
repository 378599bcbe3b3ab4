//! `run_unittest` - run emulator ROM unit tests from a JSON manifest

use clap::Parser;
use rom_unittest::commands::Args;
use rom_unittest::{cli, common::logging};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    logging::init_cli(args.verbose);
    cli::init_color();

    match cli::dispatch(args).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
