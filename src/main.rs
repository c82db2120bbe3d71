//! Schedule optimizer CLI entry point.

mod cli;

use clap::Parser;
use cli::{Cli, Command};
use polytile::pipeline::{compare_files, load_scop, optimize_file};
use polytile::{OptimizeResult, PipelineResult};

fn main() {
    let cli = Cli::parse();
    polytile::logging::init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> PipelineResult<()> {
    match command {
        Command::Optimize { file, args, stats } => {
            let result = optimize_file(&file, &args.to_options())?;
            print!("{}", result.schedule);
            if stats {
                print_stats(&result);
            }
        }
        Command::Show { file } => {
            print!("{}", load_scop(&file)?);
        }
        Command::Compare {
            original,
            candidate,
        } => {
            let profitable = compare_files(&original, &candidate)?;
            println!("{}", if profitable { "profitable" } else { "not profitable" });
        }
    }
    Ok(())
}

fn print_stats(result: &OptimizeResult) {
    println!();
    println!("tiled bands:         {}", result.stats.bands_tiled);
    println!("prevectorized bands: {}", result.stats.bands_prevectorized);
    println!("matmul kernels:      {}", result.stats.matmul_kernels);
    println!("accepted:            {}", result.accepted);
}
