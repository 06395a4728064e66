//! Main entry point for the savedump CLI app

use savedump::cli;
use savedump::export::Exporter;
use savedump::vfs::host::{HostCatalog, HostDriver};

fn main() -> std::process::ExitCode {
    if let Err(e) = run_app() {
        eprintln!("Error: {}", e);
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

fn run_app() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::run();

    let driver = HostDriver::new(
        args.saves_dir(),
        args.extdata_dir(),
        args.output.clone(),
    );
    let catalog = HostCatalog::new(args.saves_dir(), args.extdata_dir());
    let exporter = Exporter::new(&driver, &catalog);

    if !args.yes {
        cli::pause("Press Enter to start...");
    }

    match exporter.run() {
        Ok(report) => {
            println!(
                "All done! {} container(s) exported, {} skipped.",
                report.exported(),
                report.skipped()
            );
            if !report.clean() {
                println!("Some entries were skipped; check the log above.");
            }
            if !args.yes {
                cli::pause("Press Enter to exit...");
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", err);
            if !args.yes {
                cli::pause("Press Enter to exit...");
            }
            Err(err.into())
        }
    }
}
