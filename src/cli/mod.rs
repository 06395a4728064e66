use clap::Parser;
use std::io::{self, BufRead};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Source directory holding the extracted archives (expects `saves/`
    /// and `extdata/` subdirectories).
    pub source: PathBuf,

    /// Destination directory that receives the emulator SD layout.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Override the save-archive directory. [default: <SOURCE>/saves]
    #[arg(long)]
    pub saves: Option<PathBuf>,

    /// Override the extra-data directory. [default: <SOURCE>/extdata]
    #[arg(long)]
    pub extdata: Option<PathBuf>,

    /// Skip the interactive confirmation gates.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl Args {
    pub fn saves_dir(&self) -> PathBuf {
        self.saves
            .clone()
            .unwrap_or_else(|| self.source.join("saves"))
    }

    pub fn extdata_dir(&self) -> PathBuf {
        self.extdata
            .clone()
            .unwrap_or_else(|| self.source.join("extdata"))
    }
}

/// Parses command-line arguments.
pub fn run() -> Args {
    Args::parse()
}

/// Blocks until the user acknowledges with a key press. The gate is the
/// only interaction point; everything between two gates runs unattended.
pub fn pause(message: &str) {
    println!("{}", message);
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}
