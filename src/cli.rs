use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "applyform", version, about = "Application form in a modal dialog")]
pub struct Args {
    /// Read the config from this file instead of the default location
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Theme name (e.g., "Catppuccin Latte")
    #[arg(short, long)]
    pub theme: Option<String>,

    /// Open the form right away
    #[arg(short, long)]
    pub open: bool,

    /// Print submitted records as JSON lines on exit
    #[arg(long)]
    pub json: bool,
}
