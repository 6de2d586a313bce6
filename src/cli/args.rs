use crate::core::models::ScanType;
use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "raccoon", version, about = "Recon orchestration over standard pentest tools")]
pub struct Cli {
    /// Verbose human output (prints raw tool output)
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Debug logs (implies verbose)
    #[arg(short = 'd', long = "debug", global = true, action = ArgAction::SetTrue)]
    pub debug: bool,

    /// Path to a raccoon.toml configuration file
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Validate and echo the target
    Target { target: String },

    /// Run a scan against a target
    Scan(ScanArgs),

    /// Run a batch of scans from a YAML file
    Schedule {
        /// YAML list of `{type, target, delay_secs, output_dir}` entries
        file: PathBuf,
    },

    /// Render a text report from a stored scan record
    Report {
        scan_id: String,

        /// Directory holding `scan_<id>.json`
        #[arg(short = 'o', long = "output", default_value = ".")]
        output: PathBuf,
    },

    /// Show configured tools and whether they are installed
    Tools,

    /// Print the default configuration file
    Config,
}

/// `scan <type> <target>` or `scan [-n|-l|-a] <target>`.
#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("shortcut").args(["normal", "light", "aggressive"])))]
pub struct ScanArgs {
    /// Normal scan
    #[arg(short = 'n', long = "normal", action = ArgAction::SetTrue)]
    pub normal: bool,

    /// Light (less aggressive) scan
    #[arg(short = 'l', long = "light", action = ArgAction::SetTrue)]
    pub light: bool,

    /// Aggressive scan
    #[arg(short = 'a', long = "aggressive", action = ArgAction::SetTrue)]
    pub aggressive: bool,

    /// Directory for per-tool output and the scan record
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Scan type, or the target when a shortcut flag is used
    #[arg(value_name = "TYPE|TARGET")]
    pub first: String,

    #[arg(value_name = "TARGET")]
    pub second: Option<String>,
}

impl ScanArgs {
    /// Resolve the positional/flag combination into a scan type and target.
    pub fn resolve(&self) -> Result<(ScanType, String), String> {
        let shortcut = self.shortcut();
        match (&self.second, shortcut) {
            (Some(_), Some(_)) => {
                Err("give either a scan type argument or a shortcut flag, not both".to_string())
            }
            (Some(target), None) => Ok((self.first.parse()?, target.clone())),
            (None, Some(scan_type)) => Ok((scan_type, self.first.clone())),
            (None, None) => Ok((ScanType::Normal, self.first.clone())),
        }
    }

    fn shortcut(&self) -> Option<ScanType> {
        if self.normal {
            Some(ScanType::Normal)
        } else if self.light {
            Some(ScanType::Light)
        } else if self.aggressive {
            Some(ScanType::Aggressive)
        } else {
            None
        }
    }
}
