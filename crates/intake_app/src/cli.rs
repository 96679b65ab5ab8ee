//! Command line surface of the `intake` binary.
//!
//! ```bash
//! intake resume -f cv.pdf -F fullName="Ada Lovelace" -F email=ada@example.com ...
//! intake job-post -F companyName=Acme -F jobTitle="Rust engineer" ...
//! intake contact -F name=Ada -F email=ada@example.com -F message="Hello there, team"
//! intake init-config --force
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use intake_core::FormKind;
use intake_logging::DEFAULT_LOG_FILE;

use crate::config::DEFAULT_CONFIG_FILE;

#[derive(Debug, Parser)]
#[command(name = "intake")]
#[command(about = "Fill in and submit talent intake forms", long_about = None)]
pub struct Cli {
    /// Configuration file (RON)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Also write the log to a file (`./intake.log` when no path is given)
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_LOG_FILE)]
    pub log_file: Option<PathBuf>,

    /// Log debug output regardless of the configured level
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a resume and apply
    Resume(FormArgs),

    /// Publish a job opening
    JobPost(FormArgs),

    /// Send a message to the team
    Contact(FormArgs),

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Command {
    /// The form a subcommand drives, if any.
    pub fn form(&self) -> Option<(FormKind, &FormArgs)> {
        match self {
            Command::Resume(args) => Some((FormKind::Resume, args)),
            Command::JobPost(args) => Some((FormKind::JobPost, args)),
            Command::Contact(args) => Some((FormKind::Contact, args)),
            Command::InitConfig { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct FormArgs {
    /// Document to upload
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// MIME type of the document (guessed from the extension if omitted)
    #[arg(long)]
    pub mime: Option<String>,

    /// Form field as name=value; may be repeated
    #[arg(short = 'F', long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// How many times to retry a failed upload
    #[arg(long, default_value = "0")]
    pub retries: u32,

    /// Exit right after the submission is accepted
    #[arg(long)]
    pub no_wait: bool,
}

pub fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("field name missing in `{raw}`"));
    }
    Ok((name.to_string(), value.to_string()))
}
