use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "phimask")]
#[command(version, about = "Mask and unmask PHI in clinical transcripts")]
pub struct Cli {
    /// Pipeline config file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect and mask PHI, printing the masking result as JSON
    Mask {
        /// Transcript to mask; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,

        /// Mask entities scoring at or above this
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Restore masked text from its entity table
    Unmask {
        /// Entity array, or a full result from `mask`
        #[arg(long)]
        entities: PathBuf,

        /// Masked text; taken from the entities file or stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Mask a transcript and store it as an encrypted record
    Seal {
        #[arg(long)]
        record_id: String,

        /// Where to write the record JSON
        #[arg(long)]
        output: PathBuf,

        /// Transcript to seal; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,

        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Decrypt a sealed record and print the original transcript
    Open {
        #[arg(long)]
        record: PathBuf,
    },

    /// Print a new base64 master key
    Keygen,
}
