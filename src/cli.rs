use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the upload/download web server
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check that ffmpeg and ffprobe can be executed
    Check,

    /// Write the effective configuration to a TOML file
    InitConfig {
        /// Destination file
        #[arg(short, long, default_value = "reelpress.toml")]
        output: PathBuf,
    },

    /// Run the processing pipeline on a local file
    Process {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,

        /// Crop to portrait and burn in the caption (video only)
        #[arg(long)]
        overlay: bool,

        /// Title tag
        #[arg(long)]
        title: Option<String>,

        /// Artist tag
        #[arg(long)]
        artist: Option<String>,

        /// Album tag
        #[arg(long)]
        album: Option<String>,

        /// Genre tag
        #[arg(long)]
        genre: Option<String>,

        /// Year tag
        #[arg(long)]
        year: Option<String>,

        /// Comment tag
        #[arg(long)]
        comment: Option<String>,

        /// Copyright tag
        #[arg(long)]
        copyright: Option<String>,
    },
}
