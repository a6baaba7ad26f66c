use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "doc-qa")]
#[command(about = "Ask questions answered strictly from one uploaded document")]
pub struct CliConfig {
    /// Document to load (.txt, .md, .pdf or .docx)
    #[arg(long, short)]
    pub file: String,

    /// Question to ask; when omitted, questions are read from stdin one per line
    #[arg(long, short)]
    pub question: Option<String>,

    /// TOML settings file
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub api_base_url: Option<String>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long)]
    pub max_upload_bytes: Option<u64>,

    #[arg(long, help = "Print the extracted document text (truncated)")]
    pub show_text: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}
