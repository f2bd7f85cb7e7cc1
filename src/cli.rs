use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "contract-pulse",
    version,
    about = "Contract popularity classifier and feedback dialog host"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Override bind address, e.g. 0.0.0.0:8080
        #[arg(long)]
        addr: Option<String>,
    },
    /// Classify one contract and print the dialog as JSON
    Inspect {
        /// Contract to inspect (defaults to PULSE_CONTRACT_ADDRESS)
        #[arg(long)]
        address: Option<String>,
        /// Classify as of this block instead of the chain head
        #[arg(long)]
        block: Option<u64>,
    },
}
