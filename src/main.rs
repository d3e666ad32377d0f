//! qtumctl - Qtum contract script inspection tool
//!
//! Decodes contract output scripts and answers questions about the
//! gateway's response cache without talking to a node.

use qtum_eth_gateway::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
