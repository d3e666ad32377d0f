//! CLI implementation for qtumctl
//!
//! Offline helpers for inspecting Qtum contract scripts and the gateway's
//! caching rules. All commands output pretty JSON.

use crate::asm::{self, ScriptShape};
use crate::cache::is_cachable;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

/// Qtum script and gateway inspection tool
#[derive(Parser)]
#[command(name = "qtumctl")]
#[command(about = "Qtum contract script inspection tool")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode a contract call or create output script
    DecodeAsm {
        /// Script disassembly, e.g. "4 90d003 28 <data> <address> OP_CALL"
        asm: String,
    },
    /// Reverse the byte order of a hex string
    ReverseBytes {
        /// Hex without 0x prefix
        hex: String,
    },
    /// Check if a Qtum RPC method's responses are cached
    IsCachable {
        /// Qtum RPC method name, e.g. getblock
        method: String,
    },
}

/// Execute a command and return its JSON output.
pub fn execute(command: Commands) -> Result<Value> {
    let result = match command {
        Commands::DecodeAsm { asm: script } => {
            let tokens = asm::tokenize(&script);
            let shape = ScriptShape::detect(&tokens)?;
            let info = asm::decode(shape, &tokens)
                .with_context(|| format!("Failed to decode {} script", shape.name()))?;
            json!({
                "shape": shape.name(),
                "tokens": tokens.len(),
                "info": info,
            })
        }
        Commands::ReverseBytes { hex } => {
            let reversed = asm::reverse_byte_pairs(&hex)
                .with_context(|| format!("Invalid hex: {}", hex))?;
            json!({ "input": hex, "reversed": reversed })
        }
        Commands::IsCachable { method } => {
            let cachable = is_cachable(&method);
            json!({ "method": method, "cachable": cachable })
        }
    };
    Ok(result)
}

/// Run the CLI command and print JSON output.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let result = execute(cli.command)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
