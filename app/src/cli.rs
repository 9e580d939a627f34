//! Command-line argument parsing.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

/// CLI arguments for aether
#[derive(Parser, Debug, Clone)]
#[command(name = "aether", version, about = "Talk to the local Brain prompt service")]
pub struct CliArgs {
    /// Brain base URL; overrides the persisted endpoint
    #[arg(long, global = true, value_name = "URL", env = "AETHER_BRAIN_URL")]
    pub brain_url: Option<String>,
    /// Config file (default: <config dir>/aether/config.json)
    #[arg(long, global = true, value_name = "PATH", env = "AETHER_CONFIG")]
    pub config: Option<PathBuf>,
    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Check that the Brain answers, rediscovering it on a nearby port if needed
    Health,
    /// Poll the Brain and print every online/offline change until Ctrl-C
    Watch {
        /// Seconds between checks (default: persisted setting)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
    },
    /// Generate a prompt from a vibe. Ctrl-C cancels the request.
    Generate {
        /// What to build (string or @path/to/file)
        #[arg(value_name = "VIBE_OR_@FILE")]
        vibe: String,
        /// Target agent family (claude, gpt, gpt-codex, gemini, grok, auto)
        #[arg(long, default_value = "auto")]
        agent: String,
        /// Workspace the Brain scans for context (default: current directory)
        #[arg(long, value_name = "DIR")]
        workspace: Option<PathBuf>,
    },
    /// List agent families
    Agents,
    /// List installed models and the current one
    Models,
    /// Switch the Brain to another installed model
    Select { model: String },
    /// List downloadable models
    Catalog,
    /// Download a model, showing progress
    Pull { model: String },
    /// Score an existing prompt
    Score {
        /// Prompt text (string or @path/to/file)
        #[arg(value_name = "PROMPT_OR_@FILE")]
        prompt: String,
    },
    /// Build a prompt from templates without the language model
    Optimize {
        /// What to build (string or @path/to/file)
        #[arg(value_name = "VIBE_OR_@FILE")]
        vibe: String,
        #[arg(long, default_value = "auto")]
        family: String,
        #[arg(long, default_value = "")]
        tech_stack: String,
        #[arg(long, default_value = "")]
        language: String,
    },
    /// Summarize the Brain's prompt pattern knowledge base
    Knowledge {
        /// Show full patterns and enhancement rules for one category
        category: Option<String>,
    },
}

/// Read a value that may be provided inline or via @path
pub fn read_value_or_file(raw: &str) -> Result<String, String> {
    if let Some(path) = raw.strip_prefix('@') {
        let contents = fs::read_to_string(Path::new(path))
            .map_err(|e| format!("Failed to read {}: {}", path, e))?;
        Ok(contents.trim_end().to_string())
    } else {
        Ok(raw.to_string())
    }
}
