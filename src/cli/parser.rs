//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// intent-router: route a message to the right LLM agent.
///
/// Classifies the message's intent, runs the matching domain agent
/// (document retrieval, tool calls, one model call) and prints the
/// synthesized reply.
#[derive(Parser, Debug)]
#[command(name = "intent-router")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose (debug) logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Directory containing prompt template files.
    ///
    /// Overrides `ROUTER_PROMPT_DIR`; missing files use built-in defaults.
    #[arg(long, global = true)]
    pub prompt_dir: Option<PathBuf>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Route one message through the full workflow and print the reply.
    #[command(after_help = r#"Examples:
  intent-router ask "Find the onboarding guide"
  echo "hello" | intent-router ask
  intent-router --format json ask "Summarize the release notes" --session-id s-42
"#)]
    Ask {
        /// Message to route. Read from stdin when omitted.
        message: Option<String>,

        /// Session id recorded in request metadata (random when omitted).
        #[arg(short, long)]
        session_id: Option<String>,
    },

    /// Classify a message without running a handler.
    #[command(after_help = r#"Examples:
  intent-router classify "Summarize this article"
  intent-router --format json classify "hello"
"#)]
    Classify {
        /// Message to classify.
        message: String,
    },

    /// List every intent and the handler it routes to.
    Intents,

    /// Write the default prompt templates to a directory.
    ///
    /// Existing files are left untouched.
    #[command(after_help = r#"Examples:
  intent-router init-prompts                      # ~/.config/intent-router/prompts
  intent-router init-prompts --dir ./prompts
"#)]
    InitPrompts {
        /// Target directory (defaults to ~/.config/intent-router/prompts).
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// MCP (Model Context Protocol) server.
    #[cfg(feature = "mcp")]
    #[command(subcommand)]
    Mcp(McpCommands),
}

/// Transport used by the MCP server.
#[cfg(feature = "mcp")]
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    /// JSON-RPC over stdin/stdout.
    Stdio,
    /// Streamable HTTP.
    Sse,
}

/// MCP subcommands.
#[cfg(feature = "mcp")]
#[derive(Subcommand, Debug)]
pub enum McpCommands {
    /// Start the MCP server exposing the `route` and `classify` tools.
    #[command(after_help = r#"Examples:
  intent-router mcp serve                                 # stdio
  intent-router mcp serve --transport sse --port 8080     # HTTP on 127.0.0.1:8080
"#)]
    Serve {
        /// Transport to serve on.
        #[arg(long, value_enum, default_value = "stdio")]
        transport: Transport,

        /// Host to bind to (sse only).
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to (sse only).
        #[arg(long, default_value = "3000")]
        port: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_session() {
        let cli = Cli::try_parse_from(["intent-router", "ask", "hello", "--session-id", "s-1"])
            .unwrap_or_else(|_| unreachable!());
        let Commands::Ask {
            message,
            session_id,
        } = cli.command
        else {
            unreachable!()
        };
        assert_eq!(message.as_deref(), Some("hello"));
        assert_eq!(session_id.as_deref(), Some("s-1"));
        assert_eq!(cli.format, "text");
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["intent-router", "intents", "--format", "json", "-v"])
            .unwrap_or_else(|_| unreachable!());
        assert!(cli.verbose);
        assert_eq!(cli.format, "json");
    }

    #[test]
    fn test_classify_requires_message() {
        assert!(Cli::try_parse_from(["intent-router", "classify"]).is_err());
    }
}
