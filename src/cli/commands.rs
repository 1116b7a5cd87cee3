//! CLI command implementations.
//!
//! Every command returns its rendered output; `main` prints it. Commands
//! that talk to the model build a Tokio runtime and block on the workflow.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::debug;

use crate::agent::config::Settings;
use crate::agent::prompt::PromptSet;
use crate::cli::output::{
    OutputFormat, format_classification, format_intents, format_outcome, to_json,
};
#[cfg(feature = "mcp")]
use crate::cli::parser::McpCommands;
use crate::cli::parser::{Cli, Commands};
use crate::error::{CommandError, Result};
use crate::workflow::{AppContext, GraphState, Workflow};

/// Executes the CLI command.
///
/// # Errors
///
/// Returns an error if configuration is incomplete, the input is invalid,
/// or the workflow fails.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Ask {
            message,
            session_id,
        } => cmd_ask(cli, message.as_deref(), session_id.as_deref(), format),
        Commands::Classify { message } => cmd_classify(cli, message, format),
        Commands::Intents => format_intents(format),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
        #[cfg(feature = "mcp")]
        Commands::Mcp(cmd) => cmd_mcp(cli, cmd),
    }
}

/// Resolves settings (CLI flags, then environment) and builds the context.
fn load_context(cli: &Cli) -> Result<AppContext> {
    let mut builder = Settings::builder();
    if let Some(ref dir) = cli.prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    let settings = builder.from_env().build()?;
    debug!(?settings, "settings resolved");
    AppContext::from_settings(settings)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
    })
}

/// Returns the message argument, or one line from stdin.
fn read_message(message: Option<&str>) -> Result<String> {
    let text = match message {
        Some(m) => m.to_string(),
        None => {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line
        }
    };
    let text = text.trim();
    if text.is_empty() {
        return Err(CommandError::InvalidInput("message is empty".to_string()).into());
    }
    Ok(text.to_string())
}

fn cmd_ask(
    cli: &Cli,
    message: Option<&str>,
    session_id: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    let message = read_message(message)?;
    let ctx = load_context(cli)?;
    let workflow = Workflow::new(&ctx);

    let session_id = session_id.map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);
    let state = GraphState::new(&message).with_session_id(session_id);

    let outcome = runtime()?.block_on(workflow.invoke(state))?;
    format_outcome(&outcome, format)
}

fn cmd_classify(cli: &Cli, message: &str, format: OutputFormat) -> Result<String> {
    let message = read_message(Some(message))?;
    let ctx = load_context(cli)?;
    let workflow = Workflow::new(&ctx);

    let state = runtime()?.block_on(workflow.classify(GraphState::new(&message)))?;
    format_classification(&state, format)
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                return Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ));
            }
            let mut output = format!(
                "Wrote {} prompt template(s) to: {}\n",
                written.len(),
                target_dir.display()
            );
            for path in &written {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("unknown");
                output.push_str("  ");
                output.push_str(name);
                output.push('\n');
            }
            output.push_str("\nEdit these files to customize the router prompts.\n");
            Ok(output)
        }
        OutputFormat::Json => to_json(&json!({
            "directory": target_dir.to_string_lossy(),
            "written": written
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect::<Vec<_>>(),
            "count": written.len(),
        })),
    }
}

#[cfg(feature = "mcp")]
fn cmd_mcp(cli: &Cli, cmd: &McpCommands) -> Result<String> {
    use std::sync::Arc;

    use crate::cli::parser::Transport;
    use crate::mcp::{RouterMcpServer, serve_sse, serve_stdio};

    let ctx = Arc::new(load_context(cli)?);
    let server = RouterMcpServer::new(ctx);

    let McpCommands::Serve {
        transport,
        host,
        port,
    } = cmd;

    runtime()?
        .block_on(async {
            match transport {
                Transport::Stdio => serve_stdio(server).await,
                Transport::Sse => serve_sse(server, host, *port).await,
            }
        })
        .map_err(|e| CommandError::ExecutionFailed(format!("MCP server error: {e}")))?;

    Ok(String::new())
}
