//! Prompt templates for every node.
//!
//! Templates use `{name}` placeholders filled by [`render`]. Each template
//! can be overridden by a file in the prompt directory; missing files fall
//! back to the compiled-in defaults below.

use std::path::{Path, PathBuf};

use crate::workflow::Intent;

/// Fixed reply when the request failed before a handler could answer.
pub const ERROR_MESSAGE: &str =
    "Sorry, something went wrong while processing your request. Please try again later.";

/// Fixed reply when there is nothing to build a final answer from.
pub const FALLBACK_MESSAGE: &str = "Sorry, I can't handle that request.";

/// Classifier system prompt. `{intents}` lists every label.
pub const CLASSIFIER_SYSTEM_PROMPT: &str = "\
You are an intent classifier for user requests.
Return the single best matching intent from the list below. Only ever return a value from the list.

Available intents: {intents}

If no intent fits, return UNKNOWN.
";

/// Classifier user prompt.
pub const CLASSIFIER_USER_PROMPT: &str = "\
User input: {user_input}

Return exactly one intent for the input above (the intent value only, no other text).";

/// System prompt for the `INTENT_A` domain agent.
pub const AGENT_A_SYSTEM_PROMPT: &str = "\
You are the domain agent for INTENT_A.
Use the given context and tool results to produce an accurate, useful answer.

Context:
{context}
";

/// System prompt for the `INTENT_B` domain agent.
pub const AGENT_B_SYSTEM_PROMPT: &str = "\
You are the domain agent for INTENT_B.
Use the given context and tool results to produce an accurate, useful answer.

Context:
{context}
";

/// User prompt shared by the domain agents.
pub const AGENT_USER_PROMPT: &str = "\
User request: {user_input}

Answer the request above.";

/// System prompt for general questions that matched no intent.
pub const FALLBACK_SYSTEM_PROMPT: &str = "\
You are a helpful assistant. The request did not match any specialised domain.
Answer it directly and concisely.

Context:
{context}
";

/// User prompt for the fallback handler.
pub const FALLBACK_USER_PROMPT: &str = "{user_input}";

/// Final response system prompt.
pub const FINAL_SYSTEM_PROMPT: &str = "\
You write the final response delivered to the user.
Base it on the agent result and reference context below.

Agent result:
{agent_output}

Reference context:
{context}
";

/// Final response user prompt.
pub const FINAL_USER_PROMPT: &str =
    "Using the information above, write the final response for the user.";

/// Default prompt directory under the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/intent-router/prompts";

const CLASSIFIER_SYSTEM_FILENAME: &str = "classifier_system.md";
const CLASSIFIER_USER_FILENAME: &str = "classifier_user.md";
const AGENT_A_SYSTEM_FILENAME: &str = "agent_a_system.md";
const AGENT_B_SYSTEM_FILENAME: &str = "agent_b_system.md";
const AGENT_USER_FILENAME: &str = "agent_user.md";
const FALLBACK_SYSTEM_FILENAME: &str = "fallback_system.md";
const FALLBACK_USER_FILENAME: &str = "fallback_user.md";
const FINAL_SYSTEM_FILENAME: &str = "final_system.md";
const FINAL_USER_FILENAME: &str = "final_user.md";

/// Every template file with its default content.
const TEMPLATES: [(&str, &str); 9] = [
    (CLASSIFIER_SYSTEM_FILENAME, CLASSIFIER_SYSTEM_PROMPT),
    (CLASSIFIER_USER_FILENAME, CLASSIFIER_USER_PROMPT),
    (AGENT_A_SYSTEM_FILENAME, AGENT_A_SYSTEM_PROMPT),
    (AGENT_B_SYSTEM_FILENAME, AGENT_B_SYSTEM_PROMPT),
    (AGENT_USER_FILENAME, AGENT_USER_PROMPT),
    (FALLBACK_SYSTEM_FILENAME, FALLBACK_SYSTEM_PROMPT),
    (FALLBACK_USER_FILENAME, FALLBACK_USER_PROMPT),
    (FINAL_SYSTEM_FILENAME, FINAL_SYSTEM_PROMPT),
    (FINAL_USER_FILENAME, FINAL_USER_PROMPT),
];

/// The full set of prompt templates used by the workflow.
///
/// Loaded from external template files when available, falling back to
/// compiled-in defaults. Use [`PromptSet::load`] to resolve the prompt
/// directory from CLI flags, environment variables, or the default path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// Classifier system prompt (`{intents}`).
    pub classifier_system: String,
    /// Classifier user prompt (`{user_input}`).
    pub classifier_user: String,
    /// `INTENT_A` agent system prompt (`{context}`).
    pub agent_a_system: String,
    /// `INTENT_B` agent system prompt (`{context}`).
    pub agent_b_system: String,
    /// Domain agent user prompt (`{user_input}`).
    pub agent_user: String,
    /// Fallback system prompt (`{context}`).
    pub fallback_system: String,
    /// Fallback user prompt (`{user_input}`).
    pub fallback_user: String,
    /// Final response system prompt (`{agent_output}`, `{context}`).
    pub final_system: String,
    /// Final response user prompt.
    pub final_user: String,
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// `prompt_dir` comes from [`Settings`](crate::agent::Settings), which
    /// already covers the CLI flag and `ROUTER_PROMPT_DIR`; without it
    /// `~/.config/intent-router/prompts/` is used.
    ///
    /// Each file is loaded independently; a missing file uses its default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir.map(PathBuf::from).or_else(Self::default_dir);

        let load_file = |filename: &str, default: &str| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(&path).ok())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            classifier_system: load_file(CLASSIFIER_SYSTEM_FILENAME, CLASSIFIER_SYSTEM_PROMPT),
            classifier_user: load_file(CLASSIFIER_USER_FILENAME, CLASSIFIER_USER_PROMPT),
            agent_a_system: load_file(AGENT_A_SYSTEM_FILENAME, AGENT_A_SYSTEM_PROMPT),
            agent_b_system: load_file(AGENT_B_SYSTEM_FILENAME, AGENT_B_SYSTEM_PROMPT),
            agent_user: load_file(AGENT_USER_FILENAME, AGENT_USER_PROMPT),
            fallback_system: load_file(FALLBACK_SYSTEM_FILENAME, FALLBACK_SYSTEM_PROMPT),
            fallback_user: load_file(FALLBACK_USER_FILENAME, FALLBACK_USER_PROMPT),
            final_system: load_file(FINAL_SYSTEM_FILENAME, FINAL_SYSTEM_PROMPT),
            final_user: load_file(FINAL_USER_FILENAME, FINAL_USER_PROMPT),
        }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            classifier_system: CLASSIFIER_SYSTEM_PROMPT.to_string(),
            classifier_user: CLASSIFIER_USER_PROMPT.to_string(),
            agent_a_system: AGENT_A_SYSTEM_PROMPT.to_string(),
            agent_b_system: AGENT_B_SYSTEM_PROMPT.to_string(),
            agent_user: AGENT_USER_PROMPT.to_string(),
            fallback_system: FALLBACK_SYSTEM_PROMPT.to_string(),
            fallback_user: FALLBACK_USER_PROMPT.to_string(),
            final_system: FINAL_SYSTEM_PROMPT.to_string(),
            final_user: FINAL_USER_PROMPT.to_string(),
        }
    }

    /// Writes the compiled-in default prompts to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for (filename, content) in &TEMPLATES {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    ///
    /// Returns `None` if the home directory cannot be determined.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }

    /// Classifier system prompt with every intent label filled in.
    #[must_use]
    pub fn classifier_system_prompt(&self) -> String {
        let labels: Vec<&str> = Intent::ALL.iter().map(|i| i.as_str()).collect();
        render(&self.classifier_system, &[("intents", &labels.join(", "))])
    }
}

/// Replaces each `{key}` in `template` with its value.
///
/// The template is scanned once, left to right; inserted values are never
/// scanned again, so a value containing `{key}` is kept verbatim. Unknown
/// placeholders are left untouched.
#[must_use]
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let filled = tail.find('}').and_then(|close| {
            let key = &tail[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (close, *value))
        });
        match filled {
            Some((close, value)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
