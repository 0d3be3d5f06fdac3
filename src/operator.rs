//! The human at the terminal.
//!
//! Every interaction the dispatch loop and the prompt relay have with the
//! operator goes through [`Operator`]: single-select menus, free-text input,
//! yes/no confirmation, and plain output. [`TerminalOperator`] renders them
//! with `dialoguer`; tests substitute a scripted implementation.

use async_trait::async_trait;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};

/// One entry of a single-select menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub description: Option<String>,
}

impl Choice {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<impl Into<String>>) -> Self {
        self.description = description.map(Into::into);
        self
    }

    fn render(&self) -> String {
        match &self.description {
            Some(d) if !d.is_empty() => format!("{}: {d}", self.label),
            _ => self.label.clone(),
        }
    }
}

#[async_trait]
pub trait Operator: Send + Sync {
    /// Ask the operator to pick one of `choices`.
    ///
    /// Returns the chosen index, or `None` when there was nothing to choose.
    async fn select(&self, prompt: &str, choices: &[Choice]) -> anyhow::Result<Option<usize>>;

    async fn input(&self, prompt: &str) -> anyhow::Result<String>;

    async fn confirm(&self, prompt: &str, default: bool) -> anyhow::Result<bool>;

    /// Print regular output.
    fn show(&self, text: &str);

    /// Print a problem report.
    fn report(&self, text: &str);
}

/// [`Operator`] backed by interactive terminal prompts.
///
/// Prompts block on stdin, so each one runs on the blocking thread pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalOperator;

impl TerminalOperator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Operator for TerminalOperator {
    async fn select(&self, prompt: &str, choices: &[Choice]) -> anyhow::Result<Option<usize>> {
        if choices.is_empty() {
            println!("{prompt}: (no choices available)");
            return Ok(None);
        }

        let prompt = prompt.to_string();
        let items: Vec<String> = choices.iter().map(Choice::render).collect();
        let selection = tokio::task::spawn_blocking(move || {
            Select::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .items(&items)
                .default(0)
                .interact()
        })
        .await??;
        Ok(Some(selection))
    }

    async fn input(&self, prompt: &str) -> anyhow::Result<String> {
        let prompt = prompt.to_string();
        let value = tokio::task::spawn_blocking(move || {
            Input::<String>::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()
        })
        .await??;
        Ok(value)
    }

    async fn confirm(&self, prompt: &str, default: bool) -> anyhow::Result<bool> {
        let prompt = prompt.to_string();
        let confirmed = tokio::task::spawn_blocking(move || {
            Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .default(default)
                .interact()
        })
        .await??;
        Ok(confirmed)
    }

    fn show(&self, text: &str) {
        println!("{text}");
    }

    fn report(&self, text: &str) {
        eprintln!("{text}");
    }
}
