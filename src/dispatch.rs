//! The interactive main loop.
//!
//! Each iteration shows the main menu, runs the chosen flow to completion and
//! comes back. Recoverable errors are reported to the operator and end only
//! the current iteration; anything else ends the loop.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::mcp::catalog::CapabilityKind;
use crate::operator::Choice;
use crate::session::Session;

/// Entries of the main menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Query,
    Tools,
    Resources,
    Prompts,
}

impl MenuChoice {
    pub const ALL: [Self; 4] = [Self::Query, Self::Tools, Self::Resources, Self::Prompts];

    pub fn label(self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::Tools => "Tools",
            Self::Resources => "Resources",
            Self::Prompts => "Prompts",
        }
    }
}

/// Run the main loop until a fatal error occurs.
pub async fn run(session: &Session) -> Result<(), ClientError> {
    loop {
        run_iteration(session).await?;
    }
}

/// Show the main menu once and run the chosen flow.
pub async fn run_iteration(session: &Session) -> Result<(), ClientError> {
    let operator = session.operator();
    let choices: Vec<Choice> = MenuChoice::ALL
        .iter()
        .map(|c| Choice::new(c.label()))
        .collect();
    let selected = operator
        .select("What would you like to do", &choices)
        .await
        .map_err(ClientError::Operator)?;
    let Some(choice) = selected.and_then(|i| MenuChoice::ALL.get(i).copied()) else {
        return Ok(());
    };

    match run_flow(session, choice).await {
        Err(e) if !e.is_fatal() => {
            warn!(name: "dispatch.flow.failed", flow = choice.label(), error = %e, "Flow aborted");
            operator.report(&e.to_string());
            Ok(())
        }
        other => other,
    }
}

/// Run one flow of the main menu.
pub async fn run_flow(session: &Session, choice: MenuChoice) -> Result<(), ClientError> {
    debug!(flow = choice.label(), "Entering flow");
    match choice {
        MenuChoice::Query => query_flow(session).await,
        MenuChoice::Tools => tool_flow(session).await,
        MenuChoice::Resources => resource_flow(session).await,
        MenuChoice::Prompts => prompt_flow(session).await,
    }
}

async fn ask(session: &Session, prompt: &str) -> Result<String, ClientError> {
    session
        .operator()
        .input(prompt)
        .await
        .map_err(ClientError::Operator)
}

async fn choose(
    session: &Session,
    prompt: &str,
    choices: &[Choice],
    kind: CapabilityKind,
) -> Result<usize, ClientError> {
    session
        .operator()
        .select(prompt, choices)
        .await
        .map_err(ClientError::Operator)?
        .filter(|&i| i < choices.len())
        .ok_or(ClientError::SelectionNotFound(kind))
}

async fn tool_flow(session: &Session) -> Result<(), ClientError> {
    let tools: Vec<_> = session.catalog().tools().collect();
    let choices: Vec<Choice> = tools
        .iter()
        .map(|t| Choice::new(t.label()).with_description(t.description.clone()))
        .collect();
    let tool = tools[choose(session, "Select a tool", &choices, CapabilityKind::Tool).await?];

    let mut args = Map::new();
    for param in &tool.parameters {
        let value = ask(
            session,
            &format!("Enter value for {} ({}):", param.name, param.type_name),
        )
        .await?;
        args.insert(param.name.clone(), Value::String(value));
    }

    info!(name: "dispatch.tool.called", tool = %tool.name, arguments = args.len(), "Calling tool");
    let output = session
        .service()
        .call_tool(&tool.name, args)
        .await
        .map_err(ClientError::Transport)?;
    session
        .operator()
        .show(output.first_text().unwrap_or("Tool returned no text content."));
    Ok(())
}

async fn resource_flow(session: &Session) -> Result<(), ClientError> {
    let catalog = session.catalog();
    let mut values = Vec::new();
    let mut choices = Vec::new();
    for r in catalog.resources() {
        values.push(r.uri.as_str());
        choices.push(Choice::new(&r.name).with_description(r.description.clone()));
    }
    for t in catalog.resource_templates() {
        values.push(t.uri_template.as_str());
        choices.push(Choice::new(&t.name).with_description(t.description.clone()));
    }

    let index = choose(
        session,
        "Select a resource",
        &choices,
        CapabilityKind::Resource,
    )
    .await?;
    let (target, placeholders) = catalog
        .resource_uri(values[index])
        .ok_or(ClientError::SelectionNotFound(CapabilityKind::Resource))?;

    let mut uri = target.to_string();
    for param in placeholders {
        let value = ask(session, &format!("Enter value for {param}:")).await?;
        uri = uri.replacen(&format!("{{{param}}}"), &value, 1);
    }

    info!(name: "dispatch.resource.read", uri = %uri, "Reading resource");
    let contents = session
        .service()
        .read_resource(&uri)
        .await
        .map_err(ClientError::Transport)?;
    let Some(text) = contents.first().and_then(|c| c.text.as_deref()) else {
        return Err(ClientError::EmptyResource { uri });
    };
    let value: Value = serde_json::from_str(text)
        .map_err(|source| ClientError::MalformedResource { uri, source })?;
    session.operator().show(&format!("{value:#}"));
    Ok(())
}

async fn prompt_flow(session: &Session) -> Result<(), ClientError> {
    let prompts: Vec<_> = session.catalog().prompts().collect();
    let choices: Vec<Choice> = prompts
        .iter()
        .map(|p| Choice::new(&p.name).with_description(p.description.clone()))
        .collect();
    let prompt =
        prompts[choose(session, "Select a prompt", &choices, CapabilityKind::Prompt).await?];

    let mut args = Map::new();
    for arg in &prompt.arguments {
        let label = match &arg.description {
            Some(description) => format!("Enter value for {} ({description}):", arg.name),
            None => format!("Enter value for {}:", arg.name),
        };
        let value = ask(session, &label).await?;
        // Blank optional arguments are omitted
        if value.is_empty() && !arg.required {
            continue;
        }
        args.insert(arg.name.clone(), Value::String(value));
    }

    let response = session
        .service()
        .get_prompt(&prompt.name, args)
        .await
        .map_err(ClientError::Transport)?;
    debug!(
        prompt = %prompt.name,
        response = %serde_json::to_string_pretty(&response).unwrap_or_default(),
        "Prompt fetched"
    );

    let relay = session.relay();
    for message in &response.messages {
        let Some(output) = relay.relay(message).await? else {
            continue;
        };
        let outcome = relay
            .capture_user(
                &output,
                session.catalog(),
                session.service(),
                session.store(),
            )
            .await?;
        debug!(prompt = %prompt.name, outcome = ?outcome, "Prompt output handled");
    }
    Ok(())
}

async fn query_flow(session: &Session) -> Result<(), ClientError> {
    let query = ask(session, "Enter your query").await?;
    let generation = session
        .model()
        .generate(&query, session.tools())
        .await
        .map_err(ClientError::from_model)?;
    session
        .operator()
        .show(generation.display_text().unwrap_or("No text generated."));
    Ok(())
}
