//! Front Desk Control - CLI client for the front-desk agent daemon.
//!
//! Posts a message to frontdeskd and renders the reply. Conversation state
//! is round-tripped through a session file so multi-turn conversations work
//! from the shell.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use frontdesk_common::rpc::{HealthReport, TurnRequest, TurnResponse};
use frontdesk_common::state::{ConversationState, UrgencyLevel};
use owo_colors::OwoColorize;

#[derive(Parser)]
#[command(name = "frontdeskctl")]
#[command(about = "Practice front-desk agent - talk to the daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// Daemon base URL.
    #[arg(long, default_value = "http://127.0.0.1:8741")]
    daemon: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the reply
    Ask {
        /// The message to send
        message: String,

        /// Session file for multi-turn conversations; created on first use
        #[arg(long)]
        session: Option<PathBuf>,

        /// Print the full plan (tool calls and observations)
        #[arg(long)]
        plan: bool,
    },

    /// Check daemon health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ask {
            message,
            session,
            plan,
        } => ask(&cli.daemon, message, session, plan).await,
        Commands::Health => health(&cli.daemon).await,
    }
}

fn load_session(path: &PathBuf) -> Result<Option<ConversationState>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session file {:?}", path))?;
    let state = serde_json::from_str(&content)
        .with_context(|| format!("session file {:?} is not valid", path))?;
    Ok(Some(state))
}

async fn ask(
    daemon: &str,
    message: String,
    session: Option<PathBuf>,
    show_plan: bool,
) -> Result<()> {
    let conversation_state = match &session {
        Some(path) => load_session(path)?,
        None => None,
    };

    let request = TurnRequest {
        message,
        conversation_state,
    };

    let client = reqwest::Client::new();
    let response: TurnResponse = client
        .post(format!("{}/v1/turn", daemon.trim_end_matches('/')))
        .json(&request)
        .send()
        .await
        .context("daemon unreachable - is frontdeskd running?")?
        .error_for_status()
        .context("daemon returned an error")?
        .json()
        .await
        .context("invalid daemon response")?;

    render_turn(&response, show_plan);

    if let Some(path) = session {
        let json = serde_json::to_string_pretty(&response.conversation_state)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write session file {:?}", path))?;
    }

    Ok(())
}

fn render_turn(response: &TurnResponse, show_plan: bool) {
    let meta = &response.metadata;

    let urgency = match meta.urgency {
        UrgencyLevel::Emergency => format!("{}", meta.urgency.as_str().red().bold()),
        UrgencyLevel::Urgent => format!("{}", meta.urgency.as_str().yellow().bold()),
        UrgencyLevel::Soon => format!("{}", meta.urgency.as_str().yellow()),
        UrgencyLevel::Routine => format!("{}", meta.urgency.as_str().green()),
    };

    println!(
        "{} {} | {} {} ({:.0}%) | {} {}",
        "agent:".dimmed(),
        response.agent.cyan(),
        "intent:".dimmed(),
        meta.intent,
        meta.intent_confidence * 100.0,
        "urgency:".dimmed(),
        urgency
    );

    if meta.escalation_required {
        println!("{}", "ESCALATION REQUIRED".red().bold());
    }
    if !meta.red_flags.is_empty() {
        println!("{} {}", "red flags:".red(), meta.red_flags.join(", "));
    }
    if meta.patient_verified {
        println!("{}", "identity verified".green());
    }

    println!();
    println!("{}", response.response);

    if show_plan && !response.plan.steps.is_empty() {
        println!();
        println!("{}", "plan:".dimmed());
        for step in &response.plan.steps {
            let marker = if step.success {
                format!("{}", "ok".green())
            } else {
                format!("{}", "fail".red())
            };
            println!(
                "  {}. [{}] {} -> {}",
                step.step,
                marker,
                step.tool.bold(),
                truncate(&step.observation, 100)
            );
        }
        println!(
            "  {} steps, {}ms, score {}/10",
            response.plan.total_steps(),
            response.plan.total_duration_ms,
            response.evaluation.overall_score
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{}...", cut)
    }
}

async fn health(daemon: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let report: HealthReport = client
        .get(format!("{}/health", daemon.trim_end_matches('/')))
        .send()
        .await
        .context("daemon unreachable - is frontdeskd running?")?
        .json()
        .await
        .context("invalid health response")?;

    println!("frontdeskd v{}", report.version);
    let provider = if report.provider_available {
        format!("{}", "available".green())
    } else {
        format!("{}", "unavailable".red())
    };
    println!("model provider: {}", provider);
    println!("registered tools: {}", report.registered_tools);
    Ok(())
}
