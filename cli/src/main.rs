//! CLI entrypoint for Roundtable
//!
//! This is the main binary that wires together all layers using
//! dependency injection: the in-memory store is seeded with the meeting and
//! personas, the session manager drives the conversation, and the event
//! stream is rendered to the terminal until the conversation ends.

use anyhow::{Context, Result, bail};
use clap::Parser;
use roundtable_application::{
    ConversationLogger, EventBroadcaster, NoConversationLogger, SessionManager,
};
use roundtable_domain::{Meeting, MeetingRules, Participant, Persona, PersonaId};
use roundtable_infrastructure::{
    ConfigLoader, FileConfig, HttpGeneratorConfig, HttpReplyGenerator, InMemoryMeetingStore,
    JsonlConversationLogger,
};
use roundtable_presentation::{Cli, ConsoleRenderer, OutputFormat, stream::sse};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow::anyhow!(e))
            .context("failed to load configuration")?
    };

    let Some(topic) = cli.topic.clone() else {
        bail!("A meeting topic is required.");
    };

    if config.generator.api_key.is_none() {
        warn!("No generator API key configured; turns will use templated fallbacks");
    }

    // === Dependency Injection ===
    let store = Arc::new(InMemoryMeetingStore::new());
    let generator = Arc::new(
        HttpReplyGenerator::new(HttpGeneratorConfig {
            base_url: config.generator.base_url.clone(),
            api_key: config.generator.api_key.clone(),
            model: config.generator.model.clone(),
            timeout: config.generator.timeout(),
        })
        .context("failed to build the generator client")?,
    );
    let logger = transcript_logger(&cli, &config);
    let broadcaster = Arc::new(EventBroadcaster::new());
    let manager = Arc::new(SessionManager::new(
        Arc::clone(&store),
        generator,
        broadcaster,
        logger,
    ));

    // Seed the meeting and its roster.
    let title = cli.title.clone().unwrap_or_else(|| topic.clone());
    let rules = meeting_rules(&cli, &config);
    let meeting = store
        .add_meeting(|id| Meeting::new(id, title.clone(), topic.clone()).with_rules(rules))
        .await;

    let personas = if cli.persona.is_empty() {
        demo_roster()
    } else {
        cli.persona
            .iter()
            .map(|spec| parse_persona_spec(spec))
            .collect::<Result<Vec<_>>>()?
    };
    for draft in personas {
        let persona = store
            .add_persona(|id| Persona { id, ..draft.clone() })
            .await;
        store
            .add_participant(Participant::new(meeting.id, persona.id))
            .await?;
    }

    info!(meeting_id = meeting.id.0, topic = %meeting.topic, "meeting seeded");

    // Subscribe before starting so no event is missed.
    let mut subscription = manager.subscribe_stream(meeting.id).await?;
    manager.start_conversation(meeting.id, false).await?;

    let renderer = ConsoleRenderer::new(cli.quiet);
    while let Some(event) = subscription.recv().await {
        match cli.output {
            OutputFormat::Console => {
                if let Some(line) = renderer.render(&event) {
                    println!("{line}");
                }
            }
            OutputFormat::Sse => {
                if let Ok(framed) = sse::frame(&event) {
                    print!("{framed}");
                }
            }
        }
        if event.event_type() == "conversation_ended" {
            break;
        }
    }

    Ok(())
}

/// Meeting rules from config defaults with CLI overrides on top.
fn meeting_rules(cli: &Cli, config: &FileConfig) -> MeetingRules {
    MeetingRules {
        discussion_rounds: cli.rounds.or(config.conversation.discussion_rounds),
        speaking_time_limit: cli
            .speaking_time_limit
            .or(config.conversation.speaking_time_limit),
        max_messages: config.conversation.max_messages,
        auto_summarize: config.conversation.auto_summarize && !cli.no_summary,
        ..Default::default()
    }
}

fn transcript_logger(cli: &Cli, config: &FileConfig) -> Arc<dyn ConversationLogger> {
    let path = cli
        .log
        .clone()
        .or_else(|| config.logging.conversation_log.clone());
    match path {
        Some(path) => match JsonlConversationLogger::new(&path) {
            Some(logger) => {
                info!("Writing conversation transcript to {}", path.display());
                Arc::new(logger)
            }
            None => Arc::new(NoConversationLogger),
        },
        None => Arc::new(NoConversationLogger),
    }
}

/// Parse a `NAME:ROLE[:EXPERTISE,...]` persona spec.
fn parse_persona_spec(spec: &str) -> Result<Persona> {
    let mut parts = spec.splitn(3, ':');
    let name = parts.next().unwrap_or_default().trim();
    let role = parts.next().unwrap_or_default().trim();
    if name.is_empty() || role.is_empty() {
        bail!("Invalid persona spec '{spec}': expected NAME:ROLE[:EXPERTISE,...]");
    }

    let mut persona = Persona::new(PersonaId(0), name, role);
    if let Some(areas) = parts.next() {
        persona = persona.with_expertise(
            areas
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        );
    }
    Ok(persona)
}

/// Built-in roster used when no `--persona` is given.
fn demo_roster() -> Vec<Persona> {
    vec![
        Persona::new(PersonaId(0), "Grace", "CTO")
            .with_goal("keep the discussion tied to what the platform can deliver")
            .with_expertise(["platform architecture", "hiring"]),
        Persona::new(PersonaId(0), "Sam", "Engineer")
            .with_goal("surface implementation risks early")
            .with_expertise(["frontend", "performance"]),
        Persona::new(PersonaId(0), "Lee", "Product Manager")
            .with_goal("connect proposals back to user outcomes")
            .with_expertise(["roadmapping", "user research"]),
    ]
}
