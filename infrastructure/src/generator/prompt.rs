//! Prompt assembly for the chat-completion generator.
//!
//! Turns a [`ReplyRequest`] into a system prompt (who the persona is and how
//! it speaks) and a user prompt (the meeting context, recent turns, and the
//! instruction for this turn). The profile's enumerated preferences become
//! plain-language constraints appended to the system prompt.

use roundtable_application::ports::generator::{ReplyRequest, RoleType};
use roundtable_domain::{
    AgreementTendency, DetailPreference, Persona, SentenceLength,
};
use std::fmt::Write;

/// System and user prompt for one turn.
#[derive(Debug, Clone)]
pub struct PromptParts {
    pub system: String,
    pub user: String,
}

/// Build the prompt pair for a turn.
pub fn build(request: &ReplyRequest) -> PromptParts {
    PromptParts {
        system: system_prompt(request),
        user: user_prompt(request),
    }
}

fn system_prompt(request: &ReplyRequest) -> String {
    let persona = &request.persona;
    let mut prompt = format!("You are {}, {}.", persona.name, persona.role);

    if !persona.backstory.is_empty() {
        let _ = write!(prompt, "\nBackground: {}", persona.backstory);
    }
    if !persona.goal.is_empty() {
        let _ = write!(prompt, "\nYour goal in this meeting: {}", persona.goal);
    }
    if !persona.expertise_areas.is_empty() {
        let _ = write!(
            prompt,
            "\nYour areas of expertise: {}",
            persona.expertise_areas.join(", ")
        );
    }

    let _ = write!(prompt, "\n\n{}", style_constraints(persona));
    let _ = write!(prompt, "\n{}", role_instruction(request));
    prompt.push_str(
        "\nStay in character. Speak in the first person and reply in the \
         language of the meeting topic. Do not prefix your reply with your \
         own name.",
    );
    prompt
}

/// Plain-language speaking constraints derived from the profile.
fn style_constraints(persona: &Persona) -> String {
    let speaking = &persona.profile.speaking;
    let behavior = &persona.profile.behavior;
    let mut lines = vec![format!(
        "Tone: {}. Vocabulary: {}.",
        speaking.tone, speaking.vocabulary_level
    )];

    lines.push(match speaking.sentence_length {
        SentenceLength::Concise => "Keep replies to two or three short sentences.".to_string(),
        SentenceLength::Medium => "Keep replies to one focused paragraph.".to_string(),
        SentenceLength::Detailed => {
            "You may elaborate across a few paragraphs when it adds substance.".to_string()
        }
    });
    lines.push(match behavior.detail_preference {
        DetailPreference::Concise => "Prefer conclusions over process.".to_string(),
        DetailPreference::Balanced => {
            "Balance the conclusion with the reasoning behind it.".to_string()
        }
        DetailPreference::Comprehensive => {
            "Cover trade-offs and edge cases, not just the headline.".to_string()
        }
    });
    lines.push(match behavior.agreement_tendency {
        AgreementTendency::Supportive => {
            "Build on what others said before adding your own angle.".to_string()
        }
        AgreementTendency::Neutral => {
            "Weigh others' points on their merits; agree or push back as warranted.".to_string()
        }
        AgreementTendency::Critical => {
            "Probe weaknesses in what was said; raise concrete objections.".to_string()
        }
    });
    if speaking.use_examples {
        lines.push("Ground claims in a short concrete example where possible.".to_string());
    }

    lines.join("\n")
}

fn role_instruction(request: &ReplyRequest) -> String {
    match request.role_type {
        RoleType::Interviewer => {
            let candidate = request
                .target
                .as_ref()
                .map(|p| p.name.as_str())
                .unwrap_or("the candidate");
            format!(
                "You are interviewing {candidate}. Ask exactly one concrete \
                 question that builds on the conversation so far, and do not \
                 answer it yourself."
            )
        }
        RoleType::Interviewee => {
            "You are the candidate. Answer the interviewer's most recent \
             question directly, drawing on your stated experience."
                .to_string()
        }
        RoleType::Participant => {
            "Contribute one substantive viewpoint that moves the discussion \
             forward. Do not summarize the meeting."
                .to_string()
        }
    }
}

fn user_prompt(request: &ReplyRequest) -> String {
    let mut prompt = format!("Meeting: {}\n{}", request.meeting_title, request.context);

    if !request.history.is_empty() {
        prompt.push_str("\n\nConversation so far:");
        for message in &request.history {
            let speaker = message
                .metadata
                .persona_name
                .as_deref()
                .unwrap_or("System");
            let _ = write!(prompt, "\n{speaker}: {}", message.content);
        }
    }

    let _ = write!(prompt, "\n\nIt is your turn to speak, {}.", request.persona.name);
    prompt
}
