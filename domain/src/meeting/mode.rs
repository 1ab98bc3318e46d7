//! Conversation mode detection.
//!
//! A meeting topic mentioning recruitment switches the loop into interview
//! mode: paired interviewer/interviewee turn-taking instead of open
//! round-robin discussion. The keyword lists (including the Chinese terms)
//! are product behavior carried over from the meeting configuration format.

use crate::persona::entities::Persona;
use serde::{Deserialize, Serialize};

/// Topic keywords that select interview mode.
const INTERVIEW_TOPIC_KEYWORDS: &[&str] = &["interview", "招聘", "面试", "求职"];

/// Role/name keywords that mark a persona as an interviewer.
const INTERVIEWER_KEYWORDS: &[&str] = &["ceo", "cto", "面试官", "经理", "主管", "hr"];

/// How the loop structures each round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationMode {
    /// Paired interviewer question + interviewee answer per round.
    Interview,
    /// Up to two sequential turns per round, scheduler-ranked.
    Discussion,
}

impl ConversationMode {
    /// Detect the mode from the meeting topic.
    pub fn detect(topic: &str) -> Self {
        let topic = topic.to_lowercase();
        if INTERVIEW_TOPIC_KEYWORDS.iter().any(|kw| topic.contains(kw)) {
            ConversationMode::Interview
        } else {
            ConversationMode::Discussion
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationMode::Interview => "interview",
            ConversationMode::Discussion => "discussion",
        }
    }
}

impl std::fmt::Display for ConversationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// True if the persona's role or name matches an interviewer keyword.
pub fn is_interviewer(persona: &Persona) -> bool {
    let role = persona.role.to_lowercase();
    let name = persona.name.to_lowercase();
    INTERVIEWER_KEYWORDS
        .iter()
        .any(|kw| role.contains(kw) || name.contains(kw))
}

/// Interviewer/interviewee split of a roster.
#[derive(Debug, Clone, Default)]
pub struct InterviewCast {
    pub interviewers: Vec<Persona>,
    pub interviewees: Vec<Persona>,
}

impl InterviewCast {
    /// Partition personas by interviewer keyword match.
    ///
    /// If no persona matches either bucket, the roster is split by position
    /// with the first half as interviewers (at least one).
    pub fn partition(personas: &[Persona]) -> Self {
        let mut cast = Self::default();

        for persona in personas {
            if is_interviewer(persona) {
                cast.interviewers.push(persona.clone());
            } else {
                cast.interviewees.push(persona.clone());
            }
        }

        // No keyword hits at all: fall back to a positional split.
        if cast.interviewers.is_empty() && !personas.is_empty() {
            let mid = (personas.len() / 2).max(1);
            cast.interviewers = personas[..mid].to_vec();
            cast.interviewees = personas[mid..].to_vec();
        }

        cast
    }

    /// Both sides must be non-empty for a paired exchange.
    pub fn is_complete(&self) -> bool {
        !self.interviewers.is_empty() && !self.interviewees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::entities::PersonaId;

    fn persona(id: i64, name: &str, role: &str) -> Persona {
        Persona::new(PersonaId(id), name, role)
    }

    #[test]
    fn detects_interview_topics() {
        assert_eq!(
            ConversationMode::detect("Frontend engineer interview"),
            ConversationMode::Interview
        );
        assert_eq!(
            ConversationMode::detect("前端工程师面试"),
            ConversationMode::Interview
        );
        assert_eq!(
            ConversationMode::detect("Q3 roadmap planning"),
            ConversationMode::Discussion
        );
    }

    #[test]
    fn partitions_by_role_keywords() {
        let roster = vec![
            persona(1, "Grace", "CTO"),
            persona(2, "Sam", "Frontend Engineer"),
            persona(3, "Lee", "HR Specialist"),
        ];
        let cast = InterviewCast::partition(&roster);
        assert_eq!(cast.interviewers.len(), 2);
        assert_eq!(cast.interviewees.len(), 1);
        assert_eq!(cast.interviewees[0].id, PersonaId(2));
    }

    #[test]
    fn falls_back_to_positional_split() {
        let roster = vec![
            persona(1, "A", "analyst"),
            persona(2, "B", "designer"),
            persona(3, "C", "writer"),
            persona(4, "D", "developer"),
        ];
        let cast = InterviewCast::partition(&roster);
        assert_eq!(cast.interviewers.len(), 2);
        assert_eq!(cast.interviewees.len(), 2);
        assert!(cast.is_complete());
    }

    #[test]
    fn single_persona_becomes_interviewer() {
        let roster = vec![persona(1, "Solo", "writer")];
        let cast = InterviewCast::partition(&roster);
        assert_eq!(cast.interviewers.len(), 1);
        assert!(cast.interviewees.is_empty());
        assert!(!cast.is_complete());
    }
}
