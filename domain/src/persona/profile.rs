//! Typed persona configuration.
//!
//! The persona's personality traits, speaking style, and behavior settings
//! are modeled as fixed structures with enumerated options and documented
//! defaults. Each section carries an open `extra` map so callers can attach
//! custom traits without a schema change; unrecognized keys never affect
//! scheduling or prompt constraints.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A three-level preference used by several behavior settings.
///
/// Unknown or missing values deserialize to `Medium`, the neutral default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    Low,
    #[default]
    Medium,
    High,
}

/// How strongly a persona tends to agree with others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgreementTendency {
    Supportive,
    #[default]
    Neutral,
    Critical,
}

/// Preferred level of detail in responses.
///
/// Drives the token budget handed to the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailPreference {
    Concise,
    #[default]
    Balanced,
    Comprehensive,
}

/// Preferred sentence length when speaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentenceLength {
    Concise,
    #[default]
    Medium,
    Detailed,
}

/// How a persona reaches decisions.
///
/// Drives the sampling temperature handed to the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStyle {
    /// Data-driven, logical — conservative sampling.
    Analytical,
    #[default]
    Balanced,
    /// Innovative, exploratory — higher sampling temperature.
    Creative,
}

/// Static personality traits (Value Object)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalityTraits {
    pub personality_type: String,
    pub communication_style: String,
    pub decision_making: DecisionStyle,
    pub collaboration_style: String,
    pub stress_response: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

/// How the persona phrases its contributions (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeakingStyle {
    pub tone: String,
    pub vocabulary_level: String,
    pub sentence_length: SentenceLength,
    pub use_examples: bool,
    pub emotional_expression: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Default for SpeakingStyle {
    fn default() -> Self {
        Self {
            tone: "professional, approachable".to_string(),
            vocabulary_level: "business".to_string(),
            sentence_length: SentenceLength::default(),
            use_examples: true,
            emotional_expression: "moderate".to_string(),
            extra: BTreeMap::new(),
        }
    }
}

/// Scheduling-relevant behavior settings (Value Object)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorSettings {
    pub speaking_frequency: Preference,
    pub interruption_tendency: Preference,
    pub agreement_tendency: AgreementTendency,
    pub initiative_level: Preference,
    pub detail_preference: DetailPreference,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

/// Complete static configuration of a persona.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaProfile {
    pub personality: PersonalityTraits,
    pub speaking: SpeakingStyle,
    pub behavior: BehaviorSettings,
}

impl PersonaProfile {
    /// Token budget for a single generated turn, from the sentence-length
    /// preference.
    pub fn max_tokens(&self) -> u32 {
        match self.speaking.sentence_length {
            SentenceLength::Concise => 300,
            SentenceLength::Medium => 800,
            SentenceLength::Detailed => 1200,
        }
    }

    /// Sampling temperature, from the decision-making style.
    pub fn temperature(&self) -> f64 {
        match self.personality.decision_making {
            DecisionStyle::Analytical => 0.5,
            DecisionStyle::Balanced => 0.7,
            DecisionStyle::Creative => 0.9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_defaults_to_medium() {
        assert_eq!(Preference::default(), Preference::Medium);
        let behavior: BehaviorSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(behavior.speaking_frequency, Preference::Medium);
        assert_eq!(behavior.initiative_level, Preference::Medium);
    }

    #[test]
    fn unknown_keys_land_in_extra() {
        let behavior: BehaviorSettings = serde_json::from_str(
            r#"{"speaking_frequency": "high", "humor": "dry"}"#,
        )
        .unwrap();
        assert_eq!(behavior.speaking_frequency, Preference::High);
        assert_eq!(behavior.extra.get("humor").map(String::as_str), Some("dry"));
    }

    #[test]
    fn constraints_follow_profile() {
        let mut profile = PersonaProfile::default();
        assert_eq!(profile.max_tokens(), 800);
        assert!((profile.temperature() - 0.7).abs() < f64::EPSILON);

        profile.speaking.sentence_length = SentenceLength::Concise;
        profile.personality.decision_making = DecisionStyle::Creative;
        assert_eq!(profile.max_tokens(), 300);
        assert!((profile.temperature() - 0.9).abs() < f64::EPSILON);
    }
}
