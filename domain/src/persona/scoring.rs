//! The should-speak-now weight function.
//!
//! Given the current discussion context, recent-speaker history, and meeting
//! rules, computes a deterministic [0, 1] weight for one persona. The
//! scheduler picks the roster maximum each turn. Malformed or missing
//! configuration never fails scoring; every factor has a neutral default.

use super::entities::{Persona, PersonaId};
use crate::meeting::entities::MeetingRules;
use crate::persona::profile::Preference;
use crate::session::ANTI_REPEAT_WINDOW;

const BASE_SCORE: f64 = 0.5;

/// Compute the speaking weight for one persona.
///
/// `recent_speakers` is ordered most-recent-last; only the trailing
/// [`ANTI_REPEAT_WINDOW`] entries feed the repetition penalty.
pub fn speaking_weight(
    persona: &Persona,
    speaking_priority: f64,
    context: &str,
    recent_speakers: &[PersonaId],
    rules: &MeetingRules,
) -> f64 {
    let mut score = BASE_SCORE;

    // Participant priority weight.
    score *= speaking_priority;

    // Configured frequency preference.
    score *= match persona.profile.behavior.speaking_frequency {
        Preference::High => 1.3,
        Preference::Low => 0.7,
        Preference::Medium => 1.0,
    };

    // Initiative level.
    score *= match persona.profile.behavior.initiative_level {
        Preference::High => 1.2,
        Preference::Low => 0.8,
        Preference::Medium => 1.0,
    };

    // Anti-repetition: spoke within the trailing window, yield the floor.
    let window_start = recent_speakers.len().saturating_sub(ANTI_REPEAT_WINDOW);
    if recent_speakers[window_start..].contains(&persona.id) {
        score *= 0.6;
    }

    // Expertise relevance: one factor proportional to the total number of
    // matching areas, not compounded per match.
    let matches = expertise_matches(&persona.expertise_areas, context);
    if matches > 0 {
        score *= 1.0 + 0.2 * matches as f64;
    }

    // Over-speaking guard.
    if persona.response_count > rules.max_consecutive_turns {
        score *= 0.5;
    }

    score.clamp(0.0, 1.0)
}

/// Count expertise areas whose name appears (case-insensitively) in the
/// context text.
fn expertise_matches(areas: &[String], context: &str) -> usize {
    if context.is_empty() {
        return 0;
    }
    let context = context.to_lowercase();
    areas
        .iter()
        .filter(|area| !area.is_empty() && context.contains(&area.to_lowercase()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::profile::PersonaProfile;

    const TOLERANCE: f64 = 1e-9;

    fn neutral_persona(id: i64) -> Persona {
        Persona::new(PersonaId(id), "Ada", "Engineer").with_profile(PersonaProfile::default())
    }

    fn assert_score(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < TOLERANCE,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn neutral_inputs_score_base() {
        let persona = neutral_persona(1);
        let score = speaking_weight(&persona, 1.0, "", &[], &MeetingRules::default());
        assert_score(score, 0.5);
    }

    #[test]
    fn recent_speaker_is_penalized() {
        let persona = neutral_persona(1);
        let recent = vec![PersonaId(2), PersonaId(1), PersonaId(3)];
        let score = speaking_weight(&persona, 1.0, "", &recent, &MeetingRules::default());
        assert_score(score, 0.30);
    }

    #[test]
    fn only_last_three_speakers_count() {
        let persona = neutral_persona(1);
        // Persona 1 spoke, but four turns ago.
        let recent = vec![PersonaId(1), PersonaId(2), PersonaId(3), PersonaId(4)];
        let score = speaking_weight(&persona, 1.0, "", &recent, &MeetingRules::default());
        assert_score(score, 0.5);
    }

    #[test]
    fn frequency_and_initiative_compose() {
        let mut persona = neutral_persona(1);
        persona.profile.behavior.speaking_frequency = Preference::High;
        persona.profile.behavior.initiative_level = Preference::High;
        let score = speaking_weight(&persona, 1.0, "", &[], &MeetingRules::default());
        assert_score(score, 0.5 * 1.3 * 1.2);
    }

    #[test]
    fn low_preferences_suppress() {
        let mut persona = neutral_persona(1);
        persona.profile.behavior.speaking_frequency = Preference::Low;
        persona.profile.behavior.initiative_level = Preference::Low;
        let score = speaking_weight(&persona, 1.0, "", &[], &MeetingRules::default());
        assert_score(score, 0.5 * 0.7 * 0.8);
    }

    #[test]
    fn expertise_match_boosts() {
        let persona = neutral_persona(1).with_expertise(["frontend performance"]);
        let context = "We keep hitting Frontend Performance regressions on mobile.";
        let score = speaking_weight(&persona, 1.0, context, &[], &MeetingRules::default());
        assert_score(score, 0.5 * 1.2);
    }

    #[test]
    fn expertise_factor_is_proportional_not_compounded() {
        let persona = neutral_persona(1).with_expertise(["caching", "routing", "storage"]);
        let context = "caching and routing and storage all came up";
        let score = speaking_weight(&persona, 1.0, context, &[], &MeetingRules::default());
        // (1 + 0.2 * 3), not 1.2^3.
        assert_score(score, 0.5 * 1.6);
    }

    #[test]
    fn over_speaking_guard_applies() {
        let mut persona = neutral_persona(1);
        persona.response_count = 3;
        let rules = MeetingRules::default(); // max_consecutive_turns = 2
        let score = speaking_weight(&persona, 1.0, "", &[], &rules);
        assert_score(score, 0.25);
    }

    #[test]
    fn score_is_clamped_to_unit_interval() {
        let mut persona = neutral_persona(1).with_expertise(["a", "b", "c", "d", "e"]);
        persona.profile.behavior.speaking_frequency = Preference::High;
        persona.profile.behavior.initiative_level = Preference::High;
        let context = "a b c d e";
        let high = speaking_weight(&persona, 5.0, context, &[], &MeetingRules::default());
        assert!(high <= 1.0);

        let low = speaking_weight(&persona, 0.0, context, &[], &MeetingRules::default());
        assert!(low >= 0.0);
    }
}
