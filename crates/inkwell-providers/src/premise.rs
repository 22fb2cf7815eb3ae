//! The story premise: "Escape King's Landing".
//!
//! Default cast, starting status of the protagonist, and the prompts sent to
//! the chat model for each kind of turn.

use std::fmt::Write as _;

use inkwell_core::generator::NarrativeContext;
use inkwell_core::story::{CharacterStanding, Choice, ProtagonistStatus, RiskLevel, ThreatLevel};

/// System prompt for narrative turns.
pub const NARRATIVE_SYSTEM_PROMPT: &str = "You are a creative writer specializing in Game of \
     Thrones fan fiction. Always return valid JSON. Make sure all required fields are present.";

/// System prompt for art descriptions.
pub const ART_SYSTEM_PROMPT: &str = "You are a visual artist and writer specializing in \
     atmospheric scene descriptions. Always return valid JSON.";

/// Sampling temperature of the opening scene.
pub const OPENING_TEMPERATURE: f32 = 0.8;

const PREMISE: &str = "You are writing a scene for \"Escape King's Landing\", a visual novel \
     game where Ned Stark must escape King's Landing after Robert's death.";

const CHOICE_FORMAT: &str = "\
- choices: An array of 3-4 choice objects, each with:
  * id: A short unique identifier (e.g., \"trust_varys\", \"confront_cersei\")
  * description: What Ned chooses to do (1-2 sentences)
  * risk_level: \"low\", \"medium\", or \"high\"";

/// Characters tracked from the first scene on.
#[must_use]
pub fn default_characters() -> Vec<CharacterStanding> {
    vec![
        CharacterStanding::new("Cersei Lannister", 0, ThreatLevel::High),
        CharacterStanding::new("Joffrey Baratheon", 0, ThreatLevel::High),
        CharacterStanding::new("Varys", 3, ThreatLevel::Medium),
        CharacterStanding::new("Littlefinger", 2, ThreatLevel::Medium),
    ]
}

/// Ned's status before the first scene.
#[must_use]
pub fn default_protagonist() -> ProtagonistStatus {
    ProtagonistStatus {
        location: "Red Keep".to_string(),
        allies: Vec::new(),
        resources: Vec::new(),
        physical_state: "healthy".to_string(),
    }
}

/// Choices offered when the model leaves an open turn without any.
#[must_use]
pub fn fallback_choices(turn_number: u32) -> Vec<Choice> {
    [
        ("Continue forward cautiously.", RiskLevel::Medium),
        ("Look for allies or information.", RiskLevel::Low),
        ("Take a risky but potentially rewarding action.", RiskLevel::High),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (description, risk_level))| Choice {
        id: format!("choice_{turn_number}_{}", i + 1),
        description: description.to_string(),
        risk_level,
    })
    .collect()
}

/// Prompt for the opening scene.
#[must_use]
pub fn opening_prompt() -> String {
    format!(
        "{PREMISE}

Generate the opening scene. Ned Stark is in King's Landing after Robert Baratheon's death. \
He needs to escape the city alive.

Return a JSON object with:
- scene_setting: A brief location name (e.g., \"Ned's chambers\", \"Red Keep throne room\")
- narrative: 2-3 sentences describing the current situation and what Ned sees/thinks
{CHOICE_FORMAT}

Stay true to Game of Thrones setting. Ned cannot use violence effectively. Choices should \
have logical consequences."
    )
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

/// Prompt for a turn following the player's choice.
#[must_use]
pub fn continuation_prompt(context: &NarrativeContext) -> String {
    let chosen = context
        .chosen_action
        .as_ref()
        .map_or("", |c| c.description.as_str());
    let location = if context.protagonist.location.is_empty() {
        context.scene_setting.as_deref().unwrap_or("Unknown")
    } else {
        context.protagonist.location.as_str()
    };
    let characters =
        serde_json::to_string_pretty(&context.characters).unwrap_or_else(|_| "[]".to_string());

    let mut prompt = String::new();
    let _ = write!(
        prompt,
        "{PREMISE}

Game Context:
Turn: {turn} of at most {max}
Previous turns: {previous}
Current location: {location}
Ned's allies: {allies}
Key events: {events}
Characters and their trust levels: {characters}
Previous narrative: {narrative}
Last choice made: {chosen}

The player just made this choice: {chosen}

Generate the consequence of this choice and the next scene. Return a JSON object with:
- narrative: 2-3 sentences describing what happens as a result of the choice and the new situation
- scene_setting: A brief location name (may be the same or different from previous)
{CHOICE_FORMAT}
- characters: Updated array of character objects with name, trust_level and threat_level
- ned_status: Updated object with location, allies (array of names), resources (array), physical_state
- key_events: Array of major plot points (add any new ones)
- game_over: boolean
- victory: boolean (only true if Ned escaped)

Rules:
- Stay true to Game of Thrones setting
- Ned cannot use violence effectively
- Choices have logical consequences
- The game ends after {max} turns at most
- Victory: Ned escapes King's Landing
- Defeat: Ned is captured or killed
- Update character trust levels based on actions (range 0-10)
- If game_over is true, choices should be an empty array
- Generate NEW and DIFFERENT choices each turn, each with a unique descriptive id",
        turn = context.turn_number,
        max = context.max_turns,
        previous = context.history.len(),
        allies = join_or_none(&context.protagonist.allies),
        events = join_or_none(&context.key_events),
        narrative = context.current_narrative.as_deref().unwrap_or(""),
    );
    prompt
}

/// Prompt for the art description of a scene.
#[must_use]
pub fn art_prompt(scene_setting: &str, narrative: &str) -> String {
    format!(
        "Generate a detailed visual description for a scene in \"Escape King's Landing\", a Game \
of Thrones visual novel.

Scene setting: {scene_setting}
Current narrative: {narrative}
Return a JSON object with:
- art_description: 2-3 sentences describing the scene according to the current narrative and \
scene setting. Include lighting, mood, key visual elements, characters, character positions, \
atmosphere. Use cinematic Game of Thrones aesthetic - detailed and immersive.
- style_notes: Brief notes about the visual style (e.g., \"Medieval fantasy, tense atmosphere, \
warm afternoon lighting\")"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell_core::generator::ChosenAction;
    use uuid::Uuid;

    #[test]
    fn test_default_cast_starts_hostile_lannisters() {
        let cast = default_characters();

        assert_eq!(cast.len(), 4);
        assert_eq!(cast[0].name, "Cersei Lannister");
        assert_eq!(cast[0].threat_level, ThreatLevel::High);
        assert_eq!(cast[2].trust_level, 3);
    }

    #[test]
    fn test_fallback_choices_are_unique_per_turn() {
        let choices = fallback_choices(4);

        let ids: Vec<&str> = choices.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["choice_4_1", "choice_4_2", "choice_4_3"]);
    }

    #[test]
    fn test_continuation_prompt_carries_context() {
        // Arrange
        let context = NarrativeContext {
            session_id: Uuid::new_v4(),
            turn_number: 3,
            max_turns: 15,
            scene_setting: Some("Crypts".to_string()),
            current_narrative: Some("Varys lights a candle.".to_string()),
            history: vec!["a".to_string(), "b".to_string()],
            characters: default_characters(),
            protagonist: ProtagonistStatus {
                allies: vec!["Varys".to_string()],
                ..default_protagonist()
            },
            key_events: Vec::new(),
            chosen_action: Some(ChosenAction {
                id: "follow_varys".to_string(),
                description: "Follow Varys into the dark.".to_string(),
            }),
        };

        // Act
        let prompt = continuation_prompt(&context);

        // Assert
        assert!(prompt.contains("Turn: 3 of at most 15"));
        assert!(prompt.contains("Ned's allies: Varys"));
        assert!(prompt.contains("Key events: None"));
        assert!(prompt.contains("Last choice made: Follow Varys into the dark."));
        assert!(prompt.contains("Littlefinger"));
    }
}
