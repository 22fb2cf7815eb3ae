//! Plain-text rendering of the view.

use std::fmt::Write as _;

use inkwell_core::story::{RiskLevel, ThreatLevel};

use crate::presenter::{ImageView, ViewState, VoiceView};

fn risk(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "low risk",
        RiskLevel::Medium => "medium risk",
        RiskLevel::High => "high risk",
    }
}

fn threat(level: ThreatLevel) -> &'static str {
    match level {
        ThreatLevel::Low => "low",
        ThreatLevel::Medium => "medium",
        ThreatLevel::High => "high",
    }
}

/// Renders `view` for the terminal.
#[must_use]
pub fn render(view: &ViewState) -> String {
    let mut out = String::new();

    let Some(turn) = &view.turn else {
        out.push_str("No game in progress. Type `new` to begin.\n");
        if let Some(error) = &view.error {
            let _ = writeln!(out, "\n! {error}");
        }
        return out;
    };

    let _ = writeln!(
        out,
        "=== {} (turn {}) ===",
        turn.scene_setting, turn.turn_number
    );
    let _ = writeln!(out, "\n{}\n", turn.narrative);

    match &view.image {
        ImageView::Ready(url) if url.starts_with("data:") => {
            out.push_str("[image] inline image received\n");
        }
        ImageView::Ready(url) => {
            let _ = writeln!(out, "[image] {url}");
        }
        ImageView::Pending => out.push_str("[image] painting the scene...\n"),
        ImageView::None => {}
    }
    match &view.voice {
        VoiceView::Pending => out.push_str("[voice] narrating...\n"),
        VoiceView::Ready {
            saved_to: Some(path),
            ..
        } => {
            let _ = writeln!(out, "[voice] narration saved to {}", path.display());
        }
        VoiceView::Ready { bytes, .. } => {
            let _ = writeln!(out, "[voice] narration ready ({bytes} bytes)");
        }
        VoiceView::Unavailable => {}
    }
    for notice in &view.notices {
        let _ = writeln!(out, "({notice})");
    }

    if !turn.characters.is_empty() {
        out.push_str("\nCharacters:\n");
        for c in &turn.characters {
            let _ = writeln!(
                out,
                "  {:<14} trust {:>2}/10, threat {}",
                c.name,
                c.trust_level,
                threat(c.threat_level)
            );
        }
    }

    if turn.game_over {
        let ending = if turn.victory { "VICTORY" } else { "DEFEAT" };
        let _ = writeln!(out, "\n*** {ending} ***\nType `new` to play again or `quit` to leave.");
    } else {
        out.push_str("\nWhat will you do?\n");
        for (i, choice) in turn.choices.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {} ({})",
                i + 1,
                choice.description,
                risk(choice.risk_level)
            );
        }
    }

    if let Some(error) = &view.error {
        let _ = writeln!(out, "\n! {error}");
    }
    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use inkwell_core::story::{CharacterStanding, Choice, GameStatus};
    use inkwell_enrichment::outcome::EnrichmentNotice;
    use inkwell_narrative::domain::transitions::{EndingReason, TurnResult};
    use uuid::Uuid;

    use super::*;

    fn view() -> ViewState {
        ViewState {
            session_id: Some(Uuid::new_v4()),
            turn: Some(TurnResult {
                turn_number: 2,
                narrative: "Littlefinger offers the gold cloaks.".to_string(),
                scene_setting: "Throne room".to_string(),
                scene_changed: true,
                choices: vec![Choice {
                    id: "accept".to_string(),
                    description: "Accept his help.".to_string(),
                    risk_level: RiskLevel::High,
                }],
                characters: vec![CharacterStanding::new("Littlefinger", 2, ThreatLevel::Medium)],
                status: GameStatus::Active,
                game_over: false,
                victory: false,
                ending_reason: None,
            }),
            image: ImageView::Ready("https://images.test/1.png".to_string()),
            voice: VoiceView::Pending,
            notices: vec![],
            error: None,
        }
    }

    #[test]
    fn test_render_shows_scene_choices_and_enrichment() {
        // Arrange
        let view = view();

        // Act
        let text = render(&view);

        // Assert
        assert!(text.starts_with("=== Throne room (turn 2) ==="));
        assert!(text.contains("Littlefinger offers the gold cloaks."));
        assert!(text.contains("[image] https://images.test/1.png"));
        assert!(text.contains("[voice] narrating..."));
        assert!(text.contains("1. Accept his help. (high risk)"));
        assert!(text.contains("trust  2/10, threat medium"));
    }

    #[test]
    fn test_render_shows_notices_and_error() {
        let mut view = view();
        view.image = ImageView::None;
        view.voice = VoiceView::Unavailable;
        view.notices = vec![EnrichmentNotice::ImageUnavailable, EnrichmentNotice::VoiceUnavailable];
        view.error = Some("gateway unreachable".to_string());

        let text = render(&view);

        assert!(!text.contains("[image]"));
        assert!(text.contains("(image unavailable)"));
        assert!(text.contains("(voice unavailable)"));
        assert!(text.ends_with("! gateway unreachable\n"));
    }

    #[test]
    fn test_render_shows_ending_instead_of_choices() {
        let mut view = view();
        if let Some(turn) = view.turn.as_mut() {
            turn.game_over = true;
            turn.status = GameStatus::Defeat;
            turn.ending_reason = Some(EndingReason::TurnLimitReached);
            turn.choices.clear();
        }
        view.voice = VoiceView::Ready {
            bytes: 4096,
            saved_to: Some(PathBuf::from("/tmp/clip.mp3")),
        };

        let text = render(&view);

        assert!(text.contains("*** DEFEAT ***"));
        assert!(text.contains("narration saved to /tmp/clip.mp3"));
        assert!(!text.contains("What will you do?"));
    }

    #[test]
    fn test_render_without_game_prompts_to_start() {
        let text = render(&ViewState::default());

        assert!(text.contains("Type `new` to begin."));
    }
}
