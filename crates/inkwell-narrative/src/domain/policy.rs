//! Turn limit policy.

/// Hard limit on accepted choices per session.
pub const MAX_TURNS: u32 = 15;

/// Closing text appended when the turn limit ends the story.
pub const TURN_LIMIT_EPILOGUE: &str = "Time has run out. The Lannisters have closed every road \
out of the city, and the game of thrones claims another player.";

/// Ends the story once the turn limit is reached, unless the narrative
/// generator already ended it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnLimitPolicy {
    max_turns: u32,
}

impl TurnLimitPolicy {
    /// A policy with a custom limit.
    #[must_use]
    pub const fn new(max_turns: u32) -> Self {
        Self { max_turns }
    }

    /// The configured limit.
    #[must_use]
    pub const fn max_turns(&self) -> u32 {
        self.max_turns
    }

    /// Whether producing `turn_number` must end the story.
    #[must_use]
    pub const fn is_reached(&self, turn_number: u32) -> bool {
        turn_number >= self.max_turns
    }

    /// `narrative` followed by the policy epilogue.
    #[must_use]
    pub fn with_epilogue(&self, narrative: &str) -> String {
        format!("{}\n\n{TURN_LIMIT_EPILOGUE}", narrative.trim_end())
    }
}

impl Default for TurnLimitPolicy {
    fn default() -> Self {
        Self::new(MAX_TURNS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_reached_on_the_last_turn() {
        let policy = TurnLimitPolicy::default();

        assert!(!policy.is_reached(MAX_TURNS - 1));
        assert!(policy.is_reached(MAX_TURNS));
    }

    #[test]
    fn test_epilogue_follows_the_narrative() {
        let policy = TurnLimitPolicy::default();

        let text = policy.with_epilogue("Guards block the gate.  ");

        assert!(text.starts_with("Guards block the gate.\n\n"));
        assert!(text.ends_with(TURN_LIMIT_EPILOGUE));
    }
}
