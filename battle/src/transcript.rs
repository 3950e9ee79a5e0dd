//! Human-readable battle transcript

/// Append-only list of narrated battle events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    events: Vec<String>,
    turn: u32,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the events produced by one message, tagging the current turn
    pub fn record(&mut self, turn: u32, events: impl IntoIterator<Item = String>) {
        self.turn = self.turn.max(turn);
        self.events.extend(events);
    }

    /// Append a single event
    pub fn push(&mut self, event: impl Into<String>) {
        self.events.push(event.into());
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// Highest turn seen so far
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Full transcript, one event per line
    pub fn render(&self) -> String {
        self.events.join("\n")
    }
}

/// Battle text for a stat stage change ("rose", "harshly fell", ...)
pub fn boost_phrase(amount: i8) -> &'static str {
    match amount {
        i8::MIN..=-3 => "fell severely",
        -2 => "harshly fell",
        -1 => "fell",
        0 => "did not change",
        1 => "rose",
        2 => "sharply rose",
        3..=i8::MAX => "rose drastically",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_render() {
        let mut transcript = Transcript::new();
        assert!(transcript.is_empty());

        transcript.record(1, vec!["\n=== Turn 1 ===\n".to_string()]);
        transcript.record(1, vec!["Garchomp used **Earthquake**!".to_string()]);
        transcript.push("move failed: [Invalid choice]");

        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.turn(), 1);
        assert_eq!(
            transcript.render(),
            "\n=== Turn 1 ===\n\nGarchomp used **Earthquake**!\nmove failed: [Invalid choice]"
        );
    }

    #[test]
    fn test_turn_never_goes_back() {
        let mut transcript = Transcript::new();
        transcript.record(3, Vec::new());
        transcript.record(2, Vec::new());
        assert_eq!(transcript.turn(), 3);
    }

    #[test]
    fn test_boost_phrase() {
        assert_eq!(boost_phrase(1), "rose");
        assert_eq!(boost_phrase(2), "sharply rose");
        assert_eq!(boost_phrase(4), "rose drastically");
        assert_eq!(boost_phrase(-1), "fell");
        assert_eq!(boost_phrase(-2), "harshly fell");
        assert_eq!(boost_phrase(-6), "fell severely");
    }
}
