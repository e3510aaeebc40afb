//! Event participant snapshot.

use serde::{Deserialize, Serialize};

use super::ParticipantId;

/// One participant as captured in a ranking snapshot at event close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,

    /// Display name, when the profile has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Matches won during the event.
    pub victories: u32,

    /// Matches played during the event. Zero means the participant never
    /// competed; such rows are excluded from rankings.
    pub matches_played: u32,

    /// Credits already earned during the event (entry rewards, match
    /// rewards) before prize distribution.
    pub credits_earned: u32,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>) -> Self {
        Self {
            id: id.into(),
            user_name: None,
            email: None,
            victories: 0,
            matches_played: 0,
            credits_earned: 0,
        }
    }

    /// Builder method to set the match record.
    pub fn with_record(mut self, victories: u32, matches_played: u32) -> Self {
        self.victories = victories;
        self.matches_played = matches_played;
        self
    }

    /// Builder method to set earned credits.
    pub fn with_credits(mut self, credits: u32) -> Self {
        self.credits_earned = credits;
        self
    }

    /// Builder method to set the display name.
    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }

    /// Builder method to set the email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Victories over matches played; undefined with no matches.
    pub fn win_rate(&self) -> Option<f64> {
        if self.matches_played == 0 {
            None
        } else {
            Some(self.victories as f64 / self.matches_played as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_rate() {
        let p = Participant::new("a").with_record(3, 4);
        assert_eq!(p.win_rate(), Some(0.75));
    }

    #[test]
    fn test_win_rate_no_matches() {
        let p = Participant::new("a");
        assert_eq!(p.win_rate(), None);
    }

    #[test]
    fn test_builder() {
        let p = Participant::new("u1")
            .with_record(5, 6)
            .with_credits(120)
            .with_user_name("Ana")
            .with_email("ana@example.com");

        assert_eq!(p.victories, 5);
        assert_eq!(p.matches_played, 6);
        assert_eq!(p.credits_earned, 120);
        assert_eq!(p.user_name.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_serialization_camel_case() {
        let p = Participant::new("u1").with_record(2, 3).with_credits(10);
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"matchesPlayed\":3"));
        assert!(json.contains("\"creditsEarned\":10"));

        let back: Participant = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
