//! End-of-session performance report

use crate::core::types::{Tension, TurnNumber};
use crate::session::Session;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rating {
    Excellent,
    Fair,
    Escalated,
}

impl Rating {
    fn from_score(score: u8) -> Self {
        if score > 80 {
            Rating::Excellent
        } else if score > 50 {
            Rating::Fair
        } else {
            Rating::Escalated
        }
    }

    pub fn feedback(self) -> &'static str {
        match self {
            Rating::Excellent => "Excellent work! You kept the situation calm.",
            Rating::Fair => "Good effort, but try to validate feelings more.",
            Rating::Escalated => "The situation escalated. Try to listen more actively.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub turns: TurnNumber,
    pub final_tension: Tension,
    /// 100 minus the final tension
    pub score: u8,
    /// Mean of the rolling tension trace, truncated
    pub average_tension: u8,
    pub rating: Rating,
}

impl SessionReport {
    /// `None` until the session has any conversation to judge
    pub fn from_session(session: &Session) -> Option<Self> {
        let state = session.state();
        if state.history().is_empty() {
            return None;
        }

        let final_tension = state.tension();
        let score = 100u8.saturating_sub(final_tension.value());

        let (sum, count) = session
            .trace()
            .fold((0u32, 0u32), |(sum, n), t| (sum + t.value() as u32, n + 1));
        let average_tension = if count > 0 { (sum / count) as u8 } else { final_tension.value() };

        Some(Self {
            turns: state.turn_count(),
            final_tension,
            score,
            average_tension,
            rating: Rating::from_score(score),
        })
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Performance Report ({} turns)", self.turns)?;
        writeln!(f, "  De-escalation Score: {}/100", self.score)?;
        writeln!(f, "  Average Tension:     {}%", self.average_tension)?;
        write!(f, "  {}", self.rating.feedback())
    }
}
