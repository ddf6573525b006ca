//! E.C.H.O. - Empathy & Crisis Handling Operative
//!
//! A turn pipeline for crisis-negotiation practice: every trainee message is
//! scored for its effect on the persona's tension, a scheduled complication
//! may be injected, and the persona replies in character.

pub mod core;
pub mod exchange;
pub mod llm;
pub mod persona;
pub mod pipeline;
pub mod report;
pub mod schedule;
pub mod session;

#[cfg(test)]
mod test_support;
