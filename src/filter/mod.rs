//! Compiled regex predicates over subscriber events: a `Filter` suppresses
//! display for any event matched by one of its `Rule`s.

pub mod condition;
pub mod dsl;
pub mod rule;

use crate::event::SubscriberEvent;
use rule::Rule;

/// Disjunction of [`Rule`]s evaluated as suppression: an event passes
/// (is admitted for display) iff no rule matches.
#[derive(Debug, Default)]
pub struct Filter {
    rules: Vec<Rule>,
}

impl Filter {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// `true` if the event should be displayed: no rule matched it.
    pub fn admits(&self, event: &SubscriberEvent) -> bool {
        !self.rules.iter().any(|r| r.matches(event))
    }
}
