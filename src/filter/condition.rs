//! The three condition kinds, represented as one tagged enum with a
//! single dispatch point rather than a class hierarchy: they differ only
//! in which event field they project before matching.

use crate::event::SubscriberEvent;
use regex::Regex;

#[derive(Debug)]
pub enum Condition {
    FileName { regex: Regex, sign: bool },
    SenderAddress { regex: Regex, sign: bool },
    Content { regex: Regex, sign: bool },
}

impl Condition {
    pub fn file_name(pattern: &str, sign: bool) -> Result<Self, regex::Error> {
        Ok(Condition::FileName {
            regex: anchored(pattern)?,
            sign,
        })
    }

    pub fn sender_address(pattern: &str, sign: bool) -> Result<Self, regex::Error> {
        Ok(Condition::SenderAddress {
            regex: anchored(pattern)?,
            sign,
        })
    }

    pub fn content(pattern: &str, sign: bool) -> Result<Self, regex::Error> {
        Ok(Condition::Content {
            regex: anchored(pattern)?,
            sign,
        })
    }

    /// Evaluates to `sign == regexFullMatch(field)`.
    pub fn evaluate(&self, event: &SubscriberEvent) -> bool {
        match self {
            Condition::FileName { regex, sign } => *sign == regex.is_match(&event.name),
            Condition::SenderAddress { regex, sign } => {
                *sign == regex.is_match(&event.sender_address)
            }
            Condition::Content { regex, sign } => *sign == regex.is_match(&event.description),
        }
    }
}

/// Wraps `pattern` so matching is full-match rather than find-anywhere.
fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})$"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, sender: &str, description: &str) -> SubscriberEvent {
        SubscriberEvent {
            name: name.to_string(),
            location: String::new(),
            description: description.to_string(),
            sender_address: sender.to_string(),
            sender_port: "0".to_string(),
        }
    }

    #[test]
    fn file_name_condition_matches_full_string_only() {
        let c = Condition::file_name("a.*\\.log", true).unwrap();
        assert!(c.evaluate(&event("access.log", "", "")));
        assert!(!c.evaluate(&event("access.log.1", "", "")));
    }

    #[test]
    fn negated_sign_inverts_the_match() {
        let c = Condition::sender_address("10\\.0\\.0\\.1", false).unwrap();
        assert!(c.evaluate(&event("", "10.0.0.2", "")));
        assert!(!c.evaluate(&event("", "10.0.0.1", "")));
    }

    #[test]
    fn content_condition_is_substring_style_via_dotstar() {
        let c = Condition::content(".*secret.*", true).unwrap();
        assert!(c.evaluate(&event("", "", "a leaked secret now")));
        assert!(!c.evaluate(&event("", "", "nothing to see")));
    }
}
