//! Parser for the line-oriented filter rule file.
//!
//! Recognized lines: `regla` starts a new rule; `origen=`/`origen!=`,
//! `fichero=`/`fichero!=`, `contenido=`/`contenido!=` add a condition to
//! the current rule (implicitly creating one if none exists yet).
//! Anything else — blank lines, comments, typos — is silently ignored.

use super::condition::Condition;
use super::rule::Rule;
use super::Filter;
use std::path::Path;
use tracing::warn;

pub fn load(path: &Path) -> std::io::Result<Filter> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse(&text))
}

pub fn parse(text: &str) -> Filter {
    let mut rules: Vec<Rule> = Vec::new();
    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "regla" || line.starts_with("regla") {
            rules.push(Rule::new());
            continue;
        }
        let Some((key, sign, pattern)) = split_condition(line) else {
            continue;
        };
        let condition = match key {
            "origen" => Condition::sender_address(pattern, sign),
            "fichero" => Condition::file_name(pattern, sign),
            "contenido" => Condition::content(pattern, sign),
            _ => continue,
        };
        let condition = match condition {
            Ok(c) => c,
            Err(e) => {
                warn!("ignoring malformed filter line {raw_line:?}: {e}");
                continue;
            }
        };
        if rules.is_empty() {
            rules.push(Rule::new());
        }
        rules.last_mut().unwrap().push(condition);
    }
    Filter::new(rules)
}

/// Splits `line` into (`origen`|`fichero`|`contenido`, sign, pattern),
/// where `sign` is `true` for `=` and `false` for `!=`.
fn split_condition(line: &str) -> Option<(&str, bool, &str)> {
    for key in ["origen", "fichero", "contenido"] {
        let Some(rest) = line.strip_prefix(key) else {
            continue;
        };
        if let Some(pattern) = rest.strip_prefix("!=") {
            return Some((key, false, pattern));
        }
        if let Some(pattern) = rest.strip_prefix('=') {
            return Some((key, true, pattern));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SubscriberEvent;

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
    fn single_rule_suppresses_on_content_match() {
        let filter = parse("regla\ncontenido=.*secret.*\n");
        assert!(!filter.admits(&event("a", "1.2.3.4", "a leaked secret")));
        assert!(filter.admits(&event("a", "1.2.3.4", "nothing interesting")));
    }

    #[test]
    fn condition_before_any_regla_creates_implicit_rule() {
        let filter = parse("fichero=app\\.log\n");
        assert!(!filter.admits(&event("app.log", "", "")));
        assert!(filter.admits(&event("other.log", "", "")));
    }

    #[test]
    fn conditions_in_one_rule_are_conjunctive() {
        let filter = parse("regla\nfichero=app\\.log\norigen=10\\.0\\.0\\.1\n");
        // both conditions must hold for the rule (and hence the filter) to suppress
        assert!(!filter.admits(&event("app.log", "10.0.0.1", "")));
        assert!(filter.admits(&event("app.log", "10.0.0.2", "")));
        assert!(filter.admits(&event("other.log", "10.0.0.1", "")));
    }

    #[test]
    fn unrecognized_lines_are_ignored() {
        let filter = parse("# comment\nnonsense here\nregla\n");
        assert!(filter.admits(&event("a", "b", "c")));
    }

    #[test]
    fn empty_filter_admits_everything() {
        let filter = parse("");
        assert!(filter.admits(&event("a", "b", "c")));
    }

    #[test]
    fn malformed_regex_line_is_ignored_not_fatal() {
        let filter = parse("regla\nfichero=[unterminated\n");
        // the malformed condition never attached, so the rule stays empty
        // and an empty rule matches everything -> suppresses everything
        assert!(!filter.admits(&event("anything", "", "")));
    }
}
