//! Keyword-heuristic routing over raw utterances.
//!
//! The router does the cheap first pass: if exactly one keyword set
//! matches, the orchestrator delegates without spending an LLM call.
//! Ambiguous utterances (both sets, or neither) go to the classifier.

use regex::Regex;

/// Outcome of the keyword pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatch {
    Todo,
    Email,
    Both,
    None,
}

/// Word-boundary matching, with optional plural forms so "tasks" still
/// hits "task". The `@` sign matches anywhere, it marks an email address.
const TODO_PATTERN: &str = r"(?i)\b(tasks?|todos?|to-dos?|reminders?|due|deadlines?|schedules?|productivity|organize|lists?|complete|finish|microsoft to-do)\b";
const EMAIL_PATTERN: &str = r"(?i)\b(emails?|gmail|messages?|mail|send|sent|reply|inbox|compose|unread|read|search|received|labels?|starred|star|important|subjects?)\b|@";

pub struct KeywordRouter {
    todo: Regex,
    email: Regex,
}

impl KeywordRouter {
    pub fn new() -> Self {
        Self {
            // Patterns are literals, compile failure is a programming error.
            todo: Regex::new(TODO_PATTERN).unwrap(),
            email: Regex::new(EMAIL_PATTERN).unwrap(),
        }
    }

    pub fn classify(&self, text: &str) -> RouteMatch {
        match (self.todo.is_match(text), self.email.is_match(text)) {
            (true, true) => RouteMatch::Both,
            (true, false) => RouteMatch::Todo,
            (false, true) => RouteMatch::Email,
            (false, false) => RouteMatch::None,
        }
    }

    /// Label for the "Thinking..." status line. Todo takes precedence when
    /// both sets match, mirroring the order the checks originally ran in.
    pub fn hint_label(&self, text: &str) -> Option<&'static str> {
        match self.classify(text) {
            RouteMatch::Todo | RouteMatch::Both => Some("Todo Agent"),
            RouteMatch::Email => Some("Email Agent"),
            RouteMatch::None => None,
        }
    }
}

impl Default for KeywordRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_requests_route_to_todo() {
        let router = KeywordRouter::new();
        assert_eq!(router.classify("Show my tasks for today"), RouteMatch::Todo);
        assert_eq!(
            router.classify("create a reminder for the dentist"),
            RouteMatch::Todo
        );
        assert_eq!(router.classify("what's on my to-do?"), RouteMatch::Todo);
    }

    #[test]
    fn email_requests_route_to_email() {
        let router = KeywordRouter::new();
        assert_eq!(
            router.classify("Check my unread emails"),
            RouteMatch::Email
        );
        assert_eq!(router.classify("reply to Bob"), RouteMatch::Email);
        assert_eq!(
            router.classify("read the one from Bob"),
            RouteMatch::Email
        );
    }

    #[test]
    fn at_sign_matches_anywhere() {
        let router = KeywordRouter::new();
        assert_eq!(
            router.classify("ping john@example.com about dinner"),
            RouteMatch::Email
        );
    }

    #[test]
    fn mixed_requests_match_both() {
        let router = KeywordRouter::new();
        assert_eq!(
            router.classify("add finish report to my work list and email it to Bob"),
            RouteMatch::Both
        );
        // "send an email" is an email request even though it mentions a list name
        assert_eq!(
            router.classify("Send an email about my task list"),
            RouteMatch::Both
        );
    }

    #[test]
    fn unrelated_requests_match_neither() {
        let router = KeywordRouter::new();
        assert_eq!(router.classify("What's the weather like?"), RouteMatch::None);
        assert_eq!(router.classify("hello there"), RouteMatch::None);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let router = KeywordRouter::new();
        assert_eq!(router.classify("SHOW MY TASKS"), RouteMatch::Todo);
        assert_eq!(router.classify("Check GMAIL"), RouteMatch::Email);
    }

    #[test]
    fn keywords_require_word_boundaries() {
        let router = KeywordRouter::new();
        // "listen" must not hit "list", "duet" must not hit "due"
        assert_eq!(router.classify("listen to a duet"), RouteMatch::None);
    }

    #[test]
    fn hint_prefers_todo_when_both_match() {
        let router = KeywordRouter::new();
        assert_eq!(
            router.hint_label("email me my task list"),
            Some("Todo Agent")
        );
        assert_eq!(router.hint_label("check my inbox"), Some("Email Agent"));
        assert_eq!(router.hint_label("how are you"), None);
    }
}
