//! Predicates used by the rules
//!
//! Small pure functions over strings and paths, kept apart from the evaluator
//! so each can be tested with its own patterns.

use regex::Regex;

/// Whether the author login belongs to an automation account
pub fn is_bot_login(login: Option<&str>, pattern: &Regex) -> bool {
    login.is_some_and(|login| pattern.is_match(login))
}

/// Whether the title is too short or fails the optional title pattern
pub fn title_needs_work(title: &str, min_length: usize, pattern: Option<&Regex>) -> bool {
    if title.chars().count() < min_length {
        return true;
    }
    pattern.is_some_and(|pattern| !pattern.is_match(title))
}

/// Whether the diff exceeds the threshold (boundary exclusive)
pub fn exceeds_threshold(size: u64, threshold: u64) -> bool {
    size > threshold
}

/// Whether any path looks like a test file
pub fn touches_tests<'a>(mut paths: impl Iterator<Item = &'a str>, pattern: &Regex) -> bool {
    paths.any(|path| pattern.is_match(path))
}

/// Whether any path is a source file by suffix. An empty suffix list treats
/// every path as a source file.
pub fn touches_sources<'a>(mut paths: impl Iterator<Item = &'a str>, suffixes: &[String]) -> bool {
    if suffixes.is_empty() {
        return paths.next().is_some();
    }
    paths.any(|path| suffixes.iter().any(|suffix| path.ends_with(suffix.as_str())))
}

/// Whether any commit message is shorter than `min_length` characters
pub fn has_short_commit_message(messages: &[String], min_length: usize) -> bool {
    messages
        .iter()
        .any(|message| message.chars().count() < min_length)
}
