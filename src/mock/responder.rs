//! Canned answers for the mock completion endpoints.

use std::time::Duration;

/// Answer used when the instructions carry no line directive.
pub const DEFAULT_ANSWER: &str = "Default mock answer from mocked API";

/// What the mock endpoints send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockAnswer {
    pub text: String,
    /// Wait this long before responding.
    pub delay: Option<Duration>,
}

/// Produces an answer from the instruction text of a request.
pub trait MockResponder: Send + Sync {
    fn respond(&self, instructions: &str) -> MockAnswer;
}

/// Reads directives embedded in the instruction text:
/// `d<N>` waits N seconds, `l<N>` answers with N filler sentences.
/// Only the first occurrence of each counts, and both are clamped.
#[derive(Debug, Clone)]
pub struct DirectiveResponder {
    max_delay: Duration,
    max_lines: u64,
}

impl DirectiveResponder {
    pub fn new(max_delay: Duration, max_lines: u64) -> Self {
        Self {
            max_delay,
            max_lines,
        }
    }
}

impl MockResponder for DirectiveResponder {
    fn respond(&self, instructions: &str) -> MockAnswer {
        let delay = directive(instructions, 'd')
            .map(|secs| Duration::from_secs(secs).min(self.max_delay));
        let text = match directive(instructions, 'l') {
            Some(lines) => (0..lines.min(self.max_lines))
                .map(|_| filler_sentence())
                .collect::<Vec<_>>()
                .join("\n"),
            None => DEFAULT_ANSWER.to_string(),
        };
        MockAnswer { text, delay }
    }
}

/// First run of ASCII digits directly preceded by `marker`.
pub fn directive(text: &str, marker: char) -> Option<u64> {
    let mut chars = text.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c != marker {
            continue;
        }
        let Some(&(start, next)) = chars.peek() else {
            return None;
        };
        if !next.is_ascii_digit() {
            continue;
        }
        let digits: String = text[start..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        // Absurdly long digit runs saturate.
        return Some(digits.parse().unwrap_or(u64::MAX));
    }
    None
}

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi", "aliquip",
    "commodo", "consequat", "duis", "aute", "irure", "reprehenderit", "voluptate", "velit", "esse",
    "cillum", "fugiat", "nulla", "pariatur", "excepteur", "sint", "occaecat", "cupidatat", "non",
    "proident", "sunt", "culpa", "qui", "officia", "deserunt", "mollit", "anim", "id", "est",
];

fn filler_sentence() -> String {
    let len = fastrand::usize(4..=12);
    let mut sentence = String::new();
    for i in 0..len {
        let word = WORDS[fastrand::usize(..WORDS.len())];
        if i == 0 {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                sentence.extend(first.to_uppercase());
                sentence.push_str(chars.as_str());
            }
        } else {
            sentence.push(' ');
            sentence.push_str(word);
        }
    }
    sentence.push('.');
    sentence
}
