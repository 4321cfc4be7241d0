//! Named entity recognition over movie queries.
//!
//! The pipeline only depends on the [`EntityRecognizer`] trait, so any model
//! that labels spans of text can be plugged in. [`PatternRecognizer`] is the
//! built-in rule-based implementation: regex patterns for quoted titles, titles
//! after comparison cues and runs of capitalized name words, plus an optional
//! gazetteer of known titles.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AgentError, Result};
use crate::genres::GENRE_VOCABULARY;

/// A person name
pub const PERSON: &str = "PERSON";
/// A person name next to a direction cue ("directed by", "directing")
pub const DIRECTOR: &str = "DIRECTOR";
/// A creative work, usually a movie title
pub const WORK_OF_ART: &str = "WORK_OF_ART";

/// Capitalized words that never start or continue a person name
const NON_NAME_WORDS: &[&str] = &[
    "a", "an", "and", "or", "the", "of", "in", "for", "to", "i", "i'm", "i'd", "me", "my", "we",
    "you", "any", "some", "something", "anything", "movie", "movies", "film", "films", "show",
    "shows", "series", "netflix", "find", "recommend", "suggest", "give", "looking", "with",
    "like", "than", "about", "please", "starring", "featuring", "directed", "directing", "by",
];

/// Words that end a title found after a comparison cue
const TITLE_STOP_WORDS: &[&str] = &[
    "starring", "featuring", "with", "without", "directed", "directing", "by", "about", "from",
    "but", "that", "which",
];

/// Words that separate titles in a list after a comparison cue
const TITLE_SEPARATORS: &[&str] = &["and", "or"];

/// Words before "like" that make it a verb ("I'd like"), not a comparison
const LIKE_AS_VERB: &[&str] = &["i", "i'd", "i’d", "we", "we'd", "we’d", "you'd", "would", "really"];

/// A labeled span of the input text. Offsets are byte positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
}

impl EntitySpan {
    fn new(text: &str, label: &str, start: usize, end: usize) -> Self {
        Self {
            text: text.to_string(),
            label: label.to_string(),
            start,
            end,
        }
    }

    fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// Labels spans of text with semantic categories
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> Vec<EntitySpan>;
}

/// Rule-based recognizer. Build it once at startup and share it.
pub struct PatternRecognizer {
    quoted: Regex,
    cued_title: Regex,
    title_token: Regex,
    name_run: Regex,
    name_word: Regex,
    works_after: Regex,
    director_before: Regex,
    director_after: Regex,
    known_titles: Option<Regex>,
}

impl PatternRecognizer {
    pub fn new() -> Result<Self> {
        // digits may continue a title ("Blade Runner 2049") but not start one
        let title_first = r"\p{Lu}[\w'’-]*";
        let title_word = r"[\p{Lu}\p{N}][\w'’-]*";
        let connector = r"(?:of|the|and|or|in|on|a|an|to|for)";
        let cued_title = format!(
            r"(?i:\b(like|similar\s+to|such\s+as|than|as\s+good\s+as))\s+({title_first}(?:(?:\s*,\s*|\s+)(?:{connector}\s+)*{title_word})*)"
        );
        let name_word = r"\p{Lu}\p{Ll}+(?:[-'’]\p{Lu}?\p{Ll}+)*";
        let name_run = format!(r"\b{name_word}(?:\s+{name_word})+\b");

        Ok(Self {
            quoted: compile(r#""([^"]+)"|“([^”]+)”"#)?,
            cued_title: compile(&cued_title)?,
            title_token: compile(r"[^\s,]+")?,
            name_run: compile(&name_run)?,
            name_word: compile(&format!("^{name_word}$"))?,
            works_after: compile(r"(?i)^(?:\s+(?:movies|movie|films|film|flicks)\b|['’]s\b)")?,
            director_before: compile(r"(?i)(?:directed\s+by|director|filmmaker|\bby)\s*$")?,
            director_after: compile(r"(?i)^(?:\s+(?:directing|directed)\b|['’]s\s+direction\b)")?,
            known_titles: None,
        })
    }

    /// Add a gazetteer of titles matched case-insensitively on word boundaries
    pub fn with_known_titles<I, S>(mut self, titles: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut titles: Vec<String> = titles
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if titles.is_empty() {
            return Ok(self);
        }
        // longer titles first so "The Dark Knight Rises" beats "The Dark Knight"
        titles.sort_by_key(|t| std::cmp::Reverse(t.len()));
        let alternation = titles
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        self.known_titles = Some(compile(&format!(r"(?i)\b(?:{alternation})\b"))?);
        Ok(self)
    }

    fn is_director_context(&self, text: &str, start: usize, end: usize) -> bool {
        self.director_before.is_match(&text[..start]) || self.director_after.is_match(&text[end..])
    }

    fn title_spans(&self, text: &str, spans: &mut Vec<EntitySpan>) {
        if let Some(known) = &self.known_titles {
            for m in known.find_iter(text) {
                claim(spans, EntitySpan::new(m.as_str(), WORK_OF_ART, m.start(), m.end()));
            }
        }

        for caps in self.quoted.captures_iter(text) {
            if let Some(m) = caps.get(1).or_else(|| caps.get(2)) {
                let trimmed = m.as_str().trim();
                if !trimmed.is_empty() {
                    let start = m.start() + (m.as_str().len() - m.as_str().trim_start().len());
                    claim(
                        spans,
                        EntitySpan::new(trimmed, WORK_OF_ART, start, start + trimmed.len()),
                    );
                }
            }
        }

        for caps in self.cued_title.captures_iter(text) {
            let (Some(cue), Some(run)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            if cue.as_str().eq_ignore_ascii_case("like") && like_is_verb(&text[..cue.start()]) {
                continue;
            }
            for (start, end) in self.split_title_run(text, run.start(), run.end()) {
                if self.is_person_reference(text, start, end) {
                    continue;
                }
                claim(spans, EntitySpan::new(&text[start..end], WORK_OF_ART, start, end));
            }
        }
    }

    /// Split the capitalized run after a cue into titles. A list separator
    /// ("and", "or", a comma) starts a new title and a stop word ends the run.
    fn split_title_run(&self, text: &str, run_start: usize, run_end: usize) -> Vec<(usize, usize)> {
        let mut titles = Vec::new();
        let mut title_start: Option<usize> = None;
        let mut title_end: Option<usize> = None;
        let mut last_end = run_start;

        let mut finish = |start: &mut Option<usize>, end: &mut Option<usize>| {
            if let (Some(s), Some(e)) = (start.take(), end.take()) {
                titles.push((s, e));
            }
        };

        for token in self.title_token.find_iter(&text[run_start..run_end]) {
            let (start, end) = (run_start + token.start(), run_start + token.end());
            let lower = token.as_str().to_lowercase();
            let after_comma = text[last_end..start].contains(',');
            last_end = end;

            if TITLE_STOP_WORDS.contains(&lower.as_str()) {
                break;
            }
            if TITLE_SEPARATORS.contains(&lower.as_str()) {
                finish(&mut title_start, &mut title_end);
                continue;
            }
            if after_comma {
                finish(&mut title_start, &mut title_end);
            }

            title_start.get_or_insert(start);
            // lower-case connectors never end a title
            if !token.as_str().starts_with(|c: char| c.is_lowercase()) {
                title_end = Some(end);
            }
        }
        finish(&mut title_start, &mut title_end);

        titles
    }

    /// A cued run shaped like a person name and followed by "movies" or a
    /// possessive ("Tom Hanks movies") refers to the person, not a title
    fn is_person_reference(&self, text: &str, start: usize, end: usize) -> bool {
        let words: Vec<&str> = text[start..end].split_whitespace().collect();
        (2..=4).contains(&words.len())
            && words
                .iter()
                .all(|w| self.name_word.is_match(w) && is_name_word(w))
            && self.works_after.is_match(&text[end..])
    }

    fn name_spans(&self, text: &str, spans: &mut Vec<EntitySpan>) {
        for run in self.name_run.find_iter(text) {
            for (start, end) in name_groups(run.as_str(), run.start()) {
                let label = if self.is_director_context(text, start, end) {
                    DIRECTOR
                } else {
                    PERSON
                };
                claim(spans, EntitySpan::new(&text[start..end], label, start, end));
            }
        }
    }
}

impl EntityRecognizer for PatternRecognizer {
    fn recognize(&self, text: &str) -> Vec<EntitySpan> {
        let mut spans = Vec::new();
        self.title_spans(text, &mut spans);
        self.name_spans(text, &mut spans);
        spans.sort_by_key(|s| s.start);

        debug!(count = spans.len(), "recognized entity spans");
        spans
    }
}

fn like_is_verb(before: &str) -> bool {
    before
        .split_whitespace()
        .last()
        .is_some_and(|word| LIKE_AS_VERB.contains(&word.to_lowercase().as_str()))
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| AgentError::Recognizer(e.to_string()))
}

/// Keep a span only if it does not overlap one already claimed
fn claim(spans: &mut Vec<EntitySpan>, span: EntitySpan) {
    if !spans.iter().any(|s| s.overlaps(span.start, span.end)) {
        spans.push(span);
    }
}

fn is_name_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    !NON_NAME_WORDS.contains(&lower.as_str()) && !GENRE_VOCABULARY.contains_word(&lower)
}

/// Split a run of capitalized words into groups of at least two name words,
/// dropping words that cannot be part of a name. Returns absolute offsets.
fn name_groups(run: &str, offset: usize) -> Vec<(usize, usize)> {
    let mut groups = Vec::new();
    let mut current: Vec<(usize, usize)> = Vec::new();

    let mut flush = |current: &mut Vec<(usize, usize)>| {
        // names are two to four words long
        if (2..=4).contains(&current.len()) {
            groups.push((current[0].0, current[current.len() - 1].1));
        }
        current.clear();
    };

    let mut pos = 0;
    for raw in run.split_whitespace() {
        let start = pos + run[pos..].find(raw).unwrap_or(0);
        pos = start + raw.len();

        // a possessive belongs to the surrounding text, not the name
        let word = raw
            .strip_suffix("'s")
            .or_else(|| raw.strip_suffix("’s"))
            .unwrap_or(raw);
        let end = start + word.len();

        if is_name_word(word) {
            current.push((offset + start, offset + end));
            if word.len() != raw.len() {
                flush(&mut current);
            }
        } else {
            flush(&mut current);
        }
    }
    flush(&mut current);

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(spans: &[EntitySpan]) -> Vec<(&str, &str)> {
        spans
            .iter()
            .map(|s| (s.text.as_str(), s.label.as_str()))
            .collect()
    }

    #[test]
    fn test_no_entities_in_plain_text() {
        let recognizer = PatternRecognizer::new().unwrap();
        assert!(recognizer.recognize("something funny to watch tonight").is_empty());
    }

    #[test]
    fn test_person_name_run() {
        let recognizer = PatternRecognizer::new().unwrap();
        let spans = recognizer.recognize("anything starring Tom Hanks please");
        assert_eq!(labels(&spans), vec![("Tom Hanks", PERSON)]);
        assert_eq!(&"anything starring Tom Hanks please"[spans[0].start..spans[0].end], "Tom Hanks");
    }

    #[test]
    fn test_director_cues() {
        let recognizer = PatternRecognizer::new().unwrap();

        let spans = recognizer.recognize("a thriller directed by David Fincher");
        assert_eq!(labels(&spans), vec![("David Fincher", DIRECTOR)]);

        let spans = recognizer.recognize("with Christopher Nolan directing");
        assert_eq!(labels(&spans), vec![("Christopher Nolan", DIRECTOR)]);

        let spans = recognizer.recognize("under Greta Gerwig's direction");
        assert_eq!(labels(&spans), vec![("Greta Gerwig", DIRECTOR)]);
    }

    #[test]
    fn test_title_after_comparison_cue() {
        let recognizer = PatternRecognizer::new().unwrap();
        let spans = recognizer.recognize("movies like Inception with a twist");
        assert_eq!(labels(&spans), vec![("Inception", WORK_OF_ART)]);

        let spans = recognizer.recognize("something similar to The Lord of the Rings");
        assert_eq!(labels(&spans), vec![("The Lord of the Rings", WORK_OF_ART)]);
    }

    #[test]
    fn test_quoted_titles_win_over_names() {
        let recognizer = PatternRecognizer::new().unwrap();
        let spans = recognizer.recognize(r#"I loved "Forrest Gump" and "Cast Away""#);
        assert_eq!(
            labels(&spans),
            vec![("Forrest Gump", WORK_OF_ART), ("Cast Away", WORK_OF_ART)]
        );
    }

    #[test]
    fn test_genre_words_are_not_names() {
        let recognizer = PatternRecognizer::new().unwrap();
        assert!(recognizer.recognize("Best Sci-Fi Horror").is_empty());
        assert!(recognizer.recognize("The Movies").is_empty());
    }

    #[test]
    fn test_known_titles_gazetteer() {
        let recognizer = PatternRecognizer::new()
            .unwrap()
            .with_known_titles(["The Dark Knight", "The Dark Knight Rises"])
            .unwrap();
        let spans = recognizer.recognize("is the dark knight rises worth it");
        assert_eq!(labels(&spans), vec![("the dark knight rises", WORK_OF_ART)]);
    }

    #[test]
    fn test_like_as_verb_is_not_a_comparison() {
        let recognizer = PatternRecognizer::new().unwrap();
        let spans = recognizer.recognize("I'd like Tom Hanks movies");
        assert_eq!(labels(&spans), vec![("Tom Hanks", PERSON)]);
    }

    #[test]
    fn test_person_followed_by_movies_is_not_a_title() {
        let recognizer = PatternRecognizer::new().unwrap();
        let spans = recognizer.recognize("something like Tom Hanks movies");
        assert_eq!(labels(&spans), vec![("Tom Hanks", PERSON)]);
    }

    #[test]
    fn test_title_cannot_start_with_a_number() {
        let recognizer = PatternRecognizer::new().unwrap();
        assert!(recognizer.recognize("something like 90s action").is_empty());

        let spans = recognizer.recognize("like Blade Runner 2049");
        assert_eq!(labels(&spans), vec![("Blade Runner 2049", WORK_OF_ART)]);
    }

    #[test]
    fn test_title_lists_are_split() {
        let recognizer = PatternRecognizer::new().unwrap();
        let spans = recognizer.recognize("better than Titanic and Avatar");
        assert_eq!(
            labels(&spans),
            vec![("Titanic", WORK_OF_ART), ("Avatar", WORK_OF_ART)]
        );

        let spans = recognizer.recognize("such as Heat, Ronin or Collateral");
        assert_eq!(
            labels(&spans),
            vec![
                ("Heat", WORK_OF_ART),
                ("Ronin", WORK_OF_ART),
                ("Collateral", WORK_OF_ART)
            ]
        );
    }

    #[test]
    fn test_cue_words_end_a_title_case_run() {
        let recognizer = PatternRecognizer::new().unwrap();
        let spans =
            recognizer.recognize("Dark Sci-Fi Movies Like Blade Runner Starring Harrison Ford");
        assert_eq!(
            labels(&spans),
            vec![("Blade Runner", WORK_OF_ART), ("Harrison Ford", PERSON)]
        );

        let spans = recognizer.recognize("Films Like Heat Directed By Michael Mann");
        assert_eq!(
            labels(&spans),
            vec![("Heat", WORK_OF_ART), ("Michael Mann", DIRECTOR)]
        );
    }

    #[test]
    fn test_recognition_is_deterministic() {
        let recognizer = PatternRecognizer::new().unwrap();
        let text = "movies like Inception with a mind-bending plot and Christopher Nolan directing";
        assert_eq!(recognizer.recognize(text), recognizer.recognize(text));
    }
}
