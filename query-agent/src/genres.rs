//! Genre vocabulary: surface forms and synonym phrases mapped to canonical labels.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

const BASE_GENRES: &[(&str, &str)] = &[
    ("action", "Action"),
    ("drama", "Drama"),
    ("comedy", "Comedy"),
    ("thriller", "Thriller"),
    ("sci-fi", "Sci-Fi"),
    ("romance", "Romance"),
    ("horror", "Horror"),
    ("fantasy", "Fantasy"),
    ("animation", "Animation"),
    ("documentary", "Documentary"),
    ("crime", "Crime"),
    ("adventure", "Adventure"),
];

const SYNONYMS: &[(&str, &str)] = &[
    ("science fiction", "Sci-Fi"),
    ("scifi", "Sci-Fi"),
    ("sci fi", "Sci-Fi"),
    ("romcom", "Romance"),
    ("rom-com", "Romance"),
    ("romantic comedy", "Romance"),
    ("crime thriller", "Thriller"),
    ("animated", "Animation"),
];

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['’-][\p{L}\p{N}]+)*").expect("token pattern is valid")
});

/// Process-wide genre vocabulary, built on first use and never mutated
pub static GENRE_VOCABULARY: LazyLock<GenreVocabulary> = LazyLock::new(GenreVocabulary::builtin);

/// Lookup table from lower-cased phrases to canonical genre labels
#[derive(Debug, Clone)]
pub struct GenreVocabulary {
    phrases: HashMap<String, &'static str>,
    longest_phrase: usize,
}

impl GenreVocabulary {
    fn builtin() -> Self {
        let phrases: HashMap<String, &'static str> = BASE_GENRES
            .iter()
            .chain(SYNONYMS)
            .map(|(surface, label)| (surface.to_string(), *label))
            .collect();
        let longest_phrase = phrases
            .keys()
            .map(|phrase| phrase.split(' ').count())
            .max()
            .unwrap_or(1);

        Self {
            phrases,
            longest_phrase,
        }
    }

    /// Canonical label for a single phrase, case-insensitive
    pub fn canonical(&self, phrase: &str) -> Option<&'static str> {
        let normalized = tokenize(phrase).join(" ");
        self.phrases.get(&normalized).copied()
    }

    /// True when the word alone is a genre term
    pub fn contains_word(&self, word: &str) -> bool {
        self.canonical(word).is_some()
    }

    /// Scan text for genre mentions.
    ///
    /// At each token the longest matching phrase wins, so "romantic comedy"
    /// yields Romance and not Comedy as well.
    pub fn scan(&self, text: &str) -> Vec<&'static str> {
        let tokens = tokenize(text);
        let mut labels = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            let max_len = self.longest_phrase.min(tokens.len() - i);
            let hit = (1..=max_len).rev().find_map(|len| {
                let phrase = tokens[i..i + len].join(" ");
                self.phrases.get(&phrase).map(|label| (len, *label))
            });

            match hit {
                Some((len, label)) => {
                    labels.push(label);
                    i += len;
                }
                None => i += 1,
            }
        }

        labels
    }
}

/// Lower-cased word tokens; hyphens and apostrophes inside a word are kept
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}
