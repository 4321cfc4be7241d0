//! Entity extraction: recognizer spans plus a genre vocabulary scan.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::error::ConfigError;
use crate::genres::GENRE_VOCABULARY;
use crate::recognizer::{DIRECTOR, EntityRecognizer, PERSON, WORK_OF_ART};
use crate::schema::Entities;

/// Field of [`Entities`] a recognizer label feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityField {
    Actors,
    Directors,
    MovieName,
}

impl FromStr for EntityField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "actors" | "actor" => Ok(Self::Actors),
            "directors" | "director" => Ok(Self::Directors),
            "movie_name" | "movie" | "title" => Ok(Self::MovieName),
            other => Err(ConfigError::InvalidLabelMapping(format!(
                "unknown entity field '{other}'"
            ))),
        }
    }
}

/// Which movie title to keep when the recognizer finds several
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TitlePolicy {
    First,
    #[default]
    Last,
}

impl FromStr for TitlePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            _ => Err(ConfigError::InvalidValue {
                key: "MOVIE_TITLE_POLICY".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Explicit mapping from recognizer labels to entity fields.
///
/// Labels that are not mapped are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMapping {
    targets: HashMap<String, EntityField>,
}

impl LabelMapping {
    pub fn empty() -> Self {
        Self {
            targets: HashMap::new(),
        }
    }

    pub fn with(mut self, label: impl Into<String>, field: EntityField) -> Self {
        self.targets.insert(label.into().to_uppercase(), field);
        self
    }

    /// Stop routing a label to any field
    pub fn without(mut self, label: &str) -> Self {
        self.targets.remove(&label.to_uppercase());
        self
    }

    pub fn target(&self, label: &str) -> Option<EntityField> {
        self.targets.get(&label.to_uppercase()).copied()
    }
}

impl Default for LabelMapping {
    fn default() -> Self {
        Self::empty()
            .with(PERSON, EntityField::Actors)
            .with(DIRECTOR, EntityField::Directors)
            .with(WORK_OF_ART, EntityField::MovieName)
    }
}

/// Parses `LABEL=field` pairs separated by commas, e.g.
/// `PERSON=directors,NORP=none`. Pairs override the default mapping and
/// `none` unmaps a label; labels not named keep their default target.
impl FromStr for LabelMapping {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mapping = Self::default();
        for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (label, field) = pair.split_once('=').ok_or_else(|| {
                ConfigError::InvalidLabelMapping(format!("expected LABEL=field, got '{pair}'"))
            })?;
            let label = label.trim();
            if label.is_empty() {
                return Err(ConfigError::InvalidLabelMapping(format!(
                    "empty label in '{pair}'"
                )));
            }
            mapping = if field.trim().eq_ignore_ascii_case("none") {
                mapping.without(label)
            } else {
                mapping.with(label, field.parse()?)
            };
        }
        Ok(mapping)
    }
}

/// Turns query text into [`Entities`]
pub struct EntityExtractor {
    recognizer: Arc<dyn EntityRecognizer>,
    mapping: LabelMapping,
    title_policy: TitlePolicy,
}

impl EntityExtractor {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self {
            recognizer,
            mapping: LabelMapping::default(),
            title_policy: TitlePolicy::default(),
        }
    }

    pub fn with_mapping(mut self, mapping: LabelMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_title_policy(mut self, policy: TitlePolicy) -> Self {
        self.title_policy = policy;
        self
    }

    /// Extract entities. Finding nothing is a normal, empty result.
    pub fn extract(&self, query: &str) -> Entities {
        let mut entities = Entities::default();

        // spans arrive ordered by position, which the title policy relies on
        for span in self.recognizer.recognize(query) {
            let Some(field) = self.mapping.target(&span.label) else {
                continue;
            };
            let text = span.text.trim().to_string();
            if text.is_empty() {
                continue;
            }
            match field {
                EntityField::Actors => {
                    entities.actors.insert(text);
                }
                EntityField::Directors => {
                    entities.directors.insert(text);
                }
                EntityField::MovieName => match self.title_policy {
                    TitlePolicy::First if entities.movie_name.is_some() => {}
                    _ => entities.movie_name = Some(text),
                },
            }
        }

        entities
            .genres
            .extend(GENRE_VOCABULARY.scan(query).into_iter().map(String::from));

        debug!(
            actors = entities.actors.len(),
            directors = entities.directors.len(),
            genres = entities.genres.len(),
            has_title = entities.movie_name.is_some(),
            "extracted entities"
        );
        entities
    }
}

impl fmt::Debug for EntityExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityExtractor")
            .field("mapping", &self.mapping)
            .field("title_policy", &self.title_policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::{EntitySpan, PatternRecognizer};

    /// Recognizer that returns a fixed list of spans
    struct FixedRecognizer(Vec<(&'static str, &'static str)>);

    impl EntityRecognizer for FixedRecognizer {
        fn recognize(&self, _text: &str) -> Vec<EntitySpan> {
            self.0
                .iter()
                .enumerate()
                .map(|(i, (text, label))| EntitySpan {
                    text: text.to_string(),
                    label: label.to_string(),
                    start: i * 10,
                    end: i * 10 + text.len(),
                })
                .collect()
        }
    }

    fn pattern_extractor() -> EntityExtractor {
        EntityExtractor::new(Arc::new(PatternRecognizer::new().unwrap()))
    }

    #[test]
    fn test_empty_query_yields_empty_entities() {
        let entities = pattern_extractor().extract("something to watch tonight");
        assert!(entities.is_empty());
    }

    #[test]
    fn test_genre_synonyms_normalize() {
        let extractor = pattern_extractor();
        for query in ["some sci-fi", "some Sci-Fi", "some science fiction"] {
            let entities = extractor.extract(query);
            assert_eq!(
                entities.genres.iter().collect::<Vec<_>>(),
                vec!["Sci-Fi"],
                "query: {query}"
            );
        }
        for query in ["a romcom", "a romantic comedy"] {
            let entities = extractor.extract(query);
            assert!(entities.genres.contains("Romance"), "query: {query}");
        }
    }

    #[test]
    fn test_funny_romcom_is_only_romance() {
        let entities = pattern_extractor().extract("funny romcom with a happy ending");
        assert_eq!(entities.genres.iter().collect::<Vec<_>>(), vec!["Romance"]);
    }

    #[test]
    fn test_duplicates_are_removed() {
        let extractor = EntityExtractor::new(Arc::new(FixedRecognizer(vec![
            ("Tom Hanks", PERSON),
            ("Tom Hanks", PERSON),
        ])));
        let entities = extractor.extract("horror horror HORROR");
        assert_eq!(entities.actors.len(), 1);
        assert_eq!(entities.genres.len(), 1);
    }

    #[test]
    fn test_default_mapping() {
        let extractor = EntityExtractor::new(Arc::new(FixedRecognizer(vec![
            ("Meryl Streep", PERSON),
            ("Jane Campion", DIRECTOR),
            ("The Piano", WORK_OF_ART),
            ("Paris", "GPE"),
        ])));
        let entities = extractor.extract("");

        assert!(entities.actors.contains("Meryl Streep"));
        assert!(entities.directors.contains("Jane Campion"));
        assert_eq!(entities.movie_name.as_deref(), Some("The Piano"));
        assert_eq!(entities.actors.len() + entities.directors.len(), 2);
    }

    #[test]
    fn test_remapped_person_label_goes_to_directors() {
        let mapping: LabelMapping = "PERSON=directors".parse().unwrap();
        let extractor = EntityExtractor::new(Arc::new(FixedRecognizer(vec![
            ("Sofia Coppola", PERSON),
            ("Lost in Translation", WORK_OF_ART),
        ])))
        .with_mapping(mapping);
        let entities = extractor.extract("");

        assert!(entities.actors.is_empty());
        assert!(entities.directors.contains("Sofia Coppola"));
        // labels not named in the override keep their default target
        assert_eq!(entities.movie_name.as_deref(), Some("Lost in Translation"));
    }

    #[test]
    fn test_partial_mapping_keeps_defaults() {
        let mapping: LabelMapping = "PERSON=directors".parse().unwrap();
        assert_eq!(mapping.target(PERSON), Some(EntityField::Directors));
        assert_eq!(mapping.target(DIRECTOR), Some(EntityField::Directors));
        assert_eq!(mapping.target(WORK_OF_ART), Some(EntityField::MovieName));

        let mapping: LabelMapping = "WORK_OF_ART=none, norp=actors".parse().unwrap();
        assert_eq!(mapping.target(WORK_OF_ART), None);
        assert_eq!(mapping.target("NORP"), Some(EntityField::Actors));
        assert_eq!(mapping.target(PERSON), Some(EntityField::Actors));
    }

    #[test]
    fn test_title_policy() {
        let spans = vec![("Alien", WORK_OF_ART), ("Aliens", WORK_OF_ART)];

        let last = EntityExtractor::new(Arc::new(FixedRecognizer(spans.clone())));
        assert_eq!(last.extract("").movie_name.as_deref(), Some("Aliens"));

        let first = EntityExtractor::new(Arc::new(FixedRecognizer(spans)))
            .with_title_policy(TitlePolicy::First);
        assert_eq!(first.extract("").movie_name.as_deref(), Some("Alien"));
    }

    #[test]
    fn test_label_mapping_parse_errors() {
        assert!(matches!(
            "PERSON".parse::<LabelMapping>(),
            Err(ConfigError::InvalidLabelMapping(_))
        ));
        assert!(matches!(
            "PERSON=producers".parse::<LabelMapping>(),
            Err(ConfigError::InvalidLabelMapping(_))
        ));
        assert_eq!("".parse::<LabelMapping>().unwrap(), LabelMapping::default());
    }

    #[test]
    fn test_person_before_movies_is_an_actor() {
        let entities = pattern_extractor().extract("I'd like Tom Hanks movies");
        assert!(entities.actors.contains("Tom Hanks"));
        assert_eq!(entities.movie_name, None);
    }

    #[test]
    fn test_decade_is_not_a_title() {
        let entities = pattern_extractor().extract("something like 90s action");
        assert_eq!(entities.movie_name, None);
        assert_eq!(entities.genres.iter().collect::<Vec<_>>(), vec!["Action"]);
    }

    #[test]
    fn test_title_policy_over_listed_titles() {
        let query = "better than Titanic and Avatar";
        let last = pattern_extractor().extract(query);
        assert_eq!(last.movie_name.as_deref(), Some("Avatar"));

        let first = pattern_extractor()
            .with_title_policy(TitlePolicy::First)
            .extract(query);
        assert_eq!(first.movie_name.as_deref(), Some("Titanic"));
    }

    #[test]
    fn test_title_case_query_keeps_actor() {
        let entities = pattern_extractor()
            .extract("Dark Sci-Fi Movies Like Blade Runner Starring Harrison Ford");
        assert_eq!(entities.movie_name.as_deref(), Some("Blade Runner"));
        assert!(entities.actors.contains("Harrison Ford"));
        assert_eq!(entities.actors.len(), 1);
        assert_eq!(entities.genres.iter().collect::<Vec<_>>(), vec!["Sci-Fi"]);
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let extractor = pattern_extractor();
        let query = "movies like Inception with a mind-bending plot and Christopher Nolan directing";
        let first = extractor.extract(query);
        let second = extractor.extract(query);

        assert_eq!(first, second);
        assert!(first.actors.is_empty());
        assert!(first.genres.is_empty());
    }
}
