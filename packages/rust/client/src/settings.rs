//! Index tuning settings.
//!
//! All fields are optional: a partial [`Settings`] sent to the engine only
//! touches the fields it carries. Resetting restores engine defaults.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The settings object of one index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Ranking rules, in order of importance (e.g. `typo`, `words`,
    /// `proximity`, `attribute`, `wordsPosition`, `exactness`, `asc(field)`,
    /// `desc(field)`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking_rules: Option<Vec<String>>,

    /// Field whose value deduplicates otherwise-identical hits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct_attribute: Option<String>,

    /// Fields searched for query terms, in order of importance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searchable_attributes: Option<Vec<String>>,

    /// Fields present in returned documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displayed_attributes: Option<Vec<String>>,

    /// Words ignored in queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_words: Option<Vec<String>>,

    /// Per-word synonym lists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<HashMap<String, Vec<String>>>,
}

#[allow(missing_docs)]
impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ranking_rules(self, rules: Vec<String>) -> Self {
        Self {
            ranking_rules: Some(rules),
            ..self
        }
    }

    pub fn with_distinct_attribute(self, attribute: impl Into<String>) -> Self {
        Self {
            distinct_attribute: Some(attribute.into()),
            ..self
        }
    }

    pub fn with_searchable_attributes(self, attributes: Vec<String>) -> Self {
        Self {
            searchable_attributes: Some(attributes),
            ..self
        }
    }

    pub fn with_displayed_attributes(self, attributes: Vec<String>) -> Self {
        Self {
            displayed_attributes: Some(attributes),
            ..self
        }
    }

    pub fn with_stop_words(self, words: Vec<String>) -> Self {
        Self {
            stop_words: Some(words),
            ..self
        }
    }

    pub fn with_synonyms(self, synonyms: HashMap<String, Vec<String>>) -> Self {
        Self {
            synonyms: Some(synonyms),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_serialize_only_set_fields() {
        let settings = Settings::new()
            .with_distinct_attribute("isbn")
            .with_stop_words(vec!["the".into(), "a".into()]);

        let json = serde_json::to_value(&settings).expect("serialize");
        let obj = json.as_object().expect("object");
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["distinctAttribute"], "isbn");
        assert!(obj.contains_key("stopWords"));
        assert!(!obj.contains_key("rankingRules"));
    }

    #[test]
    fn settings_roundtrip_camel_case() {
        let json = r#"{
            "rankingRules": ["typo", "words", "desc(release_date)"],
            "searchableAttributes": ["title", "overview"],
            "displayedAttributes": ["*"],
            "synonyms": {"movie": ["film"]}
        }"#;

        let settings: Settings = serde_json::from_str(json).expect("deserialize");
        assert_eq!(
            settings.ranking_rules.as_deref(),
            Some(["typo", "words", "desc(release_date)"].map(String::from).as_slice())
        );
        assert_eq!(settings.synonyms.as_ref().unwrap()["movie"], vec!["film"]);
        assert!(settings.stop_words.is_none());
    }
}
