//! Search queries and results.
//!
//! [`Query`] is a borrowing builder over the engine's search parameters;
//! [`SearchResults`] deserializes the engine's response with hits typed by
//! the caller.

use std::collections::HashMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::errors::Result;
use crate::indexes::Index;

// ---------------------------------------------------------------------------
// SearchResults
// ---------------------------------------------------------------------------

/// Search results and metadata about how they were produced.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults<T> {
    /// Matching documents, best first.
    pub hits: Vec<T>,
    /// Number of documents skipped.
    pub offset: usize,
    /// Maximum number of documents returned.
    pub limit: usize,
    /// Total number of matches.
    pub nb_hits: usize,
    /// Whether `nb_hits` is exact or a lower bound.
    pub exhaustive_nb_hits: bool,
    /// Per-facet value counts, when facet distribution was requested.
    #[serde(default)]
    pub facets_distribution: Option<HashMap<String, HashMap<String, usize>>>,
    /// Whether the facet counts are exact.
    #[serde(default)]
    pub exhaustive_facets_count: Option<bool>,
    /// Engine-side processing time in milliseconds.
    pub processing_time_ms: usize,
    /// The query string that produced these results.
    pub query: String,
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// A search query, built with borrowing `with_*` methods.
///
/// ```
/// # use lumen_client::search::Query;
/// let query = Query::new("space")
///     .with_offset(42)
///     .with_limit(21);
/// ```
#[derive(Debug, Clone)]
pub struct Query<'a> {
    /// The text the engine searches for. The only mandatory parameter.
    pub query: &'a str,
    /// Number of documents to skip, for pagination. Default: 0.
    pub offset: Option<usize>,
    /// Maximum number of documents returned. Default: 20.
    pub limit: Option<usize>,
    /// Attribute filter expression, e.g. `release_date > 1590537600`.
    pub filters: Option<&'a str>,
    /// Facet filters: the outer list is OR, each inner list is AND.
    pub facet_filters: Option<Vec<Vec<&'a str>>>,
    /// Facets to count matches for. `Some(None)` requests all facets (`*`).
    pub facets_distribution: Option<Option<Vec<&'a str>>>,
    /// Comma-separated attributes to include in returned documents.
    pub attributes_to_retrieve: Option<&'a str>,
    /// Comma-separated attributes to crop around the match.
    pub attributes_to_crop: Option<&'a str>,
    /// Characters kept on each side of a cropped match. Default: 200.
    pub crop_length: Option<usize>,
    /// Comma-separated attributes to wrap matches in `<em>` tags.
    pub attributes_to_highlight: Option<&'a str>,
}

#[allow(missing_docs)]
impl<'a> Query<'a> {
    pub fn new(query: &'a str) -> Query<'a> {
        Query {
            query,
            offset: None,
            limit: None,
            filters: None,
            facet_filters: None,
            facets_distribution: None,
            attributes_to_retrieve: None,
            attributes_to_crop: None,
            crop_length: None,
            attributes_to_highlight: None,
        }
    }

    pub fn with_offset(self, offset: usize) -> Query<'a> {
        Query {
            offset: Some(offset),
            ..self
        }
    }

    pub fn with_limit(self, limit: usize) -> Query<'a> {
        Query {
            limit: Some(limit),
            ..self
        }
    }

    pub fn with_filters(self, filters: &'a str) -> Query<'a> {
        Query {
            filters: Some(filters),
            ..self
        }
    }

    pub fn with_facet_filters(self, facet_filters: Vec<Vec<&'a str>>) -> Query<'a> {
        Query {
            facet_filters: Some(facet_filters),
            ..self
        }
    }

    pub fn with_facets_distribution(self, facets: Option<Vec<&'a str>>) -> Query<'a> {
        Query {
            facets_distribution: Some(facets),
            ..self
        }
    }

    pub fn with_attributes_to_retrieve(self, attributes: &'a str) -> Query<'a> {
        Query {
            attributes_to_retrieve: Some(attributes),
            ..self
        }
    }

    pub fn with_attributes_to_crop(self, attributes: &'a str) -> Query<'a> {
        Query {
            attributes_to_crop: Some(attributes),
            ..self
        }
    }

    pub fn with_crop_length(self, crop_length: usize) -> Query<'a> {
        Query {
            crop_length: Some(crop_length),
            ..self
        }
    }

    pub fn with_attributes_to_highlight(self, attributes: &'a str) -> Query<'a> {
        Query {
            attributes_to_highlight: Some(attributes),
            ..self
        }
    }
}

impl Query<'_> {
    /// Encode the query as the search endpoint's query string.
    ///
    /// List-valued parameters (`facetFilters`, `facetsDistribution`) are
    /// JSON-encoded inside the pair, matching what the engine parses.
    pub(crate) fn to_query_string(&self) -> Result<String> {
        let mut pairs = url::form_urlencoded::Serializer::new(String::new());
        pairs.append_pair("q", self.query);

        if let Some(offset) = self.offset {
            pairs.append_pair("offset", &offset.to_string());
        }
        if let Some(limit) = self.limit {
            pairs.append_pair("limit", &limit.to_string());
        }
        if let Some(filters) = self.filters {
            pairs.append_pair("filters", filters);
        }
        if let Some(facet_filters) = &self.facet_filters {
            pairs.append_pair("facetFilters", &serde_json::to_string(facet_filters)?);
        }
        if let Some(facets_distribution) = &self.facets_distribution {
            match facets_distribution {
                Some(facets) => {
                    pairs.append_pair("facetsDistribution", &serde_json::to_string(facets)?)
                }
                None => pairs.append_pair("facetsDistribution", "*"),
            };
        }
        if let Some(attributes) = self.attributes_to_retrieve {
            pairs.append_pair("attributesToRetrieve", attributes);
        }
        if let Some(attributes) = self.attributes_to_crop {
            pairs.append_pair("attributesToCrop", attributes);
        }
        if let Some(crop_length) = self.crop_length {
            pairs.append_pair("cropLength", &crop_length.to_string());
        }
        if let Some(attributes) = self.attributes_to_highlight {
            pairs.append_pair("attributesToHighlight", attributes);
        }

        Ok(pairs.finish())
    }

    /// Alias for [`Index::search`].
    pub async fn execute<T: DeserializeOwned>(&self, index: &Index<'_>) -> Result<SearchResults<T>> {
        index.search::<T>(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_query_encodes_q_only() {
        let qs = Query::new("space").to_query_string().unwrap();
        assert_eq!(qs, "q=space");
    }

    #[test]
    fn query_text_is_percent_encoded() {
        let qs = Query::new("déjà vu & more").to_query_string().unwrap();
        assert!(qs.starts_with("q="));
        // The '&' inside the query must not split the pair.
        assert!(qs.contains("%26"));
        // Spaces become '+' in form encoding.
        assert!(qs.contains('+'));
    }

    #[test]
    fn pagination_parameters_encode() {
        let qs = Query::new("space")
            .with_offset(42)
            .with_limit(21)
            .to_query_string()
            .unwrap();
        assert!(qs.contains("offset=42"));
        assert!(qs.contains("limit=21"));
    }

    #[test]
    fn facet_filters_are_json_encoded() {
        let qs = Query::new("space")
            .with_facet_filters(vec![vec!["genre:sci-fi", "genre:drama"], vec!["lang:en"]])
            .to_query_string()
            .unwrap();

        // The JSON array survives inside the pair, percent-encoded.
        assert!(qs.contains("facetFilters="));
        assert!(qs.contains("%5B%5B%22genre%3Asci-fi%22"));
    }

    #[test]
    fn facets_distribution_wildcard_is_star() {
        let qs = Query::new("space")
            .with_facets_distribution(None)
            .to_query_string()
            .unwrap();
        assert!(qs.contains("facetsDistribution=*") || qs.contains("facetsDistribution=%2A"));

        let qs = Query::new("space")
            .with_facets_distribution(Some(vec!["genre"]))
            .to_query_string()
            .unwrap();
        assert!(qs.contains("facetsDistribution=%5B%22genre%22%5D"));
    }

    #[test]
    fn crop_and_highlight_parameters_encode() {
        let qs = Query::new("space")
            .with_attributes_to_retrieve("title,overview")
            .with_attributes_to_crop("overview")
            .with_crop_length(50)
            .with_attributes_to_highlight("title")
            .to_query_string()
            .unwrap();

        assert!(qs.contains("attributesToRetrieve=title%2Coverview"));
        assert!(qs.contains("attributesToCrop=overview"));
        assert!(qs.contains("cropLength=50"));
        assert!(qs.contains("attributesToHighlight=title"));
    }

    #[test]
    fn search_results_deserialize() {
        #[derive(Debug, Deserialize)]
        struct Movie {
            title: String,
        }

        let results: SearchResults<Movie> = serde_json::from_str(
            r#"{
                "hits": [{"title": "Interstellar"}, {"title": "Gravity"}],
                "offset": 0,
                "limit": 20,
                "nbHits": 2,
                "exhaustiveNbHits": false,
                "facetsDistribution": {"genre": {"sci-fi": 2}},
                "exhaustiveFacetsCount": true,
                "processingTimeMs": 3,
                "query": "space"
            }"#,
        )
        .expect("deserialize search results");

        assert_eq!(results.hits.len(), 2);
        assert_eq!(results.hits[0].title, "Interstellar");
        assert_eq!(results.nb_hits, 2);
        assert_eq!(results.facets_distribution.unwrap()["genre"]["sci-fi"], 2);
    }

    #[test]
    fn search_results_without_facets() {
        let results: SearchResults<serde_json::Value> = serde_json::from_str(
            r#"{
                "hits": [],
                "offset": 0,
                "limit": 20,
                "nbHits": 0,
                "exhaustiveNbHits": true,
                "processingTimeMs": 1,
                "query": "nothing"
            }"#,
        )
        .expect("deserialize empty results");

        assert!(results.hits.is_empty());
        assert!(results.facets_distribution.is_none());
        assert!(results.exhaustive_facets_count.is_none());
    }
}
