//! Data models for sources, collected articles and the model's gap analysis.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SourceDescriptor`]: A news outlet and the feed it publishes
//! - [`Article`]: One normalized feed entry, tagged with its outlet's metadata
//! - [`NewsSnapshot`]: Every article collected in one run, keyed by outlet
//! - [`AnalysisResult`]: The gap analysis returned by the LLM
//! - [`TopicAnalysis`]: A view over one topic of that analysis
//!
//! The analysis is kept as the JSON object the model returned. The field
//! names follow the schema embedded in the prompt, but the payload comes
//! straight from a generative model, so every read tolerates missing or
//! oddly typed values.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Gap score at or above which a topic is reported as a high-gap topic.
pub const HIGH_GAP_THRESHOLD: f64 = 60.0;

/// A news outlet and the feed it is collected from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceDescriptor {
    /// Display name, also the key in [`NewsSnapshot`].
    pub name: String,
    /// RSS or Atom feed URL.
    pub url: String,
    /// Region label, e.g. "Middle East (Qatar)".
    pub region: String,
    /// Editorial leaning label, e.g. "Center-Left".
    pub bias_tendency: String,
}

/// One feed entry, normalized and tagged with the outlet it came from.
///
/// Missing feed fields are stored as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    pub title: String,
    pub summary: String,
    pub link: String,
    /// Publication date as text; not parsed further.
    pub published: String,
    pub source: String,
    pub region: String,
    pub bias_tendency: String,
}

/// All articles collected in one run, keyed by source name.
///
/// Keys keep the order in which sources were collected, and serialize as a
/// JSON object in that order. The region of each source is remembered for
/// the prompt but is not part of the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsSnapshot {
    entries: Vec<SourceArticles>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceArticles {
    name: String,
    region: Option<String>,
    articles: Vec<Article>,
}

impl NewsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the articles for `source`, replacing any earlier list for it.
    pub fn insert(&mut self, source: impl Into<String>, articles: Vec<Article>) {
        let source = source.into();
        match self.entries.iter_mut().find(|entry| entry.name == source) {
            Some(existing) => existing.articles = articles,
            None => self.entries.push(SourceArticles {
                name: source,
                region: None,
                articles,
            }),
        }
    }

    /// Record the articles for a registry source along with its region.
    ///
    /// The region is kept even when `articles` is empty.
    pub fn insert_source(&mut self, source: &SourceDescriptor, articles: Vec<Article>) {
        self.insert(source.name.as_str(), articles);
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.name == source.name) {
            entry.region = Some(source.region.clone()).filter(|region| !region.is_empty());
        }
    }

    /// Iterate `(source, articles)` pairs in collection order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Article])> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.articles.as_slice()))
    }

    /// Iterate `(source, region)` pairs in collection order.
    pub fn regions(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.region.as_deref()))
    }

    pub fn source_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of articles across every source.
    pub fn total_articles(&self) -> usize {
        self.entries.iter().map(|entry| entry.articles.len()).sum()
    }
}

impl Serialize for NewsSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.name, &entry.articles)?;
        }
        map.end()
    }
}

/// The gap analysis produced by the model for one run.
///
/// Holds the JSON object exactly as the model sent it, key order and `null`s
/// included, so writing it back reproduces the payload. Nothing about its
/// shape is checked beyond it being an object; the accessors below read
/// whatever is there and fall back to `None` or an empty list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AnalysisResult {
    payload: Map<String, Value>,
}

impl AnalysisResult {
    pub fn new(payload: Map<String, Value>) -> Self {
        Self { payload }
    }

    pub fn analysis_date(&self) -> Option<String> {
        field_text(&self.payload, "analysis_date")
    }

    /// The overall score as the model wrote it, e.g. `65`, `62.5` or `"65"`.
    pub fn overall_gap_score(&self) -> Option<String> {
        field_text(&self.payload, "overall_gap_score")
    }

    pub fn summary(&self) -> Option<String> {
        field_text(&self.payload, "summary")
    }

    /// Topics in the order the model listed them; empty when `topics` is
    /// missing or not a list.
    pub fn topics(&self) -> Vec<TopicAnalysis<'_>> {
        match self.payload.get("topics") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| TopicAnalysis {
                    fields: item.as_object(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Topics whose gap score is at least [`HIGH_GAP_THRESHOLD`].
    ///
    /// Topics without a numeric score count as zero.
    pub fn high_gap_topics(&self) -> Vec<TopicAnalysis<'_>> {
        self.topics()
            .into_iter()
            .filter(|topic| topic.score_value().unwrap_or(0.0) >= HIGH_GAP_THRESHOLD)
            .collect()
    }
}

/// Read-only view of one entry of the model's `topics` list.
///
/// An entry that is not a JSON object reads as a topic with no fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopicAnalysis<'a> {
    fields: Option<&'a Map<String, Value>>,
}

impl<'a> TopicAnalysis<'a> {
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields.and_then(|fields| fields.get(key))
    }

    fn text(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_null()).map(display_value)
    }

    pub fn topic_name(&self) -> Option<String> {
        self.text("topic_name")
    }

    /// The score as the model wrote it.
    pub fn gap_score(&self) -> Option<String> {
        self.text("gap_score")
    }

    /// The score as a number. Numeric strings such as `"75"` are accepted.
    pub fn score_value(&self) -> Option<f64> {
        self.get("gap_score").and_then(numeric_value)
    }

    pub fn gap_level(&self) -> Option<String> {
        self.text("gap_level")
    }

    /// Source names covering the topic. `null` items are skipped and a single
    /// non-list value counts as one source.
    pub fn sources_covering(&self) -> Vec<String> {
        match self.get("sources_covering") {
            Some(Value::Array(items)) => items
                .iter()
                .filter(|v| !v.is_null())
                .map(display_value)
                .collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![display_value(other)],
        }
    }

    /// `(source, perspective)` pairs in the model's order.
    pub fn perspective_summary(&self) -> Vec<(&'a str, String)> {
        match self.get("perspective_summary") {
            Some(Value::Object(perspectives)) => perspectives
                .iter()
                .map(|(source, perspective)| (source.as_str(), display_value(perspective)))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn key_differences(&self) -> Option<String> {
        self.text("key_differences")
    }

    /// Check the model's score and label against the band table.
    ///
    /// Returns a description of every inconsistency found; an empty list
    /// means the topic is consistent or carries no score at all.
    pub fn band_inconsistencies(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let Some(score) = self.score_value() else {
            return problems;
        };
        match GapBand::from_score(score) {
            None => problems.push(format!("gap_score {score} is outside 0-100")),
            Some(band) => {
                if let Some(level) = self.gap_level() {
                    if !level.trim().eq_ignore_ascii_case(band.label()) {
                        problems.push(format!(
                            "gap_level {level:?} does not match score {score} (expected {:?})",
                            band.label()
                        ));
                    }
                }
            }
        }
        problems
    }
}

/// Strings are shown without quotes; anything else as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A number, or a string holding one; anything else is `None`.
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn field_text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).filter(|v| !v.is_null()).map(display_value)
}

/// The five gap-score bands the model is asked to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapBand {
    Minimal,
    Low,
    Moderate,
    High,
    Extreme,
}

impl GapBand {
    pub const ALL: [GapBand; 5] = [
        GapBand::Minimal,
        GapBand::Low,
        GapBand::Moderate,
        GapBand::High,
        GapBand::Extreme,
    ];

    /// Band for a score, or `None` if the score is outside 0-100.
    ///
    /// Fractional scores fall into the band of the next integer boundary,
    /// so 20.5 is `Low`.
    pub fn from_score(score: f64) -> Option<Self> {
        if !(0.0..=100.0).contains(&score) {
            return None;
        }
        let band = if score <= 20.0 {
            GapBand::Minimal
        } else if score <= 40.0 {
            GapBand::Low
        } else if score <= 60.0 {
            GapBand::Moderate
        } else if score <= 80.0 {
            GapBand::High
        } else {
            GapBand::Extreme
        };
        Some(band)
    }

    pub fn label(self) -> &'static str {
        match self {
            GapBand::Minimal => "Minimal",
            GapBand::Low => "Low",
            GapBand::Moderate => "Moderate",
            GapBand::High => "High",
            GapBand::Extreme => "Extreme",
        }
    }

    /// Inclusive score range for the band.
    pub fn range(self) -> (u8, u8) {
        match self {
            GapBand::Minimal => (0, 20),
            GapBand::Low => (21, 40),
            GapBand::Moderate => (41, 60),
            GapBand::High => (61, 80),
            GapBand::Extreme => (81, 100),
        }
    }
}

impl fmt::Display for GapBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article(source: &str, title: &str) -> Article {
        Article {
            title: title.to_string(),
            summary: String::new(),
            link: String::new(),
            published: String::new(),
            source: source.to_string(),
            region: "Region".to_string(),
            bias_tendency: "Center".to_string(),
        }
    }

    fn analysis(value: Value) -> AnalysisResult {
        serde_json::from_value(value).unwrap()
    }

    fn topic_with(score: Value, level: Option<&str>) -> AnalysisResult {
        analysis(json!({"topics": [{"topic_name": "Topic", "gap_score": score, "gap_level": level}]}))
    }

    #[test]
    fn test_snapshot_keeps_insertion_order_when_serialized() {
        let mut snapshot = NewsSnapshot::new();
        snapshot.insert("Zeta", vec![article("Zeta", "z")]);
        snapshot.insert("Alpha", vec![]);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.find("Zeta").unwrap() < json.find("Alpha").unwrap());
        assert_eq!(snapshot.total_articles(), 1);
        assert_eq!(snapshot.source_count(), 2);
    }

    #[test]
    fn test_snapshot_insert_replaces_existing_source() {
        let mut snapshot = NewsSnapshot::new();
        snapshot.insert("CNN", vec![article("CNN", "a")]);
        snapshot.insert("CNN", vec![article("CNN", "b"), article("CNN", "c")]);

        assert_eq!(snapshot.source_count(), 1);
        assert_eq!(snapshot.total_articles(), 2);
    }

    #[test]
    fn test_snapshot_remembers_region_of_empty_source() {
        let source = SourceDescriptor {
            name: "Al Jazeera".to_string(),
            url: "https://www.aljazeera.com/xml/rss/all.xml".to_string(),
            region: "Middle East (Qatar)".to_string(),
            bias_tendency: "Center".to_string(),
        };
        let mut snapshot = NewsSnapshot::new();
        snapshot.insert_source(&source, vec![]);
        snapshot.insert("Unlisted", vec![]);

        let regions: Vec<(&str, Option<&str>)> = snapshot.regions().collect();
        assert_eq!(
            regions,
            vec![("Al Jazeera", Some("Middle East (Qatar)")), ("Unlisted", None)]
        );
        assert_eq!(
            serde_json::to_string(&snapshot).unwrap(),
            r#"{"Al Jazeera":[],"Unlisted":[]}"#
        );
    }

    #[test]
    fn test_article_serializes_snake_case_fields() {
        let json = serde_json::to_string(&article("CNN", "Headline")).unwrap();
        assert!(json.contains("\"bias_tendency\":\"Center\""));
        assert!(json.contains("\"published\":\"\""));
    }

    #[test]
    fn test_analysis_with_missing_fields() {
        let analysis: AnalysisResult = serde_json::from_str(r#"{"summary": "Calm day"}"#).unwrap();
        assert_eq!(analysis.summary().as_deref(), Some("Calm day"));
        assert!(analysis.topics().is_empty());
        assert!(analysis.overall_gap_score().is_none());

        let json = serde_json::to_string(&analysis).unwrap();
        assert_eq!(json, r#"{"summary":"Calm day"}"#);
    }

    #[test]
    fn test_analysis_keeps_key_order_nulls_and_unknown_fields() {
        let raw = r#"{"summary":"s","model_notes":null,"overall_gap_score":65,"topics":[{"gap_score":70,"topic_name":"T","confidence":0.7}],"analysis_date":"2025-05-06"}"#;
        let analysis: AnalysisResult = serde_json::from_str(raw).unwrap();

        assert_eq!(serde_json::to_string(&analysis).unwrap(), raw);
    }

    #[test]
    fn test_loosely_typed_fields_are_read_leniently() {
        let analysis = analysis(json!({
            "overall_gap_score": "65",
            "analysis_date": null,
            "topics": [{
                "topic_name": "Trade",
                "gap_score": "75",
                "sources_covering": ["CNN", null, "Global Times"],
                "key_differences": ["Blame", "Scale"]
            }]
        }));

        assert_eq!(analysis.overall_gap_score().as_deref(), Some("65"));
        assert!(analysis.analysis_date().is_none());
        let topics = analysis.topics();
        let topic = &topics[0];
        assert_eq!(topic.gap_score().as_deref(), Some("75"));
        assert_eq!(topic.score_value(), Some(75.0));
        assert_eq!(topic.sources_covering(), vec!["CNN", "Global Times"]);
        assert_eq!(topic.key_differences().as_deref(), Some(r#"["Blame","Scale"]"#));
    }

    #[test]
    fn test_non_object_topics_read_as_empty() {
        assert!(analysis(json!({"topics": "none"})).topics().is_empty());

        let odd = analysis(json!({"topics": ["just text", 42]}));
        let topics = odd.topics();
        assert_eq!(topics.len(), 2);
        assert!(topics[0].topic_name().is_none());
        assert!(topics[1].sources_covering().is_empty());
        assert!(topics[1].perspective_summary().is_empty());
    }

    #[test]
    fn test_perspective_summary_keeps_model_order() {
        let analysis = analysis(json!({"topics": [{
            "perspective_summary": {"Global Times": "c", "CNN": "a", "Al Jazeera": ["b"]}
        }]}));
        let topics = analysis.topics();
        let perspectives = topics[0].perspective_summary();
        assert_eq!(
            perspectives,
            vec![
                ("Global Times", "c".to_string()),
                ("CNN", "a".to_string()),
                ("Al Jazeera", r#"["b"]"#.to_string()),
            ]
        );
    }

    #[test]
    fn test_high_gap_topics_threshold_is_inclusive() {
        let analysis = analysis(json!({"topics": [
            {"gap_score": 75},
            {"gap_score": 30},
            {"gap_score": 60},
            {"gap_score": "80"},
            {"gap_score": "very high"},
            {"gap_score": true},
            {}
        ]}));

        let high: Vec<f64> = analysis
            .high_gap_topics()
            .iter()
            .map(|t| t.score_value().unwrap())
            .collect();
        assert_eq!(high, vec![75.0, 60.0, 80.0]);
    }

    #[test]
    fn test_numeric_value() {
        assert_eq!(numeric_value(&json!(62.5)), Some(62.5));
        assert_eq!(numeric_value(&json!(" 40 ")), Some(40.0));
        assert_eq!(numeric_value(&json!("NaN")), None);
        assert_eq!(numeric_value(&json!(null)), None);
        assert_eq!(numeric_value(&json!([75])), None);
    }

    #[test]
    fn test_gap_band_boundaries() {
        assert_eq!(GapBand::from_score(0.0), Some(GapBand::Minimal));
        assert_eq!(GapBand::from_score(20.0), Some(GapBand::Minimal));
        assert_eq!(GapBand::from_score(21.0), Some(GapBand::Low));
        assert_eq!(GapBand::from_score(60.0), Some(GapBand::Moderate));
        assert_eq!(GapBand::from_score(61.0), Some(GapBand::High));
        assert_eq!(GapBand::from_score(100.0), Some(GapBand::Extreme));
        assert_eq!(GapBand::from_score(101.0), None);
        assert_eq!(GapBand::from_score(-1.0), None);
    }

    #[test]
    fn test_gap_band_ranges_cover_zero_to_hundred() {
        let mut expected_low = 0u8;
        for band in GapBand::ALL {
            let (low, high) = band.range();
            assert_eq!(low, expected_low);
            assert_eq!(GapBand::from_score(low as f64), Some(band));
            assert_eq!(GapBand::from_score(high as f64), Some(band));
            expected_low = high.saturating_add(1);
        }
        assert_eq!(expected_low, 101);
    }

    #[test]
    fn test_band_inconsistencies_are_reported_not_rejected() {
        let inconsistencies = |score: Value, level: Option<&str>| {
            topic_with(score, level).topics()[0].band_inconsistencies()
        };

        assert!(inconsistencies(json!(75), Some("High")).is_empty());
        assert!(inconsistencies(json!(75), Some("high")).is_empty());
        assert!(inconsistencies(json!("75"), Some("High")).is_empty());
        assert_eq!(inconsistencies(json!(75), Some("Minimal")).len(), 1);

        let problems = inconsistencies(json!(150), Some("Extreme"));
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("outside 0-100"));

        assert!(inconsistencies(Value::Null, None).is_empty());
    }
}
