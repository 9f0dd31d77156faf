//! Paper data model.
//!
//! The search API returns loosely shaped JSON: the journal arrives as `journalName`
//! or `v_journal_name`, citation counts sit either at the top level or under
//! `impactFactor`, authors may be a string or a list. [`Paper`] deserializes through
//! a lenient raw shape so every variant lands on one canonical structure, and a
//! field of the wrong type falls back to its default.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A research paper from the Veritus search API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Value")]
pub struct Paper {
    /// Corpus identifier.
    pub id: String,

    /// Paper title.
    pub title: String,

    /// Author list as a single display string.
    pub authors: String,

    /// Paper abstract.
    pub r#abstract: Option<String>,

    /// Publication year.
    pub year: Option<i32>,

    /// Citation metrics.
    pub impact_factor: ImpactFactor,

    /// Fields of study (e.g., "Computer Science").
    pub fields_of_study: Vec<String>,

    /// Journal quartile ranking (e.g., "Q1").
    pub quartile_ranking: Option<String>,

    /// Journal or venue name.
    pub journal_name: Option<String>,

    /// Direct PDF link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_link: Option<String>,

    /// Landing page link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// Digital Object Identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_open_access: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloadable: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pre_print: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,

    /// Relevance score assigned by the search engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Short AI-generated summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tldr: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Citation metrics for a paper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactFactor {
    #[serde(default)]
    pub citation_count: u64,
    #[serde(default)]
    pub influential_citation_count: u64,
    #[serde(default)]
    pub reference_count: u64,
}

impl Paper {
    /// Get citation count.
    #[must_use]
    pub const fn citations(&self) -> u64 {
        self.impact_factor.citation_count
    }

    /// Best link to read the paper: PDF first, then landing page, then DOI resolver.
    #[must_use]
    pub fn best_link(&self) -> Option<String> {
        self.pdf_link
            .clone()
            .or_else(|| self.link.clone())
            .or_else(|| self.doi.as_ref().map(|doi| format!("https://doi.org/{doi}")))
    }

    /// Abstract text, or a placeholder when the API has none.
    #[must_use]
    pub fn abstract_or_default(&self) -> &str {
        self.r#abstract.as_deref().unwrap_or("No abstract available")
    }
}

/// Wire shape of a paper, accepting every field variant the API is known to send.
///
/// Every field is kept as raw JSON and coerced when converted, so a mistyped
/// field drops to its default instead of failing the whole response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPaper {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    corpus_id: Option<Value>,
    #[serde(default)]
    title: Option<Value>,
    #[serde(default)]
    authors: Option<Value>,
    #[serde(default)]
    r#abstract: Option<Value>,
    #[serde(default)]
    year: Option<Value>,
    #[serde(default)]
    impact_factor: Option<Value>,
    #[serde(default)]
    citation_count: Option<Value>,
    #[serde(default)]
    influential_citation_count: Option<Value>,
    #[serde(default)]
    reference_count: Option<Value>,
    #[serde(default)]
    fields_of_study: Option<Value>,
    #[serde(default)]
    quartile_ranking: Option<Value>,
    #[serde(default, rename = "v_quartile_ranking")]
    v_quartile_ranking: Option<Value>,
    #[serde(default, alias = "journal")]
    journal_name: Option<Value>,
    #[serde(default, rename = "v_journal_name")]
    v_journal_name: Option<Value>,
    #[serde(default)]
    pdf_link: Option<Value>,
    #[serde(default)]
    link: Option<Value>,
    #[serde(default)]
    title_link: Option<Value>,
    #[serde(default)]
    semantic_link: Option<Value>,
    #[serde(default)]
    doi: Option<Value>,
    #[serde(default)]
    is_open_access: Option<Value>,
    #[serde(default)]
    downloadable: Option<Value>,
    #[serde(default)]
    is_pre_print: Option<Value>,
    #[serde(default)]
    publication_type: Option<Value>,
    #[serde(default)]
    published_at: Option<Value>,
    #[serde(default)]
    score: Option<Value>,
    #[serde(default)]
    tldr: Option<Value>,
    #[serde(default)]
    publisher: Option<Value>,
    #[serde(default, rename = "v_publisher")]
    v_publisher: Option<Value>,
    #[serde(default)]
    country: Option<Value>,
    #[serde(default, rename = "v_country")]
    v_country: Option<Value>,
}

impl From<Value> for Paper {
    /// Never fails: anything that is not an object becomes an empty paper.
    fn from(value: Value) -> Self {
        RawPaper::deserialize(value).unwrap_or_default().into()
    }
}

impl From<RawPaper> for Paper {
    fn from(raw: RawPaper) -> Self {
        let nested = raw.impact_factor.as_ref();
        let count = |key: &str, flat: Option<&Value>| {
            nested.and_then(|n| n.get(key)).and_then(as_count).or_else(|| flat.and_then(as_count))
        };
        let impact_factor = ImpactFactor {
            citation_count: count("citationCount", raw.citation_count.as_ref()).unwrap_or(0),
            influential_citation_count: count(
                "influentialCitationCount",
                raw.influential_citation_count.as_ref(),
            )
            .unwrap_or(0),
            reference_count: count("referenceCount", raw.reference_count.as_ref()).unwrap_or(0),
        };

        Self {
            id: raw
                .id
                .filter(|v| !v.is_null())
                .or(raw.corpus_id)
                .as_ref()
                .map(scalar_to_string)
                .unwrap_or_default(),
            title: text(raw.title).unwrap_or_else(|| "Untitled".to_string()),
            authors: raw.authors.as_ref().map(author_string).unwrap_or_default(),
            r#abstract: text(raw.r#abstract),
            year: raw.year.as_ref().and_then(as_year),
            impact_factor,
            fields_of_study: raw.fields_of_study.as_ref().map(string_list).unwrap_or_default(),
            quartile_ranking: text(raw.quartile_ranking).or_else(|| text(raw.v_quartile_ranking)),
            journal_name: text(raw.journal_name).or_else(|| text(raw.v_journal_name)),
            pdf_link: text(raw.pdf_link),
            link: text(raw.link)
                .or_else(|| text(raw.title_link))
                .or_else(|| text(raw.semantic_link)),
            doi: text(raw.doi),
            is_open_access: raw.is_open_access.as_ref().and_then(as_flag),
            downloadable: raw.downloadable.as_ref().and_then(as_flag),
            is_pre_print: raw.is_pre_print.as_ref().and_then(as_flag),
            publication_type: text(raw.publication_type),
            published_at: text(raw.published_at),
            score: raw.score.as_ref().and_then(as_float),
            tldr: raw.tldr.as_ref().and_then(tldr_text),
            publisher: text(raw.publisher).or_else(|| text(raw.v_publisher)),
            country: text(raw.country).or_else(|| text(raw.v_country)),
        }
    }
}

/// Non-blank string or number rendered as text.
fn text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|f: &f64| f.is_finite())
}

fn as_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|y| i32::try_from(y).ok())
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && f.abs() < 1e6).map(|f| f as i32)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// `["A", "B"]`, `[{"category": "A"}]` or a single `"A"`.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(obj) => obj
                    .get("category")
                    .or_else(|| obj.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Flatten `"A, B"`, `["A", "B"]` or `[{"name": "A"}, ...]` into one display string.
fn author_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.as_str()),
                Value::Object(obj) => obj.get("name").and_then(Value::as_str),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

/// The API sends `tldr` either as text or as `{"text": ...}`.
fn tldr_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(obj) => obj.get("text").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}
