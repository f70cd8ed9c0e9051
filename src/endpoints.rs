//! Raw API endpoints the browser is pointed at, and strict decoders for their bodies

use crate::{Error, Result};
use serde_json::Value;
use std::fmt;
use url::Url;

/// A value obtained either from the reference client or from a raw response
#[derive(Debug, Clone, PartialEq)]
pub enum ApiValue {
    /// Search suggestions in relevance order
    Suggestions(Vec<String>),
    /// Canonical page title
    Title(String),
    /// Nearby place names
    Places(Vec<String>),
    /// Canonical page URL
    Url(String),
}

impl ApiValue {
    /// Single-string payload of `Title`/`Url`
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ApiValue::Title(s) | ApiValue::Url(s) => Some(s),
            _ => None,
        }
    }

    /// List payload of `Suggestions`/`Places`
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ApiValue::Suggestions(v) | ApiValue::Places(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ApiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiValue::Suggestions(v) | ApiValue::Places(v) => write!(f, "{:?}", v),
            ApiValue::Title(s) | ApiValue::Url(s) => write!(f, "{:?}", s),
        }
    }
}

fn build(api_url: &str, params: &[(&str, &str)]) -> Result<Url> {
    Url::parse_with_params(api_url, params)
        .map_err(|e| Error::Config(format!("invalid api url '{}': {}", api_url, e)))
}

/// `action=opensearch&search=<q>&format=json`
pub fn opensearch_url(api_url: &str, query: &str) -> Result<Url> {
    build(
        api_url,
        &[("action", "opensearch"), ("search", query), ("format", "json")],
    )
}

/// `action=query&format=json&titles=<t>`
pub fn page_query_url(api_url: &str, title: &str) -> Result<Url> {
    build(
        api_url,
        &[("action", "query"), ("format", "json"), ("titles", title)],
    )
}

/// `action=query&list=geosearch&gscoord=<lat>|<lon>&format=json`
pub fn geosearch_url(api_url: &str, latitude: f64, longitude: f64) -> Result<Url> {
    let coord = format!("{}|{}", latitude, longitude);
    build(
        api_url,
        &[
            ("action", "query"),
            ("list", "geosearch"),
            ("gscoord", &coord),
            ("format", "json"),
        ],
    )
}

/// `action=query&prop=info&inprop=url&titles=<t>&format=json`
pub fn page_info_url(api_url: &str, title: &str) -> Result<Url> {
    build(
        api_url,
        &[
            ("action", "query"),
            ("prop", "info"),
            ("inprop", "url"),
            ("titles", title),
            ("format", "json"),
        ],
    )
}

fn api_error(body: &Value) -> Option<String> {
    let err = body.get("error")?;
    let info = err
        .get("info")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let code = err.get("code").and_then(Value::as_str).unwrap_or("?");
    Some(format!("API error {}: {}", code, info))
}

fn first_page(body: &Value) -> std::result::Result<&Value, String> {
    if let Some(e) = api_error(body) {
        return Err(e);
    }
    let pages = body
        .pointer("/query/pages")
        .and_then(Value::as_object)
        .ok_or_else(|| "response has no query.pages object".to_string())?;
    pages
        .values()
        .next()
        .ok_or_else(|| "query.pages is empty".to_string())
}

fn string_field(page: &Value, field: &str) -> std::result::Result<String, String> {
    page.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| format!("page has no string '{}' field", field))
}

/// Second element of the opensearch array: `[query, [titles], [descs], [urls]]`
pub fn decode_opensearch(body: &Value) -> std::result::Result<ApiValue, String> {
    if let Some(e) = api_error(body) {
        return Err(e);
    }
    let titles = body
        .get(1)
        .and_then(Value::as_array)
        .ok_or_else(|| "opensearch response has no title list".to_string())?;
    titles
        .iter()
        .map(|t| {
            t.as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("non-string suggestion: {}", t))
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(ApiValue::Suggestions)
}

/// Title of the first page in `query.pages`
pub fn decode_page_title(body: &Value) -> std::result::Result<ApiValue, String> {
    let page = first_page(body)?;
    string_field(page, "title").map(ApiValue::Title)
}

/// `fullurl` of the first page in `query.pages`
pub fn decode_page_url(body: &Value) -> std::result::Result<ApiValue, String> {
    let page = first_page(body)?;
    string_field(page, "fullurl").map(ApiValue::Url)
}

/// Titles listed under `query.geosearch`
pub fn decode_geosearch(body: &Value) -> std::result::Result<ApiValue, String> {
    if let Some(e) = api_error(body) {
        return Err(e);
    }
    let places = body
        .pointer("/query/geosearch")
        .and_then(Value::as_array)
        .ok_or_else(|| "response has no query.geosearch list".to_string())?;
    places
        .iter()
        .map(|p| string_field(p, "title"))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(ApiValue::Places)
}
