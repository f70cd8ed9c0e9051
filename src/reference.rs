//! Reference data source: a blocking Wikipedia API client
//!
//! The client answers the same questions the browser scrape answers, through
//! the API's structured queries (`list=search`, `prop=info`, ...), and is the
//! side every comparison treats as the expectation.

use crate::{Error, HarnessConfig, Result};
use log::debug;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// API `info` strings that mean the request timed out server side
const TIMEOUT_INFOS: [&str; 2] = ["HTTP request timed out.", "Pool queue is full"];

/// Places requested by [`ReferenceSource::geosearch`], independent of `search_results`
pub const GEOSEARCH_RESULTS: u32 = 10;

/// The four questions every scenario asks of the reference side
pub trait ReferenceSource {
    /// Search suggestions for `query`, in relevance order
    fn suggest(&self, query: &str) -> Result<Vec<String>>;

    /// Canonical title of the page `page_title` resolves to
    fn canonical_title(&self, page_title: &str) -> Result<String>;

    /// Titles of pages near the coordinates
    fn geosearch(&self, latitude: f64, longitude: f64) -> Result<Vec<String>>;

    /// Canonical URL of the page `page_title` resolves to
    fn canonical_url(&self, page_title: &str) -> Result<String>;
}

/// Plain GET of a raw API URL, used where a scenario bypasses the browser
pub trait JsonFetcher {
    fn fetch_json(&self, url: &str) -> Result<Value>;
}

/// A resolved page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub page_id: u64,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<Q> {
    query: Option<Q>,
}

#[derive(Debug, Deserialize)]
struct Titled {
    title: String,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<Titled>,
    searchinfo: Option<SearchInfo>,
}

#[derive(Debug, Deserialize)]
struct SearchInfo {
    suggestion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeoQuery {
    #[serde(default)]
    geosearch: Vec<Titled>,
}

#[derive(Debug, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: BTreeMap<String, PageRecord>,
    #[serde(default)]
    redirects: Vec<Redirect>,
}

#[derive(Debug, Deserialize)]
struct Redirect {
    from: String,
    to: String,
}

#[derive(Debug, Deserialize)]
struct PageRecord {
    pageid: Option<u64>,
    title: Option<String>,
    fullurl: Option<String>,
    missing: Option<Value>,
    invalid: Option<Value>,
    pageprops: Option<Value>,
    extract: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParseEnvelope {
    parse: Option<ParseBody>,
}

#[derive(Debug, Deserialize)]
struct ParseBody {
    text: ParseText,
}

#[derive(Debug, Deserialize)]
struct ParseText {
    #[serde(rename = "*")]
    html: String,
}

/// Blocking client over the MediaWiki action API
pub struct WikiClient {
    http: Client,
    api_url: String,
    search_results: u32,
    geosearch_radius_m: u32,
    auto_suggest: bool,
}

impl WikiClient {
    pub fn new(config: &HarnessConfig) -> Result<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            search_results: config.search_results,
            geosearch_radius_m: config.geosearch_radius_m,
            auto_suggest: config.auto_suggest,
        })
    }

    fn call<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        let res = self
            .http
            .get(&self.api_url)
            .query(&[("format", "json")])
            .query(params)
            .send()?
            .error_for_status()?;
        let body: Value = serde_json::from_str(&res.text()?)
            .map_err(|e| Error::Network(format!("API response is not JSON: {}", e)))?;

        if let Some(err) = body.get("error") {
            let info = err.get("info").and_then(Value::as_str).unwrap_or("unknown error");
            let code = err.get("code").and_then(Value::as_str).unwrap_or("?");
            if TIMEOUT_INFOS.contains(&info) {
                return Err(Error::Network(format!("API timed out: {}", info)));
            }
            return Err(Error::Lookup(format!("API error {}: {}", code, info)));
        }

        serde_json::from_value(body)
            .map_err(|e| Error::Network(format!("unexpected API response shape: {}", e)))
    }

    fn query<Q: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<Q> {
        let mut all = vec![("action", "query")];
        all.extend_from_slice(params);
        let envelope: Envelope<Q> = self.call(&all)?;
        envelope
            .query
            .ok_or_else(|| Error::Lookup("API response carries no query result".into()))
    }

    /// Full-text search, up to `limit` titles
    pub fn search_with_limit(&self, query: &str, limit: u32) -> Result<Vec<String>> {
        self.search_with_suggestion(query, limit).map(|(titles, _)| titles)
    }

    /// Full-text search plus the API's spelling suggestion, if any
    pub fn search_with_suggestion(&self, query: &str, limit: u32) -> Result<(Vec<String>, Option<String>)> {
        let limit = limit.to_string();
        let found: SearchQuery = self.query(&[
            ("list", "search"),
            ("srprop", ""),
            ("srlimit", &limit),
            ("srinfo", "suggestion"),
            ("srsearch", query),
        ])?;
        let titles = found.search.into_iter().map(|t| t.title).collect();
        let suggestion = found.searchinfo.and_then(|i| i.suggestion);
        Ok((titles, suggestion))
    }

    /// Resolve `title` (optionally through search auto-suggest) to a page
    pub fn page(&self, title: &str) -> Result<PageInfo> {
        let title = if self.auto_suggest {
            let (results, suggestion) = self.search_with_suggestion(title, 1)?;
            suggestion
                .or_else(|| results.into_iter().next())
                .ok_or_else(|| Error::Lookup(format!("\"{}\" does not match any pages", title)))?
        } else {
            title.to_string()
        };
        self.load_page(&title, true)
    }

    /// Look `title` up exactly; a redirect is an error unless `follow_redirects`
    pub fn load_page(&self, title: &str, follow_redirects: bool) -> Result<PageInfo> {
        let found: PagesQuery = self.query(&[
            ("prop", "info|pageprops"),
            ("inprop", "url"),
            ("ppprop", "disambiguation"),
            ("redirects", ""),
            ("titles", title),
        ])?;

        if let Some(redirect) = found.redirects.first() {
            if !follow_redirects {
                return Err(Error::Lookup(format!(
                    "\"{}\" redirects to \"{}\"",
                    redirect.from, redirect.to
                )));
            }
            debug!("following redirect {} -> {}", redirect.from, redirect.to);
        }

        let page = single_page(title, found.pages)?;
        if page.pageprops.is_some() {
            let options = self.disambiguation_options(title)?;
            return Err(Error::Disambiguation {
                title: page.title.unwrap_or_else(|| title.to_string()),
                options,
            });
        }

        match (page.pageid, page.title, page.fullurl) {
            (Some(page_id), Some(title), Some(url)) => Ok(PageInfo { page_id, title, url }),
            _ => Err(Error::Lookup(format!("\"{}\" returned an incomplete page record", title))),
        }
    }

    /// Page id via `prop=info&inprop=url`, without redirect resolution
    pub fn page_id(&self, title: &str) -> Result<u64> {
        let found: PagesQuery = self.query(&[("prop", "info"), ("inprop", "url"), ("titles", title)])?;
        single_page(title, found.pages)?
            .pageid
            .ok_or_else(|| Error::Lookup(format!("\"{}\" has no page id", title)))
    }

    /// Plain-text intro of the page
    pub fn summary(&self, title: &str) -> Result<String> {
        let found: PagesQuery = self.query(&[
            ("prop", "extracts"),
            ("explaintext", ""),
            ("exintro", ""),
            ("redirects", ""),
            ("titles", title),
        ])?;
        single_page(title, found.pages)?
            .extract
            .ok_or_else(|| Error::Lookup(format!("\"{}\" has no extract", title)))
    }

    /// Link text of the entries a disambiguation page lists
    pub fn disambiguation_options(&self, title: &str) -> Result<Vec<String>> {
        let parsed: ParseEnvelope = self.call(&[
            ("action", "parse"),
            ("prop", "text"),
            ("redirects", ""),
            ("page", title),
        ])?;
        let html = parsed
            .parse
            .ok_or_else(|| Error::Lookup(format!("\"{}\" could not be parsed", title)))?
            .text
            .html;
        disambiguation_links(&html)
    }

    /// Titles near the coordinates, within the configured radius
    pub fn geosearch_with_limit(&self, latitude: f64, longitude: f64, limit: u32) -> Result<Vec<String>> {
        let coord = format!("{}|{}", latitude, longitude);
        let radius = self.geosearch_radius_m.to_string();
        let limit = limit.to_string();
        let found: GeoQuery = self.query(&[
            ("list", "geosearch"),
            ("gsradius", &radius),
            ("gscoord", &coord),
            ("gslimit", &limit),
        ])?;
        Ok(found.geosearch.into_iter().map(|t| t.title).collect())
    }
}

fn single_page(title: &str, pages: BTreeMap<String, PageRecord>) -> Result<PageRecord> {
    let page = pages
        .into_values()
        .next()
        .ok_or_else(|| Error::Lookup(format!("\"{}\" does not match any pages", title)))?;
    if page.missing.is_some() || page.invalid.is_some() {
        return Err(Error::Lookup(format!("\"{}\" does not match any pages", title)));
    }
    Ok(page)
}

/// First link of every list item outside the table of contents
fn disambiguation_links(html: &str) -> Result<Vec<String>> {
    let document = Html::parse_fragment(html);
    let li_sel = Selector::parse("li").map_err(|e| Error::Other(format!("invalid selector: {:?}", e)))?;
    let a_sel = Selector::parse("a").map_err(|e| Error::Other(format!("invalid selector: {:?}", e)))?;

    Ok(document
        .select(&li_sel)
        .filter(|li| !li.value().attr("class").unwrap_or("").contains("tocsection"))
        .filter_map(|li| li.select(&a_sel).next())
        .map(|a| a.text().collect::<String>())
        .filter(|text| !text.trim().is_empty())
        .collect())
}

impl JsonFetcher for WikiClient {
    fn fetch_json(&self, url: &str) -> Result<Value> {
        debug!("GET {}", url);
        let res = self.http.get(url).send()?.error_for_status()?;
        let body = res.text()?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Network(format!("response from {} is not JSON: {}", url, e)))
    }
}

impl ReferenceSource for WikiClient {
    fn suggest(&self, query: &str) -> Result<Vec<String>> {
        let titles = self.search_with_limit(query, self.search_results)?;
        if titles.is_empty() {
            return Err(Error::Lookup(format!("no search results for \"{}\"", query)));
        }
        Ok(titles)
    }

    fn canonical_title(&self, page_title: &str) -> Result<String> {
        self.page(page_title).map(|p| p.title)
    }

    fn geosearch(&self, latitude: f64, longitude: f64) -> Result<Vec<String>> {
        let places = self.geosearch_with_limit(latitude, longitude, GEOSEARCH_RESULTS)?;
        if places.is_empty() {
            return Err(Error::Lookup(format!(
                "no pages near ({}, {})",
                latitude, longitude
            )));
        }
        Ok(places)
    }

    fn canonical_url(&self, page_title: &str) -> Result<String> {
        self.page(page_title).map(|p| p.url)
    }
}
