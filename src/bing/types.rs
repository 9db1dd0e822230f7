use serde::{Deserialize, Serialize};

/// One web result, as consumed by the answer composer. Field order matches
/// the record shape the prompt templates describe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub snippet: String,
    pub title: String,
    pub link: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub web_pages: Option<WebPages>,
}

#[derive(Debug, Deserialize)]
pub struct WebPages {
    pub value: Option<Vec<WebPageRecord>>,
}

#[derive(Debug, Deserialize)]
pub struct WebPageRecord {
    pub name: Option<String>,
    pub url: Option<String>,
    pub snippet: Option<String>,
}
