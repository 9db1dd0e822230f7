use super::types::{SearchResponse, SearchResult};

/// Map the `webPages.value` array into result records. A response without a
/// `webPages` key (Bing's shape for zero hits) yields an empty list, which is
/// a distinct outcome from a failed request.
pub fn extract_results(response: &SearchResponse) -> Vec<SearchResult> {
    response
        .web_pages
        .as_ref()
        .and_then(|pages| pages.value.as_ref())
        .map(|records| {
            records
                .iter()
                .filter_map(|record| {
                    let link = record.url.as_ref().filter(|u| !u.is_empty())?.clone();
                    Some(SearchResult {
                        snippet: record.snippet.clone().unwrap_or_default(),
                        title: record.name.clone().unwrap_or_default(),
                        link,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
