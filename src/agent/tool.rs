use tracing::warn;

use crate::bing::WebSearch;
use crate::prompt::render_results;

/// Fixed observation handed back to the model when the search failed or
/// found nothing.
pub const TOOL_SENTINEL: &str = "No Results Found";

const DEFAULT_RESULT_COUNT: u8 = 5;

/// The `@bing` search tool: a thin call-through to the search client whose
/// failures never escape into the dispatcher loop.
pub struct SearchTool<S> {
    search: S,
    k: u8,
}

impl<S: WebSearch> SearchTool<S> {
    pub fn new(search: S) -> Self {
        Self {
            search,
            k: DEFAULT_RESULT_COUNT,
        }
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &S {
        &self.search
    }

    pub fn name(&self) -> &'static str {
        "@bing"
    }

    pub fn description(&self) -> &'static str {
        "useful when the questions includes the term: @bing.\n"
    }

    /// Run the query and render the results as JSON records. Any transport
    /// or API failure is swallowed into the tool sentinel.
    pub async fn run(&self, query: &str) -> String {
        match self.search.search(query, self.k).await {
            Ok(results) if !results.is_empty() => render_results(&results),
            Ok(_) => TOOL_SENTINEL.to_string(),
            Err(e) => {
                warn!(error = %e, "search tool failed, returning sentinel");
                TOOL_SENTINEL.to_string()
            }
        }
    }
}
