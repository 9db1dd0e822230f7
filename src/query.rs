//! Builds site-restricted search queries for the council website.

/// Search operator limiting results to the council website.
pub const SITE_FILTER: &str = "site:www.leicestershire.gov.uk";

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("question must not be empty")]
    EmptyQuestion,
}

/// Prefix the question with the site-restriction operator, exactly once.
/// A question that already carries the filter is passed through unchanged.
pub fn build_search_query(question: &str) -> Result<String, QueryError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(QueryError::EmptyQuestion);
    }
    if question.split_whitespace().any(|token| token == SITE_FILTER) {
        return Ok(question.to_string());
    }
    Ok(format!("{SITE_FILTER} {question}"))
}
