//! The direct ask pipeline: build a site-restricted query, search, render the
//! combine prompt, and return the model's answer.
//!
//! Zero search results and a failed search request are distinct outcomes in
//! the type system, but both collapse to the fixed sentinel answer at the
//! output boundary; logs tell them apart.

use tracing::{info, warn};

use crate::bing::WebSearch;
use crate::chat::{ChatCompletion, ChatError, ChatMessage};
use crate::prompt;
use crate::query::{self, QueryError};

/// Fallback answer when the search found nothing or could not be reached.
pub const NO_ANSWER_SENTINEL: &str =
    "I'm sorry, I couldn't find an answer to your question on the Leicestershire County Council website.";

/// Default number of web results requested per question.
pub const RESULT_COUNT: u8 = 5;

const ANSWER_TEMPERATURE: f32 = 0.0;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Chat(#[from] ChatError),
}

/// Answer one question from the council website. Search results are used for
/// exactly this question and discarded afterwards.
pub async fn answer(
    search: &impl WebSearch,
    chat: &impl ChatCompletion,
    question: &str,
    count: u8,
) -> Result<String, PipelineError> {
    let search_query = query::build_search_query(question)?;

    let results = match search.search(&search_query, count).await {
        Ok(results) => results,
        Err(e) => {
            warn!(error = %e, "search request failed, answering with sentinel");
            return Ok(NO_ANSWER_SENTINEL.to_string());
        }
    };

    if results.is_empty() {
        info!(query = %search_query, "no web results, answering with sentinel");
        return Ok(NO_ANSWER_SENTINEL.to_string());
    }

    info!(results = results.len(), "composing answer from web results");
    let prompt = prompt::compose_answer_prompt(question, &results);
    let answer = chat
        .complete(&[ChatMessage::user(prompt)], ANSWER_TEMPERATURE)
        .await?;

    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::bing::{BingError, SearchResult};

    struct MockSearch {
        responses: Mutex<VecDeque<Result<Vec<SearchResult>, BingError>>>,
        queries: Mutex<Vec<String>>,
    }

    impl MockSearch {
        fn returning(response: Result<Vec<SearchResult>, BingError>) -> Self {
            Self {
                responses: Mutex::new(VecDeque::from([response])),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn captured_queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    impl WebSearch for MockSearch {
        async fn search(
            &self,
            query: &str,
            _count: u8,
        ) -> Result<Vec<SearchResult>, BingError> {
            self.queries.lock().unwrap().push(query.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(vec![]))
        }
    }

    struct MockChat {
        responses: Mutex<VecDeque<Result<String, ChatError>>>,
        prompts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl MockChat {
        fn returning(replies: Vec<&str>) -> Self {
            Self {
                responses: Mutex::new(
                    replies.into_iter().map(|r| Ok(r.to_string())).collect(),
                ),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        fn captured_prompts(&self) -> Vec<Vec<ChatMessage>> {
            self.prompts.lock().unwrap().clone()
        }
    }

    impl ChatCompletion for MockChat {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _temperature: f32,
        ) -> Result<String, ChatError> {
            self.prompts.lock().unwrap().push(messages.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ChatError::EmptyResponse))
        }
    }

    fn result(snippet: &str, title: &str, link: &str) -> SearchResult {
        SearchResult {
            snippet: snippet.to_string(),
            title: title.to_string(),
            link: link.to_string(),
        }
    }

    #[tokio::test]
    async fn zero_results_answers_with_sentinel_without_calling_chat() {
        let search = MockSearch::returning(Ok(vec![]));
        let chat = MockChat::returning(vec![]);

        let answer = answer(&search, &chat, "what is $50 in Euros?", RESULT_COUNT)
            .await
            .unwrap();

        assert_eq!(answer, NO_ANSWER_SENTINEL);
        assert_eq!(chat.call_count(), 0);
    }

    #[tokio::test]
    async fn search_failure_answers_with_sentinel() {
        let search = MockSearch::returning(Err(BingError::Api {
            code: 500,
            message: "server error".into(),
        }));
        let chat = MockChat::returning(vec![]);

        let answer = answer(&search, &chat, "what is $50 in Euros?", RESULT_COUNT)
            .await
            .unwrap();

        assert_eq!(answer, NO_ANSWER_SENTINEL);
        assert_eq!(chat.call_count(), 0);
    }

    #[tokio::test]
    async fn results_are_composed_into_the_prompt() {
        let search = MockSearch::returning(Ok(vec![result(
            "an initial non-refundable application fee of £150",
            "Vehicle access | Leicestershire County Council",
            "https://www.leicestershire.gov.uk/dropped-kerbs",
        )]));
        let chat = MockChat::returning(vec!["The application fee is **£150**."]);

        let answer = answer(&search, &chat, "cost to drop a kerb?", RESULT_COUNT)
            .await
            .unwrap();

        assert_eq!(answer, "The application fee is **£150**.");

        let prompts = chat.captured_prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].len(), 1);
        assert_eq!(prompts[0][0].role, "user");
        assert!(prompts[0][0].content.contains("£150"));
        assert!(prompts[0][0]
            .content
            .contains("Question: cost to drop a kerb?"));
    }

    #[tokio::test]
    async fn search_query_carries_the_site_filter() {
        let search = MockSearch::returning(Ok(vec![]));
        let chat = MockChat::returning(vec![]);

        answer(&search, &chat, "blue badge", RESULT_COUNT)
            .await
            .unwrap();

        let queries = search.captured_queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0], "site:www.leicestershire.gov.uk blue badge");
    }

    #[tokio::test]
    async fn empty_question_is_a_query_error() {
        let search = MockSearch::returning(Ok(vec![]));
        let chat = MockChat::returning(vec![]);

        let err = answer(&search, &chat, "  ", RESULT_COUNT).await.unwrap_err();
        assert!(matches!(err, PipelineError::Query(QueryError::EmptyQuestion)));
    }

    #[tokio::test]
    async fn end_to_end_missing_web_pages_key_yields_exact_sentinel() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7.0/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"_type": "SearchResponse"})),
            )
            .mount(&server)
            .await;

        let bing = crate::bing::BingClient::with_base_url(reqwest::Client::new(), &server.uri());
        let chat = MockChat::returning(vec![]);

        let answer = answer(&bing, &chat, "what is $50 in Euros?", RESULT_COUNT)
            .await
            .unwrap();

        assert_eq!(
            answer,
            "I'm sorry, I couldn't find an answer to your question on the Leicestershire County Council website."
        );
        assert_eq!(chat.call_count(), 0);
    }

    #[tokio::test]
    async fn chat_errors_propagate() {
        let search = MockSearch::returning(Ok(vec![result(
            "text",
            "title",
            "https://www.leicestershire.gov.uk",
        )]));
        let chat = MockChat {
            responses: Mutex::new(VecDeque::from([Err(ChatError::RateLimited)])),
            prompts: Mutex::new(Vec::new()),
        };

        let err = answer(&search, &chat, "blue badge", RESULT_COUNT)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Chat(ChatError::RateLimited)));
    }
}
