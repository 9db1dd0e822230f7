use tracing::{debug, info, warn};

use crate::bing::WebSearch;
use crate::chat::{ChatCompletion, ChatError, ChatMessage};
use crate::prompt::{self, AGENT_PREFIX, REFORMAT_TEMPLATE};

use super::parser::{AgentAction, parse_action};
use super::tool::SearchTool;

/// Upper bound on model turns per question.
pub const MAX_STEPS: usize = 5;

const AGENT_TEMPERATURE: f32 = 0.3;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("could not parse model output as a tool action")]
    OutputParse { raw: String },

    #[error("no final answer after {0} steps")]
    StepCapExceeded(usize),

    #[error(transparent)]
    Chat(#[from] ChatError),
}

/// Drives the tool-selection loop: per turn the model either invokes the
/// search tool or produces a final answer, in the JSON-action format the
/// system prompt prescribes.
pub struct AgentDispatcher<C, S> {
    chat: C,
    tool: SearchTool<S>,
}

impl<C: ChatCompletion, S: WebSearch> AgentDispatcher<C, S> {
    pub fn new(chat: C, tool: SearchTool<S>) -> Self {
        Self { chat, tool }
    }

    /// Run the loop, then apply the one-shot remediation: if the model's
    /// output could not be parsed, make exactly one corrective chat call
    /// asking it to reformat the leftover text as clean prose. The call
    /// goes to the same model at the same temperature as the agent turns.
    pub async fn run_with_fallback(&self, input: &str) -> Result<String, AgentError> {
        match self.run(input).await {
            Err(AgentError::OutputParse { raw }) => {
                warn!("unparseable model output, asking the model to reformat it");
                let reformat = prompt::render(REFORMAT_TEMPLATE, &[("error", &raw)]);
                let cleaned = self
                    .chat
                    .complete(&[ChatMessage::user(reformat)], AGENT_TEMPERATURE)
                    .await?;
                Ok(cleaned)
            }
            other => other,
        }
    }

    async fn run(&self, input: &str) -> Result<String, AgentError> {
        let tools = format!("{}: {}", self.tool.name(), self.tool.description());
        let system = prompt::render(AGENT_PREFIX, &[("tools", tools.as_str())]);

        let mut transcript = vec![ChatMessage::system(system), ChatMessage::user(input)];

        for step in 0..MAX_STEPS {
            let reply = self.chat.complete(&transcript, AGENT_TEMPERATURE).await?;

            match parse_action(&reply) {
                Some(AgentAction::FinalAnswer(answer)) => {
                    info!(step, "agent produced final answer");
                    return Ok(answer);
                }
                Some(AgentAction::Tool { name, input }) if name == self.tool.name() => {
                    debug!(step, tool = %name, query = %input, "agent invoked tool");
                    let observation = self.tool.run(&input).await;
                    transcript.push(ChatMessage::assistant(reply));
                    transcript.push(ChatMessage::user(format!(
                        "Observation: {observation}\nRespond with the next json action."
                    )));
                }
                Some(AgentAction::Tool { name, .. }) => {
                    warn!(tool = %name, "agent named an unregistered tool");
                    return Err(AgentError::OutputParse { raw: reply });
                }
                None => {
                    return Err(AgentError::OutputParse { raw: reply });
                }
            }
        }

        Err(AgentError::StepCapExceeded(MAX_STEPS))
    }
}
