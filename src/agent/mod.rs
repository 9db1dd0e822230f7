//! Tool-dispatching agent mode: the model decides per turn whether to invoke
//! the search tool or answer directly, with a one-shot corrective re-prompt
//! when its output cannot be parsed as a tool action.

pub mod dispatcher;
pub mod parser;
pub mod tool;

pub use dispatcher::{AgentDispatcher, AgentError};
pub use tool::SearchTool;
