//! Chat service core: content providers, citation extraction, and the
//! streaming response pipeline.
//!
//! The mock provider streams canned Markdown locally. Network providers call
//! OpenAI-compatible or Anthropic APIs.

pub mod citations;
pub mod mock;
pub mod pipeline;
pub mod providers;
pub mod selector;
pub mod sse;
pub mod store;
pub mod types;

pub use citations::CitationTable;
pub use mock::MockProvider;
pub use pipeline::{ChatPipeline, EventStream, StreamAccumulator, StreamEvent};
pub use providers::{FragmentEvent, FragmentStream, Provider};
pub use selector::select_provider;
pub use store::ConversationStore;
pub use types::*;
