pub mod entity_extraction;
pub mod model_invocation;
pub mod prompt_construction;
pub mod response_parsing;
pub mod types;

pub use entity_extraction::EntityExtractionTask;
pub use model_invocation::ModelInvocationTask;
pub use prompt_construction::PromptConstructionTask;
pub use response_parsing::ResponseParsingTask;
pub use types::context_keys;
