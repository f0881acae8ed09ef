pub mod augmenter;
pub mod covers;
pub mod filters;
pub mod invoker;
pub mod parser;
pub mod prompt;
pub mod providers;
pub mod recommendations;

pub use covers::{CoverRequest, CoverResolver, CoverSource, PlaceholderCover};
pub use invoker::{Invocation, InvokerSettings, ModelInvoker};
pub use providers::{Generation, GenerationRequest, TextGenerator};
pub use recommendations::RecommendationPipeline;
