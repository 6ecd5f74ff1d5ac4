pub mod prompts;
pub mod recommendation;
pub mod summary;
