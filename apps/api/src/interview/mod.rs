pub mod graph;
pub mod handlers;
pub mod nodes;
pub mod prompts;
pub mod session;
pub mod state;
pub mod store;
