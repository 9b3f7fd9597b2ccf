pub mod cancel;
pub mod generation;
pub mod limiter;
pub mod openai;
pub mod orchestrator;
