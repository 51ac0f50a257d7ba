// Resume analysis: the three-tier synthesizer (primary AI, secondary AI,
// heuristic), result normalization, upload text extraction and HTTP handlers.
// All LLM calls go through llm_client.

pub mod extract;
pub mod handlers;
pub mod heuristic;
pub mod models;
pub mod normalize;
pub mod prompts;
pub mod synthesizer;
