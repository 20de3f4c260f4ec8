pub mod client;
pub mod types;

pub use client::{build_prompt, GeminiClient};
