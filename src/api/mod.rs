pub mod client;
pub mod error;
pub mod gemini;
pub mod sheet;

pub use client::{Delivery, SummaryProvider, SyncEndpoint};
pub use error::ApiError;
pub use gemini::GeminiClient;
pub use sheet::SheetClient;
