pub mod client;

pub use client::SheetClient;
