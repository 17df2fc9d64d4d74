pub mod demo;

pub use demo::{DemoFlow, DemoOutcome, DemoSummary};
