pub mod extraction_flow;
pub mod page_ctx;

pub use extraction_flow::{ExtractionFlow, ExtractionOutcome, ExtractionReport, RetryPolicy, SkipReason};
pub use page_ctx::PageCtx;
