//! End-to-end tests: index → fetch → aggregate → render → persist
//! against an in-memory market.

mod mock_market;
mod pipeline;
