// Testing Tools Library
//
// This crate provides testing utilities and tools for the event hub.
// Currently includes:
// - sse-test-client: end-to-end broadcast testing tool against a running hub

pub mod api_client;
pub mod output;
pub mod scenarios;
pub mod sse_client;
