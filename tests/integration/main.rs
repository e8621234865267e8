//! HTTP-level tests over the in-memory backend

mod api_tests;
mod common;
mod guard_tests;
