//! Integration tests against a mock SIGAA portal
//!
//! These tests use wiremock to serve portal pages and drive the real
//! `HttpFetcher` through login, traversal and persistence.

mod portal_tests;
