//! Behavioural tests for the dispatch layer.
//!
//! Each request path is exercised end to end through [`crate::Shell`] with
//! capturing fakes standing in for the transport, the engines, and the
//! metadata client.

mod support;
