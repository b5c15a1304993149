//! Unit tests for the order lifecycle context.

mod support;
