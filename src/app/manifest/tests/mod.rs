//! Integration tests for manifest extraction
//!
//! This module contains tests that run the complete pipeline over manifests
//! and source trees written to disk.
