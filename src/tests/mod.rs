//! # Scenario Test Suite
//!
//! End-to-end checks that drive several modules together: complex assembly
//! with its rollback guarantees, and time merging of whole networks read from
//! gauge files on disk.
