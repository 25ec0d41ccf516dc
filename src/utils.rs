//! Utility functions shared by the detection and servo layers.

pub mod safe_cast;
