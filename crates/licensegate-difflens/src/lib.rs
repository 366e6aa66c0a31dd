//! Patch segmentation and path exclusion.
//!
//! Splits a git-style unified diff into typed [`FileChange`] records and
//! drops files matched by `.licenseignore` patterns before analysis.
//!
//! [`FileChange`]: licensegate_core::FileChange
pub mod filter;
pub mod parser;
