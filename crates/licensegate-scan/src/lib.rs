//! Copyright and license analyses over parsed patch changes.
//!
//! Two independent checks read the same immutable [`FileChange`] slice:
//! [`copyright::CopyrightAnalyzer`] flags deleted notices that were not
//! re-added, and [`license::LicenseAnalyzer`] classifies added and deleted
//! text through a [`oracle::LicenseOracle`] and applies the license policy.
//! [`report::ComplianceReport`] merges both results per file.
//!
//! [`FileChange`]: licensegate_core::FileChange

pub mod copyright;
pub mod license;
pub mod oracle;
pub mod report;
