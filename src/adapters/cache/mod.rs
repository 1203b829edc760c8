//! In-memory caching layer for per-tenant risk summaries.
//!
//! Uses `moka` for TTL-based concurrent caching. The engine drops a tenant's
//! entry whenever a sweep changed that tenant's flags, so readers never see a
//! summary older than the last sweep plus the TTL.

pub mod risk_summary_cache;

pub use risk_summary_cache::{OrgRiskSummary, RiskSummaryCache};
