//! Discovery domain workflows

pub mod company_discovery;
pub mod continuous_discovery;
pub mod dork_sweep;

pub use company_discovery::{
    CompanyDiscoveryRequest, CompanyDiscoveryResult, CompanyDiscoveryWorkflow, DiscoveryError,
};
pub use continuous_discovery::{
    ContinuousDiscoveryRequest, ContinuousDiscoveryResult, ContinuousDiscoveryWorkflow,
};
pub use dork_sweep::{DorkSweepRequest, DorkSweepResult, DorkSweepWorkflow, DEFAULT_RESULTS_PER_QUERY};
