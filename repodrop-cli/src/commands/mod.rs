//! CLI command implementations

pub mod deploy;
pub mod resolve;

pub use deploy::DeployArgs;
pub use resolve::ResolveArgs;
