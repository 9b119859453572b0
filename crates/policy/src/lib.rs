//! Authorization policy for privileged chat commands.
//!
//! Holds the admin roster, the channel allowlist and the feature flags, and
//! mirrors every change to a line-based `KEY=value` file so that a restart or
//! [`AuthorizationPolicy::reload`] reconstructs the same state.

pub mod env_file;
pub mod error;
pub mod policy;
pub mod state;

pub use env_file::EnvFile;
pub use error::PolicyError;
pub use policy::{AuthorizationPolicy, Decision};
pub use state::{FeatureFlag, PolicyState};
