//! Compute Engine machine type data source
//!
//! Looks up a machine type by project, zone and name and flattens it into
//! a [`machine_type::MachineTypeData`] record.
//!
//! ```ignore
//! use gce_machine_type::{config::{Config, ProviderContext}, machine_type::{read, MachineTypeQuery}};
//!
//! let ctx = ProviderContext::from_config(&Config::load()).await?;
//! let data = read(&ctx, &MachineTypeQuery::new("n1-standard-4").with_zone("us-central1-a")).await?;
//! println!("{} has {} vCPUs", data.id, data.guest_cpus);
//! ```

pub mod config;
pub mod error;
pub mod gcp;
pub mod machine_type;
pub mod schema;

pub use error::{Error, Result};
