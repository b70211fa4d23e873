//! GCP API interaction module
//!
//! Authentication, HTTP transport and the Compute Engine client used by
//! the machine type data source.
//!
//! # Module Structure
//!
//! - [`auth`] - Credentials and ambient project/zone defaults
//! - [`client`] - Compute Engine client and the machine type wire record
//! - [`http`] - HTTP utilities for REST API calls
//! - [`link`] - Self-link normalization
//!
//! # Example
//!
//! ```ignore
//! use gce_machine_type::gcp::{auth::Credentials, client::ComputeClient, http::GcpHttpClient};
//!
//! async fn example() -> gce_machine_type::Result<()> {
//!     let credentials = Credentials::discover(None).await?;
//!     let http = GcpHttpClient::new("gce-machine-type/dev")?;
//!     let client = ComputeClient::new(credentials, http, "https://compute.googleapis.com/");
//!     let mt = client.get_machine_type("my-project", "us-central1-a", "e2-medium").await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod link;
