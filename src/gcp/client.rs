//! Compute Engine client
//!
//! Combines credentials and the HTTP client to perform machine type
//! lookups against the Compute Engine v1 REST API.

use super::auth::Credentials;
use super::http::GcpHttpClient;
use crate::error::{Error, Result};
use serde::Deserialize;

/// Public Compute Engine endpoint
pub const DEFAULT_COMPUTE_ENDPOINT: &str = "https://compute.googleapis.com/";

/// Resource kind reported in not-found errors
pub const MACHINE_TYPE_KIND: &str = "Machine Type";

/// A machine type as returned by `machineTypes.get`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MachineType {
    pub name: String,
    pub description: String,
    pub guest_cpus: i64,
    pub memory_mb: i64,
    pub image_space_gb: i64,
    pub scratch_disks: Vec<ScratchDisk>,
    pub maximum_persistent_disks: i64,
    /// int64 fields are encoded as decimal strings by the API
    pub maximum_persistent_disks_size_gb: Option<Int64>,
    pub zone: String,
    pub self_link: String,
    pub is_shared_cpu: bool,
    pub accelerators: Vec<Accelerator>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScratchDisk {
    pub disk_gb: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Accelerator {
    pub guest_accelerator_count: i64,
    pub guest_accelerator_type: String,
}

/// JSON int64 value, either a decimal string or a plain number
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Int64 {
    Number(i64),
    Text(String),
}

impl Int64 {
    pub fn parse(&self) -> std::result::Result<i64, std::num::ParseIntError> {
        match self {
            Int64::Number(n) => Ok(*n),
            Int64::Text(s) => s.trim().parse(),
        }
    }
}

/// Compute Engine client
#[derive(Clone)]
pub struct ComputeClient {
    pub credentials: Credentials,
    pub http: GcpHttpClient,
    endpoint: String,
}

impl ComputeClient {
    pub fn new(credentials: Credentials, http: GcpHttpClient, endpoint: &str) -> Self {
        Self {
            credentials,
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Build Compute Engine API URL for a project-scoped path
    pub fn compute_url(&self, project: &str, path: &str) -> String {
        format!(
            "{}/compute/v1/projects/{}/{}",
            self.endpoint,
            urlencoding::encode(project),
            path
        )
    }

    /// Build zonal Compute Engine API URL
    pub fn compute_zonal_url(&self, project: &str, zone: &str, resource: &str) -> String {
        self.compute_url(
            project,
            &format!("zones/{}/{}", urlencoding::encode(zone), resource),
        )
    }

    /// Fetch one machine type
    ///
    /// A 404 becomes [`Error::NotFound`] tagged with the machine type name;
    /// every other failure is returned unchanged.
    pub async fn get_machine_type(
        &self,
        project: &str,
        zone: &str,
        name: &str,
    ) -> Result<MachineType> {
        let url = self.compute_zonal_url(
            project,
            zone,
            &format!("machineTypes/{}", urlencoding::encode(name)),
        );
        let token = self.credentials.token().await?;

        match self.http.get::<MachineType>(&url, &token).await {
            Err(Error::Api { status: 404, .. }) => {
                tracing::info!("Machine type {} not found in {}/{}", name, project, zone);
                Err(Error::NotFound {
                    kind: MACHINE_TYPE_KIND,
                    name: name.to_string(),
                })
            }
            Err(err) => {
                tracing::warn!("Machine type {} lookup failed: {}", name, err);
                Err(err)
            }
            Ok(machine_type) => Ok(machine_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> ComputeClient {
        ComputeClient::new(
            Credentials::AccessToken("t".to_string()),
            GcpHttpClient::new("test-agent").unwrap(),
            endpoint,
        )
    }

    #[test]
    fn test_compute_zonal_url() {
        let c = client(DEFAULT_COMPUTE_ENDPOINT);
        assert_eq!(
            c.compute_zonal_url("my-proj", "us-central1-a", "machineTypes/n1-standard-4"),
            "https://compute.googleapis.com/compute/v1/projects/my-proj/zones/us-central1-a/machineTypes/n1-standard-4"
        );
    }

    #[test]
    fn test_compute_url_encodes_segments() {
        let c = client("http://localhost:8080");
        assert_eq!(
            c.compute_zonal_url("p", "z/../x", "r"),
            "http://localhost:8080/compute/v1/projects/p/zones/z%2F..%2Fx/r"
        );
    }

    #[test]
    fn test_machine_type_deserializes_api_shape() {
        let body = serde_json::json!({
            "kind": "compute#machineType",
            "id": "3004",
            "name": "a2-highgpu-1g",
            "description": "12 vCPUs, 85 GB RAM, 1 GPU",
            "guestCpus": 12,
            "memoryMb": 87040,
            "imageSpaceGb": 0,
            "maximumPersistentDisks": 128,
            "maximumPersistentDisksSizeGb": "263168",
            "zone": "us-central1-a",
            "selfLink": "https://www.googleapis.com/compute/v1/projects/p/zones/us-central1-a/machineTypes/a2-highgpu-1g",
            "isSharedCpu": false,
            "accelerators": [
                {"guestAcceleratorType": "nvidia-tesla-a100", "guestAcceleratorCount": 1}
            ]
        });

        let mt: MachineType = serde_json::from_value(body).unwrap();
        assert_eq!(mt.guest_cpus, 12);
        assert_eq!(mt.maximum_persistent_disks_size_gb.unwrap().parse().unwrap(), 263168);
        assert!(mt.scratch_disks.is_empty());
        assert_eq!(mt.accelerators[0].guest_accelerator_type, "nvidia-tesla-a100");
    }

    #[test]
    fn test_int64_accepts_number_and_string() {
        assert_eq!(Int64::Number(7).parse().unwrap(), 7);
        assert_eq!(Int64::Text("42".to_string()).parse().unwrap(), 42);
        assert!(Int64::Text("lots".to_string()).parse().is_err());
    }
}
