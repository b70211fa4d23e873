//! Machine type data source
//!
//! Resolves project, zone and machine type name, performs a single
//! `machineTypes.get` lookup and flattens the response into a
//! [`MachineTypeData`] record.

use crate::config::ProviderContext;
use crate::error::{Error, Result};
use crate::gcp::client::{self, MachineType};
use crate::gcp::link::{resource_name_from_self_link, self_link_to_v1};
use serde::Serialize;

/// Data source input
#[derive(Debug, Clone, Default)]
pub struct MachineTypeQuery {
    pub project: Option<String>,
    pub zone: Option<String>,
    pub machine_type: Option<String>,
}

impl MachineTypeQuery {
    pub fn new(machine_type: &str) -> Self {
        Self {
            machine_type: Some(machine_type.to_string()),
            ..Default::default()
        }
    }

    pub fn with_project(mut self, project: &str) -> Self {
        self.project = Some(project.to_string());
        self
    }

    pub fn with_zone(mut self, zone: &str) -> Self {
        self.zone = Some(zone.to_string());
        self
    }
}

/// Data source output, rebuilt from the API response on every read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineTypeData {
    pub project: String,
    pub name: String,
    pub description: String,
    pub guest_cpus: i64,
    pub memory_mb: i64,
    pub image_space_gb: i64,
    pub scratch_disks: Vec<ScratchDiskData>,
    pub maximum_persistent_disks: i64,
    pub maximum_persistent_disks_size_gb: i64,
    pub zone: String,
    pub self_link: String,
    pub is_shared_cpu: bool,
    pub accelerators: Vec<AcceleratorData>,
    /// `projects/{project}/zones/{zone}/machineTypes/{name}`
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScratchDiskData {
    pub disk_gb: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceleratorData {
    pub guest_accelerator_count: i64,
    pub guest_accelerator_type: String,
}

/// Identifiers a lookup needs, all resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub project: String,
    pub zone: String,
    pub machine_type: String,
}

fn explicit(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Project from the query, else the provider default
pub fn resolve_project(query: &MachineTypeQuery, ctx: &ProviderContext) -> Result<String> {
    explicit(&query.project)
        .or_else(|| ctx.default_project())
        .map(str::to_string)
        .ok_or(Error::MissingProject)
}

/// Zone from the query (a zone self-link is reduced to its name), else the provider default
pub fn resolve_zone(query: &MachineTypeQuery, ctx: &ProviderContext) -> Result<String> {
    explicit(&query.zone)
        .map(resource_name_from_self_link)
        .or_else(|| ctx.default_zone())
        .map(str::to_string)
        .ok_or(Error::MissingZone)
}

/// Machine type name; never defaulted
pub fn resolve_machine_type(query: &MachineTypeQuery) -> Result<String> {
    explicit(&query.machine_type)
        .map(str::to_string)
        .ok_or(Error::MissingMachineType)
}

/// Resolve every identifier before anything is sent to the API
pub fn resolve(query: &MachineTypeQuery, ctx: &ProviderContext) -> Result<ResolvedQuery> {
    Ok(ResolvedQuery {
        project: resolve_project(query, ctx)?,
        zone: resolve_zone(query, ctx)?,
        machine_type: resolve_machine_type(query)?,
    })
}

/// Read one machine type
pub async fn read(ctx: &ProviderContext, query: &MachineTypeQuery) -> Result<MachineTypeData> {
    let resolved = resolve(query, ctx)?;
    tracing::debug!(
        "Reading machine type {} in {}/{}",
        resolved.machine_type,
        resolved.project,
        resolved.zone
    );

    let record = ctx
        .compute_client()
        .await?
        .get_machine_type(&resolved.project, &resolved.zone, &resolved.machine_type)
        .await?;

    flatten(&resolved.project, &resolved.zone, record)
}

/// Project an API record into the data source output
///
/// Either every field is set or the error names the field that failed.
/// The id is derived only once all other fields are in place.
pub fn flatten(project: &str, zone: &str, record: MachineType) -> Result<MachineTypeData> {
    if record.name.is_empty() {
        return Err(Error::Field {
            field: "name",
            reason: "response did not include a machine type name".to_string(),
        });
    }

    let maximum_persistent_disks_size_gb = match &record.maximum_persistent_disks_size_gb {
        Some(value) => value.parse().map_err(|e| Error::Field {
            field: "maximum_persistent_disks_size_gb",
            reason: format!("invalid int64 {:?}: {}", value, e),
        })?,
        None => 0,
    };

    let accelerators = flatten_accelerators(&record.accelerators);
    let scratch_disks = flatten_scratch_disks(&record.scratch_disks);

    let mut data = MachineTypeData {
        project: project.to_string(),
        name: record.name,
        description: record.description,
        guest_cpus: record.guest_cpus,
        memory_mb: record.memory_mb,
        image_space_gb: record.image_space_gb,
        scratch_disks,
        maximum_persistent_disks: record.maximum_persistent_disks,
        maximum_persistent_disks_size_gb,
        zone: zone.to_string(),
        self_link: self_link_to_v1(&record.self_link),
        is_shared_cpu: record.is_shared_cpu,
        accelerators,
        id: String::new(),
    };
    data.id = machine_type_id(project, zone, &data.name);

    Ok(data)
}

/// Composite id of a machine type
pub fn machine_type_id(project: &str, zone: &str, name: &str) -> String {
    format!("projects/{}/zones/{}/machineTypes/{}", project, zone, name)
}

pub fn flatten_scratch_disks(disks: &[client::ScratchDisk]) -> Vec<ScratchDiskData> {
    disks
        .iter()
        .map(|disk| ScratchDiskData {
            disk_gb: disk.disk_gb,
        })
        .collect()
}

pub fn flatten_accelerators(accelerators: &[client::Accelerator]) -> Vec<AcceleratorData> {
    accelerators
        .iter()
        .map(|accelerator| AcceleratorData {
            guest_accelerator_count: accelerator.guest_accelerator_count,
            guest_accelerator_type: accelerator.guest_accelerator_type.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcp::auth::Credentials;
    use crate::gcp::client::{Accelerator, Int64, ScratchDisk};
    use url::Url;

    fn ctx() -> ProviderContext {
        ProviderContext::new(
            Credentials::AccessToken("t".to_string()),
            Url::parse("http://127.0.0.1:9/").unwrap(),
        )
    }

    fn n1_standard_4() -> MachineType {
        MachineType {
            name: "n1-standard-4".to_string(),
            description: "4 vCPUs, 15 GB RAM".to_string(),
            guest_cpus: 4,
            memory_mb: 15360,
            maximum_persistent_disks: 128,
            maximum_persistent_disks_size_gb: Some(Int64::Text("263168".to_string())),
            zone: "us-central1-a".to_string(),
            self_link: "https://www.googleapis.com/compute/beta/projects/my-proj/zones/us-central1-a/machineTypes/n1-standard-4".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_prefers_explicit_values() {
        let ctx = ctx()
            .with_default_project(Some("default-proj".to_string()))
            .with_default_zone(Some("europe-west1-b".to_string()));
        let query = MachineTypeQuery::new("e2-medium")
            .with_project("my-proj")
            .with_zone("us-central1-a");

        let resolved = resolve(&query, &ctx).unwrap();
        assert_eq!(resolved.project, "my-proj");
        assert_eq!(resolved.zone, "us-central1-a");
        assert_eq!(resolved.machine_type, "e2-medium");
    }

    #[test]
    fn test_resolve_falls_back_to_context_defaults() {
        let ctx = ctx()
            .with_default_project(Some("default-proj".to_string()))
            .with_default_zone(Some("europe-west1-b".to_string()));

        let resolved = resolve(&MachineTypeQuery::new("e2-medium"), &ctx).unwrap();
        assert_eq!(resolved.project, "default-proj");
        assert_eq!(resolved.zone, "europe-west1-b");
    }

    #[test]
    fn test_resolve_zone_from_self_link() {
        let ctx = ctx().with_default_project(Some("default-proj".to_string()));
        let query = MachineTypeQuery::new("e2-medium").with_zone(
            "https://www.googleapis.com/compute/v1/projects/default-proj/zones/asia-east1-a",
        );
        assert_eq!(resolve_zone(&query, &ctx).unwrap(), "asia-east1-a");
    }

    #[test]
    fn test_missing_project_is_config_error() {
        let query = MachineTypeQuery::new("e2-medium").with_zone("us-central1-a");
        assert!(matches!(resolve(&query, &ctx()), Err(Error::MissingProject)));
    }

    #[test]
    fn test_missing_zone() {
        let ctx = ctx().with_default_project(Some("default-proj".to_string()));
        let query = MachineTypeQuery::new("e2-medium").with_zone("  ");
        assert!(matches!(resolve(&query, &ctx), Err(Error::MissingZone)));
    }

    #[test]
    fn test_missing_machine_type() {
        let ctx = ctx()
            .with_default_project(Some("default-proj".to_string()))
            .with_default_zone(Some("us-central1-a".to_string()));
        let query = MachineTypeQuery::default();
        assert!(matches!(resolve(&query, &ctx), Err(Error::MissingMachineType)));
    }

    #[test]
    fn test_flatten_example_record() {
        let data = flatten("my-proj", "us-central1-a", n1_standard_4()).unwrap();

        assert_eq!(
            data.id,
            "projects/my-proj/zones/us-central1-a/machineTypes/n1-standard-4"
        );
        assert_eq!(data.guest_cpus, 4);
        assert_eq!(data.memory_mb, 15360);
        assert_eq!(data.maximum_persistent_disks_size_gb, 263168);
        assert!(data.scratch_disks.is_empty());
        assert!(data.accelerators.is_empty());
        assert_eq!(
            data.self_link,
            "https://www.googleapis.com/compute/v1/projects/my-proj/zones/us-central1-a/machineTypes/n1-standard-4"
        );
    }

    #[test]
    fn test_flatten_empty_sequences_serialize_as_empty_lists() {
        let data = flatten("my-proj", "us-central1-a", n1_standard_4()).unwrap();
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["scratch_disks"], serde_json::json!([]));
        assert_eq!(value["accelerators"], serde_json::json!([]));
    }

    #[test]
    fn test_flatten_preserves_nested_order() {
        let mut record = n1_standard_4();
        record.scratch_disks = vec![
            ScratchDisk { disk_gb: 375 },
            ScratchDisk { disk_gb: 375 },
            ScratchDisk { disk_gb: 3000 },
        ];
        record.accelerators = vec![
            Accelerator {
                guest_accelerator_count: 2,
                guest_accelerator_type: "nvidia-tesla-t4".to_string(),
            },
            Accelerator {
                guest_accelerator_count: 1,
                guest_accelerator_type: "nvidia-l4".to_string(),
            },
        ];

        let data = flatten("my-proj", "us-central1-a", record).unwrap();
        let disks: Vec<i64> = data.scratch_disks.iter().map(|d| d.disk_gb).collect();
        assert_eq!(disks, vec![375, 375, 3000]);
        assert_eq!(data.accelerators[0].guest_accelerator_type, "nvidia-tesla-t4");
        assert_eq!(data.accelerators[1].guest_accelerator_count, 1);
    }

    #[test]
    fn test_flatten_names_failing_field() {
        let mut record = n1_standard_4();
        record.maximum_persistent_disks_size_gb = Some(Int64::Text("huge".to_string()));

        match flatten("my-proj", "us-central1-a", record) {
            Err(Error::Field { field, .. }) => {
                assert_eq!(field, "maximum_persistent_disks_size_gb")
            }
            other => panic!("expected field error, got {:?}", other),
        }
    }

    #[test]
    fn test_flatten_rejects_nameless_record() {
        let record = MachineType::default();
        assert!(matches!(
            flatten("p", "z", record),
            Err(Error::Field { field: "name", .. })
        ));
    }
}
