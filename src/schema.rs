//! Data source schema
//!
//! Describes the attributes of the machine type data source the way a
//! configuration language host sees them.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Required,
    /// May be set by the user, filled in from provider defaults otherwise
    OptionalComputed,
    Computed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "element")]
pub enum AttributeType {
    String,
    Int,
    Bool,
    /// Repeated nested block
    List(&'static [Attribute]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttributeType,
    pub mode: Mode,
}

const fn attr(name: &'static str, kind: AttributeType, mode: Mode) -> Attribute {
    Attribute { name, kind, mode }
}

pub const SCRATCH_DISK_SCHEMA: &[Attribute] = &[attr("disk_gb", AttributeType::Int, Mode::Computed)];

pub const ACCELERATOR_SCHEMA: &[Attribute] = &[
    attr("guest_accelerator_count", AttributeType::Int, Mode::Computed),
    attr("guest_accelerator_type", AttributeType::String, Mode::Computed),
];

/// Name under which the data source is registered
pub const DATA_SOURCE_NAME: &str = "google_compute_machine_type";

pub const MACHINE_TYPE_SCHEMA: &[Attribute] = &[
    attr("project", AttributeType::String, Mode::OptionalComputed),
    attr("zone", AttributeType::String, Mode::OptionalComputed),
    attr("machine_type", AttributeType::String, Mode::Required),
    attr("name", AttributeType::String, Mode::Computed),
    attr("description", AttributeType::String, Mode::Computed),
    attr("guest_cpus", AttributeType::Int, Mode::Computed),
    attr("memory_mb", AttributeType::Int, Mode::Computed),
    attr("image_space_gb", AttributeType::Int, Mode::Computed),
    attr(
        "scratch_disks",
        AttributeType::List(SCRATCH_DISK_SCHEMA),
        Mode::Computed,
    ),
    attr("maximum_persistent_disks", AttributeType::Int, Mode::Computed),
    attr(
        "maximum_persistent_disks_size_gb",
        AttributeType::Int,
        Mode::Computed,
    ),
    attr("self_link", AttributeType::String, Mode::Computed),
    attr("is_shared_cpu", AttributeType::Bool, Mode::Computed),
    attr(
        "accelerators",
        AttributeType::List(ACCELERATOR_SCHEMA),
        Mode::Computed,
    ),
    attr("id", AttributeType::String, Mode::Computed),
];
