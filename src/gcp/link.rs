//! Self-link helpers

const COMPUTE_SEGMENT: &str = "/compute/";
const PROJECTS_SEGMENT: &str = "/projects/";

/// Rewrite a Compute Engine self-link to the `v1` API version
///
/// `https://www.googleapis.com/compute/beta/projects/p/zones/z/machineTypes/m`
/// becomes `https://www.googleapis.com/compute/v1/projects/p/zones/z/machineTypes/m`.
/// Links without a `/compute/<version>/projects/` section are returned as-is.
pub fn self_link_to_v1(link: &str) -> String {
    let Some(start) = link.find(COMPUTE_SEGMENT) else {
        return link.to_string();
    };
    let rest = &link[start + COMPUTE_SEGMENT.len()..];

    match rest.find(PROJECTS_SEGMENT) {
        Some(end) if rest[..end].chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!("{}/compute/v1{}", &link[..start], &rest[end..])
        }
        _ => link.to_string(),
    }
}

/// Last path segment of a self-link, or the input itself when it is a bare name
pub fn resource_name_from_self_link(link: &str) -> &str {
    link.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(link)
}
