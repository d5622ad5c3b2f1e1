//! Template version numbering.
//!
//! Versions are dotted `major.minor` strings. New templates (and
//! duplicates) start at [`INITIAL_VERSION`]; snapshots advance the minor
//! component of the latest snapshot, starting at [`FIRST_SNAPSHOT_VERSION`].

/// Version assigned to brand-new and duplicated templates.
pub const INITIAL_VERSION: &str = "1.0";

/// Version of the first snapshot when no history exists yet.
pub const FIRST_SNAPSHOT_VERSION: &str = "1.1";

/// Compute the next snapshot version from the latest existing one.
///
/// A missing or malformed latest version falls back to
/// [`FIRST_SNAPSHOT_VERSION`] rather than failing the snapshot.
pub fn next_version(latest: Option<&str>) -> String {
    let Some(latest) = latest else {
        return FIRST_SNAPSHOT_VERSION.to_string();
    };
    match parse_version(latest) {
        Some((major, minor)) => format!("{major}.{}", minor + 1),
        None => FIRST_SNAPSHOT_VERSION.to_string(),
    }
}

fn parse_version(version: &str) -> Option<(u32, u32)> {
    let (major, minor) = version.split_once('.')?;
    Some((major.trim().parse().ok()?, minor.trim().parse().ok()?))
}
