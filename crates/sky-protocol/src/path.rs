//! REST paths
//!
//! Path shapes for every endpoint the source layer talks to. Identifiers are
//! embedded verbatim, so they are validated first.

use crate::error::ProtocolError;

pub const SOURCES: &str = "/api/sources";
pub const SOURCE_VIEWS: &str = "/api/internal/source_views";
pub const CLASSIFICATION: &str = "/api/classification";
pub const COMMENT: &str = "/api/comment";
pub const FOLLOWUP_REQUEST: &str = "/api/followup_request";
pub const PHOTOMETRY: &str = "/api/photometry";

pub const SYSINFO: &str = "/api/sysinfo";
pub const DB_INFO: &str = "/api/internal/dbinfo";
pub const PROFILE: &str = "/api/internal/profile";
pub const GROUPS: &str = "/api/groups";
pub const NEWSFEED: &str = "/api/newsfeed";
pub const TOP_SOURCES: &str = "/api/internal/source_views";
pub const INSTRUMENTS: &str = "/api/instrument";
pub const INSTRUMENT_OBS_PARAMS: &str = "/api/internal/instrument_obs_params";
pub const TAXONOMIES: &str = "/api/taxonomy";

/// Check that an identifier can be used as one path segment
///
/// # Errors
/// - `ProtocolError::InvalidIdentifier` if empty, `.` or `..`, or containing
///   `/`, `?`, `#` or whitespace
pub fn validate_identifier(id: &str) -> Result<(), ProtocolError> {
    if id.is_empty() {
        return Err(ProtocolError::invalid_identifier(id, "empty"));
    }
    // URL parsers collapse dot segments into the parent path
    if id == "." || id == ".." {
        return Err(ProtocolError::invalid_identifier(id, "dot segment"));
    }
    if id.contains(['/', '?', '#']) {
        return Err(ProtocolError::invalid_identifier(
            id,
            "contains a reserved path character",
        ));
    }
    if id.chars().any(char::is_whitespace) {
        return Err(ProtocolError::invalid_identifier(id, "contains whitespace"));
    }
    Ok(())
}

/// `{base}/{id}` with a validated id
///
/// # Errors
/// - `ProtocolError::InvalidIdentifier` if `id` is not a valid segment
pub fn resource(base: &str, id: &str) -> Result<String, ProtocolError> {
    validate_identifier(id)?;
    Ok(format!("{base}/{id}"))
}

/// `/api/sources/{id}`
///
/// # Errors
/// - `ProtocolError::InvalidIdentifier` if `id` is not a valid segment
#[inline]
pub fn source(id: &str) -> Result<String, ProtocolError> {
    resource(SOURCES, id)
}
