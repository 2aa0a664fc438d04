/// Source and stage name constants to ensure consistency across the codebase
/// These names appear in the CLI, logs, metrics labels and the run summary.

// Source names (used in CLI and configuration)
pub const VEHICLE_SOURCE: &str = "vehicle";
pub const TOLLPLAZA_SOURCE: &str = "tollplaza";
pub const PAYMENT_SOURCE: &str = "payment";

// Stage names
pub const STAGE_PREPARE: &str = "prepare_workspace";
pub const STAGE_FETCH: &str = "fetch_archive";
pub const STAGE_EXTRACT: &str = "extract_archive";
pub const STAGE_PROJECT_VEHICLE: &str = "project_vehicle";
pub const STAGE_PROJECT_TOLLPLAZA: &str = "project_tollplaza";
pub const STAGE_PROJECT_PAYMENT: &str = "project_payment";
pub const STAGE_COMBINE: &str = "combine_data";
pub const STAGE_TRANSFORM: &str = "transform_data";

/// Get all supported source names
pub fn get_supported_sources() -> Vec<&'static str> {
    vec![VEHICLE_SOURCE, TOLLPLAZA_SOURCE, PAYMENT_SOURCE]
}

/// Map a source name to the name of its projection stage
pub fn projection_stage_name(source: &str) -> Option<&'static str> {
    match source {
        VEHICLE_SOURCE => Some(STAGE_PROJECT_VEHICLE),
        TOLLPLAZA_SOURCE => Some(STAGE_PROJECT_TOLLPLAZA),
        PAYMENT_SOURCE => Some(STAGE_PROJECT_PAYMENT),
        _ => None,
    }
}
