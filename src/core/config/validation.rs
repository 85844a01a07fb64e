#![allow(clippy::result_large_err)]

use super::EngineConfig;
use crate::core::error::AppError;
use crate::core::modules::version::parse_version;
use crate::core::types::ErrorCategory;

/// Validate configuration rules
pub fn validate(config: &EngineConfig) -> Result<(), AppError> {
    if config.engine.application_name.trim().is_empty() {
        return Err(AppError::new(
            ErrorCategory::ValidationError,
            "engine.application_name cannot be empty",
        ));
    }

    // The release version must parse so module bounds can be compared against it.
    if parse_version(&config.engine.release_version).is_none() {
        return Err(AppError::new(
            ErrorCategory::ValidationError,
            format!(
                "engine.release_version '{}' is not a dotted numeric version",
                config.engine.release_version
            ),
        ));
    }

    if config.plugins.max_body_chars == 0 {
        return Err(AppError::new(
            ErrorCategory::ValidationError,
            "plugins.max_body_chars must be >= 1",
        ));
    }

    if let Some(approver) = &config.approvals.page_save_approver {
        if approver.trim().is_empty() {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                "approvals.page_save_approver cannot be blank; omit the key to disable approval",
            ));
        }
    }

    if let Some(approver) = &config.approvals.profile_save_approver {
        if approver.trim().is_empty() {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                "approvals.profile_save_approver cannot be blank; omit the key to disable approval",
            ));
        }
    }

    Ok(())
}
