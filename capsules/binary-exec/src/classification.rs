//! Fixed outcome taxonomy for binary executions.
//!
//! Every raw exit code maps to exactly one [`Classification`]; codes that are not in
//! the table fall back to [`Classification::InternalServerError`].

use std::fmt;

/// Caller-facing severity of a classification, independent of any transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    Ok,
    BadRequest,
    Forbidden,
    NotFound,
    RequestTimeout,
    InternalError,
}

/// One named outcome of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Successful,
    InvalidArg,
    InvalidOption,
    InaccessibleResources,
    FilePermissionDenied,
    InsufficientAccessRights,
    CommandPermissionDenied,
    CommandNotFound,
    FileNotFound,
    TimeoutReached,
    NotCompatibleWithOs,
    InternalServerError,
}

impl Classification {
    pub const ALL: [Classification; 12] = [
        Classification::Successful,
        Classification::InvalidArg,
        Classification::InvalidOption,
        Classification::InaccessibleResources,
        Classification::FilePermissionDenied,
        Classification::InsufficientAccessRights,
        Classification::CommandPermissionDenied,
        Classification::CommandNotFound,
        Classification::FileNotFound,
        Classification::TimeoutReached,
        Classification::NotCompatibleWithOs,
        Classification::InternalServerError,
    ];

    /// Look up the classification for a raw process exit code.
    pub fn from_exit_code(code: i32) -> Self {
        match code {
            0 => Classification::Successful,
            1 => Classification::InvalidArg,
            2 => Classification::InvalidOption,
            3 => Classification::InaccessibleResources,
            4 => Classification::InsufficientAccessRights,
            13 => Classification::FilePermissionDenied,
            98 => Classification::FileNotFound,
            99 => Classification::TimeoutReached,
            126 => Classification::CommandPermissionDenied,
            127 => Classification::CommandNotFound,
            193 => Classification::NotCompatibleWithOs,
            _ => Classification::InternalServerError,
        }
    }

    /// Classify an optional exit code; a child killed by a signal has none.
    pub fn from_status_code(code: Option<i32>) -> Self {
        code.map(Self::from_exit_code)
            .unwrap_or(Classification::InternalServerError)
    }

    pub fn exit_code(self) -> i32 {
        match self {
            Classification::Successful => 0,
            Classification::InvalidArg => 1,
            Classification::InvalidOption => 2,
            Classification::InaccessibleResources => 3,
            Classification::InsufficientAccessRights => 4,
            Classification::FilePermissionDenied => 13,
            Classification::FileNotFound => 98,
            Classification::TimeoutReached => 99,
            Classification::CommandPermissionDenied => 126,
            Classification::CommandNotFound => 127,
            Classification::NotCompatibleWithOs => 193,
            Classification::InternalServerError => 500,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Classification::Successful => "input binary has been executed successfully",
            Classification::InvalidArg => {
                "either the mandatory arg is absent or inputted one is not correct"
            }
            Classification::InvalidOption => {
                "either the mandatory option is absent or inputted one is not correct"
            }
            Classification::InaccessibleResources => "missing or inaccessible file or resource",
            Classification::FilePermissionDenied
            | Classification::InsufficientAccessRights
            | Classification::CommandPermissionDenied => "Permission denied",
            Classification::CommandNotFound => {
                "Command not found-please check the command and its options or arguments"
            }
            Classification::FileNotFound => "execution file not found",
            Classification::TimeoutReached => {
                "command execution reached the defined timeout and execution has been stopped"
            }
            Classification::NotCompatibleWithOs => "input file is not compatible with os",
            Classification::InternalServerError => "internal server error",
        }
    }

    pub fn status(self) -> StatusCategory {
        match self {
            Classification::Successful => StatusCategory::Ok,
            Classification::InvalidArg
            | Classification::InvalidOption
            | Classification::InaccessibleResources
            | Classification::NotCompatibleWithOs => StatusCategory::BadRequest,
            Classification::FilePermissionDenied
            | Classification::InsufficientAccessRights
            | Classification::CommandPermissionDenied => StatusCategory::Forbidden,
            Classification::CommandNotFound | Classification::FileNotFound => {
                StatusCategory::NotFound
            }
            Classification::TimeoutReached => StatusCategory::RequestTimeout,
            Classification::InternalServerError => StatusCategory::InternalError,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Classification::Successful => "SUCCESSFUL",
            Classification::InvalidArg => "INVALID_ARG",
            Classification::InvalidOption => "INVALID_OPTION",
            Classification::InaccessibleResources => "INACCESSIBLE_RESOURCES",
            Classification::FilePermissionDenied => "FILE_PERMISSION_DENIED",
            Classification::InsufficientAccessRights => "INSUFFICIENT_ACCESS_RIGHTS",
            Classification::CommandPermissionDenied => "COMMAND_PERMISSION_DENIED",
            Classification::CommandNotFound => "COMMAND_NOT_FOUND",
            Classification::FileNotFound => "FILE_NOT_FOUND",
            Classification::TimeoutReached => "TIMEOUT_REACHED",
            Classification::NotCompatibleWithOs => "NOT_COMPATIBLE_WITH_OS",
            Classification::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn is_success(self) -> bool {
        self == Classification::Successful
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.exit_code())
    }
}
