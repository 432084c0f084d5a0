//! Wire types for the runner API

use capsules_binary_exec::ExecutionRequest;
use chrono::{Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

static EXECUTABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.*\.(sh|bat)$").expect("executable pattern is a valid regex")
});

/// POST /api/v1/runner body
///
/// Property names bind case-insensitively; unknown properties are rejected.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunnerRequest {
    #[serde(rename = "binaryFile")]
    pub binary_file: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<String>>,
}

const REQUEST_FIELDS: &[&str] = &["binaryFile", "binaryReference", "arguments"];

enum RequestField {
    BinaryFile,
    Arguments,
}

impl<'de> Deserialize<'de> for RequestField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldVisitor;

        impl<'de> Visitor<'de> for FieldVisitor {
            type Value = RequestField;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("`binaryFile` or `arguments`")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<RequestField, E> {
                if value.eq_ignore_ascii_case("binaryFile")
                    || value.eq_ignore_ascii_case("binaryReference")
                {
                    Ok(RequestField::BinaryFile)
                } else if value.eq_ignore_ascii_case("arguments") {
                    Ok(RequestField::Arguments)
                } else {
                    Err(E::unknown_field(value, REQUEST_FIELDS))
                }
            }
        }

        deserializer.deserialize_identifier(FieldVisitor)
    }
}

impl<'de> Deserialize<'de> for RunnerRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RequestVisitor;

        impl<'de> Visitor<'de> for RequestVisitor {
            type Value = RunnerRequest;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a runner request object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RunnerRequest, A::Error> {
                let mut binary_file: Option<Option<String>> = None;
                let mut arguments: Option<Option<Vec<String>>> = None;

                while let Some(field) = map.next_key::<RequestField>()? {
                    match field {
                        RequestField::BinaryFile => {
                            if binary_file.is_some() {
                                return Err(de::Error::duplicate_field("binaryFile"));
                            }
                            binary_file = Some(map.next_value()?);
                        }
                        RequestField::Arguments => {
                            if arguments.is_some() {
                                return Err(de::Error::duplicate_field("arguments"));
                            }
                            arguments = Some(map.next_value()?);
                        }
                    }
                }

                Ok(RunnerRequest {
                    binary_file: binary_file.flatten(),
                    arguments: arguments.flatten(),
                })
            }
        }

        deserializer.deserialize_struct("RunnerRequest", REQUEST_FIELDS, RequestVisitor)
    }
}

impl RunnerRequest {
    pub fn new(binary_file: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            binary_file: Some(binary_file.into()),
            arguments: Some(arguments),
        }
    }

    /// Check the request shape and turn it into an execution request.
    ///
    /// Errors are rendered as `field:message` pairs.
    pub fn validate(self) -> Result<ExecutionRequest, Vec<String>> {
        let binary_file = match self.binary_file {
            None => return Err(vec!["binaryFile:must not be null".to_string()]),
            Some(file) => file,
        };

        if binary_file.trim().is_empty() || !EXECUTABLE_PATTERN.is_match(binary_file.trim_end())
        {
            return Err(vec![
                "binaryFile:inputted file should be an executable".to_string()
            ]);
        }

        Ok(ExecutionRequest::new(
            binary_file,
            self.arguments.unwrap_or_default(),
        ))
    }
}

impl fmt::Display for RunnerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let binary_file = self.binary_file.as_deref().unwrap_or("null");
        match &self.arguments {
            Some(args) if !args.is_empty() => {
                write!(f, "binaryFile={},arguments={:?}", binary_file, args)
            }
            _ => write!(f, "binaryFile={}", binary_file),
        }
    }
}

/// Uniform response body for successes and failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerResponse {
    pub timestamp: NaiveDateTime,
    pub message: String,
    pub details: Vec<String>,
}

impl RunnerResponse {
    pub fn new(message: impl Into<String>, details: Vec<String>) -> Self {
        Self {
            timestamp: Local::now().naive_local(),
            message: message.into(),
            details,
        }
    }
}
