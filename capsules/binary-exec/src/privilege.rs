//! Elevation prefix detection.

use crate::command::OsFamily;

/// A binary reference with its elevation prefix separated out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeMode {
    pub path: String,
    pub elevated: bool,
}

/// Split the OS elevation token off the front of `reference`.
///
/// The match is case-insensitive and requires the token to be followed by whitespace,
/// so `sudoku.sh` is a plain file name rather than an elevated `ku.sh`. The returned
/// path is trimmed either way.
pub fn detect_elevation(reference: &str, family: OsFamily) -> PrivilegeMode {
    let trimmed = reference.trim();
    let token = family.elevation_token();

    if let Some(rest) = strip_prefix_ignore_case(trimmed, token) {
        if rest.starts_with(char::is_whitespace) {
            return PrivilegeMode {
                path: rest.trim().to_string(),
                elevated: true,
            };
        }
    }

    PrivilegeMode {
        path: trimmed.to_string(),
        elevated: false,
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    if value.len() < prefix.len() || !value.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, rest) = value.split_at(prefix.len());
    head.eq_ignore_ascii_case(prefix).then_some(rest)
}
