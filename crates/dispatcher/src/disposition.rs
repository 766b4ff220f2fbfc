//! Content-Disposition values for downloads
//!
//! Filenames outside `[A-Za-z0-9]` use the extended `filename*` parameter
//! (RFC 2231 / RFC 5987), except for the legacy browser family that
//! mishandles it and gets the plain form.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

/// User-agent marker of the legacy browser family
pub const LEGACY_BROWSER_MARKER: &str = "MSIE";

/// Attachment disposition for `file_name`, adapted to the client
pub fn encode_file_name_to_content_disposition(user_agent: Option<&str>, file_name: &str) -> String {
    if user_agent.is_some_and(|ua| ua.contains(LEGACY_BROWSER_MARKER)) {
        return format!("attachment;filename={file_name}");
    }
    encode_file_name_to_standard_content_disposition(file_name)
}

/// Extended form: every byte outside `[A-Za-z0-9]` becomes `%XX`
pub fn encode_file_name_to_standard_content_disposition(file_name: &str) -> String {
    // attachment rather than inline: offer to save, not to display
    format!(
        "attachment;filename*=\"{}\"",
        utf8_percent_encode(file_name, NON_ALPHANUMERIC)
    )
}
