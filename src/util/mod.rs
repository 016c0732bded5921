//! Small helpers shared by the client and the terminal front end.
//!
//! - **URL validation**: the service origin must be HTTPS unless it is a
//!   local development server.
//! - **Text processing**: Unicode-aware width, truncation, and terminal
//!   sanitising of remote text.

mod text;
mod url_validator;

pub use text::{display_width, strip_control_chars, truncate_to_width};
pub use url_validator::{endpoint_url, validate_base_url, UrlValidationError};
