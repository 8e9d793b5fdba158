//! Utility functions for common operations.
//!
//! - **URL validation**: checking and normalizing the backend base URL
//! - **Text processing**: sanitizing server-provided titles and fitting them
//!   to a column width
//! - **Dates**: ISO wire format and the long Spanish form used in headers
//!
//! ```
//! use onta::util::{format_long_date_es, strip_control_chars, truncate_to_width};
//! use chrono::NaiveDate;
//!
//! let title = strip_control_chars("\x1b[1mLista de la compra\x1b[0m");
//! assert_eq!(truncate_to_width(&title, 10), "Lista d...");
//!
//! let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
//! assert_eq!(format_long_date_es(day), "5 de marzo de 2024");
//! ```

mod date;
mod text;
mod url_validator;

pub use date::{format_iso_date, format_long_date_es, parse_iso_date};
pub use text::{single_line, strip_control_chars, truncate_to_width};
pub use url_validator::{is_loopback, validate_base_url, UrlValidationError};
