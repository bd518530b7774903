//! Display helpers: dates, project URLs, clipboard

mod clipboard;
mod date;
mod url;

pub use clipboard::{copy_to_clipboard, copy_to_clipboard_with};
pub use date::{CURRENT_TIMESTAMP, Locale, format_date, parse_timestamp};
pub use url::project_url;
