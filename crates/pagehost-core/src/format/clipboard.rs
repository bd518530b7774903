//! Clipboard access through the terminal (OSC 52)

use std::io::{self, Write};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use tracing::error;

use crate::error::{Error, Result};

/// Copy `text` to the system clipboard of the controlling terminal
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    copy_to_clipboard_with(&mut io::stdout(), text)
}

/// Write the OSC 52 "set clipboard" sequence for `text` to `writer`.
///
/// Any write failure is logged and reported as [`Error::Clipboard`].
pub fn copy_to_clipboard_with<W: Write>(writer: &mut W, text: &str) -> Result<()> {
    let payload = BASE64.encode(text.as_bytes());

    write!(writer, "\x1b]52;c;{}\x07", payload)
        .and_then(|_| writer.flush())
        .map_err(|e| {
            error!(error = %e, "Failed to copy to clipboard");
            Error::Clipboard
        })
}
