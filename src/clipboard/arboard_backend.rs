//! Clipboard for non-Windows desktops through `arboard`.
//!
//! arboard speaks UTF-8 text and HTML documents, so CF_HTML data is unwrapped
//! back to the document its header points at. RTF has no arboard API.
//!
//! On X11 and Wayland the selection is served by the process that set it.
//! There every write blocks until another program takes the selection
//! over, so the data outlives a desktop without a clipboard manager.

#[cfg(target_os = "linux")]
use arboard::SetExtLinux;
use tracing::debug;

use super::formats::{cf_html_document, CF_HTML};
use super::{ClipboardFormat, ClipboardSink};
use crate::error::{Error, Result};

/// The desktop clipboard. Released on drop.
pub struct ArboardClipboard {
    inner: arboard::Clipboard,
}

impl ArboardClipboard {
    /// Connect to the clipboard
    pub fn open() -> Result<Self> {
        let inner = arboard::Clipboard::new().map_err(|e| Error::ClipboardAcquisition(e.to_string()))?;
        debug!("Clipboard opened");
        Ok(Self { inner })
    }

    /// Run one write through arboard's `Set` builder
    fn serve<F>(&mut self, write: F) -> Result<()>
    where
        F: for<'c> FnOnce(arboard::Set<'c>) -> std::result::Result<(), arboard::Error>,
    {
        let set = self.inner.set();

        #[cfg(target_os = "linux")]
        let set = {
            debug!("Serving the selection until another program takes it over");
            set.wait()
        };

        write(set).map_err(|e| Error::ClipboardWrite(e.to_string()))
    }
}

impl ClipboardSink for ArboardClipboard {
    fn set_text(&mut self, text: &[u16]) -> Result<()> {
        let text = String::from_utf16_lossy(text);
        self.serve(|set| set.text(text))
    }

    fn set_tagged(&mut self, format: &ClipboardFormat, data: &[u8]) -> Result<()> {
        if format.id != CF_HTML {
            return Err(Error::ClipboardWrite(format!(
                "the {format} format is unsupported on this platform"
            )));
        }

        let document = cf_html_document(data)
            .ok_or_else(|| Error::ClipboardWrite("malformed CF_HTML header".to_string()))?;
        let html = String::from_utf8_lossy(document).into_owned();
        self.serve(|set| set.html(html, None))
    }
}

impl Drop for ArboardClipboard {
    fn drop(&mut self) {
        debug!("Clipboard closed");
    }
}
