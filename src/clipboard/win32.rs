//! Win32 clipboard through `clipboard-win`.

use clipboard_win::{formats, raw, Clipboard};
use tracing::debug;

use super::{ClipboardFormat, ClipboardSink};
use crate::error::{Error, Result};

/// The open Win32 clipboard. Closed on drop.
pub struct WindowsClipboard {
    _guard: Clipboard,
}

impl WindowsClipboard {
    /// Open the clipboard for this process
    pub fn open() -> Result<Self> {
        let guard = Clipboard::new().map_err(|e| Error::ClipboardAcquisition(e.to_string()))?;
        debug!("Clipboard opened");
        Ok(Self { _guard: guard })
    }

    fn replace(&mut self, format: u32, data: &[u8]) -> Result<()> {
        raw::empty().map_err(|e| Error::ClipboardWrite(format!("can't empty the clipboard: {e}")))?;
        raw::set_without_clear(format, data).map_err(|e| Error::ClipboardWrite(e.to_string()))?;
        debug!(format, len = data.len(), "Clipboard data set");
        Ok(())
    }
}

impl ClipboardSink for WindowsClipboard {
    fn set_text(&mut self, text: &[u16]) -> Result<()> {
        let mut data = Vec::with_capacity((text.len() + 1) * 2);
        for unit in text {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        data.extend_from_slice(&[0, 0]);
        self.replace(formats::CF_UNICODETEXT, &data)
    }

    fn set_tagged(&mut self, format: &ClipboardFormat, data: &[u8]) -> Result<()> {
        let id = match format.name {
            Some(name) => raw::register_format(name)
                .ok_or_else(|| Error::ClipboardWrite(format!("can't register the {name} format")))?
                .get(),
            None => format.id,
        };

        let mut terminated = Vec::with_capacity(data.len() + 1);
        terminated.extend_from_slice(data);
        terminated.push(0);
        self.replace(id, &terminated)
    }
}

impl Drop for WindowsClipboard {
    fn drop(&mut self) {
        debug!("Clipboard closed");
    }
}
