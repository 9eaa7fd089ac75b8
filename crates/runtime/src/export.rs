use std::fmt;

use tracing::{info, warn};

pub const SAVED_MESSAGE: &str = "Config saved successfully!";
pub const FALLBACK_MESSAGE: &str =
    "Could not save to chosen location. Falling back to download...";
pub const DOWNLOAD_INSTRUCTIONS: &str = "Config saved! The file has been downloaded to your \
Downloads folder. Please move it to replace your config.js file.\n\nNote: For direct saving to \
your project folder, use Chrome or Edge browser.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    /// The user dismissed the save dialog.
    Aborted,
    Failed(String),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Aborted => write!(f, "save cancelled"),
            SaveError::Failed(msg) => write!(f, "save failed: {msg}"),
        }
    }
}

impl std::error::Error for SaveError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Written to a location the user picked.
    Saved,
    /// Handed to the browser as a download.
    Downloaded,
    Cancelled,
}

/// A native "save as" dialog.
#[allow(async_fn_in_trait)]
pub trait SavePicker {
    async fn save(&mut self, file_name: &str, contents: &str) -> Result<(), SaveError>;
}

pub trait Downloader {
    fn download(&mut self, file_name: &str, contents: &str) -> Result<(), SaveError>;
}

pub trait Notifier {
    fn notify(&mut self, message: &str);
}

/// Saves `contents` through the picker when there is one. A failed save
/// falls back to a single download; a cancelled one does nothing.
pub async fn export_text<P: SavePicker>(
    file_name: &str,
    contents: &str,
    picker: Option<&mut P>,
    downloader: &mut dyn Downloader,
    notifier: &mut dyn Notifier,
) -> Result<ExportOutcome, SaveError> {
    let Some(picker) = picker else {
        downloader.download(file_name, contents)?;
        notifier.notify(DOWNLOAD_INSTRUCTIONS);
        info!(file_name, "exported by download");
        return Ok(ExportOutcome::Downloaded);
    };

    match picker.save(file_name, contents).await {
        Ok(()) => {
            notifier.notify(SAVED_MESSAGE);
            info!(file_name, "exported through save dialog");
            Ok(ExportOutcome::Saved)
        }
        Err(SaveError::Aborted) => {
            info!("export cancelled");
            Ok(ExportOutcome::Cancelled)
        }
        Err(SaveError::Failed(reason)) => {
            warn!(%reason, "save dialog failed, falling back to download");
            notifier.notify(FALLBACK_MESSAGE);
            downloader.download(file_name, contents)?;
            Ok(ExportOutcome::Downloaded)
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::{Downloader, Notifier, SaveError, SavePicker};

    pub struct ScriptedPicker {
        pub result: Result<(), SaveError>,
        pub saved: Vec<(String, String)>,
    }

    impl ScriptedPicker {
        pub fn new(result: Result<(), SaveError>) -> Self {
            Self {
                result,
                saved: Vec::new(),
            }
        }
    }

    impl SavePicker for ScriptedPicker {
        async fn save(&mut self, file_name: &str, contents: &str) -> Result<(), SaveError> {
            self.result.clone()?;
            self.saved.push((file_name.to_string(), contents.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct Downloads(pub Vec<(String, String)>);

    impl Downloader for Downloads {
        fn download(&mut self, file_name: &str, contents: &str) -> Result<(), SaveError> {
            self.0.push((file_name.to_string(), contents.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct Messages(pub Vec<String>);

    impl Notifier for Messages {
        fn notify(&mut self, message: &str) {
            self.0.push(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::{Downloads, Messages, ScriptedPicker};
    use super::{
        DOWNLOAD_INSTRUCTIONS, ExportOutcome, FALLBACK_MESSAGE, SAVED_MESSAGE, SaveError,
        export_text,
    };
    use pretty_assertions::assert_eq;

    fn run(
        picker: Option<&mut ScriptedPicker>,
    ) -> (Result<ExportOutcome, SaveError>, Downloads, Messages) {
        let mut downloads = Downloads::default();
        let mut messages = Messages::default();
        let out = pollster::block_on(export_text(
            "config.js",
            "var config = {};",
            picker,
            &mut downloads,
            &mut messages,
        ));
        (out, downloads, messages)
    }

    #[test]
    fn picker_success_notifies_once() {
        let mut picker = ScriptedPicker::new(Ok(()));
        let (out, downloads, messages) = run(Some(&mut picker));
        assert_eq!(out, Ok(ExportOutcome::Saved));
        assert_eq!(picker.saved.len(), 1);
        assert!(downloads.0.is_empty());
        assert_eq!(messages.0, vec![SAVED_MESSAGE.to_string()]);
    }

    #[test]
    fn cancel_is_silent() {
        let mut picker = ScriptedPicker::new(Err(SaveError::Aborted));
        let (out, downloads, messages) = run(Some(&mut picker));
        assert_eq!(out, Ok(ExportOutcome::Cancelled));
        assert!(downloads.0.is_empty());
        assert!(messages.0.is_empty());
    }

    #[test]
    fn failure_falls_back_to_one_download() {
        let mut picker = ScriptedPicker::new(Err(SaveError::Failed("disk full".into())));
        let (out, downloads, messages) = run(Some(&mut picker));
        assert_eq!(out, Ok(ExportOutcome::Downloaded));
        assert_eq!(
            downloads.0,
            vec![("config.js".to_string(), "var config = {};".to_string())]
        );
        assert_eq!(messages.0, vec![FALLBACK_MESSAGE.to_string()]);
    }

    #[test]
    fn no_picker_downloads_with_instructions() {
        let (out, downloads, messages) = run(None);
        assert_eq!(out, Ok(ExportOutcome::Downloaded));
        assert_eq!(downloads.0.len(), 1);
        assert_eq!(messages.0, vec![DOWNLOAD_INSTRUCTIONS.to_string()]);
    }
}
