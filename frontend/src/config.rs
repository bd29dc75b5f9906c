use crate::services::api::{ApiClient, DEFAULT_BASE_URL};

/// Which speech-to-text capability the voice button drives. Selected once at
/// configuration time; the session workflow is identical for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechToText {
    /// Record audio locally and send it to the service's transcription
    /// endpoint.
    RemoteTranscription,
    /// Use the browser's built-in speech recognition, where available.
    BrowserNative,
}

/// Page-level configuration, fixed for the lifetime of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u32,
    pub speech: SpeechToText,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: 60_000,
            speech: SpeechToText::RemoteTranscription,
        }
    }
}

impl AppConfig {
    /// Pick up overrides from the page URL: `?speech=browser` selects the
    /// browser-native recognizer instead of server-side transcription.
    pub fn from_location() -> Self {
        let mut config = Self::default();
        if let Some(window) = web_sys::window() {
            if let Ok(search) = window.location().search() {
                if search.contains("speech=browser") {
                    config.speech = SpeechToText::BrowserNative;
                }
            }
        }
        config
    }

    pub fn api_client(&self) -> ApiClient {
        ApiClient::with_base_url(self.api_base_url.clone()).with_timeout(self.request_timeout_ms)
    }
}
