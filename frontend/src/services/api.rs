use futures::future::{select, Either};
use gloo::net::http::{Request, Response};
use gloo::timers::future::TimeoutFuture;
use shared::{
    interpret_generation_body, interpret_transcription_body, BudgetSubmission, GenerationReply,
    PromptRequest,
};
use web_sys::{Blob, FormData};

/// Production deployment of the budgeting service.
pub const DEFAULT_BASE_URL: &str = "https://budgetadvisor.onrender.com";

const DEFAULT_TIMEOUT_MS: u32 = 60_000;

/// Shown when a request outlives the configured timeout. The in-flight
/// request is not cancellable; its eventual response is simply never applied.
pub const TIMEOUT_ERROR: &str = "The budgeting service took too long to respond.";

/// API client for the remote budgeting service.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    timeout_ms: u32,
}

impl ApiClient {
    /// Create a new API client against the default base URL.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    /// Create a new API client with a custom base URL.
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            base_url,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Generate a budget from a free-text prompt.
    pub async fn generate_budget(&self, prompt: &str) -> Result<GenerationReply, String> {
        let request = Request::post(&format!("{}/generate_budget", self.base_url))
            .json(&PromptRequest {
                prompt: prompt.to_string(),
            })
            .map_err(|e| format!("Failed to serialize request: {}", e))?;
        self.generation_reply(request).await
    }

    /// Generate a budget from the structured form submission.
    pub async fn generate_budget_from_form(
        &self,
        submission: &BudgetSubmission,
    ) -> Result<GenerationReply, String> {
        let request = Request::post(&format!("{}/generate_budget_from_form", self.base_url))
            .json(submission)
            .map_err(|e| format!("Failed to serialize request: {}", e))?;
        self.generation_reply(request).await
    }

    /// Send a recorded audio blob for transcription. The service expects a
    /// multipart upload under the field name "file".
    pub async fn transcribe_audio(&self, audio: &Blob) -> Result<String, String> {
        let form = FormData::new().map_err(|_| "Failed to build upload form".to_string())?;
        form.append_with_blob_and_filename("file", audio, "audio.webm")
            .map_err(|_| "Failed to attach audio to upload form".to_string())?;

        let request = Request::post(&format!("{}/transcribe_audio", self.base_url))
            .body(form)
            .map_err(|e| format!("Failed to build request: {}", e))?;

        let response = self.settle(request).await?;
        let ok = response.ok();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response: {}", e))?;
        interpret_transcription_body(ok, &body)
    }

    /// Fetch the generated workbook as raw bytes. `url` is already absolute.
    pub async fn fetch_workbook(&self, url: &str) -> Result<Vec<u8>, String> {
        let request = Request::get(url)
            .build()
            .map_err(|e| format!("Failed to build request: {}", e))?;
        let response = self.settle(request).await?;
        if !response.ok() {
            return Err(format!(
                "Spreadsheet fetch failed with status {}",
                response.status()
            ));
        }
        response
            .binary()
            .await
            .map_err(|e| format!("Failed to read spreadsheet: {}", e))
    }

    async fn generation_reply(&self, request: Request) -> Result<GenerationReply, String> {
        let response = self.settle(request).await?;
        let ok = response.ok();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response: {}", e))?;
        let raw = interpret_generation_body(ok, &body)?;
        Ok(GenerationReply::from_raw(raw, &self.base_url))
    }

    /// Send a request, racing it against the configured timeout.
    async fn settle(&self, request: Request) -> Result<Response, String> {
        let response = Box::pin(request.send());
        let deadline = Box::pin(TimeoutFuture::new(self.timeout_ms));
        match select(response, deadline).await {
            Either::Left((Ok(response), _)) => Ok(response),
            Either::Left((Err(e), _)) => Err(format!("Network error: {}", e)),
            Either::Right(_) => Err(TIMEOUT_ERROR.to_string()),
        }
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}
