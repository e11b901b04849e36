//! Remote analysis gateway
//!
//! Every outbound HTTP call goes through [`AnalysisGateway`]. Responses are
//! normalized into the shared model, failures into [`NeoCareError`]:
//! - no response at all: `Transport`
//! - 401 / 403: `SessionExpired`
//! - any other non-2xx: `Service { status, message }`
//! - 2xx with `success: false`: `Ok` with the failure inside the result
//!
//! Nothing is retried here.

mod types;

use crate::config::Config;
use crate::error::{NeoCareError, Result};
use crate::scanner::FileRef;
use async_trait::async_trait;
use neocare_common::{
    AnalysisResult, ChatMessage, Conversation, DeliveryRequest, Language, StoreCandidate, SubmissionResult,
};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use types::{
    ChatReply, ChatRequest, ErrorBody, NearbyStores, SaveConversation, StoredConversation, TranslateRequest,
    TranslateResponse,
};

/// Translation with a guaranteed answer: on failure the input comes back
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, lang: Language) -> String;
}

/// Where delivery requests are sent
#[async_trait]
pub trait DeliveryBackend: Send + Sync {
    async fn submit_request(&self, request: &DeliveryRequest) -> Result<SubmissionResult>;
}

/// Base URLs of the services
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub analysis: String,
    pub pharma: String,
    pub pharmafast: String,
    pub chat: String,
}

impl Endpoints {
    pub fn from_config(config: &Config) -> Self {
        Self {
            analysis: config.api_base_url.trim_end_matches('/').to_string(),
            pharma: config.pharma_base_url.trim_end_matches('/').to_string(),
            pharmafast: config.pharmafast_base_url.trim_end_matches('/').to_string(),
            chat: config.chat_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// All services behind one host, at their default paths
    pub fn with_host(host: &str) -> Self {
        Self::from_config(&Config::with_host(host))
    }
}

pub struct AnalysisGateway {
    client: reqwest::Client,
    endpoints: Endpoints,
    auth_token: Option<String>,
}

impl AnalysisGateway {
    pub fn new(endpoints: Endpoints, auth_token: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| NeoCareError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoints,
            auth_token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            Endpoints::from_config(config),
            config.auth_token.clone(),
            config.timeout_seconds.map(Duration::from_secs),
        )
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// `POST /analyze-image` with one file
    pub async fn analyze_one(&self, file: &FileRef, instruction: Option<&str>) -> Result<AnalysisResult> {
        let url = format!("{}/analyze-image", self.endpoints.analysis);
        let mut form = Form::new().part("image", file_part(file));
        if let Some(prompt) = instruction {
            form = form.text("prompt", prompt.to_string());
        }

        tracing::debug!(%url, file = %file.name, "analyze image");
        let response = self.send(self.client.post(&url).multipart(form)).await?;
        Ok(finish_analysis(read_json(response).await?, &file.name, file.size()))
    }

    /// `POST /analyze-multiple-images`, one combined answer
    pub async fn analyze_many(&self, files: &[FileRef], instruction: Option<&str>) -> Result<AnalysisResult> {
        let url = format!("{}/analyze-multiple-images", self.endpoints.analysis);
        let mut form = Form::new();
        for file in files {
            form = form.part("images", file_part(file));
        }
        if let Some(prompt) = instruction {
            form = form.text("prompt", prompt.to_string());
        }

        tracing::debug!(%url, count = files.len(), "analyze images");
        let response = self.send(self.client.post(&url).multipart(form)).await?;

        let names = files.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join(", ");
        let size = files.iter().map(FileRef::size).sum();
        Ok(finish_analysis(read_json(response).await?, &names, size))
    }

    /// `POST /analyze-prescription`; the service supplies its own instruction
    pub async fn analyze_prescription(&self, file: &FileRef) -> Result<AnalysisResult> {
        let url = format!("{}/analyze-prescription", self.endpoints.pharma);
        let form = Form::new().part("image", file_part(file));

        tracing::debug!(%url, file = %file.name, "analyze prescription");
        let response = self.send(self.client.post(&url).multipart(form)).await?;
        Ok(finish_analysis(read_json(response).await?, &file.name, file.size()))
    }

    /// `POST /translate`, errors included
    pub async fn try_translate(&self, text: &str, lang: Language) -> Result<String> {
        let url = format!("{}/translate", self.endpoints.analysis);
        let body = TranslateRequest { text, target_lang: lang };

        let response = self.send(self.client.post(&url).json(&body)).await?;
        let parsed: TranslateResponse = read_json(response).await?;
        parsed.translated_text.ok_or_else(|| NeoCareError::Service {
            status: 200,
            message: "translation missing from response".into(),
        })
    }

    /// `POST /submit-request`
    pub async fn submit_request(&self, request: &DeliveryRequest) -> Result<SubmissionResult> {
        let url = format!("{}/submit-request", self.endpoints.pharmafast);

        tracing::debug!(%url, items = request.items.len(), "submit delivery request");
        let response = self.send(self.client.post(&url).json(request)).await?;
        let result: SubmissionResult = read_json(response).await?;
        if !result.success {
            return Err(NeoCareError::Service {
                status: 200,
                message: "delivery service rejected the request".into(),
            });
        }
        Ok(result)
    }

    /// `GET /nearby-stores`
    pub async fn nearby_stores(&self, latitude: f64, longitude: f64, radius_km: f64) -> Result<Vec<StoreCandidate>> {
        let url = format!(
            "{}/nearby-stores?latitude={}&longitude={}&radiusKm={}",
            self.endpoints.pharmafast, latitude, longitude, radius_km
        );

        let response = self.send(self.client.get(&url)).await?;
        let stores: NearbyStores = read_json(response).await?;
        Ok(stores.into_stores())
    }

    /// `POST /message`: one question to the assistant, its answer back
    pub async fn chat_message(&self, message: &str) -> Result<String> {
        let url = format!("{}/message", self.endpoints.chat);

        tracing::debug!(%url, chars = message.len(), "chat message");
        let response = self.send(self.client.post(&url).json(&ChatRequest { message })).await?;
        let reply: ChatReply = read_json(response).await?;
        reply
            .response
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| NeoCareError::Service {
                status: 200,
                message: "assistant answer missing from response".into(),
            })
    }

    /// `POST /save-conversation`, replacing what the service holds for `email`
    pub async fn save_conversation(&self, email: &str, messages: &[ChatMessage]) -> Result<()> {
        let url = format!("{}/save-conversation", self.endpoints.chat);
        let body = SaveConversation {
            user_email: email,
            messages,
        };

        self.send(self.client.post(&url).json(&body)).await?;
        Ok(())
    }

    /// `GET /get-conversation/{email}`; the service answers the welcome line when it has nothing
    pub async fn get_conversation(&self, email: &str) -> Result<Conversation> {
        let url = self.chat_user_url("get-conversation", email)?;
        let response = self.send(self.client.get(url)).await?;
        let stored: StoredConversation = read_json(response).await?;
        Ok(Conversation::from_messages(stored.messages))
    }

    /// `DELETE /clear-conversation/{email}`
    pub async fn clear_conversation(&self, email: &str) -> Result<()> {
        let url = self.chat_user_url("clear-conversation", email)?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    /// `GET /health` of the analysis service
    pub async fn health(&self) -> Result<serde_json::Value> {
        let url = format!("{}/health", self.endpoints.analysis);
        let response = self.send(self.client.get(&url)).await?;
        read_json(response).await
    }

    fn chat_user_url(&self, action: &str, email: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoints.chat)
            .map_err(|e| NeoCareError::Config(format!("chat url {}: {}", self.endpoints.chat, e)))?;
        url.path_segments_mut()
            .map_err(|_| NeoCareError::Config(format!("chat url {} cannot take a path", self.endpoints.chat)))?
            .pop_if_empty()
            .push(action)
            .push(email);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| NeoCareError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(NeoCareError::SessionExpired);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_message)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            tracing::debug!(status = status.as_u16(), %message, "service error");
            return Err(NeoCareError::Service {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Translator for AnalysisGateway {
    async fn translate(&self, text: &str, lang: Language) -> String {
        if lang == Language::En || text.trim().is_empty() {
            return text.to_string();
        }
        match self.try_translate(text, lang).await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!(lang = lang.code(), error = %e, "translation failed, keeping source text");
                text.to_string()
            }
        }
    }
}

#[async_trait]
impl DeliveryBackend for AnalysisGateway {
    async fn submit_request(&self, request: &DeliveryRequest) -> Result<SubmissionResult> {
        AnalysisGateway::submit_request(self, request).await
    }
}

fn file_part(file: &FileRef) -> Part {
    let part = Part::bytes(file.bytes.to_vec()).file_name(file.name.clone());
    match part.mime_str(&file.mime_type) {
        Ok(part) => part,
        Err(_) => Part::bytes(file.bytes.to_vec()).file_name(file.name.clone()),
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| NeoCareError::Transport(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| NeoCareError::Service {
        status,
        message: format!("unreadable response: {}", e),
    })
}

fn finish_analysis(mut result: AnalysisResult, file_name: &str, size: u64) -> AnalysisResult {
    if !result.success && result.error_message.is_none() {
        result.error_message = Some("analysis failed".into());
    }
    if result.file_name.is_empty() {
        result.file_name = file_name.to_string();
    }
    if result.file_size_bytes == 0 {
        result.file_size_bytes = size;
    }
    result
}
