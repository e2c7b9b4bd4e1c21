use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use ureq::Agent;

use super::payload::parse_payload;
use super::Extractor;
use crate::config::VisionSettings;
use crate::error::{InvoiceError, Result};
use crate::upload::ImageUpload;

/// Instructions plus the target schema sent as the system message
const SYSTEM_PROMPT: &str = r#"You are an invoice data extraction assistant.
Given an image of an invoice, extract structured data and return ONLY valid JSON.

The JSON must match this schema:
{
  "invoiceNumber": "string",
  "date": "YYYY-MM-DD",
  "dueDate": "YYYY-MM-DD",
  "customerName": "string",
  "customerAddress": "string (comma separated lines)",
  "customerEmail": "string",
  "items": [
    {
      "description": "string",
      "quantity": number,
      "unitPrice": number,
      "amount": number
    }
  ],
  "subtotal": number,
  "taxRate": number (percentage, e.g. 7.5),
  "taxAmount": number,
  "total": number,
  "notes": "string"
}

Notes:
- Use an empty string or omit fields you cannot read.
- Numbers must be plain numbers without currency symbols.
- Return only the JSON object, with no commentary."#;

const USER_PROMPT: &str = "Extract the invoice data from this image.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat-completions endpoint with image input
pub struct VisionClient {
    agent: Agent,
    settings: VisionSettings,
    api_key: String,
}

impl VisionClient {
    pub fn new(settings: VisionSettings, api_key: impl Into<String>) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(settings.timeout_secs.map(Duration::from_secs))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            settings,
            api_key: api_key.into(),
        }
    }

    fn request_body(&self, upload: &ImageUpload) -> Result<String> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(SYSTEM_PROMPT),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: USER_PROMPT.to_string(),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: upload.data_url(),
                            },
                        },
                    ]),
                },
            ],
            temperature: 0.0,
        };

        Ok(serde_json::to_string(&request)?)
    }

    /// Send the image and return the model's raw text answer
    fn complete(&self, upload: &ImageUpload) -> Result<String> {
        let body = self.request_body(upload)?;

        info!(
            endpoint = %self.settings.endpoint,
            model = %self.settings.model,
            file = %upload.file_name,
            "Sending invoice image to vision model"
        );

        let mut response = self
            .agent
            .post(&self.settings.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .send(body.as_str())
            .map_err(|e| InvoiceError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| InvoiceError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Vision API returned an error status");
            return Err(InvoiceError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        response_content(&text)
    }
}

impl Extractor for VisionClient {
    fn extract(&self, upload: &ImageUpload) -> Result<Value> {
        let content = self.complete(upload)?;
        let payload = parse_payload(&content)?;
        info!(chars = content.len(), "Parsed vision model response");
        Ok(payload)
    }
}

/// Pull the first choice's text out of a chat-completions response body
fn response_content(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| InvoiceError::MalformedResponse(format!("unexpected response body: {e}")))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| InvoiceError::MalformedResponse("empty response from model".into()))
}
