// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Vision model client for identifying cars in photos.
//!
//! Sends the analyst prompt plus a base64 JPEG to an OpenAI-compatible chat
//! completions endpoint and parses the labeled answer.

use crate::error::AppError;
use crate::models::analysis::{
    FEATURES_LABEL, MAKE_MODEL_LABEL, PERFORMANCE_LABEL, RARITY_LABEL, VALUE_RANGE_LABEL,
    YEAR_LABEL,
};
use crate::models::{parse_analysis, CarAnalysis};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.5;
/// Largest decoded image accepted for analysis.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Build the instruction prompt. The labels must match what the parser extracts.
pub fn analysis_prompt() -> String {
    format!(
        "You are an expert automotive analyst with deep knowledge of cars. I'll show you a car image, \
         and I need you to analyze it in detail. Even if you're not 100% certain, provide your best \
         analysis based on visible features and characteristics.\n\n\
         If you can identify the exact model, provide precise details. If not, describe what you can \
         see and make educated guesses based on visible features (body style, design elements, badges, etc.).\n\n\
         Format your response exactly like this:\n\n\
         {MAKE_MODEL_LABEL} [Make and full model name - if uncertain, provide your best guess and note why]\n\
         {YEAR_LABEL} [Year or year range - specify if it's an estimate]\n\
         {PERFORMANCE_LABEL} [Engine specs, horsepower, 0-60 time, top speed - be specific if known, or provide typical specs for this type of vehicle]\n\
         {FEATURES_LABEL} [Key design elements, technology, unique characteristics you can see]\n\
         {RARITY_LABEL} [Use one of these tiers based on production numbers, value, and historical significance:\n\
         - Bronze: Common production cars\n\
         - Silver: Limited production or special editions\n\
         - Gold: Rare models, high-performance variants\n\
         - Platinum: Very rare, exotic or limited production supercars\n\
         - Diamond: Ultra-rare hypercars or significant historical models\n\
         - Master: Extremely rare, one-of-few production models\n\
         - Grandmaster: One-offs or historically important prototypes]\n\
         {VALUE_RANGE_LABEL} [Current market value range - if uncertain, provide range for similar vehicles]\n\n\
         Then add interesting technical details, historical significance, or notable facts about this \
         model or similar vehicles in this category. If you're making educated guesses, explain your \
         reasoning based on visible features."
    )
}

/// Strip an optional `data:image/...;base64,` prefix and check the payload.
///
/// Returns the bare base64 string.
pub fn validate_image_base64(image: &str) -> Result<&str, AppError> {
    let payload = match image.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => image,
    }
    .trim();

    if payload.is_empty() {
        return Err(AppError::BadRequest("Image is empty".to_string()));
    }

    // Cheap upper bound before decoding: 4 base64 chars per 3 bytes.
    if payload.len() / 4 * 3 > MAX_IMAGE_BYTES + 3 {
        return Err(AppError::BadRequest("Image is too large".to_string()));
    }

    let decoded = STANDARD
        .decode(payload)
        .map_err(|_| AppError::BadRequest("Image is not valid base64".to_string()))?;

    if decoded.len() > MAX_IMAGE_BYTES {
        return Err(AppError::BadRequest("Image is too large".to_string()));
    }

    Ok(payload)
}

/// Vision API client.
#[derive(Clone)]
pub struct VisionService {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl VisionService {
    pub fn new(base_url: String, api_key: String, model: String) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("failed building vision client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url,
            api_key,
            model,
        })
    }

    /// Identify the car in a base64 JPEG.
    pub async fn analyze_image(&self, image_base64: &str) -> Result<CarAnalysis, AppError> {
        let payload = validate_image_base64(image_base64)?;
        let content = self.complete(payload).await?;
        let analysis = parse_analysis(&content);

        tracing::info!(
            make = %analysis.make,
            model = %analysis.model,
            year = analysis.year,
            rarity = %analysis.rarity,
            "Image analyzed"
        );

        Ok(analysis)
    }

    /// Send the prompt and image; return the raw text answer.
    async fn complete(&self, image_base64: &str) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: analysis_prompt(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:image/jpeg;base64,{}", image_base64),
                        },
                    },
                ],
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::VisionApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Vision API rate limit hit (429)");
                return Err(AppError::VisionApi("Rate limit exceeded".to_string()));
            }

            return Err(AppError::VisionApi(format!("HTTP {}: {}", status, body)));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::VisionApi(format!("JSON parse error: {}", e)))?;

        extract_content(completion)
    }
}

fn extract_content(completion: ChatResponse) -> Result<String, AppError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::VisionApi("No response from AI".to_string()))
}

// ─── Wire Types ──────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
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
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_every_label() {
        let prompt = analysis_prompt();
        for label in [
            MAKE_MODEL_LABEL,
            YEAR_LABEL,
            PERFORMANCE_LABEL,
            FEATURES_LABEL,
            RARITY_LABEL,
            VALUE_RANGE_LABEL,
        ] {
            assert!(prompt.contains(label), "prompt missing {label}");
        }
    }

    #[test]
    fn test_validate_strips_data_url_prefix() {
        let encoded = STANDARD.encode(b"\xff\xd8\xff\xe0fake jpeg");
        let data_url = format!("data:image/jpeg;base64,{}", encoded);
        assert_eq!(validate_image_base64(&data_url).unwrap(), encoded);
        assert_eq!(validate_image_base64(&encoded).unwrap(), encoded);
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(matches!(
            validate_image_base64(""),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_image_base64("not base64!!"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_content_part_serialization() {
        let part = ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: "data:image/jpeg;base64,AAAA".to_string(),
            },
        };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["type"], "image_url");
        assert_eq!(json["image_url"]["url"], "data:image/jpeg;base64,AAAA");
    }

    #[test]
    fn test_extract_content() {
        let completion: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(completion).unwrap(), "hello");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            extract_content(empty),
            Err(AppError::VisionApi(_))
        ));

        let null_content: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(extract_content(null_content).is_err());
    }
}
