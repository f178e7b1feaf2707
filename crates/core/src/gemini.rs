use crate::config::Config;
use crate::error::{AppError, Result};
use crate::image_processing::{GeneratedImage, Photo};
use crate::studio::ImageGenerator;
use async_trait::async_trait;
use gemini_rust::{Gemini, Content, Part, Role, Blob, Message};
use tracing::{debug, error};

pub struct GeminiClient {
    client: Gemini,
    model_name: String,
}

/// Builds the edit instruction sent alongside the photo.
///
/// Everything except the hair must come back untouched, so the prompt
/// spells that out for each part of the picture.
pub fn hairstyle_prompt(hairstyle: &str) -> String {
    format!(
        "IMPORTANT: Only modify the hair. Do not change anything else.

Change the hair to: {}

STRICT REQUIREMENTS:
- ONLY edit the hair/hairstyle - nothing else
- Keep the person's face COMPLETELY unchanged (eyes, nose, mouth, facial structure, expression, skin, makeup)
- Keep the background COMPLETELY unchanged
- Keep clothing COMPLETELY unchanged
- Keep body position and pose COMPLETELY unchanged
- If only changing hair color: keep the EXACT same hairstyle, length, texture, and shape - ONLY change the color
- If changing hairstyle: keep the person's face, skin tone, and all facial features EXACTLY as they appear in the original photo
- The edit should be seamless and natural-looking
- Preserve the original photo quality and lighting",
        hairstyle.trim()
    )
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        // Set the base URL explicitly; the default one trips a BadScheme error
        let base_url = url::Url::parse("https://generativelanguage.googleapis.com/v1beta/")
            .map_err(|e| AppError::Config(format!("Invalid base URL: {}", e)))?;

        let model_name = if config.model_name.starts_with("models/") {
            config.model_name.clone()
        } else {
            format!("models/{}", config.model_name)
        };
        let model_url = format!("https://generativelanguage.googleapis.com/v1beta/{}", model_name);

        let client = Gemini::with_model_and_base_url(&config.gemini_api_key, model_url, base_url)
            .map_err(|e| AppError::Config(format!("Failed to create Gemini client: {}", e)))?;

        Ok(Self {
            client,
            model_name,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Sends the photo and a hair-only edit instruction to the model and
    /// returns the first image it answers with.
    pub async fn edit_hairstyle(&self, photo: &Photo, hairstyle: &str) -> Result<GeneratedImage> {
        let image_part = Part::InlineData {
            inline_data: Blob {
                mime_type: photo.mime_type().to_string(),
                data: photo.to_base64(),
            },
        };

        let text_part = Part::Text {
            text: hairstyle_prompt(hairstyle),
            thought: None,
            thought_signature: None,
        };

        // Image first, then the instruction that refers to it
        let message = Message {
            role: Role::User,
            content: Content {
                role: Some(Role::User),
                parts: Some(vec![image_part, text_part]),
            },
        };

        debug!(model = %self.model_name, bytes = photo.len(), "Requesting hairstyle edit");
        let response = self.client
            .generate_content()
            .with_messages(vec![message])
            .execute()
            .await
            .map_err(|e| AppError::GeminiApi(format!("API request failed: {:?}", e)))?;

        let parts = response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.parts.as_deref())
            .unwrap_or_default();

        first_inline_image(parts).ok_or(AppError::NoImageGenerated)
    }
}

/// Picks the first inline image out of a response's parts.
fn first_inline_image(parts: &[Part]) -> Option<GeneratedImage> {
    parts.iter().find_map(|part| match part {
        Part::InlineData { inline_data, .. } if !inline_data.data.is_empty() => Some(
            GeneratedImage::new(inline_data.mime_type.clone(), inline_data.data.clone()),
        ),
        _ => None,
    })
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate(&self, photo: &Photo, description: &str) -> Result<GeneratedImage> {
        self.edit_hairstyle(photo, description).await.map_err(|e| {
            error!(error = %e, "Error generating image");
            AppError::generation(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_trimmed_hairstyle() {
        let prompt = hairstyle_prompt("  short platinum bob \n");
        assert!(prompt.contains("Change the hair to: short platinum bob\n"));
        assert!(prompt.starts_with("IMPORTANT: Only modify the hair."));
    }

    #[test]
    fn finds_first_inline_image_after_text() {
        let parts = vec![
            Part::Text {
                text: "Here is your new look".to_string(),
                thought: None,
                thought_signature: None,
            },
            Part::InlineData {
                inline_data: Blob {
                    mime_type: "image/png".to_string(),
                    data: "aGVsbG8=".to_string(),
                },
            },
        ];

        let image = first_inline_image(&parts).unwrap();
        assert_eq!(image.to_data_url(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn text_only_answer_has_no_image() {
        let parts = vec![Part::Text {
            text: "I can't edit this photo".to_string(),
            thought: None,
            thought_signature: None,
        }];
        assert!(first_inline_image(&parts).is_none());
    }
}
