use crate::analysis::{parse_analysis, AnalysisResult};
use crate::types::*;
use async_trait::async_trait;
use base64::Engine;
use glimpse_core::{Error, LlmConfig, Result};
use reqwest::Client;
use std::time::Duration;

const CEREBRAS_BASE_URL: &str = "https://api.cerebras.ai/v1";
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

const VISION_SYSTEM_PROMPT: &str = "You are a personal AI assistant observing the user's screen. Analyze what you see and provide:
1. A brief summary of what's on screen
2. The context (work, entertainment, communication, etc.)
3. Activities the user might be doing
4. Key UI elements visible
5. What the user likely intends to do

Respond in this exact JSON format:
{
  \"summary\": \"brief description\",
  \"context\": \"work/entertainment/social/etc\",
  \"activities\": [\"activity1\", \"activity2\"],
  \"key_elements\": [\"element1\", \"element2\"],
  \"user_intent\": \"what user is trying to accomplish\"
}";

const CHAT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant that knows the user well through their screen activity history. Answer based ONLY on the provided memory context. If the information isn't in the memories, say you don't know. Be concise.";

/// The LLM surface the pipeline depends on. Concrete network clients
/// implement it; tests substitute mocks.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Analyze a JPEG screen capture, with rolling context from recent
    /// memories.
    async fn analyze(&self, jpeg: &[u8], previous_context: &str) -> Result<AnalysisResult>;

    /// Generate a text reply to `prompt`, grounded in the given memory
    /// contents.
    async fn generate(&self, prompt: &str, memories: &[String]) -> Result<String>;

    /// Probe the configured endpoints with a minimal completion.
    async fn check_health(&self) -> Result<()>;
}

#[derive(Clone)]
struct Endpoint {
    base_url: String,
    model: String,
    api_key: Option<String>,
}

/// OpenAI-compatible chat-completions client covering the vision and chat
/// roles.
pub struct LlmClient {
    client: Client,
    vision: Endpoint,
    chat: Endpoint,
    max_tokens: u32,
    temperature: f32,
    has_secondary: bool,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()
            .unwrap_or_default();

        let vision = Endpoint {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: None,
        };

        // Secondary chat endpoint when a key is configured; otherwise the
        // primary serves both roles.
        let has_secondary = !config.cerebras_api_key.is_empty();
        let chat = if has_secondary {
            let model = if config.cerebras_model.is_empty() {
                config.model.clone()
            } else {
                config.cerebras_model.clone()
            };
            Endpoint {
                base_url: CEREBRAS_BASE_URL.to_string(),
                model,
                api_key: Some(config.cerebras_api_key.clone()),
            }
        } else {
            vision.clone()
        };

        Self {
            client,
            vision,
            chat,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            has_secondary,
        }
    }

    fn build_vision_request(&self, jpeg: &[u8], previous_context: &str) -> ChatRequest {
        let encoded = base64::engine::general_purpose::STANDARD.encode(jpeg);
        let data_url = format!("data:image/jpeg;base64,{}", encoded);

        let user_prompt = if previous_context.is_empty() {
            "Analyze this screenshot:".to_string()
        } else {
            format!(
                "Previous context: {}\n\nAnalyze this new screenshot:",
                previous_context
            )
        };

        ChatRequest {
            model: self.vision.model.clone(),
            messages: vec![
                ChatMessage::system(VISION_SYSTEM_PROMPT),
                ChatMessage::user_parts(vec![
                    ContentPart::Text { text: user_prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: data_url,
                            detail: Some("low".to_string()),
                        },
                    },
                ]),
            ],
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        }
    }

    fn build_chat_request(&self, prompt: &str, memories: &[String]) -> ChatRequest {
        let user_prompt = if memories.is_empty() {
            prompt.to_string()
        } else {
            let mut text = String::from("Based on your activity history:\n");
            for memory in memories {
                text.push_str("- ");
                text.push_str(memory);
                text.push('\n');
            }
            text.push_str("\nUser question: ");
            text.push_str(prompt);
            text.push_str("\n\nAnswer based only on the activity history above.");
            text
        };

        ChatRequest {
            model: self.chat.model.clone(),
            messages: vec![
                ChatMessage::system(CHAT_SYSTEM_PROMPT),
                ChatMessage::user(user_prompt),
            ],
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        }
    }

    async fn complete(
        &self,
        endpoint: &Endpoint,
        request: &ChatRequest,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", endpoint.base_url);

        let mut builder = self.client.post(&url).json(request);
        if let Some(ref key) = endpoint.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::llm(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!("API error {}: {}", status, body)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::llm("no response from model"))
    }
}

#[async_trait]
impl Llm for LlmClient {
    async fn analyze(&self, jpeg: &[u8], previous_context: &str) -> Result<AnalysisResult> {
        let request = self.build_vision_request(jpeg, previous_context);
        let content = self.complete(&self.vision, &request, None).await?;
        Ok(parse_analysis(&content))
    }

    async fn generate(&self, prompt: &str, memories: &[String]) -> Result<String> {
        let request = self.build_chat_request(prompt, memories);
        self.complete(&self.chat, &request, None).await
    }

    async fn check_health(&self) -> Result<()> {
        let probe = |model: &str| ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage::user("Hi")],
            temperature: None,
            max_tokens: Some(5),
        };

        self.complete(&self.vision, &probe(&self.vision.model), Some(HEALTH_TIMEOUT))
            .await
            .map_err(|e| Error::llm(format!("vision endpoint: {}", e)))?;

        if self.has_secondary {
            self.complete(&self.chat, &probe(&self.chat.model), Some(HEALTH_TIMEOUT))
                .await
                .map_err(|e| Error::llm(format!("chat endpoint: {}", e)))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LlmConfig {
        LlmConfig {
            base_url: "http://localhost:1234/v1".to_string(),
            model: "local-model".to_string(),
            max_tokens: 512,
            temperature: 0.7,
            timeout_seconds: 30,
            cerebras_api_key: String::new(),
            cerebras_model: "gpt-oss-120b".to_string(),
        }
    }

    #[test]
    fn test_vision_request_shape() {
        let client = LlmClient::new(&config());
        let request = client.build_vision_request(&[0xFF, 0xD8, 0xFF], "earlier context");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "local-model");
        assert_eq!(json["messages"][0]["role"], "system");

        let parts = &json["messages"][1]["content"];
        assert!(parts[0]["text"]
            .as_str()
            .unwrap()
            .starts_with("Previous context: earlier context"));
        assert_eq!(parts[1]["type"], "image_url");
        assert!(parts[1]["image_url"]["url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));
        assert_eq!(parts[1]["image_url"]["detail"], "low");
    }

    #[test]
    fn test_vision_request_without_context() {
        let client = LlmClient::new(&config());
        let request = client.build_vision_request(&[0x01], "");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json["messages"][1]["content"][0]["text"],
            "Analyze this screenshot:"
        );
    }

    #[test]
    fn test_chat_request_includes_memories() {
        let client = LlmClient::new(&config());
        let memories = vec!["Worked on slides".to_string(), "Read a paper".to_string()];
        let request = client.build_chat_request("what did I do?", &memories);

        let json = serde_json::to_value(&request).unwrap();
        let user = json["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("- Worked on slides\n"));
        assert!(user.contains("- Read a paper\n"));
        assert!(user.contains("User question: what did I do?"));
        assert!(user.ends_with("Answer based only on the activity history above."));
    }

    #[test]
    fn test_chat_request_without_memories_is_plain() {
        let client = LlmClient::new(&config());
        let request = client.build_chat_request("hello", &[]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_secondary_endpoint_selection() {
        let mut cfg = config();
        cfg.cerebras_api_key = "key".to_string();
        let client = LlmClient::new(&cfg);
        assert_eq!(client.chat.base_url, CEREBRAS_BASE_URL);
        assert_eq!(client.chat.model, "gpt-oss-120b");
        assert!(client.has_secondary);

        let fallback = LlmClient::new(&config());
        assert_eq!(fallback.chat.base_url, fallback.vision.base_url);
        assert!(!fallback.has_secondary);
    }
}
