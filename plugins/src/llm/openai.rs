use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use yunwei_core::api::{LlmConfig, LlmPlugin};

use super::http_error::LlmHttpError;

/// Chat-completions client for OpenAI-compatible endpoints (DashScope compatible mode by default).
#[derive(Clone)]
pub struct OpenAiCompatLlm {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiCompatLlm {
    pub fn new(cfg: &LlmConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: format!("{}/chat/completions", cfg.base_url.trim_end_matches('/')),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        })
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.trim().is_empty() {
            req
        } else {
            req.bearer_auth(&self.api_key)
        }
    }
}

fn extract_content(v: &Value) -> Option<String> {
    v.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl LlmPlugin for OpenAiCompatLlm {
    fn name(&self) -> &str {
        "openai_compat"
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });
        tracing::debug!(
            target: "yunwei.llm",
            stage = "llm.http.in",
            url = %self.url,
            model = %self.model,
            prompt_chars = user_prompt.chars().count()
        );

        let resp = self
            .auth(self.http.post(&self.url).json(&body))
            .send()
            .await
            .map_err(|e| LlmHttpError::from_reqwest(e, &self.url))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| LlmHttpError::from_reqwest(e, &self.url))?;

        if !status.is_success() {
            return Err(LlmHttpError::status_error(status.as_u16(), &self.url, &text).into());
        }

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| LlmHttpError::decode_error(status.as_u16(), &self.url, e, &text))?;
        let content = extract_content(&value).ok_or_else(|| {
            LlmHttpError::decode_error(
                status.as_u16(),
                &self.url,
                "missing choices[0].message.content",
                &text,
            )
        })?;

        tracing::debug!(
            target: "yunwei.llm",
            stage = "llm.http.out",
            status = %status,
            reply_chars = content.chars().count()
        );
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn cfg(base_url: String, api_key: &str) -> LlmConfig {
        LlmConfig {
            base_url,
            api_key: api_key.to_string(),
            ..LlmConfig::default()
        }
    }

    #[tokio::test]
    async fn test_complete_extracts_content() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({"model": "qwen-max", "max_tokens": 2000})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"你好"}}]}"#)
            .create_async()
            .await;

        let llm = OpenAiCompatLlm::new(&cfg(format!("{}/", server.url()), "sk-test")).unwrap();
        assert_eq!(llm.complete("sys", "hi").await.unwrap(), "你好");
    }

    #[tokio::test]
    async fn test_status_error_is_typed() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let llm = OpenAiCompatLlm::new(&cfg(server.url(), "")).unwrap();
        let err = llm.complete("sys", "hi").await.unwrap_err();
        let http = err.downcast_ref::<LlmHttpError>().unwrap();
        assert_eq!(http.status(), Some(429));
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_missing_content_is_decode_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let llm = OpenAiCompatLlm::new(&cfg(server.url(), "")).unwrap();
        let err = llm.complete("sys", "hi").await.unwrap_err();
        assert!(err.to_string().contains("kind=decode"));
    }
}
