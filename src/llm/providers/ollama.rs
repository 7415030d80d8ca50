use crate::config::LlmConfig;
use crate::llm::{LlmError, SqlGenerator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Local Ollama backend, for running the service without a hosted API.
pub struct OllamaProvider {
    client: reqwest::Client,
    api_url: String,
    model: String,
}

#[derive(Serialize, Debug)]
struct OllamaRequest {
    model: String,
    prompt: String,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct OllamaResponse {
    response: String,
}

impl OllamaProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_url = config
            .api_url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434/api/generate".to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            api_url,
            model: config.model.clone(),
        })
    }

    fn prepare_prompt(&self, question: &str, schema: &str) -> String {
        format!(
            r#"
### Instructions:
Convert the question into a single SQL SELECT query for a DuckDB database.
Adhere to these rules:
- {schema}
- Column names are case sensitive; use the exact spelling given above.
- Make sure to wrap every column identifier in double quotes.
- Never use UPDATE, DELETE, INSERT or any command other than SELECT.
- If the question is ambiguous, vague, or cannot be answered with a query over this table, respond with ONLY the word 'ERROR'.

### Input:
Generate a SQL query that answers the question `{question}`.

### Response:
Return only the SQL code (or the word 'ERROR'), nothing else.
"#
        )
    }
}

#[async_trait]
impl SqlGenerator for OllamaProvider {
    async fn generate_sql(&self, question: &str, schema: &str) -> Result<String, LlmError> {
        let prompt = self.prepare_prompt(question, schema);

        debug!("Sending request to Ollama with model: {}", self.model);

        let request = OllamaRequest {
            model: self.model.clone(),
            prompt,
            temperature: 0.1,
            stream: false,
        };

        let response = self
            .client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            // Keep the body, Ollama puts the useful diagnostics there
            let error_body = match response.text().await {
                Ok(body) => format!(" - Response body: {}", body),
                Err(_) => String::new(),
            };

            error!("Ollama API responded with status code: {}{}", status, error_body);
            return Err(LlmError::ResponseError(format!(
                "Ollama API responded with status code: {}{}",
                status, error_body
            )));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ResponseError(e.to_string()))?;

        if ollama_response.response.trim().is_empty() {
            return Err(LlmError::ResponseError(
                "Empty completion from Ollama".to_string(),
            ));
        }

        Ok(ollama_response.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn api_url_defaults_to_local_ollama() {
        let mut config = AppConfig::default().llm;
        config.backend = "ollama".to_string();
        config.model = "sqlcoder".to_string();

        let provider = OllamaProvider::new(&config).unwrap();
        assert_eq!(provider.api_url, "http://localhost:11434/api/generate");
    }
}
