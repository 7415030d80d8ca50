//! Canned SQL generator for tests and offline development.

use crate::llm::{LlmError, SqlGenerator};
use crate::query::guard::SENTINEL;
use async_trait::async_trait;

/// Returns deterministic completions based on input patterns, without
/// making real API calls. Unmatched questions get the refusal sentinel.
#[derive(Debug, Clone, Default)]
pub struct MockSqlGenerator {
    /// Custom response mappings (pattern -> completion).
    custom_responses: Vec<(String, String)>,
}

impl MockSqlGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom mapping: when the question contains `pattern`, the
    /// mock returns `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    fn mock_completion(&self, question: &str) -> String {
        let question_lower = question.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if question_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if question_lower.contains("cacao") {
            return concat!(
                "```sql\n",
                "SELECT \"ProductDescription\", \"AVE\" FROM \"ARANCELES EC-EEUU\" ",
                "WHERE \"ProductDescription\" ILIKE '%cacao%'\n",
                "```"
            )
            .to_string();
        }

        if question_lower.contains("aranceles") || question_lower.contains("tariff") {
            return "SELECT * FROM \"ARANCELES EC-EEUU\" LIMIT 10".to_string();
        }

        SENTINEL.to_string()
    }
}

#[async_trait]
impl SqlGenerator for MockSqlGenerator {
    async fn generate_sql(&self, question: &str, _schema: &str) -> Result<String, LlmError> {
        Ok(self.mock_completion(question))
    }
}
