//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::ExtractionError;
use crate::parser::classify_response;
use crate::prompt::PromptBuilder;
use crate::schema::financial_data_tool;
use chrono::{Local, NaiveDate};
use tally_domain::traits::LlmProvider;
use tally_domain::FinancialData;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// The Extractor converts free text into candidate transactions and assets
pub struct Extractor<L>
where
    L: LlmProvider,
{
    llm_provider: L,
    config: ExtractorConfig,
}

impl<L> Extractor<L>
where
    L: LlmProvider,
{
    /// Create a new Extractor around a long-lived provider
    pub fn new(llm_provider: L, config: ExtractorConfig) -> Self {
        Self {
            llm_provider,
            config,
        }
    }

    /// The provider this extractor calls
    pub fn provider(&self) -> &L {
        &self.llm_provider
    }

    /// The active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract financial data from text, using today's local date as the default date
    pub async fn extract(&self, text: &str) -> Result<FinancialData, ExtractionError> {
        self.extract_on(text, Local::now().date_naive()).await
    }

    /// Extract financial data from text, telling the model that today is `today`
    pub async fn extract_on(
        &self,
        text: &str,
        today: NaiveDate,
    ) -> Result<FinancialData, ExtractionError> {
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        let length = text.chars().count();
        if length > self.config.max_text_length {
            return Err(ExtractionError::InputTooLong {
                length,
                max: self.config.max_text_length,
            });
        }

        debug!(text = %text, "Parsing financial data");

        let request = PromptBuilder::new(text, today, financial_data_tool(&self.config.tool_name))
            .build();

        let response = timeout(self.config.timeout(), self.llm_provider.complete(request))
            .await
            .map_err(|_| {
                warn!(
                    model = self.llm_provider.model_name(),
                    "Completion timed out after {:?}",
                    self.config.timeout()
                );
                ExtractionError::Transport(format!(
                    "timed out after {}s",
                    self.config.timeout_secs
                ))
            })?
            .map_err(|e| {
                warn!(model = self.llm_provider.model_name(), error = %e, "Completion error");
                ExtractionError::Transport(e.to_string())
            })?;

        let data = classify_response(response, &self.config.tool_name)?;

        info!(
            "Extracted {} transactions and {} assets",
            data.transactions.len(),
            data.assets.len()
        );

        Ok(data)
    }
}
