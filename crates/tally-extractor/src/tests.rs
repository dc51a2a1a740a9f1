//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{ExtractionError, Extractor, ExtractorConfig, TOOL_NAME};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::time::Duration;
    use tally_domain::completion::{ChatResponse, Choice, Role};
    use tally_domain::InstitutionType;
    use tally_llm::MockProvider;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    #[tokio::test]
    async fn test_lunch_transaction_flow() {
        let llm = MockProvider::with_tool_call(
            TOOL_NAME,
            r#"{"transactions": [{"transaction_date": "2024-05-17", "amount": 12,
                "category": "food", "description": "lunch"}]}"#,
        );
        let extractor = Extractor::new(llm, ExtractorConfig::default());

        let data = extractor.extract_on("I spent $12 on lunch", today()).await.unwrap();

        assert_eq!(data.transactions.len(), 1);
        assert!(data.assets.is_empty());
        let tx = &data.transactions[0];
        assert_eq!(tx.transaction_date, "2024-05-17");
        assert_eq!(tx.amount, Decimal::new(12, 0));
        assert_eq!(tx.currency, "USD");
        assert_eq!(tx.category, "food");
        assert!(!tx.confirm);

        // The request carried the prompt, the text and the tool
        let requests = extractor.provider().requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.contains("Today's date is 2024-05-17"));
        assert_eq!(request.messages[1].content, "I spent $12 on lunch");
        assert_eq!(request.tools[0].name, TOOL_NAME);
    }

    #[tokio::test]
    async fn test_asset_flow_defaults_currency() {
        let llm = MockProvider::with_tool_call(
            TOOL_NAME,
            r#"{"assets": [{"institution_name": "HDFC", "institution_type": "bank",
                "asset_name": "Savings Account", "current_value": 5000}]}"#,
        );
        let extractor = Extractor::new(llm, ExtractorConfig::default());

        let data = extractor
            .extract_on("My HDFC savings account has $5000", today())
            .await
            .unwrap();

        assert!(data.transactions.is_empty());
        assert_eq!(data.assets.len(), 1);
        let asset = &data.assets[0];
        assert_eq!(asset.institution_name, "HDFC");
        assert_eq!(asset.institution_type, InstitutionType::Bank);
        assert_eq!(asset.asset_name, "Savings Account");
        assert_eq!(asset.current_value, Decimal::new(5000, 0));
        assert_eq!(asset.currency, "USD");
    }

    #[tokio::test]
    async fn test_custom_tool_name() {
        let llm = MockProvider::with_tool_call(
            "record_money",
            r#"{"transactions": [{"transaction_date": "2024-05-17", "amount": 1,
                "category": "misc", "description": "gum"}]}"#,
        );
        let config = ExtractorConfig {
            tool_name: "record_money".to_string(),
            ..ExtractorConfig::default()
        };
        let extractor = Extractor::new(llm, config);

        let data = extractor.extract_on("gum for a dollar", today()).await.unwrap();
        assert_eq!(data.transactions.len(), 1);
        assert_eq!(extractor.provider().requests()[0].tools[0].name, "record_money");
    }

    #[tokio::test]
    async fn test_plain_reply_is_no_financial_data() {
        let llm = MockProvider::new(ChatResponse::text("That doesn't look like an expense."));
        let extractor = Extractor::new(llm, ExtractorConfig::default());

        let result = extractor.extract_on("hello there", today()).await;
        assert_eq!(
            result,
            Err(ExtractionError::NoFinancialData {
                reply: Some("That doesn't look like an expense.".to_string())
            })
        );
    }

    #[tokio::test]
    async fn test_empty_tool_call_is_no_financial_data() {
        let llm = MockProvider::with_tool_call(TOOL_NAME, "{}");
        let extractor = Extractor::new(llm, ExtractorConfig::default());

        let result = extractor.extract_on("nothing here", today()).await;
        assert_eq!(result, Err(ExtractionError::NoFinancialData { reply: None }));
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_decode_error() {
        let llm = MockProvider::with_tool_call(TOOL_NAME, "This is not JSON");
        let extractor = Extractor::new(llm, ExtractorConfig::default());

        let result = extractor.extract_on("Some text", today()).await;
        assert!(matches!(result, Err(ExtractionError::Decode(_))));
    }

    #[tokio::test]
    async fn test_provider_failure_is_transport_error() {
        let extractor = Extractor::new(MockProvider::failing("connection reset"), ExtractorConfig::default());

        let result = extractor.extract_on("I spent $12 on lunch", today()).await;
        assert!(matches!(result, Err(ExtractionError::Transport(msg)) if msg.contains("connection reset")));
    }

    #[tokio::test]
    async fn test_two_choices_is_transport_error() {
        let mut response = ChatResponse::tool_call(TOOL_NAME, r#"{"transactions": []}"#);
        response.choices.push(Choice::default());
        let extractor = Extractor::new(MockProvider::new(response), ExtractorConfig::default());

        let result = extractor.extract_on("I spent $12 on lunch", today()).await;
        assert!(matches!(result, Err(ExtractionError::Transport(_))));
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        let llm = MockProvider::with_tool_call(TOOL_NAME, "{}").with_delay(Duration::from_secs(3));
        let config = ExtractorConfig {
            timeout_secs: 1,
            ..ExtractorConfig::default()
        };
        let extractor = Extractor::new(llm, config);

        let result = extractor.extract_on("I spent $12 on lunch", today()).await;
        assert!(matches!(result, Err(ExtractionError::Transport(msg)) if msg.contains("timed out")));
    }
}
