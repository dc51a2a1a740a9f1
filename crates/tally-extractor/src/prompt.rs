//! LLM prompt engineering for financial data extraction

use chrono::NaiveDate;
use tally_domain::completion::{ChatMessage, ChatRequest, ToolDefinition};
use tally_domain::DATE_FORMAT;

/// Builds the chat request sent to the model
pub struct PromptBuilder {
    text: String,
    today: NaiveDate,
    tool: ToolDefinition,
}

impl PromptBuilder {
    /// Create a new prompt builder for `text`, offering `tool`
    pub fn new(text: impl Into<String>, today: NaiveDate, tool: ToolDefinition) -> Self {
        Self {
            text: text.into(),
            today,
            tool,
        }
    }

    /// The system message: instructions, asset naming rules, examples and today's date
    pub fn system_prompt(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\n");
        prompt.push_str(ASSET_RULES);
        prompt.push_str("\n\n");
        prompt.push_str(WORKED_EXAMPLES);
        prompt.push_str("\n\n");
        prompt.push_str(&format!(
            "Today's date is {}",
            self.today.format(DATE_FORMAT)
        ));

        prompt
    }

    /// Build the complete request
    pub fn build(self) -> ChatRequest {
        ChatRequest {
            messages: vec![
                ChatMessage::system(self.system_prompt()),
                ChatMessage::user(self.text),
            ],
            tools: vec![self.tool],
        }
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"You are a financial assistant that parses financial data from natural language.
Your task is to extract:
1. Expenses/Transactions: categorize spending with a one word category
2. Assets: capture information about financial assets and their current value

Rules for transactions:
- Use the date mentioned in the text as YYYY-MM-DD; if none is mentioned use today's date
- Use the currency mentioned in the text; if none is mentioned use USD"#;

const ASSET_RULES: &str = r#"Rules for assets:
- Institution Name: name of the bank or broker (e.g. "HDFC", "Citibank", "Zerodha")
- Institution Type: one of "bank", "broker", "mutual_fund", "other"
- Asset Name: concise and must NOT include the institution name. Examples:
  "Fixed Deposit" (not "Citibank Fixed Deposit")
  "Savings Account" (not "HDFC Savings Account")
  "Stock Portfolio" (not "Zerodha Portfolio")
- Currency: use the currency mentioned in the text; if none is mentioned use USD"#;

const WORKED_EXAMPLES: &str = r#"Example inputs and expected parsing:
- Input: "I have $5000 in my HDFC savings account"
  Output: {institution: "HDFC", type: "bank", asset: "Savings Account", value: 5000, currency: "USD"}
- Input: "My Zerodha portfolio is worth ₹100000"
  Output: {institution: "Zerodha", type: "broker", asset: "Stock Portfolio", value: 100000, currency: "INR"}
- Input: "Added 10000 to my HDFC mutual fund"
  Output: {institution: "HDFC", type: "mutual_fund", asset: "Mutual Fund", value: 10000, currency: "USD"}
- Input: "I spent $12 on lunch"
  Output: {transaction_date: today, amount: 12, currency: "USD", category: "food", description: "lunch"}"#;
