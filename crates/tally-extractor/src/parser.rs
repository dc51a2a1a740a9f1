//! Parse model output into financial data

use crate::error::ExtractionError;
use tally_domain::completion::ChatResponse;
use tally_domain::{FinancialData, DEFAULT_CURRENCY};
use tracing::debug;

/// Classify a chat response into financial data or an extraction error
///
/// Expects exactly one choice. A call to `tool_name` is decoded; a plain
/// reply that finished normally means the model found nothing to record.
pub fn classify_response(
    response: ChatResponse,
    tool_name: &str,
) -> Result<FinancialData, ExtractionError> {
    let mut choices = response.choices;
    if choices.len() != 1 {
        return Err(ExtractionError::Transport(format!(
            "expected exactly one choice, got {}",
            choices.len()
        )));
    }
    let choice = choices.remove(0);

    if let Some(call) = choice.tool_calls.iter().find(|c| c.name == tool_name) {
        debug!("Tool arguments length: {} chars", call.arguments.len());
        let data = parse_tool_arguments(&call.arguments)?;
        if data.is_empty() {
            return Err(ExtractionError::NoFinancialData { reply: None });
        }
        return Ok(data);
    }

    match choice.finish_reason.as_deref() {
        Some("stop") => Err(ExtractionError::NoFinancialData {
            reply: choice.content,
        }),
        other => Err(ExtractionError::MalformedResponse(format!(
            "no `{}` tool call (finish reason: {})",
            tool_name,
            other.unwrap_or("none")
        ))),
    }
}

/// Decode tool arguments and fill in default currencies
pub fn parse_tool_arguments(arguments: &str) -> Result<FinancialData, ExtractionError> {
    let json_str = strip_code_fence(arguments);
    let mut data: FinancialData = serde_json::from_str(json_str)?;

    for tx in &mut data.transactions {
        if tx.currency.trim().is_empty() {
            tx.currency = DEFAULT_CURRENCY.to_string();
        }
    }
    data.assets = data
        .assets
        .into_iter()
        .map(|asset| asset.with_default_currency())
        .collect();

    Ok(data)
}

/// Some OpenAI-compatible servers wrap arguments in a markdown code block
fn strip_code_fence(arguments: &str) -> &str {
    let trimmed = arguments.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let body = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return trimmed,
    };
    body.trim_end().trim_end_matches("```").trim()
}
