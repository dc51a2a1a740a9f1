//! JSON schema of the extraction tool

use serde_json::{json, Value};
use tally_domain::completion::ToolDefinition;
use tally_domain::InstitutionType;

/// Default name of the extraction tool
pub const TOOL_NAME: &str = "parse_financial_data";

/// The tool definition offered to the model, under the given name
pub fn financial_data_tool(name: &str) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: "Parse financial data including expenses and assets from natural language input."
            .to_string(),
        parameters: parameters_schema(),
    }
}

fn parameters_schema() -> Value {
    let institution_types: Vec<&str> = InstitutionType::ALL.iter().map(|t| t.as_str()).collect();

    json!({
        "type": "object",
        "properties": {
            "transactions": {
                "type": "array",
                "description": "List of expenses or transactions",
                "items": {
                    "type": "object",
                    "properties": {
                        "transaction_date": {
                            "type": "string",
                            "description": "Date of the transaction as YYYY-MM-DD if specified, else today's date"
                        },
                        "amount": {
                            "type": "number",
                            "description": "Amount of the transaction"
                        },
                        "currency": {
                            "type": "string",
                            "description": "Currency code of the amount (default: USD)"
                        },
                        "category": {
                            "type": "string",
                            "description": "One word category of the expense (e.g. food, travel, entertainment)"
                        },
                        "description": {
                            "type": "string",
                            "description": "Concise and short description of the item"
                        }
                    },
                    "required": ["transaction_date", "amount", "category", "description"]
                }
            },
            "assets": {
                "type": "array",
                "description": "List of assets",
                "items": {
                    "type": "object",
                    "properties": {
                        "institution_name": {
                            "type": "string",
                            "description": "Name of the institution (e.g. HDFC, Zerodha)"
                        },
                        "institution_type": {
                            "type": "string",
                            "description": "Type of institution",
                            "enum": institution_types
                        },
                        "asset_name": {
                            "type": "string",
                            "description": "Name of the asset without the institution name (e.g. Savings Account, Stock Portfolio)"
                        },
                        "current_value": {
                            "type": "number",
                            "description": "Current value of the asset"
                        },
                        "currency": {
                            "type": "string",
                            "description": "Currency of the asset value (default: USD)"
                        },
                        "description": {
                            "type": "string",
                            "description": "Additional description of the asset"
                        },
                        "confirm": {
                            "type": "boolean",
                            "description": "Whether the asset entry is confirmed"
                        }
                    },
                    "required": ["institution_name", "institution_type", "asset_name", "current_value"]
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_schema_shape() {
        let tool = financial_data_tool(TOOL_NAME);
        assert_eq!(tool.name, "parse_financial_data");

        let props = &tool.parameters["properties"];
        assert_eq!(props["transactions"]["type"], "array");
        assert_eq!(
            props["transactions"]["items"]["required"],
            json!(["transaction_date", "amount", "category", "description"])
        );
        assert_eq!(
            props["assets"]["items"]["properties"]["institution_type"]["enum"],
            json!(["bank", "broker", "mutual_fund", "other"])
        );
    }
}
