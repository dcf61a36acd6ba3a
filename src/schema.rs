//! The extraction contract sent to the service as a response schema.
//!
//! Centralising the contract here keeps three things in lockstep: the
//! `responseSchema` attached to the extraction request, the required-field
//! lists the tests assert against, and [`crate::record::BillRecord`] which
//! the response is parsed into. Changing the contract means editing this
//! file and the record together; nothing else knows the field names.
//!
//! The schema follows the service's OpenAPI-flavoured dialect: objects with
//! `type` / `properties` / `required`, `STRING` and `NUMBER` scalar types,
//! and per-property `description` strings that steer the model toward the
//! right spot on the document.

use serde_json::{json, Value};

/// Top-level fields the service must return, in schema order.
pub const REQUIRED_FIELDS: [&str; 18] = [
    "customerName",
    "customerFirstName",
    "serviceAddress",
    "meterNumber",
    "accountNumber",
    "amountDue",
    "dueDate",
    "supplyCharges",
    "deliveryCharges",
    "energyTip",
    "priceToCompare",
    "billMonth",
    "amountComparisonSentence",
    "energyTipSentence",
    "monthlyComparison",
    "personaTitle",
    "personaDescription",
    "personaVisualPrompt",
];

/// Fields of the nested year-over-year comparison sub-record.
pub const COMPARISON_FIELDS: [&str; 9] = [
    "month",
    "labelPreviousYear",
    "labelCurrentYear",
    "usagePrevious",
    "usageCurrent",
    "tempPrevious",
    "tempCurrent",
    "dailyCostPrevious",
    "dailyCostCurrent",
];

/// Build the response schema for the bill extraction call.
///
/// Every declared field is mandatory, including the whole nested comparison
/// block with its own mandatory set.
pub fn bill_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "customerName": {
                "type": "STRING",
                "description": "Name of the customer exactly as printed (e.g. NATALIE WESTRING)"
            },
            "customerFirstName": {
                "type": "STRING",
                "description": "The customer's first name only, title-cased"
            },
            "serviceAddress": {
                "type": "STRING",
                "description": "Service address including city, state, zip"
            },
            "meterNumber": {
                "type": "STRING",
                "description": "Meter number listed on the bill"
            },
            "accountNumber": {
                "type": "STRING",
                "description": "Account number"
            },
            "amountDue": {
                "type": "NUMBER",
                "description": "Total amount due in dollars"
            },
            "dueDate": {
                "type": "STRING",
                "description": "Due date of the bill"
            },
            "supplyCharges": {
                "type": "NUMBER",
                "description": "Total supply charges in dollars"
            },
            "deliveryCharges": {
                "type": "NUMBER",
                "description": "Total delivery charges in dollars"
            },
            "energyTip": {
                "type": "STRING",
                "description": "The 'Want to save?' energy tip text provided on the bill"
            },
            "priceToCompare": {
                "type": "NUMBER",
                "description": "The utility's price-to-compare rate per kWh"
            },
            "billMonth": {
                "type": "STRING",
                "description": "The current month shown in the usage summary/comparison section (e.g. November)"
            },
            "amountComparisonSentence": {
                "type": "STRING",
                "description": "One friendly sentence comparing this bill's total to the same month last year"
            },
            "energyTipSentence": {
                "type": "STRING",
                "description": "One sentence restating the energy tip, addressed to the customer by first name"
            },
            "monthlyComparison": {
                "type": "OBJECT",
                "description": "Data from the comparison table showing usage, temperature, and cost for two years",
                "properties": {
                    "month": {
                        "type": "STRING",
                        "description": "The month name for the comparison (e.g. November)"
                    },
                    "labelPreviousYear": {
                        "type": "STRING",
                        "description": "The year label for the previous period column (e.g. 2024)"
                    },
                    "labelCurrentYear": {
                        "type": "STRING",
                        "description": "The year label for the current period column (e.g. 2025)"
                    },
                    "usagePrevious": {
                        "type": "NUMBER",
                        "description": "Electricity usage (kWh) for the previous year"
                    },
                    "usageCurrent": {
                        "type": "NUMBER",
                        "description": "Electricity usage (kWh) for the current year"
                    },
                    "tempPrevious": {
                        "type": "NUMBER",
                        "description": "Average temperature for the previous year"
                    },
                    "tempCurrent": {
                        "type": "NUMBER",
                        "description": "Average temperature for the current year"
                    },
                    "dailyCostPrevious": {
                        "type": "NUMBER",
                        "description": "Average daily cost for the previous year"
                    },
                    "dailyCostCurrent": {
                        "type": "NUMBER",
                        "description": "Average daily cost for the current year"
                    }
                },
                "required": COMPARISON_FIELDS
            },
            "personaTitle": {
                "type": "STRING",
                "description": "A short, evocative title for the customer's energy-usage persona"
            },
            "personaDescription": {
                "type": "STRING",
                "description": "Two or three sentences describing the persona's habits and savings outlook"
            },
            "personaVisualPrompt": {
                "type": "STRING",
                "description": "A vivid visual-style prompt, suitable for an image model, illustrating the persona"
            }
        },
        "required": REQUIRED_FIELDS
    })
}
