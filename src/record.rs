//! The validated structured result of a bill extraction.
//!
//! [`BillRecord`] mirrors the extraction contract in [`crate::schema`]
//! field-for-field: every declared field is mandatory and numeric fields are
//! plain JSON numbers. Deserialisation through serde *is* the schema
//! validation step — a response missing a field, or carrying `"150.25"`
//! where `150.25` is expected, fails the typed parse and is rejected as an
//! invalid structured response.
//!
//! Wire names are camelCase (the service echoes the schema's property names);
//! Rust field names are snake_case via the serde rename rule.

use serde::{Deserialize, Serialize};

/// Year-over-year comparison block from the bill's usage summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyComparison {
    /// Month name the comparison covers (e.g. "November").
    pub month: String,
    /// Year label for the previous period column (e.g. "2024").
    pub label_previous_year: String,
    /// Year label for the current period column (e.g. "2025").
    pub label_current_year: String,
    /// Electricity usage (kWh) for the previous year.
    pub usage_previous: f64,
    /// Electricity usage (kWh) for the current year.
    pub usage_current: f64,
    /// Average temperature for the previous year.
    pub temp_previous: f64,
    /// Average temperature for the current year.
    pub temp_current: f64,
    /// Average daily cost for the previous year.
    pub daily_cost_previous: f64,
    /// Average daily cost for the current year.
    pub daily_cost_current: f64,
}

impl MonthlyComparison {
    /// Signed percent change in usage versus the previous year.
    ///
    /// Negative means the customer used less this year (800 kWh against
    /// 1000 kWh reads as -20.0). Returns `None` when the previous-year
    /// usage is zero, where the ratio is undefined.
    pub fn usage_change_percent(&self) -> Option<f64> {
        if self.usage_previous == 0.0 {
            return None;
        }
        Some((self.usage_current - self.usage_previous) / self.usage_previous * 100.0)
    }

    /// Signed percent change in average daily cost versus the previous year.
    pub fn daily_cost_change_percent(&self) -> Option<f64> {
        if self.daily_cost_previous == 0.0 {
            return None;
        }
        Some(
            (self.daily_cost_current - self.daily_cost_previous) / self.daily_cost_previous * 100.0,
        )
    }
}

/// Validated structured extraction of a utility bill's key fields.
///
/// Created once per successful extraction call; replaces any prior record;
/// cleared on session reset. The persona fields feed the persona image
/// prompt, `energy_tip` feeds the collage prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillRecord {
    /// Customer name as printed on the bill.
    pub customer_name: String,
    /// First name only, for friendly display copy.
    pub customer_first_name: String,
    /// Service address including city, state, zip.
    pub service_address: String,
    /// Meter number listed on the bill.
    pub meter_number: String,
    /// Account number.
    pub account_number: String,
    /// Total amount due, in dollars.
    pub amount_due: f64,
    /// Due date of the bill.
    pub due_date: String,
    /// Total supply charges in dollars.
    pub supply_charges: f64,
    /// Total delivery charges in dollars.
    pub delivery_charges: f64,
    /// The "Want to save?" energy tip text on the bill.
    pub energy_tip: String,
    /// Price-to-compare rate per kWh.
    pub price_to_compare: f64,
    /// Current month shown in the usage summary section.
    pub bill_month: String,
    /// One-sentence narrative comparing this bill's amount to last year's.
    pub amount_comparison_sentence: String,
    /// One-sentence restatement of the energy tip addressed to the customer.
    pub energy_tip_sentence: String,
    /// Year-over-year comparison block.
    pub monthly_comparison: MonthlyComparison,
    /// Short title of the customer's energy-usage persona.
    pub persona_title: String,
    /// A few sentences describing the persona.
    pub persona_description: String,
    /// Free-text visual-style prompt used to illustrate the persona.
    pub persona_visual_prompt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_comparison() -> MonthlyComparison {
        MonthlyComparison {
            month: "March".into(),
            label_previous_year: "2024".into(),
            label_current_year: "2025".into(),
            usage_previous: 1000.0,
            usage_current: 800.0,
            temp_previous: 41.0,
            temp_current: 44.5,
            daily_cost_previous: 5.10,
            daily_cost_current: 4.25,
        }
    }

    #[test]
    fn usage_decrease_of_twenty_percent() {
        let c = sample_comparison();
        let change = c.usage_change_percent().expect("previous usage nonzero");
        assert!((change - -20.0).abs() < f64::EPSILON, "got {change}");
    }

    #[test]
    fn usage_change_undefined_for_zero_baseline() {
        let mut c = sample_comparison();
        c.usage_previous = 0.0;
        assert_eq!(c.usage_change_percent(), None);
    }

    #[test]
    fn daily_cost_change_sign() {
        let c = sample_comparison();
        let change = c.daily_cost_change_percent().unwrap();
        assert!(change < 0.0, "cost went down, got {change}");
    }

    #[test]
    fn record_parses_from_wire_json() {
        let json = r#"{
            "customerName": "J DOE",
            "customerFirstName": "J",
            "serviceAddress": "1 Main St, Allentown, PA 18101",
            "meterNumber": "M-4471",
            "accountNumber": "123",
            "amountDue": 150.25,
            "dueDate": "2025-04-02",
            "supplyCharges": 88.10,
            "deliveryCharges": 62.15,
            "energyTip": "Wash clothes in cold water.",
            "priceToCompare": 0.1132,
            "billMonth": "March",
            "amountComparisonSentence": "You paid less than last March.",
            "energyTipSentence": "J, washing in cold water could trim your bill.",
            "monthlyComparison": {
                "month": "March",
                "labelPreviousYear": "2024",
                "labelCurrentYear": "2025",
                "usagePrevious": 1000,
                "usageCurrent": 800,
                "tempPrevious": 41.0,
                "tempCurrent": 44.5,
                "dailyCostPrevious": 5.10,
                "dailyCostCurrent": 4.25
            },
            "personaTitle": "The Cold-Water Saver",
            "personaDescription": "Keeps usage trending down year over year.",
            "personaVisualPrompt": "A tidy laundry room bathed in morning light"
        }"#;

        let record: BillRecord = serde_json::from_str(json).expect("valid record must parse");
        assert_eq!(record.customer_name, "J DOE");
        assert_eq!(record.amount_due, 150.25);
        assert_eq!(record.monthly_comparison.usage_current, 800.0);
        let change = record.monthly_comparison.usage_change_percent().unwrap();
        assert!((change + 20.0).abs() < 1e-9);
    }

    #[test]
    fn record_rejects_missing_field() {
        // accountNumber omitted
        let json = r#"{
            "customerName": "J DOE",
            "customerFirstName": "J",
            "serviceAddress": "1 Main St",
            "meterNumber": "M-4471",
            "amountDue": 150.25,
            "dueDate": "2025-04-02",
            "supplyCharges": 88.10,
            "deliveryCharges": 62.15,
            "energyTip": "tip",
            "priceToCompare": 0.11,
            "billMonth": "March",
            "amountComparisonSentence": "s",
            "energyTipSentence": "s",
            "monthlyComparison": {
                "month": "March",
                "labelPreviousYear": "2024",
                "labelCurrentYear": "2025",
                "usagePrevious": 1000,
                "usageCurrent": 800,
                "tempPrevious": 41.0,
                "tempCurrent": 44.5,
                "dailyCostPrevious": 5.10,
                "dailyCostCurrent": 4.25
            },
            "personaTitle": "t",
            "personaDescription": "d",
            "personaVisualPrompt": "p"
        }"#;

        let err = serde_json::from_str::<BillRecord>(json).unwrap_err();
        assert!(err.to_string().contains("accountNumber"), "got: {err}");
    }

    #[test]
    fn record_rejects_stringly_typed_number() {
        let json = r#"{
            "customerName": "J DOE",
            "customerFirstName": "J",
            "serviceAddress": "1 Main St",
            "meterNumber": "M-4471",
            "accountNumber": "123",
            "amountDue": "150.25",
            "dueDate": "2025-04-02",
            "supplyCharges": 88.10,
            "deliveryCharges": 62.15,
            "energyTip": "tip",
            "priceToCompare": 0.11,
            "billMonth": "March",
            "amountComparisonSentence": "s",
            "energyTipSentence": "s",
            "monthlyComparison": {
                "month": "March",
                "labelPreviousYear": "2024",
                "labelCurrentYear": "2025",
                "usagePrevious": 1000,
                "usageCurrent": 800,
                "tempPrevious": 41.0,
                "tempCurrent": 44.5,
                "dailyCostPrevious": 5.10,
                "dailyCostCurrent": 4.25
            },
            "personaTitle": "t",
            "personaDescription": "d",
            "personaVisualPrompt": "p"
        }"#;

        assert!(serde_json::from_str::<BillRecord>(json).is_err());
    }

    #[test]
    fn record_rejects_incomplete_comparison_block() {
        let json = r#"{
            "customerName": "J DOE",
            "customerFirstName": "J",
            "serviceAddress": "1 Main St",
            "meterNumber": "M-4471",
            "accountNumber": "123",
            "amountDue": 150.25,
            "dueDate": "2025-04-02",
            "supplyCharges": 88.10,
            "deliveryCharges": 62.15,
            "energyTip": "tip",
            "priceToCompare": 0.11,
            "billMonth": "March",
            "amountComparisonSentence": "s",
            "energyTipSentence": "s",
            "monthlyComparison": { "month": "March" },
            "personaTitle": "t",
            "personaDescription": "d",
            "personaVisualPrompt": "p"
        }"#;

        assert!(serde_json::from_str::<BillRecord>(json).is_err());
    }

    #[test]
    fn record_serialises_back_to_camel_case() {
        let record = BillRecord {
            customer_name: "J DOE".into(),
            customer_first_name: "J".into(),
            service_address: "1 Main St".into(),
            meter_number: "M-4471".into(),
            account_number: "123".into(),
            amount_due: 150.25,
            due_date: "2025-04-02".into(),
            supply_charges: 88.10,
            delivery_charges: 62.15,
            energy_tip: "tip".into(),
            price_to_compare: 0.11,
            bill_month: "March".into(),
            amount_comparison_sentence: "s".into(),
            energy_tip_sentence: "s".into(),
            monthly_comparison: sample_comparison(),
            persona_title: "t".into(),
            persona_description: "d".into(),
            persona_visual_prompt: "p".into(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("customerName").is_some());
        assert!(json.get("monthlyComparison").is_some());
        assert!(json["monthlyComparison"].get("usagePrevious").is_some());
    }
}
