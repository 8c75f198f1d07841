//! Invoices, payments, purchase orders, contractors, company details,
//! payroll and the BAS report period

use super::amount;
use serde::{Deserialize, Serialize};

/// Supplier invoice booked against a job and project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub code: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub po_id: Option<i64>,

    /// Code of the [`Job`](super::Job) this invoice is booked against
    pub job_id: i64,

    /// Contractor code
    #[serde(default)]
    pub by_id: Option<i64>,

    #[serde(default)]
    pub project_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<i64>,

    #[serde(default, deserialize_with = "amount::deserialize")]
    pub cost: f64,

    /// Supplier's invoice reference
    #[serde(rename = "ref", default)]
    pub reference: String,

    #[serde(default)]
    pub contact: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<String>,
}

impl Invoice {
    /// Due date, if the backend supplied a parseable one
    pub fn due_date(&self) -> Option<chrono::NaiveDate> {
        self.due_at.as_deref().and_then(amount::parse_date)
    }
}

/// Invoice together with the payments made against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceWithPayments {
    #[serde(flatten)]
    pub invoice: Invoice,

    #[serde(default)]
    pub pay: Vec<Payment>,
}

impl InvoiceWithPayments {
    /// Sum of all payment amounts
    pub fn paid(&self) -> f64 {
        self.pay.iter().map(|p| p.amount).sum()
    }

    /// Remaining amount owed (never negative)
    pub fn outstanding(&self) -> f64 {
        (self.invoice.cost - self.paid()).max(0.0)
    }
}

/// Short invoice view nested in purchase orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceShort {
    pub code: i64,

    #[serde(rename = "ref", default)]
    pub reference: Option<String>,

    #[serde(default, deserialize_with = "amount::deserialize")]
    pub cost: f64,
}

/// Payment made against an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub code: i64,

    pub invoice_id: i64,

    #[serde(default)]
    pub pay_via: String,

    #[serde(default, deserialize_with = "amount::deserialize")]
    pub amount: f64,

    #[serde(default)]
    pub supply_invoice: String,

    #[serde(default)]
    pub note: String,

    #[serde(default)]
    pub approved_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Purchase order issued to a contractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub code: i64,

    pub job_id: i64,

    #[serde(default)]
    pub by_id: Option<i64>,

    #[serde(default)]
    pub project_id: Option<i64>,

    #[serde(default, deserialize_with = "amount::deserialize")]
    pub cost: f64,

    #[serde(rename = "ref", default)]
    pub reference: String,

    #[serde(default)]
    pub contact: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub note: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<String>,

    #[serde(default)]
    pub invoice: Vec<InvoiceShort>,
}

impl PurchaseOrder {
    /// Total cost of invoices already received against this order
    pub fn invoiced(&self) -> f64 {
        self.invoice.iter().map(|i| i.cost).sum()
    }
}

/// Subcontractor or supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contractor {
    pub code: i64,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub bsb: String,
    #[serde(default)]
    pub account_no: String,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub abn: String,
    #[serde(default)]
    pub gst_registered: bool,
}

/// The business running the books
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub abn: String,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub tfn: Option<String>,
    #[serde(default)]
    pub acn: Option<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

/// Row of the aging report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingInvoice {
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub total_paid: f64,

    #[serde(default, deserialize_with = "amount::deserialize")]
    pub amount_due: f64,

    #[serde(default)]
    pub aging_bucket: String,

    pub code: i64,

    #[serde(rename = "due_at", default)]
    pub due_at: Option<String>,

    #[serde(default, deserialize_with = "amount::deserialize")]
    pub cost: f64,

    #[serde(rename = "ref", default)]
    pub reference: String,

    #[serde(default)]
    pub contractor: serde_json::Value,
}

/// Payroll record
///
/// The backend does not fix the payroll columns, so everything except the
/// key is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayrollEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,

    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Reporting period for the BAS (business activity statement) report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasPeriod {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}

/// Body of `POST /high/invoice/invoices-by-jobs/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFilter {
    pub job_codes: Vec<i64>,
    pub project_code: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_minimal_fields() {
        let json = r#"{"code": 500, "job_id": 10, "ref": "INV-1", "cost": 250, "project_id": 101}"#;
        let invoice: Invoice = serde_json::from_str(json).unwrap();
        assert_eq!(invoice.code, 500);
        assert_eq!(invoice.reference, "INV-1");
        assert_eq!(invoice.cost, 250.0);
        assert_eq!(invoice.project_id, Some(101));
        assert!(invoice.due_date().is_none());
    }

    #[test]
    fn test_invoice_paid_from_string_amounts() {
        let json = r#"{
            "code": 9, "job_id": 1, "ref": "A", "cost": "300.00",
            "due_at": "2024-05-31T00:00:00Z",
            "pay": [
                {"code": 1, "invoice_id": 9, "amount": "100.50"},
                {"code": 2, "invoice_id": 9, "amount": 49.5}
            ]
        }"#;
        let invoice: InvoiceWithPayments = serde_json::from_str(json).unwrap();
        assert_eq!(invoice.paid(), 150.0);
        assert_eq!(invoice.outstanding(), 150.0);
        assert_eq!(invoice.invoice.due_date().unwrap().to_string(), "2024-05-31");
    }

    #[test]
    fn test_invoice_without_payments() {
        let json = r#"{"code": 9, "job_id": 1, "cost": 10}"#;
        let invoice: InvoiceWithPayments = serde_json::from_str(json).unwrap();
        assert_eq!(invoice.paid(), 0.0);
        assert_eq!(invoice.outstanding(), 10.0);
    }

    #[test]
    fn test_invoice_filter_wire_shape() {
        let filter = InvoiceFilter {
            job_codes: vec![10, 11],
            project_code: Some(101),
        };
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json, serde_json::json!({"job_codes": [10, 11], "project_code": 101}));
    }

    #[test]
    fn test_purchase_order_invoiced() {
        let json = r#"{"code": 3, "job_id": 10, "cost": 1000, "invoice": [{"code": 1, "cost": 400}, {"code": 2, "cost": "100"}]}"#;
        let po: PurchaseOrder = serde_json::from_str(json).unwrap();
        assert_eq!(po.invoiced(), 500.0);
    }

    #[test]
    fn test_payroll_keeps_unknown_columns() {
        let json = r#"{"code": 12, "employee": "Lee", "gross": "2100.00", "period_end": "2024-06-30"}"#;
        let entry: PayrollEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.code, Some(12));
        assert_eq!(entry.fields["employee"], "Lee");
        assert!(!entry.fields.contains_key("code"));

        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["gross"], "2100.00");
        assert_eq!(back["code"], 12);
    }

    #[test]
    fn test_bas_period_dates() {
        let period = BasPeriod {
            start: chrono::NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            end: chrono::NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        };
        assert_eq!(
            serde_json::to_value(period).unwrap(),
            serde_json::json!({"start": "2024-04-01", "end": "2024-06-30"})
        );
    }

    #[test]
    fn test_aging_row_camel_case() {
        let json = r#"{"totalPaid": 5, "amountDue": 20, "agingBucket": "31-60", "code": 4, "due_at": null, "cost": 25, "ref": "X", "contractor": {"company_name": "Acme"}}"#;
        let row: AgingInvoice = serde_json::from_str(json).unwrap();
        assert_eq!(row.aging_bucket, "31-60");
        assert_eq!(row.amount_due, 20.0);
        assert_eq!(row.contractor["company_name"], "Acme");
    }
}
