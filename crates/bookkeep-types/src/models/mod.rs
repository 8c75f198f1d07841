//! Wire models for the accounting backend

pub mod amount;
pub mod billing;
pub mod ledger;
pub mod project;

pub use billing::{
    AgingInvoice, BasPeriod, Company, Contractor, Invoice, InvoiceFilter, InvoiceShort,
    InvoiceWithPayments, Payment, PayrollEntry, PurchaseOrder,
};
pub use ledger::{CategoryLedger, InvoiceLine, JobLedger, ProjectLedger};
pub use project::{Category, Job, JobBudget, Project};
