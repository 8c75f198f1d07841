//! bookkeep-types - Shared data types for bookkeep
//!
//! This crate contains pure data structures without heavy dependencies.
//! No tokio, no async runtime - just serde-serializable types mirroring the
//! backend's wire format.
//!
//! Used by:
//! - bookkeep-core (session handling, REST client, ledger aggregation)
//! - bookkeep (command-line front-end)

pub mod models;
pub mod session;

pub use models::{
    AgingInvoice, BasPeriod, Category, CategoryLedger, Company, Contractor, Invoice,
    InvoiceFilter, InvoiceLine, InvoiceShort, InvoiceWithPayments, Job, JobBudget, JobLedger,
    Payment, PayrollEntry, Project, ProjectLedger, PurchaseOrder,
};
pub use session::{DecodedExpiry, TokenPair, UserProfile};
