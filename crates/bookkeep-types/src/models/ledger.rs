//! Nested project → category → job → invoice-line report
//!
//! Nodes flatten their underlying record so the serialized shape is the
//! record's own fields plus one child list (`categories`, `jobs`, `details`).

use super::{Category, Invoice, Job, Project};
use serde::{Deserialize, Serialize};

/// One invoice as shown in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Invoice code
    pub id: i64,
    /// Supplier reference
    pub description: String,
    /// Invoice cost
    pub amount: f64,
}

impl From<&Invoice> for InvoiceLine {
    fn from(invoice: &Invoice) -> Self {
        Self {
            id: invoice.code,
            description: invoice.reference.clone(),
            amount: invoice.cost,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobLedger {
    #[serde(flatten)]
    pub job: Job,
    pub details: Vec<InvoiceLine>,
}

impl JobLedger {
    pub fn total(&self) -> f64 {
        self.details.iter().map(|line| line.amount).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLedger {
    #[serde(flatten)]
    pub category: Category,
    pub jobs: Vec<JobLedger>,
}

impl CategoryLedger {
    pub fn total(&self) -> f64 {
        self.jobs.iter().map(JobLedger::total).sum()
    }
}

/// Root of the ledger tree
///
/// `jobs` carries every job fetched for the report, independent of category
/// placement, as the backend-facing views expect it next to `categories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectLedger {
    #[serde(flatten)]
    pub project: Project,
    pub jobs: Vec<Job>,
    pub categories: Vec<CategoryLedger>,
}

impl ProjectLedger {
    /// Sum of every invoice line in the tree
    pub fn total(&self) -> f64 {
        self.categories.iter().map(CategoryLedger::total).sum()
    }

    /// Number of invoice lines in the tree
    pub fn line_count(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| c.jobs.iter())
            .map(|j| j.details.len())
            .sum()
    }
}
