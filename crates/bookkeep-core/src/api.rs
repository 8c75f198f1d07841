//! Typed backend endpoints
//!
//! Thin wrappers over [`AuthenticatedClient`]: one method per endpoint,
//! wire shapes from `bookkeep-types`. Response envelopes the backend is
//! inconsistent about (bare array vs `{projects: [...]}`, single object vs
//! one-element array) are normalized here.

use crate::client::AuthenticatedClient;
use crate::error::CoreError;
use bookkeep_types::{
    AgingInvoice, BasPeriod, Category, Company, Contractor, Invoice, InvoiceFilter,
    InvoiceWithPayments, Job, JobBudget, Payment, PayrollEntry, Project, PurchaseOrder,
};
use serde::Deserialize;
use std::sync::Arc;

pub mod paths {
    pub const PROJECTS: &str = "/high/projects";
    pub const CATEGORIES: &str = "/high/categ/";
    pub const JOBS: &str = "/high/job/";
    pub const JOBS_BY_CATEGORY: &str = "/high/job/jobs-by-category/";
    pub const JOB_BUDGETS: &str = "/high/jobbudgets/";
    pub const CONTRACTORS: &str = "/high/contractor/";
    pub const INVOICES: &str = "/high/invoice/";
    pub const UNPAID_INVOICES: &str = "/high/invoice/unpaid/";
    pub const INVOICES_BY_JOBS: &str = "/high/invoice/invoices-by-jobs/";
    pub const INVOICE_WITH_PAYMENTS: &str = "/high/invoice/singleinvpay/";
    pub const PAYMENTS: &str = "/high/pay/";
    pub const PURCHASE_ORDERS: &str = "/high/po/";
    pub const COMPANY: &str = "/high/company/";
    pub const AGING_REPORT: &str = "/high/agingreport/";
    pub const BAS_REPORT: &str = "/high/agingreport/bas/";
    pub const PAYROLL: &str = "/high/payroll/";
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectList {
    Wrapped { projects: Vec<Project> },
    Bare(Vec<Project>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectDetail {
    Many(Vec<Project>),
    One(Project),
    Failed { error: serde_json::Value },
}

/// Project fields accepted by create/update
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProjectDraft<'a> {
    pub project_name: &'a str,
    pub manager: &'a str,
    pub description: &'a str,
    pub status: &'a str,
}

#[derive(Clone)]
pub struct BookkeepApi {
    client: Arc<AuthenticatedClient>,
}

impl BookkeepApi {
    pub fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<AuthenticatedClient> {
        &self.client
    }

    // ===================
    // Projects
    // ===================

    pub async fn projects(&self) -> Result<Vec<Project>, CoreError> {
        let list: ProjectList = self.client.get_json(paths::PROJECTS).await?;
        Ok(match list {
            ProjectList::Wrapped { projects } => projects,
            ProjectList::Bare(projects) => projects,
        })
    }

    /// Project by code; `Ok(None)` when the backend has no such project
    pub async fn project(&self, code: i64) -> Result<Option<Project>, CoreError> {
        let path = format!("{}/{code}", paths::PROJECTS);
        let detail: ProjectDetail = match self.client.get_json(&path).await {
            Ok(detail) => detail,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        match detail {
            ProjectDetail::Many(projects) => Ok(projects.into_iter().next()),
            ProjectDetail::One(project) => Ok(Some(project)),
            ProjectDetail::Failed { error } => Err(CoreError::Backend {
                message: match error {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                },
            }),
        }
    }

    pub async fn create_project(&self, draft: &ProjectDraft<'_>) -> Result<Project, CoreError> {
        self.client
            .post_json(&format!("{}/", paths::PROJECTS), draft)
            .await
    }

    pub async fn update_project(
        &self,
        code: i64,
        draft: &ProjectDraft<'_>,
    ) -> Result<Project, CoreError> {
        self.client
            .put_json(&format!("{}/{code}/", paths::PROJECTS), draft)
            .await
    }

    pub async fn delete_project(&self, code: i64) -> Result<(), CoreError> {
        self.client
            .delete(&format!("{}/{code}/", paths::PROJECTS))
            .await
    }

    // ===================
    // Categories
    // ===================

    pub async fn categories(&self) -> Result<Vec<Category>, CoreError> {
        self.client.get_json(paths::CATEGORIES).await
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, CoreError> {
        self.client
            .post_json(paths::CATEGORIES, &serde_json::json!({ "name": name }))
            .await
    }

    pub async fn update_category(&self, code: i64, name: &str) -> Result<Category, CoreError> {
        self.client
            .put_json(
                &format!("{}{code}/", paths::CATEGORIES),
                &serde_json::json!({ "name": name }),
            )
            .await
    }

    pub async fn delete_category(&self, code: i64) -> Result<(), CoreError> {
        self.client
            .delete(&format!("{}{code}/", paths::CATEGORIES))
            .await
    }

    // ===================
    // Jobs
    // ===================

    pub async fn jobs(&self) -> Result<Vec<Job>, CoreError> {
        self.client.get_json(paths::JOBS).await
    }

    /// Jobs of the given categories, in one call
    pub async fn jobs_by_category(&self, category_codes: &[i64]) -> Result<Vec<Job>, CoreError> {
        self.client
            .post_json(paths::JOBS_BY_CATEGORY, category_codes)
            .await
    }

    pub async fn create_job(
        &self,
        category_code: i64,
        name: &str,
        description: &str,
    ) -> Result<Job, CoreError> {
        let body = serde_json::json!({
            "job_category_id": category_code,
            "name": name,
            "description": description,
        });
        self.client.post_json(paths::JOBS, &body).await
    }

    pub async fn update_job(&self, job: &Job) -> Result<Job, CoreError> {
        self.client
            .put_json(&format!("{}{}/", paths::JOBS, job.code), job)
            .await
    }

    pub async fn delete_job(&self, code: i64) -> Result<(), CoreError> {
        self.client.delete(&format!("{}{code}/", paths::JOBS)).await
    }

    // ===================
    // Job budgets
    // ===================

    pub async fn job_budgets(&self) -> Result<Vec<JobBudget>, CoreError> {
        self.client.get_json(paths::JOB_BUDGETS).await
    }

    pub async fn job_budget(&self, code: i64) -> Result<JobBudget, CoreError> {
        self.client
            .get_json(&format!("{}{code}/", paths::JOB_BUDGETS))
            .await
    }

    /// Create a budget; `budget.code` should be `None`, the backend assigns it
    pub async fn create_job_budget(&self, budget: &JobBudget) -> Result<JobBudget, CoreError> {
        self.client.post_json(paths::JOB_BUDGETS, budget).await
    }

    pub async fn update_job_budget(
        &self,
        code: i64,
        budget: &JobBudget,
    ) -> Result<JobBudget, CoreError> {
        self.client
            .put_json(&format!("{}{code}/", paths::JOB_BUDGETS), budget)
            .await
    }

    pub async fn delete_job_budget(&self, code: i64) -> Result<(), CoreError> {
        self.client
            .delete(&format!("{}{code}/", paths::JOB_BUDGETS))
            .await
    }

    // ===================
    // Contractors
    // ===================

    pub async fn contractors(&self) -> Result<Vec<Contractor>, CoreError> {
        self.client.get_json(paths::CONTRACTORS).await
    }

    /// Create a contractor; the backend assigns `code`, the sent one is ignored
    pub async fn create_contractor(&self, contractor: &Contractor) -> Result<Contractor, CoreError> {
        self.client.post_json(paths::CONTRACTORS, contractor).await
    }

    pub async fn update_contractor(&self, contractor: &Contractor) -> Result<Contractor, CoreError> {
        self.client
            .put_json(
                &format!("{}{}/", paths::CONTRACTORS, contractor.code),
                contractor,
            )
            .await
    }

    pub async fn delete_contractor(&self, code: i64) -> Result<(), CoreError> {
        self.client
            .delete(&format!("{}{code}/", paths::CONTRACTORS))
            .await
    }

    // ===================
    // Invoices & payments
    // ===================

    pub async fn invoices(&self) -> Result<Vec<Invoice>, CoreError> {
        self.client.get_json(paths::INVOICES).await
    }

    pub async fn unpaid_invoices(&self) -> Result<Vec<Invoice>, CoreError> {
        self.client.get_json(paths::UNPAID_INVOICES).await
    }

    /// Invoices of the given jobs within one project, in one call
    pub async fn invoices_by_jobs(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, CoreError> {
        self.client.post_json(paths::INVOICES_BY_JOBS, filter).await
    }

    pub async fn invoice_with_payments(&self, code: i64) -> Result<InvoiceWithPayments, CoreError> {
        let value: serde_json::Value = self
            .client
            .get_json(&format!("{}{code}", paths::INVOICE_WITH_PAYMENTS))
            .await?;
        if let Some(error) = value.get("error") {
            return Err(CoreError::Backend {
                message: error.to_string(),
            });
        }
        serde_json::from_value(value).map_err(|source| CoreError::Decode {
            context: format!("invoice {code}"),
            source,
        })
    }

    pub async fn delete_invoice(&self, code: i64) -> Result<(), CoreError> {
        self.client
            .delete(&format!("{}{code}/", paths::INVOICES))
            .await
    }

    pub async fn payments(&self) -> Result<Vec<Payment>, CoreError> {
        self.client.get_json(paths::PAYMENTS).await
    }

    pub async fn delete_payment(&self, code: i64) -> Result<(), CoreError> {
        self.client
            .delete(&format!("{}{code}/", paths::PAYMENTS))
            .await
    }

    // ===================
    // Other
    // ===================

    pub async fn purchase_orders(&self) -> Result<Vec<PurchaseOrder>, CoreError> {
        self.client.get_json(paths::PURCHASE_ORDERS).await
    }

    pub async fn company(&self) -> Result<Company, CoreError> {
        self.client.get_json(paths::COMPANY).await
    }

    pub async fn aging_report(&self) -> Result<Vec<AgingInvoice>, CoreError> {
        self.client.get_json(paths::AGING_REPORT).await
    }

    /// BAS totals for a period; the report layout is passed through as JSON
    pub async fn bas_report(&self, period: &BasPeriod) -> Result<serde_json::Value, CoreError> {
        self.client.post_json(paths::BAS_REPORT, period).await
    }

    // ===================
    // Payroll
    // ===================

    pub async fn payroll(&self) -> Result<Vec<PayrollEntry>, CoreError> {
        self.client.get_json(paths::PAYROLL).await
    }

    pub async fn create_payroll(&self, entry: &PayrollEntry) -> Result<PayrollEntry, CoreError> {
        self.client.post_json(paths::PAYROLL, entry).await
    }

    pub async fn update_payroll(
        &self,
        code: i64,
        entry: &PayrollEntry,
    ) -> Result<PayrollEntry, CoreError> {
        self.client
            .put_json(&format!("{}{code}/", paths::PAYROLL), entry)
            .await
    }

    pub async fn delete_payroll(&self, code: i64) -> Result<(), CoreError> {
        self.client
            .delete(&format!("{}{code}/", paths::PAYROLL))
            .await
    }
}
