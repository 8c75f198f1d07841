//! Ledger aggregation
//!
//! Builds the project → category → job → invoice-line tree for one project
//! from four causally ordered fetches:
//!
//! 1. project detail
//! 2. all categories
//! 3. jobs of those categories (one batched call)
//! 4. invoices of those jobs within the project (one batched call)
//!
//! Jobs whose category is not in the fetched list, and invoices whose job is
//! not in the fetched list, are dropped. A tree is either complete or not
//! returned at all.

use crate::api::BookkeepApi;
use crate::error::{CoreError, LedgerError, LedgerStep};
use bookkeep_types::{
    Category, CategoryLedger, Invoice, InvoiceFilter, InvoiceLine, Job, JobLedger, Project,
    ProjectLedger,
};
use std::collections::HashMap;
use tracing::{debug, warn};

pub struct LedgerAggregator {
    api: BookkeepApi,
}

impl LedgerAggregator {
    pub fn new(api: BookkeepApi) -> Self {
        Self { api }
    }

    /// Ledger for `project_code`, or an empty list if anything went wrong
    ///
    /// The single project is wrapped in a list, matching what report views
    /// consume. Failures are logged, never returned; use
    /// [`try_build_ledger`](Self::try_build_ledger) to tell them apart.
    pub async fn build_ledger(&self, project_code: i64) -> Vec<ProjectLedger> {
        match self.try_build_ledger(project_code).await {
            Ok(ledger) => ledger,
            Err(e) if e.is_empty_data() => {
                warn!(project_code, reason = %e, "Ledger is empty");
                Vec::new()
            }
            Err(e) => {
                let cause = std::error::Error::source(&e).map(ToString::to_string);
                warn!(project_code, error = %e, cause = ?cause, "Ledger aggregation failed");
                Vec::new()
            }
        }
    }

    pub async fn try_build_ledger(
        &self,
        project_code: i64,
    ) -> Result<Vec<ProjectLedger>, LedgerError> {
        let project = self
            .api
            .project(project_code)
            .await
            .map_err(upstream(LedgerStep::Project))?
            .ok_or(LedgerError::ProjectNotFound { code: project_code })?;
        debug!(project_code, name = %project.name, "Project loaded");

        let categories = self
            .api
            .categories()
            .await
            .map_err(upstream(LedgerStep::Categories))?;
        if categories.is_empty() {
            return Err(LedgerError::NoCategories);
        }

        let category_codes: Vec<i64> = categories.iter().map(|c| c.code).collect();
        let jobs = self
            .api
            .jobs_by_category(&category_codes)
            .await
            .map_err(upstream(LedgerStep::Jobs))?;

        let invoices = if jobs.is_empty() {
            debug!(project_code, "No jobs in any category, skipping invoice fetch");
            Vec::new()
        } else {
            let filter = InvoiceFilter {
                job_codes: jobs.iter().map(|j| j.code).collect(),
                project_code: Some(project_code),
            };
            self.api
                .invoices_by_jobs(&filter)
                .await
                .map_err(upstream(LedgerStep::Invoices))?
        };

        debug!(
            project_code,
            categories = categories.len(),
            jobs = jobs.len(),
            invoices = invoices.len(),
            "Assembling ledger"
        );
        Ok(vec![assemble(project, categories, jobs, &invoices)])
    }
}

fn upstream(step: LedgerStep) -> impl Fn(CoreError) -> LedgerError {
    move |source| LedgerError::Upstream { step, source }
}

/// Nest jobs under categories and invoice lines under jobs
///
/// Category and job order follow the fetched lists. Children with no
/// matching parent are dropped.
pub fn assemble(
    project: Project,
    categories: Vec<Category>,
    jobs: Vec<Job>,
    invoices: &[Invoice],
) -> ProjectLedger {
    let mut lines_by_job: HashMap<i64, Vec<InvoiceLine>> = HashMap::new();
    for invoice in invoices {
        lines_by_job
            .entry(invoice.job_id)
            .or_default()
            .push(InvoiceLine::from(invoice));
    }

    let category_nodes: Vec<CategoryLedger> = {
        let mut jobs_by_category: HashMap<i64, Vec<&Job>> = HashMap::new();
        for job in &jobs {
            jobs_by_category.entry(job.category_code).or_default().push(job);
        }

        categories
            .into_iter()
            .map(|category| {
                let members: Vec<JobLedger> = jobs_by_category
                    .get(&category.code)
                    .map(|members| {
                        members
                            .iter()
                            .map(|job| JobLedger {
                                job: (*job).clone(),
                                details: lines_by_job.get(&job.code).cloned().unwrap_or_default(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                CategoryLedger {
                    category,
                    jobs: members,
                }
            })
            .collect()
    };

    ProjectLedger {
        project,
        jobs,
        categories: category_nodes,
    }
}
