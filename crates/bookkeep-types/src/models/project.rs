//! Projects, job categories, jobs and job budgets

use serde::{Deserialize, Serialize};

/// A construction/accounting project
///
/// The backend names the key `id` and the title `project_name`; both the
/// wire names and the short names are accepted when reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "id", alias = "code")]
    pub code: i64,

    #[serde(rename = "project_name", alias = "name", default)]
    pub name: String,

    #[serde(default)]
    pub manager: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub status: String,
}

/// Job category (e.g. "Labor", "Materials")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub code: i64,
    #[serde(default)]
    pub name: String,
}

/// A job, belonging to exactly one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub code: i64,

    /// Code of the owning [`Category`]
    #[serde(rename = "job_category_id", alias = "category_code")]
    pub category_code: i64,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,
}

/// Budget allocated to a job within a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobBudget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,

    #[serde(default, deserialize_with = "super::amount::deserialize")]
    pub budget: f64,

    #[serde(default)]
    pub note: String,

    /// Expanded job, when the backend nests it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<Job>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_accepts_wire_names() {
        let json = r#"{"id": 101, "project_name": "Harbour St", "manager": "Ann", "description": "", "status": "open"}"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.code, 101);
        assert_eq!(project.name, "Harbour St");

        let back = serde_json::to_value(&project).unwrap();
        assert_eq!(back["id"], 101);
        assert_eq!(back["project_name"], "Harbour St");
    }

    #[test]
    fn test_project_accepts_short_names() {
        let json = r#"{"code": 7, "name": "Depot"}"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.code, 7);
        assert_eq!(project.name, "Depot");
        assert!(project.status.is_empty());
    }

    #[test]
    fn test_job_category_reference() {
        let job: Job =
            serde_json::from_str(r#"{"code": 10, "job_category_id": 1, "name": "Dig"}"#).unwrap();
        assert_eq!(job.category_code, 1);
        assert_eq!(job.description, "");
    }

    #[test]
    fn test_job_budget_string_amount() {
        let budget: JobBudget =
            serde_json::from_str(r#"{"job_id": 10, "budget": "1500.25", "note": "q1"}"#).unwrap();
        assert_eq!(budget.budget, 1500.25);
        assert!(budget.code.is_none());
        assert!(budget.job.is_none());

        // a new budget goes out without code or nested records
        let body = serde_json::to_value(&budget).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"job_id": 10, "budget": 1500.25, "note": "q1"})
        );
    }

    #[test]
    fn test_job_budget_nested_records() {
        let json = r#"{"code": 4, "job_id": 10, "project_id": 101, "budget": 900, "note": "",
                       "job": {"code": 10, "job_category_id": 1, "name": "Dig"},
                       "project": {"id": 101, "project_name": "Harbour St"}}"#;
        let budget: JobBudget = serde_json::from_str(json).unwrap();
        assert_eq!(budget.job.unwrap().name, "Dig");
        assert_eq!(budget.project.unwrap().name, "Harbour St");
    }
}
