//! Output formatting for CLI commands
//!
//! Every formatter renders either a human table (comfy-table) or pretty JSON.

use bookkeep_core::SessionStatus;
use bookkeep_types::{Invoice, Project, ProjectLedger};
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Row, Table};

// ============================================================================
// Formatters
// ============================================================================

/// Ledger tree as an indented table, or the raw tree as JSON
pub fn format_ledger(ledger: &[ProjectLedger], json: bool, no_color: bool) -> String {
    if json {
        return serde_json::to_string_pretty(ledger).unwrap_or_else(|_| "[]".to_string());
    }

    let Some(project) = ledger.first() else {
        return "No ledger data.".to_string();
    };

    let mut table = new_table(&["Category / Job", "Invoice", "Reference", "Amount"], no_color);

    for category in &project.categories {
        table.add_row(vec![
            emphasis(&category.category.name, no_color),
            Cell::new(""),
            Cell::new(""),
            amount_cell(category.total()),
        ]);

        for job in &category.jobs {
            table.add_row(vec![
                Cell::new(format!("  {}", truncate(&job.job.name, 30))),
                Cell::new(""),
                Cell::new(""),
                amount_cell(job.total()),
            ]);

            for line in &job.details {
                table.add_row(vec![
                    Cell::new(""),
                    Cell::new(line.id),
                    Cell::new(truncate(&line.description, 30)),
                    amount_cell(line.amount),
                ]);
            }
        }
    }

    table.add_row(vec![
        emphasis("Total", no_color),
        Cell::new(format!("{} lines", project.line_count())),
        Cell::new(""),
        amount_cell(project.total()),
    ]);

    format!(
        "Project {} - {}\n{}",
        project.project.code, project.project.name, table
    )
}

pub fn format_projects(projects: &[Project], json: bool, no_color: bool) -> String {
    if json {
        return serde_json::to_string_pretty(projects).unwrap_or_else(|_| "[]".to_string());
    }

    if projects.is_empty() {
        return "No projects found.".to_string();
    }

    let mut table = new_table(&["Code", "Name", "Manager", "Status"], no_color);
    for project in projects {
        table.add_row(Row::from(vec![
            project.code.to_string(),
            truncate(&project.name, 40),
            dash_if_empty(&project.manager),
            dash_if_empty(&project.status),
        ]));
    }
    table.to_string()
}

pub fn format_invoices(invoices: &[Invoice], json: bool, no_color: bool) -> String {
    if json {
        return serde_json::to_string_pretty(invoices).unwrap_or_else(|_| "[]".to_string());
    }

    if invoices.is_empty() {
        return "No invoices found.".to_string();
    }

    let mut table = new_table(
        &["Code", "Reference", "Project", "Job", "Due", "Cost"],
        no_color,
    );
    for invoice in invoices {
        table.add_row(vec![
            Cell::new(invoice.code),
            Cell::new(truncate(&invoice.reference, 24)),
            Cell::new(
                invoice
                    .project_id
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(invoice.job_id),
            Cell::new(
                invoice
                    .due_date()
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            amount_cell(invoice.cost),
        ]);
    }

    let total: f64 = invoices.iter().map(|i| i.cost).sum();
    format!("{table}\n{} invoices, total {}", invoices.len(), format_amount(total))
}

/// Session summary (human or JSON)
pub fn format_status(status: &SessionStatus, json: bool) -> String {
    let expires_at = status.expiry.and_then(|e| e.expires_at());

    if json {
        let value = serde_json::json!({
            "has_session": status.has_session,
            "expires_at": expires_at.map(|t| t.to_rfc3339()),
            "refresh_due": status.refresh_due,
            "profile": status.profile,
        });
        return serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string());
    }

    if !status.has_session {
        return "Not logged in.".to_string();
    }

    let mut lines = vec!["Logged in".to_string()];
    if let Some(profile) = &status.profile {
        lines.push(format!("User:         {} <{}>", profile.username, profile.email));
    }
    lines.push(format!(
        "Expires:      {}",
        expires_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "unknown (token not decodable)".to_string())
    ));
    lines.push(format!(
        "Refresh due:  {}",
        if status.refresh_due { "yes" } else { "no" }
    ));
    lines.join("\n")
}

// ============================================================================
// Utilities
// ============================================================================

fn new_table(headers: &[&str], no_color: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    if no_color {
        table.set_header(headers.to_vec());
    } else {
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }
    table
}

fn emphasis(text: &str, no_color: bool) -> Cell {
    if no_color {
        Cell::new(text)
    } else {
        Cell::new(text).fg(Color::Yellow)
    }
}

fn amount_cell(amount: f64) -> Cell {
    Cell::new(format_amount(amount)).set_alignment(CellAlignment::Right)
}

/// Two decimals with thousands separators: `12,345.60`
fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{cents}")
}

fn dash_if_empty(s: &str) -> String {
    if s.trim().is_empty() {
        "-".to_string()
    } else {
        s.to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max {
        s.to_string()
    } else {
        // Char-based so multi-byte text never splits mid-character
        s.chars().take(max - 1).collect::<String>() + "…"
    }
}

// ============================================================================
// Tests
// ============================================================================
