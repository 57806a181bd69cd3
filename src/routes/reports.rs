use std::collections::HashMap;
use std::fmt::Write;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::records::RecordFilter;
use crate::error::AppError;
use crate::models::report::{ProductSummary, RecordSummary, UserSummary};
use crate::routes::records::date_window;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ReportParams {
    pub kind: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub format: Option<String>,
}

#[derive(Serialize)]
struct Report<'a, T> {
    kind: &'a str,
    generated_at: DateTime<Utc>,
    generated_by: &'a str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    rows: Vec<T>,
}

/// Flat representation of a report row for CSV export.
trait CsvRow {
    const HEADER: &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

impl CsvRow for ProductSummary {
    const HEADER: &'static [&'static str] = &[
        "id",
        "name",
        "code",
        "parameters",
        "records",
        "total_quantity",
        "out_of_range",
        "last_recorded_at",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            opt(&self.code),
            self.parameter_count.to_string(),
            self.record_count.to_string(),
            self.total_quantity.to_string(),
            self.out_of_range_count.to_string(),
            self.last_recorded_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
        ]
    }
}

impl CsvRow for RecordSummary {
    const HEADER: &'static [&'static str] = &[
        "id",
        "recorded_at",
        "product",
        "lot",
        "guide",
        "quantity",
        "inspector",
        "verified_by",
        "out_of_range",
        "notes",
    ];

    fn cells(&self) -> Vec<String> {
        let r = &self.record;
        vec![
            r.id.to_string(),
            r.recorded_at.to_rfc3339(),
            r.product_name.clone(),
            r.lot.clone(),
            opt(&r.guide),
            r.quantity.to_string(),
            r.user_name.clone(),
            opt(&r.verified_by),
            self.out_of_range_count.to_string(),
            opt(&r.notes),
        ]
    }
}

impl CsvRow for UserSummary {
    const HEADER: &'static [&'static str] = &[
        "id",
        "email",
        "name",
        "role",
        "active",
        "two_factor_enabled",
        "last_login_at",
        "records",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.email.clone(),
            self.name.clone(),
            self.role.clone(),
            self.active.to_string(),
            self.two_factor_enabled.to_string(),
            self.last_login_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            self.record_count.to_string(),
        ]
    }
}

fn to_csv<T: CsvRow>(rows: &[T]) -> String {
    let mut csv = String::new();
    let _ = writeln!(csv, "{}", T::HEADER.join(","));
    for row in rows {
        let line: Vec<String> = row.cells().iter().map(|c| csv_escape(c)).collect();
        let _ = writeln!(csv, "{}", line.join(","));
    }
    csv
}

fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

enum Format {
    Json,
    Csv,
}

fn render<T: CsvRow + Serialize>(
    format: Format,
    auth: &AuthUser,
    params: &ReportParams,
    rows: Vec<T>,
) -> Response {
    match format {
        Format::Csv => {
            let disposition = format!(
                "attachment; filename=\"{}-report-{}.csv\"",
                params.kind,
                Utc::now().format("%Y%m%d")
            );
            (
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                to_csv(&rows),
            )
                .into_response()
        }
        Format::Json => Json(Report {
            kind: &params.kind,
            generated_at: Utc::now(),
            generated_by: &auth.email,
            from: params.from,
            to: params.to,
            rows,
        })
        .into_response(),
    }
}

pub async fn generate(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ReportParams>,
) -> Result<Response, AppError> {
    let format = match params.format.as_deref().unwrap_or("json") {
        "json" => Format::Json,
        "csv" => Format::Csv,
        other => {
            return Err(AppError::BadRequest(format!(
                "Unknown report format '{other}' (expected json or csv)"
            )));
        }
    };
    let (from, until) = date_window(params.from, params.to)?;

    let response = match params.kind.as_str() {
        "products" => {
            let rows = db::reports::product_summaries(&state.pool, from, until).await?;
            render(format, &auth, &params, rows)
        }
        "records" => {
            let filter = RecordFilter {
                from,
                until,
                product_id: None,
            };
            let records = db::records::list(&state.pool, &filter).await?;
            let ids: Vec<_> = records.iter().map(|r| r.id).collect();
            let counts: HashMap<_, _> = db::records::out_of_range_counts(&state.pool, &ids)
                .await?
                .into_iter()
                .collect();

            let rows: Vec<RecordSummary> = records
                .into_iter()
                .map(|record| RecordSummary {
                    out_of_range_count: counts.get(&record.id).copied().unwrap_or(0),
                    record,
                })
                .collect();
            render(format, &auth, &params, rows)
        }
        "users" => {
            auth.require_admin()?;
            let rows = db::reports::user_summaries(&state.pool, from, until).await?;
            render(format, &auth, &params, rows)
        }
        other => {
            return Err(AppError::BadRequest(format!(
                "Unknown report kind '{other}' (expected products, records or users)"
            )));
        }
    };

    tracing::info!(kind = %params.kind, user_id = %auth.user_id, "Report generated");
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_cells_with_separators_are_quoted() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn product_csv_has_header_and_one_line_per_row() {
        let rows = vec![ProductSummary {
            id: uuid::Uuid::nil(),
            name: "Avocado, Hass".to_string(),
            code: None,
            parameter_count: 3,
            record_count: 2,
            total_quantity: 40,
            out_of_range_count: 1,
            last_recorded_at: None,
        }];

        let csv = to_csv(&rows);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("id,name,code,parameters"));
        assert_eq!(
            lines[1],
            "00000000-0000-0000-0000-000000000000,\"Avocado, Hass\",,3,2,40,1,"
        );
    }
}
