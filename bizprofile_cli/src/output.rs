use anyhow::Result;
use bizprofile_lib::{
    CompletionReport, FieldError, MissingField, ProfileContext, SaveOutcome,
};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => anyhow::bail!(
                "unknown output format '{}'; expected table, json, csv or markdown",
                other
            ),
        }
    }
}

#[derive(Tabled, Serialize)]
pub struct SectionRow {
    #[tabled(rename = "Section")]
    #[serde(rename = "Section")]
    pub id: String,
    #[tabled(rename = "Title")]
    #[serde(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Groups")]
    #[serde(rename = "Groups")]
    pub groups: usize,
    #[tabled(rename = "Fields")]
    #[serde(rename = "Fields")]
    pub fields: usize,
    #[tabled(rename = "Mandatory")]
    #[serde(rename = "Mandatory")]
    pub mandatory: usize,
    #[tabled(rename = "Save Endpoint")]
    #[serde(rename = "Save Endpoint")]
    pub endpoint: String,
}

#[derive(Tabled, Serialize)]
pub struct CompletionRow {
    #[tabled(rename = "Section")]
    #[serde(rename = "Section")]
    pub section: String,
    #[tabled(rename = "Title")]
    #[serde(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Complete")]
    #[serde(rename = "Complete")]
    pub percentage: String,
    #[tabled(rename = "Mandatory")]
    #[serde(rename = "Mandatory")]
    pub mandatory: String,
    #[tabled(rename = "Mandatory %")]
    #[serde(rename = "Mandatory %")]
    pub mandatory_percentage: String,
}

#[derive(Tabled, Serialize)]
pub struct MissingRow {
    #[tabled(rename = "Section")]
    #[serde(rename = "Section")]
    pub section: String,
    #[tabled(rename = "Group")]
    #[serde(rename = "Group")]
    pub group: String,
    #[tabled(rename = "Field")]
    #[serde(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Label")]
    #[serde(rename = "Label")]
    pub label: String,
}

#[derive(Tabled, Serialize)]
pub struct MessageRow {
    #[tabled(rename = "Level")]
    #[serde(rename = "Level")]
    pub level: String,
    #[tabled(rename = "Message")]
    #[serde(rename = "Message")]
    pub message: String,
}

#[derive(Tabled, Serialize)]
pub struct FieldErrorRow {
    #[tabled(rename = "Field")]
    #[serde(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Problem")]
    #[serde(rename = "Problem")]
    pub message: String,
}

#[derive(Tabled, Serialize)]
pub struct SaveRow {
    #[tabled(rename = "Section")]
    #[serde(rename = "Section")]
    pub section: String,
    #[tabled(rename = "Group")]
    #[serde(rename = "Group")]
    pub group: String,
    #[tabled(rename = "Endpoint")]
    #[serde(rename = "Endpoint")]
    pub endpoint: String,
    #[tabled(rename = "Fields Saved")]
    #[serde(rename = "Fields Saved")]
    pub fields_saved: String,
    #[tabled(rename = "Complete")]
    #[serde(rename = "Complete")]
    pub percentage: String,
    #[tabled(rename = "Mandatory")]
    #[serde(rename = "Mandatory")]
    pub mandatory: String,
}

// -- Row builders --

pub fn build_section_rows(ctx: &ProfileContext, stage: &str) -> Vec<SectionRow> {
    ctx.config
        .tabs
        .iter()
        .map(|s| SectionRow {
            id: s.id.clone(),
            title: s.title.clone(),
            groups: s.groups.len(),
            fields: s.field_count(),
            mandatory: s.mandatory_fields_for_stage(stage).count(),
            endpoint: ctx
                .routes
                .get(&s.id)
                .map(|r| r.endpoint.clone())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect()
}

pub fn build_completion_rows(report: &CompletionReport) -> Vec<CompletionRow> {
    report
        .sections
        .iter()
        .map(|s| CompletionRow {
            section: s.section_id.clone(),
            title: s.title.clone(),
            percentage: format!("{}%", s.percentage),
            mandatory: format!("{}/{}", s.mandatory.completed, s.mandatory.total),
            mandatory_percentage: format!("{}%", s.mandatory.percentage),
        })
        .collect()
}

pub fn build_missing_rows(missing: &[MissingField]) -> Vec<MissingRow> {
    missing
        .iter()
        .map(|m| MissingRow {
            section: m.section_title.clone(),
            group: m.group_name.clone(),
            field: m.field_name.clone(),
            label: m.label.clone(),
        })
        .collect()
}

pub fn build_warning_rows(warnings: &[String]) -> Vec<MessageRow> {
    warnings
        .iter()
        .map(|w| MessageRow {
            level: "warning".to_string(),
            message: w.clone(),
        })
        .collect()
}

pub fn build_field_error_rows(errors: &[FieldError]) -> Vec<FieldErrorRow> {
    errors
        .iter()
        .map(|e| FieldErrorRow {
            field: e.field.clone(),
            message: e.message.clone(),
        })
        .collect()
}

pub fn build_save_rows(outcome: &SaveOutcome) -> Vec<SaveRow> {
    vec![SaveRow {
        section: outcome.section_id.clone(),
        group: outcome.group_name.clone(),
        endpoint: outcome.endpoint.clone(),
        fields_saved: outcome.fields_saved.join(", "),
        percentage: format!("{}%", outcome.section_percentage),
        mandatory: format!(
            "{}/{} ({}%)",
            outcome.mandatory.completed, outcome.mandatory.total, outcome.mandatory.percentage
        ),
    }]
}

// -- Generic printers --

pub fn print_table<T: Tabled>(rows: Vec<T>) {
    println!("{}", Table::new(rows));
}

pub fn print_markdown<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(Style::markdown());
    println!("{}", table);
}

pub fn print_csv<T: Serialize>(rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_json<T: Serialize + ?Sized>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

/// Prints `rows` in a tabular format. JSON output prints `json` instead,
/// so callers can emit the richer domain value.
pub fn print_rows<T, J>(rows: Vec<T>, json: &J, format: &OutputFormat) -> Result<()>
where
    T: Tabled + Serialize,
    J: Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => print_table(rows),
        OutputFormat::Markdown => print_markdown(rows),
        OutputFormat::Csv => print_csv(&rows)?,
        OutputFormat::Json => print_json(json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizprofile_lib::{ProfileData, RemoteRecord};
    use serde_json::json;

    fn ctx() -> ProfileContext {
        ProfileContext::embedded().unwrap()
    }

    fn report() -> CompletionReport {
        let ctx = ctx();
        let record: RemoteRecord = json!({
            "accountId": "acc-1",
            "kf_tradename": "Blue Horizon",
            "kf_registrationnumber": "CN-102345-A",
            "fullname": "Jane Doe",
            "department": "Growth"
        })
        .as_object()
        .cloned()
        .unwrap();
        let profile = ProfileData::from_remote(&record, &ctx.mapping, &ctx.config);
        CompletionReport::compute(&profile, &ctx.config)
    }

    fn csv_from_rows<T: Serialize>(rows: &[T]) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for row in rows {
            wtr.serialize(row).unwrap();
        }
        wtr.flush().unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("md").unwrap(), OutputFormat::Markdown);
        assert!(OutputFormat::parse("xml").is_err());
    }

    #[test]
    fn test_build_section_rows() {
        let rows = build_section_rows(&ctx(), "growth");
        assert_eq!(rows.len(), 5);
        let basic = &rows[0];
        assert_eq!(basic.id, "basic");
        assert_eq!(basic.fields, 13);
        assert_eq!(basic.mandatory, 6);
        assert_eq!(basic.endpoint, "/vision/visionstrategy");
        assert_eq!(rows[4].endpoint, "-");
    }

    #[test]
    fn test_build_completion_rows() {
        let rows = build_completion_rows(&report());
        let basic = &rows[0];
        assert_eq!(basic.percentage, "23%");
        assert_eq!(basic.mandatory, "3/6");
        assert_eq!(basic.mandatory_percentage, "50%");
    }

    #[test]
    fn test_build_missing_rows() {
        let report = report();
        let rows = build_missing_rows(&report.mandatory.missing);
        assert_eq!(rows.len(), report.mandatory.missing.len());
        assert!(rows.iter().any(|r| r.field == "annualRevenue"));
        assert!(rows.iter().all(|r| r.field != "tradeName"));
    }

    #[test]
    fn test_completion_csv_headers() {
        let csv = csv_from_rows(&build_completion_rows(&report()));
        let header = csv.lines().next().unwrap();
        assert_eq!(header, "Section,Title,Complete,Mandatory,Mandatory %");
        assert!(csv.contains("basic,Vision & Strategy,23%,3/6,50%"));
    }

    #[test]
    fn test_markdown_table_style() {
        let mut table = Table::new(build_warning_rows(&["Field x has no CRM mapping".to_string()]));
        table.with(Style::markdown());
        let rendered = table.to_string();
        assert!(rendered.contains("| Level"));
        assert!(rendered.contains("Field x has no CRM mapping"));
    }

    #[test]
    fn test_build_field_error_rows() {
        let rows = build_field_error_rows(&[FieldError::new("annualRevenue", "'abc' is not a number")]);
        assert_eq!(rows[0].field, "annualRevenue");
        assert_eq!(rows[0].message, "'abc' is not a number");
    }
}
