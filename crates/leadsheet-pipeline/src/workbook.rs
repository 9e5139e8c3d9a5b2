//! Formatted five-sheet workbook built from the consolidated report.

use anyhow::{anyhow, Result};
use leadsheet_core::ReportRow;
use umya_spreadsheet::{
    Border, Color, ConditionalFormatValues, ConditionalFormatting, ConditionalFormattingRule,
    Coordinate, Formula, HorizontalAlignmentValues, Pane, PaneStateValues, PaneValues,
    SequenceOfReferences, SheetView, Spreadsheet, Style, VerticalAlignmentValues, Worksheet,
};

use crate::consolidate::SummaryMetric;
use crate::report::{methodology_lines, SOURCES};

const HEADER_FILL: &str = "FFC5D9F1";
const YES_FILL: &str = "FFC6EFCE";
const NO_FILL: &str = "FFFFC7CE";
const MIN_WIDTH: usize = 10;
const MAX_WIDTH: usize = 50;

static EMPTY_CELL: CellValue = CellValue::Empty;

pub const COMPANY_COLUMNS: [&str; 16] = [
    "Company Name",
    "Industry",
    "Country",
    "Company Size",
    "Annual Revenue (AUD)",
    "Company Website",
    "Company LinkedIn",
    "Hiring DevOps",
    "Hiring Software Developers",
    "C-Level Contact Name",
    "C-Level Title",
    "C-Level LinkedIn",
    "C-Level Email",
    "C-Level Phone",
    "Data Quality",
    "Last Verified",
];

pub const TOP_COLUMNS: [&str; 11] = [
    "Company Name",
    "Industry",
    "Country",
    "Hiring DevOps",
    "Hiring Software Developers",
    "C-Level Contact Name",
    "C-Level Title",
    "C-Level Email",
    "C-Level Phone",
    "Opportunity Score",
    "Opportunity Notes",
];

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    fn optional(value: Option<&str>) -> Self {
        value.map_or(CellValue::Empty, CellValue::text)
    }

    fn display_len(&self) -> usize {
        match self {
            CellValue::Text(text) => text.chars().count(),
            CellValue::Number(number) => number.to_string().len(),
            CellValue::Empty => 0,
        }
    }
}

/// One sheet before styling: optional header row, body rows and a tab color.
#[derive(Debug, Clone)]
pub struct SheetTable {
    pub name: &'static str,
    pub tab_color: &'static str,
    pub header: Option<Vec<&'static str>>,
    pub rows: Vec<Vec<CellValue>>,
    /// Header names whose `Yes`/`No` cells get a green or red fill.
    pub flag_columns: Vec<&'static str>,
}

impl SheetTable {
    fn column_count(&self) -> usize {
        let body = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        self.header.as_ref().map_or(body, |h| h.len().max(body))
    }

    /// Width per column: longest header or cell plus two, clamped to 10..=50.
    pub fn column_widths(&self) -> Vec<f64> {
        (0..self.column_count())
            .map(|col| {
                let header = self
                    .header
                    .as_ref()
                    .and_then(|h| h.get(col))
                    .map_or(0, |name| name.chars().count());
                let body = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(col))
                    .map(CellValue::display_len)
                    .max()
                    .unwrap_or(0);
                (header.max(body) + 2).clamp(MIN_WIDTH, MAX_WIDTH) as f64
            })
            .collect()
    }
}

pub fn company_data_table(rows: &[ReportRow]) -> SheetTable {
    let body = rows
        .iter()
        .map(|row| {
            let company = &row.company;
            vec![
                CellValue::text(row.clean_name.as_str()),
                CellValue::text(company.industry.as_str()),
                CellValue::text(company.country.as_str()),
                company
                    .company_size
                    .map_or(CellValue::Empty, |size| CellValue::Number(size as f64)),
                company.annual_revenue.map_or(CellValue::Empty, CellValue::Number),
                CellValue::optional(company.company_website.as_deref()),
                CellValue::optional(company.linkedin_url.as_deref()),
                CellValue::text(company.hiring_devops.as_str()),
                CellValue::text(company.hiring_developers.as_str()),
                CellValue::optional(row.contact.name.as_deref()),
                CellValue::optional(row.contact.title.as_deref()),
                CellValue::optional(row.contact.linkedin_url.as_deref()),
                CellValue::optional(row.contact.email.as_deref()),
                CellValue::optional(row.contact.phone.as_deref()),
                CellValue::text(row.quality_stars.as_str()),
                CellValue::text(company.last_verified.format("%Y-%m-%d").to_string()),
            ]
        })
        .collect();
    SheetTable {
        name: "Company Data",
        tab_color: "FF1F4E78",
        header: Some(COMPANY_COLUMNS.to_vec()),
        rows: body,
        flag_columns: vec!["Hiring DevOps", "Hiring Software Developers"],
    }
}

pub fn summary_table(metrics: &[SummaryMetric]) -> SheetTable {
    SheetTable {
        name: "Summary Dashboard",
        tab_color: "FF4F81BD",
        header: Some(vec!["Metric", "Count", "Percentage"]),
        rows: metrics
            .iter()
            .map(|m| {
                vec![
                    CellValue::text(m.metric),
                    CellValue::Number(m.count as f64),
                    CellValue::text(m.percentage.as_str()),
                ]
            })
            .collect(),
        flag_columns: Vec::new(),
    }
}

pub fn methodology_table() -> SheetTable {
    SheetTable {
        name: "Methodology",
        tab_color: "FFC0504D",
        header: None,
        rows: methodology_lines()
            .into_iter()
            .map(|line| vec![CellValue::text(line)])
            .collect(),
        flag_columns: Vec::new(),
    }
}

pub fn sources_table() -> SheetTable {
    SheetTable {
        name: "Sources",
        tab_color: "FF9BBB59",
        header: Some(vec!["Source Type", "Source Name", "URL", "Information Gathered"]),
        rows: SOURCES
            .iter()
            .map(|source| {
                vec![
                    CellValue::text(source.kind),
                    CellValue::text(source.name),
                    CellValue::text(source.url),
                    CellValue::text(source.gathered),
                ]
            })
            .collect(),
        flag_columns: Vec::new(),
    }
}

pub fn top_opportunities_table(top: &[ReportRow]) -> SheetTable {
    SheetTable {
        name: "Top 10 Opportunities",
        tab_color: "FF8064A2",
        header: Some(TOP_COLUMNS.to_vec()),
        rows: top
            .iter()
            .map(|row| {
                vec![
                    CellValue::text(row.clean_name.as_str()),
                    CellValue::text(row.company.industry.as_str()),
                    CellValue::text(row.company.country.as_str()),
                    CellValue::text(row.company.hiring_devops.as_str()),
                    CellValue::text(row.company.hiring_developers.as_str()),
                    CellValue::optional(row.contact.name.as_deref()),
                    CellValue::optional(row.contact.title.as_deref()),
                    CellValue::optional(row.contact.email.as_deref()),
                    CellValue::optional(row.contact.phone.as_deref()),
                    CellValue::Number(row.opportunity_score as f64),
                    CellValue::text(row.opportunity_note.as_str()),
                ]
            })
            .collect(),
        flag_columns: Vec::new(),
    }
}

fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

fn outline(sheet: &mut Worksheet, coordinate: (u32, u32)) {
    let borders = sheet.get_style_mut(coordinate).get_borders_mut();
    borders.get_left_mut().set_border_style(Border::BORDER_THIN);
    borders.get_right_mut().set_border_style(Border::BORDER_THIN);
    borders.get_top_mut().set_border_style(Border::BORDER_THIN);
    borders.get_bottom_mut().set_border_style(Border::BORDER_THIN);
}

/// Keeps row 1 in view while scrolling.
fn freeze_header(sheet: &mut Worksheet) {
    let mut top_left = Coordinate::default();
    top_left.set_coordinate("A2");
    let mut pane = Pane::default();
    pane.set_top_left_cell(top_left)
        .set_vertical_split(1f64)
        .set_active_pane(PaneValues::BottomLeft)
        .set_state(PaneStateValues::Frozen);

    let views = sheet.get_sheet_views_mut();
    if views.get_sheet_view_list().is_empty() {
        views.add_sheet_view_list_mut(SheetView::default());
    }
    if let Some(view) = views.get_sheet_view_list_mut().first_mut() {
        view.set_pane(pane);
    }
}

fn highlight_rule(
    column: &str,
    value: &str,
    fill: &str,
    priority: i32,
) -> ConditionalFormattingRule {
    let mut style = Style::default();
    style.set_background_color(fill);
    let mut formula = Formula::default();
    formula.set_string_value(format!("{column}2=\"{value}\""));

    let mut rule = ConditionalFormattingRule::default();
    rule.set_type(ConditionalFormatValues::Expression)
        .set_text(value)
        .set_priority(priority)
        .set_style(style)
        .set_formula(formula);
    rule
}

/// Green for `Yes` and red for `No` down a flag column's body rows.
fn highlight_flags(sheet: &mut Worksheet, col: usize, last_row: u32, priority: i32) {
    let column = column_letter(col);
    let mut range = SequenceOfReferences::default();
    range.set_sqref(format!("{column}2:{column}{last_row}"));

    let mut formatting = ConditionalFormatting::default();
    formatting.set_sequence_of_references(range);
    formatting.add_conditional_collection(highlight_rule(&column, "Yes", YES_FILL, priority));
    formatting.add_conditional_collection(highlight_rule(&column, "No", NO_FILL, priority + 1));
    sheet.add_conditional_formatting_collection(formatting);
}

fn render(sheet: &mut Worksheet, table: &SheetTable) {
    let mut tab = Color::default();
    tab.set_argb(table.tab_color);
    sheet.set_tab_color(tab);

    for (col, width) in table.column_widths().into_iter().enumerate() {
        sheet
            .get_column_dimension_mut(&column_letter(col))
            .set_width(width);
    }

    let mut row_no = 1u32;
    if let Some(header) = &table.header {
        for (col, name) in header.iter().enumerate() {
            let coordinate = (col as u32 + 1, row_no);
            sheet.get_cell_mut(coordinate).set_value(*name);
            let style = sheet.get_style_mut(coordinate);
            style.set_background_color(HEADER_FILL);
            style.get_font_mut().set_bold(true);
            let alignment = style.get_alignment_mut();
            alignment.set_horizontal(HorizontalAlignmentValues::Center);
            alignment.set_vertical(VerticalAlignmentValues::Center);
            outline(sheet, coordinate);
        }
        freeze_header(sheet);
        row_no += 1;
    }

    let width = table.column_count();
    for row in &table.rows {
        for col in 0..width {
            let coordinate = (col as u32 + 1, row_no);
            match row.get(col).unwrap_or(&EMPTY_CELL) {
                CellValue::Text(text) => {
                    sheet.get_cell_mut(coordinate).set_value(text.as_str());
                }
                CellValue::Number(number) => {
                    sheet.get_cell_mut(coordinate).set_value_number(*number);
                }
                CellValue::Empty => {}
            }
            let alignment = sheet.get_style_mut(coordinate).get_alignment_mut();
            alignment.set_wrap_text(true);
            alignment.set_vertical(VerticalAlignmentValues::Top);
            outline(sheet, coordinate);
        }
        row_no += 1;
    }

    // Rules cover at least row 2 so they apply to rows typed in later.
    let last_row = row_no.saturating_sub(1).max(2);
    let flag_indexes = table
        .header
        .iter()
        .flatten()
        .enumerate()
        .filter(|(_, name)| table.flag_columns.contains(*name))
        .map(|(index, _)| index);
    for (n, col) in flag_indexes.enumerate() {
        highlight_flags(sheet, col, last_row, 2 * n as i32 + 1);
    }
}

/// Sheets in workbook order.
pub fn sheet_tables(
    rows: &[ReportRow],
    summary: &[SummaryMetric],
    top: &[ReportRow],
) -> Vec<SheetTable> {
    vec![
        company_data_table(rows),
        summary_table(summary),
        methodology_table(),
        sources_table(),
        top_opportunities_table(top),
    ]
}

pub fn build_workbook(tables: &[SheetTable]) -> Result<Spreadsheet> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    for table in tables {
        let sheet = book
            .new_sheet(table.name)
            .map_err(|message| anyhow!("adding sheet {}: {message}", table.name))?;
        render(sheet, table);
    }
    Ok(book)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_roll_over_after_z() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(15), "P");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
    }

    #[test]
    fn widths_are_clamped_between_ten_and_fifty() {
        let table = SheetTable {
            name: "Widths",
            tab_color: "FF000000",
            header: Some(vec!["Id", "Notes", "Metric Name"]),
            rows: vec![vec![
                CellValue::Number(7.0),
                CellValue::text("x".repeat(80)),
                CellValue::Empty,
            ]],
            flag_columns: Vec::new(),
        };
        assert_eq!(table.column_widths(), vec![10.0, 50.0, 13.0]);
    }

    #[test]
    fn methodology_sheet_has_no_header() {
        let table = methodology_table();
        assert!(table.header.is_none());
        assert_eq!(table.column_count(), 1);
        assert!(table.column_widths()[0] <= 50.0);
    }

    #[test]
    fn workbook_has_five_sheets_in_order() {
        let tables = sheet_tables(&[], &[], &[]);
        let names: Vec<&str> = tables.iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "Company Data",
                "Summary Dashboard",
                "Methodology",
                "Sources",
                "Top 10 Opportunities"
            ]
        );
        let book = build_workbook(&tables).unwrap();
        assert_eq!(book.get_sheet_collection().len(), 5);
        let sources = book.get_sheet_by_name("Sources").unwrap();
        assert_eq!(sources.get_value((1, 1)), "Source Type");
        assert_eq!(sources.get_value((2, 2)), "ASX 200");
    }

    #[test]
    fn header_row_is_frozen_on_every_sheet_that_has_one() {
        let tables = sheet_tables(&[], &[], &[]);
        let book = build_workbook(&tables).unwrap();
        for table in &tables {
            let sheet = book.get_sheet_by_name(table.name).unwrap();
            let pane = sheet
                .get_sheets_views()
                .get_sheet_view_list()
                .first()
                .and_then(|view| view.get_pane());
            match (&table.header, pane) {
                (Some(_), Some(pane)) => {
                    assert_eq!(pane.get_top_left_cell().get_coordinate(), "A2");
                    assert_eq!(*pane.get_vertical_split(), 1.0);
                    assert!(matches!(pane.get_state(), PaneStateValues::Frozen));
                }
                (None, None) => {}
                (header, pane) => panic!(
                    "{}: header {} but pane {}",
                    table.name,
                    header.is_some(),
                    pane.is_some()
                ),
            }
        }
    }

    #[test]
    fn hiring_flags_are_highlighted_by_rule_not_by_fill() {
        let rows = vec![
            vec![CellValue::text("AMP"), CellValue::text("Yes"), CellValue::text("No")],
            vec![CellValue::text("IAG"), CellValue::text("No"), CellValue::text("Yes")],
        ];
        let table = SheetTable {
            name: "Flags",
            tab_color: "FF000000",
            header: Some(vec!["Company Name", "Hiring DevOps", "Hiring Software Developers"]),
            rows,
            flag_columns: vec!["Hiring DevOps", "Hiring Software Developers"],
        };
        let book = build_workbook(&[table]).unwrap();
        let sheet = book.get_sheet_by_name("Flags").unwrap();

        let formatting = sheet.get_conditional_formatting_collection();
        let ranges: Vec<String> = formatting
            .iter()
            .map(|f| f.get_sequence_of_references().get_sqref())
            .collect();
        assert_eq!(ranges, vec!["B2:B3", "C2:C3"]);

        let rules = formatting[0].get_conditional_collection();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].get_text(), "Yes");
        assert_eq!(
            rules[0].get_formula().map(|f| f.get_address_str()).as_deref(),
            Some("B2=\"Yes\"")
        );
        assert_eq!(rules[1].get_text(), "No");
        assert!(sheet
            .get_style((2, 2))
            .get_background_color()
            .is_none());
    }

    #[test]
    fn flag_rules_cover_row_two_on_an_empty_sheet() {
        let book = build_workbook(&[company_data_table(&[])]).unwrap();
        let sheet = book.get_sheet_by_name("Company Data").unwrap();
        let ranges: Vec<String> = sheet
            .get_conditional_formatting_collection()
            .iter()
            .map(|f| f.get_sequence_of_references().get_sqref())
            .collect();
        assert_eq!(ranges, vec!["H2:H2", "I2:I2"]);
    }
}
