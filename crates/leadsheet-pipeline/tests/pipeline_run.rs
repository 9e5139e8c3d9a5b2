use chrono::NaiveDate;
use leadsheet_adapters::SourceProvider;
use leadsheet_core::{Company, Contact, HiringFlag, PLACEHOLDER_TITLE};
use leadsheet_pipeline::{
    LeadPipeline, PipelineConfig, BRIEF_FILE, CONTACTS_FILE, TARGETS_FILE, VERIFIED_FILE,
    WORKBOOK_FILE,
};
use leadsheet_storage::{read_csv, Pacing};

fn pipeline(data_dir: &std::path::Path, seed: u64) -> LeadPipeline {
    let config = PipelineConfig {
        data_dir: data_dir.to_path_buf(),
        seed: Some(seed),
        ..PipelineConfig::default()
    };
    LeadPipeline::with_provider(config, SourceProvider::simulated(Some(seed)))
        .with_today(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap())
        .with_pacing(Pacing::none())
}

#[tokio::test]
async fn simulated_run_produces_every_stage_output() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path(), 42);
    let summary = pipeline.run_all().await.unwrap();

    let stages: Vec<&str> = summary.stages.iter().map(|s| s.stage).collect();
    assert_eq!(stages, vec!["collect", "verify", "enrich", "consolidate"]);
    assert_eq!(summary.provider, "simulated");
    assert_eq!(summary.stages[0].rows_out, 74);

    let layout = pipeline.layout();
    let verified: Vec<Company> = read_csv(&layout.processed(VERIFIED_FILE), "verify").await.unwrap();
    assert_eq!(verified.len(), 74);
    assert!(verified.iter().all(|c| c.hiring_devops != HiringFlag::Unknown
        && c.hiring_developers != HiringFlag::Unknown));
    assert!(verified
        .iter()
        .all(|c| c.actively_hiring.is_yes() == c.hiring_any_role()));

    let targets: Vec<Company> = read_csv(&layout.processed(TARGETS_FILE), "enrich").await.unwrap();
    assert!(targets.iter().all(|c| c.hiring_any_role()));
    let contacts: Vec<Contact> = read_csv(&layout.processed(CONTACTS_FILE), "enrich").await.unwrap();
    let target_ids: Vec<u32> = targets.iter().map(|c| c.company_id).collect();
    assert!(contacts.iter().all(|c| target_ids.contains(&c.company_id)));
    assert!(contacts.iter().all(|c| c.executive_title != PLACEHOLDER_TITLE || c.email.is_some()));

    let book = umya_spreadsheet::reader::xlsx::read(layout.final_file(WORKBOOK_FILE)).unwrap();
    let names: Vec<String> = book
        .get_sheet_collection()
        .iter()
        .map(|sheet| sheet.get_name().to_string())
        .collect();
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
    let company_sheet = book.get_sheet_by_name("Company Data").unwrap();
    assert_eq!(company_sheet.get_value((1, 1)), "Company Name");
    assert_eq!(company_sheet.get_value((16, 1)), "Last Verified");
    let pane = company_sheet.get_sheets_views().get_sheet_view_list()[0]
        .get_pane()
        .expect("frozen header pane");
    assert_eq!(pane.get_top_left_cell().get_coordinate(), "A2");
    assert_eq!(company_sheet.get_conditional_formatting_collection().len(), 2);

    assert!(layout.final_file(BRIEF_FILE).exists());
    let manifest: serde_json::Value = serde_json::from_slice(
        &std::fs::read(layout.final_dir().join("snapshots").join("manifest.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(manifest["files"].as_array().unwrap().len(), 3);
    assert_eq!(manifest["run_id"], summary.run_id.to_string());
}

#[tokio::test]
async fn same_seed_replays_the_same_verification() {
    let first_dir = tempfile::tempdir().unwrap();
    let second_dir = tempfile::tempdir().unwrap();

    let first = pipeline(first_dir.path(), 7);
    first.collect().await.unwrap();
    first.verify().await.unwrap();
    let second = pipeline(second_dir.path(), 7);
    second.collect().await.unwrap();
    second.verify().await.unwrap();

    let a: Vec<Company> = read_csv(&first.layout().processed(VERIFIED_FILE), "verify").await.unwrap();
    let b: Vec<Company> = read_csv(&second.layout().processed(VERIFIED_FILE), "verify").await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn stages_run_out_of_order_report_the_missing_step() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path(), 1);
    let err = pipeline.enrich().await.unwrap_err();
    assert!(format!("{err:#}").contains("leadsheet verify"));
}
