mod common;

use chrono::Utc;

use gatepass_api::entities::granite_block::Grade;
use gatepass_api::services::reports::ReportService;

use common::{block_request, block_service, dec, setup_db};

#[tokio::test]
async fn billing_summary_groups_by_grade_with_estimate_constants() {
    let db = setup_db().await;
    let blocks = block_service(&db);
    let reports = ReportService::new(db.clone());

    // Two grade-A blocks of 0.15 CBM each and one grade-B cube of 1 CBM.
    blocks
        .create_block(block_request("A-1", Utc::now()))
        .await
        .unwrap();
    blocks
        .create_block(block_request("A-2", Utc::now()))
        .await
        .unwrap();
    let mut b = block_request("B-1", Utc::now());
    b.grade = Grade::B;
    b.length_mm = dec("1000");
    b.width_mm = dec("1000");
    b.height_mm = dec("1000");
    blocks.create_block(b).await.unwrap();

    let report = reports.billing_summary(None, None).await.unwrap();
    assert_eq!(report.total_blocks, 3);
    assert_eq!(report.grades.len(), 2);

    let grade_a = report.grades.iter().find(|g| g.grade == "A").unwrap();
    assert_eq!(grade_a.block_count, 2);
    assert_eq!(grade_a.total_cbm, dec("0.3"));
    // Estimate preset: tonnage = volume * 2.7, net = volume * 0.95.
    assert_eq!(grade_a.estimated_tonnage, dec("0.81"));
    assert_eq!(grade_a.estimated_net_cbm, dec("0.285"));

    let grade_b = report.grades.iter().find(|g| g.grade == "B").unwrap();
    assert_eq!(grade_b.estimated_tonnage, dec("2.7"));
    assert_eq!(grade_b.estimated_net_cbm, dec("0.95"));

    assert_eq!(report.total_cbm, dec("1.3"));
}

#[tokio::test]
async fn report_honors_the_date_window() {
    let db = setup_db().await;
    let blocks = block_service(&db);
    let reports = ReportService::new(db.clone());

    blocks
        .create_block(block_request("B-1", Utc::now()))
        .await
        .unwrap();

    let report = reports
        .billing_summary(Some(Utc::now() + chrono::Duration::days(1)), None)
        .await
        .unwrap();
    assert_eq!(report.total_blocks, 0);
    assert!(report.grades.is_empty());
}
