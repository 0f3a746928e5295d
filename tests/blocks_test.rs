mod common;

use chrono::{Duration, Utc};

use gatepass_api::errors::ServiceError;
use gatepass_api::services::blocks::{BlockQuery, DispatchStatusRequest, UpdateBlockRequest};
use gatepass_api::services::invoices::CreateInvoiceRequest;

use common::{block_request, block_service, dec, invoice_service, setup_db};

fn query() -> BlockQuery {
    BlockQuery {
        page_number: 1,
        page_size: 20,
        ..Default::default()
    }
}

#[tokio::test]
async fn default_date_window_is_the_last_month() {
    let db = setup_db().await;
    let blocks = block_service(&db);

    blocks
        .create_block(block_request("RECENT", Utc::now() - Duration::days(3)))
        .await
        .unwrap();
    blocks
        .create_block(block_request("OLD", Utc::now() - Duration::days(60)))
        .await
        .unwrap();

    let page = blocks.list_blocks(query()).await.unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.data[0].block_no, "RECENT");

    // An explicit range reaches further back.
    let page = blocks
        .list_blocks(BlockQuery {
            start_date: Some(Utc::now() - Duration::days(90)),
            end_date: Some(Utc::now()),
            ..query()
        })
        .await
        .unwrap();
    assert_eq!(page.total_count, 2);
}

#[tokio::test]
async fn listing_sorts_by_date_descending_by_default() {
    let db = setup_db().await;
    let blocks = block_service(&db);

    blocks
        .create_block(block_request("OLDER", Utc::now() - Duration::days(10)))
        .await
        .unwrap();
    blocks
        .create_block(block_request("NEWER", Utc::now() - Duration::days(1)))
        .await
        .unwrap();

    let page = blocks.list_blocks(query()).await.unwrap();
    assert_eq!(page.data[0].block_no, "NEWER");
    assert_eq!(page.data[1].block_no, "OLDER");
}

#[tokio::test]
async fn page_size_is_clamped_and_pagination_flags_hold() {
    let db = setup_db().await;
    let blocks = block_service(&db);

    for i in 0..7 {
        blocks
            .create_block(block_request(&format!("B-{i}"), Utc::now()))
            .await
            .unwrap();
    }

    let page = blocks
        .list_blocks(BlockQuery {
            page_size: 500,
            ..query()
        })
        .await
        .unwrap();
    assert_eq!(page.page_size, 100);

    let page = blocks
        .list_blocks(BlockQuery {
            page_number: 2,
            page_size: 3,
            ..query()
        })
        .await
        .unwrap();
    assert_eq!(page.total_count, 7);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.data.len(), 3);
    assert!(page.has_next_page);
    assert!(page.has_previous_page);
}

#[tokio::test]
async fn cbm_bounds_filter_on_the_derived_volume() {
    let db = setup_db().await;
    let blocks = block_service(&db);

    // 0.15 CBM
    blocks
        .create_block(block_request("SMALL", Utc::now()))
        .await
        .unwrap();
    // 2700 * 1600 * 1400 / 1e9 = 6.048 CBM
    let mut big = block_request("BIG", Utc::now());
    big.length_mm = dec("2700");
    big.width_mm = dec("1600");
    big.height_mm = dec("1400");
    blocks.create_block(big).await.unwrap();

    let page = blocks
        .list_blocks(BlockQuery {
            min_cbm: Some(dec("1")),
            ..query()
        })
        .await
        .unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.data[0].block_no, "BIG");
    assert_eq!(page.data[0].metrics.quarry_cbm, dec("6.048"));

    let page = blocks
        .list_blocks(BlockQuery {
            max_cbm: Some(dec("1")),
            ..query()
        })
        .await
        .unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.data[0].block_no, "SMALL");
}

#[tokio::test]
async fn unbilled_filter_excludes_billed_blocks() {
    let db = setup_db().await;
    let blocks = block_service(&db);
    let invoices = invoice_service(&db);

    blocks
        .create_block(block_request("FREE", Utc::now()))
        .await
        .unwrap();
    blocks
        .create_block(block_request("SOLD", Utc::now()))
        .await
        .unwrap();
    let request: CreateInvoiceRequest = serde_json::from_value(serde_json::json!({
        "gate_pass_no": "GP-1",
        "bill_to_name": "Acme Granites",
        "block_nos": ["SOLD"],
    }))
    .unwrap();
    invoices.create_invoice(request).await.unwrap();

    let page = blocks
        .list_blocks(BlockQuery {
            statuses: Some(vec!["unbilled".to_string()]),
            ..query()
        })
        .await
        .unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.data[0].block_no, "FREE");

    let page = blocks
        .list_blocks(BlockQuery {
            statuses: Some(vec!["Billed".to_string()]),
            ..query()
        })
        .await
        .unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.data[0].block_no, "SOLD");
}

#[tokio::test]
async fn billed_blocks_walk_the_dispatch_chain_in_order() {
    let db = setup_db().await;
    let blocks = block_service(&db);
    let invoices = invoice_service(&db);

    let created = blocks
        .create_block(block_request("B-1", Utc::now()))
        .await
        .unwrap();
    let request: CreateInvoiceRequest = serde_json::from_value(serde_json::json!({
        "gate_pass_no": "GP-1",
        "bill_to_name": "Acme Granites",
        "block_nos": ["B-1"],
    }))
    .unwrap();
    invoices.create_invoice(request).await.unwrap();

    // Skipping a stage is rejected.
    let err = blocks
        .change_dispatch_status(
            created.id,
            DispatchStatusRequest {
                status: "AtPort".to_string(),
            },
        )
        .await
        .expect_err("cannot skip dispatch stages");
    assert!(matches!(err, ServiceError::InvalidStatus(_)));

    for stage in ["ReadyForDispatch", "LoadedOnTruck", "AtPort", "Shipped"] {
        let updated = blocks
            .change_dispatch_status(
                created.id,
                DispatchStatusRequest {
                    status: stage.to_string(),
                },
            )
            .await
            .unwrap_or_else(|e| panic!("transition to {stage} should succeed: {e}"));
        assert_eq!(updated.status.as_deref(), Some(stage));
    }
}

#[tokio::test]
async fn unbilled_blocks_have_no_dispatch_status() {
    let db = setup_db().await;
    let blocks = block_service(&db);

    let created = blocks
        .create_block(block_request("B-1", Utc::now()))
        .await
        .unwrap();
    let err = blocks
        .change_dispatch_status(
            created.id,
            DispatchStatusRequest {
                status: "ReadyForDispatch".to_string(),
            },
        )
        .await
        .expect_err("unbilled block has no dispatch status");
    assert!(matches!(err, ServiceError::InvalidStatus(_)));
}

#[tokio::test]
async fn editing_a_billed_block_is_rejected() {
    let db = setup_db().await;
    let blocks = block_service(&db);
    let invoices = invoice_service(&db);

    let created = blocks
        .create_block(block_request("B-1", Utc::now()))
        .await
        .unwrap();
    let request: CreateInvoiceRequest = serde_json::from_value(serde_json::json!({
        "gate_pass_no": "GP-1",
        "bill_to_name": "Acme Granites",
        "block_nos": ["B-1"],
    }))
    .unwrap();
    invoices.create_invoice(request).await.unwrap();

    let err = blocks
        .update_block(
            created.id,
            UpdateBlockRequest {
                note: Some("late edit".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect_err("billed blocks are immutable");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn updating_measurements_recomputes_metrics_on_read() {
    let db = setup_db().await;
    let blocks = block_service(&db);

    let created = blocks
        .create_block(block_request("B-1", Utc::now()))
        .await
        .unwrap();
    assert_eq!(created.metrics.quarry_cbm, dec("0.15"));

    let updated = blocks
        .update_block(
            created.id,
            UpdateBlockRequest {
                height_mm: Some(dec("600")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.metrics.quarry_cbm, dec("0.3"));
    assert_eq!(updated.metrics.dmg_tonnage, dec("0.855"));
}

#[tokio::test]
async fn duplicate_block_number_is_a_conflict() {
    let db = setup_db().await;
    let blocks = block_service(&db);

    blocks
        .create_block(block_request("B-1", Utc::now()))
        .await
        .unwrap();
    let err = blocks
        .create_block(block_request("B-1", Utc::now()))
        .await
        .expect_err("block numbers are unique");
    assert!(matches!(err, ServiceError::Conflict(_)));
}
