use super::*;
use restock_watcher::{NotificationOutcome, StockState};

#[tokio::test]
async fn test_restock_scenario_sends_alert() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_page(&server, "/products/ummon", product_page("Add to Bag")).await;

    let transport = Arc::new(RecordingTransport::default());
    let runner = create_runner(transport.clone(), complete_credentials());
    let product = product_at(&server, "Ummon (40g Can)", "/products/ummon");

    let records = runner.run(std::slice::from_ref(&product)).await;

    assert_eq!(records[0].status.state, StockState::InStock);
    assert_eq!(records[0].outcome, Some(NotificationOutcome::Sent));
    assert!(records[0].sent);

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "In Stock Alert: Ummon (40g Can)");
    assert!(sent[0].body.contains("Ummon (40g Can)"));
    assert!(sent[0].body.contains(&product.url));
    assert_eq!(sent[0].from, "tracker@example.com");
    assert_eq!(sent[0].to, "me@example.com");
    Ok(())
}

#[tokio::test]
async fn test_sold_out_scenario_never_notifies() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_page(&server, "/products/ummon", product_page("Sold Out")).await;

    let transport = Arc::new(RecordingTransport::default());
    let runner = create_runner(transport.clone(), complete_credentials());

    let records = runner
        .run(&[product_at(&server, "Ummon (40g Can)", "/products/ummon")])
        .await;

    assert_eq!(records[0].status.state, StockState::OutOfStock);
    assert_eq!(records[0].outcome, None);
    assert_eq!(transport.sent_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_nbsp_and_case_variants_still_sold_out() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_page(&server, "/p", product_page("\n   SOLD&nbsp;OUT\n  ")).await;

    let transport = Arc::new(RecordingTransport::default());
    let runner = create_runner(transport.clone(), complete_credentials());

    let records = runner.run(&[product_at(&server, "Ummon", "/p")]).await;
    assert_eq!(records[0].status.state, StockState::OutOfStock);
    assert_eq!(transport.sent_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_presence_based_vendor_with_mixed_label() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_page(&server, "/mixed", product_page("Add to Bag - Sold Out")).await;
    mount_page(&server, "/coming", product_page("Coming Soon")).await;

    let transport = Arc::new(RecordingTransport::default());
    let runner = create_runner(transport.clone(), complete_credentials());

    let in_stock = vec!["Add to Bag".to_string()];
    let records = runner
        .run(&[
            product_at(&server, "Mixed", "/mixed").with_in_stock_markers(in_stock.clone()),
            product_at(&server, "Coming", "/coming").with_in_stock_markers(in_stock),
        ])
        .await;

    assert_eq!(records[0].status.state, StockState::OutOfStock);
    assert_eq!(records[1].status.state, StockState::Indeterminate);
    assert_eq!(records[1].status.diagnostic.as_deref(), Some("Coming Soon"));
    assert_eq!(transport.sent_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_missing_credentials_skip_send() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_page(&server, "/p", product_page("Add to Bag")).await;

    let transport = Arc::new(RecordingTransport::default());
    let mut credentials = complete_credentials();
    credentials.recipient_address.clear();
    let runner = create_runner(transport.clone(), credentials);

    let records = runner.run(&[product_at(&server, "Ummon", "/p")]).await;

    assert_eq!(records[0].status.state, StockState::InStock);
    assert_eq!(records[0].outcome, Some(NotificationOutcome::SkippedNoCredentials));
    assert!(!records[0].sent);
    assert_eq!(transport.sent_count(), 0);
    Ok(())
}
