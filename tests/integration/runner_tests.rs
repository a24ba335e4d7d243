use super::*;
use restock_watcher::{MissingElementPolicy, NotificationOutcome, RunSummary, StockState};

#[tokio::test]
async fn test_batch_isolation_when_one_fetch_fails() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_page(&server, "/first", product_page("Add to Bag")).await;
    mount_status(&server, "/second", 500).await;
    mount_page(&server, "/third", product_page("Add to Bag")).await;

    let transport = Arc::new(RecordingTransport::default());
    let runner = create_runner(transport.clone(), complete_credentials());

    let products = vec![
        product_at(&server, "First", "/first"),
        product_at(&server, "Second", "/second"),
        product_at(&server, "Third", "/third"),
    ];
    let records = runner.run(&products).await;

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].product_name, "First");
    assert_eq!(records[0].status.state, StockState::InStock);
    assert!(records[0].sent);

    assert_eq!(records[1].product_name, "Second");
    assert_eq!(records[1].status.state, StockState::FetchError);
    assert!(!records[1].sent);
    assert!(records[1].status.diagnostic.as_ref().unwrap().contains("500"));

    assert_eq!(records[2].product_name, "Third");
    assert_eq!(records[2].status.state, StockState::InStock);
    assert!(records[2].sent);

    assert_eq!(transport.sent_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_host_is_fetch_error() -> anyhow::Result<()> {
    let transport = Arc::new(RecordingTransport::default());
    let runner = create_runner(transport, complete_credentials());

    let mut product = ProductSpec::new(
        "Offline",
        "http://127.0.0.1:1/products/offline",
        restock_watcher::models::Locator::new("span", "product-stock-status"),
        vec!["Sold Out".to_string()],
    );
    product.in_stock_markers = Some(vec!["Add to bag".to_string()]);

    let records = runner.run(&[product]).await;
    assert_eq!(records[0].status.state, StockState::FetchError);
    assert_eq!(records[0].outcome, None);
    Ok(())
}

#[tokio::test]
async fn test_empty_page_is_parse_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_page(&server, "/blank", String::new()).await;

    let transport = Arc::new(RecordingTransport::default());
    let runner = create_runner(transport.clone(), complete_credentials());

    let records = runner.run(&[product_at(&server, "Blank", "/blank")]).await;
    assert_eq!(records[0].status.state, StockState::ParseError);
    assert_eq!(transport.sent_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_missing_element_uses_product_policy() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let redesigned = "<html><body><button class=\"buy\">Buy now</button></body></html>".to_string();
    mount_page(&server, "/redesigned", redesigned).await;

    let transport = Arc::new(RecordingTransport::default());
    let runner = create_runner(transport.clone(), complete_credentials());

    let products = vec![
        product_at(&server, "Assume in", "/redesigned")
            .with_missing_element_policy(MissingElementPolicy::AssumeInStock),
        product_at(&server, "Assume out", "/redesigned")
            .with_missing_element_policy(MissingElementPolicy::AssumeOutOfStock),
        product_at(&server, "Strict", "/redesigned")
            .with_missing_element_policy(MissingElementPolicy::Error),
    ];
    let records = runner.run(&products).await;

    assert_eq!(records[0].status.state, StockState::InStock);
    assert_eq!(records[1].status.state, StockState::OutOfStock);
    assert_eq!(records[2].status.state, StockState::Indeterminate);
    assert!(records.iter().all(|r| r.status.fallback));
    assert_eq!(transport.sent_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_transport_failure_does_not_stop_batch() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_page(&server, "/a", product_page("Add to Bag")).await;
    mount_page(&server, "/b", product_page("Add to Bag")).await;

    let transport = Arc::new(RecordingTransport::failing("connection refused"));
    let runner = create_runner(transport.clone(), complete_credentials());

    let records = runner
        .run(&[product_at(&server, "A", "/a"), product_at(&server, "B", "/b")])
        .await;

    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.status.state, StockState::InStock);
        assert!(!record.sent);
        assert_eq!(
            record.outcome,
            Some(NotificationOutcome::Failed("Mail error: connection refused".to_string()))
        );
    }
    assert_eq!(transport.sent_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_all_failed_summary() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_status(&server, "/a", 404).await;
    mount_status(&server, "/b", 503).await;

    let transport = Arc::new(RecordingTransport::default());
    let runner = create_runner(transport, complete_credentials());

    let records = runner
        .run(&[product_at(&server, "A", "/a"), product_at(&server, "B", "/b")])
        .await;

    let summary = RunSummary::from_records(&records);
    assert!(summary.all_failed());
    assert_eq!(summary.failed, 2);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_batch_keeps_order() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let names = ["p0", "p1", "p2", "p3", "p4", "p5"];
    for (i, name) in names.iter().enumerate() {
        let text = if i % 2 == 0 { "Sold Out" } else { "Add to Bag" };
        mount_page(&server, &format!("/{}", name), product_page(text)).await;
    }

    let transport = Arc::new(RecordingTransport::default());
    let runner = create_runner(transport.clone(), complete_credentials()).with_concurrency(4);

    let products: Vec<ProductSpec> = names
        .iter()
        .map(|name| product_at(&server, name, &format!("/{}", name)))
        .collect();
    let records = runner.run(&products).await;

    let got: Vec<&str> = records.iter().map(|r| r.product_name.as_str()).collect();
    assert_eq!(got, names.to_vec());
    assert_eq!(transport.sent_count(), 3);
    Ok(())
}
