use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use loomworks_api::app::{build_app, services::AppServices};
use loomworks_api::config::ApiConfig;
use loomworks_client::{
    poll, ApiClient, ClientError, ExportLogInput, MachineInput, PowerloomInput, ProductInput, WorkerInput,
};
use loomworks_reports::SalaryPolicy;
use rust_decimal::Decimal;
use tokio_stream::StreamExt;

struct TestServer {
    client: ApiClient,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let config = ApiConfig::default();
        let services = Arc::new(AppServices::in_memory(SalaryPolicy::default()));
        let app = build_app(&config, services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let client = ApiClient::new(format!("http://{addr}/api")).unwrap();
        Self { client, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn operator(name: &str) -> WorkerInput {
    WorkerInput {
        name: name.to_string(),
        phone: "+91 98765 43210".to_string(),
        power_loom_number: Some(1),
        ..WorkerInput::default()
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn health_reports_the_in_memory_backend() {
    let srv = TestServer::spawn().await;
    let health = srv.client.health().await.unwrap();
    assert_eq!(health.status, "OK");
    assert_eq!(health.database, "memory");
}

#[tokio::test]
async fn validation_failures_surface_as_api_errors() {
    let srv = TestServer::spawn().await;
    let err = srv
        .client
        .create_worker(&WorkerInput::default())
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, error, message } => {
            assert_eq!(status, 400);
            assert_eq!(error, "Validation Error");
            assert!(message.contains("Worker name is required"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn deleted_workers_drop_out_of_the_list() {
    let srv = TestServer::spawn().await;
    let ravi = srv.client.create_worker(&operator("Ravi")).await.unwrap();
    srv.client.create_worker(&operator("Anil")).await.unwrap();

    let names: Vec<String> = srv
        .client
        .list_workers()
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.name)
        .collect();
    assert_eq!(names, vec!["Anil", "Ravi"]);

    srv.client.delete_worker(ravi.id).await.unwrap();
    assert_eq!(srv.client.list_workers().await.unwrap().len(), 1);

    let fetched = srv.client.get_worker(ravi.id).await.unwrap();
    assert!(!fetched.is_active);
}

#[tokio::test]
async fn powerloom_entries_come_back_populated_and_drive_salary() {
    let srv = TestServer::spawn().await;
    let worker = srv.client.create_worker(&operator("Ravi")).await.unwrap();
    let product = srv
        .client
        .create_product(&ProductInput {
            name: "Cotton".to_string(),
            worker_salary: Decimal::new(25, 1),
            owner_salary: None,
        })
        .await
        .unwrap();

    let entry = srv
        .client
        .create_powerloom(&PowerloomInput {
            loom_number: 1,
            date: "2025-01-06".to_string(),
            worker: worker.id,
            machines: vec![MachineInput {
                index: 1,
                product: product.id,
                quantity: Decimal::from(30),
            }],
        })
        .await
        .unwrap();
    assert_eq!(entry.worker.name.as_deref(), Some("Ravi"));
    assert_eq!(entry.machines[0].product.name.as_deref(), Some("Cotton"));

    assert_eq!(srv.client.list_powerloom(Some(1)).await.unwrap().len(), 1);
    assert!(srv.client.list_powerloom(Some(2)).await.unwrap().is_empty());

    let report = srv
        .client
        .loom_operator_salary(worker.id, Some(date("2025-01-01")), Some(date("2025-01-31")))
        .await
        .unwrap();
    assert_eq!(report.total_salary, Decimal::from(75));
    assert_eq!(report.products[0].machines, vec![1]);

    assert_eq!(srv.client.delete_all_powerloom().await.unwrap(), 1);
    assert!(srv.client.list_powerloom(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn export_logs_filter_by_worker() {
    let srv = TestServer::spawn().await;
    let ravi = srv.client.create_worker(&operator("Ravi")).await.unwrap();
    let anil = srv.client.create_worker(&operator("Anil")).await.unwrap();

    for (worker, salary) in [(ravi.id, 500), (anil.id, 300)] {
        srv.client
            .create_export_log(&ExportLogInput {
                worker_id: worker,
                from_date: "2025-01-01".to_string(),
                to_date: "2025-01-31".to_string(),
                salary: Decimal::from(salary),
            })
            .await
            .unwrap();
    }

    let all = srv.client.list_export_logs(None).await.unwrap();
    assert_eq!(all.len(), 2);

    let ravis = srv.client.list_export_logs(Some(ravi.id)).await.unwrap();
    assert_eq!(ravis.len(), 1);
    assert_eq!(ravis[0].salary, Decimal::from(500));
    assert_eq!(ravis[0].worker.name.as_deref(), Some("Ravi"));
}

#[tokio::test]
async fn revenue_round_trips_and_feeds_the_summary() {
    let srv = TestServer::spawn().await;
    assert_eq!(srv.client.revenue().await.unwrap(), Decimal::ZERO);

    let stored = srv.client.set_revenue(Decimal::from(1000)).await.unwrap();
    assert_eq!(stored, Decimal::from(1000));

    let summary = srv.client.financial_summary().await.unwrap();
    assert_eq!(summary.total_revenue, Decimal::from(1000));
    assert_eq!(summary.net_profit, Decimal::from(1000));
}

#[tokio::test]
async fn polling_follows_server_state() {
    let srv = TestServer::spawn().await;
    let client = srv.client.clone();
    let mut stream = poll(Duration::from_millis(20), move || {
        let client = client.clone();
        async move { client.list_workers().await }
    });

    let first = stream.next().await.unwrap().unwrap();
    assert!(first.is_empty());

    srv.client.create_worker(&operator("Ravi")).await.unwrap();

    let mut seen = 0;
    while let Some(result) = stream.next().await {
        seen = result.unwrap().len();
        if seen == 1 {
            break;
        }
    }
    assert_eq!(seen, 1);
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let client = ApiClient::new("http://127.0.0.1:9/api").unwrap();
    let err = client.list_workers().await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)), "{err:?}");
}
