use career_scraper::core::config_manager::HarvestSettings;
use career_scraper::harvester::{
    EmploymentType, Harvester, HttpHarvester, SourceDescriptor, SourceKind,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve one canned HTTP response and hand back the request line
async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buffer = vec![0u8; 8192];
        let read = socket.read(&mut buffer).await.unwrap();
        let request = String::from_utf8_lossy(&buffer[..read]).to_string();

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        request.lines().next().unwrap_or_default().to_string()
    });

    (address, handle)
}

fn github_at(base: &str) -> SourceDescriptor {
    SourceDescriptor {
        name: "GitHub".to_string(),
        base_url: format!("{}/positions.json", base),
        api_based: true,
        kind: SourceKind::GitHub,
    }
}

#[tokio::test]
async fn github_search_is_fetched_and_normalized() {
    let body = serde_json::json!([{
        "title": "Senior Rust Engineer",
        "company": "Acme",
        "location": "Remote",
        "description": "<p>Contract role.</p><p>Requirements:</p><ul><li>Rust</li><li>Tokio</li></ul><p>Benefits:</p><p>Salary $80,000 - $120,000</p>",
        "url": "https://jobs.example/1",
        "created_at": "2024-03-01T12:00:00Z"
    }])
    .to_string();
    let (base, server) = serve_once("200 OK", body).await;

    let harvester = HttpHarvester::new(&HarvestSettings::default()).unwrap();
    let records = harvester
        .harvest(&github_at(&base), "rust developer", "New York")
        .await
        .unwrap();

    let request_line = server.await.unwrap();
    assert!(request_line.starts_with("GET /positions.json?search=rust+developer&location=New+York"));

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.company, "Acme");
    assert_eq!(record.source, "GitHub");
    assert_eq!(record.requirements, vec!["Rust", "Tokio"]);
    assert_eq!(record.employment_type, EmploymentType::Contract);
    assert!(record.is_remote);
    assert_eq!(record.salary.as_ref().map(|s| (s.min, s.max)), Some((80_000, 120_000)));
}

#[tokio::test]
async fn server_error_is_reported_as_failure() {
    let (base, server) = serve_once("503 Service Unavailable", "{}".to_string()).await;

    let harvester = HttpHarvester::new(&HarvestSettings::default()).unwrap();
    let result = harvester.harvest(&github_at(&base), "rust", "Remote").await;
    server.await.unwrap();

    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("503"));
}
