use proxy_quota::{
    CheckerConfig, ConsoleReporter, ProxyChecker, ProxyParser, Quota, Scheduler, SchedulerConfig,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const REDIRECT: &str = concat!(
    "HTTP/1.1 302 Found\r\n",
    "Location: https://cdn.example.test/mod.geode\r\n",
    "Content-Length: 0\r\n\r\n"
);
const FORBIDDEN: &str = "HTTP/1.1 403 Forbidden\r\nContent-Length: 0\r\n\r\n";

/// Start a fake HTTP proxy answering every request with `response`;
/// returns its port
async fn fake_proxy(response: &'static str) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    port
}

async fn dead_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn probes_a_parsed_proxy_list() {
    let mut lines = vec!["# local test proxies".to_string()];
    for _ in 0..3 {
        lines.push(format!("127.0.0.1:{}", fake_proxy(REDIRECT).await));
    }
    lines.push(format!("http://127.0.0.1:{}", fake_proxy(FORBIDDEN).await));
    lines.push(format!("https://127.0.0.1:{}", fake_proxy(FORBIDDEN).await));
    lines.push(format!("127.0.0.1:{}", dead_port().await));
    lines.push("socks5://127.0.0.1:1080".to_string());

    let proxies = ProxyParser::parse_string(&lines.join("\n"));
    assert_eq!(proxies.len(), 6);

    let checker =
        ProxyChecker::with_config(CheckerConfig::new().with_timeout(Duration::from_secs(2)));
    let scheduler = Scheduler::with_config(checker, SchedulerConfig::new().with_pool_size(4));
    let mut reporter = ConsoleReporter::quiet();

    let report = scheduler
        .run(
            proxies,
            "http://api.example.test/v1/mods/a.b/versions/1.0.0/download",
            Quota::new(10).unwrap(),
            &mut reporter,
        )
        .await
        .unwrap();

    assert_eq!(report.succeeded_count, 3);
    assert_eq!(report.completed, 6);
    assert_eq!(report.total_candidates, 6);
    assert!(!report.stopped_early);
}

#[tokio::test]
async fn same_conditions_give_the_same_verdicts() {
    let working = fake_proxy(REDIRECT).await;
    let blocked = fake_proxy(FORBIDDEN).await;
    let proxies = ProxyParser::parse_string(&format!(
        "127.0.0.1:{}\n127.0.0.1:{}",
        working, blocked
    ));

    let scheduler = Scheduler::new(ProxyChecker::new());
    let target = "http://api.example.test/download";

    let mut reporter = ConsoleReporter::quiet();
    let first = scheduler
        .run(proxies.clone(), target, Quota::new(2).unwrap(), &mut reporter)
        .await
        .unwrap();
    let second = scheduler
        .run(proxies, target, Quota::new(2).unwrap(), &mut reporter)
        .await
        .unwrap();

    assert_eq!(first.succeeded, second.succeeded);
    assert_eq!(first.succeeded[0].port, working);
}
