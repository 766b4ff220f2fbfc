//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置加载 → 控制台组装
//! - 端到端请求分发（standalone 协作者，无需宿主框架）
//! - 压缩、下载头、图表、快照、资源路径安全

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::io::Read;
    use std::path::Path;

    use chrono::Utc;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{Collector, SessionInformations};
    use dispatcher::response::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_ENCODING};
    use dispatcher::{
        BufferedResponse, CollectorSnapshots, DispatcherError, MonitoringRequest,
        SnapshotPayload, TransportFormat, LAST_SHUTDOWN_FILE,
    };
    use flate2::read::GzDecoder;
    use standalone::Standalone;
    use tempfile::TempDir;

    const FIREFOX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
    const LEGACY: &str = "Mozilla/4.0 (compatible; MSIE 6.0; Windows NT 5.1)";

    /// Console over a temp tree with resources, a deployment and storage
    struct Fixture {
        dir: TempDir,
        standalone: Standalone,
    }

    impl Fixture {
        fn new(extra_toml: &str) -> Self {
            let dir = TempDir::new().unwrap();
            let root = dir.path();
            fs::create_dir_all(root.join("resources/img")).unwrap();
            fs::create_dir_all(root.join("webapp/WEB-INF")).unwrap();
            fs::create_dir_all(root.join("webapp/META-INF/maven/com.shop/shop-web")).unwrap();
            fs::write(root.join("resources/img/logo.png"), b"logo-bytes").unwrap();
            fs::write(root.join("secret.txt"), b"top secret").unwrap();
            fs::write(root.join("webapp/WEB-INF/web.xml"), b"<web-app/>").unwrap();
            fs::write(
                root.join("webapp/META-INF/maven/com.shop/shop-web/pom.xml"),
                b"<project/>",
            )
            .unwrap();

            let toml = format!(
                r#"
[application]
name = "shop"

[hosting]
resources_dir = "{root}/resources"
deployment_dir = "{root}/webapp"

[storage]
directory = "{root}/storage"
{extra_toml}
"#,
                root = root.display()
            );
            let config = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
            let standalone = Standalone::from_config(&config).unwrap();
            Self { dir, standalone }
        }

        fn with_actions() -> Self {
            Self::new("[security]\nsystem_actions_enabled = true\n")
        }

        fn dispatch(&self, request: MonitoringRequest) -> (BufferedResponse, Result<(), DispatcherError>) {
            let runtime = if request.needs_runtime_informations() {
                self.standalone.runtime_informations()
            } else {
                Vec::new()
            };
            let mut response = BufferedResponse::new();
            let outcome = self
                .standalone
                .dispatcher
                .dispatch(&request, &mut response, &runtime);
            (response, outcome)
        }

        fn get(&self, query: &str) -> BufferedResponse {
            let (response, outcome) = self.dispatch(MonitoringRequest::from_query(query));
            outcome.unwrap();
            response
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }
    }

    fn text(response: &BufferedResponse) -> String {
        String::from_utf8(response.body().to_vec()).unwrap()
    }

    #[test]
    fn test_dashboard_shows_live_counters() {
        let fixture = Fixture::new("");
        fixture
            .standalone
            .collector
            .record_request("http", "/checkout", 120, true);

        let response = fixture.get("");
        let html = text(&response);

        assert_eq!(response.content_type(), Some("text/html; charset=UTF-8"));
        assert_eq!(response.header(CACHE_CONTROL), Some("no-cache"));
        assert!(html.contains("Monitoring - shop"));
        assert!(html.contains("/checkout"));
        // descriptors were probed at construction
        assert!(html.contains("?part=web.xml"));
        assert!(html.contains("?part=pom.xml"));
        // the dashboard render triggered a collection pass
        assert!(fixture.standalone.collector.series("http_hits").is_some());
    }

    #[test]
    fn test_gzip_when_accepted() {
        let fixture = Fixture::new("");
        let (response, outcome) = fixture.dispatch(
            MonitoringRequest::from_query("period=week")
                .with_header("Accept-Encoding", "deflate, GZIP;q=0.8"),
        );
        outcome.unwrap();

        assert_eq!(response.header(CONTENT_ENCODING), Some("gzip"));
        let mut html = String::new();
        GzDecoder::new(response.body()).read_to_string(&mut html).unwrap();
        assert!(html.contains("Monitoring - shop"));
        assert!(html.contains("period=week"));
    }

    #[test]
    fn test_plain_html_without_gzip() {
        let fixture = Fixture::new("");
        let response = fixture.get("");
        assert!(response.header(CONTENT_ENCODING).is_none());
        assert!(text(&response).starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_pdf_download_headers() {
        let fixture = Fixture::new("");

        let (modern, outcome) = fixture.dispatch(
            MonitoringRequest::from_query("format=pdf").with_header("User-Agent", FIREFOX),
        );
        outcome.unwrap();
        assert_eq!(modern.content_type(), Some("application/pdf"));
        let disposition = modern.header(CONTENT_DISPOSITION).unwrap();
        // the dated suffix is not pinned
        assert!(disposition.starts_with("attachment;filename*=\"Monitoring%5Fshop%5F"));
        assert!(disposition.ends_with("%2Epdf\""));
        assert!(modern.body().starts_with(b"%PDF-1.4"));

        let (legacy, outcome) = fixture.dispatch(
            MonitoringRequest::from_query("format=PDF").with_header("User-Agent", LEGACY),
        );
        outcome.unwrap();
        let disposition = legacy.header(CONTENT_DISPOSITION).unwrap();
        assert!(disposition.starts_with("attachment;filename=Monitoring_shop_"));
        assert!(disposition.ends_with(".pdf"));
    }

    #[test]
    fn test_graph_is_clamped_and_idempotent() {
        let fixture = Fixture::new("");
        let collector = &fixture.standalone.collector;
        collector.record_request("http", "/", 5, false);
        collector.collect_local_context_without_errors();
        collector.record_request("http", "/", 5, false);
        collector.collect_local_context_without_errors();

        let query = "graph=http_hits&width=5000&height=5000";
        let first = fixture.get(query);
        let second = fixture.get(query);

        assert_eq!(first.content_type(), Some("image/png"));
        assert_eq!(first.content_length(), Some(first.body().len() as u64));
        assert_eq!(first.header(CONTENT_DISPOSITION), Some("inline;filename=http_hits.png"));
        assert_eq!(first.body(), second.body());

        let image = image::load_from_memory(first.body()).unwrap();
        assert_eq!((image.width(), image.height()), (1600, 1600));
    }

    #[test]
    fn test_unknown_graph_writes_nothing() {
        let fixture = Fixture::new("");
        let response = fixture.get("graph=nope&width=10&height=10");
        assert!(response.body().is_empty());
        assert!(response.content_type().is_none());
    }

    #[test]
    fn test_invalid_graph_dimension_fails() {
        let fixture = Fixture::new("");
        let (_, outcome) = fixture.dispatch(MonitoringRequest::from_query(
            "graph=http_hits&width=wide&height=10",
        ));
        let err = outcome.unwrap_err();
        assert!(matches!(err, DispatcherError::InvalidDimension { .. }));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_serialized_snapshot_then_collector_stop() {
        let fixture = Fixture::new("");
        fixture
            .standalone
            .collector
            .record_request("sql", "select 1", 3, false);

        let response = fixture.get("format=serialized&collector=stop");
        assert_eq!(response.content_type(), Some(TransportFormat::Serialized.mime_type()));

        let payload = TransportFormat::Serialized.read_from(response.body()).unwrap();
        let SnapshotPayload::Monitoring { counters, .. } = payload else {
            panic!("expected a monitoring payload, got {payload:?}");
        };
        let sql = counters.iter().find(|c| c.name == "sql").unwrap();
        assert_eq!(sql.hits(), 1);

        // the copy survives while the live counters were reset
        let collector = &fixture.standalone.collector;
        assert!(!collector.is_running());
        assert_eq!(collector.counter("sql").unwrap().hits(), 0);
    }

    #[test]
    fn test_json_snapshot_keeps_collector_running() {
        let fixture = Fixture::new("");
        let response = fixture.get("format=JSON");
        let payload = TransportFormat::Json.read_from(response.body()).unwrap();
        assert!(matches!(payload, SnapshotPayload::Monitoring { .. }));
        assert!(fixture.standalone.collector.is_running());
    }

    #[test]
    fn test_xml_snapshot_carries_counters() {
        let fixture = Fixture::new("");
        fixture
            .standalone
            .collector
            .record_request("http", "/cart", 7, false);

        let mut response = BufferedResponse::new();
        fixture
            .standalone
            .dispatcher
            .dispatch(&MonitoringRequest::from_query("format=xml"), &mut response, &[])
            .unwrap();
        assert_eq!(response.content_type(), Some("application/xml"));
        let payload = TransportFormat::Xml.read_from(response.body()).unwrap();
        let SnapshotPayload::Monitoring { counters, runtime } = payload else {
            panic!("expected a monitoring payload, got {payload:?}");
        };
        assert_eq!(counters.iter().find(|c| c.name == "http").unwrap().hits(), 1);
        assert!(runtime.is_empty());
    }

    #[test]
    fn test_graph_ignores_stray_format() {
        let fixture = Fixture::new("");
        fixture.standalone.collector.collect_local_context_without_errors();
        let response = fixture.get("graph=http_hits&width=20&height=10&format=yaml");
        assert_eq!(response.content_type(), Some("image/png"));
    }

    #[test]
    fn test_unrecognized_part_is_an_empty_view() {
        let fixture = Fixture::new("");
        let response = fixture.get("part=bogus");
        assert_eq!(response.content_type(), Some("text/html; charset=UTF-8"));
        assert_eq!(response.header(CACHE_CONTROL), Some("no-cache"));
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_unknown_format_fails() {
        let fixture = Fixture::new("");
        let (response, outcome) = fixture.dispatch(MonitoringRequest::from_query("format=yaml"));
        assert!(matches!(outcome, Err(DispatcherError::UnknownFormat { .. })));
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_resource_traversal_is_stripped() {
        let fixture = Fixture::new("");

        let escaped = fixture.get("resource=../../secret.txt");
        assert!(escaped.body().is_empty());

        let logo = fixture.get("resource=../img/logo.png");
        assert_eq!(logo.body(), b"logo-bytes");
        assert_eq!(logo.content_type(), Some("image/png"));
        assert_eq!(logo.header(CACHE_CONTROL), Some("max-age=3600"));
        // resources are cacheable: no no-cache triple
        assert!(logo.header("Pragma").is_none());

        assert!(fs::read(fixture.root().join("secret.txt")).is_ok());
    }

    #[test]
    fn test_descriptors_are_privileged() {
        let locked = Fixture::new("");
        let (response, outcome) = locked.dispatch(MonitoringRequest::from_query("part=web.xml"));
        assert!(matches!(outcome, Err(DispatcherError::ActionsDisabled)));
        assert!(response.body().is_empty());

        let open = Fixture::with_actions();
        let web_xml = open.get("part=web.xml");
        assert_eq!(web_xml.body(), b"<web-app/>");
        assert_eq!(web_xml.header(CONTENT_DISPOSITION), Some("inline;filename=web.xml"));

        let pom = open.get("part=pom.xml");
        assert_eq!(pom.body(), b"<project/>");
    }

    #[test]
    fn test_system_action_message_reaches_next_render_only() {
        let fixture = Fixture::with_actions();
        fixture.standalone.sessions.create("s-1", None, None);

        let first = fixture.get("action=invalidate_sessions");
        assert!(text(&first).contains("Sessions invalidated (1)"));
        assert!(fixture.standalone.sessions.is_empty());

        let second = fixture.get("");
        assert!(!text(&second).contains("Sessions invalidated"));
    }

    #[test]
    fn test_actions_disabled_by_default() {
        let fixture = Fixture::new("");
        let (_, outcome) = fixture.dispatch(MonitoringRequest::from_query("action=gc"));
        let err = outcome.unwrap_err();
        assert!(matches!(err, DispatcherError::ActionsDisabled));
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_action_messages_follow_accept_language() {
        let fixture = Fixture::with_actions();
        let (response, outcome) = fixture.dispatch(
            MonitoringRequest::from_query("action=GC").with_header("Accept-Language", "fr-FR"),
        );
        outcome.unwrap();
        let html = text(&response);
        assert!(html.contains("Mémoire libérée"));
        assert!(html.contains("lang=\"fr-FR\""));
    }

    #[test]
    fn test_collector_server_uses_pushed_sessions() {
        let fixture = Fixture::new(
            "[security]\nsystem_actions_enabled = true\n\n[collector]\nmode = \"collector_server\"\n",
        );
        fixture.standalone.sessions.create("local-only", None, None);

        let pushed = SessionInformations {
            id: "remote-1".to_string(),
            created_at: Utc::now(),
            last_access: Utc::now(),
            attribute_count: 2,
            serialized_size: None,
            remote_addr: None,
            user: Some("alice".to_string()),
        };
        let dispatcher = fixture
            .standalone
            .dispatcher
            .with_snapshots(CollectorSnapshots {
                heap_histogram: None,
                sessions: Some(vec![pushed]),
            })
            .unwrap();

        let mut response = BufferedResponse::new();
        dispatcher
            .dispatch(
                &MonitoringRequest::from_query("part=sessions"),
                &mut response,
                &[],
            )
            .unwrap();
        let html = text(&response);
        assert!(html.contains("remote-1"));
        assert!(!html.contains("local-only"));
    }

    #[test]
    fn test_last_shutdown_report() {
        let fixture = Fixture::new("");
        let storage = fixture.root().join("storage");

        let path = fixture
            .standalone
            .dispatcher
            .write_html_to_last_shutdown_file(&storage, &fixture.standalone.runtime_informations())
            .unwrap();

        assert_eq!(path, storage.join(LAST_SHUTDOWN_FILE));
        let html = fs::read_to_string(path).unwrap();
        assert!(html.contains("Monitoring - shop"));
        assert!(html.contains("period=day"));
    }

    #[tokio::test]
    async fn test_concurrent_dispatches_share_collector() {
        let fixture = Fixture::new("");
        fixture
            .standalone
            .collector
            .record_request("http", "/", 1, false);

        let mut handles = Vec::new();
        for i in 0..8 {
            let standalone = fixture.standalone.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                standalone.collector.record_request("http", &format!("/{i}"), 1, false);
                let mut response = BufferedResponse::new();
                standalone
                    .dispatcher
                    .dispatch(&MonitoringRequest::from_query("format=json"), &mut response, &[])
                    .map(|()| response.into_body())
            }));
        }
        for handle in handles {
            let body = handle.await.unwrap().unwrap();
            assert!(matches!(
                TransportFormat::Json.read_from(body.as_slice()).unwrap(),
                SnapshotPayload::Monitoring { .. }
            ));
        }

        assert_eq!(fixture.standalone.collector.counter("http").unwrap().hits(), 9);
        assert_eq!(fixture.standalone.dispatcher.metrics().snapshot, 8);
    }
}
