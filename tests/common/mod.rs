use mapgate::config::{Config, ProxyPolicy};
use mapgate::security::credentials::SsoTokenProvider;
use mapgate::security::linkcheck::LinkRegistry;
use mapgate::security::rules::RuleSet;
use mapgate::MapGateProxy;
use pingora::proxy::http_proxy_service;
use pingora::server::Server;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Backend that echoes the received request head in the response body so
/// tests can observe what the proxy actually forwarded. The response also
/// carries headers the proxy is expected to strip.
pub async fn spawn_echo_backend() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            if let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let body = String::from_utf8_lossy(&buf[..n]).into_owned();
                    let response = format!(
                        "HTTP/1.1 200 OK\r\n\
                         Content-Type: text/plain\r\n\
                         Etag: \"abc123\"\r\n\
                         Vary: Accept\r\n\
                         X-Upstream: yes\r\n\
                         Content-Length: {}\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        }
    });

    port
}

pub fn create_test_config(backend_port: u16) -> Arc<Config> {
    Arc::new(Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        target_url: format!("http://127.0.0.1:{backend_port}"),
        proxy_policy: ProxyPolicy::None,
        forward_host: false,
        forward_host_prefix_path: String::new(),
        forward_proto: "http".to_string(),
        auth_header: "X-Authenticated-User".to_string(),
        sso_token: None,
        rules_path: None,
        link_hosts_path: None,
        log_format: "pretty".to_string(),
    })
}

pub async fn spawn_proxy(
    config: Arc<Config>,
    rules: RuleSet,
    registry: Arc<dyn LinkRegistry>,
    sso: Option<Arc<dyn SsoTokenProvider>>,
) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut conf_clone = (*config).clone();
    conf_clone.listen_addr = format!("127.0.0.1:{port}").parse().unwrap();
    let config = Arc::new(conf_clone);
    let config_for_thread = config.clone();

    std::thread::spawn(move || {
        let proxy = MapGateProxy::new(config_for_thread.clone(), Arc::new(rules), registry, sso)
            .expect("proxy construction");

        let mut server = Server::new(None).unwrap();
        server.bootstrap();

        let mut service = http_proxy_service(&server.configuration, proxy);
        service.add_tcp(&config_for_thread.listen_addr.to_string());
        server.add_service(service);
        server.run_forever();
    });

    tokio::time::sleep(Duration::from_secs(2)).await;
    port
}
