//! mapgate - authenticated reverse proxy for map and tile services.
//!
//! Initializes the application runtime, loads configuration, sets up logging,
//! and launches the proxy service.

use mapgate::{
    Config, InMemoryLinkRegistry, LinkRegistry, MapGateProxy, RuleSet, SsoTokenProvider,
    StaticTokenProvider,
};

use pingora::proxy::http_proxy_service;
use pingora::server::Server;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    dotenvy::dotenv().ok();

    let (non_blocking, _guard) = tracing_appender::non_blocking(std::io::stdout());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(non_blocking);

    if log_format.eq_ignore_ascii_case("pretty") {
        subscriber.init();
    } else {
        subscriber.json().init();
    }

    let config = Config::from_env();

    let rules = match &config.rules_path {
        Some(path) => Arc::new(RuleSet::from_path(path).expect("Failed to load map-service rules")),
        None => Arc::new(RuleSet::empty()),
    };

    let registry: Arc<dyn LinkRegistry> = match &config.link_hosts_path {
        Some(path) => Arc::new(
            InMemoryLinkRegistry::from_path(path).expect("Failed to load link host registry"),
        ),
        None => Arc::new(InMemoryLinkRegistry::empty()),
    };

    let sso: Option<Arc<dyn SsoTokenProvider>> = config
        .sso_token
        .clone()
        .map(|token| Arc::new(StaticTokenProvider::new(token)) as Arc<dyn SsoTokenProvider>);

    info!(
        listen_addr = %config.listen_addr,
        target_url = %config.target_url,
        proxy_policy = ?config.proxy_policy,
        rule_count = rules.len(),
        forward_host = config.forward_host,
        log_format = %config.log_format,
        "Server initialized"
    );

    let proxy = MapGateProxy::new(config.clone(), rules, registry, sso)
        .expect("Failed to construct proxy service");

    let mut server = Server::new(None).expect("Failed to create Pingora server");
    server.bootstrap();

    let mut proxy_service = http_proxy_service(&server.configuration, proxy);
    proxy_service.add_tcp(&config.listen_addr.to_string());
    server.add_service(proxy_service);

    server.run_forever();
}
