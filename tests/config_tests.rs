use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use http::Method;
use nestrouter::config::RouterConfig;
use nestrouter::dispatcher::Dispatcher;
use nestrouter::router::{DuplicatePolicy, RouteError, RouteTable};
use nestrouter::server::Request;
use nestrouter::views::TemplateEngine;
use tempfile::tempdir;

fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_load_yaml() {
    let dir = tempdir().unwrap();
    let path = write(
        &dir,
        "router.yaml",
        "methods: [get, post, delete]\nduplicate_policy: reject\n",
    );

    let config = RouterConfig::load(&path).unwrap();
    assert_eq!(config.methods, vec!["GET", "POST", "DELETE"]);
    assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);

    let table = RouteTable::from_config(&config).unwrap();
    assert_eq!(
        table.supported_methods(),
        &[Method::GET, Method::POST, Method::DELETE]
    );
    assert_eq!(table.duplicate_policy(), DuplicatePolicy::Reject);
}

#[test]
fn test_load_toml() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "router.toml", "methods = [\"PUT\"]\n");

    let config = RouterConfig::load(&path).unwrap();
    assert_eq!(config.methods, vec!["PUT"]);
    assert_eq!(config.duplicate_policy, DuplicatePolicy::Shadow);
}

#[test]
fn test_load_rejects_unknown_extension() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "router.ini", "methods=GET");
    let err = RouterConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("unsupported config format"));
}

#[test]
fn test_load_rejects_invalid_method() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "router.yml", "methods: [\"GE T\"]\n");
    assert!(RouterConfig::load(&path).is_err());
}

#[test]
fn test_load_missing_file() {
    let dir = tempdir().unwrap();
    let err = RouterConfig::load(dir.path().join("nope.yaml")).unwrap_err();
    assert!(err.to_string().contains("failed to read config"));
}

#[test]
fn test_table_from_config_rejects_bad_method() {
    let config = RouterConfig {
        methods: vec!["GE T".to_string()],
        ..RouterConfig::default()
    };
    assert!(matches!(
        RouteTable::from_config(&config),
        Err(RouteError::UnsupportedMethod { .. })
    ));
}

#[test]
fn test_configured_templates_dir_renders_errors() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("templates/errors")).unwrap();
    fs::write(
        dir.path().join("templates/errors/http.html"),
        "{{ statusCode }}: {{ statusMessage }}",
    )
    .unwrap();
    let path = write(
        &dir,
        "router.yaml",
        &format!(
            "templates_dir: {}\n",
            dir.path().join("templates").display()
        ),
    );

    let config = RouterConfig::load(&path).unwrap();
    let table = RouteTable::from_config(&config).unwrap();
    let views = Arc::new(TemplateEngine::from_config(&config));

    let mut request = Request::new(Method::GET, "/missing");
    let response = Dispatcher::new(&table, views).dispatch(&mut request);
    assert_eq!(response.body(), "404: Not Found");
}
