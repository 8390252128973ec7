#![cfg(feature = "sqlite")]

use std::fs;
use std::sync::Arc;

use serde_json::json;
use tempfile::tempdir;
use tiny_orm::config::CONFIG_FILE_NAME;
use tiny_orm::prelude::*;

fn write_config(dir: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = json!({
        "development": {
            "dialect": "sqlite3",
            "path": dir.join("dev.db"),
        },
        "reporting": {
            "dialect": "sqlite",
            "path": dir.join("reporting.db"),
            "max_open_connections": 2,
        },
        "broken": {
            "dialect": "sqlite",
        },
    });
    fs::write(dir.join(CONFIG_FILE_NAME), serde_json::to_string_pretty(&config)?)?;
    Ok(())
}

#[tokio::test]
async fn registry_connects_by_name() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_config(dir.path())?;
    let nested = dir.path().join("app").join("src");
    fs::create_dir_all(&nested)?;

    let registry = Registry::new(Config::discover_from(&nested)?);
    assert!(registry.handler("development").await.is_none());

    let dev = registry.connect("").await?;
    assert_eq!(dev.dialect(), Dialect::Sqlite);
    assert!(dev.connection_string().starts_with("file:"));
    assert!(dir.path().join("dev.db").exists());

    let again = registry.connect("development").await?;
    assert!(Arc::ptr_eq(&dev, &again));
    assert!(registry.handler("development").await.is_some());

    let err = registry.connect("staging").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let err = registry.connect("broken").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    Ok(())
}

#[tokio::test]
async fn multi_connect_skips_failures() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_config(dir.path())?;
    let registry = Registry::new(Config::discover_from(dir.path())?);

    let tenants = registry
        .multi_connect(&["development", "broken", "reporting", "missing"])
        .await?;
    assert_eq!(tenants.len(), 2);
    assert!(tenants.get("reporting").is_some());
    assert!(tenants.get("broken").is_none());
    assert_eq!(
        tenants.handlers().keys().collect::<Vec<_>>(),
        ["development", "reporting"]
    );

    let err = registry.multi_connect(&["broken", "missing"]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_connects_share_one_handler() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_config(dir.path())?;
    let registry = Arc::new(Registry::new(Config::discover_from(dir.path())?));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.connect("reporting").await })
        })
        .collect();

    let mut opened = Vec::new();
    for task in tasks {
        opened.push(task.await??);
    }
    let kept = registry
        .handler("reporting")
        .await
        .ok_or("reporting was not registered")?;
    assert!(opened.iter().all(|handler| Arc::ptr_eq(handler, &kept)));
    Ok(())
}

#[test]
fn postgresql_dialect_name_is_accepted() {
    let config = Config::from_json(
        r#"{"primary": {"dialect": "postgresql", "host": "localhost", "user": "app", "database": "app"}}"#,
    )
    .unwrap();
    assert_eq!(config.get("primary").unwrap().dialect, Dialect::Postgres);
}

#[test]
fn unknown_dialect_is_a_configuration_error() {
    let err = Config::from_json(r#"{"development": {"dialect": "oracle"}}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
