use ratemix::AppCommand;
use ratemix::core::allocation::{Mode, Preference};
use ratemix::core::product::{Catalog, ProductConfig};
use ratemix::core::store::{PRODUCT_CONFIG_KEY, load_json, save_json};
use ratemix::store::ScenarioBook;
use ratemix::store::disk::FjallStore;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(body: &str, status_code: u16) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/default-config.json"))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    /// Writes a config keeping all state inside `dir`.
    pub fn write_config(dir: &std::path::Path, extra: &str) -> String {
        let config = format!(
            "currency: \"CNY\"\nliquidity_ratio: 10\ndata_path: \"{}\"\n{extra}",
            dir.join("data").display()
        );
        let path = dir.join("config.yaml");
        std::fs::write(&path, config).expect("write config");
        path.to_string_lossy().into_owned()
    }
}

fn scenario_book(dir: &Path) -> ScenarioBook {
    let store = FjallStore::open(&dir.join("data").join("store")).expect("open store");
    ScenarioBook::new(Arc::new(store))
}

#[test_log::test(tokio::test)]
async fn test_sync_from_remote_document() {
    let temp_dir = TempDir::new().unwrap();
    let document = include_str!("../docs/default-config.json");
    let mock_server = test_utils::create_mock_server(document, 200).await;
    let config_path = test_utils::write_config(
        temp_dir.path(),
        &format!("providers:\n  remote:\n    base_url: \"{}\"\n", mock_server.uri()),
    );

    ratemix::run_command(AppCommand::Sync, Some(&config_path))
        .await
        .expect("sync succeeds");

    let store = FjallStore::open(&temp_dir.path().join("data").join("store")).unwrap();
    let products: ProductConfig = load_json(&store, PRODUCT_CONFIG_KEY)
        .await
        .unwrap()
        .expect("catalog stored");
    assert_eq!(Catalog::from_config(&products).unwrap(), Catalog::builtin());
    info!("Synced catalog matches the built-in shelf");
}

#[test_log::test(tokio::test)]
async fn test_sync_fails_on_server_error() {
    let temp_dir = TempDir::new().unwrap();
    let mock_server = test_utils::create_mock_server("oops", 500).await;
    let config_path = test_utils::write_config(
        temp_dir.path(),
        &format!("providers:\n  remote:\n    base_url: \"{}\"\n", mock_server.uri()),
    );

    let result = ratemix::run_command(AppCommand::Sync, Some(&config_path)).await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_sync_without_remote_provider() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(temp_dir.path(), "");
    let err = ratemix::run_command(AppCommand::Sync, Some(&config_path))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No remote provider"));
}

#[test_log::test(tokio::test)]
async fn test_solve_and_optimize_with_builtin_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(temp_dir.path(), "");

    ratemix::run_command(
        AppCommand::Solve {
            amount: 100_000.0,
            target_rate: 1.0,
            mode: Mode::Deposit,
            liquidity_ratio: None,
            preference: None,
        },
        Some(&config_path),
    )
    .await
    .expect("solve succeeds");

    ratemix::run_command(
        AppCommand::Solve {
            amount: 100_000.0,
            target_rate: 1.5,
            mode: Mode::Mixed,
            liquidity_ratio: Some(20.0),
            preference: Some(Preference::Balance),
        },
        Some(&config_path),
    )
    .await
    .expect("mixed solve succeeds");

    ratemix::run_command(
        AppCommand::Optimize {
            amount: 100_000.0,
            target_rate: 1.5,
        },
        Some(&config_path),
    )
    .await
    .expect("optimize succeeds");
}

#[test_log::test(tokio::test)]
async fn test_solve_rejects_invalid_amount() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(temp_dir.path(), "");
    let result = ratemix::run_command(
        AppCommand::Solve {
            amount: -5.0,
            target_rate: 1.0,
            mode: Mode::Deposit,
            liquidity_ratio: None,
            preference: None,
        },
        Some(&config_path),
    )
    .await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_catalog_file_overrides_builtin() {
    let temp_dir = TempDir::new().unwrap();
    let catalog_path = temp_dir.path().join("products.json");
    fs::write(
        &catalog_path,
        r#"{"deposits": [{"name": "Activity", "clientRate": 0.05, "ftpRate": 2.4, "tenor": "instant"}], "wealth": []}"#,
    )
    .unwrap();
    let config_path = test_utils::write_config(
        temp_dir.path(),
        &format!("catalog_path: \"{}\"\n", catalog_path.display()),
    );

    ratemix::run_command(
        AppCommand::Solve {
            amount: 1000.0,
            target_rate: 0.05,
            mode: Mode::Deposit,
            liquidity_ratio: Some(100.0),
            preference: Some(Preference::Yield),
        },
        Some(&config_path),
    )
    .await
    .expect("single-product catalog solves");

    // The built-in shelf's products are unknown to this catalog.
    let result = ratemix::run_command(
        AppCommand::Evaluate {
            mode: Mode::Deposit,
            amount: 1000.0,
            entries: vec!["1-Year Term=100".parse().unwrap()],
        },
        Some(&config_path),
    )
    .await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_scenario_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(temp_dir.path(), "");

    let splits = [
        vec!["Demand Deposit=20", "1-Year Term=80"],
        vec!["wealth:7-Day Redemption=100"],
        vec!["Demand Deposit=10", "T+1 Redemption=90"],
    ];
    for split in &splits {
        ratemix::run_command(
            AppCommand::ScenarioSave {
                mode: Mode::Mixed,
                amount: 10_000.0,
                entries: split.iter().map(|s| s.parse().unwrap()).collect(),
            },
            Some(&config_path),
        )
        .await
        .expect("save succeeds");
    }

    let ids: Vec<i64> = scenario_book(temp_dir.path())
        .list()
        .await
        .unwrap()
        .iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids.len(), 3);

    ratemix::run_command(AppCommand::ScenarioList, Some(&config_path))
        .await
        .unwrap();
    ratemix::run_command(AppCommand::Compare { ids: ids.clone() }, Some(&config_path))
        .await
        .expect("compare succeeds");

    ratemix::run_command(AppCommand::ScenarioDelete { id: ids[0] }, Some(&config_path))
        .await
        .expect("delete succeeds");

    let remaining = scenario_book(temp_dir.path()).list().await.unwrap();
    let names: Vec<&str> = remaining.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Scenario 1", "Scenario 2"]);
    assert_eq!(remaining[0].id, ids[1]);

    // A single scenario is not enough to compare.
    let result =
        ratemix::run_command(AppCommand::Compare { ids: vec![ids[1]] }, Some(&config_path)).await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_schemes_and_suggest() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(temp_dir.path(), "");

    ratemix::run_command(
        AppCommand::Schemes {
            amount: 1000.0,
            id: None,
        },
        Some(&config_path),
    )
    .await
    .expect("schemes listing succeeds");

    ratemix::run_command(
        AppCommand::Suggest {
            mode: Mode::Deposit,
            target_rate: 1.0,
            fixed: vec!["Demand Deposit=10".parse().unwrap()],
        },
        Some(&config_path),
    )
    .await
    .expect("suggest succeeds");
}

#[test_log::test(tokio::test)]
async fn test_setup_writes_loadable_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ratemix").join("config.yaml");
    ratemix::cli::setup::setup_at_path(&config_path).unwrap();
    assert!(ratemix::cli::setup::setup_at_path(&config_path).is_err());

    let config = ratemix::core::config::AppConfig::load_from_path(&config_path).unwrap();
    assert_eq!(config.liquidity_ratio, 10.0);
}

#[test_log::test(tokio::test)]
async fn test_empty_catalogs() {
    let temp_dir = TempDir::new().unwrap();
    let solve = || AppCommand::Solve {
        amount: 1000.0,
        target_rate: 1.0,
        mode: Mode::Deposit,
        liquidity_ratio: None,
        preference: Some(Preference::Yield),
    };

    // An empty stored catalog falls back to the built-in shelf.
    {
        let store = FjallStore::open(&temp_dir.path().join("data").join("store")).unwrap();
        save_json(&store, PRODUCT_CONFIG_KEY, &ProductConfig::default())
            .await
            .unwrap();
    }
    let config_path = test_utils::write_config(temp_dir.path(), "");
    ratemix::run_command(solve(), Some(&config_path))
        .await
        .expect("built-in catalog used");

    // An explicit catalog file without products is rejected.
    let catalog_path = temp_dir.path().join("empty.json");
    fs::write(&catalog_path, r#"{"deposits": [], "wealth": []}"#).unwrap();
    let config_path = test_utils::write_config(
        temp_dir.path(),
        &format!("catalog_path: \"{}\"\n", catalog_path.display()),
    );
    let err = ratemix::run_command(solve(), Some(&config_path))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no products"));
}
