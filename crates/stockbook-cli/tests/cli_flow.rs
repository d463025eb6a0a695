use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_stockbook"))
}

struct Env {
    _root: TempDir,
    config: PathBuf,
    data: PathBuf,
}

impl Env {
    fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let config = root.path().join("c");
        let data = root.path().join("d");
        std::fs::create_dir_all(&config).expect("create config dir");
        std::fs::create_dir_all(&data).expect("create data dir");
        Self {
            _root: root,
            config,
            data,
        }
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(bin())
            .args(args)
            .env("XDG_CONFIG_HOME", &self.config)
            .env("XDG_DATA_HOME", &self.data)
            .env_remove("STOCKBOOK_CONFIG")
            .env_remove("RUST_LOG")
            .output()
            .expect("run stockbook")
    }

    fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "stockbook {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    fn data_file(&self, name: &str) -> PathBuf {
        self.data.join("stockbook").join(name)
    }
}

fn json_records(stdout: &str) -> Vec<serde_json::Map<String, serde_json::Value>> {
    serde_json::from_str(stdout).expect("json output")
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read file")
}

#[test]
fn test_init_writes_config_and_header_files() {
    let env = Env::new();
    env.run_ok(&["init"]);

    let config = read(&env.config.join("stockbook").join("config.toml"));
    assert!(config.contains("backend = \"flat_file\""));
    assert_eq!(
        read(&env.data_file("items.txt")),
        "id,description,unitPrice,qtyInStock,totalPrice\n"
    );
    assert!(env.data_file("transactions.txt").exists());

    let again = env.run(&["init"]);
    assert!(!again.status.success());
    assert!(String::from_utf8_lossy(&again.stderr).contains("--force"));
}

#[test]
fn test_commands_before_init_fail() {
    let env = Env::new();
    let output = env.run(&["list", "items"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("stockbook init"));
}

#[test]
fn test_add_update_delete_flow() {
    let env = Env::new();
    env.run_ok(&["init", "--quiet"]);

    assert_eq!(env.run_ok(&["next-id"]).trim(), "00001");
    let added = env.run_ok(&["add", "Widget", "2.5", "4"]);
    assert_eq!(added.trim(), "Added item 00001");
    env.run_ok(&["add", "Gadget", "1.0", "3"]);

    let items = json_records(&env.run_ok(&["list", "items", "--json"]));
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], "00001");
    assert_eq!(items[0]["totalPrice"].as_f64(), Some(10.0));

    env.run_ok(&["update", "00001", "qtyInStock", "10"]);
    let found = json_records(&env.run_ok(&["search", "items", "description", "wid", "--json"]));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["totalPrice"].as_f64(), Some(25.0));

    env.run_ok(&["delete", "00002"]);
    assert_eq!(env.run_ok(&["ids"]).trim(), "00001");

    let transactions = json_records(&env.run_ok(&["list", "transactions", "--json"]));
    let kinds: Vec<&str> = transactions
        .iter()
        .map(|t| t["transactionType"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(kinds, vec!["added", "added", "updated", "deleted"]);
    assert_eq!(transactions[3]["description"], "Gadget");
}

#[test]
fn test_delete_missing_id_reports_error() {
    let env = Env::new();
    env.run_ok(&["init", "--quiet"]);
    env.run_ok(&["add", "Widget", "2.5", "4"]);
    let before = read(&env.data_file("items.txt"));

    let output = env.run(&["delete", "00042"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No item with id 00042"));
    assert_eq!(read(&env.data_file("items.txt")), before);
}

#[test]
fn test_update_rejects_bad_number() {
    let env = Env::new();
    env.run_ok(&["init", "--quiet"]);
    env.run_ok(&["add", "Widget", "2.5", "4"]);

    let output = env.run(&["update", "00001", "qtyInStock", "lots"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("Error:"));
}

#[test]
fn test_headers_and_sources() {
    let env = Env::new();
    env.run_ok(&["init", "--quiet"]);
    env.run_ok(&["add", "Widget", "2.5", "4"]);

    assert_eq!(env.run_ok(&["sources"]), "items\ntransactions\n");
    assert_eq!(
        env.run_ok(&["headers", "items"]).trim(),
        "id,description,unitPrice,qtyInStock,totalPrice"
    );
}

#[test]
fn test_document_backend_persists_between_runs() {
    let env = Env::new();
    let snapshot = env.data.join("inventory.json");
    let snapshot_arg = snapshot.to_string_lossy().into_owned();
    env.run_ok(&["init", "--backend", "document", "--snapshot", &snapshot_arg]);

    env.run_ok(&["add", "Widget", "2.5", "4"]);
    let items = json_records(&env.run_ok(&["list", "items", "--json"]));
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["description"], "Widget");
    assert!(snapshot.exists());

    let transactions = json_records(&env.run_ok(&["list", "transactions", "--json"]));
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["id"], items[0]["id"]);
}

#[test]
fn test_explicit_config_flag() {
    let env = Env::new();
    let config = env.data.join("elsewhere.toml");
    let config_arg = config.to_string_lossy().into_owned();
    let directory = env.data.join("books");
    let directory_arg = directory.to_string_lossy().into_owned();

    env.run_ok(&["--config", &config_arg, "init", "--directory", &directory_arg]);
    assert!(config.exists());
    assert!(directory.join("items.txt").exists());
    assert_eq!(env.run_ok(&["--config", &config_arg, "next-id"]).trim(), "00001");
}
