use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;

const SALES: &str = "cliente,emissora,executivo,ano,mes,faturamento,insercoes
Acme,TV1,Ana,2024,1,1000,10
Acme,TV1,Ana,2025,1,1500,15
Beta,Radio,Bruno,2024,2,500,5
Fresh,TV1,Ana,2025,2,250,5
Fresh,Radio,Bruno,2025,3,250,5
";

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, content).expect("write test file");
}

/// Runs the binary with HOME pointed at `home` so no user config leaks in
fn run_adrev(args: &[&str], home: &Path) -> (bool, Vec<u8>, Vec<u8>) {
    let bin = std::env::var("CARGO_BIN_EXE_adrev").unwrap_or_else(|_| {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("target");
        path.push("debug");
        if cfg!(windows) {
            path.push("adrev.exe");
        } else {
            path.push("adrev");
        }
        path.to_string_lossy().into_owned()
    });
    let output = Command::new(bin)
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG")
        .output()
        .expect("run adrev");
    (output.status.success(), output.stdout, output.stderr)
}

fn kpi<'a>(report: &'a Value, label: &str) -> &'a Value {
    report["kpis"]
        .as_array()
        .expect("kpis array")
        .iter()
        .find(|k| k["label"] == label)
        .map(|k| &k["value"])
        .unwrap_or_else(|| panic!("missing kpi {label}"))
}

#[test]
fn overview_json_reports_base_and_comparison_revenue() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("sales.csv");
    write_file(&data, SALES);

    let (ok, stdout, stderr) = run_adrev(&["overview", "--json", "--data", data.to_str().unwrap()], dir.path());
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["report"], "overview");
    assert_eq!(kpi(&json, "Revenue 2024").as_f64(), Some(1500.0));
    assert_eq!(kpi(&json, "Revenue 2025").as_f64(), Some(2000.0));
    assert_eq!(kpi(&json, "Delta").as_f64(), Some(500.0));
    assert_eq!(kpi(&json, "Active clients 2025").as_f64(), Some(2.0));
    assert_eq!(kpi(&json, "Top client"), "Acme");

    let evolution = &json["sections"][0]["table"];
    assert_eq!(evolution["rows"].as_array().unwrap().len(), 5);
}

#[test]
fn undefined_values_serialize_as_null() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("sales.csv");
    write_file(
        &data,
        "client,year,month,revenue\nAcme,2024,1,0\nAcme,2025,1,100\n",
    );

    let (ok, stdout, stderr) = run_adrev(&["--json", "--data", data.to_str().unwrap()], dir.path());
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert!(kpi(&json, "Delta %").is_null());
    assert_eq!(kpi(&json, "Delta").as_f64(), Some(100.0));
}

#[test]
fn churn_json_lists_lost_and_new_clients() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("sales.csv");
    write_file(&data, SALES);

    let (ok, stdout, stderr) = run_adrev(&["churn", "--json", "--data", data.to_str().unwrap()], dir.path());
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(kpi(&json, "Lost clients").as_f64(), Some(1.0));
    assert_eq!(kpi(&json, "New clients").as_f64(), Some(1.0));
    assert_eq!(kpi(&json, "Net revenue").as_f64(), Some(0.0));

    let lost = &json["sections"][0]["table"]["rows"][0];
    assert_eq!(lost["client"], "Beta");
}

#[test]
fn glob_pattern_concatenates_files() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir.path().join("data/2024.csv"), "client,year,revenue\nAcme,2024,100\n");
    write_file(&dir.path().join("data/2025.csv"), "client,year,revenue\nAcme,2025,300\n");
    let pattern = dir.path().join("data").join("*.csv");

    let (ok, stdout, stderr) = run_adrev(&["--json", "--data", pattern.to_str().unwrap()], dir.path());
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(kpi(&json, "Revenue 2024").as_f64(), Some(100.0));
    assert_eq!(kpi(&json, "Revenue 2025").as_f64(), Some(300.0));
}

#[test]
fn missing_required_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("sales.csv");
    write_file(&data, "client,year,month\nAcme,2024,1\n");

    let (ok, stdout, stderr) = run_adrev(&["--data", data.to_str().unwrap()], dir.path());
    assert!(!ok);
    assert!(stdout.is_empty());
    let stderr = String::from_utf8_lossy(&stderr);
    assert!(stderr.contains("Missing required column"), "stderr: {stderr}");
    assert!(stderr.contains("revenue"), "stderr: {stderr}");
}

#[test]
fn overlap_without_broadcaster_fails_but_all_continues() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("sales.csv");
    write_file(&data, "client,year,revenue\nAcme,2024,100\nBeta,2025,50\n");
    let data = data.to_str().unwrap();

    let (ok, _, stderr) = run_adrev(&["overlap", "--data", data], dir.path());
    assert!(!ok);
    assert!(String::from_utf8_lossy(&stderr).contains("broadcaster"));

    let (ok, stdout, stderr) = run_adrev(&["all", "--json", "--data", data], dir.path());
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    let reports: Vec<&str> = json
        .as_array()
        .expect("array output")
        .iter()
        .filter_map(|r| r["report"].as_str())
        .collect();
    assert_eq!(reports, vec!["overview", "clients", "churn", "abc", "efficiency"]);
    assert!(String::from_utf8_lossy(&stderr).contains("skipped"));
}

#[test]
fn filters_narrow_the_selection() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("sales.csv");
    write_file(&data, SALES);

    let (ok, stdout, stderr) = run_adrev(
        &["--json", "--data", data.to_str().unwrap(), "--broadcaster", "TV1", "--months", "jan"],
        dir.path(),
    );
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(kpi(&json, "Revenue 2024").as_f64(), Some(1000.0));
    assert_eq!(kpi(&json, "Revenue 2025").as_f64(), Some(1500.0));

    let (ok, stdout, _) = run_adrev(&["filters", "--json", "--data", data.to_str().unwrap()], dir.path());
    assert!(ok);
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["years"], serde_json::json!([2024, 2025]));
    assert_eq!(json["broadcasters"], serde_json::json!(["Radio", "TV1"]));
}

#[test]
fn export_writes_archive_with_filter_banner() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("sales.csv");
    write_file(&data, SALES);
    let out = dir.path().join("bundle.zip");

    let (ok, stdout, stderr) = run_adrev(
        &[
            "export",
            "--out",
            out.to_str().unwrap(),
            "--report",
            "churn",
            "--data",
            data.to_str().unwrap(),
            "--from",
            "2024",
        ],
        dir.path(),
    );
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));
    assert!(String::from_utf8_lossy(&stdout).contains("Export archive written"));

    let mut archive = zip::ZipArchive::new(fs::File::open(&out).expect("archive")).expect("zip");
    let mut text = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut text)
        .unwrap();
    let manifest: Value = serde_json::from_str(&text).expect("manifest");
    let files = manifest["files"].as_array().expect("files");
    assert!(!files.is_empty());
    assert!(manifest["filters"].as_str().unwrap().starts_with("Period (year): from 2024"));

    let first_csv = files
        .iter()
        .filter_map(Value::as_str)
        .find(|f| f.ends_with(".csv"))
        .expect("a csv file");
    let mut csv = String::new();
    archive.by_name(first_csv).unwrap().read_to_string(&mut csv).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("ACTIVE FILTERS AT EXPORT TIME:"));
    assert!(lines.next().unwrap().starts_with("Period (year): from 2024"));
    assert_eq!(lines.next(), Some(""));
}

#[test]
fn unsupported_locale_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("sales.csv");
    write_file(&data, SALES);

    let (ok, _, stderr) = run_adrev(&["--locale", "xx", "--data", data.to_str().unwrap()], dir.path());
    assert!(!ok);
    assert!(String::from_utf8_lossy(&stderr).contains("Unsupported locale"));
}
