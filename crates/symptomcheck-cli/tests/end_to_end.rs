//! End-to-end tests running the `symptomcheck` binary in a scratch directory

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const DISEASES: [&str; 3] = ["Allergy", "Common Cold", "Dermatitis"];

fn write_dataset(dir: &Path) {
    let mut csv = String::from("Sneezing,Cough,Rash,Fatigue,gender,disease\n");
    // Dermatitis is under-represented so oversampling has work to do.
    for i in 0..30 {
        let class = i % 3;
        if class == 2 && i > 12 {
            continue;
        }
        let marks: Vec<&str> = (0..3).map(|j| if j == class { "1" } else { "0" }).collect();
        let gender = if i % 4 < 2 { "F" } else { "M" };
        csv.push_str(&format!(
            "{},{},{},{}\n",
            marks.join(","),
            (i / 3) % 2,
            gender,
            DISEASES[class]
        ));
    }
    fs::write(dir.join("symptoms.csv"), csv).unwrap();
}

fn run_cli(dir: &Path, config: &str) -> (String, String, i32) {
    fs::write(dir.join(".symptomcheckrc"), config).unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_symptomcheck"))
        .current_dir(dir)
        .output()
        .expect("Failed to execute CLI");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

const BASE_CONFIG: &str = r#"
queries = ["Cough", "Rash, Unknown Symptom", ""]

[dataset]
path = "symptoms.csv"

[random_forest]
n_estimators = 10

[output]
colored = false
"#;

#[test]
fn test_json_report() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path());

    let config = format!("{}format = \"json\"\n", BASE_CONFIG);
    let (stdout, stderr, code) = run_cli(dir.path(), &config);
    assert_eq!(code, 0, "stderr: {}", stderr);

    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["class_distribution"]["before"]["Dermatitis"], 4);
    assert_eq!(report["class_distribution"]["after"]["Dermatitis"], 10);

    let cv = report["cross_validation"].as_array().unwrap();
    assert_eq!(cv.len(), 2);
    assert_eq!(cv[0]["model"], "Decision Tree");
    assert_eq!(cv[1]["model"], "Random Forest");
    assert_eq!(cv[0]["fold_scores"].as_array().unwrap().len(), 5);

    let predictions = report["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 3);
    assert_eq!(predictions[0]["record"]["final_prediction"], "Common Cold");
    assert_eq!(predictions[1]["record"]["final_prediction"], "Dermatitis");
    assert_eq!(
        predictions[2]["record"]["predictions"].as_array().unwrap().len(),
        3
    );
}

#[test]
fn test_text_report() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path());

    let (stdout, stderr, code) = run_cli(dir.path(), BASE_CONFIG);
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert!(stdout.contains("Cross-validation"));
    assert!(stdout.contains("Mean Accuracy"));
    assert!(stdout.contains("SVM Prediction: Common Cold"));
    assert!(stdout.contains("Final Prediction:"));
}

#[test]
fn test_missing_dataset_fails() {
    let dir = TempDir::new().unwrap();

    let (_, stderr, code) = run_cli(dir.path(), "[dataset]\npath = \"absent.csv\"\n");
    assert_eq!(code, 1);
    assert!(stderr.contains("Failed to load dataset"));
}

#[test]
fn test_malformed_config_fails() {
    let dir = TempDir::new().unwrap();

    let (_, stderr, code) = run_cli(dir.path(), "seed = [1, 2]\n");
    assert_eq!(code, 1);
    assert!(stderr.contains("Failed to parse config file"));
}
