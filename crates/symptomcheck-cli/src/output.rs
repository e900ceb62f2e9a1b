//! Colored output formatting for the symptomcheck CLI

use colored::*;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use symptomcheck_train::PredictionRecord;

use crate::config::{OutputConfig, OutputFormat};
use crate::pipeline::{ModelAccuracy, PipelineReport};

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "!".yellow().bold(), message);
}

pub fn print_header(title: &str) {
    println!("\n{}", title.cyan().bold());
    println!("{}", "=".repeat(title.chars().count()).cyan());
}

pub fn enable_colors(enabled: bool) {
    colored::control::set_override(enabled);
}

/// Accuracy as a percentage with two decimals.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

pub fn print_distribution(title: &str, distribution: &BTreeMap<String, usize>) {
    print_header(title);
    let width = distribution.keys().map(|k| k.chars().count()).max().unwrap_or(0);
    for (disease, count) in distribution {
        println!("  {:<width$}  {}", disease, count.to_string().yellow(), width = width);
    }
}

pub fn print_cross_validation(report: &PipelineReport) {
    print_header("Cross-validation");
    for candidate in &report.cross_validation {
        match &candidate.result {
            Ok(scores) => {
                let folds: Vec<String> = scores
                    .fold_scores
                    .iter()
                    .map(|s| format!("{:.4}", s))
                    .collect();
                println!("  {}", candidate.name.bold());
                println!("    Scores: [{}]", folds.join(", "));
                println!(
                    "    Mean Accuracy: {} (std {:.4})",
                    format!("{:.4}", scores.mean_score()).green(),
                    scores.std_score()
                );
            }
            Err(e) => {
                println!("  {}", candidate.name.bold());
                print_warning(&format!("  failed: {}", e));
            }
        }
    }
}

fn print_accuracy(entry: &ModelAccuracy, classes: &[String], top_confusions: usize) {
    println!(
        "  {:<16} {}",
        entry.model,
        format_percent(entry.accuracy).green()
    );
    let misclassified = entry.confusion.misclassified();
    if misclassified == 0 {
        return;
    }
    println!("    {} misclassified rows", misclassified.to_string().red());
    for (t, p, count) in entry.confusion.top_confusions(top_confusions) {
        println!(
            "    {} -> {}: {}",
            classes.get(t).map_or("?", String::as_str),
            classes.get(p).map_or("?", String::as_str),
            count
        );
    }
}

pub fn print_training_accuracy(report: &PipelineReport, top_confusions: usize) {
    print_header("Training-set accuracy");
    for entry in &report.training_accuracy {
        print_accuracy(entry, &report.classes, top_confusions);
    }
    print_accuracy(&report.combined_accuracy, &report.classes, top_confusions);
}

pub fn print_record(query: &str, record: &PredictionRecord) {
    println!("  {} {}", "Symptoms:".bold(), query);
    for prediction in &record.predictions {
        println!("    {} Prediction: {}", prediction.model, prediction.disease);
    }
    println!(
        "    {} {}",
        "Final Prediction:".bold(),
        record.final_prediction.green().bold()
    );
}

/// Machine-readable form of the whole report.
pub fn report_json(report: &PipelineReport) -> Value {
    let cross_validation: Vec<Value> = report
        .cross_validation
        .iter()
        .map(|candidate| match &candidate.result {
            Ok(scores) => json!({
                "model": candidate.name,
                "fold_scores": scores.fold_scores,
                "mean_accuracy": scores.mean_score(),
            }),
            Err(e) => json!({
                "model": candidate.name,
                "error": e.to_string(),
            }),
        })
        .collect();

    let training_accuracy: BTreeMap<&str, f64> = report
        .training_accuracy
        .iter()
        .chain(std::iter::once(&report.combined_accuracy))
        .map(|entry| (entry.model.as_str(), entry.accuracy))
        .collect();

    let predictions: Vec<Value> = report
        .predictions
        .iter()
        .map(|(query, record)| json!({ "query": query, "record": record }))
        .collect();

    json!({
        "class_distribution": {
            "before": report.distribution_before,
            "after": report.distribution_after,
        },
        "cross_validation": cross_validation,
        "training_accuracy": training_accuracy,
        "predictions": predictions,
    })
}

pub fn print_report(report: &PipelineReport, output: &OutputConfig) -> anyhow::Result<()> {
    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report_json(report))?);
        }
        OutputFormat::Text => {
            print_distribution("Class distribution (loaded)", &report.distribution_before);
            print_distribution("Class distribution (resampled)", &report.distribution_after);
            print_cross_validation(report);
            print_training_accuracy(report, output.top_confusions);

            print_header("Predictions");
            for (query, record) in &report.predictions {
                print_record(query, record);
            }
            print_success("Done");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(1.0), "100.00%");
        assert_eq!(format_percent(0.98765), "98.77%");
    }
}
