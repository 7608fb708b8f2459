use std::fmt::Write as FmtWrite;

use crate::models::{IndexStats, IngestionReport, OutputFormat};

pub trait Formatter {
    fn format_report(&self, report: &IngestionReport) -> String;
    fn format_stats(&self, index: &str, stats: &IndexStats) -> String;
    fn format_validation(&self, validation: &ValidationInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

/// Result of a dry run over the record source.
#[derive(Debug, Clone)]
pub struct ValidationInfo {
    pub source: String,
    pub records: usize,
    pub unique_ids: usize,
    pub index: String,
    pub dimension: usize,
    pub namespace: String,
}

pub struct TextFormatter;

impl TextFormatter {
    fn write_namespaces(output: &mut String, stats: &IndexStats) {
        if stats.namespaces.is_empty() {
            writeln!(output, "Namespaces:     (none)").unwrap();
            return;
        }
        writeln!(output, "Namespaces:").unwrap();
        for (name, count) in &stats.namespaces {
            let label = if name.is_empty() { "(default)" } else { name };
            writeln!(output, "  {:<14}{}", label, count).unwrap();
        }
    }
}

impl Formatter for TextFormatter {
    fn format_report(&self, report: &IngestionReport) -> String {
        let mut output = String::new();
        writeln!(output, "Ingestion Complete").unwrap();
        writeln!(output, "------------------").unwrap();
        writeln!(output, "Index:          {}", report.index).unwrap();
        writeln!(output, "Namespace:      {}", report.namespace).unwrap();
        writeln!(output, "Records read:   {}", report.records_read).unwrap();
        writeln!(output, "Vectors sent:   {}", report.vectors_upserted).unwrap();
        writeln!(output, "Duration:       {}ms", report.duration_ms).unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Dimension:      {}", report.stats.dimension).unwrap();
        writeln!(output, "Total vectors:  {}", report.stats.total_vector_count).unwrap();
        Self::write_namespaces(&mut output, &report.stats);
        output
    }

    fn format_stats(&self, index: &str, stats: &IndexStats) -> String {
        let mut output = String::new();
        writeln!(output, "Index Stats").unwrap();
        writeln!(output, "-----------").unwrap();
        writeln!(output, "Index:          {}", index).unwrap();
        writeln!(output, "Dimension:      {}", stats.dimension).unwrap();
        writeln!(output, "Total vectors:  {}", stats.total_vector_count).unwrap();
        Self::write_namespaces(&mut output, stats);
        output
    }

    fn format_validation(&self, validation: &ValidationInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Dry run: source is valid").unwrap();
        writeln!(output, "Source:         {}", validation.source).unwrap();
        writeln!(output, "Records:        {}", validation.records).unwrap();
        writeln!(output, "Unique ids:     {}", validation.unique_ids).unwrap();
        writeln!(
            output,
            "Target:         {} (dimension {}, namespace {})",
            validation.index, validation.dimension, validation.namespace
        )
        .unwrap();
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, value: &serde_json::Value) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        let mut output = rendered.unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e));
        output.push('\n');
        output
    }
}

impl Formatter for JsonFormatter {
    fn format_report(&self, report: &IngestionReport) -> String {
        let value = serde_json::to_value(report)
            .unwrap_or_else(|e| serde_json::json!({"error": e.to_string()}));
        self.render(&value)
    }

    fn format_stats(&self, index: &str, stats: &IndexStats) -> String {
        self.render(&serde_json::json!({
            "index": index,
            "dimension": stats.dimension,
            "total_vector_count": stats.total_vector_count,
            "namespaces": stats.namespaces,
        }))
    }

    fn format_validation(&self, validation: &ValidationInfo) -> String {
        self.render(&serde_json::json!({
            "valid": true,
            "source": validation.source,
            "records": validation.records,
            "unique_ids": validation.unique_ids,
            "index": validation.index,
            "dimension": validation.dimension,
            "namespace": validation.namespace,
        }))
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}
