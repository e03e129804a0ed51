use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, instrument};

use crate::app::ports::RecordSink;
use crate::pipeline::processing::completeness::{self, CompletenessReport};
use crate::types::RawRecord;

/// Files produced by one validation run
#[derive(Debug, Clone)]
pub struct ValidationRun {
    pub report: CompletenessReport,
    pub complete_file: Option<PathBuf>,
    pub incomplete_file: Option<PathBuf>,
    pub report_file: PathBuf,
}

/// Use case for splitting raw rows into complete and incomplete sets
pub struct ValidateUseCase {
    required_fields: Vec<String>,
    complete_output: Box<dyn RecordSink>,
    incomplete_output: Box<dyn RecordSink>,
    report_output: Box<dyn RecordSink>,
}

impl ValidateUseCase {
    pub fn new(
        required_fields: Vec<String>,
        complete_output: Box<dyn RecordSink>,
        incomplete_output: Box<dyn RecordSink>,
        report_output: Box<dyn RecordSink>,
    ) -> Self {
        Self {
            required_fields,
            complete_output,
            incomplete_output,
            report_output,
        }
    }

    /// Filter `records` and persist each non-empty set with the `suffix` in its name
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub fn run(&self, records: Vec<RawRecord>, suffix: &str) -> Result<ValidationRun> {
        let outcome = completeness::filter(records, &self.required_fields);
        let report = outcome.report(&self.required_fields);

        let complete_file = if outcome.complete.is_empty() {
            None
        } else {
            let name = format!("complete_data_{}.json", suffix);
            let document = serde_json::to_value(&outcome.complete)?;
            Some(
                self.complete_output
                    .write_document(&name, &document)
                    .with_context(|| format!("writing {}", name))?,
            )
        };

        let incomplete_file = if outcome.incomplete.is_empty() {
            None
        } else {
            let name = format!("incomplete_data_{}.json", suffix);
            let document = serde_json::to_value(&outcome.incomplete)?;
            Some(
                self.incomplete_output
                    .write_document(&name, &document)
                    .with_context(|| format!("writing {}", name))?,
            )
        };

        let name = format!("validation_report_{}.json", suffix);
        let report_file = self
            .report_output
            .write_document(&name, &serde_json::to_value(&report)?)
            .with_context(|| format!("writing {}", name))?;

        info!("Validation summary:\n{}", report);
        Ok(ValidationRun {
            report,
            complete_file,
            incomplete_file,
            report_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemorySink {
        written: Rc<RefCell<Vec<(String, Value)>>>,
    }

    impl RecordSink for MemorySink {
        fn write_document(&self, name: &str, document: &Value) -> Result<PathBuf> {
            self.written.borrow_mut().push((name.to_string(), document.clone()));
            Ok(PathBuf::from(name))
        }
    }

    #[test]
    fn test_run_writes_each_set() {
        let complete = MemorySink::default();
        let incomplete = MemorySink::default();
        let reports = MemorySink::default();
        let use_case = ValidateUseCase::new(
            vec!["商品标题".into(), "价格".into()],
            Box::new(complete.clone()),
            Box::new(incomplete.clone()),
            Box::new(reports.clone()),
        );

        let records = vec![
            json!({"商品标题": "A", "价格": ["1"]}),
            json!({"商品标题": "B", "价格": []}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();

        let run = use_case.run(records, "20250101_120000").unwrap();

        assert_eq!(run.report.complete, 1);
        assert_eq!(run.complete_file, Some(PathBuf::from("complete_data_20250101_120000.json")));
        let incomplete = incomplete.written.borrow();
        assert_eq!(incomplete[0].1[0]["_missing_fields"], json!(["价格"]));
        assert_eq!(incomplete[0].1[0]["_row_index"], json!(1));
        assert_eq!(reports.written.borrow()[0].1["completeness_rate"], json!("50.00%"));
    }

    #[test]
    fn test_empty_sets_are_not_written() {
        let complete = MemorySink::default();
        let use_case = ValidateUseCase::new(
            vec!["商品标题".into()],
            Box::new(complete.clone()),
            Box::new(MemorySink::default()),
            Box::new(MemorySink::default()),
        );

        let run = use_case.run(Vec::new(), "x").unwrap();
        assert!(run.complete_file.is_none());
        assert!(run.incomplete_file.is_none());
        assert!(complete.written.borrow().is_empty());
    }
}
