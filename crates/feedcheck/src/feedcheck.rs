//! Main FeedCheck struct and public API.

use std::path::Path;
use std::sync::atomic::AtomicBool;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::FeedCheckConfig;
use crate::error::Result;
use crate::input::{FeedReader, RawTable, SourceMetadata};
use crate::notice::{NoticeAggregator, NoticeReport, SeverityCounts};
use crate::rules::{Rule, RuleRunner, RunOutcome, default_rules};
use crate::schema::{SchemaCatalog, gtfs};
use crate::table::{Feed, FeedLoader};

/// Slot of the loader's notices in the aggregator.
const LOADER_SLOT: usize = 0;

/// Result of validating one feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Every notice, in loader-then-registry order, with exact counts.
    pub report: NoticeReport,
    pub summary: ValidationSummary,
    /// Metadata of the files read, when validating from disk.
    pub sources: Vec<SourceMetadata>,
    /// The run was cancelled; the report is incomplete.
    pub cancelled: bool,
}

/// Summary of a validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Tables loaded from the feed.
    pub tables_loaded: usize,
    /// Data rows across all loaded tables.
    pub total_rows: usize,
    /// Number of rules that ran, including failed ones.
    pub rules_run: usize,
    /// Rules skipped because a table they read is missing.
    pub rules_skipped: Vec<String>,
    /// Rules that failed and were replaced by a fault notice.
    pub rules_failed: Vec<String>,
    /// Notice totals by severity.
    pub notices_by_severity: SeverityCounts,
    /// Human-readable recommendation.
    pub recommendation: String,
}

/// The validation engine: schema catalog, rule set and run configuration.
pub struct FeedCheck {
    config: FeedCheckConfig,
    catalog: SchemaCatalog,
    runner: RuleRunner,
}

impl FeedCheck {
    /// GTFS catalog and default rules with default configuration.
    pub fn new() -> Self {
        Self::with_config(FeedCheckConfig::default())
    }

    /// GTFS catalog and default rules with custom configuration.
    pub fn with_config(config: FeedCheckConfig) -> Self {
        let catalog = gtfs::catalog();
        let rules = default_rules(&catalog, &config.thresholds);
        Self::with_rules(catalog, rules, config)
    }

    /// Any catalog with any rule set.
    pub fn with_rules(catalog: SchemaCatalog, rules: Vec<Box<dyn Rule>>, config: FeedCheckConfig) -> Self {
        let runner = RuleRunner::new(rules)
            .with_parallel(config.parallel)
            .with_threads(config.threads);
        Self {
            config,
            catalog,
            runner,
        }
    }

    pub fn config(&self) -> &FeedCheckConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        self.runner.rules()
    }

    /// Read every `*.txt` file of a directory and validate them.
    pub fn validate_dir(&self, dir: impl AsRef<Path>) -> Result<ValidationResult> {
        let reader = FeedReader {
            max_rows: self.config.max_rows,
        };
        let (tables, sources): (Vec<_>, Vec<_>) = reader.read_dir(dir)?.into_iter().unzip();
        self.validate_with_cancel(tables, sources, &AtomicBool::new(false))
    }

    /// Validate already-tokenized tables.
    pub fn validate_tables(&self, tables: Vec<RawTable>) -> Result<ValidationResult> {
        self.validate_with_cancel(tables, Vec::new(), &AtomicBool::new(false))
    }

    /// Validate tables, stopping before any rule that has not started once
    /// `cancel` is set.
    pub fn validate_with_cancel(
        &self,
        tables: Vec<RawTable>,
        sources: Vec<SourceMetadata>,
        cancel: &AtomicBool,
    ) -> Result<ValidationResult> {
        self.config.check()?;
        info!(
            files = tables.len(),
            rules = self.runner.rules().len(),
            "Starting feed validation"
        );

        let loader = FeedLoader::new(&self.catalog)
            .with_cap(self.config.max_notices_per_code)
            .with_parallel(self.config.parallel);
        let (feed, load_notices) = loader.load(tables);

        let aggregator = NoticeAggregator::new(self.config.max_notices_per_code);
        aggregator.merge(LOADER_SLOT, load_notices);

        let outcome = self.runner.run(&feed, &aggregator, cancel)?;
        if outcome.cancelled {
            warn!(rules_run = outcome.rules_run, "Validation cancelled");
        }

        let report = aggregator.freeze();
        let summary = summarize(&feed, &report, &outcome);
        info!(
            errors = summary.notices_by_severity.error,
            warnings = summary.notices_by_severity.warning,
            infos = summary.notices_by_severity.info,
            rules_failed = summary.rules_failed.len(),
            "Feed validation finished"
        );

        Ok(ValidationResult {
            report,
            summary,
            sources,
            cancelled: outcome.cancelled,
        })
    }
}

impl Default for FeedCheck {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize(feed: &Feed, report: &NoticeReport, outcome: &RunOutcome) -> ValidationSummary {
    let notices_by_severity = report.severity_counts;
    ValidationSummary {
        tables_loaded: feed.len(),
        total_rows: feed.tables().map(|t| t.len()).sum(),
        rules_run: outcome.rules_run,
        rules_skipped: outcome.rules_skipped.clone(),
        rules_failed: outcome.rules_failed.clone(),
        notices_by_severity,
        recommendation: recommendation(&notices_by_severity, outcome),
    }
}

fn recommendation(counts: &SeverityCounts, outcome: &RunOutcome) -> String {
    if outcome.cancelled {
        "Validation was cancelled; results are incomplete.".to_string()
    } else if !outcome.rules_failed.is_empty() {
        format!(
            "{} rules could not complete; results may be incomplete.",
            outcome.rules_failed.len()
        )
    } else if counts.error > 0 {
        format!("Fix {} errors before publishing this feed.", counts.error)
    } else if counts.warning > 0 {
        format!("Feed is valid. Review {} warnings.", counts.warning)
    } else {
        "Feed is valid.".to_string()
    }
}
