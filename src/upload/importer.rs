//! Batch import orchestration
//!
//! A run has two passes. The first validates the header and coerces every
//! line; any structural problem aborts before the store is written. The
//! second creates categories and courses row by row, where failures are
//! counted and reported but do not stop the run.

use std::fmt;
use std::time::Instant;

use serde::Serialize;

use crate::core::store::RecordStore;
use crate::upload::category::{CategoryResolver, PathOutcome};
use crate::upload::config::ImportConfig;
use crate::upload::error::{LineError, UploadError};
use crate::upload::fields::{ALLOWED_FIELDS, REQUIRED_FIELDS};
use crate::upload::header::{validate_columns, HeaderMap};
use crate::upload::reader::CsvImportReader;
use crate::upload::record::{build_record, CoercedRow};
use crate::upload::value::{coerce, CategoryRef};

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStatus {
    /// Rows parsed from the file
    pub bulk: usize,
    /// Rows processed
    pub read: usize,
    pub created: usize,
    /// Rows whose shortname already existed
    pub skipped: usize,
    /// Rows whose course could not be created
    pub broken: usize,
    pub catcreated: usize,
    /// Categories that failed, plus the deeper levels skipped because of them
    pub catbroken: usize,
}

impl ImportStatus {
    pub fn new(bulk: usize) -> Self {
        Self {
            bulk,
            ..Self::default()
        }
    }
}

/// A non-fatal problem with one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// Category `name` could not be created; `subcategories` deeper levels were skipped
    BrokenCategory { name: String, subcategories: usize },
    /// The course was not created because its category path failed
    InvalidCategory { shortname: String },
    /// The store refused the course
    BrokenCourse { shortname: String, reason: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::BrokenCategory {
                name,
                subcategories,
            } => write!(
                f,
                "Failed to create category {}. {} subcategories were skipped",
                name, subcategories
            ),
            Notice::InvalidCategory { shortname } => write!(
                f,
                "Failed to create course {} because of invalid parent categories",
                shortname
            ),
            Notice::BrokenCourse { shortname, reason } => {
                write!(f, "Failed to create course {}: {}", shortname, reason)
            }
        }
    }
}

/// Counters plus the notices raised along the way
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub status: ImportStatus,
    pub notices: Vec<Notice>,
}

/// Drives one import run against a record store
pub struct BatchImporter<'a> {
    store: &'a mut dyn RecordStore,
    config: &'a ImportConfig,
    resolver: CategoryResolver,
    started: Instant,
}

impl<'a> BatchImporter<'a> {
    pub fn new(store: &'a mut dyn RecordStore, config: &'a ImportConfig) -> Self {
        Self {
            store,
            config,
            resolver: CategoryResolver::new(),
            started: Instant::now(),
        }
    }

    /// Run the import over an already loaded reader
    ///
    /// The reader is closed and cleaned up before this returns, whether the
    /// run succeeds or aborts.
    pub fn run(
        &mut self,
        reader: &mut CsvImportReader,
        allowed: &[&str],
        required: &[&str],
    ) -> Result<ImportReport, UploadError> {
        self.started = Instant::now();
        tracing::info!("starting course import");

        let ingested = self.ingest(reader, allowed, required);
        reader.close();
        reader.cleanup();
        let (headers, rows) = ingested?;

        let mut report = ImportReport {
            status: ImportStatus::new(rows.len()),
            notices: Vec::new(),
        };
        if report.status.bulk == 0 {
            return Err(UploadError::NoCourses);
        }

        for row in &rows {
            self.check_time_limit()?;
            self.process_row(row, &headers, &mut report)?;
            report.status.read += 1;
        }

        self.store.fix_course_sortorder()?;

        tracing::info!(
            read = report.status.read,
            created = report.status.created,
            skipped = report.status.skipped,
            broken = report.status.broken,
            catcreated = report.status.catcreated,
            catbroken = report.status.catbroken,
            "course import finished"
        );
        Ok(report)
    }

    /// First pass: validate the header and coerce every line
    fn ingest(
        &mut self,
        reader: &mut CsvImportReader,
        allowed: &[&str],
        required: &[&str],
    ) -> Result<(HeaderMap, Vec<CoercedRow>), UploadError> {
        let headers = validate_columns(reader.columns(), allowed)?;

        let missing = headers.missing(required);
        if !missing.is_empty() {
            return Err(UploadError::FieldRequired(
                missing.into_iter().map(String::from).collect(),
            ));
        }

        reader.init()?;
        let mut line = 1;
        let mut rows = Vec::new();

        while let Some(cells) = reader.next_line()? {
            line += 1;
            self.check_time_limit()?;

            if cells.len() > headers.len() {
                return Err(UploadError::ErrorOnLine {
                    line,
                    reason: LineError::TooManyColumns {
                        cells: cells.len(),
                        fields: headers.len(),
                    },
                });
            }

            let mut row = CoercedRow::new(line);
            for (index, cell) in cells.into_iter().enumerate() {
                let Some(field) = headers.field(index) else {
                    continue;
                };
                let value = coerce(cell, field, &*self.store).map_err(|e| {
                    UploadError::ErrorOnLine {
                        line,
                        reason: e.into(),
                    }
                })?;
                row.insert(field, value);
            }

            tracing::debug!(line, fields = row.len(), "ingested line");
            rows.push(row);
        }

        Ok((headers, rows))
    }

    /// Second pass for one row: skip, resolve the category, create the course
    fn process_row(
        &mut self,
        row: &CoercedRow,
        headers: &HeaderMap,
        report: &mut ImportReport,
    ) -> Result<(), UploadError> {
        let shortname = row.shortname();

        if self.store.course_shortname_exists(&shortname)? {
            tracing::debug!(line = row.line, shortname = %shortname, "course exists, skipping");
            report.status.skipped += 1;
            return Ok(());
        }

        let category = match row.category() {
            Some(CategoryRef::Id(id)) => Some(*id),
            Some(CategoryRef::Path(segments)) if !segments.is_empty() => {
                let resolution = self.resolver.resolve(&mut *self.store, segments)?;
                report.status.catcreated += resolution.created;
                match resolution.outcome {
                    PathOutcome::Resolved(id) => Some(id),
                    PathOutcome::Broken { name, skipped, .. } => {
                        report.status.catbroken += 1 + skipped;
                        self.notify(
                            report,
                            Notice::BrokenCategory {
                                name,
                                subcategories: skipped,
                            },
                        );
                        None
                    }
                }
            }
            _ => Some(self.config.default_category),
        };

        let Some(category) = category else {
            report.status.broken += 1;
            self.notify(report, Notice::InvalidCategory { shortname });
            return Ok(());
        };

        let record = build_record(row, headers, &self.config.defaults, category);
        match self.store.create_course(&record) {
            Ok(id) => {
                tracing::debug!(line = row.line, shortname = %shortname, id, category, "created course");
                report.status.created += 1;
            }
            Err(e) => {
                report.status.broken += 1;
                self.notify(
                    report,
                    Notice::BrokenCourse {
                        shortname,
                        reason: e.to_string(),
                    },
                );
            }
        }

        Ok(())
    }

    fn notify(&self, report: &mut ImportReport, notice: Notice) {
        tracing::warn!("{}", notice);
        report.notices.push(notice);
    }

    fn check_time_limit(&self) -> Result<(), UploadError> {
        if self.started.elapsed() > self.config.time_limit {
            return Err(UploadError::TimeLimitExceeded {
                limit_secs: self.config.time_limit.as_secs(),
            });
        }
        Ok(())
    }
}

/// Import an uploaded blob with the standard course fields
pub fn import_content(
    store: &mut dyn RecordStore,
    content: &[u8],
    config: &ImportConfig,
) -> Result<ImportReport, UploadError> {
    let mut reader =
        CsvImportReader::load_content(content, &config.encoding, config.delimiter_byte())?
            .with_type_inference(config.infer_types);
    BatchImporter::new(store, config).run(&mut reader, &ALLOWED_FIELDS, &REQUIRED_FIELDS)
}
