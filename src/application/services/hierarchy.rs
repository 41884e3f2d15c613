//! Hierarchy pipeline service
//!
//! Loads a flat employee document, rebuilds the reporting tree and writes it.
//! Every stage failure is collected into a `RunReport`; the pipeline always
//! runs to the end with whatever partial result it has.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::ingest::{Ingested, Ingestor};
use crate::application::render::{render, OutputFormat};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{DomainError, FlatRecord, Hierarchy, HierarchyBuilder, TreeArena, TreeResult};
use crate::infrastructure::traits::FileSystem;

/// What happened during one pipeline run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Records successfully ingested
    pub records_read: usize,
    /// Nodes in the rebuilt tree
    pub nodes_built: usize,
    /// Identities left out of the tree (unknown manager or extra roots)
    pub unattached: Vec<String>,
    /// Whether the output document was written
    pub output_written: bool,
    /// Every failure, in the order it occurred
    pub diagnostics: Vec<ApplicationError>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn missing_root(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, ApplicationError::Domain(DomainError::MissingRoot)))
    }
}

/// Service running load → build → render → save.
pub struct HierarchyService {
    fs: Arc<dyn FileSystem>,
    ingestor: Ingestor,
    format: OutputFormat,
    pretty: bool,
}

impl HierarchyService {
    /// Create a new hierarchy service.
    pub fn new(fs: Arc<dyn FileSystem>, ingestor: Ingestor, format: OutputFormat, pretty: bool) -> Self {
        Self {
            fs,
            ingestor,
            format,
            pretty,
        }
    }

    /// Create a service configured from settings.
    pub fn from_settings(fs: Arc<dyn FileSystem>, settings: &Settings) -> Self {
        Self::new(
            fs,
            Ingestor::new(settings.input.format, settings.input.fields.clone()),
            settings.output_format,
            settings.pretty,
        )
    }

    /// Use a different output format than configured.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Read and parse the input document.
    pub fn load(&self, input: &Path) -> ApplicationResult<Ingested> {
        debug!("load: input={}", input.display());
        let raw = self.fs.read_to_string(input).or_unreadable(input)?;
        self.ingestor.parse(&raw, input)
    }

    /// Rebuild the tree from flat records.
    pub fn build(&self, records: &[FlatRecord]) -> TreeResult<Hierarchy> {
        HierarchyBuilder::new().build_tree(records)
    }

    /// Write rendered output, creating parent directories.
    pub fn save(&self, output: &Path, text: &str) -> ApplicationResult<()> {
        debug!("save: output={}", output.display());
        self.fs.ensure_parent(output).or_unwritable(output)?;
        self.fs.write(output, text).or_unwritable(output)
    }

    /// Load and build without writing anything.
    ///
    /// Returns the tree (empty if no root was found) and the report so far.
    #[instrument(level = "debug", skip(self))]
    pub fn inspect(&self, input: &Path) -> (TreeArena, RunReport) {
        let mut report = RunReport::default();

        let records = match self.load(input) {
            Ok(ingested) => {
                report.diagnostics.extend(ingested.issues);
                ingested.records
            }
            Err(e) => {
                report.diagnostics.push(e);
                Vec::new()
            }
        };
        report.records_read = records.len();

        let tree = match self.build(&records) {
            Ok(hierarchy) => {
                report
                    .diagnostics
                    .extend(hierarchy.issues.into_iter().map(ApplicationError::from));
                report.unattached = hierarchy.unattached;
                hierarchy.tree
            }
            Err(e) => {
                report.diagnostics.push(e.into());
                TreeArena::new()
            }
        };
        report.nodes_built = tree.len();

        (tree, report)
    }

    /// Run the full pipeline. Never fails; see `RunReport::diagnostics`.
    #[instrument(level = "debug", skip(self))]
    pub fn run(&self, input: &Path, output: &Path) -> RunReport {
        let (tree, mut report) = self.inspect(input);

        match render(&tree, self.format, self.pretty) {
            Ok(text) => match self.save(output, &text) {
                Ok(()) => report.output_written = true,
                Err(e) => report.diagnostics.push(e),
            },
            Err(e) => report.diagnostics.push(e),
        }

        info!(
            "{} records read, {} nodes built, {} problems",
            report.records_read,
            report.nodes_built,
            report.diagnostics.len()
        );
        report
    }
}
