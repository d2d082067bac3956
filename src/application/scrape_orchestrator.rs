//! Drives one harvest run end to end
//!
//! Load state -> discover -> per product: scan -> per row: dedup, extract ->
//! merge -> commit. Products and rows are processed strictly in order on a
//! single task, so the ledger needs no locking.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::{ChangelogExtractor, HarvestError, ProductDiscoverer, ReleaseIndexScanner};
use crate::domain::{ChangelogRecord, Product, ReleaseRow, RunPhase, RunSummary, ScrapedUrlLedger};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::page_fetcher::{BrowserPage, PageFetcher};
use crate::infrastructure::parsing::SelectorConfig;
use crate::infrastructure::state_store::{PersistedState, StateStore};

/// What a harvest pass produced before merging
#[derive(Debug, Clone, Default)]
pub struct HarvestOutcome {
    /// Ledger passed in, plus every URL that produced a record
    pub ledger: ScrapedUrlLedger,
    /// New records in discovery order
    pub new_records: Vec<ChangelogRecord>,
    pub summary: RunSummary,
}

pub struct ScrapeOrchestrator<S: StateStore> {
    fetcher: Arc<dyn PageFetcher>,
    store: S,
    discoverer: ProductDiscoverer,
    scanner: ReleaseIndexScanner,
    extractor: ChangelogExtractor,
}

fn enter(phase: RunPhase) {
    debug!(phase = %phase, "Run phase");
}

impl<S: StateStore> ScrapeOrchestrator<S> {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        store: S,
        discoverer: ProductDiscoverer,
        scanner: ReleaseIndexScanner,
        extractor: ChangelogExtractor,
    ) -> Self {
        Self {
            fetcher,
            store,
            discoverer,
            scanner,
            extractor,
        }
    }

    /// Wire up all components from configuration
    pub fn from_config(fetcher: Arc<dyn PageFetcher>, store: S, config: &AppConfig) -> Result<Self, HarvestError> {
        let selectors: &SelectorConfig = &config.source.selectors;
        let discoverer = ProductDiscoverer::new(selectors, config.timing.discovery_timeout())?;
        let scanner = ReleaseIndexScanner::new(selectors, config.timing.release_table_timeout())?;
        let extractor = ChangelogExtractor::new(Arc::clone(&fetcher), selectors)?;
        Ok(Self::new(fetcher, store, discoverer, scanner, extractor))
    }

    /// Run one full harvest starting at `landing_url`.
    ///
    /// Returns the run summary, or one of the two fatal errors:
    /// [`HarvestError::PersistedStateCorrupt`] (nothing was scraped) and
    /// [`HarvestError::PersistenceFailure`] (nothing was committed).
    pub async fn run(&self, landing_url: &str) -> Result<RunSummary, HarvestError> {
        let started = Instant::now();
        enter(RunPhase::Idle);

        enter(RunPhase::LoadingState);
        let PersistedState { ledger, dataset } = match self.store.load().await {
            Ok(state) => state,
            Err(e) => {
                enter(RunPhase::Failed);
                error!("❌ Refusing to run on corrupt state: {}", e);
                return Err(HarvestError::PersistedStateCorrupt(e));
            }
        };

        let HarvestOutcome {
            ledger,
            new_records,
            mut summary,
        } = self.harvest(landing_url, ledger).await;

        enter(RunPhase::Merging);
        let dataset = dataset.merge(new_records);
        summary.total_record_count = dataset.len();

        if summary.is_noop() {
            info!("No new releases; stored state left untouched");
        } else {
            enter(RunPhase::Persisting);
            if let Err(e) = self.store.commit(&ledger, &dataset).await {
                enter(RunPhase::Failed);
                error!("❌ Failed to save {} new releases: {}", summary.new_record_count, e);
                return Err(HarvestError::PersistenceFailure(e));
            }
        }

        enter(RunPhase::Done);
        summary.elapsed = started.elapsed();
        info!(
            "🎉 Saved {} total releases ({} new) in {:.2?}",
            summary.total_record_count, summary.new_record_count, summary.elapsed
        );
        Ok(summary)
    }

    /// Discover, scan and extract without touching persisted state.
    ///
    /// Takes the ledger by value and hands it back grown by every URL that
    /// produced a record. Failures are absorbed as skips.
    pub async fn harvest(&self, landing_url: &str, ledger: ScrapedUrlLedger) -> HarvestOutcome {
        let mut outcome = HarvestOutcome {
            ledger,
            ..HarvestOutcome::default()
        };

        enter(RunPhase::Discovering);
        let mut page = match self.fetcher.open_page().await {
            Ok(page) => page,
            Err(e) => {
                warn!("⚠️ Could not open a page for discovery: {}", e);
                outcome.summary.ledger_size = outcome.ledger.len();
                return outcome;
            }
        };

        self.visit_products(page.as_mut(), landing_url, &mut outcome).await;

        if let Err(e) = page.close().await {
            warn!("Failed to close listing page: {}", e);
        }

        outcome.summary.new_record_count = outcome.new_records.len();
        outcome.summary.ledger_size = outcome.ledger.len();
        outcome
    }

    async fn visit_products(&self, page: &mut dyn BrowserPage, landing_url: &str, outcome: &mut HarvestOutcome) {
        let products = match self.discoverer.discover(page, landing_url).await {
            Ok(products) => products,
            Err(e) => {
                warn!("⚠️ Discovery failed, nothing to harvest: {}", e);
                return;
            }
        };

        outcome.summary.products_discovered = products.len();
        if products.is_empty() {
            warn!("⚠️ Landing page {} listed no products", landing_url);
            return;
        }

        for product in &products {
            enter(RunPhase::ScanningProduct);
            info!("➡️ Scraping: {}", product.title);

            let index = match self.scanner.scan(page, product).await {
                Ok(index) => index,
                Err(e) => {
                    warn!("⚠️ Skipping {}: {}", product.title, e);
                    outcome.summary.products_skipped += 1;
                    continue;
                }
            };
            outcome.summary.rows_without_changelog += index.without_changelog;

            for row in index.rows {
                self.visit_row(product, row, outcome).await;
            }
        }
    }

    async fn visit_row(&self, product: &Product, row: ReleaseRow, outcome: &mut HarvestOutcome) {
        let Some(url) = row.changelog_url.clone() else {
            return;
        };

        if outcome.ledger.contains(&url) {
            info!("🔁 Skipping already scraped: {} {}", product.title, row.version);
            outcome.summary.rows_already_scraped += 1;
            return;
        }

        enter(RunPhase::ExtractingChangelog);
        match self.extractor.extract(&url).await {
            Ok(fragment) => {
                let record = ChangelogRecord::from_parts(product, &row, fragment);
                info!("✅ Scraped: {} {} - {}", record.product, record.version, record.title);
                outcome.new_records.push(record);
                // Marked immediately so a repeated row later in this run is skipped too
                outcome.ledger.insert(url);
            }
            Err(e) => {
                error!("❌ Error scraping {} {}: {}", product.title, row.version, e);
                outcome.summary.extraction_failures += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReleaseDataset;
    use crate::infrastructure::state_store::{StoreError, StoreResult};
    use crate::test_utils::StaticPageFetcher;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    const LANDING: &str = "https://releases.test/";

    /// Store with canned load results that records commits
    #[derive(Default)]
    struct RecordingStore {
        corrupt: bool,
        fail_commit: bool,
        initial: PersistedState,
        commits: Mutex<Vec<(ScrapedUrlLedger, ReleaseDataset)>>,
    }

    #[async_trait]
    impl StateStore for RecordingStore {
        async fn load(&self) -> StoreResult<PersistedState> {
            if self.corrupt {
                return Err(StoreError::Corrupt {
                    path: PathBuf::from("all-releases.json"),
                    reason: "trailing characters".to_string(),
                });
            }
            Ok(self.initial.clone())
        }

        async fn commit(&self, ledger: &ScrapedUrlLedger, dataset: &ReleaseDataset) -> StoreResult<()> {
            if self.fail_commit {
                return Err(StoreError::Io {
                    path: PathBuf::from("scraped-urls.json"),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.commits.lock().unwrap().push((ledger.clone(), dataset.clone()));
            Ok(())
        }
    }

    fn site() -> StaticPageFetcher {
        StaticPageFetcher::new()
            .with_landing(LANDING, &[("Platform", "https://releases.test/platform")])
            .with_release_table(
                "https://releases.test/platform",
                &[
                    ("2.0", "2024-02-01", Some("https://releases.test/c/2.0")),
                    ("1.9", "2024-01-01", None),
                    ("1.8", "2023-12-01", Some("https://releases.test/c/1.8")),
                ],
            )
            .with_changelog("https://releases.test/c/2.0", "Platform 2.0", &["Added A"])
            .with_changelog("https://releases.test/c/1.8", "Platform 1.8", &["Fixed B"])
    }

    fn orchestrator(fetcher: &StaticPageFetcher, store: RecordingStore) -> ScrapeOrchestrator<RecordingStore> {
        ScrapeOrchestrator::from_config(Arc::new(fetcher.clone()), store, &StaticPageFetcher::fast_config()).unwrap()
    }

    #[tokio::test]
    async fn test_run_commits_new_records_and_ledger() {
        let fetcher = site();
        let orchestrator = orchestrator(&fetcher, RecordingStore::default());

        let summary = orchestrator.run(LANDING).await.unwrap();
        assert_eq!(summary.new_record_count, 2);
        assert_eq!(summary.total_record_count, 2);
        assert_eq!(summary.rows_without_changelog, 1);
        assert_eq!(summary.products_discovered, 1);

        let commits = orchestrator.store.commits.lock().unwrap();
        assert_eq!(commits.len(), 1);
        let (ledger, dataset) = &commits[0];
        assert_eq!(
            ledger.iter().collect::<Vec<_>>(),
            ["https://releases.test/c/2.0", "https://releases.test/c/1.8"]
        );
        assert_eq!(dataset.records()[0].version, "2.0");
        assert_eq!(dataset.records()[1].changelog_content, vec!["Fixed B".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_state_aborts_before_any_fetch() {
        let fetcher = site();
        let orchestrator = orchestrator(
            &fetcher,
            RecordingStore {
                corrupt: true,
                ..RecordingStore::default()
            },
        );

        let err = orchestrator.run(LANDING).await.unwrap_err();
        assert!(matches!(err, HarvestError::PersistedStateCorrupt(_)));
        assert_eq!(fetcher.opened_pages(), 0);
        assert!(orchestrator.store.commits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_failure_is_reported_distinctly() {
        let fetcher = site();
        let orchestrator = orchestrator(
            &fetcher,
            RecordingStore {
                fail_commit: true,
                ..RecordingStore::default()
            },
        );

        let err = orchestrator.run(LANDING).await.unwrap_err();
        assert!(matches!(err, HarvestError::PersistenceFailure(_)));
    }

    #[tokio::test]
    async fn test_discovery_timeout_ends_run_without_commit() {
        let fetcher = StaticPageFetcher::new().with_page(LANDING, "<p>Down for maintenance</p>");
        let orchestrator = orchestrator(&fetcher, RecordingStore::default());

        let summary = orchestrator.run(LANDING).await.unwrap();
        assert_eq!(summary.new_record_count, 0);
        assert_eq!(summary.products_discovered, 0);
        assert!(orchestrator.store.commits.lock().unwrap().is_empty());
        assert_eq!(fetcher.opened_pages(), fetcher.closed_pages());
    }

    #[tokio::test]
    async fn test_harvest_skips_urls_already_in_ledger() {
        let fetcher = site();
        let orchestrator = orchestrator(&fetcher, RecordingStore::default());
        let ledger: ScrapedUrlLedger = vec!["https://releases.test/c/2.0".to_string()].into();

        let outcome = orchestrator.harvest(LANDING, ledger).await;
        assert_eq!(outcome.new_records.len(), 1);
        assert_eq!(outcome.new_records[0].version, "1.8");
        assert_eq!(outcome.summary.rows_already_scraped, 1);
        assert_eq!(outcome.ledger.len(), 2);
        assert!(!fetcher.navigations().contains(&"https://releases.test/c/2.0".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_row_within_run_is_extracted_once() {
        let fetcher = StaticPageFetcher::new()
            .with_landing(
                LANDING,
                &[
                    ("Platform", "https://releases.test/platform"),
                    ("Platform Pro", "https://releases.test/pro"),
                ],
            )
            .with_release_table(
                "https://releases.test/platform",
                &[("1.0", "2024-01-01", Some("https://releases.test/c/shared"))],
            )
            .with_release_table(
                "https://releases.test/pro",
                &[("1.0", "2024-01-01", Some("https://releases.test/c/shared"))],
            )
            .with_changelog("https://releases.test/c/shared", "Shared 1.0", &["x"]);
        let orchestrator = orchestrator(&fetcher, RecordingStore::default());

        let outcome = orchestrator.harvest(LANDING, ScrapedUrlLedger::new()).await;
        assert_eq!(outcome.new_records.len(), 1);
        assert_eq!(outcome.new_records[0].product, "Platform");
        assert_eq!(outcome.summary.rows_already_scraped, 1);
    }
}
