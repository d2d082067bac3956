//! End-to-end harvest runs against canned pages and real JSON files
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use rstest::rstest;
use serde_json::{Value, json};
use tempfile::TempDir;

use release_harvest_lib::application::{HarvestError, ScrapeOrchestrator};
use release_harvest_lib::domain::{ReleaseDataset, ScrapedUrlLedger};
use release_harvest_lib::infrastructure::state_store::{
    JsonStateStore, PersistedState, StateStore, StoreResult,
};
use release_harvest_lib::test_utils::{StaticPageFetcher, changelog_html};

const LANDING: &str = "https://releases.test/";
const URL_A: &str = "https://releases.test/a/";
const URL_B: &str = "https://releases.test/b/";
const CHANGELOG_A1: &str = "https://releases.test/a/v1/";

struct Workspace {
    _dir: TempDir,
    ledger: PathBuf,
    dataset: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("scraped-urls.json");
        let dataset = dir.path().join("all-releases.json");
        Self {
            _dir: dir,
            ledger,
            dataset,
        }
    }

    fn store(&self) -> JsonStateStore {
        JsonStateStore::new(&self.ledger, &self.dataset)
    }

    fn orchestrator(&self, site: &StaticPageFetcher) -> ScrapeOrchestrator<JsonStateStore> {
        ScrapeOrchestrator::from_config(Arc::new(site.clone()), self.store(), &StaticPageFetcher::fast_config())
            .unwrap()
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// Two products; only A has a release table
fn two_product_site() -> StaticPageFetcher {
    StaticPageFetcher::new()
        .with_landing(LANDING, &[("A", URL_A), ("B", URL_B)])
        .with_release_table(URL_A, &[("v1", "2024-01-01", Some(CHANGELOG_A1))])
        .with_page(URL_B, "<html><body><p>No releases yet</p></body></html>")
        .with_changelog(CHANGELOG_A1, "A v1", &["New dashboard", "Fixed login"])
}

#[tokio::test]
async fn first_run_writes_record_and_ledger_then_rerun_is_noop() {
    let workspace = Workspace::new();
    let site = two_product_site();

    let summary = workspace.orchestrator(&site).run(LANDING).await.unwrap();
    assert_eq!(summary.new_record_count, 1);
    assert_eq!(summary.total_record_count, 1);
    assert_eq!(summary.products_discovered, 2);
    assert_eq!(summary.products_skipped, 1);

    assert_eq!(
        read_json(&workspace.dataset),
        json!([{
            "product": "A",
            "version": "v1",
            "date": "2024-01-01",
            "title": "A v1",
            "changelogcontent": ["New dashboard", "Fixed login"]
        }])
    );
    assert_eq!(read_json(&workspace.ledger), json!([CHANGELOG_A1]));

    let dataset_before = std::fs::read(&workspace.dataset).unwrap();
    let ledger_before = std::fs::read(&workspace.ledger).unwrap();

    let rerun = workspace.orchestrator(&site).run(LANDING).await.unwrap();
    assert_eq!(rerun.new_record_count, 0);
    assert_eq!(rerun.total_record_count, 1);
    assert_eq!(rerun.rows_already_scraped, 1);
    assert_eq!(std::fs::read(&workspace.dataset).unwrap(), dataset_before);
    assert_eq!(std::fs::read(&workspace.ledger).unwrap(), ledger_before);
}

#[tokio::test]
async fn row_without_changelog_link_yields_no_record() {
    let workspace = Workspace::new();
    let site = StaticPageFetcher::new()
        .with_landing(LANDING, &[("A", URL_A)])
        .with_release_table(
            URL_A,
            &[
                ("v2", "2024-02-01", None),
                ("v1", "2024-01-01", Some(CHANGELOG_A1)),
            ],
        )
        .with_changelog(CHANGELOG_A1, "A v1", &["Initial release"]);

    let summary = workspace.orchestrator(&site).run(LANDING).await.unwrap();
    assert_eq!(summary.new_record_count, 1);
    assert_eq!(summary.rows_without_changelog, 1);
    assert_eq!(read_json(&workspace.ledger), json!([CHANGELOG_A1]));
}

#[tokio::test]
async fn failed_extraction_does_not_stop_later_rows_or_products() {
    let workspace = Workspace::new();
    let site = StaticPageFetcher::new()
        .with_landing(LANDING, &[("A", URL_A), ("B", URL_B)])
        .with_release_table(
            URL_A,
            &[
                ("v3", "2024-03-01", Some("https://releases.test/a/v3/")),
                ("v2", "2024-02-01", Some("https://releases.test/a/v2/")),
                ("v1", "2024-01-01", Some(CHANGELOG_A1)),
            ],
        )
        .with_release_table(URL_B, &[("b1", "2024-01-05", Some("https://releases.test/b/b1/"))])
        .with_changelog("https://releases.test/a/v3/", "A v3", &["three"])
        // v2 has no title: extraction error
        .with_page("https://releases.test/a/v2/", "<div class=\"entry-reference\"><ul><li>two</li></ul></div>")
        .with_changelog(CHANGELOG_A1, "A v1", &["one"])
        .with_changelog("https://releases.test/b/b1/", "B b1", &["bee"]);

    let summary = workspace.orchestrator(&site).run(LANDING).await.unwrap();
    assert_eq!(summary.new_record_count, 3);
    assert_eq!(summary.extraction_failures, 1);

    let titles: Vec<Value> = read_json(&workspace.dataset)
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["title"].clone())
        .collect();
    assert_eq!(titles, [json!("A v3"), json!("A v1"), json!("B b1")]);

    // The failed URL stays out of the ledger so the next run retries it
    let ledger = read_json(&workspace.ledger);
    assert!(!ledger.as_array().unwrap().contains(&json!("https://releases.test/a/v2/")));
    assert_eq!(site.opened_pages(), site.closed_pages());
}

#[tokio::test]
async fn later_runs_append_after_existing_records() {
    let workspace = Workspace::new();
    let site = two_product_site();
    workspace.orchestrator(&site).run(LANDING).await.unwrap();

    site.set_page(
        URL_A,
        release_harvest_lib::test_utils::release_table_html(&[
            ("v2", "2024-02-01", Some("https://releases.test/a/v2/")),
            ("v1", "2024-01-01", Some(CHANGELOG_A1)),
        ]),
    );
    site.set_page("https://releases.test/a/v2/", changelog_html("A v2", &["Second"]));

    let summary = workspace.orchestrator(&site).run(LANDING).await.unwrap();
    assert_eq!(summary.new_record_count, 1);
    assert_eq!(summary.total_record_count, 2);

    let dataset = read_json(&workspace.dataset);
    assert_eq!(dataset[0]["version"], "v1");
    assert_eq!(dataset[1]["version"], "v2");
    assert_eq!(read_json(&workspace.ledger), json!([CHANGELOG_A1, "https://releases.test/a/v2/"]));
}

#[tokio::test]
async fn unreachable_release_index_skips_only_that_product() {
    let workspace = Workspace::new();
    let site = two_product_site()
        .with_release_table(URL_B, &[("b1", "2024-01-05", Some("https://releases.test/b/b1/"))])
        .with_changelog("https://releases.test/b/b1/", "B b1", &["bee"]);
    site.remove_page(URL_A);

    let summary = workspace.orchestrator(&site).run(LANDING).await.unwrap();
    assert_eq!(summary.products_skipped, 1);
    assert_eq!(summary.new_record_count, 1);
    assert_eq!(read_json(&workspace.dataset)[0]["product"], "B");
}

#[rstest]
#[case::listing_never_appears("<html><body><p>Maintenance</p></body></html>")]
#[case::cards_without_links(
    r#"<div class="release-dir-items-wrap model"><h3 class="model-title">A</h3></div>"#
)]
#[tokio::test]
async fn landing_without_usable_products_commits_nothing(#[case] landing: &str) {
    let workspace = Workspace::new();
    let site = StaticPageFetcher::new().with_page(LANDING, landing);

    let summary = workspace.orchestrator(&site).run(LANDING).await.unwrap();
    assert_eq!(summary.new_record_count, 0);
    assert!(!workspace.dataset.exists());
    assert!(!workspace.ledger.exists());
}

#[tokio::test]
async fn corrupt_dataset_aborts_before_scraping() {
    let workspace = Workspace::new();
    std::fs::write(&workspace.dataset, "[{\"product\": ").unwrap();
    let site = two_product_site();

    let err = workspace.orchestrator(&site).run(LANDING).await.unwrap_err();
    assert!(matches!(err, HarvestError::PersistedStateCorrupt(_)));
    assert!(site.navigations().is_empty());
    assert_eq!(std::fs::read_to_string(&workspace.dataset).unwrap(), "[{\"product\": ");
}

/// Loads from one place and commits to another
struct SplitStore {
    source: JsonStateStore,
    target: JsonStateStore,
}

#[async_trait]
impl StateStore for SplitStore {
    async fn load(&self) -> StoreResult<PersistedState> {
        self.source.load().await
    }

    async fn commit(&self, ledger: &ScrapedUrlLedger, dataset: &ReleaseDataset) -> StoreResult<()> {
        self.target.commit(ledger, dataset).await
    }
}

#[tokio::test]
async fn ledger_write_failure_leaves_previous_files_intact() {
    let workspace = Workspace::new();
    std::fs::write(&workspace.dataset, "[]").unwrap();

    // A non-empty directory where the ledger should go cannot be replaced
    let blocked = tempfile::tempdir().unwrap();
    let ledger_dir = blocked.path().join("scraped-urls.json");
    std::fs::create_dir(&ledger_dir).unwrap();
    std::fs::write(ledger_dir.join("keep"), "x").unwrap();

    let store = SplitStore {
        source: workspace.store(),
        target: JsonStateStore::new(&ledger_dir, &workspace.dataset),
    };
    let site = two_product_site();
    let orchestrator =
        ScrapeOrchestrator::from_config(Arc::new(site.clone()), store, &StaticPageFetcher::fast_config()).unwrap();

    let err = orchestrator.run(LANDING).await.unwrap_err();
    assert!(matches!(err, HarvestError::PersistenceFailure(_)));
    assert_eq!(std::fs::read_to_string(&workspace.dataset).unwrap(), "[]");
    assert!(ledger_dir.join("keep").exists());
}
