//! End-to-end runs through the pipeline with file-backed stores and an
//! in-memory record source.

use std::cell::RefCell;

use serde_json::{json, Value};
use tablesync_core::{store, Dataset, DatasetStore, FileDatasetStore, Row, TableId};
use tablesync_renderer::Renderer;
use tablesync_sync::{
    pipeline, run_log, watermark, FetchError, FileWatermarkStore, Mode, RebuildReason,
    RecordSource, SkipStatusSet, SyncContext, SyncError, WatermarkStore,
};
use tempfile::TempDir;

const TABLE: TableId = TableId(7);

/// Record source whose payload can be swapped between runs.
struct Scripted(RefCell<Result<Vec<Value>, u16>>);

impl Scripted {
    fn ok(records: Vec<Value>) -> Self {
        Scripted(RefCell::new(Ok(records)))
    }

    fn replace(&self, records: Vec<Value>) {
        *self.0.borrow_mut() = Ok(records);
    }

    fn fail(&self, code: u16) {
        *self.0.borrow_mut() = Err(code);
    }
}

impl RecordSource for Scripted {
    fn fetch(&self) -> Result<Vec<Value>, FetchError> {
        match &*self.0.borrow() {
            Ok(records) => Ok(records.clone()),
            Err(code) => Err(FetchError::Status {
                code: *code,
                body: "upstream down".to_string(),
            }),
        }
    }
}

struct Harness {
    home: TempDir,
    source: Scripted,
    renderer: Renderer,
    filter: SkipStatusSet,
}

impl Harness {
    fn new(records: Vec<Value>) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let home = TempDir::new().expect("home");
        store::init_table_at(home.path(), TABLE, Some("Apps")).expect("init table");
        Harness {
            home,
            source: Scripted::ok(records),
            renderer: Renderer::new().expect("renderer"),
            filter: SkipStatusSet::default(),
        }
    }

    fn sync(&self, dry_run: bool, force: bool) -> Result<tablesync_sync::ReconcileOutcome, SyncError> {
        let datasets = FileDatasetStore::at(self.home.path());
        let watermarks = FileWatermarkStore::at(self.home.path());
        let ctx = SyncContext {
            source: &self.source,
            datasets: &datasets,
            watermarks: &watermarks,
            renderer: &self.renderer,
            filter: &self.filter,
        };
        pipeline::run_and_record(self.home.path(), &ctx, TABLE, dry_run, force)
    }

    fn table(&self) -> Dataset {
        FileDatasetStore::at(self.home.path()).load(TABLE).expect("load")
    }

    fn keys(&self) -> Vec<String> {
        self.table().rows.iter().map(|r| r.key().to_string()).collect()
    }

    fn watermark(&self) -> String {
        watermark::get_at(self.home.path(), TABLE).expect("watermark")
    }
}

fn app(id: &str, students: &str, updated: &str) -> Value {
    json!({
        "number": id,
        "name": format!("App {id}"),
        "educators": "Hyväksytty",
        "students": students,
        "chargeable": "Maksuton",
        "subjects": ["Math"],
        "departments": ["Koulu 2", "Koulu 10"],
        "educatorDescription": "",
        "studentDescription": "",
        "updated": updated
    })
}

fn rejected(id: &str, updated: &str) -> Value {
    json!({
        "number": id,
        "educators": "ei käsitelty",
        "students": "TARKASTETTAVANA",
        "updated": updated
    })
}

#[test]
fn first_run_rebuilds_then_second_run_is_idempotent() {
    let h = Harness::new(vec![
        app("1", "Hyväksytty", "01.03.2024 10:00:00"),
        rejected("2", "05.03.2024 10:00:00"),
        app("3", "Hyväksytty", "02.03.2024 10:00:00"),
    ]);

    let first = h.sync(false, false).expect("first run");
    assert_eq!(first.mode, Mode::Rebuild(RebuildReason::NoWatermark));
    assert_eq!((first.row_count, first.updated_count), (2, 2));
    assert_eq!(h.keys(), ["1", "3"]);
    assert_eq!(h.watermark(), "2024-03-05 10:00:00");

    let table = h.table();
    assert_eq!(table.header[0], "Number");
    assert_eq!(table.visibility, json!({"columns": [1]}));
    assert_eq!(table.name(), Some("Apps"));
    assert_eq!(table.rows[0].cells().len(), 9);

    let second = h.sync(false, false).expect("second run");
    assert_eq!(second.mode, Mode::Incremental);
    assert_eq!(second.updated_count, 0);
    assert_eq!(h.table().rows, table.rows);
}

#[test]
fn incremental_updates_in_place_and_appends_sorted_inserts() {
    let h = Harness::new(vec![
        app("A", "Hyväksytty", "01.03.2024 10:00:00"),
        app("C", "Hyväksytty", "01.03.2024 10:00:00"),
    ]);
    h.sync(false, false).expect("seed");
    let seeded = h.table();

    h.source.replace(vec![
        app("C", "Hyväksytty", "01.03.2024 10:00:00"),
        app("b10", "Hyväksytty", "02.03.2024 09:00:00"),
        app("A", "Hylätty", "02.03.2024 08:00:00"),
        app("B2", "Hyväksytty", "02.03.2024 09:00:00"),
    ]);
    let out = h.sync(false, false).expect("incremental");
    assert_eq!(out.updated_count, 3);
    assert_eq!(h.keys(), ["A", "C", "B2", "b10"]);

    let table = h.table();
    assert!(table.rows[0].cells()[3].contains("tp-badge-hylatty"));
    assert_eq!(table.rows[1], seeded.rows[1]);
    assert_eq!(h.watermark(), "2024-03-02 09:00:00");
}

#[test]
fn rejected_records_never_appear() {
    let h = Harness::new(vec![rejected("X", "01.03.2024 10:00:00")]);
    h.sync(false, false).expect("rebuild");
    assert!(h.keys().is_empty());

    h.source.replace(vec![rejected("X", "09.03.2024 10:00:00")]);
    h.sync(false, false).expect("incremental");
    assert!(h.keys().is_empty());

    h.sync(false, true).expect("forced");
    assert!(h.keys().is_empty());
}

#[test]
fn dry_run_leaves_table_and_watermark_untouched() {
    let h = Harness::new(vec![app("1", "Hyväksytty", "01.03.2024 10:00:00")]);
    let table_path = store::table_path_at(h.home.path(), TABLE);
    let before = std::fs::read_to_string(&table_path).expect("read table");

    let dry = h.sync(true, false).expect("dry run");
    assert!(dry.dry_run);
    assert_eq!(std::fs::read_to_string(&table_path).expect("read table"), before);
    assert_eq!(h.watermark(), "");
    assert!(!watermark::store_path_at(h.home.path()).exists());

    let real = h.sync(false, false).expect("real run");
    assert_eq!(
        (dry.row_count, dry.updated_count),
        (real.row_count, real.updated_count)
    );

    let logged = run_log::load_at(h.home.path()).expect("log").expect("entry");
    assert!(logged.success);
    assert_eq!(logged.message, "Table updated. Rows: 1. Updated items: 1");
}

#[test]
fn watermark_never_decreases() {
    let h = Harness::new(vec![app("1", "Hyväksytty", "10.03.2024 10:00:00")]);
    h.sync(false, false).expect("first");
    assert_eq!(h.watermark(), "2024-03-10 10:00:00");

    // A forced rebuild over older data keeps the stored watermark.
    h.source.replace(vec![app("1", "Hyväksytty", "01.01.2024 10:00:00")]);
    h.sync(false, true).expect("forced");
    assert_eq!(h.watermark(), "2024-03-10 10:00:00");
}

#[test]
fn schema_drift_forces_rebuild_with_default_header() {
    let h = Harness::new(vec![app("1", "Hyväksytty", "01.03.2024 10:00:00")]);
    let mut drifted = h.table();
    drifted.header = vec!["Id".to_string(), "Name".to_string()];
    drifted.rows = vec![Row::from(vec!["old", "row"])];
    store::save_table_at(h.home.path(), &drifted).expect("save");
    FileWatermarkStore::at(h.home.path())
        .set(TABLE, "2024-01-01 00:00:00")
        .expect("set watermark");

    let out = h.sync(false, false).expect("run");
    assert_eq!(out.mode, Mode::Rebuild(RebuildReason::SchemaDrift));
    assert_eq!(h.keys(), ["1"]);
    assert_eq!(h.table().header[0], "Number");
    assert_eq!(h.table().header.len(), 9);
}

#[test]
fn fetch_failure_is_recorded_and_changes_nothing() {
    let h = Harness::new(vec![app("1", "Hyväksytty", "01.03.2024 10:00:00")]);
    h.sync(false, false).expect("seed");
    let wm = h.watermark();

    h.source.fail(503);
    let err = h.sync(false, false).unwrap_err();
    assert!(matches!(err, SyncError::Fetch(FetchError::Status { code: 503, .. })));
    assert_eq!(h.watermark(), wm);
    assert_eq!(h.keys(), ["1"]);

    let logged = run_log::load_at(h.home.path()).expect("log").expect("entry");
    assert!(!logged.success);
    assert!(logged.message.contains("HTTP 503 - upstream down"), "got: {}", logged.message);
}
