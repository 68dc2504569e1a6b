use quip_core::settings::Settings;
use quip_core::{
    FileStore, ImportMode, QueryStore, QuipError, Snippet, SnippetDraft, SnippetId, SqliteStore,
};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

/// Both backends, opened fresh in their own directory.
fn backends(dir: &TempDir) -> Vec<Box<dyn QueryStore>> {
    vec![
        Box::new(FileStore::open(dir.path().join("snippets.json")).unwrap()),
        Box::new(SqliteStore::open(dir.path().join("quip.db")).unwrap()),
    ]
}

fn empty_backends(dir: &TempDir) -> Vec<Box<dyn QueryStore>> {
    let mut stores = backends(dir);
    for store in stores.iter_mut() {
        store.import(vec![], ImportMode::Replace).unwrap();
    }
    stores
}

/// Everything but the fields each instance assigns on its own.
fn shape(snippets: &[Snippet]) -> Vec<(String, String, String, Option<String>, u64)> {
    snippets
        .iter()
        .map(|s| {
            (
                s.name.clone(),
                s.body.clone(),
                s.category.clone(),
                s.description.clone(),
                s.usage_count,
            )
        })
        .collect()
}

/// Keep consecutive mutations on distinct timestamps.
fn tick() {
    thread::sleep(Duration::from_millis(3));
}

fn run_script(store: &mut dyn QueryStore) -> Vec<Snippet> {
    let seeded = store.list_all().unwrap();

    let select = store
        .add(SnippetDraft::new("Select all", "SELECT * FROM t", "Dev"))
        .unwrap();
    tick();
    let report = store
        .add(SnippetDraft::new("Monthly report", "SELECT month, total FROM r", "Reports").with_description("Totals"))
        .unwrap();
    tick();
    let scratch = store
        .add(SnippetDraft::new("Scratch", "SELECT 1", "Dev"))
        .unwrap();
    tick();
    store.increment_usage(select.id).unwrap();
    tick();
    store.increment_usage(seeded[seeded.len() - 1].id).unwrap();
    tick();
    store
        .update(
            report.id,
            SnippetDraft::new("Monthly report v2", "SELECT month, sum(total) FROM r", "reports"),
        )
        .unwrap();
    tick();
    store.delete(scratch.id).unwrap();
    tick();
    store.increment_usage(select.id).unwrap();

    store.list_all().unwrap()
}

#[test]
fn replaying_a_script_gives_the_same_listing_on_every_backend() {
    let dir = TempDir::new().unwrap();
    let mut results = backends(&dir)
        .iter_mut()
        .map(|store| shape(&run_script(store.as_mut())))
        .collect::<Vec<_>>();

    let relational = results.pop().unwrap();
    let file = results.pop().unwrap();
    assert_eq!(file, relational);
    assert_eq!(file[0].0, "Select all");
    assert_eq!(file[0].4, 2);
}

#[test]
fn add_then_get_returns_an_unused_snippet() {
    let dir = TempDir::new().unwrap();
    for mut store in backends(&dir) {
        let added = store
            .add(SnippetDraft::new("Locks", "SELECT * FROM locks", "DBA").with_description("who holds what"))
            .unwrap();
        let fetched = store.get(added.id).unwrap().expect("snippet should exist");

        assert_eq!(fetched, added, "backend {}", store.backend_name());
        assert_eq!(fetched.usage_count, 0);
        assert_eq!(fetched.created_at, fetched.last_used);
    }
}

#[test]
fn add_rejects_blank_required_fields() {
    let dir = TempDir::new().unwrap();
    for mut store in empty_backends(&dir) {
        for draft in [
            SnippetDraft::new(" ", "SELECT 1", "Dev"),
            SnippetDraft::new("name", "", "Dev"),
            SnippetDraft::new("name", "SELECT 1", "\t"),
        ] {
            assert!(matches!(store.add(draft), Err(QuipError::Validation(_))));
        }
        assert!(store.list_all().unwrap().is_empty(), "backend {}", store.backend_name());
    }
}

#[test]
fn usage_increments_are_monotonic() {
    let dir = TempDir::new().unwrap();
    for mut store in backends(&dir) {
        let added = store.add(SnippetDraft::new("Counter", "SELECT 1", "Dev")).unwrap();

        let mut last_used = added.last_used;
        for n in 1..=5u64 {
            store.increment_usage(added.id).unwrap();
            let current = store.get(added.id).unwrap().unwrap();
            assert_eq!(current.usage_count, n);
            assert!(current.last_used >= last_used);
            assert_eq!(current.created_at, added.created_at);
            last_used = current.last_used;
        }

        let missing = SnippetId::new();
        assert!(matches!(store.increment_usage(missing), Err(QuipError::NotFound(id)) if id == missing));
    }
}

#[test]
fn update_leaves_usage_and_timestamps_alone() {
    let dir = TempDir::new().unwrap();
    for mut store in backends(&dir) {
        let added = store.add(SnippetDraft::new("Before", "SELECT 1", "Dev")).unwrap();
        store.increment_usage(added.id).unwrap();
        let used = store.get(added.id).unwrap().unwrap();

        store
            .update(added.id, SnippetDraft::new("After", "SELECT 2", "Ops").with_description("moved"))
            .unwrap();
        let updated = store.get(added.id).unwrap().unwrap();

        assert_eq!(updated.name, "After");
        assert_eq!(updated.body, "SELECT 2");
        assert_eq!(updated.category, "Ops");
        assert_eq!(updated.description.as_deref(), Some("moved"));
        assert_eq!(updated.usage_count, used.usage_count);
        assert_eq!(updated.created_at, used.created_at);
        assert_eq!(updated.last_used, used.last_used);

        assert!(matches!(
            store.update(SnippetId::new(), SnippetDraft::new("x", "y", "z")),
            Err(QuipError::NotFound(_))
        ));
    }
}

#[test]
fn delete_is_idempotent() {
    let dir = TempDir::new().unwrap();
    for mut store in backends(&dir) {
        let added = store.add(SnippetDraft::new("Gone", "SELECT 1", "Dev")).unwrap();
        let before = store.list_all().unwrap().len();

        store.delete(added.id).unwrap();
        store.delete(added.id).unwrap();
        store.delete(SnippetId::new()).unwrap();

        assert_eq!(store.list_all().unwrap().len(), before - 1);
        assert!(store.get(added.id).unwrap().is_none());
    }
}

#[test]
fn blank_search_equals_list_all() {
    let dir = TempDir::new().unwrap();
    for store in backends(&dir) {
        let all = store.list_all().unwrap();
        assert!(!all.is_empty());
        assert_eq!(store.search("").unwrap(), all);
        assert_eq!(store.search("   ").unwrap(), all);
    }
}

#[test]
fn search_matches_any_field_ignoring_case() {
    let dir = TempDir::new().unwrap();
    let mut listings = Vec::new();
    for mut store in empty_backends(&dir) {
        let by_name = store.add(SnippetDraft::new("Orders by day", "SELECT 1", "Reports")).unwrap();
        tick();
        store.add(SnippetDraft::new("Body hit", "select * from ORDERS", "Dev")).unwrap();
        tick();
        store
            .add(SnippetDraft::new("Description hit", "SELECT 2", "Dev").with_description("counts orders"))
            .unwrap();
        tick();
        store.add(SnippetDraft::new("Category hit", "SELECT 3", "orders-team")).unwrap();
        tick();
        store.add(SnippetDraft::new("Unrelated", "SELECT 4", "Dev")).unwrap();
        tick();
        store.increment_usage(by_name.id).unwrap();

        let hits = store.search("oRdErS").unwrap();
        let names: Vec<_> = hits.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            ["Orders by day", "Category hit", "Description hit", "Body hit"],
            "backend {}",
            store.backend_name()
        );
        listings.push(shape(&hits));
    }
    assert_eq!(listings[0], listings[1]);
}

#[test]
fn category_listing_is_case_insensitive_and_sorted_by_name() {
    let dir = TempDir::new().unwrap();
    for mut store in empty_backends(&dir) {
        store.add(SnippetDraft::new("zeta", "SELECT 1", "Dev")).unwrap();
        store.add(SnippetDraft::new("alpha", "SELECT 2", "DEV")).unwrap();
        store.add(SnippetDraft::new("Mid", "SELECT 3", "dev")).unwrap();
        store.add(SnippetDraft::new("other", "SELECT 4", "Developer")).unwrap();

        let names: Vec<_> = store
            .list_by_category("Dev")
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["alpha", "Mid", "zeta"], "backend {}", store.backend_name());
    }
}

#[test]
fn removing_a_category_leaves_its_snippets_reachable() {
    let dir = TempDir::new().unwrap();
    let mut settings = Settings::default();
    let mut stores = empty_backends(&dir);
    let filed: Vec<_> = stores
        .iter_mut()
        .map(|store| store.add(SnippetDraft::new("Filed", "SELECT 1", "Reports")).unwrap())
        .collect();

    assert!(settings.remove_category("Reports"));
    assert!(settings.find_category("Reports").is_none());

    for (store, filed) in stores.iter().zip(filed) {
        let fetched = store.get(filed.id).unwrap().unwrap();
        assert_eq!(fetched.category, "Reports");
        let listed = store.list_by_category("Reports").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, filed.id);
    }
}

#[test]
fn mutations_are_visible_after_reopening() {
    let dir = TempDir::new().unwrap();
    let (file_id, sql_id) = {
        let mut file = FileStore::open(dir.path().join("snippets.json")).unwrap();
        let mut sql = SqliteStore::open(dir.path().join("quip.db")).unwrap();
        let a = file.add(SnippetDraft::new("Durable", "SELECT 1", "Dev")).unwrap();
        let b = sql.add(SnippetDraft::new("Durable", "SELECT 1", "Dev")).unwrap();
        file.increment_usage(a.id).unwrap();
        sql.increment_usage(b.id).unwrap();
        (a.id, b.id)
    };

    let file = FileStore::open(dir.path().join("snippets.json")).unwrap();
    let sql = SqliteStore::open(dir.path().join("quip.db")).unwrap();
    assert_eq!(file.get(file_id).unwrap().unwrap().usage_count, 1);
    assert_eq!(sql.get(sql_id).unwrap().unwrap().usage_count, 1);
}
