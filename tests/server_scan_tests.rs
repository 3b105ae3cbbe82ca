//! Workspace discovery and the two-tier symbol-search policy: raw text
//! scan while the index is empty, index authoritative afterwards.

use dws_language_server::analysis::Engine;
use tower_lsp::lsp_types::Url;

#[test]
fn test_fallback_scan_during_indexing_race() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("main.dws"),
        "function testFunc: Integer;\nbegin\nend;\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("unit.pas"), "var globalVar: Integer;\n").unwrap();
    std::fs::write(dir.path().join("notes.md"), "function decoy;\n").unwrap();

    let engine = Engine::new();
    engine.set_workspace_folders(vec![dir.path().to_path_buf()]);

    // Nothing indexed yet: the raw text scan answers.
    let hits = engine.search_symbols("test", 500);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "testFunc");

    let all = engine.search_symbols("", 500);
    let names: Vec<&str> = all.iter().map(|s| s.name.as_str()).collect();
    assert!(names.contains(&"testFunc"));
    assert!(names.contains(&"globalVar"));
    assert!(!names.contains(&"decoy"), "non-source files are skipped");
}

#[test]
fn test_index_becomes_authoritative_once_populated() {
    let dir = tempfile::tempdir().unwrap();
    // On-disk file mentions `diskOnly`; it is never indexed.
    std::fs::write(dir.path().join("stale.dws"), "var diskOnly: Integer;\n").unwrap();

    let engine = Engine::new();
    engine.set_workspace_folders(vec![dir.path().to_path_buf()]);

    let uri = Url::parse("file:///ws/open.dws").unwrap();
    engine.open_document(uri, "var liveVar: Integer;\n", 1);

    // The index has entries now, so the fallback scan must not run.
    let disk = engine.search_symbols("diskOnly", 500);
    assert!(disk.is_empty());
    let live = engine.search_symbols("liveVar", 500);
    assert_eq!(live.len(), 1);
}

#[test]
fn test_index_unopened_file_skips_unparsable_sources() {
    let engine = Engine::new();
    let good = Url::parse("file:///ws/good.dws").unwrap();
    let bad = Url::parse("file:///ws/bad.dws").unwrap();

    assert!(engine.index_unopened_file(&good, "var ok: Integer;\n"));
    assert!(!engine.index_unopened_file(&bad, "begin oops"));

    assert_eq!(engine.index.find_by_name("ok").len(), 1);
    assert!(!engine.index.is_empty());
}

#[test]
fn test_scan_results_truncate_at_limit() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = String::new();
    for i in 0..20 {
        source.push_str(&format!("var item{i}: Integer;\n"));
    }
    std::fs::write(dir.path().join("many.dws"), source).unwrap();

    let engine = Engine::new();
    engine.set_workspace_folders(vec![dir.path().to_path_buf()]);

    assert_eq!(engine.search_symbols("item", 5).len(), 5);
    assert_eq!(engine.search_symbols("item", 500).len(), 20);
}
