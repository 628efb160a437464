use debuginfo_core::db::{
    BinaryRecord, DbError, ParseRunRecord, ParseRunStatus, ProjectDb, ProjectLayout,
    CURRENT_SCHEMA_VERSION,
};
use debuginfo_core::types::{Enumeration, Structure};
use debuginfo_core::{DebugFunctionInfo, DebugInfo, Type};
use rusqlite::Connection;
use tempfile::tempdir;

fn run(binary: &str, parser: &str, status: ParseRunStatus) -> ParseRunRecord {
    ParseRunRecord {
        binary: binary.to_string(),
        parser: parser.to_string(),
        status,
        types_added: 0,
        functions_added: 0,
        message: None,
        started_at: "2024-01-01T00:00:00Z".into(),
        finished_at: "2024-01-01T00:00:01Z".into(),
    }
}

fn sample_info() -> DebugInfo {
    let mut header = Structure::new(Some("header".into()));
    header.push_member("magic", Type::int(4, false), 0);
    header.push_member("flags", Type::int(2, false), 4);
    let mut color = Enumeration::new(Some("color".into()), 4);
    color.push_member("RED", 0);
    color.push_member("GREEN", 1);

    let mut info = DebugInfo::new();
    info.add_type("header", Type::Structure(header));
    info.add_type("color", Type::Enumeration(color));
    info.add_function(DebugFunctionInfo::new(
        "read_header",
        "io::read_header",
        "_ZN2io11read_headerE",
        0x4010,
        Some(Type::pointer(Type::named("header"), 8)),
        vec![
            ("fd".to_string(), Type::int(4, true)),
            ("buf".to_string(), Type::pointer(Type::int(1, false), 8)),
        ],
    ));
    info.add_function(DebugFunctionInfo::new("noop", "", "", 0x4000, None, Vec::new()));
    info
}

#[test]
fn project_db_initializes_schema_and_reopens() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("project.db");

    {
        let db = ProjectDb::open(&db_path).expect("open db");
        assert_eq!(db.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
        let mut bin = BinaryRecord::new("libgame.so", "bin/libgame.so");
        bin.hash = Some("abc".into());
        assert!(db.insert_binary(&bin).expect("insert binary") > 0);
    }

    let db = ProjectDb::open(&db_path).expect("re-open db");
    let version: i32 =
        db.connection().query_row("PRAGMA user_version;", [], |row| row.get(0)).unwrap();
    assert_eq!(version, 3);
    let binaries = db.list_binaries().unwrap();
    assert_eq!(binaries.len(), 1);
    assert_eq!(binaries[0].hash.as_deref(), Some("abc"));
    assert_eq!(db.find_binary("libgame.so").unwrap(), Some(binaries[0].clone()));
    assert_eq!(db.find_binary("other.so").unwrap(), None);
}

#[test]
fn binary_names_are_unique() {
    let db = ProjectDb::open_in_memory().unwrap();
    db.insert_binary(&BinaryRecord::new("a.out", "a.out")).unwrap();
    assert!(matches!(
        db.insert_binary(&BinaryRecord::new("a.out", "elsewhere/a.out")),
        Err(DbError::Sql(_))
    ));
}

#[test]
fn debug_info_round_trips_through_a_run() {
    let db = ProjectDb::open_in_memory().unwrap();
    let run_id = db.insert_parse_run(&run("libgame.so", "dwarf", ParseRunStatus::Succeeded)).unwrap();
    let original = sample_info();
    db.insert_debug_info(run_id, &original).unwrap();

    let loaded = db.load_debug_info(run_id).unwrap();
    assert_eq!(loaded.type_count(), 2);
    assert_eq!(loaded.get_type("header"), original.get_type("header"));
    assert_eq!(loaded.get_type("color"), original.get_type("color"));
    assert_eq!(loaded.type_source("header"), Some("dwarf"));

    let read_header = loaded.function_at(0x4010).expect("read_header");
    assert_eq!(read_header, original.function_at(0x4010).unwrap());
    assert_eq!(read_header.parameters()[1].0, "buf");
    assert_eq!(loaded.function_at(0x4000).unwrap().return_type(), &Type::Void);
    assert_eq!(loaded.function_source(0x4000), Some("dwarf"));
}

#[test]
fn unknown_runs_are_reported() {
    let db = ProjectDb::open_in_memory().unwrap();
    assert!(matches!(db.load_debug_info(42), Err(DbError::UnknownRun(42))));
}

#[test]
fn latest_runs_pick_newest_per_parser() {
    let db = ProjectDb::open_in_memory().unwrap();
    let first = db.insert_parse_run(&run("bin", "symbols", ParseRunStatus::Succeeded)).unwrap();
    let other = db.insert_parse_run(&run("bin", "dwarf", ParseRunStatus::Failed)).unwrap();
    let second = db.insert_parse_run(&run("bin", "symbols", ParseRunStatus::Succeeded)).unwrap();
    db.insert_parse_run(&run("other-bin", "symbols", ParseRunStatus::Succeeded)).unwrap();

    assert_eq!(db.latest_run_id("bin", "symbols").unwrap(), Some(second));
    assert_ne!(first, second);
    assert_eq!(db.latest_run_id("bin", "pdb").unwrap(), None);
    assert_eq!(
        db.latest_runs_for_binary("bin").unwrap(),
        vec![(other, "dwarf".to_string()), (second, "symbols".to_string())]
    );

    let runs = db.list_parse_runs(Some("bin")).unwrap();
    assert_eq!(runs.len(), 3);
    assert_eq!(runs[1].status, ParseRunStatus::Failed);
    assert_eq!(db.list_parse_runs(None).unwrap().len(), 4);
}

#[test]
fn project_db_open_errors_on_unsupported_schema_version() {
    let tmp = tempdir().expect("temp dir");
    let layout = ProjectLayout::new(tmp.path());
    std::fs::create_dir_all(&layout.meta_dir).expect("create meta dir");

    {
        let conn = Connection::open(&layout.db_path).expect("open raw sqlite db");
        conn.pragma_update(None, "user_version", 99_i32).expect("set user_version pragma");
    }

    match ProjectDb::open(&layout.db_path) {
        Err(DbError::UnsupportedSchemaVersion { found, min_supported, max_supported }) => {
            assert_eq!(found, 99);
            assert_eq!(min_supported, 0);
            assert_eq!(max_supported, CURRENT_SCHEMA_VERSION);
        }
        Err(err) => panic!("expected UnsupportedSchemaVersion, got {err}"),
        Ok(_) => panic!("expected UnsupportedSchemaVersion, got Ok(_)"),
    }
}

#[test]
fn run_status_parses_case_insensitively() {
    assert_eq!("FAILED".parse::<ParseRunStatus>().unwrap(), ParseRunStatus::Failed);
    assert!("pending".parse::<ParseRunStatus>().is_err());
}

#[test]
fn record_run_stores_run_and_debug_info_together() {
    let db = ProjectDb::open_in_memory().unwrap();
    let run_id =
        db.record_run(&run("libgame.so", "dwarf", ParseRunStatus::Succeeded), &sample_info()).unwrap();

    assert_eq!(db.latest_run_id("libgame.so", "dwarf").unwrap(), Some(run_id));
    let loaded = db.load_debug_info(run_id).unwrap();
    assert_eq!(loaded.type_count(), 2);
    assert_eq!(loaded.function_count(), 2);
}

#[test]
fn record_run_rolls_back_the_run_when_debug_rows_fail() {
    let db = ProjectDb::open_in_memory().unwrap();
    db.connection().execute_batch("DROP TABLE debug_functions;").unwrap();

    let result = db.record_run(&run("libgame.so", "dwarf", ParseRunStatus::Succeeded), &sample_info());
    assert!(matches!(result, Err(DbError::Sql(_))));
    assert!(db.list_parse_runs(None).unwrap().is_empty());
    let types: i64 =
        db.connection().query_row("SELECT COUNT(*) FROM debug_types", [], |row| row.get(0)).unwrap();
    assert_eq!(types, 0);
}
