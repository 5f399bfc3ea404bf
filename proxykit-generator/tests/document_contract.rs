use chrono::{Local, TimeZone};
use proxykit_generator::palette::{COLORS, ICONS};
use proxykit_generator::{
    build_document, write_document, ConfigDocument, Credentials, GeneratorError, GeneratorOptions,
};
use regex::Regex;

fn options(count: u32) -> GeneratorOptions {
    GeneratorOptions::new("na.proxys5.net", 6200, "US", count)
}

#[test]
fn produces_n_entries_titled_in_order() {
    let doc = build_document(&options(7), &Credentials::new("u", "p")).unwrap();
    assert_eq!(doc.data.len(), 7);
    for (i, entry) in doc.data.iter().enumerate() {
        assert!(
            entry.title.starts_with(&format!("{} ", i + 1)),
            "entry {i} titled {}",
            entry.title
        );
    }
}

#[test]
fn colors_and_icons_cycle_by_index() {
    let doc = build_document(&options(16), &Credentials::new("u", "p")).unwrap();
    for (i, entry) in doc.data.iter().enumerate() {
        assert_eq!(entry.color, COLORS[i % 15]);
        assert_eq!(entry.title, format!("{} {}", i + 1, ICONS[i % 12]));
    }
    assert_eq!(doc.data[15].color, COLORS[0]);
    assert!(doc.data[15].title.ends_with(ICONS[3]));
}

#[test]
fn derived_username_matches_provider_template() {
    let doc = build_document(&options(1), &Credentials::new("u", "p")).unwrap();
    let re = Regex::new(r"^u-region-US-sessid-[A-Za-z0-9]{8}-sessTime-15$").unwrap();
    assert!(re.is_match(&doc.data[0].username), "{}", doc.data[0].username);
}

#[test]
fn empty_credentials_fail_without_entries() {
    for creds in [Credentials::new("", "p"), Credentials::new("u", ""), Credentials::new("", "")] {
        let err = build_document(&options(3), &creds).unwrap_err();
        assert!(matches!(err, GeneratorError::Validation(_)));
    }
}

#[test]
fn serialized_document_parses_back_to_same_shape() {
    let doc = build_document(&options(5), &Credentials::new("u", "p")).unwrap();
    let parsed = ConfigDocument::from_json(&doc.to_json().unwrap()).unwrap();
    assert_eq!(parsed, doc);

    let again = build_document(&options(5), &Credentials::new("u", "p")).unwrap();
    let strip = |d: &ConfigDocument| {
        let mut d = d.clone();
        for e in &mut d.data {
            let sid = e.session_id().unwrap_or_default().to_string();
            e.username = e.username.replace(&sid, "");
        }
        d
    };
    assert_eq!(strip(&parsed), strip(&again));
}

#[test]
fn reference_scenario() {
    let doc = build_document(&options(3), &Credentials::new("abc", "xyz")).unwrap();
    assert_eq!(doc.mode, "na.proxys5.net:6200");
    assert_eq!(doc.data.len(), 3);
    let titles: Vec<&str> = doc.data.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["1 🌟", "2 🔮", "3 🚀"]);
    for e in &doc.data {
        assert_eq!(e.hostname, "na.proxys5.net");
        assert_eq!(e.port, 6200);
        assert_eq!(e.password, "xyz");
    }
    assert!(!doc.sync && !doc.auto_backup);
}

#[test]
fn consecutive_generations_differ_only_in_session_ids() {
    let creds = Credentials::new("abc", "xyz");
    let a = build_document(&options(4), &creds).unwrap();
    let b = build_document(&options(4), &creds).unwrap();
    assert_ne!(a.session_ids(), b.session_ids());
    for (x, y) in a.data.iter().zip(&b.data) {
        assert_eq!(x.title, y.title);
        assert_eq!(x.color, y.color);
        assert_eq!(x.password, y.password);
    }
}

#[test]
fn export_writes_timestamped_file() {
    let tmp = tempfile::tempdir().unwrap();
    let doc = build_document(&options(2), &Credentials::new("u", "p")).unwrap();
    let at = Local.with_ymd_and_hms(2026, 10, 16, 9, 41, 0).unwrap();
    let path = write_document(tmp.path(), "proxykit-foxyproxy", &at, &doc).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "proxykit-foxyproxy-config-2610160941.json"
    );
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(ConfigDocument::from_json(&written).unwrap(), doc);
}
