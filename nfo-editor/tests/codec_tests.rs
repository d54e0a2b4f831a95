//! Codec integration tests: round trips, preserved elements, file I/O

use nfo_editor::codec::{self, CodecError};
use nfo_editor::models::{Actor, ExtraValue, Kind, Record};
use tempfile::TempDir;

fn full_episode() -> Record {
    let mut record = Record::new(Kind::Episode);
    record.title = "Pilot & Friends".to_string();
    record.original_title = "Piloto".to_string();
    record.year = "2008".to_string();
    record.plot = "It <begins>.".to_string();
    record.runtime = "58".to_string();
    record.studio = "AMC".to_string();
    record.rating = "8.2".to_string();
    record.genres = vec!["Drama".to_string(), "Crime".to_string()];
    record.directors = vec!["Vince".to_string()];
    record.cast = vec![
        Actor {
            name: "Bryan".to_string(),
            role: "Walter".to_string(),
            thumb: "https://img/b.jpg".to_string(),
            order: 0,
        },
        Actor {
            name: "Aaron".to_string(),
            role: String::new(),
            thumb: String::new(),
            order: 1,
        },
    ];
    record.poster_path = "poster.jpg".to_string();
    record.fanart_path = "fanart.jpg".to_string();
    record.season = "1".to_string();
    record.episode = "1".to_string();
    record.aired = "2008-01-20".to_string();
    record
}

#[test]
fn test_round_trip_preserves_known_fields() {
    // Given: A record with every known field set
    let record = full_episode();

    // When: Serialized and parsed back
    let parsed = codec::parse(&codec::serialize(&record)).unwrap();

    // Then: The records are equal
    assert_eq!(parsed, record);
}

#[test]
fn test_round_trip_is_stable_after_first_serialize() {
    let source = "<?xml version=\"1.0\"?>\n<tvshow>\n<title>Show</title>\n<custom a=\"1\">x</custom>\n\n<genre>Drama</genre></tvshow>";
    let first = codec::serialize(&codec::parse(source).unwrap());
    let second = codec::serialize(&codec::parse(&first).unwrap());
    assert_eq!(first, second);
}

#[test]
fn test_repeated_unknown_elements_survive_in_order() {
    // Given: Three repeated unknown elements with attributes and nesting
    let source = r#"<movie>
  <title>Film</title>
  <uniqueid type="imdb" default="true">tt001</uniqueid>
  <uniqueid type="tmdb">42</uniqueid>
  <uniqueid type="tvdb"><inner>7</inner></uniqueid>
  <set><name>Saga</name></set>
</movie>"#;

    // When: Parsed
    let record = codec::parse(source).unwrap();

    // Then: Each fragment is kept verbatim, in document order
    match record.extra.get("uniqueid") {
        Some(ExtraValue::Multiple(fragments)) => {
            assert_eq!(fragments.len(), 3);
            assert_eq!(fragments[0], r#"<uniqueid type="imdb" default="true">tt001</uniqueid>"#);
            assert_eq!(fragments[2], r#"<uniqueid type="tvdb"><inner>7</inner></uniqueid>"#);
        }
        other => panic!("expected three fragments, got {:?}", other),
    }
    assert!(matches!(record.extra.get("set"), Some(ExtraValue::Single(_))));

    // And: Serializing writes them all back
    let xml = codec::serialize(&record);
    assert_eq!(xml.matches("<uniqueid").count(), 3);
    assert!(xml.contains("<set><name>Saga</name></set>"));
    let again = codec::parse(&xml).unwrap();
    assert_eq!(again.extra, record.extra);
}

#[test]
fn test_kind_detection() {
    assert_eq!(codec::detect_kind("<movie/>").unwrap(), Kind::Movie);
    assert_eq!(codec::detect_kind("<tvshow></tvshow>").unwrap(), Kind::TvShow);
    assert_eq!(
        codec::detect_kind("<episodedetails></episodedetails>").unwrap(),
        Kind::Episode
    );
    assert_eq!(codec::detect_kind("<musicvideo></musicvideo>").unwrap(), Kind::Movie);
    assert!(codec::detect_kind("").is_err());
}

#[test]
fn test_episode_fields_only_written_for_episodic_kinds() {
    let mut record = full_episode();
    record.kind = Kind::Movie;
    let xml = codec::serialize(&record);
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<movie>\n"));
    assert!(!xml.contains("<season>"));
    assert!(!xml.contains("<aired>"));

    record.kind = Kind::TvShow;
    let xml = codec::serialize(&record);
    assert!(xml.contains("  <season>1</season>\n"));
}

#[test]
fn test_malformed_documents_are_rejected() {
    for bad in [
        "<movie><title>x</movie>",
        "<movie>",
        "just text",
        "<movie></movie><movie></movie>",
        "<movie><title>&bogus;</title></movie>",
    ] {
        match codec::parse(bad) {
            Err(CodecError::Parse(e)) => {
                assert!(e.line >= 1 && e.column >= 1, "{}", bad);
                assert!(e.to_string().starts_with("Invalid XML: "));
            }
            other => panic!("expected parse error for {:?}, got {:?}", bad, other),
        }
    }
}

#[test]
fn test_file_round_trip_and_latin1_fallback() {
    let dir = TempDir::new().unwrap();

    // Given: A Latin-1 encoded file (0xE9 is 'é')
    let path = dir.path().join("latin.nfo");
    let mut bytes = b"<movie><title>Caf".to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(b"</title></movie>");
    std::fs::write(&path, bytes).unwrap();

    // When: Loaded
    let record = codec::load_file(&path).unwrap();

    // Then: The byte decodes as its Latin-1 character
    assert_eq!(record.title, "Café");

    // And: Saving writes UTF-8 that loads back identically
    codec::save_file(&record, &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("<title>Café</title>"));
    assert_eq!(codec::load_file(&path).unwrap(), record);
    assert_eq!(codec::detect_kind_from_file(&path).unwrap(), Kind::Movie);
}

#[test]
fn test_missing_file_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.nfo");
    match codec::load_file(&path) {
        Err(CodecError::File { message, .. }) => assert!(message.starts_with("File not found")),
        other => panic!("expected file error, got {:?}", other),
    }
}
