// src/tests/pipeline_tests.rs

use crate::db::{InMemorySink, KeyedSink};
use crate::domain::{CleanedListingRecord, RawListingRecord};
use crate::pipeline::{ListingWriter, RowState, SkipReason, WritePolicy};
use crate::tests::utils::{
    geoprocessor, reference_geocoder, reference_row, sqlite_sink, FakeGeocoder,
};
use chrono::NaiveDate;

fn expected_reference_listing() -> CleanedListingRecord {
    CleanedListingRecord {
        address: "123 Main Street, City".to_string(),
        price: 450000.0,
        bedrooms: 3.0,
        bathrooms: 2.0,
        size: Some(1200.0),
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        latitude: 49.88,
        longitude: -119.49,
    }
}

#[test]
fn reference_row_is_committed_then_skipped_on_replay() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("listings.sqlite3");

    let (table, report) = geoprocessor(reference_geocoder()).run(&[reference_row()]);
    assert_eq!(report.cleaned, 1);
    assert_eq!(table.get("123 Main Street, City"), Some(&expected_reference_listing()));

    let mut writer = ListingWriter::new(sqlite_sink(&db_path), WritePolicy::default());
    let first = writer.write_all(&table).unwrap();
    assert_eq!(first.rows[0].1, RowState::Committed);

    // a fresh writer over the same file, as a second run of the binary would be
    let mut replay = ListingWriter::new(sqlite_sink(&db_path), WritePolicy::default());
    let second = replay.write_all(&table).unwrap();
    assert_eq!(second.rows[0].1, RowState::Skipped(SkipReason::AlreadyExists));

    let sink = replay.into_sink();
    assert_eq!(sink.row_count().unwrap(), 1);
    assert_eq!(
        sink.get("123 Main Street, City").unwrap(),
        Some(expected_reference_listing())
    );
}

#[test]
fn contact_for_price_row_writes_nothing() {
    let mut raw = reference_row();
    raw.price = Some("contact for price".to_string());

    let (table, report) = geoprocessor(reference_geocoder()).run(&[raw]);
    assert!(table.is_empty());
    assert_eq!(report.dropped.get("price_unknown"), Some(&1));

    let mut writer = ListingWriter::new(InMemorySink::new(), WritePolicy::default());
    let written = writer.write_all(&table).unwrap();
    assert_eq!(written.committed(), 0);
    assert!(writer.sink().is_empty());
}

#[test]
fn studio_normalizes_to_zero_bedrooms() {
    let mut raw = reference_row();
    raw.bedrooms = Some("Studio".to_string());

    let (table, _) = geoprocessor(reference_geocoder()).run(&[raw]);

    assert_eq!(table.get("123 Main Street, City").unwrap().bedrooms, 0.0);
}

#[test]
fn stray_punctuation_in_counts_keeps_the_listing() {
    let mut raw = reference_row();
    raw.bedrooms = Some("Studio.".to_string());
    raw.bathrooms = Some("1.2.3".to_string());

    let (table, report) = geoprocessor(reference_geocoder()).run(&[raw]);

    assert_eq!(report.cleaned, 1);
    assert_eq!(report.total_dropped(), 0);
    let row = table.get("123 Main Street, City").unwrap();
    assert_eq!((row.bedrooms, row.bathrooms), (0.0, 0.0));
}

#[test]
fn suffixed_or_negative_prices_are_never_committed() {
    let rows: Vec<_> = ["-450000", "$1.5M", "2 lots for $300,000"]
        .iter()
        .map(|price| {
            let mut raw = reference_row();
            raw.price = Some(price.to_string());
            raw
        })
        .collect();

    let (table, report) = geoprocessor(reference_geocoder()).run(&rows);
    assert!(table.is_empty());
    assert_eq!(report.dropped.get("price_malformed"), Some(&3));

    let mut writer = ListingWriter::new(InMemorySink::new(), WritePolicy::default());
    assert_eq!(writer.write_all(&table).unwrap().committed(), 0);
    assert!(writer.sink().is_empty());
}

#[test]
fn geocode_failure_drops_row_and_batch_continues() {
    let geocoder = reference_geocoder().with("9 Elm Rd", "9 Elm Road, City", 49.9, -119.4);
    let rows = vec![
        RawListingRecord::new("nowhere at all", "$1", "1", "1", None, "2024-01-01"),
        reference_row(),
        RawListingRecord::new("9 Elm Rd", "$2", "2", "1", None, "2024-01-02"),
    ];

    let mut geo = geoprocessor(geocoder);
    let (table, report) = geo.run(&rows);

    assert_eq!(geo.client().calls(), 3);
    assert_eq!(report.geocode_failures, 1);
    assert_eq!(report.cleaned, 2);
    let addresses: Vec<_> = table.iter().map(|r| r.address.as_str()).collect();
    assert_eq!(addresses, ["123 Main Street, City", "9 Elm Road, City"]);
}

#[test]
fn geocoder_is_called_once_per_row_even_for_dropped_rows() {
    let mut priceless = reference_row();
    priceless.price = Some("Please Contact".to_string());

    let mut geo = geoprocessor(reference_geocoder());
    geo.run(&[reference_row(), priceless, reference_row()]);

    assert_eq!(geo.client().calls(), 3);
}

#[test]
fn committed_addresses_are_unique_across_overlapping_runs() {
    let geocoder = reference_geocoder()
        // informal spelling of the same place resolves to the same canonical address
        .with("123 main street", "123 Main Street, City", 49.88, -119.49)
        .with("7 Oak Ave", "7 Oak Avenue, City", 49.7, -119.3);

    let run_one = vec![reference_row()];
    let run_two = vec![
        RawListingRecord::new("123 main street", "$455,000", "3", "2", None, "2024-02-01"),
        RawListingRecord::new("7 Oak Ave", "$300,000", "2", "1", Some("800"), "2024-02-01"),
    ];

    let mut geo = geoprocessor(geocoder);
    let mut writer = ListingWriter::new(InMemorySink::new(), WritePolicy::default());

    let (first, _) = geo.run(&run_one);
    writer.write_all(&first).unwrap();
    let (second, _) = geo.run(&run_two);
    let report = writer.write_all(&second).unwrap();

    assert_eq!(report.committed(), 1);
    assert_eq!(report.skipped_existing(), 1);

    let sink = writer.sink();
    assert_eq!(sink.len(), 2);
    // first write wins, the later price is not applied
    assert_eq!(
        sink.rows().find(|r| r.address == "123 Main Street, City").unwrap().price,
        450000.0
    );
    assert!(sink.exists("7 Oak Avenue, City").unwrap());
}

#[test]
fn noisy_counts_are_never_negative_or_missing() {
    let noise = ["3 bd", "Studio", "NaN", "NULL", "", "-2", "2.5 baths", "Not specified"];
    let mut geocoder = FakeGeocoder::default();
    let mut rows = Vec::new();
    for (i, value) in noise.iter().enumerate() {
        let addr = format!("{i} Test St");
        geocoder = geocoder.with(&addr, &format!("{i} Test Street"), 49.0, -119.0);
        rows.push(RawListingRecord::new(&addr, "$100", value, value, None, "2024-01-01"));
    }

    let (table, report) = geoprocessor(geocoder).run(&rows);

    assert_eq!(report.cleaned, noise.len());
    for row in table.iter() {
        assert!(row.bedrooms >= 0.0 && row.bedrooms.is_finite());
        assert!(row.bathrooms >= 0.0 && row.bathrooms.is_finite());
    }
}
