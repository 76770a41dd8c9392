use paytally_core::{Normalizer, WorkType, parse_tz};
use paytally_ingest::{combine_pages, parse_payments_table};

const PAGE_ONE: &str = r#"
<table>
  <tr><th></th><th>Project</th><th>Type</th><th>Duration</th><th>Submitted</th><th>Amount</th></tr>
  <tr><td><svg class="tw-rounded-full"></svg></td><td>Orion</td><td>Project Time</td><td>1h 30m</td><td>Feb 17, 2026, 9:15 AM</td><td>$30.00</td></tr>
  <tr><td></td><td>Orion</td><td>Task</td><td></td><td>Feb 17, 2026, 10:02 AM</td><td>$12.50</td></tr>
  <tr><td></td><td>Lyra</td><td>Task</td><td></td><td>processing</td><td>$4.00</td></tr>
</table>
"#;

const PAGE_TWO: &str = r#"
<table>
  <tr><th></th><th>Project</th><th>Type</th><th>Duration</th><th>Submitted</th><th>Amount</th></tr>
  <tr><td></td><td>Lyra</td><td>Project Time</td><td>45m</td><td>Feb 16, 2026, 11:40 PM</td><td>$1,015.5</td></tr>
</table>
"#;

#[test]
fn test_two_pages_become_entries() {
    let html = combine_pages(&[PAGE_ONE, PAGE_TWO]);
    let raws = parse_payments_table(&html).unwrap();
    assert_eq!(raws.len(), 4);

    let normalizer = Normalizer::new(Some(parse_tz("America/Chicago").unwrap())).unwrap();
    let entries = normalizer.normalize_all(&raws);

    // "processing" has no usable timestamp and is dropped.
    assert_eq!(entries.len(), 3);

    assert_eq!(entries[0].work_type, WorkType::ProjectTime);
    assert_eq!(entries[0].duration, 1.5);
    assert_eq!(entries[0].hourly_rate(), 20.0);
    assert_eq!(entries[0].occurred_at.to_rfc3339(), "2026-02-17T09:15:00-06:00");

    assert_eq!(entries[1].work_type, WorkType::Task);
    assert_eq!(entries[1].amount, 12.5);
    assert_eq!(entries[1].label, "Orion");

    assert_eq!(entries[2].amount, 1015.5);
    assert_eq!(entries[2].duration, 0.75);
    // Late evening in Chicago is already the next day in UTC.
    assert_eq!(entries[2].occurred_at.date_naive().to_string(), "2026-02-16");
}
