#![allow(dead_code)]

use calamine::{Data, Range};
use rtt_waits::{LoaderConfig, RecordBatch, load_from_range};

/// Header row as it appears in the RTT extract
pub const HEADERS: [&str; 6] = [
    "Patient Age",
    "Index of Multiple Deprivation",
    "Ethnicity",
    "Wait Start Date",
    "Seen Date",
    "Referral Source",
];

/// One sheet row; `None` cells are left empty
pub type SheetRow<'a> = (
    Option<i64>,
    Option<i64>,
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
);

fn text(value: &str) -> Data {
    Data::String(value.to_string())
}

/// Build an in-memory sheet with a header row followed by `rows`
#[must_use]
pub fn sheet(rows: &[SheetRow<'_>]) -> Range<Data> {
    let height = rows.len() as u32;
    let mut range = Range::new((0, 0), (height, HEADERS.len() as u32 - 1));
    for (col, header) in HEADERS.iter().enumerate() {
        range.set_value((0, col as u32), text(header));
    }

    for (idx, (age, imd, ethnicity, start, seen)) in rows.iter().enumerate() {
        let row = idx as u32 + 1;
        let cells = [
            age.map(Data::Int),
            imd.map(|v| Data::Float(v as f64)),
            ethnicity.map(text),
            start.map(text),
            seen.map(text),
            Some(text("GP")),
        ];
        for (col, cell) in cells.into_iter().enumerate() {
            if let Some(cell) = cell {
                range.set_value((row, col as u32), cell);
            }
        }
    }
    range
}

/// Load `rows` through the loader with default settings
#[must_use]
pub fn loaded(rows: &[SheetRow<'_>]) -> RecordBatch {
    load_from_range(&sheet(rows), &LoaderConfig::default()).unwrap()
}

/// Referral examples covering the kept, negative and overlong cases
#[must_use]
pub fn referral_rows() -> Vec<SheetRow<'static>> {
    vec![
        (Some(34), Some(3), Some("Unwilling to answer"), Some("2022-01-02"), Some("2022-01-10")),
        (Some(50), Some(1), Some("Indian"), Some("2022-03-01"), Some("2022-01-10")),
        (Some(71), Some(9), Some("Caribbean"), Some("2010-06-01"), Some("2022-01-10")),
        (Some(28), Some(3), Some("White - British"), Some("01/02/2022"), Some("15/03/2022")),
        (None, Some(5), Some("Indian"), Some("2022-01-01"), Some("2022-01-20")),
        (Some(45), Some(5), None, Some("2022-01-01"), Some("2022-01-20")),
        (Some(62), Some(3), Some("White - British"), Some("2022-02-01"), Some("2022-02-21")),
        (Some(34), Some(3), Some("Unwilling to answer"), Some("2022-01-02"), Some("2022-01-10")),
    ]
}

/// Ages, deciles and labels drawn from the embedded mapping, `n` rows
#[must_use]
pub fn synthetic_rows(n: usize) -> Vec<SheetRow<'static>> {
    const LABELS: [&str; 7] = [
        "White - British",
        "White - Irish",
        "Black or Black British - African",
        "Mixed - White and Asian",
        "Not stated",
        "Chinese",
        "Asian or Asian British - Pakistani",
    ];
    const STARTS: [&str; 4] = ["2021-01-04", "2021-06-15", "2020-11-30", "2022-02-01"];
    const SEEN: [&str; 5] = ["2022-01-10", "2021-07-01", "2023-03-31", "2022-02-01", "2021-12-24"];

    (0..n)
        .map(|i| {
            (
                Some((i * 7 % 95) as i64),
                Some((i % 10) as i64 + 1),
                Some(LABELS[i % LABELS.len()]),
                Some(STARTS[i % STARTS.len()]),
                Some(SEEN[i % SEEN.len()]),
            )
        })
        .collect()
}

/// Small workbook with an `RTT` sheet (text and date-formatted cells) and a
/// `Notes` sheet
#[must_use]
pub fn fixture_workbook() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("rtt_small.xlsx")
}
