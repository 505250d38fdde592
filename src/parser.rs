use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, Trim};
use tracing::{info, warn};

use crate::error::{Result, SimError};
use crate::simulation::{Booking, Room, RoomRegistry};

/// A logical column and the header spellings accepted for it (lowercase).
struct Column {
    name: &'static str,
    aliases: &'static [&'static str],
}

const ACTIVITY: Column = Column {
    name: "activity",
    aliases: &["activiteit", "activity"],
};
const ROOM: Column = Column {
    name: "room",
    aliases: &["ruimte", "room"],
};
const START: Column = Column {
    name: "start",
    aliases: &["startdatum", "start", "start_date"],
};
const END: Column = Column {
    name: "end",
    aliases: &["einddatum", "end", "end_date"],
};
const GROUP_SIZE: Column = Column {
    name: "group_size",
    aliases: &["groepgrootte", "group_size", "group size"],
};
const CAPACITY: Column = Column {
    name: "capacity",
    aliases: &["capaciteit", "capacity"],
};

// Year-last dates are month-first, falling back to day-first when the first
// field cannot be a month.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m-%d-%Y %H:%M:%S",
    "%m-%d-%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%m/%d/%Y",
    "%d/%m/%Y",
];

const WORKBOOK_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Parses a timestamp leniently. Date-only values mean midnight; an RFC 3339
/// offset is dropped and the wall-clock time kept. Returns `None` if nothing matches.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Parses a non-negative whole number. Spreadsheet exports often write
/// integers as `30.0`, so integral floats are accepted too.
pub fn parse_count(value: &str) -> Option<u32> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(n) = value.parse::<u32>() {
        return Some(n);
    }
    let f: f64 = value.parse().ok()?;
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX)).then_some(f as u32)
}

/// A loaded sheet: header cells and data rows, all as trimmed text.
struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn field<'a>(row: &'a [String], col: usize) -> &'a str {
        row.get(col).map(String::as_str).unwrap_or("")
    }
}

/// xlsx and ods are zip archives, xls is an OLE compound file.
fn is_workbook(data: &[u8]) -> bool {
    const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
    const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
    data.starts_with(ZIP_MAGIC) || data.starts_with(OLE_MAGIC)
}

/// Picks whichever of `,` `;` or tab occurs most in the header line.
fn detect_delimiter(data: &[u8]) -> u8 {
    let header = data.split(|&b| b == b'\n').next().unwrap_or(data);
    let count = |d: u8| header.iter().filter(|&&b| b == d).count();
    [b';', b'\t']
        .into_iter()
        .fold((b',', count(b',')), |best, d| {
            let n = count(d);
            if n > best.1 { (d, n) } else { best }
        })
        .0
}

fn csv_table(data: &[u8]) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .delimiter(detect_delimiter(data))
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);
    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for result in reader.records() {
        rows.push(result?.iter().map(str::to_string).collect());
    }
    Ok(Table { headers, rows })
}

/// Renders a workbook cell the way a CSV export of it would read.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|t| t.format(WORKBOOK_TIMESTAMP).to_string())
            .unwrap_or_default(),
    }
}

/// Reads the first worksheet; its first row is the header.
fn workbook_table(data: &[u8]) -> Result<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SimError::EmptyWorkbook)??;
    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();
    Ok(Table {
        headers,
        rows: rows.collect(),
    })
}

fn read_table(data: &[u8]) -> Result<Table> {
    if is_workbook(data) {
        workbook_table(data)
    } else {
        csv_table(data)
    }
}

/// Finds a column by case-insensitive header match against its aliases.
fn find_column(headers: &[String], table: &'static str, column: &Column) -> Result<usize> {
    headers
        .iter()
        .position(|h| {
            let h = h.trim().to_lowercase();
            column.aliases.iter().any(|alias| *alias == h)
        })
        .ok_or(SimError::MissingColumn {
            table,
            column: column.name,
        })
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the room table (room id and capacity) from CSV or workbook bytes.
pub fn read_rooms(data: &[u8]) -> Result<RoomRegistry> {
    let table = read_table(data)?;
    let room_col = find_column(&table.headers, "rooms", &ROOM)?;
    let capacity_col = find_column(&table.headers, "rooms", &CAPACITY)?;

    let mut rooms = Vec::new();
    for (row, record) in table.rows.iter().enumerate() {
        let id = Table::field(record, room_col);
        if id.is_empty() {
            warn!(row, "skipping room row without an id");
            continue;
        }
        let capacity = parse_count(Table::field(record, capacity_col));
        rooms.push(Room::new(id, capacity));
    }

    let registry = RoomRegistry::new(rooms);
    info!(rooms = registry.len(), "loaded room table");
    Ok(registry)
}

/// Reads the booking table from CSV or workbook bytes. Unparseable fields
/// become `None` and the row is kept.
pub fn read_bookings(data: &[u8]) -> Result<Vec<Booking>> {
    let table = read_table(data)?;
    let activity_col = find_column(&table.headers, "bookings", &ACTIVITY)?;
    let room_col = find_column(&table.headers, "bookings", &ROOM)?;
    let start_col = find_column(&table.headers, "bookings", &START)?;
    let end_col = find_column(&table.headers, "bookings", &END)?;
    let size_col = find_column(&table.headers, "bookings", &GROUP_SIZE)?;

    let mut bookings = Vec::new();
    for (row, record) in table.rows.iter().enumerate() {
        let field = |i: usize| Table::field(record, i);
        bookings.push(Booking {
            row,
            activity: field(activity_col).to_string(),
            room: field(room_col).to_string(),
            start: parse_timestamp(field(start_col)),
            end: parse_timestamp(field(end_col)),
            group_size: parse_count(field(size_col)),
        });
    }

    let no_start = bookings.iter().filter(|b| b.start.is_none()).count();
    if no_start > 0 {
        warn!(rows = no_start, "bookings without a parseable start never conflict");
    }
    let no_end = bookings.iter().filter(|b| b.start.is_some() && b.end.is_none()).count();
    if no_end > 0 {
        warn!(rows = no_end, "bookings without a parseable end cannot be relocated");
    }
    info!(bookings = bookings.len(), "loaded booking table");
    Ok(bookings)
}

pub fn load_rooms<P: AsRef<Path>>(path: P) -> Result<RoomRegistry> {
    read_rooms(&read_file(path.as_ref())?)
}

pub fn load_bookings<P: AsRef<Path>>(path: P) -> Result<Vec<Booking>> {
    read_bookings(&read_file(path.as_ref())?)
}
