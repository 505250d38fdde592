use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDateTime;
use csv::Writer;

use crate::error::{Result, SimError};
use crate::simulation::{Booking, Relocation, SimulationReport};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_timestamp(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

fn format_size(size: Option<u32>) -> String {
    size.map(|s| s.to_string()).unwrap_or_default()
}

fn booking_fields(booking: &Booking) -> [String; 5] {
    [
        booking.activity.clone(),
        booking.room.clone(),
        format_timestamp(booking.start),
        format_timestamp(booking.end),
        format_size(booking.group_size),
    ]
}

/// Writes unplaceable bookings as CSV: `activity,room,start,end,group_size`.
pub fn write_unplaceable_csv<W: Write>(writer: W, bookings: &[Booking]) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(["activity", "room", "start", "end", "group_size"])?;
    for booking in bookings {
        wtr.write_record(booking_fields(booking))?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes relocations as CSV with the original booking columns followed by
/// `new_room,new_start,new_end,shift_days`.
pub fn write_relocations_csv<W: Write>(writer: W, relocations: &[Relocation]) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record([
        "activity",
        "room",
        "start",
        "end",
        "group_size",
        "new_room",
        "new_start",
        "new_end",
        "shift_days",
    ])?;
    for r in relocations {
        let [activity, room, start, end, size] = booking_fields(&r.booking);
        wtr.write_record([
            activity,
            room,
            start,
            end,
            size,
            r.new_room.clone(),
            format_timestamp(Some(r.new_start)),
            format_timestamp(Some(r.new_end)),
            r.shift_days.to_string(),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `same_time.csv`, `shifted.csv` and `unplaceable.csv` into `dir`.
pub fn write_report_files(report: &SimulationReport, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| SimError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    write_relocations_csv(create(&dir.join("same_time.csv"))?, &report.same_time)?;
    write_relocations_csv(create(&dir.join("shifted.csv"))?, &report.shifted)?;
    write_unplaceable_csv(create(&dir.join("unplaceable.csv"))?, &report.unplaceable)?;
    Ok(())
}

/// Prints the summary and the three result tables.
pub fn print_report(report: &SimulationReport) {
    let s = &report.summary;
    println!("\n=== Simulation Results ===");
    println!("- Total affected activities: {}", s.total_conflicts);
    println!("- Relocated at the same time: {}", s.same_time);
    println!("- Redistributed to another time/day: {}", s.shifted);
    println!("- Not relocatable: {}", s.unplaceable);

    if !report.same_time.is_empty() {
        println!("\n=== Relocated At Same Time ===");
        for r in &report.same_time {
            println!(
                "{} | {} -> {} | {}",
                r.booking.activity,
                r.booking.room,
                r.new_room,
                format_timestamp(Some(r.new_start)),
            );
        }
    }

    if !report.shifted.is_empty() {
        println!("\n=== Redistributed Activities (new time/location) ===");
        for r in &report.shifted {
            println!(
                "{} | {} | {} | size {} | -> {} at {} (+{}d)",
                r.booking.activity,
                r.booking.room,
                format_timestamp(r.booking.start),
                format_size(r.booking.group_size),
                r.new_room,
                format_timestamp(Some(r.new_start)),
                r.shift_days,
            );
        }
    }

    if !report.unplaceable.is_empty() {
        println!("\n⚠️  Not relocatable ({}):", report.unplaceable.len());
        for b in &report.unplaceable {
            println!(
                "  - {} | {} | {} - {} | size {}",
                b.activity,
                b.room,
                format_timestamp(b.start),
                format_timestamp(b.end),
                format_size(b.group_size),
            );
        }
    }
}
