//! Output generation
//!
//! Writes decoded frames as CSV (held or sparse rows) or as JSON lines, and
//! manages the dated output folders used by the sparse mode.

use crate::state::HeldValues;
use anyhow::Result;
use chrono::{Duration, NaiveDate};
use dbc_log_decoder::formats::format_timestamp;
use dbc_log_decoder::{DecodedFrame, Timestamp};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// First column of every CSV file
pub const TIMESTAMP_COLUMN: &str = "TIME_STAMP";

const LINE_TERMINATOR: &str = "\r\n";

/// Render a physical value the way the CSV consumers expect
///
/// Plain decimals keep a fractional part (`7.0`, `-6.0`). Magnitudes below
/// 1e-4 or from 1e16 up use a signed two-digit exponent (`1e-05`, `1.5e+16`).
pub fn format_value(value: f64) -> String {
    let magnitude = value.abs();
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let text = format!("{:e}", value);
        match text.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => text,
        }
    } else {
        format!("{:?}", value)
    }
}

fn write_row<W: Write>(out: &mut W, fields: &[String]) -> io::Result<()> {
    write!(out, "{}{}", fields.join(","), LINE_TERMINATOR)
}

fn write_header<W: Write>(out: &mut W, columns: &[String]) -> io::Result<()> {
    let mut header = Vec::with_capacity(columns.len() + 1);
    header.push(TIMESTAMP_COLUMN.to_string());
    header.extend(columns.iter().cloned());
    write_row(out, &header)
}

/// Write held-value CSV rows
///
/// Every column carries the last value seen for it (empty until its first
/// appearance). A row is written for a frame when the sample interval has
/// elapsed since the previous written row. Returns the number of rows.
pub fn write_held_csv<W: Write>(
    mut out: W,
    frames: &[DecodedFrame<Timestamp>],
    columns: &[String],
    sample_rate_ms: u64,
) -> io::Result<usize> {
    let mut held = HeldValues::new(columns, sample_rate_ms);
    write_header(&mut out, held.columns())?;

    let mut rows = 0;
    for frame in frames {
        held.update(frame);
        if !held.due(frame.timestamp) {
            continue;
        }

        let mut fields = Vec::with_capacity(columns.len() + 1);
        fields.push(format_timestamp(&frame.timestamp));
        fields.extend(
            held.values()
                .iter()
                .map(|value| value.map(format_value).unwrap_or_default()),
        );
        write_row(&mut out, &fields)?;
        rows += 1;
    }

    out.flush()?;
    Ok(rows)
}

/// Write sparse CSV rows
///
/// Columns not present in a frame are `nan`. Frames whose present values sum
/// to zero are left out. Returns the number of rows.
pub fn write_sparse_csv<W: Write>(
    mut out: W,
    frames: &[DecodedFrame<Timestamp>],
    columns: &[String],
) -> io::Result<usize> {
    write_header(&mut out, columns)?;

    let mut rows = 0;
    for frame in frames {
        let values: Vec<Option<f64>> = columns.iter().map(|c| frame.signal(c)).collect();
        let sum: f64 = values.iter().flatten().sum();
        if sum == 0.0 {
            continue;
        }

        let mut fields = Vec::with_capacity(columns.len() + 1);
        fields.push(format_timestamp(&frame.timestamp));
        fields.extend(
            values
                .iter()
                .map(|value| value.map_or_else(|| "nan".to_string(), format_value)),
        );
        write_row(&mut out, &fields)?;
        rows += 1;
    }

    out.flush()?;
    Ok(rows)
}

/// Write one JSON object per frame
pub fn write_json_lines<W: Write>(mut out: W, frames: &[DecodedFrame<Timestamp>]) -> Result<usize> {
    for frame in frames {
        let record = frame.clone().with_timestamp(format_timestamp(&frame.timestamp));
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(frames.len())
}

/// Name of the dated folder for a day (`dd-mm-YYYY`)
pub fn dated_folder_name(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Next free sparse CSV path in the dated folder, creating the folder
///
/// Files are named `<dd-mm-YYYY>_LOG_DBC_PROCESSED_<n>.csv`, counting from 1.
pub fn sparse_output_path(output_dir: &Path, date: NaiveDate) -> io::Result<PathBuf> {
    let folder_name = dated_folder_name(date);
    let folder = output_dir.join(&folder_name);
    fs::create_dir_all(&folder)?;

    let mut counter = 1;
    loop {
        let path = folder.join(format!("{}_LOG_DBC_PROCESSED_{}.csv", folder_name, counter));
        if !path.exists() {
            return Ok(path);
        }
        counter += 1;
    }
}

/// Remove the dated folder of the day before `today`
///
/// Returns whether a folder was removed.
pub fn clean_previous_day(output_dir: &Path, today: NaiveDate) -> io::Result<bool> {
    let yesterday = today - Duration::days(1);
    let folder = output_dir.join(dated_folder_name(yesterday));

    if folder.is_dir() {
        fs::remove_dir_all(&folder)?;
        log::info!("The folder {:?} has been deleted", folder);
        Ok(true)
    } else {
        log::info!("The folder {:?} does not exist", folder);
        Ok(false)
    }
}
