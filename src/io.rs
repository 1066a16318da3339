use crate::model::{LabUnit, LeaveRecord, PredominanceCategory, RosterMatrix, Staff, StaffId};
use crate::scheduler::CoverageDeficiency;
use anyhow::{bail, Context};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Writer, WriterBuilder};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Import du personnel depuis CSV: header `code,name,category[,weekend][,units][,night_eligible]`
///
/// `units` est une liste séparée par `;` ; vide = défaut de la catégorie.
pub fn import_staff_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Staff>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let code = rec.get(0).context("missing code")?.trim();
        let name = rec.get(1).context("missing name")?.trim();
        if code.is_empty() || name.is_empty() {
            bail!("invalid staff row (empty)");
        }
        let category: PredominanceCategory = rec
            .get(2)
            .unwrap_or_default()
            .parse()
            .with_context(|| format!("invalid category for {code}"))?;
        let mut staff = Staff::new(code, name, category);

        if let Some(weekend) = rec.get(3).map(str::trim).filter(|s| !s.is_empty()) {
            staff.weekend = Some(
                weekend
                    .parse()
                    .with_context(|| format!("invalid weekend value for {code}"))?,
            );
        }
        if let Some(units) = rec.get(4).map(str::trim).filter(|s| !s.is_empty()) {
            staff.units = parse_units(units).with_context(|| format!("invalid units for {code}"))?;
        }
        if let Some(flag) = rec.get(5).map(str::trim).filter(|s| !s.is_empty()) {
            staff.night_eligible = parse_bool(flag)
                .with_context(|| format!("invalid night_eligible value for {code}"))?;
        }
        out.push(staff);
    }
    Ok(out)
}

fn parse_units(raw: &str) -> anyhow::Result<BTreeSet<LabUnit>> {
    raw.split(';')
        .filter(|chunk| !chunk.trim().is_empty())
        .map(|chunk| chunk.parse::<LabUnit>().map_err(anyhow::Error::from))
        .collect()
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => bail!("expected boolean"),
    }
}

/// Import des congés: header `code,start,end` (dates `YYYY-MM-DD`, incluses)
///
/// Les intervalles ne sont pas vérifiés ici ; le moteur signale les mauvais.
pub fn import_leave_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<LeaveRecord>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let code = rec.get(0).context("missing code")?.trim();
        let start = parse_date(rec.get(1).context("missing start")?)?;
        let end = parse_date(rec.get(2).context("missing end")?)?;
        out.push(LeaveRecord {
            staff: StaffId::new(code),
            start,
            end,
        });
    }
    Ok(out)
}

pub fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date: {raw}"))
}

/// Feuille de service: header `DATE,DAY,NO,<codes...>`, une ligne par jour
pub fn write_roster_csv<W: Write>(writer: W, matrix: &RosterMatrix) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(false).from_writer(writer);
    let mut header = vec!["DATE", "DAY", "NO"];
    header.extend(matrix.staff.iter().map(StaffId::as_str));
    w.write_record(&header)?;

    let mut number = itoa::Buffer::new();
    for (day, date) in matrix.dates.iter().enumerate() {
        let iso = date.format("%Y-%m-%d").to_string();
        let name = date.format("%A").to_string();
        let mut row = vec![iso.as_str(), name.as_str(), number.format(day + 1)];
        row.extend(matrix.column(day).map(|(_, cell)| cell.code()));
        w.write_record(&row)?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_roster_csv<P: AsRef<Path>>(path: P, matrix: &RosterMatrix) -> anyhow::Result<()> {
    let file = fs::File::create(path.as_ref())
        .with_context(|| format!("creating {}", path.as_ref().display()))?;
    write_roster_csv(file, matrix)
}

/// Rapport des manques: header `date,unit,shift,required,assigned`
pub fn export_deficiencies_csv<P: AsRef<Path>>(
    path: P,
    deficiencies: &[CoverageDeficiency],
) -> anyhow::Result<()> {
    let mut w = Writer::from_path(path)?;
    w.write_record(["date", "unit", "shift", "required", "assigned"])?;
    let mut required = itoa::Buffer::new();
    let mut assigned = itoa::Buffer::new();
    for d in deficiencies {
        let date = d.date.to_string();
        w.write_record([
            date.as_str(),
            d.unit.code(),
            d.shift.code(),
            required.format(d.required),
            assigned.format(d.assigned),
        ])?;
    }
    w.flush()?;
    Ok(())
}
