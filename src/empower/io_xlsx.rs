// Reading the roster export saved as an Excel workbook.

use calamine::{open_workbook, DataType, Reader, Xlsx};
use csv::StringRecord;

use crate::empower::io_common::excel_serial_to_date;
use crate::empower::io_csv::CsvProfile;
use crate::empower::*;

/// Reads the first worksheet. The first row holds the same headers as the
/// CSV export.
pub fn read_excel_profiles(path: &str) -> BEmpowerResult<Vec<Contact>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = workbook
        .worksheet_range_at(0)
        .context(EmptyExcelSnafu { path })?
        .context(OpeningExcelSnafu { path })?;

    let mut rows = wrange.rows();
    let header: StringRecord = rows
        .next()
        .context(EmptyExcelSnafu { path })?
        .iter()
        .map(cell_to_string)
        .collect();
    debug!("read_excel_profiles: header: {:?}", header);

    let mut res: Vec<Contact> = Vec::new();
    for (idx, row) in rows.enumerate() {
        let record: StringRecord = row.iter().map(cell_to_string).collect();
        if record.iter().all(|s| s.is_empty()) {
            continue;
        }
        let lineno = idx + 2;
        let profile: CsvProfile = record
            .deserialize(Some(&header))
            .context(CsvLineParseSnafu { path, lineno })?;
        debug!("read_excel_profiles: lineno: {} row: {:?}", lineno, profile);
        res.push(profile.into_contact());
    }
    info!("read_excel_profiles: {}: {} profiles", path, res.len());
    Ok(res)
}

/// The text of a cell, as the CSV export would have it.
pub fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Int(i) => i.to_string(),
        // Phone numbers and ids are often stored as numbers.
        DataType::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        DataType::Float(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::DateTime(serial) => excel_serial_to_date(*serial)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        DataType::Empty => String::new(),
        DataType::Error(e) => {
            warn!("cell_to_string: error cell {:?}", e);
            String::new()
        }
        #[allow(unreachable_patterns)]
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_read_like_csv_fields() {
        assert_eq!(cell_to_string(&DataType::String("ana".to_string())), "ana");
        assert_eq!(cell_to_string(&DataType::Float(6085550100.0)), "6085550100");
        assert_eq!(cell_to_string(&DataType::Float(1.5)), "1.5");
        assert_eq!(cell_to_string(&DataType::Int(42)), "42");
        assert_eq!(cell_to_string(&DataType::DateTime(44259.75)), "2021-03-04");
        assert_eq!(cell_to_string(&DataType::Empty), "");
    }

    #[test]
    fn header_maps_cells_to_columns() {
        let header: StringRecord = ["EID", "Parent EID", "Role", "First Name", "Phone"]
            .iter()
            .map(|s| DataType::String(s.to_string()))
            .map(|c| cell_to_string(&c))
            .collect();
        let row = [
            DataType::String("v1".to_string()),
            DataType::String("o1".to_string()),
            DataType::Empty,
            DataType::String("ana".to_string()),
            DataType::Float(6085550100.0),
        ];
        let record: StringRecord = row.iter().map(cell_to_string).collect();
        let profile: CsvProfile = record.deserialize(Some(&header)).unwrap();
        let c = profile.into_contact();
        assert_eq!(c.eid, "v1");
        assert_eq!(c.parent_eid.as_deref(), Some("o1"));
        assert_eq!(c.first_name, "Ana");
        assert_eq!(c.phone, "(608) 555-0100");
    }

    #[test]
    fn missing_workbook_is_an_error() {
        let err = read_excel_profiles("/nonexistent/roster.xlsx").unwrap_err();
        assert!(matches!(*err, EmpowerError::OpeningExcel { .. }));
    }
}
