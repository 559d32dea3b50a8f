use crate::domain::records::Record;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Writes records with a header row; absent values become empty cells.
pub fn write_records_csv(path: &Path, records: &[Record]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create CSV directory")?;
        }
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file {:?}", path))?;
    for record in records {
        writer.serialize(record).context("Failed to write CSV row")?;
    }
    writer.flush().context("Failed to flush CSV file")?;

    info!("Wrote {} records to {:?}", records.len(), path);
    Ok(())
}

/// Reads records from a CSV file with a header row. Missing derived columns
/// are allowed; empty cells read back as absent values.
pub fn read_records_csv(path: &Path) -> Result<Vec<Record>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file {:?}", path))?;

    let records = reader
        .deserialize()
        .enumerate()
        .map(|(line, row)| row.with_context(|| format!("Failed to parse CSV row {}", line + 1)))
        .collect::<Result<Vec<Record>>>()?;

    info!("Read {} records from {:?}", records.len(), path);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::DemandLevel;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_write_then_read_keeps_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/records.csv");

        let records = vec![
            Record {
                product_id: Some("PROD-0001".to_string()),
                timestamp: Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()),
                base_price: Some(19.99),
                current_price: Some(21.5),
                demand: Some(320),
                competition_price: Some(20.1),
                time_of_day: Some(9),
                day_of_week: Some(4),
                season: Some(0),
                price_ratio: Some(21.5 / 19.99),
                demand_level: Some(DemandLevel::High),
            },
            Record {
                product_id: Some("PROD-0002".to_string()),
                current_price: Some(5.0),
                ..Default::default()
            },
        ];

        write_records_csv(&path, &records).unwrap();
        let restored = read_records_csv(&path).unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0].demand_level, Some(DemandLevel::High));
        assert_eq!(restored[0].timestamp, records[0].timestamp);
        assert_eq!(restored[0].demand, Some(320));
        assert!((restored[0].base_price.unwrap() - 19.99).abs() < 1e-9);
        assert_eq!(restored[1].base_price, None);
        assert_eq!(restored[1].demand_level, None);
    }

    #[test]
    fn test_read_without_derived_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        fs::write(
            &path,
            "product_id,timestamp,base_price,current_price,demand,competition_price,time_of_day,day_of_week,season\n\
             PROD-0003,2024-05-01T12:00:00Z,40.0,42.0,120,39.5,12,2,1\n",
        )
        .unwrap();

        let records = read_records_csv(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].season, Some(1));
        assert_eq!(records[0].price_ratio, None);
    }

    #[test]
    fn test_nan_cells_read_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nan.csv");
        fs::write(
            &path,
            "product_id,base_price,current_price\nA,NaN,10.0\nB,inf,12.0\nC,5.0,NaN\n",
        )
        .unwrap();

        let records = read_records_csv(&path).unwrap();
        assert_eq!(records[0].base_price, None);
        assert_eq!(records[1].base_price, None);
        assert_eq!(records[2].base_price, Some(5.0));
        assert_eq!(records[2].current_price, None);
    }

    #[test]
    fn test_read_reports_bad_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "product_id,demand\nPROD-0001,lots\n").unwrap();

        let err = read_records_csv(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("row 1"));
    }
}
