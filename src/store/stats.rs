use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoreStats {
    pub total_measurements: u64,
    pub total_profiles: u64,
    pub date_range: DateRange,
    /// Largest region first.
    pub region_distribution: Vec<RegionCount>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegionCount {
    pub region: String,
    pub count: u64,
}

pub fn store_stats(conn: &Connection) -> Result<StoreStats> {
    Ok(StoreStats {
        total_measurements: count_table(conn, "measurements")?,
        total_profiles: count_table(conn, "profiles")?,
        date_range: date_range(conn)?,
        region_distribution: region_distribution(conn)?,
    })
}

fn count_table(conn: &Connection, table: &str) -> Result<u64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;
    Ok(count as u64)
}

fn date_range(conn: &Connection) -> Result<DateRange> {
    let (start, end) = conn.query_row(
        "SELECT MIN(measurement_time), MAX(measurement_time) FROM measurements",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(DateRange { start, end })
}

fn region_distribution(conn: &Connection) -> Result<Vec<RegionCount>> {
    let mut stmt = conn.prepare(
        "SELECT ocean_region, COUNT(*) AS n FROM measurements \
         GROUP BY ocean_region ORDER BY n DESC, ocean_region ASC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(RegionCount {
                region: row.get(0)?,
                count: row.get::<_, i64>(1)? as u64,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::store::test_support::{cast, profile_of};
    use crate::store::upsert_file;

    #[test]
    fn empty_store() {
        let conn = open_memory_database().unwrap();
        let stats = store_stats(&conn).unwrap();
        assert_eq!(stats.total_measurements, 0);
        assert_eq!(stats.total_profiles, 0);
        assert_eq!(stats.date_range.start, None);
        assert_eq!(stats.date_range.end, None);
        assert!(stats.region_distribution.is_empty());
    }

    #[test]
    fn counts_range_and_distribution() {
        let mut conn = open_memory_database().unwrap();
        let a = cast("A", 1, 45.0, -100.0, 3, &[(1.0, 2.0, 3.0), (1.0, 2.0, 4.0)]);
        let b = cast("B", 1, 30.0, 150.0, 9, &[(1.0, 2.0, 3.0)]);
        for ms in [a, b] {
            upsert_file(&mut conn, &ms, &[profile_of(&ms)]).unwrap();
        }

        let stats = store_stats(&conn).unwrap();
        assert_eq!(stats.total_measurements, 3);
        assert_eq!(stats.total_profiles, 2);
        assert_eq!(stats.date_range.start.as_deref(), Some("2024-01-03T00:00:00.000000Z"));
        assert_eq!(stats.date_range.end.as_deref(), Some("2024-01-09T00:00:00.000000Z"));
        assert_eq!(
            stats.region_distribution,
            vec![
                RegionCount { region: "North Atlantic".into(), count: 2 },
                RegionCount { region: "North Pacific".into(), count: 1 },
            ]
        );
    }
}
