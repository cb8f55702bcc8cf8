//! CSV export of station and per-agent snapshots.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::sim::batch::BatchRun;
use crate::sim::types::{AgentRecord, TickRecord};

/// Column header of the per-agent export.
const AGENT_HEADER: &str = "RunId,iteration,Step,Time,AgentID,Soc,Arrival,Capacity,\
                            MaxCharge,Type,BreakType,power,Waiting,Charged";

/// Column header of the station export.
const STATION_HEADER: &str = "RunId,iteration,Step,Time,Power,PowerWithoutBattery,\
                              BatteryPower,BatterySoc";

/// File name used for the agent export of a batch.
pub const AGENT_FILE: &str = "agents.csv";
/// File name used for the station export of a batch.
pub const STATION_FILE: &str = "station.csv";

/// Writes agent records of one run as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_agent_csv(
    run_id: &str,
    iteration: usize,
    records: &[AgentRecord],
    writer: impl Write,
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(AGENT_HEADER.split(',').map(str::trim))?;
    write_agent_rows(&mut wtr, run_id, iteration, records)?;
    wtr.flush()?;
    Ok(())
}

/// Writes station records of one run as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_station_csv(
    run_id: &str,
    iteration: usize,
    records: &[TickRecord],
    writer: impl Write,
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(STATION_HEADER.split(',').map(str::trim))?;
    write_station_rows(&mut wtr, run_id, iteration, records)?;
    wtr.flush()?;
    Ok(())
}

/// Writes every successful run of a batch into `agents.csv` and
/// `station.csv` inside `dir`, creating the directory if needed.
///
/// Failed runs are skipped. Returns the two file paths.
///
/// # Errors
///
/// Returns an `io::Error` if the directory or files cannot be written.
pub fn export_batch(runs: &[BatchRun], dir: &Path) -> io::Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)?;
    let agent_path = dir.join(AGENT_FILE);
    let station_path = dir.join(STATION_FILE);

    let mut agents = csv::WriterBuilder::new()
        .from_writer(io::BufWriter::new(File::create(&agent_path)?));
    let mut station = csv::WriterBuilder::new()
        .from_writer(io::BufWriter::new(File::create(&station_path)?));
    agents.write_record(AGENT_HEADER.split(',').map(str::trim))?;
    station.write_record(STATION_HEADER.split(',').map(str::trim))?;

    for run in runs {
        let Ok(output) = &run.result else {
            continue;
        };
        write_agent_rows(&mut agents, &run.run_id, run.iteration, &output.agents)?;
        write_station_rows(&mut station, &run.run_id, run.iteration, &output.ticks)?;
    }

    agents.flush()?;
    station.flush()?;
    Ok((agent_path, station_path))
}

fn write_agent_rows<W: Write>(
    wtr: &mut csv::Writer<W>,
    run_id: &str,
    iteration: usize,
    records: &[AgentRecord],
) -> io::Result<()> {
    for r in records {
        wtr.write_record(&[
            run_id.to_string(),
            iteration.to_string(),
            r.tick.to_string(),
            r.time.clone(),
            r.agent_id.to_string(),
            format!("{:.4}", r.soc),
            r.arrival_tick.to_string(),
            format!("{:.1}", r.capacity_kwh),
            format!("{:.1}", r.max_charge_kw),
            r.category.to_string(),
            r.break_type.to_string(),
            format!("{:.4}", r.power_kw),
            r.waiting_ticks.to_string(),
            r.left_without_charge.to_string(),
        ])?;
    }
    Ok(())
}

fn write_station_rows<W: Write>(
    wtr: &mut csv::Writer<W>,
    run_id: &str,
    iteration: usize,
    records: &[TickRecord],
) -> io::Result<()> {
    for r in records {
        wtr.write_record(&[
            run_id.to_string(),
            iteration.to_string(),
            r.tick.to_string(),
            r.time.clone(),
            format!("{:.4}", r.total_power_kw),
            format!("{:.4}", r.power_without_battery_kw),
            format!("{:.4}", r.battery_power_kw),
            r.battery_soc.map(|s| format!("{s:.4}")).unwrap_or_default(),
        ])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{BreakType, VehicleCategory};

    fn agent(tick: usize, id: usize) -> AgentRecord {
        AgentRecord {
            tick,
            time: "00:10".to_string(),
            agent_id: id,
            soc: 42.5,
            arrival_tick: 3,
            capacity_kwh: 150.0,
            max_charge_kw: 200.0,
            category: VehicleCategory::FastCharge,
            break_type: BreakType::Short,
            power_kw: 120.0,
            waiting_ticks: 2,
            left_without_charge: true,
        }
    }

    fn tick(t: usize, soc: Option<f32>) -> TickRecord {
        TickRecord {
            tick: t,
            time: "00:00".to_string(),
            total_power_kw: 500.0,
            power_without_battery_kw: 600.0,
            battery_power_kw: 100.0,
            battery_soc: soc,
        }
    }

    fn lines(buf: Vec<u8>) -> Vec<String> {
        String::from_utf8(buf)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn agent_header_and_row() {
        let mut buf = Vec::new();
        write_agent_csv("baseline", 1, &[agent(1, 7)], &mut buf).unwrap();
        let lines = lines(buf);
        assert_eq!(
            lines[0],
            "RunId,iteration,Step,Time,AgentID,Soc,Arrival,Capacity,MaxCharge,Type,BreakType,power,Waiting,Charged"
        );
        assert_eq!(
            lines[1],
            "baseline,1,1,00:10,7,42.5000,3,150.0,200.0,fast_charge,short,120.0000,2,true"
        );
    }

    #[test]
    fn station_row_leaves_soc_empty_without_battery() {
        let mut buf = Vec::new();
        write_station_csv("flex", 0, &[tick(0, Some(80.0)), tick(1, None)], &mut buf).unwrap();
        let lines = lines(buf);
        assert_eq!(
            lines[0],
            "RunId,iteration,Step,Time,Power,PowerWithoutBattery,BatteryPower,BatterySoc"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with(",80.0000"));
        assert!(lines[2].ends_with("100.0000,"));
    }

    #[test]
    fn row_count_matches_records() {
        let records: Vec<AgentRecord> = (0..24).map(|t| agent(t, 0)).collect();
        let mut buf = Vec::new();
        write_agent_csv("x", 0, &records, &mut buf).unwrap();
        assert_eq!(lines(buf).len(), 25);
    }
}
