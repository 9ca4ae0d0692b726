//! Reporting of the topology and of the resources a run created.

use super::terminal::{column_widths, format_row};
use crate::error::{BackendFailure, Phase};
use crate::models::{ResourceGraph, Tier, Topology};
use colored::Colorize;
use itertools::Itertools;
use std::path::{Path, PathBuf};

/// Rows of `logical name, identifier`, header first.
pub fn graph_rows(graph: &ResourceGraph) -> Vec<String> {
    let mut rows = vec![vec!["Resource".to_string(), "Id".to_string()]];
    rows.extend(
        graph
            .iter()
            .map(|(name, id)| vec![name.to_string(), id.to_string()]),
    );
    let widths = column_widths(&rows);
    rows.iter().map(|row| format_row(row, &widths)).collect()
}

/// Print the resource graph as aligned rows.
pub fn print_graph(graph: &ResourceGraph) {
    let rows = graph_rows(graph);
    for (i, row) in rows.iter().enumerate() {
        if i == 0 {
            println!("{}", row.bold());
        } else {
            println!("{row}");
        }
    }
    println!("# {} resources", graph.len());
}

/// Print a short summary of the topology before a run.
pub fn print_topology(topology: &Topology) {
    let vpc = topology.vpc();
    println!(
        "{} {} {} in {}",
        "VPC".bold(),
        vpc.name,
        vpc.cidr,
        topology.region()
    );
    let mut rows = vec![vec![
        "tier".to_string(),
        "name".to_string(),
        "cidr".to_string(),
        "az".to_string(),
        "hosts".to_string(),
    ]];
    for subnet in topology.all_subnets() {
        rows.push(vec![
            subnet.tier.to_string(),
            subnet.name.clone(),
            subnet.cidr.to_string(),
            subnet.availability_zone.clone(),
            subnet.cidr.num_hosts().to_string(),
        ]);
    }
    let widths = column_widths(&rows);
    for row in &rows {
        println!("  {}", format_row(row, &widths));
    }

    let tables = topology
        .route_tables()
        .iter()
        .map(|(rtb, name)| format!("{name}({rtb})"))
        .join(", ");
    if !tables.is_empty() {
        println!("  route tables: {tables}");
    }
    if !topology.nat_gateways().is_empty() {
        let public = topology.subnets(Tier::Public);
        let nats = topology
            .nat_gateways()
            .iter()
            .map(|nat| match public.get(nat.subnet) {
                Some(subnet) => format!("{} in {}", nat.name, subnet.name),
                None => nat.name.clone(),
            })
            .join(", ");
        println!("  nat gateways: {nats}");
    }
    if let Some(endpoint) = topology.s3_endpoint() {
        let tables = endpoint
            .route_tables
            .iter()
            .filter_map(|rtb| topology.route_table_name(*rtb))
            .join(", ");
        println!("  s3 endpoint: {tables}");
    }
}

/// File name of a report written at `now`.
pub fn report_file_name(now: chrono::DateTime<chrono::Local>) -> String {
    format!("vpc_resources_{}.json", now.format("%Y-%m-%d_%H%M%S"))
}

/// Write the resource graph as JSON into `dir` and return the file path.
pub fn save_report(graph: &ResourceGraph, dir: &Path) -> Result<PathBuf, BackendFailure> {
    let path = dir.join(report_file_name(chrono::Local::now()));
    let json = serde_json::to_string_pretty(graph)
        .map_err(|e| BackendFailure::new(Phase::Report, e))?;
    std::fs::create_dir_all(dir)
        .and_then(|_| std::fs::write(&path, json))
        .map_err(|e| {
            log::warn!("Error writing report {}: {e}", path.display());
            BackendFailure::new(Phase::Report, format!("{}: {e}", path.display()))
        })?;
    log::info!("Wrote resource report {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn graph() -> ResourceGraph {
        let mut graph = ResourceGraph::new();
        graph.bind("VPC", "vpc-0a1b").unwrap();
        graph.bind("PublicSubnet0", "subnet-77").unwrap();
        graph
    }

    #[test]
    fn test_graph_rows() {
        assert_eq!(
            graph_rows(&graph()),
            vec![
                "Resource       Id",
                "VPC            vpc-0a1b",
                "PublicSubnet0  subnet-77",
            ]
        );
    }

    #[test]
    fn test_report_file_name() {
        let now = chrono::Local
            .with_ymd_and_hms(2024, 3, 7, 9, 5, 1)
            .single()
            .unwrap();
        assert_eq!(report_file_name(now), "vpc_resources_2024-03-07_090501.json");
    }

    #[test]
    fn test_save_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_report(&graph(), &dir.path().join("reports")).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["VPC"], "vpc-0a1b");
        assert_eq!(value["PublicSubnet0"], "subnet-77");
    }
}
