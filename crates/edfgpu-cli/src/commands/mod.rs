//! CLI commands implementation

use anyhow::{Context, Result};
use edfgpu_core::{SchedulerConfig, WorkItem};
use edfgpu_scheduler::{Placement, PrioritySort, Scheduler};
use edfgpu_store::ClusterFixture;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Load the config file, or the defaults when none is given
pub fn load_config(path: Option<&Path>) -> Result<SchedulerConfig> {
    match path {
        Some(path) => SchedulerConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(SchedulerConfig::default()),
    }
}

/// One line of simulation output
#[derive(Debug, Serialize)]
pub struct SimulationRow {
    /// Queue position, starting at 1
    pub position: usize,
    /// `namespace/name`
    pub item: String,
    /// Deadline annotation after admission, if any
    pub deadline: Option<String>,
    /// Chosen node, if any
    pub node: Option<String>,
    /// Score of the chosen node
    pub score: Option<i64>,
    /// Why no node fit
    pub reasons: Vec<String>,
}

impl SimulationRow {
    fn new(position: usize, item: &WorkItem, placement: Placement, deadline_key: &str) -> Self {
        let deadline = item.annotation(deadline_key).map(str::to_string);
        let item = item.key().to_string();
        match placement {
            Placement::Node { node, score } => Self {
                position,
                item,
                deadline,
                node: Some(node),
                score: Some(score),
                reasons: Vec::new(),
            },
            Placement::Unschedulable { reasons } => Self {
                position,
                item,
                deadline,
                node: None,
                score: None,
                reasons,
            },
        }
    }
}

/// Run admission, ordering and placement over a fixture and collect the results
pub async fn run_simulation(
    config: &SchedulerConfig,
    fixture: ClusterFixture,
) -> Result<Vec<SimulationRow>> {
    let (store, snapshot, pending) = fixture.load().await;
    let scheduler = Scheduler::from_config(
        config,
        Arc::new(store),
        Arc::new(snapshot),
        Arc::new(PrioritySort),
    )?;

    let results = scheduler.run(pending).await;
    let rows: Vec<SimulationRow> = results
        .into_iter()
        .enumerate()
        .map(|(i, (item, placement))| {
            SimulationRow::new(i + 1, &item, placement, &config.edf.deadline_annotation)
        })
        .collect();

    info!(
        items = rows.len(),
        placed = rows.iter().filter(|r| r.node.is_some()).count(),
        "Simulation complete"
    );
    Ok(rows)
}

/// Simulate one scheduling pass over a cluster fixture
pub async fn simulate(config: &SchedulerConfig, cluster: &Path, json: bool) -> Result<()> {
    let fixture = ClusterFixture::from_file(cluster)
        .with_context(|| format!("loading cluster {}", cluster.display()))?;
    info!(
        cluster = %cluster.display(),
        nodes = fixture.nodes.len(),
        pending = fixture.pending.len(),
        "Read cluster fixture"
    );
    let rows = run_simulation(config, fixture).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No pending work items.");
        return Ok(());
    }

    println!(
        "{:<4} {:<30} {:<22} {:<20} {:>6}",
        "POS", "ITEM", "DEADLINE", "NODE", "SCORE"
    );
    for row in &rows {
        match (&row.node, row.score) {
            (Some(node), Some(score)) => println!(
                "{:<4} {:<30} {:<22} {:<20} {:>6}",
                row.position,
                row.item,
                row.deadline.as_deref().unwrap_or("-"),
                node,
                score
            ),
            _ => println!(
                "{:<4} {:<30} {:<22} unschedulable: {}",
                row.position,
                row.item,
                row.deadline.as_deref().unwrap_or("-"),
                row.reasons.join("; ")
            ),
        }
    }

    Ok(())
}

/// Print the effective configuration
pub fn check_config(config: &SchedulerConfig) -> Result<()> {
    config.validate()?;
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
