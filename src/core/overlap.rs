//! Client presence across broadcasters: exclusivity and pairwise overlap

use clap::ValueEnum;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::metrics::ratio;
use crate::core::types::Transaction;

/// Metric of the pairwise intersection matrix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OverlapMetric {
    /// Clients present under both broadcasters (default)
    #[default]
    Clients,
    /// Sum of the smaller revenue of each common client
    Revenue,
    /// Sum of the smaller insertion count of each common client
    Insertions,
}

impl OverlapMetric {
    pub(crate) fn label(self) -> &'static str {
        match self {
            OverlapMetric::Clients => "Clients in common",
            OverlapMetric::Revenue => "Revenue in common",
            OverlapMetric::Insertions => "Insertions in common",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Cell {
    revenue: f64,
    insertions: f64,
}

impl Cell {
    /// A client is present under a broadcaster when it billed something there
    fn present(&self) -> bool {
        self.revenue > 0.0
    }
}

/// Per (client, broadcaster) sums over the filtered window
#[derive(Debug, Clone, Default)]
pub(crate) struct PresenceMatrix {
    broadcasters: Vec<String>,
    cells: BTreeMap<String, BTreeMap<String, Cell>>,
}

impl PresenceMatrix {
    pub(crate) fn build(rows: &[Transaction]) -> Self {
        let mut cells: BTreeMap<String, BTreeMap<String, Cell>> = BTreeMap::new();
        let mut broadcasters: BTreeSet<String> = BTreeSet::new();
        for t in rows {
            let cell = cells
                .entry(t.client.clone())
                .or_default()
                .entry(t.broadcaster.clone())
                .or_default();
            cell.revenue += t.revenue;
            cell.insertions += t.insertions;
            broadcasters.insert(t.broadcaster.clone());
        }
        PresenceMatrix {
            broadcasters: broadcasters.into_iter().collect(),
            cells,
        }
    }

    /// Every broadcaster seen in the window, sorted
    pub(crate) fn broadcasters(&self) -> &[String] {
        &self.broadcasters
    }

    fn cell(&self, client: &str, broadcaster: &str) -> Cell {
        self.cells
            .get(client)
            .and_then(|by| by.get(broadcaster))
            .copied()
            .unwrap_or_default()
    }

    /// Broadcasters under which `client` is present, sorted
    pub(crate) fn presence(&self, client: &str) -> Vec<&str> {
        self.cells.get(client).map_or_else(Vec::new, |by| {
            by.iter()
                .filter(|(_, c)| c.present())
                .map(|(b, _)| b.as_str())
                .collect()
        })
    }

    fn presence_count(&self, client: &str) -> usize {
        self.presence(client).len()
    }

    /// Clients present under two or more broadcasters
    pub(crate) fn shared_clients(&self) -> Vec<&str> {
        self.cells
            .keys()
            .filter(|c| self.presence_count(c) >= 2)
            .map(String::as_str)
            .collect()
    }

    /// Exclusive and shared figures of every broadcaster
    pub(crate) fn exclusivity(&self) -> Vec<Exclusivity> {
        self.broadcasters
            .iter()
            .map(|b| {
                let mut row = Exclusivity {
                    broadcaster: b.clone(),
                    ..Exclusivity::default()
                };
                for client in self.cells.keys() {
                    let cell = self.cell(client, b);
                    row.total_revenue += cell.revenue;
                    if !cell.present() {
                        continue;
                    }
                    match self.presence_count(client) {
                        1 => row.exclusive.add(cell),
                        _ => row.shared.add(cell),
                    }
                }
                row
            })
            .collect()
    }

    /// Symmetric broadcaster x broadcaster matrix for `metric`
    pub(crate) fn intersection(&self, metric: OverlapMetric) -> OverlapMatrix {
        let n = self.broadcasters.len();
        let mut values = vec![vec![0.0; n]; n];
        for i in 0..n {
            values[i][i] = self.own_total(&self.broadcasters[i], metric);
            for j in (i + 1)..n {
                let v = self.pair_value(&self.broadcasters[i], &self.broadcasters[j], metric);
                values[i][j] = v;
                values[j][i] = v;
            }
        }
        OverlapMatrix {
            labels: self.broadcasters.clone(),
            values,
        }
    }

    fn own_total(&self, broadcaster: &str, metric: OverlapMetric) -> f64 {
        self.cells
            .keys()
            .map(|client| {
                let c = self.cell(client, broadcaster);
                match metric {
                    OverlapMetric::Clients => f64::from(u8::from(c.present())),
                    OverlapMetric::Revenue => c.revenue,
                    OverlapMetric::Insertions => c.insertions,
                }
            })
            .sum()
    }

    fn pair_value(&self, a: &str, b: &str, metric: OverlapMetric) -> f64 {
        self.cells
            .keys()
            .map(|client| {
                let (ca, cb) = (self.cell(client, a), self.cell(client, b));
                let v = match metric {
                    OverlapMetric::Clients => f64::from(u8::from(ca.present() && cb.present())),
                    OverlapMetric::Revenue => ca.revenue.min(cb.revenue),
                    OverlapMetric::Insertions => ca.insertions.min(cb.insertions),
                };
                if v > 0.0 { v } else { 0.0 }
            })
            .sum()
    }
}

/// Revenue and insertions of one client category under a broadcaster
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Share {
    pub(crate) clients: usize,
    pub(crate) revenue: f64,
    pub(crate) insertions: f64,
}

impl Share {
    fn add(&mut self, cell: Cell) {
        self.clients += 1;
        self.revenue += cell.revenue;
        self.insertions += cell.insertions;
    }
}

/// Exclusive vs shared split of one broadcaster
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Exclusivity {
    pub(crate) broadcaster: String,
    pub(crate) exclusive: Share,
    pub(crate) shared: Share,
    pub(crate) total_revenue: f64,
}

impl Exclusivity {
    /// Percentage of the broadcaster's revenue coming from exclusive clients
    pub(crate) fn exclusive_pct(&self) -> Option<f64> {
        ratio(self.exclusive.revenue, self.total_revenue).map(|r| r * 100.0)
    }

    pub(crate) fn shared_pct(&self) -> Option<f64> {
        ratio(self.shared.revenue, self.total_revenue).map(|r| r * 100.0)
    }
}

/// Square matrix indexed by broadcaster labels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct OverlapMatrix {
    pub(crate) labels: Vec<String>,
    pub(crate) values: Vec<Vec<f64>>,
}

impl OverlapMatrix {
    pub(crate) fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        Some(self.values[i][j])
    }
}
