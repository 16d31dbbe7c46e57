use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use crate::models::FeatureRecord;
use crate::schema::FEATURE_COUNT;

/// Résumé statistique d'une fenêtre de capture
///
/// Quatre valeurs dérivées par canal du schéma, plus l'IP source dominante.
/// Toujours entièrement peuplé, y compris pour une fenêtre vide.
#[derive(Debug, Clone)]
pub struct AggregatedWindow {
    pub mean: [f64; FEATURE_COUNT],
    pub std: [f64; FEATURE_COUNT],
    pub min: [f64; FEATURE_COUNT],
    pub max: [f64; FEATURE_COUNT],
    pub dominant_src_ip: String,
    pub record_count: usize,
}

impl AggregatedWindow {
    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}

/// Tampon des enregistrements accumulés depuis le dernier vidage
pub struct WindowBuffer {
    records: Vec<FeatureRecord>,
    window_start: Instant,
}

impl WindowBuffer {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            window_start: Instant::now(),
        }
    }

    pub fn push(&mut self, record: FeatureRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// La fermeture est purement temporelle, jamais liée au nombre
    /// d'enregistrements
    pub fn should_flush(&self, interval: Duration) -> bool {
        self.window_start.elapsed() >= interval
    }

    /// Réduit la fenêtre courante et repart d'un tampon vide
    pub fn flush(&mut self) -> AggregatedWindow {
        let aggregate = aggregate(&self.records);
        self.records.clear();
        self.window_start = Instant::now();
        aggregate
    }
}

impl Default for WindowBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Réduit une liste d'enregistrements en statistiques par canal
///
/// Une liste vide produit un agrégat dégénéré tout à zéro avec
/// `dominant_src_ip == "unknown"`, jamais une erreur.
pub fn aggregate(records: &[FeatureRecord]) -> AggregatedWindow {
    let mut window = AggregatedWindow {
        mean: [0.0; FEATURE_COUNT],
        std: [0.0; FEATURE_COUNT],
        min: [0.0; FEATURE_COUNT],
        max: [0.0; FEATURE_COUNT],
        dominant_src_ip: "unknown".to_string(),
        record_count: records.len(),
    };

    if records.is_empty() {
        return window;
    }

    let n = records.len() as f64;

    for i in 0..FEATURE_COUNT {
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for record in records {
            let v = record.get(i);
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        let mean = sum / n;

        // Écart-type de population, pas d'échantillon
        let variance = records
            .iter()
            .map(|r| {
                let diff = r.get(i) - mean;
                diff * diff
            })
            .sum::<f64>()
            / n;

        window.mean[i] = mean;
        window.std[i] = variance.sqrt();
        window.min[i] = min;
        window.max[i] = max;
    }

    window.dominant_src_ip = dominant_src_ip(records);
    window
}

/// IP source la plus fréquente de la fenêtre
///
/// En cas d'égalité, la première IP rencontrée dans l'ordre d'arrivée gagne.
fn dominant_src_ip(records: &[FeatureRecord]) -> String {
    let mut counts: HashMap<IpAddr, usize> = HashMap::new();
    let mut first_seen: Vec<IpAddr> = Vec::new();

    for record in records {
        if let Some(ip) = record.src_ip {
            let count = counts.entry(ip).or_insert(0);
            if *count == 0 {
                first_seen.push(ip);
            }
            *count += 1;
        }
    }

    let mut best: Option<(IpAddr, usize)> = None;
    for ip in first_seen {
        let count = counts[&ip];
        if best.map(|(_, c)| count > c).unwrap_or(true) {
            best = Some((ip, count));
        }
    }

    best.map(|(ip, _)| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
