//! Generate a synthetic station workbook so the viewer runs without the real
//! Digital Ocean Ireland export. Writes `ireland_water_level_hourly.json`
//! next to the working directory; the signal is a deterministic semidiurnal
//! tide (M2 + S2 constituents) plus noise.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

#[derive(Serialize)]
struct Row {
    time: String,
    #[serde(rename = "water level")]
    water_level: f64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        mean + std_dev * z
    }
}

/// Tidal parameters per station: (mean level m, M2 amplitude, S2 amplitude, phase).
fn station_params(name: &str) -> (f64, f64, f64, f64) {
    match name {
        "Dublin Port" => (2.4, 1.5, 0.5, 0.0),
        "Galway Port" => (2.9, 1.9, 0.6, 1.1),
        _ => (2.1, 1.3, 0.4, 2.3),
    }
}

fn generate_station(name: &str, hours: i64, rng: &mut SimpleRng) -> Vec<Row> {
    // Semidiurnal constituent periods in hours.
    const M2_PERIOD: f64 = 12.42;
    const S2_PERIOD: f64 = 12.0;

    let (mean, m2_amp, s2_amp, phase) = station_params(name);
    let start = NaiveDate::from_ymd_opt(2023, 1, 1)
        .expect("valid start date")
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid");

    (0..hours)
        .map(|h| {
            let t = h as f64;
            let level = mean
                + m2_amp * (2.0 * PI * t / M2_PERIOD + phase).sin()
                + s2_amp * (2.0 * PI * t / S2_PERIOD + phase * 0.5).sin()
                + rng.gauss(0.0, 0.05);
            Row {
                time: (start + Duration::hours(h))
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
                water_level: (level * 1000.0).round() / 1000.0,
            }
        })
        .collect()
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    // 90 days of hourly samples per station.
    let hours = 90 * 24;
    let mut workbook: BTreeMap<&str, Vec<Row>> = BTreeMap::new();
    for name in ["Dublin Port", "Galway Port", "Sligo"] {
        workbook.insert(name, generate_station(name, hours, &mut rng));
    }

    let out = "ireland_water_level_hourly.json";
    let json = serde_json::to_string_pretty(&workbook).context("serializing workbook")?;
    std::fs::write(out, json).with_context(|| format!("writing {out}"))?;
    println!(
        "wrote {out}: {} sheets x {hours} rows",
        workbook.len()
    );
    Ok(())
}
