//! Writes a synthetic incident archive and lookup table for trying the
//! dashboard without the real dataset.
//!
//! ```text
//! cargo run --bin generate_sample -- [--parquet] [OUT_DIR]
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;
use zip::write::SimpleFileOptions;

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

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

// (region id, region, province id, province, municipalities, lat, lng)
const PROVINCES: &[(i64, &str, i64, &str, &[&str], f64, f64)] = &[
    (12, "Galicia", 15, "A Coruña", &["Santiago", "Ferrol", "Carballo"], 43.1, -8.4),
    (12, "Galicia", 27, "Lugo", &["Monforte", "Viveiro"], 43.0, -7.5),
    (12, "Galicia", 32, "Ourense", &["Verín", "O Barco", "Celanova"], 42.2, -7.7),
    (3, "Asturias", 33, "Asturias", &["Cangas del Narcea", "Tineo"], 43.3, -6.0),
    (8, "Castilla y León", 24, "León", &["Ponferrada", "Astorga"], 42.6, -6.1),
    (8, "Castilla y León", 49, "Zamora", &["Puebla de Sanabria", "Alcañices"], 41.8, -6.2),
    (1, "Andalucía", 21, "Huelva", &["Almonte", "Nerva"], 37.5, -6.8),
    (1, "Andalucía", 29, "Málaga", &["Ronda", "Estepona"], 36.7, -4.8),
];

const CAUSES: &[(i64, &str)] = &[
    (1, "Rayo"),
    (2, "Negligencia"),
    (3, "Accidente"),
    (4, "Intencionado"),
    (5, "Causa desconocida"),
    (6, "Reproducción"),
];

const HEADERS: [&str; 11] = [
    "fecha", "idcomunidad", "idprovincia", "municipio", "superficie", "gastos", "perdidas",
    "lat", "lng", "idcausa", "causa_desc",
];

struct Row {
    date: String,
    region: i64,
    province: i64,
    municipality: String,
    burned: Option<f64>,
    cost: Option<f64>,
    loss: Option<f64>,
    lat: Option<f64>,
    lng: Option<f64>,
    cause: i64,
    cause_text: String,
}

fn generate_rows(rng: &mut SimpleRng, n: usize) -> Vec<Row> {
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default();
    (0..n)
        .map(|_| {
            let (region, _, province, _, munis, lat, lng) = PROVINCES[rng.below(PROVINCES.len())];
            // Summer-heavy: most fires land in July–September.
            let year = rng.below(16) as i64;
            let day_of_year = if rng.next_f64() < 0.7 {
                180 + rng.below(90) as i64
            } else {
                rng.below(365) as i64
            };
            let date = start + Duration::days(year * 365 + day_of_year);
            let date = if rng.next_f64() < 0.01 {
                "sin fecha".to_string()
            } else {
                date.to_string()
            };

            let burned = (rng.next_f64() > 0.03).then(|| rng.gauss(0.5, 1.6).exp());
            let has_coords = rng.next_f64() > 0.1;
            let (cause, cause_text) = if rng.next_f64() < 0.02 {
                (9, String::new())
            } else {
                let (id, text) = CAUSES[rng.below(CAUSES.len())];
                (id, text.to_string())
            };

            Row {
                date,
                region,
                province,
                municipality: munis[rng.below(munis.len())].to_string(),
                burned,
                cost: burned.map(|b| b * (800.0 + rng.next_f64() * 1500.0)),
                loss: (rng.next_f64() > 0.4).then(|| burned.unwrap_or(1.0) * rng.next_f64() * 3000.0),
                lat: has_coords.then(|| lat + rng.gauss(0.0, 0.25)),
                lng: has_coords.then(|| lng + rng.gauss(0.0, 0.25)),
                cause,
                cause_text,
            }
        })
        .collect()
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_default()
}

fn csv_bytes(rows: &[Row]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADERS)?;
    for r in rows {
        writer.write_record([
            r.date.clone(),
            r.region.to_string(),
            r.province.to_string(),
            r.municipality.clone(),
            fmt_opt(r.burned),
            fmt_opt(r.cost),
            fmt_opt(r.loss),
            fmt_opt(r.lat),
            fmt_opt(r.lng),
            r.cause.to_string(),
            r.cause_text.clone(),
        ])?;
    }
    writer.into_inner().context("flushing CSV")
}

fn parquet_bytes(rows: &[Row]) -> Result<Vec<u8>> {
    let text = |values: Vec<&str>| -> ArrayRef { Arc::new(StringArray::from(values)) };
    let int = |values: Vec<i64>| -> ArrayRef { Arc::new(Int64Array::from(values)) };
    let float = |values: Vec<Option<f64>>| -> ArrayRef { Arc::new(Float64Array::from(values)) };

    let columns: Vec<ArrayRef> = vec![
        text(rows.iter().map(|r| r.date.as_str()).collect()),
        int(rows.iter().map(|r| r.region).collect()),
        int(rows.iter().map(|r| r.province).collect()),
        text(rows.iter().map(|r| r.municipality.as_str()).collect()),
        float(rows.iter().map(|r| r.burned).collect()),
        float(rows.iter().map(|r| r.cost).collect()),
        float(rows.iter().map(|r| r.loss).collect()),
        float(rows.iter().map(|r| r.lat).collect()),
        float(rows.iter().map(|r| r.lng).collect()),
        int(rows.iter().map(|r| r.cause).collect()),
        text(rows.iter().map(|r| r.cause_text.as_str()).collect()),
    ];
    let schema = Arc::new(Schema::new(
        HEADERS
            .iter()
            .zip(&columns)
            .map(|(name, col)| Field::new(*name, col.data_type().clone(), true))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(buf)
}

fn write_archive(path: &Path, entry: &str, data: &[u8]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut zip = zip::ZipWriter::new(file);
    // Zips built on macOS carry these; the loader must skip them.
    zip.start_file(format!("__MACOSX/._{entry}"), SimpleFileOptions::default())?;
    zip.write_all(b"\x00\x05\x16\x07")?;
    zip.start_file(entry, SimpleFileOptions::default())?;
    zip.write_all(data)?;
    zip.finish()?;
    Ok(())
}

fn write_lookup(path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["idcomunidad", "comunidad", "idprovincia", "provincia", "idcausa", "causa"])?;

    let mut regions: Vec<(i64, &str)> = PROVINCES.iter().map(|p| (p.0, p.1)).collect();
    regions.dedup();
    let rows = PROVINCES.len().max(CAUSES.len());
    for i in 0..rows {
        let region = regions.get(i);
        let province = PROVINCES.get(i);
        let cause = CAUSES.get(i);
        writer.write_record([
            region.map(|r| r.0.to_string()).unwrap_or_default(),
            region.map(|r| r.1.to_string()).unwrap_or_default(),
            province.map(|p| p.2.to_string()).unwrap_or_default(),
            province.map(|p| p.3.to_string()).unwrap_or_default(),
            cause.map(|c| c.0.to_string()).unwrap_or_default(),
            cause.map(|c| c.1.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut parquet = false;
    let mut out_dir = PathBuf::from(".");
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--parquet" => parquet = true,
            other => out_dir = PathBuf::from(other),
        }
    }
    std::fs::create_dir_all(&out_dir)?;

    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(&mut rng, 5000);

    let (archive, entry, data) = if parquet {
        ("fires-all.parquet.zip", "fires-all.parquet", parquet_bytes(&rows)?)
    } else {
        ("fires-all.csv.zip", "fires-all.csv", csv_bytes(&rows)?)
    };
    let archive_path = out_dir.join(archive);
    write_archive(&archive_path, entry, &data)?;

    let lookup_path = out_dir.join("lookup.csv");
    write_lookup(&lookup_path)?;

    println!(
        "Wrote {} incidents to {} and names to {}",
        rows.len(),
        archive_path.display(),
        lookup_path.display()
    );
    println!(
        "Config: {{\"archive\": \"{archive}\", \"lookup\": \"lookup.csv\"}}"
    );
    Ok(())
}
