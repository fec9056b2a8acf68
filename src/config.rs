use serde::Serialize;
use serde_json;
use std::fs::File;
use std::path::Path;

#[derive(Serialize)]
pub struct RunConfig {
    pub geometry: GeometryConfig,
    pub dielectric: DielectricConfig,
    pub charges: ChargeConfig,
    pub solver: SolverConfig,
    pub run: RunInfo,
}

#[derive(Serialize)]
pub struct GeometryConfig {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

#[derive(Serialize)]
pub struct DielectricConfig {
    pub epsilon0: f64,
    pub radius: f64,
    pub softness: f64,
    pub center: [f64; 3],
}

#[derive(Serialize)]
pub struct ChargeConfig {
    pub sigma: f64,
    pub charge: f64,
    pub offset: f64,
    pub axis: usize,
}

#[derive(Serialize)]
pub struct SolverConfig {
    pub max_iter: usize,
    pub tol: f64,
    pub mixing: f64,
}

#[derive(Serialize)]
pub struct RunInfo {
    pub binary: String,
    pub run_id: String,
}

impl RunConfig {
    pub fn write_to_dir(&self, out_dir: &Path) -> std::io::Result<()> {
        let path = out_dir.join("config.json");
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
