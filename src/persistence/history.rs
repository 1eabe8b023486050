//! Per-iteration swarm history and its CSV export.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::PersistenceError;

/// One particle as evaluated during an iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleRecord {
    /// Index of the particle in the swarm.
    pub id: usize,
    pub position: Vec<f64>,
    pub fitness: Vec<f64>,
}

/// One archive member after an iteration's fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub position: Vec<f64>,
    pub fitness: Vec<f64>,
    pub crowding_distance: f64,
}

/// Observational snapshot of one iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub particles: Vec<ParticleRecord>,
    pub archive: Vec<ArchiveRecord>,
}

impl IterationRecord {
    /// Path of the particle table for `iteration` under `dir`.
    pub fn particles_path(dir: &Path, iteration: usize) -> PathBuf {
        dir.join(format!("iteration{}.csv", iteration))
    }

    /// Path of the archive table for `iteration` under `dir`.
    pub fn archive_path(dir: &Path, iteration: usize) -> PathBuf {
        dir.join(format!("pareto_iteration{}.csv", iteration))
    }

    /// Write both tables into `dir`, creating it if needed.
    ///
    /// Columns are `id, param_0.., <objective names>` for particles and
    /// `param_0.., <objective names>, crowding_distance` for the archive.
    pub fn write_csv(&self, dir: &Path, objective_names: &[String]) -> Result<(), PersistenceError> {
        fs::create_dir_all(dir)?;

        let dimensions = self
            .particles
            .first()
            .map(|p| p.position.len())
            .or_else(|| self.archive.first().map(|e| e.position.len()))
            .unwrap_or(0);
        let params: Vec<String> = (0..dimensions).map(|d| format!("param_{}", d)).collect();

        let mut writer = BufWriter::new(fs::File::create(Self::particles_path(dir, self.iteration))?);
        write_row(
            &mut writer,
            std::iter::once("id".to_string())
                .chain(params.iter().cloned())
                .chain(objective_names.iter().cloned()),
        )?;
        for particle in &self.particles {
            write_row(
                &mut writer,
                std::iter::once(particle.id.to_string())
                    .chain(particle.position.iter().map(f64::to_string))
                    .chain(particle.fitness.iter().map(f64::to_string)),
            )?;
        }
        writer.flush()?;

        let mut writer = BufWriter::new(fs::File::create(Self::archive_path(dir, self.iteration))?);
        write_row(
            &mut writer,
            params
                .iter()
                .cloned()
                .chain(objective_names.iter().cloned())
                .chain(std::iter::once("crowding_distance".to_string())),
        )?;
        for entry in &self.archive {
            write_row(
                &mut writer,
                entry
                    .position
                    .iter()
                    .chain(&entry.fitness)
                    .chain(std::iter::once(&entry.crowding_distance))
                    .map(f64::to_string),
            )?;
        }
        writer.flush()?;

        Ok(())
    }
}

fn write_row<W, I>(writer: &mut W, fields: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = String>,
{
    let line = fields.into_iter().collect::<Vec<_>>().join(",");
    writeln!(writer, "{}", line)
}
