use nalgebra::*;
use serde::{Serialize, Deserialize};
use std::path::{Path, PathBuf};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use crate::error::LdaError;
use crate::io;

/// Per-class sufficient statistics for a single-stream, full-covariance acoustic model,
/// validated to share a common feature dimension. The means are accumulated sums over
/// the frames assigned to each class (divide by the count to get the class mean); the
/// covariances are likewise summed rather than averaged.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassStats {

    means : Vec<DVector<f64>>,

    covariances : Vec<DMatrix<f64>>,

    counts : Vec<f64>,

    dim : usize

}

impl ClassStats {

    /// Validates that the three sequences have one entry per class, that every mean has
    /// the same length D and every covariance is DxD, and that counts are non-negative
    /// with a positive total.
    pub fn new(
        means : Vec<DVector<f64>>,
        covariances : Vec<DMatrix<f64>>,
        counts : Vec<f64>
    ) -> Result<Self, LdaError> {
        let n = means.len();
        if n == 0 {
            return Err(LdaError::Empty);
        }
        if covariances.len() != n {
            return Err(LdaError::mismatch("number of covariance matrices", n, covariances.len()));
        }
        if counts.len() != n {
            return Err(LdaError::mismatch("number of counts", n, counts.len()));
        }
        let dim = means[0].nrows();
        for (i, m) in means.iter().enumerate() {
            if m.nrows() != dim {
                return Err(LdaError::mismatch(format!("length of mean {}", i), dim, m.nrows()));
            }
        }
        for (i, c) in covariances.iter().enumerate() {
            if c.nrows() != dim {
                return Err(LdaError::mismatch(format!("rows of covariance {}", i), dim, c.nrows()));
            }
            if c.ncols() != dim {
                return Err(LdaError::mismatch(format!("columns of covariance {}", i), dim, c.ncols()));
            }
        }
        for (class, &count) in counts.iter().enumerate() {
            if !count.is_finite() || count < 0.0 {
                return Err(LdaError::InvalidCount { class, count });
            }
        }
        if counts.iter().sum::<f64>() <= 0.0 {
            return Err(LdaError::ZeroTotalCount(n));
        }
        Ok(Self { means, covariances, counts, dim })
    }

    pub fn means(&self) -> &[DVector<f64>] {
        &self.means[..]
    }

    pub fn covariances(&self) -> &[DMatrix<f64>] {
        &self.covariances[..]
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts[..]
    }

    /// Feature dimension D.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of classes N.
    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn total_count(&self) -> f64 {
        self.counts.iter().sum()
    }

}

/// Gaussian counts as dumped by the Baum-Welch pass for a single-stream,
/// single-density-per-state model: accumulated means, full variances and
/// the occupation counts (dnom) of every state. pass2var records whether
/// the variances were accumulated around the re-estimated means, which is
/// required for them to be valid covariance statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GaussianCounts {

    means : Vec<DVector<f64>>,

    vars : Vec<DMatrix<f64>>,

    dnom : Vec<f64>,

    pass2var : bool

}

impl GaussianCounts {

    pub fn new(
        means : Vec<DVector<f64>>,
        vars : Vec<DMatrix<f64>>,
        dnom : Vec<f64>,
        pass2var : bool
    ) -> Self {
        Self { means, vars, dnom, pass2var }
    }

    pub fn means(&self) -> &[DVector<f64>] {
        &self.means[..]
    }

    pub fn vars(&self) -> &[DMatrix<f64>] {
        &self.vars[..]
    }

    pub fn dnom(&self) -> &[f64] {
        &self.dnom[..]
    }

    pub fn pass2var(&self) -> bool {
        self.pass2var
    }

    /// Converts the counts into validated class statistics. Fails if the
    /// variances were not accumulated in a second pass.
    pub fn into_stats(self) -> Result<ClassStats, LdaError> {
        require_pass2var(self.pass2var)?;
        ClassStats::new(self.means, self.vars, self.dnom)
    }

    pub fn load_from_path<P>(path : P) -> Result<Self, LdaError>
    where
        P : AsRef<Path>
    {
        let f = File::open(path.as_ref())
            .map_err(|source| LdaError::Io { path : path.as_ref().to_path_buf(), source })?;
        Self::load(f)
    }

    pub fn load<R>(mut reader : R) -> Result<Self, LdaError>
    where
        R : Read
    {
        let mut content = String::new();
        reader.read_to_string(&mut content)
            .map_err(|source| LdaError::Io { path : PathBuf::new(), source })?;
        Ok(serde_json::from_str(&content[..])?)
    }

    pub fn save_to_path<P>(&self, path : P) -> Result<(), LdaError>
    where
        P : AsRef<Path>
    {
        let file = OpenOptions::new().write(true).create(true).truncate(true).open(path.as_ref())
            .map_err(|source| LdaError::Io { path : path.as_ref().to_path_buf(), source })?;
        self.save(file)
    }

    pub fn save<W>(&self, writer : W) -> Result<(), LdaError>
    where
        W : Write
    {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

}

fn require_pass2var(pass2var : bool) -> Result<(), LdaError> {
    if pass2var {
        Ok(())
    } else {
        Err(LdaError::Configuration(
            String::from("variances were not accumulated in a second pass; re-run bw with '-2passvar yes'")
        ))
    }
}

/// Where the class statistics for an LDA come from. Exactly one source is active:
/// either the Gaussian counts object as a whole, or accumulated means combined with
/// a covariance file and a plain-text count file, or arrays that were already
/// validated by the caller.
#[derive(Debug, Clone)]
pub enum StatsSource {

    /// Means, variances and counts read from the same accumulator dump.
    Counts(GaussianCounts),

    /// Accumulated means, with full covariances and counts read from separate files.
    /// The files carry no record of how the covariances were accumulated, so pass2var
    /// states it; the source is rejected unless they come from a second pass.
    Files {
        means : Vec<DVector<f64>>,
        covfile : PathBuf,
        countfile : PathBuf,
        pass2var : bool
    },

    Raw(ClassStats)

}

impl StatsSource {

    pub fn resolve(self) -> Result<ClassStats, LdaError> {
        match self {
            StatsSource::Counts(counts) => counts.into_stats(),
            StatsSource::Files { means, covfile, countfile, pass2var } => {
                require_pass2var(pass2var)?;
                let covariances = io::read_covariances(&covfile)?;
                let counts = io::read_counts(&countfile)?;
                ClassStats::new(means, covariances, counts)
            },
            StatsSource::Raw(stats) => Ok(stats)
        }
    }

}

impl From<GaussianCounts> for StatsSource {

    fn from(counts : GaussianCounts) -> Self {
        StatsSource::Counts(counts)
    }

}

impl From<ClassStats> for StatsSource {

    fn from(stats : ClassStats) -> Self {
        StatsSource::Raw(stats)
    }

}
