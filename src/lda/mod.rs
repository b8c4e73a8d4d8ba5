use nalgebra::*;
use std::cmp::Ordering;
use std::fmt::{self, Display};
use tracing::{debug, info};
use crate::error::LdaError;
use crate::stats::{ClassStats, StatsSource};

/// Generalized eigen-decomposition of the scatter pair.
pub mod eigen;

/// Global mean and scatter matrices gathered from per-class statistics.
/// Both scatter matrices are symmetric by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Scatter {

    /// Sum of the accumulated means divided by the total count. Since the
    /// means are raw sums, this is the count-weighted average of the class means.
    pub global_mean : DVector<f64>,

    /// Sw: sum of the (already summed) class covariances.
    pub within : DMatrix<f64>,

    /// Sb: sum of n_i (m_i / n_i - mu)(m_i / n_i - mu)^T over classes.
    pub between : DMatrix<f64>

}

impl Scatter {

    pub fn from_stats(stats : &ClassStats) -> Self {
        let d = stats.dim();
        let mut sum = DVector::<f64>::zeros(d);
        for m in stats.means() {
            sum += m;
        }

        // Means are accumulated sums, so they are not normalized class-wise here;
        // only the between-class term divides each one by its count.
        let global_mean = sum / stats.total_count();

        let mut within = DMatrix::<f64>::zeros(d, d);
        for c in stats.covariances() {
            within += c;
        }

        let mut between = DMatrix::<f64>::zeros(d, d);
        for (m, &n) in stats.means().iter().zip(stats.counts().iter()) {
            if n == 0.0 {
                continue;
            }
            let diff = m / n - &global_mean;
            between += (&diff * diff.transpose()) * n;
        }
        Self { global_mean, within, between }
    }

}

/// Positions of values from the largest to the smallest. The sort is stable, so
/// equal values keep their original order.
fn descending_order(values : &DVector<f64>) -> Vec<usize> {
    let mut order : Vec<usize> = (0..values.nrows()).collect();
    order.sort_by(|a, b| values[*b].partial_cmp(&values[*a]).unwrap_or(Ordering::Equal) );
    order
}

/// Tuning of the LDA computation.
#[derive(Debug, Clone, Copy)]
pub struct LdaSettings {

    /// Keep only the leading discriminant directions. All D of them are kept if None.
    pub dim : Option<usize>,

    /// Largest imaginary part, relative to the spectral radius, tolerated in an eigenvalue
    /// of Sw^-1 Sb before it is considered complex. Only relevant when Sw is not
    /// symmetric positive-definite, otherwise eigenvalues are real by construction.
    pub imag_tol : f64

}

impl Default for LdaSettings {

    fn default() -> Self {
        Self { dim : None, imag_tol : 1E-8 }
    }

}

/// Fisher linear discriminant of a set of Gaussian classes. The projection rows are
/// the eigenvectors of Sw^-1 Sb ordered from the largest to the smallest eigenvalue,
/// so the leading rows are the axes of maximum discriminability, and keeping the first k
/// rows reduces features to k dimensions.
#[derive(Debug, Clone)]
pub struct Lda {

    projection : DMatrix<f64>,

    eigenvalues : DVector<f64>,

    scatter : Scatter

}

impl Lda {

    pub fn from_source(source : StatsSource, settings : &LdaSettings) -> Result<Self, LdaError> {
        let stats = source.resolve()?;
        Self::from_stats(&stats, settings)
    }

    pub fn from_stats(stats : &ClassStats, settings : &LdaSettings) -> Result<Self, LdaError> {
        let d = stats.dim();
        if let Some(k) = settings.dim {
            if k == 0 || k > d {
                return Err(LdaError::mismatch("number of discriminant directions", d, k));
            }
        }
        info!(classes = stats.len(), dim = d, frames = stats.total_count(), "Computing LDA");
        let scatter = Scatter::from_stats(stats);
        debug!("Sw:\n{}", scatter.within);
        debug!("Sb:\n{}", scatter.between);

        let sw_inv = match scatter.within.clone().try_inverse() {
            Some(inv) if inv.iter().all(|v| v.is_finite() ) => inv,
            _ => {
                return Err(LdaError::SingularMatrix {
                    which : "within-class scatter",
                    det : scatter.within.determinant()
                });
            }
        };
        let eig = eigen::solve(&scatter.within, &sw_inv, &scatter.between, settings.imag_tol)?;

        let order = descending_order(&eig.values);
        let k = settings.dim.unwrap_or(d);
        let eigenvalues = DVector::from_iterator(k, order.iter().take(k).map(|ix| eig.values[*ix] ));

        // Eigenvectors are the columns of the decomposition; the projection holds them as rows.
        let projection = DMatrix::from_fn(k, d, |i, j| eig.vectors[(j, order[i])] );
        debug!("Eigenvalues:\n{}", eigenvalues);
        debug!("Eigenvectors:\n{}", projection);
        Ok(Self { projection, eigenvalues, scatter })
    }

    /// kxD matrix whose rows are the discriminant directions.
    pub fn projection(&self) -> &DMatrix<f64> {
        &self.projection
    }

    /// Eigenvalues in descending order, one per projection row.
    pub fn eigenvalues(&self) -> &DVector<f64> {
        &self.eigenvalues
    }

    pub fn scatter(&self) -> &Scatter {
        &self.scatter
    }

    /// Returns the first k rows of the projection.
    pub fn reduce(&self, k : usize) -> Result<DMatrix<f64>, LdaError> {
        if k > self.projection.nrows() {
            return Err(LdaError::mismatch("number of discriminant directions", self.projection.nrows(), k));
        }
        Ok(self.projection.rows(0, k).clone_owned())
    }

    /// Maps a D-dimensional feature vector to the discriminant axes.
    pub fn project(&self, x : &DVector<f64>) -> Result<DVector<f64>, LdaError> {
        if x.nrows() != self.projection.ncols() {
            return Err(LdaError::mismatch("feature dimension", self.projection.ncols(), x.nrows()));
        }
        Ok(&self.projection * x)
    }

}

impl Display for Lda {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Eigenvalues:{}", self.eigenvalues.transpose())?;
        write!(f, "Projection:{}", self.projection)
    }

}

/// Computes the LDA projection from accumulated class means, summed covariances
/// and frame counts (one entry per class in each).
pub fn compute_lda(
    means : Vec<DVector<f64>>,
    covariances : Vec<DMatrix<f64>>,
    counts : Vec<f64>
) -> Result<Lda, LdaError> {
    let stats = ClassStats::new(means, covariances, counts)?;
    Lda::from_stats(&stats, &LdaSettings::default())
}
