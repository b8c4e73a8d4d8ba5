use nalgebra::*;
use std::cmp::Ordering;
use crate::error::LdaError;

/// Eigenpairs of Sw^-1 Sb, in the order the decomposition returned them.
/// Eigenvectors are the unit-norm columns of vectors.
#[derive(Debug, Clone)]
pub struct Eigen {

    pub values : DVector<f64>,

    pub vectors : DMatrix<f64>

}

/// Scale v to unit length, flipping it so that its largest-magnitude entry is
/// positive. Eigenvectors are only defined up to scale, so this just picks a
/// deterministic representative.
fn orient(mut v : DVector<f64>) -> DVector<f64> {
    let norm = v.norm();
    if norm > 0.0 {
        v /= norm;
    }
    let mut max_ix = 0;
    for i in 1..v.nrows() {
        if v[i].abs() > v[max_ix].abs() {
            max_ix = i;
        }
    }
    if v.nrows() > 0 && v[max_ix] < 0.0 {
        v *= -1.0;
    }
    v
}

fn orient_columns(vectors : DMatrix<f64>) -> DMatrix<f64> {
    let cols : Vec<DVector<f64>> = vectors.column_iter().map(|c| orient(c.clone_owned()) ).collect();
    DMatrix::from_columns(&cols[..])
}

/// For a symmetric positive-definite Sw = L L^T, the matrix C = L^-1 Sb L^-T is symmetric
/// and similar to Sw^-1 Sb, so their eigenvalues agree and are real. If y is an eigenvector
/// of C, x = L^-T y is the corresponding eigenvector of Sw^-1 Sb. Returns None if Sw has
/// no Cholesky factor.
fn symmetric_reduction(sw : &DMatrix<f64>, sb : &DMatrix<f64>) -> Option<Eigen> {
    let d = sw.nrows();
    let chol = Cholesky::new(sw.clone())?;
    let l_inv = chol.l().solve_lower_triangular(&DMatrix::<f64>::identity(d, d))?;
    let c = &l_inv * sb * l_inv.transpose();

    // Rounding leaves C slightly asymmetric.
    let c = (&c + c.transpose()) * 0.5;
    let eig = SymmetricEigen::new(c);
    let vectors = l_inv.transpose() * eig.eigenvectors;
    Some(Eigen { values : eig.eigenvalues, vectors : orient_columns(vectors) })
}

/// Relative tolerance under which eigenvalues of the general path are taken as repeated,
/// and under which Sw is taken as symmetric.
const REL_TOL : f64 = 1E-9;

/// Eigen-decomposition of the (in general non-symmetric) M = Sw^-1 Sb through its real
/// Schur form. Eigenvalues whose imaginary part exceeds imag_tol relative to the spectral
/// radius are rejected; the real parts of the remaining ones are kept. Eigenvalues are
/// grouped when they repeat: for a group of k copies of lambda, the eigenvectors are the
/// k eigenvectors of (M - lambda I)^T (M - lambda I) with the smallest eigenvalues, which
/// span the null space of M - lambda I when lambda is not defective.
fn general(m : &DMatrix<f64>, imag_tol : f64) -> Result<Eigen, LdaError> {
    let d = m.nrows();
    let lambdas = m.complex_eigenvalues();
    let radius = lambdas.iter().fold(0.0f64, |r, l| r.max(l.norm()) ).max(f64::MIN_POSITIVE);
    let mut values = DVector::zeros(d);
    for (index, l) in lambdas.iter().enumerate() {
        if l.im.abs() > imag_tol * radius {
            return Err(LdaError::ComplexEigenvalues { index, re : l.re, im : l.im });
        }
        values[index] = l.re;
    }

    let mut cols : Vec<Option<DVector<f64>>> = vec![None; d];
    for i in 0..d {
        if cols[i].is_some() {
            continue;
        }
        let group : Vec<usize> = (i..d)
            .filter(|j| cols[*j].is_none() && (values[*j] - values[i]).abs() <= REL_TOL * radius )
            .collect();
        let shift = group.iter().map(|j| values[*j] ).sum::<f64>() / group.len() as f64;
        let shifted = m - DMatrix::<f64>::identity(d, d) * shift;
        let normal = shifted.transpose() * &shifted;
        let eig = SymmetricEigen::new(normal);
        let mut by_size : Vec<usize> = (0..d).collect();
        by_size.sort_by(|a, b| {
            eig.eigenvalues[*a].partial_cmp(&eig.eigenvalues[*b]).unwrap_or(Ordering::Equal)
        });
        for (j, ix) in group.iter().zip(by_size.iter()) {
            cols[*j] = Some(orient(eig.eigenvectors.column(*ix).clone_owned()));
        }
    }
    let cols : Vec<DVector<f64>> = cols.into_iter().flatten().collect();
    Ok(Eigen { values, vectors : DMatrix::from_columns(&cols[..]) })
}

fn is_symmetric(m : &DMatrix<f64>) -> bool {
    (m - m.transpose()).amax() <= REL_TOL * m.amax().max(f64::MIN_POSITIVE)
}

/// Solves the generalized eigenproblem Sb x = lambda Sw x, given the within-class scatter sw,
/// its inverse sw_inv and the between-class scatter sb. When Sb vanishes (e.g. a single class)
/// every direction is an eigenvector with eigenvalue zero, and the canonical basis is returned.
/// The Cholesky reduction only reads the lower triangle of Sw, so it is used only when Sw is
/// symmetric; other matrices go through the general decomposition of Sw^-1 Sb.
pub fn solve(
    sw : &DMatrix<f64>,
    sw_inv : &DMatrix<f64>,
    sb : &DMatrix<f64>,
    imag_tol : f64
) -> Result<Eigen, LdaError> {
    let d = sw.nrows();
    if sb.iter().all(|v| *v == 0.0 ) {
        return Ok(Eigen { values : DVector::zeros(d), vectors : DMatrix::identity(d, d) });
    }
    if is_symmetric(sw) {
        if let Some(eig) = symmetric_reduction(sw, sb) {
            return Ok(eig);
        }
    }
    tracing::warn!("Within-class scatter is not symmetric positive definite; decomposing Sw^-1 Sb directly");
    general(&(sw_inv * sb), imag_tol)
}
