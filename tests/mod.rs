use nalgebra::*;
use s3lda::*;

const EPS : f64 = 10E-8;

fn is_symmetric(m : &DMatrix<f64>) -> bool {
    (m - m.transpose()).amax() < EPS
}

fn temp_path(name : &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("s3lda-it-{}-{}", std::process::id(), name))
}

fn two_class_inputs() -> (Vec<DVector<f64>>, Vec<DMatrix<f64>>, Vec<f64>) {
    (
        vec![DVector::from_vec(vec![2., 4.]), DVector::from_vec(vec![6., 8.])],
        vec![DMatrix::identity(2, 2), DMatrix::identity(2, 2)],
        vec![1., 1.]
    )
}

/// Random-looking but fixed statistics for n classes in d dimensions.
fn synthetic_inputs(n : usize, d : usize) -> (Vec<DVector<f64>>, Vec<DMatrix<f64>>, Vec<f64>) {
    let counts : Vec<f64> = (0..n).map(|i| 10.0 + 7.0 * i as f64 ).collect();
    let means : Vec<DVector<f64>> = (0..n).map(|i| {
        DVector::from_fn(d, |j, _| counts[i] * (((i * 31 + j * 17) % 13) as f64 - 6.0) )
    }).collect();
    let covs : Vec<DMatrix<f64>> = (0..n).map(|i| {
        let a = DMatrix::from_fn(d, d, |r, c| (((i + 1) * (r + 2) * (c + 3)) % 7) as f64 - 3.0 );
        (&a * a.transpose() + DMatrix::identity(d, d)) * counts[i]
    }).collect();
    (means, covs, counts)
}

#[test]
fn two_class_projection() {
    let (means, covs, counts) = two_class_inputs();
    let lda = compute_lda(means, covs, counts).unwrap();
    let sc = lda.scatter();
    assert_eq!(sc.within, DMatrix::from_row_slice(2, 2, &[2., 0., 0., 2.]));
    assert_eq!(sc.global_mean, DVector::from_vec(vec![4., 6.]));
    assert_eq!(sc.between, DMatrix::from_row_slice(2, 2, &[8., 8., 8., 8.]));

    // Sw^-1 Sb = [[4, 4], [4, 4]] has eigenvalues 8 and 0, with
    // eigenvectors [1, 1] / sqrt(2) and [1, -1] / sqrt(2).
    assert!((lda.eigenvalues()[0] - 8.0).abs() < EPS);
    assert!(lda.eigenvalues()[1].abs() < EPS);
    let h = 0.5f64.sqrt();
    let p = lda.projection();
    let first = DVector::from_vec(vec![h, h]);
    let second = DVector::from_vec(vec![h, -h]);
    assert!((p.row(0).transpose().dot(&first).abs() - 1.0).abs() < EPS);
    assert!((p.row(1).transpose().dot(&second).abs() - 1.0).abs() < EPS);
}

fn unit(d : usize, k : usize) -> DVector<f64> {
    let mut e = DVector::zeros(d);
    e[k] = 1.0;
    e
}

#[test]
fn eigenvalues_sorted_descending() {
    // Pairs of unit-count classes at +/- a along each axis leave the global mean at zero
    // and give Sb = diag(2 a^2) = diag(1, 8, 2). With Sw = diag(1, 2, 4), the eigenvalues of
    // Sw^-1 Sb are 1, 4 and 0.5, and the eigenvectors are the canonical axes.
    let offsets = [0.5f64.sqrt(), 2.0, 1.0];
    let mut means = Vec::new();
    for (k, a) in offsets.iter().enumerate() {
        means.push(unit(3, k) * *a);
        means.push(unit(3, k) * -*a);
    }
    let mut covs = vec![DMatrix::from_diagonal(&DVector::from_vec(vec![1., 2., 4.]))];
    covs.extend((0..5).map(|_| DMatrix::zeros(3, 3) ));
    let lda = compute_lda(means, covs, vec![1.; 6]).unwrap();
    let sb = DMatrix::from_diagonal(&DVector::from_vec(vec![1., 8., 2.]));
    assert!((&lda.scatter().between - sb).amax() < EPS);

    let ev = lda.eigenvalues();
    assert!((ev[0] - 4.0).abs() < EPS);
    assert!((ev[1] - 1.0).abs() < EPS);
    assert!((ev[2] - 0.5).abs() < EPS);
    let p = lda.projection();
    for (row, axis) in [1, 0, 2].iter().enumerate() {
        assert!((p.row(row).transpose().dot(&unit(3, *axis)).abs() - 1.0).abs() < EPS);
    }

    // Three classes with correlated between-class scatter.
    let stats = ClassStats::new(
        vec![
            DVector::from_vec(vec![2., 0., 0.]),
            DVector::from_vec(vec![0., 6., 0.]),
            DVector::from_vec(vec![0., 0., 0.])
        ],
        vec![
            DMatrix::from_diagonal(&DVector::from_vec(vec![4., 1., 1.])),
            DMatrix::from_diagonal(&DVector::from_vec(vec![1., 1., 1.])),
            DMatrix::from_diagonal(&DVector::from_vec(vec![1., 1., 8.]))
        ],
        vec![1., 1., 1.]
    ).unwrap();
    let lda = Lda::from_stats(&stats, &LdaSettings::default()).unwrap();
    let ev = lda.eigenvalues();
    for i in 1..ev.nrows() {
        assert!(ev[i - 1] >= ev[i]);
    }

    // Each row must be an eigenvector of Sw^-1 Sb for the eigenvalue at the same position.
    let sc = lda.scatter();
    let m = sc.within.clone().try_inverse().unwrap() * &sc.between;
    for (i, row) in lda.projection().row_iter().enumerate() {
        let v = row.transpose();
        assert!((&m * &v - &v * ev[i]).norm() < 1E-6);
    }
}

#[test]
fn scatter_matrices_symmetric() {
    for &(n, d) in [(2, 3), (5, 4), (9, 6)].iter() {
        let (means, covs, counts) = synthetic_inputs(n, d);
        let lda = compute_lda(means, covs, counts).unwrap();
        assert!(is_symmetric(&lda.scatter().within));
        assert!(is_symmetric(&lda.scatter().between));
    }
}

#[test]
fn output_is_square_regardless_of_classes() {
    for n in 1..8 {
        let (means, covs, counts) = synthetic_inputs(n, 5);
        let lda = compute_lda(means, covs, counts).unwrap();
        assert_eq!(lda.projection().shape(), (5, 5));
        assert_eq!(lda.eigenvalues().nrows(), 5);
        for row in lda.projection().row_iter() {
            assert!((row.norm() - 1.0).abs() < EPS);
        }
    }
}

#[test]
fn repeated_calls_agree() {
    let (means, covs, counts) = synthetic_inputs(6, 4);
    let a = compute_lda(means.clone(), covs.clone(), counts.clone()).unwrap();
    let b = compute_lda(means, covs, counts).unwrap();
    assert_eq!(a.projection(), b.projection());
    assert_eq!(a.eigenvalues(), b.eigenvalues());
}

#[test]
fn single_class_is_identity() {
    let lda = compute_lda(
        vec![DVector::from_vec(vec![3., 6., 9.])],
        vec![DMatrix::from_row_slice(3, 3, &[3., 1., 0., 1., 3., 0., 0., 0., 3.])],
        vec![3.]
    ).unwrap();
    assert_eq!(lda.scatter().between, DMatrix::zeros(3, 3));
    assert_eq!(lda.eigenvalues(), &DVector::zeros(3));
    assert_eq!(lda.projection(), &DMatrix::identity(3, 3));
}

#[test]
fn asymmetric_covariance_solves_full_product() {
    // Sw = [[2, 1], [0, 2]] and Sb = [[8, 8], [8, 8]] make Sw^-1 Sb = [[2, 2], [4, 4]],
    // with eigenvalues 6 and 0.
    let lda = compute_lda(
        vec![DVector::from_vec(vec![2., 4.]), DVector::from_vec(vec![6., 8.])],
        vec![DMatrix::from_row_slice(2, 2, &[2., 1., 0., 2.]), DMatrix::zeros(2, 2)],
        vec![1., 1.]
    ).unwrap();
    let m = DMatrix::from_row_slice(2, 2, &[2., 2., 4., 4.]);
    let ev = lda.eigenvalues();
    assert!((ev[0] - 6.0).abs() < 1E-6);
    assert!(ev[1].abs() < 1E-6);
    for (i, row) in lda.projection().row_iter().enumerate() {
        let v = row.transpose();
        assert!((&m * &v - &v * ev[i]).norm() < 1E-6);
    }
}

#[test]
fn indefinite_scatter_keeps_full_rank() {
    // Sw = diag(1, -1, 1) has no Cholesky factor; Sw^-1 Sb = diag(2, 0, 0) has the
    // eigenvalue 0 twice, and each copy needs its own direction.
    let lda = compute_lda(
        vec![DVector::from_vec(vec![1., 0., 0.]), DVector::from_vec(vec![-1., 0., 0.])],
        vec![DMatrix::from_diagonal(&DVector::from_vec(vec![1., -1., 1.])), DMatrix::zeros(3, 3)],
        vec![1., 1.]
    ).unwrap();
    assert!((lda.eigenvalues()[0] - 2.0).abs() < EPS);
    assert_eq!(lda.projection().rank(1E-8), 3);
}

#[test]
fn errors_at_boundary() {
    let (means, covs, _) = two_class_inputs();
    assert!(matches!(compute_lda(means.clone(), covs.clone(), vec![1.]), Err(LdaError::DimensionMismatch { .. })));
    let gc = GaussianCounts::new(means, covs, vec![1., 1.], false);
    let res = Lda::from_source(StatsSource::Counts(gc), &LdaSettings::default());
    assert!(matches!(res, Err(LdaError::Configuration(_))));
}

#[test]
fn files_source_matches_arrays() {
    let covfile = temp_path("covs");
    let countfile = temp_path("counts");
    std::fs::write(&covfile, "1 0\n0 1\n\n1 0\n0 1\n").unwrap();
    std::fs::write(&countfile, "1\n1\n").unwrap();
    let (means, covs, counts) = two_class_inputs();
    let source = StatsSource::Files {
        means : means.clone(),
        covfile : covfile.clone(),
        countfile : countfile.clone(),
        pass2var : true
    };
    let from_files = Lda::from_source(source, &LdaSettings::default()).unwrap();
    let from_arrays = compute_lda(means, covs, counts).unwrap();
    assert_eq!(from_files.projection(), from_arrays.projection());
    std::fs::remove_file(covfile).ok();
    std::fs::remove_file(countfile).ok();
}

#[test]
fn counts_dump_to_projection_file() {
    let (means, covs, counts) = synthetic_inputs(4, 3);
    let gc = GaussianCounts::new(means, covs, counts, true);
    let json = temp_path("counts.json");
    gc.save_to_path(&json).unwrap();
    let loaded = GaussianCounts::load_from_path(&json).unwrap();
    let lda = Lda::from_source(loaded.into(), &LdaSettings { dim : Some(2), ..Default::default() }).unwrap();
    assert_eq!(lda.projection().shape(), (2, 3));

    let out = temp_path("lda.txt");
    s3lda::io::save_matrix(&out, lda.projection()).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    let rows : Vec<Vec<f64>> = text.lines()
        .map(|l| l.split_whitespace().map(|v| v.parse::<f64>().unwrap() ).collect() )
        .collect();
    assert_eq!(rows.len(), 2);
    for (i, row) in rows.iter().enumerate() {
        for (j, v) in row.iter().enumerate() {
            assert!((v - lda.projection()[(i, j)]).abs() < EPS);
        }
    }
    std::fs::remove_file(json).ok();
    std::fs::remove_file(out).ok();
}
