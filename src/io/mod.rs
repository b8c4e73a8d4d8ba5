use ::csv;
use nalgebra::{DMatrix, DVector};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write, BufWriter};
use std::path::Path;
use crate::error::LdaError;

/* Plain-text interchange for the statistics consumed by the LDA and for the
resulting projection. Numeric rows are separated by commas or by runs of
whitespace; matrices in the same file are separated by blank lines. */

fn read_content(path : &Path) -> Result<String, LdaError> {
    let mut content = String::new();
    File::open(path)
        .and_then(|mut f| f.read_to_string(&mut content) )
        .map_err(|source| LdaError::Io { path : path.to_path_buf(), source })?;
    Ok(content)
}

/// Split the content into groups of consecutive non-blank lines, keeping the
/// (1-based) line number where each group starts.
fn split_on_blank_lines(content : &str) -> Vec<(usize, String)> {
    let mut blocks = Vec::new();
    let mut curr : Option<(usize, String)> = None;
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            if let Some(b) = curr.take() {
                blocks.push(b);
            }
        } else {
            let b = curr.get_or_insert_with(|| (i + 1, String::new()) );
            b.1.push_str(line.trim());
            b.1.push('\n');
        }
    }
    if let Some(b) = curr.take() {
        blocks.push(b);
    }
    blocks
}

/// Parse a block of numeric rows. The delimiter is a comma if the first
/// row has one; a single space otherwise, in which case the empty fields
/// left by repeated spaces are skipped.
fn parse_rows(path : &Path, first_line : usize, block : &str) -> Result<Vec<Vec<f64>>, LdaError> {
    let delim = if block.lines().next().map(|l| l.contains(',') ).unwrap_or(false) {
        b','
    } else {
        b' '
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delim)
        .trim(csv::Trim::All)
        .from_reader(block.as_bytes());
    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let line = first_line + i;
        let mut row = Vec::new();
        for field in record.iter().filter(|f| !f.is_empty() ) {
            let v = field.parse::<f64>().map_err(|e| LdaError::Parse {
                path : path.to_path_buf(),
                line,
                msg : format!("'{}': {}", field, e)
            })?;
            row.push(v);
        }
        rows.push(row);
    }
    Ok(rows)
}

fn rows_to_matrix(path : &Path, first_line : usize, rows : Vec<Vec<f64>>) -> Result<DMatrix<f64>, LdaError> {
    let ncols = rows.first().map(|r| r.len() ).unwrap_or(0);
    for (i, r) in rows.iter().enumerate() {
        if r.len() != ncols {
            return Err(LdaError::Parse {
                path : path.to_path_buf(),
                line : first_line + i,
                msg : format!("expected {} columns, found {}", ncols, r.len())
            });
        }
    }
    let nrows = rows.len();
    let data : Vec<f64> = rows.into_iter().flatten().collect();
    Ok(DMatrix::from_row_slice(nrows, ncols, &data[..]))
}

/// Read one full covariance matrix per class. Matrices are written row by row,
/// and consecutive matrices are separated by a blank line.
pub fn read_covariances<P>(path : P) -> Result<Vec<DMatrix<f64>>, LdaError>
where
    P : AsRef<Path>
{
    let path = path.as_ref();
    let content = read_content(path)?;
    let mut covs = Vec::new();
    for (first_line, block) in split_on_blank_lines(&content) {
        let rows = parse_rows(path, first_line, &block)?;
        covs.push(rows_to_matrix(path, first_line, rows)?);
    }
    Ok(covs)
}

/// Read one accumulated mean vector per line.
pub fn read_means<P>(path : P) -> Result<Vec<DVector<f64>>, LdaError>
where
    P : AsRef<Path>
{
    let path = path.as_ref();
    let content = read_content(path)?;
    let mut means = Vec::new();
    for (first_line, block) in split_on_blank_lines(&content) {
        for row in parse_rows(path, first_line, &block)? {
            means.push(DVector::from_vec(row));
        }
    }
    Ok(means)
}

/// Read the per-class frame counts, written as one integer per line.
pub fn read_counts<P>(path : P) -> Result<Vec<f64>, LdaError>
where
    P : AsRef<Path>
{
    let path = path.as_ref();
    let content = read_content(path)?;
    let mut counts = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let c = line.parse::<i64>().map_err(|e| LdaError::Parse {
            path : path.to_path_buf(),
            line : i + 1,
            msg : format!("'{}': {}", line, e)
        })?;
        counts.push(c as f64);
    }
    Ok(counts)
}

/// Write a matrix row by row, with space-separated entries. The projection
/// is written with the discriminant directions as rows, which is the layout
/// the feature transform expects.
pub fn write_matrix<W>(writer : W, m : &DMatrix<f64>) -> std::io::Result<()>
where
    W : Write
{
    let mut w = BufWriter::new(writer);
    for row in m.row_iter() {
        let fields : Vec<String> = row.iter().map(|v| v.to_string() ).collect();
        writeln!(w, "{}", fields.join(" "))?;
    }
    w.flush()
}

pub fn save_matrix<P>(path : P, m : &DMatrix<f64>) -> Result<(), LdaError>
where
    P : AsRef<Path>
{
    let path = path.as_ref();
    OpenOptions::new().write(true).create(true).truncate(true).open(path)
        .and_then(|f| write_matrix(f, m) )
        .map_err(|source| LdaError::Io { path : path.to_path_buf(), source })
}
