//! Trained Gaussian-mixture signature sets
//!
//! A signature set is stored as tagged plain text. Each tag ends in `:`
//! and its values run until the next tag, so numbers may be spread over
//! several lines:
//!
//! ```text
//! title: example
//! nbands: 2
//! class:
//!  classnum: 0
//!  classtitle: background
//!  subclass:
//!   pi: 1.0
//!   means: 10 20
//!   covar:
//!    4 0
//!    0 9
//!  endsubclass:
//! endclass:
//! ```
//!
//! Unknown tags are skipped along with their values. Covariances are
//! inverted once at load time.

use crate::error::{CccError, CccResult};
use log::trace;
use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;
use std::path::Path;

const DEFAULT_MODEL: &str = include_str!("../data/default.sig");

/// One Gaussian component of a class mixture
#[derive(Debug, Clone)]
pub struct Subclass {
    /// Mixture weight
    pub pi: f64,
    /// Mean vector
    pub means: DVector<f64>,
    /// Covariance matrix
    pub covariance: DMatrix<f64>,
    /// Inverse of the covariance matrix
    pub inverse: DMatrix<f64>,
    /// `-0.5 ln|C| - (d/2) ln 2pi`
    pub log_norm: f64,
}

impl Subclass {
    /// Build a subclass, inverting its covariance.
    ///
    /// Returns `None` if the covariance is not invertible or has a
    /// non-positive determinant.
    pub fn new(pi: f64, means: DVector<f64>, covariance: DMatrix<f64>) -> Option<Self> {
        let n = means.len();
        if covariance.nrows() != n || covariance.ncols() != n {
            return None;
        }
        let det = covariance.determinant();
        if !(det.is_finite() && det > 0.0) {
            return None;
        }
        let inverse = covariance.clone().try_inverse()?;
        let log_norm = -0.5 * det.ln() - 0.5 * n as f64 * (2.0 * PI).ln();
        Some(Self {
            pi,
            means,
            covariance,
            inverse,
            log_norm,
        })
    }

    /// Number of bands
    #[inline]
    pub fn nbands(&self) -> usize {
        self.means.len()
    }
}

/// One class of a signature set
#[derive(Debug, Clone)]
pub struct SignatureClass {
    /// Class number from the model file
    pub number: i64,
    /// Class title
    pub title: String,
    /// Mixture components
    pub subclasses: Vec<Subclass>,
}

/// A trained multi-class Gaussian-mixture model
#[derive(Debug, Clone)]
pub struct SignatureSet {
    /// Model title
    pub title: String,
    /// Feature dimensionality
    pub nbands: usize,
    /// Classes in file order
    pub classes: Vec<SignatureClass>,
}

// ============================================================================
// Tokenizer
// ============================================================================

struct Entry<'a> {
    tag: &'a str,
    line: usize,
    values: Vec<&'a str>,
}

fn parse_error(line: usize, message: impl Into<String>) -> CccError {
    CccError::ModelParse {
        line,
        message: message.into(),
    }
}

fn entries(text: &str) -> CccResult<Vec<Entry<'_>>> {
    let mut out: Vec<Entry<'_>> = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        for token in line.split_whitespace() {
            if let Some(tag) = token.strip_suffix(':') {
                out.push(Entry {
                    tag,
                    line: line_no,
                    values: Vec::new(),
                });
            } else {
                match out.last_mut() {
                    Some(entry) => entry.values.push(token),
                    None => {
                        return Err(parse_error(line_no, format!("value '{token}' before any tag")));
                    }
                }
            }
        }
    }
    Ok(out)
}

impl Entry<'_> {
    fn numbers(&self, count: usize) -> CccResult<Vec<f64>> {
        if self.values.len() != count {
            return Err(parse_error(
                self.line,
                format!("{}: expected {} values, got {}", self.tag, count, self.values.len()),
            ));
        }
        self.values
            .iter()
            .map(|v| {
                v.parse::<f64>()
                    .ok()
                    .filter(|x| x.is_finite())
                    .ok_or_else(|| parse_error(self.line, format!("{}: bad number '{v}'", self.tag)))
            })
            .collect()
    }

    fn integer(&self) -> CccResult<i64> {
        match self.values.as_slice() {
            [v] => v
                .parse::<i64>()
                .map_err(|_| parse_error(self.line, format!("{}: bad integer '{v}'", self.tag))),
            _ => Err(parse_error(self.line, format!("{}: expected one integer", self.tag))),
        }
    }

    fn text(&self) -> String {
        self.values.join(" ")
    }
}

// ============================================================================
// Parser
// ============================================================================

#[derive(Default)]
struct ClassBuilder {
    number: i64,
    title: String,
    subclasses: Vec<Subclass>,
}

#[derive(Default)]
struct SubclassBuilder {
    line: usize,
    pi: Option<f64>,
    means: Option<Vec<f64>>,
    covar: Option<Vec<f64>>,
}

impl SignatureSet {
    /// Parse a signature set from its text form.
    ///
    /// # Errors
    ///
    /// Returns [`CccError::ModelParse`] for malformed text and
    /// [`CccError::SingularCovariance`] for a covariance that cannot be
    /// inverted.
    pub fn parse(text: &str) -> CccResult<Self> {
        let mut title = String::new();
        let mut nbands = 0usize;
        let mut classes = Vec::new();
        let mut class: Option<ClassBuilder> = None;
        let mut sub: Option<SubclassBuilder> = None;
        let mut last_line = 0;

        for e in entries(text)? {
            last_line = e.line;
            match e.tag {
                "title" => title = e.text(),
                "nbands" => {
                    let n = e.integer()?;
                    if n <= 0 || !classes.is_empty() || class.is_some() {
                        return Err(parse_error(e.line, format!("invalid nbands {n}")));
                    }
                    nbands = n as usize;
                }
                "class" => {
                    if class.is_some() {
                        return Err(parse_error(e.line, "class opened inside a class"));
                    }
                    if nbands == 0 {
                        return Err(parse_error(e.line, "class before nbands"));
                    }
                    class = Some(ClassBuilder::default());
                }
                "classnum" => {
                    let c = class
                        .as_mut()
                        .ok_or_else(|| parse_error(e.line, "classnum outside a class"))?;
                    c.number = e.integer()?;
                }
                "classtitle" => {
                    let c = class
                        .as_mut()
                        .ok_or_else(|| parse_error(e.line, "classtitle outside a class"))?;
                    c.title = e.text();
                }
                "subclass" => {
                    if class.is_none() || sub.is_some() {
                        return Err(parse_error(e.line, "misplaced subclass"));
                    }
                    sub = Some(SubclassBuilder {
                        line: e.line,
                        ..Default::default()
                    });
                }
                "pi" => {
                    let s = sub
                        .as_mut()
                        .ok_or_else(|| parse_error(e.line, "pi outside a subclass"))?;
                    let pi = e.numbers(1)?[0];
                    if pi <= 0.0 {
                        return Err(parse_error(e.line, format!("pi must be positive, got {pi}")));
                    }
                    s.pi = Some(pi);
                }
                "means" => {
                    let s = sub
                        .as_mut()
                        .ok_or_else(|| parse_error(e.line, "means outside a subclass"))?;
                    s.means = Some(e.numbers(nbands)?);
                }
                "covar" => {
                    let s = sub
                        .as_mut()
                        .ok_or_else(|| parse_error(e.line, "covar outside a subclass"))?;
                    s.covar = Some(e.numbers(nbands * nbands)?);
                }
                "endsubclass" => {
                    let s = sub
                        .take()
                        .ok_or_else(|| parse_error(e.line, "endsubclass without subclass"))?;
                    let c = class
                        .as_mut()
                        .ok_or_else(|| parse_error(e.line, "endsubclass outside a class"))?;
                    let missing = |what: &str| parse_error(s.line, format!("subclass has no {what}"));
                    let pi = s.pi.ok_or_else(|| missing("pi"))?;
                    let means = s.means.as_ref().ok_or_else(|| missing("means"))?;
                    let covar = s.covar.as_ref().ok_or_else(|| missing("covar"))?;
                    let subclass = Subclass::new(
                        pi,
                        DVector::from_column_slice(means),
                        DMatrix::from_row_slice(nbands, nbands, covar),
                    )
                    .ok_or(CccError::SingularCovariance {
                        class: classes.len(),
                        subclass: c.subclasses.len(),
                    })?;
                    c.subclasses.push(subclass);
                }
                "endclass" => {
                    if sub.is_some() {
                        return Err(parse_error(e.line, "endclass inside a subclass"));
                    }
                    let c = class
                        .take()
                        .ok_or_else(|| parse_error(e.line, "endclass without class"))?;
                    if c.subclasses.is_empty() {
                        return Err(parse_error(e.line, "class has no subclasses"));
                    }
                    classes.push(SignatureClass {
                        number: c.number,
                        title: c.title,
                        subclasses: c.subclasses,
                    });
                }
                other => trace!("signature: skipping unknown tag '{}'", other),
            }
        }

        if class.is_some() || sub.is_some() {
            return Err(parse_error(last_line, "unexpected end of model"));
        }
        if classes.is_empty() {
            return Err(parse_error(last_line, "model has no classes"));
        }
        Ok(Self {
            title,
            nbands,
            classes,
        })
    }

    /// Load a signature set from a file.
    ///
    /// # Errors
    ///
    /// Returns [`CccError::ModelIo`] if the file cannot be read, or a
    /// parse error.
    pub fn load(path: impl AsRef<Path>) -> CccResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CccError::ModelIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// The bundled two-class model (class 0 non-text, class 1 text).
    pub fn default_model() -> CccResult<Self> {
        Self::parse(DEFAULT_MODEL)
    }

    /// Check the model against a feature dimensionality.
    ///
    /// # Errors
    ///
    /// Returns [`CccError::BandMismatch`] if the band counts differ.
    pub fn check_bands(&self, expected: usize) -> CccResult<()> {
        if self.nbands != expected {
            return Err(CccError::BandMismatch {
                expected,
                actual: self.nbands,
            });
        }
        Ok(())
    }

    /// Number of classes
    #[inline]
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }
}
