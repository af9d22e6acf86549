//! L2-regularized binary logistic regression

use crate::error::{BaselineError, Result};
use super::models::{balanced_weights, unique_classes, ClassWeight, Classifier};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Solve the symmetric positive-definite system Ax = b by Cholesky
/// decomposition. A near-singular matrix is retried once with a small ridge.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    cholesky_factor(a)
        .or_else(|| {
            let ridge = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n as f64;
            let mut a_reg = a.clone();
            for k in 0..n {
                a_reg[[k, k]] += ridge.max(1e-12);
            }
            cholesky_factor(&a_reg)
        })
        .map(|l| substitute(&l, b))
}

/// Lower-triangular L with A = L L^T, or None if A is not positive definite
fn cholesky_factor(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    Some(l)
}

/// Forward then backward substitution through L and L^T
fn substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();

    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    x
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// log(1 + exp(z)) without overflow
fn log1p_exp(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

/// Logistic regression for binary classification.
///
/// Minimizes `sum_i s_i * logloss_i + ||w||^2 / (2C)` with damped Newton
/// steps. The intercept is not penalized. `s_i` comes from the class
/// weighting scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted coefficients
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept
    pub intercept: Option<f64>,
    /// Inverse regularization strength
    pub c: f64,
    /// Maximum Newton iterations
    pub max_iter: usize,
    /// Convergence tolerance on the mean-scaled gradient
    pub tol: f64,
    /// Class weighting
    pub class_weight: ClassWeight,
    /// Iterations used by the last fit
    pub n_iter: usize,
    classes: Vec<i64>,
    is_fitted: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    /// Create a new logistic regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            c: 1.0,
            max_iter: 100,
            tol: 1e-4,
            class_weight: ClassWeight::Uniform,
            n_iter: 0,
            classes: Vec::new(),
            is_fitted: false,
        }
    }

    /// Set inverse regularization strength
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set class weighting
    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    fn sample_weights(&self, y: &Array1<i64>) -> Array1<f64> {
        match self.class_weight {
            ClassWeight::Uniform => Array1::ones(y.len()),
            ClassWeight::Balanced => {
                let counts: Vec<f64> = self
                    .classes
                    .iter()
                    .map(|&c| y.iter().filter(|&&v| v == c).count() as f64)
                    .collect();
                let weights = balanced_weights(&counts);
                y.mapv(|v| {
                    let idx = self.classes.iter().position(|&c| c == v).unwrap_or(0);
                    weights[idx]
                })
            }
        }
    }

    fn objective(
        &self,
        x: &Array2<f64>,
        t: &Array1<f64>,
        s: &Array1<f64>,
        w: &Array1<f64>,
        b: f64,
    ) -> f64 {
        let z = x.dot(w) + b;
        let data: f64 = z
            .iter()
            .zip(t.iter())
            .zip(s.iter())
            .map(|((&z, &t), &s)| s * (log1p_exp(z) - t * z))
            .sum();
        data + w.dot(w) / (2.0 * self.c)
    }

    fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (w, b) = match (&self.coefficients, self.intercept) {
            (Some(w), Some(b)) if self.is_fitted => (w, b),
            _ => return Err(BaselineError::ModelNotFitted),
        };
        if x.ncols() != w.len() {
            return Err(BaselineError::ShapeError {
                expected: format!("{} features", w.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.dot(w) + b)
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(BaselineError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if self.max_iter == 0 {
            return Err(BaselineError::InvalidParameter {
                name: "max_iter".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.c <= 0.0 {
            return Err(BaselineError::InvalidParameter {
                name: "c".to_string(),
                value: self.c.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        self.classes = unique_classes(y);
        if self.classes.len() != 2 {
            return Err(BaselineError::TrainingError(format!(
                "logistic regression needs exactly 2 classes, got {:?}",
                self.classes
            )));
        }

        let positive = self.classes[1];
        let t = y.mapv(|v| if v == positive { 1.0 } else { 0.0 });
        let s = self.sample_weights(y);
        let s_sum = s.sum();

        let p = n_features + 1;
        let mut w = Array1::<f64>::zeros(n_features);
        let mut b = 0.0;
        let mut loss = self.objective(x, &t, &s, &w, b);
        let mut converged = false;
        self.n_iter = 0;

        for iter in 0..self.max_iter {
            self.n_iter = iter + 1;

            let z = x.dot(&w) + b;
            let prob = z.mapv(sigmoid);

            // Gradient over [w, b]
            let residual = &s * &(&prob - &t);
            let mut grad = Array1::zeros(p);
            grad.slice_mut(ndarray::s![..n_features])
                .assign(&(x.t().dot(&residual) + &w / self.c));
            grad[n_features] = residual.sum();

            let grad_max = grad.iter().fold(0.0f64, |m, g| m.max(g.abs())) / s_sum;
            if grad_max <= self.tol {
                converged = true;
                break;
            }

            // Hessian over [w, b]
            let d = &s * &prob.mapv(|q| q * (1.0 - q));
            let xd = x * &d.view().insert_axis(Axis(1));
            let mut hess = Array2::zeros((p, p));
            hess.slice_mut(ndarray::s![..n_features, ..n_features])
                .assign(&x.t().dot(&xd));
            for k in 0..n_features {
                hess[[k, k]] += 1.0 / self.c;
            }
            let xtd = xd.sum_axis(Axis(0));
            hess.slice_mut(ndarray::s![..n_features, n_features]).assign(&xtd);
            hess.slice_mut(ndarray::s![n_features, ..n_features]).assign(&xtd);
            hess[[n_features, n_features]] = d.sum();

            let step = match cholesky_solve(&hess, &grad) {
                Some(step) => step,
                None => {
                    return Err(BaselineError::ComputationError(
                        "Newton system is not positive definite".to_string(),
                    ))
                }
            };

            // Backtracking line search on the penalized objective
            let mut alpha = 1.0;
            let mut accepted = false;
            let slope = grad.dot(&step);
            for _ in 0..30 {
                let w_new = &w - &(alpha * &step.slice(ndarray::s![..n_features]));
                let b_new = b - alpha * step[n_features];
                let new_loss = self.objective(x, &t, &s, &w_new, b_new);
                if new_loss <= loss - 1e-4 * alpha * slope {
                    w = w_new;
                    b = b_new;
                    loss = new_loss;
                    accepted = true;
                    break;
                }
                alpha *= 0.5;
            }

            if !accepted {
                // No further decrease is representable
                converged = true;
                break;
            }
        }

        if converged {
            debug!(n_iter = self.n_iter, loss, "Logistic regression converged");
        } else {
            warn!(
                max_iter = self.max_iter,
                "Logistic regression failed to converge; increase max_iter or scale the data"
            );
        }

        self.coefficients = Some(w);
        self.intercept = Some(b);
        self.is_fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        let z = self.decision_function(x)?;
        let (neg, pos) = (self.classes[0], self.classes[1]);
        Ok(z.mapv(|v| if sigmoid(v) > 0.5 { pos } else { neg }))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let z = self.decision_function(x)?;
        let mut proba = Array2::zeros((z.len(), 2));
        for (i, &v) in z.iter().enumerate() {
            let p = sigmoid(v);
            proba[[i, 0]] = 1.0 - p;
            proba[[i, 1]] = p;
        }
        Ok(proba)
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn name(&self) -> &str {
        "LogisticRegression"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cholesky_solve() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![2.0, 1.0];
        let x = cholesky_solve(&a, &b).unwrap();
        let back = a.dot(&x);
        assert!((back[0] - 2.0).abs() < 1e-12);
        assert!((back[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cholesky_rejects_indefinite() {
        let a = array![[1.0, 0.0], [0.0, -1.0]];
        assert!(cholesky_solve(&a, &array![1.0, 1.0]).is_none());
    }

    #[test]
    fn test_sigmoid_stable() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-15);
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert_eq!(sigmoid(1000.0), 1.0);
        assert!((log1p_exp(1000.0) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_separates_linear_data() {
        let x = array![
            [-2.0, 0.1], [-1.5, -0.3], [-1.0, 0.2], [-0.8, 0.0],
            [0.8, 0.1], [1.0, -0.2], [1.5, 0.3], [2.0, 0.0]
        ];
        let y = array![0i64, 0, 0, 0, 1, 1, 1, 1];

        let mut model = LogisticRegression::new().with_max_iter(500);
        model.fit(&x, &y).unwrap();

        assert_eq!(model.predict(&x).unwrap(), y);
        assert!(model.coefficients.as_ref().unwrap()[0] > 0.0);
        assert!(model.n_iter < 500);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0i64, 0, 1, 1];
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();

        let proba = model.predict_proba(&x).unwrap();
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-12);
        }
        // Monotone in the single feature
        assert!(proba[[3, 1]] > proba[[0, 1]]);
    }

    #[test]
    fn test_balanced_weights_shift_boundary() {
        // 1 positive among 9 negatives that overlap it
        let x = array![[0.0], [0.1], [0.2], [0.3], [0.4], [0.5], [0.6], [0.7], [0.8], [0.9]];
        let y = array![0i64, 0, 0, 0, 0, 0, 0, 0, 0, 1];

        let mut plain = LogisticRegression::new();
        plain.fit(&x, &y).unwrap();
        let mut balanced = LogisticRegression::new().with_class_weight(ClassWeight::Balanced);
        balanced.fit(&x, &y).unwrap();

        let p_plain = plain.positive_proba(&x, 1).unwrap();
        let p_bal = balanced.positive_proba(&x, 1).unwrap();
        assert!(p_bal[9] > p_plain[9]);
        assert!(p_bal.mean().unwrap() > p_plain.mean().unwrap());
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[0.0], [1.0]];
        let y = array![1i64, 1];
        let mut model = LogisticRegression::new();
        assert!(matches!(model.fit(&x, &y), Err(BaselineError::TrainingError(_))));
    }

    #[test]
    fn test_not_fitted() {
        let model = LogisticRegression::new();
        assert!(matches!(
            model.predict(&array![[1.0]]),
            Err(BaselineError::ModelNotFitted)
        ));
    }
}
