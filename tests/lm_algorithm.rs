//! Integration tests for the Levenberg-Marquardt algorithm.

mod common;

use approx::assert_relative_eq;
use ndarray::{array, Array1, Array2};
use nlls_rs::lm::{DampingMatrix, DisplayLevel, LevenbergMarquardt, LmConfig, StopReason};
use nlls_rs::utils::check_near;
use nlls_rs::{Evaluation, NllsError, Problem, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use common::{x_gt, x_gt_twin, DoubleExponential, Rosenbrock};

fn near_either(x: &Array1<f64>) -> bool {
    check_near(x, &x_gt(), 0.01).unwrap() || check_near(x, &x_gt_twin(), 0.01).unwrap()
}

#[test]
fn test_double_exponential_from_zero() {
    let problem = DoubleExponential::new(10, 2014);
    let lm = LevenbergMarquardt::new();
    assert_eq!(lm.config().max_iterations, 400);

    let result = lm.minimize(&problem, &Array1::zeros(4)).unwrap();

    assert!(near_either(&result.params), "params = {}", result.params);
    assert!(result.iterations < 400, "{}", result);
    assert!(result.stop_reason.is_converged());

    // The reported objective is the objective at the returned point
    let f = problem.evaluate(&result.params, false).unwrap().residuals;
    assert_relative_eq!(f.dot(&f), result.cost, epsilon = 1e-6);
}

#[test]
fn test_double_exponential_from_nearby_start() {
    let problem = DoubleExponential::new(10, 7);
    let x0 = array![0.8, -0.3, 1.8, 3.2];

    let result = LevenbergMarquardt::new().minimize(&problem, &x0).unwrap();

    assert!(near_either(&result.params), "params = {}", result.params);
    assert!(result.cost < 1e-4, "{}", result);
}

#[test]
fn test_double_exponential_with_noise() {
    let mut problem = DoubleExponential::new(10, 7);
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let noise = Normal::new(0.0, 1e-5).unwrap();
    problem.m.mapv_inplace(|m| m + noise.sample(&mut rng));

    let result = LevenbergMarquardt::new()
        .minimize(&problem, &array![0.8, -0.3, 1.8, 3.2])
        .unwrap();

    assert!(near_either(&result.params), "params = {}", result.params);
    assert!(result.success());
}

#[test]
fn test_rosenbrock() {
    let result = LevenbergMarquardt::new()
        .minimize(&Rosenbrock, &array![-1.2, 1.0])
        .unwrap();

    assert!(result.success());
    assert_relative_eq!(result.params[0], 1.0, epsilon = 1e-3);
    assert_relative_eq!(result.params[1], 1.0, epsilon = 1e-3);
}

#[test]
fn test_jtj_diagonal_damping() {
    let problem = DoubleExponential::new(10, 7);
    let x0 = array![0.8, -0.3, 1.8, 3.2];

    let result = LevenbergMarquardt::new()
        .with_damping(DampingMatrix::JtJDiagonal)
        .minimize(&problem, &x0)
        .unwrap();

    assert!(near_either(&result.params), "params = {}", result.params);
}

#[test]
fn test_accepted_costs_never_increase() {
    let problem = DoubleExponential::new(10, 2014);
    let result = LevenbergMarquardt::new()
        .with_trace(true)
        .minimize(&problem, &Array1::zeros(4))
        .unwrap();

    let initial = problem.eval_cost(&Array1::zeros(4)).unwrap();
    let mut previous = initial;
    for record in result.trace.as_ref().unwrap() {
        assert!(record.cost <= previous + 1e-12, "cost rose at iteration {}", record.iteration);
        if !record.accepted {
            assert_eq!(record.cost, previous);
        }
        previous = record.cost;
    }
    assert_eq!(previous, result.cost);
}

#[test]
fn test_damping_adaptation() {
    let problem = DoubleExponential::new(10, 2014);
    let lm = LevenbergMarquardt::new().with_trace(true);
    let result = lm.minimize(&problem, &Array1::zeros(4)).unwrap();
    let records = result.trace.unwrap();

    // Growth factor: reset to 2 on acceptance, doubled on each rejection
    let mut nu = 2.0;
    for record in &records {
        nu = if record.accepted { 2.0 } else { nu * 2.0 };
        assert_eq!(record.nu, nu, "iteration {}", record.iteration);
        assert!(record.mu >= 1e-12);
    }

    // A rejection multiplies mu by the growth factor in effect before it
    for pair in records.windows(2) {
        if !pair[1].accepted {
            assert_relative_eq!(pair[1].mu, pair[0].mu * pair[1].nu / 2.0, max_relative = 1e-12);
        }
    }
}

#[test]
fn test_zero_jacobian_stops_immediately() {
    let problem = |x: &Array1<f64>, _: bool| -> Result<Evaluation> {
        Ok(Evaluation::new(array![3.0, 4.0], Array2::zeros((2, x.len()))))
    };
    let x0 = array![1.0, 2.0, 3.0];
    let result = LevenbergMarquardt::new().minimize(&problem, &x0).unwrap();

    assert_eq!(result.stop_reason, StopReason::LocalMinimum);
    assert_eq!(result.iterations, 0);
    assert_eq!(result.func_evals, 1);
    assert_eq!(result.params, x0);
    assert_relative_eq!(result.cost, 25.0);
}

#[test]
fn test_already_at_minimum() {
    // Zero residual with non-zero Jacobian: the first step is zero
    let problem = DoubleExponential::new(10, 3);
    let result = LevenbergMarquardt::new()
        .minimize(&problem, &x_gt())
        .unwrap();

    assert_eq!(result.stop_reason, StopReason::LocalMinimum);
    assert_eq!(result.iterations, 1);
    assert_eq!(result.params, x_gt());
}

#[test]
fn test_max_iterations_reached() {
    let problem = DoubleExponential::new(10, 2014);
    let result = LevenbergMarquardt::new()
        .with_max_iterations(3)
        .with_tol_x(0.0)
        .with_tol_f(0.0)
        .minimize(&problem, &Array1::zeros(4))
        .unwrap();

    assert_eq!(result.stop_reason, StopReason::MaxIterationsReached);
    assert_eq!(result.iterations, 3);
    assert_eq!(result.stop_reason.exit_flag(), Some(0));
}

#[test]
fn test_config_from_json() {
    let config = LmConfig::from_json(
        r#"{ "max_iterations": 50, "damping": "jtj-diagonal", "display": "off" }"#,
    )
    .unwrap();
    assert_eq!(config.max_iterations, 50);
    assert_eq!(config.damping, DampingMatrix::JtJDiagonal);

    let result = LevenbergMarquardt::with_config(config)
        .minimize(&Rosenbrock, &array![0.0, 0.0])
        .unwrap();
    assert!(result.iterations <= 50);
}

#[test]
fn test_invalid_config_is_rejected_before_evaluation() {
    let problem = |_: &Array1<f64>, _: bool| -> Result<Evaluation> {
        panic!("problem must not be evaluated");
    };

    let err = LevenbergMarquardt::new()
        .with_tau(-1.0)
        .minimize(&problem, &array![1.0])
        .unwrap_err();
    assert!(matches!(err, NllsError::InvalidConfig(_)));

    let err = LevenbergMarquardt::new()
        .with_upper_bound(array![1.0, 2.0])
        .minimize(&problem, &array![1.0])
        .unwrap_err();
    assert!(matches!(err, NllsError::InvalidConfig(_)));

    let err = LevenbergMarquardt::new()
        .minimize(&problem, &Array1::zeros(0))
        .unwrap_err();
    assert!(matches!(err, NllsError::InvalidConfig(_)));
}

#[test]
fn test_residual_count_change_is_an_error() {
    let calls = std::sync::atomic::AtomicUsize::new(0);
    let problem = |x: &Array1<f64>, _: bool| -> Result<Evaluation> {
        let call = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let m = if call == 0 { 2 } else { 3 };
        Ok(Evaluation::new(
            Array1::from_elem(m, x[0] - 1.0),
            Array2::ones((m, 1)),
        ))
    };

    let err = LevenbergMarquardt::new()
        .minimize(&problem, &array![0.0])
        .unwrap_err();
    assert!(matches!(err, NllsError::DimensionMismatch(_)));
}

#[test]
fn test_problem_error_is_propagated() {
    let problem = |x: &Array1<f64>, _: bool| -> Result<Evaluation> {
        if x[0] > 0.5 {
            return Err(NllsError::FunctionEvaluation("x out of domain".to_string()));
        }
        Ok(Evaluation::new(array![x[0] - 1.0], array![[1.0]]))
    };

    let err = LevenbergMarquardt::new()
        .minimize(&problem, &array![0.0])
        .unwrap_err();
    match err {
        NllsError::FunctionEvaluation(msg) => assert_eq!(msg, "x out of domain"),
        other => panic!("Expected FunctionEvaluation, got {:?}", other),
    }
}

#[test]
fn test_display_levels_through_sink() {
    let problem = DoubleExponential::new(10, 7);
    let x0 = array![0.8, -0.3, 1.8, 3.2];

    let mut lines = Vec::new();
    LevenbergMarquardt::new()
        .with_display(DisplayLevel::Off)
        .minimize_with_sink(&problem, &x0, &mut lines)
        .unwrap();
    assert!(lines.is_empty());

    let result = LevenbergMarquardt::new()
        .with_display(DisplayLevel::Iter)
        .minimize_with_sink(&problem, &x0, &mut lines)
        .unwrap();
    // Header, row 0, one row per iteration, then the two summary lines
    assert_eq!(lines.len(), result.iterations + 4);
    assert!(lines[1].trim_start().starts_with('0'));
    let summary = &lines[lines.len() - 2];
    assert!(summary.starts_with(&format!("Terminate in {} iterations: ", result.iterations)));
    assert!(summary.ends_with('.'));
}

#[test]
fn test_solver_is_shareable_across_threads() {
    let lm = LevenbergMarquardt::new();
    let seeds = [1_u64, 2, 3, 4];

    let costs: Vec<f64> = std::thread::scope(|s| {
        let handles: Vec<_> = seeds
            .iter()
            .map(|&seed| {
                let lm = &lm;
                s.spawn(move || {
                    let problem = DoubleExponential::new(10, seed);
                    lm.minimize(&problem, &array![0.8, -0.3, 1.8, 3.2])
                        .unwrap()
                        .cost
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Same inputs, same answer
    for (&seed, &cost) in seeds.iter().zip(&costs) {
        let problem = DoubleExponential::new(10, seed);
        let expected = lm
            .minimize(&problem, &array![0.8, -0.3, 1.8, 3.2])
            .unwrap()
            .cost;
        assert_eq!(cost, expected);
    }
}
