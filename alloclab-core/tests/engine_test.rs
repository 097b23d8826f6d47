//! End-to-end engine tests: simulate + summarize on small hand-built series.

use alloclab_core::engine::{simulate_with, CostMode, CostModel, FundingMode, NoFunding, SimConfig};
use alloclab_core::{
    simulate, summarize, AllocationDecision, EngineError, EngineVariant, Observation, Period,
    ReturnSeries,
};
use chrono::{Duration, NaiveDate};

fn period(i: usize) -> Period {
    let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    Period::daily(base + Duration::days(i as i64))
}

fn observations(prices: &[f64]) -> Vec<Observation> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| Observation::new(period(i), p).with_field("rf", 0.0002))
        .collect()
}

fn allocations(weights: &[f64]) -> Vec<AllocationDecision> {
    weights
        .iter()
        .enumerate()
        .map(|(i, &w)| AllocationDecision::new(period(i), w))
        .collect()
}

/// Deterministic zig-zag price path with growing swings.
fn zigzag(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1)
        .collect()
}

fn vol_cost() -> CostMode {
    CostMode::VolatilityScaled {
        coefficient: 0.5,
        lookback: 3,
    }
}

fn rf_funding() -> FundingMode {
    FundingMode::ExcessReturn {
        field: "rf".into(),
        scale: 1.0,
    }
}

// ── Scenario ─────────────────────────────────────────────────────────

#[test]
fn reference_scenario() {
    let obs = observations(&[100.0, 102.0, 99.0, 105.0]);
    let allocs = allocations(&[1.0, 1.0, 1.0, 1.0]);
    let results = simulate(&obs, &allocs, &SimConfig::fixed_weight(1)).unwrap();

    let navs: Vec<f64> = results.iter().map(|r| r.nav).collect();
    let expected = [1.0, 1.02, 0.99, 1.05];
    for (got, want) in navs.iter().zip(expected) {
        assert!((got - want).abs() < 1e-12, "nav {got} != {want}");
    }

    let summary = summarize(&results, 252.0, ReturnSeries::Raw).unwrap();
    assert!((summary.max_drawdown - 0.0294).abs() < 1e-4);
    assert!((summary.annualized_return - 4.300_320_855_6).abs() < 1e-6);
    assert!((summary.sharpe_ratio.unwrap() - 6.009_115_29).abs() < 1e-5);
}

// ── Alignment ────────────────────────────────────────────────────────

#[test]
fn misaligned_periods_fail() {
    let obs = observations(&[100.0, 101.0, 102.0]);
    let mut allocs = allocations(&[1.0, 1.0, 1.0]);
    allocs[2].period = period(3);

    let err = simulate(&obs, &allocs, &SimConfig::fixed_weight(1)).unwrap_err();
    match err {
        EngineError::Alignment {
            index,
            observation,
            allocation,
        } => {
            assert_eq!(index, 2);
            assert_eq!(observation, period(2).to_string());
            assert_eq!(allocation, period(3).to_string());
        }
        other => panic!("expected alignment error, got {other:?}"),
    }
}

#[test]
fn length_mismatch_fails() {
    let obs = observations(&[100.0, 101.0, 102.0]);
    let allocs = allocations(&[1.0, 1.0]);
    let err = simulate(&obs, &allocs, &SimConfig::fixed_weight(1)).unwrap_err();
    assert_eq!(err.tag(), "alignment");
}

// ── Malformed input ──────────────────────────────────────────────────

#[test]
fn nan_macro_value_fails_with_period_and_field() {
    let mut obs = observations(&[100.0, 101.0, 102.0]);
    obs[2] = obs[2].clone().with_field("rf", f64::NAN);
    let allocs = allocations(&[1.0, 1.0, 1.0]);
    let config = SimConfig::adjusted(1, CostMode::None, rf_funding()).unwrap();

    let err = simulate(&obs, &allocs, &config).unwrap_err();
    let message = err.to_string();
    assert!(message.contains(&period(2).to_string()), "{message}");
    assert!(message.contains("'rf'"), "{message}");
}

#[test]
fn out_of_range_weight_fails() {
    let obs = observations(&[100.0, 101.0]);
    let allocs = allocations(&[1.0, 1.2]);
    let err = simulate(&obs, &allocs, &SimConfig::fixed_weight(1)).unwrap_err();
    assert_eq!(err.tag(), "malformed_input");

    let levered = SimConfig::fixed_weight(1).with_max_abs_weight(2.0);
    assert!(simulate(&obs, &allocs, &levered).is_ok());
}

// ── Determinism ──────────────────────────────────────────────────────

#[test]
fn repeated_runs_are_bit_identical() {
    let prices = zigzag(200);
    let weights: Vec<f64> = (0..200).map(|i| ((i / 7) % 3) as f64 * 0.5 - 0.5).collect();
    let obs = observations(&prices);
    let allocs = allocations(&weights);
    let config = SimConfig::adjusted(5, vol_cost(), rf_funding()).unwrap();

    let a = simulate(&obs, &allocs, &config).unwrap();
    let b = simulate(&obs, &allocs, &config).unwrap();
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.nav.to_bits(), y.nav.to_bits());
        assert_eq!(x.period_return.to_bits(), y.period_return.to_bits());
        assert_eq!(x.cost_paid.to_bits(), y.cost_paid.to_bits());
    }

    let sa = summarize(&a, 252.0, ReturnSeries::Excess).unwrap();
    let sb = summarize(&b, 252.0, ReturnSeries::Excess).unwrap();
    assert_eq!(sa, sb);
}

// ── Output shape ─────────────────────────────────────────────────────

#[test]
fn one_result_per_period() {
    let prices = zigzag(50);
    let obs = observations(&prices);
    let allocs = allocations(&vec![0.5; 50]);
    let results = simulate(&obs, &allocs, &SimConfig::fixed_weight(4)).unwrap();
    assert_eq!(results.len(), 50);
    for (r, o) in results.iter().zip(&obs) {
        assert_eq!(r.period, o.period);
        assert!(r.nav.is_finite() && r.nav > 0.0);
    }
}

#[test]
fn turnover_only_on_cadence() {
    let prices = zigzag(30);
    let weights: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 1.0 } else { 0.0 }).collect();
    let results = simulate(
        &observations(&prices),
        &allocations(&weights),
        &SimConfig::fixed_weight(3),
    )
    .unwrap();
    for (t, r) in results.iter().enumerate() {
        if t % 3 != 0 {
            assert_eq!(r.turnover, 0.0, "turnover off cadence at {t}");
        }
    }
}

// ── Adjustments ──────────────────────────────────────────────────────

#[test]
fn constant_weight_pays_no_cost() {
    let prices = zigzag(60);
    let config = SimConfig::adjusted(1, vol_cost(), FundingMode::None).unwrap();
    let results = simulate(
        &observations(&prices),
        &allocations(&vec![0.8; 60]),
        &config,
    )
    .unwrap();
    assert!(results.iter().all(|r| r.cost_paid == 0.0));
    assert!(results.iter().all(|r| r.turnover == 0.0));
}

#[test]
fn cost_reduces_nav_relative_to_fixed_weight() {
    let prices = zigzag(120);
    let weights: Vec<f64> = (0..120).map(|i| if (i / 4) % 2 == 0 { 1.0 } else { -1.0 }).collect();
    let obs = observations(&prices);
    let allocs = allocations(&weights);

    let fixed = simulate(&obs, &allocs, &SimConfig::fixed_weight(2)).unwrap();
    let config = SimConfig::adjusted(2, vol_cost(), FundingMode::None).unwrap();
    let costed = simulate(&obs, &allocs, &config).unwrap();

    let total_cost: f64 = costed.iter().map(|r| r.cost_paid).sum();
    assert!(total_cost > 0.0);
    for (f, c) in fixed.iter().zip(&costed) {
        assert!(c.period_return <= f.period_return + 1e-15);
    }
}

#[test]
fn long_pays_funding_short_receives() {
    let prices = vec![100.0; 5];
    let config = SimConfig::adjusted(1, CostMode::None, rf_funding()).unwrap();
    let obs = observations(&prices);

    let long = simulate(&obs, &allocations(&[1.0; 5]), &config).unwrap();
    let short = simulate(&obs, &allocations(&[-1.0; 5]), &config).unwrap();
    assert!(long[4].nav < 1.0);
    assert!(short[4].nav > 1.0);
    assert!(long[1].funding_paid > 0.0);
    assert!(short[1].funding_paid < 0.0);

    // The raw series adds funding back: flat prices mean flat raw NAV.
    let raw = summarize(&long, 252.0, ReturnSeries::Raw).unwrap();
    assert!(raw.annualized_return.abs() < 1e-15);
    let excess = summarize(&long, 252.0, ReturnSeries::Excess).unwrap();
    assert!(excess.annualized_return < 0.0);
}

#[test]
fn return_field_proxies_price() {
    let obs: Vec<Observation> = (0..3)
        .map(|i| Observation::new(period(i), 50.0).with_field("index", 100.0 + i as f64 * 10.0))
        .collect();
    let allocs = allocations(&[1.0, 1.0, 1.0]);
    let config = SimConfig::fixed_weight(1).with_return_field("index");
    let results = simulate(&obs, &allocs, &config).unwrap();
    assert!((results[1].nav - 1.1).abs() < 1e-12);
    assert!((results[2].nav - 1.2).abs() < 1e-12);
}

// ── Variants ─────────────────────────────────────────────────────────

#[test]
fn variant_presets_share_one_loop() {
    let prices = zigzag(40);
    let obs = observations(&prices);
    let allocs = allocations(&vec![0.6; 40]);

    let fixed = SimConfig::fixed_weight(5);
    let via_variant =
        SimConfig::for_variant(EngineVariant::FixedWeight, 5, CostMode::None, FundingMode::None)
            .unwrap();
    assert_eq!(fixed, via_variant);
    assert_eq!(
        simulate(&obs, &allocs, &fixed).unwrap(),
        simulate(&obs, &allocs, &via_variant).unwrap()
    );

    // Adjusted with zero coefficient matches fixed weight exactly.
    let zero_cost = CostMode::VolatilityScaled {
        coefficient: 0.0,
        lookback: 3,
    };
    let adjusted = SimConfig::adjusted(5, zero_cost, FundingMode::None).unwrap();
    let a = simulate(&obs, &allocs, &adjusted).unwrap();
    let f = simulate(&obs, &allocs, &fixed).unwrap();
    for (x, y) in a.iter().zip(&f) {
        assert_eq!(x.nav, y.nav);
    }
}

#[test]
fn misconfigured_variants_rejected() {
    assert!(SimConfig::adjusted(1, CostMode::None, FundingMode::None).is_err());
    assert!(
        SimConfig::for_variant(EngineVariant::FixedWeight, 1, vol_cost(), FundingMode::None)
            .is_err()
    );
    let obs = observations(&[100.0, 101.0]);
    let allocs = allocations(&[1.0, 1.0]);
    let err = simulate(&obs, &allocs, &SimConfig::fixed_weight(0)).unwrap_err();
    assert_eq!(err.tag(), "configuration");
}

#[test]
fn summarize_single_period_is_insufficient() {
    let obs = observations(&[100.0]);
    let allocs = allocations(&[1.0]);
    let results = simulate(&obs, &allocs, &SimConfig::fixed_weight(1)).unwrap();
    assert_eq!(results.len(), 1);
    let err = summarize(&results, 252.0, ReturnSeries::Raw).unwrap_err();
    assert_eq!(err.tag(), "insufficient_data");
}

/// Flat per-trade cost with a configurable volatility window.
struct FlatCost {
    lookback: usize,
}

impl CostModel for FlatCost {
    fn name(&self) -> &str {
        "flat"
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn charge(&self, trade_size: f64, _volatility: f64) -> f64 {
        0.001 * trade_size
    }
}

#[test]
fn custom_cost_model_with_short_lookback_rejected() {
    let obs = observations(&zigzag(10));
    let allocs = allocations(&[1.0, 0.5, 1.0, 0.5, 1.0, 0.5, 1.0, 0.5, 1.0, 0.5]);
    let config = SimConfig::fixed_weight(1);

    for lookback in [0, 1] {
        let err = simulate_with(&obs, &allocs, &config, &FlatCost { lookback }, &NoFunding)
            .unwrap_err();
        assert_eq!(err.tag(), "configuration");
        assert!(err.to_string().contains("flat"), "{err}");
    }

    let results = simulate_with(&obs, &allocs, &config, &FlatCost { lookback: 2 }, &NoFunding)
        .unwrap();
    assert!(results[1].cost_suppressed);
    assert_eq!(results[1].cost_paid, 0.0);
    assert!(results[3..].iter().all(|r| r.cost_paid > 0.0 && !r.cost_suppressed));
}
