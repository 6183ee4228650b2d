//! Side-by-side runs of several inventory models over the same bars.

use crate::engine::BacktestEngine;
use crate::results::BacktestResult;
use asymlp_core::{BarSeries, Config, Result};
use asymlp_models::ModelFactory;
use serde::{Deserialize, Serialize};

/// Summary of one model's run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelComparison {
    pub model_name: String,
    pub total_rebalances: usize,
    pub total_trades: usize,
    pub total_return: f64,
    pub token0_return: f64,
    pub token1_return: f64,
    pub token0_drawdown: f64,
    pub token1_drawdown: f64,
    pub final_inventory_deviation: f64,
    pub total_fees: f64,
    /// Widths chosen at the initial mint.
    pub initial_range_a_pct: Option<f64>,
    pub initial_range_b_pct: Option<f64>,
}

impl From<&BacktestResult> for ModelComparison {
    fn from(result: &BacktestResult) -> Self {
        let first = result.rebalances.first();
        let metrics = &result.metrics;
        Self {
            model_name: result.model_name.clone(),
            total_rebalances: result.total_rebalances,
            total_trades: result.total_trades,
            total_return: metrics.total_return,
            token0_return: metrics.token0_return,
            token1_return: metrics.token1_return,
            token0_drawdown: metrics.token0_drawdown,
            token1_drawdown: metrics.token1_drawdown,
            final_inventory_deviation: metrics.final_inventory_deviation,
            total_fees: metrics.total_fees,
            initial_range_a_pct: first.map(|r| r.range_a_pct),
            initial_range_b_pct: first.map(|r| r.range_b_pct),
        }
    }
}

/// Run the same series once per built-in model name, in the order given.
pub fn compare_models(
    config: &Config,
    bars: &BarSeries,
    initial_balance_0: f64,
    initial_balance_1: f64,
    models: &[&str],
) -> Result<Vec<ModelComparison>> {
    compare_models_with(
        &ModelFactory::with_builtin_models(),
        config,
        bars,
        initial_balance_0,
        initial_balance_1,
        models,
    )
}

/// Like [`compare_models`], resolving names in `factory` so runtime
/// registrations can be compared too.
pub fn compare_models_with(
    factory: &ModelFactory,
    config: &Config,
    bars: &BarSeries,
    initial_balance_0: f64,
    initial_balance_1: f64,
    models: &[&str],
) -> Result<Vec<ModelComparison>> {
    models
        .iter()
        .map(|&name| {
            let mut config = config.clone();
            config.strategy.inventory_model = name.to_string();
            let engine = BacktestEngine::with_factory(config, factory.clone())?;
            let result = engine.run(bars, initial_balance_0, initial_balance_1)?;
            // Rows are keyed by the registry name, which may differ from the model's own.
            let mut row = ModelComparison::from(&result);
            row.model_name = name.to_string();
            Ok(row)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use asymlp_core::Error;
    use asymlp_models::BuiltinModel;

    fn make_series() -> BarSeries {
        BarSeries::from_closes(&[
            (0, 3000.0),
            (60_000, 3030.0),
            (120_000, 2985.0),
            (180_000, 3040.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_compare_builtin_models() {
        let names: Vec<&str> = BuiltinModel::ALL.iter().map(|m| m.name()).collect();
        let rows = compare_models(&Config::default(), &make_series(), 1.0, 3000.0, &names).unwrap();

        assert_eq!(rows.len(), names.len());
        for (row, name) in rows.iter().zip(&names) {
            assert_eq!(row.model_name, *name);
            assert!(row.total_rebalances >= 1);
            let a = row.initial_range_a_pct.unwrap();
            assert!((0.02..=0.50).contains(&a));
        }
    }

    #[test]
    fn test_compare_registered_model() {
        let mut factory = ModelFactory::with_builtin_models();
        factory.register("NarrowSimple", "Simple model with a narrow base", |config| {
            let mut config = config.clone();
            config.model.simple_base_range = 0.03;
            BuiltinModel::Simple.build(&config)
        });

        let rows = compare_models_with(
            &factory,
            &Config::default(),
            &make_series(),
            1.0,
            3000.0,
            &["NarrowSimple", "SimpleModel"],
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].model_name, "NarrowSimple");
        assert!((rows[0].initial_range_a_pct.unwrap() - 0.03).abs() < 1e-9);
        assert!((rows[1].initial_range_a_pct.unwrap() - 0.05).abs() < 1e-9);
        // Built-in lookup alone does not know the registration.
        let builtin_only =
            compare_models(&Config::default(), &make_series(), 1.0, 3000.0, &["NarrowSimple"]);
        assert!(builtin_only.is_err());
    }

    #[test]
    fn test_compare_unknown_model() {
        let err = compare_models(&Config::default(), &make_series(), 1.0, 3000.0, &["Nope"])
            .err()
            .unwrap();
        assert!(matches!(err, Error::UnknownModel { .. }));
    }
}
