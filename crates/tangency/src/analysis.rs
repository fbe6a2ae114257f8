//! End-to-end portfolio analysis and optimization.
//!
//! Both entry points share one pipeline:
//!
//! holdings + price table -> aligned prices -> returns -> return model
//!
//! after which `analyze` evaluates the current weights and `optimize`
//! compares them with the maximum-Sharpe allocation.

use crate::error::AnalysisError;
use crate::holdings::Portfolio;
use serde::{Deserialize, Serialize};
use tangency_optimize::{AllocationOptimizer, OptimizationResult, OptimizerConfig};
use tangency_output::{
    OptimizationReport, PortfolioAnalysis, RecommendationConfig, generate_recommendations,
};
use tangency_risk::covariance::LedoitWolfConfig;
use tangency_risk::{
    Allocation, EvaluationConfig, PriceSeries, ReturnModel, assess, compute_returns, evaluate,
};

/// Settings for every stage of the pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Covariance shrinkage
    pub covariance: LedoitWolfConfig,
    /// Annualization and risk-free rate
    pub evaluation: EvaluationConfig,
    /// Solver settings
    pub optimizer: OptimizerConfig,
    /// Recommendation thresholds
    pub recommendations: RecommendationConfig,
}

/// Runs the analysis pipeline for a portfolio
#[derive(Debug, Clone, Default)]
pub struct PortfolioAnalyzer {
    config: AnalysisConfig,
}

impl PortfolioAnalyzer {
    /// Create an analyzer.
    pub const fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Pipeline settings
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn optimizer(&self) -> AllocationOptimizer {
        AllocationOptimizer::with_config(self.config.optimizer.clone(), self.config.evaluation)
    }

    /// Fit a return model over the portfolio's symbols, in portfolio order.
    ///
    /// # Errors
    /// [`AnalysisError::Returns`] when a symbol has no price column or the
    /// history is too short; [`AnalysisError::Model`] when the covariance
    /// cannot be estimated.
    pub fn fit_model(
        &self,
        portfolio: &Portfolio,
        prices: &PriceSeries,
    ) -> Result<ReturnModel, AnalysisError> {
        let aligned = prices.select(&portfolio.symbols())?;
        let returns = compute_returns(&aligned)?;
        let model = ReturnModel::fit(&returns, &self.config.covariance)?;
        tracing::info!(
            assets = model.n_assets(),
            periods = returns.n_periods(),
            "return model fitted"
        );
        Ok(model)
    }

    /// Current performance, risk and rebalancing suggestions.
    pub fn analyze(
        &self,
        portfolio: &Portfolio,
        prices: &PriceSeries,
    ) -> Result<PortfolioAnalysis, AnalysisError> {
        let model = self.fit_model(portfolio, prices)?;
        let weights = portfolio.weights()?;

        let metrics = evaluate(&weights, &model, &self.config.evaluation)?;
        let assessment = assess(&weights, &model, &self.config.evaluation)?;
        let optimal = self.optimizer().optimize(&model, None)?;

        let current = Allocation::new(model.symbols(), &weights)?;
        let target = Allocation::new(model.symbols(), &optimal.optimal_weights)?;
        let recommendations = generate_recommendations(
            &current,
            &target,
            assessment.risk_tier,
            &self.config.recommendations,
        )
        .iter()
        .map(ToString::to_string)
        .collect();

        tracing::info!(
            sharpe = metrics.sharpe_ratio,
            risk_tier = %assessment.risk_tier,
            "portfolio analyzed"
        );

        Ok(PortfolioAnalysis {
            total_value: portfolio.total_value(),
            expected_return: metrics.annualized_return,
            volatility: metrics.annualized_volatility,
            sharpe_ratio: metrics.sharpe_ratio,
            diversification_score: assessment.diversification_score,
            risk_tier: assessment.risk_tier,
            recommendations,
        })
    }

    /// Compare current weights with the maximum-Sharpe allocation.
    ///
    /// With `target_return` set, the recommended allocation earns exactly
    /// that annualized return.
    pub fn optimize(
        &self,
        portfolio: &Portfolio,
        prices: &PriceSeries,
        target_return: Option<f64>,
    ) -> Result<OptimizationReport, AnalysisError> {
        let model = self.fit_model(portfolio, prices)?;
        let weights = portfolio.weights()?;

        let current = evaluate(&weights, &model, &self.config.evaluation)?;
        let OptimizationResult {
            optimal_weights,
            performance,
            iterations,
        } = self.optimizer().optimize(&model, target_return)?;

        tracing::info!(
            iterations,
            current_sharpe = current.sharpe_ratio,
            optimal_sharpe = performance.sharpe_ratio,
            "portfolio optimized"
        );

        Ok(OptimizationReport::new(
            Allocation::new(model.symbols(), &weights)?,
            Allocation::new(model.symbols(), &optimal_weights)?,
            &current,
            &performance,
        ))
    }
}
