//! Portfolio analysis and optimization summaries.
//!
//! Plain data produced by the analysis pipeline, with terminal (ASCII) and
//! Markdown renderings.

use serde::{Deserialize, Serialize};
use std::fmt;
use tangency_risk::{Allocation, PerformanceMetrics, RiskTier};

/// Snapshot of a portfolio's current state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioAnalysis {
    /// Market value of all holdings.
    pub total_value: f64,

    /// Annualized expected return of the current weights.
    pub expected_return: f64,

    /// Annualized volatility of the current weights.
    pub volatility: f64,

    /// Sharpe ratio of the current weights.
    pub sharpe_ratio: f64,

    /// Diversification score in [0, 1].
    pub diversification_score: f64,

    /// Risk tier of the current volatility.
    pub risk_tier: RiskTier,

    /// Rebalancing suggestions, most specific first.
    pub recommendations: Vec<String>,
}

impl PortfolioAnalysis {
    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str("\nPortfolio Analysis\n");
        output.push_str(&"=".repeat(60));
        output.push('\n');
        output.push_str(&format!(
            "  Total Value:              {:.2}\n",
            self.total_value
        ));
        output.push_str(&format!(
            "  Expected Return:          {:.2}%\n",
            self.expected_return * 100.0
        ));
        output.push_str(&format!(
            "  Volatility:               {:.2}%\n",
            self.volatility * 100.0
        ));
        output.push_str(&format!(
            "  Sharpe Ratio:             {:.3}\n",
            self.sharpe_ratio
        ));
        output.push_str(&format!(
            "  Diversification Score:    {:.3}\n",
            self.diversification_score
        ));
        output.push_str(&format!("  Risk Tier:                {}\n", self.risk_tier));

        if !self.recommendations.is_empty() {
            output.push_str("\nRecommendations:\n");
            output.push_str(&"-".repeat(60));
            output.push('\n');
            for (i, rec) in self.recommendations.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, rec));
            }
        }

        output.push_str(&"=".repeat(60));
        output.push('\n');
        output
    }

    /// Format as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut output = String::from("# Portfolio Analysis\n\n");

        output.push_str(&format!("- **Total Value:** {:.2}\n", self.total_value));
        output.push_str(&format!(
            "- **Expected Return:** {:.2}%\n",
            self.expected_return * 100.0
        ));
        output.push_str(&format!("- **Volatility:** {:.2}%\n", self.volatility * 100.0));
        output.push_str(&format!("- **Sharpe Ratio:** {:.3}\n", self.sharpe_ratio));
        output.push_str(&format!(
            "- **Diversification Score:** {:.3}\n",
            self.diversification_score
        ));
        output.push_str(&format!("- **Risk Tier:** {}\n", self.risk_tier));

        if !self.recommendations.is_empty() {
            output.push_str("\n## Recommendations\n\n");
            for rec in &self.recommendations {
                output.push_str(&format!("- {rec}\n"));
            }
        }

        output
    }
}

impl fmt::Display for PortfolioAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Portfolio Analysis (value {:.2})", self.total_value)?;
        writeln!(f, "  Expected Return: {:.2}%", self.expected_return * 100.0)?;
        writeln!(f, "  Volatility: {:.2}%", self.volatility * 100.0)?;
        writeln!(f, "  Sharpe Ratio: {:.3}", self.sharpe_ratio)?;
        writeln!(f, "  Risk Tier: {}", self.risk_tier)?;
        Ok(())
    }
}

/// Change from current to recommended performance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ExpectedImprovement {
    /// Annualized return gained.
    pub return_improvement: f64,

    /// Annualized volatility added (negative when risk falls).
    pub volatility_change: f64,

    /// Sharpe ratio gained.
    pub sharpe_improvement: f64,
}

impl ExpectedImprovement {
    /// Difference `optimal − current` for each metric.
    pub fn between(current: &PerformanceMetrics, optimal: &PerformanceMetrics) -> Self {
        Self {
            return_improvement: optimal.annualized_return - current.annualized_return,
            volatility_change: optimal.annualized_volatility - current.annualized_volatility,
            sharpe_improvement: optimal.sharpe_ratio - current.sharpe_ratio,
        }
    }
}

/// Side-by-side risk figures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskMetrics {
    /// Annualized volatility of the current weights.
    pub current_volatility: f64,

    /// Annualized volatility of the recommended weights.
    pub optimal_volatility: f64,

    /// Sharpe ratio of the current weights.
    pub current_sharpe: f64,

    /// Sharpe ratio of the recommended weights.
    pub optimal_sharpe: f64,
}

impl RiskMetrics {
    /// Collect the figures from two evaluations.
    pub const fn new(current: &PerformanceMetrics, optimal: &PerformanceMetrics) -> Self {
        Self {
            current_volatility: current.annualized_volatility,
            optimal_volatility: optimal.annualized_volatility,
            current_sharpe: current.sharpe_ratio,
            optimal_sharpe: optimal.sharpe_ratio,
        }
    }
}

/// Current versus recommended allocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationReport {
    /// Weights held now.
    pub current_allocation: Allocation,

    /// Weights the optimizer recommends.
    pub recommended_allocation: Allocation,

    /// Performance change if rebalanced.
    pub expected_improvement: ExpectedImprovement,

    /// Volatility and Sharpe before and after.
    pub risk_metrics: RiskMetrics,
}

impl OptimizationReport {
    /// Build a report from both allocations and their evaluations.
    pub fn new(
        current_allocation: Allocation,
        recommended_allocation: Allocation,
        current: &PerformanceMetrics,
        optimal: &PerformanceMetrics,
    ) -> Self {
        Self {
            current_allocation,
            recommended_allocation,
            expected_improvement: ExpectedImprovement::between(current, optimal),
            risk_metrics: RiskMetrics::new(current, optimal),
        }
    }

    /// `(symbol, current, recommended)` rows in recommended order.
    ///
    /// Symbols held now but absent from the recommendation come last.
    pub fn rows(&self) -> Vec<(String, f64, f64)> {
        let mut rows: Vec<(String, f64, f64)> = self
            .recommended_allocation
            .entries()
            .iter()
            .map(|e| {
                let current = self.current_allocation.weight(&e.symbol).unwrap_or(0.0);
                (e.symbol.clone(), current, e.weight)
            })
            .collect();

        for e in self.current_allocation.entries() {
            if self.recommended_allocation.weight(&e.symbol).is_none() {
                rows.push((e.symbol.clone(), e.weight, 0.0));
            }
        }
        rows
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str("\nOptimization Report\n");
        output.push_str(&"=".repeat(60));
        output.push('\n');
        output.push_str(&format!(
            "{:<12} {:>14} {:>14} {:>14}\n",
            "Symbol", "Current", "Recommended", "Change"
        ));
        output.push_str(&"-".repeat(60));
        output.push('\n');

        for (symbol, current, recommended) in self.rows() {
            output.push_str(&format!(
                "{:<12} {:>13.2}% {:>13.2}% {:>+13.2}%\n",
                symbol,
                current * 100.0,
                recommended * 100.0,
                (recommended - current) * 100.0
            ));
        }

        let m = &self.risk_metrics;
        let d = &self.expected_improvement;
        output.push_str("\nRisk Metrics:\n");
        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!(
            "  Volatility:   {:.2}% -> {:.2}% ({:+.2}%)\n",
            m.current_volatility * 100.0,
            m.optimal_volatility * 100.0,
            d.volatility_change * 100.0
        ));
        output.push_str(&format!(
            "  Sharpe Ratio: {:.3} -> {:.3} ({:+.3})\n",
            m.current_sharpe, m.optimal_sharpe, d.sharpe_improvement
        ));
        output.push_str(&format!(
            "  Return:       {:+.2}%\n",
            d.return_improvement * 100.0
        ));

        output.push_str(&"=".repeat(60));
        output.push('\n');
        output
    }

    /// Format as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut output = String::from("# Optimization Report\n\n");

        output.push_str("| Symbol | Current | Recommended | Change |\n");
        output.push_str("|--------|---------|-------------|--------|\n");
        for (symbol, current, recommended) in self.rows() {
            output.push_str(&format!(
                "| {} | {:.2}% | {:.2}% | {:+.2}% |\n",
                symbol,
                current * 100.0,
                recommended * 100.0,
                (recommended - current) * 100.0
            ));
        }

        let m = &self.risk_metrics;
        let d = &self.expected_improvement;
        output.push_str("\n## Expected Improvement\n\n");
        output.push_str(&format!(
            "- **Return:** {:+.2}%\n",
            d.return_improvement * 100.0
        ));
        output.push_str(&format!(
            "- **Volatility:** {:.2}% -> {:.2}%\n",
            m.current_volatility * 100.0,
            m.optimal_volatility * 100.0
        ));
        output.push_str(&format!(
            "- **Sharpe Ratio:** {:.3} -> {:.3}\n",
            m.current_sharpe, m.optimal_sharpe
        ));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn metrics(r: f64, v: f64) -> PerformanceMetrics {
        PerformanceMetrics {
            annualized_return: r,
            annualized_volatility: v,
            sharpe_ratio: (r - 0.02) / v,
        }
    }

    fn report() -> OptimizationReport {
        OptimizationReport::new(
            Allocation::from_pairs([("AAPL", 0.7), ("TLT", 0.3)]),
            Allocation::from_pairs([("TLT", 0.6), ("AAPL", 0.4)]),
            &metrics(0.12, 0.25),
            &metrics(0.10, 0.15),
        )
    }

    #[test]
    fn test_expected_improvement() {
        let r = report();
        assert_relative_eq!(r.expected_improvement.return_improvement, -0.02, epsilon = 1e-12);
        assert_relative_eq!(r.expected_improvement.volatility_change, -0.10, epsilon = 1e-12);
        assert_relative_eq!(
            r.expected_improvement.sharpe_improvement,
            0.08 / 0.15 - 0.10 / 0.25,
            epsilon = 1e-12
        );
        assert_eq!(r.risk_metrics.current_volatility, 0.25);
        assert_eq!(r.risk_metrics.optimal_volatility, 0.15);
    }

    #[test]
    fn test_rows_follow_recommendation_order() {
        let rows = report().rows();
        assert_eq!(rows[0], ("TLT".to_string(), 0.3, 0.6));
        assert_eq!(rows[1], ("AAPL".to_string(), 0.7, 0.4));
    }

    #[test]
    fn test_rows_include_dropped_holdings() {
        let report = OptimizationReport::new(
            Allocation::from_pairs([("AAPL", 0.5), ("GME", 0.5)]),
            Allocation::from_pairs([("AAPL", 1.0)]),
            &metrics(0.12, 0.25),
            &metrics(0.10, 0.15),
        );
        let rows = report.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], ("GME".to_string(), 0.5, 0.0));
    }

    #[test]
    fn test_report_rendering() {
        let ascii = report().to_ascii_table();
        assert!(ascii.contains("Optimization Report"));
        assert!(ascii.contains("TLT"));
        assert!(ascii.contains("+30.00%"));

        let markdown = report().to_markdown();
        assert!(markdown.contains("| Symbol | Current | Recommended | Change |"));
        assert!(markdown.contains("## Expected Improvement"));
    }

    #[test]
    fn test_analysis_rendering() {
        let analysis = PortfolioAnalysis {
            total_value: 12_500.0,
            expected_return: 0.11,
            volatility: 0.32,
            sharpe_ratio: 0.28,
            diversification_score: 0.4,
            risk_tier: RiskTier::VeryHigh,
            recommendations: vec!["Consider adding more stable assets to reduce risk".to_string()],
        };

        let ascii = analysis.to_ascii_table();
        assert!(ascii.contains("12500.00"));
        assert!(ascii.contains("Very High"));
        assert!(ascii.contains("1. Consider adding more stable assets"));

        let markdown = analysis.to_markdown();
        assert!(markdown.contains("- **Risk Tier:** Very High"));
        assert!(markdown.contains("## Recommendations"));

        assert!(analysis.to_string().contains("Sharpe Ratio: 0.280"));
    }
}
