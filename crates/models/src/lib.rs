//! Inventory models for asymmetric range sizing.
//!
//! This crate handles:
//! - Realized volatility over a bounded price history
//! - Inventory ratio and deviation from target
//! - Simple, Avellaneda-Stoikov and GLFT range models
//! - A name-keyed model factory with runtime registration

pub mod avellaneda_stoikov;
pub mod factory;
pub mod glft;
pub mod inventory;
pub mod simple;
pub mod volatility;

pub use avellaneda_stoikov::AvellanedaStoikovModel;
pub use factory::{BuiltinModel, ModelConstructor, ModelFactory};
pub use glft::GlftModel;
pub use inventory::{
    ModelDiagnostics, ModelInfo, ModelSettings, RangeInputs, RangeRecommendation,
};
pub use simple::SimpleModel;
pub use volatility::{annualized_volatility, PriceHistory};

use asymlp_core::{Result, TokenDecimals};
use tracing::warn;

/// Turns inventory and volatility into asymmetric range widths.
///
/// Implementors only provide [`try_calculate`](Self::try_calculate); callers use
/// [`calculate_lp_ranges`](Self::calculate_lp_ranges), which never fails.
pub trait InventoryModel: Send + Sync {
    /// Registry name.
    fn name(&self) -> &str;

    /// Configuration the model was built with.
    fn settings(&self) -> &ModelSettings;

    /// Compute widths, propagating any failure.
    fn try_calculate(
        &self,
        inputs: &RangeInputs<'_>,
        decimals: &dyn TokenDecimals,
    ) -> Result<RangeRecommendation>;

    fn model_info(&self) -> ModelInfo;

    /// Compute widths; failures turn into minimum ranges with `fallback_used`.
    fn calculate_lp_ranges(
        &self,
        inputs: &RangeInputs<'_>,
        decimals: &dyn TokenDecimals,
    ) -> RangeRecommendation {
        let settings = self.settings();
        match self.try_calculate(inputs, decimals) {
            Ok(mut rec) => {
                rec.range_a_percentage = settings.ranges.clamp(rec.range_a_percentage);
                rec.range_b_percentage = settings.ranges.clamp(rec.range_b_percentage);
                rec
            }
            Err(err) => {
                warn!(model = self.name(), error = %err, "Range calculation failed, using fallback ranges");
                settings.fallback(self.name(), &err)
            }
        }
    }
}
