//! Arbitration strategies for choosing one provider among candidates

use router_api::{CapabilityEntry, KEYWORD_PARAMETER};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Caller-supplied selection function for custom arbitration.
///
/// Receives the custom parameters of the DiscoveryQos and the candidates left
/// after QoS filtering. Its decision is final.
pub trait ArbitrationStrategyFunction: Send + Sync {
    fn select(
        &self,
        custom_parameters: &BTreeMap<String, String>,
        candidates: &[CapabilityEntry],
    ) -> Option<CapabilityEntry>;
}

impl<F> ArbitrationStrategyFunction for F
where
    F: Fn(&BTreeMap<String, String>, &[CapabilityEntry]) -> Option<CapabilityEntry> + Send + Sync,
{
    fn select(
        &self,
        custom_parameters: &BTreeMap<String, String>,
        candidates: &[CapabilityEntry],
    ) -> Option<CapabilityEntry> {
        self(custom_parameters, candidates)
    }
}

/// Arbitration strategy
#[derive(Clone, Default)]
pub enum ArbitrationStrategy {
    /// Keyword: the single provider whose keyword parameter matches the requested one
    Keyword,
    /// Highest priority: the non-negative provider with the greatest priority
    #[default]
    HighestPriority,
    /// Custom: a caller-supplied selection function
    Custom(Arc<dyn ArbitrationStrategyFunction>),
}

impl fmt::Debug for ArbitrationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArbitrationStrategy::Keyword => f.write_str("Keyword"),
            ArbitrationStrategy::HighestPriority => f.write_str("HighestPriority"),
            ArbitrationStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl ArbitrationStrategy {
    /// Wrap a selection function as a custom strategy
    pub fn custom<F>(function: F) -> Self
    where
        F: ArbitrationStrategyFunction + 'static,
    {
        ArbitrationStrategy::Custom(Arc::new(function))
    }

    /// Select a provider from the candidates based on the strategy.
    ///
    /// `None` means this attempt produced no result: nothing qualified, or the
    /// keyword matched more than one provider.
    pub fn select(
        &self,
        custom_parameters: &BTreeMap<String, String>,
        candidates: &[CapabilityEntry],
    ) -> Option<CapabilityEntry> {
        match self {
            ArbitrationStrategy::Keyword => select_by_keyword(custom_parameters, candidates),
            ArbitrationStrategy::HighestPriority => select_highest_priority(candidates),
            ArbitrationStrategy::Custom(function) => function.select(custom_parameters, candidates),
        }
    }
}

/// Drop providers without on-change subscription support when they are required
pub fn filter_on_change(
    candidates: Vec<CapabilityEntry>,
    provider_must_support_on_change: bool,
) -> Vec<CapabilityEntry> {
    if !provider_must_support_on_change {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|c| c.provider_qos.supports_on_change_subscriptions)
        .collect()
}

fn select_by_keyword(
    custom_parameters: &BTreeMap<String, String>,
    candidates: &[CapabilityEntry],
) -> Option<CapabilityEntry> {
    let requested = custom_parameters.get(KEYWORD_PARAMETER)?;

    let mut matching = candidates
        .iter()
        .filter(|c| c.custom_parameter(KEYWORD_PARAMETER) == Some(requested.as_str()));

    match (matching.next(), matching.next()) {
        (Some(only), None) => Some(only.clone()),
        _ => None,
    }
}

fn select_highest_priority(candidates: &[CapabilityEntry]) -> Option<CapabilityEntry> {
    // Strict comparison keeps the first candidate on ties
    candidates
        .iter()
        .filter(|c| c.provider_qos.priority >= 0)
        .fold(None::<&CapabilityEntry>, |best, c| match best {
            Some(b) if b.provider_qos.priority >= c.provider_qos.priority => Some(b),
            _ => Some(c),
        })
        .cloned()
}
