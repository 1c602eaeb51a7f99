//! Cost estimation for usage reporting.
//!
//! A hardcoded default pricing table for known models, with user override
//! capability from `config.toml`. Estimates are clearly labeled as
//! approximate (`~$0.12`).

use promptgate_types::config::ModelPricing;

struct PricingEntry {
    model_pattern: &'static str,
    input_cost_per_million: f64,
    output_cost_per_million: f64,
}

/// Conservative fallback pricing when no model match is found.
const FALLBACK_INPUT_COST: f64 = 5.0;
const FALLBACK_OUTPUT_COST: f64 = 15.0;

/// Default pricing per million tokens, USD, approximate as of early 2026.
///
/// Order matters: more specific patterns come before their prefixes
/// (`gpt-4o-mini` before `gpt-4o`, `gpt-4-turbo` before `gpt-4`).
fn default_pricing_table() -> Vec<PricingEntry> {
    vec![
        PricingEntry {
            model_pattern: "gpt-4o-mini",
            input_cost_per_million: 0.15,
            output_cost_per_million: 0.60,
        },
        PricingEntry {
            model_pattern: "gpt-4o",
            input_cost_per_million: 2.50,
            output_cost_per_million: 10.0,
        },
        PricingEntry {
            model_pattern: "gpt-4-turbo",
            input_cost_per_million: 10.0,
            output_cost_per_million: 30.0,
        },
        PricingEntry {
            model_pattern: "gpt-4",
            input_cost_per_million: 30.0,
            output_cost_per_million: 60.0,
        },
        PricingEntry {
            model_pattern: "gpt-3.5-turbo",
            input_cost_per_million: 0.50,
            output_cost_per_million: 1.50,
        },
        PricingEntry {
            model_pattern: "text-embedding-3-small",
            input_cost_per_million: 0.02,
            output_cost_per_million: 0.0,
        },
    ]
}

/// The pattern is treated as a prefix: `"gpt-4o"` matches
/// `"gpt-4o-2024-08-06"`.
fn matches_pattern(model: &str, pattern: &str) -> bool {
    model.starts_with(pattern)
}

/// Estimate the cost of usage in USD.
///
/// Lookup order:
/// 1. User-defined pricing overrides from `config.toml`
/// 2. Hardcoded default pricing table
/// 3. Conservative fallback ($5.00 / $15.00 per million tokens)
pub fn estimate_cost(
    input_tokens: u64,
    output_tokens: u64,
    model: &str,
    user_pricing: &[ModelPricing],
) -> f64 {
    for pricing in user_pricing {
        if matches_pattern(model, &pricing.model_pattern) {
            return compute_cost(
                input_tokens,
                output_tokens,
                pricing.input_cost_per_million,
                pricing.output_cost_per_million,
            );
        }
    }

    for entry in default_pricing_table() {
        if matches_pattern(model, entry.model_pattern) {
            return compute_cost(
                input_tokens,
                output_tokens,
                entry.input_cost_per_million,
                entry.output_cost_per_million,
            );
        }
    }

    compute_cost(input_tokens, output_tokens, FALLBACK_INPUT_COST, FALLBACK_OUTPUT_COST)
}

fn compute_cost(
    input_tokens: u64,
    output_tokens: u64,
    input_cost_per_million: f64,
    output_cost_per_million: f64,
) -> f64 {
    let input_cost = (input_tokens as f64 / 1_000_000.0) * input_cost_per_million;
    let output_cost = (output_tokens as f64 / 1_000_000.0) * output_cost_per_million;
    input_cost + output_cost
}

/// Format a cost estimate as a human-readable string.
///
/// Always prefixed with `~` to indicate the value is an estimate.
/// - Costs below $0.01 use 3 decimal places: `~$0.001`
/// - Costs $0.01 and above use 2 decimal places: `~$0.12`
pub fn format_cost(cost: f64) -> String {
    if cost < 0.01 {
        format!("~${cost:.3}")
    } else {
        format!("~${cost:.2}")
    }
}
