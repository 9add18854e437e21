//! Pruning eligibility rules.
//!
//! Two independent axes decide what redaction may touch for a given tool:
//!
//! - **Inputs** are pruned only when an operator explicitly opted the tool
//!   into `allowPruneInputs`; an input may carry sensitive or
//!   irreproducible context, so protection status is irrelevant here.
//! - **Outputs** are pruned by default unless the tool is in
//!   `protectedTools`.
//!
//! The axes compose into four observable combinations; see the decision
//! matrix test below.

use crate::config::GcConfig;

/// Whether a tool's input payload may be redacted.
pub fn can_prune_input(tool: &str, config: &GcConfig) -> bool {
    config.allow_prune_inputs.contains(tool)
}

/// Whether a tool's output payload may be redacted.
pub fn can_prune_output(tool: &str, config: &GcConfig) -> bool {
    !config.protected_tools.contains(tool)
}

/// Whether any form of pruning applies to the tool.
///
/// A tool protected from output pruning but opted into input pruning is
/// still prunable (its output stays, its input goes).
pub fn is_prunable(tool: &str, config: &GcConfig) -> bool {
    can_prune_input(tool, config) || can_prune_output(tool, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(protected: bool, allow: bool) -> GcConfig {
        let mut config = GcConfig::default();
        if protected {
            config = config.protect_tool("bash");
        }
        if allow {
            config = config.allow_prune_input("bash");
        }
        config
    }

    #[test]
    fn decision_matrix() {
        // (protected, allow) -> (input prunable, output prunable)
        let cases = [
            (false, false, false, true),
            (false, true, true, true),
            (true, false, false, false),
            (true, true, true, false),
        ];
        for (protected, allow, input_expected, output_expected) in cases {
            let config = config_for(protected, allow);
            assert_eq!(
                can_prune_input("bash", &config),
                input_expected,
                "input axis for protected={protected}, allow={allow}"
            );
            assert_eq!(
                can_prune_output("bash", &config),
                output_expected,
                "output axis for protected={protected}, allow={allow}"
            );
        }
    }

    #[test]
    fn fully_protected_tool_is_not_prunable() {
        let config = config_for(true, false);
        assert!(!is_prunable("bash", &config));
    }

    #[test]
    fn protected_but_allow_listed_tool_is_still_prunable() {
        let config = config_for(true, true);
        assert!(is_prunable("bash", &config));
    }

    #[test]
    fn unlisted_tool_output_is_prunable_by_default() {
        let config = GcConfig::default();
        assert!(can_prune_output("grep", &config));
        assert!(!can_prune_input("grep", &config));
        assert!(is_prunable("grep", &config));
    }
}
