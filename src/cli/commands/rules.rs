//! Rule listing and reordering.

use crate::rules::{CoverRuleKind, RuleSet};
use crate::settings::PluginSettings;

/// Print the rules: applied ones in try-order, then the rest
pub fn cmd_rules_list(settings: &PluginSettings) -> anyhow::Result<()> {
    print!("{}", render(&settings.rules()));
    Ok(())
}

/// Replace the applied rules and save the config
pub fn cmd_rules_set(settings: &PluginSettings, kinds: &[CoverRuleKind]) -> anyhow::Result<()> {
    let rules = settings.update_rules(|rules| {
        *rules = RuleSet::with_applied(kinds.iter().copied());
        rules.clone()
    });
    settings.save()?;

    println!("✓ Rules saved");
    println!();
    print!("{}", render(&rules));
    Ok(())
}

fn render(rules: &RuleSet) -> String {
    let mut out = String::new();
    for (index, kind) in rules.applied_kinds().iter().enumerate() {
        if let Some(rule) = rules.rule(*kind) {
            out.push_str(&format!(
                "{}. {:<12} {:<13} {}\n",
                index + 1,
                kind.as_str(),
                rule.module,
                kind.description()
            ));
        }
    }
    for rule in rules.available().iter().filter(|r| !r.enabled) {
        out.push_str(&format!(
            "-  {:<12} {:<13} {} (disabled)\n",
            rule.kind.as_str(),
            rule.module,
            rule.kind.description()
        ));
    }
    out
}
