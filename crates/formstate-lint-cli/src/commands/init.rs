//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const CONFIG_FILE: &str = "formstate-lint.toml";

const DEFAULT_CONFIG: &str = r#"# formstate-lint configuration

# Manifest to validate when --manifest is not given
manifest = "ClaudeContext/manifest.yaml"

# Document referenced by failing reports
docs = "ClaudeContext/Handoffs/Form_State_Architecture_Fix_v4.13.2.md"

[policy]
# Common ancestor of every per-form tag
parent_tag = "Effect.Father.FormState"
# Required tags under this namespace are checked for a granting form
form_tag_prefix = "Effect.Father.FormState."
# Tags that must never be wired into a removal
banned_removal_tags = ["Narrative.State.Invulnerable"]

# Form ability -> state effect it must apply
[[forms]]
ability = "GA_FatherCrawler"
effect = "GE_CrawlerState"

[[forms]]
ability = "GA_FatherArmor"
effect = "GE_ArmorState"

[[forms]]
ability = "GA_FatherExoskeleton"
effect = "GE_ExoskeletonState"

[[forms]]
ability = "GA_FatherSymbiote"
effect = "GE_SymbioteState"

[[forms]]
ability = "GA_FatherEngineer"
effect = "GE_EngineerState"

# State effect -> tag it grants
[[granted-tags]]
effect = "GE_CrawlerState"
tag = "Effect.Father.FormState.Crawler"

[[granted-tags]]
effect = "GE_ArmorState"
tag = "Effect.Father.FormState.Armor"

[[granted-tags]]
effect = "GE_ExoskeletonState"
tag = "Effect.Father.FormState.Exoskeleton"

[[granted-tags]]
effect = "GE_SymbioteState"
tag = "Effect.Father.FormState.Symbiote"

[[granted-tags]]
effect = "GE_EngineerState"
tag = "Effect.Father.FormState.Engineer"

[functions]
apply_effect = "ApplyGameplayEffectToSelf"
remove_by_granted_tag = "RemoveGameplayEffectFromOwnerWithGrantedTags"
make_literal_tag = "MakeLiteralGameplayTag"
make_tag_container = "MakeGameplayTagContainerFromTag"

# Rule configurations, keyed by name or code
# [rules.required-tag-closure]
# enabled = true
# severity = "warning"

[guard]
bypass_token = "[LOCKED-CHANGE-APPROVED]"
locked = [
    "ClaudeContext/Handoffs/LOCKED_CONTRACTS.md",
    "ClaudeContext/Handoffs/LOCKED_SYSTEMS.md",
    "Source/GasAbilityGenerator/Public/Locked/GasAbilityGeneratorMetadata.h",
    "Source/GasAbilityGenerator/Private/Locked/GasAbilityGeneratorMetadata.cpp",
    "Source/GasAbilityGenerator/Public/Locked/GasAbilityGeneratorTypes.h",
    "Source/GasAbilityGenerator/Private/GasAbilityGeneratorGenerators.cpp",
    "Source/GasAbilityGenerator/Public/GasAbilityGeneratorGenerators.h",
    "Source/GasAbilityGenerator/Private/XLSXSupport/*",
    "Source/GasAbilityGenerator/Public/XLSXSupport/*",
]
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    write_config(Path::new(CONFIG_FILE), force)?;

    println!("Created {CONFIG_FILE}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE} to describe your forms");
    println!("  2. Run: formstate-lint check");

    Ok(())
}

fn write_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))
}
