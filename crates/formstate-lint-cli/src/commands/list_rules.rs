//! List rules command implementation.

use formstate_lint::rules::all_rules;

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!("{:<6} {:<26} Description", "Code", "Name");
    println!("{}", "-".repeat(80));

    for rule in all_rules() {
        println!(
            "{:<6} {:<26} {}",
            rule.code(),
            rule.name(),
            rule.description()
        );
    }

    println!("\nUse --rules to run a subset, e.g.:");
    println!("  formstate-lint check --rules form-applies-state,required-tag-closure");
    println!("  formstate-lint check --rules L1,L3");
}
