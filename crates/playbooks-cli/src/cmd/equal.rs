use super::load_rules;
use crate::output::print_json;
use playbooks_core::action::equal_action_type;
use std::path::Path;

pub fn run(file: &Path, a: usize, b: usize, json: bool) -> anyhow::Result<()> {
    let rules = load_rules(file)?;
    let rule = |index: usize| {
        rules.get(index).ok_or_else(|| {
            anyhow::anyhow!(
                "rule {index} out of range: {} has {} rule(s)",
                file.display(),
                rules.len()
            )
        })
    };
    let equal = equal_action_type(rule(a)?, rule(b)?);

    if json {
        print_json(&serde_json::json!({ "a": a, "b": b, "equal": equal }))
    } else {
        if equal {
            println!("rules {a} and {b} occupy the same trigger slot");
        } else {
            println!("rules {a} and {b} are different");
        }
        Ok(())
    }
}
