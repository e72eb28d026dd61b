use tera::{Context, Tera};
use thiserror::Error;

use servicedesk_core::rules::refund::{
    GOLD_REFUND_WINDOW_DAYS, MAX_REFUND_WITHOUT_APPROVAL, MAX_REFUND_WITH_MANAGER_APPROVAL,
    PLATINUM_REFUND_WINDOW_DAYS, STANDARD_REFUND_WINDOW_DAYS,
};

const TEMPLATE_NAME: &str = "system_policy";
const TEMPLATE: &str = include_str!("../templates/system_policy.tera");
const STORE_NAME: &str = "TechGear e-commerce";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("escalation channel id is empty")]
    MissingDestination,
    #[error("system policy template failed: {0}")]
    Template(#[from] tera::Error),
}

/// Renders the system turn. Thresholds come from the rule constants so the
/// policy text cannot drift from the rules the tools apply.
pub struct SystemPolicy {
    tera: Tera,
}

impl SystemPolicy {
    pub fn new() -> Result<Self, PromptError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;
        Ok(Self { tera })
    }

    pub fn render(&self, escalation_channel_id: &str) -> Result<String, PromptError> {
        let channel = escalation_channel_id.trim();
        if channel.is_empty() {
            return Err(PromptError::MissingDestination);
        }

        let mut context = Context::new();
        context.insert("store_name", STORE_NAME);
        context.insert("escalation_channel_id", channel);
        context.insert("standard_window", &STANDARD_REFUND_WINDOW_DAYS);
        context.insert("gold_window", &GOLD_REFUND_WINDOW_DAYS);
        context.insert("platinum_window", &PLATINUM_REFUND_WINDOW_DAYS);
        context.insert("auto_approve_limit", &MAX_REFUND_WITHOUT_APPROVAL.to_string());
        context.insert("manager_limit", &MAX_REFUND_WITH_MANAGER_APPROVAL.to_string());

        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{PromptError, SystemPolicy};

    #[test]
    fn policy_embeds_channel_and_thresholds() {
        let policy = SystemPolicy::new().expect("template").render("C0ESCALATE").expect("render");

        assert!(policy.contains("Slack escalation channel ID: C0ESCALATE"), "{policy}");
        assert!(policy.contains("Standard tier: 30-day refund window"));
        assert!(policy.contains("Platinum tier: 90-day refund window"));
        assert!(policy.contains("Refunds up to $200 are auto-approved"));
        assert!(policy.contains("Refunds over $1000 require executive approval"));
        assert!(policy.contains("you MUST post an escalation message to Slack"));
    }

    #[test]
    fn blank_channel_is_refused() {
        let policy = SystemPolicy::new().expect("template");

        assert!(matches!(policy.render("   "), Err(PromptError::MissingDestination)));
    }
}
