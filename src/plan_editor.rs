use std::collections::HashMap;

use crate::error::{ConsoleError, Result};
use crate::models::{PlanUpdate, SubscriptionPlan};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn toggled(self) -> Self {
        match self {
            BillingCycle::Monthly => BillingCycle::Yearly,
            BillingCycle::Yearly => BillingCycle::Monthly,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BillingCycle::Monthly => "Monthly",
            BillingCycle::Yearly => "Yearly",
        }
    }
}

/// 套餐表单中可编辑的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanField {
    /// 当前计费周期对应的价格
    Price,
    MaxEditors,
    MaxViewers,
    MaxRfpProposalGenerations,
    MaxGrantProposalGenerations,
    MaxMagicBrushUsage,
    MaxImageGenerationUsage,
}

impl PlanField {
    pub const ALL: [PlanField; 7] = [
        PlanField::Price,
        PlanField::MaxEditors,
        PlanField::MaxViewers,
        PlanField::MaxRfpProposalGenerations,
        PlanField::MaxGrantProposalGenerations,
        PlanField::MaxMagicBrushUsage,
        PlanField::MaxImageGenerationUsage,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PlanField::Price => "Price",
            PlanField::MaxEditors => "Max editors",
            PlanField::MaxViewers => "Max viewers",
            PlanField::MaxRfpProposalGenerations => "RFP proposal generations",
            PlanField::MaxGrantProposalGenerations => "Grant proposal generations",
            PlanField::MaxMagicBrushUsage => "Magic brush usage",
            PlanField::MaxImageGenerationUsage => "Image generation usage",
        }
    }

    fn limit_slot(self, update: &mut PlanUpdate) -> Option<&mut Option<i64>> {
        match self {
            PlanField::Price => None,
            PlanField::MaxEditors => Some(&mut update.max_editors),
            PlanField::MaxViewers => Some(&mut update.max_viewers),
            PlanField::MaxRfpProposalGenerations => Some(&mut update.max_rfp_proposal_generations),
            PlanField::MaxGrantProposalGenerations => {
                Some(&mut update.max_grant_proposal_generations)
            }
            PlanField::MaxMagicBrushUsage => Some(&mut update.max_magic_brush_usage),
            PlanField::MaxImageGenerationUsage => Some(&mut update.max_image_generation_usage),
        }
    }

    fn current_limit(self, plan: &SubscriptionPlan) -> i64 {
        match self {
            PlanField::Price => 0,
            PlanField::MaxEditors => plan.max_editors,
            PlanField::MaxViewers => plan.max_viewers,
            PlanField::MaxRfpProposalGenerations => plan.max_rfp_proposal_generations,
            PlanField::MaxGrantProposalGenerations => plan.max_grant_proposal_generations,
            PlanField::MaxMagicBrushUsage => plan.max_magic_brush_usage,
            PlanField::MaxImageGenerationUsage => plan.max_image_generation_usage,
        }
    }
}

/// 单个套餐的暂存修改
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanDraft {
    pub cycle: BillingCycle,
    pub staged: PlanUpdate,
}

/// 多个套餐的暂存表单，按套餐 id 分开保存
///
/// 保存时只提交暂存过的字段，取消则丢弃。
#[derive(Debug, Clone, Default)]
pub struct PlanEditor {
    drafts: HashMap<String, PlanDraft>,
}

impl PlanEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cycle(&self, plan_id: &str) -> BillingCycle {
        self.drafts
            .get(plan_id)
            .map(|d| d.cycle)
            .unwrap_or_default()
    }

    pub fn toggle_cycle(&mut self, plan_id: &str) -> BillingCycle {
        let draft = self.drafts.entry(plan_id.to_string()).or_default();
        draft.cycle = draft.cycle.toggled();
        draft.cycle
    }

    /// 暂存一个字段的新值；价格写入当前计费周期
    ///
    /// 负数、非数字以及非整数的额度会被拒绝，草稿保持不变
    pub fn stage(&mut self, plan_id: &str, field: PlanField, raw: &str) -> Result<()> {
        let raw = raw.trim().trim_start_matches('$');
        let draft = self.drafts.entry(plan_id.to_string()).or_default();
        match field {
            PlanField::Price => {
                let price: f64 = raw
                    .parse()
                    .map_err(|_| ConsoleError::InvalidInput(format!("not a number: {raw}")))?;
                if !price.is_finite() || price < 0.0 {
                    return Err(ConsoleError::InvalidInput("price cannot be negative".into()));
                }
                match draft.cycle {
                    BillingCycle::Monthly => draft.staged.monthly_price = Some(price),
                    BillingCycle::Yearly => draft.staged.yearly_price = Some(price),
                }
            }
            limit => {
                let value: i64 = raw
                    .parse()
                    .map_err(|_| ConsoleError::InvalidInput(format!("not an integer: {raw}")))?;
                if value < 0 {
                    return Err(ConsoleError::InvalidInput(format!(
                        "{} cannot be negative",
                        limit.label()
                    )));
                }
                if let Some(slot) = limit.limit_slot(&mut draft.staged) {
                    *slot = Some(value);
                }
            }
        }
        Ok(())
    }

    /// 表单中显示的值：有暂存值时显示暂存值，否则显示套餐当前值
    pub fn display_value(&self, plan: &SubscriptionPlan, field: PlanField) -> String {
        let draft = self.drafts.get(&plan.id);
        let cycle = draft.map(|d| d.cycle).unwrap_or_default();
        match field {
            PlanField::Price => {
                let staged = draft.and_then(|d| match cycle {
                    BillingCycle::Monthly => d.staged.monthly_price,
                    BillingCycle::Yearly => d.staged.yearly_price,
                });
                let current = match cycle {
                    BillingCycle::Monthly => plan.monthly_price,
                    BillingCycle::Yearly => plan.yearly_price,
                };
                format!("{:.2}", staged.unwrap_or(current))
            }
            limit => {
                let mut staged = draft.map(|d| d.staged.clone()).unwrap_or_default();
                let value = limit
                    .limit_slot(&mut staged)
                    .and_then(|slot| *slot)
                    .unwrap_or_else(|| limit.current_limit(plan));
                value.to_string()
            }
        }
    }

    pub fn is_dirty(&self, plan_id: &str) -> bool {
        self.drafts
            .get(plan_id)
            .is_some_and(|d| !d.staged.is_empty())
    }

    /// 待提交的修改；没有暂存内容时为空
    pub fn pending_update(&self, plan_id: &str) -> PlanUpdate {
        self.drafts
            .get(plan_id)
            .map(|d| d.staged.clone())
            .unwrap_or_default()
    }

    /// 丢弃暂存修改（保留计费周期选择）
    pub fn cancel(&mut self, plan_id: &str) {
        if let Some(draft) = self.drafts.get_mut(plan_id) {
            draft.staged = PlanUpdate::default();
        }
    }

    /// 保存成功后清掉已提交的字段
    ///
    /// 请求在途期间重新暂存的字段（值与 `sent` 不同）保留在草稿中
    pub fn committed(&mut self, plan_id: &str, sent: &PlanUpdate) {
        fn settle<T: PartialEq>(slot: &mut Option<T>, sent: &Option<T>) {
            if sent.is_some() && *slot == *sent {
                *slot = None;
            }
        }
        let Some(draft) = self.drafts.get_mut(plan_id) else {
            return;
        };
        let staged = &mut draft.staged;
        settle(&mut staged.monthly_price, &sent.monthly_price);
        settle(&mut staged.yearly_price, &sent.yearly_price);
        settle(&mut staged.max_editors, &sent.max_editors);
        settle(&mut staged.max_viewers, &sent.max_viewers);
        settle(
            &mut staged.max_rfp_proposal_generations,
            &sent.max_rfp_proposal_generations,
        );
        settle(
            &mut staged.max_grant_proposal_generations,
            &sent.max_grant_proposal_generations,
        );
        settle(&mut staged.max_magic_brush_usage, &sent.max_magic_brush_usage);
        settle(
            &mut staged.max_image_generation_usage,
            &sent.max_image_generation_usage,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> SubscriptionPlan {
        SubscriptionPlan {
            id: "p1".into(),
            name: "Pro".into(),
            monthly_price: 29.0,
            yearly_price: 290.0,
            max_editors: 5,
            max_viewers: 20,
            max_rfp_proposal_generations: 40,
            max_grant_proposal_generations: 10,
            max_magic_brush_usage: 100,
            max_image_generation_usage: 50,
            is_contact: false,
        }
    }

    #[test]
    fn staged_price_follows_billing_cycle() {
        let mut editor = PlanEditor::new();
        editor.stage("p1", PlanField::Price, "35").unwrap();
        editor.toggle_cycle("p1");
        editor.stage("p1", PlanField::Price, "$330").unwrap();
        let update = editor.pending_update("p1");
        assert_eq!(update.monthly_price, Some(35.0));
        assert_eq!(update.yearly_price, Some(330.0));
        assert_eq!(editor.display_value(&plan(), PlanField::Price), "330.00");
    }

    #[test]
    fn only_staged_fields_are_submitted() {
        let mut editor = PlanEditor::new();
        editor.stage("p1", PlanField::MaxViewers, "25").unwrap();
        let v = serde_json::to_value(editor.pending_update("p1")).unwrap();
        assert_eq!(v, serde_json::json!({"maxViewers": 25}));
        assert_eq!(editor.display_value(&plan(), PlanField::MaxViewers), "25");
        assert_eq!(editor.display_value(&plan(), PlanField::MaxEditors), "5");
    }

    #[test]
    fn negative_and_garbage_values_are_rejected() {
        let mut editor = PlanEditor::new();
        assert!(editor.stage("p1", PlanField::Price, "-1").is_err());
        assert!(editor.stage("p1", PlanField::MaxEditors, "-3").is_err());
        assert!(editor.stage("p1", PlanField::MaxEditors, "2.5").is_err());
        assert!(editor.stage("p1", PlanField::MaxEditors, "lots").is_err());
        assert!(!editor.is_dirty("p1"));
    }

    #[test]
    fn commit_keeps_values_restaged_after_sending() {
        let mut editor = PlanEditor::new();
        editor.stage("p1", PlanField::Price, "12").unwrap();
        editor.stage("p1", PlanField::MaxViewers, "30").unwrap();
        let sent = editor.pending_update("p1");
        editor.stage("p1", PlanField::MaxViewers, "40").unwrap();
        editor.stage("p1", PlanField::MaxEditors, "7").unwrap();
        editor.committed("p1", &sent);
        let left = editor.pending_update("p1");
        assert_eq!(left.monthly_price, None);
        assert_eq!(left.max_viewers, Some(40));
        assert_eq!(left.max_editors, Some(7));

        editor.committed("p1", &left);
        assert!(!editor.is_dirty("p1"));
    }

    #[test]
    fn cancel_discards_and_drafts_are_per_plan() {
        let mut editor = PlanEditor::new();
        editor.stage("p1", PlanField::MaxEditors, "9").unwrap();
        editor.stage("p2", PlanField::MaxEditors, "3").unwrap();
        editor.cancel("p1");
        assert!(editor.pending_update("p1").is_empty());
        assert_eq!(editor.pending_update("p2").max_editors, Some(3));
    }
}
