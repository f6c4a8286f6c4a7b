use serde::{Deserialize, Serialize};

use super::lenient;

/// 订阅套餐（Basic / Pro / Enterprise）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    #[serde(alias = "_id", deserialize_with = "lenient::string_or_empty")]
    pub id: String,
    #[serde(default, alias = "planName", deserialize_with = "lenient::string_or_empty")]
    pub name: String,
    #[serde(rename = "monthlyPrice", default, deserialize_with = "lenient::f64_or_zero")]
    pub monthly_price: f64,
    #[serde(rename = "yearlyPrice", default, deserialize_with = "lenient::f64_or_zero")]
    pub yearly_price: f64,
    #[serde(rename = "maxEditors", default, deserialize_with = "lenient::i64_or_zero")]
    pub max_editors: i64,
    #[serde(rename = "maxViewers", default, deserialize_with = "lenient::i64_or_zero")]
    pub max_viewers: i64,
    #[serde(rename = "maxRFPProposalGenerations", default, deserialize_with = "lenient::i64_or_zero")]
    pub max_rfp_proposal_generations: i64,
    #[serde(rename = "maxGrantProposalGenerations", default, deserialize_with = "lenient::i64_or_zero")]
    pub max_grant_proposal_generations: i64,
    #[serde(rename = "maxMagicBrushUsage", default, deserialize_with = "lenient::i64_or_zero")]
    pub max_magic_brush_usage: i64,
    #[serde(rename = "maxImageGenerationUsage", default, deserialize_with = "lenient::i64_or_zero")]
    pub max_image_generation_usage: i64,
    #[serde(rename = "isContact", default, deserialize_with = "lenient::bool_or_false")]
    pub is_contact: bool,
}

/// 套餐价格/额度修改：只携带已暂存的字段
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanUpdate {
    #[serde(rename = "monthlyPrice", skip_serializing_if = "Option::is_none")]
    pub monthly_price: Option<f64>,
    #[serde(rename = "yearlyPrice", skip_serializing_if = "Option::is_none")]
    pub yearly_price: Option<f64>,
    #[serde(rename = "maxEditors", skip_serializing_if = "Option::is_none")]
    pub max_editors: Option<i64>,
    #[serde(rename = "maxViewers", skip_serializing_if = "Option::is_none")]
    pub max_viewers: Option<i64>,
    #[serde(rename = "maxRFPProposalGenerations", skip_serializing_if = "Option::is_none")]
    pub max_rfp_proposal_generations: Option<i64>,
    #[serde(rename = "maxGrantProposalGenerations", skip_serializing_if = "Option::is_none")]
    pub max_grant_proposal_generations: Option<i64>,
    #[serde(rename = "maxMagicBrushUsage", skip_serializing_if = "Option::is_none")]
    pub max_magic_brush_usage: Option<i64>,
    #[serde(rename = "maxImageGenerationUsage", skip_serializing_if = "Option::is_none")]
    pub max_image_generation_usage: Option<i64>,
}

impl PlanUpdate {
    pub fn is_empty(&self) -> bool {
        *self == PlanUpdate::default()
    }

    /// 将修改合并进本地套餐记录
    pub fn apply_to(&self, plan: &mut SubscriptionPlan) {
        if let Some(v) = self.monthly_price {
            plan.monthly_price = v;
        }
        if let Some(v) = self.yearly_price {
            plan.yearly_price = v;
        }
        if let Some(v) = self.max_editors {
            plan.max_editors = v;
        }
        if let Some(v) = self.max_viewers {
            plan.max_viewers = v;
        }
        if let Some(v) = self.max_rfp_proposal_generations {
            plan.max_rfp_proposal_generations = v;
        }
        if let Some(v) = self.max_grant_proposal_generations {
            plan.max_grant_proposal_generations = v;
        }
        if let Some(v) = self.max_magic_brush_usage {
            plan.max_magic_brush_usage = v;
        }
        if let Some(v) = self.max_image_generation_usage {
            plan.max_image_generation_usage = v;
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactFlagPayload {
    #[serde(rename = "isContact")]
    pub is_contact: bool,
}

/// 增值包
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOn {
    #[serde(alias = "_id", deserialize_with = "lenient::string_or_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub quantity: i64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient::bool_or_false")]
    pub popular: bool,
}

/// 新建/修改增值包的请求体
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddOnPayload {
    pub name: String,
    pub description: String,
    pub quantity: i64,
    pub price: f64,
    pub popular: bool,
}

impl AddOnPayload {
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::ConsoleError;
        if self.name.trim().is_empty() {
            return Err(ConsoleError::InvalidInput("add-on name is required".into()));
        }
        if self.quantity <= 0 {
            return Err(ConsoleError::InvalidInput("quantity must be positive".into()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ConsoleError::InvalidInput("price must be a non-negative number".into()));
        }
        Ok(())
    }
}

impl From<&AddOn> for AddOnPayload {
    fn from(a: &AddOn) -> Self {
        Self {
            name: a.name.clone(),
            description: a.description.clone(),
            quantity: a.quantity,
            price: a.price,
            popular: a.popular,
        }
    }
}
