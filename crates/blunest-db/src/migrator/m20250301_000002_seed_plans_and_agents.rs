//! Seed subscription plans and analysis agents

use chrono::Utc;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};
use sea_orm_migration::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::entities::{ai_agent_configuration, subscription_plan};

#[derive(DeriveMigrationName)]
pub struct Migration;

struct PlanSeed {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    price_monthly: f64,
    price_yearly: Option<f64>,
    analyses_per_month: i32,
    max_properties_comparison: i32,
    agents: &'static [&'static str],
    features: &'static [&'static str],
}

const PLANS: &[PlanSeed] = &[
    PlanSeed {
        name: "Free",
        slug: "free",
        description: "Try the AI investment committee on a few properties",
        price_monthly: 0.0,
        price_yearly: None,
        analyses_per_month: 3,
        max_properties_comparison: 2,
        agents: &["market_pulse"],
        features: &["3 AI analyses per month", "Market Pulse agent"],
    },
    PlanSeed {
        name: "AI Basic",
        slug: "ai_basic",
        description: "Market and deal analysis for active buyers",
        price_monthly: 499.0,
        price_yearly: Some(4990.0),
        analyses_per_month: 25,
        max_properties_comparison: 3,
        agents: &["market_pulse", "deal_underwriter"],
        features: &[
            "25 AI analyses per month",
            "Market Pulse and Deal Underwriter agents",
            "Compare up to 3 properties",
        ],
    },
    PlanSeed {
        name: "AI Pro",
        slug: "ai_pro",
        description: "The full investment committee",
        price_monthly: 1499.0,
        price_yearly: Some(14990.0),
        analyses_per_month: 100,
        max_properties_comparison: 5,
        agents: &["all"],
        features: &[
            "100 AI analyses per month",
            "All six agents",
            "Compare up to 5 properties",
        ],
    },
    PlanSeed {
        name: "AI Enterprise",
        slug: "ai_enterprise",
        description: "Unlimited analyses for teams and advisors",
        price_monthly: 4999.0,
        price_yearly: Some(49990.0),
        analyses_per_month: 0,
        max_properties_comparison: 0,
        agents: &["all"],
        features: &[
            "Unlimited AI analyses",
            "All six agents",
            "Unlimited comparisons",
        ],
    },
];

struct AgentSeed {
    slug: &'static str,
    display_name: &'static str,
    description: &'static str,
    system_prompt: &'static str,
    required_tier: &'static str,
}

const AGENTS: &[AgentSeed] = &[
    AgentSeed {
        slug: "market_pulse",
        display_name: "Market Pulse",
        description: "Local demand, price trends and growth drivers",
        system_prompt: "You are a real-estate market analyst for Indian cities. Assess the \
            micro-market of the property: recent price trends, rental demand, upcoming \
            infrastructure and supply pipeline. Finish with a short verdict on growth potential.",
        required_tier: "free",
    },
    AgentSeed {
        slug: "deal_underwriter",
        display_name: "Deal Underwriter",
        description: "Pricing, yield and financing assessment",
        system_prompt: "You are a property deal underwriter. Evaluate whether the asking price \
            is fair for the size and location, estimate rental yield and highlight financing \
            considerations. State clearly whether the deal is worth pursuing.",
        required_tier: "ai_basic",
    },
    AgentSeed {
        slug: "developer_verification",
        display_name: "Developer Verification",
        description: "Builder track record and delivery risk",
        system_prompt: "You verify real-estate developers. From the listing details, discuss \
            what is known about the builder, typical delivery risks for this kind of project \
            and what the buyer should verify before committing.",
        required_tier: "ai_pro",
    },
    AgentSeed {
        slug: "legal_regulatory",
        display_name: "Legal & Regulatory",
        description: "RERA, title and approval checks",
        system_prompt: "You are a real-estate legal advisor. List the regulatory and title \
            checks relevant to this property (RERA registration, approvals, encumbrances) and \
            flag any issue implied by the listing.",
        required_tier: "ai_pro",
    },
    AgentSeed {
        slug: "exit_optimizer",
        display_name: "Exit Optimizer",
        description: "Holding period and resale strategy",
        system_prompt: "You plan exits for property investors. Recommend a holding period, \
            expected resale liquidity and the conditions under which the investor should sell.",
        required_tier: "ai_pro",
    },
    AgentSeed {
        slug: "committee_synthesizer",
        display_name: "Committee Synthesizer",
        description: "Overall recommendation across all perspectives",
        system_prompt: "You chair an investment committee. Weigh market, pricing, developer, \
            legal and exit perspectives for this property and give a single recommendation: \
            strong buy, buy, hold or avoid, with the key reasons.",
        required_tier: "ai_pro",
    },
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let now = Utc::now();

        let plans = PLANS
            .iter()
            .enumerate()
            .map(|(order, seed)| subscription_plan::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(seed.name.to_string()),
                slug: Set(seed.slug.to_string()),
                description: Set(Some(seed.description.to_string())),
                price_monthly: Set(seed.price_monthly),
                price_yearly: Set(seed.price_yearly),
                analyses_per_month: Set(seed.analyses_per_month),
                max_properties_comparison: Set(seed.max_properties_comparison),
                agents_access: Set(json!(seed.agents)),
                features: Set(json!(seed.features)),
                is_active: Set(true),
                display_order: Set(order as i32),
                created_at: Set(now),
                updated_at: Set(now),
            });

        subscription_plan::Entity::insert_many(plans).exec(db).await?;

        let agents = AGENTS
            .iter()
            .enumerate()
            .map(|(order, seed)| ai_agent_configuration::ActiveModel {
                id: Set(Uuid::new_v4()),
                agent_slug: Set(seed.slug.to_string()),
                display_name: Set(seed.display_name.to_string()),
                description: Set(Some(seed.description.to_string())),
                system_prompt: Set(seed.system_prompt.to_string()),
                model: Set("default".to_string()),
                temperature: Set(0.7),
                max_tokens: Set(2000),
                required_tier: Set(seed.required_tier.to_string()),
                display_order: Set(order as i32),
                is_enabled: Set(true),
                version: Set(1),
                created_at: Set(now),
                updated_at: Set(now),
            });

        ai_agent_configuration::Entity::insert_many(agents)
            .exec(db)
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        let agent_slugs: Vec<&str> = AGENTS.iter().map(|a| a.slug).collect();
        ai_agent_configuration::Entity::delete_many()
            .filter(ai_agent_configuration::Column::AgentSlug.is_in(agent_slugs))
            .exec(db)
            .await?;

        let plan_slugs: Vec<&str> = PLANS.iter().map(|p| p.slug).collect();
        subscription_plan::Entity::delete_many()
            .filter(subscription_plan::Column::Slug.is_in(plan_slugs))
            .exec(db)
            .await?;

        Ok(())
    }
}
