//! Database entities

pub mod ai_agent_configuration;
pub mod ai_property_analysis;
pub mod category;
pub mod city;
pub mod city_location;
pub mod contact_message;
pub mod developer;
pub mod enquiry;
pub mod group_member;
pub mod newsletter_subscriber;
pub mod notification;
pub mod property;
pub mod property_configuration;
pub mod property_group;
pub mod property_image;
pub mod property_lead;
pub mod property_specification;
pub mod subscription_plan;
pub mod subscription_usage_log;
pub mod user;
pub mod user_subscription;

pub mod prelude {
    pub use super::ai_agent_configuration::Entity as AiAgentConfiguration;
    pub use super::ai_property_analysis::Entity as AiPropertyAnalysis;
    pub use super::category::Entity as Category;
    pub use super::city::Entity as City;
    pub use super::city_location::Entity as CityLocation;
    pub use super::contact_message::Entity as ContactMessage;
    pub use super::developer::Entity as Developer;
    pub use super::enquiry::Entity as Enquiry;
    pub use super::group_member::Entity as GroupMember;
    pub use super::newsletter_subscriber::Entity as NewsletterSubscriber;
    pub use super::notification::Entity as Notification;
    pub use super::property::Entity as Property;
    pub use super::property_configuration::Entity as PropertyConfiguration;
    pub use super::property_group::Entity as PropertyGroup;
    pub use super::property_image::Entity as PropertyImage;
    pub use super::property_lead::Entity as PropertyLead;
    pub use super::property_specification::Entity as PropertySpecification;
    pub use super::subscription_plan::Entity as SubscriptionPlan;
    pub use super::subscription_usage_log::Entity as SubscriptionUsageLog;
    pub use super::user::Entity as User;
    pub use super::user_subscription::Entity as UserSubscription;
}
