pub mod cache;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod notifications;
pub mod services;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use blunest_integrations::{IdentityProvider, LanguageModel, PaymentGateway};
use sea_orm::DatabaseConnection;

use crate::cache::TtlCache;
use crate::handlers::{
    agents, analysis, auth, dashboard, developers, enquiries, groups, health,
    notifications as notify, properties, search, subscriptions, users, webhooks,
};
use crate::middleware::RateLimiter;
use crate::models::{DashboardStats, Plan, Property};
use crate::notifications::NotificationHub;

/// How often expired rate-limit windows are purged
const RATE_LIMIT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Runtime settings handlers read
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Public site origin used in links and cookie flags
    pub site_url: String,
    /// Razorpay key id handed to the checkout widget
    pub razorpay_key_id: String,
    /// Shared secret for webhook signatures; empty disables the webhook
    pub razorpay_webhook_secret: String,
    /// Plan slug -> gateway plan id
    pub gateway_plan_ids: HashMap<String, String>,
}

/// Application state shared across handlers
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub identity: Arc<dyn IdentityProvider>,
    pub payments: Arc<dyn PaymentGateway>,
    pub llm: Arc<dyn LanguageModel>,
    pub notifications: NotificationHub,
    pub featured_cache: TtlCache<Vec<Property>>,
    pub plans_cache: TtlCache<Vec<Plan>>,
    pub dashboard_cache: TtlCache<DashboardStats>,
}

/// External services the API talks to
#[derive(Clone)]
pub struct Services {
    pub identity: Arc<dyn IdentityProvider>,
    pub payments: Arc<dyn PaymentGateway>,
    pub llm: Arc<dyn LanguageModel>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "BluNest API",
        version = "0.1.0",
        description = "REST API for the BluNest real-estate marketplace",
        contact(
            name = "BluNest Team",
            email = "team@blunest.in"
        )
    ),
    paths(
        health::health_check,
        properties::list_properties,
        properties::featured_properties,
        properties::get_property,
        properties::list_categories,
        properties::create_property,
        properties::update_property,
        properties::delete_property,
        properties::create_category,
        properties::list_specifications,
        properties::create_specification,
        properties::update_specification,
        properties::delete_specification,
        developers::list_developers,
        developers::create_developer,
        developers::update_developer,
        developers::delete_developer,
        search::list_cities,
        search::list_locations,
        search::list_configurations,
        groups::get_group,
        groups::join_group,
        groups::create_group,
        groups::update_group,
        groups::list_group_members,
        groups::add_member_from_lead,
        groups::update_member_status,
        groups::remove_member,
        enquiries::create_enquiry,
        enquiries::create_lead,
        enquiries::submit_contact,
        enquiries::subscribe_newsletter,
        enquiries::list_enquiries,
        enquiries::update_enquiry_status,
        enquiries::list_leads,
        enquiries::update_lead,
        enquiries::list_contact_messages,
        enquiries::update_contact_status,
        subscriptions::list_plans,
        subscriptions::get_subscription,
        subscriptions::create_subscription,
        webhooks::razorpay_webhook,
        analysis::analyze_property,
        analysis::chat,
        agents::list_agents,
        agents::update_agent,
        auth::sign_in,
        auth::sign_up,
        auth::sign_out,
        auth::current_user,
        auth::check_phone,
        users::list_users,
        users::create_user,
        users::update_user_role,
        notify::list_notifications,
        notify::mark_read,
        notify::mark_all_read,
        notify::notification_stream,
        notify::create_notification,
        notify::send_email,
        dashboard::dashboard_stats,
        dashboard::invalidate_dashboard,
    ),
    components(
        schemas(
            models::ErrorResponse,
            models::MessageResponse,
            models::Pagination,
            models::Property,
            models::PropertyImage,
            models::Category,
            models::PropertyDetail,
            models::FeaturedProperties,
            models::ImageInput,
            models::CreatePropertyRequest,
            models::UpdatePropertyRequest,
            models::CreateCategoryRequest,
            models::PropertySpecification,
            models::CreateSpecificationRequest,
            models::UpdateSpecificationRequest,
            models::Developer,
            models::CreateDeveloperRequest,
            models::UpdateDeveloperRequest,
            models::City,
            models::CityLocation,
            models::Configuration,
            models::PropertyGroup,
            models::GroupMember,
            models::GroupWithMembers,
            models::GroupView,
            models::JoinGroupRequest,
            models::JoinGroupResponse,
            models::CreateGroupRequest,
            models::UpdateGroupRequest,
            models::AddMemberFromLeadRequest,
            models::UpdateMemberStatusRequest,
            models::CreateEnquiryRequest,
            models::Enquiry,
            models::CreateLeadRequest,
            models::Lead,
            models::ContactRequest,
            models::ContactMessage,
            models::NewsletterRequest,
            models::NewsletterResponse,
            models::UpdateStatusRequest,
            models::UpdateLeadRequest,
            models::Plan,
            models::UserSubscription,
            models::UsageSummary,
            models::SubscriptionOverview,
            models::CreateSubscriptionRequest,
            models::CheckoutPrefill,
            models::CheckoutTheme,
            models::CheckoutOptions,
            models::CreateSubscriptionResponse,
            models::WebhookAck,
            models::AnalyzePropertyRequest,
            models::AnalysisMetadata,
            models::AnalyzePropertyResponse,
            models::ChatRole,
            models::ChatMessage,
            models::ChatRequest,
            models::ChatResponse,
            models::AgentConfig,
            models::UpdateAgentRequest,
            models::UserProfile,
            models::SignInRequest,
            models::SignUpRequest,
            models::SessionTokens,
            models::AuthResponse,
            models::CheckPhoneRequest,
            models::PhoneOwner,
            models::CheckPhoneResponse,
            models::CreateUserRequest,
            models::UpdateRoleRequest,
            models::Notification,
            models::CreateNotificationRequest,
            models::MarkAllReadResponse,
            models::EmailRequest,
            models::EmailQueued,
            models::DashboardTotals,
            models::SalesAnalytics,
            models::DashboardStats,
            models::HealthResponse,
        )
    ),
    tags(
        (name = "properties", description = "Property listings and categories"),
        (name = "directory", description = "Developers and search lookups"),
        (name = "groups", description = "Group buying"),
        (name = "enquiries", description = "Enquiries, leads, contact and newsletter"),
        (name = "subscriptions", description = "Plans, subscriptions and gateway webhooks"),
        (name = "ai", description = "AI-assisted property analysis and advisor chat"),
        (name = "auth", description = "Authentication"),
        (name = "notifications", description = "In-app notifications and email rendering"),
        (name = "admin", description = "Administration endpoints"),
        (name = "system", description = "System health and info endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Allowed CORS origins; empty allows localhost origins only
    pub cors_origins: Vec<String>,
    /// HS256 secret shared with the identity provider
    pub jwt_secret: String,
    pub site_url: String,
    pub razorpay_key_id: String,
    pub razorpay_webhook_secret: String,
    pub gateway_plan_ids: HashMap<String, String>,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            cors_origins: Vec::new(),
            jwt_secret: String::new(),
            site_url: "http://localhost:3000".to_string(),
            razorpay_key_id: String::new(),
            razorpay_webhook_secret: String::new(),
            gateway_plan_ids: HashMap::new(),
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
    enquiry_limiter: Arc<RateLimiter>,
    contact_limiter: Arc<RateLimiter>,
    newsletter_limiter: Arc<RateLimiter>,
    phone_check_limiter: Arc<RateLimiter>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, db: DatabaseConnection, services: Services) -> Self {
        let state = Arc::new(AppState {
            db,
            config: AppConfig {
                site_url: config.site_url.clone(),
                razorpay_key_id: config.razorpay_key_id.clone(),
                razorpay_webhook_secret: config.razorpay_webhook_secret.clone(),
                gateway_plan_ids: config.gateway_plan_ids.clone(),
            },
            identity: services.identity,
            payments: services.payments,
            llm: services.llm,
            notifications: NotificationHub::default(),
            featured_cache: TtlCache::new(Duration::from_secs(60)),
            plans_cache: TtlCache::new(Duration::from_secs(300)),
            dashboard_cache: TtlCache::new(Duration::from_secs(30)),
        });

        Self {
            config,
            state,
            enquiry_limiter: Arc::new(RateLimiter::per_minute("enquiries", 10)),
            contact_limiter: Arc::new(RateLimiter::per_minute("contact", 3)),
            newsletter_limiter: Arc::new(RateLimiter::per_minute("newsletter", 3)),
            phone_check_limiter: Arc::new(RateLimiter::per_minute("check-phone", 10)),
        }
    }

    /// Shared state, for callers that need the hub or database directly
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let api_doc = ApiDoc::openapi();

        let jwt_state = Arc::new(middleware::JwtState::new(self.config.jwt_secret.as_bytes()));

        // Build PUBLIC routes (no authentication required)
        let public_router = Router::new()
            .route("/api/health", get(health::health_check))
            .route("/api/properties", get(properties::list_properties))
            .route(
                "/api/properties/featured",
                get(properties::featured_properties),
            )
            .route("/api/properties/{id_or_slug}", get(properties::get_property))
            .route("/api/properties/{id_or_slug}/group", get(groups::get_group))
            .route("/api/categories", get(properties::list_categories))
            .route("/api/developers", get(developers::list_developers))
            .route("/api/search/cities", get(search::list_cities))
            .route("/api/search/locations/{city_id}", get(search::list_locations))
            .route(
                "/api/search/configurations",
                get(search::list_configurations),
            )
            .route("/api/subscriptions/plans", get(subscriptions::list_plans))
            .route("/api/auth/signin", post(auth::sign_in))
            .route("/api/auth/signup", post(auth::sign_up))
            .route(
                "/api/auth/check-phone",
                post(auth::check_phone).layer(axum_middleware::from_fn_with_state(
                    self.phone_check_limiter.clone(),
                    middleware::rate_limit,
                )),
            )
            .route("/api/webhooks/razorpay", post(webhooks::razorpay_webhook))
            .with_state(self.state.clone());

        // Anonymous submissions; the caller is attached when a token is present
        let submission_router = Router::new()
            .route(
                "/api/enquiries",
                post(enquiries::create_enquiry).layer(axum_middleware::from_fn_with_state(
                    self.enquiry_limiter.clone(),
                    middleware::rate_limit,
                )),
            )
            .route("/api/leads", post(enquiries::create_lead))
            .route(
                "/api/contact",
                post(enquiries::submit_contact).layer(axum_middleware::from_fn_with_state(
                    self.contact_limiter.clone(),
                    middleware::rate_limit,
                )),
            )
            .route(
                "/api/newsletter/subscribe",
                post(enquiries::subscribe_newsletter).layer(
                    axum_middleware::from_fn_with_state(
                        self.newsletter_limiter.clone(),
                        middleware::rate_limit,
                    ),
                ),
            )
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                jwt_state.clone(),
                middleware::optional_auth,
            ));

        // Build PROTECTED routes (require session token authentication)
        let protected_router = Router::new()
            .route("/api/auth/signout", post(auth::sign_out))
            .route("/api/auth/me", get(auth::current_user))
            .route("/api/properties/{id_or_slug}/group", post(groups::join_group))
            .route(
                "/api/subscriptions",
                get(subscriptions::get_subscription).post(subscriptions::create_subscription),
            )
            .route("/api/ai/analyze-property", post(analysis::analyze_property))
            .route("/api/ai/chat", post(analysis::chat))
            .route("/api/notifications", get(notify::list_notifications))
            .route("/api/notifications/stream", get(notify::notification_stream))
            .route("/api/notifications/read-all", post(notify::mark_all_read))
            .route("/api/notifications/{id}/read", post(notify::mark_read))
            .route("/api/notifications/email", post(notify::send_email))
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                jwt_state.clone(),
                middleware::require_auth,
            ));

        // Build ADMIN routes (session token plus admin role)
        let admin_router = Router::new()
            .route("/api/admin/dashboard", get(dashboard::dashboard_stats))
            .route(
                "/api/admin/dashboard/invalidate",
                post(dashboard::invalidate_dashboard),
            )
            .route("/api/admin/properties", post(properties::create_property))
            .route(
                "/api/admin/properties/{id}",
                put(properties::update_property).delete(properties::delete_property),
            )
            .route(
                "/api/admin/properties/{id}/specifications",
                get(properties::list_specifications).post(properties::create_specification),
            )
            .route(
                "/api/admin/properties/{id}/specifications/{spec_id}",
                put(properties::update_specification).delete(properties::delete_specification),
            )
            .route("/api/admin/categories", post(properties::create_category))
            .route("/api/admin/developers", post(developers::create_developer))
            .route(
                "/api/admin/developers/{id}",
                put(developers::update_developer).delete(developers::delete_developer),
            )
            .route("/api/admin/groups", post(groups::create_group))
            .route(
                "/api/admin/groups/add-member",
                post(groups::add_member_from_lead),
            )
            .route("/api/admin/groups/{id}", patch(groups::update_group))
            .route(
                "/api/admin/groups/{id}/members",
                get(groups::list_group_members),
            )
            .route(
                "/api/admin/group-members/{id}",
                patch(groups::update_member_status).delete(groups::remove_member),
            )
            .route("/api/admin/enquiries", get(enquiries::list_enquiries))
            .route(
                "/api/admin/enquiries/{id}",
                patch(enquiries::update_enquiry_status),
            )
            .route("/api/admin/leads", get(enquiries::list_leads))
            .route("/api/admin/leads/{id}", patch(enquiries::update_lead))
            .route(
                "/api/admin/contact-messages",
                get(enquiries::list_contact_messages),
            )
            .route(
                "/api/admin/contact-messages/{id}",
                patch(enquiries::update_contact_status),
            )
            .route(
                "/api/admin/users",
                get(users::list_users).post(users::create_user),
            )
            .route("/api/admin/users/{id}/role", patch(users::update_user_role))
            .route("/api/admin/ai-agents", get(agents::list_agents))
            .route("/api/admin/ai-agents/{slug}", put(agents::update_agent))
            .route(
                "/api/admin/notifications",
                post(notify::create_notification),
            )
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                self.state.db.clone(),
                middleware::require_admin,
            ))
            .layer(axum_middleware::from_fn_with_state(
                jwt_state,
                middleware::require_auth,
            ));

        let api_router = public_router
            .merge(submission_router)
            .merge(protected_router)
            .merge(admin_router);

        // SwaggerUi creates the /api/openapi.json route
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(api_router)
            .layer(TraceLayer::new_for_http())
            .layer(self.cors_layer())
    }

    fn cors_layer(&self) -> CorsLayer {
        // Credentialed requests need explicit origins, never `Any`
        let layer = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
            .allow_credentials(true);

        let origins: Vec<HeaderValue> = self
            .config
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();

        if origins.is_empty() {
            layer.allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str.starts_with("http://localhost:")
                    || origin_str.starts_with("http://127.0.0.1:")
            }))
        } else {
            layer.allow_origin(AllowOrigin::list(origins))
        }
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        for limiter in [
            &self.enquiry_limiter,
            &self.contact_limiter,
            &self.newsletter_limiter,
            &self.phone_check_limiter,
        ] {
            limiter.clone().spawn_sweeper(RATE_LIMIT_SWEEP_INTERVAL);
        }

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );
        info!("Swagger UI: http://{}/swagger-ui", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().unwrap();
        assert!(json.contains("/api/properties/{id_or_slug}/group"));
        assert!(json.contains("/api/webhooks/razorpay"));
        assert!(json.contains("/api/admin/properties/{id}/specifications/{spec_id}"));
        assert!(json.contains("/api/search/locations/{city_id}"));
        assert!(json.contains("/api/ai/chat"));
    }
}
