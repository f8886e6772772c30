use std::collections::BTreeMap;

use blunest_db::entities::{
    ai_agent_configuration, category, city, city_location, contact_message, developer, enquiry,
    group_member, notification, property, property_configuration, property_group,
    property_image, property_lead, property_specification, subscription_plan, user,
    user_subscription,
};
use blunest_db::entities::{
    enquiry::EnquiryStatus, group_member::MemberStatus, property::PropertyStatus,
    property_group::GroupStatus, property_lead::LeadStatus, property_lead::LeadType,
    user::UserRole, user_subscription::SubscriptionStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Default page size for list endpoints
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest page size a client may request
pub const MAX_PAGE_SIZE: u64 = 100;

/// Highest page number honoured; keeps `(page - 1) * limit` inside an SQL offset
pub const MAX_PAGE: u64 = u32::MAX as u64;

/// Success envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Error envelope
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Field validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

/// Plain acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Pagination block of list responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = total.div_ceil(limit.max(1));
        Self {
            page,
            limit,
            total,
            total_pages,
            has_more: page < total_pages,
        }
    }
}

/// Paginated list envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, pagination: Pagination) -> Self {
        Self {
            success: true,
            data,
            pagination,
        }
    }
}

/// Clamp raw `page` / `limit` query values to `(1..=MAX_PAGE, 1..=100)`
pub fn page_params(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, limit)
}

/// Accepts a JSON number or a numeric string
fn deserialize_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    match Option::<Amount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Amount::Number(n)) => Ok(Some(n)),
        Some(Amount::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Amount::Text(s)) => s
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom("investment amount must be a number")),
    }
}

// ---------------------------------------------------------------------------
// Properties and categories
// ---------------------------------------------------------------------------

/// Property listing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Property {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub location: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Asking price in INR
    pub price: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area_sqft: f64,
    pub property_type: String,
    pub featured_image: Option<String>,
    pub amenities: Vec<String>,
    #[schema(value_type = String, example = "available")]
    pub status: PropertyStatus,
    pub is_featured: bool,
    pub views: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<property::Model> for Property {
    fn from(m: property::Model) -> Self {
        let amenities = m
            .amenities
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|a| a.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: m.id,
            owner_id: m.owner_id,
            category_id: m.category_id,
            title: m.title,
            slug: m.slug,
            description: m.description,
            location: m.location,
            city: m.city,
            state: m.state,
            latitude: m.latitude,
            longitude: m.longitude,
            price: m.price,
            bedrooms: m.bedrooms,
            bathrooms: m.bathrooms,
            area_sqft: m.area_sqft,
            property_type: m.property_type,
            featured_image: m.featured_image,
            amenities,
            status: m.status,
            is_featured: m.is_featured,
            views: m.views,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PropertyImage {
    pub id: Uuid,
    pub url: String,
    pub alt_text: Option<String>,
    pub order_index: i32,
    pub is_primary: bool,
}

impl From<property_image::Model> for PropertyImage {
    fn from(m: property_image::Model) -> Self {
        Self {
            id: m.id,
            url: m.url,
            alt_text: m.alt_text,
            order_index: m.order_index,
            is_primary: m.is_primary,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl From<category::Model> for Category {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
            description: m.description,
            icon: m.icon,
        }
    }
}

/// Labelled fact about a property, grouped by `category` (e.g. "Flooring")
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PropertySpecification {
    pub id: Uuid,
    pub property_id: Uuid,
    pub category: String,
    pub label: String,
    pub value: String,
    pub display_order: i32,
}

impl From<property_specification::Model> for PropertySpecification {
    fn from(m: property_specification::Model) -> Self {
        Self {
            id: m.id,
            property_id: m.property_id,
            category: m.category,
            label: m.label,
            value: m.value,
            display_order: m.display_order,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateSpecificationRequest {
    #[validate(length(min = 1, max = 128, message = "Category is required"))]
    pub category: String,
    #[validate(length(min = 1, max = 255, message = "Label is required"))]
    pub label: String,
    #[validate(length(min = 1, message = "Value is required"))]
    pub value: String,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateSpecificationRequest {
    #[validate(length(min = 1, max = 128, message = "Category cannot be empty"))]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Label cannot be empty"))]
    pub label: Option<String>,
    #[validate(length(min = 1, message = "Value cannot be empty"))]
    pub value: Option<String>,
    pub display_order: Option<i32>,
}

/// Property with its images, specifications and category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PropertyDetail {
    pub property: Property,
    pub images: Vec<PropertyImage>,
    /// Ordered by category, then display order
    pub specifications: Vec<PropertySpecification>,
    pub category: Option<Category>,
}

/// Filters for `GET /api/properties`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyListQuery {
    pub category_id: Option<Uuid>,
    /// Substring match on location
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub bedrooms: Option<i32>,
    pub property_type: Option<String>,
    /// Defaults to `available`
    pub status: Option<PropertyStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeaturedProperties {
    pub properties: Vec<Property>,
    /// Whether the list was served from the in-process cache
    pub cached: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct ImageInput {
    #[validate(url(message = "Invalid image URL"))]
    pub url: String,
    pub alt_text: Option<String>,
}

/// Request to create a property
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreatePropertyRequest {
    #[validate(length(min = 10, message = "Title must be at least 10 characters"))]
    pub title: String,
    /// Derived from the title when omitted
    pub slug: Option<String>,
    #[validate(length(min = 50, message = "Description must be at least 50 characters"))]
    pub description: String,
    #[validate(length(min = 3, message = "Location must be at least 3 characters"))]
    pub location: String,
    pub city: Option<String>,
    pub state: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,
    #[validate(range(exclusive_min = 0.0, message = "Price must be greater than 0"))]
    pub price: f64,
    #[validate(range(min = 0, message = "Bedrooms cannot be negative"))]
    #[serde(default)]
    pub bedrooms: i32,
    #[validate(range(min = 0, message = "Bathrooms cannot be negative"))]
    #[serde(default)]
    pub bathrooms: i32,
    #[validate(range(exclusive_min = 0.0, message = "Area must be greater than 0"))]
    pub area_sqft: f64,
    #[validate(length(min = 1, message = "Property type is required"))]
    pub property_type: String,
    pub category_id: Option<Uuid>,
    #[validate(url(message = "Invalid image URL"))]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[validate(nested)]
    #[serde(default)]
    pub images: Vec<ImageInput>,
    #[schema(value_type = Option<String>, example = "available")]
    pub status: Option<PropertyStatus>,
    #[serde(default)]
    pub is_featured: bool,
}

/// Partial property update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdatePropertyRequest {
    #[validate(length(min = 10, message = "Title must be at least 10 characters"))]
    pub title: Option<String>,
    pub slug: Option<String>,
    #[validate(length(min = 50, message = "Description must be at least 50 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 3, message = "Location must be at least 3 characters"))]
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,
    #[validate(range(exclusive_min = 0.0, message = "Price must be greater than 0"))]
    pub price: Option<f64>,
    #[validate(range(min = 0, message = "Bedrooms cannot be negative"))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0, message = "Bathrooms cannot be negative"))]
    pub bathrooms: Option<i32>,
    #[validate(range(exclusive_min = 0.0, message = "Area must be greater than 0"))]
    pub area_sqft: Option<f64>,
    pub property_type: Option<String>,
    pub category_id: Option<Uuid>,
    #[validate(url(message = "Invalid image URL"))]
    pub featured_image: Option<String>,
    pub amenities: Option<Vec<String>>,
    /// Replaces every image when present
    #[validate(nested)]
    pub images: Option<Vec<ImageInput>>,
    #[schema(value_type = Option<String>)]
    pub status: Option<PropertyStatus>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

// ---------------------------------------------------------------------------
// Developers and search lookups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Developer {
    pub id: Uuid,
    pub name: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub years_of_experience: Option<i32>,
    pub total_projects: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<developer::Model> for Developer {
    fn from(m: developer::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            logo_url: m.logo_url,
            description: m.description,
            website_url: m.website_url,
            email: m.email,
            phone: m.phone,
            years_of_experience: m.years_of_experience,
            total_projects: m.total_projects,
            is_active: m.is_active,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateDeveloperRequest {
    #[validate(length(min = 2, max = 255, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(url(message = "Invalid logo URL"))]
    pub logo_url: Option<String>,
    pub description: Option<String>,
    #[validate(url(message = "Invalid website URL"))]
    pub website_url: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(range(min = 0, message = "Years of experience cannot be negative"))]
    pub years_of_experience: Option<i32>,
    #[validate(range(min = 0, message = "Total projects cannot be negative"))]
    pub total_projects: Option<i32>,
}

/// Partial developer update; `is_active: true` restores a deleted entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateDeveloperRequest {
    #[validate(length(min = 2, max = 255, message = "Name must be at least 2 characters"))]
    pub name: Option<String>,
    #[validate(url(message = "Invalid logo URL"))]
    pub logo_url: Option<String>,
    pub description: Option<String>,
    #[validate(url(message = "Invalid website URL"))]
    pub website_url: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(range(min = 0, message = "Years of experience cannot be negative"))]
    pub years_of_experience: Option<i32>,
    #[validate(range(min = 0, message = "Total projects cannot be negative"))]
    pub total_projects: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct City {
    pub id: Uuid,
    pub name: String,
    pub state: String,
}

impl From<city::Model> for City {
    fn from(m: city::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            state: m.state,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CityLocation {
    pub id: Uuid,
    pub city_id: Uuid,
    pub name: String,
}

impl From<city_location::Model> for CityLocation {
    fn from(m: city_location::Model) -> Self {
        Self {
            id: m.id,
            city_id: m.city_id,
            name: m.name,
        }
    }
}

/// Unit configuration such as "2 BHK"
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Configuration {
    pub id: Uuid,
    pub name: String,
}

impl From<property_configuration::Model> for Configuration {
    fn from(m: property_configuration::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
        }
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PropertyGroup {
    pub id: Uuid,
    pub property_id: Uuid,
    pub total_slots: i32,
    pub filled_slots: i32,
    pub available_slots: i32,
    pub is_locked: bool,
    #[schema(value_type = String, example = "open")]
    pub status: GroupStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<property_group::Model> for PropertyGroup {
    fn from(m: property_group::Model) -> Self {
        Self {
            id: m.id,
            property_id: m.property_id,
            total_slots: m.total_slots,
            filled_slots: m.filled_slots,
            available_slots: (m.total_slots - m.filled_slots).max(0),
            is_locked: m.is_locked,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupMember {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub investment_amount: Option<f64>,
    #[schema(value_type = String, example = "pending")]
    pub status: MemberStatus,
    pub joined_at: DateTime<Utc>,
}

impl From<group_member::Model> for GroupMember {
    fn from(m: group_member::Model) -> Self {
        Self {
            id: m.id,
            group_id: m.group_id,
            user_id: m.user_id,
            full_name: m.full_name,
            email: m.email,
            phone: m.phone,
            investment_amount: m.investment_amount,
            status: m.status,
            joined_at: m.joined_at,
        }
    }
}

/// Group with its members
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupWithMembers {
    pub group: PropertyGroup,
    pub members: Vec<GroupMember>,
}

/// `group` is null when the property has no group yet
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupView {
    pub group: Option<GroupWithMembers>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct JoinGroupRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub phone: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "Investment amount must be positive"))]
    #[serde(default, deserialize_with = "deserialize_amount")]
    #[schema(value_type = Option<f64>)]
    pub investment_amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JoinGroupResponse {
    pub member: GroupMember,
    pub group: PropertyGroup,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateGroupRequest {
    /// Property id or slug
    pub property_id: String,
    /// Defaults to 5
    #[validate(range(min = 1, max = 1000, message = "Total slots must be between 1 and 1000"))]
    pub total_slots: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateGroupRequest {
    #[validate(range(min = 1, max = 1000, message = "Total slots must be between 1 and 1000"))]
    pub total_slots: Option<i32>,
    pub is_locked: Option<bool>,
    /// `closed` closes the group; `open` or `full` reopens it
    #[schema(value_type = Option<String>)]
    pub status: Option<GroupStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddMemberFromLeadRequest {
    pub lead_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateMemberStatusRequest {
    #[schema(value_type = String, example = "approved")]
    pub status: MemberStatus,
}

// ---------------------------------------------------------------------------
// Enquiries, leads, contact, newsletter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateEnquiryRequest {
    /// Property id or slug
    #[validate(length(min = 1, message = "Property is required"))]
    pub property_id: String,
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 10, message = "Phone number must be at least 10 digits"))]
    pub phone: String,
    pub message: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "Investment amount must be positive"))]
    #[serde(default, deserialize_with = "deserialize_amount")]
    #[schema(value_type = Option<f64>)]
    pub investment_amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Enquiry {
    pub id: Uuid,
    pub property_id: Uuid,
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub message: Option<String>,
    pub investment_amount: Option<f64>,
    #[schema(value_type = String, example = "new")]
    pub status: EnquiryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<enquiry::Model> for Enquiry {
    fn from(m: enquiry::Model) -> Self {
        Self {
            id: m.id,
            property_id: m.property_id,
            user_id: m.user_id,
            full_name: m.full_name,
            email: m.email,
            phone: m.phone,
            message: m.message,
            investment_amount: m.investment_amount,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateLeadRequest {
    pub property_id: Option<Uuid>,
    #[schema(value_type = String, example = "site_visit")]
    pub lead_type: LeadType,
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Lead {
    pub id: Uuid,
    pub property_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    #[schema(value_type = String)]
    pub lead_type: LeadType,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    #[schema(value_type = String)]
    pub status: LeadStatus,
    pub notes: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<property_lead::Model> for Lead {
    fn from(m: property_lead::Model) -> Self {
        Self {
            id: m.id,
            property_id: m.property_id,
            user_id: m.user_id,
            lead_type: m.lead_type,
            full_name: m.full_name,
            email: m.email,
            phone: m.phone,
            message: m.message,
            status: m.status,
            notes: m.notes,
            assigned_to: m.assigned_to,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 5, message = "Subject must be at least 5 characters"))]
    pub subject: String,
    #[validate(length(min = 20, message = "Message must be at least 20 characters"))]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    #[schema(value_type = String)]
    pub status: EnquiryStatus,
    pub created_at: DateTime<Utc>,
}

impl From<contact_message::Model> for ContactMessage {
    fn from(m: contact_message::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            phone: m.phone,
            subject: m.subject,
            message: m.message,
            status: m.status,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct NewsletterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewsletterResponse {
    pub email: String,
    /// `subscribed` or `resubscribed`
    pub status: String,
    pub message: String,
}

/// Admin list filters shared by enquiries and contact messages
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusListQuery {
    pub status: Option<EnquiryStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadListQuery {
    pub property_id: Option<Uuid>,
    pub lead_type: Option<LeadType>,
    pub status: Option<LeadStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    #[schema(value_type = String, example = "in_progress")]
    pub status: EnquiryStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateLeadRequest {
    #[schema(value_type = Option<String>)]
    pub status: Option<LeadStatus>,
    pub notes: Option<String>,
    pub assigned_to: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price_monthly: f64,
    pub price_yearly: Option<f64>,
    /// 0 means unlimited
    pub analyses_per_month: i32,
    /// 0 means unlimited
    pub max_properties_comparison: i32,
    pub agents_access: Vec<String>,
    pub features: Vec<String>,
    pub display_order: i32,
}

fn string_array(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

impl From<subscription_plan::Model> for Plan {
    fn from(m: subscription_plan::Model) -> Self {
        Self {
            agents_access: string_array(&m.agents_access),
            features: string_array(&m.features),
            id: m.id,
            name: m.name,
            slug: m.slug,
            description: m.description,
            price_monthly: m.price_monthly,
            price_yearly: m.price_yearly,
            analyses_per_month: m.analyses_per_month,
            max_properties_comparison: m.max_properties_comparison,
            display_order: m.display_order,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    #[schema(value_type = String, example = "active")]
    pub status: SubscriptionStatus,
    pub gateway_subscription_id: Option<String>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<user_subscription::Model> for UserSubscription {
    fn from(m: user_subscription::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            plan_id: m.plan_id,
            status: m.status,
            gateway_subscription_id: m.gateway_subscription_id,
            current_period_start: m.current_period_start,
            current_period_end: m.current_period_end,
            cancel_at_period_end: m.cancel_at_period_end,
            cancelled_at: m.cancelled_at,
            created_at: m.created_at,
        }
    }
}

/// Usage of the current calendar month
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsageSummary {
    pub analyses_used: u64,
    /// 0 means unlimited
    pub analyses_limit: i32,
    pub properties_in_comparison: u64,
    pub properties_limit: i32,
    pub can_analyze: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionOverview {
    /// Null when the user is on the free plan
    pub subscription: Option<UserSubscription>,
    pub plan: Plan,
    pub usage: UsageSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateSubscriptionRequest {
    pub plan_slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutPrefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutTheme {
    pub color: String,
}

/// Parameters for the gateway's browser checkout widget
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOptions {
    /// Public key id
    pub key: String,
    pub subscription_id: String,
    pub name: String,
    pub description: String,
    pub prefill: CheckoutPrefill,
    pub theme: CheckoutTheme,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateSubscriptionResponse {
    pub subscription: UserSubscription,
    pub razorpay: CheckoutOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AnalyzePropertyRequest {
    pub property_id: Option<Uuid>,
    #[serde(default)]
    pub agent_slugs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalysisMetadata {
    /// Wall-clock seconds for the whole fan-out
    pub execution_time: f64,
    pub tokens_used: i64,
    pub agents_used: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalyzePropertyResponse {
    /// Per-agent results keyed by agent slug plus `overall_score`,
    /// `recommendation` and `confidence_level`
    #[schema(value_type = Object)]
    pub analysis: crate::services::analysis::AnalysisReport,
    pub metadata: AnalysisMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct ChatMessage {
    pub role: ChatRole,
    #[validate(length(min = 1, max = 4000, message = "Message must be between 1 and 4000 characters"))]
    pub content: String,
}

/// Conversation with the master advisor; the last message is the question
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct ChatRequest {
    #[validate(
        length(min = 1, max = 50, message = "Between 1 and 50 messages are required"),
        nested
    )]
    pub messages: Vec<ChatMessage>,
    /// Property id or slug the conversation is about
    pub property: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub message: ChatMessage,
    pub tokens_used: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgentConfig {
    pub id: Uuid,
    pub agent_slug: String,
    pub display_name: String,
    pub description: Option<String>,
    pub system_prompt: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: i32,
    pub required_tier: String,
    pub display_order: i32,
    pub is_enabled: bool,
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<ai_agent_configuration::Model> for AgentConfig {
    fn from(m: ai_agent_configuration::Model) -> Self {
        Self {
            id: m.id,
            agent_slug: m.agent_slug,
            display_name: m.display_name,
            description: m.description,
            system_prompt: m.system_prompt,
            model: m.model,
            temperature: m.temperature,
            max_tokens: m.max_tokens,
            required_tier: m.required_tier,
            display_order: m.display_order,
            is_enabled: m.is_enabled,
            version: m.version,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateAgentRequest {
    #[validate(length(min = 1, message = "Display name cannot be empty"))]
    pub display_name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 10, message = "System prompt must be at least 10 characters"))]
    pub system_prompt: Option<String>,
    pub model: Option<String>,
    #[validate(range(min = 0.0, max = 2.0, message = "Temperature must be between 0 and 2"))]
    pub temperature: Option<f64>,
    #[validate(range(min = 1, max = 32768, message = "Max tokens must be between 1 and 32768"))]
    pub max_tokens: Option<i32>,
    pub is_enabled: Option<bool>,
}

// ---------------------------------------------------------------------------
// Users and authentication
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    #[schema(value_type = String, example = "user")]
    pub role: UserRole,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserProfile {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            full_name: m.full_name,
            phone: m.phone,
            role: m.role,
            avatar_url: m.avatar_url,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub full_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CheckPhoneRequest {
    #[validate(length(min = 6, max = 32, message = "Phone number is required"))]
    pub phone: String,
}

/// Minimal identity of the account owning a phone number
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PhoneOwner {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckPhoneResponse {
    pub exists: bool,
    pub user: Option<PhoneOwner>,
}

/// Session issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserProfile,
    /// Null while email confirmation is pending
    pub session: Option<SessionTokens>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub full_name: String,
    #[serde(default = "default_role")]
    #[schema(value_type = String, example = "admin")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::User
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    #[schema(value_type = String, example = "admin")]
    pub role: UserRole,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<notification::Model> for Notification {
    fn from(m: notification::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            title: m.title,
            message: m.message,
            kind: m.kind,
            link: m.link,
            is_read: m.is_read,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationListQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateNotificationRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
    /// Defaults to `system`
    pub kind: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct EmailRequest {
    /// Template name, e.g. `new_enquiry`
    #[serde(rename = "type")]
    pub template: String,
    #[validate(email(message = "Invalid recipient email"))]
    pub to: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmailQueued {
    pub to: String,
    pub subject: String,
    pub status: String,
}

// ---------------------------------------------------------------------------
// Dashboard and health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DashboardTotals {
    pub total_properties: u64,
    /// Enquiries received in the last 30 days
    pub new_enquiries: u64,
    pub total_users: u64,
    /// Sum of sold property prices
    pub total_revenue: f64,
    pub on_sale: u64,
    pub sold: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SalesAnalytics {
    pub sold_percentage: f64,
    pub available_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub totals: DashboardTotals,
    pub sales: SalesAnalytics,
    pub featured_properties: Vec<Property>,
    pub recent_users: Vec<UserProfile>,
    pub cached: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database reachability
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pagination_math() {
        let p = Pagination::new(1, 10, 25);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_more);

        let last = Pagination::new(3, 10, 25);
        assert!(!last.has_more);

        let empty = Pagination::new(1, 10, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_more);
    }

    #[test]
    fn test_page_params_clamped() {
        assert_eq!(page_params(None, None), (1, 10));
        assert_eq!(page_params(Some(0), Some(0)), (1, 1));
        assert_eq!(page_params(Some(4), Some(500)), (4, 100));
        assert_eq!(page_params(Some(u64::MAX), Some(100)), (MAX_PAGE, 100));

        let (page, limit) = page_params(Some(u64::MAX), Some(u64::MAX));
        assert!((page - 1).checked_mul(limit).is_some_and(|offset| offset <= i64::MAX as u64));
    }

    #[test]
    fn test_investment_amount_number_or_string() {
        let base = json!({
            "property_id": "sea-view-villa",
            "full_name": "Asha Rao",
            "email": "asha@example.com",
            "phone": "9876543210"
        });

        let mut numeric = base.clone();
        numeric["investment_amount"] = json!(250000);
        let req: CreateEnquiryRequest = serde_json::from_value(numeric).unwrap();
        assert_eq!(req.investment_amount, Some(250000.0));

        let mut text = base.clone();
        text["investment_amount"] = json!("1,50,000");
        let req: CreateEnquiryRequest = serde_json::from_value(text).unwrap();
        assert_eq!(req.investment_amount, Some(150000.0));

        let req: CreateEnquiryRequest = serde_json::from_value(base.clone()).unwrap();
        assert_eq!(req.investment_amount, None);

        let mut bad = base;
        bad["investment_amount"] = json!("lots");
        assert!(serde_json::from_value::<CreateEnquiryRequest>(bad).is_err());
    }

    #[test]
    fn test_create_property_validation() {
        let req = CreatePropertyRequest {
            title: "Short".to_string(),
            slug: None,
            description: "Too short".to_string(),
            location: "Pu".to_string(),
            city: None,
            state: None,
            latitude: Some(120.0),
            longitude: Some(73.8),
            price: 0.0,
            bedrooms: 2,
            bathrooms: 2,
            area_sqft: 1200.0,
            property_type: "apartment".to_string(),
            category_id: None,
            featured_image: Some("not a url".to_string()),
            amenities: vec![],
            images: vec![],
            status: None,
            is_featured: false,
        };

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        for field in [
            "title",
            "description",
            "location",
            "latitude",
            "price",
            "featured_image",
        ] {
            assert!(fields.contains_key(field), "missing error for {field}");
        }
        assert!(!fields.contains_key("longitude"));
    }
}
