//! Transactional email templates
//!
//! Rendering only; delivery belongs to an external mail service.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    NewEnquiry,
    EnquiryStatus,
    NewProperty,
    PropertyUpdate,
    SubscriptionReminder,
}

impl FromStr for EmailTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_enquiry" => Ok(Self::NewEnquiry),
            "enquiry_status" => Ok(Self::EnquiryStatus),
            "new_property" => Ok(Self::NewProperty),
            "property_update" => Ok(Self::PropertyUpdate),
            "subscription_reminder" => Ok(Self::SubscriptionReminder),
            other => Err(format!("Unknown email type: {}", other)),
        }
    }
}

impl fmt::Display for EmailTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NewEnquiry => "new_enquiry",
            Self::EnquiryStatus => "enquiry_status",
            Self::NewProperty => "new_property",
            Self::PropertyUpdate => "property_update",
            Self::SubscriptionReminder => "subscription_reminder",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
}

fn field<'a>(data: &'a Value, key: &str, fallback: &'a str) -> &'a str {
    data.get(key).and_then(|v| v.as_str()).unwrap_or(fallback)
}

/// Render `template` with values from `data`; missing values get neutral fallbacks
pub fn render(template: EmailTemplate, data: &Value, site_url: &str) -> RenderedEmail {
    let site_url = site_url.trim_end_matches('/');
    let name = field(data, "name", "there");
    let title = field(data, "property_title", "the property");

    match template {
        EmailTemplate::NewEnquiry => RenderedEmail {
            subject: format!("New enquiry for {}", title),
            text: format!(
                "A new enquiry was submitted for {}.\n\nFrom: {} <{}>\nPhone: {}\n\n{}\n\nReview it at {}/admin/enquiries",
                title,
                field(data, "name", "Unknown"),
                field(data, "email", "-"),
                field(data, "phone", "-"),
                field(data, "message", ""),
                site_url,
            ),
        },
        EmailTemplate::EnquiryStatus => RenderedEmail {
            subject: format!("Update on your enquiry for {}", title),
            text: format!(
                "Hi {},\n\nYour enquiry for {} is now '{}'.\n\nThe BluNest team",
                name,
                title,
                field(data, "status", "updated"),
            ),
        },
        EmailTemplate::NewProperty => RenderedEmail {
            subject: format!("New listing: {}", title),
            text: format!(
                "Hi {},\n\n{} in {} has just been listed.\n\nView it at {}/properties/{}",
                name,
                title,
                field(data, "location", "your area"),
                site_url,
                field(data, "property_slug", ""),
            ),
        },
        EmailTemplate::PropertyUpdate => RenderedEmail {
            subject: format!("{} has been updated", title),
            text: format!(
                "Hi {},\n\nThere is news about {}: {}\n\nView it at {}/properties/{}",
                name,
                title,
                field(data, "update", "details have changed"),
                site_url,
                field(data, "property_slug", ""),
            ),
        },
        EmailTemplate::SubscriptionReminder => RenderedEmail {
            subject: format!(
                "Your {} subscription renews soon",
                field(data, "plan_name", "BluNest")
            ),
            text: format!(
                "Hi {},\n\nYour {} plan renews on {}.\n\nManage your subscription at {}/dashboard/subscription",
                name,
                field(data, "plan_name", "BluNest"),
                field(data, "renewal_date", "the next billing date"),
                site_url,
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_names_round_trip() {
        for name in [
            "new_enquiry",
            "enquiry_status",
            "new_property",
            "property_update",
            "subscription_reminder",
        ] {
            let template: EmailTemplate = name.parse().unwrap();
            assert_eq!(template.to_string(), name);
        }
        assert!("welcome".parse::<EmailTemplate>().is_err());
    }

    #[test]
    fn test_render_enquiry_status() {
        let email = render(
            EmailTemplate::EnquiryStatus,
            &json!({ "name": "Asha", "property_title": "Sea View Villa", "status": "in_progress" }),
            "https://blunest.in/",
        );
        assert_eq!(email.subject, "Update on your enquiry for Sea View Villa");
        assert!(email.text.starts_with("Hi Asha,"));
        assert!(email.text.contains("'in_progress'"));
    }

    #[test]
    fn test_render_with_missing_data() {
        let email = render(EmailTemplate::NewProperty, &json!({}), "https://blunest.in");
        assert_eq!(email.subject, "New listing: the property");
        assert!(email.text.contains("https://blunest.in/properties/"));
    }
}
