//! Site-wide application state.
//!
//! `SiteState` holds the content that the agency site shares across pages:
//! the logo, social links and the portfolio. Updates never mutate in place;
//! each one returns a new snapshot.

use serde::{Deserialize, Serialize};

/// WhatsApp number used for chat (digits only, with country code).
pub const WHATSAPP_NUMBER: &str = "919033281960";
/// Phone number used for calls.
pub const PHONE_NUMBER: &str = "+91 8690787870";
/// Public contact address.
pub const CONTACT_EMAIL: &str = "nova.officialm63@gmail.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub github: String,
    pub twitter: String,
    pub linkedin: String,
    pub email: String,
}

impl Default for SocialLinks {
    fn default() -> Self {
        Self {
            github: "#".to_string(),
            twitter: "#".to_string(),
            linkedin: "#".to_string(),
            email: CONTACT_EMAIL.to_string(),
        }
    }
}

/// A portfolio entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u32,
    pub title: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub tech: Vec<String>,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

impl Project {
    fn seed(
        id: u32,
        title: &str,
        category: &str,
        description: &str,
        image: &str,
        tech: &[&str],
        link: &str,
    ) -> Self {
        Self {
            id,
            title: title.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            images: vec![image.to_string()],
            videos: Vec::new(),
            tech: tech.iter().map(|t| t.to_string()).collect(),
            link: link.to_string(),
            github: None,
        }
    }
}

/// Direct contact channels advertised by the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactChannels {
    /// WhatsApp number, digits only.
    pub whatsapp: String,
    pub phone: String,
    pub email: String,
}

impl Default for ContactChannels {
    fn default() -> Self {
        Self {
            whatsapp: WHATSAPP_NUMBER.to_string(),
            phone: PHONE_NUMBER.to_string(),
            email: CONTACT_EMAIL.to_string(),
        }
    }
}

impl ContactChannels {
    /// Builds a `wa.me` link that opens a chat pre-filled with `message`.
    pub fn whatsapp_link(&self, message: &str) -> String {
        let digits: String = self.whatsapp.chars().filter(char::is_ascii_digit).collect();
        format!(
            "https://wa.me/{digits}?text={}",
            urlencoding::encode(message)
        )
    }
}

/// Immutable snapshot of the site's shared content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteState {
    pub logo_url: Option<String>,
    pub social_links: SocialLinks,
    pub contact: ContactChannels,
    pub projects: Vec<Project>,
}

impl Default for SiteState {
    fn default() -> Self {
        Self {
            logo_url: None,
            social_links: SocialLinks::default(),
            contact: ContactChannels::default(),
            projects: vec![
                Project::seed(
                    1,
                    "FitZone Gym",
                    "Fitness / Web",
                    "A dynamic gym management website featuring membership portals, class scheduling, and trainer profiles. Helped increase local membership signups by 40%.",
                    "https://images.unsplash.com/photo-1534438327276-14e5300c3a48?auto=format&fit=crop&w=1200&q=80",
                    &["React", "Tailwind", "Booking System"],
                    "#",
                ),
                Project::seed(
                    2,
                    "Elegance Salon",
                    "Beauty / Booking",
                    "Premium salon website with an integrated appointment booking system, service gallery, and customer review integration.",
                    "https://images.unsplash.com/photo-1560066984-138dadb4c035?auto=format&fit=crop&w=1200&q=80",
                    &["Next.js", "Calendly API"],
                    "#",
                ),
                Project::seed(
                    3,
                    "SugarSketch",
                    "Inventory / E-Commerce",
                    "A specialized stationery management system featuring real-time stock tracking, automated sales reporting, and a modern customer ordering interface.",
                    "https://images.unsplash.com/photo-1456735190827-d1262f71b8a3?auto=format&fit=crop&w=1200&q=80",
                    &["Python", "React", "FastAPI"],
                    "https://bookish-63.base44.app/",
                ),
                Project::seed(
                    4,
                    "Novastay",
                    "Hospitality / Management",
                    "Full-scale Hotel Management System including room availability tracking, automated guest billing, and staff scheduling modules.",
                    "https://images.unsplash.com/photo-1566073771259-6a8506099945?auto=format&fit=crop&w=1200&q=80",
                    &["Django", "PostgreSQL", "React"],
                    "https://novastay-63.base44.app/",
                ),
            ],
        }
    }
}

impl SiteState {
    pub fn with_logo_url(&self, url: impl Into<String>) -> Self {
        Self {
            logo_url: Some(url.into()),
            ..self.clone()
        }
    }

    pub fn without_logo(&self) -> Self {
        Self {
            logo_url: None,
            ..self.clone()
        }
    }

    pub fn with_social_links(&self, social_links: SocialLinks) -> Self {
        Self {
            social_links,
            ..self.clone()
        }
    }

    /// Returns a snapshot with `project` first in the portfolio.
    ///
    /// An existing project with the same ID is replaced.
    pub fn with_project(&self, project: Project) -> Self {
        let mut projects = Vec::with_capacity(self.projects.len() + 1);
        let id = project.id;
        projects.push(project);
        projects.extend(self.projects.iter().filter(|p| p.id != id).cloned());
        Self {
            projects,
            ..self.clone()
        }
    }

    pub fn without_project(&self, id: u32) -> Self {
        Self {
            projects: self.projects.iter().filter(|p| p.id != id).cloned().collect(),
            ..self.clone()
        }
    }

    pub fn project(&self, id: u32) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Next free project ID.
    pub fn next_project_id(&self) -> u32 {
        self.projects.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }
}
