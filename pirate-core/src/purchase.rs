//! E-cookbook purchase confirmation.
//!
//! There is no payment integration: a purchase is a list of books and an
//! address to mail their download links to.

use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::mail::{Email, MailError, Mailer};

/// Length of the random token appended to each download link.
pub const TOKEN_LEN: usize = 9;

const TOKEN_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PurchasedBook {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadLink {
    pub title: String,
    pub link: String,
}

/// Sender and link settings for purchase emails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseConfig {
    pub from: String,
    pub download_base_url: String,
}

impl Default for PurchaseConfig {
    fn default() -> Self {
        Self {
            from: "captain@proteinpirate.com".to_string(),
            download_base_url: "https://proteinpirate.com".to_string(),
        }
    }
}

impl PurchaseConfig {
    /// Load from `PIRATE_MAIL_FROM` and `PIRATE_DOWNLOAD_BASE_URL`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            from: std::env::var("PIRATE_MAIL_FROM").unwrap_or(defaults.from),
            download_base_url: std::env::var("PIRATE_DOWNLOAD_BASE_URL")
                .unwrap_or(defaults.download_base_url),
        }
    }
}

/// Random lowercase alphanumeric token.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_CHARSET[rng.random_range(0..TOKEN_CHARSET.len())] as char)
        .collect()
}

/// One tokenised download link per book, in purchase order.
///
/// The book id is percent-encoded as a single path segment.
pub fn build_download_links(base_url: &str, books: &[PurchasedBook]) -> Vec<DownloadLink> {
    let base_url = base_url.trim_end_matches('/');
    books
        .iter()
        .map(|book| DownloadLink {
            title: book.title.clone(),
            link: format!(
                "{}/download/{}?token={}",
                base_url,
                urlencoding::encode(&book.id),
                generate_token()
            ),
        })
        .collect()
}

pub fn render_purchase_email(to: &str, from: &str, links: &[DownloadLink]) -> Email {
    let text_links = links
        .iter()
        .map(|l| format!("{}: {}", l.title, l.link))
        .collect::<Vec<_>>()
        .join("\n");

    let html_links: String = links
        .iter()
        .map(|l| {
            format!(
                r#"<li><a href="{}">{}</a></li>"#,
                escape_html(&l.link),
                escape_html(&l.title)
            )
        })
        .collect();

    Email {
        to: to.to_string(),
        from: from.to_string(),
        subject: "Your ProteinPirate E-Cookbook Purchase".to_string(),
        text: format!(
            "Thank ye for yer purchase! Here be yer download links:\n\n{}",
            text_links
        ),
        html: format!(
            "<h1>Thank ye for yer purchase!</h1><p>Here be yer download links:</p><ul>{}</ul>",
            html_links
        ),
    }
}

/// Build download links for `books` and mail them to `to`.
pub async fn send_purchase_email(
    mailer: &dyn Mailer,
    config: &PurchaseConfig,
    to: &str,
    books: &[PurchasedBook],
) -> Result<Vec<DownloadLink>, MailError> {
    let links = build_download_links(&config.download_base_url, books);
    let email = render_purchase_email(to, &config.from, &links);

    mailer.send(&email).await?;
    tracing::info!(books = books.len(), "Purchase email sent");

    Ok(links)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::RecordingMailer;

    fn books() -> Vec<PurchasedBook> {
        vec![
            PurchasedBook {
                id: "grog-free".to_string(),
                title: "Grog-Free Galley".to_string(),
            },
            PurchasedBook {
                id: "booty".to_string(),
                title: "Bulk & Booty".to_string(),
            },
        ]
    }

    #[test]
    fn test_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_links_per_book() {
        let links = build_download_links("https://example.com/", &books());

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].title, "Grog-Free Galley");
        assert!(links[0]
            .link
            .starts_with("https://example.com/download/grog-free?token="));
        let token = links[1].link.rsplit("token=").next().unwrap();
        assert_eq!(token.len(), TOKEN_LEN);
    }

    #[test]
    fn test_book_id_is_one_path_segment() {
        let books = vec![PurchasedBook {
            id: "vol/2?free=1#top".to_string(),
            title: "Sequel".to_string(),
        }];
        let links = build_download_links("https://example.com", &books);

        assert!(links[0]
            .link
            .starts_with("https://example.com/download/vol%2F2%3Ffree%3D1%23top?token="));
        assert_eq!(links[0].link.matches('?').count(), 1);
    }

    #[test]
    fn test_email_bodies() {
        let links = build_download_links("https://example.com", &books());
        let email = render_purchase_email("matey@example.com", "captain@example.com", &links);

        assert_eq!(email.subject, "Your ProteinPirate E-Cookbook Purchase");
        assert!(email.text.starts_with("Thank ye for yer purchase!"));
        assert!(email.text.contains(&format!("Grog-Free Galley: {}", links[0].link)));
        assert!(email.html.contains("<li><a href=\"https://example.com/download/booty?token="));
        assert!(email.html.contains(">Bulk &amp; Booty</a>"));
    }

    #[tokio::test]
    async fn test_send_purchase_email() {
        let mailer = RecordingMailer::new();
        let links = send_purchase_email(
            &mailer,
            &PurchaseConfig::default(),
            "matey@example.com",
            &books(),
        )
        .await
        .unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "matey@example.com");
        assert_eq!(sent[0].from, "captain@proteinpirate.com");
        assert!(sent[0].text.contains(&links[1].link));
    }
}
