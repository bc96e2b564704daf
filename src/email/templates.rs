// ABOUTME: Transactional email templates rendered to subject, plain text and escaped HTML
// ABOUTME: Covers welcome, email verification, password reset and achievement unlocked messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use crate::utils::html::{escape_attribute, escape_text};

/// Template identifiers used in logs
pub mod names {
    /// Sent once a user first signs in
    pub const WELCOME: &str = "welcome";
    /// Email ownership check
    pub const VERIFY_EMAIL: &str = "verify_email";
    /// Password reset link
    pub const PASSWORD_RESET: &str = "password_reset";
    /// New achievement
    pub const ACHIEVEMENT_UNLOCKED: &str = "achievement_unlocked";
}

/// A rendered email body pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    /// Template identifier
    pub template: &'static str,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub text: String,
    /// HTML body
    pub html: String,
}

fn greeting(name: Option<&str>) -> String {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map_or_else(|| "Hi there".to_owned(), |n| format!("Hi {n}"))
}

fn layout(heading: &str, paragraphs: &[String], action: Option<(&str, &str)>) -> String {
    let mut body = format!("<h1>{}</h1>", escape_text(heading));
    for paragraph in paragraphs {
        body.push_str(&format!("<p>{}</p>", escape_text(paragraph)));
    }
    if let Some((label, href)) = action {
        body.push_str(&format!(
            r#"<p><a href="{}" style="background:#16a34a;color:#fff;padding:10px 18px;border-radius:6px;text-decoration:none">{}</a></p>"#,
            escape_attribute(href),
            escape_text(label)
        ));
    }
    format!(
        r#"<!doctype html><html><body style="font-family:sans-serif;color:#111">{body}<p style="color:#666;font-size:12px">FitHub</p></body></html>"#
    )
}

/// Welcome message with a link to the dashboard
#[must_use]
pub fn welcome(name: Option<&str>, app_base_url: &str) -> RenderedEmail {
    let hello = greeting(name);
    let intro = "Your FitHub account is ready. Pick a training program, set your calorie target and start tracking progress.".to_owned();
    RenderedEmail {
        template: names::WELCOME,
        subject: "Welcome to FitHub".to_owned(),
        text: format!("{hello},\n\n{intro}\n\n{app_base_url}\n"),
        html: layout(
            "Welcome to FitHub",
            &[format!("{hello},"), intro],
            Some(("Open your dashboard", app_base_url)),
        ),
    }
}

/// Email verification link
#[must_use]
pub fn verify_email(name: Option<&str>, link: &str, ttl_minutes: i64) -> RenderedEmail {
    let hello = greeting(name);
    let intro = format!("Confirm your email address. The link expires in {ttl_minutes} minutes.");
    RenderedEmail {
        template: names::VERIFY_EMAIL,
        subject: "Confirm your email address".to_owned(),
        text: format!("{hello},\n\n{intro}\n\n{link}\n"),
        html: layout(
            "Confirm your email",
            &[format!("{hello},"), intro],
            Some(("Confirm email", link)),
        ),
    }
}

/// Password reset link
#[must_use]
pub fn password_reset(name: Option<&str>, link: &str, ttl_minutes: i64) -> RenderedEmail {
    let hello = greeting(name);
    let intro = format!(
        "We received a request to reset your password. The link expires in {ttl_minutes} minutes. If you did not ask for this, ignore this email."
    );
    RenderedEmail {
        template: names::PASSWORD_RESET,
        subject: "Reset your FitHub password".to_owned(),
        text: format!("{hello},\n\n{intro}\n\n{link}\n"),
        html: layout(
            "Reset your password",
            &[format!("{hello},"), intro],
            Some(("Reset password", link)),
        ),
    }
}

/// Achievement unlocked notice
#[must_use]
pub fn achievement_unlocked(
    name: Option<&str>,
    achievement: &str,
    description: &str,
    points: u32,
    app_base_url: &str,
) -> RenderedEmail {
    let hello = greeting(name);
    let headline = format!("You unlocked \"{achievement}\" (+{points} points).");
    let mut paragraphs = vec![format!("{hello},"), headline.clone()];
    if !description.trim().is_empty() {
        paragraphs.push(description.trim().to_owned());
    }
    let link = format!("{}/achievements", app_base_url.trim_end_matches('/'));
    RenderedEmail {
        template: names::ACHIEVEMENT_UNLOCKED,
        subject: format!("Achievement unlocked: {achievement}"),
        text: format!("{}\n\n{link}\n", paragraphs.join("\n\n")),
        html: layout("Achievement unlocked", &paragraphs, Some(("See your achievements", &link))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escapes_user_content() {
        let email = achievement_unlocked(
            Some("<script>alert(1)</script>"),
            "Iron & Will",
            "Ten workouts",
            50,
            "https://app.fithub.test/",
        );
        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("Iron &amp; Will"));
        assert!(email.text.contains("Iron & Will"));
        assert!(email.text.contains("https://app.fithub.test/achievements"));
        assert_eq!(email.subject, "Achievement unlocked: Iron & Will");
    }

    #[test]
    fn test_links_and_greeting() {
        let email = password_reset(None, "https://app.test/reset?token=a&b", 30);
        assert!(email.text.starts_with("Hi there,"));
        assert!(email.html.contains("token=a&amp;b"));
        assert!(email.text.contains("30 minutes"));

        let verify = verify_email(Some("Ana"), "https://app.test/verify?token=x", 60);
        assert!(verify.text.starts_with("Hi Ana,"));
        assert_eq!(verify.template, names::VERIFY_EMAIL);
    }
}
