//! Breadcrumb trails for account pages.
//!
//! The trail is a pure function of the request path: each path prefix gets a
//! label from a static table, order detail pages get "Order #<number>", and
//! anything else falls back to a label derived from its slug.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Labels for known account paths.
const LABELS: &[(&str, &str)] = &[
    ("/account", "My Account"),
    ("/account/orders", "My Orders"),
    ("/account/profile", "Profile"),
    ("/account/addresses", "Addresses"),
    ("/account/invoices", "Invoices"),
    ("/account/support", "Support"),
    ("/account/login", "Sign In"),
    ("/account/register", "Create Account"),
];

static ORDER_DETAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/account/orders/([^/]+)$").unwrap_or_else(|_| unreachable!("static pattern"))
});

/// One step in a breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    /// Text to show.
    pub label: String,
    /// Link target; `None` for the current page.
    pub href: Option<String>,
}

/// Compute the breadcrumb trail for `path`.
///
/// The trail always starts at "Home" and ends with the current page, which is
/// not linked.
///
/// ```
/// use meadowlark_core::gate::breadcrumbs;
///
/// let trail = breadcrumbs("/account/orders/1042");
/// let labels: Vec<_> = trail.iter().map(|c| c.label.as_str()).collect();
/// assert_eq!(labels, ["Home", "My Account", "My Orders", "Order #1042"]);
/// assert_eq!(trail.last().unwrap().href, None);
/// ```
#[must_use]
pub fn breadcrumbs(path: &str) -> Vec<Breadcrumb> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let mut trail = Vec::with_capacity(segments.len() + 1);
    trail.push(Breadcrumb {
        label: "Home".to_owned(),
        href: Some("/".to_owned()),
    });

    let mut prefix = String::new();
    for segment in &segments {
        prefix.push('/');
        prefix.push_str(segment);
        trail.push(Breadcrumb {
            label: label_for(&prefix, segment),
            href: Some(prefix.clone()),
        });
    }

    if let Some(current) = trail.last_mut() {
        current.href = None;
    }
    trail
}

fn label_for(prefix: &str, segment: &str) -> String {
    if let Some(number) = ORDER_DETAIL
        .captures(prefix)
        .and_then(|caps| caps.get(1))
    {
        return format!("Order #{}", number.as_str());
    }

    LABELS
        .iter()
        .find(|(path, _)| *path == prefix)
        .map_or_else(|| slug_label(segment), |(_, label)| (*label).to_owned())
}

/// `gift-cards` → `Gift Cards`.
fn slug_label(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
