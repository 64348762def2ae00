//! schema.org JSON-LD generation for post pages.
//!
//! Every post gets a `BlogPosting`, an `Organization`, and a
//! `BreadcrumbList`; `HowTo`, `FAQPage`, and `Service` objects are added
//! when the front matter asks for them. Each object is emitted as its own
//! `<script type="application/ld+json">` block rather than one combined
//! `@graph`.

use crate::config::Config;
use crate::post::Post;
use serde_json::{json, Value};

const SCHEMA_CONTEXT: &str = "https://schema.org";

/// Produces the ordered JSON-LD objects for one post.
pub fn json_ld(post: &Post, config: &Config) -> Vec<Value> {
    let mut blocks = vec![blog_posting(post, config)];
    if is_how_to(post) {
        blocks.push(how_to(post));
    }
    if !post.faqs.is_empty() {
        blocks.push(faq_page(post));
    }
    if is_service(post) {
        blocks.push(service(post, config));
    }
    blocks.push(organization(config));
    blocks.push(breadcrumbs(post, config));
    blocks
}

/// Renders JSON-LD objects as `<script>` blocks for the page `<head>`.
pub fn script_blocks(blocks: &[Value]) -> String {
    blocks
        .iter()
        .map(|block| {
            format!(
                "<script type=\"application/ld+json\">\n{}\n</script>",
                // serializing a Value cannot fail
                serde_json::to_string_pretty(block).unwrap()
            )
        })
        .collect::<Vec<String>>()
        .join("\n")
}

fn is_how_to(post: &Post) -> bool {
    post.kind.as_deref() == Some("how-to") || post.schema.as_deref() == Some("HowTo")
}

fn is_service(post: &Post) -> bool {
    post.category.as_ref().map(|c| c.slug.as_str()) == Some("service")
        || post.schema.as_deref() == Some("Service")
}

fn blog_posting(post: &Post, config: &Config) -> Value {
    let date = post.date.format("%Y-%m-%d").to_string();
    let mut value = json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "BlogPosting",
        "headline": post.title,
        "description": post.excerpt(),
        "datePublished": date,
        "dateModified": date,
        "mainEntityOfPage": {
            "@type": "WebPage",
            "@id": post.url.as_str(),
        },
        "author": {
            "@type": "Person",
            "name": post.author.as_deref()
                .or_else(|| config.author.as_deref())
                .unwrap_or(&config.organization.name),
        },
        "publisher": publisher(config),
    });
    if let Some(image) = &post.image {
        value["image"] = json!(image);
    }
    value
}

fn publisher(config: &Config) -> Value {
    let mut value = json!({
        "@type": "Organization",
        "name": config.organization.name,
    });
    if let Some(logo) = &config.organization.logo {
        value["logo"] = json!({
            "@type": "ImageObject",
            "url": logo,
        });
    }
    value
}

fn how_to(post: &Post) -> Value {
    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "HowTo",
        "name": post.title,
        "description": post.excerpt(),
        "step": post.steps.iter().enumerate().map(|(i, step)| json!({
            "@type": "HowToStep",
            "position": i + 1,
            "name": step.name,
            "text": step.text,
        })).collect::<Vec<Value>>(),
    })
}

fn faq_page(post: &Post) -> Value {
    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "FAQPage",
        "mainEntity": post.faqs.iter().map(|faq| json!({
            "@type": "Question",
            "name": faq.question,
            "acceptedAnswer": {
                "@type": "Answer",
                "text": faq.answer,
            },
        })).collect::<Vec<Value>>(),
    })
}

fn service(post: &Post, config: &Config) -> Value {
    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "Service",
        "name": post.title,
        "description": post.excerpt(),
        "provider": {
            "@type": "Organization",
            "name": config.organization.name,
            "url": config.organization.url.as_str(),
        },
    })
}

fn organization(config: &Config) -> Value {
    let org = &config.organization;
    let mut value = json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "Organization",
        "name": org.name,
        "url": org.url.as_str(),
    });
    if let Some(logo) = &org.logo {
        value["logo"] = json!(logo);
    }
    if let Some(email) = &org.contact_email {
        value["contactPoint"] = json!({
            "@type": "ContactPoint",
            "email": email,
            "contactType": "customer service",
        });
    }
    value
}

fn breadcrumbs(post: &Post, config: &Config) -> Value {
    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "BreadcrumbList",
        "itemListElement": [
            {
                "@type": "ListItem",
                "position": 1,
                "name": "Home",
                "item": config.base_url.as_str(),
            },
            {
                "@type": "ListItem",
                "position": 2,
                "name": "Blog",
                "item": config.blog_url().as_str(),
            },
            {
                "@type": "ListItem",
                "position": 3,
                "name": post.title,
                "item": post.url.as_str(),
            },
        ],
    })
}
