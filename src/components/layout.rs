//! Page layout wrapper component

use maud::{DOCTYPE, Markup, PreEscaped, html};

/// Wraps page content with standard HTML structure
///
/// The stylesheet is inlined so a report is a single self-contained file
/// that can be opened from anywhere.
///
/// # Arguments
///
/// * `title`: Page title text (without suffix)
/// * `stylesheet`: CSS text to inline
/// * `body`: Page-specific body markup
///
/// # Returns
///
/// Complete HTML document with wrapped content
pub fn page_wrapper(title: &str, stylesheet: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - gitcompare" }
                script src="https://unpkg.com/@phosphor-icons/web" {}
                style { (PreEscaped(stylesheet)) }
            }
            body {
                div class="container" {
                    (body)
                }
            }
        }
    }
}
