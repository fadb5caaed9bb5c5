//! Browser image prefetch.
//!
//! Loads a locator into a detached `HtmlImageElement` so the browser
//! caches it before the final layer is mounted.

use glimmer_reveal::{PrefetchOutcome, PrefetchTicket};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

/// Errors that can occur during a prefetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrefetchError {
    /// The browser refused to create the image element.
    #[error("failed to create image element: {0}")]
    Element(String),

    /// The image failed to load.
    #[error("failed to load {locator}")]
    Load {
        /// The locator that failed.
        locator: String,
    },
}

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Fetch `locator` into the browser cache.
///
/// # Errors
///
/// Returns [`PrefetchError::Element`] if the image element cannot be
/// created and [`PrefetchError::Load`] if the image fails to load.
#[allow(clippy::future_not_send)] // WASM is single-threaded; Send is not needed
pub async fn prefetch_image(locator: &str) -> Result<(), PrefetchError> {
    let image =
        web_sys::HtmlImageElement::new().map_err(|e| PrefetchError::Element(describe(&e)))?;

    // The resolve/reject functions are installed directly as the load and
    // error handlers, so nothing has to outlive this call.
    let promise = js_sys::Promise::new(&mut |resolve, reject| {
        image.set_onload(Some(&resolve));
        image.set_onerror(Some(&reject));
    });
    image.set_src(locator);

    let result = JsFuture::from(promise).await;
    image.set_onload(None);
    image.set_onerror(None);

    result.map(drop).map_err(|_| PrefetchError::Load {
        locator: locator.to_owned(),
    })
}

/// Run the prefetch for `ticket` and convert the result into the outcome
/// the reveal machine expects.
#[allow(clippy::future_not_send)] // WASM is single-threaded; Send is not needed
pub async fn run_ticket(ticket: &PrefetchTicket) -> PrefetchOutcome {
    match prefetch_image(&ticket.locator).await {
        Ok(()) => PrefetchOutcome::Succeeded,
        Err(e) => {
            log::info!("prefetch {}: {e}", ticket.generation);
            PrefetchOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
