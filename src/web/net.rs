//! Config fetch and the hardware notification request.

use js_sys::Promise;
use tracing::{info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Response, window};

use crate::config::{ConfigStore, Hardware};
use crate::error::{Document, LoadError};
use crate::kiosk::NotifyReason;

/// Fetches both documents concurrently and builds the store.
pub async fn load_config() -> Result<ConfigStore, LoadError> {
    let defaults = request(Document::Defaults)?;
    let cultures = request(Document::Cultures)?;
    let defaults = body(Document::Defaults, defaults).await?;
    let cultures = body(Document::Cultures, cultures).await?;
    Ok(ConfigStore::from_json(&defaults, &cultures)?)
}

/// Fire-and-forget GET to the hardware endpoint. Failures are only logged.
pub fn notify_hardware(hardware: &Hardware, reason: NotifyReason) {
    if !hardware.enabled {
        info!(?reason, "hardware disabled, notification skipped");
        return;
    }
    let Some(win) = window() else {
        return;
    };
    let endpoint = hardware.endpoint.clone();
    let pending = JsFuture::from(win.fetch_with_str(&endpoint));
    wasm_bindgen_futures::spawn_local(async move {
        match pending.await {
            Ok(value) => {
                let status = value.dyn_into::<Response>().map(|r| r.status()).unwrap_or(0);
                info!(?reason, status, "hardware notified");
            }
            Err(err) => warn!(?reason, %endpoint, error = %describe(&err), "hardware notification failed"),
        }
    });
}

fn request(document: Document) -> Result<Promise, LoadError> {
    let win = window().ok_or_else(|| LoadError::Fetch { document, detail: "no window".to_string() })?;
    Ok(win.fetch_with_str(&document.to_string()))
}

async fn body(document: Document, pending: Promise) -> Result<String, LoadError> {
    let value = JsFuture::from(pending)
        .await
        .map_err(|e| LoadError::Fetch { document, detail: describe(&e) })?;
    let resp: Response = value
        .dyn_into()
        .map_err(|e| LoadError::Fetch { document, detail: describe(&e) })?;
    if !resp.ok() {
        return Err(LoadError::Status { document, status: resp.status() });
    }
    let text = resp.text().map_err(|e| LoadError::Body { document, detail: describe(&e) })?;
    let text = JsFuture::from(text)
        .await
        .map_err(|e| LoadError::Body { document, detail: describe(&e) })?;
    text.as_string()
        .ok_or_else(|| LoadError::Body { document, detail: "body is not text".to_string() })
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
