//! Everything read from the hosting page: the query string, local storage and
//! the location the page was served from.

use wasm_bindgen::JsValue;
use web_sys::{UrlSearchParams, Window};

use weiqi::channel::{resolve_socket_url, PageOrigin, STORED_URL_KEY};

pub fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("There is no window."))
}

/// A parameter of the page's query string, `None` if it is missing.
pub fn query_param(name: &str) -> Option<String> {
    let search = window().ok()?.location().search().ok()?;
    UrlSearchParams::new_with_str(&search).ok()?.get(name)
}

fn stored_socket_url() -> Option<String> {
    window()
        .ok()?
        .local_storage()
        .ok()
        .flatten()?
        .get_item(STORED_URL_KEY)
        .ok()
        .flatten()
}

/// `?ws=` wins over `localStorage`, which wins over the page origin.
pub fn socket_url() -> Result<String, JsValue> {
    let location = window()?.location();
    let origin = PageOrigin::new(&location.protocol()?, location.host()?);
    Ok(resolve_socket_url(
        query_param("ws").as_deref(),
        stored_socket_url().as_deref(),
        &origin,
    ))
}
