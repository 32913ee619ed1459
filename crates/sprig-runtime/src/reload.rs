//! Whole-site reload over HTTP
//!
//! Reloading re-runs every post-init hook against the live application.
//! It is only offered to requests coming from the local machine.

use sprig_core::{Composition, HandlerError, HandlerResult, Lens};
use tracing::{info, warn};

use crate::handler::Handler;

/// Path the builtin reload route is registered under.
pub const RELOAD_ROUTE: &str = "admin/reload";

/// Runs `body` only for requests from a loopback address; declines otherwise.
pub fn fail_if_not_local<B: 'static, V: 'static, T>(
    h: &mut Handler<'_, B, V>,
    body: impl FnOnce(&mut Handler<'_, B, V>) -> HandlerResult<T>,
) -> HandlerResult<T> {
    if !h.request().is_local() {
        warn!(client = %h.request().client_addr, "Refusing local-only request");
        return Err(HandlerError::NotHandled);
    }
    body(h)
}

/// Reloads the site and reports the outcome in the response body.
///
/// On failure the response status is 500 and the body carries the reloader's
/// message after a fixed heading.
pub fn reload_site<B: 'static, V: 'static>(h: &mut Handler<'_, B, V>) -> HandlerResult<()> {
    fail_if_not_local(h, |h| {
        let reloader = h.with_top_cell(&Lens::identity(), |top| {
            top.descriptor().reloader.clone()
        });
        match reloader() {
            Ok(message) => {
                info!("Site reloaded");
                h.write_output(&message);
                h.write_output("Site successfully reloaded.\n");
            }
            Err(message) => {
                warn!(error = %message, "Site reload failed");
                h.set_response_status(500, "Internal Server Error");
                h.write_output("Error reloading site!\n\n");
                h.write_output(&message);
            }
        }
        Ok(())
    })
}
