//! Route wrapper that renders protected content only when the guard allows it.
//!
//! Every location change re-runs the guard and, in the browser, schedules a
//! throttled implicit verification. Redirects replace the history entry so
//! the back button does not bounce through the guard again.

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_location, use_navigate};

use crate::components::session_provider::use_session;
use crate::state::guard::RouteDecision;

/// Renders `children` when the current path is allowed, `pending` while the
/// session is still being verified, and navigates away otherwise.
#[component]
pub fn RequireSession(children: ChildrenFn, #[prop(optional, into)] pending: ViewFn) -> impl IntoView {
    let context = use_session();
    let location = use_location();
    let navigate = use_navigate();

    let pathname = location.pathname;
    let search = location.search;
    let decision = Memo::new(move |_| {
        let path = pathname.get();
        let query = search.get();
        let query = query.trim_start_matches('?');
        if query.is_empty() { context.decide(&path) } else { context.decide(&format!("{path}?{query}")) }
    });

    #[cfg(feature = "hydrate")]
    Effect::new(move || {
        pathname.track();
        let session = context.session();
        leptos::task::spawn_local(async move {
            session.refresh_auth().await;
        });
    });

    Effect::new(move || {
        let decision = decision.get();
        if let Some(target) = context.redirect_target(&decision) {
            log::debug!("guard: redirecting to {target}");
            navigate(&target, NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });

    view! {
        <Show when=move || decision.get() == RouteDecision::Allow fallback=move || pending.run()>
            {children()}
        </Show>
    }
}
