use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/newspapers", newspaper_routes())
        .nest("/quotes", quote_routes())
        .nest("/advertisements", advertisement_routes())
        .nest("/track", tracking_routes(config))
        .nest("/auth", auth_routes())
        .nest("/admin/advertisements", admin_routes())
        .nest("/uploads", upload_routes())
}

fn newspaper_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::newspapers::list_newspapers))
}

fn quote_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::newspapers::quote))
}

fn advertisement_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::advertisements::submit))
        .routes(routes!(handlers::advertisements::submit_draft))
}

fn tracking_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let actions = OpenApiRouter::new()
        .routes(routes!(handlers::tracking::get_tracking))
        .routes(routes!(handlers::tracking::resubmit))
        .routes(routes!(handlers::tracking::confirm))
        .routes(routes!(handlers::tracking::cancel));

    let payment = OpenApiRouter::new()
        .routes(routes!(handlers::tracking::upload_payment))
        .layer(handlers::tracking::payment_body_limit(config.uploads.max_size));

    actions.merge(payment)
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::auth::login))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::admin::list_advertisements))
        .routes(routes!(handlers::admin::get_advertisement))
        .routes(routes!(handlers::admin::set_status))
        .routes(routes!(handlers::admin::print_advertisement))
}

fn upload_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::uploads::serve_upload))
}
