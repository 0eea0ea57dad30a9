//! Small declarative helpers shared by the HTTP apps.

/// Generate a `routes` function that registers every listed handler.
///
/// ```ignore
/// macros_utils::routes! {
///     route health_route,
///     route pause_service,
/// }
/// ```
///
/// expands to `pub fn routes(cfg: &mut actix_web::web::ServiceConfig)` which
/// calls `cfg.service(..)` once per handler, in order.
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($(route $handler:ident),* $(,)?) => {
        pub fn routes(cfg: &mut $crate::__actix_web::web::ServiceConfig) {
            $(cfg.service($handler);)*
        }
    };
}

#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web as __actix_web;
