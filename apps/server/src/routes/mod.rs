use actix_web::web;

mod channels;
mod health;
mod services;

pub fn routes(cfg: &mut web::ServiceConfig) {
    health::routes(cfg);
    services::routes(cfg);
    channels::routes(cfg);
}
