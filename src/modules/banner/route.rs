use crate::modules::banner::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/banners")
            .service(list_banners)
            .service(new_banner)
            .service(get_banner)
            .service(create_banner)
            .service(update_banner)
            .service(delete_banner),
    );
}
