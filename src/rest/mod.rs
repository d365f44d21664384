pub mod customers;
pub mod error;
pub mod summary;

use actix_web::web::scope;
use actix_web::Scope;

pub fn api() -> Scope {
    scope("api")
        .service(
            scope("customers")
                .service(customers::get_count)
                .service(customers::get),
        )
        .service(summary::get)
}
