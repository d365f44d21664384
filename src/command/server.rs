use crate::conf::Conf;
use crate::{db, rest, Result};
use actix_web::dev::Service;
use actix_web::{
    middleware::{Compress, NormalizePath},
    web::Data,
    App, HttpServer,
};
use futures_util::future::FutureExt;
use time::OffsetDateTime;
use tracing::info;

pub async fn run(conf: Conf) -> Result<()> {
    // All the worker threads are sharing a single connection pool
    let pool = db::pool(&conf.db_path)?;
    let bind_addr = (conf.addr.clone(), conf.port);
    info!(addr = %conf.addr, port = conf.port, "Starting server");

    HttpServer::new(move || {
        App::new()
            .wrap_fn(|req, srv| {
                let req_query_string = req.query_string().to_string();
                let req_method = req.method().as_str().to_string();
                let req_path = req.path().to_string();
                let req_time = OffsetDateTime::now_utc();
                srv.call(req).map(move |res| {
                    if let Ok(res) = res.as_ref() {
                        let res_status = res.status().as_u16();
                        info!(
                            req_query_string,
                            req_method,
                            req_path,
                            res_status,
                            res_time_sec = (OffsetDateTime::now_utc() - req_time).as_seconds_f64(),
                        );
                    }
                    res
                })
            })
            .wrap(NormalizePath::trim())
            .wrap(Compress::default())
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(conf.clone()))
            .service(rest::api())
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}
