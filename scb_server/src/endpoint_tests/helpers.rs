use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use log::*;

pub async fn get_request(path: &str, configure: fn(&mut ServiceConfig)) -> Result<(StatusCode, String), String> {
    debug!("Sending GET request to {path}");
    send(TestRequest::get().uri(path), configure).await
}

pub async fn post_request(
    path: &str,
    headers: &[(&str, String)],
    body: Vec<u8>,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::post().uri(path).set_payload(body);
    for (name, value) in headers {
        req = req.insert_header((*name, value.as_str()));
    }
    debug!("Sending POST request to {path}");
    send(req, configure).await
}

pub async fn post_json(
    path: &str,
    body: serde_json::Value,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    debug!("Sending POST request to {path}");
    send(TestRequest::post().uri(path).set_json(body), configure).await
}

async fn send(req: TestRequest, configure: fn(&mut ServiceConfig)) -> Result<(StatusCode, String), String> {
    let app = App::new().configure(configure);
    let app = test::init_service(app).await;
    let (_, res) = test::try_call_service(&app, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(res.into_body().try_into_bytes().unwrap().as_ref()).into_owned();
    Ok((status, body))
}
