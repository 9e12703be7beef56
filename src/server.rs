use std::net::SocketAddr;

use actix_web::{App, HttpResponse, HttpServer, http::StatusCode, web};
use serde_json::json;

use crate::currency::Currency;
use crate::error::MarkupError;
use crate::exchange_rate::RateSource;
use crate::form::ConversionForm;
use crate::report::MarkupReport;
use crate::session::{CalculationSession, SessionState};

pub async fn run<S: RateSource + 'static>(source: S, listen_addr: SocketAddr) -> std::io::Result<()> {
    let session = web::Data::new(CalculationSession::new(source));
    log::info!("listening on {}", listen_addr);

    HttpServer::new(move || App::new().configure(routes::<S>(session.clone())))
        .bind(listen_addr)?
        .run()
        .await
}

pub fn routes<S: RateSource + 'static>(
    session: web::Data<CalculationSession<S>>,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(session)
            .route("/markup", web::post().to(calculate_markup::<S>))
            .route("/currencies", web::get().to(list_currencies))
            .route("/status", web::get().to(session_status::<S>));
    }
}

async fn calculate_markup<S: RateSource + 'static>(
    session: web::Data<CalculationSession<S>>,
    form: web::Json<ConversionForm>,
) -> HttpResponse {
    let (request, details) = match form.into_inner().into_request() {
        Ok(parsed) => parsed,
        Err(e) => return error_response(&e),
    };

    match session.calculate(&request).await {
        Ok(result) => HttpResponse::Ok().json(MarkupReport::new(&request, result, details)),
        Err(e) => error_response(&e),
    }
}

/// Lets a client keep its submit control disabled while a fetch is running.
async fn session_status<S: RateSource + 'static>(
    session: web::Data<CalculationSession<S>>,
) -> HttpResponse {
    let state = session.state();
    let mut body = json!({ "state": state.name(), "busy": session.is_busy() });
    if let SessionState::Failed(e) = &state {
        body["error"] = json!(e.to_string());
    }
    HttpResponse::Ok().json(body)
}

async fn list_currencies() -> HttpResponse {
    HttpResponse::Ok().json(Currency::ALL)
}

fn status_for(error: &MarkupError) -> StatusCode {
    match error {
        MarkupError::Validation(_) => StatusCode::BAD_REQUEST,
        MarkupError::QuoteUnavailable(_) => StatusCode::BAD_GATEWAY,
        MarkupError::Computation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        MarkupError::Busy => StatusCode::CONFLICT,
    }
}

fn error_response(error: &MarkupError) -> HttpResponse {
    HttpResponse::build(status_for(error)).json(json!({ "error": error.to_string() }))
}
