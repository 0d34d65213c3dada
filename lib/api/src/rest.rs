use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use dnematch_core::{AddressQuery, Error, Field};
use dnematch_similarity::AddressSearchEngine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Deserialize)]
struct SearchRequest {
    #[serde(flatten)]
    query: AddressQuery,
    top_k: Option<usize>,
    search_k: Option<usize>,
}

#[derive(Serialize)]
struct InfoResponse {
    records: usize,
    fields: Vec<Field>,
    embedding_dim: usize,
    encoder_id: String,
    top_k: usize,
    search_k: usize,
    use_uf_filter: bool,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(
        engine: Arc<AddressSearchEngine>,
        host: &str,
        port: u16,
    ) -> std::io::Result<()> {
        info!(host, port, records = engine.context().len(), "starting REST API");

        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(engine.clone()))
                .configure(routes)
        })
        .bind((host, port))?
        .run()
        .await
    }
}

/// Route table, shared by the server and the handler tests
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/info", web::get().to(info))
        .route("/search", web::post().to(search));
}

fn error_response(err: &Error) -> HttpResponse {
    let body = serde_json::json!({ "error": err.to_string() });
    match err {
        Error::InvalidConfig(_) => HttpResponse::BadRequest().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

async fn health() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

async fn info(engine: web::Data<Arc<AddressSearchEngine>>) -> ActixResult<HttpResponse> {
    let context = engine.context();
    let config = engine.config();
    Ok(HttpResponse::Ok().json(InfoResponse {
        records: context.len(),
        fields: Field::TEXT.to_vec(),
        embedding_dim: context.embedder().dim(),
        encoder_id: context.embedder().encoder_id(),
        top_k: config.top_k,
        search_k: config.search_k,
        use_uf_filter: config.use_uf_filter,
    }))
}

async fn search(
    engine: web::Data<Arc<AddressSearchEngine>>,
    req: web::Json<SearchRequest>,
) -> ActixResult<HttpResponse> {
    let SearchRequest {
        query,
        top_k,
        search_k,
    } = req.into_inner();

    let top_k = top_k.unwrap_or(engine.config().top_k);
    let search_k = search_k.unwrap_or(engine.config().search_k);
    if top_k == 0 || search_k == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "top_k and search_k must be greater than zero"
        })));
    }

    let engine = engine.get_ref().clone();
    let result = web::block(move || engine.search(&query, top_k, search_k)).await?;

    match result {
        Ok(result) => Ok(HttpResponse::Ok().json(result)),
        Err(e) => {
            warn!(error = %e, "search failed");
            Ok(error_response(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};
    use dnematch_core::AddressRecord;
    use dnematch_similarity::{EngineConfig, FieldEmbedder};
    use dnematch_storage::IndexBuilder;
    use serde_json::{json, Value};

    fn engine() -> Arc<AddressSearchEngine> {
        let embedder = FieldEmbedder::hashed(64).unwrap();
        let built = IndexBuilder::new(embedder.clone())
            .build(vec![
                AddressRecord::new("Rua das Flores", "Centro", "São Paulo", "SP", "01310-100"),
                AddressRecord::new("Rua das Flores", "Centro", "Curitiba", "PR", "80010-000"),
                AddressRecord::new("Avenida Sete", "Centro", "Salvador", "BA", "40060-000"),
            ])
            .unwrap();
        let context = built.into_context(embedder).unwrap();
        Arc::new(AddressSearchEngine::new(Arc::new(context), EngineConfig::default()).unwrap())
    }

    #[actix_web::test]
    async fn test_health_and_info() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(engine()))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"status": "ok"}));

        let req = test::TestRequest::get().uri("/info").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["records"], json!(3));
        assert_eq!(body["embedding_dim"], json!(64));
        assert_eq!(body["fields"], json!(["logradouro", "bairro", "cidade"]));
    }

    #[actix_web::test]
    async fn test_search_applies_region_filter() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(engine()))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/search")
            .set_json(json!({"logradouro": "R. das Flores", "uf": "PR", "top_k": 2}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["total_found"], json!(1));
        assert_eq!(body["results"][0]["address"]["cidade"], json!("Curitiba"));
        assert_eq!(body["results"][0]["confidence"], json!("high"));
        assert_eq!(body["query"]["uf"], json!("PR"));
    }

    #[actix_web::test]
    async fn test_search_rejects_zero_limits() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(engine()))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/search")
            .set_json(json!({"logradouro": "Rua A", "top_k": 0}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_empty_query_is_empty_success() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(engine()))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/search")
            .set_json(json!({}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total_found"], json!(0));
        assert_eq!(body["weights_used"], json!({}));
    }
}
