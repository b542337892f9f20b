use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// JSON extractor that rejects bad bodies with the same `{"message",
/// "status"}` shape the rest of the API uses. Deserialization failures keep
/// the serde error text, which names the offending field.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                let message = match &rejection {
                    JsonRejection::JsonDataError(err) => err.body_text(),
                    JsonRejection::JsonSyntaxError(_) => {
                        "Request body is not valid JSON".to_string()
                    }
                    JsonRejection::MissingJsonContentType(_) => {
                        "Expected a request with `Content-Type: application/json`".to_string()
                    }
                    other => other.body_text(),
                };
                tracing::warn!("Rejected request body: {}", message);
                let error_response = json!({
                    "message": message,
                    "status": 400
                });
                Err((StatusCode::BAD_REQUEST, Json(error_response)).into_response())
            }
        }
    }
}
