pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::candidates::handlers as candidates;
use crate::interview::handlers as interviews;
use crate::screening::handlers as screenings;
use crate::state::AppState;

/// Resume batches are uploaded in one multipart request.
const SCREENING_BODY_LIMIT: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Screening
        .route(
            "/api/v1/screenings",
            post(screenings::handle_screen_batch).layer(DefaultBodyLimit::max(SCREENING_BODY_LIMIT)),
        )
        .route("/api/v1/screenings/text", post(screenings::handle_screen_text))
        // HR dashboard
        .route(
            "/api/v1/candidates",
            get(candidates::handle_list_candidates).delete(candidates::handle_clear_candidates),
        )
        .route("/api/v1/candidates/:name", get(candidates::handle_get_candidate))
        .route(
            "/api/v1/candidates/:name/report",
            get(candidates::handle_get_report),
        )
        .route(
            "/api/v1/candidates/:name/report/markdown",
            get(candidates::handle_get_markdown_report),
        )
        .route(
            "/api/v1/candidates/:name/recommendation",
            post(candidates::handle_regenerate_recommendation),
        )
        // Candidate interview
        .route("/api/v1/interviews", post(interviews::handle_start))
        .route("/api/v1/interviews/:id", get(interviews::handle_progress))
        .route("/api/v1/interviews/:id/answer", post(interviews::handle_answer))
        .route("/api/v1/interviews/:id/skip", post(interviews::handle_skip))
        .route("/api/v1/interviews/:id/end", post(interviews::handle_end))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::candidates::store::{testing::new_candidate, upsert_candidate};
    use crate::config::InterviewSettings;
    use crate::llm_client::testing::ScriptedModel;
    use crate::state::testing::test_state;

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn json_body(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    const BOUNDARY: &str = "interview-api-test-boundary";

    /// `(field, file name, content)` parts as a `multipart/form-data` body.
    fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, file_name, content) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let disposition = match file_name {
                Some(file) => format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                ),
                None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"),
            };
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn upload(router: &Router, parts: &[(&str, Option<&str>, &[u8])]) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/screenings")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, json_body(&bytes))
    }

    /// A one-page PDF showing `text` in Helvetica, with a correct xref table.
    fn minimal_pdf(text: &str) -> Vec<u8> {
        let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
                .to_string(),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
            format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, object) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{object}\nendobj\n", i + 1).as_bytes());
        }

        let xref_at = pdf.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            xref.push_str(&format!("{offset:010} 00000 n \n"));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        ));
        pdf.extend_from_slice(xref.as_bytes());
        pdf
    }

    fn settings() -> InterviewSettings {
        InterviewSettings {
            max_questions: 1,
            bank_ask_every: 0,
            ..InterviewSettings::default()
        }
    }

    #[tokio::test]
    async fn test_health() {
        let state = test_state(Arc::new(ScriptedModel::default()), settings()).await;
        let router = build_router(state);

        let (status, body) = send(&router, Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["service"], "interview-api");
    }

    #[tokio::test]
    async fn test_login_denied_returns_403_with_message() {
        let state = test_state(Arc::new(ScriptedModel::default()), settings()).await;
        let router = build_router(state);

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/v1/interviews",
            Some(json!({"name": "nobody"})),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        let body = json_body(&body);
        assert_eq!(body["error"]["code"], "ACCESS_DENIED");
        assert_eq!(body["error"]["message"], "Name not found or resume score too low.");
    }

    #[tokio::test]
    async fn test_interview_over_http_then_report() {
        let llm = Arc::new(ScriptedModel::new([
            "Explain lifetimes.",
            r#"{"score": 7, "feedback": "Clear."}"#,
            r#"{"summary": "Capable engineer.", "concerns": []}"#,
        ]));
        let state = test_state(llm, settings()).await;
        upsert_candidate(&state.db, &new_candidate("Grace Hopper", 90)).await.unwrap();
        let router = build_router(state);

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/v1/interviews",
            Some(json!({"name": "Grace Hopper"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let view = json_body(&body);
        assert_eq!(view["question"], "Explain lifetimes.");
        let id = view["session_id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &router,
            Method::POST,
            &format!("/api/v1/interviews/{id}/answer"),
            Some(json!({"answer": "They bound how long references live."})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["completed"], true);

        let (status, body) = send(&router, Method::GET, "/api/v1/candidates", None).await;
        assert_eq!(status, StatusCode::OK);
        let rows = json_body(&body);
        assert_eq!(rows[0]["name"], "grace hopper");
        assert_eq!(rows[0]["interview_score"], 7.0);
        assert_eq!(rows[0]["decision"], "Move Forward");

        let (status, body) = send(
            &router,
            Method::GET,
            "/api/v1/candidates/grace%20hopper/report/markdown",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let markdown = String::from_utf8(body).unwrap();
        assert!(markdown.starts_with("# Interview Report: Grace Hopper"));
        assert!(markdown.contains("Capable engineer."));
    }

    #[tokio::test]
    async fn test_unknown_candidate_report_is_404() {
        let state = test_state(Arc::new(ScriptedModel::default()), settings()).await;
        let router = build_router(state);

        let (status, _) = send(&router, Method::GET, "/api/v1/candidates/ghost/report", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_skip_and_end_on_unknown_session_are_404() {
        let state = test_state(Arc::new(ScriptedModel::default()), settings()).await;
        let router = build_router(state);
        let id = uuid::Uuid::new_v4();

        let (skip, _) = send(&router, Method::POST, &format!("/api/v1/interviews/{id}/skip"), None).await;
        let (end, _) = send(&router, Method::POST, &format!("/api/v1/interviews/{id}/end"), None).await;

        assert_eq!(skip, StatusCode::NOT_FOUND);
        assert_eq!(end, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_clear_candidates() {
        let state = test_state(Arc::new(ScriptedModel::default()), settings()).await;
        upsert_candidate(&state.db, &new_candidate("a", 80)).await.unwrap();
        let router = build_router(state);

        let (status, body) = send(&router, Method::DELETE, "/api/v1/candidates", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["removed"], 1);
    }

    #[tokio::test]
    async fn test_batch_screening_reports_bad_file_and_screens_the_rest() {
        let llm = Arc::new(ScriptedModel::new([r#"{"name": "Ada Lovelace", "score": 88,
            "email": "ada@example.com", "years_of_experience": 6,
            "reasoning": "Strong Rust background", "extracted_topics": ["Rust", "Raft"]}"#]));
        let state = test_state(llm.clone(), settings()).await;
        let db = state.db.clone();
        let router = build_router(state);
        let resume = minimal_pdf("Ada Lovelace, six years of Rust and distributed systems");
        let bank = b"What is Raft?,consensus\nExplain MVCC.,storage\nWhat is Raft?,again\n";

        let (status, body) = upload(
            &router,
            &[
                ("jd_text", None, b"Senior Rust engineer".as_slice()),
                ("question_bank", Some("bank.csv"), bank.as_slice()),
                ("resumes", Some("broken.pdf"), b"definitely not a pdf".as_slice()),
                ("resumes", Some("ada.pdf"), resume.as_slice()),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["screened"], 1);
        assert_eq!(body["failed"], 1);
        assert_eq!(body["question_bank_size"], 2);
        assert_eq!(body["results"][0]["file_name"], "broken.pdf");
        assert!(body["results"][0]["error"].is_string());
        assert!(body["results"][0].get("candidate").is_none());
        assert_eq!(body["results"][1]["file_name"], "ada.pdf");
        assert_eq!(body["results"][1]["candidate"]["name"], "ada lovelace");
        assert_eq!(body["results"][1]["candidate"]["eligible"], true);
        assert_eq!(llm.calls(), 1);
        assert!(llm.prompts()[0].contains("Senior Rust engineer"));

        let row = crate::candidates::store::get_candidate(&db, "ada lovelace")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            row.question_bank(),
            vec!["What is Raft?".to_string(), "Explain MVCC.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_batch_screening_without_jd_or_resumes_is_400() {
        let llm = Arc::new(ScriptedModel::default());
        let state = test_state(llm.clone(), settings()).await;
        let router = build_router(state);
        let resume = minimal_pdf("Someone");

        let (blank_jd, body) = upload(
            &router,
            &[("jd_text", None, b"   ".as_slice()), ("resumes", Some("a.pdf"), resume.as_slice())],
        )
        .await;
        assert_eq!(blank_jd, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (no_resumes, _) = upload(&router, &[("jd_text", None, b"Rust engineer".as_slice())]).await;
        assert_eq!(no_resumes, StatusCode::BAD_REQUEST);
        assert_eq!(llm.calls(), 0);
    }
}
