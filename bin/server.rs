// Statement Crossref - Upload Server
// Accepts statement CSVs over multipart, runs the frequency analysis,
// and serves the generated report for download

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path as UrlPath},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use statement_crossref::{
    load_table_from_reader, run_frequency_analysis_with, LoadError, TableFailure, TableInput,
};
use std::io::Cursor;
use std::path::PathBuf;
use tower_http::cors::CorsLayer;

const UPLOAD_DIR: &str = "uploads";
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: &str) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message.to_string()),
        }
    }
}

/// Result of one analysis request
#[derive(Serialize)]
struct AnalysisResponse {
    message: String,
    common_count: usize,
    download: String,
    warnings: Vec<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Serve the upload form
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

/// POST /api/common-names - Analyze uploaded statement files
async fn analyze_common_names(mut multipart: Multipart) -> impl IntoResponse {
    let mut inputs: Vec<TableInput> = Vec::new();
    let mut failures: Vec<TableFailure> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                let message = format!("Malformed upload: {}", e);
                return (StatusCode::BAD_REQUEST, Json(ApiResponse::err(&message)))
                    .into_response();
            }
        };

        let source_file = field
            .file_name()
            .unwrap_or("upload.csv")
            .to_string();

        match field.bytes().await {
            Ok(bytes) => match load_table_from_reader(Cursor::new(bytes), &source_file) {
                Ok(table) => inputs.push(TableInput { table, source_file }),
                Err(load_error) => failures.push(TableFailure::Load(load_error)),
            },
            Err(e) => failures.push(TableFailure::Load(LoadError {
                source_file,
                reason: format!("failed to read uploaded bytes: {}", e),
            })),
        }
    }

    if inputs.is_empty() && failures.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::err("No files were uploaded")),
        )
            .into_response();
    }

    let outcome = run_frequency_analysis_with(&inputs, failures);

    if !outcome.has_data() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::err(&outcome.message())),
        )
            .into_response();
    }

    // Per-request scratch file; the uploads directory is transient space
    let filename = format!("common_names_{}.csv", uuid::Uuid::new_v4());
    let report_path = PathBuf::from(UPLOAD_DIR).join(&filename);
    let report = outcome.report();

    if let Err(e) = report.save(&report_path) {
        eprintln!("Error writing report {}: {}", report_path.display(), e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::err("Failed to write report")),
        )
            .into_response();
    }

    let response = AnalysisResponse {
        message: outcome.message(),
        common_count: outcome
            .summaries
            .values()
            .filter(|s| s.is_common())
            .count(),
        download: format!("/download/{}", filename),
        warnings: outcome.warnings(),
    };

    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

/// GET /download/:filename - Stream a previously generated report
async fn download_report(UrlPath(filename): UrlPath<String>) -> impl IntoResponse {
    // Decode URL-encoded filename
    let decoded = urlencoding::decode(&filename)
        .unwrap_or_else(|_| filename.clone().into())
        .into_owned();

    // Reject path traversal; reports live flat in the uploads directory
    if decoded.contains("..") || decoded.contains('/') || decoded.contains('\\') {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::err("Invalid report filename")),
        )
            .into_response();
    }

    let path = PathBuf::from(UPLOAD_DIR).join(&decoded);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", decoded),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::err("Report not found")),
        )
            .into_response(),
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🌐 Statement Crossref - Upload Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    std::fs::create_dir_all(UPLOAD_DIR).expect("Failed to create uploads directory");
    println!("✓ Uploads directory ready: {}/", UPLOAD_DIR);

    let app = Router::new()
        .route("/", get(serve_index))
        .route("/api/common-names", post(analyze_common_names))
        .route("/download/:filename", get(download_report))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive());

    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   Upload form: http://localhost:3000");
    println!("   API:         POST http://localhost:3000/api/common-names");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
