use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use word_bank::api::{
    AddToLearnedRequest, AddToLearnedResponse, BlockDetail, BlockSummary, BuildQuizRequest,
    CheckAnswerRequest, CheckAnswerResponse, ProfileProgress, Quiz, QuizResults,
    QuizResultsRequest, ScoredWord,
};

use crate::error::{AppError, AppResult};
use crate::quiz::QuizService;
use crate::store::{Store, UserId};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: uuid::Uuid, // subject (user id)
    pub exp: usize,      // expiry
}

pub fn verify_jwt(token: &str, secret: &str) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;

    let decoding_key = DecodingKey::from_secret(secret.as_ref());

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(token_data) => Ok(token_data.claims),
        Err(e) => {
            log::debug!("rejected token: {e}");
            Err(AppError::InvalidToken)
        }
    }
}

type Auth = Option<TypedHeader<Authorization<Bearer>>>;

pub struct AppState {
    pub store: Mutex<Store>,
    pub quiz: QuizService,
    pub jwt_secret: String,
}

impl AppState {
    pub fn new(store: Store, quiz: QuizService, jwt_secret: String) -> Self {
        Self {
            store: Mutex::new(store),
            quiz,
            jwt_secret,
        }
    }

    /// No bearer token is an anonymous caller; a bad one is rejected.
    fn identify(&self, auth: Auth) -> AppResult<Option<UserId>> {
        match auth {
            Some(TypedHeader(auth)) => Ok(Some(verify_jwt(auth.token(), &self.jwt_secret)?.sub)),
            None => Ok(None),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "word bank is up" }))
        .route("/blocks", get(list_blocks))
        .route("/blocks/{slug}", get(block_detail))
        .route("/blocks/{slug}/my-words", get(block_my_words))
        .route("/quiz", post(build_quiz))
        .route("/check-answer", post(check_answer))
        .route("/learned", post(add_to_learned))
        .route("/quiz-results", post(quiz_results))
        .route("/profile", get(profile))
        .route("/my-words", get(my_words))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

async fn list_blocks(
    State(state): State<Arc<AppState>>,
    auth: Auth,
) -> AppResult<Json<Vec<BlockSummary>>> {
    let user = state.identify(auth)?;
    let store = state.store.lock().await;
    Ok(Json(state.quiz.blocks(&store, user)?))
}

async fn block_detail(
    State(state): State<Arc<AppState>>,
    auth: Auth,
    Path(slug): Path<String>,
) -> AppResult<Json<BlockDetail>> {
    let user = state.identify(auth)?;
    let store = state.store.lock().await;
    Ok(Json(state.quiz.block_detail(&store, &slug, user)?))
}

async fn block_my_words(
    State(state): State<Arc<AppState>>,
    auth: Auth,
    Path(slug): Path<String>,
) -> AppResult<Json<Vec<ScoredWord>>> {
    let user = state.identify(auth)?;
    let store = state.store.lock().await;
    Ok(Json(state.quiz.block_words_for_user(&store, &slug, user)?))
}

async fn build_quiz(
    State(state): State<Arc<AppState>>,
    auth: Auth,
    Json(request): Json<BuildQuizRequest>,
) -> AppResult<Json<Quiz>> {
    let user = state.identify(auth)?;
    let store = state.store.lock().await;
    Ok(Json(state.quiz.build_quiz(&store, &request, user)?))
}

async fn check_answer(
    State(state): State<Arc<AppState>>,
    auth: Auth,
    Json(request): Json<CheckAnswerRequest>,
) -> AppResult<Json<CheckAnswerResponse>> {
    let user = state.identify(auth)?;
    let mut store = state.store.lock().await;
    Ok(Json(state.quiz.check_answer(&mut store, &request, user)?))
}

async fn add_to_learned(
    State(state): State<Arc<AppState>>,
    auth: Auth,
    Json(request): Json<AddToLearnedRequest>,
) -> AppResult<Json<AddToLearnedResponse>> {
    let user = state.identify(auth)?;
    let mut store = state.store.lock().await;
    Ok(Json(state.quiz.mark_learned(&mut store, &request, user)?))
}

async fn quiz_results(
    State(state): State<Arc<AppState>>,
    auth: Auth,
    Json(request): Json<QuizResultsRequest>,
) -> AppResult<Json<QuizResults>> {
    let user = state.identify(auth)?;
    let store = state.store.lock().await;
    Ok(Json(state.quiz.quiz_results(&store, &request, user)?))
}

async fn profile(
    State(state): State<Arc<AppState>>,
    auth: Auth,
) -> AppResult<Json<ProfileProgress>> {
    let user = state.identify(auth)?;
    let store = state.store.lock().await;
    Ok(Json(state.quiz.profile(&store, user)?))
}

async fn my_words(
    State(state): State<Arc<AppState>>,
    auth: Auth,
) -> AppResult<Json<Vec<ScoredWord>>> {
    let user = state.identify(auth)?;
    let store = state.store.lock().await;
    Ok(Json(state.quiz.my_words(&store, user)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::QuizSettings;
    use crate::store::NewWord;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "test-secret";

    fn app() -> (Router, Vec<word_bank::Word>) {
        let mut store = Store::open_in_memory().unwrap();
        let words: Vec<NewWord> = [("gamarjoba", "hello"), ("madloba", "thanks"), ("ki", "yes")]
            .iter()
            .map(|(name, translation)| NewWord {
                name: name.to_string(),
                transliteration: name.to_string(),
                translation: translation.to_string(),
                example: None,
                example_image: Some("/media/hello.png".to_string()),
                audio: None,
                image: None,
            })
            .collect();
        let (_, words) = store.import_block("Greetings", None, &words).unwrap();
        let quiz = QuizService::new(Arc::default(), QuizSettings::default());
        let state = Arc::new(AppState::new(store, quiz, SECRET.to_string()));
        (router(state), words)
    }

    fn token(user: Uuid) -> String {
        let claims = Claims {
            sub: user,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_ref()),
        )
        .unwrap()
    }

    fn get_request(uri: &str, user: Option<Uuid>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(user)));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_request(uri: &str, body: Value, user: Option<Uuid>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(user)));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_list_blocks_anonymously() {
        let (app, _) = app();
        let (status, body) = send(&app, get_request("/blocks", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["slug"], "greetings");
        assert_eq!(body[0]["fully_learned"], false);
    }

    #[tokio::test]
    async fn test_unknown_quiz_type_is_bad_request() {
        let (app, _) = app();
        let (status, body) = send(
            &app,
            post_request(
                "/quiz",
                json!({ "quiz_type": "flashcards", "learning_block": "greetings" }),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "unknown quiz type: flashcards");
    }

    #[tokio::test]
    async fn test_review_without_token_is_unauthorized() {
        let (app, _) = app();
        let (status, _) = send(
            &app,
            post_request(
                "/quiz",
                json!({ "quiz_type": "review", "learning_block": "greetings" }),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_token_is_unauthorized() {
        let (app, _) = app();
        let request = Request::builder()
            .uri("/profile")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_block_is_not_found() {
        let (app, _) = app();
        let (status, _) = send(&app, get_request("/blocks/colours", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_answer_flow() {
        let (app, words) = app();
        let user = Uuid::new_v4();

        let (status, body) = send(
            &app,
            post_request(
                "/check-answer",
                json!({ "quiz_type": "multiple_choice", "question_id": words[0].id, "answer": "hello" }),
                Some(user),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_correct"], true);
        assert_eq!(
            body["example_span"],
            "<img src=\"/media/hello.png\" class=\"image-example\" alt=\"example_image\"> "
        );

        let (status, body) = send(&app, get_request("/profile", Some(user))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["experience"], 2);
        assert_eq!(body["level"], 1);

        let (_, body) = send(&app, get_request("/my-words", Some(user))).await;
        assert_eq!(body[0]["word"]["name"], "gamarjoba");
        assert_eq!(body[0]["points"], 2);
    }

    #[tokio::test]
    async fn test_learn_flow() {
        let (app, words) = app();
        let user = Uuid::new_v4();

        let (status, body) = send(
            &app,
            post_request(
                "/learned",
                json!({ "question_id": words[1].id, "is_last": true }),
                Some(user),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["created"], true);
        assert_eq!(body["is_last"], true);

        let (_, body) = send(
            &app,
            post_request(
                "/learned",
                json!({ "question_id": words[1].id }),
                None,
            ),
        )
        .await;
        assert_eq!(body, json!({ "is_last": false }));

        let (_, body) = send(&app, get_request("/blocks/greetings", Some(user))).await;
        assert_eq!(body["progress"]["num_learned_words"], 1);
        assert_eq!(body["progress"]["fully_learned"], false);

        let request = get_request("/blocks/greetings/my-words", Some(user));
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["word"]["name"], "madloba");
        assert_eq!(body[0]["points"], 1);

        let (_, body) = send(&app, get_request("/blocks/greetings/my-words", None)).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_learn_answers_are_bad_request() {
        let (app, words) = app();
        let (status, _) = send(
            &app,
            post_request(
                "/check-answer",
                json!({ "quiz_type": "learn", "question_id": words[0].id, "answer": "hello" }),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
