use std::sync::Arc;

use mockito::Matcher;

use lexscope::llm::{LlmProvider, MemoryCache, NoopCache, RemoteLlmProvider, Summarizer};

const BODY: &str = "La Corte Suprema confirmó la condena dictada contra la empresa por \
incumplimiento de la normativa sanitaria, rechazando los recursos de casación presentados \
por la defensa y manteniendo la multa impuesta en primera instancia.";

const SOURCE: &str = "Consejo de Defensa del Estado";

fn provider_for(server: &mockito::ServerGuard) -> Arc<dyn LlmProvider> {
    Arc::new(
        RemoteLlmProvider::new(
            &format!("{}/v1/chat/completions", server.url()),
            "test-key",
            "gpt-3.5-turbo",
            10,
        )
        .unwrap(),
    )
}

fn completion_body(content: &str) -> String {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

#[tokio::test]
async fn labeled_response_becomes_summary_and_keywords() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJsonString(
                r#"{"model":"gpt-3.5-turbo","temperature":0.2}"#.to_string(),
            ),
            Matcher::Regex("FUENTE: Consejo de Defensa del Estado".to_string()),
        ]))
        .with_status(200)
        .with_body(completion_body(
            "RESUMEN: El máximo tribunal mantuvo la sanción contra la empresa por \
             infracciones sanitarias, cerrando la vía de casación.\n\
             PALABRAS_CLAVE: condena, casación, multa",
        ))
        .create_async()
        .await;

    let summarizer = Summarizer::new(Some(provider_for(&server)), Arc::new(NoopCache));
    let summary = summarizer.summarize("Corte confirma condena", BODY, SOURCE).await;
    assert!(summary.text.starts_with("El máximo tribunal"));
    assert_eq!(summary.keywords, vec!["condena", "casación", "multa"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn provider_failure_degrades_to_fallback() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let summarizer = Summarizer::new(Some(provider_for(&server)), Arc::new(NoopCache));
    let summary = summarizer.summarize("Corte confirma condena", BODY, SOURCE).await;
    assert!(summary.text.starts_with("La Corte Suprema confirmó"));
    assert!(summary.keywords.is_empty());
}

#[tokio::test]
async fn schema_violation_degrades_to_fallback() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(completion_body("Un texto libre sin el formato pedido"))
        .create_async()
        .await;

    let summarizer = Summarizer::new(Some(provider_for(&server)), Arc::new(NoopCache));
    let summary = summarizer.summarize("Corte confirma condena", BODY, SOURCE).await;
    assert!(summary.text.starts_with("La Corte Suprema confirmó"));
}

#[tokio::test]
async fn out_of_window_summary_degrades_to_fallback() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(completion_body("RESUMEN: Breve.\nPALABRAS_CLAVE: a"))
        .create_async()
        .await;

    let summarizer = Summarizer::new(Some(provider_for(&server)), Arc::new(NoopCache));
    let summary = summarizer.summarize("Corte confirma condena", BODY, SOURCE).await;
    assert!(summary.text.starts_with("La Corte Suprema confirmó"));
    assert!(summary.keywords.is_empty());
}

#[tokio::test]
async fn cache_prevents_a_second_completion() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(completion_body(
            "RESUMEN: El tribunal mantuvo la sanción y cerró definitivamente la discusión \
             sobre la multa aplicada.\nPALABRAS_CLAVE: sanción",
        ))
        .expect(1)
        .create_async()
        .await;

    let summarizer = Summarizer::new(Some(provider_for(&server)), Arc::new(MemoryCache::new()));
    let first = summarizer.summarize("Corte confirma condena", BODY, SOURCE).await;
    let second = summarizer.summarize("Corte confirma condena", BODY, SOURCE).await;
    assert_eq!(first, second);
    mock.assert_async().await;
}

#[tokio::test]
async fn markup_variants_of_the_same_body_share_a_cache_entry() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(completion_body(
            "RESUMEN: El tribunal mantuvo la sanción y cerró definitivamente la discusión \
             sobre la multa aplicada.\nPALABRAS_CLAVE: sanción",
        ))
        .expect(1)
        .create_async()
        .await;

    let summarizer = Summarizer::new(Some(provider_for(&server)), Arc::new(MemoryCache::new()));
    let tagged = format!("<p>{}</p>", BODY);
    let first = summarizer
        .summarize("Corte confirma condena", &tagged, SOURCE)
        .await;
    let second = summarizer.summarize("Corte confirma condena", BODY, SOURCE).await;
    assert_eq!(first, second);
    mock.assert_async().await;
}

#[tokio::test]
async fn no_provider_means_deterministic_fallback() {
    let summarizer = Summarizer::new(None, Arc::new(NoopCache));
    let summary = summarizer.summarize("Titular", BODY, SOURCE).await;
    assert!(summary.text.chars().count() <= 404);
    assert!(summary.text.ends_with('.') || summary.text.ends_with("(...)"));
}
