use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use query_agent::{
    AgentError, EntityRecognizer, InterpreterOptions, LlmClient, PARSE_FAILURE_MARKER,
    PatternRecognizer, QueryInterpreter, QueryType, StructuredQuery, ValidationMode,
};

const INCEPTION_QUERY: &str =
    "movies like Inception with a mind-bending plot and Christopher Nolan directing";

const MODEL_JSON: &str = r#"{
  "intent": "semantic_search",
  "query_type": "director_based",
  "criteria": ["mind-bending plot", "layered reality"],
  "movie_name": "Inception",
  "entities": {"actors": [], "directors": ["Christopher Nolan"], "genres": []},
  "themes": ["dreams", "memory"]
}"#;

enum Reply {
    Text(String),
    Transport(String),
}

/// Answers every prompt with the same reply and remembers the prompts
struct ScriptedClient {
    reply: Reply,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn text(text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Text(text.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Transport(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn generate(&self, prompt: &str) -> query_agent::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Transport(message) => Err(AgentError::Transport(message.clone())),
        }
    }
}

struct SlowClient;

#[async_trait]
impl LlmClient for SlowClient {
    async fn generate(&self, _prompt: &str) -> query_agent::Result<String> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(MODEL_JSON.to_string())
    }
}

fn recognizer() -> Arc<dyn EntityRecognizer> {
    Arc::new(PatternRecognizer::new().unwrap())
}

fn interpreter(client: Arc<dyn LlmClient>, options: InterpreterOptions) -> QueryInterpreter {
    QueryInterpreter::new(recognizer(), client, options).unwrap()
}

#[tokio::test]
async fn test_fenced_response_matches_unfenced() {
    let fenced = interpreter(
        ScriptedClient::text(format!("```json\n{MODEL_JSON}\n```")),
        InterpreterOptions::default(),
    );
    let plain = interpreter(
        ScriptedClient::text(MODEL_JSON),
        InterpreterOptions::default(),
    );

    let from_fenced = fenced.interpret(INCEPTION_QUERY).await.unwrap();
    let from_plain = plain.interpret(INCEPTION_QUERY).await.unwrap();
    assert_eq!(from_fenced, from_plain);

    let expected: StructuredQuery = serde_json::from_str(MODEL_JSON).unwrap();
    let query = from_fenced.structured().unwrap();
    assert_eq!(query, &expected);
    assert_eq!(query.query_type, QueryType::DirectorBased);
}

#[tokio::test]
async fn test_prose_response_is_failure_payload() {
    let interpreter = interpreter(
        ScriptedClient::text("\n  Sorry, I can only talk about movies in prose.  \n"),
        InterpreterOptions::default(),
    );

    let result = interpreter.interpret("a heist movie").await.unwrap();
    let failure = result.failure().unwrap();
    assert_eq!(failure.error, PARSE_FAILURE_MARKER);
    assert_eq!(
        failure.raw_output,
        "Sorry, I can only talk about movies in prose."
    );

    let payload = serde_json::to_value(&result).unwrap();
    assert_eq!(payload["error"], PARSE_FAILURE_MARKER);
}

#[tokio::test]
async fn test_inception_scenario_is_consistent() {
    let client = ScriptedClient::text(MODEL_JSON);
    let interpreter = interpreter(client.clone(), InterpreterOptions::default());

    let first = interpreter.extractor().extract(INCEPTION_QUERY);
    let second = interpreter.extractor().extract(INCEPTION_QUERY);
    assert_eq!(first, second);
    assert!(first.actors.is_empty());
    assert!(first.genres.is_empty());

    interpreter.interpret(INCEPTION_QUERY).await.unwrap();
    interpreter.interpret(INCEPTION_QUERY).await.unwrap();

    // same query, same extraction, same prompt
    let prompts = client.prompts();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0], prompts[1]);
    assert_eq!(
        prompts[0],
        interpreter
            .prompt_builder()
            .build_prompt(INCEPTION_QUERY, &first)
    );
    assert!(prompts[0].contains(&format!("User query: {INCEPTION_QUERY}")));
}

#[tokio::test]
async fn test_romcom_scenario_reaches_prompt() {
    let client = ScriptedClient::text(MODEL_JSON);
    let interpreter = interpreter(client.clone(), InterpreterOptions::default());

    let entities = interpreter
        .extractor()
        .extract("funny romcom with a happy ending");
    assert_eq!(entities.genres.iter().collect::<Vec<_>>(), vec!["Romance"]);

    interpreter
        .interpret("funny romcom with a happy ending")
        .await
        .unwrap();
    assert!(client.prompts()[0].contains("\"Romance\""));
}

#[tokio::test]
async fn test_transport_error_propagates() {
    let interpreter = interpreter(
        ScriptedClient::failing("connection refused"),
        InterpreterOptions::default(),
    );

    let err = interpreter.interpret("anything").await.unwrap_err();
    assert!(err.is_transport());
    assert!(matches!(err, AgentError::Transport(ref msg) if msg == "connection refused"));
}

#[tokio::test]
async fn test_slow_model_times_out() {
    let options = InterpreterOptions {
        timeout: Some(Duration::from_millis(20)),
        ..Default::default()
    };
    let interpreter = interpreter(Arc::new(SlowClient), options);

    let err = interpreter.interpret("anything").await.unwrap_err();
    assert!(matches!(err, AgentError::Timeout(limit) if limit == Duration::from_millis(20)));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_strict_mode_flows_through_interpreter() {
    let raw = r#"{"intent": "semantic_search", "query_type": "vibe_based", "criteria": ["cozy"]}"#;

    let permissive = interpreter(ScriptedClient::text(raw), InterpreterOptions::default());
    assert!(!permissive.interpret("cozy").await.unwrap().is_failure());

    let strict = interpreter(
        ScriptedClient::text(raw),
        InterpreterOptions {
            validation: ValidationMode::Strict,
            ..Default::default()
        },
    );
    assert!(strict.interpret("cozy").await.unwrap().is_failure());
}

#[tokio::test]
async fn test_concurrent_interpretations_are_isolated() {
    let client = ScriptedClient::text(MODEL_JSON);
    let interpreter = Arc::new(interpreter(client.clone(), InterpreterOptions::default()));

    let queries = [
        "funny romcom with a happy ending",
        "dark sci-fi about memory",
        "a western directed by Sergio Leone",
        "horror like \"The Thing\"",
    ];

    let handles: Vec<_> = queries
        .iter()
        .map(|query| {
            let interpreter = interpreter.clone();
            let query = query.to_string();
            tokio::spawn(async move { interpreter.interpret(&query).await })
        })
        .collect();

    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert!(!result.is_failure());
    }

    let prompts = client.prompts();
    assert_eq!(prompts.len(), queries.len());
    for query in queries {
        let matching = prompts
            .iter()
            .filter(|p| p.contains(&format!("User query: {query}\n")))
            .count();
        assert_eq!(matching, 1, "{query}");
    }
}
