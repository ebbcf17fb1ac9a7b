use super::*;
use serde_json::json;

#[test]
fn renders_prompt_lines_followed_by_compact_examples() {
    let request = GenerationRequest {
        instructions: vec![
            "You are a grammar expert.".to_string(),
            "Classify words.".to_string(),
        ],
        prompt: vec![
            "What is the grammatical word type of 'quickly'?".to_string(),
            "Examples:".to_string(),
        ],
        examples: vec![
            json!({"wordType": "noun", "abbreviation": "n"}),
            json!({"wordType": "verb", "abbreviation": "v"}),
        ],
    };

    assert_eq!(
        request.render_instructions(),
        "You are a grammar expert.\nClassify words."
    );
    let prompt = request.render_prompt();
    let lines: Vec<&str> = prompt.lines().collect();
    assert_eq!(lines[0], "What is the grammatical word type of 'quickly'?");
    assert_eq!(lines[1], "Examples:");
    assert_eq!(lines.len(), 4);
    assert!(lines[2].contains("\"wordType\":\"noun\""));
}

#[tokio::test]
async fn missing_session_is_always_unavailable() {
    let session = MissingSession;
    let request = GenerationRequest::default();
    assert!(matches!(
        session.prewarm().await,
        Err(SessionError::Unavailable(_))
    ));
    assert!(matches!(
        session.respond(&request).await,
        Err(SessionError::Unavailable(_))
    ));
    assert!(matches!(
        session.stream_response(&request).await,
        Err(SessionError::Unavailable(_))
    ));
}
