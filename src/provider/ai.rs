use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::appsettings::AiSettings;

use super::{Assistant, ProviderError, RetryPolicy};

/// OpenAI compatible gateways disagree on the `/v1` prefix, so both are tried.
const CHAT_PATHS: [&str; 2] = ["/v1/chat/completions", "/chat/completions"];

const SYSTEM_PROMPT: &str = "Kamu adalah asisten Discord khusus Ramadan berbahasa Indonesia. \
Bahas puasa Ramadan, jadwal ibadah, niat, adab, motivasi, dan amalan harian. \
Jawab ringkas, jelas, sopan, dan praktis, dengan paragraf pendek atau poin-poin. \
Arahkan pertanyaan di luar Ramadan kembali ke konteks Ramadan dengan halus. \
Jangan mengarang dalil; katakan tidak yakin bila ragu. \
Jangan memberi fatwa pasti; sarankan bertanya ke ustaz atau ulama setempat untuk fikih yang detail.";

const CONTEXT_PREFIX: &str = "Data jadwal berikut adalah rujukan utama untuk jam sholat, imsak, \
dan maghrib. Jangan menebak jam di luar data ini. ";

pub struct AiAssistant {
    client: reqwest::Client,
    settings: AiSettings,
    retry: RetryPolicy,
}

impl AiAssistant {
    pub fn new(settings: AiSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            settings,
            retry: RetryPolicy::default(),
        })
    }

    async fn post_chat(&self, payload: &Value) -> Result<ChatCompletion, ProviderError> {
        let mut last_error = None;
        for path in CHAT_PATHS {
            let url = format!("{}{}", self.settings.base_url.trim_end_matches('/'), path);
            match self.post_to(&url, payload).await {
                Err(error) if is_missing_route(&error) => {
                    log::warn!("Chat endpoint {path} is not available: {error}");
                    last_error = Some(error);
                }
                result => return result,
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::NoContent("No chat endpoint".to_owned())))
    }

    async fn post_to(&self, url: &str, payload: &Value) -> Result<ChatCompletion, ProviderError> {
        let (client, api_key) = (&self.client, self.settings.api_key.as_str());

        self.retry
            .run("chat completion", || async move {
                let response = client
                    .post(url)
                    .bearer_auth(api_key)
                    .json(payload)
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ProviderError::Status {
                        status: status.as_u16(),
                        body: api_error_message(&body),
                    });
                }

                Ok(response.json::<ChatCompletion>().await?)
            })
            .await
    }
}

#[async_trait]
impl Assistant for AiAssistant {
    async fn ask(&self, prompt: &str, context: Option<&str>) -> Result<String, ProviderError> {
        let prompt = collapse_whitespace(prompt);
        if prompt.is_empty() {
            return Err(ProviderError::Request("Prompt is empty".to_owned()));
        }

        let mut messages = vec![json!({ "role": "system", "content": SYSTEM_PROMPT })];
        if let Some(context) = context.map(collapse_whitespace).filter(|c| !c.is_empty()) {
            messages.push(json!({
                "role": "system",
                "content": format!("{CONTEXT_PREFIX}{context}"),
            }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        let payload = json!({
            "model": self.settings.model,
            "messages": messages,
            "stream": false,
            "max_tokens": self.settings.max_tokens,
            "temperature": self.settings.temperature,
        });

        let completion = self.post_chat(&payload).await?;
        let answer = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| normalize_answer(&content))
            .unwrap_or_default();

        if answer.is_empty() {
            return Err(ProviderError::NoContent("Assistant returned no answer".to_owned()));
        }

        Ok(answer)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

fn is_missing_route(error: &ProviderError) -> bool {
    match error {
        ProviderError::Status { status, body } => {
            if matches!(status, 404 | 405 | 501) {
                return true;
            }
            let body = body.to_lowercase();
            ["unknown request url", "not found", "no route"]
                .iter()
                .any(|needle| body.contains(needle))
        }
        _ => false,
    }
}

/// Prefers `error.message` from an OpenAI style error body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(str::to_owned))
        .unwrap_or_else(|| body.to_owned())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trims trailing spaces per line and allows at most one blank line in a row.
fn normalize_answer(text: &str) -> String {
    let mut answer = String::with_capacity(text.len());
    let mut previous_blank = false;
    for line in text.lines().map(str::trim_end) {
        if line.is_empty() {
            if previous_blank {
                continue;
            }
            previous_blank = true;
        } else {
            previous_blank = false;
        }
        answer.push_str(line);
        answer.push('\n');
    }

    answer.trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{bearer_token, body_partial_json, method, path},
    };

    fn status(status: u16, body: &str) -> ProviderError {
        ProviderError::Status {
            status,
            body: body.to_owned(),
        }
    }

    #[test]
    fn detects_missing_routes() {
        assert!(is_missing_route(&status(404, "")));
        assert!(is_missing_route(&status(405, "")));
        assert!(is_missing_route(&status(400, "Unknown request URL: POST /v1/chat")));
        assert!(!is_missing_route(&status(401, "invalid api key")));
        assert!(!is_missing_route(&ProviderError::Timeout));
    }

    #[test]
    fn extracts_api_error_message() {
        assert_eq!(
            api_error_message(r#"{"error": {"message": "quota exceeded", "code": "x"}}"#),
            "quota exceeded"
        );
        assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn normalizes_answer_layout() {
        let raw = "  Niat puasa:  \r\n\r\n\r\n\r\n- dibaca malam hari   \n- boleh dalam hati\n\n";
        assert_eq!(
            normalize_answer(raw),
            "Niat puasa:\n\n- dibaca malam hari\n- boleh dalam hati"
        );
    }

    #[test]
    fn parses_completion_content() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "Selamat berbuka"}}]}"#,
        )
        .unwrap();
        assert_eq!(
            completion.choices[0].message.content.as_deref(),
            Some("Selamat berbuka")
        );
    }

    fn assistant_for(server: &MockServer) -> AiAssistant {
        let mut assistant = AiAssistant::new(AiSettings {
            base_url: format!("{}/", server.uri()),
            api_key: "test-key".to_owned(),
            model: "ramadan-small".to_owned(),
            max_tokens: 200,
            temperature: 0.2,
            timeout_ms: 2_000,
        })
        .unwrap();
        assistant.retry = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        assistant
    }

    fn completion(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }))
    }

    #[tokio::test]
    async fn falls_back_to_unprefixed_chat_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("test-key"))
            .and(body_partial_json(json!({ "model": "ramadan-small", "stream": false })))
            .respond_with(completion("Niat dibaca   \n\n\nsebelum fajar."))
            .expect(1)
            .mount(&server)
            .await;

        let answer = assistant_for(&server)
            .ask("  kapan   niat puasa? ", Some("Maghrib 18:09"))
            .await
            .unwrap();

        assert_eq!(answer, "Niat dibaca\n\nsebelum fajar.");
    }

    #[tokio::test]
    async fn sends_schedule_context_as_system_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "system", "content": format!("{CONTEXT_PREFIX}Imsak 04:28") },
                    { "role": "user", "content": "jam imsak?" },
                ]
            })))
            .respond_with(completion("Imsak pukul 04:28."))
            .expect(1)
            .mount(&server)
            .await;

        let answer = assistant_for(&server)
            .ask("jam imsak?", Some(" Imsak   04:28 "))
            .await
            .unwrap();

        assert_eq!(answer, "Imsak pukul 04:28.");
    }

    #[tokio::test]
    async fn unauthorized_is_not_a_missing_route() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "error": { "message": "invalid api key" } })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(completion("unused"))
            .expect(0)
            .mount(&server)
            .await;

        let error = assistant_for(&server).ask("halo", None).await.unwrap_err();

        assert!(matches!(
            error,
            ProviderError::Status { status: 401, ref body } if body == "invalid api key"
        ));
    }

    #[tokio::test]
    async fn empty_prompt_sends_nothing() {
        let server = MockServer::start().await;
        let error = assistant_for(&server).ask("   ", None).await.unwrap_err();
        assert!(matches!(error, ProviderError::Request(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
