//! Chat bridge between canned rule-based replies and an external
//! completion API.
//!
//! Every inbound and outbound message is appended to the per-session
//! transcript. Without API credentials the reply comes from a fixed keyword
//! table; with credentials the transcript tail is forwarded to an
//! OpenAI-compatible `chat/completions` endpoint, and any failure there
//! degrades to a fixed apology instead of surfacing an error to the caller.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

use crate::config::ChatApiConfig;
use crate::store::MemStore;

const SYSTEM_PROMPT: &str = "You are NopeNet's security assistant. You help users understand \
network intrusion detection: DoS, Probe, R2L and U2R attack classes, and practical defenses. \
Answer concisely and stay on topic.";

const FALLBACK_REPLY: &str = "I'm sorry, I'm having trouble reaching the assistant service \
right now. Please try again in a moment, or ask me about DoS, Probe, R2L, or U2R attacks.";

const DEFAULT_REPLY: &str = "I'm your AI security assistant. I can help explain different types of network attacks and provide advice on protecting your systems. Feel free to ask about specific attack types like DoS, Probe, R2L, or U2R attacks, or general security best practices.";

const DOS_REPLY: &str = "A Denial of Service (DoS) attack attempts to make a network resource unavailable by flooding it with traffic or requests. This overwhelms the system, preventing legitimate users from accessing services.\n\nTo protect your network:\n- Implement rate limiting to restrict the number of requests\n- Use DDoS protection services that can detect and mitigate attacks\n- Configure your network hardware to handle traffic spikes\n- Set up traffic monitoring to detect unusual patterns\n- Create a response plan to quickly address attacks when they occur";

const PROBE_REPLY: &str = "Probe or scanning attacks are reconnaissance attacks where malicious actors scan networks for vulnerabilities, open ports, and services that can be exploited later.\n\nTo protect against probing:\n- Keep systems updated with the latest security patches\n- Close unnecessary network ports\n- Use firewalls to block suspicious scanning activity\n- Implement intrusion detection systems\n- Monitor network traffic for scanning patterns";

const R2L_REPLY: &str = "Remote to Local (R2L) attacks involve attackers gaining unauthorized access from a remote machine to a local account or service.\n\nProtection measures include:\n- Implement strong authentication methods\n- Use encryption for sensitive communications\n- Regularly monitor access logs for anomalies\n- Apply the principle of least privilege\n- Consider using multi-factor authentication for critical systems";

const U2R_REPLY: &str = "User to Root (U2R) attacks occur when attackers attempt to gain root/administrator access to systems starting with a normal user account.\n\nTo defend against U2R attacks:\n- Regularly audit user permissions and access\n- Apply security patches promptly\n- Use privilege separation techniques\n- Implement behavior-based monitoring\n- Consider application whitelisting for critical systems";

const PROTECT_REPLY: &str = "General network security best practices include:\n- Keep all systems and software updated with security patches\n- Use strong, unique passwords and consider a password manager\n- Implement multi-factor authentication where possible\n- Segment your network to contain potential breaches\n- Regularly back up critical data\n- Use encryption for sensitive data\n- Train users on security awareness\n- Monitor systems for unusual activity\n- Maintain and test an incident response plan";

/// Number of trailing transcript turns forwarded to the completion API.
const HISTORY_TURNS: usize = 10;

#[derive(Debug, Error)]
enum CompletionError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion response had no choices")]
    EmptyResponse,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

pub struct ChatBridge {
    api: Option<ChatApiConfig>,
    client: reqwest::Client,
    /// Per-session serialization point: two concurrent calls for the same
    /// session append their user/assistant pairs in call order instead of
    /// interleaving.
    session_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ChatBridge {
    pub fn new(api: Option<ChatApiConfig>) -> Self {
        let timeout = api
            .as_ref()
            .map(|a| a.timeout)
            .unwrap_or(std::time::Duration::from_secs(30));
        Self {
            api,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            session_locks: DashMap::new(),
        }
    }

    /// Handle one chat turn: record the user message, produce a reply (canned
    /// or via the completion API), record it, return it.
    pub async fn chat(
        &self,
        store: &MemStore,
        session_id: &str,
        message: &str,
        context: Option<&serde_json::Value>,
    ) -> String {
        let lock = self
            .session_locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        store.append_chat_message(session_id, "user", message);

        let reply = match &self.api {
            None => canned_reply(message).to_string(),
            Some(api) => match self.complete(store, session_id, context, api).await {
                Ok(reply) => reply,
                Err(err) => {
                    warn!(session_id, error = %err, "completion API failed, using fallback reply");
                    FALLBACK_REPLY.to_string()
                }
            },
        };

        store.append_chat_message(session_id, "assistant", &reply);
        reply
    }

    async fn complete(
        &self,
        store: &MemStore,
        session_id: &str,
        context: Option<&serde_json::Value>,
        api: &ChatApiConfig,
    ) -> Result<String, CompletionError> {
        let system = match context {
            Some(ctx) => format!("{SYSTEM_PROMPT}\n\nDashboard context:\n{ctx}"),
            None => SYSTEM_PROMPT.to_string(),
        };

        let mut messages = vec![json!({ "role": "system", "content": system })];
        let transcript = store.session_messages(session_id);
        let tail_start = transcript.len().saturating_sub(HISTORY_TURNS);
        for entry in &transcript[tail_start..] {
            messages.push(json!({ "role": entry.role, "content": entry.content }));
        }

        let response: CompletionResponse = self
            .client
            .post(format!("{}/chat/completions", api.base_url))
            .bearer_auth(&api.api_key)
            .json(&json!({ "model": api.model, "messages": messages }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(CompletionError::EmptyResponse)
    }
}

/// Keyword-matched canned reply, checked in priority order.
fn canned_reply(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    if lower.contains("dos") || lower.contains("denial of service") {
        DOS_REPLY
    } else if lower.contains("probe") || lower.contains("scan") {
        PROBE_REPLY
    } else if lower.contains("r2l") || lower.contains("remote") {
        R2L_REPLY
    } else if lower.contains("u2r") || lower.contains("root") {
        U2R_REPLY
    } else if lower.contains("protect") || lower.contains("secure") {
        PROTECT_REPLY
    } else {
        DEFAULT_REPLY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dos_question_gets_canned_reply_verbatim() {
        let store = MemStore::new();
        let bridge = ChatBridge::new(None);
        let reply = bridge
            .chat(&store, "session-1", "Tell me about DoS attacks", None)
            .await;
        assert_eq!(reply, DOS_REPLY);
    }

    #[tokio::test]
    async fn test_keyword_priority_order() {
        // "dos" wins over the later keywords even when both appear.
        assert_eq!(canned_reply("compare DoS with probe scans"), DOS_REPLY);
        assert_eq!(canned_reply("what is a PROBE attack"), PROBE_REPLY);
        assert_eq!(canned_reply("remote access risks"), R2L_REPLY);
        assert_eq!(canned_reply("getting root on a box"), U2R_REPLY);
        assert_eq!(canned_reply("how do I secure my network"), PROTECT_REPLY);
        assert_eq!(canned_reply("hello there"), DEFAULT_REPLY);
    }

    #[tokio::test]
    async fn test_transcript_grows_two_entries_per_call_in_order() {
        let store = MemStore::new();
        let bridge = ChatBridge::new(None);

        bridge.chat(&store, "s", "Tell me about DoS attacks", None).await;
        bridge.chat(&store, "s", "and probes?", None).await;

        let transcript = store.session_messages("s");
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript[0].role, "user");
        assert_eq!(transcript[1].role, "assistant");
        assert_eq!(transcript[2].role, "user");
        assert_eq!(transcript[3].role, "assistant");
        assert_eq!(transcript[1].content, DOS_REPLY);
        assert_eq!(transcript[3].content, PROBE_REPLY);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = MemStore::new();
        let bridge = ChatBridge::new(None);

        bridge.chat(&store, "a", "hello", None).await;
        bridge.chat(&store, "b", "hello", None).await;

        assert_eq!(store.session_messages("a").len(), 2);
        assert_eq!(store.session_messages("b").len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_api_degrades_to_fallback() {
        let store = MemStore::new();
        let bridge = ChatBridge::new(Some(ChatApiConfig {
            api_key: "test-key".into(),
            // Nothing listens here; the request fails fast.
            base_url: "http://127.0.0.1:9".into(),
            model: "test-model".into(),
            timeout: std::time::Duration::from_millis(500),
        }));

        let reply = bridge.chat(&store, "s", "Tell me about DoS attacks", None).await;
        assert_eq!(reply, FALLBACK_REPLY);

        // The failed turn is still recorded in order.
        let transcript = store.session_messages("s");
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].content, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_concurrent_calls_same_session_do_not_interleave() {
        let store = Arc::new(MemStore::new());
        let bridge = Arc::new(ChatBridge::new(None));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = Arc::clone(&store);
            let bridge = Arc::clone(&bridge);
            handles.push(tokio::spawn(async move {
                bridge.chat(&store, "shared", "Tell me about DoS attacks", None).await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let transcript = store.session_messages("shared");
        assert_eq!(transcript.len(), 8);
        for pair in transcript.chunks(2) {
            assert_eq!(pair[0].role, "user");
            assert_eq!(pair[1].role, "assistant");
        }
    }
}
