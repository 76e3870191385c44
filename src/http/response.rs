use serde_json::Value;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub duration_ms: u128,
    pub body: String,
}

impl HttpResponse {
    /// 2xx only; redirects have already been followed by the client.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as JSON. Non-JSON bodies (HTML error pages, empty bodies) come
    /// back as a JSON string so they can still be attached as evidence.
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|_| Value::String(self.body.clone()))
    }
}
