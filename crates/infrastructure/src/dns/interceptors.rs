use ferrous_forwarder_application::ports::QueryInterceptor;
use ferrous_forwarder_domain::{ClientContext, Message};
use tracing::debug;

/// Pass-through interceptor that logs each message it sees at debug level.
#[derive(Debug, Clone)]
pub struct LoggingInterceptor {
    stage: &'static str,
}

impl LoggingInterceptor {
    pub fn new(stage: &'static str) -> Self {
        Self { stage }
    }
}

impl QueryInterceptor for LoggingInterceptor {
    fn intercept(&self, message: Message, client: &ClientContext) -> Message {
        if tracing::enabled!(tracing::Level::DEBUG) {
            let question = message
                .first_question()
                .map(|q| q.to_string())
                .unwrap_or_default();
            debug!(
                stage = self.stage,
                id = message.id(),
                peer = %client.peer,
                transport = %client.transport,
                question = %question,
                rcode = %message.response_code(),
                records = message.record_count(),
                "DNS message"
            );
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrous_forwarder_domain::{Question, RecordType};

    #[test]
    fn test_passes_message_through() {
        let message = Message::query(
            7,
            Question::new("example.com".parse().unwrap(), RecordType::MX),
        );
        let client = ClientContext::tcp("127.0.0.1:5353".parse().unwrap());
        let out = LoggingInterceptor::new("request").intercept(message.clone(), &client);
        assert_eq!(out, message);
    }
}
