use ferrous_forwarder_domain::{ClientContext, Message};

/// Hook that observes or rewrites a message before or after resolution.
pub trait QueryInterceptor: Send + Sync {
    fn intercept(&self, message: Message, client: &ClientContext) -> Message;
}
