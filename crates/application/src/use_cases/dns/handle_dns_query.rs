use crate::ports::{DnsResolver, QueryInterceptor};
use ferrous_forwarder_domain::{ClientContext, Message};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

pub struct HandleDnsQueryUseCase {
    resolver: Arc<dyn DnsResolver>,
    request_interceptors: Vec<Arc<dyn QueryInterceptor>>,
    response_interceptors: Vec<Arc<dyn QueryInterceptor>>,
}

impl HandleDnsQueryUseCase {
    pub fn new(resolver: Arc<dyn DnsResolver>) -> Self {
        Self {
            resolver,
            request_interceptors: vec![],
            response_interceptors: vec![],
        }
    }

    pub fn with_request_interceptor(mut self, interceptor: Arc<dyn QueryInterceptor>) -> Self {
        self.request_interceptors.push(interceptor);
        self
    }

    pub fn with_response_interceptor(mut self, interceptor: Arc<dyn QueryInterceptor>) -> Self {
        self.response_interceptors.push(interceptor);
        self
    }

    /// Runs the request chain, resolves, then runs the response chain.
    /// Interceptors are applied in registration order.
    pub async fn execute(&self, request: Message, client: &ClientContext) -> Message {
        let start = Instant::now();

        let request = self
            .request_interceptors
            .iter()
            .fold(request, |msg, interceptor| interceptor.intercept(msg, client));

        let response = self.resolver.resolve(&request, client).await;

        let response = self
            .response_interceptors
            .iter()
            .fold(response, |msg, interceptor| interceptor.intercept(msg, client));

        debug!(
            id = response.id(),
            peer = %client.peer,
            transport = %client.transport,
            rcode = %response.response_code(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Query handled"
        );

        response
    }
}
