use ferrous_forwarder_domain::DomainError;
use std::time::{Duration, Instant};

/// One scheduled attempt: which server to ask and how long to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub index: usize,
    pub timeout: Duration,
}

/// Strict-priority failover over an ordered server list.
///
/// Attempts walk the list from the first entry and wrap around when the budget
/// is larger than the list. Each attempt spends one unit of budget, and its
/// timeout never extends past the overall deadline.
#[derive(Debug)]
pub struct FailoverState {
    server_count: usize,
    next_index: usize,
    remaining_budget: usize,
    deadline: Instant,
}

impl FailoverState {
    pub fn new(server_count: usize, attempt_budget: usize, deadline: Instant) -> Self {
        Self {
            server_count,
            next_index: 0,
            remaining_budget: attempt_budget,
            deadline,
        }
    }

    pub fn next_attempt(
        &mut self,
        attempt_timeout: Duration,
        now: Instant,
    ) -> Result<Attempt, DomainError> {
        if self.server_count == 0 {
            return Err(DomainError::TransportNoHealthyServers);
        }

        let remaining = self.deadline.saturating_duration_since(now);
        if remaining.is_zero() {
            return Err(DomainError::QueryTimeout);
        }
        if self.remaining_budget == 0 {
            return Err(DomainError::TransportAllServersUnreachable);
        }

        let index = self.next_index % self.server_count;
        self.next_index += 1;
        self.remaining_budget -= 1;

        Ok(Attempt {
            index,
            timeout: attempt_timeout.min(remaining),
        })
    }

    pub fn attempts_made(&self) -> usize {
        self.next_index
    }

    pub fn remaining_budget(&self) -> usize {
        self.remaining_budget
    }
}
